#![allow(dead_code)]

use lockstep::config::{ConfigFile, ConfigSection, RawConfigFile, RegistrySection, TaskConfig, WorkKind};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                registry: RegistrySection::default(),
                task: Vec::new(),
            },
        }
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.config.workers = workers;
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.config.config.timeout = timeout.to_string();
        self
    }

    pub fn with_resources(mut self, names: &[&str]) -> Self {
        self.config
            .registry
            .resources
            .extend(names.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_task(mut self, task: TaskConfig) -> Self {
        self.config.task.push(task);
        self
    }

    /// The unvalidated form, for tests that expect validation to fail.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            task: TaskConfig {
                id: id.to_string(),
                resources: vec![],
                work: WorkKind::Sleep,
                duration: None,
                message: None,
                times: None,
            },
        }
    }

    pub fn resources(mut self, names: &[&str]) -> Self {
        self.task.resources = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn sleep(mut self, duration: &str) -> Self {
        self.task.work = WorkKind::Sleep;
        self.task.duration = Some(duration.to_string());
        self
    }

    pub fn fail(mut self, message: &str) -> Self {
        self.task.work = WorkKind::Fail;
        self.task.message = Some(message.to_string());
        self
    }

    pub fn panic(mut self, message: &str) -> Self {
        self.task.work = WorkKind::Panic;
        self.task.message = Some(message.to_string());
        self
    }

    pub fn hang(mut self) -> Self {
        self.task.work = WorkKind::Hang;
        self
    }

    pub fn increment(mut self, times: u32, hold: &str) -> Self {
        self.task.work = WorkKind::Increment;
        self.task.times = Some(times);
        self.task.duration = Some(hold.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
