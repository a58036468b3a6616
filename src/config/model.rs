// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::scheduler::DEFAULT_WORKERS;

/// Batch description as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// workers = 2
/// timeout = "5s"
///
/// [registry]
/// resources = ["A", "B"]
///
/// [[task]]
/// id = "first"
/// resources = ["A", "B"]
/// work = "sleep"
/// duration = "100ms"
/// ```
///
/// Tasks are an array of tables so that file order is submission order.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub registry: RegistrySection,

    #[serde(default)]
    pub task: Vec<TaskConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Worker pool size.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// How long the runner waits for the whole batch, e.g. `"10s"`.
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_timeout() -> String {
    "30s".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            timeout: default_timeout(),
        }
    }
}

/// `[registry]` section. List order is registration order, so the first
/// name gets order index 0.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrySection {
    #[serde(default)]
    pub resources: Vec<String>,
}

/// What a demo task does while it holds its resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkKind {
    /// Hold the resources for `duration`.
    #[default]
    Sleep,
    /// Return an error carrying `message`.
    Fail,
    /// Panic with `message`.
    Panic,
    /// Never return on its own; stops only once cancelled.
    Hang,
    /// Read-modify-write a shared counter `times` times.
    Increment,
}

/// One `[[task]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub id: String,

    /// Resource names in the order the task takes them.
    #[serde(default)]
    pub resources: Vec<String>,

    #[serde(default)]
    pub work: WorkKind,

    /// Hold time for `sleep`, and per-step hold time for `increment`.
    #[serde(default)]
    pub duration: Option<String>,

    /// Message for `fail` and `panic`.
    #[serde(default)]
    pub message: Option<String>,

    /// Step count for `increment` (default 1).
    #[serde(default)]
    pub times: Option<u32>,
}

/// Validated batch description. Construct it with
/// `ConfigFile::try_from(raw)` or `config::load_and_validate`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub workers: usize,
    pub timeout: Duration,
    /// Resource names in registration order.
    pub resources: Vec<String>,
    /// Tasks in submission order.
    pub tasks: Vec<TaskSpec>,
}

/// A validated task entry.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub id: String,
    pub resources: Vec<String>,
    pub work: WorkSpec,
}

/// Validated work description, with durations parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkSpec {
    Sleep(Duration),
    Fail(String),
    Panic(String),
    Hang,
    Increment { times: u32, hold: Duration },
}
