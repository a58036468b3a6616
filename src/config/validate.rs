// src/config/validate.rs

use std::collections::HashSet;
use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{
    ConfigFile, RawConfigFile, TaskConfig, TaskSpec, WorkKind, WorkSpec,
};
use crate::errors::{LockstepError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = LockstepError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;

        let timeout = duration_field("[config].timeout", &raw.config.timeout)?;
        let tasks = raw
            .task
            .iter()
            .map(task_spec)
            .collect::<Result<Vec<_>>>()?;

        Ok(ConfigFile {
            workers: raw.config.workers,
            timeout,
            resources: raw.registry.resources,
            tasks,
        })
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_registry(cfg)?;
    validate_tasks(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(LockstepError::ConfigError(
            "config must contain at least one [[task]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.workers == 0 {
        return Err(LockstepError::ConfigError(
            "[config].workers must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_registry(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for name in cfg.registry.resources.iter() {
        if name.trim().is_empty() {
            return Err(LockstepError::ConfigError(
                "[registry].resources contains an empty name".to_string(),
            ));
        }
        if !seen.insert(name.as_str()) {
            return Err(LockstepError::DuplicateResource(name.clone()));
        }
    }
    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    let known: HashSet<&str> = cfg.registry.resources.iter().map(String::as_str).collect();
    let mut ids = HashSet::new();

    for task in cfg.task.iter() {
        if task.id.trim().is_empty() {
            return Err(LockstepError::ConfigError(
                "every [[task]] needs a non-empty `id`".to_string(),
            ));
        }
        if !ids.insert(task.id.as_str()) {
            return Err(LockstepError::ConfigError(format!(
                "duplicate task id '{}'",
                task.id
            )));
        }
        for resource in task.resources.iter() {
            if !known.contains(resource.as_str()) {
                return Err(LockstepError::NotFound(resource.clone()));
            }
        }
    }
    Ok(())
}

fn task_spec(task: &TaskConfig) -> Result<TaskSpec> {
    let field = |name: &str| format!("task '{}' `{}`", task.id, name);

    let hold = match task.duration.as_deref() {
        Some(s) => duration_field(&field("duration"), s)?,
        None => Duration::ZERO,
    };
    let message = || {
        task.message
            .clone()
            .unwrap_or_else(|| format!("task '{}' failed on purpose", task.id))
    };

    let work = match task.work {
        WorkKind::Sleep => WorkSpec::Sleep(hold),
        WorkKind::Fail => WorkSpec::Fail(message()),
        WorkKind::Panic => WorkSpec::Panic(message()),
        WorkKind::Hang => WorkSpec::Hang,
        WorkKind::Increment => {
            let times = task.times.unwrap_or(1);
            if times == 0 {
                return Err(LockstepError::ConfigError(format!(
                    "{} must be >= 1",
                    field("times")
                )));
            }
            if task.resources.is_empty() {
                return Err(LockstepError::ConfigError(format!(
                    "task '{}' uses `increment` but holds no resource to guard the counter",
                    task.id
                )));
            }
            WorkSpec::Increment { times, hold }
        }
    };

    Ok(TaskSpec {
        id: task.id.clone(),
        resources: task.resources.clone(),
        work,
    })
}

fn duration_field(what: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|e| LockstepError::ConfigError(format!("invalid {what} '{value}': {e}")))
}
