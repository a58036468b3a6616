// tests/config_loading.rs

use std::io::Write;
use std::time::Duration;

use lockstep::config::{
    MAX_DURATION, WorkSpec, default_config_path, load_and_validate, parse_duration,
};
use lockstep::errors::LockstepError;
use lockstep_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_full_config_is_loaded_in_file_order() {
    let file = write_config(
        r#"
[config]
workers = 3
timeout = "1500ms"

[registry]
resources = ["A", "B", "C"]

[[task]]
id = "zulu"
resources = ["A", "C"]
work = "sleep"
duration = "25ms"

[[task]]
id = "alpha"
resources = ["B"]
work = "fail"
message = "nope"

[[task]]
id = "mike"
work = "panic"

[[task]]
id = "hotel"
resources = ["C"]
work = "hang"

[[task]]
id = "india"
resources = ["A"]
work = "increment"
times = 7
duration = "2ms"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.workers, 3);
    assert_eq!(cfg.timeout, Duration::from_millis(1500));
    assert_eq!(cfg.resources, vec!["A", "B", "C"]);

    let ids: Vec<&str> = cfg.tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["zulu", "alpha", "mike", "hotel", "india"]);

    assert_eq!(cfg.tasks[0].resources, vec!["A", "C"]);
    assert_eq!(cfg.tasks[0].work, WorkSpec::Sleep(Duration::from_millis(25)));
    assert_eq!(cfg.tasks[1].work, WorkSpec::Fail("nope".to_string()));
    assert_eq!(
        cfg.tasks[2].work,
        WorkSpec::Panic("task 'mike' failed on purpose".to_string())
    );
    assert!(cfg.tasks[2].resources.is_empty());
    assert_eq!(cfg.tasks[3].work, WorkSpec::Hang);
    assert_eq!(
        cfg.tasks[4].work,
        WorkSpec::Increment {
            times: 7,
            hold: Duration::from_millis(2)
        }
    );
}

#[test]
fn test_defaults_apply_when_sections_are_missing() {
    let file = write_config(
        r#"
[[task]]
id = "only"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.workers, 4);
    assert_eq!(cfg.timeout, Duration::from_secs(30));
    assert!(cfg.resources.is_empty());
    assert_eq!(cfg.tasks[0].work, WorkSpec::Sleep(Duration::ZERO));
}

#[test]
fn test_out_of_order_task_still_loads() {
    let file = write_config(
        r#"
[registry]
resources = ["A", "B"]

[[task]]
id = "backwards"
resources = ["B", "A"]
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.tasks[0].resources, vec!["B", "A"]);
}

#[test]
fn test_zero_workers_is_config_error() {
    let file = write_config(
        r#"
[config]
workers = 0

[[task]]
id = "t"
"#,
    );

    match load_and_validate(file.path()) {
        Err(LockstepError::ConfigError(msg)) => assert!(msg.contains("workers")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_resource_is_not_found() {
    let file = write_config(
        r#"
[registry]
resources = ["A"]

[[task]]
id = "t"
resources = ["A", "Z"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(err @ LockstepError::NotFound(_)) => {
            assert!(err.is_config_error());
            assert!(err.to_string().contains("Z"));
        }
        Err(e) => panic!("Expected NotFound, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_duplicate_resource_is_rejected() {
    let file = write_config(
        r#"
[registry]
resources = ["A", "B", "A"]

[[task]]
id = "t"
"#,
    );

    match load_and_validate(file.path()) {
        Err(LockstepError::DuplicateResource(name)) => assert_eq!(name, "A"),
        Err(e) => panic!("Expected DuplicateResource, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_duplicate_task_id_is_config_error() {
    let raw = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("same").build())
        .with_task(TaskConfigBuilder::new("same").build())
        .raw();

    match lockstep::config::ConfigFile::try_from(raw) {
        Err(LockstepError::ConfigError(msg)) => {
            assert!(msg.contains("duplicate task id"));
            assert!(msg.contains("same"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_bad_durations_are_config_errors() {
    let bad_timeout = ConfigFileBuilder::new()
        .timeout("soon")
        .with_task(TaskConfigBuilder::new("t").build())
        .raw();
    match lockstep::config::ConfigFile::try_from(bad_timeout) {
        Err(LockstepError::ConfigError(msg)) => assert!(msg.contains("[config].timeout")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }

    let bad_hold = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("t").sleep("10 parsecs").build())
        .raw();
    match lockstep::config::ConfigFile::try_from(bad_hold) {
        Err(LockstepError::ConfigError(msg)) => {
            assert!(msg.contains("task 't'"));
            assert!(msg.contains("duration"));
        }
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_increment_needs_a_resource_and_a_positive_count() {
    let no_resource = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("inc").increment(3, "0ms").build())
        .raw();
    assert!(matches!(
        lockstep::config::ConfigFile::try_from(no_resource),
        Err(LockstepError::ConfigError(_))
    ));

    let zero_times = ConfigFileBuilder::new()
        .with_resources(&["A"])
        .with_task(
            TaskConfigBuilder::new("inc")
                .resources(&["A"])
                .increment(0, "0ms")
                .build(),
        )
        .raw();
    assert!(matches!(
        lockstep::config::ConfigFile::try_from(zero_times),
        Err(LockstepError::ConfigError(_))
    ));
}

#[test]
fn test_empty_batch_is_config_error() {
    let file = write_config(
        r#"
[registry]
resources = ["A"]
"#,
    );
    assert!(matches!(
        load_and_validate(file.path()),
        Err(LockstepError::ConfigError(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_and_validate(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, LockstepError::IoError(_)));
    assert!(err.is_config_error());
}

#[test]
fn test_malformed_toml_is_toml_error() {
    let file = write_config("[[task]\nid = ");
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, LockstepError::TomlError(_)));
    assert!(err.is_config_error());
}

#[test]
fn test_unknown_work_kind_is_toml_error() {
    let file = write_config(
        r#"
[[task]]
id = "t"
work = "juggle"
"#,
    );
    assert!(matches!(
        load_and_validate(file.path()),
        Err(LockstepError::TomlError(_))
    ));
}

#[test]
fn test_builder_matches_file_form() {
    let cfg = ConfigFileBuilder::new()
        .workers(2)
        .timeout("3s")
        .with_resources(&["A", "B"])
        .with_task(
            TaskConfigBuilder::new("t")
                .resources(&["A", "B"])
                .fail("bad")
                .build(),
        )
        .build();

    assert_eq!(cfg.workers, 2);
    assert_eq!(cfg.timeout, Duration::from_secs(3));
    assert_eq!(cfg.tasks[0].work, WorkSpec::Fail("bad".to_string()));
}

#[test]
fn test_parse_duration_units() {
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration("3s"), Ok(Duration::from_secs(3)));
    assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
    assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    assert!(parse_duration("").is_err());
    assert!(parse_duration("fast").is_err());
    assert!(parse_duration("10").is_err());
}

#[test]
fn test_parse_duration_rejects_overflow_and_huge_values() {
    // Would overflow u64 seconds when scaled to minutes / hours.
    let err = parse_duration("307445734561825861m").unwrap_err();
    assert!(err.contains("too large"), "{err}");
    let err = parse_duration("5124095576030432h").unwrap_err();
    assert!(err.contains("too large"), "{err}");

    // Representable, but far beyond any sensible batch timeout.
    let err = parse_duration("18446744073709551615s").unwrap_err();
    assert!(err.contains("too large"), "{err}");

    assert_eq!(parse_duration("8760h"), Ok(MAX_DURATION));
    assert!(parse_duration("8761h").is_err());
}

#[test]
fn test_huge_timeout_is_config_error() {
    let raw = ConfigFileBuilder::new()
        .timeout("18446744073709551615s")
        .with_task(TaskConfigBuilder::new("t").build())
        .raw();
    match lockstep::config::ConfigFile::try_from(raw) {
        Err(LockstepError::ConfigError(msg)) => assert!(msg.contains("too large"), "{msg}"),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_default_config_path() {
    assert_eq!(default_config_path().to_str(), Some("Lockstep.toml"));
}
