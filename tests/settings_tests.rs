use eyre::Result;
use gmreduce::prelude::*;
use std::path::PathBuf;

fn write_temp(name: &str, contents: &str) -> Result<PathBuf> {
    let path = std::env::temp_dir().join(format!("gmreduce-{}-{}", std::process::id(), name));
    std::fs::write(&path, contents)?;
    Ok(path)
}

#[test]
fn test_read_full_file() -> Result<()> {
    let path = write_temp(
        "full.toml",
        r#"
[config]
max_iterations = 200
tolerance = 1e-6
min_weight = 1e-3
assignment = "soft"
verbose = true

[log]
level = "debug"
file = "reduction.log"
"#,
    )?;

    let settings = settings::read(path.to_str().unwrap())?;
    std::fs::remove_file(&path)?;

    assert_eq!(settings.config.max_iterations, 200);
    assert_eq!(settings.config.tolerance, 1e-6);
    assert_eq!(settings.config.min_weight, 1e-3);
    assert_eq!(settings.config.assignment, Assignment::Soft);
    assert!(settings.config.verbose);
    assert_eq!(settings.log.level, "debug");
    assert_eq!(settings.log.file.as_deref(), Some("reduction.log"));
    Ok(())
}

#[test]
fn test_missing_keys_take_defaults() -> Result<()> {
    let path = write_temp(
        "partial.toml",
        r#"
[config]
max_iterations = 7
"#,
    )?;

    let settings = settings::read(path.to_str().unwrap())?;
    std::fs::remove_file(&path)?;

    let mut expected = Settings::new();
    expected.set_max_iterations(7);
    assert_eq!(settings, expected);
    assert_eq!(settings.config.assignment, Assignment::Hard);
    Ok(())
}

#[test]
fn test_invalid_file_is_rejected() -> Result<()> {
    let path = write_temp(
        "invalid.toml",
        r#"
[config]
tolerance = -1.0
"#,
    )?;

    let result = settings::read(path.to_str().unwrap());
    std::fs::remove_file(&path)?;
    assert!(result.is_err());
    Ok(())
}

#[test]
fn test_unknown_assignment_is_rejected() -> Result<()> {
    let path = write_temp(
        "assignment.toml",
        r#"
[config]
assignment = "fuzzy"
"#,
    )?;

    let result = settings::read(path.to_str().unwrap());
    std::fs::remove_file(&path)?;
    assert!(result.is_err());
    Ok(())
}

#[test]
fn test_missing_file_is_an_error() {
    let path = std::env::temp_dir().join("gmreduce-does-not-exist.toml");
    assert!(settings::read(path.to_str().unwrap()).is_err());
}

#[test]
fn test_write_json() -> Result<()> {
    let mut settings = Settings::new();
    settings
        .set_tolerance(1e-8)
        .set_min_weight(1e-4)
        .set_assignment(Assignment::Soft)
        .set_log_level("warn");

    let path = std::env::temp_dir().join(format!("gmreduce-{}-settings.json", std::process::id()));
    settings.write(path.to_str().unwrap())?;
    let contents = std::fs::read_to_string(&path)?;
    std::fs::remove_file(&path)?;

    let parsed: Settings = serde_json::from_str(&contents)?;
    assert_eq!(parsed, settings);
    assert!(contents.contains("\"assignment\": \"soft\""));
    Ok(())
}
