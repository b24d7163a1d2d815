use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use pivotal::config::{Settings, SettingsError};
use pivotal::inference::SamplingStrategy;

fn temp_config(name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pivotal-settings-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_from_file() {
    let path = temp_config(
        "full.toml",
        r#"
[engine]
init_timeout_secs = 15

[loader]
batch_size = 250
verify_count = false

[inference]
strategy = "random"
max_samples = 25
numeric_threshold = 0.5

[pivot]
round_digits = 4
"#,
    );

    let settings = Settings::from_file(&path).unwrap();

    assert_eq!(settings.engine.init_timeout(), Duration::from_secs(15));
    assert_eq!(settings.loader.batch_size, 250);
    assert!(!settings.loader.verify_count);
    assert_eq!(settings.loader.table_name, "pivot_data");
    assert_eq!(settings.inference.strategy, SamplingStrategy::Random);
    assert_eq!(settings.inference.max_samples, Some(25));
    assert_eq!(settings.inference.numeric_threshold, Some(0.5));
    assert_eq!(settings.pivot.round_digits, 4);
    assert_eq!(settings.cohort.table_name, "cohort_data");
}

#[test]
fn test_empty_file_gives_defaults() {
    let path = temp_config("empty.toml", "");
    assert_eq!(Settings::from_file(&path).unwrap(), Settings::default());
}

#[test]
fn test_missing_file() {
    let path = std::env::temp_dir().join("pivotal-does-not-exist.toml");
    let err = Settings::from_file(&path).unwrap_err();
    assert!(matches!(err, SettingsError::FileNotFound(p) if p == path));
}

#[test]
fn test_malformed_file() {
    let path = temp_config("broken.toml", "[loader\nbatch_size = ");
    assert!(matches!(
        Settings::from_file(&path),
        Err(SettingsError::ParseError(_))
    ));
}

#[test]
fn test_invalid_values_rejected() {
    for toml in [
        "[engine]\ninit_timeout_secs = 0\n",
        "[loader]\ntable_name = \"  \"\n",
        "[inference]\nmax_samples = 0\n",
        "[inference]\nnumeric_threshold = 1.5\n",
    ] {
        assert!(
            matches!(
                Settings::from_toml_str(toml),
                Err(SettingsError::InvalidConfig(_))
            ),
            "accepted: {toml}"
        );
    }
}
