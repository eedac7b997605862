//! Configuration resolution tests
//!
//! Tests that touch `RLINK_CONFIG` are marked #[serial] so they do not race
//! on the process environment.

use rlink_common::config::{ConfigSource, TomlConfig, CONFIG_ENV_VAR};
use rlink_common::Error;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

#[test]
#[serial]
fn test_cli_path_takes_priority_over_env() {
    let temp_dir = TempDir::new().unwrap();
    let cli = temp_dir.path().join("cli.toml");
    let from_env = temp_dir.path().join("env.toml");
    fs::write(&cli, "[roster]\nname = \"from_cli\"\n").unwrap();
    fs::write(&from_env, "[roster]\nname = \"from_env\"\n").unwrap();

    env::set_var(CONFIG_ENV_VAR, &from_env);
    let (config, source) = TomlConfig::resolve(Some(&cli)).unwrap();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(config.roster.name, "from_cli");
    assert_eq!(source, ConfigSource::File(cli));
}

#[test]
#[serial]
fn test_env_var_used_without_cli_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("env.toml");
    fs::write(
        &path,
        "[output]\ndelimiter = \";\"\n\n[matching]\nexclusive_documents = true\n",
    )
    .unwrap();

    env::set_var(CONFIG_ENV_VAR, &path);
    let (config, source) = TomlConfig::resolve(None).unwrap();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(source, ConfigSource::File(path));
    assert_eq!(config.output.delimiter_byte().unwrap(), b';');
    assert!(config.matching.exclusive_documents);
}

#[test]
#[serial]
fn test_explicit_missing_file_is_fatal() {
    env::remove_var(CONFIG_ENV_VAR);
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    match TomlConfig::resolve(Some(&missing)) {
        Err(Error::Config(msg)) => assert!(msg.contains("nope.toml")),
        other => panic!("expected Config error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_malformed_file_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.toml");
    fs::write(&path, "[roster\nname = ").unwrap();

    assert!(matches!(
        TomlConfig::resolve(Some(&path)),
        Err(Error::Config(_))
    ));
}
