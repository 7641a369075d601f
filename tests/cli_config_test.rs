use std::process::Command;
use tempfile::TempDir;

fn hotpage(dir: &std::path::Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_hotpage"));
    command.current_dir(dir).env("RUST_LOG", "error");
    command
}

#[test]
fn test_init_command() {
    let temp_dir = TempDir::new().unwrap();

    let output = hotpage(temp_dir.path())
        .arg("init")
        .output()
        .expect("Failed to run init command");
    assert!(output.status.success());

    let config_path = temp_dir.path().join(".hotpage/settings.toml");
    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("version = 1"));
    assert!(content.contains("[database]"));
    assert!(content.contains("[watch]"));

    // A second init without --force refuses to overwrite
    let again = hotpage(temp_dir.path()).arg("init").output().unwrap();
    assert!(!again.status.success());

    let forced = hotpage(temp_dir.path())
        .args(["init", "--force"])
        .output()
        .unwrap();
    assert!(forced.status.success());
}

#[test]
fn test_config_command_reads_workspace_settings() {
    let temp_dir = TempDir::new().unwrap();
    let config_dir = temp_dir.path().join(".hotpage");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("settings.toml"),
        r#"
version = 2

[watch]
debounce_ms = 321
"#,
    )
    .unwrap();

    let output = hotpage(temp_dir.path())
        .arg("config")
        .output()
        .expect("Failed to run config command");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("version = 2"));
    assert!(stdout.contains("debounce_ms = 321"));
}

#[test]
fn test_explicit_config_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("custom.toml");
    std::fs::write(&path, "[database]\nname = \"custom_db\"\n").unwrap();

    let output = hotpage(temp_dir.path())
        .args(["config", "--config"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("name = \"custom_db\""));
}
