use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn glasswall() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_glasswall"));
    command.env_remove("GLASSWALL_CONFIG").env("RUST_LOG", "warn");
    command
}

#[test]
fn export_writes_png_of_requested_size() {
    let root = TempDir::new().unwrap();
    let output = root.path().join("still.png");

    let status = glasswall()
        .args(["--size", "64x36", "--time", "2.5", "--export"])
        .arg(&output)
        .status()
        .expect("failed to run glasswall export");

    assert!(status.success());
    let image = image::open(&output).unwrap();
    assert_eq!((image.width(), image.height()), (64, 36));
}

#[test]
fn export_honours_config_file_and_preset() {
    let root = TempDir::new().unwrap();
    let config = root.path().join("glasswall.toml");
    let output = root.path().join("flowing.png");
    fs::write(
        &config,
        "variant = \"flowing\"\nsize = \"40x30\"\n\n[params]\ngrain_intensity = 0.0\n",
    )
    .unwrap();

    let status = glasswall()
        .arg("--config")
        .arg(&config)
        .args(["--preset", "aurora", "--export"])
        .arg(&output)
        .status()
        .expect("failed to run glasswall with config");

    assert!(status.success());
    let image = image::open(&output).unwrap();
    assert_eq!((image.width(), image.height()), (40, 30));
}

#[test]
fn invalid_variant_fails() {
    let root = TempDir::new().unwrap();
    let output = root.path().join("never.png");

    let status = glasswall()
        .args(["--variant", "spiral", "--export"])
        .arg(&output)
        .status()
        .expect("failed to run glasswall");

    assert!(!status.success());
    assert!(!output.exists());
}

#[test]
fn oversized_export_is_rejected() {
    let root = TempDir::new().unwrap();
    let output = root.path().join("huge.png");

    let status = glasswall()
        .args(["--size", "4294967295x4294967295", "--export"])
        .arg(&output)
        .status()
        .expect("failed to run glasswall");

    assert!(!status.success());
    assert!(!output.exists());
}

#[test]
fn malformed_config_fails_before_rendering() {
    let root = TempDir::new().unwrap();
    let config = root.path().join("broken.toml");
    let output = root.path().join("never.png");
    fs::write(&config, "preset = \"teal\"\n").unwrap();

    let status = glasswall()
        .arg("--config")
        .arg(&config)
        .arg("--export")
        .arg(&output)
        .status()
        .expect("failed to run glasswall");

    assert!(!status.success());
    assert!(!output.exists());
}

#[test]
fn lists_presets() {
    let output = glasswall()
        .arg("--list-presets")
        .output()
        .expect("failed to list presets");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Pink Neon"));
    assert!(stdout.contains("blue-ocean"));
}
