use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Runs the binary in an isolated directory so no user or project config
/// file is picked up.
fn shadeview(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_shadeview"))
        .current_dir(dir)
        .env("SHADEVIEW_CONFIG_DIR", dir.join("config"))
        .env("HOME", dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run shadeview")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn missing_shader_is_rejected() {
    let dir = TempDir::new().unwrap();
    let output = shadeview(dir.path(), &[]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("a shader file is required"));
}

#[test]
fn malformed_geometry_is_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("fx.glsl"), "").unwrap();
    let output = shadeview(dir.path(), &["-s", "fx.glsl", "-g", "abcx100"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid geometry 'abcx100'"));
}

#[test]
fn five_images_are_rejected() {
    let dir = TempDir::new().unwrap();
    let mut args = vec!["-s", "fx.glsl"];
    for _ in 0..5 {
        args.extend(["-i", "img.png"]);
    }
    let output = shadeview(dir.path(), &args);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("too many images: 5 given"));
}

#[test]
fn unreadable_shader_is_rejected() {
    let dir = TempDir::new().unwrap();
    let output = shadeview(dir.path(), &["-s", "missing.glsl"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("failed to load shader"));
}

#[test]
fn broken_shader_is_rejected_before_opening_a_window() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("fx.glsl"), "vec4 Fragment(").unwrap();
    let output = shadeview(dir.path(), &["-s", "fx.glsl"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("failed to load shader"));
}

#[test]
fn working_directory_config_is_layered_under_flags() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("shadeview.conf"),
        "shader = \"fx.glsl\"\ngeometry = \"0x10\"\n",
    )
    .unwrap();
    fs::write(dir.path().join("fx.glsl"), "").unwrap();

    let output = shadeview(dir.path(), &[]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid geometry '0x10'"));

    let output = shadeview(dir.path(), &["-g", "1x1", "-t", "0"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("ticks per second must be greater than zero"));
}

#[test]
fn unknown_config_keys_are_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("custom.toml"), "shadr = \"fx.glsl\"\n").unwrap();
    let output = shadeview(dir.path(), &["-c", "custom.toml"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("custom.toml"));
}

#[test]
fn prints_version() {
    let dir = TempDir::new().unwrap();
    let output = shadeview(dir.path(), &["-v"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}
