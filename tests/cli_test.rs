mod common;

use common::TestContext;
use std::process::{Command, Output};

fn run_erika(ctx: &TestContext, args: &[&str]) -> Output {
    let config_path = ctx.path("config.json");
    ctx.config.save_to(&config_path).expect("Failed to write config");

    Command::new(env!("CARGO_BIN_EXE_erika"))
        .arg("--config")
        .arg(&config_path)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to run erika")
}

#[test]
fn test_total_failure_exits_nonzero() {
    let mut ctx = TestContext::new();
    ctx.set_language("en", "parkiet", "azelma", None);

    let out = run_erika(&ctx, &["--no-play", "Hi"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Speech failed"), "stderr: {}", stderr);
    assert!(stderr.contains("unknown engine 'parkiet'"));
}

#[test]
fn test_fallback_clip_is_kept_under_custom_name() {
    let mut ctx = TestContext::new();
    ctx.set_language("en", "parkiet", "azelma", Some("sorry.wav"));
    ctx.add_asset("sorry.wav");

    let out = run_erika(&ctx, &["--no-play", "--output", "greeting", "Hi"]);
    assert!(out.status.success());
    let kept = ctx.path("output/greeting.wav");
    assert!(kept.exists());
    assert!(String::from_utf8_lossy(&out.stdout).contains("greeting.wav"));
    // the asset itself is copied, not moved
    assert!(ctx.path("assets/sorry.wav").exists());
}

#[cfg(unix)]
#[test]
fn test_kept_clips_are_pruned() {
    let mut ctx = TestContext::new();
    let fixture = ctx.path("fixture.wav");
    common::write_wav(&fixture, 24_000, 2_400);
    let program = common::fake_program(ctx.temp_dir.path(), Some(&fixture), 0);
    ctx.config.pocket.program = common::path_str(&program);
    ctx.config.max_audio_files = 2;

    for name in ["one", "two", "three"] {
        let out = run_erika(&ctx, &["--no-play", "-o", name, "--text", "Hi"]);
        assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
        std::thread::sleep(std::time::Duration::from_millis(50));
    }

    let kept: Vec<_> = std::fs::read_dir(ctx.path("output"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(kept.len(), 2);
    assert!(!kept.contains(&"one.wav".to_string()));
    assert_eq!(ctx.scratch_files(), 0);
}

#[test]
fn test_init_config_writes_file() {
    let ctx = TestContext::new();
    let path = ctx.path("fresh/config.json");

    let out = Command::new(env!("CARGO_BIN_EXE_erika"))
        .arg("--config")
        .arg(&path)
        .arg("--init-config")
        .output()
        .expect("Failed to run erika");
    assert!(out.status.success());

    let saved = erika::config::Config::load_from(&path).unwrap();
    assert_eq!(saved.default_language, "en");
    assert_eq!(saved.max_audio_files, 5);
}

#[test]
fn test_missing_text_is_an_error() {
    let ctx = TestContext::new();
    let out = run_erika(&ctx, &["--no-play"]);
    assert!(!out.status.success());
}

#[test]
fn test_corrupt_config_warning_is_logged() {
    let ctx = TestContext::new();
    let path = ctx.path("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_erika"))
        .arg("--config")
        .arg(&path)
        .arg("--init-config")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run erika");
    assert!(out.status.success());

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Config file corrupted"), "stderr: {}", stderr);
    assert!(ctx.path("config.json.corrupt").exists());
    assert!(erika::config::Config::load_from(&path).is_ok());
}

#[test]
fn test_config_log_level_applies_after_load() {
    let mut ctx = TestContext::new();
    ctx.config.log_level = "error".to_string();
    ctx.set_language("en", "parkiet", "azelma", None);
    let config_path = ctx.path("config.json");
    ctx.config.save_to(&config_path).unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_erika"))
        .arg("--config")
        .arg(&config_path)
        .args(["--no-play", "Hi"])
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run erika");
    assert!(!out.status.success());

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Speech failed"), "stderr: {}", stderr);
    // the pipeline's warning sits below the configured level
    assert!(!stderr.contains("parkiet failed for"), "stderr: {}", stderr);
}
