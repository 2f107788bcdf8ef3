#![allow(dead_code)]

pub mod mock_tts;

use erika::config::{Config, LanguageConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated directories and a config pointing into them
pub struct TestContext {
    pub temp_dir: TempDir,
    pub config: Config,
}

impl TestContext {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp_dir.path();
        for sub in ["assets", "scratch", "output"] {
            std::fs::create_dir_all(root.join(sub)).expect("Failed to create dir");
        }

        let config = Config {
            assets_dir: path_str(&root.join("assets")),
            scratch_dir: path_str(&root.join("scratch")),
            output_dir: path_str(&root.join("output")),
            ..Config::default()
        };
        Self { temp_dir, config }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.temp_dir.path().join(rel)
    }

    /// Bind `code` to `engine`/`voice`, optionally with a fallback asset
    pub fn set_language(&mut self, code: &str, engine: &str, voice: &str, fallback: Option<&str>) {
        let mut entry = LanguageConfig::new(engine, voice);
        entry.fallback_asset = fallback.map(str::to_string);
        self.config.languages.insert(code.to_string(), entry);
    }

    /// Put a valid clip at `assets/<name>`
    pub fn add_asset(&self, name: &str) -> PathBuf {
        let path = self.path("assets").join(name);
        write_wav(&path, 22_050, 2_205);
        path
    }

    /// Number of files left in the scratch directory
    pub fn scratch_files(&self) -> usize {
        std::fs::read_dir(self.path("scratch"))
            .map(|d| d.count())
            .unwrap_or(0)
    }
}

pub fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Write a 16-bit mono WAV of silence
pub fn write_wav(path: &Path, sample_rate: u32, frames: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..frames {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// 16-bit mono WAV bytes whose data size is the streaming placeholder
/// `0xFFFFFFFF`
pub fn placeholder_wav(sample_rate: u32, payload_bytes: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(44 + payload_bytes);
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&u32::MAX.to_le_bytes());
    buf.extend_from_slice(b"WAVE");
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    buf.extend_from_slice(&2u16.to_le_bytes());
    buf.extend_from_slice(&16u16.to_le_bytes());
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&u32::MAX.to_le_bytes());
    buf.resize(44 + payload_bytes, 0);
    buf
}

/// Executable shell script standing in for an engine binary.
///
/// The script appends its arguments to `args.log` next to it, then copies
/// `source` to the value following `--output-path` and exits with `exit_code`.
#[cfg(unix)]
pub fn fake_program(dir: &Path, source: Option<&Path>, exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-tts");
    let log = dir.join("args.log");
    let copy = source
        .map(|s| format!("cp '{}' \"$out\"", s.display()))
        .unwrap_or_default();
    let body = format!(
        r#"#!/bin/sh
echo "$@" >> '{log}'
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "--output-path" ]; then out="$2"; fi
  shift
done
{copy}
echo "fake failure" >&2
exit {exit_code}
"#,
        log = log.display(),
        copy = copy,
        exit_code = exit_code
    );
    std::fs::write(&script, body).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}
