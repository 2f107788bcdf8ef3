//! Output file naming and retention

use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// File name for a kept clip: `custom` with `.wav` enforced, or a timestamp
pub fn output_filename(custom: Option<&str>) -> String {
    match custom.map(str::trim).filter(|c| !c.is_empty()) {
        Some(name) if name.to_lowercase().ends_with(".wav") => name.to_string(),
        Some(name) => format!("{}.wav", name),
        None => format!(
            "erika_output_{}.wav",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ),
    }
}

/// Keep the `keep` most recently modified `.wav` files in `dir`, delete the
/// rest. Returns the deleted paths.
pub fn prune_old_audio(dir: &Path, keep: usize) -> std::io::Result<Vec<PathBuf>> {
    let mut clips: Vec<(SystemTime, PathBuf)> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("wav"))
                .unwrap_or(false)
        })
        .filter_map(|e| {
            let modified = e.metadata().ok()?.modified().ok()?;
            Some((modified, e.into_path()))
        })
        .collect();

    if clips.len() <= keep {
        return Ok(Vec::new());
    }

    // newest first
    clips.sort_by(|a, b| b.0.cmp(&a.0));

    let mut removed = Vec::new();
    for (_, path) in clips.into_iter().skip(keep) {
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed old clip {}", path.display());
                removed.push(path);
            }
            Err(e) => warn!("⚠️ Could not remove {}: {}", path.display(), e),
        }
    }
    info!("🧹 Removed {} old audio file(s)", removed.len());
    Ok(removed)
}
