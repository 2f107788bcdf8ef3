//! WAV container inspection and repair
//!
//! Streaming synthesis backends write the RIFF header before they know how
//! long the clip is, leaving a placeholder data size in the file. Players
//! that trust the header then read past the end or refuse the file. This
//! module detects that placeholder and rewrites the header from the payload
//! that is actually on disk.

use crate::error::ContainerError;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Declared frame counts at or above this are placeholder values, never real
/// clip lengths (over six hours even at 48 kHz).
pub const IMPLAUSIBLE_FRAME_COUNT: u64 = 1_000_000_000;

/// True when a declared frame count can only be a streaming placeholder
pub fn is_implausible_frame_count(frames: u64) -> bool {
    frames >= IMPLAUSIBLE_FRAME_COUNT
}

/// Container fields read without trusting the declared length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavInfo {
    pub channels: u16,
    pub sample_rate: u32,
    /// Bytes per sample, rounded up from the bit depth
    pub sample_width: u16,
    pub declared_frame_count: u64,
    /// Bytes between the data chunk header and end of file
    pub payload_bytes: u64,
    /// Offset of the `data` chunk header
    data_header_offset: usize,
}

impl WavInfo {
    pub fn frame_size(&self) -> u64 {
        self.channels as u64 * self.sample_width as u64
    }

    /// Whole frames present in the payload, partial trailing frame dropped
    pub fn real_frame_count(&self) -> u64 {
        self.payload_bytes / self.frame_size()
    }

    pub fn needs_repair(&self) -> bool {
        is_implausible_frame_count(self.declared_frame_count)
    }
}

/// What [`repair`] did to the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOutcome {
    Untouched,
    Repaired { declared: u64, actual: u64 },
}

fn read_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// Parse the container fields out of an in-memory WAV file
pub fn parse(buf: &[u8]) -> Result<WavInfo, ContainerError> {
    if buf.len() < 12 || &buf[0..4] != b"RIFF" || &buf[8..12] != b"WAVE" {
        return Err(ContainerError::NotWave);
    }

    let mut format: Option<(u16, u32, u16)> = None;
    let mut idx = 12usize;
    while idx + 8 <= buf.len() {
        let chunk_id = &buf[idx..idx + 4];
        let size = read_u32(buf, idx + 4) as usize;
        let body = idx + 8;

        if chunk_id == b"fmt " {
            if size < 16 || body + 16 > buf.len() {
                return Err(ContainerError::InvalidFormat(format!(
                    "format chunk too short ({} bytes)",
                    size
                )));
            }
            let channels = read_u16(buf, body + 2);
            let sample_rate = read_u32(buf, body + 4);
            let bits = read_u16(buf, body + 14);
            format = Some((channels, sample_rate, bits.div_ceil(8)));
        } else if chunk_id == b"data" {
            let (channels, sample_rate, sample_width) =
                format.ok_or(ContainerError::MissingChunk("fmt "))?;
            if channels == 0 || sample_width == 0 {
                return Err(ContainerError::InvalidFormat(format!(
                    "{} channels, {} byte samples",
                    channels, sample_width
                )));
            }
            let frame_size = channels as u64 * sample_width as u64;
            return Ok(WavInfo {
                channels,
                sample_rate,
                sample_width,
                declared_frame_count: size as u64 / frame_size,
                payload_bytes: (buf.len() - body) as u64,
                data_header_offset: idx,
            });
        }

        // RIFF chunks are word aligned
        idx = body.saturating_add(size).saturating_add(size & 1);
    }

    Err(ContainerError::MissingChunk("data"))
}

/// Read the container fields of a WAV file on disk
pub fn inspect(path: &Path) -> Result<WavInfo, ContainerError> {
    let buf = std::fs::read(path)?;
    parse(&buf)
}

/// Rewrite a WAV file whose declared frame count is a streaming placeholder.
///
/// Files below [`IMPLAUSIBLE_FRAME_COUNT`] are left byte-identical, so the
/// operation is idempotent. A repaired file keeps every chunk ahead of the
/// data chunk, gets exact RIFF and data sizes, and loses any partial frame
/// at the end of the payload.
pub fn repair(path: &Path) -> Result<RepairOutcome, ContainerError> {
    let buf = std::fs::read(path)?;
    let info = parse(&buf)?;

    if !info.needs_repair() {
        debug!(
            "WAV header OK ({} frames declared): {}",
            info.declared_frame_count,
            path.display()
        );
        return Ok(RepairOutcome::Untouched);
    }

    let actual = info.real_frame_count();
    let data_len = actual * info.frame_size();
    let data_len_u32 = u32::try_from(data_len).map_err(|_| {
        ContainerError::InvalidFormat(format!("payload of {} bytes exceeds RIFF limits", data_len))
    })?;

    let payload_start = info.data_header_offset + 8;
    let mut out = Vec::with_capacity(payload_start + data_len as usize);
    out.extend_from_slice(&buf[..info.data_header_offset]);
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len_u32.to_le_bytes());
    out.extend_from_slice(&buf[payload_start..payload_start + data_len as usize]);

    let riff_size = u32::try_from(out.len() - 8).map_err(|_| {
        ContainerError::InvalidFormat("file exceeds RIFF size limit".to_string())
    })?;
    out[4..8].copy_from_slice(&riff_size.to_le_bytes());

    // Write beside the original and swap, so a crash never leaves half a file
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
        None => tempfile::NamedTempFile::new_in(".")?,
    };
    tmp.write_all(&out)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| ContainerError::Io(e.error))?;

    info!(
        "🔧 Repaired WAV header: {} → {} frames ({})",
        info.declared_frame_count,
        actual,
        path.display()
    );
    Ok(RepairOutcome::Repaired {
        declared: info.declared_frame_count,
        actual,
    })
}
