//! Output naming and human-readable byte sizes.
//!
//! Only the filename suffix is ever inspected: `photo.HEIC` is a source item,
//! `photo.heic.png` is not, regardless of what the bytes contain.

use crate::codec::TargetFormat;
use once_cell::sync::Lazy;
use regex::Regex;

/// Recognised source suffix, compared case-insensitively.
pub const SOURCE_SUFFIX: &str = ".heic";

static RE_SOURCE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.heic$").unwrap());

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// `true` when `name` ends with `.heic` in any letter case.
pub fn has_source_suffix(name: &str) -> bool {
    RE_SOURCE_SUFFIX.is_match(name)
}

/// Replace a trailing `.heic` (any case) with `.jpg`.
///
/// Names without the suffix are returned unchanged.
pub fn derive_output_name(source_name: &str) -> String {
    derive_output_name_for(source_name, TargetFormat::Jpeg)
}

/// Replace a trailing `.heic` (any case) with the suffix of `target`.
pub fn derive_output_name_for(source_name: &str, target: TargetFormat) -> String {
    RE_SOURCE_SUFFIX
        .replace(source_name, target.suffix())
        .into_owned()
}

/// Render a byte count as `"0 Bytes"`, `"1 KB"`, `"1.5 KB"`, `"3.21 MB"`, …
///
/// Picks the largest unit (1024 steps, up to GB) whose value is at least 1,
/// rounds to two decimals and strips trailing zeros.
pub fn format_byte_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    while unit + 1 < UNITS.len() && bytes >= 1u64 << (10 * (unit + 1)) {
        unit += 1;
    }

    let scaled = bytes as f64 / (1u64 << (10 * unit)) as f64;
    let fixed = format!("{scaled:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
