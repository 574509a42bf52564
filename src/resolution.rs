/*!
 * Resolution tokens.
 *
 * Plate names and delivery folders carry `WIDTHxHEIGHT` tokens with 3 to 5 digits per side.
 * This module finds them, swaps them, and resolves proxy resolution requests against the
 * configured preset table.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::app_config::ResolutionPreset;

static RESOLUTION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{3,5}x\d{3,5}").expect("valid resolution regex"));

static RESOLUTION_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{3,5}x\d{3,5}$").expect("valid resolution regex"));

/// Find the first path segment that is exactly a resolution token
pub fn extract_from_path<P: AsRef<Path>>(path: P) -> Option<String> {
    let normalized = path.as_ref().to_string_lossy().replace('\\', "/");
    normalized
        .split('/')
        .find(|part| RESOLUTION_SEGMENT.is_match(part))
        .map(str::to_string)
}

/// Replace every resolution token inside a file name
pub fn replace_token(file_name: &str, resolution: &str) -> String {
    RESOLUTION_TOKEN.replace_all(file_name, resolution).into_owned()
}

/// Parse a literal `WxH` value, case-insensitive on the separator
pub fn parse_literal(value: &str) -> Option<(u32, u32)> {
    let lowered = value.trim().to_lowercase();
    let (w, h) = lowered.split_once('x')?;
    let width = w.trim().parse::<u32>().ok()?;
    let height = h.trim().parse::<u32>().ok()?;
    Some((width, height))
}

/// Resolve a preset name or literal `WxH` to a `WxH` string.
///
/// Presets win over literals. Anything unparsable resolves to `fallback`.
pub fn resolve(presets: &[ResolutionPreset], name: &str, fallback: &str) -> String {
    if let Some(preset) = presets.iter().find(|p| p.name.eq_ignore_ascii_case(name.trim())) {
        return format!("{}x{}", preset.width, preset.height);
    }

    if let Some((width, height)) = parse_literal(name) {
        return format!("{}x{}", width, height);
    }

    match parse_literal(fallback) {
        Some((width, height)) => format!("{}x{}", width, height),
        None => fallback.to_string(),
    }
}
