//! Output file naming.

use std::path::{Path, PathBuf};

const FALLBACK_NAME: &str = "activity";

/// File name for an activity: `<id>_<name>.fit`.
///
/// The name is kept as the user typed it, except for characters that cannot
/// appear in a path component, which become `_`. A blank name falls back to
/// `activity`.
pub fn file_name_for(activity_id: u64, name: Option<&str>) -> String {
    let cleaned: String = name
        .unwrap_or_default()
        .trim()
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches('.');
    let stem = if cleaned.is_empty() { FALLBACK_NAME } else { cleaned };
    format!("{activity_id}_{stem}.fit")
}

pub fn destination_path(output_dir: &Path, activity_id: u64, name: Option<&str>) -> PathBuf {
    output_dir.join(file_name_for(activity_id, name))
}

fn is_forbidden(c: char) -> bool {
    c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
}
