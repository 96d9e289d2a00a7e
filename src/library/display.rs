use std::time::Duration;

use crate::config::DisplayField;

use super::model::{MediaId, MediaRecord};

/// Format a duration as `M:SS`, rounding partial seconds up.
pub fn format_duration(d: Duration) -> String {
    let mut total_secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        total_secs = total_secs.saturating_add(1);
    }
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Build the list label for `record` according to the provided `fields` and separator.
///
/// Falls back to the record identity when no field produced anything.
pub fn label_from_fields(record: &MediaRecord, fields: &[DisplayField], sep: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for f in fields {
        match f {
            DisplayField::Title => {
                if let Some(t) = record.title() {
                    parts.push(t.to_string());
                } else if let Some(stem) = record.id.asset_path().and_then(|p| p.file_stem()) {
                    parts.push(stem.to_string());
                }
            }
            DisplayField::Filename => {
                if let Some(stem) = record.id.asset_path().and_then(|p| p.file_stem()) {
                    if !stem.trim().is_empty() {
                        parts.push(stem.to_string());
                    }
                }
            }
            DisplayField::Path => {
                parts.push(record.id.to_string());
            }
            DisplayField::Duration => {
                if let Some(d) = record.duration() {
                    parts.push(format_duration(d));
                }
            }
            DisplayField::Tags => {
                let tags = record.tags();
                if !tags.is_empty() {
                    parts.push(format!("[{}]", tags.join(", ")));
                }
            }
        }
    }

    if parts.is_empty() {
        match &record.id {
            MediaId::Local(p) => p.to_string(),
            MediaId::Remote(id) => id.clone(),
        }
    } else {
        parts.join(sep)
    }
}
