use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::prompt::NOT_AVAILABLE_MARKER;

static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("parenthetical pattern is valid"));

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Drop lines carrying the not-available marker.
    pub drop_unavailable: bool,
    /// Remove `(...)` groups.
    pub strip_parentheticals: bool,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            drop_unavailable: true,
            strip_parentheticals: true,
        }
    }
}

/// Line filter over model output. Every output line is trimmed and non-empty;
/// applying it to its own output changes nothing.
pub fn clean_output(text: &str, options: CleanupOptions) -> String {
    text.lines()
        .filter_map(|line| {
            if options.drop_unavailable && line.contains(NOT_AVAILABLE_MARKER) {
                return None;
            }
            let stripped = if options.strip_parentheticals {
                PARENTHETICAL.replace_all(line, "")
            } else {
                line.into()
            };
            let stripped = stripped.trim();
            // stripping can join "k.(…)A." into the marker
            if stripped.is_empty()
                || (options.drop_unavailable && stripped.contains(NOT_AVAILABLE_MARKER))
            {
                return None;
            }
            Some(stripped.to_string())
        })
        .collect::<Vec<_>>()
        .join("\n")
}
