//! Outline parsing for section-scoped gathering.

use once_cell::sync::Lazy;
use regex::Regex;

/// Hint text is capped so one sprawling outline line cannot dominate the
/// search seed.
const HINT_MAX_CHARS: usize = 160;

static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    // Leading bullets ("-", "*", "•", ">") and numbering ("1.", "2.3)", "(4)").
    Regex::new(r"^[\s\-*•>]*(?:\(?\d+(?:\.\d+)*[.)]?)?\s*").expect("marker regex")
});

/// Hint text for a section: the remainder of the outline line that starts
/// with `section_key`, markers stripped, capped at 160 characters. Empty
/// when the key is not found.
pub fn section_hint(outline: &str, section_key: &str) -> String {
    let key = section_key.trim();
    if key.is_empty() {
        return String::new();
    }
    for line in outline.lines() {
        let trimmed = line.trim();
        let unmarked = MARKER_RE.replace(trimmed, "");
        let rest = if let Some(rest) = trimmed.strip_prefix(key) {
            rest
        } else if let Some(rest) = unmarked.strip_prefix(key) {
            rest
        } else {
            continue;
        };
        let hint = rest.trim_start_matches(['.', ':', ')', '-', '–', ' ', '\t']);
        return hint.chars().take(HINT_MAX_CHARS).collect();
    }
    String::new()
}

/// Section keys for whole-document gathering, one per non-empty outline
/// line: the leading numbering token when the line has one, otherwise the
/// trimmed line itself.
pub fn section_keys(outline: &str) -> Vec<String> {
    static NUMBERING_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^\(?\d+(?:\.\d+)*[.)]?").expect("numbering regex"));

    outline
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim().trim_start_matches(['-', '*', '•', '>']).trim();
            if trimmed.is_empty() {
                return None;
            }
            match NUMBERING_RE.find(trimmed) {
                Some(numbering) => Some(numbering.as_str().to_string()),
                None => Some(trimmed.to_string()),
            }
        })
        .collect()
}
