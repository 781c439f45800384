use log::debug;
use regex::Regex;

use crate::markers::{
    self, ORIGINAL_KEYWORDS, ORIGINAL_MARKERS, REWRITTEN_KEYWORDS, REWRITTEN_MARKERS,
};
use crate::normalize;
use crate::{EMPTY_RESPONSE, ExtractionResult, ORIGINAL_MISSING, REWRITTEN_MISSING, THINKING_MISSING};

/// Copy sections longer than this many characters get truncated
const MAX_SECTION_CHARS: usize = 2000;
/// Truncated sections keep this many leading characters
const KEPT_CHARS: usize = 1000;
/// Appended to truncated sections
const TRUNCATION_NOTE: &str = "...(内容已截断)";
/// Content must exceed this many characters for the midpoint split
const MIDPOINT_MIN_CHARS: usize = 20;
/// Lines and paragraphs at or under this many characters are ignored by the
/// looser heuristics
const MIN_SNIPPET_CHARS: usize = 10;

/// Split a raw upstream response into reasoning, original copy and
/// rewritten copy
///
/// Always returns a fully populated result; anything that cannot be
/// recovered resolves to the matching sentinel, never to an error.
pub fn extract(raw: &str) -> ExtractionResult {
    if raw.trim().is_empty() {
        debug!("Empty response body");
        return ExtractionResult {
            thinking: EMPTY_RESPONSE.to_string(),
            original: ORIGINAL_MISSING.to_string(),
            rewritten: REWRITTEN_MISSING.to_string(),
        };
    }

    let normalized = normalize::normalize(raw);

    let mut original = extract_original(&normalized.content);
    let mut rewritten = extract_rewritten(&normalized.content);

    if original.is_none() && rewritten.is_none() {
        debug!("No markers matched, splitting content at the midpoint");
        let (first_half, second_half) = midpoint_split(&normalized.content);
        original = first_half;
        rewritten = second_half;
    }

    let thinking = match normalized.reasoning.trim() {
        "" => THINKING_MISSING.to_string(),
        reasoning => reasoning.to_string(),
    };

    ExtractionResult {
        thinking: truncate_section(thinking),
        original: truncate_section(original.unwrap_or_else(|| ORIGINAL_MISSING.to_string())),
        rewritten: truncate_section(rewritten.unwrap_or_else(|| REWRITTEN_MISSING.to_string())),
    }
}

/// Ordered strategies for the original transcript; first non-empty match
/// wins
fn extract_original(content: &str) -> Option<String> {
    marker_scan(content, ORIGINAL_MARKERS, Some(REWRITTEN_MARKERS))
        .or_else(|| paragraph_scan(content, ORIGINAL_MARKERS))
        .or_else(|| regex_scan(content, ORIGINAL_MARKERS, Some(REWRITTEN_MARKERS)))
        .or_else(|| keyword_scan(content, ORIGINAL_KEYWORDS, REWRITTEN_KEYWORDS))
}

/// Ordered strategies for the rewritten copy; runs to the end of the
/// content rather than to a boundary marker
fn extract_rewritten(content: &str) -> Option<String> {
    marker_scan(content, REWRITTEN_MARKERS, None)
        .or_else(|| paragraph_scan(content, REWRITTEN_MARKERS))
        .or_else(|| regex_scan(content, REWRITTEN_MARKERS, None))
        .or_else(|| keyword_scan(content, REWRITTEN_KEYWORDS, ORIGINAL_KEYWORDS))
}

/// Text after the highest-priority marker, up to the earliest boundary
/// marker or the end
fn marker_scan(content: &str, table: &[&str], boundaries: Option<&[&str]>) -> Option<String> {
    let (pos, marker) = markers::find_first(content, table)?;
    let start = pos + marker.len();
    let end = boundaries
        .and_then(|table| markers::earliest_after(content, start, table))
        .unwrap_or(content.len());
    non_empty(&content[start..end])
}

/// Marker inside a long enough paragraph; text after the marker to the end
/// of that paragraph
fn paragraph_scan(content: &str, table: &[&str]) -> Option<String> {
    for paragraph in content.split("\n\n") {
        if paragraph.chars().count() <= MIN_SNIPPET_CHARS {
            continue;
        }
        if let Some((pos, marker)) = markers::find_first(paragraph, table) {
            if let Some(text) = non_empty(&paragraph[pos + marker.len()..]) {
                return Some(text);
            }
        }
    }
    None
}

/// One alternation over the whole table, capturing lazily up to the first
/// boundary marker or the end
fn regex_scan(content: &str, table: &[&str], boundaries: Option<&[&str]>) -> Option<String> {
    let starts = table.iter().map(|m| regex::escape(m)).collect::<Vec<_>>().join("|");
    let pattern = match boundaries {
        Some(table) => {
            let ends = table.iter().map(|m| regex::escape(m)).collect::<Vec<_>>().join("|");
            format!(r"(?s)(?:{starts})\s*(.*?)(?:{ends}|$)")
        }
        None => format!(r"(?s)(?:{starts})\s*(.*)$"),
    };
    let re = Regex::new(&pattern).unwrap(); // safe: alternation of escaped literals
    non_empty(re.captures(content)?.get(1)?.as_str())
}

/// No markers at all: first long enough line mentioning this section's
/// domain without mentioning the other one
fn keyword_scan(content: &str, include: &[&str], exclude: &[&str]) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find(|line| {
            line.chars().count() > MIN_SNIPPET_CHARS
                && include.iter().any(|keyword| line.contains(keyword))
                && !exclude.iter().any(|keyword| line.contains(keyword))
        })
        .map(str::to_string)
}

/// Halve the content by character count when nothing else matched
fn midpoint_split(content: &str) -> (Option<String>, Option<String>) {
    let total = content.chars().count();
    if total <= MIDPOINT_MIN_CHARS {
        return (None, None);
    }
    let mid = content
        .char_indices()
        .nth(total / 2)
        .map(|(index, _)| index)
        .unwrap_or(content.len());
    (non_empty(&content[..mid]), non_empty(&content[mid..]))
}

/// A section over the length cap keeps its leading characters plus a note
fn truncate_section(text: String) -> String {
    if text.chars().count() <= MAX_SECTION_CHARS {
        return text;
    }
    let kept: String = text.chars().take(KEPT_CHARS).collect();
    format!("{kept}{TRUNCATION_NOTE}")
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
