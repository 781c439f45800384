/// Phrases that introduce the original transcript, highest priority first
pub const ORIGINAL_MARKERS: &[&str] = &[
    "原视频文案如下：",
    "原始文案：",
    "原始文案:",
    "原文：",
    "原文:",
    "original text follows:",
    "original transcript:",
];

/// Phrases that introduce the rewritten copy, highest priority first
pub const REWRITTEN_MARKERS: &[&str] = &[
    "爆款视频文案如下：",
    "改写建议：",
    "改写建议:",
    "改写：",
    "改写:",
    "viral rewrite:",
    "rewritten version:",
];

/// Terms that hint at original-transcript content without a marker
pub const ORIGINAL_KEYWORDS: &[&str] = &[
    "原视频文案",
    "原始文案",
    "原文",
    "original text",
    "original transcript",
];

/// Terms that hint at rewritten content without a marker
pub const REWRITTEN_KEYWORDS: &[&str] = &[
    "爆款视频文案",
    "改写建议",
    "改写",
    "viral rewrite",
    "rewritten version",
];

/// Find the first marker in table order that occurs in `text`
///
/// Table order is priority order: an earlier entry wins even when it occurs
/// later in the text. Returns the byte position of its first occurrence.
pub fn find_first<'m>(text: &str, markers: &[&'m str]) -> Option<(usize, &'m str)> {
    for &marker in markers {
        if let Some(pos) = text.find(marker) {
            return Some((pos, marker));
        }
    }
    None
}

/// Earliest byte position at or after `from` where any marker in the table
/// occurs
pub fn earliest_after(text: &str, from: usize, markers: &[&str]) -> Option<usize> {
    markers
        .iter()
        .filter_map(|marker| text[from..].find(marker).map(|pos| from + pos))
        .min()
}

/// True when one chunk of text carries a complete answer: at least one
/// original keyword and one rewritten keyword together
pub fn has_complete_answer(text: &str) -> bool {
    ORIGINAL_KEYWORDS.iter().any(|k| text.contains(k))
        && REWRITTEN_KEYWORDS.iter().any(|k| text.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_first_prefers_table_order() {
        // 原文： occurs earlier in the text, but 原始文案： outranks it
        let text = "原文：早出现的段落\n原始文案：后出现但优先级更高";
        let (pos, marker) = find_first(text, ORIGINAL_MARKERS).unwrap();
        assert_eq!(marker, "原始文案：");
        assert_eq!(&text[pos..pos + marker.len()], "原始文案：");
    }

    #[test]
    fn test_find_first_falls_down_the_table() {
        let text = "前言 original transcript: the spoken words";
        let (_, marker) = find_first(text, ORIGINAL_MARKERS).unwrap();
        assert_eq!(marker, "original transcript:");
    }

    #[test]
    fn test_find_first_no_match() {
        assert_eq!(find_first("没有任何标记的文本", REWRITTEN_MARKERS), None);
    }

    #[test]
    fn test_earliest_after_takes_minimum_position() {
        let text = "开头 改写：次要 爆款视频文案如下：主要";
        // 改写： appears before 爆款视频文案如下： in the text
        let earliest = earliest_after(text, 0, REWRITTEN_MARKERS).unwrap();
        assert_eq!(earliest, text.find("改写：").unwrap());
    }

    #[test]
    fn test_earliest_after_respects_from() {
        let text = "改写：一 改写：二";
        let first_end = "改写：".len();
        let second = text.rfind("改写：").unwrap();
        assert_eq!(earliest_after(text, first_end, REWRITTEN_MARKERS), Some(second));
        assert_eq!(earliest_after(text, second + "改写：".len(), REWRITTEN_MARKERS), None);
    }

    #[test]
    fn test_has_complete_answer_chinese() {
        assert!(has_complete_answer("原视频文案如下：甲\n爆款视频文案如下：乙"));
        assert!(has_complete_answer("原始文案和改写建议都在这里"));
    }

    #[test]
    fn test_has_complete_answer_english() {
        assert!(has_complete_answer("original text follows: a\nviral rewrite: b"));
    }

    #[test]
    fn test_has_complete_answer_requires_both_sides() {
        assert!(!has_complete_answer("原视频文案如下：只有原文"));
        assert!(!has_complete_answer("改写建议：只有改写"));
        assert!(!has_complete_answer(""));
    }
}
