use log::debug;
use serde_json::Value;

use crate::markers;

/// Candidate content and reasoning trace reduced from one response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub content: String,
    pub reasoning: String,
}

/// Reduce a raw response body to a normalized payload
///
/// Tries, in order: the body as one JSON document, the body as an SSE-style
/// stream of `data:` lines, a JSON object embedded in surrounding prose, and
/// finally the body itself as plain text. Never fails.
pub fn normalize(raw: &str) -> Normalized {
    if let Some(normalized) = parse_document(raw) {
        debug!("Normalized as JSON document ({} content chars)", normalized.content.chars().count());
        return normalized;
    }
    if let Some(normalized) = parse_sse_stream(raw) {
        debug!("Normalized as SSE stream ({} content chars)", normalized.content.chars().count());
        return normalized;
    }
    if let Some(normalized) = parse_embedded(raw) {
        debug!("Normalized from embedded JSON ({} content chars)", normalized.content.chars().count());
        return normalized;
    }
    debug!("No structure recognized, using raw body as content");
    Normalized {
        content: raw.to_string(),
        reasoning: String::new(),
    }
}

/// The whole body as one JSON document
fn parse_document(raw: &str) -> Option<Normalized> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let content = resolve_content(&value)?;
    Some(Normalized {
        reasoning: resolve_reasoning(&value),
        content,
    })
}

/// An SSE-style stream of `data:` lines carrying JSON chunks
///
/// `content` accumulates only from chunks typed `answer` that carry no
/// reasoning; `reasoning_content` accumulates from every chunk. A single
/// chunk containing both a complete original and rewrite overrides whatever
/// accumulated, last such chunk wins.
fn parse_sse_stream(raw: &str) -> Option<Normalized> {
    if !raw.lines().any(|line| line.trim_start().starts_with("data:")) {
        return None;
    }

    let mut content = String::new();
    let mut reasoning = String::new();
    let mut complete_answer: Option<String> = None;

    for line in raw.lines() {
        let Some(payload) = line.trim_start().strip_prefix("data:") else {
            continue;
        };
        // Malformed chunks and the [DONE] terminator are skipped, never fatal
        let Ok(chunk) = serde_json::from_str::<Value>(payload.trim()) else {
            continue;
        };

        let chunk_reasoning = chunk.get("reasoning_content").and_then(Value::as_str);
        if let Some(text) = chunk_reasoning {
            reasoning.push_str(text);
        }

        let Some(text) = chunk.get("content").and_then(Value::as_str) else {
            continue;
        };
        if markers::has_complete_answer(text) {
            complete_answer = Some(text.to_string());
        }
        if chunk_reasoning.is_none() && chunk.get("type").and_then(Value::as_str) == Some("answer") {
            content.push_str(text);
        }
    }

    let content = complete_answer.unwrap_or(content);
    if content.is_empty() {
        return None;
    }
    Some(Normalized { content, reasoning })
}

/// A JSON object embedded in surrounding prose, first `{` to last `}`
fn parse_embedded(raw: &str) -> Option<Normalized> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    let value: Value = serde_json::from_str(&raw[start..=end]).ok()?;
    let content = resolve_content(&value)?;
    Some(Normalized {
        reasoning: resolve_reasoning(&value),
        content,
    })
}

/// Field-resolution order for a JSON document; first non-empty string wins
fn resolve_content(value: &Value) -> Option<String> {
    if let Some(content) = str_at(value, &["message", "content"]) {
        return Some(content);
    }
    if let Some(content) = str_at(value, &["content"]) {
        return Some(content);
    }
    if let Some(content) = value
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| str_at(choice, &["message", "content"]))
    {
        return Some(content);
    }
    if let Some(data) = value.get("data") {
        if let Some(content) = nested_content(data) {
            return Some(content);
        }
        // A data array: first element's content, else its message
        if let Some(first) = data.as_array().and_then(|items| items.first()) {
            if let Some(content) = str_at(first, &["content"]).or_else(|| str_at(first, &["message"])) {
                return Some(content);
            }
        }
    }
    if let Some(content) = value.get("result").and_then(nested_content) {
        return Some(content);
    }
    if let Some(content) = value.get("response").and_then(nested_content) {
        return Some(content);
    }
    // Last resort: first field in document order holding a long string
    if let Some(map) = value.as_object() {
        for field in map.values() {
            if let Some(text) = field.as_str() {
                if text.chars().count() > 50 {
                    return Some(text.to_string());
                }
            }
        }
    }
    None
}

/// A value as a content carrier: a plain string, its `content`, or its
/// `message.content`
fn nested_content(value: &Value) -> Option<String> {
    if let Some(text) = value.as_str().filter(|text| !text.is_empty()) {
        return Some(text.to_string());
    }
    str_at(value, &["content"]).or_else(|| str_at(value, &["message", "content"]))
}

fn resolve_reasoning(value: &Value) -> String {
    str_at(value, &["reasoning_content"])
        .or_else(|| str_at(value, &["message", "reasoning_content"]))
        .unwrap_or_default()
}

/// Non-empty string at a nested key path
fn str_at(value: &Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    current.as_str().filter(|text| !text.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_document_message_content() {
        let normalized = normalize(r#"{"message": {"content": "正文内容", "reasoning_content": "想了想"}}"#);
        assert_eq!(normalized.content, "正文内容");
        assert_eq!(normalized.reasoning, "想了想");
    }

    #[test]
    fn test_document_top_level_content() {
        let normalized = normalize(r#"{"content": "直接内容", "reasoning_content": "推理"}"#);
        assert_eq!(normalized.content, "直接内容");
        assert_eq!(normalized.reasoning, "推理");
    }

    #[test]
    fn test_document_resolution_order() {
        // message.content outranks a top-level content field
        let normalized = normalize(r#"{"content": "次要", "message": {"content": "优先"}}"#);
        assert_eq!(normalized.content, "优先");
    }

    #[test]
    fn test_document_choices() {
        let normalized =
            normalize(r#"{"choices": [{"message": {"content": "来自choices"}}]}"#);
        assert_eq!(normalized.content, "来自choices");
    }

    #[test]
    fn test_document_data_string() {
        let normalized = normalize(r#"{"data": "字符串数据"}"#);
        assert_eq!(normalized.content, "字符串数据");
    }

    #[test]
    fn test_document_data_object() {
        let normalized = normalize(r#"{"data": {"message": {"content": "嵌套数据"}}}"#);
        assert_eq!(normalized.content, "嵌套数据");
    }

    #[test]
    fn test_document_data_array() {
        let normalized = normalize(r#"{"data": [{"content": "数组第一项"}, {"content": "第二项"}]}"#);
        assert_eq!(normalized.content, "数组第一项");

        let normalized = normalize(r#"{"data": [{"message": "消息字段"}]}"#);
        assert_eq!(normalized.content, "消息字段");
    }

    #[test]
    fn test_document_result_and_response() {
        assert_eq!(normalize(r#"{"result": "结果"}"#).content, "结果");
        assert_eq!(normalize(r#"{"response": {"content": "回应"}}"#).content, "回应");
    }

    #[test]
    fn test_document_long_string_fallback() {
        // No known field name; the first sufficiently long string in
        // document order is taken
        let long = "这段文本特别长，足以超过五十个字符的门槛，因此应当被兜底策略选中作为候选内容来使用，后面再补充一些字数凑够长度。";
        assert!(long.chars().count() > 50);
        let raw = format!(r#"{{"id": "short", "body": "{long}", "tail": "{long}末尾"}}"#);
        assert_eq!(normalize(&raw).content, long);
    }

    #[test]
    fn test_document_short_strings_fall_through_to_raw() {
        let raw = r#"{"id": "abc", "status": "ok"}"#;
        let normalized = normalize(raw);
        assert_eq!(normalized.content, raw);
        assert_eq!(normalized.reasoning, "");
    }

    #[test]
    fn test_sse_accumulates_answer_chunks() {
        let raw = concat!(
            "data: {\"content\": \"今天\", \"type\": \"answer\"}\n",
            "data: {\"content\": \"分享三个技巧\", \"type\": \"answer\"}\n",
            "data: [DONE]\n",
        );
        let normalized = normalize(raw);
        assert_eq!(normalized.content, "今天分享三个技巧");
        assert_eq!(normalized.reasoning, "");
    }

    #[test]
    fn test_sse_accumulates_reasoning() {
        let raw = concat!(
            "data: {\"reasoning_content\": \"先想\"}\n",
            "data: {\"reasoning_content\": \"再想\"}\n",
            "data: {\"content\": \"答案正文\", \"type\": \"answer\"}\n",
        );
        let normalized = normalize(raw);
        assert_eq!(normalized.content, "答案正文");
        assert_eq!(normalized.reasoning, "先想再想");
    }

    #[test]
    fn test_sse_skips_untyped_content() {
        let raw = concat!(
            "data: {\"content\": \"进度提示\", \"type\": \"verbose\"}\n",
            "data: {\"content\": \"正式回答\", \"type\": \"answer\"}\n",
        );
        assert_eq!(normalize(raw).content, "正式回答");
    }

    #[test]
    fn test_sse_chunk_with_reasoning_does_not_add_content() {
        let raw = concat!(
            "data: {\"reasoning_content\": \"思考\", \"content\": \"不该累计\", \"type\": \"answer\"}\n",
            "data: {\"content\": \"该累计\", \"type\": \"answer\"}\n",
        );
        let normalized = normalize(raw);
        assert_eq!(normalized.content, "该累计");
        assert_eq!(normalized.reasoning, "思考");
    }

    #[test]
    fn test_sse_complete_answer_overrides_accumulation() {
        let complete = "原视频文案如下：完整原文\n爆款视频文案如下：完整改写";
        let raw = format!(
            "data: {{\"content\": \"零碎\", \"type\": \"answer\"}}\ndata: {{\"content\": \"{}\", \"type\": \"follow_up\"}}\n",
            complete.replace('\n', "\\n")
        );
        assert_eq!(normalize(&raw).content, complete);
    }

    #[test]
    fn test_sse_last_complete_answer_wins() {
        let first = "原始文案：第一版 改写建议：第一版改写";
        let second = "原始文案：第二版 改写建议：第二版改写";
        let raw = format!(
            "data: {{\"content\": \"{first}\", \"type\": \"answer\"}}\ndata: {{\"content\": \"{second}\", \"type\": \"answer\"}}\n"
        );
        assert_eq!(normalize(&raw).content, second);
    }

    #[test]
    fn test_sse_malformed_chunks_skipped() {
        let raw = concat!(
            "data: not json at all\n",
            "event: ping\n",
            "data: {\"content\": \"有效内容\", \"type\": \"answer\"}\n",
        );
        assert_eq!(normalize(raw).content, "有效内容");
    }

    #[test]
    fn test_sse_reasoning_only_stream_falls_through() {
        // No content chunks at all: the SSE stage yields nothing and the
        // raw body becomes the candidate
        let raw = "data: {\"reasoning_content\": \"只有思考\"}\n";
        let normalized = normalize(raw);
        assert_eq!(normalized.content, raw);
        assert_eq!(normalized.reasoning, "");
    }

    #[test]
    fn test_embedded_json() {
        let raw = "模型回复如下。\n{\"content\": \"嵌在文字里的内容\"}\n以上。";
        assert_eq!(normalize(raw).content, "嵌在文字里的内容");
    }

    #[test]
    fn test_embedded_json_invalid_slice_falls_through() {
        let raw = "左边{右边}都不是JSON";
        assert_eq!(normalize(raw).content, raw);
    }

    #[test]
    fn test_raw_fallback() {
        let raw = "纯文本回复，没有任何结构。";
        let normalized = normalize(raw);
        assert_eq!(normalized.content, raw);
        assert_eq!(normalized.reasoning, "");
    }

    #[test]
    fn test_empty_content_fields_skipped() {
        let normalized = normalize(r#"{"message": {"content": ""}, "content": "非空的那个"}"#);
        assert_eq!(normalized.content, "非空的那个");
    }
}
