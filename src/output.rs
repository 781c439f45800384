use crate::ExtractionResult;

/// Render the result as plain text with section rules
pub fn render_text(result: &ExtractionResult) -> String {
    format!(
        "--- 原始文案 ---\n{}\n\n--- 改写建议 ---\n{}\n\n--- 模型思考 ---\n{}",
        result.original, result.rewritten, result.thinking
    )
}

/// Render the result as pretty-printed JSON
pub fn render_json(result: &ExtractionResult) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
}

/// Render the result as Markdown sections
pub fn render_markdown(result: &ExtractionResult) -> String {
    format!(
        "## 原始文案\n\n{}\n\n## 改写建议\n\n{}\n\n## 模型思考\n\n{}",
        result.original, result.rewritten, result.thinking
    )
}
