pub mod config;
pub mod coze;
pub mod extract;
pub mod markers;
pub mod normalize;
pub mod output;
pub mod relay;

use serde::Serialize;

/// Shown when the response carried no reasoning trace
pub const THINKING_MISSING: &str = "未找到模型思考过程";

/// Shown when no original copy could be recovered
pub const ORIGINAL_MISSING: &str = "未找到原始文案";

/// Shown when no rewritten copy could be recovered
pub const REWRITTEN_MISSING: &str = "未找到改写建议";

/// Reasoning text reported for an empty response body
pub const EMPTY_RESPONSE: &str = "响应内容为空";

/// The three sections recovered from one bot reply
///
/// Every field is always populated: either extracted text or one of the
/// sentinel constants above. Frontends compare fields against the sentinels
/// by equality, so their exact values are part of the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    /// Accumulated model reasoning trace
    pub thinking: String,
    /// The video's original copy as transcribed by the bot
    pub original: String,
    /// The bot's viral rewrite of that copy
    pub rewritten: String,
}

impl ExtractionResult {
    /// True when neither copy section was found
    pub fn is_empty(&self) -> bool {
        self.original == ORIGINAL_MISSING && self.rewritten == REWRITTEN_MISSING
    }
}

/// Extract a Douyin video link from share text or a bare URL
pub fn extract_share_link(input: &str) -> Option<String> {
    let input = input.trim();

    // Short share link: v.douyin.com/CODE
    if let Some(caps) = regex::Regex::new(r"https?://v\.douyin\.com/([a-zA-Z0-9_-]+)/?")
        .unwrap()
        .captures(input)
    {
        return Some(format!("https://v.douyin.com/{}/", &caps[1]));
    }

    // Full web link: douyin.com/video/ID
    if let Some(caps) = regex::Regex::new(r"https?://(?:www\.)?douyin\.com/video/(\d+)")
        .unwrap()
        .captures(input)
    {
        return Some(format!("https://www.douyin.com/video/{}", &caps[1]));
    }

    // Share page link: iesdouyin.com/share/video/ID
    if let Some(caps) = regex::Regex::new(r"https?://(?:www\.)?iesdouyin\.com/share/video/(\d+)")
        .unwrap()
        .captures(input)
    {
        return Some(format!("https://www.iesdouyin.com/share/video/{}", &caps[1]));
    }

    None
}
