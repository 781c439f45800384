use eyre::{Result, bail};
use log::debug;
use serde::Serialize;
use uuid::Uuid;

/// Production API base
pub const DEFAULT_API_BASE: &str = "https://api.coze.cn";

/// Chat completion path under the API base
pub const CHAT_PATH: &str = "/v3/chat";

/// The copy-analysis bot this tool was built around
pub const DEFAULT_BOT_ID: &str = "7475718510476509221";

/// One chat message in a request
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    pub content_type: String,
}

/// Body of a `/v3/chat` request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub bot_id: String,
    pub user_id: String,
    pub stream: bool,
    pub auto_save_history: bool,
    pub additional_messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Analysis request for one video link: a single user message carrying
    /// the link, streamed reply, history kept server side
    pub fn for_video(bot_id: &str, video_url: &str) -> Self {
        Self {
            bot_id: bot_id.to_string(),
            user_id: generate_user_id(),
            stream: true,
            auto_save_history: true,
            additional_messages: vec![ChatMessage {
                role: "user".to_string(),
                content: video_url.to_string(),
                content_type: "text".to_string(),
            }],
        }
    }
}

/// Fresh per-request user id
pub fn generate_user_id() -> String {
    format!("user_{}", Uuid::new_v4().simple())
}

/// Send an analysis request and buffer the whole response body, streamed or
/// not, into one string
pub async fn request_analysis(
    client: &reqwest::Client,
    api_base: &str,
    api_key: &str,
    request: &ChatRequest,
) -> Result<String> {
    let url = format!("{}{}", api_base.trim_end_matches('/'), CHAT_PATH);
    debug!("Requesting analysis from {url} for bot {}", request.bot_id);

    let resp = client
        .post(&url)
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .json(request)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("Coze API returned {status}: {body}");
    }

    let body = resp.text().await?;
    debug!("Response body: {} chars", body.chars().count());
    Ok(body)
}
