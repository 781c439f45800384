use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

impl OutputFormat {
    /// Parse a config-file format name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "dcx",
    about = "Douyin copy extractor: original script plus viral rewrite via a Coze bot",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Douyin share link or share text (reads from stdin if omitted)
    pub url: Option<String>,

    /// Output format: text (default), json, markdown
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Coze bot to send the link to
    #[arg(long)]
    pub bot_id: Option<String>,

    /// Coze API base URL
    #[arg(long)]
    pub api_base: Option<String>,

    /// Run the web relay instead of analyzing a link
    #[arg(long)]
    pub serve: bool,

    /// Relay bind address
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Relay port (default: 3000)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory with the web frontend to serve
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// Show request and extraction metadata
    #[arg(short, long)]
    pub verbose: bool,
}
