use std::io::{self, BufRead};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use eyre::{Result, bail};
use log::{debug, info};

mod cli;

use cli::{Cli, OutputFormat};

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("dcx.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dcx")
        .join("logs")
}

/// Retry an async operation with exponential backoff
async fn retry<F, Fut, T>(max_attempts: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut last_err = None;
    for attempt in 0..max_attempts {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(e) => {
                if attempt + 1 < max_attempts {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    debug!("Attempt {} failed: {e}, retrying in {delay:?}", attempt + 1);
                    tokio::time::sleep(delay).await;
                }
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let cli = Cli::parse();

    // Load config file (non-fatal if missing/invalid)
    let config = dcx::config::Config::load().unwrap_or_default();

    if cli.verbose {
        let config_path = dcx::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
    }

    // CLI flags take priority over the config file
    let api_base = cli
        .api_base
        .clone()
        .or_else(|| config.api_base.clone())
        .unwrap_or_else(|| dcx::coze::DEFAULT_API_BASE.to_string());
    let api_key = config.resolve_api_key();

    if cli.serve {
        let options = dcx::relay::RelayOptions {
            host: cli.host.clone(),
            port: cli.port.or(config.port).unwrap_or(3000),
            api_base,
            api_key,
            static_dir: cli.static_dir.clone().or_else(|| config.static_dir.clone()),
        };
        return dcx::relay::run_relay(options).await;
    }

    let bot_id = cli
        .bot_id
        .clone()
        .or_else(|| config.bot_id.clone())
        .unwrap_or_else(|| dcx::coze::DEFAULT_BOT_ID.to_string());
    let format = cli
        .format
        .or_else(|| config.default_format.as_deref().and_then(OutputFormat::from_name))
        .unwrap_or(OutputFormat::Text);

    let client = reqwest::Client::new();

    // Collect links: from arg or stdin
    let urls = if let Some(ref url) = cli.url {
        vec![url.clone()]
    } else {
        let stdin = io::stdin();
        stdin.lock().lines().collect::<Result<Vec<_>, _>>()?
    };

    if urls.is_empty() {
        bail!("no share link provided\n\nUsage: dcx <LINK>\n       echo <LINK> | dcx");
    }

    for url_input in &urls {
        let url_input = url_input.trim().to_string();
        if url_input.is_empty() {
            continue;
        }

        let link = dcx::extract_share_link(&url_input)
            .ok_or_else(|| eyre::eyre!("could not find a Douyin link in: {url_input}\n\nSupported formats:\n  https://v.douyin.com/CODE/\n  https://www.douyin.com/video/ID\n  https://www.iesdouyin.com/share/video/ID\n  share text containing one of the above"))?;

        info!("Analyzing {link}");
        let request = dcx::coze::ChatRequest::for_video(&bot_id, &link);

        let raw = retry(3, || {
            let client = &client;
            let api_base = api_base.as_str();
            let api_key = api_key.as_str();
            let request = &request;
            async move { dcx::coze::request_analysis(client, api_base, api_key, request).await }
        })
        .await?;

        let result = dcx::extract::extract(&raw);
        if result.is_empty() {
            info!("No copy sections recovered from {link}");
        }

        if cli.verbose {
            eprintln!(
                "Link: {link}\nResponse: {} chars\nOriginal found: {}\nRewrite found: {}",
                raw.chars().count(),
                result.original != dcx::ORIGINAL_MISSING,
                result.rewritten != dcx::REWRITTEN_MISSING,
            );
        }

        let rendered = match format {
            OutputFormat::Text => dcx::output::render_text(&result),
            OutputFormat::Json => dcx::output::render_json(&result),
            OutputFormat::Markdown => dcx::output::render_markdown(&result),
        };

        if let Some(ref path) = cli.output {
            std::fs::write(path, &rendered)?;
            if cli.verbose {
                eprintln!("Output written to: {}", path.display());
            }
        } else {
            println!("{rendered}");
        }
    }

    Ok(())
}
