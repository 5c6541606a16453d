use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use rtv_fetch::api::download::download_runtime_with;
use rtv_fetch::api::logging::init_tracing;
use rtv_fetch::{DownloadRequest, DownloaderConfig};

#[derive(Parser, Debug)]
#[command(about = "Download a runtime bundle into a local directory")]
struct CliArgs {
    /// Destination directory. A leading `~` is expanded.
    destination: String,

    /// Keep existing files in the destination.
    #[clap(long)]
    no_clear: bool,

    /// Runtime version to fetch. Discovered when omitted.
    #[clap(long = "version", value_name = "RTV")]
    rtv: Option<String>,

    /// Origin URL prefix, e.g. https://example.com. Looked up in the cache registry when omitted.
    #[clap(long)]
    url: Option<String>,

    /// Concurrent connection ceiling.
    #[clap(long)]
    max_connections: Option<usize>,

    /// TOML config file.
    #[clap(long)]
    config: Option<PathBuf>,
}

fn load_config(args: &CliArgs) -> Result<DownloaderConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            DownloaderConfig::from_toml_str(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => DownloaderConfig::default(),
    };
    if let Some(max) = args.max_connections {
        config.transport.max_connections = max;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let args = CliArgs::parse();
    let config = load_config(&args)?;

    let request = DownloadRequest {
        destination_path: args.destination.clone(),
        clear_before_write: Some(!args.no_clear),
        version: args.rtv.clone(),
        origin_url_prefix: args.url.clone(),
    };

    let result = download_runtime_with(config, &request).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
