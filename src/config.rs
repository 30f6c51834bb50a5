use crate::models::PcapLayer;
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/api/v1/projects/default";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_RETRIES: u32 = 2;
const DEFAULT_PAGE_LIMIT: usize = 100;

/// wirebench - Protocol Inference Workbench Client
///
/// Terminal client for a protocol-reverse-engineering backend.
/// Configuration priority: CLI args > Environment variables > Defaults
#[derive(Parser, Debug)]
#[command(name = "wirebench")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Protocol inference workbench client", long_about = None)]
pub struct CliArgs {
    /// Backend API base URL (versioned project root)
    #[arg(long, env = "WIREBENCH_API_URL")]
    pub api_url: Option<String>,

    /// Request timeout in milliseconds (1000-60000)
    #[arg(long, env = "WIREBENCH_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Retry attempts for transient read failures (0-10)
    #[arg(long, env = "WIREBENCH_RETRIES")]
    pub retries: Option<u32>,

    /// Page size for list requests (1-1000)
    #[arg(long, env = "WIREBENCH_PAGE_LIMIT")]
    pub page_limit: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List symbols
    Symbols,
    /// List captures
    Captures,
    /// Render the navigation lists (symbols and captures)
    Nav {
        /// Symbol id to mark as the current selection
        #[arg(long)]
        current: Option<String>,
    },
    /// Create a symbol and re-render the symbol list
    CreateSymbol { name: String },
    /// Rename a symbol
    RenameSymbol { sid: String, name: String },
    /// Set a symbol's description
    DescribeSymbol { sid: String, description: String },
    /// Delete a symbol
    DeleteSymbol { sid: String },
    /// Show one symbol and its member messages
    ShowSymbol { sid: String },
    /// Print the aligned cell matrix of a symbol
    Cells { sid: String },
    /// Run field split/alignment on a symbol, then print its cells
    SplitAlign { sid: String },
    /// Generate one message rendering from a symbol's format
    Specialize { sid: String },
    /// Attach a message to a symbol
    Attach { sid: String, mid: String },
    /// Detach a message from a symbol
    Detach { sid: String, mid: String },
    /// Create a capture
    CreateCapture { name: String },
    /// List messages, optionally restricted to one capture
    Messages {
        #[arg(long)]
        capture: Option<String>,
    },
    /// Import a raw file, splitting it into messages on a delimiter
    ImportRaw {
        file: PathBuf,
        /// Message delimiter within the file
        #[arg(long, default_value = "\n")]
        delimiter: String,
    },
    /// Import a packet capture
    ImportPcap {
        file: PathBuf,
        /// Import layer: raw, link, network, transport or application
        #[arg(long, default_value = "application", value_parser = clap::value_parser!(PcapLayer))]
        layer: PcapLayer,
        /// BPF filter expression applied while parsing
        #[arg(long)]
        filter: Option<String>,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub timeout_ms: u64,
    pub retries: u32,
    pub page_limit: usize,
}

pub fn load(args: &CliArgs) -> Result<Config> {
    let base_url = args
        .api_url
        .clone()
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let timeout_ms = args.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
    if !(1_000..=60_000).contains(&timeout_ms) {
        return Err(anyhow!(
            "timeout_ms must be between 1000 and 60000, got {timeout_ms}"
        ));
    }

    let retries = args.retries.unwrap_or(DEFAULT_RETRIES);
    if retries > 10 {
        return Err(anyhow!("retries must be between 0 and 10, got {retries}"));
    }

    let page_limit = args.page_limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if !(1..=1_000).contains(&page_limit) {
        return Err(anyhow!(
            "page_limit must be between 1 and 1000, got {page_limit}"
        ));
    }

    Ok(Config {
        base_url,
        timeout_ms,
        retries,
        page_limit,
    })
}
