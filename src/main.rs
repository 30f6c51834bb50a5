use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;

use wirebench::config::{self, CliArgs, Command};
use wirebench::{actions, ApiClient, CellGrid, JobProgress, Message, NavSync};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (safe to ignore if not found)
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = CliArgs::parse();
    let cfg = config::load(&args).context("Failed to load configuration")?;
    let api = ApiClient::over_http(&cfg).context("Failed to construct API client")?;

    run(&api, args.command).await
}

async fn run(api: &ApiClient, command: Command) -> Result<()> {
    match command {
        Command::Symbols => {
            for s in actions::list_symbols(api, api.default_page()).await? {
                println!("{}  {}  {}", s.id, s.name, s.description);
            }
        }
        Command::Captures => {
            for c in actions::list_captures(api, api.default_page()).await? {
                println!("{}  {}", c.id, c.name);
            }
        }
        Command::Nav { current } => {
            let mut nav = NavSync::new();
            nav.refresh(api, current.as_deref()).await?;
            print_nav(&nav);
        }
        Command::CreateSymbol { name } => {
            let mut nav = NavSync::new();
            let created = nav.create_symbol(api, &name).await?;
            println!("created symbol {}", created.id);
            print_nav(&nav);
        }
        Command::RenameSymbol { sid, name } => {
            let updated = actions::rename_symbol(api, &sid, &name).await?;
            println!("{}  {}  {}", updated.id, updated.name, updated.description);
        }
        Command::DescribeSymbol { sid, description } => {
            let updated = actions::describe_symbol(api, &sid, &description).await?;
            println!("{}  {}  {}", updated.id, updated.name, updated.description);
        }
        Command::DeleteSymbol { sid } => {
            actions::delete_symbol(api, &sid).await?;
            println!("deleted symbol {sid}");
        }
        Command::ShowSymbol { sid } => {
            let symbol = actions::get_symbol(api, &sid).await?;
            println!("{}  {}  {}", symbol.id, symbol.name, symbol.description);
            for m in actions::symbol_messages(api, &sid, api.default_page()).await? {
                print_message(&m);
            }
        }
        Command::Cells { sid } => {
            print_cells(&actions::symbol_cells(api, &sid).await?);
        }
        Command::SplitAlign { sid } => {
            let progress = JobProgress::default();
            with_progress(&progress, actions::split_align(api, &sid)).await?;
            print_cells(&actions::symbol_cells(api, &sid).await?);
        }
        Command::Specialize { sid } => {
            println!("{}", actions::specialize_symbol(api, &sid).await?);
        }
        Command::Attach { sid, mid } => {
            actions::attach_message(api, &sid, &mid).await?;
            println!("attached message {mid} to symbol {sid}");
        }
        Command::Detach { sid, mid } => {
            actions::detach_message(api, &sid, &mid).await?;
            println!("detached message {mid} from symbol {sid}");
        }
        Command::CreateCapture { name } => {
            let created = actions::create_capture(api, &name).await?;
            println!("created capture {}", created.id);
        }
        Command::Messages { capture } => {
            let messages = match capture {
                Some(cid) => actions::capture_messages(api, &cid, api.default_page()).await?,
                None => actions::list_messages(api, api.default_page()).await?,
            };
            for m in messages {
                print_message(&m);
            }
        }
        Command::ImportRaw { file, delimiter } => {
            let filename = file.display().to_string();
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {filename}"))?;
            let progress = JobProgress::default();
            let created = with_progress(
                &progress,
                actions::parse_raw(api, &filename, &content, &delimiter),
            )
            .await?;
            println!("imported {} messages", created.len());
        }
        Command::ImportPcap {
            file,
            layer,
            filter,
        } => {
            let filename = file.display().to_string();
            let content =
                std::fs::read(&file).with_context(|| format!("Failed to read {filename}"))?;
            let progress = JobProgress::default();
            let created = with_progress(
                &progress,
                actions::parse_pcap(api, &filename, &content, layer, filter.as_deref()),
            )
            .await?;
            println!("imported {} messages", created.len());
        }
    }
    Ok(())
}

/// Track a job on the shared progress value while a background ticker
/// mirrors that value to stderr.
async fn with_progress<T>(
    progress: &JobProgress,
    job: impl std::future::Future<Output = Result<T, wirebench::ApiError>>,
) -> Result<T, wirebench::ApiError> {
    let ticker_progress = progress.clone();
    let ticker = tokio::spawn(async move {
        loop {
            eprint!("\r[{:>3}%]", ticker_progress.percent());
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    });
    let out = progress.track(job).await;
    ticker.abort();
    eprintln!("\r[{:>3}%]", progress.percent());
    out
}

fn print_nav(nav: &NavSync) {
    println!("Symbols:");
    for entry in nav.symbols() {
        let marker = if entry.selected { "*" } else { " " };
        match &entry.id {
            Some(id) => println!(" {marker} {id}  {}", entry.label),
            None => println!("   ({})", entry.label),
        }
    }
    println!("Captures:");
    for entry in nav.captures() {
        match &entry.id {
            Some(id) => println!("   {id}  {}", entry.label),
            None => println!("   ({})", entry.label),
        }
    }
}

fn print_message(m: &Message) {
    let source = m.source.as_deref().unwrap_or("-");
    let destination = m.destination.as_deref().unwrap_or("-");
    println!("{}  {}  {} > {}  {}", m.id, m.cid, source, destination, m.data);
}

fn print_cells(grid: &CellGrid) {
    if grid.is_empty() {
        println!("(no cells)");
        return;
    }
    for row in &grid.0 {
        println!("{}", row.join(" | "));
    }
}
