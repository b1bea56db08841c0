use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

mod cli;

use canvasiq::canvas::{CanvasArchive, CanvasOrchestrator, Tile};
use canvasiq::config::Config;
use canvasiq::id::generate_session_id;
use canvasiq::llm::{AnthropicClient, AnthropicConfig};
use canvasiq::planner::LlmPlanner;
use canvasiq::service::CanvasService;
use canvasiq::session::{Reaper, SessionStore};
use canvasiq::tools::{ToolDispatcher, ToolRegistry};
use cli::Cli;
use cli::commands::Commands;

type Service = CanvasService<LlmPlanner<AnthropicClient>>;

fn setup_logging(config: &Config) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("canvasiq")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("canvasiq.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let default_filter = config.log_level.as_deref().unwrap_or("info");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn build_registry(config: &Config) -> Result<Arc<ToolRegistry>> {
    let registry = ToolRegistry::standard(&config.tools).context("Failed to build tool registry")?;
    Ok(Arc::new(registry))
}

fn build_service(config: &Config, store: Arc<SessionStore>) -> Result<Service> {
    let registry = build_registry(config)?;
    let client = AnthropicClient::from_env(&config.planner.api_key_env, AnthropicConfig::from(&config.planner))
        .context("Failed to create LLM client")?;
    let planner = LlmPlanner::new(client, registry.definitions());

    let orchestrator = CanvasOrchestrator::new(
        Arc::new(planner),
        Arc::new(ToolDispatcher::new(registry)),
        store,
    )
    .with_archive(CanvasArchive::from_config(&config.archive));

    Ok(CanvasService::new(orchestrator))
}

fn print_summary(tiles: &[Tile]) {
    if tiles.is_empty() {
        println!("{}", "No tiles produced".yellow());
        return;
    }
    for tile in tiles {
        println!(
            "  {} {:<6} {}",
            format!("[{}]", tile.position).dimmed(),
            tile.tile_type.as_str().cyan(),
            tile.title.bold()
        );
    }
}

async fn handle_generate_command(prompt: &str, context: &str, session: Option<&str>, config: &Config) -> Result<()> {
    let session_id = session.map(str::to_string).unwrap_or_else(generate_session_id);
    info!("Generating canvas for session {}: {}", session_id, prompt);

    let store = Arc::new(SessionStore::from_config(&config.session));
    let service = build_service(config, store)?;
    service.ensure_session(&session_id).await;

    let tiles = service
        .orchestrator()
        .generate_canvas(&session_id, prompt, context)
        .await
        .context("Canvas generation failed")?;

    println!("{}", serde_json::to_string_pretty(&tiles)?);
    Ok(())
}

async fn handle_interactive_command(session: Option<&str>, config: &Config, verbose: bool) -> Result<()> {
    let session_id = session.map(str::to_string).unwrap_or_else(generate_session_id);
    info!("Starting interactive session {}", session_id);

    let store = Arc::new(SessionStore::from_config(&config.session));
    let service = build_service(config, store.clone())?;
    let reaper = Reaper::spawn(store, config.session.reap_interval());
    service.ensure_session(&session_id).await;

    println!("{} {}", "Session:".green(), session_id);
    println!("{}", "Enter a prompt per line, Ctrl-D to finish".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }

        service.ensure_session(&session_id).await;
        match service.touch_and_run(&session_id, prompt).await {
            Ok(tiles) => print_summary(&tiles),
            Err(e) => println!("{} {}", "Error:".red(), e),
        }
    }

    let total = service.get_session(&session_id).await.len();
    println!("{} {} tiles in session {}", "Done:".green(), total, session_id);

    let stats = reaper.shutdown().await;
    if verbose {
        println!(
            "Reaper: {} ticks, {} sessions reaped",
            stats.tick_count, stats.total_reaped
        );
    }
    Ok(())
}

fn handle_tools_command(config: &Config) -> Result<()> {
    let registry = build_registry(config)?;
    println!("{}", "Registered tools:".green());
    for definition in registry.definitions() {
        println!("{}", definition.to_prompt_line());
    }
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Generate {
            prompt,
            context,
            session,
        } => handle_generate_command(prompt, context, session.as_deref(), config).await,
        Commands::Interactive { session } => {
            handle_interactive_command(session.as_deref(), config, cli.is_verbose()).await
        }
        Commands::Tools => handle_tools_command(config),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging with the configured default level
    setup_logging(&config).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
