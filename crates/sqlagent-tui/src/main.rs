use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use sqlagent_core::{logging, AgentClient, Config};

mod app;
mod cli;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{AppEvent, EventHandler};

#[derive(Parser)]
#[command(name = "sqlagent")]
#[command(about = "Ask a SQL agent questions about your data", version)]
struct Cli {
    /// Chat endpoint URL (overrides SQLAGENT_ENDPOINT and the config file)
    #[arg(short, long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Full-screen chat (default)
    Tui,
    /// Ask a single question and print the answer
    Ask {
        /// Your question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Line-by-line chat on stdin/stdout
    Repl,
    /// Check whether the backend is up
    Health,
    /// Show or change saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file location and effective endpoint
    Show,
    /// Save the chat endpoint used when no override is given
    SetEndpoint { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("{} {}", "Ignoring config:".yellow(), e);
        Config::new()
    });
    let endpoint = config.resolve_endpoint(args.endpoint.as_deref());

    let command = args.command.unwrap_or(Commands::Tui);
    if matches!(command, Commands::Tui) {
        init_file_logging(&config);
    } else {
        logging::init_stderr();
    }
    tracing::debug!(%endpoint, "resolved endpoint");

    match command {
        Commands::Tui => run_tui(client(&endpoint)?).await,
        Commands::Ask { question } => {
            if !cli::ask(client(&endpoint)?, &question.join(" ")).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Repl => cli::repl(client(&endpoint)?).await,
        Commands::Health => {
            if !cli::health(client(&endpoint)?).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Config { action } => run_config(action, &config, &endpoint),
    }
}

fn client(endpoint: &str) -> Result<AgentClient> {
    AgentClient::new(endpoint).context("check --endpoint, SQLAGENT_ENDPOINT, or the config file")
}

fn init_file_logging(config: &Config) {
    let path = match config.log_file.clone() {
        Some(path) => path,
        None => match logging::default_log_path() {
            Ok(path) => path,
            Err(e) => {
                eprintln!("Logging disabled: {}", e);
                return;
            }
        },
    };
    if let Err(e) = logging::init_file(&path) {
        eprintln!("Logging disabled: {:#}", e);
    }
}

fn run_config(action: ConfigAction, config: &Config, endpoint: &str) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{} {}", "Config file:".bold(), Config::get_config_path()?.display());
            println!("{} {}", "Endpoint:".bold(), endpoint.cyan());
            if let Some(log_file) = &config.log_file {
                println!("{} {}", "Log file:".bold(), log_file.display());
            }
        }
        ConfigAction::SetEndpoint { url } => {
            // Reject URLs the client could never use before persisting them.
            AgentClient::new(&url)?;
            Config::save_endpoint(&url)?;
            println!("{} {}", "Saved endpoint".green(), url.cyan());
        }
    }
    Ok(())
}

async fn run_tui(client: AgentClient) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let tx = events.sender();

    // Probe the backend once so the header can show whether it is reachable
    let probe = client.clone();
    let tx_health = tx.clone();
    tokio::spawn(async move {
        let _ = tx_health.send(AppEvent::HealthChecked(probe.health().await));
    });

    tracing::info!(endpoint = client.endpoint(), "starting chat");
    let mut app = App::new(client);

    let result: Result<()> = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event, &tx),
                None => break,
            }
        }
        Ok(())
    }
    .await;

    tui::restore()?;
    tracing::info!(messages = app.chat.transcript.len(), "chat closed");
    result
}
