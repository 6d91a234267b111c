use cadence_core::error::CoreError;
use cadence_core::store::JsonFileTaskStore;
use clap::Parser;
use owo_colors::{OwoColorize, Style};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod parser;
mod util;
mod views;

const LOG_ENV: &str = "CADENCE_LOG";

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::Config::new().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not load configuration, using defaults");
        config::Config::default()
    });

    let store = match JsonFileTaskStore::open(&config.store_path).await {
        Ok(store) => store,
        Err(e) => {
            handle_error(e.into());
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        cli::Commands::Add(command) => commands::add::add_task(&store, command).await,
        cli::Commands::List(command) => commands::list::list_tasks(&store, command, &config).await,
        cli::Commands::Show(command) => commands::show::show_task(&store, command).await,
        cli::Commands::Edit(command) => commands::edit::edit_task(&store, command).await,
        cli::Commands::Preview(command) => commands::preview::preview_series(&store, command).await,
        cli::Commands::Move(command) => commands::r#move::move_task(&store, command).await,
        cli::Commands::Done(command) => commands::done::complete_task(&store, command).await,
        cli::Commands::Delete(command) => commands::delete::delete_task(&store, command).await,
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so they never mix with command output.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    match err.downcast_ref::<CoreError>() {
        Some(CoreError::NotFound(s)) => {
            eprintln!("{} {}", "Error:".style(error_style), s);
        }
        Some(CoreError::AmbiguousId(tasks)) => {
            eprintln!("{}", "Error: Ambiguous ID.".style(error_style));
            eprintln!("Did you mean one of these?");
            for (id, title) in tasks {
                eprintln!("  {} ({})", id.yellow(), title);
            }
        }
        Some(CoreError::InvalidInput(s)) => {
            eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
        }
        Some(CoreError::InvalidDate(s)) => {
            eprintln!("{} Invalid date: {}", "Error:".style(error_style), s);
        }
        Some(CoreError::Serialization(e)) => {
            eprintln!(
                "{} The task file is not valid JSON: {}",
                "Error:".style(error_style),
                e
            );
        }
        _ => eprintln!("{} {:#}", "Error:".style(error_style), err),
    }
}
