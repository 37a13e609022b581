use clap::Parser;
use color_eyre::Result;
use dailyflow::cli::{self, Cli, Commands};
use dailyflow::{Config, Profile, Workspace, logging};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match &cli.config {
        Some(path) => Config::load_from(Path::new(path), profile)?,
        None => Config::load_with_profile(profile)?,
    };
    config.validate()?;
    logging::init_tracing(&config.log_level);

    let command = cli.command.unwrap_or(Commands::Dashboard);

    // Reset works on the local database file directly and never opens a workspace
    if let Commands::Reset = command {
        cli::handle_reset(&config)?;
        return Ok(());
    }

    let workspace = Workspace::open(&config)?;

    match command {
        Commands::Dashboard => cli::handle_dashboard(&workspace).await?,
        Commands::Tasks { status, priority, search } => {
            cli::handle_tasks(&workspace, &status, &priority, search).await?
        }
        Commands::Notes { search } => cli::handle_notes(&workspace, &search).await?,
        Commands::Meetings { search, upcoming, date } => {
            cli::handle_meetings(&workspace, &search, upcoming, date).await?
        }
        Commands::AddTask { title, due, priority, description } => {
            cli::handle_add_task(&workspace, title, due, &priority, description).await?
        }
        Commands::AddNote { title, content, tags } => {
            cli::handle_add_note(&workspace, title, content, tags).await?
        }
        Commands::AddMeeting { title, date, time, duration, description } => {
            cli::handle_add_meeting(&workspace, title, &date, &time, duration, description).await?
        }
        Commands::ToggleTask { id } => cli::handle_toggle_task(&workspace, id).await?,
        Commands::Delete { kind, id } => cli::handle_delete(&workspace, kind, id).await?,
        Commands::Reset => {}
    }

    Ok(())
}
