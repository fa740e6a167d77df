//! Command routing logic for CLI

use crate::args::{Cli, Commands, ConfigAction, GoalAction, NotebookAction};
use crate::commands;
use cb_tracker_core::TrackerConfig;

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli, config: TrackerConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Replay {
            events,
            dry_run,
            json,
        } => commands::replay::run(&config, &events, dry_run, json).await,
        Commands::Logs {
            net_id,
            course_id,
            json,
        } => commands::logs::fetch(&config, net_id, course_id, json).await,
        Commands::Export { events, kind, out } => {
            commands::export::run(&config, &events, kind, out.as_deref()).await
        }
        Commands::Notebook { action } => match action {
            NotebookAction::Register { path, activebook } => {
                commands::notebook::register(&config, &path, activebook).await
            }
        },
        Commands::Goal { action } => match action {
            GoalAction::Get { date } => commands::goal::get(&config, date.as_deref()),
            GoalAction::Set { minutes, date } => {
                commands::goal::set(&config, minutes, date.as_deref())
            }
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&config, cli.config.as_deref()),
            ConfigAction::Validate => commands::config::validate(&config),
        },
    }
}
