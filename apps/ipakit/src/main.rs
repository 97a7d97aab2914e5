//! ipakit - App Store package retrieval and patching tool
//!
//! The CLI application that drives sign-in, catalog queries, license
//! acquisition, and package downloads through the library crates.

mod cli;
mod commands;
mod display;
mod error;
mod events;

use crate::cli::{AuthCommands, Cli, Commands, FormatArg};
use crate::commands::{CommandContext, CommandOutput};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use ipakit_config::Config;
use ipakit_errors::UserFacingError;
use ipakit_events::EventReceiver;
use ipakit_types::OutputFormat;
use std::process;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.format == Some(FormatArg::Json);

    init_tracing(json_mode, cli.global.verbose);

    if let Err(e) = run(cli).await {
        error!("Command failed: {e}");
        if json_mode {
            println!("{}", error_json(&e));
        } else {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting ipakit v{}", env!("CARGO_PKG_VERSION"));

    // Configuration precedence: file, then environment, then CLI flags
    let mut config = Config::load_or_default(&cli.global.config).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global);

    let json_output = config.general.default_output == OutputFormat::Json;
    let renderer = OutputRenderer::new(json_output, config.general.color);

    let (tx, rx) = ipakit_events::channel();
    let ctx = CommandContext::new(config, tx, !cli.global.non_interactive);
    let mut handler = EventHandler::new(json_output, cli.global.verbose);

    info!("Executing {} command", cli.command.name());
    let result = execute_command_with_events(cli.command, ctx, rx, &mut handler).await?;

    renderer.render_result(&result)?;

    info!("Command completed successfully");
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    ctx: CommandContext,
    mut rx: EventReceiver,
    handler: &mut EventHandler,
) -> Result<CommandOutput, CliError> {
    let mut command_future = Box::pin(execute_command(command, ctx));

    // Handle events concurrently with command execution
    loop {
        select! {
            // Command completed
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = rx.try_recv() {
                    handler.handle_event(event);
                }
                return result;
            }

            // Event received
            event = rx.recv() => {
                match event {
                    Some(event) => handler.handle_event(event),
                    None => { /* Channel closed: keep waiting for command to finish */ }
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(
    command: Commands,
    ctx: CommandContext,
) -> Result<CommandOutput, CliError> {
    match command {
        Commands::Auth { command } => match command {
            AuthCommands::Login {
                email,
                password,
                auth_code,
            } => commands::auth::login(&ctx, email, password, auth_code).await,
            AuthCommands::Info => commands::auth::info(&ctx).await,
            AuthCommands::Revoke => commands::auth::revoke(&ctx).await,
        },

        Commands::Search {
            term,
            limit,
            catalog,
        } => commands::search::run(&ctx, &term, limit, &catalog).await,

        Commands::Lookup { bundle_id, catalog } => {
            commands::lookup::run(&ctx, &bundle_id, &catalog).await
        }

        Commands::Purchase { bundle_id, catalog } => {
            commands::purchase::run(&ctx, &bundle_id, &catalog).await
        }

        Commands::Download {
            bundle_id,
            output,
            purchase,
            catalog,
        } => commands::download::run(&ctx, &bundle_id, output, purchase, &catalog).await,
    }
}

/// Apply CLI flag overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &cli::GlobalArgs) {
    if let Some(format) = global.format {
        config.general.default_output = match format {
            FormatArg::Text => OutputFormat::Tty,
            FormatArg::Json => OutputFormat::Json,
        };
    }
    if let Some(color) = global.color {
        config.general.color = color;
    }
}

/// Machine readable rendering of a failed command
fn error_json(error: &CliError) -> String {
    let body = match error {
        CliError::Operation(e) => serde_json::json!({
            "success": false,
            "error": e.user_message(),
            "code": e.user_code(),
            "hint": e.user_hint(),
        }),
        other => serde_json::json!({
            "success": false,
            "error": other.to_string(),
        }),
    };
    body.to_string()
}

/// Logs go to stderr so stdout stays reserved for command output
fn init_tracing(json_mode: bool, verbose: bool) {
    let default_filter = if verbose { "info,ipakit=debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    if json_mode {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }
}
