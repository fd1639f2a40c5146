//! cmirror - local, content-verified mirror of the cargo registry
//!
//! This is the main CLI application; every command is delegated to the ops
//! crate while events are rendered as they arrive.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{install_target, Cli, Commands};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use cmirror_config::Config;
use cmirror_events::EventReceiver;
use cmirror_ops::{OperationResult, OpsContextBuilder, OpsCtx, UpdateOptions};
use cmirror_types::{ColorChoice, SyncStatus};
use std::process;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Exit status for a pass stopped by Ctrl-C
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.verbose, cli.global.debug);

    match run(cli).await {
        Ok((result, interrupted)) => {
            let code = exit_code(&result, interrupted);
            if code != 0 {
                process::exit(code);
            }
        }
        Err(e) => {
            error!("Application error: {}", e);
            if !json_mode {
                eprintln!("Error: {e}");
            }
            process::exit(if e.is_interrupt() { EXIT_INTERRUPTED } else { 1 });
        }
    }
}

/// Main application logic
///
/// Returns the command's result and whether the user interrupted it.
async fn run(cli: Cli) -> Result<(OperationResult, bool), CliError> {
    info!("Starting cmirror v{}", env!("CARGO_PKG_VERSION"));

    // File config (or defaults), then environment, then CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global);

    let (event_sender, event_receiver) = cmirror_events::channel();
    let cancel = CancellationToken::new();

    let ops_ctx = OpsContextBuilder::new()
        .with_event_sender(event_sender)
        .with_config(config.clone())
        .with_cancellation(cancel.clone())
        .build()?;

    let renderer = OutputRenderer::new(cli.global.json, config.general.color);
    let colors_enabled = match config.general.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    };
    let mut event_handler = EventHandler::new(colors_enabled, cli.global.json);

    let result = execute_command_with_events(
        cli.command,
        ops_ctx,
        event_receiver,
        &mut event_handler,
        &cancel,
    )
    .await?;

    renderer.render_result(&result)?;

    info!("Command completed");
    Ok((result, cancel.is_cancelled()))
}

/// Execute command with concurrent event handling
///
/// The first Ctrl-C cancels the running pass; the command is still awaited so
/// in-flight records clean up their partial files and the report is rendered.
/// A second Ctrl-C exits immediately.
async fn execute_command_with_events(
    command: Commands,
    ops_ctx: OpsCtx,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
    cancel: &CancellationToken,
) -> Result<OperationResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, ops_ctx));
    let mut interrupt = Box::pin(tokio::signal::ctrl_c());
    let mut listening = true;

    loop {
        select! {
            result = &mut command_future => {
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            signal = &mut interrupt, if listening => {
                if let Err(e) = signal {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                    listening = false;
                } else if cancel.is_cancelled() {
                    warn!("Second interrupt received, exiting");
                    process::exit(EXIT_INTERRUPTED);
                } else {
                    warn!("Interrupt received, stopping");
                    cancel.cancel();
                    interrupt.set(tokio::signal::ctrl_c());
                }
            }

            event = event_receiver.recv() => {
                match event {
                    Some(event) => event_handler.handle_event(event),
                    None => { /* Channel closed: keep waiting for command to finish */ }
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(command: Commands, ctx: OpsCtx) -> Result<OperationResult, CliError> {
    match command {
        Commands::New { dir } => {
            let info = cmirror_ops::new_mirror(&ctx, &dir).await?;
            Ok(OperationResult::Mirror(info))
        }

        Commands::Init { dir } => {
            let info = cmirror_ops::init_mirror(&ctx, &dir).await?;
            Ok(OperationResult::Mirror(info))
        }

        Commands::Update { dir, jobs, offline } => {
            let options = UpdateOptions { jobs, offline };
            let report = cmirror_ops::update(&ctx, &dir, &options).await?;
            Ok(OperationResult::SyncReport(report))
        }

        Commands::Cleanup { dir } => {
            let report = cmirror_ops::cleanup(&ctx, &dir).await?;
            Ok(OperationResult::CleanupReport(report))
        }

        Commands::Install {
            dir,
            global,
            local,
            config_file,
        } => {
            let target = install_target(global, local, config_file);
            let report = cmirror_ops::install(&ctx, &dir, &target).await?;
            Ok(OperationResult::InstallReport(report))
        }
    }
}

/// Process exit status for a command that returned a result
///
/// Any command the user interrupted exits with [`EXIT_INTERRUPTED`], even
/// when it managed to finish its work.
fn exit_code(result: &OperationResult, interrupted: bool) -> i32 {
    match result {
        _ if interrupted => EXIT_INTERRUPTED,
        OperationResult::SyncReport(report) if report.status == SyncStatus::Aborted => {
            EXIT_INTERRUPTED
        }
        other if other.is_success() => 0,
        _ => 1,
    }
}

/// Initialize tracing/logging
///
/// Logs go to stderr so stdout stays reserved for the rendered result.
fn init_tracing(json_mode: bool, verbose: bool, debug: bool) {
    let default_level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json_mode {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(debug)
            .with_env_filter(filter)
            .init();
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &cli::GlobalArgs) {
    if let Some(color) = global.color {
        config.general.color = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmirror_ops::MirrorInfo;
    use cmirror_types::{CleanupReport, SyncReport, SyncStats};

    fn sync_report(status: SyncStatus, failed: usize) -> OperationResult {
        OperationResult::SyncReport(SyncReport {
            status,
            stats: SyncStats {
                failed,
                ..SyncStats::default()
            },
            jobs: 1,
            duration_ms: 0,
        })
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&sync_report(SyncStatus::Completed, 0), false), 0);
        // Per-record failures are reported, not fatal
        assert_eq!(exit_code(&sync_report(SyncStatus::Completed, 3), false), 0);
        assert_eq!(
            exit_code(&sync_report(SyncStatus::Aborted, 0), false),
            EXIT_INTERRUPTED
        );

        let cleanup = CleanupReport {
            errors: 1,
            ..CleanupReport::default()
        };
        assert_eq!(exit_code(&OperationResult::CleanupReport(cleanup), false), 1);

        let kept = CleanupReport {
            stale_skipped: 2,
            ..CleanupReport::default()
        };
        assert_eq!(exit_code(&OperationResult::CleanupReport(kept), false), 1);
    }

    #[test]
    fn test_interrupted_commands_exit_130() {
        let mirror = OperationResult::Mirror(MirrorInfo {
            path: "/srv/mirror".into(),
            index: "/srv/mirror/index".into(),
            index_url: "https://github.com/rust-lang/crates.io-index".to_string(),
        });
        assert_eq!(exit_code(&mirror, false), 0);
        assert_eq!(exit_code(&mirror, true), EXIT_INTERRUPTED);
        assert_eq!(
            exit_code(&sync_report(SyncStatus::Completed, 0), true),
            EXIT_INTERRUPTED
        );
    }

    #[test]
    fn test_cli_color_overrides_config() {
        let cli = Cli::try_parse_from(["cmirror", "--color", "never", "cleanup"]).unwrap();
        let mut config = Config::default();
        apply_cli_config(&mut config, &cli.global);
        assert_eq!(config.general.color, ColorChoice::Never);
    }
}
