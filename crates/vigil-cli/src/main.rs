mod cli;
mod render;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use cli::{Cli, Command, RunArgs, exit_code};
use vigil_core::impls::{HttpEngine, ScriptedEngine};
use vigil_core::{CoordinatorBuilder, RunCoordinator, RunState, Settings};

/// Columns served by `--simulate`.
const SIMULATED_COLUMNS: [&str; 6] = ["age", "income", "education", "city", "signup_date", "label"];

#[tokio::main]
async fn main() {
    vigil_core::logging::init();

    match run().await {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            eprintln!("error: {error:#}");
            std::process::exit(1);
        }
    }
}

async fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run_validation(args).await,
    }
}

async fn run_validation(args: RunArgs) -> anyhow::Result<i32> {
    let mut settings = Settings::load(args.config.as_deref()).context("loading settings")?;
    args.apply(&mut settings);
    settings.validate().context("checking settings")?;

    let builder = CoordinatorBuilder::from_settings(&settings);
    let builder = if args.simulate {
        let engine = Arc::new(
            ScriptedEngine::new(SIMULATED_COLUMNS)
                .with_metadata_delay(Duration::from_millis(300))
                .with_validate_delay(Duration::from_secs(4)),
        );
        builder.catalog(engine.clone()).engine(engine)
    } else {
        let engine = Arc::new(HttpEngine::new(&settings.engine)?);
        builder.catalog(engine.clone()).engine(engine)
    };
    let coordinator = Arc::new(builder.build().context("building coordinator")?);
    tracing::info!(
        dataset_id = %settings.run.dataset_id,
        simulate = args.simulate,
        "starting validation"
    );

    let renderer = tokio::spawn(render_snapshots(coordinator.subscribe(), args.json));
    let controls = tokio::spawn(forward_controls(Arc::clone(&coordinator)));

    let state = coordinator.run_validation().await?;
    controls.abort();
    let _ = renderer.await;

    if args.json {
        println!("{}", serde_json::to_string(&state)?);
    } else {
        print!("{}", render::summary(&state));
    }
    Ok(exit_code(state.phase))
}

/// Print every published snapshot until the run is terminal.
async fn render_snapshots(mut rx: watch::Receiver<RunState>, json: bool) {
    let mut last_line = String::new();
    while rx.changed().await.is_ok() {
        let state = rx.borrow_and_update().clone();
        if state.is_terminal() {
            break;
        }
        if json {
            match serde_json::to_string(&state) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "snapshot not serializable"),
            }
            continue;
        }
        let line = render::progress_line(&state);
        if line != last_line {
            println!("{line}");
            last_line = line;
        }
    }
}

/// `p` toggles pause, `c` / `q` or Ctrl-C cancels.
async fn forward_controls(coordinator: Arc<RunCoordinator>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::warn!(error = %e, "failed to listen for Ctrl-C");
                    return;
                }
                coordinator.cancel();
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match line.trim() {
                    "p" => {
                        coordinator.pause_or_resume();
                    }
                    "c" | "q" => {
                        coordinator.cancel();
                    }
                    "" => {}
                    other => tracing::debug!(input = other, "ignored input"),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::debug!(error = %e, "stdin closed");
                    stdin_open = false;
                }
            },
        }
    }
}
