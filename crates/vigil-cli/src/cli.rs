use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use vigil_core::RunPhase;
use vigil_core::Settings;

/// Exit code for a cancelled run (128 + SIGINT).
pub const SIGNAL_EXIT_CODE: i32 = 130;

/// Dataset id used by `--simulate` when none is given.
pub const SIMULATED_DATASET: &str = "demo";

#[derive(Debug, Parser)]
#[command(name = "vigil", version)]
#[command(about = "Drive a dataset validation run and watch it progress")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate one dataset. `p` + Enter pauses/resumes, `c` + Enter or Ctrl-C cancels.
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Dataset to validate. Overrides `run.dataset_id`.
    #[arg(long)]
    pub dataset: Option<String>,

    /// Target column. Overrides `run.target_column`.
    #[arg(long)]
    pub target: Option<String>,

    /// Settings file (TOML or JSON).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Validation service base URL. Overrides `engine.base_url`.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Use the built-in scripted engine instead of a live service.
    #[arg(long)]
    pub simulate: bool,

    /// Print snapshots as JSON lines.
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    /// Flags win over file and environment values.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(dataset) = &self.dataset {
            settings.run.dataset_id = dataset.clone();
        }
        if let Some(target) = &self.target {
            settings.run.target_column = Some(target.clone());
        }
        if let Some(base_url) = &self.base_url {
            settings.engine.base_url = base_url.clone();
        }
        if self.simulate && settings.run.dataset_id.trim().is_empty() {
            settings.run.dataset_id = SIMULATED_DATASET.to_string();
        }
    }
}

pub fn exit_code(phase: RunPhase) -> i32 {
    match phase {
        RunPhase::Completed => 0,
        RunPhase::Cancelled => SIGNAL_EXIT_CODE,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(argv: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Command::Run(args) => args,
        }
    }

    #[test]
    fn parses_run_flags() {
        let args = run_args(&[
            "vigil", "run", "--dataset", "42", "--target", "label", "--simulate", "--json",
        ]);
        assert_eq!(args.dataset.as_deref(), Some("42"));
        assert_eq!(args.target.as_deref(), Some("label"));
        assert!(args.simulate);
        assert!(args.json);
        assert!(args.config.is_none());
    }

    #[test]
    fn flags_override_settings() {
        let args = run_args(&["vigil", "run", "--dataset", "7", "--base-url", "http://engine:9000"]);
        let mut settings = Settings::default();
        settings.run.dataset_id = "1".to_string();
        args.apply(&mut settings);
        assert_eq!(settings.run.dataset_id, "7");
        assert_eq!(settings.engine.base_url, "http://engine:9000");
        assert!(settings.run.target_column.is_none());
    }

    #[test]
    fn simulate_fills_in_a_dataset() {
        let args = run_args(&["vigil", "run", "--simulate"]);
        let mut settings = Settings::default();
        args.apply(&mut settings);
        assert_eq!(settings.run.dataset_id, SIMULATED_DATASET);
    }

    #[test]
    fn exit_codes_follow_the_terminal_phase() {
        assert_eq!(exit_code(RunPhase::Completed), 0);
        assert_eq!(exit_code(RunPhase::Failed), 1);
        assert_eq!(exit_code(RunPhase::Cancelled), 130);
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["vigil", "explode"]).is_err());
    }
}
