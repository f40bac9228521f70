//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `versecraft_core` wiring.
//! - Print the form table and syllable estimates for ad-hoc lines.
//!

use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use versecraft_core::{
    build_validator, core_version, init_logging_from_config, open_db_with_busy_timeout,
    CoreConfig, FormType,
};

/// VerseCraft smoke run: form table and syllable estimates.
#[derive(Debug, Parser)]
#[command(name = "versecraft_cli", version)]
struct Cli {
    /// TOML config file; defaults plus `VERSECRAFT_*` overrides when absent.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Lines to estimate syllables for.
    lines: Vec<String>,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("versecraft_cli: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let Cli { config: config_path, lines } = cli;
    let config = match config_path {
        Some(path) => CoreConfig::load(&path).map_err(|err| err.to_string())?,
        None => {
            let mut config = CoreConfig::default();
            config
                .apply_env_overrides(|key| std::env::var(key).ok())
                .map_err(|err| err.to_string())?;
            config.validate().map_err(|err| err.to_string())?;
            config
        }
    };

    let file_logging = init_logging_from_config(&config.logging).map_err(|err| err.to_string())?;
    // Opening applies pending migrations.
    open_db_with_busy_timeout(&config.database.path, config.database.busy_timeout())
        .map_err(|err| err.to_string())?;
    let validator = build_validator(&config).map_err(|err| err.to_string())?;
    info!(
        "event=cli_smoke module=cli status=ok oracle_enabled={} lines={}",
        config.oracle.enabled,
        lines.len()
    );

    println!("versecraft_core version={}", core_version());
    println!("database={}", config.database.path.display());
    println!("file_logging={file_logging}");
    println!("oracle={}", if config.oracle.enabled { "enabled" } else { "disabled" });
    for form in FormType::ALL {
        let rule = form.rule();
        println!(
            "form={:<10} lines={:<9} turn_taking={:<5} structure={}",
            form.display_name(),
            rule.max_lines
                .max()
                .map_or_else(|| "unbounded".to_string(), |max| max.to_string()),
            rule.turn_taking,
            rule.describe_structure()
        );
    }

    let estimator = validator.estimator();
    for line in &lines {
        println!("syllables={} line={line}", estimator.estimate_line(line));
    }
    Ok(())
}
