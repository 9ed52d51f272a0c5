use anyhow::Result;
use clap::Parser;

use ac_core::CodecConfig;

pub mod cli;
pub mod commands;

use cli::Command;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config, puis les overrides CLI
    let mut config = resolve_config(&cli)?;
    cli.command.apply_overrides(&mut config);

    // 4. Dispatch
    match &cli.command {
        Command::Encode {
            input,
            codec,
            output,
            ..
        } => commands::encode(input, *codec, output.as_deref(), &config),
        Command::Decode { input, output } => commands::decode(input, output.as_deref(), &config),
        Command::Validate { input } => commands::validate_file(input, &config),
        Command::Analyze { input } => commands::analyze_file(input, &config),
        Command::Stream { input } => commands::stream(input.as_deref(), &config),
    }
}

fn resolve_config(cli: &cli::Cli) -> Result<CodecConfig> {
    if cli.config.exists() {
        ac_core::config::load_config(&cli.config)
    } else {
        log::debug!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(CodecConfig::default())
    }
}
