use clap::Parser;
use sheetlink::{CliArgs, EngineConfig, LoggingConfig, init_logging, run_command};

fn main() -> anyhow::Result<()> {
    let logging_config = LoggingConfig::from_env();
    let _guard = init_logging(logging_config)?;

    let cli = CliArgs::parse();
    let config = EngineConfig::from_args(&cli)?;

    // Fail fast before touching the workbook
    config.validate()?;

    let response = run_command(config, cli.command)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
