use clap::{Args, Subcommand};

use crate::config::AppConfig;
use crate::error::ScriptError;

#[derive(Debug, Args, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Debug, Subcommand, Clone)]
enum ConfigSubcommand {
    /// Load the configuration and list which credentials are set
    Check,
}

pub fn run(args: ConfigArgs) -> Result<(), ScriptError> {
    match args.command {
        ConfigSubcommand::Check => {
            let config = AppConfig::load()?;
            println!("config OK: {}", config.source);
            println!("llm model: {}", config.llm.model);
            for (key_env, present) in config.credential_report() {
                println!("{key_env}: {}", if present { "set" } else { "missing" });
            }
            Ok(())
        }
    }
}
