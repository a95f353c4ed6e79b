use std::collections::BTreeMap;

use clap::Subcommand;
use launchplan_core::Config;

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "cycle.length_days", "phases.short.runway_days")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction, json: bool) -> CmdResult {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config
                .get(&key)
                .ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            if json {
                let entries: BTreeMap<String, String> = config.entries().into_iter().collect();
                print_json(&entries)?;
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
