use chrono::NaiveDate;
use clap::Subcommand;
use launchplan_core::{describe, expand};
use serde_json::json;

use super::{print_json, CmdResult, PatternArgs};

#[derive(Subcommand)]
pub enum RecurAction {
    /// List the dates a pattern produces
    Expand {
        /// First occurrence (YYYY-MM-DD)
        first: NaiveDate,
        #[command(flatten)]
        pattern: PatternArgs,
    },
    /// Summarize a pattern in words
    Describe {
        #[command(flatten)]
        pattern: PatternArgs,
    },
}

pub fn run(action: RecurAction, json: bool) -> CmdResult {
    match action {
        RecurAction::Expand { first, pattern } => {
            let pattern = pattern.pattern()?;
            let expansion = expand(&pattern, first)?;
            if json {
                print_json(&expansion)?;
            } else {
                for date in &expansion.dates {
                    println!("{date}");
                }
                if expansion.truncated {
                    eprintln!("(stopped at {} occurrences)", expansion.dates.len());
                }
            }
        }
        RecurAction::Describe { pattern } => {
            let pattern = pattern.pattern()?;
            let text = describe(&pattern);
            if json {
                print_json(&json!({ "pattern": pattern, "description": text }))?;
            } else {
                println!("{text}");
            }
        }
    }
    Ok(())
}
