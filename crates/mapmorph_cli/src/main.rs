use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use mapmorph::{
    ExecutionConfig, Mapping, derive_template_topic_from_topic, execute, validate_mapping,
};
use serde_json::json;

#[derive(Parser)]
#[command(name = "mapmorph", version, about = "Validate and run topic-addressed JSON mappings")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate every mapping in a collection file
    Validate {
        /// JSON file holding an array of mappings
        #[arg(short, long)]
        mappings: PathBuf,
    },
    /// Apply one mapping to a source payload
    Transform {
        /// JSON file holding an array of mappings
        #[arg(short, long)]
        mappings: PathBuf,
        /// Id of the mapping to run
        #[arg(long)]
        id: String,
        /// File holding the source payload
        #[arg(short, long)]
        payload: PathBuf,
        /// Overwrite the device identifier and timestamp with test values
        #[arg(long)]
        simulate: bool,
        /// Device identifier used when simulating
        #[arg(long)]
        device_id: Option<String>,
    },
    /// Derive a template topic from a subscription topic
    DeriveTopic {
        topic: String,
    },
}

fn load_mappings(path: &PathBuf) -> Result<Vec<Mapping>, Box<dyn Error>> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    match cli.command {
        Command::Validate { mappings } => {
            let all = load_mappings(&mappings)?;
            let mut failures = 0usize;
            for mapping in &all {
                let errors = validate_mapping(mapping, &all);
                if errors.is_empty() {
                    continue;
                }
                failures += 1;
                for code in errors {
                    println!("{}: {}", mapping.id, code);
                }
            }
            if failures == 0 {
                println!("{} mapping(s) valid", all.len());
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Transform {
            mappings,
            id,
            payload,
            simulate,
            device_id,
        } => {
            let all = load_mappings(&mappings)?;
            let mapping = all
                .iter()
                .find(|m| m.id == id)
                .ok_or_else(|| format!("no mapping with id '{}'", id))?;
            let source = fs::read_to_string(&payload)?;

            let mut config = ExecutionConfig {
                simulate,
                ..ExecutionConfig::default()
            };
            if let Some(device_id) = device_id {
                config.test_device_id = device_id;
            }

            let result = execute(&source, mapping, &config)?;
            let report = json!({
                "payloads": result.payloads,
                "errors": result.errors,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(if result.errors.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::DeriveTopic { topic } => match derive_template_topic_from_topic(&topic) {
            Ok(derived) => {
                println!("{}", derived);
                Ok(ExitCode::SUCCESS)
            }
            Err(code) => {
                eprintln!("{}", code);
                Ok(ExitCode::FAILURE)
            }
        },
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
