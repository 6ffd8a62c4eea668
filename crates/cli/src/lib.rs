pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use quizlite_core::config::{ConfigOverrides, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "quizlite",
    about = "Quizlite operator CLI",
    long_about = "Inspect configuration, check the quiz document, and dry-run recommendations offline.",
    after_help = "Examples:\n  quizlite doctor --json\n  quizlite config\n  quizlite recommend --answers answers.json\n  quizlite walk --script session.json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file to load instead of quizlite.toml")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Quiz document to use instead of the configured one")]
    document: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, load and lint the quiz document, and report catalog readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Resolve an answers file against the quiz document without catalog lookups")]
    Recommend {
        #[arg(long, help = "JSON file with `{\"answers\": [...]}` or a bare answers array")]
        answers: PathBuf,
    },
    #[command(about = "Replay scripted wizard actions, then resolve the submitted answers")]
    Walk {
        #[arg(long, help = "JSON array of `choose`, `slide`, `next` and `previous` actions")]
        script: PathBuf,
    },
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                document_path: self.document.clone(),
                ..ConfigOverrides::default()
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    let result = match cli.command {
        Command::Config => commands::config::run(options),
        Command::Doctor { json } => commands::doctor::run(options, json),
        Command::Recommend { answers } => commands::recommend::run(options, &answers),
        Command::Walk { script } => commands::walk::run(options, &script),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
