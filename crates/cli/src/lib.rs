pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use carlot_core::config::{ConfigOverrides, LlmProvider, LoadOptions};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "carlot",
    about = "Carlot vehicle catalog assistant",
    long_about = "Search the vehicle catalog in natural language, and operate its database and readiness checks.",
    after_help = "Examples:\n  carlot seed\n  carlot chat\n  carlot ask \"red cars under 40000\"\n  carlot doctor --json"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    #[arg(long, global = true, help = "Path to a carlot.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override database.url")]
    database_url: Option<String>,
    #[arg(long, global = true, help = "Override logging.level")]
    log_level: Option<String>,
    #[arg(
        long,
        global = true,
        value_parser = parse_provider,
        help = "Override llm.provider (openai|ollama)"
    )]
    llm_provider: Option<LlmProvider>,
    #[arg(long, global = true, help = "Override llm.model")]
    llm_model: Option<String>,
    #[arg(long, global = true, help = "Override llm.base_url")]
    llm_base_url: Option<String>,
}

impl GlobalArgs {
    fn load_options(self) -> LoadOptions {
        LoadOptions {
            require_file: self.config.is_some(),
            config_path: self.config,
            overrides: ConfigOverrides {
                database_url: self.database_url,
                log_level: self.log_level,
                llm_provider: self.llm_provider,
                llm_model: self.llm_model,
                llm_base_url: self.llm_base_url,
                llm_api_key: None,
            },
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start an interactive conversation with the catalog assistant")]
    Chat,
    #[command(about = "Answer a single utterance and print the structured turn outcome")]
    Ask {
        #[arg(help = "What to ask the assistant")]
        utterance: String,
    },
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo vehicle catalog (idempotent) and verify it")]
    Seed,
    #[command(about = "Validate config, completion backend settings, and DB readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

fn parse_provider(value: &str) -> Result<LlmProvider, String> {
    value.parse::<LlmProvider>().map_err(|error| error.to_string())
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.global.load_options();

    let result = match cli.command {
        Command::Chat => commands::chat::run(options),
        Command::Ask { utterance } => commands::ask::run(options, &utterance),
        Command::Migrate => commands::migrate::run(options),
        Command::Seed => commands::seed::run(options),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(options, json) }
        }
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}
