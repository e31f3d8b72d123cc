use askit::core::choice::ChoiceSource;
use askit::core::config::{self, ResolvedConfig};
use askit::core::lifecycle::LifecycleRegistry;
use askit::prompts::questionnaire::parse_questions;
use askit::prompts::{Answer, PromptError, PromptOptions, Questionnaire};
use askit::tui::Terminal;
use clap::Parser;
use serde_json::Value;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "askit", about = "Interactive terminal prompts")]
struct Args {
    /// TOML file with [[questions]] tables
    #[arg(short, long)]
    questions: Option<PathBuf>,

    /// Prompt type for a single question (input, select, confirm, ...)
    #[arg(short = 't', long = "type", default_value = "input")]
    kind: String,

    /// Answer key for a single question
    #[arg(short, long, default_value = "answer")]
    name: String,

    /// Question text for a single question
    #[arg(short, long)]
    message: Option<String>,

    /// A choice for list prompts (repeatable)
    #[arg(short, long = "choice")]
    choices: Vec<String>,

    /// Initial value for a single question
    #[arg(short, long)]
    initial: Option<String>,

    /// Disable colours
    #[arg(long)]
    no_color: bool,

    /// Log file (default ~/.askit/askit.log)
    #[arg(long)]
    log: Option<PathBuf>,
}

/// Open the log file, creating its directory.
fn open_log(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    File::create(path)
}

fn init_logging(path: Option<PathBuf>) {
    let Some(path) = path.or_else(|| config::askit_dir().map(|d| d.join("askit.log"))) else {
        eprintln!("askit: no home directory, logging disabled");
        return;
    };
    let log_file = match open_log(&path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("askit: cannot open log file {}: {e}", path.display());
            return;
        }
    };
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Err(e) = WriteLogger::init(LevelFilter::Debug, log_config, log_file) {
        eprintln!("askit: logger init failed: {e}");
    }
}

/// The questionnaire described by the flags: a questions file, or one
/// question built from `--type` / `--name` / `--message`.
fn questionnaire(args: &Args, config: ResolvedConfig) -> Result<Questionnaire, PromptError> {
    let lifecycle = LifecycleRegistry::new();
    if let Some(path) = &args.questions {
        let contents = fs::read_to_string(path).map_err(|e| {
            PromptError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let questionnaire = Questionnaire::from_specs(parse_questions(&contents)?, config, lifecycle)?;
        if questionnaire.is_empty() {
            return Err(PromptError::Config(format!("no questions in {}", path.display())));
        }
        return Ok(questionnaire);
    }

    let message = args.message.clone().unwrap_or_else(|| args.name.clone());
    let mut options = PromptOptions::new(&args.name, &message);
    options.initial = args.initial.clone().map(Value::String);
    options.choices = ChoiceSource::literal(args.choices.clone());
    Ok(Questionnaire::new(config, lifecycle).question(&args.kind, options))
}

async fn run(args: Args) -> Result<Answer, PromptError> {
    let file_config = config::load_config().map_err(|e| PromptError::Config(e.to_string()))?;
    let resolved = config::resolve(&file_config, args.no_color);
    let questionnaire = questionnaire(&args, resolved)?;
    let mut terminal = Terminal::stdio();
    questionnaire.run(&mut terminal).await
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    dotenv::dotenv().ok();
    init_logging(args.log.clone());

    log::info!("askit starting up");

    match run(args).await {
        Ok(answers) => match serde_json::to_string_pretty(&answers) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("askit: {e}");
                std::process::exit(1);
            }
        },
        Err(e) => {
            log::info!("askit exiting: {e}");
            if !matches!(e, PromptError::Cancelled) {
                eprintln!("askit: {e}");
            }
            std::process::exit(e.exit_code());
        }
    }
}
