use std::fmt;
use std::sync::Arc;

use quiz_core::model::QuizSettings;
use services::{
    Clock, ImdbMovieProvider, MovieFeedConfig, MovieProvider, QuizConfig, QuizEvent,
    QuizLoopService, StaticMovieProvider, StatisticsService,
};
use storage::repository::Storage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidQuestions { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidQuestions { raw } => write!(f, "invalid --questions value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] [--questions <n>] [--offline]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:quiz.sqlite3");
    eprintln!("  --questions 10");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_QUESTIONS_AMOUNT, QUIZ_FEEDBACK_DELAY_MS,");
    eprintln!("  QUIZ_RATING_THRESHOLD_MIN, QUIZ_RATING_THRESHOLD_MAX,");
    eprintln!("  QUIZ_IMDB_API_KEY, QUIZ_IMDB_BASE_URL, RUST_LOG");
}

#[derive(Debug)]
struct Args {
    db_url: String,
    questions: Option<usize>,
    offline: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url("sqlite:quiz.sqlite3".into()), normalize_sqlite_url);
        let mut questions = None;
        let mut offline = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--questions" => {
                    let value = require_value(args, "--questions")?;
                    let parsed: usize = value
                        .parse()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| ArgsError::InvalidQuestions { raw: value.clone() })?;
                    questions = Some(parsed);
                }
                "--offline" => offline = true,
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Some(Self {
            db_url,
            questions,
            offline,
        }))
    }
}

/// What the player typed at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayerInput {
    Answer(bool),
    Restart,
    Reload,
    Quit,
}

impl PlayerInput {
    fn from_line(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Some(Self::Answer(true)),
            "n" | "no" => Some(Self::Answer(false)),
            "r" | "restart" => Some(Self::Restart),
            "l" | "load" | "reload" => Some(Self::Reload),
            "q" | "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn movie_provider(offline: bool) -> Arc<dyn MovieProvider> {
    if offline {
        return Arc::new(StaticMovieProvider::builtin());
    }
    match MovieFeedConfig::from_env() {
        Some(config) => Arc::new(ImdbMovieProvider::new(config)),
        None => {
            tracing::warn!("QUIZ_IMDB_API_KEY not set; playing with the built-in movie list");
            Arc::new(StaticMovieProvider::builtin())
        }
    }
}

fn render(event: &QuizEvent) {
    match event {
        QuizEvent::QuestionReady(step) => {
            println!();
            println!("Question {}", step.counter_label());
            println!("{}", step.question.text());
            if !step.question.image().is_empty() {
                println!("(poster: {} bytes)", step.question.image().len());
            }
            println!("Answer [y/n]:");
        }
        QuizEvent::AnswerResult { is_correct: true } => println!("Correct!"),
        QuizEvent::AnswerResult { is_correct: false } => println!("Wrong."),
        QuizEvent::RoundSummary(summary) => {
            println!();
            println!("This round is over!");
            println!("{summary}");
            println!("Play again? [r] or quit [q]");
        }
        QuizEvent::LoadFailed(message) => {
            println!("Could not load movies: {message}");
            println!("Try again? [l] or quit [q]");
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let Some(args) = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?
    else {
        print_usage();
        return Ok(());
    };

    let mut config = QuizConfig::from_env()?;
    if let Some(questions) = args.questions {
        config.settings = QuizSettings::new(questions, config.settings.feedback_delay())?;
    }

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url).await?;
    let statistics = StatisticsService::open(Clock::default_clock(), storage.kv).await;

    let mut quiz =
        QuizLoopService::new(config, movie_provider(args.offline), statistics).start();
    println!("Loading movies...");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = quiz.events.recv() => match event {
                Some(event) => render(&event),
                None => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match PlayerInput::from_line(&line) {
                    Some(PlayerInput::Answer(answer)) => quiz.handle.submit_answer(answer)?,
                    Some(PlayerInput::Restart) => quiz.handle.restart_round()?,
                    Some(PlayerInput::Reload) => quiz.handle.load_data()?,
                    Some(PlayerInput::Quit) => break,
                    None => println!("Type y, n, r (restart), l (reload) or q (quit)."),
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
