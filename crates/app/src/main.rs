use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use interview_core::model::{CandidateProfile, Question, Report, SessionId, UserId};
use services::{Clock, GroqOracle, InterviewError, InterviewService, ResumeState, SubmitOutcome};
use storage::repository::{QuestionRepository, SessionRepository, Storage};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidSessionId { raw: String },
    MissingProfile,
    MissingSessionId,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidSessionId { raw } => write!(f, "invalid session id: {raw}"),
            ArgsError::MissingProfile => {
                write!(f, "interview requires --profile <json path> (or INTERVIEW_PROFILE)")
            }
            ArgsError::MissingSessionId => write!(f, "resume requires a session id"),
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
    eprintln!("  cargo run -p app -- interview --profile <json path> [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- resume <session-id> [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:interviews.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  INTERVIEW_DB_URL, INTERVIEW_PROFILE");
    eprintln!("  INTERVIEW_AI_API_KEY, INTERVIEW_AI_BASE_URL, INTERVIEW_AI_MODEL");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Interview,
    Resume(SessionId),
}

struct Args {
    db_url: String,
    profile_path: Option<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("INTERVIEW_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://interviews.sqlite3".into(), normalize_sqlite_url);
        let mut profile_path = std::env::var("INTERVIEW_PROFILE").ok();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--profile" => {
                    profile_path = Some(require_value(args, "--profile")?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            profile_path,
        })
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

fn load_profile(path: &str) -> Result<CandidateProfile, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Reads a possibly multi-line answer; a blank line ends it. Returns `None`
/// on EOF.
fn read_answer(stdin: &io::Stdin) -> io::Result<Option<String>> {
    let mut lines = Vec::new();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            break;
        }
        lines.push(line);
    }
    if lines.is_empty() {
        return Ok(None);
    }
    Ok(Some(lines.join("\n")))
}

fn print_question(question: &Question, number: usize, total: u32) {
    println!();
    println!(
        "Question {number} of {total} [{}]",
        question.kind().as_str()
    );
    println!("{}", question.text());
    if let Some(hint) = question.hint() {
        println!("(hint: {hint})");
    }
    println!();
    println!("Type your answer, then an empty line to submit:");
    let _ = io::stdout().flush();
}

fn print_report(report: &Report) {
    println!();
    println!("── Interview complete ──");
    println!("Average score: {}", report.average_score());
    if !report.strengths().is_empty() {
        println!("Strengths:");
        for item in report.strengths() {
            println!("  + {item}");
        }
    }
    if !report.weak_areas().is_empty() {
        println!("Weak areas:");
        for item in report.weak_areas() {
            println!("  - {item}");
        }
    }
}

async fn drive_session(
    service: &InterviewService,
    session_id: SessionId,
    mut current: Question,
    mut number: usize,
    total: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = io::stdin();

    loop {
        print_question(&current, number, total);

        let Some(answer) = read_answer(&stdin)? else {
            println!("No answer given; session {session_id} can be resumed later.");
            return Ok(());
        };

        match service.submit_answer(session_id, current.id(), &answer).await {
            Ok(SubmitOutcome::Next {
                question,
                last_score,
            }) => {
                println!(
                    "Scores: correctness {}, depth {}, clarity {}",
                    last_score.scores.correctness(),
                    last_score.scores.depth(),
                    last_score.scores.clarity()
                );
                println!("Feedback: {}", last_score.feedback);
                current = question;
                number += 1;
            }
            Ok(SubmitOutcome::Completed { report, last_score }) => {
                println!(
                    "Scores: correctness {}, depth {}, clarity {}",
                    last_score.scores.correctness(),
                    last_score.scores.depth(),
                    last_score.scores.clarity()
                );
                println!("Feedback: {}", last_score.feedback);
                print_report(&report);
                return Ok(());
            }
            Err(err) if err.is_stale_client_state() => {
                // Another submission won; re-fetch and continue from there.
                eprintln!("{err}; refreshing the current question");
                match service.resume_session(session_id).await? {
                    ResumeState::Question(question) => current = question,
                    ResumeState::Completed(report) => {
                        print_report(&report);
                        return Ok(());
                    }
                }
            }
            Err(InterviewError::ScoringFailed(source)) => {
                eprintln!("Scoring failed ({source}); your answer was not recorded. Try again.");
            }
            Err(err) => return Err(err.into()),
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Interview,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Interview,
        Some("interview") => {
            argv.remove(0);
            Command::Interview
        }
        Some("resume") => {
            argv.remove(0);
            if argv.first().is_none_or(|a| a.starts_with("--")) {
                return Err(ArgsError::MissingSessionId.into());
            }
            let raw = argv.remove(0);
            let id = raw
                .parse::<SessionId>()
                .map_err(|_| ArgsError::InvalidSessionId { raw })?;
            Command::Resume(id)
        }
        Some(first) => {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            return Err(ArgsError::UnknownArg(first.to_string()).into());
        }
    };

    let mut iter = argv.into_iter();
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url).await?;

    let oracle = GroqOracle::from_env();
    if !oracle.enabled() {
        eprintln!("INTERVIEW_AI_API_KEY is not set; cannot reach the scoring oracle.");
        std::process::exit(2);
    }

    let service = InterviewService::new(
        Clock::default_clock(),
        Arc::clone(&storage.sessions),
        Arc::clone(&storage.questions),
        Arc::clone(&storage.answers),
        Arc::new(oracle),
    );

    match cmd {
        Command::Interview => {
            let profile_path = args.profile_path.ok_or(ArgsError::MissingProfile)?;
            let profile = load_profile(&profile_path)?;
            let owner = UserId::generate();

            let started = service.start_session(owner, profile).await?;
            let total = started.session.fixed_length();
            info!(session = %started.session.id(), "session created");
            println!("Session {} started.", started.session.id());

            drive_session(&service, started.session.id(), started.question, 1, total).await
        }
        Command::Resume(session_id) => match service.resume_session(session_id).await? {
            ResumeState::Completed(report) => {
                print_report(&report);
                Ok(())
            }
            ResumeState::Question(question) => {
                let session = storage.sessions.get_session(session_id).await?;
                // The pending question sits at the tail, so the log length
                // is also its 1-based display number.
                let number = storage.questions.list_questions(session_id).await?.len();
                drive_session(
                    &service,
                    session_id,
                    question,
                    number,
                    session.fixed_length(),
                )
                .await
            }
        },
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
