//! mimir: command-line study companion
//!
//! Thin front end over the gateway: each subcommand is one view session.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use mimir::config::Config;
use mimir::forms::{Field, OtpEntry, RegistrationForm};
use mimir::{Credentials, DocumentStats, FileStore, Outcome, Upload, format_file_size};

/// Mimir CLI client
#[derive(Parser)]
#[command(name = "mimir")]
#[command(version)]
#[command(about = "Study companion client")]
struct Args {
    /// Config file (default: ~/.mimir/config.toml, then /etc/mimir/config.toml)
    #[arg(short, long, env = "MIMIR_CONFIG")]
    config: Option<PathBuf>,

    /// Backend base URL, overriding the config file
    #[arg(long, env = "MIMIR_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the token
    Login { username: String },

    /// Create an account (a passcode is mailed to you)
    Register,

    /// Confirm the mailed passcode
    Verify { email: String },

    /// Show the signed-in user
    Whoami,

    /// Forget the stored token
    Logout,

    /// List document types
    Types,

    /// List documents
    Docs {
        /// Only documents of this type
        #[arg(short = 't', long = "type")]
        document_type: Option<u64>,
    },

    /// Show one document
    Show { id: u64 },

    /// Upload a file
    Upload {
        path: PathBuf,
        /// Title (default: file name)
        #[arg(long)]
        title: Option<String>,
        /// Document type (default: detected by the server)
        #[arg(short = 't', long = "type")]
        document_type: Option<u64>,
    },

    /// Delete a document
    Delete { id: u64 },

    /// Re-run text extraction for a document
    RetryExtraction { id: u64 },

    /// Summarize a document
    Summary { id: u64 },

    /// Generate a quiz
    Quiz {
        id: u64,
        /// Generate a second batch and append it
        #[arg(long)]
        more: bool,
    },

    /// Generate flashcards
    Flashcards {
        id: u64,
        /// Generate a second batch and append it
        #[arg(long)]
        more: bool,
    },

    /// Ask a question about a document
    Ask {
        id: u64,
        question: String,
    },

    /// Search across documents
    Search { query: String },

    /// Autocomplete suggestions for a partial query
    Suggest { query: String },

    /// Show recent searches
    History {
        /// Forget recent searches
        #[arg(long)]
        clear: bool,
    },
}

type CliResult<T = ()> = Result<T, Box<dyn Error>>;

/// Print notices, turn failures into errors, hand values to `show`.
fn render<T>(outcome: Outcome<T>, show: impl FnOnce(T)) -> CliResult {
    match outcome {
        Outcome::Ready(value) => {
            show(value);
            Ok(())
        }
        Outcome::Notice { message } => {
            println!("{message}");
            Ok(())
        }
        Outcome::Failed { message } => Err(message.into()),
        Outcome::SignedOut => Err("session expired; run `mimir login`".into()),
        Outcome::Cancelled | Outcome::Skipped => Ok(()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> CliResult {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let store = Arc::new(FileStore::open(config.state_path()));

    let mut builder = config.builder().store(store);
    if let Some(url) = args.base_url {
        builder = builder.base_url(url);
    }
    let gateway = builder.build()?;
    let session = gateway.begin_session();

    match args.command {
        Command::Login { username } => {
            let password = Password::new().with_prompt("Password").interact()?;
            let outcome = gateway.login(&Credentials::new(username, password)).await;
            render(outcome, |_| println!("signed in"))?;
        }
        Command::Register => {
            let mut form = RegistrationForm::new();
            form.set(
                Field::Username,
                Input::<String>::new().with_prompt("Username").interact_text()?,
            );
            form.set(
                Field::Email,
                Input::<String>::new().with_prompt("Email").interact_text()?,
            );
            form.set(
                Field::Password,
                Password::new().with_prompt("Password").interact()?,
            );
            form.set(
                Field::ConfirmPassword,
                Password::new().with_prompt("Confirm password").interact()?,
            );
            let registration = form.to_registration()?;
            let email = registration.email.clone();
            render(gateway.register(&registration).await, |()| {
                println!("passcode sent; run `mimir verify {email}`")
            })?;
        }
        Command::Verify { email } => {
            let mut otp = OtpEntry::new();
            otp.input(&Input::<String>::new().with_prompt("Passcode").interact_text()?);
            let verification = otp.to_verification(Some(&email))?;
            render(gateway.verify_otp(&verification).await, |_| {
                println!("account verified, signed in")
            })?;
        }
        Command::Whoami => {
            render(gateway.current_user(&session).await, |user| {
                match user.email {
                    Some(email) => println!("{} <{email}>", user.username),
                    None => println!("{}", user.username),
                }
            })?;
        }
        Command::Logout => {
            gateway.logout()?;
            println!("signed out");
        }
        Command::Types => {
            render(gateway.document_types(&session).await, |types| {
                for t in types {
                    println!("{:>4}  {}", t.id, t.name);
                }
            })?;
        }
        Command::Docs { document_type } => {
            render(gateway.list_documents(&session, document_type).await, |docs| {
                for doc in &docs {
                    let kind = doc.document_type.as_ref().map_or("-", |t| t.name.as_str());
                    let size = doc.file_size.map(format_file_size).unwrap_or_default();
                    println!(
                        "{:>5}  {:<40}  {:<12}  {:>10}  {}",
                        doc.id,
                        doc.title,
                        kind,
                        size,
                        doc.uploaded_at.format("%Y-%m-%d")
                    );
                }
                let stats = DocumentStats::compute(&docs, Utc::now());
                println!(
                    "\n{} documents, {} this week, {} total",
                    stats.total,
                    stats.recent_uploads,
                    format_file_size(stats.total_size)
                );
            })?;
        }
        Command::Show { id } => {
            render(gateway.document(&session, id).await, |doc| {
                println!("{} (#{})", doc.title, doc.id);
                println!("uploaded {}", doc.uploaded_at.format("%Y-%m-%d %H:%M"));
                if doc.extraction_failed() {
                    println!("text extraction failed; try `mimir retry-extraction {id}`");
                }
            })?;
        }
        Command::Upload {
            path,
            title,
            document_type,
        } => {
            let bytes = std::fs::read(&path)?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string());
            let title = title.unwrap_or_else(|| file_name.clone());
            let mut upload = Upload::new(title, file_name, bytes);
            if let Some(t) = document_type {
                upload = upload.document_type(t);
            }
            render(gateway.upload(&session, &upload).await, |report| {
                println!("uploaded #{}", report.document.id);
                if report.extraction_failed {
                    println!("text extraction failed; AI features are unavailable for now");
                }
            })?;
        }
        Command::Delete { id } => {
            render(gateway.delete_document(&session, id).await, |()| {
                println!("deleted #{id}")
            })?;
        }
        Command::RetryExtraction { id } => {
            render(gateway.retry_extraction(&session, id).await, |_| {
                println!("Text extraction successful! AI features are now available.")
            })?;
        }
        Command::Summary { id } => {
            render(gateway.summary(&session, id).await, |s| println!("{}", s.summary))?;
        }
        Command::Quiz { id, more } => {
            let mut outcome = gateway.quiz(&session, id).await;
            if more && outcome.is_ready() {
                outcome = gateway.load_more_quiz(&session, id).await;
            }
            render(outcome, |quiz| {
                for (n, q) in quiz.items().iter().enumerate() {
                    println!("{}. {}", n + 1, q.question);
                    for option in &q.options {
                        println!("   - {option}");
                    }
                    println!("   answer: {}", q.answer);
                }
            })?;
        }
        Command::Flashcards { id, more } => {
            let mut outcome = gateway.flashcards(&session, id).await;
            if more && outcome.is_ready() {
                outcome = gateway.load_more_flashcards(&session, id).await;
            }
            render(outcome, |deck| {
                for card in deck.flashcards {
                    println!("{}\n  → {}", card.front, card.back);
                }
            })?;
        }
        Command::Ask { id, question } => {
            render(gateway.ask(&session, id, &question).await, |a| {
                println!("{}", a.answer)
            })?;
        }
        Command::Search { query } => {
            render(gateway.search(&session, &query).await, |results| {
                if !results.search_summary.is_empty() {
                    println!("{}\n", results.search_summary);
                }
                for hit in results.results {
                    println!(
                        "#{:<5} {}  [{}]",
                        hit.document_id,
                        hit.title,
                        hit.relevance().label()
                    );
                    println!("       {}", hit.snippet);
                }
            })?;
        }
        Command::Suggest { query } => {
            render(gateway.suggestions(&session, &query).await, |found| {
                for s in found {
                    println!("{s}");
                }
            })?;
        }
        Command::History { clear } => {
            if clear {
                gateway.clear_search_history();
            } else {
                for q in gateway.search_history() {
                    println!("{q}");
                }
            }
        }
    }

    Ok(())
}
