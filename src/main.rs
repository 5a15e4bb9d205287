//! # pdfrag CLI
//!
//! ```bash
//! pdfrag serve                               # web UI on [server].bind
//! pdfrag ask manual.pdf "How do I reset it?"  # one-shot answer
//! pdfrag chat manual.pdf                     # interactive chat on stdin
//! ```
//!
//! All commands accept `--config <file.toml>` and `--ollama-url <url>`.
//! Diagnostics go to stderr through `tracing` (`RUST_LOG`, default `info`);
//! answers go to stdout.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use pdf_rag::config::{self, Config};
use pdf_rag::models::UploadedFile;
use pdf_rag::pipeline::{Answer, Backends};
use pdf_rag::server;
use pdf_rag::session::{Session, UploadOutcome};

/// Chat with a PDF using a local Ollama model.
#[derive(Parser)]
#[command(name = "pdfrag", version, about)]
struct Cli {
    /// Path to a TOML configuration file. Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override `[ollama].url`.
    #[arg(long, global = true)]
    ollama_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web UI and JSON API.
    Serve {
        /// Override `[server].bind` (e.g. `0.0.0.0:8501`).
        #[arg(long)]
        bind: Option<String>,
    },

    /// Index a PDF and answer a single question.
    Ask {
        /// PDF file to index.
        file: PathBuf,
        /// The question.
        question: String,
        /// Also print the retrieved chunks.
        #[arg(long)]
        sources: bool,
    },

    /// Index a PDF and start an interactive chat.
    ///
    /// Commands: `/load <file.pdf>` switch document, `/clear` reset the chat
    /// and re-index, `/history` print the transcript, `/quit` exit.
    Chat {
        /// PDF file to index.
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };
    if let Some(url) = cli.ollama_url {
        cfg.ollama.url = url;
    }

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                cfg.server.bind = bind;
            }
            config::validate(&cfg)?;
            server::run_server(&cfg).await?;
        }
        Commands::Ask {
            file,
            question,
            sources,
        } => {
            config::validate(&cfg)?;
            let mut session = new_session(cfg)?;
            load(&mut session, &file).await?;
            let answer = session.ask(&question).await?;
            print_answer(&answer, sources);
        }
        Commands::Chat { file } => {
            config::validate(&cfg)?;
            let mut session = new_session(cfg)?;
            load(&mut session, &file).await?;
            run_chat(session, file).await?;
        }
    }

    Ok(())
}

fn new_session(cfg: Config) -> Result<Session> {
    let backends = Backends::ollama(&cfg)?;
    Ok(Session::new(Arc::new(cfg), backends))
}

async fn read_upload(path: &Path) -> Result<UploadedFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(UploadedFile::new(name, bytes))
}

async fn load(session: &mut Session, path: &Path) -> Result<()> {
    let upload = read_upload(path).await?;
    eprintln!("Processing new file: {}...", upload.name);
    match session.upload(upload).await? {
        UploadOutcome::Indexed(stats) => eprintln!(
            "New document indexed! ({} pages, {} chunks)",
            stats.pages, stats.chunks
        ),
        UploadOutcome::Unchanged => eprintln!("Document already loaded."),
    }
    Ok(())
}

fn print_answer(answer: &Answer, sources: bool) {
    println!("{}", answer.text);
    if sources {
        for hit in &answer.sources {
            println!(
                "\n--- page {} (chunk {}, score {:.3})\n{}",
                hit.chunk.page, hit.chunk.index, hit.score, hit.chunk.text
            );
        }
    }
}

async fn run_chat(mut session: Session, mut current: PathBuf) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprintln!("Ask about this specific document. /help for commands.");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let result = match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit", _) | ("/exit", _) => break,
            ("/help", _) => {
                eprintln!("/load <file.pdf>  /clear  /history  /quit");
                Ok(())
            }
            ("/history", _) => {
                for msg in session.transcript() {
                    println!("{}: {}", msg.role.as_str(), msg.content);
                }
                Ok(())
            }
            ("/clear", _) => {
                session.clear();
                load(&mut session, &current).await
            }
            ("/load", path) if !path.trim().is_empty() => {
                let path = PathBuf::from(path.trim());
                let loaded = load(&mut session, &path).await;
                if loaded.is_ok() {
                    current = path;
                }
                loaded
            }
            ("/load", _) => {
                eprintln!("usage: /load <file.pdf>");
                Ok(())
            }
            _ => session
                .ask(line)
                .await
                .map(|answer| print_answer(&answer, false))
                .map_err(Into::into),
        };

        if let Err(e) = result {
            eprintln!("error: {:#}", e);
        }
    }

    Ok(())
}
