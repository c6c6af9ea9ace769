use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser as _;
use docqa_rag::chat::ChatCompletionsBackend;
use docqa_rag::extract::{check_upload_size, extractor_for_path};
use docqa_rag::openai::OpenAiCompatibleEmbedder;
use docqa_rag::{
    Answer, Document, DocumentQa, EmbeddingProvider, HashingEmbedder, MAX_UPLOAD_BYTES, Retriever,
    Session,
};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

mod cli;

use cli::Cli;

const HELP: &str = "\
Type a question, or one of:
  /history       show the conversation so far
  /clear         forget the conversation, keep the document
  /load <FILE>   load a different document
  /quit          exit";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa=info,docqa_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.rag_config().context("invalid settings")?;

    let embedder: Arc<dyn EmbeddingProvider> = match &cli.embeddings_url {
        Some(url) => {
            let mut embedder = OpenAiCompatibleEmbedder::new(url)
                .with_model(&cli.embeddings_model, cli.embeddings_dimensions);
            if let Some(key) = &cli.embeddings_api_key {
                embedder = embedder.with_api_key(key);
            }
            Arc::new(embedder)
        }
        None => Arc::new(HashingEmbedder::new(cli.embeddings_dimensions)?),
    };
    tracing::info!(embedder = embedder.name(), model = %cli.model, "starting docqa");

    let retriever =
        Retriever::builder().embedding_provider(embedder).chunking(config.chunking).build()?;
    let backend = ChatCompletionsBackend::new(&cli.api_base, &cli.api_key, &cli.model)?;
    let qa = DocumentQa::new(config, retriever, Arc::new(backend))?;

    if let Some(path) = &cli.file {
        load(&qa, path).await?;
    } else {
        println!("No document loaded yet. Use /load <FILE>.");
    }

    repl(&qa).await
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Ask(String),
    History,
    Clear,
    Load(PathBuf),
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Some(Self::Ask(line.to_string()));
        };

        let (name, arg) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
        let arg = arg.trim();
        Some(match name {
            "history" => Self::History,
            "clear" => Self::Clear,
            "load" if !arg.is_empty() => Self::Load(PathBuf::from(arg)),
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        })
    }
}

async fn repl(qa: &DocumentQa) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("{HELP}");

    loop {
        let line = match editor.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let Some(command) = Command::parse(&line) else {
            continue;
        };
        let _ = editor.add_history_entry(line.trim());

        match command {
            Command::Ask(question) => match qa.ask(&question).await {
                Ok(answer) => print_answer(&answer),
                Err(e) if e.is_retryable() => {
                    eprintln!("error: {e}\nThe conversation is unchanged; try again.")
                }
                Err(e) => eprintln!("error: {e}"),
            },
            Command::History => print_history(&qa.session().await),
            Command::Clear => {
                qa.clear_history().await;
                println!("Conversation cleared.");
            }
            Command::Load(path) => {
                if let Err(e) = load(qa, &path).await {
                    eprintln!("error: {e:#}");
                }
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::Unknown(input) => eprintln!("unknown command: {input}\n{HELP}"),
        }
    }

    Ok(())
}

async fn read_document(path: &Path, limit: usize) -> Result<Document> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    check_upload_size(usize::try_from(metadata.len()).unwrap_or(usize::MAX), limit)?;

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    // The file may have grown since the metadata check.
    check_upload_size(bytes.len(), limit)?;
    let text = extractor_for_path(path)?.extract_text(&bytes)?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Document::from_upload(name, &bytes, text))
}

async fn load(qa: &DocumentQa, path: &Path) -> Result<()> {
    let document = read_document(path, MAX_UPLOAD_BYTES).await?;
    let summary = qa
        .process(&document)
        .await
        .with_context(|| format!("failed to process {}", document.name))?;

    if summary.reused {
        println!("{} is already loaded.", document.name);
    } else {
        println!("Loaded {} ({} chunks).", document.name, summary.chunk_count);
    }
    Ok(())
}

fn print_answer(answer: &Answer) {
    if !answer.grounded {
        println!("(no document context)");
    }
    println!("{}", answer.text);
}

fn print_history(session: &Session) {
    if session.turns().is_empty() {
        println!("No questions asked yet.");
        return;
    }
    for turn in session.turns() {
        let marker = if turn.grounded { "" } else { " (no document context)" };
        println!("[{}] Q: {}", turn.seq, turn.question);
        println!("    A:{marker} {}", turn.answer);
    }
}
