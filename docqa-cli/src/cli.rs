use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use docqa_rag::chat::{DEFAULT_GROQ_MODEL, GROQ_API_BASE};
use docqa_rag::{ChunkingStrategy, RagConfig};

#[derive(Parser, Debug)]
#[command(name = "docqa", version)]
#[command(about = "Ask questions about a document", long_about = None)]
pub struct Cli {
    #[arg(help = "Document to load at startup (.txt, .md or .pdf)")]
    pub file: Option<PathBuf>,

    #[arg(long, default_value_t = 1000, help = "Chunk size in characters")]
    pub chunk_size: usize,

    #[arg(long, default_value_t = 200, help = "Characters shared by consecutive chunks")]
    pub chunk_overlap: usize,

    #[arg(long, value_enum, default_value_t = ChunkerArg::Fixed, help = "Chunking strategy")]
    pub chunker: ChunkerArg,

    #[arg(long, default_value_t = 3, help = "Chunks retrieved per question")]
    pub top_k: usize,

    #[arg(long, default_value_t = 3, help = "Maximum sentences per answer")]
    pub max_sentences: usize,

    #[arg(long, default_value_t = 6, help = "Past turns replayed in each prompt")]
    pub history_window: usize,

    #[arg(long, default_value_t = 60, help = "Generation timeout in seconds")]
    pub timeout_secs: u64,

    #[arg(long, help = "Rewrite follow-up questions before retrieval")]
    pub contextualize: bool,

    #[arg(long, env = "DOCQA_MODEL", default_value = DEFAULT_GROQ_MODEL, help = "Chat model")]
    pub model: String,

    #[arg(
        long,
        env = "DOCQA_API_BASE",
        default_value = GROQ_API_BASE,
        help = "Chat completions API base URL"
    )]
    pub api_base: String,

    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true, help = "Chat completions API key")]
    pub api_key: String,

    #[arg(
        long,
        env = "DOCQA_EMBEDDINGS_URL",
        help = "OpenAI-compatible embeddings API base URL (offline hashing embeddings when unset)"
    )]
    pub embeddings_url: Option<String>,

    #[arg(
        long,
        env = "DOCQA_EMBEDDINGS_MODEL",
        default_value = "sentence-transformers/all-MiniLM-L6-v2",
        help = "Embedding model"
    )]
    pub embeddings_model: String,

    #[arg(long, default_value_t = 384, help = "Embedding dimensionality")]
    pub embeddings_dimensions: usize,

    #[arg(
        long,
        env = "DOCQA_EMBEDDINGS_API_KEY",
        hide_env_values = true,
        help = "Embeddings API key"
    )]
    pub embeddings_api_key: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ChunkerArg {
    Fixed,
    Recursive,
}

impl From<ChunkerArg> for ChunkingStrategy {
    fn from(arg: ChunkerArg) -> Self {
        match arg {
            ChunkerArg::Fixed => ChunkingStrategy::Fixed,
            ChunkerArg::Recursive => ChunkingStrategy::Recursive,
        }
    }
}

impl Cli {
    pub fn rag_config(&self) -> docqa_rag::Result<RagConfig> {
        RagConfig::builder()
            .chunk_size(self.chunk_size)
            .chunk_overlap(self.chunk_overlap)
            .chunking(self.chunker.into())
            .top_k(self.top_k)
            .max_sentences(self.max_sentences)
            .history_window(self.history_window)
            .generation_timeout(Duration::from_secs(self.timeout_secs))
            .contextualize_questions(self.contextualize)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_library_config() {
        let cli = Cli::try_parse_from(["docqa", "--api-key", "k"]).unwrap();
        let config = cli.rag_config().unwrap();

        assert!(cli.file.is_none());
        assert_eq!(config.chunk_size, RagConfig::default().chunk_size);
        assert_eq!(config.chunk_overlap, RagConfig::default().chunk_overlap);
        assert_eq!(config.generation_timeout, Duration::from_secs(60));
        assert_eq!(cli.model, DEFAULT_GROQ_MODEL);
    }

    #[test]
    fn flags_flow_into_config() {
        let cli = Cli::try_parse_from([
            "docqa",
            "notes.md",
            "--api-key",
            "k",
            "--chunk-size",
            "500",
            "--chunk-overlap",
            "50",
            "--chunker",
            "recursive",
            "--max-sentences",
            "2",
            "--contextualize",
        ])
        .unwrap();
        let config = cli.rag_config().unwrap();

        assert_eq!(cli.file, Some(PathBuf::from("notes.md")));
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunking, ChunkingStrategy::Recursive);
        assert_eq!(config.max_sentences, 2);
        assert!(config.contextualize_questions);
    }

    #[test]
    fn invalid_overlap_is_rejected() {
        let cli =
            Cli::try_parse_from(["docqa", "--api-key", "k", "--chunk-overlap", "1000"]).unwrap();
        assert!(cli.rag_config().is_err());
    }
}
