//! Process configuration read from the environment.

use std::path::PathBuf;

use anyhow::Context;
use folio_rag::RagConfig;
use folio_rag::dispatch::DispatchConfig;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8099;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rag: RagConfig,
    pub dispatch: DispatchConfig,
    /// JSON array of documents indexed at startup into the in-memory store.
    pub content_path: Option<PathBuf>,
    pub openai_api_key: Option<String>,
    /// When set, chunks live in Postgres (pgvector) instead of memory.
    pub database_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            rag: RagConfig::default(),
            dispatch: DispatchConfig::default(),
            content_path: None,
            openai_api_key: None,
            database_url: None,
        }
    }
}

impl ServerConfig {
    /// Read `FOLIO_*`, `OPENAI_API_KEY` and `DATABASE_URL` from the process
    /// environment. Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable lookup. Blank values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let port = match var("FOLIO_PORT") {
            Some(port) => {
                port.parse::<u16>().with_context(|| format!("invalid FOLIO_PORT '{port}'"))?
            }
            None => defaults.port,
        };

        let mut rag = RagConfig::builder();
        if let Some(top_k) = var("FOLIO_TOP_K") {
            let top_k = top_k.parse().with_context(|| format!("invalid FOLIO_TOP_K '{top_k}'"))?;
            rag = rag.top_k(top_k);
        }
        if let Some(min_score) = var("FOLIO_MIN_SCORE") {
            let min_score = min_score
                .parse()
                .with_context(|| format!("invalid FOLIO_MIN_SCORE '{min_score}'"))?;
            rag = rag.min_score(min_score);
        }
        let rag = rag.build().context("invalid retrieval settings")?;

        let mut dispatch = defaults.dispatch;
        if let Some(model) = var("FOLIO_MODEL") {
            dispatch.model = model;
        }

        Ok(Self {
            host: var("FOLIO_HOST").unwrap_or(defaults.host),
            port,
            rag,
            dispatch,
            content_path: var("FOLIO_CONTENT_PATH").map(PathBuf::from),
            openai_api_key: var("OPENAI_API_KEY"),
            database_url: var("DATABASE_URL"),
        })
    }
}
