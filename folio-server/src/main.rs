use std::sync::Arc;

use anyhow::Context;
use folio_rag::openai::{OpenAICompletionService, OpenAIEmbeddingProvider};
use folio_rag::pgvector::PgVectorStore;
use folio_rag::{
    ChatService, CompletionDispatcher, ConversationLogger, InMemoryVectorStore, RagPipeline,
    StaticContentSource, TracingConversationLogger, VectorStore,
};
use folio_server::{AppState, ServerConfig, run_server};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_server=info,folio_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    let api_key = config.openai_api_key.clone().context("OPENAI_API_KEY must be set")?;

    let store: Arc<dyn VectorStore> = match &config.database_url {
        Some(url) => {
            Arc::new(PgVectorStore::connect(url).await.context("failed to connect to Postgres")?)
        }
        None => Arc::new(InMemoryVectorStore::new()),
    };
    let pipeline = RagPipeline::builder()
        .config(config.rag.clone())
        .embedding_provider(Arc::new(OpenAIEmbeddingProvider::new(api_key.clone())?))
        .vector_store(store)
        .build()?;

    match &config.content_path {
        Some(path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read content from {}", path.display()))?;
            let report = pipeline.index(&StaticContentSource::from_json(&json)?).await?;
            info!(documents = report.documents, chunks = report.chunks, "content indexed");
        }
        None => {
            if config.database_url.is_none() {
                warn!(
                    "neither FOLIO_CONTENT_PATH nor DATABASE_URL is set; \
                     every answer will use the fallback context"
                );
            }
            pipeline.create_collection().await?;
        }
    }

    let logger: Arc<dyn ConversationLogger> = Arc::new(TracingConversationLogger);
    let dispatcher = CompletionDispatcher::new(
        Arc::new(OpenAICompletionService::new(api_key)),
        Arc::clone(&logger),
        config.dispatch.clone(),
    );
    let chat = ChatService::new(Arc::new(pipeline), dispatcher, logger);

    run_server(&config, AppState::new(chat)).await
}
