use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::auth::UserStore;
use crate::config::{AppConfig, AppPaths, ProviderSecrets};
use crate::db;
use crate::history::ConversationStore;
use crate::library::SummaryStore;
use crate::llm::chain::CompletionChain;
use crate::llm::embedder::EmbeddingService;
use crate::llm::gemini::GeminiClient;
use crate::llm::groq::GroqClient;
use crate::llm::provider::CompletionBackend;
use crate::rag::answer::AnswerPipeline;
use crate::rag::ingest::IngestionPipeline;
use crate::rag::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: AppConfig,
    pub users: UserStore,
    pub documents: DocumentStore,
    pub conversations: ConversationStore,
    pub summaries: SummaryStore,
    pub ingestion: IngestionPipeline,
    pub answering: AnswerPipeline,
    pub completions: CompletionChain,
    #[allow(dead_code)]
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub async fn initialize() -> anyhow::Result<Arc<Self>> {
        let paths = Arc::new(AppPaths::new());
        let config = AppConfig::load(&paths)?;
        let secrets = ProviderSecrets::from_env();

        if secrets.groq_api_key.is_none() {
            tracing::warn!("GROQ_API_KEY is not set; the primary completion provider will fail over");
        }
        if secrets.google_api_key.is_none() {
            tracing::warn!("GOOGLE_API_KEY is not set; embeddings will degrade to random vectors");
        }

        let pool = db::connect(&paths.db_path).await?;

        // Schema order matters: documents before the tables that reference it.
        let users = UserStore::new(pool.clone()).await?;
        let documents = DocumentStore::new(pool.clone(), config.embedding.dimension).await?;
        let conversations = ConversationStore::new(pool.clone()).await?;
        let summaries = SummaryStore::new(pool).await?;

        let gemini = Arc::new(GeminiClient::new(
            secrets.google_api_key.clone().unwrap_or_default(),
            config.embedding.model.clone(),
            config.completion.gemini_model.clone(),
        ));
        let groq = Arc::new(GroqClient::new(
            secrets.groq_api_key.clone().unwrap_or_default(),
            config.completion.groq_model.clone(),
        ));

        let embedder = EmbeddingService::new(gemini.clone(), config.embedding.dimension);
        // Primary first; order is the failover order.
        let completions = CompletionChain::new(vec![
            groq as Arc<dyn CompletionBackend>,
            gemini as Arc<dyn CompletionBackend>,
        ]);

        let ingestion = IngestionPipeline::new(documents.clone(), embedder.clone(), config.chunking);
        let answering = AnswerPipeline::new(
            documents.clone(),
            conversations.clone(),
            embedder,
            completions.clone(),
            config.retrieval,
        );

        Ok(Arc::new(AppState {
            paths,
            config,
            users,
            documents,
            conversations,
            summaries,
            ingestion,
            answering,
            completions,
            started_at: Utc::now(),
        }))
    }
}
