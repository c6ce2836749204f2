//! Shared application context built once in `main`.

use std::sync::Arc;
use std::time::Duration;

use tamara_ai::{
    ChatOrchestrator, ModelBackend, OllamaClient, OllamaConfig, OrchestratorConfig, SpeechEngine,
    SpeechSettings, SpeechSynthesizer, ToolRegistry,
};
use tamara_common::TamaraError;
use tamara_config::TamaraConfig;
use tamara_db::{register_database_tools, DatabaseClient};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::manager::ConnectionManager;

/// Everything a connection needs, cheap to clone.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<TamaraConfig>,
    pub backend: Arc<dyn ModelBackend>,
    pub tools: Arc<ToolRegistry>,
    pub speech: Option<Arc<dyn SpeechSynthesizer>>,
    pub connections: ConnectionManager,
    /// Present when the database tools are enabled.
    pub database: Option<Arc<DatabaseClient>>,
    /// Cancelled once at shutdown. Every session's turns hang off it.
    pub shutdown: CancellationToken,
}

impl AppContext {
    pub fn new(
        config: TamaraConfig,
        backend: Arc<dyn ModelBackend>,
        tools: ToolRegistry,
        speech: Option<Arc<dyn SpeechSynthesizer>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            backend,
            tools: Arc::new(tools),
            speech,
            connections: ConnectionManager::new(),
            database: None,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_database(mut self, database: Arc<DatabaseClient>) -> Self {
        self.database = Some(database);
        self
    }

    /// Build the production collaborators from config.
    ///
    /// The database and speech server are optional at runtime: a failed
    /// database connection leaves the tools reporting it, and the speech
    /// engine becomes ready in the background if its server answers.
    pub async fn build(config: TamaraConfig) -> Result<Self, TamaraError> {
        let ollama = OllamaConfig::new(config.llm.base_url.clone())
            .with_request_timeout(Duration::from_secs(u64::from(config.llm.request_timeout_secs)));
        let backend: Arc<dyn ModelBackend> = Arc::new(OllamaClient::new(ollama)?);
        info!(model = %config.llm.model, url = %config.llm.base_url, "model backend configured");

        let mut tools = ToolRegistry::new();
        let mut database = None;
        if config.tools.enabled && config.database.enabled {
            let client = Arc::new(DatabaseClient::connect(&config.database).await);
            let n = register_database_tools(&mut tools, client.clone(), &config.tools.available);
            info!(tools = n, "database tools registered");
            database = Some(client);
        } else {
            info!(
                tools_enabled = config.tools.enabled,
                database_enabled = config.database.enabled,
                "tool calling disabled"
            );
        }

        let speech: Option<Arc<dyn SpeechSynthesizer>> = if config.tts.enabled {
            let engine = Arc::new(SpeechEngine::new(speech_settings(&config))?);
            engine.spawn_initialize();
            Some(engine)
        } else {
            info!("speech synthesis disabled");
            None
        };

        let ctx = Self::new(config, backend, tools, speech);
        Ok(match database {
            Some(client) => ctx.with_database(client),
            None => ctx,
        })
    }

    /// Cancel every running turn, then release the database pool.
    pub async fn close(&self) {
        self.shutdown.cancel();
        if let Some(database) = &self.database {
            database.close().await;
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let c = &self.config;
        OrchestratorConfig {
            model: c.llm.model.clone(),
            system_prompt: c.llm.system_prompt.clone(),
            max_history: c.llm.max_history as usize,
            request_timeout: Duration::from_secs(u64::from(c.llm.request_timeout_secs)),
            tool_timeout: Duration::from_secs(u64::from(c.tools.timeout_secs)),
            tools_enabled: c.tools.enabled,
        }
    }

    /// A fresh orchestrator with its own history.
    pub fn new_orchestrator(&self) -> ChatOrchestrator {
        ChatOrchestrator::new(
            self.backend.clone(),
            self.tools.clone(),
            self.orchestrator_config(),
        )
    }
}

fn speech_settings(config: &TamaraConfig) -> SpeechSettings {
    let tts = &config.tts;
    SpeechSettings {
        base_url: tts.base_url.clone(),
        model: tts.model.clone(),
        voice: tts.voice.clone(),
        speed: tts.speed,
        language: tts.language.clone(),
        response_format: tts.response_format.clone(),
    }
}
