use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tiendita_agent::backend::ClassifierBackend;
use tiendita_agent::classifier::StrictJsonClassifier;
use tiendita_agent::gemini::GeminiClient;
use tiendita_agent::llm::{LlmClient, LlmError};
use tiendita_agent::orchestrator::ToolCallingOrchestrator;
use tiendita_agent::tools::ToolRegistry;
use tiendita_core::config::{AppConfig, ClassifierMode, ConfigError, LoadOptions};
use tiendita_db::repositories::{SqlOrderRepository, SqlProductRepository, SqlTenantRepository};
use tiendita_db::{connect_with_settings, migrations, DbPool};
use tiendita_whatsapp::outbound::CloudApiMessenger;
use tracing::info;

use crate::dispatch::Dispatcher;
use crate::tools::{GetInventoryTool, UpdateStockTool};
use crate::webhook::{AppState, MessagePipeline};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("llm client initialization failed: {0}")]
    LlmClient(#[source] LlmError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let tenants = Arc::new(SqlTenantRepository::new(db_pool.clone()));
    let products = Arc::new(SqlProductRepository::new(db_pool.clone()));
    let orders = Arc::new(SqlOrderRepository::new(db_pool.clone()));

    let llm: Arc<dyn LlmClient> = Arc::new(
        GeminiClient::new(
            config.llm.base_url.clone(),
            config.llm.model.clone(),
            config.llm.api_key.clone(),
            Duration::from_secs(config.llm.timeout_secs),
        )
        .map_err(BootstrapError::LlmClient)?,
    );

    let backend: Arc<dyn ClassifierBackend> = match config.llm.mode {
        ClassifierMode::StrictJson => Arc::new(StrictJsonClassifier::new(llm)),
        ClassifierMode::ToolCalling => {
            let mut registry = ToolRegistry::new();
            registry.register(Arc::new(GetInventoryTool::new(products.clone())));
            registry.register(Arc::new(UpdateStockTool::new(products.clone())));
            Arc::new(ToolCallingOrchestrator::new(llm, registry))
        }
    };
    info!(
        event_name = "system.bootstrap.classifier_selected",
        correlation_id = "bootstrap",
        mode = ?config.llm.mode,
        "classifier backend selected"
    );

    let messenger = Arc::new(CloudApiMessenger::new(
        config.whatsapp.api_base.clone(),
        config.whatsapp.phone_number_id.clone(),
        config.whatsapp.access_token.clone(),
    ));

    let dispatcher = Dispatcher::new(tenants.clone(), products, orders);
    let pipeline = MessagePipeline::new(tenants, dispatcher, backend, messenger);

    let state = AppState {
        verify_token: config.whatsapp.verify_token.clone(),
        pipeline: Arc::new(pipeline),
    };

    Ok(Application { config, db_pool, state })
}
