pub mod ask;
pub mod chat;
pub mod doctor;
pub mod migrate;
pub mod seed;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use carlot_agent::{build_client, AgentRuntime};
use carlot_core::config::{AppConfig, LoadOptions};
use carlot_db::{
    connect_with_settings, migrations, CatalogClient, CatalogService, DbPool,
    SqlVehicleRepository,
};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

/// `(error_class, message, exit_code)` carried out of an async block.
pub(crate) type CommandFailure = (&'static str, String, u8);

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_details(command, message, None)
    }

    pub fn success_with_details(
        command: &str,
        message: impl Into<String>,
        details: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            details,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            details: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// A command that already wrote its output, such as an interactive session.
    pub fn silent(exit_code: u8) -> Self {
        Self { exit_code, output: String::new() }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(command: &str, options: LoadOptions) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })
}

pub(crate) fn async_runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

pub(crate) async fn open_database(config: &AppConfig) -> Result<DbPool, CommandFailure> {
    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5u8))?;
    Ok(pool)
}

/// Wires the conversational runtime over the configured database and
/// completion backend.
pub(crate) async fn open_agent(
    config: &AppConfig,
    pool: DbPool,
) -> Result<AgentRuntime, CommandFailure> {
    let repository = Arc::new(SqlVehicleRepository::new(pool));
    let service = CatalogService::new(repository).with_limits(config.search.filter_limits());
    let catalog = CatalogClient::new(Arc::new(service));
    let llm = build_client(&config.llm)
        .map_err(|error| ("llm_client", format!("completion backend: {error}"), 2u8))?;

    AgentRuntime::bootstrap(config, llm, catalog)
        .await
        .map_err(|error| ("agent_bootstrap", error.to_string(), 3u8))
}
