use carlot_core::config::LoadOptions;
use carlot_core::conversation::Session;
use tracing::info;

use crate::commands::{
    async_runtime, load_config, open_agent, open_database, CommandFailure, CommandResult,
};
use crate::logging::init_logging;

/// Runs one turn in a fresh session. The reply is the payload message and the
/// full turn outcome rides along in `details`.
pub fn run(options: LoadOptions, utterance: &str) -> CommandResult {
    let config = match load_config("ask", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    init_logging(&config.logging);

    let runtime = match async_runtime("ask") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let agent = open_agent(&config, pool.clone()).await?;

        let mut session = Session::new();
        let outcome = agent.handle_turn(&mut session, utterance).await;
        info!(
            event_name = "cli.ask_completed",
            correlation_id = %outcome.correlation_id,
            kind = ?outcome.kind,
            "single turn answered"
        );

        pool.close().await;
        Ok::<_, CommandFailure>(outcome)
    });

    match result {
        Ok(outcome) => {
            let details = serde_json::to_value(&outcome).ok();
            CommandResult::success_with_details("ask", outcome.reply.clone(), details)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("ask", error_class, message, exit_code)
        }
    }
}
