use carlot_agent::AgentRuntime;
use carlot_core::config::LoadOptions;
use carlot_core::conversation::Session;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::commands::{
    async_runtime, load_config, open_agent, open_database, CommandFailure, CommandResult,
};
use crate::logging::init_logging;

const PROMPT: &str = "> ";

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match load_config("chat", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    init_logging(&config.logging);

    let runtime = match async_runtime("chat") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let agent = open_agent(&config, pool.clone()).await?;

        let input = BufReader::new(tokio::io::stdin());
        let mut output = tokio::io::stdout();
        let finished = tokio::select! {
            turns = converse(&agent, input, &mut output) => Some(turns),
            _ = tokio::signal::ctrl_c() => None,
        };
        let turns = match finished {
            Some(turns) => turns.map_err(|error| ("terminal_io", error.to_string(), 1u8))?,
            None => {
                let outcome = agent.farewell(&mut Session::new()).await;
                let _ = write_reply(&mut output, &format!("\n{}", outcome.reply)).await;
                0
            }
        };

        info!(event_name = "cli.chat_ended", turns, "chat session ended");
        pool.close().await;
        Ok::<(), CommandFailure>(())
    });

    match result {
        Ok(()) => CommandResult::silent(0),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("chat", error_class, message, exit_code)
        }
    }
}

/// Drives one session over a line-oriented terminal. Returns the number of
/// user turns handled. End of input says goodbye like an exit phrase would.
pub async fn converse<R, W>(
    agent: &AgentRuntime,
    input: R,
    output: &mut W,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut session = Session::new();
    let greeting = agent.greet(&mut session).await;
    write_reply(output, &greeting.reply).await?;

    let mut lines = input.lines();
    let mut turns = 0;
    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            let farewell = agent.farewell(&mut session).await;
            write_reply(output, &farewell.reply).await?;
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        turns += 1;
        let outcome = agent.handle_turn(&mut session, &line).await;
        debug!(
            event_name = "cli.turn",
            correlation_id = %outcome.correlation_id,
            kind = ?outcome.kind,
            "turn handled"
        );
        write_reply(output, &outcome.reply).await?;

        if outcome.end_session {
            break;
        }
    }

    Ok(turns)
}

async fn write_reply<W: AsyncWrite + Unpin>(output: &mut W, reply: &str) -> std::io::Result<()> {
    output.write_all(reply.as_bytes()).await?;
    output.write_all(b"\n\n").await?;
    output.flush().await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::anyhow;
    use async_trait::async_trait;

    use carlot_agent::{AgentRuntime, CompletionRequest, LlmClient};
    use carlot_core::config::AppConfig;
    use carlot_db::{CatalogClient, CatalogService, DemoCatalog, InMemoryVehicleRepository};

    use super::converse;

    struct OfflineLlm;

    #[async_trait]
    impl LlmClient for OfflineLlm {
        async fn complete(&self, _request: &CompletionRequest) -> anyhow::Result<String> {
            Err(anyhow!("connection refused"))
        }
    }

    async fn offline_agent() -> AgentRuntime {
        let repository = Arc::new(InMemoryVehicleRepository::new(DemoCatalog::vehicles()));
        let catalog = CatalogClient::new(Arc::new(CatalogService::new(repository)));
        AgentRuntime::bootstrap(&AppConfig::default(), Arc::new(OfflineLlm), catalog)
            .await
            .expect("runtime")
    }

    #[tokio::test]
    async fn session_greets_answers_and_stops_at_exit_phrase() {
        let agent = offline_agent().await;
        let input: &[u8] = b"\nred cars\nquit\nnever read\n";
        let mut output = Vec::new();

        let turns = converse(&agent, input, &mut output).await.expect("io");

        let transcript = String::from_utf8(output).expect("utf8");
        assert_eq!(turns, 2);
        assert!(transcript.starts_with("Hello! I'm Carlot."));
        assert!(transcript.contains("Vermelho"));
        assert!(transcript.contains("Goodbye!"));
        assert!(!transcript.contains("never read"));
    }

    #[tokio::test]
    async fn end_of_input_says_goodbye() {
        let agent = offline_agent().await;
        let mut output = Vec::new();

        let turns = converse(&agent, &b""[..], &mut output).await.expect("io");

        assert_eq!(turns, 0);
        let transcript = String::from_utf8(output).expect("utf8");
        assert!(transcript.trim_end().ends_with("Thanks for stopping by. Goodbye!"));
    }
}
