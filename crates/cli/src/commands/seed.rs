use carlot_core::config::LoadOptions;
use carlot_db::{DemoCatalog, SeedResult};

use crate::commands::{async_runtime, load_config, open_database, CommandFailure, CommandResult};

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match load_config("seed", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match async_runtime("seed") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;

        let seeded = DemoCatalog::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoCatalog::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        pool.close().await;

        let outcome: Result<SeedResult, CommandFailure> = if verification.all_present {
            Ok(seeded)
        } else {
            Err(("seed_verification", missing_message(&verification.missing_plates), 6u8))
        };
        outcome
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", success_message(seeded)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn success_message(seeded: SeedResult) -> String {
    format!(
        "demo catalog ready: {} vehicles ({} inserted, {} already present)",
        seeded.inserted + seeded.skipped,
        seeded.inserted,
        seeded.skipped
    )
}

fn missing_message(missing_plates: &[&str]) -> String {
    if missing_plates.is_empty() {
        "some demo vehicles failed to load".to_string()
    } else {
        format!("seed verification failed for plates: {}", missing_plates.join(", "))
    }
}
