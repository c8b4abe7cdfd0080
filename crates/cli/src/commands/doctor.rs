use carlot_core::config::{AppConfig, LlmConfig, LlmProvider, LoadOptions};
use carlot_db::{connect_with_settings, migrations, DemoCatalog};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
            details: "skipped because configuration did not load".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: LoadOptions, json_output: bool) -> String {
    let report = build_report(options);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck::pass(
                "config_validation",
                "configuration loaded and validated",
            ));
            checks.push(check_completion_backend(&config.llm));
            checks.extend(check_database(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            checks.push(DoctorCheck::skipped("completion_backend"));
            checks.push(DoctorCheck::skipped("database_connectivity"));
            checks.push(DoctorCheck::skipped("catalog_readiness"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

/// Reports the settings the completion client will use. Reachability is not
/// tested; a down backend only degrades turns to their deterministic fallbacks.
fn check_completion_backend(llm: &LlmConfig) -> DoctorCheck {
    let endpoint = match (llm.provider, llm.base_url.as_deref()) {
        (_, Some(base_url)) => base_url.to_string(),
        (LlmProvider::OpenAi, None) => "https://api.openai.com/v1".to_string(),
        (LlmProvider::Ollama, None) => {
            return DoctorCheck::fail("completion_backend", "ollama provider requires a base_url");
        }
    };
    let credential = match (llm.provider, llm.api_key.is_some()) {
        (LlmProvider::OpenAi, true) => "api key configured",
        (LlmProvider::OpenAi, false) => {
            return DoctorCheck::fail("completion_backend", "openai provider requires an api key");
        }
        (LlmProvider::Ollama, _) => "no api key required",
    };

    DoctorCheck::pass(
        "completion_backend",
        format!("model `{}` at `{endpoint}` ({credential})", llm.model),
    )
}

fn check_database(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck::fail(
                    "database_connectivity",
                    format!("failed to initialize async runtime: {error}"),
                ),
                DoctorCheck::skipped("catalog_readiness"),
            ];
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck::fail(
                        "database_connectivity",
                        format!("failed to connect to database: {error}"),
                    ),
                    DoctorCheck::fail("catalog_readiness", "database is unreachable"),
                ];
            }
        };

        let connectivity = DoctorCheck::pass(
            "database_connectivity",
            format!("connected using `{}`", config.database.url),
        );

        let readiness = match migrations::run_pending(&pool).await {
            Err(error) => {
                DoctorCheck::fail("catalog_readiness", format!("migrations failed: {error}"))
            }
            Ok(()) => match DemoCatalog::verify(&pool).await {
                Ok(verification) if verification.all_present => {
                    DoctorCheck::pass(
                        "catalog_readiness",
                        "schema current and demo catalog present",
                    )
                }
                Ok(verification) => DoctorCheck::fail(
                    "catalog_readiness",
                    format!(
                        "{} demo vehicles missing; run `carlot seed`",
                        verification.missing_plates.len()
                    ),
                ),
                Err(error) => DoctorCheck::fail("catalog_readiness", error.to_string()),
            },
        };

        pool.close().await;
        vec![connectivity, readiness]
    })
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
