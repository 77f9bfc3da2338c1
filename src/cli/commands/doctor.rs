//! Doctor command - verify the inference server and configuration.

use crate::chat::create_client;
use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::transcript::TranscriptCache;
use console::style;
use serde::Deserialize;
use std::time::Duration;

/// Timeout for each server probe.
const PROBE_TIMEOUT_SECS: u64 = 5;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Model list returned by `GET /api/tags`.
#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings, config_path: &std::path::Path) -> anyhow::Result<()> {
    Output::header("Tubechat Doctor");
    println!();
    println!("Checking the inference server and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("Configuration").bold());
    let section = vec![check_config_file(config_path), check_chat_settings(settings)];
    for check in &section {
        check.print();
    }
    checks.extend(section);

    println!();

    println!("{}", style("Inference Server").bold());
    let section = check_server(settings).await;
    for check in &section {
        check.print();
    }
    checks.extend(section);

    println!();

    println!("{}", style("Transcripts").bold());
    let section = vec![check_transcripts(settings), check_collaborator_key(settings)];
    for check in &section {
        check.print();
    }
    checks.extend(section);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before chatting.",
            errors
        ));
    } else if warnings > 0 {
        Output::warning(&format!("All required checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed!");
    }

    Ok(())
}

fn check_config_file(path: &std::path::Path) -> CheckResult {
    if path.exists() {
        CheckResult::ok("Config file", &path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "Not found, using defaults",
            "Create one with: tubechat config init",
        )
    }
}

fn check_chat_settings(settings: &Settings) -> CheckResult {
    match settings.chat.validate() {
        Ok(()) => CheckResult::ok(
            "Chat settings",
            &format!("{} via {}", settings.chat.model, settings.chat.endpoint),
        ),
        Err(e) => CheckResult::error(
            "Chat settings",
            &e.to_string(),
            "Fix [chat] in the config file (tubechat config edit)",
        ),
    }
}

async fn check_server(settings: &Settings) -> Vec<CheckResult> {
    let root = match settings.chat.server_root() {
        Ok(root) => root,
        Err(e) => {
            return vec![CheckResult::error(
                "Server",
                &e.to_string(),
                "Set a valid chat.endpoint",
            )]
        }
    };
    let client = match create_client(&settings.chat) {
        Ok(client) => client,
        Err(e) => return vec![CheckResult::error("Server", &e.to_string(), "")],
    };
    let timeout = Duration::from_secs(PROBE_TIMEOUT_SECS);

    if let Err(e) = client.get(root.clone()).timeout(timeout).send().await {
        return vec![CheckResult::error(
            "Server",
            &format!("{} is not reachable: {}", root, e),
            "Start the server (e.g. 'ollama serve') or set chat.endpoint",
        )];
    }
    let mut results = vec![CheckResult::ok("Server", &format!("{} is reachable", root))];

    let tags = match root.join("api/tags") {
        Ok(url) => url,
        Err(e) => {
            results.push(CheckResult::warning("Model", &e.to_string(), ""));
            return results;
        }
    };
    let listing = match client.get(tags).timeout(timeout).send().await {
        Ok(response) if response.status().is_success() => response.json::<TagList>().await.ok(),
        _ => None,
    };

    results.push(match listing {
        Some(list) => {
            let names: Vec<String> = list.models.into_iter().map(|m| m.name).collect();
            if model_available(&names, &settings.chat.model) {
                CheckResult::ok("Model", &format!("{} is installed", settings.chat.model))
            } else {
                CheckResult::error(
                    "Model",
                    &format!("{} is not installed", settings.chat.model),
                    &format!("Run: ollama pull {}", settings.chat.model),
                )
            }
        }
        None => CheckResult::warning(
            "Model",
            "Could not list installed models",
            "The server may not expose /api/tags",
        ),
    });

    results
}

/// Whether `wanted` names one of the installed models. A bare name matches
/// its `:latest` tag.
fn model_available(installed: &[String], wanted: &str) -> bool {
    installed.iter().any(|name| {
        name == wanted || (!wanted.contains(':') && name == &format!("{}:latest", wanted))
    })
}

fn check_transcripts(settings: &Settings) -> CheckResult {
    let cache = TranscriptCache::new(settings.transcript_dir());
    match cache.list() {
        Ok(entries) => CheckResult::ok(
            "Transcript cache",
            &format!("{} transcript(s) in {}", entries.len(), cache.dir().display()),
        ),
        Err(e) => CheckResult::error(
            "Transcript cache",
            &e.to_string(),
            "Set transcript.cache_dir to a writable directory",
        ),
    }
}

fn check_collaborator_key(settings: &Settings) -> CheckResult {
    let var = &settings.transcript.api_key_env;
    if preflight::collaborator_key_present(settings) {
        CheckResult::ok("Transcription key", &format!("{} is set", var))
    } else {
        CheckResult::warning(
            "Transcription key",
            &format!("{} is not set", var),
            "Only needed by the external transcription tool that produces transcripts",
        )
    }
}
