//! Terminal rendering of dispatch results

use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use multichat_fanout::{DispatchError, DispatchResults, Dispatcher, ProviderResult, Status};
use multichat_utils::AppConfig;

const RULE_WIDTH: usize = 60;

/// Display label for a provider id
fn label<'a>(config: &'a AppConfig, provider_id: &'a str) -> &'a str {
    config
        .provider(provider_id)
        .map_or(provider_id, |settings| settings.label())
}

/// Order results the way providers appear in the configuration
fn in_config_order<'a>(
    results: &'a DispatchResults,
    config: &AppConfig,
) -> Vec<&'a ProviderResult> {
    results.ordered(&config.provider_ids())
}

fn status_marker(status: Status) -> &'static str {
    match status {
        Status::Success => "✅ success",
        Status::Error => "❌ error",
        Status::Unavailable => "⚠️  unavailable",
    }
}

fn tokens_cell(result: &ProviderResult) -> String {
    result
        .tokens_used
        .map_or_else(|| "-".to_string(), |tokens| tokens.to_string())
}

/// Short advice for common provider failures
pub fn error_hint(detail: &str) -> Option<&'static str> {
    let detail = detail.to_lowercase();

    if ["quota", "rate limit", "429", "resource_exhausted"]
        .iter()
        .any(|needle| detail.contains(needle))
    {
        Some("Quota or rate limit reached; check the account's billing or retry later")
    } else if ["authentication", "api key", "401", "403", "permission"]
        .iter()
        .any(|needle| detail.contains(needle))
    {
        Some("The API key was rejected; check that it is valid and active")
    } else if ["timed out", "http error", "connect", "dns"]
        .iter()
        .any(|needle| detail.contains(needle))
    {
        Some("Network problem; check connectivity and try again")
    } else {
        None
    }
}

/// Print every result as a block, in configuration order
pub fn print_results(results: &DispatchResults, config: &AppConfig) {
    for result in in_config_order(results, config) {
        println!("{}", "=".repeat(RULE_WIDTH));
        println!("{}", label(config, &result.provider_id));
        println!("{}", "-".repeat(RULE_WIDTH));
        println!("{}", result.response_text);

        match result.status {
            Status::Success => {
                let mut metrics = format!("Response time: {:.2}s", result.elapsed_display());
                if let Some(tokens) = result.tokens_used {
                    metrics.push_str(&format!(" | Tokens: {tokens}"));
                    if let (Some(prompt), Some(completion)) =
                        (result.prompt_tokens, result.completion_tokens)
                    {
                        metrics.push_str(&format!(" (prompt {prompt}, completion {completion})"));
                    }
                }
                println!("\n{metrics}");
            }
            Status::Error => {
                if let Some(hint) = result.error_detail.as_deref().and_then(error_hint) {
                    println!("\nHint: {hint}");
                }
            }
            Status::Unavailable => {}
        }
    }
    println!("{}", "=".repeat(RULE_WIDTH));
}

/// Side-by-side comparison of a dispatch
pub fn comparison_table(results: &DispatchResults, config: &AppConfig) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Model", "Response Time (s)", "Tokens Used", "Status"]);

    for result in in_config_order(results, config) {
        let elapsed = if result.status == Status::Unavailable {
            "-".to_string()
        } else {
            format!("{:.2}", result.elapsed_display())
        };

        table.add_row(vec![
            label(config, &result.provider_id).to_string(),
            elapsed,
            tokens_cell(result),
            status_marker(result.status).to_string(),
        ]);
    }

    table
}

/// Configured providers and whether each one can be called
pub fn provider_table(dispatcher: &Dispatcher, config: &AppConfig) -> Table {
    let available = dispatcher.available_ids();
    let unavailable = dispatcher.unavailable();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Id", "Name", "Model", "Key", "State"]);

    for settings in &config.providers {
        let state = if available.contains(&settings.id.as_str()) {
            "ready".to_string()
        } else {
            unavailable
                .iter()
                .find(|(id, _)| *id == settings.id)
                .map_or_else(|| "not registered".to_string(), |(_, reason)| (*reason).to_string())
        };

        table.add_row(vec![
            settings.id.clone(),
            settings.label().to_string(),
            settings.model.clone(),
            settings.api_key_env.clone(),
            state,
        ]);
    }

    table
}

/// Environment variables that would make the listed providers usable
pub fn missing_keys(error: &DispatchError, config: &AppConfig) -> Vec<String> {
    match error {
        DispatchError::TotalUnavailable { reasons } => reasons
            .iter()
            .filter_map(|r| config.provider(&r.provider_id))
            .map(|settings| settings.api_key_env.clone())
            .collect(),
        DispatchError::EmptyPrompt => Vec::new(),
    }
}

/// Explain a dispatch-level failure on stderr
pub fn print_dispatch_error(error: &DispatchError, config: &AppConfig) {
    eprintln!("Error: {error}");

    let keys = missing_keys(error, config);
    if !keys.is_empty() {
        eprintln!("\nSet at least one of these API keys (environment or .env file):");
        for key in keys {
            eprintln!("  {key}");
        }
    }
}
