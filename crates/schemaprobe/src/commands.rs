//! schemaprobe command implementations

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use schemaprobe_config::{self, Config};
use schemaprobe_discovery::{DiscoverRequest, Discoverer, HttpTransport, Transport};
use schemaprobe_provider::{openai::OpenAiCompatProvider, Provider};

use crate::server::{self, AppState, SharedDiscoverer};

/// Reasoning client for the configured endpoint. A non-empty
/// `api_key_override` beats both the config file and the environment.
pub fn build_provider(config: &Config, api_key_override: Option<String>) -> OpenAiCompatProvider {
    let api_key = api_key_override
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .or_else(|| config.api_key())
        .unwrap_or_default();

    OpenAiCompatProvider::new(api_key, config.api_base(), Some(config.model()))
        .with_alternating_roles(config.alternating_roles())
}

fn build_discoverer(config: &Config, api_key_override: Option<String>) -> Result<SharedDiscoverer> {
    let provider: Arc<dyn Provider> = Arc::new(build_provider(config, api_key_override));
    let transport: Arc<dyn Transport> = Arc::new(
        HttpTransport::from_secs(config.probe.timeout_secs)
            .context("Failed to build probe transport")?,
    );

    if !provider.is_configured() {
        warn!(
            "◆ no API key configured; set reasoning.apiKey, {} or --api-key",
            schemaprobe_config::API_KEY_ENV
        );
    }

    Ok(Arc::new(
        Discoverer::new(provider, transport)
            .with_model(config.model())
            .with_max_tokens(config.reasoning.max_tokens)
            .with_temperature(config.reasoning.temperature),
    ))
}

/// Parse repeated `Name: value` header flags
pub fn parse_headers(raw: &[String]) -> Result<HashMap<String, String>> {
    let mut headers = HashMap::new();
    for entry in raw {
        let Some((name, value)) = entry.split_once(':') else {
            bail!("Invalid header '{}', expected 'Name: value'", entry);
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("Invalid header '{}', name is empty", entry);
        }
        headers.insert(name.to_string(), value.trim().to_string());
    }
    Ok(headers)
}

/// Parse the `--body` flag; only JSON objects are accepted
pub fn parse_body(raw: Option<&str>) -> Result<Option<Map<String, Value>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(raw).context("Initial body is not valid JSON")?;
    match value {
        Value::Object(map) => Ok(Some(map)),
        other => bail!("Initial body must be a JSON object, got {}", other),
    }
}

/// Initialize config
pub async fn init_command() -> Result<()> {
    println!("◆ Initializing schemaprobe...");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = schemaprobe_config::init().await?;

    println!("\n◆ Config ready at {}", schemaprobe_config::config_path().display());
    println!("\nNext steps:");
    if !config.has_api_key() {
        println!(
            "  1. Add your API key to ~/.schemaprobe/config.json or export {}",
            schemaprobe_config::API_KEY_ENV
        );
    } else {
        println!("  1. API key already configured");
    }
    println!("  2. Discover a schema: schemaprobe discover --url http://localhost:8081/api/users");

    Ok(())
}

/// Show status
pub async fn status_command() -> Result<()> {
    let config_path = schemaprobe_config::config_path();

    println!("◆ schemaprobe Status");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!(
        "Config:    {} {}",
        config_path.display(),
        if config_path.exists() {
            "[OK]"
        } else {
            "[Missing]"
        }
    );

    let config = Config::load().await?;
    println!("Model:     {}", config.model());
    println!(
        "API Key:   {}",
        if config.has_api_key() {
            "[Set]"
        } else {
            "[Missing]"
        }
    );
    if let Some(base) = config.api_base() {
        println!("API Base:  {}", base);
    }
    println!(
        "Defaults:  {} / {} iterations",
        config.discovery.method, config.discovery.max_iterations
    );
    println!("Service:   {}", config.bind_address());

    println!("\n◆ Ready");

    Ok(())
}

/// Run one discovery and print the schema
pub async fn discover_command(
    url: String,
    method: Option<String>,
    headers: Vec<String>,
    body: Option<String>,
    max_iterations: Option<u32>,
    api_key: Option<String>,
) -> Result<()> {
    let config = Config::load().await?;

    let request = DiscoverRequest {
        method,
        url,
        headers: parse_headers(&headers)?,
        initial_body: parse_body(body.as_deref())?,
        max_iterations,
    };
    let target = request.into_target(&config.discovery.method, config.discovery.max_iterations)?;

    let discoverer = build_discoverer(&config, api_key)?;
    let schema = discoverer
        .run(target)
        .await
        .context("Could not produce a schema")?;

    info!("◆ discovered {} fields", schema.fields.len());
    println!("{}", serde_json::to_string_pretty(&schema)?);

    Ok(())
}

/// Start the discovery service
pub async fn serve_command(port: Option<u16>, api_key: Option<String>) -> Result<()> {
    let mut config = Config::load().await?;
    if let Some(port) = port {
        config.server.port = port;
    }

    println!("◆ Starting schemaprobe service");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let state = AppState {
        discoverer: build_discoverer(&config, api_key)?,
        defaults: config.discovery.clone(),
    };
    let app = server::router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    println!("◆ Listening on http://{}", addr);
    println!("  POST /api/discover");
    println!("  GET  /health");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Service stopped unexpectedly")?;

    println!("◆ Service shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("◆ failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("◆ shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_headers() {
        let headers = parse_headers(&[
            "Authorization: Bearer abc:def".to_string(),
            "X-Trace:1".to_string(),
        ])
        .unwrap();

        assert_eq!(headers["Authorization"], "Bearer abc:def");
        assert_eq!(headers["X-Trace"], "1");
    }

    #[test]
    fn test_parse_headers_rejects_bad_entries() {
        assert!(parse_headers(&["NoColon".to_string()]).is_err());
        assert!(parse_headers(&[": value".to_string()]).is_err());
    }

    #[test]
    fn test_parse_body() {
        assert!(parse_body(None).unwrap().is_none());

        let body = parse_body(Some(r#"{"email":"a@b.com"}"#)).unwrap().unwrap();
        assert_eq!(body["email"], json!("a@b.com"));

        assert!(parse_body(Some("[1,2]")).is_err());
        assert!(parse_body(Some("{oops")).is_err());
    }

    #[test]
    fn test_api_key_override_wins() {
        let mut config = Config::default();
        config.reasoning.api_key = "from-config".to_string();

        let provider = build_provider(&config, Some("  ".to_string()));
        assert!(provider.is_configured());

        let provider = build_provider(&config, Some("sk-or-cli".to_string()));
        assert!(provider.is_openrouter());
    }

    #[test]
    fn test_api_base_from_config() {
        let mut config = Config::default();
        config.reasoning.api_key = "k".to_string();
        config.reasoning.api_base = Some("http://127.0.0.1:9999/v1/".to_string());

        let provider = build_provider(&config, None);
        assert_eq!(provider.api_base(), "http://127.0.0.1:9999/v1");
    }
}
