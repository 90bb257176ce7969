//! Subcommand implementations

use anyhow::{anyhow, bail, Context as _};
use prism_foundation::{Content, Media, PrismConfig, ResultCache, StoreRegistry};
use prism_provider::OutputFormat;
use prism_transformer::{
    cache_identity, cache_key, ContentFetcher, Dispatch, FetchOptions, InlineTransformer, Prism,
    PrismServices, TransformerHandler, TransformerOptions,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::TransformerArgs;

/// Input selected on the command line
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Text(String),
    Url(String),
    File(PathBuf),
}

impl Source {
    fn into_content(self) -> anyhow::Result<Content> {
        Ok(match self {
            Source::Text(text) => Content::text(text),
            Source::Url(url) => Content::url(url),
            Source::File(path) => Content::Media(
                Media::from_path(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
            ),
        })
    }
}

/// Build the transformer described by the flags
pub fn build_transformer(args: &TransformerArgs) -> anyhow::Result<InlineTransformer> {
    let mut options = TransformerOptions::new();

    if let Some(system) = &args.system {
        options = options.with_system_prompt(system.clone());
    }
    if let Some(provider) = &args.provider {
        options = options.with_provider(provider.clone());
    }
    if let Some(model) = &args.model {
        options = options.with_model(model.clone());
    }
    if let Some(temperature) = args.temperature {
        options = options.with_temperature(temperature);
    }
    if let Some(top_p) = args.top_p {
        options = options.with_top_p(top_p);
    }
    if let Some(timeout) = args.timeout {
        options = options.with_timeout(timeout);
    }
    if let Some(path) = &args.schema {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema {}", path.display()))?;
        let schema: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid JSON schema in {}", path.display()))?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output")
            .to_string();
        options = options.with_output_format(OutputFormat::new(name, schema));
    }

    Ok(InlineTransformer::new(args.name.clone(), args.prompt.clone()).with_options(options))
}

// ============================================================================
// transform
// ============================================================================

pub async fn transform(
    config: PrismConfig,
    args: &TransformerArgs,
    source: Source,
    json: bool,
) -> anyhow::Result<()> {
    let transformer = build_transformer(args)?;
    let content = source.into_content()?;
    let services = PrismServices::from_config(config)?;
    debug!(transformer = %args.name, "Running transformation");

    let dispatch = Prism::new(&services)
        .content(content)
        .using(TransformerHandler::transformer(transformer))
        .run()
        .await?;

    let result = match dispatch {
        Dispatch::Completed(Some(result)) => result,
        other => bail!("Unexpected dispatch: {:?}", other),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if let Some(data) = result.data() {
        println!("{}", data.render());
    }

    if !result.is_successful() {
        for error in result.errors() {
            eprintln!("Error: {}", error);
        }
        bail!("Transformation failed");
    }
    Ok(())
}

// ============================================================================
// fetch
// ============================================================================

pub async fn fetch(
    config: &PrismConfig,
    url: &str,
    method: &str,
    headers: &[String],
    body: Option<String>,
) -> anyhow::Result<()> {
    let mut options = FetchOptions::new().with_method(method);
    for raw in headers {
        let (name, value) = parse_header(raw)?;
        options = options.with_header(name, value);
    }
    if let Some(body) = body {
        options = options.with_body(body);
    }

    let fetcher = ContentFetcher::from_config(config, Arc::new(StoreRegistry::in_memory()))?;
    debug!(url, method, headers = headers.len(), "Fetching");
    let content = fetcher.fetch(url, &options).await?;
    println!("{}", content);
    Ok(())
}

fn parse_header(raw: &str) -> anyhow::Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("Header must be NAME:VALUE, got: {}", raw))?;

    let name = name.trim();
    if name.is_empty() {
        bail!("Header name is empty: {}", raw);
    }
    Ok((name.to_string(), value.trim().to_string()))
}

// ============================================================================
// key / config
// ============================================================================

pub fn key(
    config: &PrismConfig,
    args: &TransformerArgs,
    source: Option<Source>,
) -> anyhow::Result<()> {
    let transformer = build_transformer(args)?;
    println!("identity: {}", cache_identity(&transformer, config));

    if let Some(source) = source {
        let content = source.into_content()?;
        let cache =
            ResultCache::for_transformations(&config.cache, Arc::new(StoreRegistry::in_memory()));
        println!("key:      {}", cache.key(&cache_key(&transformer, &content, config)));
    }
    Ok(())
}

/// Print the effective config with API keys masked
pub fn show_config(config: &PrismConfig) -> anyhow::Result<()> {
    let mut shown = config.clone();
    for entry in shown.providers.providers.values_mut() {
        if let Some(key) = entry.api_key.as_mut() {
            *key = mask(key);
        }
    }
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}

fn mask(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 8 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(prompt: &str) -> TransformerArgs {
        TransformerArgs {
            prompt: prompt.to_string(),
            name: "cli".to_string(),
            system: None,
            provider: None,
            model: None,
            temperature: None,
            top_p: None,
            timeout: None,
            schema: None,
        }
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("Accept: text/plain").unwrap(),
            ("Accept".to_string(), "text/plain".to_string())
        );
        assert_eq!(
            parse_header("X-Time: 12:30").unwrap(),
            ("X-Time".to_string(), "12:30".to_string())
        );
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn test_flags_change_identity() {
        let plain = build_transformer(&args("Summarize")).unwrap();
        let mut warm = args("Summarize");
        warm.temperature = Some(0.8);
        let warm = build_transformer(&warm).unwrap();

        let config = PrismConfig::default();
        assert_ne!(cache_identity(&plain, &config), cache_identity(&warm, &config));
    }

    #[test]
    fn test_schema_file_sets_output_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentiment.json");
        std::fs::write(&path, r#"{"type":"object"}"#).unwrap();

        let mut with_schema = args("Classify");
        with_schema.schema = Some(path.clone());
        let transformer = build_transformer(&with_schema).unwrap();

        use prism_transformer::Transformer;
        let format = transformer.options().output_format.as_value().cloned().unwrap();
        assert_eq!(format.name, "sentiment");
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("short"), "****");
        assert_eq!(mask("sk-1234567890abcd"), "****abcd");
    }
}
