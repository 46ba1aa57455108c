use anyhow::Context;
use clap::Parser;
use layered_props::config::cli::{OutputFormat, ValueType};
use layered_props::utils::error::ErrorSeverity;
use layered_props::utils::{logger, validation::Validate};
use layered_props::{CliConfig, ConfigProvider, PropertyValue, PropsError, ResolvedConfig};
use std::path::PathBuf;
use url::Url;

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    match config.format {
        OutputFormat::Json => logger::init_json_logger(),
        OutputFormat::Text => logger::init_cli_logger(config.verbose),
    }

    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let loader = config.to_loader().context("Failed to prepare property sources")?;

    let resolution = match loader.load_each() {
        Ok(resolution) => resolution,
        Err(e) => fail(&e),
    };

    match &config.get {
        Some(key) => {
            // Only the requested key has to resolve.
            if let Some(source) = resolution.failures.get(key) {
                fail(&PropsError::Resolve {
                    key: key.clone(),
                    source: source.clone(),
                });
            }
            let props = ResolvedConfig::new(resolution.resolved);
            match lookup(&props, key, config.value_type) {
                Ok(value) => print_value(key, &value, config.format)?,
                Err(e) => fail(&e),
            }
        }
        None => {
            match config.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&resolution.resolved)?)
                }
                OutputFormat::Text => {
                    for (key, value) in &resolution.resolved {
                        println!("{}={}", key, value);
                    }
                }
            }

            if !resolution.is_complete() {
                for (key, error) in &resolution.failures {
                    eprintln!("❌ {}: {}", key, error);
                }
                std::process::exit(2);
            }
        }
    }

    Ok(())
}

fn lookup(
    props: &ResolvedConfig,
    key: &str,
    value_type: ValueType,
) -> layered_props::Result<PropertyValue> {
    Ok(match value_type {
        ValueType::String => PropertyValue::String(props.get::<String>(key)?),
        ValueType::Bool => PropertyValue::Bool(props.get::<bool>(key)?),
        ValueType::Int => PropertyValue::Integer(props.get::<i64>(key)?),
        ValueType::Float => PropertyValue::Float(props.get::<f64>(key)?),
        ValueType::Char => PropertyValue::String(props.get::<char>(key)?.to_string()),
        ValueType::Url => PropertyValue::String(props.get::<Url>(key)?.to_string()),
        ValueType::Path => {
            PropertyValue::String(props.get::<PathBuf>(key)?.display().to_string())
        }
    })
}

fn print_value(key: &str, value: &PropertyValue, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let mut object = serde_json::Map::new();
            object.insert(key.to_string(), serde_json::to_value(value)?);
            println!("{}", serde_json::Value::Object(object));
        }
        OutputFormat::Text => println!("{}", value),
    }
    Ok(())
}

fn fail(e: &PropsError) -> ! {
    tracing::error!(
        "{} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e);
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 3,
        ErrorSeverity::Medium => 4,
        ErrorSeverity::High => 2,
        ErrorSeverity::Critical => 1,
    };
    std::process::exit(exit_code);
}
