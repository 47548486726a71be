//! Rewrites a v1 project configuration document into the v2 shape.
//!
//! Rules run in a fixed order: later rules read the `extensions` key that an
//! earlier rule creates. Keys holding JSON `null` count as absent.

use serde_json::{Map, Value, json};
use std::collections::BTreeSet;
use std::path::Path;

pub const CONFIG_FILES: &[&str] = &["jsreport.config.json", "dev.config.json", "prod.config.json"];

pub const LEGACY_PDF_ENGINE: &str = "phantom-pdf";

const EXTENSION_SCOPED_KEYS: &[&str] = &["authentication", "scripts", "sample-template"];
const LOGGER_LEGACY_KEYS: &[&str] = &["silent", "logDirectory", "providerName"];

fn present<'a>(config: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    config.get(key).filter(|v| !v.is_null())
}

fn take(config: &mut Map<String, Value>, key: &str) -> Option<Value> {
    present(config, key)?;
    config.shift_remove(key)
}

/// Applies every v1 → v2 rewrite rule to `config`.
///
/// `keep_legacy_pdf_engine` keeps the `phantom` block and lets a top-level
/// `phantom-pdf` key move under `extensions`. `known_extensions` are the extension
/// names installed in the project.
pub fn transform(
    mut config: Map<String, Value>,
    keep_legacy_pdf_engine: bool,
    known_extensions: &BTreeSet<String>,
) -> Map<String, Value> {
    config.insert("renderingSource".into(), json!("untrusted"));

    if let Some(connection) = take(&mut config, "connectionString") {
        let mut store = Map::new();
        if let Some(name) = connection.get("name").filter(|v| !v.is_null()) {
            store.insert("provider".into(), name.clone());
        }
        config.insert("store".into(), Value::Object(store));
    }

    if let Some(Value::String(provider)) = present(&config, "blobStorage") {
        let provider = match provider.as_str() {
            "fileSystem" => "fs".to_string(),
            other => other.to_string(),
        };
        config.insert("blobStorage".into(), json!({ "provider": provider }));
    }

    if let Some(tasks) = take(&mut config, "tasks") {
        config.insert("templatingEngines".into(), tasks);
    }

    if present(&config, "phantom").is_some() && !keep_legacy_pdf_engine {
        config.shift_remove("phantom");
    }

    if let Some(list) = take(&mut config, "extensions") {
        config.insert("extensionsList".into(), list);
    }

    let mut extensions = Map::new();

    for key in EXTENSION_SCOPED_KEYS {
        if let Some(value) = take(&mut config, key) {
            extensions.insert((*key).to_string(), value);
        }
    }

    if let Some(logger) = present(&config, "logger") {
        let rebuilt = rebuild_logger(logger);
        config.insert("logger".into(), Value::Object(rebuilt));
    }

    for name in known_extensions {
        if !keep_legacy_pdf_engine && name == LEGACY_PDF_ENGINE {
            continue;
        }
        if let Some(value) = take(&mut config, name) {
            extensions.insert(name.clone(), value);
        }
    }

    config.insert("extensions".into(), Value::Object(extensions));
    config
}

fn rebuild_logger(logger: &Value) -> Map<String, Value> {
    let empty = Map::new();
    let legacy = logger.as_object().unwrap_or(&empty);
    let mut rebuilt = Map::new();

    if let Some(silent) = present(legacy, "silent") {
        rebuilt.insert("silent".into(), silent.clone());
    }

    let rest: Map<String, Value> = legacy
        .iter()
        .filter(|(k, _)| !LOGGER_LEGACY_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if rest.values().any(Value::is_object) {
        rebuilt.extend(rest);
        return rebuilt;
    }

    let log_directory = present(legacy, "logDirectory").and_then(Value::as_str);
    let file_transport = |basename: &str| {
        let mut transport = Map::new();
        transport.insert("transport".into(), json!("file"));
        transport.insert("level".into(), json!("debug"));
        if let Some(dir) = log_directory {
            let filename = Path::new(dir).join(basename);
            transport.insert("filename".into(), json!(filename.to_string_lossy()));
        }
        Value::Object(transport)
    };

    match present(legacy, "providerName").and_then(Value::as_str) {
        Some("winston") => {
            rebuilt.insert("console".into(), console_transport());
            rebuilt.insert("file".into(), file_transport("reporter.log"));
            rebuilt.insert("error".into(), file_transport("error.log"));
        }
        Some("console") => {
            rebuilt.insert("console".into(), console_transport());
        }
        _ => {}
    }

    rebuilt
}

fn console_transport() -> Value {
    json!({ "transport": "console", "level": "debug" })
}

/// Logger options from v1 that no longer exist in v2, as dotted paths.
pub fn legacy_logger_options(config: &Map<String, Value>) -> Vec<&'static str> {
    let Some(logger) = present(config, "logger").and_then(Value::as_object) else {
        return Vec::new();
    };
    let mut found = Vec::new();
    if present(logger, "providerName").is_some() {
        found.push("logger.providerName");
    }
    if present(logger, "logDirectory").is_some() {
        found.push("logger.logDirectory");
    }
    found
}
