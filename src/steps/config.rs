use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

use super::StepContext;
use crate::core::batch::run_batch;
use crate::core::config::{self, CONFIG_FILES};
use crate::core::instance::Instance;
use crate::core::prompt::PRESS_ENTER;
use crate::core::terminal::quoted_list;

async fn existing_config_files(project_dir: &Path) -> Vec<&'static str> {
    let mut found = Vec::new();
    for file in CONFIG_FILES {
        if tokio::fs::try_exists(project_dir.join(file))
            .await
            .unwrap_or(false)
        {
            found.push(*file);
        }
    }
    found
}

/// Rewrites one file in place. Returns the legacy logger options it carried.
async fn migrate_file(
    path: &Path,
    keep_phantom: bool,
    extensions: &BTreeSet<String>,
) -> Result<Vec<&'static str>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let parsed: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let Value::Object(document) = parsed else {
        bail!("{} does not contain a JSON object", path.display());
    };

    let legacy = config::legacy_logger_options(&document);
    let migrated: Map<String, Value> = config::transform(document, keep_phantom, extensions);

    let pretty = serde_json::to_string_pretty(&Value::Object(migrated))?;
    tokio::fs::write(path, pretty)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    debug!(path = %path.display(), "configuration rewritten");
    Ok(legacy)
}

pub async fn migrate_config(
    ctx: StepContext<'_>,
    instance: &Instance,
    keep_phantom: bool,
) -> Result<()> {
    ctx.reporter.info("checking configuration file in project");

    let files = existing_config_files(ctx.project_dir).await;
    if files.is_empty() {
        ctx.reporter.success("no configuration file found to migrate");
        return Ok(());
    }

    ctx.reporter.line(&format!(
        "you have {} configuration files(s) in project ({}).",
        files.len(),
        quoted_list(&files)
    ));

    let proceed = ctx.prompter.confirm(
        "should we check the config file(s) and continue with migration?",
        true,
    )?;

    if !proceed {
        ctx.reporter.warn(&format!(
            "user decided to not migrate configuration file(s). \
             you will need to check your configuration file(s) ({}) and update manually, \
             check https://jsreport.net/learn/configuration for information about the new configuration format",
            quoted_list(&files)
        ));
        return Ok(());
    }

    let progress = ctx.reporter.progress("migrating configuration file");
    let extensions = instance.extensions();
    let mut results = run_batch(&files, ctx.settings.batch_fanout, |file| {
        let path = ctx.project_dir.join(file);
        async move {
            let legacy = migrate_file(&path, keep_phantom, extensions).await?;
            Ok::<_, anyhow::Error>((*file, legacy))
        }
    })
    .await
    .inspect_err(|_| progress.fail(None))?;

    info!(files = ?files, "configuration migrated");
    progress.succeed("configuration file migration completed");

    ctx.reporter.warn(
        "After migration is done please remember to compare your previous configuration file with the new \
         generated one to ensure that all values in your original file were migrated correctly, check the docs \
         at https://jsreport.net/learn/configuration to verify the new configuration format",
    );

    results.sort_by_key(|(file, _)| CONFIG_FILES.iter().position(|f| f == file));
    for (file, legacy) in results.iter().filter(|(_, legacy)| !legacy.is_empty()) {
        ctx.reporter.warn(&format!(
            "\"{}\" uses some logging option(s) that are not supported in v2: {}. \
             you will need to update your logging configuration manually, \
             check https://jsreport.net/learn/configuration#logging-configuration \
             for details about the new logging configuration format.",
            file,
            quoted_list(legacy)
        ));
    }

    ctx.prompter.acknowledge(PRESS_ENTER)
}
