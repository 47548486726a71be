//! The v1 project being migrated: installation checks and the initialized instance.

use anyhow::{Context, Result};
use regex::Regex;
use semver::{Version, VersionReq};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::core::store::{Collection, RecordStore, SqliteStore};

const ENTRY_POINT: &str = "server.js";
const PACKAGE_NAME: &str = "jsreport";
const EXTENSION_PREFIX: &str = "jsreport-";
const EXTENSION_MANIFEST: &str = "jsreport.config.js";

static REQUIRES_PACKAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"require\(\s*['"]jsreport['"]\s*\)"#).expect("require pattern is valid")
});

static MANIFEST_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"name\s*:\s*['"]([^'"]+)['"]"#).expect("manifest name pattern is valid")
});

#[derive(Debug, thiserror::Error)]
pub enum PreconditionError {
    #[error(
        "jsreport not found installed in project. are you sure that you are running the migration in a jsreport project directory? if yes, make sure to run \"npm install\" first."
    )]
    NotInstalled,
    #[error(
        "jsreport entry file \"server.js\" not found. are you sure that you are running the migration in a project created by \"jsreport init\"?"
    )]
    MissingEntryPoint,
    #[error(
        "jsreport entry file \"server.js\" does not create a jsreport instance. are you sure that you are running the migration in a project created by \"jsreport init\"?"
    )]
    NotAnInstance,
    #[error(
        "jsreport version found in project ({found}) does not match the latest jsreport v1 version ({required}). update your project and check it works with the latest v1 first, for example with \"npm install jsreport@{required} --save\"."
    )]
    VersionMismatch { found: String, required: String },
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    version: String,
}

/// A verified v1 installation on disk.
#[derive(Debug, Clone)]
pub struct Installation {
    pub root: PathBuf,
    pub version: Version,
}

impl Installation {
    /// Verifies the project at `root` runs a jsreport version matching `required`.
    pub async fn check(root: &Path, required: &str) -> Result<Self> {
        let manifest_path = root
            .join("node_modules")
            .join(PACKAGE_NAME)
            .join("package.json");
        let manifest = match tokio::fs::read_to_string(&manifest_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PreconditionError::NotInstalled.into());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read {}", manifest_path.display()));
            }
        };
        let manifest: PackageManifest = serde_json::from_str(&manifest)
            .with_context(|| format!("Invalid package manifest {}", manifest_path.display()))?;

        let entry_path = root.join(ENTRY_POINT);
        let entry = match tokio::fs::read_to_string(&entry_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PreconditionError::MissingEntryPoint.into());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", entry_path.display()));
            }
        };
        if !REQUIRES_PACKAGE.is_match(&entry) {
            return Err(PreconditionError::NotAnInstance.into());
        }

        let requirement = VersionReq::parse(required)
            .with_context(|| format!("Invalid required version range \"{}\"", required))?;
        let version_mismatch = || PreconditionError::VersionMismatch {
            found: manifest.version.clone(),
            required: required.to_string(),
        };
        let version = Version::parse(&manifest.version).map_err(|_| version_mismatch())?;
        if !requirement.matches(&version) {
            return Err(version_mismatch().into());
        }

        info!(version = %version, root = %root.display(), "installation verified");
        Ok(Self {
            root: root.to_path_buf(),
            version,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LoggerOptions {
    pub silent: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulingOptions {
    pub auto_start: bool,
}

/// Options fixed once before the instance is initialized.
#[derive(Debug, Clone, Copy)]
pub struct InstanceOptions {
    pub logger: LoggerOptions,
    pub scheduling: SchedulingOptions,
}

impl InstanceOptions {
    /// Quiet instance with schedules kept from firing while records are rewritten.
    pub fn for_migration() -> Self {
        Self {
            logger: LoggerOptions { silent: true },
            scheduling: SchedulingOptions { auto_start: false },
        }
    }
}

/// Collections present in the store, checked once at initialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    collections: BTreeSet<String>,
}

impl Capabilities {
    pub fn from_names<I: IntoIterator<Item = String>>(names: I) -> Self {
        Self {
            collections: names.into_iter().collect(),
        }
    }

    pub fn has(&self, collection: &str) -> bool {
        self.collections.contains(collection)
    }
}

/// An initialized project: document store, capabilities and installed extensions.
pub struct Instance {
    store: Box<dyn RecordStore>,
    capabilities: Capabilities,
    extensions: BTreeSet<String>,
    options: InstanceOptions,
}

impl Instance {
    pub async fn initialize(
        installation: &Installation,
        store_path: &Path,
        options: InstanceOptions,
    ) -> Result<Self> {
        if options.scheduling.auto_start {
            warn!("scheduler auto start is ignored while migrating");
        }

        let path = installation.root.join(store_path);
        if !path.exists() {
            anyhow::bail!("document store not found at {}", path.display());
        }
        let store = SqliteStore::open(&path, !options.logger.silent)
            .with_context(|| format!("Failed to open document store {}", path.display()))?;
        let extensions = discover_extensions(&installation.root).await?;

        Self::with_store(Box::new(store), extensions, options).await
    }

    pub async fn with_store(
        store: Box<dyn RecordStore>,
        extensions: BTreeSet<String>,
        options: InstanceOptions,
    ) -> Result<Self> {
        let capabilities = Capabilities::from_names(store.collections().await?);
        debug!(?capabilities, ?extensions, "instance initialized");
        Ok(Self {
            store,
            capabilities,
            extensions,
            options,
        })
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }

    pub fn options(&self) -> InstanceOptions {
        self.options
    }

    /// Handle on `name`, or `None` when the owning extension is not used.
    pub fn collection<'a>(&'a self, name: &'a str) -> Option<Collection<'a>> {
        self.capabilities
            .has(name)
            .then(|| Collection::new(self.store.as_ref(), name))
    }
}

/// Extension names from `node_modules/jsreport-*` packages carrying a manifest.
pub async fn discover_extensions(root: &Path) -> Result<BTreeSet<String>> {
    let modules = root.join("node_modules");
    let mut names = BTreeSet::new();
    if !modules.exists() {
        return Ok(names);
    }

    let mut entries = tokio::fs::read_dir(&modules).await?;
    while let Some(entry) = entries.next_entry().await? {
        let dir_name = entry.file_name().to_string_lossy().to_string();
        let Some(suffix) = dir_name.strip_prefix(EXTENSION_PREFIX) else {
            continue;
        };
        let manifest_path = entry.path().join(EXTENSION_MANIFEST);
        let Ok(manifest) = tokio::fs::read_to_string(&manifest_path).await else {
            continue;
        };
        let name = MANIFEST_NAME
            .captures(&manifest)
            .map(|caps| caps[1].to_string())
            .unwrap_or_else(|| suffix.to_string());
        names.insert(name);
    }
    Ok(names)
}
