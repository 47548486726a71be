use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::core::installer::PackageInstaller;
use crate::core::prompt::Prompter;
use crate::core::settings::Settings;
use crate::core::store::{Collection, Filter, Record, RecordStore, SqliteStore};
use crate::core::terminal::{Progress, Reporter};
use crate::steps::{MigrationOutcome, MigrationState, StepContext, run_pipeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Confirm(bool),
    Select(usize),
    Ack,
}

/// Replays answers in order and records every question asked.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<Answer>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[Answer]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.answers.lock().unwrap().len()
    }

    fn next(&self, message: &str) -> Result<Answer> {
        self.asked.lock().unwrap().push(message.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted answer for \"{}\"", message))
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, message: &str, _default: bool) -> Result<bool> {
        match self.next(message)? {
            Answer::Confirm(value) => Ok(value),
            other => bail!("expected a confirm answer for \"{}\", got {:?}", message, other),
        }
    }

    fn select(&self, message: &str, choices: &[&str], _default: usize) -> Result<usize> {
        match self.next(message)? {
            Answer::Select(index) if index < choices.len() => Ok(index),
            other => bail!("expected a select answer for \"{}\", got {:?}", message, other),
        }
    }

    fn acknowledge(&self, message: &str) -> Result<()> {
        match self.next(message)? {
            Answer::Ack => Ok(()),
            other => bail!("expected an acknowledge for \"{}\", got {:?}", message, other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Line(String),
    Info(String),
    Success(String),
    Warn(String),
    Fail(String),
}

#[derive(Default, Clone)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Warn(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Info(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    pub fn successes(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Success(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Reporter for RecordingReporter {
    fn line(&self, msg: &str) {
        self.push(Event::Line(msg.to_string()));
    }

    fn info(&self, msg: &str) {
        self.push(Event::Info(msg.to_string()));
    }

    fn success(&self, msg: &str) {
        self.push(Event::Success(msg.to_string()));
    }

    fn warn(&self, msg: &str) {
        self.push(Event::Warn(msg.to_string()));
    }

    fn fail(&self, msg: &str) {
        self.push(Event::Fail(msg.to_string()));
    }

    fn progress(&self, label: &str) -> Box<dyn Progress> {
        Box::new(RecordingProgress {
            reporter: self.clone(),
            label: Mutex::new(label.to_string()),
        })
    }
}

struct RecordingProgress {
    reporter: RecordingReporter,
    label: Mutex<String>,
}

impl Progress for RecordingProgress {
    fn append(&self, text: &str) {
        self.label.lock().unwrap().push_str(text);
    }

    fn relabel(&self, text: &str) {
        *self.label.lock().unwrap() = text.to_string();
    }

    fn stop(&self) {}

    fn succeed(&self, msg: &str) {
        self.reporter.success(msg);
    }

    fn warn(&self, msg: &str) {
        self.reporter.warn(msg);
    }

    fn fail(&self, msg: Option<&str>) {
        let label = self.label.lock().unwrap().clone();
        self.reporter.fail(msg.unwrap_or(&label));
    }
}

#[derive(Default)]
pub struct RecordingInstaller {
    calls: Mutex<Vec<Vec<String>>>,
    fail: bool,
}

impl RecordingInstaller {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PackageInstaller for RecordingInstaller {
    async fn install(&self, _project_dir: &Path, packages: &[String]) -> Result<()> {
        self.calls.lock().unwrap().push(packages.to_vec());
        if self.fail {
            bail!("install failed for {}", packages.join(" "));
        }
        Ok(())
    }
}

pub const SERVER_JS: &str = "const jsreport = require('jsreport')()\njsreport.init()\n";

/// A v1 project on disk with an embedded store.
pub struct Project {
    dir: tempfile::TempDir,
    pub settings: Settings,
}

impl Project {
    pub fn new(version: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules").join("jsreport");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(
            pkg.join("package.json"),
            json!({ "name": "jsreport", "version": version }).to_string(),
        )
        .unwrap();
        fs::write(dir.path().join("server.js"), SERVER_JS).unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();

        Self {
            dir,
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store_path(&self) -> PathBuf {
        self.path().join(&self.settings.store_path)
    }

    pub fn store(&self) -> SqliteStore {
        SqliteStore::open(self.store_path(), false).unwrap()
    }

    /// Registers the given collections so the matching extensions count as used.
    pub async fn with_collections(self, names: &[&str]) -> Self {
        let store = self.store();
        for name in names {
            store.register_collection(name).await.unwrap();
        }
        self
    }

    pub async fn seed(&self, collection: &str, record: Value) -> String {
        let store = self.store();
        let Value::Object(record) = record else {
            panic!("seed records must be objects");
        };
        store.insert(collection, record).await.unwrap()
    }

    pub async fn records(&self, collection: &str) -> Vec<Record> {
        let store = self.store();
        Collection::new(&store, collection)
            .find(&Filter::all())
            .await
            .unwrap()
    }

    pub fn write_file(&self, name: &str, content: &str) {
        fs::write(self.path().join(name), content).unwrap();
    }

    pub fn read_json(&self, name: &str) -> Value {
        serde_json::from_str(&fs::read_to_string(self.path().join(name)).unwrap()).unwrap()
    }

    pub fn add_extension(&self, folder: &str, manifest: &str) {
        let dir = self.path().join("node_modules").join(folder);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("jsreport.config.js"), manifest).unwrap();
    }
}

/// Everything observable after one pipeline run.
pub struct Run {
    pub result: Result<MigrationOutcome>,
    pub state: MigrationState,
    pub prompter: ScriptedPrompter,
    pub reporter: RecordingReporter,
    pub installer: RecordingInstaller,
}

pub async fn run(project: &Project, answers: &[Answer]) -> Run {
    run_with(project, answers, RecordingInstaller::default()).await
}

pub async fn run_with(project: &Project, answers: &[Answer], installer: RecordingInstaller) -> Run {
    let prompter = ScriptedPrompter::new(answers);
    let reporter = RecordingReporter::default();
    let state = MigrationState::default();

    let ctx = StepContext {
        project_dir: project.path(),
        settings: &project.settings,
        prompter: &prompter,
        reporter: &reporter,
    };
    let result = run_pipeline(ctx, &installer, &state).await;

    Run {
        result,
        state,
        prompter,
        reporter,
        installer,
    }
}
