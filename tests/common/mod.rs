//! Test doubles for the external collaborators of the add pipeline.

use boxhaul::{
    AddEnv, AddError, AddOptions, AuthHooks, BoxCollection, CatalogBox, CollectionError, Stage, Ui,
};
use boxhaul_fetch::DownloaderOptions;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct UiState {
    pub details: Vec<String>,
    pub warnings: Vec<String>,
    pub answers: VecDeque<String>,
}

/// A UI that records everything and answers prompts from a script.
#[derive(Clone, Default)]
pub struct TestUi {
    pub state: Arc<Mutex<UiState>>,
}

impl TestUi {
    pub fn push_answer(&self, answer: &str) {
        self.state.lock().unwrap().answers.push_back(answer.to_string());
    }

    pub fn details(&self) -> Vec<String> {
        self.state.lock().unwrap().details.clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.state.lock().unwrap().warnings.clone()
    }
}

impl Ui for TestUi {
    fn detail(&self, message: &str) {
        self.state.lock().unwrap().details.push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.state.lock().unwrap().warnings.push(message.to_string());
    }

    fn ask(&self, _prompt: &str) -> std::io::Result<String> {
        self.state
            .lock()
            .unwrap()
            .answers
            .pop_front()
            .ok_or_else(|| std::io::Error::other("no scripted answer left"))
    }
}

/// One recorded `BoxCollection::add` call, including the archive bytes as
/// they were at install time (the temp file is gone afterwards).
#[derive(Clone, Debug)]
pub struct AddCall {
    pub name: String,
    pub version: String,
    pub opts: AddOptions,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
pub struct CollectionState {
    pub installed: Vec<CatalogBox>,
    pub added: Vec<AddCall>,
}

/// An in-memory collection that records add calls and serves finds from
/// whatever was installed or preinstalled.
#[derive(Clone, Default)]
pub struct MemoryCollection {
    pub state: Arc<Mutex<CollectionState>>,
}

impl MemoryCollection {
    pub fn added(&self) -> Vec<AddCall> {
        self.state.lock().unwrap().added.clone()
    }
}

impl BoxCollection for MemoryCollection {
    fn find(
        &self,
        name: &str,
        providers: &[String],
        version: &str,
        architecture: Option<&str>,
    ) -> Result<Option<CatalogBox>, CollectionError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .installed
            .iter()
            .find(|b| {
                b.name == name
                    && b.version == version
                    && (providers.is_empty() || providers.iter().any(|p| *p == b.provider))
                    && architecture.map_or(true, |a| b.architecture.as_deref() == Some(a))
            })
            .cloned())
    }

    fn add(
        &mut self,
        path: &Path,
        name: &str,
        version: &str,
        opts: &AddOptions,
    ) -> Result<CatalogBox, CollectionError> {
        let bytes = std::fs::read(path)?;
        let added = CatalogBox {
            name: name.to_string(),
            version: version.to_string(),
            provider: opts
                .providers
                .first()
                .cloned()
                .unwrap_or_else(|| "unknown".to_string()),
            architecture: opts.architecture.clone(),
            metadata_url: opts.metadata_url.clone(),
            directory: PathBuf::from("/collection"),
        };
        let mut state = self.state.lock().unwrap();
        state.added.push(AddCall {
            name: name.to_string(),
            version: version.to_string(),
            opts: opts.clone(),
            bytes,
        });
        state.installed.push(added.clone());
        Ok(added)
    }
}

/// Hooks that count their invocations and optionally rewrite URLs by
/// substring replacement.
#[derive(Clone, Default)]
pub struct RecordingHooks {
    pub rewrite: Arc<Mutex<Option<(String, String)>>>,
    pub downloader_calls: Arc<AtomicUsize>,
    pub url_calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl RecordingHooks {
    pub fn set_rewrite(&self, from: &str, to: &str) {
        *self.rewrite.lock().unwrap() = Some((from.to_string(), to.to_string()));
    }

    pub fn url_call_count(&self) -> usize {
        self.url_calls.lock().unwrap().len()
    }

    pub fn downloader_call_count(&self) -> usize {
        self.downloader_calls.load(Ordering::SeqCst)
    }
}

impl AuthHooks for RecordingHooks {
    fn authenticate_downloader(&self, _options: &mut DownloaderOptions) {
        self.downloader_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn authenticate_urls(&self, urls: Vec<String>) -> Vec<String> {
        self.url_calls.lock().unwrap().push(urls.clone());
        match &*self.rewrite.lock().unwrap() {
            Some((from, to)) => urls.into_iter().map(|u| u.replace(from, to)).collect(),
            None => urls,
        }
    }
}

/// A downstream stage that only counts how often it ran.
#[derive(Clone, Default)]
pub struct RecordingStage {
    calls: Arc<AtomicUsize>,
}

impl RecordingStage {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Stage for RecordingStage {
    fn call(&self, _env: &mut AddEnv) -> Result<(), AddError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A fully wired environment over a fresh temp directory, with handles to
/// every double.
pub struct TestEnv {
    pub env: AddEnv,
    pub ui: TestUi,
    pub collection: MemoryCollection,
    pub hooks: RecordingHooks,
    pub tmp: tempfile::TempDir,
}

pub fn test_env() -> TestEnv {
    let tmp = tempfile::tempdir().unwrap();
    let ui = TestUi::default();
    let collection = MemoryCollection::default();
    let hooks = RecordingHooks::default();
    let mut env = AddEnv::new(
        tmp.path(),
        Box::new(ui.clone()),
        Box::new(collection.clone()),
        Box::new(hooks.clone()),
    );
    // Isolate from any VAGRANT_SERVER_URL in the test process environment.
    env.server_url = None;
    TestEnv {
        env,
        ui,
        collection,
        hooks,
        tmp,
    }
}

/// Write an archive fixture and return its path as a string URL input.
pub fn archive_fixture(dir: &Path, name: &str, contents: &[u8]) -> String {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}
