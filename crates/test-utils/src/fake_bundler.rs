use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bundlewatch::bundler::{BundleJob, Bundler, ModuleGraph};
use bundlewatch::fs::FileSystem;
use bundlewatch::fs::mock::MockFileSystem;

/// One recorded `bundle` call.
#[derive(Debug, Clone)]
pub struct RecordedBuild {
    pub job: BundleJob,
    /// Contents of the entry file at the moment the bundler ran.
    pub entry_contents: Option<String>,
}

/// A fake bundler that:
/// - records every job it is asked to bundle
/// - answers `invalidate` from a seeded set of known modules
/// - succeeds unless a failure was queued with [`FakeBundler::fail_next`]
/// - writes a stub bundle to the output path when given a filesystem
#[derive(Debug, Clone, Default)]
pub struct FakeBundler {
    builds: Arc<Mutex<Vec<RecordedBuild>>>,
    known: Arc<Mutex<HashSet<String>>>,
    know_all: bool,
    outcomes: Arc<Mutex<VecDeque<Result<(), String>>>>,
    delay: Option<Duration>,
    fs: Option<MockFileSystem>,
    resets: Arc<AtomicUsize>,
}

impl FakeBundler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat every module as part of the graph.
    pub fn knowing_everything(mut self) -> Self {
        self.know_all = true;
        self
    }

    pub fn with_known(self, modules: &[&str]) -> Self {
        self.known
            .lock()
            .unwrap()
            .extend(modules.iter().map(|m| m.to_string()));
        self
    }

    /// Each build takes this long (use with paused tokio time).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Write outputs to (and read entries from) `fs`.
    pub fn with_fs(mut self, fs: MockFileSystem) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Make the next build fail with `message`.
    pub fn fail_next(&self, message: &str) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn builds(&self) -> Vec<RecordedBuild> {
        self.builds.lock().unwrap().clone()
    }

    pub fn jobs(&self) -> Vec<BundleJob> {
        self.builds().into_iter().map(|b| b.job).collect()
    }

    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl ModuleGraph for FakeBundler {
    fn invalidate(&self, module: &str) -> Vec<String> {
        if self.know_all || self.known.lock().unwrap().contains(module) {
            vec![module.to_string()]
        } else {
            Vec::new()
        }
    }

    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

impl Bundler for FakeBundler {
    fn bundle(
        &self,
        job: BundleJob,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>> {
        let builds = Arc::clone(&self.builds);
        let outcomes = Arc::clone(&self.outcomes);
        let delay = self.delay;
        let fs = self.fs.clone();

        Box::pin(async move {
            let entry_contents = fs.as_ref().and_then(|fs| fs.contents(&job.entry));
            builds.lock().unwrap().push(RecordedBuild {
                job: job.clone(),
                entry_contents,
            });

            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let outcome = outcomes.lock().unwrap().pop_front().unwrap_or(Ok(()));
            match outcome {
                Ok(()) => {
                    if let Some(fs) = fs {
                        let stub = format!("// bundle of {}\n", job.entry.display());
                        fs.write(&job.output, stub.as_bytes())?;
                    }
                    Ok(())
                }
                Err(message) => Err(anyhow::anyhow!(message)),
            }
        })
    }
}
