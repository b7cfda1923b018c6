#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use bundlewatch::config::{ConfigFile, EngineSettings, StartFlags};
use bundlewatch::engine::{CoreRuntime, Notification, Runtime, RuntimeEvent, RuntimeOptions};
use bundlewatch::errors::Result;
use bundlewatch::fs::mock::MockFileSystem;
use bundlewatch::project::ProjectLayout;
use bundlewatch::types::{ChangeKind, TargetKind};
use bundlewatch_test_utils::FakeBundler;
use bundlewatch_test_utils::builders::{ConfigFileBuilder, TargetConfigBuilder};

pub const ROOT: &str = "/proj";

pub fn path(rel: &str) -> PathBuf {
    Path::new(ROOT).join(rel)
}

/// `[app]` building `src/main.js`, optionally `[tests]` building the
/// aggregate `test/index.js`.
pub fn project_config(app: bool, tests: bool) -> ConfigFile {
    let mut app_cfg = TargetConfigBuilder::new().watch("src/**/*.js");
    if app {
        app_cfg = app_cfg.input("src/main.js").output("dist/app.js");
    }
    let mut builder = ConfigFileBuilder::new().with_app(app_cfg.build());
    if tests {
        builder = builder.with_tests(
            TargetConfigBuilder::new()
                .watch("test/**/*.spec.js")
                .input("test/index.js")
                .output("dist/tests.js")
                .build(),
        );
    }
    builder.build()
}

pub fn settings_for(cfg: &ConfigFile) -> EngineSettings {
    let root = Path::new(ROOT);
    EngineSettings::from_config(cfg, root, StartFlags::default(), ProjectLayout::defaults(root))
        .expect("valid settings")
}

pub struct Harness {
    pub tx: mpsc::Sender<RuntimeEvent>,
    pub notes: mpsc::UnboundedReceiver<Notification>,
    pub bundler: FakeBundler,
    pub fs: MockFileSystem,
    pub handle: JoinHandle<Result<CoreRuntime>>,
}

impl Harness {
    pub fn spawn(
        settings: EngineSettings,
        bundler: FakeBundler,
        fs: MockFileSystem,
        options: RuntimeOptions,
    ) -> Self {
        let bundler = bundler.with_fs(fs.clone());
        let (tx, rx) = mpsc::channel::<RuntimeEvent>(64);
        let (note_tx, notes) = mpsc::unbounded_channel();

        let shared = Arc::new(bundler.clone());
        let core = CoreRuntime::new(settings, shared.clone(), options);
        let runtime = Runtime::new(core, tx.clone(), rx, shared, Arc::new(fs.clone()))
            .with_notifications(note_tx);
        let handle = tokio::spawn(runtime.run());

        Self {
            tx,
            notes,
            bundler,
            fs,
            handle,
        }
    }

    pub async fn change(&self, rel: &str, kind: ChangeKind) {
        self.tx
            .send(RuntimeEvent::FileChanged {
                path: path(rel),
                kind,
            })
            .await
            .expect("runtime alive");
    }

    /// Wait for the next notification matching `pred`, collecting everything
    /// seen on the way (including the match).
    pub async fn wait_for<F>(&mut self, pred: F) -> Vec<Notification>
    where
        F: Fn(&Notification) -> bool,
    {
        let mut seen = Vec::new();
        let fut = async {
            while let Some(n) = self.notes.recv().await {
                let done = pred(&n);
                seen.push(n);
                if done {
                    return;
                }
            }
            panic!("notification channel closed");
        };
        tokio::time::timeout(Duration::from_secs(60), fut)
            .await
            .expect("expected notification did not arrive");
        seen
    }

    pub async fn wait_for_build(&mut self, target: TargetKind) -> Vec<Notification> {
        self.wait_for(move |n| matches!(n, Notification::Change { target: t, .. } if *t == target))
            .await
    }

    pub async fn shutdown(self) -> CoreRuntime {
        self.tx
            .send(RuntimeEvent::ShutdownRequested)
            .await
            .expect("runtime alive");
        self.handle
            .await
            .expect("runtime task panicked")
            .expect("runtime returned error")
    }
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}
