// src/bundler/command.rs

//! Bundler backed by an external command (e.g. `jspm bundle`).

use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result, bail};
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::bundler::{BundleJob, Bundler, ModuleGraph};
use crate::config::BundlerSection;

/// Number of stderr lines kept for the failure message.
const STDERR_TAIL_LINES: usize = 20;

/// Runs `[bundler].cmd` through the platform shell once per build.
///
/// `{entry}` and `{output}` in the command are replaced with the job's paths;
/// everything else is passed as `BUNDLEWATCH_*` environment variables.
///
/// The module graph is whatever the command reports on stdout through the
/// `trace_on_stdout` regex (first capture group = module name). Without a
/// trace pattern there is nothing to consult, so every module counts as known.
#[derive(Debug, Clone)]
pub struct CommandBundler {
    cmd: String,
    cwd: PathBuf,
    trace: Option<Regex>,
    graph: Arc<Mutex<HashSet<String>>>,
}

impl CommandBundler {
    pub fn new(section: &BundlerSection, cwd: impl Into<PathBuf>) -> Result<Self> {
        let trace = section
            .trace_on_stdout
            .as_deref()
            .map(Regex::new)
            .transpose()
            .context("compiling [bundler].trace_on_stdout")?;

        Ok(Self {
            cmd: section.cmd.clone(),
            cwd: cwd.into(),
            trace,
            graph: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    fn graph(&self) -> MutexGuard<'_, HashSet<String>> {
        self.graph.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Substitute `{entry}` / `{output}` placeholders.
    pub fn render_command(&self, job: &BundleJob) -> String {
        self.cmd
            .replace("{entry}", &job.entry.to_string_lossy())
            .replace("{output}", &job.output.to_string_lossy())
    }
}

impl ModuleGraph for CommandBundler {
    fn invalidate(&self, module: &str) -> Vec<String> {
        if self.trace.is_none() {
            return vec![module.to_string()];
        }
        if self.graph().remove(module) {
            vec![module.to_string()]
        } else {
            Vec::new()
        }
    }

    fn reset(&self) {
        self.graph().clear();
    }
}

impl Bundler for CommandBundler {
    fn bundle(
        &self,
        job: BundleJob,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>> {
        let command_line = self.render_command(&job);
        let cwd = self.cwd.clone();
        let trace = self.trace.clone();
        let graph = Arc::clone(&self.graph);

        Box::pin(async move { run_bundle_command(command_line, cwd, job, trace, graph).await })
    }
}

async fn run_bundle_command(
    command_line: String,
    cwd: PathBuf,
    job: BundleJob,
    trace: Option<Regex>,
    graph: Arc<Mutex<HashSet<String>>>,
) -> Result<()> {
    info!(target_kind = %job.target, cmd = %command_line, "starting bundler");

    let mut cmd = shell_command(&command_line, &cwd);
    apply_job_env(&mut cmd, &job);
    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning bundler for {}", job.target))?;

    let stdout_task = child.stdout.take().map(|stdout| {
        let target = job.target;
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(target_kind = %target, "bundler stdout: {}", line);
                if let Some(re) = &trace {
                    if let Some(module) = re.captures(&line).and_then(|c| c.get(1)) {
                        graph
                            .lock()
                            .unwrap_or_else(|p| p.into_inner())
                            .insert(module.as_str().to_string());
                    }
                }
            }
        })
    });

    let stderr_task = child.stderr.take().map(|stderr| {
        tokio::spawn(async move {
            let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("bundler stderr: {}", line);
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            tail.into_iter().collect::<Vec<_>>().join("\n")
        })
    });

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for bundler of {}", job.target))?;

    if let Some(task) = stdout_task {
        if let Err(e) = task.await {
            warn!(error = %e, "bundler stdout reader failed");
        }
    }
    let stderr_tail = match stderr_task {
        Some(task) => task.await.unwrap_or_default(),
        None => String::new(),
    };

    if !status.success() {
        let code = status.code().unwrap_or(-1);
        if stderr_tail.is_empty() {
            bail!("bundler exited with code {code}");
        }
        bail!("bundler exited with code {code}:\n{stderr_tail}");
    }

    Ok(())
}

fn shell_command(command_line: &str, cwd: &Path) -> Command {
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command_line);
        c
    };
    cmd.current_dir(cwd);
    cmd
}

fn apply_job_env(cmd: &mut Command, job: &BundleJob) {
    let flag = |b: bool| if b { "true" } else { "false" };
    let changed: Vec<&str> = job.changes.iter().map(|m| m.name.as_str()).collect();

    cmd.env("BUNDLEWATCH_TARGET", job.target.as_str())
        .env("BUNDLEWATCH_ENTRY", &job.entry)
        .env("BUNDLEWATCH_OUTPUT", &job.output)
        .env("BUNDLEWATCH_FULL_REBUILD", flag(job.full_rebuild))
        .env("BUNDLEWATCH_CHANGED_MODULES", changed.join("\n"))
        .env("BUNDLEWATCH_MINIFY", flag(job.options.minify))
        .env("BUNDLEWATCH_MANGLE", flag(job.options.mangle))
        .env("BUNDLEWATCH_SOURCE_MAPS", flag(job.options.source_maps))
        .env(
            "BUNDLEWATCH_LOW_RES_SOURCE_MAPS",
            flag(job.options.low_res_source_maps),
        )
        .env("BUNDLEWATCH_FORCE_NON_SFX", flag(job.options.force_non_sfx));
}
