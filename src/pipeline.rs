//! Build Pipeline - Single Entry Point for Export
//!
//! Idle -> Writing -> Cleaning -> Building -> Succeeded | Failed.
//!
//! The first failing stage ends the run. Nothing carries over between runs:
//! the artifact is rewritten from scratch and the output directory is
//! expected to be overwritable.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::codec;
use crate::config::BuildConfig;
use crate::hashing::sha256_hex;
use crate::slides::Deck;
use crate::toolchain::{Invocation, SystemRunner, ToolError, ToolRunner};

/// Which stage a failed run stopped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    WriteError,
    CleanError,
    BuildError,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureReason::WriteError => "WriteError",
            FailureReason::CleanError => "CleanError",
            FailureReason::BuildError => "BuildError",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "reason", rename_all = "snake_case")]
pub enum BuildStage {
    Idle,
    Writing,
    Cleaning,
    Building,
    Succeeded,
    Failed(FailureReason),
}

impl BuildStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildStage::Succeeded | BuildStage::Failed(_))
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Cannot write artifact {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Tool(#[from] ToolError),
}

#[derive(Debug, Error)]
#[error("Export {run_id} failed ({reason}): {source}")]
pub struct BuildFailure {
    pub run_id: Uuid,
    pub reason: FailureReason,
    #[source]
    pub source: PipelineError,
}

impl BuildFailure {
    pub fn reason(&self) -> FailureReason {
        self.reason
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactInfo {
    pub path: PathBuf,
    pub bytes: usize,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub slide_count: usize,
    pub artifact: ArtifactInfo,
    pub invocations: Vec<Invocation>,
    /// Where the toolchain is expected to have put the ROM.
    pub output_dir: PathBuf,
}

/// The export pipeline. One run at a time, each run blocking until done.
pub struct BuildPipeline<R: ToolRunner = SystemRunner> {
    config: BuildConfig,
    runner: R,
    stage: BuildStage,
}

impl BuildPipeline<SystemRunner> {
    pub fn new(config: BuildConfig) -> Self {
        Self::with_runner(config, SystemRunner)
    }
}

impl<R: ToolRunner> BuildPipeline<R> {
    pub fn with_runner(config: BuildConfig, runner: R) -> Self {
        Self {
            config,
            runner,
            stage: BuildStage::Idle,
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Stage of the current or most recent run.
    pub fn stage(&self) -> BuildStage {
        self.stage
    }

    pub fn clean_invocation(&self) -> Invocation {
        Invocation::new(&self.config.make_program, self.config.clean_args())
    }

    pub fn build_invocation(&self) -> Invocation {
        Invocation::new(&self.config.make_program, self.config.build_args())
    }

    /// Encode the deck, write it, then run clean and build.
    pub fn run(&mut self, deck: &Deck) -> Result<BuildReport, BuildFailure> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("export", %run_id);
        let _guard = span.enter();

        let started_at = Utc::now();
        let result = self.run_stages(deck);
        let (artifact, invocations) = match result {
            Ok(done) => done,
            Err((reason, source)) => {
                self.stage = BuildStage::Failed(reason);
                tracing::error!(%reason, error = %source, "export failed");
                return Err(BuildFailure {
                    run_id,
                    reason,
                    source,
                });
            }
        };

        self.enter(BuildStage::Succeeded);
        Ok(BuildReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            slide_count: deck.len(),
            artifact,
            invocations,
            output_dir: self.config.resolved_output_dir(),
        })
    }

    /// Run and report through exactly one of the two callbacks.
    /// Returns whether the run succeeded.
    pub fn export_with<S, E>(&mut self, deck: &Deck, on_success: S, on_error: E) -> bool
    where
        S: FnOnce(&BuildReport),
        E: FnOnce(&BuildFailure),
    {
        match self.run(deck) {
            Ok(report) => {
                on_success(&report);
                true
            }
            Err(failure) => {
                on_error(&failure);
                false
            }
        }
    }

    fn run_stages(
        &mut self,
        deck: &Deck,
    ) -> Result<(ArtifactInfo, Vec<Invocation>), (FailureReason, PipelineError)> {
        self.enter(BuildStage::Writing);
        let artifact = self
            .write_artifact(deck)
            .map_err(|e| (FailureReason::WriteError, e))?;

        self.enter(BuildStage::Cleaning);
        let clean = self.clean_invocation();
        self.runner
            .run(&clean)
            .map_err(|e| (FailureReason::CleanError, e.into()))?;

        self.enter(BuildStage::Building);
        let build = self.build_invocation();
        self.runner
            .run(&build)
            .map_err(|e| (FailureReason::BuildError, e.into()))?;

        Ok((artifact, vec![clean, build]))
    }

    fn write_artifact(&self, deck: &Deck) -> Result<ArtifactInfo, PipelineError> {
        let text = codec::encode_labeled(deck, &self.config.label);
        let path = self.config.artifact_path.clone();
        fs::write(&path, text.as_bytes()).map_err(|source| PipelineError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = text.len(), "artifact written");
        Ok(ArtifactInfo {
            path,
            bytes: text.len(),
            sha256: sha256_hex(text.as_bytes()),
        })
    }

    fn enter(&mut self, stage: BuildStage) {
        tracing::info!(?stage, "export stage");
        self.stage = stage;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slides::Slide;

    /// Records invocations and fails the n-th one (zero-based) if asked.
    #[derive(Default)]
    struct ScriptedRunner {
        calls: Vec<Invocation>,
        fail_at: Option<usize>,
    }

    impl ToolRunner for ScriptedRunner {
        fn run(&mut self, invocation: &Invocation) -> Result<(), ToolError> {
            let index = self.calls.len();
            self.calls.push(invocation.clone());
            if self.fail_at == Some(index) {
                return Err(ToolError::Exit {
                    program: invocation.display_program(),
                    code: Some(2),
                });
            }
            Ok(())
        }
    }

    fn config_in(dir: &std::path::Path) -> BuildConfig {
        BuildConfig {
            artifact_path: dir.join("slides.s"),
            ..BuildConfig::default()
        }
    }

    fn deck() -> Deck {
        Deck::from_slides(vec![Slide::from("hi"), Slide::from("bye")])
    }

    #[test]
    fn test_success_runs_clean_then_build() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline =
            BuildPipeline::with_runner(config_in(dir.path()), ScriptedRunner::default());

        let report = pipeline.run(&deck()).unwrap();

        assert_eq!(pipeline.stage(), BuildStage::Succeeded);
        let calls = &pipeline.runner().calls;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args[0], "clean");
        assert_eq!(calls[1].args[0], "all");
        assert_eq!(report.invocations, *calls);
        assert_eq!(report.slide_count, 2);

        let written = fs::read_to_string(dir.path().join("slides.s")).unwrap();
        assert_eq!(written, codec::encode(&deck()));
        assert_eq!(report.artifact.sha256, sha256_hex(written.as_bytes()));
    }

    #[test]
    fn test_clean_failure_skips_build() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner { fail_at: Some(0), ..Default::default() };
        let mut pipeline = BuildPipeline::with_runner(config_in(dir.path()), runner);

        let failure = pipeline.run(&deck()).unwrap_err();

        assert_eq!(failure.reason(), FailureReason::CleanError);
        assert_eq!(pipeline.stage(), BuildStage::Failed(FailureReason::CleanError));
        assert_eq!(pipeline.runner().calls.len(), 1);
    }

    #[test]
    fn test_build_failure() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner { fail_at: Some(1), ..Default::default() };
        let mut pipeline = BuildPipeline::with_runner(config_in(dir.path()), runner);

        let failure = pipeline.run(&deck()).unwrap_err();
        assert_eq!(failure.reason(), FailureReason::BuildError);
        assert!(matches!(failure.source, PipelineError::Tool(ToolError::Exit { .. })));
    }

    #[test]
    fn test_write_failure_skips_tools() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig {
            artifact_path: dir.path().join("missing").join("slides.s"),
            ..BuildConfig::default()
        };
        let mut pipeline = BuildPipeline::with_runner(config, ScriptedRunner::default());

        let failure = pipeline.run(&deck()).unwrap_err();
        assert_eq!(failure.reason(), FailureReason::WriteError);
        assert!(pipeline.runner().calls.is_empty());
    }

    #[test]
    fn test_artifact_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slides.s");
        fs::write(&path, "stale content that is much longer than the new artifact").unwrap();
        let mut pipeline =
            BuildPipeline::with_runner(config_in(dir.path()), ScriptedRunner::default());

        pipeline.run(&Deck::new()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), codec::encode(&Deck::new()));
    }

    #[test]
    fn test_export_with_calls_one_callback() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner { fail_at: Some(1), ..Default::default() };
        let mut pipeline = BuildPipeline::with_runner(config_in(dir.path()), runner);

        let mut succeeded = false;
        let mut failed_with = None;
        let ok = pipeline.export_with(
            &deck(),
            |_| succeeded = true,
            |failure| failed_with = Some(failure.reason()),
        );

        assert!(!ok);
        assert!(!succeeded);
        assert_eq!(failed_with, Some(FailureReason::BuildError));
    }

    #[test]
    fn test_stage_resets_each_run() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner { fail_at: Some(0), ..Default::default() };
        let mut pipeline = BuildPipeline::with_runner(config_in(dir.path()), runner);

        assert!(pipeline.run(&deck()).is_err());
        // fail_at only matches the first call overall, so the second run passes
        assert!(pipeline.run(&deck()).is_ok());
        assert_eq!(pipeline.stage(), BuildStage::Succeeded);
        assert!(pipeline.stage().is_terminal());
    }
}
