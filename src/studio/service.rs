//! Studio service
//!
//! Composes the [`ProcessRunner`] and an [`ArtifactIndex`] into the
//! request-level operations behind the HTTP API. Validation failures
//! short-circuit before any process is launched or file touched.

use super::types::*;
use crate::artifacts::{now_millis, ArtifactIndex, ArtifactRecord, Seed};
use crate::config::QqlConfig;
use crate::error::{Error, Result};
use crate::process::{CommandResult, ProcessRunner, Termination};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const NO_SEED: &str = "No seed provided";
const GENERATION_FAILED: &str = "Generation failed";

/// Request-level operations over the CLI and the output directory
pub struct Studio {
    config: QqlConfig,
    runner: ProcessRunner,
    artifacts: Arc<dyn ArtifactIndex>,
    working_dir: PathBuf,
}

impl Studio {
    /// Create a studio from an already validated configuration
    pub fn new(config: QqlConfig, runner: ProcessRunner, artifacts: Arc<dyn ArtifactIndex>) -> Self {
        let working_dir = config
            .cli
            .working_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            config,
            runner,
            artifacts,
            working_dir,
        }
    }

    pub fn config(&self) -> &QqlConfig {
        &self.config
    }

    pub fn artifacts(&self) -> &Arc<dyn ArtifactIndex> {
        &self.artifacts
    }

    /// Check the CLI is present and report its version
    pub async fn status(&self) -> Result<StatusReport> {
        let cli = &self.config.cli.path;
        if !tokio::fs::try_exists(cli).await.unwrap_or(false) {
            tracing::warn!(cli = %cli.display(), "qql-cli executable missing");
            return Err(Error::ExecutableNotFound(cli.clone()));
        }

        let result = self
            .run(&["--version".to_string()], self.config.cli.status_timeout())
            .await;
        if !result.succeeded {
            tracing::warn!(exit_code = result.exit_code, "qql-cli version probe failed");
            return Err(failure(
                result,
                |stderr| format!("qql-cli execution failed: {stderr}"),
            ));
        }

        Ok(StatusReport {
            version: result.stdout,
            cli_path: cli.display().to_string(),
            output_dir: self.artifacts.output_dir().display().to_string(),
        })
    }

    /// Smoke-test the CLI by asking for its help text
    pub async fn test(&self) -> Result<TestReport> {
        let output = self.help_text().await?;
        Ok(TestReport { output })
    }

    /// CLI usage text
    pub async fn help(&self) -> Result<HelpReport> {
        let help = self.help_text().await?;
        Ok(HelpReport { help })
    }

    /// Render `request.seed` into a new artifact
    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerationReport> {
        let seed = Seed::parse(request.seed.as_deref().unwrap_or_default())?;
        let width = request.width.unwrap_or(self.config.cli.default_width);
        if width == 0 {
            return Err(Error::InvalidInput(
                "Width must be a positive integer".to_string(),
            ));
        }
        let traits = request
            .traits
            .unwrap_or_else(|| serde_json::Value::Object(Default::default()));

        let timestamp = now_millis();
        if let Err(e) = self.artifacts.ensure_directory().await {
            tracing::warn!(error = %e, "Failed to create output directory");
        }
        let output_path = self.artifacts.generation_path(&seed, timestamp);
        let filename = file_name_of(&output_path);

        let args = vec![
            seed.hex().to_string(),
            "--width".to_string(),
            width.to_string(),
            "-o".to_string(),
            output_path.display().to_string(),
        ];

        tracing::info!(
            seed = %seed,
            width = width,
            output = %filename,
            traits = %traits,
            "Generating artwork"
        );

        let result = self.run(&args, self.config.cli.generate_timeout()).await;
        if !result.succeeded {
            tracing::warn!(
                seed = %seed.short(),
                exit_code = result.exit_code,
                termination = ?result.termination,
                stderr = %result.stderr,
                "Generation failed"
            );
            return Err(failure(result, |stderr| {
                if stderr.is_empty() {
                    GENERATION_FAILED.to_string()
                } else {
                    stderr.to_string()
                }
            }));
        }

        tracing::info!(
            seed = %seed.short(),
            output = %filename,
            elapsed_ms = result.elapsed_ms,
            "Artwork generated"
        );

        Ok(GenerationReport {
            filename,
            seed: seed.to_string(),
            width,
            traits,
            duration: format_duration(result.elapsed_ms),
            logs: result.stdout,
        })
    }

    /// Copy the latest artifact of `request.seed` under a saved name
    pub async fn save(&self, request: SaveRequest) -> Result<SaveReport> {
        let raw = request
            .seed
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::InvalidInput(NO_SEED.to_string()))?;
        let seed = Seed::parse(&raw)?;

        let saved = self.artifacts.save_copy(&seed).await.map_err(|e| {
            tracing::warn!(seed = %seed.short(), error = %e, "Save failed");
            e
        })?;

        Ok(SaveReport {
            filename: saved.record.file_name,
            original_file: saved.original_file,
            seed: seed.to_string(),
        })
    }

    /// Resolve an image request to a file inside the output directory
    pub async fn image(&self, file_name: &str) -> Result<ArtifactRecord> {
        self.artifacts.resolve(file_name).await
    }

    /// Every artifact, newest first
    pub async fn list_outputs(&self) -> Result<OutputList> {
        let files = self.artifacts.list().await?;
        tracing::debug!(count = files.len(), "Listed outputs");
        Ok(OutputList { files })
    }

    async fn help_text(&self) -> Result<String> {
        let result = self
            .run(&["--help".to_string()], self.config.cli.status_timeout())
            .await;
        if result.succeeded {
            Ok(result.stdout)
        } else {
            tracing::warn!(exit_code = result.exit_code, "qql-cli help probe failed");
            Err(failure(result, str::to_string))
        }
    }

    async fn run(&self, args: &[String], timeout: Duration) -> CommandResult {
        self.runner
            .execute(&self.config.cli.path, args, &self.working_dir, timeout)
            .await
    }
}

/// Map an unsuccessful run onto the error taxonomy, keeping its output
fn failure(result: CommandResult, message: impl FnOnce(&str) -> String) -> Error {
    let message = message(&result.stderr);
    match result.termination {
        Termination::TimedOut => Error::Timeout {
            message,
            output: result.stdout,
        },
        _ => Error::ProcessFailure {
            message,
            output: result.stdout,
        },
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Seconds with two decimals, e.g. `"1.50s"`
fn format_duration(elapsed_ms: u64) -> String {
    format!("{:.2}s", elapsed_ms as f64 / 1000.0)
}
