//! Build Configuration - Toolchain Paths and Make Arguments

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::codec::DEFAULT_LABEL;

#[cfg(windows)]
const DEFAULT_ASSEMBLER: &str = "../bin/ca65.exe";
#[cfg(windows)]
const DEFAULT_LINKER: &str = "../bin/ld65.exe";
#[cfg(not(windows))]
const DEFAULT_ASSEMBLER: &str = "../bin/ca65";
#[cfg(not(windows))]
const DEFAULT_LINKER: &str = "../bin/ld65";

pub const CLEAN_TARGET: &str = "clean";
pub const BUILD_TARGET: &str = "all";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the generated source goes and how make is driven.
///
/// Paths for the assembler, linker and output directory are relative to
/// `project_dir`, since make runs with `-C project_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfig {
    pub make_program: PathBuf,
    pub project_dir: PathBuf,
    pub output_dir: String,
    pub assembler: String,
    pub linker: String,
    pub artifact_path: PathBuf,
    pub platform: Option<String>,
    pub label: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            make_program: PathBuf::from("bin/make"),
            project_dir: PathBuf::from("neslides"),
            output_dir: "../output".to_string(),
            assembler: DEFAULT_ASSEMBLER.to_string(),
            linker: DEFAULT_LINKER.to_string(),
            artifact_path: PathBuf::from("neslides/src/slides.s"),
            platform: None,
            label: DEFAULT_LABEL.to_string(),
        }
    }
}

impl BuildConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults when `path` does not exist; a present but broken file is
    /// still an error.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no build config, using defaults");
            Ok(Self::default())
        }
    }

    /// `clean -C <project> OUT_DIR=<out> [PLATFORM=<p>]`
    pub fn clean_args(&self) -> Vec<String> {
        let mut args = self.target_args(CLEAN_TARGET);
        args.push(format!("OUT_DIR={}", self.output_dir));
        self.push_platform(&mut args);
        args
    }

    /// `all -C <project> CA65=<as> LD65=<ld> OUT_DIR=<out> [PLATFORM=<p>]`
    pub fn build_args(&self) -> Vec<String> {
        let mut args = self.target_args(BUILD_TARGET);
        args.push(format!("CA65={}", self.assembler));
        args.push(format!("LD65={}", self.linker));
        args.push(format!("OUT_DIR={}", self.output_dir));
        self.push_platform(&mut args);
        args
    }

    fn target_args(&self, target: &str) -> Vec<String> {
        vec![
            target.to_string(),
            "-C".to_string(),
            self.project_dir.display().to_string(),
        ]
    }

    fn push_platform(&self, args: &mut Vec<String>) {
        if let Some(platform) = &self.platform {
            args.push(format!("PLATFORM={}", platform));
        }
    }

    /// Output directory as seen from the working directory.
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.project_dir.join(&self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_args() {
        let config = BuildConfig::default();
        assert_eq!(
            config.clean_args(),
            vec!["clean", "-C", "neslides", "OUT_DIR=../output"]
        );
    }

    #[test]
    fn test_build_args_with_platform() {
        let config = BuildConfig {
            assembler: "as".into(),
            linker: "ld".into(),
            platform: Some("pal".into()),
            ..BuildConfig::default()
        };
        assert_eq!(
            config.build_args(),
            vec!["all", "-C", "neslides", "CA65=as", "LD65=ld", "OUT_DIR=../output", "PLATFORM=pal"]
        );
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.json");
        fs::write(&path, r#"{"outputDir": "../rom", "platform": "ntsc"}"#).unwrap();

        let config = BuildConfig::load(&path).unwrap();
        assert_eq!(config.output_dir, "../rom");
        assert_eq!(config.platform.as_deref(), Some("ntsc"));
        assert_eq!(config.make_program, PathBuf::from("bin/make"));
        assert_eq!(config.label, "slides");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig::load_or_default(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, BuildConfig::default());
    }

    #[test]
    fn test_broken_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.json");
        fs::write(&path, "{not json").unwrap();
        let err = BuildConfig::load_or_default(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
