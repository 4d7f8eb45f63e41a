use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do when the script file cannot be read at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadErrorPolicy {
    /// Swallow the error: no execution happens and the run is reported as
    /// skipped. This is the historical behavior.
    #[serde(rename = "ignore")]
    Ignore,
    /// Surface the error to the caller.
    #[serde(rename = "fail")]
    Fail,
}

impl Default for ReadErrorPolicy {
    fn default() -> Self {
        ReadErrorPolicy::Ignore
    }
}

/// Options that control how the runner builds its interpreter and treats
/// failures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerOptions {
    /// Grant the module-loading capability (default: false)
    #[serde(default)]
    pub modules: bool,

    /// Root directory for module resolution; the working directory when
    /// unset
    #[serde(default)]
    pub module_root: Option<String>,

    /// Policy for unreadable script files (default: ignore)
    #[serde(default)]
    pub read_errors: ReadErrorPolicy,

    /// Stdlib functions removed from the environment before any script
    /// runs, as `lib.function` names
    #[serde(default = "default_trim")]
    pub trim: Vec<String>,
}

fn default_trim() -> Vec<String> {
    vec!["os.execute".to_string(), "package.loadlib".to_string()]
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            modules: false,
            module_root: None,
            read_errors: ReadErrorPolicy::Ignore,
            trim: default_trim(),
        }
    }
}

/// Main runner configuration, loadable from `runlua.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerConfig {
    #[serde(default)]
    pub runner: RunnerOptions,
}

/// Per-field overrides collected from the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub modules: Option<bool>,
    pub module_root: Option<String>,
    pub read_errors: Option<ReadErrorPolicy>,
}

impl RunnerConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> crate::errors::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RunnerConfig = serde_json::from_str(&content)
            .map_err(|e| crate::errors::Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Merge command-line overrides into this configuration
    pub fn merge(&mut self, overrides: &CliOverrides) {
        if let Some(modules) = overrides.modules {
            self.runner.modules = modules;
        }
        if let Some(ref module_root) = overrides.module_root {
            self.runner.module_root = Some(module_root.clone());
        }
        if let Some(read_errors) = overrides.read_errors {
            self.runner.read_errors = read_errors;
        }
    }
}
