//! Interpreter configuration

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What the driver does when a top-level form fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Stop at the first failing form
    #[default]
    Halt,
    /// Report the error and move on to the next form
    Continue,
}

/// Configuration for [`LispEvaluator`](crate::runtime::LispEvaluator)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Frames allocated between top-level forms before a collection runs (0: never)
    pub gc_threshold: usize,
    /// Behaviour of `run_source` on a failing top-level form
    pub error_mode: ErrorMode,
    /// Print each top-level result to the output sink
    pub echo_results: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            gc_threshold: 1024,
            error_mode: ErrorMode::Halt,
            echo_results: false,
        }
    }
}

impl InterpreterConfig {
    /// Settings used by the interactive prompt
    pub fn repl() -> Self {
        Self {
            error_mode: ErrorMode::Continue,
            echo_results: true,
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file
    pub fn load(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        Self::parse(&contents)
    }

    /// Parse configuration from a JSON string; missing fields keep their defaults
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::runtime(format!("Failed to parse config JSON: {}", e)))
    }
}
