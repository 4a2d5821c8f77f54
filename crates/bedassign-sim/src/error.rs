//! Error types for the scenario runner.
//!
//! [`ScenarioError`] covers loading and building a scenario file;
//! [`SimError`] is what `main` propagates.

use bedassign_engine::{ColonyError, SettingsError};

/// Failure to load or build a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The scenario file could not be read.
    #[error("failed to read scenario: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The scenario file is not valid YAML for a scenario.
    #[error("failed to parse scenario YAML: {source}")]
    Yaml {
        /// The underlying YAML error.
        source: serde_yml::Error,
    },

    /// A label was declared twice.
    #[error("duplicate {kind} label `{label}`")]
    DuplicateLabel {
        /// What kind of record the label names.
        kind: &'static str,
        /// The repeated label.
        label: String,
    },

    /// A reference names a map, bed, or agent that was never declared.
    #[error("unknown {kind} `{label}`")]
    UnknownLabel {
        /// What kind of record was expected.
        kind: &'static str,
        /// The missing label.
        label: String,
    },

    /// A starting assignment was rejected by the colony.
    #[error("cannot give `{agent}` the bed `{bed}`: {source}")]
    Assignment {
        /// Agent label.
        agent: String,
        /// Bed label.
        bed: String,
        /// Why the colony refused.
        source: ColonyError,
    },
}

impl From<serde_yml::Error> for ScenarioError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level error for the runner binary.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The scenario could not be loaded.
    #[error("scenario error: {source}")]
    Scenario {
        /// The underlying scenario error.
        #[from]
        source: ScenarioError,
    },

    /// The settings file could not be loaded.
    #[error("settings error: {source}")]
    Settings {
        /// The underlying settings error.
        #[from]
        source: SettingsError,
    },

    /// The command line was malformed.
    #[error("usage: bedassign-sim <scenario.yaml> [ticks] ({message})")]
    Usage {
        /// What was wrong.
        message: String,
    },

    /// The final report could not be serialized.
    #[error("report error: {source}")]
    Report {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
