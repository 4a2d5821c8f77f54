//! Reassignment toggles and their YAML loader.
//!
//! Each toggle gates one branch of the reassignment cascade, except
//! `output_reassignment_messages`, which only controls whether
//! notifications reach the host. Every toggle defaults to `true`.
//!
//! ```yaml
//! avoid_jealous_penalty: true
//! avoid_greedy_penalty: true
//! avoid_ascetic_penalty: false
//! claim_better_beds: true
//! avoid_partner_penalty: true
//! avoid_sharing_penalty: true
//! output_reassignment_messages: true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors that can occur when loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Failed to read the settings file from disk.
    #[error("failed to read settings file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse settings YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for SettingsError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Toggles for the reassignment cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)] // One independent switch per cascade branch.
pub struct AssignmentSettings {
    /// Look for a better bed when suffering the Jealous penalty.
    #[serde(default = "default_true")]
    pub avoid_jealous_penalty: bool,

    /// Look for a better bed when suffering the Greedy penalty.
    #[serde(default = "default_true")]
    pub avoid_greedy_penalty: bool,

    /// Look for a worse bed when suffering the Ascetic penalty.
    #[serde(default = "default_true")]
    pub avoid_ascetic_penalty: bool,

    /// Claim strictly better beds that have room, with no penalty involved.
    #[serde(default = "default_true")]
    pub claim_better_beds: bool,

    /// Move in with a lover when suffering the "want to sleep with
    /// partner" penalty.
    #[serde(default = "default_true")]
    pub avoid_partner_penalty: bool,

    /// Give up a bed shared with a non-lover when suffering the
    /// "shared bed" penalty.
    #[serde(default = "default_true")]
    pub avoid_sharing_penalty: bool,

    /// Send a notification to the host for every reassignment.
    #[serde(default = "default_true")]
    pub output_reassignment_messages: bool,
}

impl Default for AssignmentSettings {
    fn default() -> Self {
        Self {
            avoid_jealous_penalty: true,
            avoid_greedy_penalty: true,
            avoid_ascetic_penalty: true,
            claim_better_beds: true,
            avoid_partner_penalty: true,
            avoid_sharing_penalty: true,
            output_reassignment_messages: true,
        }
    }
}

impl AssignmentSettings {
    /// Settings with every cascade branch switched off. Notifications stay on.
    pub const fn all_disabled() -> Self {
        Self {
            avoid_jealous_penalty: false,
            avoid_greedy_penalty: false,
            avoid_ascetic_penalty: false,
            claim_better_beds: false,
            avoid_partner_penalty: false,
            avoid_sharing_penalty: false,
            output_reassignment_messages: true,
        }
    }

    /// Load settings from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] if the file cannot be read, or
    /// [`SettingsError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse settings from a YAML string. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, SettingsError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}

const fn default_true() -> bool {
    true
}
