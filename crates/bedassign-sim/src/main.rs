//! Headless scenario runner for the bed assignment engine.
//!
//! Loads a colony from a YAML scenario, evaluates every agent once per
//! tick until the colony settles (or the tick limit is reached), and
//! prints a JSON report of the reassignments and final bed ownership.
//!
//! # Usage
//!
//! ```bash
//! bedassign-sim scenarios/colony.yaml 20
//! BEDASSIGN_SETTINGS=settings.yaml RUST_LOG=debug bedassign-sim scenarios/colony.yaml
//! ```
//!
//! Settings come from the file named by `BEDASSIGN_SETTINGS` if set,
//! then from the scenario's own `settings` section, then from defaults.

mod error;
mod scenario;

use std::path::{Path, PathBuf};

use bedassign_engine::AssignmentSettings;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::SimError;
use crate::scenario::Scenario;

/// Tick limit when none is given on the command line.
const DEFAULT_TICKS: u32 = 10;

/// Environment variable naming a settings file that overrides the
/// scenario's settings.
const SETTINGS_ENV: &str = "BEDASSIGN_SETTINGS";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the arguments, settings, or scenario are invalid.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("bedassign-sim starting");
    run()?;
    Ok(())
}

fn run() -> Result<(), SimError> {
    let (path, ticks) = parse_args(std::env::args().skip(1))?;
    let scenario = Scenario::from_file(&path)?;
    let settings = load_settings(&scenario)?;
    info!(scenario = %path.display(), ticks, "Scenario loaded");

    let mut simulation = scenario.build()?;
    let report = simulation.report(&settings, ticks);
    info!(
        ticks = report.summary.ticks,
        settled = report.summary.settled,
        notifications = report.summary.notifications.len(),
        "Run complete"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<(PathBuf, u32), SimError> {
    let path = args.next().map(PathBuf::from).ok_or_else(|| SimError::Usage {
        message: "missing scenario path".to_owned(),
    })?;
    let ticks = match args.next() {
        Some(raw) => raw.parse().map_err(|e| SimError::Usage {
            message: format!("invalid tick count `{raw}`: {e}"),
        })?,
        None => DEFAULT_TICKS,
    };
    if let Some(extra) = args.next() {
        return Err(SimError::Usage {
            message: format!("unexpected argument `{extra}`"),
        });
    }
    Ok((path, ticks))
}

fn load_settings(scenario: &Scenario) -> Result<AssignmentSettings, SimError> {
    if let Ok(raw) = std::env::var(SETTINGS_ENV) {
        let path = Path::new(&raw);
        info!(settings = %path.display(), "Loading settings override");
        return Ok(AssignmentSettings::from_file(path)?);
    }
    Ok(scenario.settings.unwrap_or_else(|| {
        info!("No settings given, using defaults");
        AssignmentSettings::default()
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args<'a>(list: &'a [&'a str]) -> impl Iterator<Item = String> + 'a {
        list.iter().map(|s| (*s).to_owned())
    }

    #[test]
    fn tick_count_defaults() {
        let (path, ticks) = parse_args(args(&["colony.yaml"])).unwrap();
        assert_eq!(path, PathBuf::from("colony.yaml"));
        assert_eq!(ticks, DEFAULT_TICKS);
    }

    #[test]
    fn tick_count_is_parsed() {
        let (_, ticks) = parse_args(args(&["colony.yaml", "3"])).unwrap();
        assert_eq!(ticks, 3);
    }

    #[test]
    fn bad_arguments_are_usage_errors() {
        assert!(matches!(parse_args(args(&[])), Err(SimError::Usage { .. })));
        assert!(matches!(
            parse_args(args(&["colony.yaml", "many"])),
            Err(SimError::Usage { .. })
        ));
        assert!(matches!(
            parse_args(args(&["colony.yaml", "3", "extra"])),
            Err(SimError::Usage { .. })
        ));
    }
}
