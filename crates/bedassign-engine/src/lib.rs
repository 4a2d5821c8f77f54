//! Bed reassignment engine.
//!
//! Evaluates colony agents one at a time and moves them into beds that
//! remove mood penalties, upgrade their sleeping quarters, or bring lovers
//! together, while respecting player-forced assignments.
//!
//! # Modules
//!
//! - [`colony`] -- The [`Colony`] host seam
//! - [`colony_state`] -- In-memory [`Colony`] used by tests and the runner
//! - [`eligibility`] -- Which agents and beds take part in reassignment
//! - [`forced`] -- Player-forced bed overrides
//! - [`claims`] -- The only code that mutates ownership
//! - [`ranking`] -- Deterministic bed ordering
//! - [`cascade`] -- The per-agent decision cascade
//! - [`notify`] -- Notification delivery
//! - [`settings`] -- Feature toggles loaded from YAML
//! - [`error`] -- Claim rejections and host failures

pub mod cascade;
pub mod claims;
pub mod colony;
pub mod colony_state;
pub mod eligibility;
pub mod error;
pub mod forced;
pub mod notify;
pub mod ranking;
mod search;
pub mod settings;

pub use cascade::{BedAssigner, CascadeStep, evaluate_agents};
pub use claims::{ClaimManager, Eviction};
pub use colony::Colony;
pub use colony_state::ColonyState;
pub use error::{ClaimRejection, ColonyError};
pub use forced::ForcedBeds;
pub use notify::NotificationSink;
pub use settings::{AssignmentSettings, SettingsError};
