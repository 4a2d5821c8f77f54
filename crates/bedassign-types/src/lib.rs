//! Shared type definitions for the bed assignment engine.
//!
//! This crate is the single source of truth for the records exchanged
//! between the engine and its host simulation.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for agents, beds, and maps
//! - [`enums`] -- Factions, traits, thoughts, designations, ranking order
//! - [`structs`] -- Agent, bed, thought, and notification records

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{DesignationKind, Faction, RankOrder, ThoughtKind, TraitKind};
pub use ids::{AgentId, BedId, MapId};
pub use structs::{Agent, Bed, Notification, ThoughtState};
