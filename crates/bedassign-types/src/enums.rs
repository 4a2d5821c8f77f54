//! Enumeration types shared by the engine and its hosts.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Factions
// ---------------------------------------------------------------------------

/// The faction an agent belongs to.
///
/// Only members of the player faction are ever reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// The player's own colony.
    Player,
    /// Any other faction (visitors, traders, raiders).
    Other,
}

// ---------------------------------------------------------------------------
// Personality traits
// ---------------------------------------------------------------------------

/// Personality traits the engine cares about.
///
/// The host may model many more traits; only these change how owners are
/// treated during eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TraitKind {
    /// Resents anyone with a more impressive bedroom.
    Jealous,
    /// Wants an impressive bedroom.
    Greedy,
    /// Wants a plain bedroom.
    Ascetic,
}

// ---------------------------------------------------------------------------
// Mood thoughts
// ---------------------------------------------------------------------------

/// Mood thoughts that drive the reassignment cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ThoughtKind {
    /// "Jealous": someone else has a much better bedroom.
    Jealous,
    /// "Greedy": own bedroom is not impressive enough.
    Greedy,
    /// "Ascetic": own bedroom is too impressive.
    Ascetic,
    /// "Want to sleep with partner": sleeping apart from a lover.
    WantToSleepWithPartner,
    /// "Shared bed": sharing a bed with someone who is not a lover.
    SharedBed,
}

impl ThoughtKind {
    /// Human-readable name used in notification text.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Jealous => "Jealous",
            Self::Greedy => "Greedy",
            Self::Ascetic => "Ascetic",
            Self::WantToSleepWithPartner => "Want to sleep with partner",
            Self::SharedBed => "Shared bed",
        }
    }
}

// ---------------------------------------------------------------------------
// Designations
// ---------------------------------------------------------------------------

/// Map designations that can be placed on a bed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DesignationKind {
    /// Marked to be torn down.
    Deconstruct,
    /// Marked to be uninstalled and moved.
    Uninstall,
    /// Marked to be claimed from another faction.
    Claim,
}

impl DesignationKind {
    /// Whether this designation takes the bed out of service.
    pub const fn removes_bed(self) -> bool {
        matches!(self, Self::Deconstruct | Self::Uninstall)
    }
}

// ---------------------------------------------------------------------------
// Ranking direction
// ---------------------------------------------------------------------------

/// Direction of the primary ranking key (room impressiveness).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RankOrder {
    /// Most impressive rooms first.
    #[default]
    BestFirst,
    /// Least impressive rooms first (the ascetic search).
    WorstFirst,
}
