//! Core entity structs: agents, beds, mood thoughts, and notifications.
//!
//! These records are owned by the host simulation. The engine reads all
//! of them but only ever changes the ownership link between an [`Agent`]
//! and a [`Bed`], and only through the host's mutation methods.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{Faction, ThoughtKind, TraitKind};
use crate::ids::{AgentId, BedId, MapId};

// ---------------------------------------------------------------------------
// ThoughtState
// ---------------------------------------------------------------------------

/// An active mood thought on an agent.
///
/// `stage_effects` mirrors the thought definition's stages: entry `i` is
/// the base mood effect the thought would have at stage `i`. The greedy
/// and ascetic searches compare a candidate bed's stage against
/// `mood_effect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThoughtState {
    /// Which thought this is.
    pub kind: ThoughtKind,
    /// The base mood effect at the current stage.
    pub mood_effect: Decimal,
    /// Base mood effect for every stage of the thought definition.
    #[serde(default)]
    pub stage_effects: Vec<Decimal>,
}

impl ThoughtState {
    /// Create a thought with no stage table.
    pub const fn new(kind: ThoughtKind, mood_effect: Decimal) -> Self {
        Self {
            kind,
            mood_effect,
            stage_effects: Vec::new(),
        }
    }

    /// Attach the per-stage mood effects of the thought definition.
    #[must_use]
    pub fn with_stages(mut self, stage_effects: Vec<Decimal>) -> Self {
        self.stage_effects = stage_effects;
        self
    }

    /// Whether the thought currently hurts the agent's mood.
    pub fn is_suffering(&self) -> bool {
        self.mood_effect < Decimal::ZERO
    }

    /// Base mood effect at `stage`, or zero when the definition has no
    /// such stage.
    pub fn stage_effect(&self, stage: usize) -> Decimal {
        self.stage_effects
            .get(stage)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// A simulated colonist that may own a bed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique identifier.
    pub id: AgentId,
    /// Short display name used in notifications.
    pub label: String,
    /// The map the agent is currently on, if spawned.
    pub map: Option<MapId>,
    /// Faction membership.
    pub faction: Faction,
    /// Whether the agent is a free colonist (not a prisoner).
    pub free_colonist: bool,
    /// Whether the agent is enslaved.
    pub enslaved: bool,
    /// Whether the agent is hosted by the player as a guest of another
    /// faction.
    pub guest: bool,
    /// Whether the agent's species is humanlike.
    pub humanlike: bool,
    /// Whether the agent has an ownership record at all.
    pub has_ownership: bool,
    /// The bed the agent currently owns.
    pub owned_bed: Option<BedId>,
    /// Personality traits relevant to bed assignment.
    pub traits: BTreeSet<TraitKind>,
    /// Active mood thoughts.
    pub thoughts: Vec<ThoughtState>,
}

impl Agent {
    /// Create a free, humanlike player colonist with no bed.
    pub fn colonist(label: impl Into<String>, map: MapId) -> Self {
        Self {
            id: AgentId::new(),
            label: label.into(),
            map: Some(map),
            faction: Faction::Player,
            free_colonist: true,
            enslaved: false,
            guest: false,
            humanlike: true,
            has_ownership: true,
            owned_bed: None,
            traits: BTreeSet::new(),
            thoughts: Vec::new(),
        }
    }

    /// Whether the agent carries the given trait.
    pub fn has_trait(&self, kind: TraitKind) -> bool {
        self.traits.contains(&kind)
    }

    /// Whether the agent carries any of the given traits.
    pub fn has_any_trait(&self, kinds: &[TraitKind]) -> bool {
        kinds.iter().any(|kind| self.traits.contains(kind))
    }

    /// Return the active thought of the given kind, if present.
    pub fn thought(&self, kind: ThoughtKind) -> Option<&ThoughtState> {
        self.thoughts.iter().find(|t| t.kind == kind)
    }

    /// Return the thought of the given kind only if it is hurting the
    /// agent's mood.
    pub fn suffering_from(&self, kind: ThoughtKind) -> Option<&ThoughtState> {
        self.thought(kind).filter(|t| t.is_suffering())
    }
}

// ---------------------------------------------------------------------------
// Bed
// ---------------------------------------------------------------------------

/// A claimable sleeping structure with one or more slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bed {
    /// Unique identifier. Last key of the ranking order.
    pub id: BedId,
    /// Short display name used in notifications.
    pub label: String,
    /// The map the bed stands on.
    pub map: MapId,
    /// Maximum number of simultaneous owners.
    pub capacity: u32,
    /// Current owners in claim order.
    pub owners: Vec<AgentId>,
    /// Reserved for patients.
    pub medical: bool,
    /// Usable by colonists (as opposed to prisoners or slaves).
    pub for_colonists: bool,
    /// Whether the bed type is meant for humanlike sleepers.
    pub humanlike: bool,
    /// Impressiveness of the room the bed stands in.
    pub impressiveness: Decimal,
    /// Rest effectiveness stat of the bed.
    pub rest_effectiveness: Decimal,
    /// Comfort stat of the bed.
    pub comfort: Decimal,
}

impl Bed {
    /// Create an empty, colonist-usable humanlike bed.
    pub fn new(
        label: impl Into<String>,
        map: MapId,
        capacity: u32,
        impressiveness: Decimal,
    ) -> Self {
        Self {
            id: BedId::new(),
            label: label.into(),
            map,
            capacity,
            owners: Vec::new(),
            medical: false,
            for_colonists: true,
            humanlike: true,
            impressiveness,
            rest_effectiveness: Decimal::ONE,
            comfort: Decimal::new(75, 2),
        }
    }

    /// Number of current owners.
    pub fn owner_count(&self) -> u32 {
        u32::try_from(self.owners.len()).unwrap_or(u32::MAX)
    }

    /// Number of unowned sleeping slots.
    pub fn free_slots(&self) -> u32 {
        self.capacity.saturating_sub(self.owner_count())
    }

    /// Whether at least one sleeping slot is unowned.
    pub fn has_free_slot(&self) -> bool {
        self.owner_count() < self.capacity
    }

    /// Whether the given agent is among the owners.
    pub fn is_owned_by(&self, agent: AgentId) -> bool {
        self.owners.contains(&agent)
    }
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// A user-facing message describing a reassignment.
///
/// `agents` lists everyone the host should highlight; `beds` lists the
/// beds that changed hands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Message text.
    pub text: String,
    /// Agents involved in the reassignment.
    pub agents: Vec<AgentId>,
    /// Beds involved in the reassignment.
    pub beds: Vec<BedId>,
}
