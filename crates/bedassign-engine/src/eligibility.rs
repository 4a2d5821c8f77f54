//! Hard eligibility predicates for agents and beds.
//!
//! Both predicates are pure functions of the host's current state. Every
//! claim, unclaim, and ranking goes through them first.

use bedassign_types::{Agent, AgentId, Bed, BedId, Faction};

use crate::colony::Colony;

/// Whether the engine may touch this agent's bed ownership at all.
///
/// The agent needs an ownership record, must be a free, non-enslaved
/// player colonist, and must be humanlike.
pub fn is_agent_usable<C: Colony + ?Sized>(colony: &C, agent: AgentId) -> bool {
    colony.agent(agent).is_some_and(agent_record_is_usable)
}

/// Whether the bed can be claimed by colonists.
///
/// Medical beds, beds reserved for prisoners or slaves, non-humanlike
/// beds, and beds designated for deconstruction or uninstalling are all
/// unusable. The designation check is a live query against the host.
pub fn is_bed_usable<C: Colony + ?Sized>(colony: &C, bed: BedId) -> bool {
    colony
        .bed(bed)
        .is_some_and(|record| bed_record_is_usable(colony, record))
}

pub(crate) fn agent_record_is_usable(agent: &Agent) -> bool {
    agent.has_ownership
        && agent.faction == Faction::Player
        && agent.free_colonist
        && !agent.enslaved
        && agent.humanlike
}

pub(crate) fn bed_record_is_usable<C: Colony + ?Sized>(colony: &C, bed: &Bed) -> bool {
    !bed.medical && bed.for_colonists && bed.humanlike && !colony.has_removal_designation(bed.id)
}
