//! The host seam: everything the engine needs to know about the colony.
//!
//! The host simulation owns agents, beds, rooms, relationships, and map
//! designations. The engine consumes them through the [`Colony`] trait as
//! read-only queries, plus exactly two mutations ([`Colony::assign_bed`]
//! and [`Colony::unassign_bed`]) that only the
//! [`ClaimManager`](crate::claims::ClaimManager) ever calls.
//!
//! [`ColonyState`](crate::colony_state::ColonyState) is an in-memory
//! implementation used by tests and the scenario runner.

use rust_decimal::Decimal;

use bedassign_types::{Agent, AgentId, Bed, BedId, MapId};

use crate::error::ColonyError;

/// Query and mutation surface of the host simulation.
pub trait Colony {
    /// Look up an agent record.
    fn agent(&self, id: AgentId) -> Option<&Agent>;

    /// Look up a bed record.
    fn bed(&self, id: BedId) -> Option<&Bed>;

    /// All beds built for colonists on a map, in any order.
    fn beds_on_map(&self, map: MapId) -> Vec<BedId>;

    /// All agents spawned on a map, in roster order.
    fn agents_on_map(&self, map: MapId) -> Vec<AgentId>;

    /// Whether the bed carries a deconstruct or uninstall designation.
    fn has_removal_designation(&self, bed: BedId) -> bool;

    /// The lover the agent has the highest opinion of, regardless of map.
    fn most_liked_partner(&self, agent: AgentId) -> Option<AgentId>;

    /// Whether a lover relationship exists between the two agents.
    fn has_partner_relation(&self, a: AgentId, b: AgentId) -> bool;

    /// Whether the two agents are willing to sleep in the same bed.
    fn willing_to_share_bed(&self, a: AgentId, b: AgentId) -> bool;

    /// Whether the agent's ideology forbids them from owning the bed.
    fn ideology_forbids(&self, agent: AgentId, bed: BedId) -> bool;

    /// Score stage index of a room impressiveness value.
    fn impressiveness_stage(&self, impressiveness: Decimal) -> usize;

    /// Make `agent` an owner of `bed`, releasing any bed they owned before.
    fn assign_bed(&mut self, agent: AgentId, bed: BedId) -> Result<(), ColonyError>;

    /// Release whatever bed `agent` owns.
    fn unassign_bed(&mut self, agent: AgentId) -> Result<(), ColonyError>;

    /// Whether the agent's body can ever sleep in the bed type.
    fn can_use_bed_ever(&self, agent: AgentId, bed: BedId) -> bool {
        match (self.agent(agent), self.bed(bed)) {
            (Some(a), Some(b)) => a.humanlike == b.humanlike,
            _ => false,
        }
    }

    /// Impressiveness of the room the agent owns a bed in, or zero.
    fn owned_room_impressiveness(&self, agent: AgentId) -> Decimal {
        self.agent(agent)
            .and_then(|a| a.owned_bed)
            .and_then(|bed| self.bed(bed))
            .map_or(Decimal::ZERO, |bed| bed.impressiveness)
    }
}
