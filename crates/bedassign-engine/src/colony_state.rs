//! In-memory [`Colony`] implementation.
//!
//! [`ColonyState`] keeps agents, beds, lover relationships, designations,
//! and ideology bans in ordered maps so every query is deterministic. It
//! backs the unit tests and the headless scenario runner, and is a
//! reference for what a real host has to provide.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use bedassign_types::{Agent, AgentId, Bed, BedId, DesignationKind, MapId};

use crate::colony::Colony;
use crate::error::ColonyError;

/// Default impressiveness stage thresholds, from "awful" to "wondrously
/// impressive".
fn default_stage_thresholds() -> Vec<Decimal> {
    vec![
        Decimal::MIN,
        Decimal::from(20),
        Decimal::from(30),
        Decimal::from(40),
        Decimal::from(50),
        Decimal::from(65),
        Decimal::from(85),
        Decimal::from(120),
        Decimal::from(170),
        Decimal::from(240),
    ]
}

/// A self-contained colony held entirely in memory.
#[derive(Debug, Clone)]
pub struct ColonyState {
    /// Agents in insertion order.
    roster: Vec<AgentId>,
    agents: BTreeMap<AgentId, Agent>,
    beds: BTreeMap<BedId, Bed>,
    designations: BTreeMap<BedId, BTreeSet<DesignationKind>>,
    /// Lover relationships with the opinion each side holds of the other.
    lovers: BTreeMap<AgentId, BTreeMap<AgentId, i32>>,
    unwilling_to_share: BTreeSet<(AgentId, AgentId)>,
    ideology_bans: BTreeSet<(AgentId, BedId)>,
    locked_owners: BTreeSet<AgentId>,
    stage_thresholds: Vec<Decimal>,
}

impl Default for ColonyState {
    fn default() -> Self {
        Self::new()
    }
}

impl ColonyState {
    /// Create an empty colony with the default impressiveness stages.
    pub fn new() -> Self {
        Self {
            roster: Vec::new(),
            agents: BTreeMap::new(),
            beds: BTreeMap::new(),
            designations: BTreeMap::new(),
            lovers: BTreeMap::new(),
            unwilling_to_share: BTreeSet::new(),
            ideology_bans: BTreeSet::new(),
            locked_owners: BTreeSet::new(),
            stage_thresholds: default_stage_thresholds(),
        }
    }

    /// Replace the impressiveness stage thresholds. Thresholds are
    /// minimum scores in ascending order.
    #[must_use]
    pub fn with_stage_thresholds(mut self, thresholds: Vec<Decimal>) -> Self {
        self.stage_thresholds = thresholds;
        self
    }

    /// Add an agent. Any ownership on the record is cleared; use
    /// [`Colony::assign_bed`] to give them a bed.
    pub fn add_agent(&mut self, mut agent: Agent) -> AgentId {
        let id = agent.id;
        agent.owned_bed = None;
        if self.agents.insert(id, agent).is_none() {
            self.roster.push(id);
        }
        id
    }

    /// Add a bed. Any owners on the record are cleared.
    pub fn add_bed(&mut self, mut bed: Bed) -> BedId {
        let id = bed.id;
        bed.owners.clear();
        self.beds.insert(id, bed);
        id
    }

    /// Remove a bed, releasing its owners.
    pub fn remove_bed(&mut self, bed: BedId) -> Option<Bed> {
        let removed = self.beds.remove(&bed)?;
        for owner in &removed.owners {
            if let Some(agent) = self.agents.get_mut(owner) {
                agent.owned_bed = None;
            }
        }
        self.designations.remove(&bed);
        Some(removed)
    }

    /// Agents in the order they were added.
    pub fn roster(&self) -> &[AgentId] {
        &self.roster
    }

    /// Iterate over all beds in id order.
    pub fn beds(&self) -> impl Iterator<Item = &Bed> {
        self.beds.values()
    }

    /// Mutable access to an agent record, for hosts and tests that change
    /// traits, thoughts, or status flags.
    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    /// Mutable access to a bed record. Owner lists must not be edited
    /// through this; use the [`Colony`] mutations.
    pub fn bed_mut(&mut self, id: BedId) -> Option<&mut Bed> {
        self.beds.get_mut(&id)
    }

    /// Record a lover relationship. Each side starts with the given
    /// opinion of the other.
    pub fn add_lovers(&mut self, a: AgentId, b: AgentId, opinion: i32) {
        self.lovers.entry(a).or_default().insert(b, opinion);
        self.lovers.entry(b).or_default().insert(a, opinion);
    }

    /// Set `of`'s opinion of their lover `toward`. Ignored if they are
    /// not lovers.
    pub fn set_opinion(&mut self, of: AgentId, toward: AgentId, opinion: i32) {
        if let Some(value) = self.lovers.get_mut(&of).and_then(|m| m.get_mut(&toward)) {
            *value = opinion;
        }
    }

    /// Mark two agents as refusing to share a bed.
    pub fn set_unwilling_to_share(&mut self, a: AgentId, b: AgentId) {
        self.unwilling_to_share.insert(ordered_pair(a, b));
    }

    /// Forbid an agent from owning a bed on ideological grounds.
    pub fn forbid_by_ideology(&mut self, agent: AgentId, bed: BedId) {
        self.ideology_bans.insert((agent, bed));
    }

    /// Make the host refuse to release this agent's bed.
    pub fn lock_owner(&mut self, agent: AgentId) {
        self.locked_owners.insert(agent);
    }

    /// Place a designation on a bed.
    pub fn designate(&mut self, bed: BedId, kind: DesignationKind) {
        self.designations.entry(bed).or_default().insert(kind);
    }

    /// Remove all designations from a bed.
    pub fn clear_designations(&mut self, bed: BedId) {
        self.designations.remove(&bed);
    }

    fn release(&mut self, agent: AgentId) {
        let previous = self.agents.get_mut(&agent).and_then(|a| a.owned_bed.take());
        if let Some(bed) = previous.and_then(|id| self.beds.get_mut(&id)) {
            bed.owners.retain(|owner| *owner != agent);
        }
    }
}

fn ordered_pair(a: AgentId, b: AgentId) -> (AgentId, AgentId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl Colony for ColonyState {
    fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    fn bed(&self, id: BedId) -> Option<&Bed> {
        self.beds.get(&id)
    }

    fn beds_on_map(&self, map: MapId) -> Vec<BedId> {
        self.beds
            .values()
            .filter(|bed| bed.map == map)
            .map(|bed| bed.id)
            .collect()
    }

    fn agents_on_map(&self, map: MapId) -> Vec<AgentId> {
        self.roster
            .iter()
            .copied()
            .filter(|id| self.agents.get(id).is_some_and(|a| a.map == Some(map)))
            .collect()
    }

    fn has_removal_designation(&self, bed: BedId) -> bool {
        self.designations
            .get(&bed)
            .is_some_and(|kinds| kinds.iter().any(|kind| kind.removes_bed()))
    }

    fn most_liked_partner(&self, agent: AgentId) -> Option<AgentId> {
        let mut best: Option<(AgentId, i32)> = None;
        for (&partner, &opinion) in self.lovers.get(&agent)? {
            if best.is_none_or(|(_, top)| opinion > top) {
                best = Some((partner, opinion));
            }
        }
        best.map(|(partner, _)| partner)
    }

    fn has_partner_relation(&self, a: AgentId, b: AgentId) -> bool {
        self.lovers.get(&a).is_some_and(|m| m.contains_key(&b))
    }

    fn willing_to_share_bed(&self, a: AgentId, b: AgentId) -> bool {
        !self.unwilling_to_share.contains(&ordered_pair(a, b))
    }

    fn ideology_forbids(&self, agent: AgentId, bed: BedId) -> bool {
        self.ideology_bans.contains(&(agent, bed))
    }

    fn impressiveness_stage(&self, impressiveness: Decimal) -> usize {
        self.stage_thresholds
            .iter()
            .rposition(|threshold| impressiveness >= *threshold)
            .unwrap_or(0)
    }

    fn assign_bed(&mut self, agent: AgentId, bed: BedId) -> Result<(), ColonyError> {
        let current = self
            .agents
            .get(&agent)
            .ok_or(ColonyError::AgentNotFound(agent))?
            .owned_bed;
        let record = self.beds.get(&bed).ok_or(ColonyError::BedNotFound(bed))?;
        if current == Some(bed) {
            return Ok(());
        }
        if !record.has_free_slot() {
            return Err(ColonyError::BedFull {
                bed,
                capacity: record.capacity,
            });
        }
        if current.is_some() && self.locked_owners.contains(&agent) {
            return Err(ColonyError::OwnershipLocked(agent));
        }
        self.release(agent);
        if let Some(record) = self.beds.get_mut(&bed) {
            record.owners.push(agent);
        }
        if let Some(record) = self.agents.get_mut(&agent) {
            record.owned_bed = Some(bed);
        }
        Ok(())
    }

    fn unassign_bed(&mut self, agent: AgentId) -> Result<(), ColonyError> {
        if !self.agents.contains_key(&agent) {
            return Err(ColonyError::AgentNotFound(agent));
        }
        if self.locked_owners.contains(&agent) {
            return Err(ColonyError::OwnershipLocked(agent));
        }
        self.release(agent);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn setup() -> (ColonyState, MapId) {
        (ColonyState::new(), MapId::new())
    }

    #[test]
    fn assign_moves_agent_between_beds() {
        let (mut colony, map) = setup();
        let agent = colony.add_agent(Agent::colonist("Ada", map));
        let first = colony.add_bed(Bed::new("First", map, 1, dec!(10)));
        let second = colony.add_bed(Bed::new("Second", map, 1, dec!(20)));

        colony.assign_bed(agent, first).unwrap();
        colony.assign_bed(agent, second).unwrap();

        assert!(colony.bed(first).unwrap().owners.is_empty());
        assert_eq!(colony.bed(second).unwrap().owners, vec![agent]);
        assert_eq!(colony.agent(agent).unwrap().owned_bed, Some(second));
    }

    #[test]
    fn assign_refuses_full_bed() {
        let (mut colony, map) = setup();
        let a = colony.add_agent(Agent::colonist("Ada", map));
        let b = colony.add_agent(Agent::colonist("Bo", map));
        let bed = colony.add_bed(Bed::new("Single", map, 1, dec!(10)));
        colony.assign_bed(a, bed).unwrap();
        assert_eq!(
            colony.assign_bed(b, bed),
            Err(ColonyError::BedFull { bed, capacity: 1 })
        );
        assert_eq!(colony.agent(b).unwrap().owned_bed, None);
    }

    #[test]
    fn locked_owner_keeps_bed() {
        let (mut colony, map) = setup();
        let a = colony.add_agent(Agent::colonist("Ada", map));
        let bed = colony.add_bed(Bed::new("Single", map, 1, dec!(10)));
        colony.assign_bed(a, bed).unwrap();
        colony.lock_owner(a);
        assert_eq!(colony.unassign_bed(a), Err(ColonyError::OwnershipLocked(a)));
        assert_eq!(colony.bed(bed).unwrap().owners, vec![a]);
    }

    #[test]
    fn most_liked_partner_follows_opinion() {
        let (mut colony, map) = setup();
        let a = colony.add_agent(Agent::colonist("Ada", map));
        let b = colony.add_agent(Agent::colonist("Bo", map));
        let c = colony.add_agent(Agent::colonist("Cy", map));
        colony.add_lovers(a, b, 10);
        colony.add_lovers(a, c, 10);
        colony.set_opinion(a, c, 50);
        assert_eq!(colony.most_liked_partner(a), Some(c));
        assert_eq!(colony.most_liked_partner(b), Some(a));
        assert!(colony.has_partner_relation(c, a));
        assert!(!colony.has_partner_relation(b, c));
    }

    #[test]
    fn stage_index_uses_last_threshold_reached() {
        let colony = ColonyState::new();
        assert_eq!(colony.impressiveness_stage(dec!(-50)), 0);
        assert_eq!(colony.impressiveness_stage(dec!(19.9)), 0);
        assert_eq!(colony.impressiveness_stage(dec!(20)), 1);
        assert_eq!(colony.impressiveness_stage(dec!(66)), 5);
        assert_eq!(colony.impressiveness_stage(dec!(1000)), 9);
    }

    #[test]
    fn removing_bed_releases_owners() {
        let (mut colony, map) = setup();
        let a = colony.add_agent(Agent::colonist("Ada", map));
        let bed = colony.add_bed(Bed::new("Single", map, 1, dec!(10)));
        colony.assign_bed(a, bed).unwrap();
        assert!(colony.remove_bed(bed).is_some());
        assert_eq!(colony.agent(a).unwrap().owned_bed, None);
        assert!(colony.beds_on_map(map).is_empty());
    }

    #[test]
    fn agents_on_map_keeps_roster_order() {
        let (mut colony, map) = setup();
        let elsewhere = MapId::new();
        let a = colony.add_agent(Agent::colonist("Ada", map));
        let _ = colony.add_agent(Agent::colonist("Bo", elsewhere));
        let c = colony.add_agent(Agent::colonist("Cy", map));
        assert_eq!(colony.agents_on_map(map), vec![a, c]);
    }
}
