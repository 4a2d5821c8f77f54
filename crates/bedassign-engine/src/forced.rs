//! Persisted manual bed overrides.
//!
//! A forced bed is a player's explicit "this agent sleeps here" choice.
//! The store is a plain key-value map owned by the host and saved with
//! the host's game state; the engine only reads it. Validity (same map,
//! bed still usable) is checked at query time by the
//! [`ClaimManager`](crate::claims::ClaimManager), so stale entries are
//! harmless.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use bedassign_types::{AgentId, BedId};

/// Map from agent to the bed a player forced them into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForcedBeds {
    beds: BTreeMap<AgentId, BedId>,
}

impl ForcedBeds {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            beds: BTreeMap::new(),
        }
    }

    /// The bed forced for `agent`, without any validity check.
    pub fn get(&self, agent: AgentId) -> Option<BedId> {
        self.beds.get(&agent).copied()
    }

    /// Force `agent` into `bed`. Returns the previous override.
    pub fn set(&mut self, agent: AgentId, bed: BedId) -> Option<BedId> {
        self.beds.insert(agent, bed)
    }

    /// Clear the override for `agent`. Returns the removed bed.
    pub fn remove(&mut self, agent: AgentId) -> Option<BedId> {
        self.beds.remove(&agent)
    }

    /// Drop every override pointing at `bed`, e.g. after it was destroyed.
    ///
    /// Returns the number of entries removed.
    pub fn forget_bed(&mut self, bed: BedId) -> usize {
        let before = self.beds.len();
        self.beds.retain(|_, forced| *forced != bed);
        before.saturating_sub(self.beds.len())
    }

    /// Number of stored overrides.
    pub fn len(&self) -> usize {
        self.beds.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.beds.is_empty()
    }

    /// Iterate over all `(agent, bed)` overrides in agent order.
    pub fn iter(&self) -> impl Iterator<Item = (AgentId, BedId)> + '_ {
        self.beds.iter().map(|(agent, bed)| (*agent, *bed))
    }
}

impl FromIterator<(AgentId, BedId)> for ForcedBeds {
    fn from_iter<I: IntoIterator<Item = (AgentId, BedId)>>(iter: I) -> Self {
        Self {
            beds: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_previous_override() {
        let mut forced = ForcedBeds::new();
        let agent = AgentId::new();
        let first = BedId::new();
        let second = BedId::new();
        assert_eq!(forced.set(agent, first), None);
        assert_eq!(forced.set(agent, second), Some(first));
        assert_eq!(forced.get(agent), Some(second));
        assert_eq!(forced.len(), 1);
    }

    #[test]
    fn forget_bed_drops_all_pointers() {
        let bed = BedId::new();
        let other = BedId::new();
        let mut forced: ForcedBeds = [
            (AgentId::new(), bed),
            (AgentId::new(), bed),
            (AgentId::new(), other),
        ]
        .into_iter()
        .collect();
        assert_eq!(forced.forget_bed(bed), 2);
        assert_eq!(forced.len(), 1);
        assert!(forced.iter().all(|(_, b)| b == other));
    }

    #[test]
    fn serializes_as_plain_map() {
        let agent = AgentId::new();
        let bed = BedId::new();
        let forced: ForcedBeds = [(agent, bed)].into_iter().collect();
        let json = serde_json::to_string(&forced).unwrap();
        assert!(json.starts_with('{'));
        let restored: ForcedBeds = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, forced);
    }
}
