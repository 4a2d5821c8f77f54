//! The generic "better bed" search shared by every ranked cascade branch.
//!
//! A branch supplies the ranked candidate list, its own qualification
//! predicate, the owner traits that shield an owner from eviction, and
//! whether owners may be evicted at all. The search walks the list until
//! it reaches the agent's current bed, so only strictly better candidates
//! (under that list's order) are ever claimed.

use tracing::debug;

use bedassign_types::{AgentId, Bed, BedId, TraitKind};

use crate::claims::{ClaimManager, Eviction};
use crate::colony::Colony;

/// How a search may free room in a candidate bed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SearchEviction {
    /// Evict owners who are not shielded by an excluded trait.
    EvictOwners,
    /// Only consider beds that already have a slot for everyone moving.
    FreeSlotsOnly,
}

/// Parameters of one search.
pub(crate) struct SearchRequest<'r, C: ?Sized> {
    /// Candidate beds in rank order.
    pub ranked: &'r [BedId],
    /// The agent's bed when the evaluation started.
    pub current: Option<BedId>,
    /// The agent looking for a bed.
    pub agent: AgentId,
    /// A mutual partner who moves along, if any.
    pub partner: Option<AgentId>,
    /// Branch-specific qualification rule.
    pub qualifies: &'r dyn Fn(&C, &Bed) -> bool,
    /// Owners with any of these traits make a bed ineligible.
    pub excluded_owner_traits: &'r [TraitKind],
    /// Eviction policy.
    pub eviction: SearchEviction,
}

impl<C: ?Sized> SearchRequest<'_, C> {
    const fn claim_mode(&self, exempt: Option<AgentId>) -> Eviction {
        match self.eviction {
            SearchEviction::EvictOwners => Eviction::MakeSpace { partner: exempt },
            SearchEviction::FreeSlotsOnly => Eviction::None,
        }
    }
}

/// Run the search and return the bed that was claimed, if any.
pub(crate) fn better_bed_search<C: Colony + ?Sized>(
    claims: &mut ClaimManager<'_, C>,
    request: &SearchRequest<'_, C>,
) -> Option<BedId> {
    for &bed in request.ranked {
        if Some(bed) == request.current {
            debug!(agent = %request.agent, %bed, "Reached current bed without a better candidate");
            break;
        }
        if !candidate_fits(claims.colony(), request, bed) {
            continue;
        }
        if claim_jointly(claims, request, bed) {
            return Some(bed);
        }
    }
    None
}

fn candidate_fits<C: Colony + ?Sized>(
    colony: &C,
    request: &SearchRequest<'_, C>,
    bed_id: BedId,
) -> bool {
    let Some(bed) = colony.bed(bed_id) else {
        return false;
    };
    if !(request.qualifies)(colony, bed) || !colony.can_use_bed_ever(request.agent, bed_id) {
        return false;
    }

    let mut sleepers = 1_u32;
    if let Some(partner) = request.partner {
        if bed.capacity < 2 || !colony.can_use_bed_ever(partner, bed_id) {
            return false;
        }
        if !bed.is_owned_by(partner) {
            sleepers = 2;
        }
    }

    let shielded_owner = bed
        .owners
        .iter()
        .filter(|owner| **owner != request.agent && Some(**owner) != request.partner)
        .find(|owner| {
            colony
                .agent(**owner)
                .is_some_and(|a| a.has_any_trait(request.excluded_owner_traits))
        });
    if let Some(owner) = shielded_owner {
        debug!(bed = %bed_id, %owner, "Skipping bed owned by a shielded agent");
        return false;
    }

    match request.eviction {
        SearchEviction::EvictOwners => true,
        SearchEviction::FreeSlotsOnly => bed.free_slots() >= sleepers,
    }
}

fn claim_jointly<C: Colony + ?Sized>(
    claims: &mut ClaimManager<'_, C>,
    request: &SearchRequest<'_, C>,
    bed: BedId,
) -> bool {
    let agent = request.agent;
    if !claims.claim_with(agent, bed, request.claim_mode(request.partner)) {
        return false;
    }
    let Some(partner) = request.partner else {
        return true;
    };
    if claims.colony().bed(bed).is_some_and(|b| b.is_owned_by(partner)) {
        return true;
    }
    if claims.claim_with(partner, bed, request.claim_mode(Some(agent))) {
        return true;
    }
    debug!(%agent, %partner, %bed, "Partner could not follow; rolling back");
    roll_back(claims, agent, request.current);
    false
}

/// Put `agent` back into `previous`, or leave them bedless if they had
/// none.
pub(crate) fn roll_back<C: Colony + ?Sized>(
    claims: &mut ClaimManager<'_, C>,
    agent: AgentId,
    previous: Option<BedId>,
) {
    let restored = match previous {
        Some(bed) => claims.claim_without_eviction(agent, bed),
        None => claims.unclaim(agent),
    };
    if !restored {
        debug!(%agent, "Could not restore previous bed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bedassign_types::{Agent, MapId, RankOrder};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::colony_state::ColonyState;
    use crate::forced::ForcedBeds;
    use crate::ranking::ranked_beds;

    fn always(_: &ColonyState, _: &Bed) -> bool {
        true
    }

    #[test]
    fn stops_at_current_bed() {
        let map = MapId::new();
        let mut colony = ColonyState::new();
        let forced = ForcedBeds::new();
        let ada = colony.add_agent(Agent::colonist("Ada", map));
        let best = colony.add_bed(Bed::new("Best", map, 1, dec!(90)));
        let worse = colony.add_bed(Bed::new("Worse", map, 1, dec!(10)));
        colony.assign_bed(ada, best).unwrap();
        let ranked = ranked_beds(&colony, map, RankOrder::BestFirst);

        let mut claims = ClaimManager::new(&mut colony, &forced);
        let found = better_bed_search(
            &mut claims,
            &SearchRequest {
                ranked: &ranked,
                current: Some(best),
                agent: ada,
                partner: None,
                qualifies: &always,
                excluded_owner_traits: &[],
                eviction: SearchEviction::EvictOwners,
            },
        );
        assert_eq!(found, None);
        assert!(colony.bed(worse).unwrap().owners.is_empty());
    }

    #[test]
    fn shielded_owner_is_skipped() {
        let map = MapId::new();
        let mut colony = ColonyState::new();
        let forced = ForcedBeds::new();
        let ada = colony.add_agent(Agent::colonist("Ada", map));
        let mut jealous = Agent::colonist("Jo", map);
        jealous.traits.insert(TraitKind::Jealous);
        let jo = colony.add_agent(jealous);
        let best = colony.add_bed(Bed::new("Best", map, 1, dec!(90)));
        let next = colony.add_bed(Bed::new("Next", map, 1, dec!(50)));
        colony.assign_bed(jo, best).unwrap();
        let ranked = ranked_beds(&colony, map, RankOrder::BestFirst);

        let mut claims = ClaimManager::new(&mut colony, &forced);
        let found = better_bed_search(
            &mut claims,
            &SearchRequest {
                ranked: &ranked,
                current: None,
                agent: ada,
                partner: None,
                qualifies: &always,
                excluded_owner_traits: &[TraitKind::Jealous],
                eviction: SearchEviction::EvictOwners,
            },
        );
        assert_eq!(found, Some(next));
        assert_eq!(colony.bed(best).unwrap().owners, vec![jo]);
    }

    #[test]
    fn partner_failure_rolls_agent_back() {
        let map = MapId::new();
        let mut colony = ColonyState::new();
        let mut forced = ForcedBeds::new();
        let ada = colony.add_agent(Agent::colonist("Ada", map));
        let bo = colony.add_agent(Agent::colonist("Bo", map));
        colony.add_lovers(ada, bo, 50);
        let old = colony.add_bed(Bed::new("Old", map, 1, dec!(10)));
        let pinned = colony.add_bed(Bed::new("Pinned", map, 1, dec!(20)));
        let double = colony.add_bed(Bed::new("Double", map, 2, dec!(90)));
        colony.assign_bed(ada, old).unwrap();
        colony.assign_bed(bo, pinned).unwrap();
        // Bo is forced into their own bed and cannot follow Ada.
        forced.set(bo, pinned);
        let ranked = ranked_beds(&colony, map, RankOrder::BestFirst);

        let mut claims = ClaimManager::new(&mut colony, &forced);
        let found = better_bed_search(
            &mut claims,
            &SearchRequest {
                ranked: &ranked,
                current: Some(old),
                agent: ada,
                partner: Some(bo),
                qualifies: &always,
                excluded_owner_traits: &[],
                eviction: SearchEviction::EvictOwners,
            },
        );
        assert_eq!(found, None);
        assert_eq!(colony.agent(ada).unwrap().owned_bed, Some(old));
        assert!(colony.bed(double).unwrap().owners.is_empty());
    }
}
