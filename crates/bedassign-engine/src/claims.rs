//! Low-level claim manager: the only code that mutates bed ownership.
//!
//! [`ClaimManager`] wraps a mutable borrow of the host [`Colony`] together
//! with the injected [`ForcedBeds`] store. Its `try_*` methods return the
//! precise [`ClaimRejection`]; the boolean wrappers log that reason at
//! `debug` level and hand back `false`, which is all the decision cascade
//! needs.
//!
//! Invariants enforced here:
//!
//! - an agent owns at most one bed (the host releases the previous bed on
//!   every assignment)
//! - a claim only lands while the bed has a free slot, re-checked after
//!   any evictions
//! - a valid forced bed is never dropped or swapped out by an automatic
//!   claim

use tracing::{debug, info};

use bedassign_types::{AgentId, Bed, BedId};

use crate::colony::Colony;
use crate::eligibility;
use crate::error::ClaimRejection;
use crate::forced::ForcedBeds;

/// How a claim may free up room in the target bed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eviction {
    /// Kick out owners who are not lovers of the claimant, sparing the
    /// partner the claimant is moving with and that partner's favourite.
    MakeSpace {
        /// The partner to move in with, if any.
        partner: Option<AgentId>,
    },
    /// Only claim if a slot is already free.
    None,
}

/// Eligibility queries and ownership mutations over a borrowed colony.
pub struct ClaimManager<'a, C: Colony + ?Sized> {
    colony: &'a mut C,
    forced: &'a ForcedBeds,
}

impl<'a, C: Colony + ?Sized> ClaimManager<'a, C> {
    /// Borrow the colony and the forced-bed store for a batch of claims.
    pub const fn new(colony: &'a mut C, forced: &'a ForcedBeds) -> Self {
        Self { colony, forced }
    }

    /// Read-only view of the colony.
    pub fn colony(&self) -> &C {
        &*self.colony
    }

    /// The injected forced-bed store.
    pub const fn forced_beds(&self) -> &ForcedBeds {
        self.forced
    }

    /// See [`eligibility::is_agent_usable`].
    pub fn is_agent_usable(&self, agent: AgentId) -> bool {
        eligibility::is_agent_usable(self.colony(), agent)
    }

    /// See [`eligibility::is_bed_usable`].
    pub fn is_bed_usable(&self, bed: BedId) -> bool {
        eligibility::is_bed_usable(self.colony(), bed)
    }

    /// The agent's forced bed, if it is still valid.
    ///
    /// Valid means the agent is usable, the bed is usable, and both are on
    /// the same map.
    pub fn forced_bed(&self, agent: AgentId) -> Option<BedId> {
        let colony = self.colony();
        let record = colony.agent(agent)?;
        if !eligibility::agent_record_is_usable(record) {
            return None;
        }
        let forced = self.forced.get(agent)?;
        let bed = colony.bed(forced)?;
        (record.map == Some(bed.map) && eligibility::bed_record_is_usable(colony, bed))
            .then_some(forced)
    }

    /// The agent's most liked lover, if both are usable and on the same
    /// map.
    ///
    /// Mutuality is not required; compare with the partner's own answer
    /// to find out.
    pub fn most_liked_partner(&self, agent: AgentId) -> Option<AgentId> {
        let colony = self.colony();
        let record = colony.agent(agent)?;
        if !eligibility::agent_record_is_usable(record) {
            return None;
        }
        let partner = colony.most_liked_partner(agent)?;
        let partner_record = colony.agent(partner)?;
        (eligibility::agent_record_is_usable(partner_record) && partner_record.map == record.map)
            .then_some(partner)
    }

    /// Try to evict every owner of `bed` that `agent` may not share with.
    ///
    /// An owner stays if they are a lover of `agent` willing to share the
    /// bed, or if they are a lover of `partner` and `partner`'s favourite.
    /// Owners who cannot be evicted are skipped. Returns the evicted
    /// agents.
    ///
    /// # Errors
    ///
    /// Fails without evicting anyone if `agent` or `bed` is unusable, or
    /// if `agent` and `partner` are not willing to share a bed.
    pub fn make_space(
        &mut self,
        agent: AgentId,
        bed: BedId,
        partner: Option<AgentId>,
    ) -> Result<Vec<AgentId>, ClaimRejection> {
        if !self.is_agent_usable(agent) {
            return Err(ClaimRejection::AgentUnusable { agent });
        }
        let owners = self.usable_bed(bed)?.owners.clone();
        if let Some(partner) = partner {
            if !self.colony.willing_to_share_bed(agent, partner) {
                return Err(ClaimRejection::UnwillingToShare { agent, partner });
            }
        }
        let partner_favourite = partner.and_then(|p| self.most_liked_partner(p));

        let mut evicted = Vec::new();
        for sleeper in owners.into_iter().rev() {
            if sleeper == agent {
                continue;
            }
            let bonded = self.colony.has_partner_relation(agent, sleeper)
                && self.colony.willing_to_share_bed(agent, sleeper);
            let partners_favourite = partner.is_some_and(|p| {
                self.colony.has_partner_relation(p, sleeper) && partner_favourite == Some(sleeper)
            });
            if bonded || partners_favourite {
                continue;
            }
            match self.try_unclaim(sleeper) {
                Ok(_) => {
                    info!(%sleeper, %bed, %agent, "Evicted owner to make room");
                    evicted.push(sleeper);
                }
                Err(rejection) => {
                    debug!(%sleeper, %bed, %agent, %rejection, "Could not evict owner");
                }
            }
        }
        Ok(evicted)
    }

    /// Claim `bed` for `agent`.
    ///
    /// # Errors
    ///
    /// Rejects an unusable agent or bed, a map mismatch, a bed the agent
    /// already owns, any bed other than the agent's valid forced bed, and
    /// beds the agent's ideology forbids. With [`Eviction::MakeSpace`] it
    /// then tries to free room; the claim lands only if a slot is free
    /// afterwards.
    pub fn try_claim(
        &mut self,
        agent: AgentId,
        bed: BedId,
        eviction: Eviction,
    ) -> Result<(), ClaimRejection> {
        let (agent_map, owned) = {
            let record = self
                .colony
                .agent(agent)
                .filter(|a| eligibility::agent_record_is_usable(a))
                .ok_or(ClaimRejection::AgentUnusable { agent })?;
            (record.map, record.owned_bed)
        };
        let bed_map = self.usable_bed(bed)?.map;
        if agent_map != Some(bed_map) {
            return Err(ClaimRejection::MapMismatch { agent, bed });
        }
        if owned == Some(bed) {
            return Err(ClaimRejection::AlreadyOwned { agent, bed });
        }
        if let Some(forced) = self.forced_bed(agent) {
            if forced != bed {
                return Err(ClaimRejection::ForcedBedConflict {
                    agent,
                    forced,
                    requested: bed,
                });
            }
        }
        if self.colony.ideology_forbids(agent, bed) {
            return Err(ClaimRejection::IdeologyForbids { agent, bed });
        }

        if let Eviction::MakeSpace { partner } = eviction {
            // Best effort: a failed eviction pass never aborts the claim.
            if let Err(rejection) = self.make_space(agent, bed, partner) {
                debug!(%agent, %bed, %rejection, "Ignoring failed attempt to make room");
            }
        }

        if !self.colony.bed(bed).is_some_and(Bed::has_free_slot) {
            return Err(ClaimRejection::NoFreeSlot { agent, bed });
        }
        self.colony.assign_bed(agent, bed)?;
        info!(%agent, %bed, "Claimed bed");
        Ok(())
    }

    /// Claim `bed` for `agent`, evicting owners as needed while sparing
    /// `partner`. Returns whether the claim landed.
    pub fn claim(&mut self, agent: AgentId, bed: BedId, partner: Option<AgentId>) -> bool {
        self.claim_with(agent, bed, Eviction::MakeSpace { partner })
    }

    /// Claim `bed` for `agent` only if a slot is already free.
    pub fn claim_without_eviction(&mut self, agent: AgentId, bed: BedId) -> bool {
        self.claim_with(agent, bed, Eviction::None)
    }

    /// Boolean form of [`try_claim`](Self::try_claim).
    pub fn claim_with(&mut self, agent: AgentId, bed: BedId, eviction: Eviction) -> bool {
        match self.try_claim(agent, bed, eviction) {
            Ok(()) => true,
            Err(rejection) => {
                debug!(%agent, %bed, %rejection, "Claim rejected");
                false
            }
        }
    }

    /// Release the bed `agent` owns. Returns the released bed.
    ///
    /// # Errors
    ///
    /// Rejects an unusable agent, an agent without a bed, and an agent
    /// whose bed is their valid forced bed.
    pub fn try_unclaim(&mut self, agent: AgentId) -> Result<BedId, ClaimRejection> {
        let held = self
            .colony
            .agent(agent)
            .filter(|a| eligibility::agent_record_is_usable(a))
            .ok_or(ClaimRejection::AgentUnusable { agent })?
            .owned_bed
            .ok_or(ClaimRejection::NoBedOwned { agent })?;
        if self.forced_bed(agent) == Some(held) {
            return Err(ClaimRejection::ForcedBedProtected { agent, bed: held });
        }
        self.colony.unassign_bed(agent)?;
        info!(%agent, bed = %held, "Unclaimed bed");
        Ok(held)
    }

    /// Boolean form of [`try_unclaim`](Self::try_unclaim).
    pub fn unclaim(&mut self, agent: AgentId) -> bool {
        match self.try_unclaim(agent) {
            Ok(_) => true,
            Err(rejection) => {
                debug!(%agent, %rejection, "Unclaim rejected");
                false
            }
        }
    }

    fn usable_bed(&self, bed: BedId) -> Result<&Bed, ClaimRejection> {
        let colony = self.colony();
        colony
            .bed(bed)
            .filter(|record| eligibility::bed_record_is_usable(colony, record))
            .ok_or(ClaimRejection::BedUnusable { bed })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bedassign_types::{Agent, MapId};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::colony_state::ColonyState;
    use crate::error::ColonyError;

    struct Fixture {
        colony: ColonyState,
        forced: ForcedBeds,
        map: MapId,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                colony: ColonyState::new(),
                forced: ForcedBeds::new(),
                map: MapId::new(),
            }
        }

        fn agent(&mut self, label: &str) -> AgentId {
            self.colony.add_agent(Agent::colonist(label, self.map))
        }

        fn bed(&mut self, capacity: u32) -> BedId {
            self.colony
                .add_bed(Bed::new("Bed", self.map, capacity, dec!(30)))
        }

        fn owners(&self, bed: BedId) -> Vec<AgentId> {
            self.colony.bed(bed).unwrap().owners.clone()
        }

        fn manager(&mut self) -> ClaimManager<'_, ColonyState> {
            ClaimManager::new(&mut self.colony, &self.forced)
        }
    }

    #[test]
    fn claim_free_bed() {
        let mut fx = Fixture::new();
        let ada = fx.agent("Ada");
        let bed = fx.bed(1);
        assert!(fx.manager().claim(ada, bed, None));
        assert_eq!(fx.owners(bed), vec![ada]);
    }

    #[test]
    fn claim_rejects_owned_bed_and_other_map() {
        let mut fx = Fixture::new();
        let ada = fx.agent("Ada");
        let bed = fx.bed(1);
        let far = fx
            .colony
            .add_bed(Bed::new("Far", MapId::new(), 1, dec!(30)));
        let mut claims = fx.manager();
        assert!(claims.claim(ada, bed, None));
        assert_eq!(
            claims.try_claim(ada, bed, Eviction::None),
            Err(ClaimRejection::AlreadyOwned { agent: ada, bed })
        );
        assert_eq!(
            claims.try_claim(ada, far, Eviction::None),
            Err(ClaimRejection::MapMismatch { agent: ada, bed: far })
        );
    }

    #[test]
    fn claim_rejects_ideology_ban() {
        let mut fx = Fixture::new();
        let ada = fx.agent("Ada");
        let bed = fx.bed(1);
        fx.colony.forbid_by_ideology(ada, bed);
        assert_eq!(
            fx.manager().try_claim(ada, bed, Eviction::None),
            Err(ClaimRejection::IdeologyForbids { agent: ada, bed })
        );
    }

    #[test]
    fn forced_bed_blocks_other_claims() {
        let mut fx = Fixture::new();
        let ada = fx.agent("Ada");
        let forced = fx.bed(1);
        let other = fx.bed(1);
        fx.forced.set(ada, forced);
        let mut claims = fx.manager();
        assert_eq!(
            claims.try_claim(ada, other, Eviction::None),
            Err(ClaimRejection::ForcedBedConflict {
                agent: ada,
                forced,
                requested: other
            })
        );
        assert!(claims.claim(ada, forced, None));
        assert_eq!(
            claims.try_unclaim(ada),
            Err(ClaimRejection::ForcedBedProtected { agent: ada, bed: forced })
        );
    }

    #[test]
    fn stale_forced_bed_is_ignored() {
        let mut fx = Fixture::new();
        let ada = fx.agent("Ada");
        let forced = fx.bed(1);
        let other = fx.bed(1);
        fx.forced.set(ada, forced);
        fx.colony.bed_mut(forced).unwrap().medical = true;
        let mut claims = fx.manager();
        assert_eq!(claims.forced_bed(ada), None);
        assert!(claims.claim(ada, other, None));
    }

    #[test]
    fn claim_evicts_stranger() {
        let mut fx = Fixture::new();
        let ada = fx.agent("Ada");
        let cy = fx.agent("Cy");
        let bed = fx.bed(1);
        assert!(fx.manager().claim(cy, bed, None));
        assert!(fx.manager().claim(ada, bed, None));
        assert_eq!(fx.owners(bed), vec![ada]);
        assert_eq!(fx.colony.agent(cy).unwrap().owned_bed, None);
    }

    #[test]
    fn claim_without_eviction_needs_free_slot() {
        let mut fx = Fixture::new();
        let ada = fx.agent("Ada");
        let cy = fx.agent("Cy");
        let bed = fx.bed(1);
        let mut claims = fx.manager();
        assert!(claims.claim(cy, bed, None));
        assert_eq!(
            claims.try_claim(ada, bed, Eviction::None),
            Err(ClaimRejection::NoFreeSlot { agent: ada, bed })
        );
        assert_eq!(fx.owners(bed), vec![cy]);
    }

    #[test]
    fn forced_owner_cannot_be_evicted() {
        let mut fx = Fixture::new();
        let ada = fx.agent("Ada");
        let cy = fx.agent("Cy");
        let bed = fx.bed(1);
        fx.forced.set(cy, bed);
        assert!(fx.manager().claim(cy, bed, None));
        assert_eq!(
            fx.manager().try_claim(ada, bed, Eviction::MakeSpace { partner: None }),
            Err(ClaimRejection::NoFreeSlot { agent: ada, bed })
        );
        assert_eq!(fx.owners(bed), vec![cy]);
    }

    #[test]
    fn host_eviction_failure_is_swallowed() {
        let mut fx = Fixture::new();
        let ada = fx.agent("Ada");
        let cy = fx.agent("Cy");
        let dee = fx.agent("Dee");
        let bed = fx.bed(2);
        assert!(fx.manager().claim_without_eviction(cy, bed));
        assert!(fx.manager().claim_without_eviction(dee, bed));
        fx.colony.lock_owner(cy);
        // Cy's eviction fails, Dee's succeeds, so Ada still gets a slot.
        assert!(fx.manager().claim(ada, bed, None));
        assert_eq!(fx.owners(bed), vec![cy, ada]);
    }

    #[test]
    fn lovers_are_not_evicted() {
        let mut fx = Fixture::new();
        let ada = fx.agent("Ada");
        let bo = fx.agent("Bo");
        let bed = fx.bed(2);
        fx.colony.add_lovers(ada, bo, 50);
        assert!(fx.manager().claim(bo, bed, None));
        assert!(fx.manager().claim(ada, bed, None));
        assert_eq!(fx.owners(bed), vec![bo, ada]);
    }

    #[test]
    fn unwilling_partners_do_not_evict() {
        let mut fx = Fixture::new();
        let ada = fx.agent("Ada");
        let bo = fx.agent("Bo");
        let cy = fx.agent("Cy");
        let bed = fx.bed(1);
        fx.colony.add_lovers(ada, bo, 50);
        fx.colony.set_unwilling_to_share(ada, bo);
        assert!(fx.manager().claim(cy, bed, None));
        assert_eq!(
            fx.manager().make_space(ada, bed, Some(bo)),
            Err(ClaimRejection::UnwillingToShare { agent: ada, partner: bo })
        );
        assert_eq!(fx.owners(bed), vec![cy]);
    }

    #[test]
    fn partners_favourite_is_spared() {
        let mut fx = Fixture::new();
        let ada = fx.agent("Ada");
        let bo = fx.agent("Bo");
        let cy = fx.agent("Cy");
        let bed = fx.bed(3);
        fx.colony.add_lovers(bo, cy, 80);
        fx.colony.add_lovers(ada, bo, 20);
        assert!(fx.manager().claim(cy, bed, None));
        let evicted = fx.manager().make_space(ada, bed, Some(bo)).unwrap();
        assert!(evicted.is_empty());
        assert_eq!(fx.owners(bed), vec![cy]);
    }

    #[test]
    fn unclaim_requires_a_bed() {
        let mut fx = Fixture::new();
        let ada = fx.agent("Ada");
        assert_eq!(
            fx.manager().try_unclaim(ada),
            Err(ClaimRejection::NoBedOwned { agent: ada })
        );
    }

    #[test]
    fn unclaim_reports_host_failure() {
        let mut fx = Fixture::new();
        let ada = fx.agent("Ada");
        let bed = fx.bed(1);
        assert!(fx.manager().claim(ada, bed, None));
        fx.colony.lock_owner(ada);
        assert_eq!(
            fx.manager().try_unclaim(ada),
            Err(ClaimRejection::Host {
                source: ColonyError::OwnershipLocked(ada)
            })
        );
    }

    #[test]
    fn partner_must_share_map() {
        let mut fx = Fixture::new();
        let ada = fx.agent("Ada");
        let bo = fx
            .colony
            .add_agent(Agent::colonist("Bo", MapId::new()));
        fx.colony.add_lovers(ada, bo, 50);
        assert_eq!(fx.manager().most_liked_partner(ada), None);
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let mut fx = Fixture::new();
        let bed = fx.bed(2);
        let agents: Vec<AgentId> = ["Ada", "Bo", "Cy", "Dee"]
            .into_iter()
            .map(|name| fx.agent(name))
            .collect();
        for agent in &agents {
            let _ = fx.manager().claim_without_eviction(*agent, bed);
            assert!(fx.owners(bed).len() <= 2);
        }
        assert_eq!(fx.owners(bed).len(), 2);
    }
}
