//! The per-agent reassignment cascade.
//!
//! [`BedAssigner::evaluate`] walks a fixed sequence of branches and stops
//! at the first one that changes ownership:
//!
//! 1. forced bed
//! 2. jealous, greedy, and ascetic mood-penalty searches
//! 3. plain upgrade to a better empty bed
//! 4. moving in with a lover
//! 5. giving up a shared bed
//!
//! Every branch is gated by its [`AssignmentSettings`] toggle and, for the
//! mood branches, by the agent actually suffering the matching thought.
//! Agents are evaluated greedily and independently, so the order in which
//! the caller evaluates them decides who gets a contested bed first.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use bedassign_types::{
    AgentId, Bed, BedId, Faction, MapId, Notification, RankOrder, ThoughtKind, ThoughtState,
    TraitKind,
};

use crate::claims::ClaimManager;
use crate::colony::Colony;
use crate::forced::ForcedBeds;
use crate::notify::NotificationSink;
use crate::ranking;
use crate::search::{self, SearchEviction, SearchRequest};
use crate::settings::AssignmentSettings;

const JEALOUS_SHIELD: &[TraitKind] = &[TraitKind::Jealous];
const GREEDY_SHIELD: &[TraitKind] = &[TraitKind::Jealous, TraitKind::Greedy];
const ASCETIC_SHIELD: &[TraitKind] = &[TraitKind::Ascetic];
const UPGRADE_SHIELD: &[TraitKind] = &[TraitKind::Jealous, TraitKind::Greedy];
const PARTNER_KICK_SHIELD: &[TraitKind] = &[TraitKind::Jealous, TraitKind::Greedy];
const EVICT: SearchEviction = SearchEviction::EvictOwners;

/// A jealous agent tolerates a room only this much less impressive than
/// their best-housed colonist's, as a fraction of the room's own score.
const JEALOUSY_MARGIN: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// The branch that ended an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeStep {
    /// The agent already holds their forced bed.
    ForcedBedRetained,
    /// The agent claimed their forced bed.
    ForcedBedClaimed,
    /// Moved to a bed no colonist's room outshines.
    AvoidedJealousPenalty,
    /// Moved to a more impressive bed.
    AvoidedGreedyPenalty,
    /// Moved to a less impressive bed.
    AvoidedAsceticPenalty,
    /// Moved to a better bed with free slots.
    ClaimedBetterBed,
    /// Moved into a lover's existing bed.
    JoinedPartnerBed,
    /// Claimed a bed together with a mutual lover.
    SharedBedWithPartner,
    /// Gave up a bed shared with a non-lover.
    AvoidedSharingPenalty,
}

impl CascadeStep {
    /// Whether the step changed bed ownership.
    pub const fn mutated(self) -> bool {
        !matches!(self, Self::ForcedBedRetained)
    }
}

/// The agent's top lover, as seen at the start of an evaluation.
struct Lover {
    id: AgentId,
    label: String,
    mutual: bool,
}

/// Everything an evaluation needs to know about the agent up front.
struct Subject {
    agent: AgentId,
    label: String,
    map: MapId,
    current: Option<BedId>,
    thoughts: Vec<ThoughtState>,
    lover: Option<Lover>,
}

impl Subject {
    fn partner(&self) -> Option<AgentId> {
        self.lover.as_ref().filter(|l| l.mutual).map(|l| l.id)
    }

    fn partner_label(&self) -> Option<&str> {
        self.lover
            .as_ref()
            .filter(|l| l.mutual)
            .map(|l| l.label.as_str())
    }

    fn suffering(&self, kind: ThoughtKind) -> Option<&ThoughtState> {
        self.thoughts
            .iter()
            .find(|t| t.kind == kind && t.is_suffering())
    }

    fn involved(&self) -> Vec<AgentId> {
        let mut agents = vec![self.agent];
        agents.extend(self.partner());
        agents
    }
}

/// Runs the reassignment cascade for one agent at a time.
pub struct BedAssigner<'a, C: Colony + ?Sized> {
    claims: ClaimManager<'a, C>,
    settings: &'a AssignmentSettings,
    sink: &'a mut dyn NotificationSink,
}

impl<'a, C: Colony + ?Sized> BedAssigner<'a, C> {
    /// Borrow the colony and the injected collaborators for a batch of
    /// evaluations.
    pub const fn new(
        colony: &'a mut C,
        forced: &'a ForcedBeds,
        settings: &'a AssignmentSettings,
        sink: &'a mut dyn NotificationSink,
    ) -> Self {
        Self {
            claims: ClaimManager::new(colony, forced),
            settings,
            sink,
        }
    }

    /// Read-only view of the colony.
    pub fn colony(&self) -> &C {
        self.claims.colony()
    }

    /// Evaluate one agent. Returns the branch that ended the cascade, or
    /// `None` when nothing changed.
    pub fn evaluate(&mut self, agent: AgentId) -> Option<CascadeStep> {
        if !self.claims.is_agent_usable(agent) {
            debug!(%agent, "Agent is not eligible for reassignment");
            return None;
        }

        if let Some(step) = self.keep_forced_bed(agent) {
            return Some(step);
        }

        let subject = self.subject(agent)?;
        let mut best_first = None;

        if self.settings.avoid_jealous_penalty && subject.suffering(ThoughtKind::Jealous).is_some()
        {
            let ranked = self.best_first(&mut best_first, subject.map);
            if let Some(step) = self.avoid_jealous_penalty(&subject, &ranked) {
                return Some(step);
            }
        }
        if self.settings.avoid_greedy_penalty {
            if let Some(thought) = subject.suffering(ThoughtKind::Greedy).cloned() {
                let ranked = self.best_first(&mut best_first, subject.map);
                if let Some(step) = self.avoid_greedy_penalty(&subject, &ranked, thought) {
                    return Some(step);
                }
            }
        }
        if self.settings.avoid_ascetic_penalty {
            if let Some(thought) = subject.suffering(ThoughtKind::Ascetic).cloned() {
                if let Some(step) = self.avoid_ascetic_penalty(&subject, thought) {
                    return Some(step);
                }
            }
        }
        if self.settings.claim_better_beds {
            let ranked = self.best_first(&mut best_first, subject.map);
            if let Some(step) = self.claim_better_bed(&subject, &ranked) {
                return Some(step);
            }
        }
        if self.settings.avoid_partner_penalty
            && subject.suffering(ThoughtKind::WantToSleepWithPartner).is_some()
        {
            if let Some(step) = self.avoid_partner_penalty(&subject, &mut best_first) {
                return Some(step);
            }
        }
        if self.settings.avoid_sharing_penalty
            && subject.suffering(ThoughtKind::SharedBed).is_some()
        {
            if let Some(step) = self.avoid_sharing_penalty(&subject) {
                return Some(step);
            }
        }

        debug!(%agent, "No reassignment");
        None
    }

    fn keep_forced_bed(&mut self, agent: AgentId) -> Option<CascadeStep> {
        let forced = self.claims.forced_bed(agent)?;
        let held = self.colony().agent(agent).and_then(|a| a.owned_bed);
        if held == Some(forced) {
            debug!(%agent, bed = %forced, "Already holding forced bed");
            return Some(CascadeStep::ForcedBedRetained);
        }
        if !self.claims.claim(agent, forced, None) {
            return None;
        }
        let label = self.label(agent);
        self.notify(
            format!("{label} claimed their forced bed."),
            vec![agent],
            vec![forced],
        );
        Some(CascadeStep::ForcedBedClaimed)
    }

    fn subject(&self, agent: AgentId) -> Option<Subject> {
        let record = self.colony().agent(agent)?;
        let map = record.map?;
        let lover = self.claims.most_liked_partner(agent).map(|id| Lover {
            id,
            label: self.label(id),
            mutual: self.claims.most_liked_partner(id) == Some(agent),
        });
        Some(Subject {
            agent,
            label: record.label.clone(),
            map,
            current: record.owned_bed,
            thoughts: record.thoughts.clone(),
            lover,
        })
    }

    fn best_first(&self, cache: &mut Option<Vec<BedId>>, map: MapId) -> Vec<BedId> {
        cache
            .get_or_insert_with(|| ranking::ranked_beds(self.colony(), map, RankOrder::BestFirst))
            .clone()
    }

    // -----------------------------------------------------------------------
    // Mood-penalty searches
    // -----------------------------------------------------------------------

    fn avoid_jealous_penalty(
        &mut self,
        subject: &Subject,
        ranked: &[BedId],
    ) -> Option<CascadeStep> {
        let ceiling = self.best_owned_impressiveness(subject.map);
        let qualifies = move |_: &C, bed: &Bed| jealousy_tolerates(ceiling, bed.impressiveness);
        let bed = self.search(subject, ranked, &qualifies, JEALOUS_SHIELD, EVICT)?;
        let text = better_bed_text(subject, ThoughtKind::Jealous);
        self.notify(text, subject.involved(), vec![bed]);
        Some(CascadeStep::AvoidedJealousPenalty)
    }

    fn avoid_greedy_penalty(
        &mut self,
        subject: &Subject,
        ranked: &[BedId],
        thought: ThoughtState,
    ) -> Option<CascadeStep> {
        let qualifies = move |colony: &C, bed: &Bed| stage_improves(colony, &thought, bed);
        let bed = self.search(subject, ranked, &qualifies, GREEDY_SHIELD, EVICT)?;
        let text = better_bed_text(subject, ThoughtKind::Greedy);
        self.notify(text, subject.involved(), vec![bed]);
        Some(CascadeStep::AvoidedGreedyPenalty)
    }

    fn avoid_ascetic_penalty(
        &mut self,
        subject: &Subject,
        thought: ThoughtState,
    ) -> Option<CascadeStep> {
        if let Some(partner) = subject.partner() {
            let shares_penalty = self
                .colony()
                .agent(partner)
                .is_some_and(|p| p.thought(ThoughtKind::Ascetic).is_some());
            if !shares_penalty {
                debug!(agent = %subject.agent, %partner, "Partner is not ascetic; skipping");
                return None;
            }
        }
        let ranked = ranking::ranked_beds(self.colony(), subject.map, RankOrder::WorstFirst);
        let qualifies = move |colony: &C, bed: &Bed| stage_improves(colony, &thought, bed);
        let bed = self.search(subject, &ranked, &qualifies, ASCETIC_SHIELD, EVICT)?;
        let penalty = ThoughtKind::Ascetic.label();
        let text = subject.partner_label().map_or_else(
            || {
                format!(
                    "{} claimed a worse bed to avoid the {penalty} mood penalty.",
                    subject.label
                )
            },
            |partner| {
                format!(
                    "Lovers {} and {partner} claimed a worse bed together so they could both \
                     avoid the {penalty} mood penalty.",
                    subject.label
                )
            },
        );
        self.notify(text, subject.involved(), vec![bed]);
        Some(CascadeStep::AvoidedAsceticPenalty)
    }

    fn claim_better_bed(&mut self, subject: &Subject, ranked: &[BedId]) -> Option<CascadeStep> {
        if self.is_third_wheel(subject) {
            debug!(agent = %subject.agent, "Lover shares a larger bed; not upgrading");
            return None;
        }
        let bed = self.search(
            subject,
            ranked,
            &|_: &C, _: &Bed| true,
            UPGRADE_SHIELD,
            SearchEviction::FreeSlotsOnly,
        )?;
        let text = subject.partner_label().map_or_else(
            || format!("{} claimed a better empty bed.", subject.label),
            |partner| {
                format!(
                    "Lovers {} and {partner} claimed a better empty bed together.",
                    subject.label
                )
            },
        );
        self.notify(text, subject.involved(), vec![bed]);
        Some(CascadeStep::ClaimedBetterBed)
    }

    /// No mutual partner, while the one-sided lover sleeps in a bed with
    /// room for more than two.
    fn is_third_wheel(&self, subject: &Subject) -> bool {
        let Some(lover) = subject.lover.as_ref().filter(|l| !l.mutual) else {
            return false;
        };
        let colony = self.colony();
        colony
            .agent(lover.id)
            .and_then(|a| a.owned_bed)
            .and_then(|bed| colony.bed(bed))
            .is_some_and(|bed| bed.capacity > 2)
    }

    fn search(
        &mut self,
        subject: &Subject,
        ranked: &[BedId],
        qualifies: &dyn Fn(&C, &Bed) -> bool,
        shield: &[TraitKind],
        eviction: SearchEviction,
    ) -> Option<BedId> {
        search::better_bed_search(
            &mut self.claims,
            &SearchRequest {
                ranked,
                current: subject.current,
                agent: subject.agent,
                partner: subject.partner(),
                qualifies,
                excluded_owner_traits: shield,
                eviction,
            },
        )
    }

    /// Highest impressiveness of any room owned by a player colonist on the
    /// map, counting colonists without a bed as zero.
    fn best_owned_impressiveness(&self, map: MapId) -> Option<Decimal> {
        let colony = self.colony();
        colony
            .agents_on_map(map)
            .into_iter()
            .filter(|id| {
                colony.agent(*id).is_some_and(|a| {
                    a.faction == Faction::Player
                        && !a.guest
                        && a.humanlike
                        && a.has_ownership
                })
            })
            .map(|id| colony.owned_room_impressiveness(id))
            .max()
    }

    // -----------------------------------------------------------------------
    // Lovers
    // -----------------------------------------------------------------------

    fn avoid_partner_penalty(
        &mut self,
        subject: &Subject,
        best_first: &mut Option<Vec<BedId>>,
    ) -> Option<CascadeStep> {
        let lover = subject.lover.as_ref()?;
        let lover_bed = self.colony().agent(lover.id).and_then(|a| a.owned_bed);

        if !lover.mutual {
            let bed = lover_bed.filter(|bed| subject.current != Some(*bed))?;
            if !self.claims.claim_without_eviction(subject.agent, bed) {
                return None;
            }
            self.notify(
                format!(
                    "{} claimed the bed of their polyamorous lover {}.",
                    subject.label, lover.label
                ),
                vec![subject.agent, lover.id],
                vec![bed],
            );
            return Some(CascadeStep::JoinedPartnerBed);
        }

        if lover_bed.is_some() && lover_bed == subject.current {
            debug!(agent = %subject.agent, partner = %lover.id, "Already sharing a bed");
            return None;
        }
        if let Some(bed) = lover_bed {
            let roomy = self.colony().bed(bed).is_some_and(|b| b.capacity >= 2);
            if roomy && self.claims.claim(subject.agent, bed, Some(lover.id)) {
                self.notify(
                    format!("{} claimed the bed of their lover {}.", subject.label, lover.label),
                    vec![subject.agent, lover.id],
                    vec![bed],
                );
                return Some(CascadeStep::JoinedPartnerBed);
            }
        }

        let ranked = self.best_first(best_first, subject.map);
        self.share_bed_with_partner(subject, lover, &ranked)
    }

    fn share_bed_with_partner(
        &mut self,
        subject: &Subject,
        lover: &Lover,
        ranked: &[BedId],
    ) -> Option<CascadeStep> {
        let (agent, partner) = (subject.agent, lover.id);
        for &bed in ranked {
            let Some(kicked) = self.clear_bed_for_pair(agent, partner, bed) else {
                continue;
            };

            let agent_in =
                subject.current == Some(bed) || self.claims.claim_without_eviction(agent, bed);
            let partner_in = agent_in
                && (self.colony().bed(bed).is_some_and(|b| b.is_owned_by(partner))
                    || self.claims.claim_without_eviction(partner, bed));
            if partner_in {
                let text = if kicked.is_empty() {
                    format!(
                        "Lovers {} and {} claimed an empty bed together.",
                        subject.label, lover.label
                    )
                } else {
                    let names: Vec<String> = kicked.iter().map(|id| self.label(*id)).collect();
                    format!(
                        "Lovers {} and {} kicked {} out of their bed so they could claim it \
                         together.",
                        subject.label,
                        lover.label,
                        names.join(" and ")
                    )
                };
                let mut agents = vec![agent, partner];
                agents.extend(kicked);
                self.notify(text, agents, vec![bed]);
                return Some(CascadeStep::SharedBedWithPartner);
            }

            debug!(%agent, %partner, %bed, "Joint claim failed; rolling back");
            if agent_in && subject.current != Some(bed) {
                search::roll_back(&mut self.claims, agent, subject.current);
            }
            self.restore_owners(bed, &kicked);
        }
        None
    }

    /// Evict whoever stands between the pair and `bed`.
    ///
    /// Returns the evicted owners, or `None` when the bed cannot be cleared;
    /// in that case anyone already evicted is put back.
    fn clear_bed_for_pair(
        &mut self,
        agent: AgentId,
        partner: AgentId,
        bed: BedId,
    ) -> Option<Vec<AgentId>> {
        let colony = self.colony();
        let record = colony.bed(bed)?;
        if record.capacity < 2
            || !colony.can_use_bed_ever(agent, bed)
            || !colony.can_use_bed_ever(partner, bed)
        {
            return None;
        }
        let capacity = record.capacity;
        let sleepers: Vec<AgentId> = record
            .owners
            .iter()
            .copied()
            .filter(|o| *o != agent && *o != partner && self.claims.is_agent_usable(*o))
            .collect();
        let shielded = sleepers.iter().any(|o| {
            colony
                .agent(*o)
                .is_some_and(|a| a.has_any_trait(PARTNER_KICK_SHIELD))
        });
        if shielded {
            debug!(%bed, "Bed has an owner who will not be moved");
            return None;
        }

        let mut kicked = Vec::new();
        for sleeper in sleepers {
            match self.claims.most_liked_partner(sleeper) {
                Some(theirs) if (theirs == agent || theirs == partner) && capacity >= 3 => {}
                None if self.claims.unclaim(sleeper) => kicked.push(sleeper),
                _ => {
                    debug!(%sleeper, %bed, "Owner cannot be moved out; abandoning bed");
                    self.restore_owners(bed, &kicked);
                    return None;
                }
            }
        }
        Some(kicked)
    }

    fn restore_owners(&mut self, bed: BedId, owners: &[AgentId]) {
        for &owner in owners {
            if !self.claims.claim_without_eviction(owner, bed) {
                debug!(%owner, %bed, "Could not restore evicted owner");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Sharing
    // -----------------------------------------------------------------------

    fn avoid_sharing_penalty(&mut self, subject: &Subject) -> Option<CascadeStep> {
        let current = subject.current?;
        let with_lover = subject.lover.as_ref().is_some_and(|lover| {
            self.colony()
                .bed(current)
                .is_some_and(|bed| bed.is_owned_by(lover.id))
        });
        if with_lover {
            return None;
        }
        if !self.claims.unclaim(subject.agent) {
            return None;
        }
        self.notify(
            format!(
                "{} unclaimed their bed to avoid the bed sharing mood penalty.",
                subject.label
            ),
            vec![subject.agent],
            vec![current],
        );
        Some(CascadeStep::AvoidedSharingPenalty)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn label(&self, agent: AgentId) -> String {
        self.colony()
            .agent(agent)
            .map_or_else(|| agent.to_string(), |a| a.label.clone())
    }

    fn notify(&mut self, text: String, agents: Vec<AgentId>, beds: Vec<BedId>) {
        info!(agents = agents.len(), "{text}");
        if self.settings.output_reassignment_messages {
            self.sink.notify(Notification { text, agents, beds });
        }
    }
}

/// Notification for a move up the ranking that removes `penalty`.
fn better_bed_text(subject: &Subject, penalty: ThoughtKind) -> String {
    let penalty = penalty.label();
    subject.partner_label().map_or_else(
        || {
            format!(
                "{} claimed a better bed to avoid the {penalty} mood penalty.",
                subject.label
            )
        },
        |partner| {
            format!(
                "Lovers {a} and {partner} claimed a better bed together so {a} could avoid \
                 the {penalty} mood penalty.",
                a = subject.label
            )
        },
    )
}

/// Whether a jealous agent would accept a room scoring `candidate` while
/// the best-housed colonist's room scores `ceiling`.
fn jealousy_tolerates(ceiling: Option<Decimal>, candidate: Decimal) -> bool {
    let Some(ceiling) = ceiling else {
        return true;
    };
    let margin = candidate
        .checked_mul(JEALOUSY_MARGIN)
        .map_or(Decimal::MAX, |m| m.abs());
    ceiling
        .checked_sub(candidate)
        .is_none_or(|gap| gap < margin)
}

/// Whether the thought's effect one stage above the bed's impressiveness
/// stage beats its current effect.
fn stage_improves<C: Colony + ?Sized>(colony: &C, thought: &ThoughtState, bed: &Bed) -> bool {
    let stage = colony
        .impressiveness_stage(bed.impressiveness)
        .saturating_add(1);
    thought.stage_effect(stage) > thought.mood_effect
}

/// Evaluate `agents` in order against one colony, returning the step each
/// agent ended on.
pub fn evaluate_agents<C: Colony + ?Sized>(
    colony: &mut C,
    forced: &ForcedBeds,
    settings: &AssignmentSettings,
    sink: &mut dyn NotificationSink,
    agents: &[AgentId],
) -> Vec<(AgentId, CascadeStep)> {
    let mut assigner = BedAssigner::new(colony, forced, settings, sink);
    agents
        .iter()
        .filter_map(|&agent| assigner.evaluate(agent).map(|step| (agent, step)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn jealousy_margin_is_ten_percent() {
        assert_eq!(JEALOUSY_MARGIN, dec!(0.1));
    }

    #[test]
    fn jealousy_tolerance() {
        assert!(jealousy_tolerates(None, dec!(0)));
        assert!(jealousy_tolerates(Some(dec!(100)), dec!(100)));
        assert!(jealousy_tolerates(Some(dec!(104)), dec!(100)));
        assert!(!jealousy_tolerates(Some(dec!(110)), dec!(100)));
        assert!(!jealousy_tolerates(Some(dec!(0)), dec!(0)));
    }

    #[test]
    fn only_retained_forced_bed_is_not_a_mutation() {
        assert!(!CascadeStep::ForcedBedRetained.mutated());
        assert!(CascadeStep::ForcedBedClaimed.mutated());
        assert!(CascadeStep::AvoidedSharingPenalty.mutated());
    }
}
