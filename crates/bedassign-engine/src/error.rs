//! Error types for the `bedassign-engine` crate.
//!
//! Nothing in this crate is fatal. [`ClaimRejection`] names every policy
//! reason a claim or unclaim can be refused; [`ColonyError`] is what a
//! host reports when one of its own mutations fails.

use bedassign_types::{AgentId, BedId};

/// Errors reported by a [`Colony`](crate::colony::Colony) host when an
/// ownership mutation cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColonyError {
    /// The agent is not known to the host.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// The bed is not known to the host.
    #[error("bed not found: {0}")]
    BedNotFound(BedId),

    /// Every sleeping slot of the bed is already owned.
    #[error("bed {bed} is full ({capacity} owners)")]
    BedFull {
        /// The full bed.
        bed: BedId,
        /// Its capacity.
        capacity: u32,
    },

    /// The host refuses to change this agent's ownership.
    #[error("ownership of agent {0} is locked by the host")]
    OwnershipLocked(AgentId),
}

/// Reasons a claim, unclaim, or eviction was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimRejection {
    /// The agent fails the hard eligibility predicate.
    #[error("agent {agent} cannot be reassigned")]
    AgentUnusable {
        /// The rejected agent.
        agent: AgentId,
    },

    /// The bed fails the hard eligibility predicate.
    #[error("bed {bed} cannot be used")]
    BedUnusable {
        /// The rejected bed.
        bed: BedId,
    },

    /// The agent and the bed are on different maps.
    #[error("bed {bed} is not on the same map as agent {agent}")]
    MapMismatch {
        /// The claiming agent.
        agent: AgentId,
        /// The requested bed.
        bed: BedId,
    },

    /// The agent already owns the bed.
    #[error("agent {agent} already owns bed {bed}")]
    AlreadyOwned {
        /// The claiming agent.
        agent: AgentId,
        /// The bed already owned.
        bed: BedId,
    },

    /// The agent has a valid forced bed and asked for a different one.
    #[error("bed {requested} is not agent {agent}'s forced bed {forced}")]
    ForcedBedConflict {
        /// The claiming agent.
        agent: AgentId,
        /// The agent's forced bed.
        forced: BedId,
        /// The bed that was requested instead.
        requested: BedId,
    },

    /// The agent's ideology forbids using the bed.
    #[error("agent {agent}'s ideology forbids bed {bed}")]
    IdeologyForbids {
        /// The claiming agent.
        agent: AgentId,
        /// The forbidden bed.
        bed: BedId,
    },

    /// No sleeping slot could be freed for the agent.
    #[error("unable to make room for agent {agent} in bed {bed}")]
    NoFreeSlot {
        /// The claiming agent.
        agent: AgentId,
        /// The full bed.
        bed: BedId,
    },

    /// The agent owns no bed to give up.
    #[error("agent {agent} owns no bed")]
    NoBedOwned {
        /// The agent.
        agent: AgentId,
    },

    /// The bed is the agent's valid forced bed and may not be dropped.
    #[error("agent {agent} cannot give up forced bed {bed}")]
    ForcedBedProtected {
        /// The agent.
        agent: AgentId,
        /// The protected bed.
        bed: BedId,
    },

    /// The agent and the partner they are moving with won't share a bed.
    #[error("agent {agent} and partner {partner} are not willing to share a bed")]
    UnwillingToShare {
        /// The claiming agent.
        agent: AgentId,
        /// The partner.
        partner: AgentId,
    },

    /// The host failed to apply the ownership change.
    #[error("host rejected ownership change: {source}")]
    Host {
        /// The underlying host error.
        #[from]
        source: ColonyError,
    },
}
