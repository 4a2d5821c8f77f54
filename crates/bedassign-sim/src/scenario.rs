//! YAML scenario files and the tick loop that replays them.
//!
//! A scenario names its maps, beds, and agents by label; references
//! between records use those labels. [`Scenario::build`] resolves them into
//! a [`ColonyState`] plus the forced-bed store, and [`Simulation::run`]
//! evaluates the whole roster once per tick until nothing changes.
//!
//! ```yaml
//! maps: [Base]
//! beds:
//!   - { label: Double, map: Base, capacity: 2, impressiveness: 40 }
//! agents:
//!   - label: Ada
//!     map: Base
//!     thoughts:
//!       - { kind: WantToSleepWithPartner, mood_effect: -3 }
//!   - { label: Bo, map: Base }
//! lovers:
//!   - { between: [Ada, Bo], opinion: 80 }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use bedassign_engine::{
    AssignmentSettings, CascadeStep, Colony, ColonyState, ForcedBeds, evaluate_agents,
};
use bedassign_types::{
    Agent, AgentId, Bed, BedId, DesignationKind, Faction, MapId, Notification, ThoughtState,
    TraitKind,
};

use crate::error::ScenarioError;

// ---------------------------------------------------------------------------
// File format
// ---------------------------------------------------------------------------

/// A complete scenario file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Settings to use when no settings file overrides them.
    #[serde(default)]
    pub settings: Option<AssignmentSettings>,
    /// Custom impressiveness stage thresholds, ascending.
    #[serde(default)]
    pub stage_thresholds: Option<Vec<Decimal>>,
    /// Map labels.
    pub maps: Vec<String>,
    /// Beds to build.
    #[serde(default)]
    pub beds: Vec<BedSpec>,
    /// Agents in evaluation order.
    #[serde(default)]
    pub agents: Vec<AgentSpec>,
    /// Lover relationships.
    #[serde(default)]
    pub lovers: Vec<LoverSpec>,
    /// Pairs of agents who refuse to share a bed.
    #[serde(default)]
    pub unwilling_to_share: Vec<[String; 2]>,
    /// Beds an agent's ideology forbids.
    #[serde(default)]
    pub ideology_bans: Vec<IdeologyBanSpec>,
}

/// One bed.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BedSpec {
    /// Unique label.
    pub label: String,
    /// Map label.
    pub map: String,
    /// Sleeping slots.
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    /// Impressiveness of the surrounding room.
    pub impressiveness: Decimal,
    /// Rest effectiveness stat.
    #[serde(default = "default_rest")]
    pub rest_effectiveness: Decimal,
    /// Comfort stat.
    #[serde(default = "default_comfort")]
    pub comfort: Decimal,
    /// Whether this is a medical bed.
    #[serde(default)]
    pub medical: bool,
    /// Whether this bed is designated for colonists.
    #[serde(default = "default_true")]
    pub for_colonists: bool,
    /// Whether this bed is for humanlike sleepers.
    #[serde(default = "default_true")]
    pub humanlike: bool,
    /// Designations placed on the bed.
    #[serde(default)]
    pub designations: Vec<DesignationKind>,
}

/// One agent.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
#[allow(clippy::struct_excessive_bools)]
pub struct AgentSpec {
    /// Unique label.
    pub label: String,
    /// Map label, or none for an unspawned agent.
    #[serde(default)]
    pub map: Option<String>,
    /// Bed label the agent starts in.
    #[serde(default)]
    pub bed: Option<String>,
    /// Bed label the player forced the agent into.
    #[serde(default)]
    pub forced_bed: Option<String>,
    /// Faction.
    #[serde(default = "default_faction")]
    pub faction: Faction,
    /// Free colonist status.
    #[serde(default = "default_true")]
    pub free_colonist: bool,
    /// Slave status.
    #[serde(default)]
    pub enslaved: bool,
    /// Guest status.
    #[serde(default)]
    pub guest: bool,
    /// Humanlike body.
    #[serde(default = "default_true")]
    pub humanlike: bool,
    /// Whether the agent can own beds at all.
    #[serde(default = "default_true")]
    pub has_ownership: bool,
    /// Make the colony refuse to release this agent's bed.
    #[serde(default)]
    pub locked: bool,
    /// Personality traits.
    #[serde(default)]
    pub traits: BTreeSet<TraitKind>,
    /// Active mood thoughts.
    #[serde(default)]
    pub thoughts: Vec<ThoughtState>,
}

/// A lover relationship.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoverSpec {
    /// The two lovers.
    pub between: [String; 2],
    /// Opinion each holds of the other.
    #[serde(default = "default_opinion")]
    pub opinion: i32,
    /// The second lover's opinion of the first, if different.
    #[serde(default)]
    pub opinion_back: Option<i32>,
}

/// A bed an agent's ideology forbids.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdeologyBanSpec {
    /// Agent label.
    pub agent: String,
    /// Bed label.
    pub bed: String,
}

const fn default_capacity() -> u32 {
    1
}

const fn default_rest() -> Decimal {
    Decimal::ONE
}

const fn default_comfort() -> Decimal {
    Decimal::from_parts(75, 0, 0, false, 2)
}

const fn default_true() -> bool {
    true
}

const fn default_faction() -> Faction {
    Faction::Player
}

const fn default_opinion() -> i32 {
    50
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Scenario {
    /// Load a scenario from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ScenarioError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a scenario from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ScenarioError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Resolve labels and build the colony.
    pub fn build(&self) -> Result<Simulation, ScenarioError> {
        let mut colony = self
            .stage_thresholds
            .clone()
            .map_or_else(ColonyState::new, |t| ColonyState::new().with_stage_thresholds(t));

        let mut maps: BTreeMap<&str, MapId> = BTreeMap::new();
        for label in &self.maps {
            insert_unique(&mut maps, "map", label, MapId::new())?;
        }

        let mut beds: BTreeMap<&str, BedId> = BTreeMap::new();
        for spec in &self.beds {
            let map = lookup(&maps, "map", &spec.map)?;
            let mut bed = Bed::new(spec.label.clone(), map, spec.capacity, spec.impressiveness);
            bed.rest_effectiveness = spec.rest_effectiveness;
            bed.comfort = spec.comfort;
            bed.medical = spec.medical;
            bed.for_colonists = spec.for_colonists;
            bed.humanlike = spec.humanlike;
            insert_unique(&mut beds, "bed", &spec.label, bed.id)?;
            let id = colony.add_bed(bed);
            for kind in &spec.designations {
                colony.designate(id, *kind);
            }
        }

        let mut agents: BTreeMap<&str, AgentId> = BTreeMap::new();
        for spec in &self.agents {
            let map = spec
                .map
                .as_deref()
                .map(|label| lookup(&maps, "map", label))
                .transpose()?;
            let agent = Agent {
                id: AgentId::new(),
                label: spec.label.clone(),
                map,
                faction: spec.faction,
                free_colonist: spec.free_colonist,
                enslaved: spec.enslaved,
                guest: spec.guest,
                humanlike: spec.humanlike,
                has_ownership: spec.has_ownership,
                owned_bed: None,
                traits: spec.traits.clone(),
                thoughts: spec.thoughts.clone(),
            };
            insert_unique(&mut agents, "agent", &spec.label, agent.id)?;
            colony.add_agent(agent);
        }

        let mut forced = ForcedBeds::new();
        for spec in &self.agents {
            let agent = lookup(&agents, "agent", &spec.label)?;
            if let Some(label) = &spec.bed {
                let bed = lookup(&beds, "bed", label)?;
                colony
                    .assign_bed(agent, bed)
                    .map_err(|source| ScenarioError::Assignment {
                        agent: spec.label.clone(),
                        bed: label.clone(),
                        source,
                    })?;
            }
            if let Some(label) = &spec.forced_bed {
                forced.set(agent, lookup(&beds, "bed", label)?);
            }
            if spec.locked {
                colony.lock_owner(agent);
            }
        }

        for spec in &self.lovers {
            let [first, second] = &spec.between;
            let a = lookup(&agents, "agent", first)?;
            let b = lookup(&agents, "agent", second)?;
            colony.add_lovers(a, b, spec.opinion);
            if let Some(back) = spec.opinion_back {
                colony.set_opinion(b, a, back);
            }
        }
        for [first, second] in &self.unwilling_to_share {
            let a = lookup(&agents, "agent", first)?;
            let b = lookup(&agents, "agent", second)?;
            colony.set_unwilling_to_share(a, b);
        }
        for ban in &self.ideology_bans {
            let agent = lookup(&agents, "agent", &ban.agent)?;
            let bed = lookup(&beds, "bed", &ban.bed)?;
            colony.forbid_by_ideology(agent, bed);
        }

        info!(
            maps = maps.len(),
            beds = beds.len(),
            agents = agents.len(),
            forced = forced.len(),
            "Scenario built"
        );
        Ok(Simulation { colony, forced })
    }
}

fn insert_unique<'s, T>(
    index: &mut BTreeMap<&'s str, T>,
    kind: &'static str,
    label: &'s str,
    value: T,
) -> Result<(), ScenarioError> {
    if index.insert(label, value).is_some() {
        return Err(ScenarioError::DuplicateLabel {
            kind,
            label: label.to_owned(),
        });
    }
    Ok(())
}

fn lookup<T: Copy>(
    index: &BTreeMap<&str, T>,
    kind: &'static str,
    label: &str,
) -> Result<T, ScenarioError> {
    index
        .get(label)
        .copied()
        .ok_or_else(|| ScenarioError::UnknownLabel {
            kind,
            label: label.to_owned(),
        })
}

// ---------------------------------------------------------------------------
// Running
// ---------------------------------------------------------------------------

/// A built colony ready to be replayed.
#[derive(Debug, Clone)]
pub struct Simulation {
    /// The colony.
    pub colony: ColonyState,
    /// Player-forced beds.
    pub forced: ForcedBeds,
}

/// What happened over a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Ticks evaluated.
    pub ticks: u32,
    /// Whether the last tick changed nothing.
    pub settled: bool,
    /// How often each cascade step ended an evaluation.
    pub steps: BTreeMap<CascadeStep, u32>,
    /// Notification texts in the order they were raised.
    pub notifications: Vec<String>,
}

/// Final report printed by the runner.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Run statistics.
    pub summary: RunSummary,
    /// Owner labels per bed label.
    pub ownership: BTreeMap<String, Vec<String>>,
}

impl Simulation {
    /// Evaluate the roster once per tick, stopping early once a tick
    /// changes no ownership.
    pub fn run(&mut self, settings: &AssignmentSettings, max_ticks: u32) -> RunSummary {
        let mut summary = RunSummary::default();
        let roster = self.colony.roster().to_vec();
        for tick in 1..=max_ticks {
            let mut inbox: Vec<Notification> = Vec::new();
            let results =
                evaluate_agents(&mut self.colony, &self.forced, settings, &mut inbox, &roster);
            summary.ticks = tick;

            let mut mutated = false;
            for (_, step) in &results {
                let count = summary.steps.entry(*step).or_insert(0);
                *count = count.saturating_add(1);
                mutated |= step.mutated();
            }
            summary
                .notifications
                .extend(inbox.into_iter().map(|n| n.text));

            if !mutated {
                info!(tick, "Colony settled");
                summary.settled = true;
                break;
            }
            info!(tick, reassignments = results.len(), "Tick complete");
        }
        summary
    }

    /// Owner labels per bed label.
    pub fn ownership(&self) -> BTreeMap<String, Vec<String>> {
        self.colony
            .beds()
            .map(|bed| {
                let owners = bed
                    .owners
                    .iter()
                    .filter_map(|id| self.colony.agent(*id))
                    .map(|agent| agent.label.clone())
                    .collect();
                (bed.label.clone(), owners)
            })
            .collect()
    }

    /// Run and package the result with the final ownership.
    pub fn report(&mut self, settings: &AssignmentSettings, max_ticks: u32) -> RunReport {
        let summary = self.run(settings, max_ticks);
        RunReport {
            summary,
            ownership: self.ownership(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    const LOVERS: &str = r"
maps: [Base]
beds:
  - { label: Single A, map: Base, impressiveness: 30 }
  - { label: Single B, map: Base, impressiveness: 30 }
  - { label: Double, map: Base, capacity: 2, impressiveness: 10 }
agents:
  - label: Ada
    map: Base
    bed: Single A
    thoughts:
      - { kind: WantToSleepWithPartner, mood_effect: -3 }
  - { label: Bo, map: Base, bed: Single B }
lovers:
  - { between: [Ada, Bo], opinion: 80 }
";

    #[test]
    fn build_resolves_labels() {
        let scenario = Scenario::parse(LOVERS).unwrap();
        let sim = scenario.build().unwrap();
        assert_eq!(sim.colony.roster().len(), 2);
        let ada = sim.colony.roster()[0];
        let record = sim.colony.agent(ada).unwrap();
        assert_eq!(record.label, "Ada");
        assert!(record.owned_bed.is_some());
        assert_eq!(record.thoughts[0].mood_effect, dec!(-3));

        let ownership = sim.ownership();
        assert_eq!(ownership["Single A"], vec!["Ada".to_owned()]);
        assert!(ownership["Double"].is_empty());
    }

    #[test]
    fn lovers_end_up_together_and_settle() {
        let scenario = Scenario::parse(LOVERS).unwrap();
        let mut sim = scenario.build().unwrap();
        let settings = AssignmentSettings {
            claim_better_beds: false,
            ..AssignmentSettings::default()
        };
        let report = sim.report(&settings, 5);

        assert!(report.summary.settled);
        assert_eq!(report.summary.ticks, 2);
        assert_eq!(
            report.summary.steps.get(&CascadeStep::SharedBedWithPartner),
            Some(&1)
        );
        assert_eq!(
            report.ownership["Double"],
            vec!["Ada".to_owned(), "Bo".to_owned()]
        );
        assert_eq!(
            report.summary.notifications,
            vec!["Lovers Ada and Bo claimed an empty bed together.".to_owned()]
        );
    }

    #[test]
    fn forced_beds_and_bans_are_applied() {
        let yaml = r"
maps: [Base]
beds:
  - { label: Cot, map: Base, impressiveness: 5 }
  - { label: Royal, map: Base, impressiveness: 90 }
agents:
  - { label: Ada, map: Base, forced_bed: Cot }
  - { label: Bo, map: Base }
ideology_bans:
  - { agent: Bo, bed: Royal }
";
        let mut sim = Scenario::parse(yaml).unwrap().build().unwrap();
        let report = sim.report(&AssignmentSettings::default(), 3);

        assert_eq!(report.ownership["Cot"], vec!["Ada".to_owned()]);
        assert!(report.ownership["Royal"].is_empty());
        assert_eq!(
            report.summary.steps.get(&CascadeStep::ForcedBedClaimed),
            Some(&1)
        );
    }

    #[test]
    fn unknown_labels_are_reported() {
        let yaml = r"
maps: [Base]
agents:
  - { label: Ada, map: Base, bed: Nowhere }
";
        let err = Scenario::parse(yaml).unwrap().build().unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::UnknownLabel { kind: "bed", ref label } if label == "Nowhere"
        ));
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let yaml = r"
maps: [Base, Base]
";
        let err = Scenario::parse(yaml).unwrap().build().unwrap_err();
        assert!(matches!(err, ScenarioError::DuplicateLabel { kind: "map", .. }));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let yaml = r"
maps: [Base]
colonists: []
";
        assert!(matches!(
            Scenario::parse(yaml),
            Err(ScenarioError::Yaml { .. })
        ));
    }

    #[test]
    fn bundled_scenario_settles() {
        let scenario = Scenario::parse(include_str!("../scenarios/colony.yaml")).unwrap();
        let mut sim = scenario.build().unwrap();
        let settings = scenario.settings.unwrap_or_default();
        let report = sim.report(&settings, 10);
        assert!(report.summary.settled);
        assert_eq!(report.summary.ticks, 2);

        let owners = |bed: &str| report.ownership[bed].clone();
        assert_eq!(owners("Royal bed"), vec!["Marta"]);
        assert_eq!(owners("Sleeping spot"), vec!["Oskar"]);
        assert_eq!(owners("Barracks double"), vec!["Lena", "Tomas"]);
        assert_eq!(owners("Barracks cot A"), vec!["Greta"]);
        assert!(owners("Bedroom bed").is_empty());
    }
}
