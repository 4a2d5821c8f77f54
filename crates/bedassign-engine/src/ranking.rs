//! Deterministic ranking of the usable beds on a map.
//!
//! Order: room impressiveness (descending for [`RankOrder::BestFirst`],
//! ascending for [`RankOrder::WorstFirst`]), then rest effectiveness
//! descending, then comfort descending, then bed id ascending. The id
//! tie-break makes the order total, so repeated rankings of the same
//! colony always agree.

use std::cmp::Ordering;

use bedassign_types::{Bed, BedId, MapId, RankOrder};

use crate::colony::Colony;
use crate::eligibility;

/// Compare two beds under the ranking order. `Less` means `a` ranks first.
pub fn compare_beds(a: &Bed, b: &Bed, order: RankOrder) -> Ordering {
    let primary = match order {
        RankOrder::BestFirst => b.impressiveness.cmp(&a.impressiveness),
        RankOrder::WorstFirst => a.impressiveness.cmp(&b.impressiveness),
    };
    primary
        .then_with(|| b.rest_effectiveness.cmp(&a.rest_effectiveness))
        .then_with(|| b.comfort.cmp(&a.comfort))
        .then_with(|| a.id.cmp(&b.id))
}

/// Usable beds on `map`, ranked.
pub fn ranked_beds<C: Colony + ?Sized>(colony: &C, map: MapId, order: RankOrder) -> Vec<BedId> {
    let mut beds: Vec<&Bed> = colony
        .beds_on_map(map)
        .into_iter()
        .filter_map(|id| colony.bed(id))
        .filter(|bed| bed.map == map && eligibility::bed_record_is_usable(colony, bed))
        .collect();
    beds.sort_by(|a, b| compare_beds(a, b, order));
    beds.into_iter().map(|bed| bed.id).collect()
}
