//! Slot forcing: pin constraint classes into flexible slots so the
//! cartesian search is guaranteed to contain them.

use crate::domain::model::{groups, ClassName, Constraints, Slot};
use std::collections::{BTreeMap, BTreeSet};

pub type ForcedSlots = BTreeMap<usize, BTreeSet<ClassName>>;

fn indices_in_order(slots: &[Slot], order: &[Slot], skip: &[Slot]) -> Vec<usize> {
    let mut indices: Vec<usize> = order
        .iter()
        .flat_map(|want| {
            slots
                .iter()
                .enumerate()
                .filter(move |(_, s)| *s == want)
                .map(|(i, _)| i)
        })
        .collect();
    indices.extend(
        slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !order.contains(s) && !skip.contains(s))
            .map(|(i, _)| i),
    );
    indices
}

/// Slots that may be replaced to satisfy a constraint. Tanks never flex;
/// in hardcore only dps slots do.
pub fn flex_slot_indices(slots: &[Slot], hardcore: bool) -> Vec<usize> {
    if hardcore {
        return slots
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == Slot::Dps)
            .map(|(i, _)| i)
            .collect();
    }
    if slots == [Slot::CharmTank, Slot::Healer, Slot::Dps] {
        return vec![2, 1];
    }
    const ORDER: [Slot; 10] = [
        Slot::Healer,
        Slot::Slow,
        Slot::Cc,
        Slot::Dps,
        Slot::PetPartner,
        Slot::CharmPartner,
        Slot::KitePartnerSwarm,
        Slot::KitePartnerFearSnare,
        Slot::KitePartner,
        Slot::Support,
    ];
    indices_in_order(slots, &ORDER, &[Slot::Tank, Slot::CharmTank])
}

/// Ports and run speed are only filtered, never forced, so a Cleric or a tank
/// is not displaced when a Shaman, Bard or Druid already covers them.
pub fn requirement_sets(
    available: &BTreeSet<ClassName>,
    constraints: &Constraints,
    already_satisfied: &BTreeSet<ClassName>,
) -> Vec<BTreeSet<ClassName>> {
    let satisfied = |group: &[&str]| already_satisfied.iter().any(|c| groups::contains(group, c));
    let pool = |group: &[&str]| -> BTreeSet<ClassName> {
        available
            .iter()
            .filter(|c| groups::contains(group, c))
            .cloned()
            .collect()
    };

    let mut reqs = Vec::new();
    if constraints.charm && !satisfied(groups::CHARMERS) {
        reqs.push(pool(groups::CHARMERS));
    }
    if constraints.pet_heavy && !satisfied(groups::PET_DPS) {
        reqs.push(pool(groups::PET_DPS));
    }
    if constraints.kiting && !satisfied(groups::KITERS) {
        reqs.push(pool(groups::KITERS));
    }
    reqs.retain(|r| !r.is_empty());
    reqs
}

fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    fn walk(start: usize, n: usize, k: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in start..n {
            current.push(i);
            walk(i + 1, n, k, current, out);
            current.pop();
        }
    }
    let mut out = Vec::new();
    if k <= n {
        walk(0, n, k, &mut Vec::with_capacity(k), &mut out);
    }
    out
}

/// The largest group of requirements (up to three) that one class can satisfy
/// together. Among equally large groups, the narrowest pool wins.
pub fn best_intersection_group(reqs: &[BTreeSet<ClassName>]) -> (BTreeSet<ClassName>, Vec<usize>) {
    let mut best_pool = BTreeSet::new();
    let mut best_idxs: Vec<usize> = Vec::new();

    for k in [3, 2, 1] {
        for idxs in combinations(reqs.len(), k) {
            let mut inter = reqs[idxs[0]].clone();
            for j in &idxs[1..] {
                inter.retain(|c| reqs[*j].contains(c));
            }
            if inter.is_empty() {
                continue;
            }
            let narrower = !best_idxs.is_empty() && inter.len() < best_pool.len();
            if idxs.len() > best_idxs.len() || narrower {
                best_pool = inter;
                best_idxs = idxs;
            }
        }
        if !best_idxs.is_empty() {
            return (best_pool, best_idxs);
        }
    }
    (best_pool, best_idxs)
}

pub fn force_constraints_into_slots(
    slots: &[Slot],
    available: &BTreeSet<ClassName>,
    constraints: &Constraints,
    already_satisfied: &BTreeSet<ClassName>,
    hardcore: bool,
) -> ForcedSlots {
    let mut reqs = requirement_sets(available, constraints, already_satisfied);
    let mut forced = ForcedSlots::new();
    if reqs.is_empty() {
        return forced;
    }

    let slot_order = flex_slot_indices(slots, hardcore);
    let mut cursor = 0;
    while !reqs.is_empty() && cursor < slot_order.len() {
        let (pool, idxs) = best_intersection_group(&reqs);
        if idxs.is_empty() || pool.is_empty() {
            break;
        }
        forced.insert(slot_order[cursor], pool);
        cursor += 1;
        for i in idxs.into_iter().rev() {
            reqs.remove(i);
        }
    }

    tracing::debug!(forced = forced.len(), "constraint slots forced");
    forced
}

/// Where a must-include class should be added when no slot pool offers it.
pub fn best_slot_for_must_include(
    class: &str,
    slots: &[Slot],
    excluded: &BTreeSet<usize>,
) -> usize {
    let preferred: &[Slot] = if groups::contains(groups::TANKS, class) {
        &[Slot::Tank]
    } else if groups::contains(groups::HEALERS, class) {
        &[Slot::Healer]
    } else if groups::contains(groups::PET_TANKERS, class) {
        &[Slot::PetTank, Slot::PetPartner, Slot::Dps]
    } else if groups::contains(groups::SLOWERS, class) {
        &[Slot::Slow, Slot::Cc, Slot::Dps]
    } else if groups::contains(groups::CCERS, class) {
        &[Slot::Cc, Slot::Dps]
    } else if groups::contains(groups::CHARMERS, class) {
        &[Slot::CharmTank, Slot::Cc, Slot::Dps]
    } else if groups::contains(groups::KITERS, class) {
        &[
            Slot::KiterSwarm,
            Slot::KiterFearSnare,
            Slot::Kiter,
            Slot::KitePartnerSwarm,
            Slot::KitePartnerFearSnare,
            Slot::Dps,
        ]
    } else {
        &[
            Slot::Dps,
            Slot::Tank,
            Slot::PetPartner,
            Slot::CharmPartner,
            Slot::KitePartnerSwarm,
            Slot::KitePartnerFearSnare,
            Slot::KitePartner,
            Slot::Support,
            Slot::Slow,
            Slot::Cc,
            Slot::Healer,
        ]
    };

    for want in preferred {
        if let Some(i) = slots
            .iter()
            .enumerate()
            .position(|(i, s)| s == want && !excluded.contains(&i))
        {
            return i;
        }
    }
    (0..slots.len()).find(|i| !excluded.contains(i)).unwrap_or(0)
}
