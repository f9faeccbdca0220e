use crate::core::filters::{comp_matches_constraints, comp_matches_filters};
use crate::core::forcing::{best_slot_for_must_include, force_constraints_into_slots, ForcedSlots};
use crate::core::roles::{role_candidates, ScoringContext};
use crate::core::scoring::{score_comp, ScoreExplanation, ScoreFlags};
use crate::domain::model::{
    groups, is_bow_ranger_era, BoxingMode, ClassName, Constraints, Ratings, Slot, StartCondition,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

pub const DEFAULT_LIMIT: usize = 15;

const HARDCORE_CORE: [(Slot, &str); 3] = [
    (Slot::Healer, "Cleric"),
    (Slot::Slow, "Shaman"),
    (Slot::Cc, "Bard"),
];

/// Fully normalized recommender input. Doubles as the cache key, so every
/// collection in it is kept in a canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RecommendQuery {
    pub era: String,
    pub available: Vec<ClassName>,
    pub slots: Vec<Slot>,
    pub boxing_mode: BoxingMode,
    pub start: StartCondition,
    pub must_include: BTreeSet<ClassName>,
    pub exclude: BTreeSet<ClassName>,
    pub constraints: Constraints,
    pub hardcore: bool,
    pub limit: usize,
}

impl RecommendQuery {
    pub fn available_set(&self) -> BTreeSet<ClassName> {
        self.available.iter().cloned().collect()
    }

    /// Classes every comp already carries, so forcing does not add them again.
    pub fn already_satisfied(&self) -> BTreeSet<ClassName> {
        let available = self.available_set();
        let mut satisfied = BTreeSet::new();
        if self.hardcore {
            for (_, class) in HARDCORE_CORE {
                if available.contains(class) {
                    satisfied.insert(class.to_string());
                }
            }
        }
        if self.slots.contains(&Slot::CharmTank) && self.constraints.charm {
            satisfied.extend(
                available
                    .iter()
                    .filter(|c| groups::contains(groups::CHARMERS, c))
                    .cloned(),
            );
        }
        satisfied
    }

    pub fn forced_slots(&self) -> ForcedSlots {
        force_constraints_into_slots(
            &self.slots,
            &self.available_set(),
            &self.constraints,
            &self.already_satisfied(),
            self.hardcore,
        )
    }

    /// Hardcore pins Cleric, Shaman and Bard into the first healer, slow and cc slots.
    fn hardcore_forced(&self) -> BTreeMap<usize, ClassName> {
        let mut pinned = BTreeMap::new();
        if !self.hardcore {
            return pinned;
        }
        for (slot, class) in HARDCORE_CORE {
            if !self.available.iter().any(|c| c == class) {
                continue;
            }
            if let Some(i) = self.slots.iter().position(|s| *s == slot) {
                pinned.insert(i, class.to_string());
            }
        }
        pinned
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredComp {
    pub score: i32,
    pub classes: Vec<ClassName>,
    pub explanation: ScoreExplanation,
}

fn build_slot_pools(ctx: &ScoringContext<'_>, query: &RecommendQuery) -> Vec<Vec<ClassName>> {
    let forced = query.forced_slots();
    let pinned = query.hardcore_forced();

    let mut pools: Vec<Vec<ClassName>> = query
        .slots
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            if let Some(class) = pinned.get(&i) {
                vec![class.clone()]
            } else if let Some(pool) = forced.get(&i) {
                pool.iter().cloned().collect()
            } else {
                role_candidates(ctx, &query.available, *slot, query.constraints.charm)
            }
        })
        .collect();

    // Every must-include class has to be reachable; never touch the hardcore core.
    let core: BTreeSet<usize> = pinned.keys().copied().collect();
    for class in &query.must_include {
        if !query.available.contains(class) || query.exclude.contains(class) {
            continue;
        }
        if pools.iter().any(|pool| pool.contains(class)) {
            continue;
        }
        let idx = best_slot_for_must_include(class, &query.slots, &core);
        if let Some(pool) = pools.get_mut(idx) {
            tracing::debug!(class = %class, slot = idx, "adding must-include class to slot pool");
            pool.push(class.clone());
        }
    }

    pools
}

/// Two or more dps slots allow one class to repeat (never Enchanter; manual
/// play only repeats casters or a bow Ranger).
fn duplicates_allowed(
    comp: &[ClassName],
    allow_duplicate_dps: bool,
    query: &RecommendQuery,
) -> bool {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for class in comp {
        *counts.entry(class.as_str()).or_default() += 1;
    }
    if counts.values().all(|n| *n == 1) {
        return true;
    }
    if !allow_duplicate_dps {
        return false;
    }
    if counts.get("Enchanter").copied().unwrap_or(0) > 1 {
        return false;
    }
    if query.boxing_mode == BoxingMode::Manual {
        let bad_melee_duplicate = counts.iter().any(|(class, n)| {
            *n > 1
                && groups::contains(groups::MELEE_DPS, class)
                && !(*class == "Ranger" && is_bow_ranger_era(&query.era))
        });
        if bad_melee_duplicate {
            return false;
        }
    }
    true
}

/// Cartesian product of the pools, in odometer order (last slot varies fastest).
fn for_each_combination(pools: &[Vec<ClassName>], mut visit: impl FnMut(&[ClassName])) {
    if pools.is_empty() || pools.iter().any(Vec::is_empty) {
        return;
    }
    let mut cursor = vec![0usize; pools.len()];
    let mut comp: Vec<ClassName> = pools.iter().map(|p| p[0].clone()).collect();
    loop {
        visit(&comp);

        let mut pos = pools.len();
        loop {
            if pos == 0 {
                return;
            }
            pos -= 1;
            cursor[pos] += 1;
            if cursor[pos] < pools[pos].len() {
                comp[pos] = pools[pos][cursor[pos]].clone();
                break;
            }
            cursor[pos] = 0;
            comp[pos] = pools[pos][0].clone();
        }
    }
}

pub fn generate_scored_recommendations(
    ratings: &Ratings,
    query: &RecommendQuery,
) -> Vec<ScoredComp> {
    let ctx = ScoringContext::new(ratings, &query.era, query.boxing_mode, query.start);
    let pools = build_slot_pools(&ctx, query);
    let allow_duplicate_dps = query.slots.iter().filter(|s| **s == Slot::Dps).count() >= 2;
    let flags = ScoreFlags {
        constraints: query.constraints,
        hardcore: query.hardcore,
    };

    let mut seen: HashSet<Vec<ClassName>> = HashSet::new();
    let mut results: Vec<ScoredComp> = Vec::new();
    let mut examined = 0usize;

    for_each_combination(&pools, |comp| {
        examined += 1;
        if !duplicates_allowed(comp, allow_duplicate_dps, query) {
            return;
        }
        if !seen.insert(comp.to_vec()) {
            return;
        }
        if !comp_matches_filters(comp, &query.must_include, &query.exclude) {
            return;
        }
        if !comp_matches_constraints(comp, &query.constraints) {
            return;
        }
        let (score, explanation) = score_comp(&ctx, comp, &query.slots, flags);
        results.push(ScoredComp {
            score,
            classes: comp.to_vec(),
            explanation,
        });
    });

    tracing::debug!(
        examined,
        matched = results.len(),
        era = %query.era,
        "recommendation search finished"
    );

    // Stable: equal scores keep enumeration order.
    results.sort_by(|a, b| b.score.cmp(&a.score));
    results.truncate(query.limit);
    results
}
