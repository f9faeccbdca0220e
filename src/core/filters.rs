use crate::domain::model::{groups, ClassName, Constraints, RankedComp};
use std::collections::BTreeSet;

pub fn comp_matches_filters<S: AsRef<str>>(
    comp: &[S],
    must_include: &BTreeSet<ClassName>,
    exclude: &BTreeSet<ClassName>,
) -> bool {
    if comp.iter().any(|c| exclude.contains(c.as_ref())) {
        return false;
    }
    must_include
        .iter()
        .all(|m| comp.iter().any(|c| c.as_ref() == m))
}

pub fn comp_matches_constraints<S: AsRef<str>>(comp: &[S], constraints: &Constraints) -> bool {
    if constraints.ports && !groups::any_in(groups::PORTERS, comp) {
        return false;
    }
    if constraints.run_speed && !groups::any_in(groups::RUN_SPEED, comp) {
        return false;
    }
    if constraints.charm && !comp.iter().any(|c| c.as_ref() == "Enchanter") {
        return false;
    }
    if constraints.pet_heavy && !groups::any_in(groups::PET_DPS, comp) {
        return false;
    }
    if constraints.kiting && !groups::any_in(groups::KITERS, comp) {
        return false;
    }
    true
}

pub fn filter_default_comps(
    defaults: &[RankedComp],
    must_include: &BTreeSet<ClassName>,
    exclude: &BTreeSet<ClassName>,
    constraints: &Constraints,
) -> Vec<RankedComp> {
    defaults
        .iter()
        .filter(|c| comp_matches_filters(&c.classes, must_include, exclude))
        .filter(|c| comp_matches_constraints(&c.classes, constraints))
        .cloned()
        .collect()
}
