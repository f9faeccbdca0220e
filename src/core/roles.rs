//! Candidate pools per slot and the per-class bonuses shared with scoring.

use crate::domain::model::{
    groups, is_bow_ranger_era, BoxingMode, Category, ClassName, Ratings, Slot, StartCondition,
};

/// Everything about a request that influences how a single class is valued.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub ratings: &'a Ratings,
    pub era: &'a str,
    pub boxing_mode: BoxingMode,
    pub start: StartCondition,
}

impl<'a> ScoringContext<'a> {
    pub fn new(
        ratings: &'a Ratings,
        era: &'a str,
        boxing_mode: BoxingMode,
        start: StartCondition,
    ) -> Self {
        Self {
            ratings,
            era,
            boxing_mode,
            start,
        }
    }

    /// Rating for a class, 0 when the era or class is unknown.
    pub fn score(&self, class: &str, category: Category) -> i32 {
        self.ratings
            .get(self.era)
            .and_then(|by_class| by_class.get(class))
            .map(|scores| scores.get(category))
            .unwrap_or(0)
    }

    pub fn melee_penalty(&self, class: &str) -> i32 {
        melee_penalty(self.boxing_mode, class, self.era)
    }

    pub fn start_bonus(&self, class: &str) -> i32 {
        start_condition_bonus(self.start, class)
    }

    /// DPS rating after the manual-play melee penalty.
    pub fn net_dps(&self, class: &str) -> i32 {
        self.score(class, Category::Dps) - self.melee_penalty(class)
    }
}

/// Manual boxing makes melee harder to drive, so they rank below equivalent casters.
pub fn melee_penalty(mode: BoxingMode, class: &str, era: &str) -> i32 {
    if mode != BoxingMode::Manual || !groups::contains(groups::MELEE_DPS, class) {
        return 0;
    }
    if class == "Ranger" && is_bow_ranger_era(era) {
        return 0;
    }
    15
}

pub fn start_condition_bonus(start: StartCondition, class: &str) -> i32 {
    if start != StartCondition::Fresh {
        return 0;
    }
    if groups::contains(groups::PET_DPS, class) {
        10
    } else if class == "Monk" {
        6
    } else {
        0
    }
}

pub fn synergy_bonus<S: AsRef<str>>(comp: &[S]) -> i32 {
    let has = |name: &str| comp.iter().any(|c| c.as_ref() == name);
    let melee = groups::count_in(groups::MELEE_DPS, comp);
    let casters = groups::count_in(groups::CASTER_DPS, comp);
    let mut bonus = 0;

    if has("Shadowknight") && has("Shaman") {
        bonus += 18;
    }
    if has("Bard") && melee >= 2 {
        bonus += 10;
    }
    if has("Enchanter") && casters >= 2 {
        bonus += 8;
    }
    // Classic 6-box double melee: Warrior/SK, Shaman, Bard, Cleric and two melee.
    if comp.len() == 6
        && (has("Warrior") || has("Shadowknight"))
        && has("Shaman")
        && has("Bard")
        && has("Cleric")
        && melee >= 2
    {
        bonus += 28;
    }
    bonus
}

/// With an Enchanter charm-tanking, casters and pet classes pair well; melee do not.
pub fn charm_synergy_bonus<S: AsRef<str>>(comp: &[S]) -> i32 {
    if !comp.iter().any(|c| c.as_ref() == "Enchanter") {
        return 0;
    }
    comp.iter()
        .map(|c| match c.as_ref() {
            "Magician" | "Necromancer" => 14,
            "Beastlord" => 6,
            "Wizard" | "Druid" => 8,
            _ => 0,
        })
        .sum()
}

fn manual_partner_allowed(class: &str) -> bool {
    !groups::contains(groups::TANKS, class) && !groups::contains(groups::MELEE_DPS, class)
}

fn ranked(mut scored: Vec<(i32, &str)>, n: usize) -> Vec<ClassName> {
    // Stable: ties keep alphabetical input order.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(n)
        .map(|(_, c)| c.to_string())
        .collect()
}

fn weighted(a: i32, wa: f64, b: i32, wb: f64) -> i32 {
    (a as f64 * wa + b as f64 * wb) as i32
}

fn scaled(value: i32, factor: f64) -> i32 {
    (value as f64 * factor) as i32
}

/// Ranked candidate classes for one slot.
pub fn role_candidates(
    ctx: &ScoringContext<'_>,
    available: &[ClassName],
    slot: Slot,
    require_charm: bool,
) -> Vec<ClassName> {
    let avail: Vec<&str> = available.iter().map(String::as_str).collect();
    let has = |name: &str| avail.contains(&name);

    let by_category = |pool: &[&str], category: Category, n: usize| {
        let scored = pool
            .iter()
            .filter(|c| avail.contains(c))
            .map(|c| (ctx.score(c, category), *c))
            .collect();
        ranked(scored, n)
    };

    let top_by = |category: Category, n: usize| {
        let scored = avail
            .iter()
            .map(|c| {
                let mut base = ctx.score(c, category) + ctx.start_bonus(c);
                if category == Category::Dps {
                    base -= ctx.melee_penalty(c);
                    if require_charm && *c == "Enchanter" {
                        base += 30;
                    }
                }
                (base, *c)
            })
            .collect();
        ranked(scored, n)
    };

    let partners = |exclude_enchanter: bool| -> Vec<&str> {
        avail
            .iter()
            .copied()
            .filter(|c| !(exclude_enchanter && *c == "Enchanter"))
            .filter(|c| ctx.boxing_mode != BoxingMode::Manual || manual_partner_allowed(c))
            .collect()
    };

    let in_group = |group: &[&str]| -> Vec<&str> {
        avail
            .iter()
            .copied()
            .filter(|c| groups::contains(group, c))
            .collect()
    };

    let in_avail_order = |group: &[&str]| -> Vec<ClassName> {
        avail
            .iter()
            .filter(|c| groups::contains(group, c))
            .map(|c| c.to_string())
            .collect()
    };

    match slot {
        Slot::Tank => {
            by_category(&in_group(groups::TANKS), Category::Tanking, 6)
        }
        Slot::Healer => {
            by_category(&in_group(groups::HEALERS), Category::Healing, 6)
        }
        Slot::Slow => {
            let pool = in_avail_order(groups::SLOWERS);
            if pool.is_empty() {
                top_by(Category::Solo, 5)
            } else {
                pool
            }
        }
        Slot::Cc => {
            let pool = in_avail_order(groups::CCERS);
            if pool.is_empty() {
                top_by(Category::Solo, 5)
            } else {
                pool
            }
        }
        Slot::PetTank => {
            by_category(&in_group(groups::PET_TANKERS), Category::PetTanking, 6)
        }
        Slot::CharmTank => {
            if has("Enchanter") {
                vec!["Enchanter".to_string()]
            } else {
                Vec::new()
            }
        }
        Slot::CharmPartner => {
            let scored = partners(true)
                .into_iter()
                .map(|c| {
                    let mut base =
                        weighted(ctx.net_dps(c), 0.85, ctx.score(c, Category::Healing), 0.15);
                    // Snare keeps a charm break survivable.
                    if groups::contains(groups::SNARERS, c) {
                        base += 15;
                    }
                    if groups::contains(groups::RUN_SPEED, c) {
                        base += 6;
                    }
                    if groups::contains(groups::PORTERS, c) {
                        base += 5;
                    }
                    base += scaled(ctx.start_bonus(c), 0.5);
                    (base, c)
                })
                .collect();
            ranked(scored, 10)
        }
        Slot::PetPartner => {
            let scored = partners(false)
                .into_iter()
                .map(|c| {
                    let mut base =
                        weighted(ctx.net_dps(c), 0.85, ctx.score(c, Category::Healing), 0.15);
                    if groups::contains(groups::SLOWERS, c) {
                        base += 12;
                    }
                    if groups::contains(groups::PORTERS, c) {
                        base += 5;
                    }
                    if groups::contains(groups::RUN_SPEED, c) {
                        base += 6;
                    }
                    if groups::contains(groups::CCERS, c) {
                        base += 5;
                    }
                    if groups::contains(groups::PET_DPS, c) {
                        base += 8;
                    }
                    base += scaled(ctx.start_bonus(c), 0.5);
                    (base, c)
                })
                .collect();
            ranked(scored, 10)
        }
        Slot::Kiter => {
            by_category(&in_group(groups::KITERS), Category::Kite, 8)
        }
        Slot::KiterSwarm => {
            if has("Bard") {
                vec!["Bard".to_string()]
            } else {
                Vec::new()
            }
        }
        Slot::KiterFearSnare => {
            by_category(&in_group(groups::FEAR_SNARE_KITERS), Category::Kite, 6)
        }
        Slot::KitePartnerSwarm => {
            let scored = partners(false)
                .into_iter()
                .map(|c| {
                    let mut base =
                        weighted(ctx.score(c, Category::Healing), 0.60, ctx.net_dps(c), 0.40);
                    if groups::contains(groups::RUN_SPEED, c) {
                        base += 10;
                    }
                    if groups::contains(groups::SLOWERS, c) {
                        base += 6;
                    }
                    if groups::contains(groups::PORTERS, c) {
                        base += 4;
                    }
                    base += scaled(ctx.start_bonus(c), 0.4);
                    (base, c)
                })
                .collect();
            ranked(scored, 10)
        }
        Slot::KitePartnerFearSnare => {
            let scored = partners(false)
                .into_iter()
                .map(|c| {
                    let mut base =
                        weighted(ctx.net_dps(c), 0.85, ctx.score(c, Category::Healing), 0.15);
                    if groups::contains(groups::RUN_SPEED, c) {
                        base += 8;
                    }
                    if groups::contains(groups::PORTERS, c) {
                        base += 6;
                    }
                    if groups::contains(groups::PET_DPS, c) {
                        base += 8;
                    }
                    if groups::contains(groups::SLOWERS, c) {
                        base += 6;
                    }
                    base += scaled(ctx.start_bonus(c), 0.4);
                    (base, c)
                })
                .collect();
            ranked(scored, 10)
        }
        Slot::Support => {
            let scored = avail
                .iter()
                .map(|c| {
                    let raw = ctx.score(c, Category::Healing) as f64 * 0.65
                        + ctx.score(c, Category::Sustain) as f64 * 0.45
                        + ctx.score(c, Category::Solo) as f64 * 0.35
                        + ctx.score(c, Category::Kite) as f64 * 0.20
                        + ctx.score(c, Category::Charm) as f64 * 0.15;
                    let mut base = raw as i32;
                    if groups::contains(groups::SLOWERS, c) {
                        base += 14;
                    }
                    if groups::contains(groups::CCERS, c) {
                        base += 8;
                    }
                    if groups::contains(groups::PORTERS, c) {
                        base += 6;
                    }
                    if groups::contains(groups::RUN_SPEED, c) {
                        base += 6;
                    }
                    base += scaled(ctx.start_bonus(c), 0.5);
                    if require_charm && *c == "Enchanter" {
                        base += 18;
                    }
                    if ctx.boxing_mode == BoxingMode::Manual
                        && groups::contains(groups::MELEE_DPS, c)
                    {
                        base -= 6;
                    }
                    (base, *c)
                })
                .collect();
            ranked(scored, 10)
        }
        Slot::Dps => top_by(Category::Dps, 10),
        Slot::KitePartner => top_by(Category::Solo, 6),
    }
}
