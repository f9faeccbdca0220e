//! Slot-aware composition scoring with a full breakdown of every term.

use crate::core::roles::{charm_synergy_bonus, synergy_bonus, ScoringContext};
use crate::domain::model::{
    groups, BoxingMode, Category, ClassName, Constraints, Slot, StartCondition,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownTerm {
    pub name: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotBreakdown {
    pub slot: Slot,
    pub class: ClassName,
    pub value: f64,
    pub breakdown: Vec<BreakdownTerm>,
    pub start_bonus: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlowLogic {
    pub applied: bool,
    pub has_slow: bool,
    pub bonus_or_penalty: i32,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreExplanation {
    pub summary_lines: Vec<String>,
    pub slot_breakdowns: Vec<SlotBreakdown>,
    pub slow_logic: SlowLogic,
    pub synergy_bonus: i32,
    pub charm_synergy: i32,
    pub charm_bonus_applied: i32,
    pub start_bonus_total: i32,
    pub tank_count: usize,
    pub tank_stack_penalty: i32,
    pub charm_snare_bonus: i32,
    pub classic_double_melee_bonus: i32,
    pub hardcore_warrior_bonus: i32,
    pub constraint_already_met_bonus: i32,
    pub total: i32,
}

fn term(name: &'static str, value: f64) -> BreakdownTerm {
    BreakdownTerm { name, value }
}

/// Value of one class in one slot of `comp`.
pub fn slot_value(
    ctx: &ScoringContext<'_>,
    class: &str,
    slot: Slot,
    comp: &[ClassName],
    slots: &[Slot],
) -> (f64, Vec<BreakdownTerm>) {
    let slot = slot.scoring_slot();
    let dps = ctx.net_dps(class) as f64;
    let healing = ctx.score(class, Category::Healing) as f64;
    let tanking = ctx.score(class, Category::Tanking) as f64;
    let pet_tanking = ctx.score(class, Category::PetTanking) as f64;
    let sustain = ctx.score(class, Category::Sustain) as f64;
    let kite = ctx.score(class, Category::Kite) as f64;
    let charm = ctx.score(class, Category::Charm) as f64;

    // A second healer outside the healer slot plays as dps with a small healing credit.
    let main_healer = slots
        .iter()
        .position(|s| *s == Slot::Healer)
        .and_then(|i| comp.get(i));
    if let Some(main) = main_healer {
        if slot != Slot::Healer && groups::contains(groups::HEALERS, class) && class != main {
            let secondary = healing * 0.15;
            return (
                dps + secondary,
                vec![
                    term("dps", dps),
                    term("healing", healing),
                    term("healing_secondary_bonus", secondary),
                ],
            );
        }
    }

    match slot {
        Slot::Tank => (
            tanking * 0.45 + sustain * 0.30 + dps * 0.25,
            vec![term("tanking", tanking), term("sustain", sustain), term("dps", dps)],
        ),
        Slot::PetTank => (
            pet_tanking + sustain * 0.15,
            vec![term("pet_tanking", pet_tanking), term("sustain", sustain)],
        ),
        Slot::Kiter => (
            kite + sustain * 0.25,
            vec![term("kite", kite), term("sustain", sustain)],
        ),
        Slot::CharmTank => (
            charm + sustain * 0.20,
            vec![term("charm", charm), term("sustain", sustain)],
        ),
        Slot::Healer => (healing, vec![term("healing", healing)]),
        Slot::KitePartner | Slot::PetPartner | Slot::CharmPartner => (
            healing * 0.50 + dps * 0.50,
            vec![term("healing", healing), term("dps", dps)],
        ),
        Slot::Slow | Slot::Cc | Slot::Support => (
            healing * 0.35 + dps * 0.35 + charm * 0.20 + sustain * 0.15,
            vec![
                term("healing", healing),
                term("dps", dps),
                term("charm", charm),
                term("sustain", sustain),
            ],
        ),
        _ => (dps, vec![term("dps", dps)]),
    }
}

/// Whole-group flags that change how a composition is scored.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreFlags {
    pub constraints: Constraints,
    pub hardcore: bool,
}

pub fn score_comp(
    ctx: &ScoringContext<'_>,
    comp: &[ClassName],
    slots: &[Slot],
    flags: ScoreFlags,
) -> (i32, ScoreExplanation) {
    let require_charm = flags.constraints.charm;
    let has = |name: &str| comp.iter().any(|c| c == name);

    let mut slot_breakdowns = Vec::with_capacity(comp.len());
    let mut slot_total = 0.0;
    let mut start_bonus_total = 0;
    let mut charm_bonus_applied = 0;
    let mut hardcore_warrior_bonus = 0;
    let mut best_tank_metric = Category::Tanking;
    let mut best_tank_value: f64 = 0.0;
    let mut best_heal_value: f64 = 0.0;
    let tank_count = groups::count_in(groups::TANKS, comp);

    for (slot, class) in slots.iter().zip(comp.iter()) {
        let (mut value, breakdown) = slot_value(ctx, class, *slot, comp, slots);

        if require_charm && class == "Enchanter" {
            value += 30.0;
            charm_bonus_applied = 30;
        }
        // Warrior defensives matter for one-group raiding.
        if flags.hardcore && *slot == Slot::Tank && class == "Warrior" {
            hardcore_warrior_bonus = 18;
        }

        let start_bonus = ctx.start_bonus(class);
        start_bonus_total += start_bonus;
        slot_total += value;

        match slot {
            Slot::Healer => {
                best_heal_value = best_heal_value.max(ctx.score(class, Category::Healing) as f64);
            }
            Slot::Tank => {
                best_tank_metric = Category::Tanking;
                best_tank_value = best_tank_value.max(ctx.score(class, Category::Tanking) as f64);
            }
            Slot::PetTank => {
                best_tank_metric = Category::PetTanking;
                best_tank_value =
                    best_tank_value.max(ctx.score(class, Category::PetTanking) as f64);
            }
            _ => {}
        }

        slot_breakdowns.push(SlotBreakdown {
            slot: *slot,
            class: class.clone(),
            value,
            breakdown,
            start_bonus,
        });
    }

    let syn_bonus = synergy_bonus(comp);
    let charm_synergy = charm_synergy_bonus(comp);

    // Prefer groups that already carry run speed or ports over swapping core classes.
    let mut constraint_already_met_bonus = 0;
    if flags.constraints.run_speed && (has("Bard") || has("Shaman")) {
        constraint_already_met_bonus += 28;
    }
    if flags.constraints.ports && groups::any_in(groups::PORTERS, comp) {
        constraint_already_met_bonus += 15;
    }

    let melee_count = groups::count_in(groups::MELEE_DPS, comp);
    let classic_double_melee_bonus = if comp.len() == 6
        && matches!(ctx.boxing_mode, BoxingMode::Assisted | BoxingMode::Macroquest)
        && ctx.start != StartCondition::Fresh
        && (has("Warrior") || has("Shadowknight"))
        && has("Shaman")
        && has("Bard")
        && has("Cleric")
        && melee_count >= 2
        && !has("Enchanter")
    {
        22
    } else {
        0
    };

    // Snare makes charm breaks survivable in small groups.
    let charm_snare_bonus = if matches!(comp.len(), 2 | 3)
        && (has("Enchanter") || require_charm)
        && groups::any_in(groups::SNARERS, comp)
    {
        18
    } else {
        0
    };

    let mut slow_logic = SlowLogic::default();
    let has_slow = groups::any_in(groups::SLOWERS, comp);
    if comp.len() == 2 && slots == [Slot::Tank, Slot::Healer] {
        slow_logic.applied = true;
        slow_logic.has_slow = has_slow;
        if has_slow {
            slow_logic.bonus_or_penalty = 20;
            slow_logic.note = "2-box tank+healer: slow is core, bonus applied.".to_string();
        } else {
            slow_logic.bonus_or_penalty = -25;
            slow_logic.note = "2-box tank+healer: no slow, penalty applied.".to_string();
        }
    }

    let tank_stack_penalty = if tank_count >= 2 {
        -40 * (tank_count as i32 - 1)
    } else {
        0
    };

    let total = (slot_total
        + syn_bonus as f64
        + charm_synergy as f64
        + classic_double_melee_bonus as f64
        + hardcore_warrior_bonus as f64
        + constraint_already_met_bonus as f64
        + start_bonus_total as f64 * 0.4
        + slow_logic.bonus_or_penalty as f64
        + tank_stack_penalty as f64
        + charm_snare_bonus as f64) as i32;

    let mut summary_lines = vec![format!(
        "Tank metric used: {} | Best tank value: {}",
        best_tank_metric.as_str(),
        best_tank_value as i32
    )];
    if slots.contains(&Slot::Healer) {
        summary_lines.push(format!("Best healer value: {}", best_heal_value as i32));
    }
    summary_lines.push(format!("Slot score sum: {:.1}", slot_total));
    if slow_logic.applied {
        summary_lines.push(format!(
            "Slow check: {} ({:+})",
            if has_slow { "YES" } else { "NO" },
            slow_logic.bonus_or_penalty
        ));
    }
    if syn_bonus != 0 {
        summary_lines.push(format!("Synergy bonus: +{}", syn_bonus));
    }
    if charm_synergy != 0 {
        summary_lines.push(format!(
            "Charm caster/pet synergy: +{} (casters and pet classes, no melee when charm tanks)",
            charm_synergy
        ));
    }
    if start_bonus_total != 0 {
        summary_lines.push(format!("Start bonuses: +{} (fresh start)", start_bonus_total));
    }
    if tank_stack_penalty != 0 {
        summary_lines.push(format!("Tank stacking penalty: {}", tank_stack_penalty));
    }
    if charm_snare_bonus != 0 {
        summary_lines.push(format!(
            "Charm + snare bonus: +{} (snare for charm-break safety)",
            charm_snare_bonus
        ));
    }
    if classic_double_melee_bonus != 0 {
        summary_lines.push(format!(
            "Classic 6-box double-melee bonus: +{} (Warrior/SK, Shaman, Bard, Cleric, 2x melee)",
            classic_double_melee_bonus
        ));
    }
    if hardcore_warrior_bonus != 0 {
        summary_lines.push(format!(
            "Hardcore Warrior bonus: +{} (defensives)",
            hardcore_warrior_bonus
        ));
    }
    if constraint_already_met_bonus != 0 {
        summary_lines.push(format!(
            "Constraint already in group: +{} (run speed/ports from Bard/Shaman/porter)",
            constraint_already_met_bonus
        ));
    }

    let explanation = ScoreExplanation {
        summary_lines,
        slot_breakdowns,
        slow_logic,
        synergy_bonus: syn_bonus,
        charm_synergy,
        charm_bonus_applied,
        start_bonus_total,
        tank_count,
        tank_stack_penalty,
        charm_snare_bonus,
        classic_double_melee_bonus,
        hardcore_warrior_bonus,
        constraint_already_met_bonus,
        total,
    };
    (total, explanation)
}
