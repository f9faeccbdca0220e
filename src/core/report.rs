//! Plain-text rendering of a [`Plan`] for the terminal.

use crate::core::planner::{Outcome, Plan, Recommendation};
use crate::domain::model::RankedComp;
use std::fmt::Write;

pub const BANNER_LINK_URL: &str = "https://www.redguides.com/amember/aff/go/vanman2099";

const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub explain: bool,
    pub show_forced: bool,
}

pub fn render_text(plan: &Plan, options: ReportOptions) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_report(&mut out, plan, options);
    out
}

fn write_report(out: &mut String, plan: &Plan, options: ReportOptions) -> std::fmt::Result {
    writeln!(out, "EverQuest Multibox Planner")?;
    writeln!(out, "{}", "=".repeat(26))?;
    writeln!(out, "{}", plan.summary.join(" | "))?;
    writeln!(out, "{}", plan.constraint_message)?;
    writeln!(
        out,
        "Slots: {}",
        plan.slots.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
    )?;

    for warning in &plan.warnings {
        writeln!(out, "⚠ {}", warning)?;
    }

    if options.show_forced && !plan.forced.is_empty() {
        writeln!(out)?;
        for forced in &plan.forced {
            writeln!(
                out,
                "Slot {} ({}) forced to: {}",
                forced.index + 1,
                forced.slot,
                forced.pool.join(", ")
            )?;
        }
    }

    writeln!(out)?;
    match &plan.outcome {
        Outcome::Scored { recommendations } => {
            writeln!(out, "Top recommendations")?;
            for rec in recommendations {
                write_recommendation(out, rec, options.explain)?;
            }
        }
        Outcome::MetaBuilds { builds } => {
            writeln!(out, "Meta builds")?;
            if builds.is_empty() {
                writeln!(out, "No meta builds found for this era and box size.")?;
            }
            for (i, build) in builds.iter().enumerate() {
                writeln!(out, "{} {}", rank_marker(i + 1), build.classes.join(" | "))?;
            }
        }
        Outcome::Fallback { defaults } => {
            writeln!(out, "Fallback defaults")?;
            write_defaults(out, defaults)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Support the planner: {}", BANNER_LINK_URL)?;
    Ok(())
}

fn rank_marker(rank: usize) -> String {
    match MEDALS.get(rank - 1) {
        Some(medal) => format!("{} #{}", medal, rank),
        None => format!("#{}", rank),
    }
}

fn write_recommendation(
    out: &mut String,
    rec: &Recommendation,
    explain: bool,
) -> std::fmt::Result {
    writeln!(
        out,
        "{} {}  (score {}, {}%)",
        rank_marker(rec.rank),
        rec.classes.join(" | "),
        rec.score,
        rec.percent
    )?;

    let Some(explanation) = rec.explanation.as_ref().filter(|_| explain) else {
        return Ok(());
    };
    for row in &explanation.slot_breakdowns {
        let terms = row
            .breakdown
            .iter()
            .map(|t| format!("{}={:.1}", t.name, t.value))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(
            out,
            "    {}: {} (slot score {:.1}) [{}]",
            row.slot, row.class, row.value, terms
        )?;
    }
    for line in &explanation.summary_lines {
        writeln!(out, "    {}", line)?;
    }
    Ok(())
}

fn write_defaults(out: &mut String, defaults: &[RankedComp]) -> std::fmt::Result {
    if defaults.is_empty() {
        return writeln!(out, "No default comps match the current filters.");
    }
    for comp in defaults {
        writeln!(out, "Default #{}: {}", comp.rank, comp.classes.join(" | "))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::planner::{ForcedSlot, PlanRequest};
    use crate::domain::model::Slot;

    fn plan(outcome: Outcome) -> Plan {
        let request = PlanRequest::default();
        Plan {
            summary: request.settings_summary("Frostreaver"),
            constraint_message: request.constraint_message(),
            request,
            era_label: "Classic (Classic + Kunark + Velious)".to_string(),
            ruleset_label: "Frostreaver".to_string(),
            slots: vec![Slot::Tank, Slot::Healer],
            available: vec![],
            forced: vec![ForcedSlot {
                index: 1,
                slot: Slot::Healer,
                pool: vec!["Druid".to_string(), "Shaman".to_string()],
            }],
            warnings: vec![],
            outcome,
        }
    }

    fn rec(rank: usize, score: i32, percent: u32) -> Recommendation {
        Recommendation {
            rank,
            score,
            percent,
            classes: vec!["Warrior".to_string(), "Cleric".to_string()],
            explanation: None,
        }
    }

    #[test]
    fn test_scored_report_has_medals_and_footer() {
        let plan = plan(Outcome::Scored {
            recommendations: (1..=4).map(|r| rec(r, 200 - r as i32, 99)).collect(),
        });
        let text = render_text(&plan, ReportOptions::default());
        assert!(text.contains("🥇 #1 Warrior | Cleric  (score 199, 99%)"));
        assert!(text.contains("🥉 #3"));
        assert!(text.contains("\n#4 Warrior | Cleric"));
        assert!(text.contains("No special constraints applied."));
        assert!(text.ends_with(&format!("{}\n", BANNER_LINK_URL)));
        assert!(!text.contains("forced to"));
    }

    #[test]
    fn test_explain_terms_use_one_decimal() {
        use crate::core::scoring::{BreakdownTerm, ScoreExplanation, SlotBreakdown, SlowLogic};

        let explanation = ScoreExplanation {
            summary_lines: vec!["Total score: 199".to_string()],
            slot_breakdowns: vec![SlotBreakdown {
                slot: Slot::Tank,
                class: "Warrior".to_string(),
                value: 62.5,
                breakdown: vec![
                    BreakdownTerm { name: "tanking", value: 71.0 },
                    BreakdownTerm { name: "sustain", value: 40.0 },
                ],
                start_bonus: 0,
            }],
            slow_logic: SlowLogic::default(),
            synergy_bonus: 0,
            charm_synergy: 0,
            charm_bonus_applied: 0,
            start_bonus_total: 0,
            tank_count: 1,
            tank_stack_penalty: 0,
            charm_snare_bonus: 0,
            classic_double_melee_bonus: 0,
            hardcore_warrior_bonus: 0,
            constraint_already_met_bonus: 0,
            total: 199,
        };
        let mut recommendation = rec(1, 199, 100);
        recommendation.explanation = Some(explanation);
        let plan = plan(Outcome::Scored {
            recommendations: vec![recommendation],
        });

        let text = render_text(
            &plan,
            ReportOptions {
                explain: true,
                show_forced: false,
            },
        );
        assert!(text.contains("Warrior (slot score 62.5) [tanking=71.0, sustain=40.0]"));
        assert!(text.contains("    Total score: 199"));

        let terse = render_text(&plan, ReportOptions::default());
        assert!(!terse.contains("tanking="));
    }

    #[test]
    fn test_forced_preview_and_defaults() {
        let plan = plan(Outcome::Fallback {
            defaults: vec![RankedComp {
                rank: 2,
                classes: vec!["Paladin".to_string(), "Druid".to_string()],
            }],
        });
        let text = render_text(
            &plan,
            ReportOptions {
                explain: false,
                show_forced: true,
            },
        );
        assert!(text.contains("Slot 2 (healer) forced to: Druid, Shaman"));
        assert!(text.contains("Default #2: Paladin | Druid"));
    }
}
