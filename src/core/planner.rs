use crate::core::cache::RecommendationCache;
use crate::core::catalog::Catalog;
use crate::core::filters::filter_default_comps;
use crate::core::recommender::{RecommendQuery, ScoredComp, DEFAULT_LIMIT};
use crate::core::templates::{resolve_slots, MAX_BOX, MIN_BOX};
use crate::domain::model::{
    era_label, BoxingMode, ClassName, Constraints, Focus, KitingStyle, RankedComp, Slot,
    StartCondition, TwoBoxMode,
};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

pub const DEFAULT_RULESET: &str = "frostreaver";
pub const DEFAULT_META_LIMIT: usize = 5;

/// Everything a user can select for one planning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanRequest {
    pub era: String,
    pub box_size: usize,
    pub two_box_mode: TwoBoxMode,
    pub kiting_style: KitingStyle,
    pub ruleset: String,
    pub boxing_mode: BoxingMode,
    pub focus: Focus,
    pub start: StartCondition,
    pub require_ports: bool,
    pub require_run_speed: bool,
    pub require_charm: bool,
    pub require_pet_heavy: bool,
    pub must_include: Vec<ClassName>,
    pub exclude: Vec<ClassName>,
    pub use_meta_builds: bool,
    pub explain: bool,
}

impl Default for PlanRequest {
    fn default() -> Self {
        Self {
            era: "ckv".to_string(),
            box_size: 2,
            two_box_mode: TwoBoxMode::Traditional,
            kiting_style: KitingStyle::Swarm,
            ruleset: DEFAULT_RULESET.to_string(),
            boxing_mode: BoxingMode::Manual,
            focus: Focus::Balanced,
            start: StartCondition::Fresh,
            require_ports: false,
            require_run_speed: false,
            require_charm: false,
            require_pet_heavy: false,
            must_include: Vec::new(),
            exclude: Vec::new(),
            use_meta_builds: false,
            explain: false,
        }
    }
}

impl PlanRequest {
    /// Charm only changes the plan from three boxes up.
    pub fn charm_effective(&self) -> bool {
        self.box_size >= 3 && self.require_charm
    }

    pub fn hardcore(&self) -> bool {
        self.focus == Focus::SoloRaid && self.box_size >= 4
    }

    pub fn constraints(&self) -> Constraints {
        Constraints {
            ports: self.require_ports,
            run_speed: self.require_run_speed,
            charm: self.charm_effective(),
            pet_heavy: self.require_pet_heavy,
            kiting: false,
        }
    }

    pub fn active_constraint_count(&self) -> usize {
        [
            self.require_ports,
            self.require_run_speed,
            self.require_pet_heavy,
            self.charm_effective(),
        ]
        .into_iter()
        .filter(|on| *on)
        .count()
    }

    /// Replace selections the data cannot satisfy; returns one warning per fix.
    pub fn sanitize(&mut self, catalog: &Catalog) -> Vec<String> {
        let mut warnings = Vec::new();

        let eras = catalog.era_options();
        if !eras.contains(&self.era.as_str()) {
            // era_options is never empty for a loaded catalog
            let fallback = eras.first().copied().unwrap_or("ckv");
            warnings.push(format!("Unknown era '{}'; using '{}'.", self.era, fallback));
            self.era = fallback.to_string();
        }

        if !catalog.rulesets.contains(&self.ruleset) {
            let fallback = if catalog.rulesets.contains(DEFAULT_RULESET) {
                DEFAULT_RULESET.to_string()
            } else {
                catalog.rulesets.keys().next().unwrap_or_default().to_string()
            };
            warnings.push(format!("Unknown ruleset '{}'; using '{}'.", self.ruleset, fallback));
            self.ruleset = fallback;
        }

        if !(MIN_BOX..=MAX_BOX).contains(&self.box_size) {
            warnings.push(format!("Unsupported box size {}; using 2.", self.box_size));
            self.box_size = 2;
        }

        let available: BTreeSet<ClassName> = match catalog.rulesets.get(&self.ruleset) {
            Some(ruleset) => catalog.available_classes(&self.era, ruleset).into_iter().collect(),
            None => BTreeSet::new(),
        };
        let lists = [
            ("must include", &mut self.must_include),
            ("exclude", &mut self.exclude),
        ];
        for (name, list) in lists {
            let before = list.len();
            list.retain(|c| available.contains(c));
            list.sort();
            list.dedup();
            if list.len() < before {
                warnings.push(format!(
                    "Dropped {} {} class(es) not available in this era/ruleset.",
                    before - list.len(),
                    name
                ));
            }
        }

        for warning in &warnings {
            tracing::warn!("{}", warning);
        }
        warnings
    }

    /// One line per setting that shapes the recommendations.
    pub fn settings_summary(&self, ruleset_label: &str) -> Vec<String> {
        let mut parts = vec![
            format!("Era: {}", era_label(&self.era)),
            format!("Box: {}", self.box_size),
            format!("Ruleset: {}", ruleset_label),
            format!("Method: {}", self.boxing_mode.label()),
            format!("Focus: {}", self.focus.label()),
            format!("Start: {}", self.start.label()),
        ];
        if self.box_size == 2 {
            parts.push(format!("2-box: {}", self.two_box_mode.label()));
        }
        parts
    }

    pub fn constraint_message(&self) -> String {
        match self.active_constraint_count() {
            0 => "No special constraints applied.".to_string(),
            n => format!("{} constraint(s) active. Results are restricted.", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForcedSlot {
    pub index: usize,
    pub slot: Slot,
    pub pool: Vec<ClassName>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub rank: usize,
    pub score: i32,
    pub percent: u32,
    pub classes: Vec<ClassName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<crate::core::scoring::ScoreExplanation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Scored {
        recommendations: Vec<Recommendation>,
    },
    MetaBuilds {
        builds: Vec<RankedComp>,
    },
    Fallback {
        defaults: Vec<RankedComp>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub request: PlanRequest,
    pub era_label: String,
    pub ruleset_label: String,
    pub slots: Vec<Slot>,
    pub available: Vec<ClassName>,
    pub forced: Vec<ForcedSlot>,
    pub summary: Vec<String>,
    pub constraint_message: String,
    pub warnings: Vec<String>,
    pub outcome: Outcome,
}

/// Share of the top score, as a whole percentage clamped to 0..=100.
/// Halves round to even: 62.5 shows as 62.
pub fn score_percent(score: i32, top: i32) -> u32 {
    if top == 0 {
        return 0;
    }
    let ratio = (score as f64 / top as f64).clamp(0.0, 1.0);
    (ratio * 100.0).round_ties_even() as u32
}

fn rank_recommendations(scored: &[ScoredComp], explain: bool) -> Vec<Recommendation> {
    let top = scored.first().map(|s| s.score).unwrap_or(0);
    scored
        .iter()
        .enumerate()
        .map(|(i, s)| Recommendation {
            rank: i + 1,
            score: s.score,
            percent: score_percent(s.score, top),
            classes: s.classes.clone(),
            explanation: explain.then(|| s.explanation.clone()),
        })
        .collect()
}

pub struct Planner {
    catalog: Arc<Catalog>,
    cache: RecommendationCache,
    limit: usize,
    meta_limit: usize,
}

impl Planner {
    pub fn new(catalog: Arc<Catalog>, cache: RecommendationCache) -> Self {
        Self {
            catalog,
            cache,
            limit: DEFAULT_LIMIT,
            meta_limit: DEFAULT_META_LIMIT,
        }
    }

    pub fn with_limits(mut self, limit: usize, meta_limit: usize) -> Self {
        self.limit = limit;
        self.meta_limit = meta_limit;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn cache(&self) -> &RecommendationCache {
        &self.cache
    }

    pub fn plan(&self, mut request: PlanRequest) -> Result<Plan> {
        let catalog = &*self.catalog;
        let mut warnings = request.sanitize(catalog);

        let ruleset_label = catalog.rulesets.label(&request.ruleset).to_string();
        let available = match catalog.rulesets.get(&request.ruleset) {
            Some(ruleset) => catalog.available_classes(&request.era, ruleset),
            None => Vec::new(),
        };

        let slots = resolve_slots(
            request.box_size,
            request.focus,
            request.two_box_mode,
            request.kiting_style,
            request.require_charm,
        )?;

        let query = RecommendQuery {
            era: request.era.clone(),
            available: available.clone(),
            slots: slots.clone(),
            boxing_mode: request.boxing_mode,
            start: request.start,
            must_include: request.must_include.iter().cloned().collect(),
            exclude: request.exclude.iter().cloned().collect(),
            constraints: request.constraints(),
            hardcore: request.hardcore(),
            limit: self.limit,
        };

        let forced = query
            .forced_slots()
            .into_iter()
            .map(|(index, pool)| ForcedSlot {
                index,
                slot: slots[index],
                pool: pool.into_iter().collect(),
            })
            .collect();

        tracing::info!(
            era = %request.era,
            box_size = request.box_size,
            ruleset = %request.ruleset,
            slots = ?slots.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            "planning"
        );

        let outcome = if request.use_meta_builds {
            let builds: Vec<RankedComp> = catalog
                .meta_builds_for(&request.era, request.box_size)
                .iter()
                .take(self.meta_limit)
                .cloned()
                .collect();
            if builds.is_empty() {
                warnings.push("No meta builds for this era/box size.".to_string());
            }
            Outcome::MetaBuilds { builds }
        } else {
            let scored = self.cache.get_or_compute(&catalog.ratings, &query);
            tracing::debug!(
                cache_entries = self.cache.stats().entry_count,
                results = scored.len(),
                "scored search done"
            );
            if scored.is_empty() {
                self.fallback(&request, &query, &mut warnings)
            } else {
                Outcome::Scored {
                    recommendations: rank_recommendations(&scored, request.explain),
                }
            }
        };

        Ok(Plan {
            era_label: era_label(&request.era).to_string(),
            summary: request.settings_summary(&ruleset_label),
            constraint_message: request.constraint_message(),
            ruleset_label,
            slots,
            available,
            forced,
            warnings,
            outcome,
            request,
        })
    }

    fn fallback(
        &self,
        request: &PlanRequest,
        query: &RecommendQuery,
        warnings: &mut Vec<String>,
    ) -> Outcome {
        if request.box_size == 2
            && request.two_box_mode == TwoBoxMode::EnchCharmTank
            && !query.available.iter().any(|c| c == "Enchanter")
        {
            warnings.push(
                "Enchanter is not available for this era/ruleset. Enchanter Pet Charm/Tank requires Enchanter; switch ruleset/era or pick another 2-box mode."
                    .to_string(),
            );
        }
        warnings.push("No scored comps found. Showing defaults fallback (filtered).".to_string());

        let Some(all_defaults) = self.catalog.defaults_for(&request.era, request.box_size) else {
            warnings.push(format!(
                "No default comps found for era '{}' and {}-box.",
                request.era, request.box_size
            ));
            return Outcome::Fallback { defaults: Vec::new() };
        };

        let available = query.available_set();
        let ruleset_filtered: Vec<RankedComp> = all_defaults
            .iter()
            .filter(|comp| comp.classes.iter().all(|c| available.contains(c)))
            .cloned()
            .collect();
        let defaults = filter_default_comps(
            &ruleset_filtered,
            &query.must_include,
            &query.exclude,
            &query.constraints,
        );
        if defaults.is_empty() {
            warnings.push("No defaults match either.".to_string());
        }
        Outcome::Fallback { defaults }
    }
}
