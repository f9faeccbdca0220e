use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub type ClassName = String;

/// Rating columns of `class_ratings.csv`, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Dps,
    Healing,
    Tanking,
    PetTanking,
    Solo,
    Sustain,
    Kite,
    Charm,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Dps,
        Category::Healing,
        Category::Tanking,
        Category::PetTanking,
        Category::Solo,
        Category::Sustain,
        Category::Kite,
        Category::Charm,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Dps => "dps",
            Category::Healing => "healing",
            Category::Tanking => "tanking",
            Category::PetTanking => "pet_tanking",
            Category::Solo => "solo",
            Category::Sustain => "sustain",
            Category::Kite => "kite",
            Category::Charm => "charm",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryScores([i32; 8]);

impl CategoryScores {
    pub fn get(&self, category: Category) -> i32 {
        self.0[category as usize]
    }

    pub fn set(&mut self, category: Category, value: i32) {
        self.0[category as usize] = value;
    }
}

/// era -> class -> scores
pub type Ratings = HashMap<String, HashMap<ClassName, CategoryScores>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedComp {
    pub rank: u32,
    pub classes: Vec<ClassName>,
}

/// era -> box size -> comps sorted by rank
pub type CompTable = HashMap<String, HashMap<usize, Vec<RankedComp>>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ruleset {
    pub label: String,
    #[serde(default, deserialize_with = "nullable_era_map")]
    pub add_classes_by_era: HashMap<String, Vec<ClassName>>,
    #[serde(default, deserialize_with = "nullable_era_map")]
    pub remove_classes_by_era: HashMap<String, Vec<ClassName>>,
    /// Carried through from the data file; not consulted when scoring.
    #[serde(default)]
    pub weight_modifiers: serde_json::Value,
}

fn nullable_era_map<'de, D>(deserializer: D) -> Result<HashMap<String, Vec<ClassName>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<HashMap<String, Option<Vec<ClassName>>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(era, classes)| (era, classes.unwrap_or_default()))
        .collect())
}

/// Rulesets in the order they appear in `rulesets.json`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Rulesets {
    entries: Vec<(String, Ruleset)>,
}

impl Rulesets {
    pub fn new(entries: Vec<(String, Ruleset)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&Ruleset> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, rs)| rs)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Ruleset)> {
        self.entries.iter().map(|(k, rs)| (k.as_str(), rs))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).map(|rs| rs.label.as_str()).unwrap_or(key)
    }
}

/// Semantic group slots. A template is an ordered list of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Tank,
    Healer,
    Slow,
    Cc,
    Dps,
    PetTank,
    PetPartner,
    CharmTank,
    CharmPartner,
    Kiter,
    KiterSwarm,
    KiterFearSnare,
    KitePartner,
    KitePartnerSwarm,
    KitePartnerFearSnare,
    Support,
}

impl Slot {
    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Tank => "tank",
            Slot::Healer => "healer",
            Slot::Slow => "slow",
            Slot::Cc => "cc",
            Slot::Dps => "dps",
            Slot::PetTank => "pet_tank",
            Slot::PetPartner => "pet_partner",
            Slot::CharmTank => "charm_tank",
            Slot::CharmPartner => "charm_partner",
            Slot::Kiter => "kiter",
            Slot::KiterSwarm => "kiter_swarm",
            Slot::KiterFearSnare => "kiter_fear_snare",
            Slot::KitePartner => "kite_partner",
            Slot::KitePartnerSwarm => "kite_partner_swarm",
            Slot::KitePartnerFearSnare => "kite_partner_fear_snare",
            Slot::Support => "support",
        }
    }

    /// Kiting variants score the same as their generic slot.
    pub fn scoring_slot(self) -> Slot {
        match self {
            Slot::KiterSwarm | Slot::KiterFearSnare => Slot::Kiter,
            Slot::KitePartnerSwarm | Slot::KitePartnerFearSnare => Slot::KitePartner,
            other => other,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum BoxingMode {
    #[default]
    Manual,
    Assisted,
    Macroquest,
}

impl BoxingMode {
    pub fn label(self) -> &'static str {
        match self {
            BoxingMode::Manual => "Manual",
            BoxingMode::Assisted => "Assisted",
            BoxingMode::Macroquest => "Macroquest",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum Focus {
    Leveling,
    #[default]
    Balanced,
    SoloRaid,
}

impl Focus {
    pub fn label(self) -> &'static str {
        match self {
            Focus::Leveling => "Leveling",
            Focus::Balanced => "Balanced",
            Focus::SoloRaid => "Hardcore",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum StartCondition {
    #[default]
    Fresh,
    Assisted,
}

impl StartCondition {
    pub fn label(self) -> &'static str {
        match self {
            StartCondition::Fresh => "Fresh",
            StartCondition::Assisted => "Assisted / Krono",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum TwoBoxMode {
    #[default]
    Traditional,
    PetTank,
    EnchCharmTank,
    Kiting,
}

impl TwoBoxMode {
    pub fn label(self) -> &'static str {
        match self {
            TwoBoxMode::Traditional => "Traditional (Tank + Healer)",
            TwoBoxMode::PetTank => "Pet tank (Pet tanks, partner is caster/support)",
            TwoBoxMode::EnchCharmTank => "Enchanter Pet Charm/Tank",
            TwoBoxMode::Kiting => "Kiting (choose style below)",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum KitingStyle {
    #[default]
    Swarm,
    FearSnare,
}

impl KitingStyle {
    pub fn label(self) -> &'static str {
        match self {
            KitingStyle::Swarm => "Swarm kiting (Bard AoE)",
            KitingStyle::FearSnare => "Fear/Snare/Quad (Necro/Druid/Wizard/Ranger)",
        }
    }
}

/// Hard requirements a composition must satisfy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraints {
    pub ports: bool,
    pub run_speed: bool,
    pub charm: bool,
    pub pet_heavy: bool,
    /// Kept for data compatibility; the planner never sets it.
    pub kiting: bool,
}

pub const ERA_ORDER: [&str; 5] = ["ckv", "luclin", "pop", "god", "oow"];

pub fn era_label(era: &str) -> &str {
    match era {
        "ckv" => "Classic (Classic + Kunark + Velious)",
        "luclin" => "Shadows of Luclin",
        "pop" => "Planes of Power (LoY + LDoN)",
        "god" => "Gates of Discord",
        "oow" => "Omens of War",
        other => other,
    }
}

/// Rangers switch to bow play in these eras.
pub fn is_bow_ranger_era(era: &str) -> bool {
    matches!(era, "luclin" | "pop")
}

pub mod groups {
    pub const PORTERS: &[&str] = &["Wizard", "Druid"];
    pub const RUN_SPEED: &[&str] = &["Bard", "Druid", "Shaman", "Ranger"];
    pub const CHARMERS: &[&str] = &["Enchanter"];
    pub const PET_DPS: &[&str] = &["Magician", "Necromancer", "Beastlord"];
    pub const KITERS: &[&str] = &["Necromancer", "Druid", "Wizard", "Bard", "Ranger"];
    pub const SLOWERS: &[&str] = &["Shaman", "Enchanter"];
    pub const CCERS: &[&str] = &["Enchanter", "Bard"];
    pub const SNARERS: &[&str] = &["Wizard", "Druid", "Ranger"];
    pub const MELEE_DPS: &[&str] = &["Monk", "Rogue", "Ranger", "Berserker"];
    pub const CASTER_DPS: &[&str] = &["Wizard", "Magician", "Necromancer", "Enchanter", "Druid"];
    pub const TANKS: &[&str] = &["Warrior", "Shadowknight", "Paladin"];
    pub const HEALERS: &[&str] = &["Cleric", "Druid", "Shaman"];
    pub const PET_TANKERS: &[&str] = &["Magician", "Necromancer", "Beastlord"];
    pub const FEAR_SNARE_KITERS: &[&str] = &["Necromancer", "Druid", "Wizard", "Ranger"];

    pub fn contains(group: &[&str], class: &str) -> bool {
        group.iter().any(|c| *c == class)
    }

    pub fn any_in<S: AsRef<str>>(group: &[&str], comp: &[S]) -> bool {
        comp.iter().any(|c| contains(group, c.as_ref()))
    }

    pub fn count_in<S: AsRef<str>>(group: &[&str], comp: &[S]) -> usize {
        comp.iter().filter(|c| contains(group, c.as_ref())).count()
    }
}
