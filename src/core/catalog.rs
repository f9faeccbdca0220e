//! Loading and validation of the planner data directory.
//!
//! Required files: `class_ratings.csv`, `synergies_and_defaults.csv`, `rulesets.json`.
//! `meta_builds.csv` is optional and parsed leniently.

use crate::core::Storage;
use crate::domain::model::{
    Category, CategoryScores, ClassName, CompTable, RankedComp, Ratings, Ruleset, Rulesets,
    ERA_ORDER,
};
use crate::utils::error::{PlannerError, Result};
use std::collections::{BTreeSet, HashSet};
use std::io::Read;

pub const RATINGS_FILE: &str = "class_ratings.csv";
pub const DEFAULTS_FILE: &str = "synergies_and_defaults.csv";
pub const RULESETS_FILE: &str = "rulesets.json";
pub const META_BUILDS_FILE: &str = "meta_builds.csv";

pub const REQUIRED_FILES: [&str; 3] = [RATINGS_FILE, DEFAULTS_FILE, RULESETS_FILE];

const RULESET_FIELDS: [&str; 4] = [
    "label",
    "add_classes_by_era",
    "remove_classes_by_era",
    "weight_modifiers",
];

#[derive(Debug, Clone)]
pub struct Catalog {
    pub ratings: Ratings,
    pub defaults: CompTable,
    pub rulesets: Rulesets,
    pub meta_builds: CompTable,
}

impl Catalog {
    pub async fn load<S: Storage>(storage: &S) -> Result<Self> {
        let mut missing = Vec::new();
        for name in REQUIRED_FILES {
            if !storage.exists(name).await {
                missing.push(name.to_string());
            }
        }
        if !missing.is_empty() {
            return Err(PlannerError::MissingDataFile { files: missing });
        }

        let ratings = parse_class_ratings(storage.read_file(RATINGS_FILE).await?.as_slice())?;
        let defaults = parse_default_comps(storage.read_file(DEFAULTS_FILE).await?.as_slice())?;
        let rulesets = parse_rulesets(&storage.read_file(RULESETS_FILE).await?)?;
        let meta_builds = if storage.exists(META_BUILDS_FILE).await {
            let raw = storage.read_file(META_BUILDS_FILE).await?;
            parse_meta_builds(&String::from_utf8_lossy(&raw))
        } else {
            tracing::debug!("{} not present; meta builds disabled", META_BUILDS_FILE);
            CompTable::new()
        };

        let catalog = Self::from_parts(ratings, defaults, rulesets, meta_builds)?;
        tracing::info!(
            eras = catalog.era_options().len(),
            rulesets = catalog.rulesets.len(),
            "planner data loaded"
        );
        Ok(catalog)
    }

    pub fn from_parts(
        ratings: Ratings,
        defaults: CompTable,
        rulesets: Rulesets,
        meta_builds: CompTable,
    ) -> Result<Self> {
        let catalog = Self {
            ratings,
            defaults,
            rulesets,
            meta_builds,
        };
        if catalog.era_options().is_empty() {
            return Err(PlannerError::data_schema(
                RATINGS_FILE,
                format!("No eras found in {} / {}.", RATINGS_FILE, DEFAULTS_FILE),
            ));
        }
        if catalog.rulesets.is_empty() {
            return Err(PlannerError::data_schema(
                RULESETS_FILE,
                "rulesets.json has no rulesets.",
            ));
        }
        Ok(catalog)
    }

    /// Known eras present in either ratings or defaults, in display order.
    pub fn era_options(&self) -> Vec<&'static str> {
        ERA_ORDER
            .into_iter()
            .filter(|era| self.ratings.contains_key(*era) || self.defaults.contains_key(*era))
            .collect()
    }

    /// `(era classes + ruleset additions) - ruleset removals`, sorted.
    pub fn available_classes(&self, era: &str, ruleset: &Ruleset) -> Vec<ClassName> {
        let mut classes: BTreeSet<ClassName> = self
            .ratings
            .get(era)
            .map(|by_class| by_class.keys().cloned().collect())
            .unwrap_or_default();
        if let Some(additions) = ruleset.add_classes_by_era.get(era) {
            classes.extend(additions.iter().cloned());
        }
        if let Some(removals) = ruleset.remove_classes_by_era.get(era) {
            for class in removals {
                classes.remove(class);
            }
        }
        classes.into_iter().collect()
    }

    pub fn defaults_for(&self, era: &str, box_size: usize) -> Option<&[RankedComp]> {
        self.defaults
            .get(era)
            .and_then(|by_size| by_size.get(&box_size))
            .map(Vec::as_slice)
    }

    pub fn meta_builds_for(&self, era: &str, box_size: usize) -> &[RankedComp] {
        self.meta_builds
            .get(era)
            .and_then(|by_size| by_size.get(&box_size))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// FOUND/MISSING status of each required data file.
pub async fn list_data_files<S: Storage>(storage: &S) -> Vec<(&'static str, bool)> {
    let mut found = Vec::with_capacity(REQUIRED_FILES.len());
    for name in REQUIRED_FILES {
        found.push((name, storage.exists(name).await));
    }
    found
}

fn check_columns(file: &str, headers: &csv::StringRecord, required: &[&str]) -> Result<()> {
    if headers.is_empty() {
        return Err(PlannerError::data_schema(file, format!("{} has no header row.", file)));
    }
    let present: HashSet<&str> = headers.iter().map(str::trim).collect();
    let missing: BTreeSet<&str> = required
        .iter()
        .copied()
        .filter(|col| !present.contains(col))
        .collect();
    if !missing.is_empty() {
        return Err(PlannerError::data_schema(
            file,
            format!(
                "{} missing columns: {:?}",
                file,
                missing.into_iter().collect::<Vec<_>>()
            ),
        ));
    }
    Ok(())
}

fn column_index(headers: &csv::StringRecord, name: &str) -> usize {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .unwrap_or(usize::MAX)
}

fn field<'r>(record: &'r csv::StringRecord, index: usize) -> &'r str {
    record.get(index).unwrap_or("").trim()
}

fn parse_int<T: std::str::FromStr>(file: &str, line: usize, column: &str, raw: &str) -> Result<T> {
    raw.parse::<T>().map_err(|_| {
        PlannerError::data_format(
            file,
            line,
            format!("{} must be an integer, got '{}'.", column, raw),
        )
    })
}

fn split_classes(raw: &str) -> Vec<ClassName> {
    raw.split('|')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

fn sort_by_rank(table: &mut CompTable) {
    for by_size in table.values_mut() {
        for comps in by_size.values_mut() {
            comps.sort_by_key(|c| c.rank);
        }
    }
}

pub fn parse_class_ratings<R: Read>(reader: R) -> Result<Ratings> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut required = vec!["era", "class"];
    required.extend(Category::ALL.iter().map(|c| c.as_str()));
    check_columns(RATINGS_FILE, &headers, &required)?;

    let era_idx = column_index(&headers, "era");
    let class_idx = column_index(&headers, "class");
    let category_idx: Vec<(Category, usize)> = Category::ALL
        .iter()
        .map(|c| (*c, column_index(&headers, c.as_str())))
        .collect();

    let mut ratings = Ratings::new();
    for (offset, record) in rdr.records().enumerate() {
        let record = record?;
        let line = offset + 2;
        let era = field(&record, era_idx);
        let class = field(&record, class_idx);
        if era.is_empty() || class.is_empty() {
            return Err(PlannerError::data_format(
                RATINGS_FILE,
                line,
                "era/class cannot be blank.",
            ));
        }

        let mut scores = CategoryScores::default();
        for (category, idx) in &category_idx {
            let raw = field(&record, *idx);
            let value: i32 = parse_int(RATINGS_FILE, line, category.as_str(), raw)?;
            if !(0..=100).contains(&value) {
                return Err(PlannerError::data_format(
                    RATINGS_FILE,
                    line,
                    format!("{} must be 0-100, got {}.", category.as_str(), value),
                ));
            }
            scores.set(*category, value);
        }

        ratings
            .entry(era.to_string())
            .or_default()
            .insert(class.to_string(), scores);
    }

    Ok(ratings)
}

pub fn parse_default_comps<R: Read>(reader: R) -> Result<CompTable> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    check_columns(DEFAULTS_FILE, &headers, &["era", "box_size", "rank", "classes"])?;

    let era_idx = column_index(&headers, "era");
    let size_idx = column_index(&headers, "box_size");
    let rank_idx = column_index(&headers, "rank");
    let classes_idx = column_index(&headers, "classes");

    let mut table = CompTable::new();
    for (offset, record) in rdr.records().enumerate() {
        let record = record?;
        let line = offset + 2;
        let era = field(&record, era_idx);
        let box_size: usize = parse_int(DEFAULTS_FILE, line, "box_size", field(&record, size_idx))?;
        let rank: u32 = parse_int(DEFAULTS_FILE, line, "rank", field(&record, rank_idx))?;
        let classes_raw = field(&record, classes_idx);
        let classes = split_classes(classes_raw);

        if classes.len() != box_size {
            return Err(PlannerError::data_format(
                DEFAULTS_FILE,
                line,
                format!(
                    "classes count ({}) must equal box_size ({}). Got: '{}'",
                    classes.len(),
                    box_size,
                    classes_raw
                ),
            ));
        }

        table
            .entry(era.to_string())
            .or_default()
            .entry(box_size)
            .or_default()
            .push(RankedComp { rank, classes });
    }

    sort_by_rank(&mut table);
    Ok(table)
}

pub fn parse_rulesets(bytes: &[u8]) -> Result<Rulesets> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    let object = match value {
        serde_json::Value::Object(map) if !map.is_empty() => map,
        _ => {
            return Err(PlannerError::data_schema(
                RULESETS_FILE,
                "rulesets.json must be a non-empty JSON object at the top level.",
            ))
        }
    };

    let mut entries = Vec::with_capacity(object.len());
    for (key, raw) in object {
        let Some(fields) = raw.as_object() else {
            return Err(PlannerError::data_schema(
                RULESETS_FILE,
                format!("Ruleset '{}' must map to an object.", key),
            ));
        };
        if let Some(missing) = RULESET_FIELDS.iter().find(|f| !fields.contains_key(**f)) {
            return Err(PlannerError::data_schema(
                RULESETS_FILE,
                format!("Ruleset '{}' missing required field '{}'.", key, missing),
            ));
        }
        let ruleset: Ruleset = serde_json::from_value(raw)?;
        entries.push((key, ruleset));
    }

    Ok(Rulesets::new(entries))
}

/// Lenient: comment lines, short lines and malformed rows are skipped.
pub fn parse_meta_builds(text: &str) -> CompTable {
    let mut table = CompTable::new();
    for (offset, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.splitn(4, ',').map(str::trim).collect();
        if parts.len() < 4 {
            continue;
        }
        let (Ok(box_size), Ok(rank)) = (parts[1].parse::<usize>(), parts[2].parse::<u32>()) else {
            tracing::debug!(
                "{} line {}: skipping non-numeric size/rank",
                META_BUILDS_FILE,
                offset + 1
            );
            continue;
        };
        let classes = split_classes(parts[3]);
        if classes.len() != box_size {
            tracing::debug!(
                "{} line {}: class count does not match box size",
                META_BUILDS_FILE,
                offset + 1
            );
            continue;
        }
        table
            .entry(parts[0].to_string())
            .or_default()
            .entry(box_size)
            .or_default()
            .push(RankedComp { rank, classes });
    }
    sort_by_rank(&mut table);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATINGS: &str = "era,class,dps,healing,tanking,pet_tanking,solo,sustain,kite,charm\n\
ckv,Warrior,40,0,95,0,30,40,0,0\n\
ckv,Cleric,10,95,20,0,20,70,0,0\n\
luclin,Beastlord,70,20,10,60,80,50,20,0\n";

    #[test]
    fn test_parse_class_ratings() {
        let ratings = parse_class_ratings(RATINGS.as_bytes()).unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings["ckv"]["Warrior"].get(Category::Tanking), 95);
        assert_eq!(ratings["luclin"]["Beastlord"].get(Category::PetTanking), 60);
    }

    #[test]
    fn test_parse_class_ratings_missing_columns_are_listed_sorted() {
        let err = parse_class_ratings("era,class,dps,healing\nckv,Warrior,1,2\n".as_bytes())
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("missing columns"));
        let charm = message.find("charm").unwrap();
        let tanking = message.find("tanking").unwrap();
        assert!(charm < tanking);
    }

    #[test]
    fn test_parse_class_ratings_rejects_out_of_range() {
        let csv = "era,class,dps,healing,tanking,pet_tanking,solo,sustain,kite,charm\n\
ckv,Monk,101,0,0,0,0,0,0,0\n";
        let err = parse_class_ratings(csv.as_bytes()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "class_ratings.csv line 2: dps must be 0-100, got 101."
        );
    }

    #[test]
    fn test_parse_class_ratings_rejects_blank_class() {
        let csv = "era,class,dps,healing,tanking,pet_tanking,solo,sustain,kite,charm\n\
ckv, ,1,0,0,0,0,0,0,0\n";
        assert!(matches!(
            parse_class_ratings(csv.as_bytes()),
            Err(PlannerError::DataFormatError { line: 2, .. })
        ));
    }

    #[test]
    fn test_parse_default_comps_sorted_by_rank() {
        let csv = "era,box_size,rank,classes\n\
ckv,2,2,Paladin|Cleric\n\
ckv,2,1,Shadowknight | Shaman\n";
        let table = parse_default_comps(csv.as_bytes()).unwrap();
        let comps = &table["ckv"][&2];
        assert_eq!(comps[0].rank, 1);
        assert_eq!(comps[0].classes, vec!["Shadowknight", "Shaman"]);
        assert_eq!(comps[1].rank, 2);
    }

    #[test]
    fn test_parse_default_comps_count_mismatch() {
        let csv = "era,box_size,rank,classes\nckv,3,1,Warrior|Cleric\n";
        let err = parse_default_comps(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("classes count (2) must equal box_size (3)"));
    }

    #[test]
    fn test_parse_rulesets_preserves_order_and_requires_fields() {
        let json = br#"{
            "vanilla": {"label": "Vanilla", "add_classes_by_era": {}, "remove_classes_by_era": {}, "weight_modifiers": {}},
            "frostreaver": {"label": "Frostreaver", "add_classes_by_era": {"ckv": ["Beastlord"]}, "remove_classes_by_era": null, "weight_modifiers": {}}
        }"#;
        let rulesets = parse_rulesets(json).unwrap();
        assert_eq!(rulesets.keys().collect::<Vec<_>>(), vec!["vanilla", "frostreaver"]);
        assert_eq!(rulesets.label("frostreaver"), "Frostreaver");

        let missing =
            br#"{"x": {"label": "X", "add_classes_by_era": {}, "remove_classes_by_era": {}}}"#;
        let err = parse_rulesets(missing).unwrap_err();
        assert!(err.to_string().contains("missing required field 'weight_modifiers'"));

        assert!(parse_rulesets(b"{}").is_err());
        assert!(parse_rulesets(b"[]").is_err());
    }

    #[test]
    fn test_parse_meta_builds_is_lenient() {
        let text = "# era,box,rank,classes\n\
\n\
ckv,2,2,Necromancer|Enchanter\n\
ckv,2,1,Shadowknight|Shaman\n\
ckv,two,1,Warrior|Cleric\n\
ckv,3,1,Warrior|Cleric\n\
short,line\n";
        let table = parse_meta_builds(text);
        let comps = &table["ckv"][&2];
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].classes, vec!["Shadowknight", "Shaman"]);
        assert!(!table["ckv"].contains_key(&3));
    }

    #[test]
    fn test_available_classes_applies_ruleset() {
        let ratings = parse_class_ratings(RATINGS.as_bytes()).unwrap();
        let rulesets = parse_rulesets(
            br#"{"fr": {"label": "FR", "add_classes_by_era": {"ckv": ["Beastlord"]}, "remove_classes_by_era": {"ckv": ["Warrior"]}, "weight_modifiers": {}}}"#,
        )
        .unwrap();
        let catalog =
            Catalog::from_parts(ratings, CompTable::new(), rulesets, CompTable::new()).unwrap();
        let ruleset = catalog.rulesets.get("fr").unwrap();
        assert_eq!(
            catalog.available_classes("ckv", ruleset),
            vec!["Beastlord".to_string(), "Cleric".to_string()]
        );
        assert_eq!(catalog.era_options(), vec!["ckv", "luclin"]);
    }
}
