#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use multibox_planner::config::cli::{Cli, Command};
use multibox_planner::core::export::EXPORT_FILE;
use multibox_planner::core::planner::Recommendation;
use multibox_planner::domain::model::{groups, Focus, KitingStyle, Slot, TwoBoxMode};
use multibox_planner::utils::error::ErrorSeverity;
use multibox_planner::{
    Catalog, LocalStorage, Outcome, PlanExporter, PlanRequest, Planner, PlannerError,
    RecommendationCache,
};
use std::sync::Arc;
use tempfile::TempDir;

const RATINGS: &str = "era,class,dps,healing,tanking,pet_tanking,solo,sustain,kite,charm
ckv,Warrior,55,0,95,0,30,40,10,0
ckv,Shadowknight,60,10,88,20,55,60,35,0
ckv,Paladin,45,35,85,0,45,65,10,0
ckv,Cleric,20,98,20,0,25,80,5,0
ckv,Druid,55,75,10,10,75,70,85,30
ckv,Shaman,45,85,15,10,65,85,30,0
ckv,Enchanter,40,0,0,30,60,90,20,95
ckv,Bard,45,15,15,0,70,70,90,40
ckv,Magician,75,0,0,85,80,55,30,0
ckv,Necromancer,70,5,0,80,90,85,95,40
ckv,Wizard,95,0,0,0,45,35,80,0
ckv,Monk,85,0,20,0,50,40,20,0
ckv,Rogue,90,0,10,0,30,30,5,0
ckv,Ranger,65,10,25,0,55,45,70,0
";

const DEFAULTS: &str = "era,box_size,rank,classes
ckv,2,2,Warrior|Cleric
ckv,2,1,Shadowknight|Cleric
ckv,2,3,Necromancer|Enchanter
ckv,4,1,Warrior|Cleric|Shaman|Magician
";

const RULESETS: &str = r#"{
  "frostreaver": {
    "label": "Frostreaver",
    "add_classes_by_era": {},
    "remove_classes_by_era": {},
    "weight_modifiers": {}
  },
  "no_enchanter": {
    "label": "No Enchanter",
    "add_classes_by_era": null,
    "remove_classes_by_era": { "ckv": ["Enchanter"] },
    "weight_modifiers": {}
  },
  "beastlord_early": {
    "label": "Beastlords in Kunark",
    "add_classes_by_era": { "ckv": ["Beastlord"] },
    "remove_classes_by_era": {},
    "weight_modifiers": {}
  }
}"#;

const META_BUILDS: &str = "# era,box_size,rank,classes
ckv,2,6,Ranger|Druid
ckv,2,1,Shadowknight|Cleric
ckv,2,2,Necromancer|Enchanter
ckv,2,3,Warrior|Shaman
ckv,2,4,Paladin|Druid
ckv,2,5,Magician|Cleric
ckv,2,oops,Monk|Cleric
";

fn write_fixture(dir: &TempDir, with_meta: bool) {
    std::fs::write(dir.path().join("class_ratings.csv"), RATINGS).unwrap();
    std::fs::write(dir.path().join("synergies_and_defaults.csv"), DEFAULTS).unwrap();
    std::fs::write(dir.path().join("rulesets.json"), RULESETS).unwrap();
    if with_meta {
        std::fs::write(dir.path().join("meta_builds.csv"), META_BUILDS).unwrap();
    }
}

async fn planner_for(dir: &TempDir) -> Planner {
    let storage = LocalStorage::new(dir.path().to_str().unwrap());
    let catalog = Catalog::load(&storage).await.unwrap();
    Planner::new(Arc::new(catalog), RecommendationCache::new(32))
}

fn scored(outcome: &Outcome) -> &[Recommendation] {
    match outcome {
        Outcome::Scored { recommendations } => recommendations,
        other => panic!("expected scored outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_end_to_end_two_box_traditional() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture(&temp_dir, false);
    let planner = planner_for(&temp_dir).await;

    let plan = planner.plan(PlanRequest::default()).unwrap();

    assert_eq!(plan.slots, vec![Slot::Tank, Slot::Healer]);
    assert_eq!(plan.summary[1], "Box: 2");
    assert_eq!(plan.constraint_message, "No special constraints applied.");
    assert!(plan.warnings.is_empty());

    let recs = scored(&plan.outcome);
    assert!(!recs.is_empty());
    assert!(recs.len() <= 15);
    assert_eq!(recs[0].rank, 1);
    assert_eq!(recs[0].percent, 100);
    assert!(recs.windows(2).all(|w| w[0].score >= w[1].score));
    for rec in recs {
        assert_eq!(rec.classes.len(), 2);
        assert!(groups::contains(groups::TANKS, &rec.classes[0]));
        assert!(groups::contains(groups::HEALERS, &rec.classes[1]));
        assert!(rec.explanation.is_none());
    }
}

#[tokio::test]
async fn test_must_include_and_exclude_are_honored() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture(&temp_dir, false);
    let planner = planner_for(&temp_dir).await;

    let plan = planner
        .plan(PlanRequest {
            box_size: 4,
            must_include: vec!["Bard".to_string()],
            exclude: vec!["Cleric".to_string()],
            explain: true,
            ..PlanRequest::default()
        })
        .unwrap();

    assert_eq!(plan.slots, vec![Slot::Tank, Slot::Healer, Slot::Slow, Slot::Dps]);
    let recs = scored(&plan.outcome);
    assert!(!recs.is_empty());
    for rec in recs {
        assert!(rec.classes.iter().any(|c| c == "Bard"));
        assert!(rec.classes.iter().all(|c| c != "Cleric"));
        let explanation = rec.explanation.as_ref().unwrap();
        assert_eq!(explanation.slot_breakdowns.len(), 4);
        assert_eq!(explanation.total, rec.score);
    }
}

#[tokio::test]
async fn test_pet_heavy_constraint_forces_a_flex_slot() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture(&temp_dir, false);
    let planner = planner_for(&temp_dir).await;

    let plan = planner
        .plan(PlanRequest {
            box_size: 4,
            require_pet_heavy: true,
            ..PlanRequest::default()
        })
        .unwrap();

    assert_eq!(
        plan.constraint_message,
        "1 constraint(s) active. Results are restricted."
    );
    assert_eq!(plan.forced.len(), 1);
    assert_eq!(plan.forced[0].index, 1);
    assert_eq!(plan.forced[0].pool, vec!["Magician", "Necromancer"]);

    let recs = scored(&plan.outcome);
    assert!(!recs.is_empty());
    for rec in recs {
        assert!(groups::any_in(groups::PET_DPS, &rec.classes));
    }
}

#[tokio::test]
async fn test_hardcore_pins_cleric_shaman_bard() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture(&temp_dir, false);
    let planner = planner_for(&temp_dir).await;

    let plan = planner
        .plan(PlanRequest {
            box_size: 4,
            focus: Focus::SoloRaid,
            ..PlanRequest::default()
        })
        .unwrap();

    assert_eq!(plan.slots, vec![Slot::Tank, Slot::Healer, Slot::Slow, Slot::Cc]);
    let recs = scored(&plan.outcome);
    assert!(!recs.is_empty());
    for rec in recs {
        assert_eq!(&rec.classes[1..], &["Cleric", "Shaman", "Bard"]);
    }
}

#[tokio::test]
async fn test_meta_builds_are_ranked_and_limited() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture(&temp_dir, true);
    let planner = planner_for(&temp_dir).await;

    let plan = planner
        .plan(PlanRequest {
            use_meta_builds: true,
            ..PlanRequest::default()
        })
        .unwrap();

    let Outcome::MetaBuilds { builds } = &plan.outcome else {
        panic!("expected meta builds");
    };
    let ranks: Vec<u32> = builds.iter().map(|b| b.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    assert_eq!(builds[0].classes, vec!["Shadowknight", "Cleric"]);
}

#[tokio::test]
async fn test_meta_builds_missing_file_warns() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture(&temp_dir, false);
    let planner = planner_for(&temp_dir).await;

    let plan = planner
        .plan(PlanRequest {
            use_meta_builds: true,
            ..PlanRequest::default()
        })
        .unwrap();

    assert_eq!(plan.outcome, Outcome::MetaBuilds { builds: vec![] });
    assert!(plan.warnings.iter().any(|w| w.contains("No meta builds")));
}

#[tokio::test]
async fn test_fallback_to_defaults_without_enchanter() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture(&temp_dir, false);
    let planner = planner_for(&temp_dir).await;

    let plan = planner
        .plan(PlanRequest {
            ruleset: "no_enchanter".to_string(),
            two_box_mode: TwoBoxMode::EnchCharmTank,
            ..PlanRequest::default()
        })
        .unwrap();

    assert_eq!(plan.slots, vec![Slot::CharmTank, Slot::CharmPartner]);
    assert!(!plan.available.iter().any(|c| c == "Enchanter"));
    assert!(plan
        .warnings
        .iter()
        .any(|w| w.starts_with("Enchanter is not available")));

    let Outcome::Fallback { defaults } = &plan.outcome else {
        panic!("expected fallback");
    };
    let shown: Vec<String> = defaults.iter().map(|d| d.classes.join(" | ")).collect();
    assert_eq!(shown, vec!["Shadowknight | Cleric", "Warrior | Cleric"]);
}

#[tokio::test]
async fn test_unknown_selections_are_sanitized() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture(&temp_dir, false);
    let planner = planner_for(&temp_dir).await;

    let plan = planner
        .plan(PlanRequest {
            era: "velious".to_string(),
            ruleset: "bogus".to_string(),
            box_size: 9,
            must_include: vec!["Beastlord".to_string()],
            ..PlanRequest::default()
        })
        .unwrap();

    assert_eq!(plan.request.era, "ckv");
    assert_eq!(plan.request.ruleset, "frostreaver");
    assert_eq!(plan.request.box_size, 2);
    assert!(plan.request.must_include.is_empty());
    assert_eq!(plan.warnings.len(), 4);
    assert!(matches!(plan.outcome, Outcome::Scored { .. }));
}

#[tokio::test]
async fn test_ruleset_can_add_classes_to_an_era() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture(&temp_dir, false);
    let planner = planner_for(&temp_dir).await;

    let request = PlanRequest {
        box_size: 3,
        ruleset: "beastlord_early".to_string(),
        must_include: vec!["Beastlord".to_string()],
        ..PlanRequest::default()
    };
    let plan = planner.plan(request.clone()).unwrap();

    assert_eq!(plan.ruleset_label, "Beastlords in Kunark");
    assert!(plan.available.iter().any(|c| c == "Beastlord"));
    assert_eq!(plan.request.must_include, vec!["Beastlord"]);
    assert!(plan.warnings.is_empty());
    let recs = scored(&plan.outcome);
    assert!(!recs.is_empty());
    for rec in recs {
        assert!(rec.classes.iter().any(|c| c == "Beastlord"));
    }

    let stock = planner
        .plan(PlanRequest {
            ruleset: "frostreaver".to_string(),
            ..request
        })
        .unwrap();
    assert!(!stock.available.iter().any(|c| c == "Beastlord"));
    assert!(stock.request.must_include.is_empty());
    assert_eq!(stock.warnings.len(), 1);
}

#[tokio::test]
async fn test_swarm_kiting_puts_bard_on_the_kite() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture(&temp_dir, false);
    let planner = planner_for(&temp_dir).await;

    let plan = planner
        .plan(PlanRequest {
            two_box_mode: TwoBoxMode::Kiting,
            kiting_style: KitingStyle::Swarm,
            ..PlanRequest::default()
        })
        .unwrap();

    assert_eq!(plan.slots, vec![Slot::KiterSwarm, Slot::KitePartnerSwarm]);
    assert_eq!(plan.summary.len(), 7);
    assert_eq!(plan.summary[6], "2-box: Kiting (choose style below)");
    let recs = scored(&plan.outcome);
    assert!(!recs.is_empty());
    for rec in recs {
        assert_eq!(rec.classes[0], "Bard");
        assert_ne!(rec.classes[1], "Bard");
    }
}

#[tokio::test]
async fn test_fear_snare_kiting_uses_fear_kiters() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture(&temp_dir, false);
    let planner = planner_for(&temp_dir).await;

    let plan = planner
        .plan(PlanRequest {
            two_box_mode: TwoBoxMode::Kiting,
            kiting_style: KitingStyle::FearSnare,
            ..PlanRequest::default()
        })
        .unwrap();

    assert_eq!(plan.slots, vec![Slot::KiterFearSnare, Slot::KitePartnerFearSnare]);
    let recs = scored(&plan.outcome);
    assert!(!recs.is_empty());
    for rec in recs {
        assert!(groups::contains(groups::FEAR_SNARE_KITERS, &rec.classes[0]));
        assert_ne!(rec.classes[0], rec.classes[1]);
    }
}

#[tokio::test]
async fn test_three_box_charm_swaps_tank_for_enchanter() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture(&temp_dir, false);
    let planner = planner_for(&temp_dir).await;

    let plan = planner
        .plan(PlanRequest {
            box_size: 3,
            require_charm: true,
            ..PlanRequest::default()
        })
        .unwrap();

    assert_eq!(plan.slots, vec![Slot::CharmTank, Slot::Healer, Slot::Dps]);
    assert_eq!(
        plan.constraint_message,
        "1 constraint(s) active. Results are restricted."
    );
    assert!(plan.forced.is_empty());
    let recs = scored(&plan.outcome);
    assert!(!recs.is_empty());
    for rec in recs {
        assert_eq!(rec.classes[0], "Enchanter");
        assert!(groups::contains(groups::HEALERS, &rec.classes[1]));
    }

    let two_box = planner
        .plan(PlanRequest {
            require_charm: true,
            ..PlanRequest::default()
        })
        .unwrap();
    assert_eq!(two_box.slots, vec![Slot::Tank, Slot::Healer]);
    assert_eq!(two_box.constraint_message, "No special constraints applied.");
}

#[cfg(feature = "cli")]
#[tokio::test]
async fn test_cli_box_size_out_of_range_is_sanitized() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture(&temp_dir, false);
    let planner = planner_for(&temp_dir).await;

    let cli = Cli::try_parse_from(["multibox-planner", "recommend", "--box", "9"]).unwrap();
    let Command::Recommend(args) = cli.command else {
        panic!("expected recommend");
    };
    let request = args.request.apply(PlanRequest::default());
    assert_eq!(request.box_size, 9);

    let plan = planner.plan(request).unwrap();
    assert_eq!(plan.request.box_size, 2);
    assert_eq!(plan.warnings, vec!["Unsupported box size 9; using 2."]);
    assert_eq!(plan.slots, vec![Slot::Tank, Slot::Healer]);
    assert!(matches!(plan.outcome, Outcome::Scored { .. }));
}

#[tokio::test]
async fn test_class_both_included_and_excluded_falls_back_empty() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture(&temp_dir, false);
    let planner = planner_for(&temp_dir).await;

    let plan = planner
        .plan(PlanRequest {
            must_include: vec!["Cleric".to_string()],
            exclude: vec!["Cleric".to_string()],
            ..PlanRequest::default()
        })
        .unwrap();

    assert_eq!(plan.outcome, Outcome::Fallback { defaults: vec![] });
    assert!(plan
        .warnings
        .iter()
        .any(|w| w.starts_with("No scored comps found")));
    assert!(plan.warnings.iter().any(|w| w == "No defaults match either."));
}

#[tokio::test]
async fn test_repeated_request_is_cached() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture(&temp_dir, false);
    let planner = planner_for(&temp_dir).await;

    let request = PlanRequest {
        box_size: 3,
        ..PlanRequest::default()
    };
    let first = planner.plan(request.clone()).unwrap();
    let second = planner.plan(request).unwrap();

    assert_eq!(first.outcome, second.outcome);
    assert_eq!(planner.cache().stats().entry_count, 1);
}

#[tokio::test]
async fn test_missing_data_files_are_listed() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("rulesets.json"), RULESETS).unwrap();
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap());

    let err = Catalog::load(&storage).await.unwrap_err();
    match &err {
        PlannerError::MissingDataFile { files } => {
            assert_eq!(files, &vec!["class_ratings.csv", "synergies_and_defaults.csv"]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.severity(), ErrorSeverity::Critical);
}

#[tokio::test]
async fn test_invalid_rating_reports_line() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture(&temp_dir, false);
    std::fs::write(
        temp_dir.path().join("class_ratings.csv"),
        "era,class,dps,healing,tanking,pet_tanking,solo,sustain,kite,charm\n\
         ckv,Warrior,55,0,95,0,30,40,10,0\n\
         ckv,Cleric,20,140,20,0,25,80,5,0\n",
    )
    .unwrap();
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap());

    let err = Catalog::load(&storage).await.unwrap_err();
    assert!(matches!(err, PlannerError::DataFormatError { line: 3, .. }));
}

#[tokio::test]
async fn test_export_bundle_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture(&temp_dir, false);
    let planner = planner_for(&temp_dir).await;
    let plan = planner.plan(PlanRequest::default()).unwrap();

    let out_dir = TempDir::new().unwrap();
    let output_path = out_dir.path().to_str().unwrap().to_string();
    let exporter = PlanExporter::new(LocalStorage::new(output_path.clone()), output_path.clone());
    let written = exporter.export(&plan).await.unwrap();
    assert!(written.ends_with(EXPORT_FILE));

    let full_path = out_dir.path().join(EXPORT_FILE);
    assert!(full_path.exists());

    let zip_data = std::fs::read(&full_path).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
    let file_names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(
        file_names,
        vec!["recommendations.csv", "plan.json", "manifest.json"]
    );

    let mut csv_file = archive.by_name("recommendations.csv").unwrap();
    let mut csv_content = String::new();
    std::io::Read::read_to_string(&mut csv_file, &mut csv_content).unwrap();
    let mut lines = csv_content.lines();
    assert_eq!(lines.next(), Some("rank,score,percent,classes"));
    assert!(lines.next().unwrap().starts_with("1,"));
}
