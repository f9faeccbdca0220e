use clap::Parser;
use multibox_planner::config::cli::{Cli, Command, ExportArgs, RecommendArgs, RequestArgs};
use multibox_planner::core::catalog::list_data_files;
use multibox_planner::core::report::{render_text, ReportOptions};
use multibox_planner::domain::model::era_label;
use multibox_planner::utils::error::ErrorSeverity;
use multibox_planner::utils::{logger, validation::Validate};
use multibox_planner::{
    Catalog, LocalStorage, PlanExporter, PlanRequest, Planner, PlannerConfig, PlannerError,
    RecommendationCache, Result,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::info!("Starting multibox-planner");

    let config = match PlannerConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }
    if cli.verbose {
        tracing::debug!("Planner config: {:?}", config);
    }

    let data_dir = cli.data_dir.clone().unwrap_or_else(|| config.data.dir.clone());
    let storage = LocalStorage::new(data_dir);

    if let Err(e) = run(cli.command, &storage, &config).await {
        tracing::error!(
            "❌ Planner failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(command: Command, storage: &LocalStorage, config: &PlannerConfig) -> Result<()> {
    match command {
        Command::Recommend(args) => recommend(args, storage, config).await,
        Command::Meta(args) => meta(args, storage, config).await,
        Command::Eras => {
            let planner = load_planner(storage, config).await?;
            for era in planner.catalog().era_options() {
                println!("{:<8} {}", era, era_label(era));
            }
            Ok(())
        }
        Command::Classes { era, ruleset } => {
            let planner = load_planner(storage, config).await?;
            let mut request = config.defaults.clone();
            if let Some(era) = era {
                request.era = era;
            }
            if let Some(ruleset) = ruleset {
                request.ruleset = ruleset;
            }
            for warning in request.sanitize(planner.catalog()) {
                eprintln!("⚠ {}", warning);
            }
            let catalog = planner.catalog();
            let classes = catalog
                .rulesets
                .get(&request.ruleset)
                .map(|rs| catalog.available_classes(&request.era, rs))
                .unwrap_or_default();
            println!(
                "{} / {} ({} classes)",
                era_label(&request.era),
                catalog.rulesets.label(&request.ruleset),
                classes.len()
            );
            for class in classes {
                println!("  {}", class);
            }
            Ok(())
        }
        Command::Rulesets => {
            let planner = load_planner(storage, config).await?;
            for (key, ruleset) in planner.catalog().rulesets.iter() {
                println!("{:<16} {}", key, ruleset.label);
            }
            Ok(())
        }
        Command::CheckData => check_data(storage).await,
        Command::Export(args) => export(args, storage, config).await,
    }
}

async fn load_planner(storage: &LocalStorage, config: &PlannerConfig) -> Result<Planner> {
    tracing::info!("📁 Loading planner data from: {}", storage.base_path());
    let catalog = Arc::new(Catalog::load(storage).await?);
    let cache = match config.cache.ttl() {
        Some(ttl) => RecommendationCache::with_ttl(config.cache.capacity, ttl),
        None => RecommendationCache::new(config.cache.capacity),
    };
    Ok(Planner::new(catalog, cache)
        .with_limits(config.recommend.limit, config.recommend.meta_limit))
}

/// Out-of-range selections are not rejected here; `Planner::plan` sanitizes them.
fn build_request(args: &RequestArgs, config: &PlannerConfig) -> PlanRequest {
    args.apply(config.defaults.clone())
}

async fn recommend(
    args: RecommendArgs,
    storage: &LocalStorage,
    config: &PlannerConfig,
) -> Result<()> {
    let planner = load_planner(storage, config).await?;
    let mut request = build_request(&args.request, config);
    request.explain |= args.explain;

    let plan = planner.plan(request)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        let options = ReportOptions {
            explain: plan.request.explain,
            show_forced: args.show_forced,
        };
        print!("{}", render_text(&plan, options));
    }
    Ok(())
}

async fn meta(args: RequestArgs, storage: &LocalStorage, config: &PlannerConfig) -> Result<()> {
    let planner = load_planner(storage, config).await?;
    let mut request = build_request(&args, config);
    request.use_meta_builds = true;

    let plan = planner.plan(request)?;
    print!("{}", render_text(&plan, ReportOptions::default()));
    Ok(())
}

async fn export(args: ExportArgs, storage: &LocalStorage, config: &PlannerConfig) -> Result<()> {
    let planner = load_planner(storage, config).await?;
    let mut request = build_request(&args.request, config);
    request.use_meta_builds = args.meta;

    let plan = planner.plan(request)?;
    let output = args
        .output
        .unwrap_or_else(|| config.export.output_path.clone());
    let exporter = PlanExporter::new(LocalStorage::new(output.clone()), output);
    let path = exporter.export(&plan).await?;

    println!("✅ Export completed successfully!");
    println!("📁 Output saved to: {}", path);
    Ok(())
}

async fn check_data(storage: &LocalStorage) -> Result<()> {
    println!("Data directory: {}", storage.base_path());
    let files = list_data_files(storage).await;
    let mut missing = Vec::new();
    for (name, found) in &files {
        println!("  {:<28} {}", name, if *found { "FOUND" } else { "MISSING" });
        if !found {
            missing.push(name.to_string());
        }
    }
    if !missing.is_empty() {
        return Err(PlannerError::MissingDataFile { files: missing });
    }

    let catalog = Catalog::load(storage).await?;
    println!(
        "✅ Data OK: {} era(s), {} ruleset(s)",
        catalog.era_options().len(),
        catalog.rulesets.len()
    );
    Ok(())
}
