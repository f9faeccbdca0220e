use crate::core::planner::PlanRequest;
use crate::domain::model::{BoxingMode, Focus, KitingStyle, StartCondition, TwoBoxMode};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "multibox-planner")]
#[command(version, about = "Recommends EverQuest multibox group compositions")]
pub struct Cli {
    /// Path to planner.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the rating, defaults and ruleset files
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Score and rank compositions
    Recommend(RecommendArgs),
    /// Show curated meta builds
    Meta(RequestArgs),
    /// List the eras present in the data
    Eras,
    /// List the classes available in an era under a ruleset
    Classes {
        #[arg(long)]
        era: Option<String>,
        #[arg(long)]
        ruleset: Option<String>,
    },
    /// List rulesets
    Rulesets,
    /// Report which data files are present
    CheckData,
    /// Write recommendations to planner_export.zip
    Export(ExportArgs),
}

/// Request options shared by every planning command. Unset options keep
/// the configured defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct RequestArgs {
    #[arg(long)]
    pub era: Option<String>,

    #[arg(long = "box", value_name = "N")]
    pub box_size: Option<usize>,

    #[arg(long, value_enum)]
    pub two_box_mode: Option<TwoBoxMode>,

    #[arg(long, value_enum)]
    pub kiting_style: Option<KitingStyle>,

    #[arg(long)]
    pub ruleset: Option<String>,

    #[arg(long, value_enum)]
    pub mode: Option<BoxingMode>,

    #[arg(long, value_enum)]
    pub focus: Option<Focus>,

    #[arg(long, value_enum)]
    pub start: Option<StartCondition>,

    #[arg(long)]
    pub ports: bool,

    #[arg(long)]
    pub run_speed: bool,

    #[arg(long)]
    pub charm: bool,

    #[arg(long)]
    pub pet_heavy: bool,

    #[arg(long, value_delimiter = ',')]
    pub include: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,
}

impl RequestArgs {
    pub fn apply(&self, mut request: PlanRequest) -> PlanRequest {
        if let Some(era) = &self.era {
            request.era = era.clone();
        }
        if let Some(box_size) = self.box_size {
            request.box_size = box_size;
        }
        if let Some(mode) = self.two_box_mode {
            request.two_box_mode = mode;
        }
        if let Some(style) = self.kiting_style {
            request.kiting_style = style;
        }
        if let Some(ruleset) = &self.ruleset {
            request.ruleset = ruleset.clone();
        }
        if let Some(mode) = self.mode {
            request.boxing_mode = mode;
        }
        if let Some(focus) = self.focus {
            request.focus = focus;
        }
        if let Some(start) = self.start {
            request.start = start;
        }
        request.require_ports |= self.ports;
        request.require_run_speed |= self.run_speed;
        request.require_charm |= self.charm;
        request.require_pet_heavy |= self.pet_heavy;
        if !self.include.is_empty() {
            request.must_include = self.include.clone();
        }
        if !self.exclude.is_empty() {
            request.exclude = self.exclude.clone();
        }
        request
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct RecommendArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    #[arg(long, help = "Print the plan as JSON")]
    pub json: bool,

    #[arg(long, help = "Show the score breakdown for each comp")]
    pub explain: bool,

    #[arg(long, help = "Show which slots were forced by constraints")]
    pub show_forced: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Directory to write the bundle into
    #[arg(long)]
    pub output: Option<String>,

    #[arg(long, help = "Export meta builds instead of scored comps")]
    pub meta: bool,
}
