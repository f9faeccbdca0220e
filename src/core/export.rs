use crate::core::planner::{Outcome, Plan};
use crate::core::Storage;
use crate::utils::error::{PlannerError, Result};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const EXPORT_FILE: &str = "planner_export.zip";

/// Bundles a finished [`Plan`] into a zip archive written through a [`Storage`].
pub struct PlanExporter<S: Storage> {
    storage: S,
    output_path: String,
}

impl<S: Storage> PlanExporter<S> {
    pub fn new(storage: S, output_path: impl Into<String>) -> Self {
        Self {
            storage,
            output_path: output_path.into(),
        }
    }

    pub async fn export(&self, plan: &Plan) -> Result<String> {
        let output_path = format!("{}/{}", self.output_path.trim_end_matches('/'), EXPORT_FILE);

        let csv_data = recommendations_csv(plan)?;
        let plan_json = serde_json::to_string_pretty(plan)?;
        let manifest = serde_json::to_string_pretty(&serde_json::json!({
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "era": plan.request.era,
            "box_size": plan.request.box_size,
            "ruleset": plan.request.ruleset,
            "count": outcome_len(&plan.outcome),
        }))?;

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            zip.start_file::<_, ()>("recommendations.csv", FileOptions::default())?;
            zip.write_all(&csv_data)?;

            zip.start_file::<_, ()>("plan.json", FileOptions::default())?;
            zip.write_all(plan_json.as_bytes())?;

            zip.start_file::<_, ()>("manifest.json", FileOptions::default())?;
            zip.write_all(manifest.as_bytes())?;

            zip.finish()?.into_inner()
        };

        tracing::debug!("Writing export bundle ({} bytes)", zip_data.len());
        self.storage.write_file(EXPORT_FILE, &zip_data).await?;
        tracing::info!(path = %output_path, "export written");
        Ok(output_path)
    }
}

fn outcome_len(outcome: &Outcome) -> usize {
    match outcome {
        Outcome::Scored { recommendations } => recommendations.len(),
        Outcome::MetaBuilds { builds } => builds.len(),
        Outcome::Fallback { defaults } => defaults.len(),
    }
}

/// `rank,score,percent,classes`; curated and fallback rows leave score and percent blank.
pub fn recommendations_csv(plan: &Plan) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["rank", "score", "percent", "classes"])?;

    match &plan.outcome {
        Outcome::Scored { recommendations } => {
            for rec in recommendations {
                wtr.write_record([
                    rec.rank.to_string(),
                    rec.score.to_string(),
                    rec.percent.to_string(),
                    rec.classes.join(" | "),
                ])?;
            }
        }
        Outcome::MetaBuilds { builds: comps } | Outcome::Fallback { defaults: comps } => {
            for comp in comps {
                wtr.write_record([
                    comp.rank.to_string(),
                    String::new(),
                    String::new(),
                    comp.classes.join(" | "),
                ])?;
            }
        }
    }

    wtr.into_inner()
        .map_err(|e| PlannerError::IoError(e.into_error()))
}
