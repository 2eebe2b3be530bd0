use std::path::{Path, PathBuf};
use std::str::FromStr;

use meddpicc_core::export::ExportFormat;
use tracing::info;

use crate::commands::{prepare_assessment, CommandResult, EXIT_EXPORT, EXIT_INPUT};

pub fn run(
    config_path: Option<PathBuf>,
    answers_path: &Path,
    format: &str,
    opportunity: Option<String>,
) -> CommandResult {
    let format = match ExportFormat::from_str(format) {
        Ok(format) => format,
        Err(error) => {
            return CommandResult::failure("assess", "export_format", error.to_string(), EXIT_INPUT)
        }
    };
    let prepared = prepare_assessment("assess", config_path, answers_path, opportunity);
    let (engine, store) = match prepared {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let assessment = engine.recompute(&store, None);
    info!(
        event_name = "cli.assess",
        opportunity_id = %assessment.opportunity_id,
        format = format.as_str(),
        total_score = assessment.total_score,
        "assessment rendered"
    );

    match engine.export(&assessment, format) {
        Ok(rendered) => CommandResult::raw(rendered),
        Err(error) => CommandResult::failure("assess", "export", error.to_string(), EXIT_EXPORT),
    }
}
