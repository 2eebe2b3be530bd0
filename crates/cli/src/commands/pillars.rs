use std::path::PathBuf;

use crate::commands::{load_config, CommandResult, EXIT_CONFIG};

pub fn run(config_path: Option<PathBuf>) -> CommandResult {
    let config = match load_config("pillars", config_path) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let framework = match config.load_framework() {
        Ok(framework) => framework,
        Err(error) => {
            return CommandResult::failure("pillars", "framework", error.to_string(), EXIT_CONFIG)
        }
    };

    let mut lines = Vec::with_capacity(framework.pillars().len() + 2);
    lines.push(format!(
        "framework: {} pillars, {} questions, max score {}",
        framework.pillars().len(),
        framework.total_questions(),
        framework.max_total_score()
    ));
    for pillar in framework.pillars() {
        lines.push(format!(
            "- {}: {} ({} questions, max {})",
            pillar.id,
            pillar.title,
            pillar.questions.len(),
            pillar.max_score()
        ));
    }
    for gate in framework.stages() {
        let scope = if gate.all_pillars {
            "all pillars".to_string()
        } else {
            gate.pillars.iter().map(|pillar| pillar.as_str()).collect::<Vec<_>>().join(", ")
        };
        lines.push(format!(
            "  stage {} requires {}% on {scope}",
            gate.stage.as_str(),
            gate.min_percent
        ));
    }

    CommandResult::raw(lines.join("\n"))
}
