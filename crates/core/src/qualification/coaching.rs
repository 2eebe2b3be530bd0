//! Coaching prompt selection.

use crate::domain::answer::Answer;
use crate::framework::{CoachingPrompt, Framework, PillarId};

/// Returns every configured prompt triggered by at least one answer.
///
/// Prompts are returned once each, in configuration table order.
pub fn select_prompts<'a>(
    framework: &Framework,
    answers: impl IntoIterator<Item = &'a Answer>,
) -> Vec<CoachingPrompt> {
    let answers: Vec<&Answer> = answers.into_iter().collect();

    framework
        .coaching_prompts()
        .iter()
        .filter(|prompt| {
            answers.iter().any(|answer| {
                prompt.matches(&answer.pillar, &answer.question_id, &answer.answer_value)
            })
        })
        .cloned()
        .collect()
}

/// First pillar-level prompt for `trigger_value`, falling back to a question-level one.
pub fn prompt_for_branch<'a>(
    framework: &'a Framework,
    pillar: &PillarId,
    trigger_value: &str,
) -> Option<&'a CoachingPrompt> {
    let candidates = || {
        framework
            .coaching_prompts()
            .iter()
            .filter(move |prompt| &prompt.pillar == pillar && prompt.trigger_value == trigger_value)
    };
    candidates().find(|prompt| prompt.question_id.is_none()).or_else(|| candidates().next())
}
