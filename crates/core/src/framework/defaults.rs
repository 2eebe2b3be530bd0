use super::{
    AnswerOption, CoachingPrompt, FrameworkDefinition, Pillar, PillarId, PipelineStage, Question,
    QuestionId, StageGate,
};

struct QuestionSeed {
    id: &'static str,
    text: &'static str,
    tooltip: &'static str,
}

struct PillarSeed {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    questions: &'static [QuestionSeed],
}

struct PromptSeed {
    pillar: &'static str,
    question_id: Option<&'static str>,
    trigger_value: &'static str,
    prompt_text: &'static str,
    action_items: &'static [&'static str],
}

/// Every pillar is worth 40 points; four-question pillars score 10 per question,
/// five-question pillars score 8.
const PILLAR_POINTS: u32 = 40;

const PILLAR_SEEDS: &[PillarSeed] = &[
    PillarSeed {
        id: "metrics",
        title: "Metrics",
        description: "Quantifiable measures of the value the customer expects to gain.",
        questions: &[
            QuestionSeed {
                id: "metrics_quantified",
                text: "Has the customer quantified the economic impact of solving the problem?",
                tooltip: "Look for a number the customer produced, not one we suggested.",
            },
            QuestionSeed {
                id: "metrics_baseline",
                text: "Is there an agreed baseline for the current state?",
                tooltip: "Without a baseline the improvement cannot be measured.",
            },
            QuestionSeed {
                id: "metrics_success_criteria",
                text: "Are measurable success criteria documented?",
                tooltip: "Criteria should be written down and shared with the buying team.",
            },
            QuestionSeed {
                id: "metrics_roi_validated",
                text: "Has the customer validated the ROI model?",
                tooltip: "A validated model has been reviewed by someone who owns the budget.",
            },
            QuestionSeed {
                id: "metrics_value_timeline",
                text: "Is there a timeline for realizing the expected value?",
                tooltip: "Time to value drives urgency and the close date.",
            },
        ],
    },
    PillarSeed {
        id: "economic_buyer",
        title: "Economic Buyer",
        description: "The person with final authority over the budget for this purchase.",
        questions: &[
            QuestionSeed {
                id: "eb_identified",
                text: "Has the economic buyer been identified by name?",
                tooltip: "A title is not enough; name the individual.",
            },
            QuestionSeed {
                id: "eb_met",
                text: "Have you met the economic buyer directly?",
                tooltip: "Second-hand access through the champion counts as partial.",
            },
            QuestionSeed {
                id: "eb_priorities",
                text: "Do you understand the economic buyer's priorities?",
                tooltip: "Priorities should come from the buyer, not from their team.",
            },
            QuestionSeed {
                id: "eb_budget_confirmed",
                text: "Has the economic buyer confirmed budget for this purchase?",
                tooltip: "Confirmed budget is allocated, not merely available.",
            },
        ],
    },
    PillarSeed {
        id: "decision_criteria",
        title: "Decision Criteria",
        description: "The formal criteria the customer will use to choose a solution.",
        questions: &[
            QuestionSeed {
                id: "dc_documented",
                text: "Are the decision criteria documented?",
                tooltip: "An RFP, scorecard or written list all qualify.",
            },
            QuestionSeed {
                id: "dc_technical",
                text: "Do you understand the technical criteria?",
                tooltip: "Integration, security and scale requirements.",
            },
            QuestionSeed {
                id: "dc_business",
                text: "Do you understand the business criteria?",
                tooltip: "Commercial terms, vendor viability and support expectations.",
            },
            QuestionSeed {
                id: "dc_influenced",
                text: "Have you influenced the criteria in your favor?",
                tooltip: "At least one criterion should reflect a unique strength.",
            },
            QuestionSeed {
                id: "dc_ranked",
                text: "Do you know how the criteria are weighted?",
                tooltip: "Weights tell you where to focus the proof of value.",
            },
        ],
    },
    PillarSeed {
        id: "decision_process",
        title: "Decision Process",
        description: "How the customer will make the decision, who is involved and when.",
        questions: &[
            QuestionSeed {
                id: "dp_steps_mapped",
                text: "Are the steps of the decision process mapped?",
                tooltip: "Evaluation, validation, negotiation and approval steps.",
            },
            QuestionSeed {
                id: "dp_stakeholders",
                text: "Are all stakeholders in the process identified?",
                tooltip: "Include technical evaluators and approvers, not only users.",
            },
            QuestionSeed {
                id: "dp_timeline",
                text: "Is there an agreed decision timeline?",
                tooltip: "Dates should be agreed with the customer, not forecast by us.",
            },
            QuestionSeed {
                id: "dp_approval_path",
                text: "Do you know who gives final approval?",
                tooltip: "Final approval may sit above the economic buyer.",
            },
            QuestionSeed {
                id: "dp_validated",
                text: "Has the customer validated the mapped process?",
                tooltip: "Walk the champion through the plan and confirm each step.",
            },
        ],
    },
    PillarSeed {
        id: "paper_process",
        title: "Paper Process",
        description: "The steps from verbal agreement to a signed contract.",
        questions: &[
            QuestionSeed {
                id: "pp_legal_review",
                text: "Do you understand the legal review process?",
                tooltip: "Who reviews the contract and how long it usually takes.",
            },
            QuestionSeed {
                id: "pp_procurement",
                text: "Is procurement engaged and their process understood?",
                tooltip: "Vendor onboarding often adds weeks.",
            },
            QuestionSeed {
                id: "pp_security_review",
                text: "Are security and compliance reviews scheduled?",
                tooltip: "Questionnaires and audits should be on the calendar.",
            },
            QuestionSeed {
                id: "pp_signatory",
                text: "Is the contract signatory identified?",
                tooltip: "The signatory may differ from the economic buyer.",
            },
        ],
    },
    PillarSeed {
        id: "implicate_pain",
        title: "Implicate the Pain",
        description: "The business pain driving the purchase and its consequences.",
        questions: &[
            QuestionSeed {
                id: "pain_identified",
                text: "Has a business pain been clearly identified?",
                tooltip: "A pain is a problem the customer admits to, in their words.",
            },
            QuestionSeed {
                id: "pain_cost",
                text: "Has the cost of the pain been quantified?",
                tooltip: "Cost may be revenue lost, spend wasted or risk carried.",
            },
            QuestionSeed {
                id: "pain_urgency",
                text: "Is there urgency to solve the pain now?",
                tooltip: "A compelling event makes inaction expensive.",
            },
            QuestionSeed {
                id: "pain_owner",
                text: "Does a senior owner feel the pain personally?",
                tooltip: "Pain owned by nobody rarely gets funded.",
            },
            QuestionSeed {
                id: "pain_consequence",
                text: "Does the customer understand the consequence of doing nothing?",
                tooltip: "Status quo is the most common competitor.",
            },
        ],
    },
    PillarSeed {
        id: "champion",
        title: "Champion",
        description: "An influential insider who actively sells on your behalf.",
        questions: &[
            QuestionSeed {
                id: "champion_identified",
                text: "Have you identified a potential champion?",
                tooltip: "A champion has influence, not just enthusiasm.",
            },
            QuestionSeed {
                id: "champion_power",
                text: "Does the champion have power and influence in the decision?",
                tooltip: "Others in the organization act on their recommendation.",
            },
            QuestionSeed {
                id: "champion_tested",
                text: "Has the champion been tested?",
                tooltip: "Ask them to do something that costs them effort or capital.",
            },
            QuestionSeed {
                id: "champion_selling",
                text: "Is the champion actively selling internally?",
                tooltip: "They bring you information you did not ask for.",
            },
            QuestionSeed {
                id: "champion_access",
                text: "Can the champion provide access to the economic buyer?",
                tooltip: "Access is the clearest proof of influence.",
            },
        ],
    },
    PillarSeed {
        id: "competition",
        title: "Competition",
        description: "Alternatives the customer is considering, including doing nothing.",
        questions: &[
            QuestionSeed {
                id: "comp_identified",
                text: "Are the competing alternatives identified?",
                tooltip: "Include internal builds and the status quo.",
            },
            QuestionSeed {
                id: "comp_differentiation",
                text: "Is your differentiation clear to the customer?",
                tooltip: "The customer should be able to say it back to you.",
            },
            QuestionSeed {
                id: "comp_status_quo",
                text: "Have you addressed the risk of the customer doing nothing?",
                tooltip: "Tie the status quo back to the implicated pain.",
            },
            QuestionSeed {
                id: "comp_position",
                text: "Do you know where you stand against each competitor?",
                tooltip: "Ask the champion for the current ranking.",
            },
        ],
    },
];

const PROMPT_SEEDS: &[PromptSeed] = &[
    PromptSeed {
        pillar: "metrics",
        question_id: None,
        trigger_value: "no",
        prompt_text: "Work with the customer to quantify the business impact in their own numbers.",
        action_items: &[
            "Schedule a value discovery session",
            "Agree on a baseline for the current state",
        ],
    },
    PromptSeed {
        pillar: "economic_buyer",
        question_id: None,
        trigger_value: "no",
        prompt_text: "Identify the economic buyer and secure a direct meeting.",
        action_items: &[
            "Ask the champion who signs off on budget",
            "Prepare an executive briefing tailored to the buyer",
        ],
    },
    PromptSeed {
        pillar: "economic_buyer",
        question_id: Some("eb_met"),
        trigger_value: "partial",
        prompt_text: "Convert second-hand access into a direct conversation with the economic buyer.",
        action_items: &["Ask the champion to co-host an introduction"],
    },
    PromptSeed {
        pillar: "decision_criteria",
        question_id: None,
        trigger_value: "no",
        prompt_text: "Document the decision criteria and validate them with the buying team.",
        action_items: &["Request the evaluation scorecard", "Map each criterion to a proof point"],
    },
    PromptSeed {
        pillar: "decision_process",
        question_id: None,
        trigger_value: "no",
        prompt_text: "Map the decision process step by step and confirm it with your champion.",
        action_items: &["Build a mutual action plan", "Confirm dates for each approval step"],
    },
    PromptSeed {
        pillar: "paper_process",
        question_id: None,
        trigger_value: "no",
        prompt_text: "Uncover the paper process early so legal and procurement do not stall the close.",
        action_items: &[
            "Ask how the last comparable contract was signed",
            "Send security documentation ahead of the review",
        ],
    },
    PromptSeed {
        pillar: "implicate_pain",
        question_id: None,
        trigger_value: "no",
        prompt_text: "Dig deeper into the business pain and the cost of leaving it unsolved.",
        action_items: &["Ask what happens if nothing changes this year"],
    },
    PromptSeed {
        pillar: "champion",
        question_id: None,
        trigger_value: "no",
        prompt_text: "Find and develop a champion who has influence over the decision.",
        action_items: &[
            "List stakeholders who benefit most from the outcome",
            "Give a candidate champion a small task to test commitment",
        ],
    },
    PromptSeed {
        pillar: "champion",
        question_id: Some("champion_tested"),
        trigger_value: "partial",
        prompt_text: "Test your champion by asking for access or information that costs them effort.",
        action_items: &["Request an introduction to the economic buyer"],
    },
    PromptSeed {
        pillar: "competition",
        question_id: None,
        trigger_value: "no",
        prompt_text: "Identify the competing alternatives, including the status quo, and \
                      sharpen your differentiation.",
        action_items: &["Ask the champion which alternatives are under review"],
    },
];

fn yes_partial_no(points: u32) -> Vec<AnswerOption> {
    vec![
        AnswerOption { label: "Yes".to_string(), value: "yes".to_string(), score: points },
        AnswerOption {
            label: "Partially".to_string(),
            value: "partial".to_string(),
            score: points / 2,
        },
        AnswerOption { label: "No".to_string(), value: "no".to_string(), score: 0 },
    ]
}

fn pillar_from_seed(seed: &PillarSeed) -> Pillar {
    let per_question = PILLAR_POINTS / seed.questions.len() as u32;
    Pillar {
        id: PillarId::new(seed.id),
        title: seed.title.to_string(),
        description: seed.description.to_string(),
        questions: seed
            .questions
            .iter()
            .map(|question| Question {
                id: QuestionId::new(question.id),
                text: question.text.to_string(),
                tooltip: question.tooltip.to_string(),
                options: yes_partial_no(per_question),
            })
            .collect(),
    }
}

fn gate(stage: PipelineStage, min_percent: u8, pillars: &[&str]) -> StageGate {
    StageGate {
        stage,
        min_percent,
        all_pillars: pillars.is_empty(),
        pillars: pillars.iter().map(|id| PillarId::new(*id)).collect(),
    }
}

pub(super) fn definition() -> FrameworkDefinition {
    FrameworkDefinition {
        pillars: PILLAR_SEEDS.iter().map(pillar_from_seed).collect(),
        stages: vec![
            gate(PipelineStage::Prospect, 50, &["metrics", "implicate_pain"]),
            gate(
                PipelineStage::Engage,
                50,
                &["metrics", "implicate_pain", "champion", "economic_buyer"],
            ),
            gate(PipelineStage::Acquire, 60, &[]),
            gate(PipelineStage::Keep, 75, &[]),
        ],
        coaching_prompts: PROMPT_SEEDS
            .iter()
            .map(|seed| CoachingPrompt {
                pillar: PillarId::new(seed.pillar),
                question_id: seed.question_id.map(QuestionId::new),
                trigger_value: seed.trigger_value.to_string(),
                prompt_text: seed.prompt_text.to_string(),
                action_items: seed.action_items.iter().map(|item| item.to_string()).collect(),
            })
            .collect(),
    }
}
