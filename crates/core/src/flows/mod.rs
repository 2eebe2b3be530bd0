pub mod engine;
pub mod states;

pub use engine::{
    FlowDefinition, FlowEngine, QualificationTransitionError, StandardQualificationFlow,
};
pub use states::{
    QualificationAction, QualificationContext, QualificationEvent, QualificationState,
    TransitionOutcome,
};
