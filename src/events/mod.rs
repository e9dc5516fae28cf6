pub mod catalog;
pub mod resolver;

pub use catalog::{CHAOS_CHOICES, EventInfo, EventKind, pooled_kinds};
pub use resolver::{
    AnswerOutcome, EffectPlan, EventContext, ImmediateEffect, ImmediateOutcome, QuizPolicy,
    RerollState, TargetRequest, apply_immediate, plan, plan_id, resolve_answer,
};
