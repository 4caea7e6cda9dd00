//! Constraint solving: model construction, objective, orchestration.
//!
//! The pipeline is `ModelBuilder` (event + policy → compiled constraint
//! problem) driven by `Orchestrator` (solve, extract, explain). All
//! business rules live in the builder; the orchestrator only talks to the
//! backend and runs the explanation protocol.

mod assumption;
mod builder;
mod config;
mod objective;
mod orchestrator;

pub use assumption::AssumptionTag;
pub use builder::{CompiledModel, ModelBuilder, ModelError, ObjectiveMode};
pub use config::{
    SchedulingPolicy, SolveConfig, TypeQuota, DEFAULT_REST_MINUTES,
    DEFAULT_REST_WINDOW_END_MIN, DEFAULT_REST_WINDOW_START_MIN, SCORING_STEP_MINUTES,
};
pub use objective::{adjusted_theoretical_minutes, preference_score, ObjectiveSummary};
pub use orchestrator::{
    Orchestrator, SolutionCallback, SolveOutcome, SolveStats, SolveStatus,
};
