//! Solve orchestration and the explanation protocol.
//!
//! State machine: `Built → Solving → {Optimal, Feasible, Infeasible,
//! Unknown}`. The orchestrator drives the external backend, surfaces the
//! extracted roster through an optional solution callback, and, on
//! infeasibility, hunts for a minimal set of business-rule instances
//! that jointly force it, by re-solving feasibility-only models with tag
//! groups disabled (deletion-based MUS).
//!
//! Infeasibility is a first-class terminal status, never an error: the
//! outcome carries structured, human-readable causes. Deadline and
//! resource exhaustion degrade to best-effort results with an explicit
//! flag, never a silent success.
//!
//! # Reference
//! Liffiton & Sakallah (2008), "Algorithms for Computing Minimal
//! Unsatisfiable Subsets of Constraints"

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use good_lp::{default_solver, ResolutionError, Solution, SolverModel};
use tracing::{debug, info, warn};

use crate::models::{Event, Roster};

use super::assumption::AssumptionTag;
use super::builder::{CompiledModel, ModelBuilder, ModelError, ObjectiveMode};
use super::config::{SchedulingPolicy, SolveConfig};
use super::objective::ObjectiveSummary;

/// Terminal solve status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// A roster was found and proven optimal.
    Optimal,
    /// A roster was found but optimality was not proven. Reserved for
    /// deadline-bounded backends; the exact backend in use proves every
    /// completed solve and reports [`SolveStatus::Optimal`] instead, so
    /// this variant is currently never constructed.
    Feasible,
    /// No roster satisfies the model; see the explanation.
    Infeasible,
    /// The backend gave up without a verdict (resource limit, numeric
    /// failure).
    Unknown,
}

/// Counters reported alongside the outcome.
#[derive(Debug, Clone, Default)]
pub struct SolveStats {
    /// Total wall time of the orchestration.
    pub wall_time: Duration,
    /// Backend calls made (initial solve + probes).
    pub solve_calls: u32,
    /// How many of those were explanation probes.
    pub explanation_probes: u32,
}

/// Everything a solve run produces.
#[derive(Debug)]
pub struct SolveOutcome {
    /// Terminal status.
    pub status: SolveStatus,
    /// The assignment relation, when one exists.
    pub roster: Option<Roster>,
    /// Realized fairness/preference figures for the roster.
    pub summary: Option<ObjectiveSummary>,
    /// On infeasibility: a minimal set of rule instances that jointly
    /// force it, in tag order.
    pub explanation: Vec<AssumptionTag>,
    /// Whether the explanation search ran to completion (deadline may
    /// truncate it, leaving a sufficient but possibly non-minimal set).
    pub explanation_complete: bool,
    /// Runtime counters.
    pub stats: SolveStats,
}

/// Callback observing every extracted roster before the outcome returns.
pub type SolutionCallback<'a> = Box<dyn FnMut(&Roster, &ObjectiveSummary) + 'a>;

/// Drives the backend over a resolved event.
pub struct Orchestrator<'a> {
    event: &'a Event,
    policy: &'a SchedulingPolicy,
    config: SolveConfig,
    on_solution: Option<SolutionCallback<'a>>,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator with the default [`SolveConfig`].
    pub fn new(event: &'a Event, policy: &'a SchedulingPolicy) -> Self {
        Self {
            event,
            policy,
            config: SolveConfig::default(),
            on_solution: None,
        }
    }

    /// Sets the runtime configuration.
    pub fn with_config(mut self, config: SolveConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a callback invoked with each extracted roster.
    pub fn with_solution_callback(
        mut self,
        callback: impl FnMut(&Roster, &ObjectiveSummary) + 'a,
    ) -> Self {
        self.on_solution = Some(Box::new(callback));
        self
    }

    /// Builds the model and solves it to a terminal status.
    ///
    /// Only modeling errors surface as `Err`; unsatisfiable inputs come
    /// back as a normal [`SolveStatus::Infeasible`] outcome.
    pub fn solve(mut self) -> Result<SolveOutcome, ModelError> {
        let builder = ModelBuilder::new(self.event, self.policy)?;
        let started = Instant::now();
        let mut stats = SolveStats::default();

        if self.config.num_workers > 1 {
            debug!(
                workers = self.config.num_workers,
                "worker count is advisory for the single-threaded backend"
            );
        }

        info!(
            quests = self.event.quests().len(),
            volunteers = self.event.volunteers().len(),
            "solving"
        );
        let compiled = builder.build(&BTreeSet::new(), ObjectiveMode::Optimize);
        let all_tags = compiled.tags.clone();
        stats.solve_calls += 1;
        let mut outcome = match self.run_backend(compiled) {
            Ok(roster) => {
                let summary = ObjectiveSummary::compute(&roster, self.event, self.policy);
                if let Some(callback) = self.on_solution.as_mut() {
                    callback(&roster, &summary);
                }
                info!(
                    assignments = roster.assignment_count(),
                    objective = summary.objective_value,
                    "solved to optimality"
                );
                SolveOutcome {
                    status: SolveStatus::Optimal,
                    roster: Some(roster),
                    summary: Some(summary),
                    explanation: Vec::new(),
                    explanation_complete: true,
                    stats,
                }
            }
            Err(ResolutionError::Infeasible) => {
                info!("model is infeasible; extracting a minimal explanation");
                let (explanation, complete) =
                    self.explain(&builder, all_tags, started, &mut stats);
                SolveOutcome {
                    status: SolveStatus::Infeasible,
                    roster: None,
                    summary: None,
                    explanation,
                    explanation_complete: complete,
                    stats,
                }
            }
            Err(err) => {
                warn!(error = %err, "backend returned no verdict");
                SolveOutcome {
                    status: SolveStatus::Unknown,
                    roster: None,
                    summary: None,
                    explanation: Vec::new(),
                    explanation_complete: true,
                    stats,
                }
            }
        };
        outcome.stats.wall_time = started.elapsed();
        Ok(outcome)
    }

    /// Runs one backend call and extracts the roster on success.
    fn run_backend(&mut self, compiled: CompiledModel) -> Result<Roster, ResolutionError> {
        let CompiledModel {
            variables,
            assignment,
            constraints,
            objective,
            ..
        } = compiled;
        let mut problem = variables.minimise(objective).using(default_solver);
        for constraint in constraints {
            problem = problem.with(constraint);
        }
        let solution = problem.solve()?;

        let mut roster = Roster::new();
        for (qi, quest) in self.event.quests().iter().enumerate() {
            let assigned: Vec<String> = self
                .event
                .volunteers()
                .iter()
                .enumerate()
                .filter(|(vi, _)| solution.value(assignment[&(*vi, qi)]) > 0.5)
                .map(|(_, v)| v.id.clone())
                .collect();
            roster.add_slot(qi, quest.id.clone(), assigned);
        }
        Ok(roster)
    }

    /// Deletion-based minimal unsatisfiable subset over the tag universe.
    ///
    /// Walks every tag once: if the model stays infeasible with the tag
    /// disabled, the tag is not needed for the conflict and stays
    /// disabled; otherwise it is part of the explanation. Honors the
    /// external deadline between probes; a truncated walk returns the
    /// tags confirmed so far plus the ones not yet examined (sufficient,
    /// possibly non-minimal).
    fn explain(
        &mut self,
        builder: &ModelBuilder<'_>,
        all_tags: BTreeSet<AssumptionTag>,
        started: Instant,
        stats: &mut SolveStats,
    ) -> (Vec<AssumptionTag>, bool) {
        let mut disabled: BTreeSet<AssumptionTag> = BTreeSet::new();
        let mut kept: Vec<AssumptionTag> = Vec::new();
        let mut complete = true;

        let candidates: Vec<AssumptionTag> = all_tags.into_iter().collect();
        for (i, tag) in candidates.iter().enumerate() {
            if self
                .config
                .time_budget
                .is_some_and(|budget| started.elapsed() >= budget)
            {
                warn!("deadline hit during explanation; returning a partial core");
                kept.extend(candidates[i..].iter().cloned());
                complete = false;
                break;
            }
            let mut trial = disabled.clone();
            trial.insert(tag.clone());
            let probe = builder.build(&trial, ObjectiveMode::FeasibilityOnly);
            stats.solve_calls += 1;
            stats.explanation_probes += 1;
            match self.run_backend(probe) {
                Err(ResolutionError::Infeasible) => {
                    // Still conflicting without this rule: drop it.
                    disabled.insert(tag.clone());
                }
                Ok(_) => {
                    debug!(%tag, "rule instance is part of the conflict");
                    kept.push(tag.clone());
                }
                Err(err) => {
                    warn!(error = %err, "probe failed; keeping the rule conservatively");
                    kept.push(tag.clone());
                    complete = false;
                }
            }
        }
        kept.sort();
        (kept, complete)
    }
}
