//! Volunteer shift scheduling for multi-day events.
//!
//! Assigns volunteers to time-boxed shifts ("quests") under hard
//! eligibility and availability constraints, optimizing a fairness-and-
//! preference objective. The crate builds the constraint model and
//! orchestrates an exact solver; it does not implement search itself.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Place`, `QuestType`, `Show`, `Quest`,
//!   `Volunteer`, `Event`, `Roster`
//! - **`grouping`**: Union-Find with payload merge (linked-quest groups)
//! - **`resolve`**: One-shot reference resolution ("strengthen")
//! - **`solver`**: Constraint-model builder, objective composer, solve
//!   orchestration and infeasibility explanation
//! - **`export`**: Flat/rich JSON and calendar projections of a roster
//! - **`validation`**: Input integrity and post-solve invariant checks
//!
//! # Pipeline
//!
//! Ingestion adapters populate an [`models::Event`] → [`resolve::strengthen`]
//! links cross-references exactly once → [`solver::ModelBuilder`] emits
//! decision variables and tagged constraints → [`solver::Orchestrator`]
//! drives the backend and extracts either a [`models::Roster`] or a minimal
//! explanation of why no roster exists.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Liffiton & Sakallah (2008), "Algorithms for Computing Minimal
//!   Unsatisfiable Subsets of Constraints"

pub mod export;
pub mod grouping;
pub mod models;
pub mod resolve;
pub mod solver;
pub mod validation;
