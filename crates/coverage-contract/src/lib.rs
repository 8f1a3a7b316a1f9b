//! # coverage-contract
//!
//! The coverage eligibility ledger: resource operations over a key/value
//! world state, eligibility evaluation of `CoverageEligibilityRequest`s and
//! publishing of the resulting responses.

pub mod config;
pub mod contract;
pub mod eligibility;
pub mod observability;
pub mod service;

pub use contract::CoverageContract;
pub use eligibility::EligibilityEvaluator;
pub use observability::{apply_logging_level, init_tracing, init_tracing_with_level};
pub use service::{AddOutcome, PublishStatus, ResourceService};
