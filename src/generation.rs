//! Generation Pipeline
//!
//! Turns a validated [`GenerationRequest`] into an immutable [`GenerationPlan`] and
//! drives that plan through the stage pipeline with per-stage provider fallback.

pub mod executor;
pub mod plan;
pub mod recommend;
pub mod request;

pub use executor::JobExecutor;
pub use plan::{enrich_prompt, GenerationPlan, PlanBuilder, ProviderSelection};
pub use recommend::{recommend, BestCombination, CandidateEstimate, Recommendation};
pub use request::GenerationRequest;
