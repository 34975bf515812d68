//! Reelsmith: Quality-First Prompt-to-Video Orchestration
//!
//! Plans and runs prompt-to-video jobs across interchangeable third-party
//! providers. Each pipeline stage (language detection, speech, video, merge)
//! picks the best provider that clears its quality floor and falls back along a
//! ranked chain when a provider fails; jobs move through a forward-only state
//! machine observable through snapshots and progress events.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod job;
pub mod logging;
pub mod progress;
pub mod provider;

pub use api::{ClonedVoice, GenerationService, JobHandle};
pub use config::{ConfigLoader, ReelsmithConfig};
pub use error::{ApiError, ProviderError};
pub use generation::{GenerationPlan, GenerationRequest};
pub use job::{GenerationResult, JobId, JobSnapshot, JobStatus};
pub use progress::{JobProgress, ProgressSink};
pub use provider::{ProviderCategory, ProviderRecord, ProviderRegistry, QualityTier};
