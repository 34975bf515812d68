//! Job status state machine and the pipeline stages that drive it.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    DetectingLanguage,
    GeneratingSpeech,
    GeneratingVideo,
    Merging,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::DetectingLanguage => "detecting_language",
            JobStatus::GeneratingSpeech => "generating_speech",
            JobStatus::GeneratingVideo => "generating_video",
            JobStatus::Merging => "merging",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Forward edges of the lifecycle graph.
    ///
    /// Language detection and the merge step are optional, so speech may follow
    /// `Pending` directly and `Completed` may follow video generation. Any live
    /// status may fail. Nothing leaves a terminal status.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        match (self, next) {
            (Completed, _) | (Failed, _) => false,
            (_, Failed) => true,
            (Pending, DetectingLanguage) | (Pending, GeneratingSpeech) => true,
            (DetectingLanguage, GeneratingSpeech) => true,
            (GeneratingSpeech, GeneratingVideo) => true,
            (GeneratingVideo, Merging) | (GeneratingVideo, Completed) => true,
            (Merging, Completed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider-backed step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    LanguageDetection,
    SpeechSynthesis,
    VideoGeneration,
    MediaMerge,
}

impl Stage {
    /// Status a job reports while this stage runs.
    pub fn status(self) -> JobStatus {
        match self {
            Stage::LanguageDetection => JobStatus::DetectingLanguage,
            Stage::SpeechSynthesis => JobStatus::GeneratingSpeech,
            Stage::VideoGeneration => JobStatus::GeneratingVideo,
            Stage::MediaMerge => JobStatus::Merging,
        }
    }

    /// Progress percentage reported when the stage starts.
    pub fn checkpoint(self) -> u8 {
        match self {
            Stage::LanguageDetection => 10,
            Stage::SpeechSynthesis => 25,
            Stage::VideoGeneration => 50,
            Stage::MediaMerge => 85,
        }
    }

    /// Human-readable step text shown while the stage runs.
    pub fn step(self) -> &'static str {
        match self {
            Stage::LanguageDetection => "Detecting language...",
            Stage::SpeechSynthesis => "Generating speech...",
            Stage::VideoGeneration => "Generating video...",
            Stage::MediaMerge => "Merging audio and video...",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::LanguageDetection => "Language detection",
            Stage::SpeechSynthesis => "Speech generation",
            Stage::VideoGeneration => "Video generation",
            Stage::MediaMerge => "Media merge",
        };
        f.write_str(label)
    }
}
