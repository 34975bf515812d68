//! Generation request and its input validation.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};

pub const MIN_PROMPT_CHARS: usize = 10;
pub const MAX_PROMPT_CHARS: usize = 2000;
pub const MIN_DURATION_SECS: u32 = 4;
pub const MAX_DURATION_SECS: u32 = 60;

fn default_duration() -> u32 {
    8
}

fn default_aspect_ratio() -> String {
    "16:9".to_string()
}

fn default_resolution() -> String {
    "720p".to_string()
}

fn default_true() -> bool {
    true
}

/// A prompt to narrate and visualize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Narration text and the basis of the video prompt.
    pub prompt: String,
    /// Previously cloned voice; when set, cloning-capable voice providers are preferred.
    #[serde(default)]
    pub voice_id: Option<String>,
    #[serde(default = "default_duration")]
    pub video_duration: u32,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    #[serde(default = "default_resolution")]
    pub resolution: String,
    #[serde(default)]
    pub video_style: Option<String>,
    #[serde(default = "default_true")]
    pub detect_language: bool,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            voice_id: None,
            video_duration: default_duration(),
            aspect_ratio: default_aspect_ratio(),
            resolution: default_resolution(),
            video_style: None,
            detect_language: true,
        }
    }

    pub fn with_voice_id(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.video_duration = seconds;
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = aspect_ratio.into();
        self
    }

    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = resolution.into();
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.video_style = Some(style.into());
        self
    }

    pub fn without_language_detection(mut self) -> Self {
        self.detect_language = false;
        self
    }

    /// Characters of narration text, the unit voice providers bill on.
    pub fn text_chars(&self) -> usize {
        self.prompt.chars().count()
    }

    /// Trim the prompt and check every field. Returns the normalized request.
    pub fn validated(mut self) -> Result<Self, ApiError> {
        self.prompt = self.prompt.trim().to_string();

        let chars = self.text_chars();
        if !(MIN_PROMPT_CHARS..=MAX_PROMPT_CHARS).contains(&chars) {
            return Err(ApiError::InvalidRequest(format!(
                "prompt must be {}-{} characters, got {}",
                MIN_PROMPT_CHARS, MAX_PROMPT_CHARS, chars
            )));
        }
        if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&self.video_duration) {
            return Err(ApiError::InvalidRequest(format!(
                "video_duration must be {}-{} seconds, got {}",
                MIN_DURATION_SECS, MAX_DURATION_SECS, self.video_duration
            )));
        }
        if !is_aspect_ratio(&self.aspect_ratio) {
            return Err(ApiError::InvalidRequest(format!(
                "aspect_ratio must look like 16:9, got '{}'",
                self.aspect_ratio
            )));
        }
        if self.resolution.trim().is_empty() {
            return Err(ApiError::InvalidRequest(
                "resolution cannot be empty".to_string(),
            ));
        }
        if matches!(&self.voice_id, Some(id) if id.trim().is_empty()) {
            self.voice_id = None;
        }
        Ok(self)
    }
}

fn is_aspect_ratio(value: &str) -> bool {
    let Some((width, height)) = value.split_once(':') else {
        return false;
    };
    let positive = |part: &str| {
        !part.is_empty()
            && part.chars().all(|c| c.is_ascii_digit())
            && part.parse::<u32>().map_or(false, |n| n > 0)
    };
    positive(width) && positive(height)
}
