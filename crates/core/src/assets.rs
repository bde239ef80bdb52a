//! Generated assets: the products of backend calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A generated storyboard image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub id: String,
    /// Base64-encoded image bytes as returned by the vendor.
    pub data: String,
    pub mime_type: String,
}

/// A finished animated clip. The vendor hosts the bytes; we keep the URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAsset {
    pub id: String,
    pub uri: String,
    pub duration_secs: f32,
}

/// A synthesized narration clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioClip {
    pub id: String,
    /// Base64-encoded audio bytes.
    pub data: String,
    pub mime_type: String,
}

/// One storyboard panel: the scene prompt and the image it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryboardPanel {
    pub scene_prompt: String,
    pub image: GeneratedImage,
}

/// A complete storyboard generated from one story idea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storyboard {
    pub id: String,
    pub idea: String,
    pub panels: Vec<StoryboardPanel>,
    pub created_at: DateTime<Utc>,
}

impl Storyboard {
    #[must_use]
    pub fn new(idea: impl Into<String>, panels: Vec<StoryboardPanel>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            idea: idea.into(),
            panels,
            created_at: Utc::now(),
        }
    }
}
