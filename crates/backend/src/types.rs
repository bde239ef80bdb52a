//! Wire types for the generation vendor API.

use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub(crate) struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub aspect_ratio: String,
}

#[derive(Deserialize)]
pub(crate) struct ImageResponse {
    #[serde(default)]
    pub images: Vec<ImageData>,
}

#[derive(Serialize, Deserialize)]
pub(crate) struct ImageData {
    pub data: String,
    #[serde(default = "default_image_mime")]
    pub mime_type: String,
}

fn default_image_mime() -> String {
    "image/png".to_owned()
}

#[derive(Serialize)]
pub(crate) struct VideoRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageData>,
}

/// A long-running video job. `name` is the vendor's operation handle,
/// polled until `done`.
#[derive(Deserialize)]
pub(crate) struct VideoJob {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<JobError>,
    #[serde(default)]
    pub result: Option<VideoResult>,
}

#[derive(Deserialize)]
pub(crate) struct JobError {
    pub message: String,
}

#[derive(Deserialize)]
pub(crate) struct VideoResult {
    pub uri: String,
    #[serde(default)]
    pub duration_secs: f32,
}

#[derive(Serialize)]
pub(crate) struct NarrationRequest {
    pub voice: String,
    pub text: String,
}

#[derive(Deserialize)]
pub(crate) struct NarrationResponse {
    pub audio: Option<AudioData>,
}

#[derive(Deserialize)]
pub(crate) struct AudioData {
    pub data: String,
    #[serde(default = "default_audio_mime")]
    pub mime_type: String,
}

fn default_audio_mime() -> String {
    "audio/mp3".to_owned()
}
