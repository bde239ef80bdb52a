//! Backend seam used by the service layer.
//!
//! Abstracts the concrete vendor client so the service can be exercised
//! against a scripted backend in tests.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::client::StudioClient;
use crate::error::BackendError;
use storyforge_core::{AudioClip, GeneratedImage, VideoAsset};

/// Capability interface over the generation vendor.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate one storyboard image from a scene prompt.
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, BackendError>;

    /// Animate an image into a clip, polling the vendor job to completion.
    async fn animate_image(
        &self,
        motion_prompt: &str,
        image: &GeneratedImage,
        cancel: &CancellationToken,
    ) -> Result<VideoAsset, BackendError>;

    /// Synthesize narration audio for a piece of text.
    async fn synthesize_narration(&self, text: &str) -> Result<AudioClip, BackendError>;
}

#[async_trait]
impl GenerationBackend for StudioClient {
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, BackendError> {
        Self::generate_image(self, prompt).await
    }

    async fn animate_image(
        &self,
        motion_prompt: &str,
        image: &GeneratedImage,
        cancel: &CancellationToken,
    ) -> Result<VideoAsset, BackendError> {
        let operation = self.start_video(motion_prompt, image).await?;
        self.wait_for_video(&operation, cancel).await
    }

    async fn synthesize_narration(&self, text: &str) -> Result<AudioClip, BackendError> {
        Self::synthesize_narration(self, text).await
    }
}
