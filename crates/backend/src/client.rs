//! Concrete HTTP client for the generation vendor.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::BackendError;
use crate::types::{
    ImageData, ImageRequest, ImageResponse, NarrationRequest, NarrationResponse, VideoJob,
    VideoRequest,
};
use storyforge_core::{AudioClip, GeneratedImage, VideoAsset, env_parse_with_default};

/// Maximum length of a response body echoed into error context.
const MAX_BODY_CONTEXT: usize = 200;
/// Default image model.
pub const DEFAULT_IMAGE_MODEL: &str = "sf-image-4";
/// Default video model.
pub const DEFAULT_VIDEO_MODEL: &str = "sf-motion-2";
/// Default narration voice.
pub const DEFAULT_TTS_VOICE: &str = "aria";

/// Client for the generation vendor API.
pub struct StudioClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    image_model: String,
    video_model: String,
    voice: String,
    poll_interval: Duration,
}

impl std::fmt::Debug for StudioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioClient")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("image_model", &self.image_model)
            .field("video_model", &self.video_model)
            .field("voice", &self.voice)
            .finish_non_exhaustive()
    }
}

impl StudioClient {
    /// Creates a new client with the given API key and base URL.
    ///
    /// Model and voice defaults come from `STORYFORGE_IMAGE_MODEL`,
    /// `STORYFORGE_VIDEO_MODEL` and `STORYFORGE_TTS_VOICE` when set.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend
    /// failure).
    pub fn new(api_key: String, base_url: String) -> Result<Self, BackendError> {
        let image_model = std::env::var("STORYFORGE_IMAGE_MODEL")
            .unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_owned());
        let video_model = std::env::var("STORYFORGE_VIDEO_MODEL")
            .unwrap_or_else(|_| DEFAULT_VIDEO_MODEL.to_owned());
        let voice =
            std::env::var("STORYFORGE_TTS_VOICE").unwrap_or_else(|_| DEFAULT_TTS_VOICE.to_owned());
        let base_url = base_url.trim_end_matches('/').to_owned();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| BackendError::ClientInit(e.to_string()))?;
        let poll_secs = env_parse_with_default("STORYFORGE_POLL_INTERVAL_SECS", 10u64);
        Ok(Self {
            client,
            api_key,
            base_url,
            image_model,
            video_model,
            voice,
            poll_interval: Duration::from_secs(poll_secs),
        })
    }

    /// Sets a custom image model for this client.
    #[must_use]
    pub fn with_image_model(mut self, model: String) -> Self {
        self.image_model = model;
        self
    }

    /// Sets a custom video model for this client.
    #[must_use]
    pub fn with_video_model(mut self, model: String) -> Self {
        self.video_model = model;
        self
    }

    /// Sets the interval between long-running job polls.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Generate one storyboard image from a scene prompt.
    ///
    /// # Errors
    /// Returns an error if the HTTP request fails, the API returns a
    /// non-success status, the body cannot be parsed, or no image came back.
    pub async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, BackendError> {
        let request = ImageRequest {
            model: self.image_model.clone(),
            prompt: prompt.to_owned(),
            aspect_ratio: "16:9".to_owned(),
        };
        let body = self.post_json("/v1/images:generate", &request).await?;
        let parsed: ImageResponse =
            serde_json::from_str(&body).map_err(|e| BackendError::JsonParse {
                context: format!("image response (body: {})", truncate(&body, MAX_BODY_CONTEXT)),
                source: e,
            })?;
        let first = parsed.images.into_iter().next().ok_or(BackendError::EmptyResponse("images"))?;
        Ok(GeneratedImage {
            id: uuid::Uuid::new_v4().to_string(),
            data: first.data,
            mime_type: first.mime_type,
        })
    }

    /// Start an animation job for an existing image. Returns the vendor's
    /// operation handle, to be polled with [`Self::wait_for_video`].
    ///
    /// # Errors
    /// Returns an error if the request fails or the response is malformed.
    pub async fn start_video(
        &self,
        motion_prompt: &str,
        image: &GeneratedImage,
    ) -> Result<String, BackendError> {
        let request = VideoRequest {
            model: self.video_model.clone(),
            prompt: motion_prompt.to_owned(),
            image: Some(ImageData { data: image.data.clone(), mime_type: image.mime_type.clone() }),
        };
        let body = self.post_json("/v1/videos:generate", &request).await?;
        let job: VideoJob = serde_json::from_str(&body).map_err(|e| BackendError::JsonParse {
            context: format!("video job (body: {})", truncate(&body, MAX_BODY_CONTEXT)),
            source: e,
        })?;
        Ok(job.name)
    }

    /// Poll a job once.
    async fn poll_video(&self, operation: &str) -> Result<VideoJob, BackendError> {
        let response = self
            .client
            .get(format!("{}/v1/{operation}", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BackendError::HttpStatus { code: status.as_u16(), body });
        }
        serde_json::from_str(&body).map_err(|e| BackendError::JsonParse {
            context: format!("video job status (body: {})", truncate(&body, MAX_BODY_CONTEXT)),
            source: e,
        })
    }

    /// Poll an animation job to completion.
    ///
    /// Cancellation is checked once per poll cycle; the job itself keeps
    /// running server-side after a cancel.
    ///
    /// # Errors
    /// Returns `Cancelled` if the token is set, `JobFailed` if the vendor
    /// reports the job failed, or a transport/parse error from polling.
    pub async fn wait_for_video(
        &self,
        operation: &str,
        cancel: &CancellationToken,
    ) -> Result<VideoAsset, BackendError> {
        loop {
            if cancel.is_cancelled() {
                return Err(BackendError::Cancelled);
            }
            let job = self.poll_video(operation).await?;
            if job.done {
                if let Some(err) = job.error {
                    return Err(BackendError::JobFailed(err.message));
                }
                let result = job.result.ok_or(BackendError::EmptyResponse("video result"))?;
                return Ok(VideoAsset {
                    id: uuid::Uuid::new_v4().to_string(),
                    uri: result.uri,
                    duration_secs: result.duration_secs,
                });
            }
            tracing::debug!(operation, "video job still running");
            tokio::select! {
                () = cancel.cancelled() => return Err(BackendError::Cancelled),
                () = tokio::time::sleep(self.poll_interval) => {},
            }
        }
    }

    /// Synthesize narration audio for a piece of text.
    ///
    /// # Errors
    /// Returns an error if the request fails, the body cannot be parsed,
    /// or the response carries no audio.
    pub async fn synthesize_narration(&self, text: &str) -> Result<AudioClip, BackendError> {
        let request = NarrationRequest { voice: self.voice.clone(), text: text.to_owned() };
        let body = self.post_json("/v1/audio:synthesize", &request).await?;
        let parsed: NarrationResponse =
            serde_json::from_str(&body).map_err(|e| BackendError::JsonParse {
                context: format!("narration response (body: {})", truncate(&body, MAX_BODY_CONTEXT)),
                source: e,
            })?;
        let audio = parsed.audio.ok_or(BackendError::EmptyResponse("audio"))?;
        Ok(AudioClip {
            id: uuid::Uuid::new_v4().to_string(),
            data: audio.data,
            mime_type: audio.mime_type,
        })
    }

    /// POST a JSON request, returning the success body or a typed error.
    async fn post_json<R: serde::Serialize>(
        &self,
        path: &str,
        request: &R,
    ) -> Result<String, BackendError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read error body".to_owned());
        if !status.is_success() {
            return Err(BackendError::HttpStatus { code: status.as_u16(), body });
        }
        Ok(body)
    }
}

/// Truncates a string to the given maximum length at a char boundary.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end = end.saturating_sub(1);
        }
        s.get(..end).unwrap_or("")
    }
}
