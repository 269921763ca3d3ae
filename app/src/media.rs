//! Media capabilities for the add-ticket flow.
//!
//! This module provides the image-generation and speech-recognition
//! interfaces the wizard depends on. Production backends implement the same
//! traits; the implementations shipped here are the mock generator (fixed
//! delay, placeholder-image URL) and the permanently unavailable recognizer.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Image generation result
pub type ImageResult<T> = Result<T, ImageError>;

/// Speech recognition result
pub type SpeechResult<T> = Result<T, SpeechError>;

/// Image generation error
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ImageError {
    /// No image backend is available
    #[error("image generation is not available")]
    Unavailable,

    /// The backend failed to produce an image
    #[error("image generation failed: {message}")]
    Failed {
        /// Backend failure description
        message: String,
    },
}

/// Speech recognition error
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SpeechError {
    /// No recognizer backend is available
    #[error("speech recognition is not available")]
    Unavailable,

    /// The recognizer failed mid-session
    #[error("speech recognition failed: {message}")]
    Failed {
        /// Backend failure description
        message: String,
    },
}

/// Background color for a generated image
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundColor {
    /// Let the backend pick
    #[default]
    Auto,
    /// White
    White,
    /// Black
    Black,
    /// Blue
    Blue,
    /// Purple
    Purple,
    /// Pink
    Pink,
    /// Orange
    Orange,
    /// Green
    Green,
}

/// Rendering style for a generated image
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStyle {
    /// Photo-realistic
    #[default]
    Realistic,
    /// Flat illustration
    Illustration,
    /// Watercolor
    Watercolor,
    /// Oil painting
    OilPainting,
    /// Cartoon
    Cartoon,
    /// Minimal
    Minimal,
}

/// Aspect ratio of a generated image
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectRatio {
    /// 400 x 400
    #[default]
    Square,
    /// 300 x 500
    Portrait,
    /// 500 x 300
    Landscape,
}

impl AspectRatio {
    /// Pixel dimensions (width, height) for this ratio
    #[must_use]
    pub const fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Square => (400, 400),
            Self::Portrait => (300, 500),
            Self::Landscape => (500, 300),
        }
    }
}

/// User-selected options for image generation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSettings {
    /// Background color
    pub background: BackgroundColor,
    /// Whether to render the performance title into the image
    pub include_text: bool,
    /// Rendering style
    pub style: ImageStyle,
    /// Aspect ratio
    pub aspect_ratio: AspectRatio,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            background: BackgroundColor::default(),
            include_text: true,
            style: ImageStyle::default(),
            aspect_ratio: AspectRatio::default(),
        }
    }
}

/// A request to generate one ticket image
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    /// Performance title the image is for
    pub title: String,
    /// Performing artist
    pub artist: String,
    /// Generation options
    pub settings: ImageSettings,
}

/// A generated image reference
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// URI of the generated image
    pub url: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Image generator trait
///
/// Abstraction over image backends. The flow awaits the returned future and
/// feeds the result back into its reducer as an event.
pub trait ImageGenerator: Send + Sync {
    /// Generate one image for the request
    ///
    /// # Errors
    ///
    /// Returns an [`ImageError`] if the backend is unavailable or fails.
    fn generate(
        &self,
        request: ImageRequest,
    ) -> Pin<Box<dyn Future<Output = ImageResult<GeneratedImage>> + Send>>;
}

/// Mock image generator
///
/// Simulates generation with a fixed delay, then returns a placeholder-image
/// URL sized to the requested aspect ratio. In production, replace with a
/// real backend behind the same trait.
#[derive(Clone, Debug)]
pub struct MockImageGenerator {
    delay: Duration,
    base_url: String,
}

impl MockImageGenerator {
    /// Default simulated generation delay
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(3);

    /// Default placeholder-image endpoint
    pub const DEFAULT_BASE_URL: &'static str = "https://picsum.photos";

    /// Creates a generator with the given delay and endpoint
    #[must_use]
    pub fn new(delay: Duration, base_url: impl Into<String>) -> Self {
        Self {
            delay,
            base_url: base_url.into(),
        }
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared(delay: Duration, base_url: impl Into<String>) -> Arc<dyn ImageGenerator> {
        Arc::new(Self::new(delay, base_url))
    }
}

impl Default for MockImageGenerator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY, Self::DEFAULT_BASE_URL)
    }
}

impl ImageGenerator for MockImageGenerator {
    fn generate(
        &self,
        request: ImageRequest,
    ) -> Pin<Box<dyn Future<Output = ImageResult<GeneratedImage>> + Send>> {
        let delay = self.delay;
        let base_url = self.base_url.clone();

        Box::pin(async move {
            tokio::time::sleep(delay).await;

            let (width, height) = request.settings.aspect_ratio.dimensions();
            let seed: u32 = rand::random();
            let url = format!("{base_url}/{width}/{height}?random={seed}");

            tracing::info!(
                title = %request.title,
                artist = %request.artist,
                style = ?request.settings.style,
                %url,
                "mock image generated"
            );

            Ok(GeneratedImage { url, width, height })
        })
    }
}

/// A transcript fragment or terminal marker from a recognizer session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpeechEvent {
    /// Interim transcript, may be revised
    Partial(String),
    /// Final transcript for the utterance
    Final(String),
    /// The session ended
    Ended,
}

/// A running recognition session
///
/// Streams transcript events until [`SpeechEvent::Ended`] or the recognizer
/// is stopped.
#[derive(Debug)]
pub struct SpeechSession {
    /// BCP-47 locale the session was started with
    pub locale: String,
    events: mpsc::Receiver<SpeechEvent>,
}

impl SpeechSession {
    /// Creates a session over the given event channel
    #[must_use]
    pub fn new(locale: impl Into<String>, events: mpsc::Receiver<SpeechEvent>) -> Self {
        Self {
            locale: locale.into(),
            events,
        }
    }

    /// Next transcript event, or `None` once the recognizer hangs up
    pub async fn next_event(&mut self) -> Option<SpeechEvent> {
        self.events.recv().await
    }
}

/// Speech recognizer trait
///
/// Abstraction over platform speech-to-text backends: start a session for a
/// locale, stream transcript events, stop on demand.
pub trait SpeechRecognizer: Send + Sync {
    /// Whether a recognizer backend is usable right now
    fn is_available(&self) -> Pin<Box<dyn Future<Output = bool> + Send>>;

    /// Start a recognition session
    ///
    /// # Errors
    ///
    /// Returns a [`SpeechError`] if no backend is available or the session
    /// cannot start.
    fn start(
        &self,
        locale: &str,
    ) -> Pin<Box<dyn Future<Output = SpeechResult<SpeechSession>> + Send>>;

    /// Stop the active session, if any
    ///
    /// # Errors
    ///
    /// Returns a [`SpeechError`] if the backend fails to stop cleanly.
    fn stop(&self) -> Pin<Box<dyn Future<Output = SpeechResult<()>> + Send>>;
}

/// Recognizer that always reports unavailable
///
/// Stands in for the platform voice module, which is disabled at the wrapper
/// level; callers are expected to fall back to typed input. Swap in a real
/// backend behind the same trait to enable dictation.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableSpeechRecognizer;

impl UnavailableSpeechRecognizer {
    /// Creates a new unavailable recognizer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared() -> Arc<dyn SpeechRecognizer> {
        Arc::new(Self::new())
    }
}

impl SpeechRecognizer for UnavailableSpeechRecognizer {
    fn is_available(&self) -> Pin<Box<dyn Future<Output = bool> + Send>> {
        Box::pin(async { false })
    }

    fn start(
        &self,
        locale: &str,
    ) -> Pin<Box<dyn Future<Output = SpeechResult<SpeechSession>> + Send>> {
        let locale = locale.to_string();
        Box::pin(async move {
            tracing::warn!(%locale, "speech recognition requested but no backend is available");
            Err(SpeechError::Unavailable)
        })
    }

    fn stop(&self) -> Pin<Box<dyn Future<Output = SpeechResult<()>> + Send>> {
        // Stopping a recognizer that never started is a no-op.
        Box::pin(async { Ok(()) })
    }
}
