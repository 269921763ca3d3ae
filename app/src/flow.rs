//! The add-ticket wizard flow.
//!
//! The entry flow walks one modal screen per step: performance details,
//! review mode choice, review text, image source choice, image settings,
//! generation, completion. This module models that as a flow controller
//! owning a typed [`TicketDraft`]; each step validates its input
//! before advancing, and the finished draft is parked in
//! [`FlowState::finished`] for the driver to commit to the ticket store with
//! a single `AddTicket`. The flow itself never mutates the ticket store.

use crate::media::{
    GeneratedImage, ImageGenerator, ImageRequest, ImageSettings, SpeechRecognizer,
};
use crate::types::{NewTicket, Review, TicketError, TicketStatus};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use ticketbook_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};

/// Locale dictation sessions are started with
pub const DICTATION_LOCALE: &str = "ko-KR";

/// Steps of the add-ticket wizard, in screen order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowStep {
    /// Performance details form
    Details,
    /// Choice between typed and dictated review
    ReviewMode,
    /// Review text entry
    Review,
    /// Choice of image source
    ImageSource,
    /// Generation options
    ImageSettings,
    /// Waiting on the image backend
    GeneratingImage,
    /// Draft is complete, ready to finalize
    Complete,
}

/// How the review will be entered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewMode {
    /// Typed on the keyboard
    Text,
    /// Dictated through the speech recognizer
    Voice,
}

/// Where the ticket image comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// Generate one from the performance details
    Generate,
    /// Use a picked photo
    Photo {
        /// URI of the picked photo
        uri: String,
    },
    /// No image
    Skip,
}

/// The in-progress ticket, accumulated across wizard steps
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TicketDraft {
    /// Performance title
    pub title: String,
    /// Performing artist
    pub artist: String,
    /// Venue
    pub place: String,
    /// Site the ticket was booked on
    pub booking_site: String,
    /// Date and time of the performance; set by the details step
    pub performed_at: Option<DateTime<Utc>>,
    /// Visibility, from the review step's toggle
    pub status: TicketStatus,
    /// Review, from the review step
    pub review: Option<Review>,
    /// Image URIs, in attachment order
    pub images: Vec<String>,
}

impl TicketDraft {
    /// Finalizes the draft into an add payload
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::MissingField`] if a required field is empty and
    /// [`TicketError::ReviewTooLong`] if the review exceeds
    /// [`Review::MAX_CHARS`].
    pub fn finish(&self) -> Result<NewTicket, TicketError> {
        let performed_at = self
            .performed_at
            .ok_or(TicketError::MissingField("performed_at"))?;

        if let Some(review) = &self.review {
            if review.review_text.chars().count() > Review::MAX_CHARS {
                return Err(TicketError::ReviewTooLong {
                    limit: Review::MAX_CHARS,
                });
            }
        }

        let input = NewTicket {
            title: self.title.clone(),
            artist: self.artist.clone(),
            place: self.place.clone(),
            booking_site: self.booking_site.clone(),
            performed_at,
            status: Some(self.status),
            review: self.review.clone(),
            images: self.images.clone(),
        };
        input.validate()?;

        Ok(input)
    }
}

/// State of one wizard run
#[derive(Clone, Debug, Default)]
pub struct FlowState {
    /// Current step
    pub step: FlowStep,
    /// The accumulated draft
    pub draft: TicketDraft,
    /// Why dictation is unavailable, when the user asked for it
    pub dictation_notice: Option<String>,
    /// Most recent step-level failure, if any
    pub error: Option<String>,
    /// The finalized payload, ready for the ticket store
    pub finished: Option<NewTicket>,
}

impl Default for FlowStep {
    fn default() -> Self {
        Self::Details
    }
}

impl FlowState {
    /// Creates a fresh wizard at the details step
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Actions of the wizard flow
#[derive(Clone, Debug, PartialEq)]
pub enum FlowAction {
    // ========== Commands (screen input) ==========
    /// Submit the performance details form
    SubmitDetails {
        /// Performance title
        title: String,
        /// Performing artist
        artist: String,
        /// Venue
        place: String,
        /// Booking site
        booking_site: String,
        /// Date and time of the performance
        performed_at: DateTime<Utc>,
    },

    /// Choose how the review will be entered
    ChooseReviewMode {
        /// Typed or dictated
        mode: ReviewMode,
    },

    /// Submit the review text and visibility toggle
    SubmitReview {
        /// Review body
        text: String,
        /// Chosen visibility
        visibility: TicketStatus,
    },

    /// Choose where the ticket image comes from
    ChooseImageSource {
        /// The chosen source
        source: ImageSource,
    },

    /// Start generation with the chosen options
    ConfigureImage {
        /// Generation options
        settings: ImageSettings,
    },

    /// Go back one step
    Back,

    /// Finalize the draft for commit
    Finalize,

    // ========== Events (effect feedback) ==========
    /// A recognizer backend is ready for dictation
    DictationReady,

    /// No recognizer backend; the screen falls back to typed input
    DictationUnavailable {
        /// Human-readable reason
        reason: String,
    },

    /// The image backend produced an image
    ImageGenerated {
        /// The generated image
        image: GeneratedImage,
    },

    /// The image backend failed
    ImageFailed {
        /// Failure description
        message: String,
    },
}

/// Environment dependencies for the wizard flow
#[derive(Clone)]
pub struct FlowEnvironment {
    /// Image backend for the generate path
    pub images: Arc<dyn ImageGenerator>,
    /// Speech backend probed for the dictation path
    pub speech: Arc<dyn SpeechRecognizer>,
}

impl FlowEnvironment {
    /// Creates a new `FlowEnvironment`
    #[must_use]
    pub fn new(images: Arc<dyn ImageGenerator>, speech: Arc<dyn SpeechRecognizer>) -> Self {
        Self { images, speech }
    }
}

/// Reducer for the wizard flow
#[derive(Clone, Debug, Default)]
pub struct FlowReducer;

impl FlowReducer {
    /// Creates a new `FlowReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Records an out-of-order command without advancing
    fn wrong_step(state: &mut FlowState, expected: FlowStep) {
        tracing::warn!(current = ?state.step, ?expected, "flow action out of order");
        state.error = Some(format!(
            "expected step {expected:?}, currently at {:?}",
            state.step
        ));
    }

    /// The step the Back command returns to
    const fn previous(step: FlowStep) -> FlowStep {
        match step {
            FlowStep::Details | FlowStep::ReviewMode => FlowStep::Details,
            FlowStep::Review => FlowStep::ReviewMode,
            FlowStep::ImageSource => FlowStep::Review,
            FlowStep::ImageSettings | FlowStep::GeneratingImage => FlowStep::ImageSource,
            // Completion is terminal; the screen auto-navigates home
            FlowStep::Complete => FlowStep::Complete,
        }
    }
}

impl Reducer for FlowReducer {
    type State = FlowState;
    type Action = FlowAction;
    type Environment = FlowEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per wizard step
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            FlowAction::SubmitDetails {
                title,
                artist,
                place,
                booking_site,
                performed_at,
            } => {
                if state.step != FlowStep::Details {
                    Self::wrong_step(state, FlowStep::Details);
                    return SmallVec::new();
                }

                for (name, value) in [
                    ("title", &title),
                    ("artist", &artist),
                    ("place", &place),
                    ("booking_site", &booking_site),
                ] {
                    if value.trim().is_empty() {
                        state.error = Some(TicketError::MissingField(name).to_string());
                        return SmallVec::new();
                    }
                }

                state.draft.title = title;
                state.draft.artist = artist;
                state.draft.place = place;
                state.draft.booking_site = booking_site;
                state.draft.performed_at = Some(performed_at);
                state.error = None;
                state.step = FlowStep::ReviewMode;

                SmallVec::new()
            },

            FlowAction::ChooseReviewMode { mode } => {
                if state.step != FlowStep::ReviewMode {
                    Self::wrong_step(state, FlowStep::ReviewMode);
                    return SmallVec::new();
                }

                state.error = None;
                state.step = FlowStep::Review;

                match mode {
                    ReviewMode::Text => {
                        state.dictation_notice = None;
                        SmallVec::new()
                    },
                    ReviewMode::Voice => {
                        let speech = Arc::clone(&env.speech);
                        smallvec![Effect::future(async move {
                            // The probe session is dropped immediately; the
                            // review screen owns the real one.
                            match speech.start(DICTATION_LOCALE).await {
                                Ok(_session) => Some(FlowAction::DictationReady),
                                Err(error) => Some(FlowAction::DictationUnavailable {
                                    reason: error.to_string(),
                                }),
                            }
                        })]
                    },
                }
            },

            FlowAction::SubmitReview { text, visibility } => {
                if state.step != FlowStep::Review {
                    Self::wrong_step(state, FlowStep::Review);
                    return SmallVec::new();
                }

                if text.trim().is_empty() {
                    state.error = Some(TicketError::MissingField("review").to_string());
                    return SmallVec::new();
                }

                if text.chars().count() > Review::MAX_CHARS {
                    state.error = Some(
                        TicketError::ReviewTooLong {
                            limit: Review::MAX_CHARS,
                        }
                        .to_string(),
                    );
                    return SmallVec::new();
                }

                state.draft.review = Some(Review::new(text));
                state.draft.status = visibility;
                state.error = None;
                state.step = FlowStep::ImageSource;

                SmallVec::new()
            },

            FlowAction::ChooseImageSource { source } => {
                if state.step != FlowStep::ImageSource {
                    Self::wrong_step(state, FlowStep::ImageSource);
                    return SmallVec::new();
                }

                state.error = None;
                match source {
                    ImageSource::Generate => {
                        state.step = FlowStep::ImageSettings;
                    },
                    ImageSource::Photo { uri } => {
                        state.draft.images = vec![uri];
                        state.step = FlowStep::Complete;
                    },
                    ImageSource::Skip => {
                        state.step = FlowStep::Complete;
                    },
                }

                SmallVec::new()
            },

            FlowAction::ConfigureImage { settings } => {
                if state.step != FlowStep::ImageSettings {
                    Self::wrong_step(state, FlowStep::ImageSettings);
                    return SmallVec::new();
                }

                state.error = None;
                state.step = FlowStep::GeneratingImage;

                let request = ImageRequest {
                    title: state.draft.title.clone(),
                    artist: state.draft.artist.clone(),
                    settings,
                };
                let images = Arc::clone(&env.images);

                smallvec![Effect::future(async move {
                    match images.generate(request).await {
                        Ok(image) => Some(FlowAction::ImageGenerated { image }),
                        Err(error) => Some(FlowAction::ImageFailed {
                            message: error.to_string(),
                        }),
                    }
                })]
            },

            FlowAction::Back => {
                state.error = None;
                state.step = Self::previous(state.step);
                SmallVec::new()
            },

            FlowAction::Finalize => {
                if state.step != FlowStep::Complete {
                    Self::wrong_step(state, FlowStep::Complete);
                    return SmallVec::new();
                }

                match state.draft.finish() {
                    Ok(input) => {
                        state.finished = Some(input);
                        state.error = None;
                    },
                    Err(error) => {
                        state.error = Some(error.to_string());
                    },
                }

                SmallVec::new()
            },

            // ========== Events ==========
            FlowAction::DictationReady => {
                state.dictation_notice = None;
                SmallVec::new()
            },

            FlowAction::DictationUnavailable { reason } => {
                state.dictation_notice = Some(reason);
                SmallVec::new()
            },

            FlowAction::ImageGenerated { image } => {
                // Ignore results landing after the user navigated away.
                if state.step == FlowStep::GeneratingImage {
                    state.draft.images.push(image.url);
                    state.error = None;
                    state.step = FlowStep::Complete;
                } else {
                    tracing::debug!(url = %image.url, "discarding stale generated image");
                }
                SmallVec::new()
            },

            FlowAction::ImageFailed { message } => {
                if state.step == FlowStep::GeneratingImage {
                    state.error = Some(message);
                    state.step = FlowStep::ImageSettings;
                }
                SmallVec::new()
            },
        }
    }
}
