//! Domain types for the ticket log.
//!
//! A ticket records one attended live performance: what was seen, where,
//! who performed, how it was booked, plus an optional review and images
//! attached later in the add-ticket flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a ticket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Creates a new random `TicketId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a `TicketId` from a UUID
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visibility of a ticket in shared views
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    /// Visible to everyone
    #[default]
    Public,
    /// Visible only to the owner
    Private,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Private => write!(f, "private"),
        }
    }
}

/// A free-text review attached to a ticket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// The review body
    pub review_text: String,
}

impl Review {
    /// Maximum review length accepted by the add-ticket flow, in characters
    pub const MAX_CHARS: usize = 1000;

    /// Creates a review from the given text
    #[must_use]
    pub fn new(review_text: impl Into<String>) -> Self {
        Self {
            review_text: review_text.into(),
        }
    }
}

/// One attended performance
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique identifier, assigned at creation and immutable afterward
    pub id: TicketId,
    /// Performance title
    pub title: String,
    /// Performing artist
    pub artist: String,
    /// Venue
    pub place: String,
    /// Site the ticket was booked on
    pub booking_site: String,
    /// Date and time of the performance
    pub performed_at: DateTime<Utc>,
    /// Visibility
    pub status: TicketStatus,
    /// Optional review attached in the add-ticket flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<Review>,
    /// Image URIs, in attachment order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    /// Set once at creation
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation; never before `created_at`
    pub updated_at: DateTime<Utc>,
    /// Marks a synthetic grid-filler entry
    ///
    /// Placeholder tickets are synthesized transiently by the grid view and
    /// are never stored in the collection.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_placeholder: bool,
}

impl Ticket {
    /// Synthesizes a grid-filler entry for the given grid slot
    ///
    /// The id is derived deterministically from the slot so the view stays a
    /// pure function of its inputs.
    #[must_use]
    pub fn placeholder(slot: usize) -> Self {
        Self {
            id: TicketId::from_uuid(Uuid::from_u128(u128::MAX - slot as u128)),
            title: String::new(),
            artist: String::new(),
            place: String::new(),
            booking_site: String::new(),
            performed_at: DateTime::UNIX_EPOCH,
            status: TicketStatus::Public,
            review: None,
            images: Vec::new(),
            created_at: DateTime::UNIX_EPOCH,
            updated_at: DateTime::UNIX_EPOCH,
            is_placeholder: true,
        }
    }
}

/// Payload for creating a ticket
///
/// Carries everything the caller provides; the store assigns the id and both
/// timestamps, and defaults the status when omitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewTicket {
    /// Performance title, required
    pub title: String,
    /// Performing artist, required
    pub artist: String,
    /// Venue, required
    pub place: String,
    /// Site the ticket was booked on, required
    pub booking_site: String,
    /// Date and time of the performance
    pub performed_at: DateTime<Utc>,
    /// Visibility; defaults to public when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    /// Optional review
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<Review>,
    /// Image URIs, in attachment order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl NewTicket {
    /// Checks that every required string field is non-empty
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::MissingField`] naming the first empty field.
    pub fn validate(&self) -> Result<(), TicketError> {
        for (name, value) in [
            ("title", &self.title),
            ("artist", &self.artist),
            ("place", &self.place),
            ("booking_site", &self.booking_site),
        ] {
            if value.trim().is_empty() {
                return Err(TicketError::MissingField(name));
            }
        }
        Ok(())
    }

    /// Finalizes the payload into a stored ticket
    #[must_use]
    pub fn into_ticket(self, id: TicketId, now: DateTime<Utc>) -> Ticket {
        Ticket {
            id,
            title: self.title,
            artist: self.artist,
            place: self.place,
            booking_site: self.booking_site,
            performed_at: self.performed_at,
            status: self.status.unwrap_or_default(),
            review: self.review,
            images: self.images,
            created_at: now,
            updated_at: now,
            is_placeholder: false,
        }
    }
}

/// Errors for ticket store operations
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TicketError {
    /// A required field was missing or empty
    #[error("required field `{0}` is empty")]
    MissingField(&'static str),

    /// The targeted ticket does not exist
    #[error("ticket {0} not found")]
    NotFound(TicketId),

    /// A generated id collided with an existing ticket
    #[error("duplicate ticket id {0}")]
    DuplicateId(TicketId),

    /// Placeholder tickets are view-only and cannot be stored
    #[error("placeholder tickets cannot be stored")]
    Placeholder,

    /// The review exceeds the accepted length
    #[error("review exceeds {limit} characters")]
    ReviewTooLong {
        /// The enforced character limit
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> NewTicket {
        NewTicket {
            title: "Live Club Day".to_string(),
            artist: "Silica Gel".to_string(),
            place: "Rolling Hall".to_string(),
            booking_site: "Interpark".to_string(),
            performed_at: Utc::now(),
            status: None,
            review: None,
            images: Vec::new(),
        }
    }

    #[test]
    fn ticket_id_display() {
        let id = TicketId::new();
        let display = format!("{id}");
        assert!(!display.is_empty());
    }

    #[test]
    fn status_defaults_to_public() {
        assert_eq!(TicketStatus::default(), TicketStatus::Public);
    }

    #[test]
    fn validate_accepts_complete_input() {
        assert!(sample_input().validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_required_field() {
        let mut input = sample_input();
        input.place = "   ".to_string();
        assert_eq!(input.validate(), Err(TicketError::MissingField("place")));
    }

    #[test]
    fn into_ticket_stamps_both_timestamps() {
        let now = Utc::now();
        let ticket = sample_input().into_ticket(TicketId::new(), now);
        assert_eq!(ticket.created_at, now);
        assert_eq!(ticket.updated_at, now);
        assert_eq!(ticket.status, TicketStatus::Public);
        assert!(!ticket.is_placeholder);
    }

    #[test]
    fn placeholder_is_flagged_and_deterministic() {
        let a = Ticket::placeholder(3);
        let b = Ticket::placeholder(3);
        assert!(a.is_placeholder);
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, Ticket::placeholder(4).id);
    }

    #[test]
    fn placeholder_flag_is_omitted_from_real_ticket_json() {
        let ticket = sample_input().into_ticket(TicketId::new(), Utc::now());
        let json = serde_json::to_string(&ticket).unwrap_or_default();
        assert!(!json.contains("is_placeholder"));
    }
}
