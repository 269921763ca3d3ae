//! Ticketbook: a log of attended live performances.
//!
//! Users record shows they attended, optionally attach a review and an image
//! (picked or generated), and browse past entries via a home feed, a padded
//! grid, and a calendar. State lives in a reactive in-memory store for the
//! lifetime of the process; there is no persistence layer.
//!
//! The crate is organized around two stores built on `ticketbook-runtime`:
//!
//! - the **ticket store** ([`reducer`]): the canonical collection with
//!   add/update/delete commands and pure derived views
//! - the **wizard flow** ([`flow`]): the multi-step add-ticket entry flow,
//!   which accumulates a [`flow::TicketDraft`] and hands the finished
//!   payload to the ticket store at the terminal step
//!
//! # Quick Start
//!
//! ```no_run
//! use ticketbook::{TicketAction, TicketEnvironment, TicketReducer, TicketState};
//! use ticketbook::types::NewTicket;
//! use ticketbook_runtime::Store;
//! use chrono::Utc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Store::new(
//!     TicketState::new(),
//!     TicketReducer::new(),
//!     TicketEnvironment::production(),
//! );
//!
//! store
//!     .send(TicketAction::AddTicket {
//!         input: NewTicket {
//!             title: "Live Club Day".to_string(),
//!             artist: "Silica Gel".to_string(),
//!             place: "Rolling Hall".to_string(),
//!             booking_site: "Interpark".to_string(),
//!             performed_at: Utc::now(),
//!             status: None,
//!             review: None,
//!             images: Vec::new(),
//!         },
//!     })
//!     .await?;
//!
//! let count = store.state(ticketbook::TicketState::count).await;
//! println!("tickets: {count}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod flow;
pub mod media;
pub mod reducer;
pub mod types;
pub mod views;

// Re-export commonly used types
pub use config::AppConfig;
pub use flow::{FlowAction, FlowEnvironment, FlowReducer, FlowState, FlowStep};
pub use reducer::{TicketAction, TicketEnvironment, TicketReducer, TicketState};
pub use types::{NewTicket, Ticket, TicketError, TicketId, TicketStatus};

/// The ticket store, fully wired
pub type TicketStore =
    ticketbook_runtime::Store<TicketState, TicketAction, TicketEnvironment, TicketReducer>;

/// The wizard flow store, fully wired
pub type FlowStore = ticketbook_runtime::Store<FlowState, FlowAction, FlowEnvironment, FlowReducer>;
