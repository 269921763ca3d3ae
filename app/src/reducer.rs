//! The ticket store: canonical collection of tickets for the session.
//!
//! All screens read from this store and dispatch mutations through it; the
//! store never calls back into presentation code. Commands are validated and
//! applied as events; events are the replay surface and mutate state
//! directly. Every derived view is a pure function of the base collection,
//! recomputed per read, so two views read in the same tick are always
//! consistent with each other and with the collection itself.

use crate::types::{NewTicket, Ticket, TicketError, TicketId, TicketStatus};
use std::sync::Arc;
use ticketbook_core::{
    SmallVec,
    effect::Effect,
    environment::{Clock, IdGenerator, SystemClock, UuidGenerator},
    reducer::Reducer,
};

/// Environment dependencies for the ticket reducer
#[derive(Clone)]
pub struct TicketEnvironment {
    /// Clock for creation and update timestamps
    pub clock: Arc<dyn Clock>,
    /// Generator for fresh ticket ids
    pub ids: Arc<dyn IdGenerator>,
}

impl TicketEnvironment {
    /// Creates a new `TicketEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { clock, ids }
    }

    /// Production environment: system clock, random v4 ids
    #[must_use]
    pub fn production() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(UuidGenerator))
    }
}

/// State of the ticket collection
///
/// The base collection preserves insertion order. `last_error` holds the
/// rejection reason of the most recent failed command, cleared by the next
/// applied event.
#[derive(Clone, Debug, Default)]
pub struct TicketState {
    /// All tickets, in insertion order
    pub tickets: Vec<Ticket>,
    /// Rejection reason of the most recent failed command, if any
    pub last_error: Option<TicketError>,
}

impl TicketState {
    /// Creates a new empty ticket state
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tickets: Vec::new(),
            last_error: None,
        }
    }

    /// Number of tickets in the collection
    #[must_use]
    pub fn count(&self) -> usize {
        self.tickets.len()
    }

    /// Returns a ticket by id
    #[must_use]
    pub fn get(&self, id: &TicketId) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.id == *id)
    }

    /// Checks whether a ticket exists
    #[must_use]
    pub fn exists(&self, id: &TicketId) -> bool {
        self.get(id).is_some()
    }

    /// Tickets with public status, in collection order
    #[must_use]
    pub fn public_tickets(&self) -> Vec<&Ticket> {
        self.tickets
            .iter()
            .filter(|t| t.status == TicketStatus::Public)
            .collect()
    }

    /// Tickets with private status, in collection order
    #[must_use]
    pub fn private_tickets(&self) -> Vec<&Ticket> {
        self.tickets
            .iter()
            .filter(|t| t.status == TicketStatus::Private)
            .collect()
    }
}

/// Actions of the ticket store
///
/// Commands are requests to change the collection; they are validated by the
/// reducer and applied as events. Events are facts and mutate state directly.
#[derive(Clone, Debug, PartialEq)]
pub enum TicketAction {
    // ========== Commands ==========
    /// Command: create a ticket from an add payload
    AddTicket {
        /// The payload; id and timestamps are assigned by the store
        input: NewTicket,
    },

    /// Command: replace an existing ticket wholesale
    UpdateTicket {
        /// The full replacement record; matched by `ticket.id`
        ticket: Ticket,
    },

    /// Command: remove a ticket; a no-op when the id is absent
    DeleteTicket {
        /// Ticket to remove
        id: TicketId,
    },

    // ========== Events ==========
    /// Event: a ticket was appended to the collection
    TicketAdded {
        /// The stored ticket
        ticket: Ticket,
    },

    /// Event: a ticket was replaced in place
    TicketUpdated {
        /// The replacement record
        ticket: Ticket,
    },

    /// Event: a ticket was removed
    TicketDeleted {
        /// Removed ticket id
        id: TicketId,
    },

    /// Event: a command was rejected
    CommandRejected {
        /// Rejection reason
        error: TicketError,
    },
}

impl TicketAction {
    /// Whether this action is a command
    #[must_use]
    pub const fn is_command(&self) -> bool {
        matches!(
            self,
            Self::AddTicket { .. } | Self::UpdateTicket { .. } | Self::DeleteTicket { .. }
        )
    }

    /// Whether this action is an event
    #[must_use]
    pub const fn is_event(&self) -> bool {
        !self.is_command()
    }
}

/// Reducer for the ticket store
#[derive(Clone, Debug, Default)]
pub struct TicketReducer;

impl TicketReducer {
    /// Creates a new `TicketReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates an `UpdateTicket` command
    fn validate_update(state: &TicketState, ticket: &Ticket) -> Result<(), TicketError> {
        if ticket.is_placeholder {
            return Err(TicketError::Placeholder);
        }

        if !state.exists(&ticket.id) {
            return Err(TicketError::NotFound(ticket.id));
        }

        Ok(())
    }

    /// Applies an event to state
    fn apply_event(state: &mut TicketState, action: &TicketAction) {
        match action {
            TicketAction::TicketAdded { ticket } => {
                state.tickets.push(ticket.clone());
                state.last_error = None;
            },
            TicketAction::TicketUpdated { ticket } => {
                if let Some(slot) = state.tickets.iter_mut().find(|t| t.id == ticket.id) {
                    *slot = ticket.clone();
                }
                state.last_error = None;
            },
            TicketAction::TicketDeleted { id } => {
                if let Some(index) = state.tickets.iter().position(|t| t.id == *id) {
                    state.tickets.remove(index);
                }
                state.last_error = None;
            },
            TicketAction::CommandRejected { error } => {
                tracing::warn!(%error, "ticket command rejected");
                state.last_error = Some(error.clone());
            },
            // Commands are not applied to state
            TicketAction::AddTicket { .. }
            | TicketAction::UpdateTicket { .. }
            | TicketAction::DeleteTicket { .. } => {},
        }
    }
}

impl Reducer for TicketReducer {
    type State = TicketState;
    type Action = TicketAction;
    type Environment = TicketEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            TicketAction::AddTicket { input } => {
                if let Err(error) = input.validate() {
                    Self::apply_event(state, &TicketAction::CommandRejected { error });
                    return SmallVec::new();
                }

                let id = TicketId::from_uuid(env.ids.next_id());
                if state.exists(&id) {
                    Self::apply_event(
                        state,
                        &TicketAction::CommandRejected {
                            error: TicketError::DuplicateId(id),
                        },
                    );
                    return SmallVec::new();
                }

                let ticket = input.into_ticket(id, env.clock.now());
                Self::apply_event(state, &TicketAction::TicketAdded { ticket });

                SmallVec::new()
            },

            TicketAction::UpdateTicket { mut ticket } => {
                if let Err(error) = Self::validate_update(state, &ticket) {
                    Self::apply_event(state, &TicketAction::CommandRejected { error });
                    return SmallVec::new();
                }

                // Everything else is taken verbatim; updated_at never drops
                // below created_at even under a skewed clock.
                ticket.updated_at = env.clock.now().max(ticket.created_at);
                Self::apply_event(state, &TicketAction::TicketUpdated { ticket });

                SmallVec::new()
            },

            TicketAction::DeleteTicket { id } => {
                // Deletion is idempotent; an absent id is not an error.
                Self::apply_event(state, &TicketAction::TicketDeleted { id });
                SmallVec::new()
            },

            // ========== Events ==========
            TicketAction::TicketAdded { .. }
            | TicketAction::TicketUpdated { .. }
            | TicketAction::TicketDeleted { .. }
            | TicketAction::CommandRejected { .. } => {
                Self::apply_event(state, &action);
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Review, TicketStatus};
    use chrono::{TimeZone, Utc};
    use ticketbook_testing::mocks::{FixedClock, SequentialIdGenerator, SteppingClock};
    use ticketbook_testing::{ReducerTest, assertions};

    fn test_env() -> TicketEnvironment {
        TicketEnvironment::new(
            Arc::new(FixedClock::epoch()),
            Arc::new(SequentialIdGenerator::new()),
        )
    }

    fn stepping_env() -> TicketEnvironment {
        TicketEnvironment::new(
            Arc::new(SteppingClock::from_epoch()),
            Arc::new(SequentialIdGenerator::new()),
        )
    }

    fn input(title: &str) -> NewTicket {
        NewTicket {
            title: title.to_string(),
            artist: "Silica Gel".to_string(),
            place: "Rolling Hall".to_string(),
            booking_site: "Interpark".to_string(),
            performed_at: Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).single().unwrap(),
            status: None,
            review: None,
            images: Vec::new(),
        }
    }

    #[test]
    fn add_defaults_status_to_public() {
        ReducerTest::new(TicketReducer::new())
            .with_env(test_env())
            .given_state(TicketState::new())
            .when_action(TicketAction::AddTicket { input: input("A") })
            .then_state(|state| {
                assert_eq!(state.count(), 1);
                assert_eq!(state.tickets[0].status, TicketStatus::Public);
                assert_eq!(state.public_tickets().len(), 1);
                assert_eq!(state.private_tickets().len(), 0);
                assert!(state.last_error.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn add_assigns_fresh_id_and_both_timestamps() {
        ReducerTest::new(TicketReducer::new())
            .with_env(test_env())
            .given_state(TicketState::new())
            .when_action(TicketAction::AddTicket { input: input("A") })
            .then_state(|state| {
                let ticket = &state.tickets[0];
                assert_eq!(
                    *ticket.id.as_uuid(),
                    SequentialIdGenerator::nth(0)
                );
                assert_eq!(ticket.created_at, ticket.updated_at);
                assert_eq!(ticket.title, "A");
            })
            .run();
    }

    #[test]
    fn add_rejects_empty_required_field() {
        let mut bad = input("A");
        bad.artist = "  ".to_string();

        ReducerTest::new(TicketReducer::new())
            .with_env(test_env())
            .given_state(TicketState::new())
            .when_action(TicketAction::AddTicket { input: bad })
            .then_state(|state| {
                assert_eq!(state.count(), 0);
                assert_eq!(
                    state.last_error,
                    Some(TicketError::MissingField("artist"))
                );
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn add_preserves_insertion_order() {
        ReducerTest::new(TicketReducer::new())
            .with_env(test_env())
            .given_state(TicketState::new())
            .when_action(TicketAction::AddTicket { input: input("A") })
            .when_action(TicketAction::AddTicket { input: input("B") })
            .when_action(TicketAction::AddTicket { input: input("C") })
            .then_state(|state| {
                let titles: Vec<_> = state.tickets.iter().map(|t| t.title.as_str()).collect();
                assert_eq!(titles, ["A", "B", "C"]);
            })
            .run();
    }

    #[test]
    fn update_replaces_in_place_and_refreshes_updated_at() {
        let reducer = TicketReducer::new();
        let env = stepping_env();
        let mut state = TicketState::new();

        reducer.reduce(&mut state, TicketAction::AddTicket { input: input("A") }, &env);
        reducer.reduce(&mut state, TicketAction::AddTicket { input: input("B") }, &env);

        let mut edited = state.tickets[0].clone();
        let before = edited.updated_at;
        edited.status = TicketStatus::Private;
        edited.review = Some(Review::new("Great show"));

        reducer.reduce(
            &mut state,
            TicketAction::UpdateTicket { ticket: edited },
            &env,
        );

        assert_eq!(state.count(), 2);
        assert_eq!(state.tickets[0].status, TicketStatus::Private);
        assert_eq!(state.tickets[0].review, Some(Review::new("Great show")));
        assert!(state.tickets[0].updated_at > before);
        assert!(state.tickets[0].updated_at >= state.tickets[0].created_at);
        // Position and the other entry are untouched
        assert_eq!(state.tickets[0].title, "A");
        assert_eq!(state.tickets[1].title, "B");
    }

    #[test]
    fn update_unknown_id_is_not_found_and_leaves_collection_unchanged() {
        let reducer = TicketReducer::new();
        let env = test_env();
        let mut state = TicketState::new();

        reducer.reduce(&mut state, TicketAction::AddTicket { input: input("A") }, &env);
        let snapshot = state.tickets.clone();

        let mut ghost = state.tickets[0].clone();
        ghost.id = TicketId::new();
        let ghost_id = ghost.id;

        reducer.reduce(&mut state, TicketAction::UpdateTicket { ticket: ghost }, &env);

        assert_eq!(state.tickets, snapshot);
        assert_eq!(state.last_error, Some(TicketError::NotFound(ghost_id)));
    }

    #[test]
    fn update_rejects_placeholder() {
        ReducerTest::new(TicketReducer::new())
            .with_env(test_env())
            .given_state(TicketState::new())
            .when_action(TicketAction::UpdateTicket {
                ticket: Ticket::placeholder(0),
            })
            .then_state(|state| {
                assert_eq!(state.count(), 0);
                assert_eq!(state.last_error, Some(TicketError::Placeholder));
            })
            .run();
    }

    #[test]
    fn delete_removes_only_the_matching_ticket() {
        let reducer = TicketReducer::new();
        let env = test_env();
        let mut state = TicketState::new();

        reducer.reduce(&mut state, TicketAction::AddTicket { input: input("A") }, &env);
        reducer.reduce(&mut state, TicketAction::AddTicket { input: input("B") }, &env);
        let first = state.tickets[0].id;

        reducer.reduce(&mut state, TicketAction::DeleteTicket { id: first }, &env);

        assert_eq!(state.count(), 1);
        assert_eq!(state.tickets[0].title, "B");
    }

    #[test]
    fn delete_is_idempotent() {
        let reducer = TicketReducer::new();
        let env = test_env();
        let mut state = TicketState::new();

        reducer.reduce(&mut state, TicketAction::AddTicket { input: input("A") }, &env);
        let id = state.tickets[0].id;

        reducer.reduce(&mut state, TicketAction::DeleteTicket { id }, &env);
        let after_first = state.clone();
        reducer.reduce(&mut state, TicketAction::DeleteTicket { id }, &env);

        assert_eq!(state.count(), after_first.count());
        assert!(state.last_error.is_none());
    }

    #[test]
    fn event_replay_rebuilds_state() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).single().unwrap();
        let ticket = input("A").into_ticket(TicketId::new(), now);
        let id = ticket.id;

        ReducerTest::new(TicketReducer::new())
            .with_env(test_env())
            .given_state(TicketState::new())
            .when_action(TicketAction::TicketAdded { ticket })
            .then_state(move |state| {
                assert_eq!(state.count(), 1);
                assert!(state.exists(&id));
            })
            .run();
    }

    #[test]
    fn command_classification() {
        let action = TicketAction::DeleteTicket { id: TicketId::new() };
        assert!(action.is_command());
        assert!(!action.is_event());

        let event = TicketAction::TicketDeleted { id: TicketId::new() };
        assert!(event.is_event());
        assert!(!event.is_command());
    }
}
