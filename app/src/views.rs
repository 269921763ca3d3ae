//! Derived presentation views over the ticket collection.
//!
//! Every function here is a pure projection of [`TicketState`]: nothing is
//! cached or stored, so a view recomputed after any mutation is always
//! consistent with the base collection and with every other view.

use crate::reducer::TicketState;
use crate::types::Ticket;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Default grid capacity: a 3 x 3 wall of ticket cards
pub const DEFAULT_GRID_SIZE: usize = 9;

/// The ticket grid, padded with placeholder cards
///
/// Real tickets come first in collection order, followed by synthetic
/// placeholder entries up to `min_cells`. Placeholders exist only in the
/// returned value; they are never stored and must never be passed back into
/// the store.
#[must_use]
pub fn padded_grid(state: &TicketState, min_cells: usize) -> Vec<Ticket> {
    let mut grid: Vec<Ticket> = state
        .tickets
        .iter()
        .filter(|t| !t.is_placeholder)
        .cloned()
        .collect();

    while grid.len() < min_cells {
        grid.push(Ticket::placeholder(grid.len()));
    }

    grid
}

/// Calendar days with at least one performance
///
/// Sorted ascending; used to mark calendar cells.
#[must_use]
pub fn performance_dates(state: &TicketState) -> BTreeSet<NaiveDate> {
    state
        .tickets
        .iter()
        .map(|t| t.performed_at.date_naive())
        .collect()
}

/// Tickets performed on the given calendar day, in collection order
#[must_use]
pub fn tickets_on(state: &TicketState, day: NaiveDate) -> Vec<&Ticket> {
    state
        .tickets
        .iter()
        .filter(|t| t.performed_at.date_naive() == day)
        .collect()
}
