//! Pending interactive sessions for multi-turn chat workflows.
//!
//! A plugin that asks the user to pick from a numbered list parks a
//! [`Session`] in a [`SessionStore`] and returns. The next matching message
//! from the same sender either resolves the session into a pick, is rejected
//! as an invalid choice (session kept), or is ignored as not belonging to
//! the session at all. Sessions that see no valid pick within the store's
//! timeout are removed by their timer and reported through the expiry
//! callback.

pub mod correlate;
pub mod error;
pub mod select;
pub mod store;

pub use {
    correlate::CorrelationRule,
    error::SelectionError,
    store::{Expired, ExpiryFn, Resolution, Session, SessionState, SessionStore},
};
