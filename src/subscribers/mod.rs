//! # Event subscribers.
//!
//! [`Subscribe`] is the extension point for observing component lifecycle
//! events (metrics, audit, test recorders). [`SubscriberSet`] fans events out to
//! every subscriber through a dedicated bounded queue and worker.
//!
//! ```text
//!   Supervisor ── publish(Event) ──► Bus ──► event listener ──► SubscriberSet::emit
//!                                                                  ┌────┴────┐
//!                                                                  ▼         ▼
//!                                                              worker 1   worker N
//!                                                                  ▼         ▼
//!                                                           on_event()  on_event()
//! ```

mod subscribe;
mod subscriber_set;

pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
