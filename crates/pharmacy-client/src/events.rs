//! # Store Events
//!
//! Side effects the store reports to its surroundings.
//!
//! The store never drives the router itself. A forced logout is reported as
//! `Navigate(View::Login)` and whoever owns navigation acts on it.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │  Collection fetch ─► 401 ─► SessionExpired ─► PharmacyStore              │
//! │                                                   │                      │
//! │                                                   ├─ auth.logout()       │
//! │                                                   └─ emit(Navigate(Login))│
//! │                                                          │               │
//! │                                                          ▼               │
//! │                                             StoreEventEmitter (router)   │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::sync::mpsc;

use crate::store::Namespace;

/// Views the store may ask the router to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
}

impl View {
    /// Route path for the view.
    pub fn path(&self) -> &'static str {
        match self {
            View::Login => "/login",
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Something the store did that observers may care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A login succeeded.
    LoggedIn,

    /// The session was cleared, explicitly or forcibly.
    LoggedOut,

    /// An action in `namespace` got a 401 outside the login flow.
    SessionExpired { namespace: Namespace },

    /// The router should show this view.
    Navigate(View),
}

/// Receives store events.
pub trait StoreEventEmitter: Send + Sync {
    fn emit(&self, event: &StoreEvent);
}

/// Drops every event.
pub struct NoOpEmitter;

impl StoreEventEmitter for NoOpEmitter {
    fn emit(&self, _event: &StoreEvent) {}
}

/// Forwards events into an unbounded tokio channel.
pub struct ChannelEmitter {
    tx: mpsc::UnboundedSender<StoreEvent>,
}

impl ChannelEmitter {
    /// Creates the emitter and the receiving end for the UI.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StoreEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelEmitter { tx }, rx)
    }
}

impl StoreEventEmitter for ChannelEmitter {
    fn emit(&self, event: &StoreEvent) {
        // receiver gone means nobody is listening any more
        let _ = self.tx.send(event.clone());
    }
}
