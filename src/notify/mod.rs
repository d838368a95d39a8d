//! Change notification for reloaded data.
//!
//! Listeners are registered against a reloader and invoked, in registration
//! order, every time the content actually changes.

pub mod listeners;

pub use listeners::{ListenerId, ListenerRegistry, ReloadListener};
