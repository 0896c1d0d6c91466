//! Socket notification listener.
//!
//! The listener keeps one socket.io connection to the notification server,
//! decodes every inbound message into a
//! [`NotificationRecord`](notilink_bridge::record::NotificationRecord) and
//! routes it to the host: the raw message is broadcast, the record cache is
//! invalidated and an object specific handler may raise a toast.
//!
//! Everything talks to the host through the channels of
//! [`notilink_bridge::BridgeChannels`]; start the listener with [`run`].

mod app;
pub mod collaborators;
mod config;
pub mod connection;
pub mod decoder;
pub mod router;
mod runtime;
mod services;
mod state;
#[cfg(test)]
mod testing;

pub use crate::runtime::run;
