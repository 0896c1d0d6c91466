//! Listener service handlers for host requests and socket events.
//!
//! This module groups async handlers that operate on the shared
//! `ListenerContext`, touch the connection or the listener state, and emit
//! responses or notifications back to the host.

pub mod config_service;
pub mod connection_service;
pub mod message_service;
pub mod record_service;

/// Represents a type that is used in all handlers as a listener context.
pub(crate) type ListenerContextHandle = std::sync::Arc<crate::app::ListenerContext>;
