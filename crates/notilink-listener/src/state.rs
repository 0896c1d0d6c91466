use notilink_bridge::record::NotificationRecord;

/// The listener state that holds configuration, host context, and the most
/// recently decoded record.
///
/// It is designed to be wrapped in an async-friendly lock (see
/// [`SharedState`]) so that service handlers can read it and occasionally
/// write to it.
#[derive(Debug, Clone)]
pub struct State {
    /// The loaded listener configuration.
    pub config: notilink_bridge::config::Config,
    /// Record the host is scoped to, if it is embedded on a record page.
    pub record_context: Option<String>,
    /// The last successfully decoded record. Overwritten by every message.
    pub current_record: Option<NotificationRecord>,
}

impl State {
    pub fn new(config: notilink_bridge::config::Config) -> Self {
        Self {
            record_context: config.record_id.clone(),
            config,
            current_record: None,
        }
    }
}

/// Async-friendly shared reference to the listener [`State`].
pub type SharedState = std::sync::Arc<tokio::sync::RwLock<State>>;
