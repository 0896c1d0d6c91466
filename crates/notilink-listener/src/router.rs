//! Fan-out of decoded notifications to the host collaborators.
//!
//! Every decoded message goes through three independent steps: a broadcast
//! of the raw text, a cache invalidation for the record, and a handler
//! looked up by object name. A failing step is logged and does not prevent
//! the steps after it.

use std::{collections::HashMap, sync::Arc, time::Duration};

use notilink_bridge::{
    notification::{ToastMessage, ToastMode, ToastVariant},
    record::{NotificationRecord, RecordChange},
};

use crate::collaborators::{
    BridgeOutlet, CacheInvalidator, CollaboratorError, EventSink, ToastNotifier,
};

/// Object name handled by [`CaseHandler`].
pub const CASE_OBJECT: &str = "Case";

/// Handler invoked for records of a specific object type.
#[async_trait::async_trait]
pub trait ObjectHandler: Send + Sync {
    async fn handle(
        &self,
        record: &NotificationRecord,
        context: &HandlerContext<'_>,
    ) -> Result<(), CollaboratorError>;
}

/// The host services the router forwards to.
#[derive(Clone)]
pub struct Collaborators {
    pub events: Arc<dyn EventSink>,
    pub cache: Arc<dyn CacheInvalidator>,
    pub toasts: Arc<dyn ToastNotifier>,
}

impl From<BridgeOutlet> for Collaborators {
    fn from(outlet: BridgeOutlet) -> Self {
        let outlet = Arc::new(outlet);
        Self {
            events: outlet.clone(),
            cache: outlet.clone(),
            toasts: outlet,
        }
    }
}

/// What an object handler can use while handling a record.
pub struct HandlerContext<'a> {
    pub toasts: &'a dyn ToastNotifier,
    /// Identifier of the user viewing the host, if known.
    pub current_user_id: Option<&'a str>,
    pub toast_duration: Duration,
}

impl HandlerContext<'_> {
    /// Whether `user_id` is the user viewing the host.
    pub fn is_current_user(&self, user_id: &str) -> bool {
        !user_id.is_empty() && self.current_user_id == Some(user_id)
    }
}

/// Result of a single routing step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    Skipped,
    Failed(String),
}

impl StepOutcome {
    fn from_result(result: Result<(), CollaboratorError>) -> Self {
        match result {
            Ok(()) => StepOutcome::Done,
            Err(error) => StepOutcome::Failed(error.to_string()),
        }
    }
}

/// Outcome of every step for one routed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteReport {
    pub broadcast: StepOutcome,
    pub invalidation: StepOutcome,
    pub dispatch: StepOutcome,
}

pub struct NotificationRouter {
    collaborators: Collaborators,
    current_user_id: Option<String>,
    toast_duration: Duration,
    handlers: HashMap<String, Box<dyn ObjectHandler>>,
}

impl NotificationRouter {
    /// Creates a router with an empty dispatch table.
    pub fn new(
        collaborators: Collaborators,
        current_user_id: Option<String>,
        toast_duration: Duration,
    ) -> Self {
        Self {
            collaborators,
            current_user_id,
            toast_duration,
            handlers: HashMap::new(),
        }
    }

    /// Registers the built-in object handlers.
    pub fn with_default_handlers(mut self) -> Self {
        self.register(CASE_OBJECT, CaseHandler);
        self
    }

    /// Registers `handler` for records whose object name is exactly
    /// `object_name`, replacing any previous handler for it.
    pub fn register(
        &mut self,
        object_name: impl Into<String>,
        handler: impl ObjectHandler + 'static,
    ) {
        self.handlers.insert(object_name.into(), Box::new(handler));
    }

    /// Routes one decoded record. `raw` is the original message text.
    pub async fn route(&self, raw: &str, record: &NotificationRecord) -> RouteReport {
        let broadcast =
            StepOutcome::from_result(self.collaborators.events.message_received(raw).await);

        let invalidation = if record.record_id.is_empty() {
            StepOutcome::Skipped
        } else {
            StepOutcome::from_result(
                self.collaborators
                    .cache
                    .notify_record_change(vec![RecordChange::new(record.record_id.clone())])
                    .await,
            )
        };

        let dispatch = match self.handlers.get(&record.object_name) {
            Some(handler) => {
                let context = HandlerContext {
                    toasts: self.collaborators.toasts.as_ref(),
                    current_user_id: self.current_user_id.as_deref(),
                    toast_duration: self.toast_duration,
                };
                StepOutcome::from_result(handler.handle(record, &context).await)
            }
            None => StepOutcome::Skipped,
        };

        let report = RouteReport {
            broadcast,
            invalidation,
            dispatch,
        };
        for (step, outcome) in [
            ("broadcast", &report.broadcast),
            ("cache invalidation", &report.invalidation),
            ("object dispatch", &report.dispatch),
        ] {
            if let StepOutcome::Failed(reason) = outcome {
                log::warn!(
                    "Routing step {step} failed for record {:?}: {reason}",
                    record.record_id
                );
            }
        }
        report
    }
}

/// Shows a toast summarizing a case update.
pub struct CaseHandler;

#[async_trait::async_trait]
impl ObjectHandler for CaseHandler {
    async fn handle(
        &self,
        record: &NotificationRecord,
        context: &HandlerContext<'_>,
    ) -> Result<(), CollaboratorError> {
        let variant = if context.is_current_user(&record.submitted_by) {
            ToastVariant::Success
        } else {
            ToastVariant::Info
        };

        let toast = ToastMessage {
            variant,
            mode: ToastMode::Dismissible,
            title: format!("Case Message Received for: {}", record.record_id),
            message: format!(
                "{} Submitter: {}",
                record.primary_payload, record.submitted_by
            ),
            duration: context.toast_duration,
        };
        context.toasts.show_toast(toast).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use mockall::predicate::eq;

    use super::*;
    use crate::collaborators::{MockCacheInvalidator, MockEventSink, MockToastNotifier};

    const DURATION: Duration = Duration::from_millis(1000);

    fn router(
        events: MockEventSink,
        cache: MockCacheInvalidator,
        toasts: MockToastNotifier,
        current_user_id: Option<&str>,
    ) -> NotificationRouter {
        NotificationRouter::new(
            Collaborators {
                events: Arc::new(events),
                cache: Arc::new(cache),
                toasts: Arc::new(toasts),
            },
            current_user_id.map(str::to_string),
            DURATION,
        )
        .with_default_handlers()
    }

    fn accepting_events(raw: &'static str) -> MockEventSink {
        let mut events = MockEventSink::new();
        events
            .expect_message_received()
            .withf(move |message| message == raw)
            .times(1)
            .returning(|_| Ok(()));
        events
    }

    struct CountingHandler {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl ObjectHandler for CountingHandler {
        async fn handle(
            &self,
            record: &NotificationRecord,
            _context: &HandlerContext<'_>,
        ) -> Result<(), CollaboratorError> {
            assert_eq!(record.object_name, "Opportunity");
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn record(record_id: &str, object_name: &str) -> NotificationRecord {
        NotificationRecord {
            record_id: record_id.to_string(),
            object_name: object_name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn invalidates_the_record_exactly_once() {
        let mut cache = MockCacheInvalidator::new();
        cache
            .expect_notify_record_change()
            .with(eq(vec![RecordChange::new("0015w0000299PWfAAM")]))
            .times(1)
            .returning(|_| Ok(()));
        let mut toasts = MockToastNotifier::new();
        toasts.expect_show_toast().never();

        let router = router(accepting_events("raw"), cache, toasts, None);
        let report = router.route("raw", &record("0015w0000299PWfAAM", "Account")).await;

        assert_eq!(
            report,
            RouteReport {
                broadcast: StepOutcome::Done,
                invalidation: StepOutcome::Done,
                dispatch: StepOutcome::Skipped,
            }
        );
    }

    #[tokio::test]
    async fn empty_record_id_skips_invalidation() {
        let mut cache = MockCacheInvalidator::new();
        cache.expect_notify_record_change().never();
        let mut toasts = MockToastNotifier::new();
        toasts.expect_show_toast().never();

        let router = router(accepting_events("raw"), cache, toasts, None);
        let report = router.route("raw", &record("", "")).await;

        assert_eq!(report.broadcast, StepOutcome::Done);
        assert_eq!(report.invalidation, StepOutcome::Skipped);
        assert_eq!(report.dispatch, StepOutcome::Skipped);
    }

    #[tokio::test]
    async fn case_record_raises_a_toast() {
        let mut cache = MockCacheInvalidator::new();
        cache
            .expect_notify_record_change()
            .times(1)
            .returning(|_| Ok(()));
        let mut toasts = MockToastNotifier::new();
        toasts
            .expect_show_toast()
            .withf(|toast| {
                toast.title.contains("500xx")
                    && toast.message.contains("hello")
                    && toast.message.contains("005xx")
                    && toast.variant == ToastVariant::Info
                    && toast.mode == ToastMode::Dismissible
                    && toast.duration == DURATION
            })
            .times(1)
            .returning(|_| Ok(()));

        let router = router(accepting_events("raw"), cache, toasts, Some("005yy"));
        let record = NotificationRecord {
            record_id: "500xx".to_string(),
            object_name: "Case".to_string(),
            primary_payload: "hello".to_string(),
            submitted_by: "005xx".to_string(),
            ..Default::default()
        };

        assert_eq!(router.route("raw", &record).await.dispatch, StepOutcome::Done);
    }

    #[tokio::test]
    async fn case_submitted_by_current_user_is_a_success_toast() {
        let mut cache = MockCacheInvalidator::new();
        cache.expect_notify_record_change().returning(|_| Ok(()));
        let mut toasts = MockToastNotifier::new();
        toasts
            .expect_show_toast()
            .withf(|toast| toast.variant == ToastVariant::Success)
            .times(1)
            .returning(|_| Ok(()));

        let router = router(accepting_events("raw"), cache, toasts, Some("005xx"));
        let record = NotificationRecord {
            record_id: "500xx".to_string(),
            object_name: "Case".to_string(),
            submitted_by: "005xx".to_string(),
            ..Default::default()
        };

        router.route("raw", &record).await;
    }

    #[tokio::test]
    async fn object_names_match_exactly() {
        for object_name in ["Account", "", "case", "Case ", "MyObject__c"] {
            let mut cache = MockCacheInvalidator::new();
            cache.expect_notify_record_change().returning(|_| Ok(()));
            let mut toasts = MockToastNotifier::new();
            toasts.expect_show_toast().never();

            let router = router(accepting_events("raw"), cache, toasts, None);
            let report = router.route("raw", &record("001", object_name)).await;
            assert_eq!(report.broadcast, StepOutcome::Done, "{object_name:?}");
            assert_eq!(report.invalidation, StepOutcome::Done, "{object_name:?}");
            assert_eq!(report.dispatch, StepOutcome::Skipped, "{object_name:?}");
        }
    }

    #[tokio::test]
    async fn failing_steps_do_not_suppress_the_toast() {
        let mut events = MockEventSink::new();
        events
            .expect_message_received()
            .returning(|_| Err(CollaboratorError::ChannelClosed));
        let mut cache = MockCacheInvalidator::new();
        cache
            .expect_notify_record_change()
            .returning(|_| Err(CollaboratorError::ChannelClosed));
        let mut toasts = MockToastNotifier::new();
        toasts.expect_show_toast().times(1).returning(|_| Ok(()));

        let router = router(events, cache, toasts, None);
        let report = router.route("raw", &record("500xx", "Case")).await;

        assert_eq!(
            report,
            RouteReport {
                broadcast: StepOutcome::Failed("host channel is closed".to_string()),
                invalidation: StepOutcome::Failed("host channel is closed".to_string()),
                dispatch: StepOutcome::Done,
            }
        );
    }

    #[tokio::test]
    async fn registered_handlers_extend_the_table() {
        let mut cache = MockCacheInvalidator::new();
        cache.expect_notify_record_change().returning(|_| Ok(()));
        let mut toasts = MockToastNotifier::new();
        toasts.expect_show_toast().never();

        let calls = Arc::new(AtomicUsize::new(0));
        let mut router = router(accepting_events("raw"), cache, toasts, None);
        router.register(
            "Opportunity",
            CountingHandler {
                calls: calls.clone(),
            },
        );

        let report = router.route("raw", &record("006xx", "Opportunity")).await;
        assert_eq!(report.dispatch, StepOutcome::Done);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn current_user_comparison_ignores_empty_submitters() {
        let toasts = MockToastNotifier::new();
        let context = HandlerContext {
            toasts: &toasts,
            current_user_id: Some(""),
            toast_duration: DURATION,
        };
        assert!(!context.is_current_user(""));

        let context = HandlerContext {
            current_user_id: None,
            ..context
        };
        assert!(!context.is_current_user("005xx"));
    }
}
