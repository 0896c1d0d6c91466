//! Test doubles for the socket transport.

use std::{collections::VecDeque, sync::Mutex};

use notilink_socket::{
    Endpoint, SessionEvent, SocketConnector, SocketSession, TransportError, TransportKind,
};

enum Step {
    Fail(TransportError),
    Session { messages: Vec<String>, ends: bool },
}

/// Connector that plays back a fixed script of connection attempts and
/// records the transport order of each attempt. Once the script runs out,
/// every attempt fails with a load error.
#[derive(Default)]
pub(crate) struct ScriptedConnector {
    script: Mutex<VecDeque<Step>>,
    attempts: Mutex<Vec<Vec<TransportKind>>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next attempt fails negotiation.
    pub fn fail(self, reason: &str) -> Self {
        self.fail_with(TransportError::Negotiation(reason.to_string()))
    }

    /// The next attempt fails with `error`.
    pub fn fail_with(self, error: TransportError) -> Self {
        self.push(Step::Fail(error))
    }

    /// The next attempt opens a session that delivers `messages`. When
    /// `ends` is set the session then disconnects, otherwise it stays open.
    pub fn session<I>(self, messages: I, ends: bool) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.push(Step::Session {
            messages: messages.into_iter().map(Into::into).collect(),
            ends,
        })
    }

    pub fn attempts(&self) -> Vec<Vec<TransportKind>> {
        self.attempts.lock().unwrap().clone()
    }

    fn push(self, step: Step) -> Self {
        self.script.lock().unwrap().push_back(step);
        self
    }
}

#[async_trait::async_trait]
impl SocketConnector for ScriptedConnector {
    async fn connect(
        &self,
        _endpoint: &Endpoint,
        transports: &[TransportKind],
    ) -> Result<Box<dyn SocketSession>, TransportError> {
        self.attempts.lock().unwrap().push(transports.to_vec());
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Fail(error)) => Err(error),
            Some(Step::Session { messages, ends }) => Ok(Box::new(ScriptedSession {
                transport: transports[0],
                messages: messages.into(),
                ends,
            })),
            None => Err(TransportError::Load("script exhausted".into())),
        }
    }
}

struct ScriptedSession {
    transport: TransportKind,
    messages: VecDeque<String>,
    ends: bool,
}

#[async_trait::async_trait]
impl SocketSession for ScriptedSession {
    fn transport(&self) -> TransportKind {
        self.transport
    }

    fn sid(&self) -> &str {
        "scripted"
    }

    async fn next_event(&mut self) -> Result<SessionEvent, TransportError> {
        if let Some(message) = self.messages.pop_front() {
            return Ok(SessionEvent::Message(message));
        }
        if self.ends {
            return Ok(SessionEvent::Disconnected {
                reason: "script ended".into(),
            });
        }
        std::future::pending().await
    }
}
