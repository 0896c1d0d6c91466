use reqwest::Url;

use crate::{ENGINE_IO_VERSION, TransportError, TransportKind, packet::DEFAULT_NAMESPACE};

/// Path the server exposes the Engine.IO handler on.
const ENGINE_IO_PATH: &str = "/socket.io/";

/// A parsed socket server endpoint.
///
/// The path of the configured URL names the Socket.IO namespace, the same
/// way `io("https://host/admin")` joins `/admin`. The Engine.IO handler
/// always lives at `/socket.io/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: Url,
    namespace: String,
}

impl Endpoint {
    /// Parses an `http`, `https`, `ws` or `wss` URL.
    pub fn parse(raw: &str) -> Result<Self, TransportError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TransportError::Load("no endpoint configured".into()));
        }

        let mut url = Url::parse(raw)
            .map_err(|e| TransportError::Load(format!("invalid endpoint {raw:?}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https" | "ws" | "wss") {
            return Err(TransportError::Load(format!(
                "unsupported endpoint scheme {:?}",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(TransportError::Load(format!("endpoint {raw:?} has no host")));
        }

        let namespace = match url.path().trim_end_matches('/') {
            "" => DEFAULT_NAMESPACE.to_string(),
            path => path.to_string(),
        };
        url.set_path(ENGINE_IO_PATH);
        url.set_fragment(None);

        Ok(Self {
            base: url,
            namespace,
        })
    }

    /// Socket.IO namespace to join.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Builds the Engine.IO URL for `kind`, optionally bound to an existing
    /// session.
    pub fn transport_url(
        &self,
        kind: TransportKind,
        sid: Option<&str>,
    ) -> Result<Url, TransportError> {
        let mut url = self.base.clone();
        let secure = matches!(url.scheme(), "https" | "wss");
        let scheme = match (kind, secure) {
            (TransportKind::WebSocket, false) => "ws",
            (TransportKind::WebSocket, true) => "wss",
            (TransportKind::Polling, false) => "http",
            (TransportKind::Polling, true) => "https",
        };
        url.set_scheme(scheme).map_err(|_| {
            TransportError::Load(format!("cannot switch endpoint scheme to {scheme}"))
        })?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("EIO", ENGINE_IO_VERSION)
                .append_pair("transport", kind.as_str());
            if let Some(sid) = sid {
                query.append_pair("sid", sid);
            }
        }

        Ok(url)
    }
}
