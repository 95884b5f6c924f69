// HTTP transport for GMP-over-HTTP
//
// gsad takes flat key/value command parameters — query string on GET,
// multipart form on POST (file uploads and exports share the POST path) —
// and answers with an XML envelope. `GmpHttp` owns the session token and
// an ordered chain of response-error handlers; envelope parsing lives in
// `xml`, command construction in `command`. One `GmpHttp` per session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use reqwest::multipart::Form;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::{Error, RejectReason};
use crate::transport::TransportConfig;
use crate::xml;

// ── Parameters ───────────────────────────────────────────────────────

/// Ordered key/value parameter set for one GMP command.
///
/// Duplicate keys are legal — the protocol's list convention repeats a
/// trailing-colon key once per value (`agent_ids:`), and bulk selection
/// encodes ids into key names (`bulk_selected:<id>=1`).
#[derive(Debug, Clone, Default)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter. Existing keys are kept.
    pub fn add(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((name.into(), value.into()));
        self
    }

    /// Append an optional parameter, skipping `None`.
    pub fn add_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.add(name, value),
            None => self,
        }
    }

    /// Append a multi-value field using the trailing-colon list convention:
    /// the key `name:` is repeated once per value.
    pub fn add_list<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for value in values {
            self.pairs.push((name.to_owned(), value.into()));
        }
        self
    }

    /// Append every pair from another parameter set, keeping order.
    pub fn merge(mut self, other: Params) -> Self {
        self.pairs.extend(other.pairs);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pairs.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

// ── Error handler chain ──────────────────────────────────────────────

/// Context handed to registered response-error handlers.
#[derive(Debug, Clone, Copy)]
pub struct ErrorContext {
    pub status: u16,
    pub reason: RejectReason,
}

type ErrorHandler = dyn Fn(&ErrorContext) + Send + Sync;

/// Disposer for one registered error handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerId(u64);

// ── Raw response ─────────────────────────────────────────────────────

/// An unprocessed 2xx response body. Exports stay raw bytes; everything
/// else goes through `xml::parse_envelope`.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// The body as text (lossy — GMP responses are UTF-8 by contract).
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// HTTP transport bound to one gsad endpoint and one session.
///
/// The token is read per-request and updated out-of-band by the login
/// flow; handlers and token live behind locks so one instance can be
/// shared across concurrent calls.
pub struct GmpHttp {
    http: reqwest::Client,
    endpoint: Url,
    token: RwLock<Option<SecretString>>,
    handlers: Mutex<Vec<(HandlerId, Arc<ErrorHandler>)>>,
    next_handler_id: AtomicU64,
    timeout: Option<Duration>,
}

impl GmpHttp {
    /// Create a transport for the gsad endpoint (e.g. `https://host/gmp`).
    pub fn new(endpoint: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            endpoint: Url::parse(endpoint)?,
            token: RwLock::new(None),
            handlers: Mutex::new(Vec::new()),
            next_handler_id: AtomicU64::new(1),
            timeout: transport.timeout,
        })
    }

    /// Wrap a pre-built `reqwest::Client`.
    pub fn with_client(endpoint: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            endpoint: Url::parse(endpoint)?,
            token: RwLock::new(None),
            handlers: Mutex::new(Vec::new()),
            next_handler_id: AtomicU64::new(1),
            timeout: None,
        })
    }

    // ── Session token ────────────────────────────────────────────────

    /// Install the session token carried on every subsequent request.
    pub fn set_token(&self, token: SecretString) {
        *self.token.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token);
    }

    pub fn clear_token(&self) {
        *self.token.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    fn current_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|t| t.expose_secret().to_owned())
    }

    // ── Error handler chain ──────────────────────────────────────────

    /// Register a handler invoked on every non-2xx response before the
    /// rejection is constructed. Returns a disposer id for individual
    /// removal; handlers never alter the rejection itself.
    pub fn add_error_handler<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&ErrorContext) + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_handler_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove a single handler by its disposer id.
    pub fn remove_error_handler(&self, id: HandlerId) {
        self.handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .retain(|(h, _)| *h != id);
    }

    /// Run the handler chain in registration order. The list is
    /// snapshotted first, so handlers registered at dispatch time all run
    /// even if one of them removes another mid-iteration.
    fn dispatch_error_handlers(&self, context: &ErrorContext) {
        let snapshot: Vec<Arc<ErrorHandler>> = self
            .handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in snapshot {
            handler(context);
        }
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Issue a GET with the parameters serialized into the query string.
    pub async fn get(&self, params: &Params) -> Result<RawResponse, Error> {
        let pairs = self.with_token(params);
        debug!(cmd = params.get("cmd").unwrap_or("-"), "GET {}", self.endpoint);
        let request = self.http.get(self.endpoint.clone()).query(&pairs);
        self.execute(request).await
    }

    /// Issue a POST with the parameters as a multipart form body.
    pub async fn post(&self, params: &Params) -> Result<RawResponse, Error> {
        let pairs = self.with_token(params);
        debug!(cmd = params.get("cmd").unwrap_or("-"), "POST {}", self.endpoint);
        let mut form = Form::new();
        for (name, value) in pairs {
            form = form.text(name, value);
        }
        let request = self.http.post(self.endpoint.clone()).multipart(form);
        self.execute(request).await
    }

    /// Merge the session token into the parameter list. An explicit
    /// per-call `token` parameter wins over the client-held one.
    fn with_token(&self, params: &Params) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = params
            .entries()
            .map(|(n, v)| (n.to_owned(), v.to_owned()))
            .collect();
        if !params.contains("token") {
            if let Some(token) = self.current_token() {
                pairs.push(("token".to_owned(), token));
            }
        }
        pairs
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<RawResponse, Error> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_secs: self.timeout.as_ref().map(Duration::as_secs),
                }
            } else {
                Error::Transport(e)
            }
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(Error::Transport)?.to_vec();

        if !status.is_success() {
            let reason = if status == reqwest::StatusCode::UNAUTHORIZED {
                RejectReason::Unauthorized
            } else {
                RejectReason::Error
            };
            self.dispatch_error_handlers(&ErrorContext {
                status: status.as_u16(),
                reason,
            });

            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(Error::Unauthorized);
            }

            let message = xml::extract_rejection_message(&String::from_utf8_lossy(&body))
                .unwrap_or_else(|| status.to_string());
            return Err(Error::Response {
                message,
                status: Some(status.as_u16()),
            });
        }

        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_keep_duplicates_in_order() {
        let params = Params::new()
            .add("cmd", "create_agent_group")
            .add_list("agent_ids:", ["a1", "a2"]);
        let pairs: Vec<_> = params.entries().collect();
        assert_eq!(
            pairs,
            [
                ("cmd", "create_agent_group"),
                ("agent_ids:", "a1"),
                ("agent_ids:", "a2"),
            ]
        );
    }

    #[test]
    fn add_opt_skips_none() {
        let params = Params::new()
            .add_opt("comment", Some("note"))
            .add_opt("filter", None::<String>);
        assert!(params.contains("comment"));
        assert!(!params.contains("filter"));
    }
}
