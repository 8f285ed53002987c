//! Shared HTTP transport for the Falcon API families.
//!
//! Both family clients ([`IntelClient`](crate::IntelClient) and
//! [`HostClient`](crate::HostClient)) are thin wrappers around the same
//! [`Transport`]: base URL joining, query encoding, authentication, status
//! classification and body handling live here, parameterized only by the
//! family's base URL and [`AuthScheme`].

use crate::error::Error;
use crate::params::QueryParams;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::io::Write;
use std::marker::PhantomData;
use std::time::Instant;
use tracing::{error, trace};
use url::Url;


/// Request header carrying the customer id for the Intelligence API.
pub const AUTH_HEADER_ID: &str = "X-CSIX-CUSTID";
/// Request header carrying the customer key for the Intelligence API.
pub const AUTH_HEADER_KEY: &str = "X-CSIX-CUSTKEY";

/// How a request proves its identity. Fixed per API family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthScheme {
    /// Custom id/key header pair (Intelligence API).
    CustomHeaders,
    /// HTTP basic auth, id as username and key as password (Host API).
    Basic,
}

impl AuthScheme {
    fn apply(self, builder: RequestBuilder, id: &str, key: &str) -> RequestBuilder {
        match self {
            Self::CustomHeaders => builder.header(AUTH_HEADER_ID, id).header(AUTH_HEADER_KEY, key),
            Self::Basic => builder.basic_auth(id, Some(key)),
        }
    }
}

/// Where a successful response body ends up.
///
/// Endpoint methods pick the target per call: [`Decode`] parses the body as
/// JSON into a typed value, [`RawCopy`] hands the exact bytes to a caller
/// sink without parsing.
pub(crate) trait ResponseTarget {
    type Output;

    fn consume(self, body: &[u8]) -> Result<Self::Output, Error>;
}

/// Deserializes the response body as JSON into `T`.
pub(crate) struct Decode<T>(PhantomData<T>);

impl<T> Decode<T> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: DeserializeOwned> ResponseTarget for Decode<T> {
    type Output = T;

    fn consume(self, body: &[u8]) -> Result<T, Error> {
        Ok(serde_json::from_slice(body)?)
    }
}

/// Copies the response body unmodified into a caller-supplied sink.
pub(crate) struct RawCopy<'w, W: Write>(pub(crate) &'w mut W);

impl<W: Write> ResponseTarget for RawCopy<'_, W> {
    type Output = ();

    fn consume(self, body: &[u8]) -> Result<(), Error> {
        self.0.write_all(body)?;
        Ok(())
    }
}

/// Builder applying an ordered sequence of validated configuration options.
///
/// Each setter mutates a draft configuration; the first failing option is
/// recorded and short-circuits every later setter, so the terminal
/// `build_intel` / `build_host` call (see the family modules) surfaces the
/// earliest failure. Credentials are checked last, after every option has
/// been applied.
#[derive(Debug, Default)]
pub struct ClientBuilder {
    id: String,
    key: String,
    base_url: Option<Url>,
    http: Option<reqwest::Client>,
    error_log: bool,
    trace_log: bool,
    error: Option<Error>,
}

impl ClientBuilder {
    /// Creates a builder with no options applied.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API credential pair. Both parts must be non-empty.
    #[must_use]
    pub fn credentials(mut self, id: &str, key: &str) -> Self {
        if self.error.is_some() {
            return self;
        }
        if id.is_empty() || key.is_empty() {
            self.error = Some(Error::MissingCredentials);
            return self;
        }
        self.id = id.to_string();
        self.key = key.to_string();
        self
    }

    /// Overrides the family's default endpoint URL.
    ///
    /// The URL must use the `http` or `https` scheme and is normalized to
    /// end with a trailing slash.
    #[must_use]
    pub fn base_url(mut self, raw: &str) -> Self {
        if self.error.is_some() {
            return self;
        }
        match parse_base_url(raw) {
            Ok(url) => self.base_url = Some(url),
            Err(err) => self.error = Some(err),
        }
        self
    }

    /// Supplies a pre-configured HTTP client, e.g. with timeouts or a
    /// custom TLS setup. A default client is used otherwise.
    #[must_use]
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        if self.error.is_some() {
            return self;
        }
        self.http = Some(http);
        self
    }

    /// Enables mirroring of failing responses to `tracing` error events.
    #[must_use]
    pub fn error_log(mut self, enabled: bool) -> Self {
        if self.error.is_some() {
            return self;
        }
        self.error_log = enabled;
        self
    }

    /// Enables mirroring of requests and responses to `tracing` trace
    /// events, bracketed with timing information.
    #[must_use]
    pub fn trace_log(mut self, enabled: bool) -> Self {
        if self.error.is_some() {
            return self;
        }
        self.trace_log = enabled;
        self
    }

    /// Finalizes the configuration for one API family.
    ///
    /// Surfaces the first recorded option failure, then checks credentials
    /// unconditionally last.
    pub(crate) fn into_transport(
        self,
        default_url: &str,
        auth: AuthScheme,
    ) -> Result<Transport, Error> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.id.is_empty() || self.key.is_empty() {
            return Err(Error::MissingCredentials);
        }
        let base_url = match self.base_url {
            Some(url) => url,
            None => parse_base_url(default_url)?,
        };
        if self.trace_log {
            trace!(target: "falcon_client", url = %base_url, "using URL");
        }
        Ok(Transport {
            http: self.http.unwrap_or_default(),
            base_url,
            id: self.id,
            key: self.key,
            auth,
            error_log: self.error_log,
            trace_log: self.trace_log,
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, Error> {
    let url = Url::parse(raw)?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::BadUrl(raw.to_string()));
    }
    if url.path().ends_with('/') {
        return Ok(url);
    }
    let mut raw = url.to_string();
    raw.push('/');
    Ok(Url::parse(&raw)?)
}

/// Authenticated HTTP dispatch shared by both API families.
///
/// Immutable after construction; safe for concurrent reuse as long as the
/// underlying `reqwest::Client` is.
#[derive(Debug, Clone)]
pub(crate) struct Transport {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: Url,
    pub(crate) id: String,
    pub(crate) key: String,
    pub(crate) auth: AuthScheme,
    pub(crate) error_log: bool,
    pub(crate) trace_log: bool,
}

impl Transport {
    /// Executes one API request and hands the body to `target`.
    ///
    /// The response body is fully read on every exit path, so the
    /// connection is always released back to the pool.
    pub(crate) async fn send<R: ResponseTarget>(
        &self,
        method: Method,
        path: &str,
        params: &QueryParams,
        body: Option<String>,
        target: R,
    ) -> Result<R::Output, Error> {
        let mut url = self.base_url.join(path)?;
        if !params.is_empty() {
            url.set_query(Some(&params.encode()));
        }

        let mut builder = self
            .http
            .request(method, url.clone())
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }
        builder = self.auth.apply(builder, &self.id, &self.key);
        let request = builder.build()?;

        if self.trace_log {
            trace!(
                target: "falcon_client",
                method = %request.method(),
                url = %request.url(),
                headers = ?request.headers(),
                "request"
            );
        }
        let started = Instant::now();
        let response = self.http.execute(request).await;
        if self.trace_log {
            trace!(
                target: "falcon_client",
                url = %url,
                elapsed = ?started.elapsed(),
                "request finished"
            );
        }
        let response = response?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            // Drain the body even when nobody looks at it.
            let body = response.bytes().await.unwrap_or_default();
            if self.error_log {
                error!(
                    target: "falcon_client",
                    status = status.as_u16(),
                    headers = ?headers,
                    body = %String::from_utf8_lossy(&body),
                    "unexpected status code"
                );
            }
            return Err(Error::Api {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let body = response.bytes().await?;
        if self.trace_log {
            trace!(
                target: "falcon_client",
                status = status.as_u16(),
                body = %String::from_utf8_lossy(&body),
                "response"
            );
        }
        match target.consume(&body) {
            Ok(output) => Ok(output),
            Err(err) => {
                if self.error_log {
                    error!(
                        target: "falcon_client",
                        error = %err,
                        body = %String::from_utf8_lossy(&body),
                        "failed to consume response body"
                    );
                }
                Err(err)
            }
        }
    }
}
