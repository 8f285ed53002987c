//! HTTP client library for the CrowdStrike Falcon APIs.
//!
//! This crate provides typed clients for two API families that share one
//! request/response pipeline:
//!
//! - [`IntelClient`] — the Falcon Intelligence API (threat actors and
//!   indicators), authenticated with a custom id/key header pair.
//! - [`HostClient`] — the Falcon Host API (IOC management, device and
//!   process queries, detection resolution), authenticated with HTTP basic
//!   auth.
//!
//! Clients are configured through [`ClientBuilder`], a sequence of validated
//! options; credentials are mandatory and checked last. Every endpoint
//! offers a typed method that decodes the JSON reply and normalizes its
//! epoch-seconds date fields into [`chrono::DateTime`] values, plus a `_raw`
//! variant that copies the unparsed reply bytes into a caller-supplied
//! writer.
//!
//! # Example
//!
//! ```no_run
//! use falcon_client::{ActorQuery, ClientBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), falcon_client::Error> {
//!     let intel = ClientBuilder::new()
//!         .credentials("api-id", "api-key")
//!         .build_intel()?;
//!
//!     let reply = intel
//!         .actors(ActorQuery {
//!             q: "panda".to_string(),
//!             ..Default::default()
//!         })
//!         .await?;
//!     for actor in &reply.resources {
//!         println!("{} last active {}", actor.name, actor.last_activity_date);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! The library issues one request per call and surfaces every failure as an
//! [`Error`]; retries, rate limiting and timeouts are left to the caller and
//! the configured `reqwest::Client`.

mod client;
mod error;
mod host;
mod intel;
mod params;
mod time;

pub use client::{AUTH_HEADER_ID, AUTH_HEADER_KEY, ClientBuilder};
pub use error::Error;
pub use host::{
    DEFAULT_HOST_URL, DeviceCount, DeviceCountReply, HostClient, Ioc, IocMeta, IocQuery, IocReply,
    Pagination, Process, ProcessesReply, QueryMeta, ReplyError, ResolveMeta, ResolveReply,
    WriteCounts,
};
pub use intel::{
    ALL_FIELDS, Actor, ActorQuery, ActorsMeta, ActorsReply, BASIC_FIELDS, DEFAULT_INTEL_URL,
    Indicator, IndicatorLabel, IndicatorQuery, IntelClient, Paging, RelatedIndicator, Slugable,
};
pub use params::SortField;
