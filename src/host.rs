//! Client for the Falcon Host API (IOC management and device/process
//! queries).

use crate::client::{AuthScheme, ClientBuilder, Decode, RawCopy, Transport};
use crate::error::Error;
use crate::params::{QueryParams, SortField};
use crate::time::epoch_to_utc;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::io::Write;


/// Default endpoint for the Host API.
pub const DEFAULT_HOST_URL: &str = "https://falconapi.crowdstrike.com/";

const SEARCH_IOCS_PATH: &str = "indicators/queries/iocs/v1";
const DEVICE_COUNT_PATH: &str = "indicators/aggregates/devices-count/v1";
const DEVICES_RAN_ON_PATH: &str = "indicators/queries/devices/v1";
const PROCESSES_RAN_ON_PATH: &str = "indicators/queries/processes/v1";
const PROCESS_DETAILS_PATH: &str = "processes/entities/processes/v1";
const IOC_ENTITIES_PATH: &str = "indicators/entities/iocs/v1";
const RESOLVE_PATH: &str = "detects/entities/detects/v1";

impl ClientBuilder {
    /// Builds a client for the Host API.
    ///
    /// # Errors
    /// Returns the first configuration option failure, or
    /// [`Error::MissingCredentials`] when no credential pair was supplied.
    pub fn build_host(self) -> Result<HostClient, Error> {
        let transport = self.into_transport(DEFAULT_HOST_URL, AuthScheme::Basic)?;
        Ok(HostClient { transport })
    }
}

/// Client for the Falcon Host API.
#[derive(Debug, Clone)]
pub struct HostClient {
    pub(crate) transport: Transport,
}

// ============================================================================
// Requests
// ============================================================================

/// Query for the IOC search endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IocQuery {
    /// Filter on IOC types.
    pub types: Vec<String>,
    /// Filter on IOC values.
    pub values: Vec<String>,
    /// Filter on policies.
    pub policies: Vec<String>,
    /// Filter on share levels.
    pub share_levels: Vec<String>,
    /// Filter on sources.
    pub sources: Vec<String>,
    /// Lower bound on the expiration timestamp.
    #[serde(rename = "fromExpirationTimestamp")]
    pub from_expiration_timestamp: Option<DateTime<Utc>>,
    /// Upper bound on the expiration timestamp.
    #[serde(rename = "toExpirationTimestamp")]
    pub to_expiration_timestamp: Option<DateTime<Utc>>,
    /// Optional sort specification.
    pub sort: Option<SortField>,
    /// Result offset; omitted from the request when zero.
    pub offset: u32,
    /// Maximum number of results; omitted from the request when zero.
    pub limit: u32,
}

/// One indicator of compromise, as uploaded or updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Ioc {
    /// IOC type (e.g. `domain`, `md5`, `ipv4`).
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    /// Observable value.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    /// Action policy (e.g. `detect`, `none`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    /// Visibility of the IOC.
    #[serde(rename = "shareLevel", skip_serializing_if = "Option::is_none")]
    pub share_level: Option<String>,
    /// Days until the IOC expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_days: Option<i64>,
    /// Source that produced the IOC.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn ioc_search_params(query: &IocQuery) -> QueryParams {
    let mut params = QueryParams::new();
    params.add_str_list("types", &query.types);
    params.add_str_list("values", &query.values);
    params.add_str_list("policies", &query.policies);
    params.add_str_list("share_levels", &query.share_levels);
    params.add_str_list("sources", &query.sources);
    params.add_rfc3339("from.expiration_timestamp", query.from_expiration_timestamp);
    params.add_rfc3339("to.expiration_timestamp", query.to_expiration_timestamp);
    if let Some(sort) = &query.sort {
        params.add_sort_fields("sort", std::slice::from_ref(sort));
    }
    if query.limit != 0 {
        params.add_int("limit", query.limit);
    }
    if query.offset != 0 {
        params.add_int("offset", query.offset);
    }
    params
}

// ============================================================================
// Replies
// ============================================================================

/// Error entry reported inside a reply envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyError {
    /// Machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// Pagination window reported in a reply envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    /// Total matching resources.
    pub total: i64,
    /// Offset of the first returned resource.
    pub offset: i64,
    /// Maximum resources per reply.
    pub limit: i64,
}

/// Metadata envelope of an IOC query reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IocMeta {
    /// Server-side query time in seconds.
    pub query_time: f64,
    /// Pagination window.
    pub pagination: Pagination,
    /// Trace id for support requests.
    pub trace_id: String,
    /// Entity the query ran against.
    pub entity: String,
}

/// Reply carrying a flat list of resource ids or values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IocReply {
    /// Metadata envelope.
    pub meta: IocMeta,
    /// Matching resource values.
    pub resources: Vec<String>,
    /// Errors reported by the API.
    pub errors: Vec<ReplyError>,
}

/// Metadata envelope without pagination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryMeta {
    /// Server-side query time in seconds.
    pub query_time: f64,
    /// Trace id for support requests.
    pub trace_id: String,
}

/// Per-device aggregate in a device-count reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceCount {
    /// Number of devices the indicator was seen on.
    pub device_count: i64,
}

/// Reply for [`HostClient::device_count`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceCountReply {
    /// Metadata envelope.
    pub meta: QueryMeta,
    /// Aggregates, one entry per query.
    pub resources: Vec<DeviceCount>,
    /// Errors reported by the API.
    pub errors: Vec<ReplyError>,
}

/// A detected process on a host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Process {
    /// Device the process ran on.
    pub device_id: String,
    /// Full command line.
    pub command_line: String,
    /// Cloud process id.
    pub process_id: String,
    /// Process id local to the device.
    pub process_id_local: String,
    /// Executable file name.
    pub file_name: String,
    /// Process start as epoch seconds.
    #[serde(rename = "start_timestamp_raw")]
    pub start_epoch: f64,
    /// Process start derived from the epoch field.
    #[serde(skip)]
    pub start_timestamp: DateTime<Utc>,
    /// Process stop as epoch seconds.
    #[serde(rename = "stop_timestamp_raw")]
    pub stop_epoch: f64,
    /// Process stop derived from the epoch field.
    #[serde(skip)]
    pub stop_timestamp: DateTime<Utc>,
}

impl Process {
    fn normalize_timestamps(&mut self) {
        self.start_timestamp = epoch_to_utc(self.start_epoch);
        self.stop_timestamp = epoch_to_utc(self.stop_epoch);
    }
}

/// Reply for [`HostClient::process_details`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessesReply {
    /// Metadata envelope.
    pub meta: QueryMeta,
    /// Process details, one per requested id.
    pub resources: Vec<Process>,
    /// Errors reported by the API.
    pub errors: Vec<ReplyError>,
}

/// Write counters reported by mutation endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteCounts {
    /// Number of resources the write affected.
    pub resources_affected: i64,
}

/// Metadata envelope of a resolve reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveMeta {
    /// Server-side query time in seconds.
    pub query_time: f64,
    /// Trace id for support requests.
    pub trace_id: String,
    /// Write counters.
    pub writes: WriteCounts,
}

/// Reply for [`HostClient::resolve`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveReply {
    /// Metadata envelope.
    pub meta: ResolveMeta,
    /// Errors reported by the API.
    pub errors: Vec<ReplyError>,
}

// ============================================================================
// API methods
// ============================================================================

impl HostClient {
    /// Searches uploaded IOCs.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn search_iocs(&self, query: &IocQuery) -> Result<IocReply, Error> {
        let params = ioc_search_params(query);
        self.transport
            .send(Method::GET, SEARCH_IOCS_PATH, &params, None, Decode::new())
            .await
    }

    /// Searches uploaded IOCs and writes the unparsed JSON reply to `sink`.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn search_iocs_raw<W: Write>(&self, query: &IocQuery, sink: &mut W) -> Result<(), Error> {
        let params = ioc_search_params(query);
        self.transport
            .send(Method::GET, SEARCH_IOCS_PATH, &params, None, RawCopy(sink))
            .await
    }

    /// Counts devices an indicator was seen on.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn device_count(&self, kind: &str, value: &str) -> Result<DeviceCountReply, Error> {
        let mut params = QueryParams::new();
        params.push("type", kind);
        params.push("value", value);
        self.transport
            .send(Method::GET, DEVICE_COUNT_PATH, &params, None, Decode::new())
            .await
    }

    /// Counts devices an indicator was seen on and writes the unparsed JSON
    /// reply to `sink`.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn device_count_raw<W: Write>(
        &self,
        kind: &str,
        value: &str,
        sink: &mut W,
    ) -> Result<(), Error> {
        let mut params = QueryParams::new();
        params.push("type", kind);
        params.push("value", value);
        self.transport
            .send(Method::GET, DEVICE_COUNT_PATH, &params, None, RawCopy(sink))
            .await
    }

    /// Lists devices an indicator ran on.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn devices_ran_on(&self, kind: &str, value: &str) -> Result<IocReply, Error> {
        let mut params = QueryParams::new();
        params.push("type", kind);
        params.push("value", value);
        self.transport
            .send(Method::GET, DEVICES_RAN_ON_PATH, &params, None, Decode::new())
            .await
    }

    /// Lists devices an indicator ran on and writes the unparsed JSON reply
    /// to `sink`.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn devices_ran_on_raw<W: Write>(
        &self,
        kind: &str,
        value: &str,
        sink: &mut W,
    ) -> Result<(), Error> {
        let mut params = QueryParams::new();
        params.push("type", kind);
        params.push("value", value);
        self.transport
            .send(Method::GET, DEVICES_RAN_ON_PATH, &params, None, RawCopy(sink))
            .await
    }

    /// Lists processes an indicator ran in on one device.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn processes_ran_on(
        &self,
        kind: &str,
        value: &str,
        device_id: &str,
    ) -> Result<IocReply, Error> {
        let mut params = QueryParams::new();
        params.push("type", kind);
        params.push("value", value);
        params.push("device_id", device_id);
        self.transport
            .send(Method::GET, PROCESSES_RAN_ON_PATH, &params, None, Decode::new())
            .await
    }

    /// Lists processes an indicator ran in on one device and writes the
    /// unparsed JSON reply to `sink`.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn processes_ran_on_raw<W: Write>(
        &self,
        kind: &str,
        value: &str,
        device_id: &str,
        sink: &mut W,
    ) -> Result<(), Error> {
        let mut params = QueryParams::new();
        params.push("type", kind);
        params.push("value", value);
        params.push("device_id", device_id);
        self.transport
            .send(Method::GET, PROCESSES_RAN_ON_PATH, &params, None, RawCopy(sink))
            .await
    }

    /// Fetches details for the given process ids.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn process_details(&self, ids: &[String]) -> Result<ProcessesReply, Error> {
        let mut params = QueryParams::new();
        params.add_str_list("ids", ids);
        let mut reply: ProcessesReply = self
            .transport
            .send(Method::GET, PROCESS_DETAILS_PATH, &params, None, Decode::new())
            .await?;
        for process in &mut reply.resources {
            process.normalize_timestamps();
        }
        Ok(reply)
    }

    /// Fetches details for the given process ids and writes the unparsed
    /// JSON reply to `sink`.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn process_details_raw<W: Write>(
        &self,
        ids: &[String],
        sink: &mut W,
    ) -> Result<(), Error> {
        let mut params = QueryParams::new();
        params.add_str_list("ids", ids);
        self.transport
            .send(Method::GET, PROCESS_DETAILS_PATH, &params, None, RawCopy(sink))
            .await
    }

    /// Uploads new IOCs.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn upload_iocs(&self, iocs: &[Ioc]) -> Result<IocReply, Error> {
        let body = serde_json::to_string(iocs)?;
        self.transport
            .send(
                Method::POST,
                IOC_ENTITIES_PATH,
                &QueryParams::new(),
                Some(body),
                Decode::new(),
            )
            .await
    }

    /// Uploads new IOCs and writes the unparsed JSON reply to `sink`.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn upload_iocs_raw<W: Write>(&self, iocs: &[Ioc], sink: &mut W) -> Result<(), Error> {
        let body = serde_json::to_string(iocs)?;
        self.transport
            .send(
                Method::POST,
                IOC_ENTITIES_PATH,
                &QueryParams::new(),
                Some(body),
                RawCopy(sink),
            )
            .await
    }

    /// Updates the IOCs with the given ids.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn update_iocs(&self, ids: &[String], ioc: &Ioc) -> Result<IocReply, Error> {
        let mut params = QueryParams::new();
        params.add_str_list("ids", ids);
        let body = serde_json::to_string(ioc)?;
        self.transport
            .send(Method::PATCH, IOC_ENTITIES_PATH, &params, Some(body), Decode::new())
            .await
    }

    /// Updates the IOCs with the given ids and writes the unparsed JSON
    /// reply to `sink`.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn update_iocs_raw<W: Write>(
        &self,
        ids: &[String],
        ioc: &Ioc,
        sink: &mut W,
    ) -> Result<(), Error> {
        let mut params = QueryParams::new();
        params.add_str_list("ids", ids);
        let body = serde_json::to_string(ioc)?;
        self.transport
            .send(Method::PATCH, IOC_ENTITIES_PATH, &params, Some(body), RawCopy(sink))
            .await
    }

    /// Deletes the IOCs with the given ids.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn delete_iocs(&self, ids: &[String]) -> Result<IocReply, Error> {
        let mut params = QueryParams::new();
        params.add_str_list("ids", ids);
        self.transport
            .send(Method::DELETE, IOC_ENTITIES_PATH, &params, None, Decode::new())
            .await
    }

    /// Deletes the IOCs with the given ids and writes the unparsed JSON
    /// reply to `sink`.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn delete_iocs_raw<W: Write>(&self, ids: &[String], sink: &mut W) -> Result<(), Error> {
        let mut params = QueryParams::new();
        params.add_str_list("ids", ids);
        self.transport
            .send(Method::DELETE, IOC_ENTITIES_PATH, &params, None, RawCopy(sink))
            .await
    }

    /// Resolves detections to a new status.
    ///
    /// An empty `to_status` is omitted from the request.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn resolve(&self, ids: &[String], to_status: &str) -> Result<ResolveReply, Error> {
        let mut params = QueryParams::new();
        params.add_str_list("ids", ids);
        params.add_str("to_status", to_status);
        self.transport
            .send(Method::PATCH, RESOLVE_PATH, &params, None, Decode::new())
            .await
    }

    /// Resolves detections to a new status and writes the unparsed JSON
    /// reply to `sink`.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn resolve_raw<W: Write>(
        &self,
        ids: &[String],
        to_status: &str,
        sink: &mut W,
    ) -> Result<(), Error> {
        let mut params = QueryParams::new();
        params.add_str_list("ids", ids);
        params.add_str("to_status", to_status);
        self.transport
            .send(Method::PATCH, RESOLVE_PATH, &params, None, RawCopy(sink))
            .await
    }
}
