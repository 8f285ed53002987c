//! Client for the Falcon Intelligence API (threat actors and indicators).

use crate::client::{AuthScheme, ClientBuilder, Decode, RawCopy, Transport};
use crate::error::Error;
use crate::params::{QueryParams, SortField};
use crate::time::epoch_to_utc;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::io::Write;


/// Default endpoint for the Intelligence API.
pub const DEFAULT_INTEL_URL: &str = "https://intelapi.crowdstrike.com/";
/// Field-selection sentinel requesting every field of each resource.
pub const ALL_FIELDS: &str = "__full__";
/// Field-selection sentinel requesting the basic field set.
pub const BASIC_FIELDS: &str = "__basic__";

const ACTORS_PATH: &str = "actor/v1/queries/actors";

impl ClientBuilder {
    /// Builds a client for the Intelligence API.
    ///
    /// # Errors
    /// Returns the first configuration option failure, or
    /// [`Error::MissingCredentials`] when no credential pair was supplied.
    pub fn build_intel(self) -> Result<IntelClient, Error> {
        let transport = self.into_transport(DEFAULT_INTEL_URL, AuthScheme::CustomHeaders)?;
        Ok(IntelClient { transport })
    }
}

/// Client for the Falcon Intelligence API.
#[derive(Debug, Clone)]
pub struct IntelClient {
    pub(crate) transport: Transport,
}

// ============================================================================
// Actors
// ============================================================================

/// Query for the actors endpoint. Filters are AND'ed together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActorQuery {
    /// Free-text query across all fields.
    pub q: String,
    /// Filter on the actor name.
    pub name: String,
    /// Filter on the actor description.
    pub description: String,
    /// Lower bound on the last-modified date.
    pub min_last_modified_date: Option<DateTime<Utc>>,
    /// Upper bound on the last-modified date.
    pub max_last_modified_date: Option<DateTime<Utc>>,
    /// Lower bound on the last-activity date.
    pub min_last_activity_date: Option<DateTime<Utc>>,
    /// Upper bound on the last-activity date.
    pub max_last_activity_date: Option<DateTime<Utc>>,
    /// Filter on origin countries.
    pub origins: Vec<String>,
    /// Filter on targeted countries.
    pub target_countries: Vec<String>,
    /// Filter on targeted industries.
    pub target_industries: Vec<String>,
    /// Filter on actor motivations.
    pub motivations: Vec<String>,
    /// Fields requested in the reply. Accepts [`ALL_FIELDS`] and
    /// [`BASIC_FIELDS`]; defaults to the basic set when empty.
    pub fields: Vec<String>,
    /// Sort specification, applied in order.
    #[serde(rename = "sort")]
    pub sort_fields: Vec<SortField>,
    /// Result offset, zero-based.
    pub offset: u32,
    /// Maximum number of results; defaults to 10 when zero.
    pub limit: u32,
}

/// Identifier with a display value and URL slug.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Slugable {
    /// Numeric id.
    pub id: i64,
    /// Display value.
    pub value: String,
    /// URL slug.
    pub slug: String,
}

/// One threat actor in an actors reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Actor {
    /// Numeric actor id.
    pub id: i64,
    /// Actor name.
    pub name: String,
    /// Short description.
    pub short_description: String,
    /// Aliases the actor is known as.
    pub known_as: String,
    /// Creation date as epoch seconds.
    #[serde(rename = "created_date")]
    pub created_epoch: f64,
    /// Creation date derived from the epoch field.
    #[serde(skip)]
    pub created_date: DateTime<Utc>,
    /// Industries the actor targets.
    pub target_industries: Vec<Slugable>,
    /// Last modification as epoch seconds.
    #[serde(rename = "last_modified_date")]
    pub last_modified_epoch: f64,
    /// Last modification derived from the epoch field.
    #[serde(skip)]
    pub last_modified_date: DateTime<Utc>,
    /// Countries the actor targets.
    pub target_countries: Vec<Slugable>,
    /// First observed activity as epoch seconds.
    #[serde(rename = "first_activity_date")]
    pub first_activity_epoch: f64,
    /// First observed activity derived from the epoch field.
    #[serde(skip)]
    pub first_activity_date: DateTime<Utc>,
    /// Last observed activity as epoch seconds.
    #[serde(rename = "last_activity_date")]
    pub last_activity_epoch: f64,
    /// Last observed activity derived from the epoch field.
    #[serde(skip)]
    pub last_activity_date: DateTime<Utc>,
    /// Portal URL for the actor.
    pub url: String,
    /// Actor motivations.
    pub motivations: Vec<Slugable>,
    /// Origin countries.
    pub origins: Vec<Slugable>,
    /// URL slug.
    pub slug: String,
}

impl Actor {
    fn normalize_timestamps(&mut self) {
        self.created_date = epoch_to_utc(self.created_epoch);
        self.last_modified_date = epoch_to_utc(self.last_modified_epoch);
        self.first_activity_date = epoch_to_utc(self.first_activity_epoch);
        self.last_activity_date = epoch_to_utc(self.last_activity_epoch);
    }
}

/// Paging window reported in an actors reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Paging {
    /// Total matching resources.
    pub total: i64,
    /// Offset of the first returned resource.
    pub offset: i64,
    /// Maximum resources per reply.
    pub limit: i64,
}

/// Metadata envelope of an actors reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorsMeta {
    /// Paging window.
    pub paging: Paging,
}

/// Reply for [`IntelClient::actors`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorsReply {
    /// Metadata envelope.
    pub meta: ActorsMeta,
    /// Server-side query time in seconds.
    pub query_time: f64,
    /// Matching actors.
    pub resources: Vec<Actor>,
}

fn actor_params(query: &mut ActorQuery) -> QueryParams {
    if query.limit == 0 {
        query.limit = 10;
    }
    if query.fields.is_empty() {
        query.fields.push(BASIC_FIELDS.to_string());
    }
    let mut params = QueryParams::new();
    params.add_str("q", &query.q);
    params.add_str("name", &query.name);
    params.add_str("description", &query.description);
    params.add_epoch("min_last_modified_date", query.min_last_modified_date);
    params.add_epoch("max_last_modified_date", query.max_last_modified_date);
    params.add_epoch("min_last_activity_date", query.min_last_activity_date);
    params.add_epoch("max_last_activity_date", query.max_last_activity_date);
    params.add_str_list("origins", &query.origins);
    params.add_str_list("target_countries", &query.target_countries);
    params.add_str_list("target_industries", &query.target_industries);
    params.add_str_list("motivations", &query.motivations);
    params.add_str_list("fields", &query.fields);
    params.add_sort_fields("sort", &query.sort_fields);
    params.add_int("offset", query.offset);
    params.add_int("limit", query.limit);
    params
}

// ============================================================================
// Indicators
// ============================================================================

/// Query for the indicator search endpoint.
///
/// `parameter` selects the search route, `filter`/`value` form the match
/// condition. All three are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorQuery {
    /// Indicator attribute to search by (e.g. `domain`, `hash.md5`).
    pub parameter: String,
    /// Filter name applied to the attribute.
    pub filter: String,
    /// Filter value.
    pub value: String,
    /// Optional sort specification.
    pub sort: Option<SortField>,
    /// Result page, 1-based; defaults to 1 when zero.
    pub page: u32,
    /// Results per page; defaults to 10 when zero.
    #[serde(rename = "perPage")]
    pub per_page: u32,
}

/// Relation between an indicator and another observable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelatedIndicator {
    /// Related observable value.
    pub indicator: String,
    /// Related observable type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Creation date as epoch seconds.
    #[serde(rename = "created_date")]
    pub created_epoch: f64,
    /// Creation date derived from the epoch field.
    #[serde(skip)]
    pub created_date: DateTime<Utc>,
    /// Last date the relation was valid, as epoch seconds.
    #[serde(rename = "last_valid_date")]
    pub last_valid_epoch: f64,
    /// Last valid date derived from the epoch field.
    #[serde(skip)]
    pub last_valid_date: DateTime<Utc>,
}

impl RelatedIndicator {
    fn normalize_timestamps(&mut self) {
        self.created_date = epoch_to_utc(self.created_epoch);
        self.last_valid_date = epoch_to_utc(self.last_valid_epoch);
    }
}

/// Label attached to an indicator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorLabel {
    /// Label name.
    pub name: String,
    /// Label creation as epoch seconds.
    #[serde(rename = "created_on")]
    pub created_on_epoch: f64,
    /// Label creation derived from the epoch field.
    #[serde(skip)]
    pub created_on: DateTime<Utc>,
    /// Last date the label was valid, as epoch seconds.
    #[serde(rename = "last_valid_on")]
    pub last_valid_on_epoch: f64,
    /// Last valid date derived from the epoch field.
    #[serde(skip)]
    pub last_valid_on: DateTime<Utc>,
}

impl IndicatorLabel {
    fn normalize_timestamps(&mut self) {
        self.created_on = epoch_to_utc(self.created_on_epoch);
        self.last_valid_on = epoch_to_utc(self.last_valid_on_epoch);
    }
}

/// One indicator in a search reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Indicator {
    /// Observable value (hash, domain, IP).
    pub indicator: String,
    /// Observable type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Last update as epoch seconds.
    #[serde(rename = "last_updated")]
    pub last_updated_epoch: f64,
    /// Last update derived from the epoch field.
    #[serde(skip)]
    pub last_updated: DateTime<Utc>,
    /// Publication date as epoch seconds.
    #[serde(rename = "published_date")]
    pub published_epoch: f64,
    /// Publication date derived from the epoch field.
    #[serde(skip)]
    pub published_date: DateTime<Utc>,
    /// Confidence the indicator is malicious.
    pub malicious_confidence: String,
    /// Report ids mentioning the indicator.
    pub reports: Vec<String>,
    /// Actors associated with the indicator.
    pub actors: Vec<String>,
    /// Malware families associated with the indicator.
    pub malware_families: Vec<String>,
    /// Kill-chain phases.
    pub kill_chains: Vec<String>,
    /// Domain classification types.
    pub domain_types: Vec<String>,
    /// IP address classification types.
    pub ip_address_types: Vec<String>,
    /// Related observables.
    pub relations: Vec<RelatedIndicator>,
    /// Attached labels.
    pub labels: Vec<IndicatorLabel>,
}

impl Indicator {
    fn normalize_timestamps(&mut self) {
        self.last_updated = epoch_to_utc(self.last_updated_epoch);
        self.published_date = epoch_to_utc(self.published_epoch);
        for relation in &mut self.relations {
            relation.normalize_timestamps();
        }
        for label in &mut self.labels {
            label.normalize_timestamps();
        }
    }
}

fn indicator_params(query: &mut IndicatorQuery) -> QueryParams {
    let mut params = QueryParams::new();
    params.push(&query.filter, query.value.clone());
    if let Some(sort) = &query.sort {
        params.add_str("sort", &sort.name);
        params.add_str("order", if sort.ascending { "asc" } else { "desc" });
    }
    if query.page == 0 {
        query.page = 1;
    }
    if query.per_page == 0 {
        query.per_page = 10;
    }
    params.add_int("page", query.page);
    params.add_int("perPage", query.per_page);
    params
}

// ============================================================================
// API methods
// ============================================================================

impl IntelClient {
    /// Queries the actors endpoint.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn actors(&self, mut query: ActorQuery) -> Result<ActorsReply, Error> {
        let params = actor_params(&mut query);
        let mut reply: ActorsReply = self
            .transport
            .send(Method::GET, ACTORS_PATH, &params, None, Decode::new())
            .await?;
        for actor in &mut reply.resources {
            actor.normalize_timestamps();
        }
        Ok(reply)
    }

    /// Queries the actors endpoint and writes the unparsed JSON reply to
    /// `sink`.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn actors_raw<W: Write>(&self, mut query: ActorQuery, sink: &mut W) -> Result<(), Error> {
        let params = actor_params(&mut query);
        self.transport
            .send(Method::GET, ACTORS_PATH, &params, None, RawCopy(sink))
            .await
    }

    /// Searches the indicators endpoint.
    ///
    /// # Errors
    /// Returns [`Error::MissingParameters`] without issuing a request when
    /// `parameter`, `filter` or `value` is empty; otherwise any request
    /// failure.
    pub async fn indicators(&self, mut query: IndicatorQuery) -> Result<Vec<Indicator>, Error> {
        if query.parameter.is_empty() || query.filter.is_empty() || query.value.is_empty() {
            return Err(Error::MissingParameters);
        }
        let path = format!("indicator/v1/search/{}", query.parameter);
        let params = indicator_params(&mut query);
        let mut indicators: Vec<Indicator> = self
            .transport
            .send(Method::GET, &path, &params, None, Decode::new())
            .await?;
        for indicator in &mut indicators {
            indicator.normalize_timestamps();
        }
        Ok(indicators)
    }

    /// Searches the indicators endpoint and writes the unparsed JSON reply
    /// to `sink`.
    ///
    /// # Errors
    /// Returns [`Error::MissingParameters`] without issuing a request when
    /// `parameter`, `filter` or `value` is empty; otherwise any request
    /// failure.
    pub async fn indicators_raw<W: Write>(
        &self,
        mut query: IndicatorQuery,
        sink: &mut W,
    ) -> Result<(), Error> {
        if query.parameter.is_empty() || query.filter.is_empty() || query.value.is_empty() {
            return Err(Error::MissingParameters);
        }
        let path = format!("indicator/v1/search/{}", query.parameter);
        let params = indicator_params(&mut query);
        self.transport
            .send(Method::GET, &path, &params, None, RawCopy(sink))
            .await
    }
}
