//! Statistics Canada Web Data Service (WDS) client.
//!
//! Two POST requests are made: `getCubeMetadata` to resolve member names to
//! ids, then `getDataFromCubePidCoordAndLatestNPeriods` for the observations
//! of one coordinate.

#[cfg(feature = "fetch")]
use std::time::Duration;

use serde::Deserialize;
#[cfg(feature = "fetch")]
use serde::Serialize;
#[cfg(feature = "fetch")]
use tracing::{debug, info};

#[cfg(feature = "fetch")]
use crate::core::parse_period;
use crate::data::{Language, TableRequest};
#[cfg(feature = "fetch")]
use crate::data::{TableRow, TableSource};
use crate::error::{ForecastError, Result};

/// Production WDS endpoint.
pub const DEFAULT_BASE_URL: &str = "https://www150.statcan.gc.ca/t1/wds/rest";

/// Number of positions in a WDS coordinate.
const COORDINATE_POSITIONS: usize = 10;

/// WDS product id of a table id: digits only, first eight kept.
///
/// `18-10-0004-01` becomes `18100004`.
pub fn product_id(table_id: &str) -> Result<u64> {
    let digits: String = table_id.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 8 {
        return Err(ForecastError::InvalidParameter(format!(
            "table id {table_id:?} needs at least eight digits"
        )));
    }
    digits[..8]
        .parse()
        .map_err(|_| ForecastError::InvalidParameter(format!("invalid table id {table_id:?}")))
}

#[derive(Debug, Clone, Deserialize)]
struct Envelope<T> {
    status: String,
    object: Option<T>,
}

/// The part of `getCubeMetadata` needed to build a coordinate.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CubeMetadata {
    #[serde(default)]
    pub cube_title_en: Option<String>,
    #[serde(default)]
    pub cube_title_fr: Option<String>,
    pub dimension: Vec<Dimension>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub dimension_position_id: usize,
    pub dimension_name_en: String,
    pub dimension_name_fr: String,
    pub member: Vec<Member>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub member_id: u64,
    pub member_name_en: String,
    pub member_name_fr: String,
}

impl Member {
    fn name(&self, language: Language) -> &str {
        match language {
            Language::En => &self.member_name_en,
            Language::Fr => &self.member_name_fr,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesData {
    vector_data_point: Vec<DataPoint>,
}

/// One observation of a WDS vector.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    pub ref_per: String,
    pub value: Option<f64>,
}

fn unwrap_envelope<T>(mut envelopes: Vec<Envelope<T>>, what: &str) -> Result<T> {
    if envelopes.is_empty() {
        return Err(ForecastError::Parse(format!("empty {what} response")));
    }
    let first = envelopes.swap_remove(0);
    if first.status != "SUCCESS" {
        return Err(ForecastError::Network(format!(
            "{what} returned status {}",
            first.status
        )));
    }
    first
        .object
        .ok_or_else(|| ForecastError::Parse(format!("{what} response has no object")))
}

fn parse_metadata(body: &str) -> Result<CubeMetadata> {
    let envelopes: Vec<Envelope<CubeMetadata>> = serde_json::from_str(body)?;
    unwrap_envelope(envelopes, "getCubeMetadata")
}

fn parse_data_points(body: &str) -> Result<Vec<DataPoint>> {
    let envelopes: Vec<Envelope<SeriesData>> = serde_json::from_str(body)?;
    Ok(unwrap_envelope(envelopes, "getDataFromCubePidCoordAndLatestNPeriods")?.vector_data_point)
}

fn find_member<'a>(dimension: &'a Dimension, name: &str, language: Language) -> Option<&'a Member> {
    let wanted = name.trim().to_lowercase();
    dimension
        .member
        .iter()
        .find(|m| m.name(language).trim().to_lowercase() == wanted)
}

/// Build the 10-position coordinate selecting the requested geography and category.
///
/// The geography is looked up in the first dimension and the category in the
/// remaining ones. Other dimensions take their first member.
pub fn resolve_coordinate(metadata: &CubeMetadata, request: &TableRequest) -> Result<String> {
    let mut dimensions: Vec<&Dimension> = metadata.dimension.iter().collect();
    dimensions.sort_by_key(|d| d.dimension_position_id);
    if dimensions.is_empty() || dimensions.len() > COORDINATE_POSITIONS {
        return Err(ForecastError::Parse(format!(
            "table {} has {} dimensions",
            request.table_id,
            dimensions.len()
        )));
    }

    let mut ids = [0u64; COORDINATE_POSITIONS];
    let geography = find_member(dimensions[0], &request.geography, request.language).ok_or_else(
        || ForecastError::CategoryNotFound {
            table: request.table_id.clone(),
            dimension: "geography".to_string(),
            name: request.geography.clone(),
        },
    )?;
    ids[0] = geography.member_id;

    let mut category_found = false;
    for (pos, dimension) in dimensions.iter().enumerate().skip(1) {
        let chosen = if category_found {
            None
        } else {
            find_member(dimension, &request.category, request.language)
        };
        match chosen {
            Some(member) => {
                ids[pos] = member.member_id;
                category_found = true;
            }
            None => ids[pos] = dimension.member.first().map_or(0, |m| m.member_id),
        }
    }
    if !category_found {
        return Err(ForecastError::CategoryNotFound {
            table: request.table_id.clone(),
            dimension: "category".to_string(),
            name: request.category.clone(),
        });
    }

    Ok(ids
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join("."))
}

#[cfg(feature = "fetch")]
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetadataQuery {
    product_id: u64,
}

#[cfg(feature = "fetch")]
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DataQuery<'a> {
    product_id: u64,
    coordinate: &'a str,
    #[serde(rename = "latestN")]
    latest_n: usize,
}

/// Blocking WDS client.
#[cfg(feature = "fetch")]
#[derive(Debug, Clone)]
pub struct StatCanClient {
    base_url: String,
    timeout: Duration,
    latest_n: usize,
    user_agent: String,
}

#[cfg(feature = "fetch")]
impl Default for StatCanClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "fetch")]
impl StatCanClient {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            latest_n: 2000,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of most recent periods requested.
    pub fn with_latest_n(mut self, latest_n: usize) -> Self {
        self.latest_n = latest_n;
        self
    }

    fn client(&self) -> Result<reqwest::blocking::Client> {
        Ok(reqwest::blocking::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.timeout)
            .build()?)
    }

    fn post<B: Serialize + ?Sized>(
        &self,
        client: &reqwest::blocking::Client,
        method: &str,
        body: &B,
    ) -> Result<String> {
        let url = format!("{}/{}", self.base_url, method);
        debug!(%url, "POST");
        let response = client.post(&url).json(body).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ForecastError::Network(format!("{method} returned HTTP {status}")));
        }
        Ok(response.text()?)
    }

    /// Fetch and parse the table metadata.
    pub fn metadata(&self, table_id: &str) -> Result<CubeMetadata> {
        let client = self.client()?;
        let body = self.post(
            &client,
            "getCubeMetadata",
            &[MetadataQuery {
                product_id: product_id(table_id)?,
            }],
        )?;
        parse_metadata(&body)
    }
}

#[cfg(feature = "fetch")]
impl TableSource for StatCanClient {
    fn describe(&self) -> String {
        format!("Statistics Canada WDS ({})", self.base_url)
    }

    fn fetch(&self, request: &TableRequest) -> Result<Vec<TableRow>> {
        let pid = product_id(&request.table_id)?;
        let client = self.client()?;

        let body = self.post(&client, "getCubeMetadata", &[MetadataQuery { product_id: pid }])?;
        let metadata = parse_metadata(&body)?;
        let coordinate = resolve_coordinate(&metadata, request)?;
        info!(product_id = pid, %coordinate, "resolved coordinate");

        let body = self.post(
            &client,
            "getDataFromCubePidCoordAndLatestNPeriods",
            &[DataQuery {
                product_id: pid,
                coordinate: &coordinate,
                latest_n: self.latest_n,
            }],
        )?;
        parse_data_points(&body)?
            .into_iter()
            .map(|point| {
                Ok(TableRow {
                    ref_date: parse_period(&point.ref_per)?,
                    geography: request.geography.clone(),
                    category: request.category.clone(),
                    value: point.value,
                })
            })
            .collect()
    }
}
