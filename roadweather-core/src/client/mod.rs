use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::{
    error::{ApiError, TransportKind},
    json_path::value_at,
    model::{CameraRecord, Observation, StationRecord},
    path,
};

pub mod query;

pub use query::{Filter, Query};

pub const DEFAULT_ENDPOINT: &str = "https://api.trafikinfo.trafikverket.se/v2/data.json";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Name of the passive failure channel.
pub const API_ERROR_EVENT: &str = "api_error";

const ERROR_CHANNEL_CAPACITY: usize = 64;

/// Operations of the weather station API used by devices and pairing.
#[async_trait]
pub trait StationApi: Send + Sync + Debug {
    async fn search_stations_by_name(&self, prefix: &str) -> Result<Vec<StationRecord>, ApiError>;

    async fn search_stations_by_location(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: u32,
    ) -> Result<Vec<StationRecord>, ApiError>;

    async fn fetch_station_observation(&self, station_id: &str) -> Result<Observation, ApiError>;

    async fn fetch_station_cameras(&self, station_name: &str)
    -> Result<Vec<CameraRecord>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub endpoint: String,
    pub token: String,
    pub timeout: Duration,
}

impl ClientOptions {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// HTTP client for the Trafikinfo data endpoint.
///
/// Every failure is returned to the caller and also published on the
/// `api_error` channel, see [`TrafikinfoClient::subscribe_errors`].
#[derive(Debug, Clone)]
pub struct TrafikinfoClient {
    options: ClientOptions,
    http: Client,
    errors: broadcast::Sender<ApiError>,
}

impl TrafikinfoClient {
    pub fn new(options: ClientOptions) -> Self {
        let (errors, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);
        Self {
            options,
            http: Client::new(),
            errors,
        }
    }

    /// Receive every failure this client returns from now on.
    pub fn subscribe_errors(&self) -> broadcast::Receiver<ApiError> {
        self.errors.subscribe()
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Run `query` and decode the list of objects in the first result.
    async fn query_objects<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>, ApiError> {
        let envelope = self.post(query).await?;
        decode_objects(&envelope, query)
    }

    async fn observation(&self, station_id: &str) -> Result<Observation, ApiError> {
        let query = Query::station_observation(station_id);
        let measurepoint = self
            .query_objects::<Value>(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::StationNotFound {
                station_id: station_id.to_string(),
            })?;

        Observation::from_measurepoint(measurepoint).map_err(|e| ApiError::MalformedResponse {
            object_type: query.object_type.clone(),
            status: 200,
            body: e,
        })
    }

    /// Hand `result` back to the caller, publishing it first if it failed.
    fn published<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        result.inspect_err(|e| self.publish(e))
    }

    async fn post(&self, query: &Query) -> Result<Value, ApiError> {
        let body = query.to_request_xml(&self.options.token);
        debug!(object_type = %query.object_type, "Posting query to {}", self.options.endpoint);

        let res = self
            .http
            .post(&self.options.endpoint)
            .header(header::CONTENT_TYPE, "text/xml")
            .header(header::ACCEPT, "*/*")
            .timeout(self.options.timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| transport_error(&query.object_type, &e))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| transport_error(&query.object_type, &e))?;

        if !status.is_success() {
            return Err(ApiError::Api {
                object_type: query.object_type.clone(),
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|_| ApiError::MalformedResponse {
            object_type: query.object_type.clone(),
            status: status.as_u16(),
            body: text,
        })
    }

    fn publish(&self, error: &ApiError) {
        warn!(event = API_ERROR_EVENT, "{error}");
        // No subscribers is fine, the caller still gets the error.
        let _ = self.errors.send(error.clone());
    }
}

#[async_trait]
impl StationApi for TrafikinfoClient {
    async fn search_stations_by_name(&self, prefix: &str) -> Result<Vec<StationRecord>, ApiError> {
        let result = self.query_objects(&Query::stations_by_name(prefix)).await;
        self.published(result)
    }

    async fn search_stations_by_location(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: u32,
    ) -> Result<Vec<StationRecord>, ApiError> {
        let query = Query::stations_by_location(latitude, longitude, radius_meters);
        let result = self.query_objects(&query).await;
        self.published(result)
    }

    async fn fetch_station_observation(&self, station_id: &str) -> Result<Observation, ApiError> {
        let result = self.observation(station_id).await;
        self.published(result)
    }

    async fn fetch_station_cameras(
        &self,
        station_name: &str,
    ) -> Result<Vec<CameraRecord>, ApiError> {
        let result = self.query_objects(&Query::cameras_by_name(station_name)).await;
        self.published(result)
    }
}

/// Objects of `query.object_type` in `{RESPONSE: {RESULT: [{<type>: [...]}]}}`.
/// A result without the object list means no matches.
fn decode_objects<T: DeserializeOwned>(envelope: &Value, query: &Query) -> Result<Vec<T>, ApiError> {
    let Some(objects) = value_at(
        envelope,
        &path!["RESPONSE", "RESULT", 0, query.object_type.as_str()],
    ) else {
        debug!(object_type = %query.object_type, "Response contained no objects");
        return Ok(Vec::new());
    };

    serde_json::from_value(objects.clone()).map_err(|e| ApiError::MalformedResponse {
        object_type: query.object_type.clone(),
        status: 200,
        body: format!("{e}: {objects}"),
    })
}

fn transport_error(object_type: &str, error: &reqwest::Error) -> ApiError {
    let kind = if error.is_timeout() {
        TransportKind::Timeout
    } else if error.is_connect() {
        TransportKind::Connect
    } else {
        TransportKind::Other
    };

    ApiError::Transport {
        kind,
        object_type: object_type.to_string(),
        message: error.to_string(),
    }
}
