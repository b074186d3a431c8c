//! Minimal `GarminClient` trait and a reqwest-based Garmin Connect session.

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

pub mod archive;
pub mod config;
pub mod http_client;

#[derive(Debug, Error)]
pub enum GarminError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("multi-factor authentication is required for this account")]
    MfaRequired,
    #[error("too many requests: {0}")]
    TooManyRequests(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unexpected status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("archive error: {0}")]
    Archive(String),
    #[error("downloaded archive does not contain a FIT file")]
    MissingFitPayload,
    #[error("configuration error: {0}")]
    Config(String),
}

impl GarminError {
    /// Map a non-success status code and a body snippet to an error.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => GarminError::Auth(body),
            404 => GarminError::NotFound(body),
            429 => GarminError::TooManyRequests(body),
            _ => GarminError::Api { status, body },
        }
    }

    /// True for failures caused by the account or the credentials rather than
    /// by the network.
    pub fn is_auth(&self) -> bool {
        matches!(self, GarminError::Auth(_) | GarminError::MfaRequired)
    }
}

/// Username and password handed to the SSO sign-in form.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ActivityType {
    #[serde(rename = "typeKey", default)]
    pub type_key: Option<String>,
}

/// One entry of the activity list endpoint. Only the fields the exporter
/// needs are decoded; everything else in the payload is ignored.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub activity_id: Option<u64>,
    #[serde(default)]
    pub activity_name: Option<String>,
    #[serde(default)]
    pub activity_type: Option<ActivityType>,
    #[serde(default)]
    pub start_time_local: Option<String>,
}

impl ActivitySummary {
    /// The activity type key (`running`, `cycling`, ...), if any.
    pub fn category(&self) -> Option<&str> {
        self.activity_type
            .as_ref()
            .and_then(|t| t.type_key.as_deref())
            .filter(|k| !k.is_empty())
    }
}

fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected unsigned id, got {n}"))),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected numeric id, got {s:?}"))),
        Some(other) => Err(D::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// Export formats offered by the download service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DownloadFormat {
    /// The file as uploaded by the device, wrapped in a ZIP archive.
    Original,
    Tcx,
    Gpx,
    Kml,
    Csv,
}

impl DownloadFormat {
    /// Path of the download endpoint relative to the Connect proxy.
    pub fn endpoint(self, activity_id: u64) -> String {
        match self {
            DownloadFormat::Original => {
                format!("download-service/files/activity/{activity_id}")
            }
            DownloadFormat::Tcx => format!("download-service/export/tcx/activity/{activity_id}"),
            DownloadFormat::Gpx => format!("download-service/export/gpx/activity/{activity_id}"),
            DownloadFormat::Kml => format!("download-service/export/kml/activity/{activity_id}"),
            DownloadFormat::Csv => format!("download-service/export/csv/activity/{activity_id}"),
        }
    }
}

#[async_trait]
pub trait GarminClient: Send + Sync + 'static {
    /// Fetch one page of the activity history, newest first.
    async fn get_activities(
        &self,
        start: u32,
        limit: u32,
    ) -> Result<Vec<ActivitySummary>, GarminError>;

    /// Download an activity in the given format, returning the raw response body.
    async fn download_activity(
        &self,
        activity_id: u64,
        format: DownloadFormat,
    ) -> Result<Vec<u8>, GarminError>;

    /// Download the original upload and unwrap the FIT payload.
    async fn download_activity_fit(&self, activity_id: u64) -> Result<Vec<u8>, GarminError> {
        let payload = self
            .download_activity(activity_id, DownloadFormat::Original)
            .await?;
        archive::extract_fit_bytes(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_activity_with_numeric_id() {
        let payload = json!({
            "activityId": 123,
            "activityName": "Morning Run",
            "activityType": {"typeId": 1, "typeKey": "running"},
            "distance": 5012.3
        });
        let a: ActivitySummary = serde_json::from_value(payload).expect("deserialize");
        assert_eq!(a.activity_id, Some(123));
        assert_eq!(a.category(), Some("running"));
    }

    #[test]
    fn deserialize_activity_id_from_string() {
        let payload = json!({"activityId": "987", "activityName": "x"});
        let a: ActivitySummary = serde_json::from_value(payload).expect("deserialize");
        assert_eq!(a.activity_id, Some(987));
    }

    #[test]
    fn deserialize_activity_id_invalid_type_errors() {
        let payload = json!({"activityId": {"nested": true}});
        let res: Result<ActivitySummary, _> = serde_json::from_value(payload);
        assert!(res.is_err());
    }

    #[test]
    fn missing_fields_default_to_none() {
        let a: ActivitySummary = serde_json::from_value(json!({})).expect("deserialize");
        assert_eq!(a.activity_id, None);
        assert_eq!(a.category(), None);
    }

    #[test]
    fn empty_type_key_has_no_category() {
        let payload = json!({"activityId": 1, "activityType": {"typeKey": ""}});
        let a: ActivitySummary = serde_json::from_value(payload).expect("deserialize");
        assert_eq!(a.category(), None);
    }

    #[test]
    fn from_status_maps_known_codes() {
        assert!(matches!(
            GarminError::from_status(401, "no".into()),
            GarminError::Auth(_)
        ));
        assert!(matches!(
            GarminError::from_status(404, "gone".into()),
            GarminError::NotFound(_)
        ));
        assert!(matches!(
            GarminError::from_status(429, "slow down".into()),
            GarminError::TooManyRequests(_)
        ));
        assert!(matches!(
            GarminError::from_status(500, "boom".into()),
            GarminError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn download_endpoints() {
        assert_eq!(
            DownloadFormat::Original.endpoint(42),
            "download-service/files/activity/42"
        );
        assert_eq!(
            DownloadFormat::Gpx.endpoint(42),
            "download-service/export/gpx/activity/42"
        );
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("alice", SecretString::new("hunter2".into()));
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("hunter2"));
    }
}
