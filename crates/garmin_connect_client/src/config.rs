use crate::GarminError;

pub const DEFAULT_SSO_URL: &str = "https://sso.garmin.com";
pub const DEFAULT_CONNECT_URL: &str = "https://connect.garmin.com";

/// Endpoints of the Garmin services. Overridable so tests and proxies can
/// point the client elsewhere.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub sso_url: String,
    pub connect_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            sso_url: DEFAULT_SSO_URL.into(),
            connect_url: DEFAULT_CONNECT_URL.into(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, GarminError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, GarminError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let sso_url = get("GARMIN_SSO_URL").unwrap_or_else(|| DEFAULT_SSO_URL.into());
        let connect_url = get("GARMIN_CONNECT_URL").unwrap_or_else(|| DEFAULT_CONNECT_URL.into());
        Ok(Self {
            sso_url: validate_url("GARMIN_SSO_URL", sso_url)?,
            connect_url: validate_url("GARMIN_CONNECT_URL", connect_url)?,
        })
    }
}

fn validate_url(key: &str, value: String) -> Result<String, GarminError> {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(GarminError::Config(format!(
            "{key} must be an http(s) URL, got {value:?}"
        )))
    }
}
