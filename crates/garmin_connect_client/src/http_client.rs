//! HTTP client implementation for Garmin Connect.
//!
//! This module provides a reqwest-based implementation of the [`GarminClient`](crate::GarminClient)
//! trait. A session is established through the SSO web sign-in flow; the
//! resulting cookies live in the client's cookie store and authenticate every
//! later request.

use crate::config::ClientConfig;
use crate::{ActivitySummary, Credentials, DownloadFormat, GarminClient, GarminError};
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::REFERER;
use secrecy::ExposeSecret;
use std::sync::LazyLock;

const USER_AGENT: &str = concat!("garmin_connect_client/", env!("CARGO_PKG_VERSION"));

static CSRF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"name="_csrf"\s+value="([^"]+)""#).expect("csrf regex is valid")
});
// The success page embeds the service URL in a script, often with `\/` escapes.
static TICKET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[?&]ticket=([^"&\s\\]+)"#).expect("ticket regex is valid")
});
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title>\s*(.*?)\s*</title>").expect("title regex is valid"));

/// Authenticated Garmin Connect session using reqwest.
#[derive(Clone, Debug)]
pub struct ReqwestGarminClient {
    connect_url: String,
    client: reqwest::Client,
}

impl ReqwestGarminClient {
    /// Sign in through Garmin SSO and return an authenticated session.
    ///
    /// Fails with [`GarminError::MfaRequired`] when the account asks for a
    /// second factor and with [`GarminError::Auth`] when the credentials are
    /// rejected. Nothing is retried.
    pub async fn login(
        config: &ClientConfig,
        credentials: &Credentials,
    ) -> Result<Self, GarminError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()?;

        let sso_url = config.sso_url.trim_end_matches('/');
        let connect_url = config.connect_url.trim_end_matches('/').to_string();
        let signin_url = format!("{sso_url}/sso/signin");
        let service_url = format!("{connect_url}/modern/");
        let params = signin_params(sso_url, &connect_url, &service_url);

        tracing::debug!("requesting SSO sign-in form");
        let resp = client.get(&signin_url).query(&params).send().await?;
        let html = text_or_error(resp).await?;
        let csrf = extract_csrf(&html).ok_or_else(|| {
            GarminError::Auth("sign-in page did not contain a CSRF token".into())
        })?;

        tracing::debug!(username = %credentials.username, "submitting SSO credentials");
        let form = [
            ("username", credentials.username.as_str()),
            ("password", credentials.password.expose_secret()),
            ("embed", "true"),
            ("_csrf", csrf.as_str()),
        ];
        let resp = client
            .post(&signin_url)
            .query(&params)
            .header(REFERER, signin_url.as_str())
            .form(&form)
            .send()
            .await?;
        let html = text_or_error(resp).await?;
        let ticket = parse_signin_result(&html)?;

        tracing::debug!("exchanging service ticket for a Connect session");
        let resp = client
            .get(&service_url)
            .query(&[("ticket", ticket.as_str())])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        tracing::info!("signed in to Garmin Connect");
        Ok(Self {
            connect_url,
            client,
        })
    }

    /// Build an authenticated GET request against the Connect proxy.
    fn get_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/proxy/{}",
            self.connect_url,
            endpoint.trim_start_matches('/')
        );
        self.client.get(url).header("NK", "NT")
    }
}

#[async_trait]
impl GarminClient for ReqwestGarminClient {
    async fn get_activities(
        &self,
        start: u32,
        limit: u32,
    ) -> Result<Vec<ActivitySummary>, GarminError> {
        let qp = [("start", start.to_string()), ("limit", limit.to_string())];
        let resp = self
            .get_request("activitylist-service/activities/search/activities")
            .query(&qp)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        // Read body as text first so a decoding failure can show what came back.
        let text = resp.text().await?;
        serde_json::from_str::<Vec<ActivitySummary>>(&text).map_err(|e| {
            let body_snippet: String = text.chars().take(512).collect();
            GarminError::Decode(format!("decoding activity list: {e} - body: {body_snippet}"))
        })
    }

    async fn download_activity(
        &self,
        activity_id: u64,
        format: DownloadFormat,
    ) -> Result<Vec<u8>, GarminError> {
        let resp = self
            .get_request(&format.endpoint(activity_id))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        let bytes = resp.bytes().await?;
        tracing::debug!(activity_id, ?format, size = bytes.len(), "downloaded activity");
        Ok(bytes.to_vec())
    }
}

fn signin_params(
    sso_url: &str,
    connect_url: &str,
    service_url: &str,
) -> Vec<(&'static str, String)> {
    vec![
        ("service", service_url.to_string()),
        ("webhost", connect_url.to_string()),
        ("source", format!("{sso_url}/sso/signin")),
        ("redirectAfterAccountLoginUrl", service_url.to_string()),
        ("redirectAfterAccountCreationUrl", service_url.to_string()),
        ("gauthHost", format!("{sso_url}/sso")),
        ("locale", "en_US".to_string()),
        ("id", "gauth-widget".to_string()),
        ("clientId", "GarminConnect".to_string()),
        ("embedWidget", "true".to_string()),
        ("generateExtraServiceTicket", "true".to_string()),
    ]
}

/// Return the body of a successful response or the mapped error.
async fn text_or_error(resp: reqwest::Response) -> Result<String, GarminError> {
    if !resp.status().is_success() {
        return Err(error_from_response(resp).await);
    }
    Ok(resp.text().await?)
}

/// Extract error information from a failed response.
async fn error_from_response(resp: reqwest::Response) -> GarminError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let body_snippet: String = body.chars().take(256).collect();
    GarminError::from_status(status, body_snippet)
}

fn extract_csrf(html: &str) -> Option<String> {
    CSRF_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn extract_title(html: &str) -> Option<String> {
    TITLE_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Interpret the page returned after posting the sign-in form.
fn parse_signin_result(html: &str) -> Result<String, GarminError> {
    if let Some(ticket) = TICKET_RE.captures(html).and_then(|c| c.get(1)) {
        return Ok(ticket.as_str().to_string());
    }
    let title = extract_title(html).unwrap_or_default();
    let lowered = title.to_lowercase();
    if lowered.contains("mfa") {
        return Err(GarminError::MfaRequired);
    }
    if lowered.contains("locked") {
        return Err(GarminError::Auth("account locked".into()));
    }
    Err(GarminError::Auth("invalid username or password".into()))
}
