use std::fmt;

use chrono::{DateTime, Utc};
use reqwest::{Method, Url};

use crate::error::ReportError;

pub const DEFAULT_LIMIT: u32 = 10;

/// One HTTP exchange as handed to a [`Transport`].
///
/// [`Transport`]: crate::client::Transport
#[derive(Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    /// Value of the `Authorization` header.
    pub authorization: String,
    /// Sent as `application/x-www-form-urlencoded` when non-empty.
    pub form: Vec<(String, String)>,
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("authorization", &redacted(&self.authorization))
            .field("form", &self.form)
            .finish()
    }
}

/// Client-credentials token request: `POST` with Basic auth and
/// `grant_type=client_credentials`.
///
/// # Errors
/// [`ReportError::Configuration`] if the URL does not parse or the credential
/// is blank.
pub fn token_request(token_url: &str, credential: &str) -> Result<HttpRequest, ReportError> {
    let credential = required(Some(credential.to_string()), "API credential")?;
    let url = Url::parse(token_url)
        .map_err(|e| ReportError::Configuration(format!("invalid token URL '{token_url}': {e}")))?;
    Ok(HttpRequest {
        method: Method::POST,
        url,
        authorization: format!("Basic {credential}"),
        form: vec![("grant_type".to_string(), "client_credentials".to_string())],
    })
}

/// A fully-resolved deployment-status request.
#[derive(Clone)]
pub struct ReportRequest {
    pub url: Url,
    /// Value of the `Authorization` header, `Basic ...` or `Bearer ...`.
    pub authorization: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ReportRequest {
    pub fn to_http(&self) -> HttpRequest {
        HttpRequest {
            method: Method::GET,
            url: self.url.clone(),
            authorization: self.authorization.clone(),
            form: Vec::new(),
        }
    }
}

impl fmt::Debug for ReportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportRequest")
            .field("url", &self.url.as_str())
            .field("authorization", &redacted(&self.authorization))
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

fn redacted(authorization: &str) -> String {
    match authorization.split_once(' ') {
        Some((scheme, _)) => format!("{scheme} <redacted>"),
        None => "<redacted>".to_string(),
    }
}

#[derive(Debug, Clone)]
enum Auth {
    Basic(String),
    Bearer(String),
}

#[derive(Debug, Clone)]
pub struct ReportRequestBuilder {
    base_url: String,
    org_id: Option<String>,
    auth: Option<Auth>,
    range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    limit: u32,
}

impl ReportRequestBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        ReportRequestBuilder {
            base_url: base_url.into(),
            org_id: None,
            auth: None,
            range: None,
            limit: DEFAULT_LIMIT,
        }
    }

    #[must_use]
    pub fn organization(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    /// Pre-encoded Base64 `key:secret`, sent as Basic auth.
    #[must_use]
    pub fn credential(mut self, credential: impl Into<String>) -> Self {
        self.auth = Some(Auth::Basic(credential.into()));
        self
    }

    /// Access token from the token endpoint, sent as Bearer auth. Replaces
    /// any credential set earlier.
    #[must_use]
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(Auth::Bearer(token.into()));
        self
    }

    #[must_use]
    pub fn range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.range = Some((from, to));
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Builds `<base>/organizations/<org>/deployment-status?from=..&to=..&limit=..&offset=0`
    /// with epoch-millisecond bounds.
    ///
    /// # Errors
    /// [`ReportError::Configuration`] if the org ID, credential, or range is
    /// missing, or the base URL does not parse.
    pub fn build(self) -> Result<ReportRequest, ReportError> {
        let org_id = required(self.org_id, "organization ID")?;
        let authorization = match self.auth {
            Some(Auth::Basic(c)) => format!("Basic {}", required(Some(c), "API credential")?),
            Some(Auth::Bearer(t)) => format!("Bearer {}", required(Some(t), "access token")?),
            None => return Err(ReportError::Configuration("API credential is missing".to_string())),
        };
        let (from, to) = self
            .range
            .ok_or_else(|| ReportError::Configuration("time range is not set".to_string()))?;

        let base = self.base_url.trim_end_matches('/');
        let endpoint = format!("{base}/organizations/{org_id}/deployment-status");
        let url = Url::parse_with_params(
            &endpoint,
            &[
                ("from", from.timestamp_millis().to_string()),
                ("to", to.timestamp_millis().to_string()),
                ("limit", self.limit.to_string()),
                ("offset", "0".to_string()),
            ],
        )
        .map_err(|e| ReportError::Configuration(format!("invalid report URL '{endpoint}': {e}")))?;

        Ok(ReportRequest {
            url,
            authorization,
            from,
            to,
        })
    }
}

fn required(value: Option<String>, what: &str) -> Result<String, ReportError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ReportError::Configuration(format!("{what} is missing")))
}
