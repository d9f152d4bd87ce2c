//! HTTP client implementation

use std::fmt;

use reqwest::{header, Client, Method, StatusCode};
use satellite_api::models::{ErrorResponse, Paginated};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, error, trace};
use url::Url;

use crate::errors::LastPatchError;
use crate::http::tls::TlsOptions;

/// Default HTTPS port; omitted from the base URL
pub const DEFAULT_PORT: u16 = 443;

/// Satellite server address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl ServerAddress {
    /// Base URL every API path is joined onto
    pub fn base_url(&self) -> String {
        if self.port == DEFAULT_PORT {
            format!("https://{}/", self.host)
        } else {
            format!("https://{}:{}/", self.host, self.port)
        }
    }
}

/// HTTP basic credentials
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: SecretString,
}

impl Credentials {
    /// Parse a `user:password` string. The password is everything after the
    /// first colon and may itself contain colons.
    pub fn parse(raw: &str) -> Result<Self, LastPatchError> {
        let (user, password) = raw.split_once(':').ok_or_else(|| {
            LastPatchError::ConfigError("credentials must be given as user:password".to_string())
        })?;
        if user.is_empty() {
            return Err(LastPatchError::ConfigError(
                "credentials are missing the user name".to_string(),
            ));
        }
        Ok(Self {
            user: user.to_string(),
            password: SecretString::from(password.to_string()),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// HTTP client for the Satellite API
pub struct HttpClient {
    client: Client,
    base_url: Url,
    credentials: Credentials,
    per_page: u32,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(
        address: &ServerAddress,
        credentials: Credentials,
        tls: &TlsOptions,
        per_page: u32,
    ) -> Result<Self, LastPatchError> {
        let builder = Client::builder()
            .use_rustls_tls()
            .timeout(std::time::Duration::from_secs(30));
        let client = tls.apply(builder)?.build()?;

        let base_url = Url::parse(&address.base_url())
            .map_err(|e| LastPatchError::ConfigError(format!("Invalid server address: {e}")))?;

        debug!("API url: {}", base_url);

        Ok(Self {
            client,
            base_url,
            credentials,
            per_page: per_page.max(1),
        })
    }

    fn url(&self, path: &str) -> Result<Url, LastPatchError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| LastPatchError::ConfigError(format!("Invalid API path {path}: {e}")))
    }

    /// Issue a request and decode the JSON body.
    ///
    /// For GET the params object is sent as query-string pairs, for any other
    /// method as the JSON body.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: Option<&Value>,
    ) -> Result<Value, LastPatchError> {
        let url = self.url(path)?;
        debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .basic_auth(&self.credentials.user, Some(self.credentials.password.expose_secret()))
            .header(header::ACCEPT, "application/json");

        if let Some(params) = params {
            trace!("params: {}", params);
            if method == Method::GET {
                request = request.query(&query_pairs(params));
            } else {
                request = request
                    .header(header::CONTENT_TYPE, "application/json")
                    .json(params);
            }
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body);
            error!("HTTP {} {} failed: {} - {}", method, url, status, message);
            return Err(classify_status(status, &format!("{method} {url}: {message}")));
        }

        trace!("response body: {}", body);
        serde_json::from_str(&body).map_err(|e| {
            LastPatchError::ProtocolError(format!("{method} {url}: malformed JSON body: {e}"))
        })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<&Value>,
    ) -> Result<T, LastPatchError> {
        let body = self.request(Method::GET, path, params).await?;
        decode(path, body)
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, LastPatchError> {
        let body = serde_json::to_value(body)?;
        let response = self.request(Method::POST, path, Some(&body)).await?;
        decode(path, response)
    }

    /// Fetch one page of an index endpoint
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &Value,
        page: u32,
    ) -> Result<Paginated<T>, LastPatchError> {
        let mut params = params.clone();
        if let Value::Object(map) = &mut params {
            map.insert("page".to_string(), Value::from(page));
            map.entry("per_page").or_insert(Value::from(self.per_page));
        }
        self.get(path, Some(&params)).await
    }

    /// Fetch every page of an index endpoint
    pub async fn get_all_pages<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &Value,
    ) -> Result<Vec<T>, LastPatchError> {
        let mut results = Vec::new();
        let mut page = 1;

        loop {
            let batch: Paginated<T> = self.get_page(path, params, page).await?;
            let fetched = batch.results.len();
            results.extend(batch.results);

            let expected = batch.subtotal.or(batch.total).unwrap_or(0) as usize;
            debug!("{}: page {} gave {} results ({}/{})", path, page, fetched, results.len(), expected);

            if fetched == 0 || results.len() >= expected {
                return Ok(results);
            }
            page += 1;
        }
    }
}

/// Map a non-success HTTP status onto the error taxonomy
pub fn classify_status(status: StatusCode, message: &str) -> LastPatchError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LastPatchError::AuthError(format!("{status}: {message}"))
        }
        StatusCode::NOT_FOUND => LastPatchError::NotFound(format!("{status}: {message}")),
        s if s.is_server_error() => LastPatchError::TransientError(format!("{status}: {message}")),
        _ => LastPatchError::ProtocolError(format!("unexpected {status}: {message}")),
    }
}

fn decode<T: DeserializeOwned>(path: &str, body: Value) -> Result<T, LastPatchError> {
    serde_json::from_value(body)
        .map_err(|e| LastPatchError::ProtocolError(format!("{path}: unexpected payload: {e}")))
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.message())
        .unwrap_or_else(|| body.trim().to_string())
}

/// Flatten a JSON object into query-string pairs
fn query_pairs(params: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = params else {
        return Vec::new();
    };
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), v)
        })
        .collect()
}
