//! Authenticated API client.
//!
//! Every request goes through [`ApiClient::execute`], which attaches the stored bearer token and
//! handles 401 and 403 answers:
//!
//! - 401 on a first attempt: one refresh through `/auth/refresh`, then one retry with the new
//!   token. No refresh token, or a failed refresh, clears the session and yields
//!   [`Error::SessionExpired`].
//! - 401 on the retry: [`Error::Unauthorized`], no second refresh.
//! - 403: [`Error::Forbidden`], session untouched.
//!
//! Concurrent requests that hit 401 each run their own refresh; nothing coordinates them.

use super::transport::{ApiRequest, ApiResponse, Method, Transport};
use crate::{
    entities::auth::{RefreshRequest, TokenPair},
    errors::{Error, Result},
    session::SessionContext,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, error, info, warn};

/// Path of the token refresh endpoint.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Error body the service sends with 4xx answers.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Extracts `message` (or `error`) from an error body, if the body is JSON.
fn server_message(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
}

/// Client bound to one transport and one session.
#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    transport: T,
    session: SessionContext,
}

impl<T: Transport> ApiClient<T> {
    /// Creates the client.
    pub const fn new(transport: T, session: SessionContext) -> Self {
        Self { transport, session }
    }

    /// Session this client reads tokens from.
    pub const fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends an authenticated request with the 401/403 handling described above.
    pub async fn execute(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        request.bearer = self.session.token()?;
        if request.bearer.is_none() {
            debug!(path = %request.path, "No token stored, sending unauthenticated");
        }

        let response = self.transport.send(&request).await?;
        if response.status != 401 {
            return check_status(response);
        }

        warn!(path = %request.path, "401 received, attempting token refresh");
        let Some(token) = self.refresh().await? else {
            self.session.clear()?;
            return Err(Error::SessionExpired);
        };

        request.bearer = Some(token);
        let retried = self.transport.send(&request).await?;
        if retried.status == 401 {
            warn!(path = %request.path, "401 again after refresh, giving up");
            return Err(Error::Unauthorized);
        }
        check_status(retried)
    }

    /// Sends a request to a public endpoint: no bearer, no refresh handling.
    pub async fn execute_public(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        request.bearer = None;
        let response = self.transport.send(&request).await?;
        check_status(response)
    }

    /// One refresh attempt. `Ok(None)` means the session cannot be refreshed.
    async fn refresh(&self) -> Result<Option<String>> {
        let Some(refresh_token) = self.session.refresh_token()? else {
            info!("No refresh token stored");
            return Ok(None);
        };

        let body = serde_json::to_value(RefreshRequest { refresh_token })?;
        let request = ApiRequest::new(Method::Post, REFRESH_PATH).with_body(body);
        let pair = match self.transport.send(&request).await {
            Ok(response) if response.is_success() => {
                serde_json::from_slice::<TokenPair>(&response.body)
            }
            Ok(response) => {
                error!("Token refresh failed with status {}", response.status);
                return Ok(None);
            }
            Err(e) => {
                error!("Token refresh failed: {e}");
                return Ok(None);
            }
        };

        match pair {
            Ok(pair) => {
                self.session
                    .replace_tokens(pair.token.clone(), pair.refresh_token)?;
                Ok(Some(pair.token))
            }
            Err(e) => {
                error!("Token refresh answer unreadable: {e}");
                Ok(None)
            }
        }
    }

    /// `GET` and decode JSON.
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let response = self.execute(ApiRequest::new(Method::Get, path)).await?;
        decode(&response)
    }

    /// `POST` a JSON body, ignoring the answer body.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let request = ApiRequest::new(Method::Post, path).with_body(serde_json::to_value(body)?);
        self.execute(request).await.map(drop)
    }

    /// `POST` without a body.
    pub async fn post_empty(&self, path: &str) -> Result<()> {
        self.execute(ApiRequest::new(Method::Post, path))
            .await
            .map(drop)
    }

    /// `PUT` a JSON body, ignoring the answer body.
    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let request = ApiRequest::new(Method::Put, path).with_body(serde_json::to_value(body)?);
        self.execute(request).await.map(drop)
    }

    /// `DELETE`, ignoring the answer body.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(ApiRequest::new(Method::Delete, path))
            .await
            .map(drop)
    }

    /// Unauthenticated `POST` to an `/auth/*` endpoint, decoding the answer.
    pub async fn post_public<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = ApiRequest::new(Method::Post, path).with_body(serde_json::to_value(body)?);
        let response = self.execute_public(request).await?;
        decode(&response)
    }
}

fn check_status(response: ApiResponse) -> Result<ApiResponse> {
    match response.status {
        _ if response.is_success() => Ok(response),
        403 => {
            warn!("Access forbidden - insufficient permissions");
            Err(Error::Forbidden {
                message: server_message(&response.body),
            })
        }
        status => Err(Error::Api {
            status,
            message: server_message(&response.body),
        }),
    }
}

fn decode<R: DeserializeOwned>(response: &ApiResponse) -> Result<R> {
    // Empty 2xx bodies decode as JSON null so `Option`/defaulted types still work.
    let body: &[u8] = if response.body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &response.body
    };
    Ok(serde_json::from_slice(body)?)
}
