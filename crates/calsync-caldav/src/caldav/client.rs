//! HTTP client for CalDAV requests.
//!
//! Wraps `reqwest` with preemptive Basic auth, WebDAV headers and status
//! mapping. Each method is a single request; nothing is retried.

use reqwest::header::{CONTENT_TYPE, ETAG, HeaderMap, IF_MATCH, IF_NONE_MATCH};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::{trace, warn};

use crate::error::{CalDavError, CalDavErrorCode, CalDavResult};
use crate::store::{EventResource, WriteCondition};

use super::auth::basic_auth;
use super::config::CalDavConfig;

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
const ICS_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

/// HTTP client bound to one server configuration.
pub struct CalDavClient {
    client: Client,
    config: CalDavConfig,
    authorization: Option<String>,
}

impl CalDavClient {
    pub fn new(config: CalDavConfig) -> CalDavResult<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| CalDavError::from_reqwest("failed to create HTTP client", e))?;

        let authorization = config
            .credentials()
            .map(|(username, password)| basic_auth(username, password));

        Ok(Self {
            client,
            config,
            authorization,
        })
    }

    pub fn config(&self) -> &CalDavConfig {
        &self.config
    }

    /// `PROPFIND` with the given depth; returns the multi-status body.
    pub async fn propfind(&self, url: &str, body: &str, depth: u8) -> CalDavResult<String> {
        let request = self
            .request("PROPFIND", url)?
            .header("Depth", depth.to_string())
            .header(CONTENT_TYPE, XML_CONTENT_TYPE)
            .body(body.to_string());
        let response = self.send("PROPFIND", url, request).await?;
        read_body(check_status(response, &[StatusCode::MULTI_STATUS, StatusCode::OK]).await?).await
    }

    /// `REPORT` at depth 1; returns the multi-status body.
    pub async fn report(&self, url: &str, body: &str) -> CalDavResult<String> {
        let request = self
            .request("REPORT", url)?
            .header("Depth", "1")
            .header(CONTENT_TYPE, XML_CONTENT_TYPE)
            .body(body.to_string());
        let response = self.send("REPORT", url, request).await?;
        read_body(check_status(response, &[StatusCode::MULTI_STATUS, StatusCode::OK]).await?).await
    }

    /// `GET` a resource together with its entity tag.
    pub async fn get(&self, url: &str) -> CalDavResult<EventResource> {
        let request = self.request("GET", url)?;
        let response = self.send("GET", url, request).await?;
        let response = check_status(response, &[StatusCode::OK]).await?;
        let etag = etag_of(response.headers());
        let ics = read_body(response).await?;
        Ok(EventResource { ics, etag })
    }

    /// `PUT` calendar data under `condition`; returns the new entity tag if any.
    pub async fn put(
        &self,
        url: &str,
        body: String,
        condition: &WriteCondition,
    ) -> CalDavResult<Option<String>> {
        let mut request = self
            .request("PUT", url)?
            .header(CONTENT_TYPE, ICS_CONTENT_TYPE)
            .body(body);
        request = match condition {
            WriteCondition::CreateOnly => request.header(IF_NONE_MATCH, "*"),
            WriteCondition::IfMatch(etag) => request.header(IF_MATCH, etag.as_str()),
            WriteCondition::Unconditional => request,
        };

        let response = self.send("PUT", url, request).await?;
        let response = check_status(
            response,
            &[StatusCode::CREATED, StatusCode::NO_CONTENT, StatusCode::OK],
        )
        .await?;
        Ok(etag_of(response.headers()))
    }

    /// `DELETE` a resource.
    pub async fn delete(&self, url: &str) -> CalDavResult<()> {
        let request = self.request("DELETE", url)?;
        let response = self.send("DELETE", url, request).await?;
        check_status(response, &[StatusCode::OK, StatusCode::NO_CONTENT]).await?;
        Ok(())
    }

    fn request(&self, method: &str, url: &str) -> CalDavResult<RequestBuilder> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| CalDavError::configuration(format!("invalid HTTP method: {}", method)))?;
        let mut request = self.client.request(method, url);
        if let Some(ref authorization) = self.authorization {
            request = request.header("Authorization", authorization.as_str());
        }
        Ok(request)
    }

    async fn send(&self, method: &str, url: &str, request: RequestBuilder) -> CalDavResult<Response> {
        trace!(method = %method, url = %url, "Sending request");
        request
            .send()
            .await
            .map_err(|e| CalDavError::from_reqwest(&format!("{} {} failed", method, url), e))
    }
}

/// Passes the response through if its status is one of `expected`.
async fn check_status(response: Response, expected: &[StatusCode]) -> CalDavResult<Response> {
    let status = response.status();
    trace!(status = %status, "Received response");
    if expected.contains(&status) {
        return Ok(response);
    }

    let code = status_code(status);
    let body = response.text().await.unwrap_or_default();
    if code == CalDavErrorCode::InvalidResponse {
        warn!(status = %status, body = %body, "Unexpected response status");
    }
    Err(CalDavError::new(code, format!("HTTP {}", status)))
}

fn status_code(status: StatusCode) -> CalDavErrorCode {
    match status {
        StatusCode::UNAUTHORIZED => CalDavErrorCode::AuthenticationFailed,
        StatusCode::FORBIDDEN => CalDavErrorCode::AuthorizationFailed,
        StatusCode::NOT_FOUND => CalDavErrorCode::NotFound,
        StatusCode::PRECONDITION_FAILED => CalDavErrorCode::PreconditionFailed,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => CalDavErrorCode::Timeout,
        s if s.is_server_error() => CalDavErrorCode::ServerError,
        _ => CalDavErrorCode::InvalidResponse,
    }
}

async fn read_body(response: Response) -> CalDavResult<String> {
    response
        .text()
        .await
        .map_err(|e| CalDavError::from_reqwest("failed to read response body", e))
}

fn etag_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
