// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signed HTTP client for the carrier REST API.
//!
//! Every request goes through [`CarrierApiClient::fetch_with_credentials`]:
//! form bodies get their content type forced, the provider's outbound
//! credentials sign the request, and the whole exchange runs under one
//! timeout. There are no retries.

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, LOCATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, error};

use switchboard_core::{CredentialProvider, SwitchboardError};

use crate::normalize::FORM_CONTENT_TYPE;
use crate::provider::ProviderConfig;
use crate::resources::{
    ApiErrorBody, AvailablePhoneNumber, AvailablePhoneNumberPage, CallResource,
    IncomingPhoneNumber, IncomingPhoneNumberPage, MessageResource,
};

/// Default guard around each outbound HTTP attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// One outbound carrier API call.
#[derive(Clone)]
pub struct CarrierRequest {
    method: Method,
    url: String,
    query: Vec<(String, String)>,
    form: Option<Vec<(String, String)>>,
}

impl CarrierRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            form: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self::new(Method::HEAD, url)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Appends a form field, turning the body into
    /// `application/x-www-form-urlencoded`.
    pub fn form_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.into()));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Full URL including query parameters.
    pub fn url(&self) -> Result<url::Url, SwitchboardError> {
        let mut url = url::Url::parse(&self.url)
            .map_err(|e| SwitchboardError::Config(format!("invalid carrier url `{}`: {e}", self.url)))?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }
}

// Form values can hold callback tokens, so only field names are printed.
impl fmt::Debug for CarrierRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Option<Vec<&str>> = self
            .form
            .as_ref()
            .map(|form| form.iter().map(|(k, _)| k.as_str()).collect());
        f.debug_struct("CarrierRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("form_fields", &fields)
            .finish()
    }
}

/// Status, headers and raw body of a completed carrier API call.
#[derive(Debug, Clone)]
pub struct CarrierResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl CarrierResponse {
    pub fn new(status: StatusCode, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Value of header `name`, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Parses the body as JSON. A `202 Accepted` always reads as `{}`,
    /// since carriers send no body for asynchronous accepts.
    pub fn json(&self) -> Result<Value, SwitchboardError> {
        if self.status == StatusCode::ACCEPTED {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_slice(&self.body).map_err(|e| SwitchboardError::Http {
            message: format!("invalid carrier response body: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// Normalized error for a non-success response, using the carrier's
    /// `code`/`message` document when the body has one.
    pub fn error(&self) -> SwitchboardError {
        let detail: ApiErrorBody = serde_json::from_slice(&self.body).unwrap_or_default();
        let message = detail
            .message
            .or_else(|| {
                let text = String::from_utf8_lossy(&self.body).trim().to_string();
                (!text.is_empty()).then_some(text)
            })
            .or_else(|| self.status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| "carrier request failed".to_string());
        SwitchboardError::Upstream {
            status: self.status.as_u16(),
            code: detail.code,
            message,
        }
    }
}

/// HTTP client shared by every provider; signing is per call.
///
/// Redirects are never followed; callers read `Location` themselves.
#[derive(Debug, Clone)]
pub struct CarrierApiClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl CarrierApiClient {
    pub fn new(timeout: Duration) -> Result<Self, SwitchboardError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("switchboard/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| SwitchboardError::Http {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { http, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Signs and sends `request`, returning the response whatever its status.
    ///
    /// Fails with [`SwitchboardError::Timeout`] when the exchange outlives
    /// the guard and [`SwitchboardError::Http`] on transport errors.
    pub async fn fetch_with_credentials(
        &self,
        credentials: &dyn CredentialProvider,
        request: CarrierRequest,
    ) -> Result<CarrierResponse, SwitchboardError> {
        let url = request.url()?;

        let mut headers = HeaderMap::new();
        let body = match &request.form {
            Some(fields) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
                Some(serde_urlencoded::to_string(fields).map_err(|e| {
                    SwitchboardError::Internal(format!("failed to encode form body: {e}"))
                })?)
            }
            None => None,
        };
        credentials.sign_request(url.as_str(), &mut headers).await;

        debug!(method = %request.method, path = url.path(), "carrier api request");

        let mut builder = self.http.request(request.method.clone(), url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let exchange = async {
            let response = builder.send().await.map_err(transport_error)?;
            let status = response.status();
            let headers = response.headers().clone();
            let bytes = response.bytes().await.map_err(transport_error)?;
            Ok::<_, SwitchboardError>(
                CarrierResponse::new(status, bytes.to_vec()).with_headers(headers),
            )
        };

        let response = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| SwitchboardError::Timeout {
                duration: self.timeout,
            })??;

        debug!(status = %response.status, "carrier api response");
        Ok(response)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        config: &ProviderConfig,
        request: CarrierRequest,
    ) -> Result<T, SwitchboardError> {
        let response = self
            .fetch_with_credentials(config.outbound_credentials.as_ref(), request)
            .await?;

        if !response.is_success() {
            let err = response.error();
            error!(
                provider = %config.provider,
                status = response.status.as_u16(),
                body = %String::from_utf8_lossy(response.body()),
                "carrier api error"
            );
            return Err(err);
        }

        serde_json::from_value(response.json()?).map_err(|e| SwitchboardError::Http {
            message: format!("unexpected carrier response: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// Sends one SMS. `application_sid` routes status callbacks.
    pub async fn send_message(
        &self,
        config: &ProviderConfig,
        account_sid: &str,
        message: OutboundMessage<'_>,
    ) -> Result<MessageResource, SwitchboardError> {
        let mut request = CarrierRequest::post(account_url(config, account_sid, "Messages.json"))
            .form_field("To", message.to)
            .form_field("From", message.from);
        if let Some(body) = message.body {
            request = request.form_field("Body", body);
        }
        if let Some(app) = message.application_sid {
            request = request.query("ApplicationSid", app);
        }
        self.call(config, request).await
    }

    pub async fn list_available_numbers(
        &self,
        config: &ProviderConfig,
        query: &[(&str, String)],
    ) -> Result<Vec<AvailablePhoneNumber>, SwitchboardError> {
        let mut request = CarrierRequest::get(account_url(
            config,
            &config.account_sid,
            "AvailablePhoneNumbers/US/Local.json",
        ));
        for (key, value) in query {
            request = request.query(*key, value.as_str());
        }
        let page: AvailablePhoneNumberPage = self.call(config, request).await?;
        Ok(page.available_phone_numbers)
    }

    pub async fn purchase_number(
        &self,
        config: &ProviderConfig,
        fields: &[(&str, String)],
    ) -> Result<IncomingPhoneNumber, SwitchboardError> {
        let request = with_form(
            CarrierRequest::post(account_url(config, &config.account_sid, "IncomingPhoneNumbers.json")),
            fields,
        );
        self.call(config, request).await
    }

    pub async fn list_incoming_numbers(
        &self,
        config: &ProviderConfig,
        phone_number: &str,
    ) -> Result<Vec<IncomingPhoneNumber>, SwitchboardError> {
        let request = CarrierRequest::get(account_url(
            config,
            &config.account_sid,
            "IncomingPhoneNumbers.json",
        ))
        .query("PhoneNumber", phone_number);
        let page: IncomingPhoneNumberPage = self.call(config, request).await?;
        Ok(page.incoming_phone_numbers)
    }

    pub async fn update_incoming_number(
        &self,
        config: &ProviderConfig,
        sid: &str,
        fields: &[(&str, String)],
    ) -> Result<IncomingPhoneNumber, SwitchboardError> {
        let request = with_form(
            CarrierRequest::post(account_url(
                config,
                &config.account_sid,
                &format!("IncomingPhoneNumbers/{sid}.json"),
            )),
            fields,
        );
        self.call(config, request).await
    }

    /// Resolves a recording resource to its media location.
    ///
    /// `relative_url` is appended to the provider's REST host and probed
    /// with a signed `HEAD`. The carrier answers with a redirect whose
    /// `Location` is the media URL; `None` when it sends none.
    pub async fn recording_location(
        &self,
        config: &ProviderConfig,
        relative_url: &str,
    ) -> Result<Option<String>, SwitchboardError> {
        let request = CarrierRequest::head(format!("{}{relative_url}", config.base_url));
        let response = self
            .fetch_with_credentials(config.outbound_credentials.as_ref(), request)
            .await?;

        if !(response.is_success() || response.status().is_redirection()) {
            error!(
                provider = %config.provider,
                status = response.status.as_u16(),
                "recording lookup failed"
            );
            return Err(response.error());
        }
        Ok(response.header(LOCATION.as_str()).map(str::to_string))
    }

    pub async fn place_call(
        &self,
        config: &ProviderConfig,
        fields: &[(&str, String)],
    ) -> Result<CallResource, SwitchboardError> {
        let request = with_form(
            CarrierRequest::post(account_url(config, &config.account_sid, "Calls.json")),
            fields,
        );
        self.call(config, request).await
    }
}

/// Form fields of an outbound SMS.
#[derive(Debug, Clone, Copy)]
pub struct OutboundMessage<'a> {
    pub to: &'a str,
    pub from: &'a str,
    pub body: Option<&'a str>,
    pub application_sid: Option<&'a str>,
}

fn account_url(config: &ProviderConfig, account_sid: &str, resource: &str) -> String {
    format!("{}/Accounts/{account_sid}/{resource}", config.service_url)
}

fn with_form(mut request: CarrierRequest, fields: &[(&str, String)]) -> CarrierRequest {
    for (key, value) in fields {
        request = request.form_field(*key, value.as_str());
    }
    request
}

fn transport_error(e: reqwest::Error) -> SwitchboardError {
    SwitchboardError::Http {
        message: format!("carrier request failed: {e}"),
        source: Some(Box::new(e)),
    }
}
