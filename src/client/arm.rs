//! Azure Resource Manager implementation of [`EventHubsClient`].
//!
//! Speaks the Event Hubs management REST API directly over HTTPS:
//!
//! - OAuth2 client-credentials token acquisition against Microsoft Entra,
//!   with in-process caching and refresh shortly before expiry
//! - Namespace and event hub CRUD on `Microsoft.EventHub` resources
//! - ARM error bodies decoded into [`ClientError::Cloud`]; HTTP 404 mapped
//!   to [`ClientError::NotFound`]
//! - Long-running deletes followed via the `Location` header with a bounded
//!   number of polls
//!
//! The management endpoint and login authority are overridable through the
//! builder, which also serves sovereign clouds and the test suite.

use reqwest::{header, Client as HttpClient, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

use super::models::{
    normalize_location, EventHubParams, EventHubState, NamespaceParams, NamespaceState,
};
use super::{ClientError, ClientResult, EventHubsClient};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

const DEFAULT_ENDPOINT: &str = "https://management.azure.com/";
const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/";
const API_VERSION: &str = "2021-11-01";

/// Polling budget for long-running operations.
const LRO_POLL_ATTEMPTS: u32 = 60;
const LRO_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Refresh tokens this long before they actually expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Service-principal credentials for the management plane.
#[derive(Debug, Clone)]
pub struct ArmCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub subscription_id: String,
}

/// Builder for [`ArmClient`].
pub struct ArmClientBuilder {
    credentials: ArmCredentials,
    endpoint: String,
    authority: String,
    lro_poll_interval: Duration,
    http: Option<HttpClient>,
}

impl ArmClientBuilder {
    fn new(credentials: ArmCredentials) -> Self {
        Self {
            credentials,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            authority: DEFAULT_AUTHORITY.to_string(),
            lro_poll_interval: LRO_POLL_INTERVAL,
            http: None,
        }
    }

    /// Management endpoint base URL (sovereign clouds, test servers).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Login authority base URL.
    pub fn authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    /// Fallback delay between long-running-operation polls when the provider
    /// sends no `Retry-After` header.
    pub fn lro_poll_interval(mut self, interval: Duration) -> Self {
        self.lro_poll_interval = interval;
        self
    }

    /// Custom HTTP client (proxies, timeouts).
    pub fn http_client(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> ClientResult<ArmClient> {
        Ok(ArmClient {
            endpoint: parse_url(&self.endpoint)?,
            authority: parse_url(&self.authority)?,
            lro_poll_interval: self.lro_poll_interval,
            http: self.http.unwrap_or_default(),
            credentials: self.credentials,
            token: Mutex::new(None),
        })
    }
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Event Hubs management client backed by the ARM REST API.
pub struct ArmClient {
    http: HttpClient,
    credentials: ArmCredentials,
    endpoint: Url,
    authority: Url,
    lro_poll_interval: Duration,
    token: Mutex<Option<CachedToken>>,
}

impl ArmClient {
    /// Client with default public-cloud endpoints.
    pub fn new(credentials: ArmCredentials) -> ClientResult<Self> {
        Self::builder(credentials).build()
    }

    pub fn builder(credentials: ArmCredentials) -> ArmClientBuilder {
        ArmClientBuilder::new(credentials)
    }

    /// Returns a bearer token, refreshing the cached one when close to expiry.
    async fn token(&self) -> ClientResult<String> {
        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Instant::now() + TOKEN_EXPIRY_MARGIN {
                return Ok(cached.value.clone());
            }
        }

        let token_url = join_url(
            &self.authority,
            &format!("{}/oauth2/v2.0/token", self.credentials.tenant_id),
        )?;
        let scope = format!("{}.default", self.endpoint);
        tracing::debug!(url = %token_url, "requesting management-plane token");

        let response = self
            .http
            .post(token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("scope", scope.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Auth(format!(
                "token request failed with status {}: {}",
                status, body
            )));
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: u64,
        }

        let token: TokenResponse = response.json().await?;
        let value = token.access_token.clone();
        *guard = Some(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(value)
    }

    fn namespace_url(&self, resource_group: &str, namespace: &str) -> ClientResult<Url> {
        join_url(
            &self.endpoint,
            &format!(
                "subscriptions/{}/resourceGroups/{}/providers/Microsoft.EventHub/namespaces/{}?api-version={}",
                self.credentials.subscription_id, resource_group, namespace, API_VERSION
            ),
        )
    }

    fn event_hub_url(
        &self,
        resource_group: &str,
        namespace: &str,
        name: &str,
    ) -> ClientResult<Url> {
        join_url(
            &self.endpoint,
            &format!(
                "subscriptions/{}/resourceGroups/{}/providers/Microsoft.EventHub/namespaces/{}/eventhubs/{}?api-version={}",
                self.credentials.subscription_id, resource_group, namespace, name, API_VERSION
            ),
        )
    }

    /// Follows a 202-accepted delete until the operation finishes.
    ///
    /// Polls the `Location` header URL, honoring `Retry-After` when present,
    /// for at most [`LRO_POLL_ATTEMPTS`] rounds.
    async fn await_operation(&self, response: Response) -> ClientResult<()> {
        if response.status() != StatusCode::ACCEPTED {
            return Ok(());
        }

        let Some(poll_url) = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
        else {
            // Accepted without a pollable location; nothing more to follow.
            return Ok(());
        };
        let poll_url = parse_url(&poll_url)?;
        let mut interval = retry_after(&response).unwrap_or(self.lro_poll_interval);

        for attempt in 0..LRO_POLL_ATTEMPTS {
            tokio::time::sleep(interval).await;
            tracing::debug!(url = %poll_url, attempt, "polling long-running operation");

            let token = self.token().await?;
            let response = self
                .http
                .get(poll_url.clone())
                .bearer_auth(token)
                .send()
                .await?;

            match response.status() {
                StatusCode::ACCEPTED => {
                    interval = retry_after(&response).unwrap_or(self.lro_poll_interval);
                }
                // The target is gone once polling reports success or absence.
                StatusCode::NOT_FOUND => return Ok(()),
                status if status.is_success() => return Ok(()),
                _ => return Err(decode_cloud_error(response).await),
            }
        }

        Err(ClientError::OperationTimeout {
            attempts: LRO_POLL_ATTEMPTS,
        })
    }
}

#[async_trait]
impl EventHubsClient for ArmClient {
    async fn get_namespace(
        &self,
        resource_group: &str,
        namespace: &str,
    ) -> ClientResult<NamespaceState> {
        let url = self.namespace_url(resource_group, namespace)?;
        let token = self.token().await?;
        tracing::debug!(url = %url, "GET namespace");

        let response = self.http.get(url).bearer_auth(token).send().await?;
        let response = check_response(response, resource_group, namespace).await?;
        let raw: ArmNamespace = response.json().await?;
        Ok(raw.into())
    }

    async fn create_or_update_namespace(
        &self,
        resource_group: &str,
        namespace: &str,
        params: &NamespaceParams,
    ) -> ClientResult<NamespaceState> {
        let url = self.namespace_url(resource_group, namespace)?;
        let token = self.token().await?;
        tracing::debug!(url = %url, sku = %params.sku, "PUT namespace");

        let body = NamespaceRequestBody {
            location: params.location.clone(),
            sku: SkuBody {
                name: params.sku.as_str().to_string(),
                tier: params.sku.as_str().to_string(),
            },
            tags: params.tags.clone(),
            properties: serde_json::Map::new(),
        };

        let response = self
            .http
            .put(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let response = check_response(response, resource_group, namespace).await?;
        let raw: ArmNamespace = response.json().await?;
        Ok(raw.into())
    }

    async fn delete_namespace(&self, resource_group: &str, namespace: &str) -> ClientResult<()> {
        let url = self.namespace_url(resource_group, namespace)?;
        let token = self.token().await?;
        tracing::debug!(url = %url, "DELETE namespace");

        let response = self.http.delete(url).bearer_auth(token).send().await?;
        let response = check_response(response, resource_group, namespace).await?;
        self.await_operation(response).await
    }

    async fn get_event_hub(
        &self,
        resource_group: &str,
        namespace: &str,
        name: &str,
    ) -> ClientResult<EventHubState> {
        let url = self.event_hub_url(resource_group, namespace, name)?;
        let token = self.token().await?;
        tracing::debug!(url = %url, "GET event hub");

        let response = self.http.get(url).bearer_auth(token).send().await?;
        let response = check_response(response, resource_group, name).await?;
        let raw: ArmEventHub = response.json().await?;
        Ok(raw.into())
    }

    async fn create_or_update_event_hub(
        &self,
        resource_group: &str,
        namespace: &str,
        name: &str,
        params: &EventHubParams,
    ) -> ClientResult<EventHubState> {
        let url = self.event_hub_url(resource_group, namespace, name)?;
        let token = self.token().await?;
        tracing::debug!(url = %url, partition_count = params.partition_count, "PUT event hub");

        let body = EventHubRequestBody {
            location: params.location.clone(),
            properties: EventHubRequestProperties {
                message_retention_in_days: params.message_retention_in_days,
                partition_count: params.partition_count,
                status: params.status.as_str().to_string(),
            },
        };

        let response = self
            .http
            .put(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let response = check_response(response, resource_group, name).await?;
        let raw: ArmEventHub = response.json().await?;
        Ok(raw.into())
    }

    async fn delete_event_hub(
        &self,
        resource_group: &str,
        namespace: &str,
        name: &str,
    ) -> ClientResult<()> {
        let url = self.event_hub_url(resource_group, namespace, name)?;
        let token = self.token().await?;
        tracing::debug!(url = %url, "DELETE event hub");

        let response = self.http.delete(url).bearer_auth(token).send().await?;
        let response = check_response(response, resource_group, name).await?;
        self.await_operation(response).await
    }
}

fn parse_url(raw: &str) -> ClientResult<Url> {
    Url::parse(raw).map_err(|e| ClientError::InvalidEndpoint(format!("{}: {}", raw, e)))
}

fn join_url(base: &Url, path: &str) -> ClientResult<Url> {
    base.join(path)
        .map_err(|e| ClientError::InvalidEndpoint(format!("{}: {}", path, e)))
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Maps 404 to [`ClientError::NotFound`] and other failures to
/// [`ClientError::Cloud`] with the decoded ARM error body.
async fn check_response(
    response: Response,
    resource_group: &str,
    name: &str,
) -> ClientResult<Response> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::not_found(resource_group, name));
    }
    if status.is_success() || status == StatusCode::ACCEPTED {
        return Ok(response);
    }
    Err(decode_cloud_error(response).await)
}

async fn decode_cloud_error(response: Response) -> ClientError {
    #[derive(Deserialize)]
    struct ArmErrorBody {
        error: Option<ArmErrorDetail>,
    }
    #[derive(Deserialize)]
    struct ArmErrorDetail {
        code: Option<String>,
        message: Option<String>,
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ArmErrorBody>(&body)
        .ok()
        .and_then(|b| b.error);

    ClientError::Cloud {
        status,
        code: detail.as_ref().and_then(|d| d.code.clone()),
        message: detail
            .and_then(|d| d.message)
            .unwrap_or_else(|| body.trim().to_string()),
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct ArmNamespace {
    name: Option<String>,
    #[serde(rename = "type")]
    resource_type: Option<String>,
    location: Option<String>,
    sku: Option<ArmSku>,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    properties: ArmNamespaceProperties,
}

#[derive(Debug, Deserialize)]
struct ArmSku {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ArmNamespaceProperties {
    provisioning_state: Option<String>,
    status: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    service_bus_endpoint: Option<String>,
    metric_id: Option<String>,
    is_auto_inflate_enabled: Option<bool>,
    maximum_throughput_units: Option<i64>,
    #[serde(flatten)]
    additional: HashMap<String, serde_json::Value>,
}

impl From<ArmNamespace> for NamespaceState {
    fn from(raw: ArmNamespace) -> Self {
        NamespaceState {
            name: raw.name,
            resource_type: raw.resource_type,
            location: raw.location.as_deref().map(normalize_location),
            sku: raw.sku.and_then(|s| s.name),
            tags: raw.tags,
            provisioning_state: raw.properties.provisioning_state,
            status: raw.properties.status,
            service_bus_endpoint: raw.properties.service_bus_endpoint,
            metric_id: raw.properties.metric_id,
            created_at: raw.properties.created_at,
            updated_at: raw.properties.updated_at,
            is_auto_inflate_enabled: raw.properties.is_auto_inflate_enabled,
            maximum_throughput_units: raw.properties.maximum_throughput_units,
            additional_properties: raw.properties.additional,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArmEventHub {
    name: Option<String>,
    #[serde(default)]
    properties: ArmEventHubProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ArmEventHubProperties {
    partition_ids: Vec<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    message_retention_in_days: Option<i64>,
    partition_count: Option<i64>,
    status: Option<String>,
    #[serde(flatten)]
    additional: HashMap<String, serde_json::Value>,
}

impl From<ArmEventHub> for EventHubState {
    fn from(raw: ArmEventHub) -> Self {
        EventHubState {
            name: raw.name,
            partition_ids: raw.properties.partition_ids,
            created_at: raw.properties.created_at,
            updated_at: raw.properties.updated_at,
            message_retention_in_days: raw.properties.message_retention_in_days,
            partition_count: raw.properties.partition_count,
            status: raw.properties.status,
            additional_properties: raw.properties.additional,
            ..Default::default()
        }
    }
}

#[derive(Serialize)]
struct NamespaceRequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    sku: SkuBody,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    tags: HashMap<String, String>,
    properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize)]
struct SkuBody {
    name: String,
    tier: String,
}

#[derive(Serialize)]
struct EventHubRequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    properties: EventHubRequestProperties,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventHubRequestProperties {
    message_retention_in_days: i64,
    partition_count: i64,
    status: String,
}
