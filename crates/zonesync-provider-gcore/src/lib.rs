// # G-Core DNS Provider
//
// This crate provides a G-Core DNS provider implementation for zonesync.
//
// ## Behaviour
//
// - One HTTP request per trait call; corrections map to exactly one
//   create, update or delete of a record set
// - Full error propagation to the engine (the engine owns retries)
// - HTTP timeout configured (30 seconds)
// - Specific error handling for HTTP status codes (401/403, 404, 409, 429, 5xx)
// - No retry or backoff logic and no caching between calls
//
// ## Security Requirements
//
// - API key NEVER appears in logs or in `Debug` output
// - Provider construction fails if the key is empty
//
// ## API Reference
//
// Base URL `https://api.gcore.com/dns`, header `Authorization: APIKey <key>`.
//
// - List zones: GET `/v2/zones`
// - Create zone: POST `/v2/zones`
// - Zone details (record set names and types): GET `/v2/zones/:zone`
// - Record set: GET | POST | PUT | DELETE `/v2/zones/:zone/:name/:type`

mod api;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;
use zonesync_core::config::ProviderConfig;
use zonesync_core::model::name::without_dot;
use zonesync_core::traits::{DnsProvider, DnsProviderFactory, RRSetRef};
use zonesync_core::{Capabilities, Error, NativeRRSet, RecordType, Result};

/// G-Core DNS API base URL
pub const GCORE_API_BASE: &str = "https://api.gcore.com/dns";

/// Nameservers G-Core assigns to every hosted zone
pub const DEFAULT_NAMESERVERS: [&str; 2] = ["ns1.gcorelabs.net", "ns2.gcdn.services"];

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER_NAME: &str = "gcore";

/// G-Core DNS provider
///
/// Stateless: every call is a single request against the API.
///
/// # Security
///
/// The Debug implementation does NOT expose the API key.
pub struct GcoreProvider {
    /// G-Core permanent API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// API base URL, without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for GcoreProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcoreProvider")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GcoreProvider {
    /// Create a provider talking to the public G-Core API
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, GCORE_API_BASE)
    }

    /// Create a provider talking to `base_url` (tests, proxies)
    ///
    /// # Errors
    ///
    /// `Error::Config` if the key is empty, `Error::Http` if the HTTP client
    /// cannot be built.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("G-Core API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// API base URL in use
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn zones_url(&self) -> String {
        format!("{}/v2/zones", self.base_url)
    }

    fn zone_url(&self, zone: &str) -> String {
        format!("{}/v2/zones/{}", self.base_url, without_dot(zone))
    }

    fn rrset_url(&self, zone: &str, name: &str, record_type: RecordType) -> String {
        format!(
            "{}/v2/zones/{}/{}/{}",
            self.base_url,
            without_dot(zone),
            without_dot(name),
            record_type
        )
    }

    /// Authenticate, send, and map non-2xx statuses to errors
    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response> {
        let response = request
            .header("Authorization", format!("APIKey {}", self.api_key))
            .send()
            .await
            .map_err(|e| Error::http(format!("{}: HTTP request failed: {}", context, e)))?;

        check_status(response, context).await
    }

    async fn write_rrset(
        &self,
        request: RequestBuilder,
        context: &str,
        rrset: &NativeRRSet,
    ) -> Result<()> {
        self.send(request.json(rrset), context).await?;
        tracing::info!("G-Core {} succeeded", context);
        Ok(())
    }
}

/// Map a non-2xx response to the matching error kind
///
/// The API's `{"error": "..."}` message is passed through verbatim; other
/// bodies are passed through as text.
async fn check_status(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());
    let message = serde_json::from_str::<api::ApiError>(&body)
        .map(|e| e.error)
        .unwrap_or(body);

    tracing::debug!("G-Core {} returned {}", context, status);
    Err(status_error(status, context, &message))
}

fn status_error(status: StatusCode, context: &str, message: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{}: invalid API key or insufficient permissions ({}): {}",
            context, status, message
        )),
        404 => Error::not_found(format!("{}: {}", context, message)),
        409 => Error::provider(PROVIDER_NAME, format!("{}: conflict ({}): {}", context, status, message)),
        429 => Error::rate_limited(format!("{}: {}", context, message)),
        500..=599 => Error::provider(
            PROVIDER_NAME,
            format!("{}: server error (transient) ({}): {}", context, status, message),
        ),
        _ => Error::provider(PROVIDER_NAME, format!("{}: {}: {}", context, status, message)),
    }
}

#[async_trait]
impl DnsProvider for GcoreProvider {
    async fn zone_exists(&self, zone: &str) -> Result<bool> {
        let wanted = without_dot(zone);
        let response = self
            .send(self.client.get(self.zones_url()), "list zones")
            .await?;
        let list: api::ZoneList = response
            .json()
            .await
            .map_err(|e| Error::http(format!("list zones: failed to parse response: {}", e)))?;

        Ok(list
            .zones
            .iter()
            .any(|z| without_dot(&z.name).eq_ignore_ascii_case(wanted)))
    }

    async fn create_zone(&self, zone: &str) -> Result<()> {
        let name = without_dot(zone);
        let context = format!("create zone {}", name);
        self.send(
            self.client
                .post(self.zones_url())
                .json(&api::CreateZone { name }),
            &context,
        )
        .await?;
        tracing::info!("G-Core {} succeeded", context);
        Ok(())
    }

    async fn list_zone_record_names(&self, zone: &str) -> Result<Vec<RRSetRef>> {
        let context = format!("get zone {}", without_dot(zone));
        let response = self.send(self.client.get(self.zone_url(zone)), &context).await?;
        let details: api::ZoneDetails = response
            .json()
            .await
            .map_err(|e| Error::http(format!("{}: failed to parse response: {}", context, e)))?;

        Ok(details
            .records
            .into_iter()
            .map(|r| RRSetRef::new(r.name, r.record_type))
            .collect())
    }

    async fn get_rrset(&self, zone: &str, name: &str, record_type: RecordType) -> Result<NativeRRSet> {
        let context = format!("get rrset {} {}", without_dot(name), record_type);
        let response = self
            .send(self.client.get(self.rrset_url(zone, name, record_type)), &context)
            .await?;
        response
            .json()
            .await
            .map_err(|e| Error::http(format!("{}: failed to parse response: {}", context, e)))
    }

    async fn create_rrset(
        &self,
        zone: &str,
        name: &str,
        record_type: RecordType,
        rrset: &NativeRRSet,
    ) -> Result<()> {
        let context = format!("create rrset {} {}", without_dot(name), record_type);
        let request = self.client.post(self.rrset_url(zone, name, record_type));
        self.write_rrset(request, &context, rrset).await
    }

    async fn update_rrset(
        &self,
        zone: &str,
        name: &str,
        record_type: RecordType,
        rrset: &NativeRRSet,
    ) -> Result<()> {
        let context = format!("update rrset {} {}", without_dot(name), record_type);
        let request = self.client.put(self.rrset_url(zone, name, record_type));
        self.write_rrset(request, &context, rrset).await
    }

    async fn delete_rrset(&self, zone: &str, name: &str, record_type: RecordType) -> Result<()> {
        let context = format!("delete rrset {} {}", without_dot(name), record_type);
        self.send(
            self.client.delete(self.rrset_url(zone, name, record_type)),
            &context,
        )
        .await?;
        tracing::info!("G-Core {} succeeded", context);
        Ok(())
    }

    async fn get_nameservers(&self, _domain: &str) -> Result<Vec<String>> {
        Ok(DEFAULT_NAMESERVERS.iter().map(|ns| ns.to_string()).collect())
    }

    /// Every modelled type, but no SRV null target
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            record_types: RecordType::ALL.to_vec(),
            srv_empty_target: false,
        }
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating G-Core providers
pub struct GcoreFactory;

impl DnsProviderFactory for GcoreFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Gcore { api_key, api_url } => {
                if api_key.is_empty() {
                    return Err(Error::config("G-Core API key is required"));
                }
                let base_url = api_url.as_deref().unwrap_or(GCORE_API_BASE);
                Ok(Box::new(GcoreProvider::with_base_url(api_key.clone(), base_url)?))
            }
            _ => Err(Error::config("Invalid config for G-Core provider")),
        }
    }
}

/// Register the G-Core provider with a registry
///
/// # Example
///
/// ```rust
/// use zonesync_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// zonesync_provider_gcore::register(&registry);
/// assert!(registry.has_provider("gcore"));
/// ```
pub fn register(registry: &zonesync_core::ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(GcoreFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_creation() {
        let config = ProviderConfig::Gcore {
            api_key: "test_key".to_string(),
            api_url: None,
        };
        let provider = GcoreFactory.create(&config).unwrap();
        assert_eq!(provider.provider_name(), "gcore");
    }

    #[test]
    fn test_factory_missing_key() {
        let config = ProviderConfig::Gcore {
            api_key: "".to_string(),
            api_url: None,
        };
        assert!(GcoreFactory.create(&config).is_err());
        assert!(GcoreProvider::new("").is_err());
    }

    #[test]
    fn test_factory_rejects_other_config() {
        let config = ProviderConfig::Memory {
            nameservers: Vec::new(),
        };
        assert!(matches!(GcoreFactory.create(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_api_key_not_exposed_in_debug() {
        let provider = GcoreProvider::new("secret_key_12345").unwrap();
        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_key"));
        assert!(debug_str.contains("GcoreProvider"));
    }

    #[test]
    fn test_urls() {
        let provider = GcoreProvider::with_base_url("key", "http://localhost:8080/").unwrap();
        assert_eq!(provider.base_url(), "http://localhost:8080");
        assert_eq!(
            provider.rrset_url("example.com.", "www.example.com.", RecordType::Aaaa),
            "http://localhost:8080/v2/zones/example.com/www.example.com/AAAA"
        );
        assert_eq!(
            provider.zone_url("example.com."),
            "http://localhost:8080/v2/zones/example.com"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "list zones", "bad key"),
            Error::Authentication(_)
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, "list zones", "no"),
            Error::Authentication(_)
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "get zone", "zone not found"),
            Error::NotFound(_)
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "get zone", "slow down"),
            Error::RateLimited(_)
        ));

        let conflict = status_error(StatusCode::CONFLICT, "create rrset www A", "already exists");
        assert!(conflict.to_string().contains("conflict"));
        assert!(conflict.to_string().contains("already exists"));

        let transient = status_error(StatusCode::BAD_GATEWAY, "get zone", "upstream");
        assert!(transient.to_string().contains("transient"));
    }

    #[tokio::test]
    async fn test_default_nameservers() {
        let provider = GcoreProvider::new("key").unwrap();
        assert_eq!(
            provider.get_nameservers("example.com").await.unwrap(),
            vec!["ns1.gcorelabs.net".to_string(), "ns2.gcdn.services".to_string()]
        );
        assert!(!provider.capabilities().srv_empty_target);
    }
}
