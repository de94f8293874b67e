//! Reading extension settings out of host configuration.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::client::{Client, ClientConfig, Transport};
use crate::payload::PayloadBuilder;
use crate::redact::RedactionSet;
use crate::secret::Secret;

/// Key holding the reporting API key. Absent or empty disables reporting.
pub const API_KEY: &str = "FAULTLINE_API_KEY";
/// Key holding the environment tag attached to every notice.
pub const ENVIRONMENT: &str = "FAULTLINE_ENVIRONMENT";
/// Key holding the comma-separated list of filtered params/session fields.
pub const PARAMS_FILTERS: &str = "FAULTLINE_PARAMS_FILTERS";
/// Key holding the comma-separated list of request headers left out of notices.
pub const EXCLUDE_HEADERS: &str = "FAULTLINE_EXCLUDE_HEADERS";

/// Environment used when none is configured.
pub const DEFAULT_ENVIRONMENT: &str = "development";
/// Fields filtered when no params filter is configured.
pub const DEFAULT_PARAMS_FILTERS: &str = "password,password_confirmation,credit_card";
/// Headers excluded when no exclude list is configured.
pub const DEFAULT_EXCLUDE_HEADERS: &str = "Authorization, Proxy-Authorization";

/// Read-only access to a host's configuration values.
///
/// Implemented for plain string maps and for the process environment
/// ([`EnvConfig`]). Hosts with their own configuration object implement it
/// directly.
pub trait ConfigSource {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl ConfigSource for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).cloned()
    }
}

/// Configuration read from process environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfig;

impl ConfigSource for EnvConfig {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Splits a comma-separated value, trimming entries and dropping empty ones.
///
/// # Examples
///
/// ```
/// use faultline::config::csv_to_list;
///
/// assert_eq!(csv_to_list(" a, b,,c "), vec!["a", "b", "c"]);
/// assert!(csv_to_list(" , ").is_empty());
/// ```
pub fn csv_to_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extension settings, built once at install time and immutable afterwards.
///
/// Every field is computed even when the API key is missing; in that case
/// reporting stays disabled and the rest is simply unused.
///
/// # Examples
///
/// ```
/// use faultline::ExtensionConfig;
/// use std::collections::HashMap;
///
/// let mut host = HashMap::new();
/// host.insert("FAULTLINE_API_KEY".to_string(), "abcd".to_string());
/// host.insert("FAULTLINE_PARAMS_FILTERS".to_string(), "skip, password".to_string());
///
/// let config = ExtensionConfig::from_source(&host);
/// assert!(config.is_enabled());
/// assert_eq!(config.environment(), "development");
/// assert!(config.params_filters().contains("skip"));
/// assert!(config.exclude_headers().contains("Authorization"));
/// ```
#[derive(Debug)]
pub struct ExtensionConfig {
    api_key: Option<Secret<String>>,
    environment: String,
    params_filters: RedactionSet,
    exclude_headers: BTreeSet<String>,
}

impl ExtensionConfig {
    /// Builds the settings from a host configuration source, applying defaults.
    pub fn from_source<S: ConfigSource + ?Sized>(source: &S) -> Self {
        let api_key = source
            .get(API_KEY)
            .filter(|key| !key.trim().is_empty())
            .map(Secret::new);
        let environment = source
            .get(ENVIRONMENT)
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
        let params_filters = csv_to_list(
            &source
                .get(PARAMS_FILTERS)
                .unwrap_or_else(|| DEFAULT_PARAMS_FILTERS.to_string()),
        )
        .into_iter()
        .collect();
        let exclude_headers = csv_to_list(
            &source
                .get(EXCLUDE_HEADERS)
                .unwrap_or_else(|| DEFAULT_EXCLUDE_HEADERS.to_string()),
        )
        .into_iter()
        .collect();

        Self {
            api_key,
            environment,
            params_filters,
            exclude_headers,
        }
    }

    /// Returns true when an API key is configured.
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Returns the API key, if configured.
    pub fn api_key(&self) -> Option<&Secret<String>> {
        self.api_key.as_ref()
    }

    /// Returns the environment tag.
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Returns the fields filtered out of params and session data.
    pub fn params_filters(&self) -> &RedactionSet {
        &self.params_filters
    }

    /// Returns the headers omitted from request payloads.
    pub fn exclude_headers(&self) -> &BTreeSet<String> {
        &self.exclude_headers
    }

    /// Returns the client configuration, or `None` when reporting is disabled.
    pub fn client_config(&self) -> Option<ClientConfig> {
        self.api_key.as_ref().map(|key| {
            ClientConfig::new(
                key.expose_secret().clone(),
                self.environment.clone(),
                self.params_filters.clone(),
            )
        })
    }

    /// Builds an adapter's client, configured when an API key is present.
    pub(crate) fn build_client(
        &self,
        transport: Arc<dyn Transport>,
        payload_builder: Arc<dyn PayloadBuilder>,
    ) -> Arc<Client> {
        let client = Client::builder(transport)
            .payload_builder(payload_builder)
            .build();
        self.configure_client(&client);
        Arc::new(client)
    }

    /// Configures `client` if an API key is present.
    ///
    /// Returns whether the client was configured. Without a key the client
    /// is left in no-op mode and every notification is dropped.
    pub fn configure_client(&self, client: &Client) -> bool {
        match self.client_config() {
            Some(config) => {
                tracing::info!(environment = %self.environment, "configuring error reporting");
                client.configure(config);
                true
            }
            None => {
                tracing::info!("no reporting API key found, skipping configuration");
                false
            }
        }
    }
}
