//! Dataverse Web API client.
//!
//! Wraps a [`RestApiClient`] rooted at `{org}/api/data/{version}` and exposes
//! the three calls the column pipeline and its collaborators need:
//!
//! - [`WebApiClient::attribute_definitions`]: attribute metadata for one entity
//! - [`WebApiClient::saved_query`]: a saved view's query document and layout
//! - [`WebApiClient::retrieve_multiple`]: row data for an entity set
//!
//! # Example
//!
//! ```ignore
//! use horizon_gridview_net::webapi::WebApiClient;
//!
//! let client = WebApiClient::builder("https://org.crm.dynamics.com")
//!     .bearer_auth(token)
//!     .build()?;
//!
//! let attributes = client
//!     .attribute_definitions("account", &["name".into(), "primarycontactid".into()])
//!     .await?;
//! ```

mod config;
mod types;

use crate::error::Result;
use crate::http::{RestApiClient, RestApiClientBuilder, RetryConfig};

pub use config::WebApiConfig;
pub use types::{
    AttributeDefinition, DisplayName, EntityCollection, LOOKUP_ATTRIBUTE_TYPE, LocalizedLabel,
    SavedQuery,
};

/// Default Web API version segment.
pub const DEFAULT_API_VERSION: &str = "v9.0";

const TARGET: &str = "horizon_gridview_net::webapi";

/// Columns selected when retrieving a saved view.
const SAVED_QUERY_SELECT: &str = "name,fetchxml,layoutjson,returnedtypecode";

/// Builder for [`WebApiClient`].
pub struct WebApiClientBuilder {
    org_url: String,
    api_version: String,
    rest: Option<RestApiClientBuilder>,
    token: Option<String>,
    retry: RetryConfig,
    rate_limit: Option<u32>,
}

impl WebApiClientBuilder {
    /// Create a builder for the organization at `org_url`.
    pub fn new(org_url: impl Into<String>) -> Self {
        Self {
            org_url: org_url.into().trim_end_matches('/').to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            rest: None,
            token: None,
            retry: RetryConfig::disabled(),
            rate_limit: None,
        }
    }

    /// Override the API version segment (default `v9.0`).
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Authenticate every request with a bearer token.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Configure retry of throttled and transient failures.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Limit outgoing requests per second.
    pub fn rate_limit_per_second(mut self, requests_per_second: u32) -> Self {
        self.rate_limit = Some(requests_per_second);
        self
    }

    /// Start from a preconfigured REST builder instead of a default one.
    ///
    /// The builder's base URL is replaced by the Web API root.
    pub fn rest_builder(mut self, builder: RestApiClientBuilder) -> Self {
        self.rest = Some(builder);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<WebApiClient> {
        let base_url = format!("{}/api/data/{}", self.org_url, self.api_version);
        let mut builder = match self.rest {
            Some(builder) => builder.with_base_url(base_url.clone()),
            None => RestApiClient::builder(base_url.clone()),
        };

        builder = builder
            .accept_json()
            .default_header("OData-MaxVersion", "4.0")
            .default_header("OData-Version", "4.0")
            .retry(self.retry);
        if let Some(token) = self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(rps) = self.rate_limit {
            builder = builder.rate_limit_per_second(rps);
        }

        let rest = builder.build()?;
        tracing::debug!(target: TARGET, base_url = %rest.base_url(), "web api client ready");
        Ok(WebApiClient { rest })
    }
}

/// Client for the Dataverse Web API.
///
/// Cheap to clone; clones share the connection pool and rate limiter.
#[derive(Clone, Debug)]
pub struct WebApiClient {
    rest: RestApiClient,
}

impl WebApiClient {
    /// Create a builder for the organization at `org_url`.
    pub fn builder(org_url: impl Into<String>) -> WebApiClientBuilder {
        WebApiClientBuilder::new(org_url)
    }

    /// Build a client from loaded configuration.
    pub fn from_config(config: &WebApiConfig) -> Result<Self> {
        let http = crate::http::HttpClient::builder()
            .timeout(config.timeout())
            .build()?;
        let mut builder = Self::builder(&config.org_url)
            .api_version(&config.api_version)
            .retry(config.retry.clone())
            .rest_builder(RestApiClient::builder(&config.org_url).http_client(http));
        if let Some(token) = &config.access_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(rps) = config.rate_limit_per_second {
            builder = builder.rate_limit_per_second(rps);
        }
        builder.build()
    }

    /// The Web API root, e.g. `https://org.crm.dynamics.com/api/data/v9.0`.
    pub fn base_url(&self) -> &str {
        self.rest.base_url()
    }

    /// The underlying REST client.
    pub fn rest_client(&self) -> &RestApiClient {
        &self.rest
    }

    /// Retrieve attribute metadata of `entity` restricted to `names`.
    ///
    /// Names the entity does not define are simply absent from the result.
    /// An empty `names` slice returns an empty list without a request.
    #[tracing::instrument(skip(self, names), target = "horizon_gridview_net::webapi", fields(count = names.len()))]
    pub async fn attribute_definitions(
        &self,
        entity: &str,
        names: &[String],
    ) -> Result<Vec<AttributeDefinition>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let path = format!(
            "EntityDefinitions(LogicalName='{}')/Attributes",
            escape_literal(entity)
        );
        let collection: EntityCollection<AttributeDefinition> = self
            .rest
            .get(&path)
            .query("$filter", logical_name_filter(names))
            .json_response()
            .await?;

        tracing::debug!(target: TARGET, entity, returned = collection.value.len(), "attribute metadata received");
        Ok(collection.value)
    }

    /// Retrieve a saved view by id.
    ///
    /// Braces around the id (`{...}`) are accepted and stripped.
    #[tracing::instrument(skip(self), target = "horizon_gridview_net::webapi")]
    pub async fn saved_query(&self, view_id: &str) -> Result<SavedQuery> {
        let id = view_id.trim_start_matches('{').trim_end_matches('}');
        self.rest
            .get(&format!("savedqueries({id})"))
            .query("$select", SAVED_QUERY_SELECT)
            .json_response()
            .await
    }

    /// Retrieve rows of `entity_set` with OData system query options.
    ///
    /// `entity_set` is the collection name (`accounts`), not the logical name.
    #[tracing::instrument(skip(self, options), target = "horizon_gridview_net::webapi")]
    pub async fn retrieve_multiple(
        &self,
        entity_set: &str,
        options: &[(String, String)],
    ) -> Result<EntityCollection<serde_json::Value>> {
        self.rest
            .get(entity_set)
            .header("Prefer", "odata.include-annotations=\"*\"")
            .query_pairs(options.iter().cloned())
            .json_response()
            .await
    }

    /// Retrieve rows of `entity_set` using a query document.
    pub async fn retrieve_multiple_fetch_xml(
        &self,
        entity_set: &str,
        fetch_xml: &str,
    ) -> Result<EntityCollection<serde_json::Value>> {
        self.retrieve_multiple(entity_set, &[("fetchXml".to_string(), fetch_xml.to_string())])
            .await
    }
}

/// Double single quotes for an OData string literal.
fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// `Microsoft.Dynamics.CRM.In` filter over attribute logical names.
fn logical_name_filter(names: &[String]) -> String {
    let values = names
        .iter()
        .map(|name| format!("'{}'", escape_literal(name)))
        .collect::<Vec<_>>()
        .join(",");
    format!("Microsoft.Dynamics.CRM.In(PropertyName='logicalname',PropertyValues=[{values}])")
}
