//! Networking for Horizon GridView.
//!
//! - **HTTP Client**: A thin asynchronous client over `reqwest`
//! - **REST helpers**: Base URL, authentication, rate limiting, retry
//! - **Web API**: Dataverse attribute metadata, saved views and row retrieval
//!
//! # Example
//!
//! ```ignore
//! use horizon_gridview_net::webapi::{WebApiClient, WebApiConfig};
//!
//! let config = WebApiConfig::from_toml_str(&std::fs::read_to_string("webapi.toml")?)?;
//! let client = WebApiClient::from_config(&config)?;
//!
//! let view = client.saved_query("00000000-0000-0000-00aa-000010001001").await?;
//! println!("{}: {}", view.name, view.fetch_xml);
//! ```

mod error;
pub mod http;
pub mod webapi;

pub use error::{NetworkError, Result};

pub use http::{HttpClient, HttpClientBuilder, HttpResponse, RestApiClient, RetryConfig};
pub use webapi::{AttributeDefinition, SavedQuery, WebApiClient, WebApiConfig};
