//! HTTP plumbing for Horizon GridView.
//!
//! [`HttpClient`] is a thin asynchronous client over `reqwest`;
//! [`RestApiClient`] adds a base URL, bearer authentication, a request rate
//! limit and retry with backoff on top of it.
//!
//! # Example
//!
//! ```ignore
//! use horizon_gridview_net::http::RestApiClient;
//!
//! let client = RestApiClient::builder("https://org.crm.dynamics.com/api/data/v9.0")
//!     .bearer_auth(token)
//!     .accept_json()
//!     .build()?;
//!
//! let response = client.get("accounts").query("$top", "5").send().await?;
//! println!("Status: {}", response.status());
//! ```

mod client;
mod request;
mod response;
mod rest_api;

pub use client::{HttpClient, HttpClientBuilder, HttpClientConfig};
pub use request::HttpRequest;
pub use response::HttpResponse;
pub use rest_api::{RateLimiter, RestApiClient, RestApiClientBuilder, RestApiRequestBuilder, RetryConfig};
