//! HTTP request types.

use std::time::Duration;

use crate::error::Result;

/// A request ready to be sent by [`HttpClient`](super::HttpClient).
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: http::Method,
    /// URL without the query string.
    pub url: String,
    pub headers: http::HeaderMap,
    /// Query parameters, form-encoded onto the URL at send time.
    pub query: Vec<(String, String)>,
    /// Per-request timeout, overriding the client's.
    pub timeout: Option<Duration>,
    /// Token sent as `Authorization: Bearer <token>`.
    pub bearer_token: Option<String>,
}

impl HttpRequest {
    /// A GET request for `url` with no headers.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: http::Method::GET,
            url: url.into(),
            headers: http::HeaderMap::new(),
            query: Vec::new(),
            timeout: None,
            bearer_token: None,
        }
    }

    /// The full URL with query parameters appended.
    pub fn full_url(&self) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.url)?;
        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_url_encodes_query() {
        let mut request = HttpRequest::get("https://org.example.com/api/data/v9.0/accounts");
        request.query.push(("$select".into(), "name,revenue".into()));
        request.query.push(("fetchXml".into(), r#"<fetch><entity name="account"/></fetch>"#.into()));

        let url = request.full_url().unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, request.query);
        assert!(!url.as_str().contains('<'));
    }

    #[test]
    fn test_full_url_without_query() {
        let request = HttpRequest::get("https://org.example.com/api/data/v9.0/accounts");
        assert_eq!(request.full_url().unwrap().query(), None);
        assert!(HttpRequest::get("not a url").full_url().is_err());
    }
}
