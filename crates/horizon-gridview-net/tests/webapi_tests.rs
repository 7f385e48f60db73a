//! Tests for the Dataverse Web API client against a mock server.

use horizon_gridview_net::NetworkError;
use horizon_gridview_net::http::RetryConfig;
use horizon_gridview_net::webapi::{WebApiClient, WebApiConfig};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> WebApiClient {
    WebApiClient::builder(server.uri())
        .bearer_auth("token")
        .build()
        .expect("Failed to build client")
}

#[tokio::test]
async fn test_attribute_definitions_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data/v9.0/EntityDefinitions(LogicalName='account')/Attributes"))
        .and(query_param(
            "$filter",
            "Microsoft.Dynamics.CRM.In(PropertyName='logicalname',PropertyValues=['name','primarycontactid'])",
        ))
        .and(header("Authorization", "Bearer token"))
        .and(header("OData-Version", "4.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@odata.context": "https://org/api/data/v9.0/$metadata#EntityDefinitions('account')/Attributes",
            "value": [
                {
                    "@odata.type": "#Microsoft.Dynamics.CRM.StringAttributeMetadata",
                    "LogicalName": "name",
                    "IsPrimaryId": false,
                    "IsPrimaryName": true,
                    "DisplayName": { "LocalizedLabels": [{ "Label": "Account Name", "LanguageCode": 1033 }] }
                },
                {
                    "@odata.type": "#Microsoft.Dynamics.CRM.LookupAttributeMetadata",
                    "LogicalName": "primarycontactid",
                    "IsPrimaryId": false,
                    "IsPrimaryName": false,
                    "DisplayName": { "LocalizedLabels": [{ "Label": "Primary Contact", "LanguageCode": 1033 }] }
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let defs = client_for(&server)
        .attribute_definitions("account", &["name".to_string(), "primarycontactid".to_string()])
        .await
        .expect("metadata request failed");

    assert_eq!(defs.len(), 2);
    assert!(defs[0].is_primary_name);
    assert_eq!(defs[0].label(), Some("Account Name"));
    assert!(defs[1].is_lookup());
}

#[tokio::test]
async fn test_attribute_definitions_empty_names_skip_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let defs = client_for(&server)
        .attribute_definitions("account", &[])
        .await
        .expect("empty lookup should not fail");
    assert!(defs.is_empty());
}

#[tokio::test]
async fn test_attribute_definitions_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Could not find entity"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .attribute_definitions("nosuchentity", &["name".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, NetworkError::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_saved_query_strips_braces_and_selects_columns() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data/v9.0/savedqueries(00000000-0000-0000-00aa-000010001001)"))
        .and(query_param("$select", "name,fetchxml,layoutjson,returnedtypecode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Active Accounts",
            "fetchxml": "<fetch><entity name=\"account\"><attribute name=\"name\"/></entity></fetch>",
            "layoutjson": "{\"Object\":1,\"Rows\":[{\"Cells\":[{\"Name\":\"name\",\"Width\":300}]}]}",
            "returnedtypecode": "account"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let view = client_for(&server)
        .saved_query("{00000000-0000-0000-00aa-000010001001}")
        .await
        .expect("saved query request failed");

    assert_eq!(view.name, "Active Accounts");
    assert!(view.layout_json.as_deref().unwrap_or_default().contains("\"Width\":300"));
}

#[tokio::test]
async fn test_retrieve_multiple_with_fetch_xml() {
    let fetch = r#"<fetch><entity name="account"><attribute name="name"/></entity></fetch>"#;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data/v9.0/accounts"))
        .and(query_param("fetchXml", fetch))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ "accountid": "1", "name": "Contoso" }],
            "@odata.nextLink": "https://org/next"
        })))
        .mount(&server)
        .await;

    let rows = client_for(&server)
        .retrieve_multiple_fetch_xml("accounts", fetch)
        .await
        .expect("retrieve failed");

    assert_eq!(rows.value.len(), 1);
    assert_eq!(rows.value[0]["name"], "Contoso");
    assert_eq!(rows.next_link.as_deref(), Some("https://org/next"));
}

#[tokio::test]
async fn test_retrieve_multiple_with_select() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data/v9.0/accounts"))
        .and(query_param("$select", "name,_primarycontactid_value"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let rows = client_for(&server)
        .retrieve_multiple(
            "accounts",
            &[("$select".to_string(), "name,_primarycontactid_value".to_string())],
        )
        .await
        .expect("retrieve failed");
    assert!(rows.value.is_empty());
}

#[tokio::test]
async fn test_client_does_not_retry_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).saved_query("abc").await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_client_from_config_with_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("Authorization", "Bearer from-config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "My View", "fetchxml": "<fetch/>"
        })))
        .mount(&server)
        .await;

    let config = WebApiConfig {
        org_url: server.uri(),
        access_token: Some("from-config".to_string()),
        retry: RetryConfig {
            max_retries: 1,
            initial_delay_ms: 5,
            max_delay_ms: 5,
            backoff_multiplier: 1.0,
        },
        ..WebApiConfig::default()
    };
    let client = WebApiClient::from_config(&config).expect("Failed to build client");

    let view = client.saved_query("abc").await.expect("retry should recover");
    assert_eq!(view.name, "My View");
}
