//! HTTP backend for the management API.
//!
//! Every request carries the API key in `X-Api-Key` and is bounded by the
//! configured timeout. Status codes are inspected here rather than by ureq so
//! that connector error lists reach the caller intact.

use crate::backend::Backend;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{
    ApiError, Asset, ContractDefinition, CreateAssetInput, CreatePolicyInput, DataAddress,
    IdResponse, PolicyDefinition,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use ureq::http::{Response, StatusCode};
use ureq::{Agent, Body};

/// Header carrying the API key.
const API_KEY_HEADER: &str = "X-Api-Key";

/// Blocking HTTP backend.
pub struct HttpBackend {
    /// HTTP agent for requests.
    agent: Agent,
    /// Management API base URL.
    base: String,
    token: String,
}

impl HttpBackend {
    /// Create a backend from a client configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the management address is not an
    /// http(s) URL.
    pub fn new(config: &Config) -> Result<Self> {
        let base = config.management_base().to_string();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::InvalidConfig(format!(
                "management address must be an http(s) URL, got {base:?}"
            )));
        }

        let agent_config = Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build();

        Ok(Self {
            agent: Agent::new_with_config(agent_config),
            base,
            token: config.token.clone(),
        })
    }

    /// Get the management API base URL.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    /// Path of one record, with the id escaped as a single segment
    fn record_url(collection: &str, id: &str) -> String {
        format!("{collection}/{}", urlencoding::encode(id))
    }

    fn post<B, T>(&self, path: &str, body: &B, kind: &str) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        log::debug!("POST {url}");
        let response = self
            .agent
            .post(&url)
            .header(API_KEY_HEADER, &self.token)
            .send_json(body)?;
        read_json(check(response, kind, None)?)
    }

    fn get<T>(&self, path: &str, kind: &str, id: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path);
        log::debug!("GET {url}");
        let response = self
            .agent
            .get(&url)
            .header(API_KEY_HEADER, &self.token)
            .call()?;
        read_json(check(response, kind, Some(id))?)
    }

    fn delete(&self, path: &str, kind: &str, id: &str) -> Result<()> {
        let url = self.url(path);
        log::debug!("DELETE {url}");
        let response = self
            .agent
            .delete(&url)
            .header(API_KEY_HEADER, &self.token)
            .call()?;
        check(response, kind, Some(id)).map(|_| ())
    }
}

/// Turn a non-success response into the matching error
fn check(mut response: Response<Body>, kind: &str, id: Option<&str>) -> Result<Response<Body>> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND
        && let Some(id) = id
    {
        return Err(Error::not_found(kind, id));
    }

    Err(Error::Api {
        status: status.as_u16(),
        errors: error_body(response.body_mut().read_to_string()),
    })
}

/// Errors carried by a rejection body, or why the body could not be read
fn error_body<E: std::fmt::Display>(body: std::result::Result<String, E>) -> Vec<ApiError> {
    match body {
        Ok(body) => parse_api_errors(&body),
        Err(e) => vec![ApiError::new(format!("failed to read error body: {e}"))],
    }
}

/// Parse a connector error body, falling back to the raw text
fn parse_api_errors(body: &str) -> Vec<ApiError> {
    if let Ok(errors) = serde_json::from_str::<Vec<ApiError>>(body) {
        return errors;
    }
    if let Ok(error) = serde_json::from_str::<ApiError>(body) {
        return vec![error];
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        Vec::new()
    } else {
        vec![ApiError::new(trimmed)]
    }
}

fn read_json<T: DeserializeOwned>(mut response: Response<Body>) -> Result<T> {
    let text = response.body_mut().read_to_string()?;
    Ok(serde_json::from_str(&text)?)
}

impl Backend for HttpBackend {
    fn create_asset(&self, input: &CreateAssetInput) -> Result<IdResponse> {
        self.post("assets", input, "asset")
    }

    fn get_asset(&self, id: &str) -> Result<Asset> {
        self.get(&Self::record_url("assets", id), "asset", id)
    }

    fn get_data_address(&self, id: &str) -> Result<DataAddress> {
        self.get(
            &format!("{}/address", Self::record_url("assets", id)),
            "asset",
            id,
        )
    }

    fn delete_asset(&self, id: &str) -> Result<()> {
        self.delete(&Self::record_url("assets", id), "asset", id)
    }

    fn create_policy(&self, input: &CreatePolicyInput) -> Result<IdResponse> {
        self.post("policydefinitions", input, "policy definition")
    }

    fn get_policy(&self, id: &str) -> Result<PolicyDefinition> {
        self.get(
            &Self::record_url("policydefinitions", id),
            "policy definition",
            id,
        )
    }

    fn delete_policy(&self, id: &str) -> Result<()> {
        self.delete(
            &Self::record_url("policydefinitions", id),
            "policy definition",
            id,
        )
    }

    fn create_contract_definition(&self, input: &ContractDefinition) -> Result<IdResponse> {
        self.post("contractdefinitions", input, "contract definition")
    }

    fn get_contract_definition(&self, id: &str) -> Result<ContractDefinition> {
        self.get(
            &Self::record_url("contractdefinitions", id),
            "contract definition",
            id,
        )
    }

    fn delete_contract_definition(&self, id: &str) -> Result<()> {
        self.delete(
            &Self::record_url("contractdefinitions", id),
            "contract definition",
            id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Addresses;

    fn config(management: &str) -> Config {
        Config::new(
            "token",
            Addresses {
                management: management.to_string(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_url_building() {
        let backend = HttpBackend::new(&config("http://localhost:19193/api/v1/data/")).unwrap();
        assert_eq!(backend.base(), "http://localhost:19193/api/v1/data");
        assert_eq!(
            backend.url("assets/a-1"),
            "http://localhost:19193/api/v1/data/assets/a-1"
        );
    }

    #[test]
    fn test_record_ids_are_escaped() {
        let backend = HttpBackend::new(&config("http://h/api")).unwrap();
        let url = backend.url(&HttpBackend::record_url("assets", "a?b/../c #d"));
        assert_eq!(url, "http://h/api/assets/a%3Fb%2F..%2Fc%20%23d");
        assert!(!url.contains('?'));
        assert_eq!(
            HttpBackend::record_url("policydefinitions", "open-policy"),
            "policydefinitions/open-policy"
        );
    }

    #[test]
    fn test_rejects_non_http_address() {
        let err = HttpBackend::new(&config("localhost:19193")).err().unwrap();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_parse_api_errors_list() {
        let errors = parse_api_errors(
            r#"[{"message":"must not be blank","type":"ValidationFailure","path":"id"}]"#,
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.as_deref(), Some("id"));
    }

    #[test]
    fn test_parse_api_errors_fallbacks() {
        let single = parse_api_errors(r#"{"message":"conflict"}"#);
        assert_eq!(single[0].message, "conflict");

        let text = parse_api_errors("Internal Server Error\n");
        assert_eq!(text[0].message, "Internal Server Error");

        assert!(parse_api_errors("  ").is_empty());
    }

    #[test]
    fn test_unreadable_error_body_is_reported() {
        let errors = error_body(Err::<String, _>("connection reset"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "failed to read error body: connection reset");

        let errors = error_body(Ok::<_, String>(r#"{"message":"conflict"}"#.to_string()));
        assert_eq!(errors[0].message, "conflict");
    }

    #[test]
    fn test_unreachable_connector_is_transport_error() {
        // Port 9 (discard) on localhost is assumed closed.
        let backend = HttpBackend::new(
            &config("http://127.0.0.1:9").timeout(std::time::Duration::from_secs(2)),
        )
        .unwrap();
        let err = backend.get_asset("a-1").unwrap_err();
        assert!(err.is_retryable());
    }
}
