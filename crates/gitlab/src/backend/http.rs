//! HTTP backend over GitLab's REST API v4.
//!
//! Requests are blocking and authenticated with a personal, group or
//! project access token sent in the `PRIVATE-TOKEN` header.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{CreateVariableOptions, GroupVariable, UpdateVariableOptions};
use std::time::Duration;
use url::Url;

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://gitlab.com/api/v4";

const USER_AGENT: &str = concat!("glvar/", env!("CARGO_PKG_VERSION"));

/// GitLab REST backend.
///
/// # Example
///
/// ```no_run
/// use gitlab::backend::Backend;
/// use gitlab::backend::http::HttpBackend;
///
/// let backend = HttpBackend::new("https://gitlab.example.com/api/v4", Some("glpat-xxx".into()))
///     .unwrap();
/// let var = backend.get_variable("platform/infra", "DEPLOY_TOKEN").unwrap();
/// println!("protected: {}", var.protected);
/// ```
pub struct HttpBackend {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// API base URL, e.g. `https://gitlab.com/api/v4`.
    base_url: Url,
    /// Access token, if any.
    token: Option<String>,
}

impl HttpBackend {
    /// Create a backend for the given API base URL.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        Self::with_timeout(base_url, token, None)
    }

    /// Create a backend with a global per-request timeout.
    pub fn with_timeout(
        base_url: &str,
        token: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid base URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "base URL {base_url} cannot carry a path"
            )));
        }

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .build()
            .into();

        Ok(Self {
            agent,
            base_url,
            token,
        })
    }

    /// Get the API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Build `<base>/groups/<group>/variables[/<key>]`, encoding each part as
    /// a single path segment (`parent/child` becomes `parent%2Fchild`).
    fn variables_url(&self, group: &str, key: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| Error::Config("base URL cannot carry a path".to_string()))?;
            segments.pop_if_empty().extend(["groups", group, "variables"]);
            if let Some(key) = key {
                segments.push(key);
            }
        }
        Ok(url)
    }

    fn authorize<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        let request = request
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT);
        match &self.token {
            Some(token) => request.header("PRIVATE-TOKEN", token.as_str()),
            None => request,
        }
    }
}

impl Backend for HttpBackend {
    fn create_variable(&self, group: &str, opts: &CreateVariableOptions) -> Result<GroupVariable> {
        let url = self.variables_url(group, None)?;
        log::trace!("POST {url}");

        let variable: GroupVariable = self
            .authorize(self.agent.post(url.as_str()))
            .send_json(opts)?
            .body_mut()
            .read_json()?;

        Ok(variable)
    }

    fn get_variable(&self, group: &str, key: &str) -> Result<GroupVariable> {
        let url = self.variables_url(group, Some(key))?;
        log::trace!("GET {url}");

        let variable: GroupVariable = self
            .authorize(self.agent.get(url.as_str()))
            .call()?
            .body_mut()
            .read_json()?;

        Ok(variable)
    }

    fn update_variable(
        &self,
        group: &str,
        key: &str,
        opts: &UpdateVariableOptions,
    ) -> Result<GroupVariable> {
        let url = self.variables_url(group, Some(key))?;
        log::trace!("PUT {url}");

        let variable: GroupVariable = self
            .authorize(self.agent.put(url.as_str()))
            .send_json(opts)?
            .body_mut()
            .read_json()?;

        Ok(variable)
    }

    fn remove_variable(&self, group: &str, key: &str) -> Result<()> {
        let url = self.variables_url(group, Some(key))?;
        log::trace!("DELETE {url}");

        self.authorize(self.agent.delete(url.as_str())).call()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const BODY: &str = r#"{"variable_type":"env_var","key":"FOO","value":"bar","protected":false,"masked":false,"environment_scope":"*"}"#;

    fn backend(server: &mockito::Server) -> HttpBackend {
        HttpBackend::new(&format!("{}/api/v4", server.url()), Some("t0ken".into())).unwrap()
    }

    #[test]
    fn test_variables_url_encodes_group_path() {
        let backend = HttpBackend::new(DEFAULT_BASE_URL, None).unwrap();
        let url = backend.variables_url("parent/child", Some("FOO")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://gitlab.com/api/v4/groups/parent%2Fchild/variables/FOO"
        );

        let url = backend.variables_url("42", None).unwrap();
        assert_eq!(url.as_str(), "https://gitlab.com/api/v4/groups/42/variables");
    }

    #[test]
    fn test_trailing_slash_in_base_url() {
        let backend = HttpBackend::new("https://gitlab.example.com/api/v4/", None).unwrap();
        let url = backend.variables_url("g", Some("K")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://gitlab.example.com/api/v4/groups/g/variables/K"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpBackend::new("not a url", None).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_create_sends_key_value_protected_only() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/v4/groups/mygroup/variables")
            .match_header("PRIVATE-TOKEN", "t0ken")
            .match_body(Matcher::Json(serde_json::json!({
                "key": "FOO",
                "value": "bar",
                "protected": false
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(BODY)
            .create();

        let var = backend(&server)
            .create_variable(
                "mygroup",
                &CreateVariableOptions {
                    key: "FOO".into(),
                    value: "bar".into(),
                    protected: false,
                },
            )
            .unwrap();

        mock.assert();
        assert_eq!(var.key, "FOO");
    }

    #[test]
    fn test_get_variable() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/api/v4/groups/parent%2Fchild/variables/FOO")
            .match_header("PRIVATE-TOKEN", "t0ken")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(BODY)
            .create();

        let var = backend(&server).get_variable("parent/child", "FOO").unwrap();

        mock.assert();
        assert_eq!(var.value, "bar");
        assert!(!var.protected);
    }

    #[test]
    fn test_get_variable_not_found() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/api/v4/groups/mygroup/variables/NOPE")
            .with_status(404)
            .with_body(r#"{"message":"404 Variable Not Found"}"#)
            .create();

        let err = backend(&server).get_variable("mygroup", "NOPE").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_update_variable() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("PUT", "/api/v4/groups/mygroup/variables/FOO")
            .match_body(Matcher::Json(serde_json::json!({
                "key": "FOO",
                "value": "baz",
                "protected": true
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(BODY.replace("bar", "baz").replace(
                r#""protected":false"#,
                r#""protected":true"#,
            ))
            .create();

        let var = backend(&server)
            .update_variable(
                "mygroup",
                "FOO",
                &UpdateVariableOptions {
                    key: "FOO".into(),
                    value: "baz".into(),
                    protected: true,
                },
            )
            .unwrap();

        mock.assert();
        assert_eq!(var.value, "baz");
        assert!(var.protected);
    }

    #[test]
    fn test_remove_variable() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("DELETE", "/api/v4/groups/mygroup/variables/FOO")
            .with_status(204)
            .create();

        backend(&server).remove_variable("mygroup", "FOO").unwrap();
        mock.assert();
    }

    #[test]
    fn test_server_error_is_retryable() {
        let mut server = mockito::Server::new();
        server
            .mock("DELETE", "/api/v4/groups/mygroup/variables/FOO")
            .with_status(502)
            .create();

        let err = backend(&server).remove_variable("mygroup", "FOO").unwrap_err();
        assert_eq!(err.status_code(), Some(502));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_no_token_sends_no_header() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/api/v4/groups/g/variables/K")
            .match_header("PRIVATE-TOKEN", Matcher::Missing)
            .with_status(401)
            .create();

        let backend = HttpBackend::new(&format!("{}/api/v4", server.url()), None).unwrap();
        let err = backend.get_variable("g", "K").unwrap_err();

        mock.assert();
        assert_eq!(err.status_code(), Some(401));
    }
}
