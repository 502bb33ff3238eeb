use anyhow::{anyhow, bail, Context};
use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;
use url::Url;

/// Thin HTTP client over the Scout API JSON contract
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    username: Option<String>,
    password: Option<String>,
}

impl ApiClient {
    pub fn new(base: &str, username: Option<String>, password: Option<String>) -> anyhow::Result<Self> {
        let base = Url::parse(base).with_context(|| format!("invalid server URL '{}'", base))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            username,
            password,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("invalid request path '{}'", path))
    }

    pub fn credentials(&self) -> anyhow::Result<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(username), Some(password)) => Ok((username, password)),
            _ => bail!("credentials required: pass --username/--password or set SCOUT_USERNAME/SCOUT_PASSWORD"),
        }
    }

    /// Request carrying `username` / `password` headers
    pub fn authed(&self, method: Method, path: &str) -> anyhow::Result<RequestBuilder> {
        let (username, password) = self.credentials()?;
        Ok(self
            .http
            .request(method, self.url(path)?)
            .header("username", username)
            .header("password", password))
    }

    pub fn public(&self, method: Method, path: &str) -> anyhow::Result<RequestBuilder> {
        Ok(self.http.request(method, self.url(path)?))
    }

    /// Send and decode the JSON body, turning API errors into `anyhow` errors.
    pub async fn send(&self, request: RequestBuilder) -> anyhow::Result<Value> {
        let response = request.send().await.context("request failed")?;
        Self::decode(response).await
    }

    async fn decode(response: Response) -> anyhow::Result<Value> {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(body);
        }

        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("request failed");
        Err(anyhow!("{} ({})", message, status))
    }
}
