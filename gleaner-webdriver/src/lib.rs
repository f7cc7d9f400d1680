//! A small client for the W3C WebDriver protocol.
//!
//! Only the handful of commands needed to open a page and read text out of it
//! are implemented. The HTTP transport is pluggable through [`WebDriverBackend`],
//! which is implemented for [`reqwest::Client`].

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use std::{fmt, str::FromStr};

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Key used by W3C WebDriver to identify web element references in JSON.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(try_from = "String")]
pub enum Browser {
    Edge,
    Chrome,
    Firefox,
}

impl Browser {
    /// The `browserName` capability understood by the matching driver.
    pub fn name(&self) -> &'static str {
        match self {
            Browser::Edge => "MicrosoftEdge",
            Browser::Chrome => "chrome",
            Browser::Firefox => "firefox",
        }
    }

    fn options_key(&self) -> &'static str {
        match self {
            Browser::Edge => "ms:edgeOptions",
            Browser::Chrome => "goog:chromeOptions",
            Browser::Firefox => "moz:firefoxOptions",
        }
    }
}

impl FromStr for Browser {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "edge" | "msedge" | "microsoftedge" => Ok(Browser::Edge),
            "chrome" | "chromium" => Ok(Browser::Chrome),
            "firefox" => Ok(Browser::Firefox),
            _ => Err(anyhow!("unknown browser: {s}")),
        }
    }
}

impl TryFrom<String> for Browser {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug)]
pub struct Capabilities {
    pub browser: Browser,
    pub arguments: Vec<String>,
}

impl Capabilities {
    pub fn new(browser: Browser) -> Self {
        Capabilities {
            browser,
            arguments: vec![],
        }
    }

    pub fn with_arguments(mut self, arguments: impl IntoIterator<Item = String>) -> Self {
        self.arguments.extend(arguments);
        self
    }

    fn to_json(&self) -> serde_json::Value {
        let mut always_match = serde_json::Map::new();
        always_match.insert("browserName".into(), self.browser.name().into());

        if !self.arguments.is_empty() {
            always_match.insert(
                self.browser.options_key().into(),
                serde_json::json!({ "args": self.arguments }),
            );
        }

        serde_json::json!({ "capabilities": { "alwaysMatch": always_match } })
    }
}

/// Element location strategy and selector.
#[derive(Copy, Clone, Debug, serde::Serialize)]
pub struct Locator<'a> {
    using: &'static str,
    value: &'a str,
}

impl<'a> Locator<'a> {
    pub fn xpath(value: &'a str) -> Self {
        Locator {
            using: "xpath",
            value,
        }
    }

    pub fn css(value: &'a str) -> Self {
        Locator {
            using: "css selector",
            value,
        }
    }
}

/// An opaque reference to an element in the current session's document.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
pub struct ElementRef {
    #[serde(rename = "element-6066-11e4-a52e-4f735466cecf")]
    id: String,
}

impl ElementRef {
    pub fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct WebDriverError {
    pub error: String,
    pub message: String,
    #[serde(default)]
    pub stacktrace: Option<String>,
}

#[derive(serde::Deserialize)]
struct Envelope<T> {
    value: T,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewSession {
    session_id: String,
}

pub struct Response {
    pub status: http::StatusCode,
    pub body: Vec<u8>,
}

impl Response {
    /// Decode the `value` member of a successful response.
    pub fn value<T: DeserializeOwned>(self) -> Result<T> {
        if !self.status.is_success() {
            return Err(self.into());
        }

        let envelope: Envelope<T> = serde_json::from_slice(&self.body)?;
        Ok(envelope.value)
    }
}

impl From<Response> for anyhow::Error {
    fn from(response: Response) -> anyhow::Error {
        match serde_json::from_slice::<Envelope<WebDriverError>>(&response.body) {
            Ok(Envelope { value: error }) => anyhow!(
                "webdriver error ({}) {}: {}",
                response.status,
                error.error,
                error.message
            ),
            Err(_err) => match String::from_utf8(response.body) {
                Ok(body) if !body.is_empty() => {
                    anyhow!("unexpected status ({}): {body}", response.status)
                }
                _ => anyhow!("unexpected status ({})", response.status),
            },
        }
    }
}

#[async_trait::async_trait]
pub trait WebDriverBackend: Send {
    async fn get(&mut self, url: &str) -> Result<Response>;

    async fn post(&mut self, url: &str, body: serde_json::Value) -> Result<Response>;

    async fn delete(&mut self, url: &str) -> Result<Response>;
}

/// A connection to a WebDriver server without an active session.
pub struct WebDriver<Backend> {
    backend: Backend,
    server_url: String,
}

impl<Backend: WebDriverBackend> WebDriver<Backend> {
    pub fn new(backend: Backend, server_url: impl Into<String>) -> WebDriver<Backend> {
        let mut server_url = server_url.into();
        while server_url.ends_with('/') {
            server_url.pop();
        }

        WebDriver {
            backend,
            server_url,
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    #[tracing::instrument(skip(self), fields(server_url = %self.server_url))]
    pub async fn new_session(mut self, capabilities: &Capabilities) -> Result<Session<Backend>> {
        let url = format!("{}/session", self.server_url);
        let session: NewSession = self
            .backend
            .post(&url, capabilities.to_json())
            .await?
            .value()?;

        tracing::debug!("started session {}", session.session_id);

        Ok(Session {
            driver: self,
            session_id: session.session_id,
        })
    }
}

/// A live browser session. Call [`Session::quit`] to release it.
pub struct Session<Backend> {
    driver: WebDriver<Backend>,
    session_id: String,
}

impl<Backend: WebDriverBackend> Session<Backend> {
    pub fn id(&self) -> &str {
        &self.session_id
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/session/{}{}",
            self.driver.server_url, self.session_id, path
        )
    }

    #[tracing::instrument(skip(self))]
    pub async fn goto(&mut self, page_url: &str) -> Result<()> {
        let url = self.url("/url");
        self.driver
            .backend
            .post(&url, serde_json::json!({ "url": page_url }))
            .await?
            .value::<serde_json::Value>()?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_elements(&mut self, locator: Locator<'_>) -> Result<Vec<ElementRef>> {
        let url = self.url("/elements");
        let elements = self
            .driver
            .backend
            .post(&url, serde_json::to_value(locator)?)
            .await?
            .value()?;

        Ok(elements)
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_element_from(
        &mut self,
        parent: &ElementRef,
        locator: Locator<'_>,
    ) -> Result<ElementRef> {
        let url = self.url(&format!("/element/{}/element", parent.id));
        let element = self
            .driver
            .backend
            .post(&url, serde_json::to_value(locator)?)
            .await?
            .value()?;

        Ok(element)
    }

    #[tracing::instrument(skip(self))]
    pub async fn element_text(&mut self, element: &ElementRef) -> Result<String> {
        let url = self.url(&format!("/element/{}/text", element.id));
        let text = self.driver.backend.get(&url).await?.value()?;

        Ok(text)
    }

    /// End the session, handing back the driver connection.
    #[tracing::instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn quit(mut self) -> Result<WebDriver<Backend>> {
        let url = self.url("");
        self.driver
            .backend
            .delete(&url)
            .await?
            .value::<serde_json::Value>()?;

        tracing::debug!("ended session");

        Ok(self.driver)
    }
}

impl Response {
    async fn read(res: reqwest::Response) -> Result<Response> {
        let status = res.status();
        let body = res.bytes().await?.to_vec();

        Ok(Response { status, body })
    }
}

#[async_trait::async_trait]
impl WebDriverBackend for reqwest::Client {
    async fn get(&mut self, url: &str) -> Result<Response> {
        let res = reqwest::Client::get(self, url).send().await?;
        Response::read(res).await
    }

    async fn post(&mut self, url: &str, body: serde_json::Value) -> Result<Response> {
        let res = reqwest::Client::post(self, url).json(&body).send().await?;
        Response::read(res).await
    }

    async fn delete(&mut self, url: &str) -> Result<Response> {
        let res = reqwest::Client::delete(self, url).send().await?;
        Response::read(res).await
    }
}
