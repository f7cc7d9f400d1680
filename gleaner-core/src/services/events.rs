use anyhow::{Context as _, Result};
use gleaner_webdriver::{Capabilities, Locator, Session, WebDriver, WebDriverBackend};

use crate::models;

pub const EVENT_LIST_XPATH: &str = r#"//ul[contains(@class, "list-recent-events")]/li"#;
pub const EVENT_LOCATION_XPATH: &str = r#"p/span[@class="event-location"]"#;
pub const EVENT_TIME_XPATH: &str = "p/time";

/// Open a browser session, read every event listed on `url` and close the
/// session again.
///
/// The session is ended even when extraction fails. Extraction errors take
/// precedence over errors from ending the session.
#[tracing::instrument(skip(driver, capabilities))]
pub async fn upcoming_events<Backend: WebDriverBackend>(
    driver: WebDriver<Backend>,
    capabilities: &Capabilities,
    url: &str,
) -> Result<Vec<models::Event>> {
    let mut session = driver
        .new_session(capabilities)
        .await
        .context("starting browser session")?;

    let events = read_events(&mut session, url).await;
    let quit = session.quit().await;

    let events = events?;
    quit.context("ending browser session")?;

    tracing::info!("found {} events", events.len());

    Ok(events)
}

async fn read_events<Backend: WebDriverBackend>(
    session: &mut Session<Backend>,
    url: &str,
) -> Result<Vec<models::Event>> {
    session.goto(url).await?;

    let items = session
        .find_elements(Locator::xpath(EVENT_LIST_XPATH))
        .await?;

    let mut events = Vec::with_capacity(items.len());

    for item in &items {
        let location = session
            .find_element_from(item, Locator::xpath(EVENT_LOCATION_XPATH))
            .await?;
        let location = session.element_text(&location).await?;

        let time = session
            .find_element_from(item, Locator::xpath(EVENT_TIME_XPATH))
            .await?;
        let time = session.element_text(&time).await?;

        let event = models::Event { location, time };
        tracing::debug!(?event, "read event");
        events.push(event);
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gleaner_webdriver::{testing::ScriptedBackend, Browser, ELEMENT_KEY};
    use serde_json::json;

    const SERVER: &str = "http://localhost:4444";
    const PAGE: &str = "https://www.python.org/events/python-events/";

    fn driver(backend: &ScriptedBackend) -> WebDriver<ScriptedBackend> {
        WebDriver::new(backend.clone(), SERVER)
    }

    fn capabilities() -> Capabilities {
        Capabilities::new(Browser::Edge)
    }

    #[tokio::test]
    async fn reads_events_in_order() {
        let backend = ScriptedBackend::new();
        backend
            .respond_ok(json!({ "sessionId": "s1", "capabilities": {} }))
            .respond_ok(json!(null))
            .respond_ok(json!([{ ELEMENT_KEY: "li1" }, { ELEMENT_KEY: "li2" }]))
            .respond_ok(json!({ ELEMENT_KEY: "loc1" }))
            .respond_ok(json!("Lisbon, Portugal"))
            .respond_ok(json!({ ELEMENT_KEY: "time1" }))
            .respond_ok(json!("05 Nov. – 07 Nov. 2026"))
            .respond_ok(json!({ ELEMENT_KEY: "loc2" }))
            .respond_ok(json!("Online"))
            .respond_ok(json!({ ELEMENT_KEY: "time2" }))
            .respond_ok(json!("12 Nov. 2026"))
            .respond_ok(json!(null));

        let events = upcoming_events(driver(&backend), &capabilities(), PAGE)
            .await
            .unwrap();

        assert_eq!(
            events,
            vec![
                models::Event {
                    location: "Lisbon, Portugal".into(),
                    time: "05 Nov. – 07 Nov. 2026".into(),
                },
                models::Event {
                    location: "Online".into(),
                    time: "12 Nov. 2026".into(),
                },
            ]
        );

        let requests = backend.requests();
        assert_eq!(requests.len(), 12);
        assert_eq!(requests[1].body, Some(json!({ "url": PAGE })));
        assert_eq!(
            requests[2].body,
            Some(json!({ "using": "xpath", "value": EVENT_LIST_XPATH }))
        );
        assert_eq!(
            requests[3].url,
            "http://localhost:4444/session/s1/element/li1/element"
        );
        assert_eq!(
            requests[3].body,
            Some(json!({ "using": "xpath", "value": EVENT_LOCATION_XPATH }))
        );
        assert_eq!(
            requests[5].body,
            Some(json!({ "using": "xpath", "value": EVENT_TIME_XPATH }))
        );
        assert_eq!(requests[11].method, http::Method::DELETE);
    }

    #[tokio::test]
    async fn empty_listing() {
        let backend = ScriptedBackend::new();
        backend
            .respond_ok(json!({ "sessionId": "s1", "capabilities": {} }))
            .respond_ok(json!(null))
            .respond_ok(json!([]))
            .respond_ok(json!(null));

        let events = upcoming_events(driver(&backend), &capabilities(), PAGE)
            .await
            .unwrap();

        assert!(events.is_empty());
        assert_eq!(backend.requests().len(), 4);
    }

    #[tokio::test]
    async fn missing_field_still_ends_session() {
        let backend = ScriptedBackend::new();
        backend
            .respond_ok(json!({ "sessionId": "s1", "capabilities": {} }))
            .respond_ok(json!(null))
            .respond_ok(json!([{ ELEMENT_KEY: "li1" }]))
            .respond_error(
                http::StatusCode::NOT_FOUND,
                "no such element",
                "Unable to locate element",
            )
            .respond_ok(json!(null));

        let err = upcoming_events(driver(&backend), &capabilities(), PAGE)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no such element"));

        let requests = backend.requests();
        assert_eq!(requests.len(), 5);
        assert_eq!(requests[4].method, http::Method::DELETE);
        assert_eq!(requests[4].url, "http://localhost:4444/session/s1");
    }

    #[tokio::test]
    async fn session_not_started() {
        let backend = ScriptedBackend::new();
        backend.respond_error(
            http::StatusCode::INTERNAL_SERVER_ERROR,
            "session not created",
            "Microsoft Edge failed to start",
        );

        let err = upcoming_events(driver(&backend), &capabilities(), PAGE)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "starting browser session");
        assert_eq!(backend.requests().len(), 1);
    }

    #[test]
    fn event_json() {
        let event = models::Event {
            location: "Online".into(),
            time: "12 Nov. 2026".into(),
        };

        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"location":"Online","time":"12 Nov. 2026"}"#
        );
    }
}
