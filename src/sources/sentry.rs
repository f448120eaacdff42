//! Sentry issue-events client
//!
//! Fetches the event stream of one issue through the paginated event-search
//! API (bearer-token auth, cursor pagination via the `Link` response
//! header) and projects each upstream event down to the minimal record the
//! cache persists.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use payreport_cache::{EventFetcher, Window};
use payreport_core::{resolve_user_id, EventRecord, SourceRef};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::SentryConfig;

const PER_PAGE: usize = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SentryClient {
    client: reqwest::Client,
    base_url: String,
    organization: String,
    tag_keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SentryEvent {
    #[serde(rename = "eventID")]
    event_id: String,

    #[serde(rename = "dateCreated")]
    date_created: DateTime<Utc>,

    #[serde(default)]
    user: Option<SentryUser>,

    #[serde(default)]
    tags: Vec<SentryTag>,
}

#[derive(Debug, Deserialize)]
struct SentryUser {
    id: Option<String>,
    email: Option<String>,
    #[serde(rename = "ipAddress")]
    ip_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentryTag {
    key: String,
    value: String,
}

impl SentryClient {
    pub fn new(config: &SentryConfig) -> Result<Self> {
        let token = config
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow!("sentry client requires SENTRY_TOKEN"))?;
        let organization = config
            .organization
            .as_deref()
            .filter(|o| !o.is_empty())
            .ok_or_else(|| anyhow!("sentry client requires an organization"))?;

        let mut headers = reqwest::header::HeaderMap::new();
        let mut auth: reqwest::header::HeaderValue = format!("Bearer {}", token)
            .parse()
            .context("invalid SENTRY_TOKEN value")?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .user_agent(concat!("payreport/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build sentry HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            organization: organization.to_string(),
            tag_keys: config.tag_keys.clone(),
        })
    }

    fn events_url(&self, issue_id: &str, window: Window) -> String {
        format!(
            "{}/api/0/organizations/{}/issues/{}/events/?start={}T00:00:00&end={}T23:59:59&per_page={}",
            self.base_url, self.organization, issue_id, window.start, window.end, PER_PAGE
        )
    }

    async fn fetch_page(&self, url: &str) -> Result<(Vec<SentryEvent>, Option<String>)> {
        log::debug!("sentry GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("sentry request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("sentry returned HTTP {}: {}", status, body));
        }

        let next = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_next_url);

        let events: Vec<SentryEvent> = response
            .json()
            .await
            .context("failed to parse sentry event page")?;

        Ok((events, next))
    }

    fn to_record(&self, event: SentryEvent) -> EventRecord {
        let user_id = match &event.user {
            Some(user) => resolve_user_id(
                user.id.as_deref(),
                user.email.as_deref(),
                user.ip_address.as_deref(),
            ),
            None => resolve_user_id(None, None, None),
        };

        let tags: BTreeMap<String, String> = event
            .tags
            .into_iter()
            .filter(|t| self.tag_keys.iter().any(|k| k == &t.key))
            .map(|t| (t.key, t.value))
            .collect();

        EventRecord {
            timestamp: event.date_created,
            event_id: event.event_id,
            user_id,
            tags,
        }
    }
}

/// Extract the follow-up URL from a Sentry `Link` header.
///
/// Sentry marks the next page with `rel="next"` and signals whether it is
/// non-empty via `results="true"`.
fn parse_next_url(header: &str) -> Option<String> {
    for part in header.split(',') {
        if !part.contains(r#"rel="next""#) || !part.contains(r#"results="true""#) {
            continue;
        }
        let start = part.find('<')? + 1;
        let end = part.find('>')?;
        if start < end {
            return Some(part[start..end].to_string());
        }
    }
    None
}

#[async_trait]
impl EventFetcher for SentryClient {
    async fn fetch_window(
        &self,
        source: &SourceRef,
        window: Window,
    ) -> Result<Vec<EventRecord>> {
        let mut records = Vec::new();
        let mut url = self.events_url(&source.id, window);

        loop {
            let (events, next) = self.fetch_page(&url).await?;
            records.extend(events.into_iter().map(|e| self.to_record(e)));

            match next {
                Some(next_url) => url = next_url,
                None => break,
            }
        }

        log::info!(
            "sentry issue {}: {} events for {}",
            source.id,
            records.len(),
            window
        );

        Ok(records)
    }
}
