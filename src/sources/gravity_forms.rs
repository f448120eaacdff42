//! Gravity Forms entries client
//!
//! Counts form submissions in a date range through the forms REST API
//! (consumer key/secret over HTTP Basic, page-number pagination). Forms are
//! unrelated to each other, so their requests are issued concurrently and
//! awaited together; one form failing never sinks the others.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

use crate::config::{FormConfig, GravityFormsConfig};
use payreport_reports::FormSection;

const PAGE_SIZE: usize = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GravityFormsClient {
    client: reqwest::Client,
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
}

/// Per-form submission activity; `entry_count` is `None` on fetch failure.
pub type FormActivity = FormSection;

#[derive(Debug, Deserialize)]
struct EntriesPage {
    #[serde(default)]
    entries: Vec<serde_json::Value>,
}

impl GravityFormsClient {
    pub fn new(config: &GravityFormsConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| anyhow!("gravity forms client requires a base_url"))?;
        let consumer_key = config
            .consumer_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow!("gravity forms client requires GF_CONSUMER_KEY"))?;
        let consumer_secret = config
            .consumer_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("gravity forms client requires GF_CONSUMER_SECRET"))?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("payreport/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build gravity forms HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            consumer_key: consumer_key.to_string(),
            consumer_secret: consumer_secret.to_string(),
        })
    }

    /// Fetch submission counts for every form, concurrently. Individual
    /// failures are logged and surface as `entry_count: None`.
    pub async fn entry_counts(
        &self,
        forms: &[FormConfig],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<FormActivity> {
        let fetches = forms.iter().map(|form| self.count_entries(form, start, end));
        let results = futures::future::join_all(fetches).await;

        forms
            .iter()
            .zip(results)
            .map(|(form, result)| {
                let entry_count = match result {
                    Ok(count) => Some(count),
                    Err(err) => {
                        log::warn!(
                            "gravity forms: form {} ({}) failed: {:#}",
                            form.id,
                            form.title,
                            err
                        );
                        None
                    }
                };
                FormActivity {
                    form_id: form.id,
                    title: form.title.clone(),
                    entry_count,
                }
            })
            .collect()
    }

    async fn count_entries(
        &self,
        form: &FormConfig,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<usize> {
        let url = format!("{}/wp-json/gf/v2/forms/{}/entries", self.base_url, form.id);
        let search = serde_json::json!({
            "start_date": format!("{} 00:00:00", start),
            "end_date": format!("{} 23:59:59", end),
        })
        .to_string();

        let mut total = 0usize;
        let mut page = 1usize;

        loop {
            log::debug!("gravity forms GET {} page {}", url, page);

            let page_size = PAGE_SIZE.to_string();
            let current_page = page.to_string();
            let response = self
                .client
                .get(&url)
                .basic_auth(&self.consumer_key, Some(&self.consumer_secret))
                .query(&[
                    ("search", search.as_str()),
                    ("paging[page_size]", page_size.as_str()),
                    ("paging[current_page]", current_page.as_str()),
                ])
                .send()
                .await
                .context("gravity forms request failed")?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(anyhow!("gravity forms returned HTTP {}: {}", status, body));
            }

            let entries_page: EntriesPage = response
                .json()
                .await
                .context("failed to parse gravity forms entries page")?;

            let fetched = entries_page.entries.len();
            total += fetched;

            if fetched < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        Ok(total)
    }
}
