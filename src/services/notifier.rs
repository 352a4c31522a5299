// src/services/notifier.rs

//! Slot notifications.
//!
//! Renders newly found slots into a single Slack message and delivers it.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{SlackConfig, Slot};

/// Header line of every slot message.
pub const SLOT_HEADER: &str = "*New appointment timeslots found!*";

/// Destination for notification text.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

/// A rendered slot message and the per-type counts it consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    /// Number of slots numbered per appointment type
    pub increments: HashMap<String, usize>,
}

/// Render new slots into one message.
///
/// Slots are numbered per appointment type, continuing from `counts`.
/// `counts` itself is left untouched; apply `Rendered::increments` afterwards.
pub fn render(new_slots: &BTreeMap<String, Slot>, counts: &HashMap<String, usize>) -> Rendered {
    let mut increments: HashMap<String, usize> = HashMap::new();
    let mut blocks = Vec::with_capacity(new_slots.len());

    for slot in new_slots.values() {
        let added = increments.entry(slot.appointment_type.clone()).or_default();
        *added += 1;
        let number = counts.get(&slot.appointment_type).copied().unwrap_or(0) + *added;
        blocks.push(render_slot(number, slot));
    }

    Rendered {
        text: format!("{}\n\n{}", SLOT_HEADER, blocks.join("\n\n")),
        increments,
    }
}

fn render_slot(number: usize, slot: &Slot) -> String {
    format!(
        "{} slot #{}:\n\tlink: <{}|URL>\n\tdate: {}\n\ttime: {}\n\tlocation: {}",
        slot.appointment_type,
        number,
        slot.url,
        slot.date,
        slot.display_time(),
        slot.location
    )
}

/// Message sent when a booking page has no results container.
pub fn render_outage(page_url: &str, pause: Duration) -> String {
    format!(
        "*Appointment site looks down.* No timeslots container at <{}|URL>. \
         Pausing for {} before retrying.",
        page_url,
        format_pause(pause)
    )
}

/// Whole minutes when the pause is at least a minute (rounded up), else seconds.
fn format_pause(pause: Duration) -> String {
    let secs = pause.as_secs();
    if secs < 60 {
        format!("{secs} second(s)")
    } else {
        format!("{} minute(s)", secs.div_ceil(60))
    }
}

/// Deliver a message, logging instead of propagating failures.
///
/// Returns whether delivery succeeded.
pub async fn deliver(notifier: &dyn Notifier, text: &str) -> bool {
    match notifier.send(text).await {
        Ok(()) => true,
        Err(e) => {
            log::error!("Failed to deliver notification: {}", e);
            false
        }
    }
}

/// Posts messages with the Slack Web API `chat.postMessage` method.
pub struct SlackNotifier {
    client: reqwest::Client,
    endpoint: String,
    bot_token: String,
    channel_id: String,
}

#[derive(Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackNotifier {
    /// Build a notifier from config. Token and channel are required.
    pub fn from_config(config: &SlackConfig, client: reqwest::Client) -> Result<Self> {
        let bot_token = required(config.bot_token.as_deref(), "slack.bot_token")?;
        let channel_id = required(config.channel_id.as_deref(), "slack.channel_id")?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat.postMessage", config.api_base.trim_end_matches('/')),
            bot_token,
            channel_id,
        })
    }
}

fn required(value: Option<&str>, key: &str) -> Result<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::config(format!("{key} is not set")))
}

/// Turn an `"ok": false` reply into an error carrying Slack's error code.
fn check(response: SlackResponse) -> Result<()> {
    if response.ok {
        return Ok(());
    }
    Err(AppError::notify(
        response.error.unwrap_or_else(|| "unknown_error".to_string()),
    ))
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let body = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.bot_token)
            .json(&PostMessage {
                channel: &self.channel_id,
                text,
            })
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        check(serde_json::from_str(&body)?)?;
        log::debug!("Posted {} byte(s) to Slack channel {}", text.len(), self.channel_id);
        Ok(())
    }
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        log::info!("[dry-run] Notification:\n{}", text);
        Ok(())
    }
}
