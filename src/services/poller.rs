// src/services/poller.rs

//! Slot poller service.
//!
//! Fetches one booking page per target and extracts the bookable slot links
//! from its `#timeslots` container.

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{PollTarget, PollingConfig, Slot};
use crate::utils::http;
use crate::utils::url::{last_two_segments, resolve};

/// Selector for the results container on a booking page.
pub const TIMESLOT_CONTAINER: &str = "#timeslots";

/// Source of booking page HTML.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page body at `url`. Network errors and non-2xx responses
    /// are returned as errors.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// `PageSource` backed by a `reqwest` client.
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(config: &PollingConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_async_client(config)?,
        })
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        http::fetch_text(&self.client, url).await
    }
}

/// Result of polling a single target.
#[derive(Debug)]
pub enum PollOutcome {
    /// Page loaded and the results container was present
    Slots(Vec<Slot>),
    /// The request failed; skip this target for the cycle
    Unreachable(AppError),
    /// Page loaded without a results container; the portal is likely down
    Outage,
}

/// Service for polling booking pages.
pub struct SlotPoller {
    source: Box<dyn PageSource>,
    portal_base: String,
}

impl SlotPoller {
    /// Create a poller reading pages from `source`.
    pub fn new(source: Box<dyn PageSource>, portal_base: impl Into<String>) -> Self {
        Self {
            source,
            portal_base: portal_base.into(),
        }
    }

    pub fn portal_base(&self) -> &str {
        &self.portal_base
    }

    /// Poll a single target.
    pub async fn poll_target(&self, target: &PollTarget) -> PollOutcome {
        let url = target.url(&self.portal_base);
        log::debug!("Polling {} ({})", target, url);

        let html = match self.source.fetch(&url).await {
            Ok(html) => html,
            Err(error) => {
                log::warn!("Failed to request {}, skipping: {}", url, error);
                return PollOutcome::Unreachable(error);
            }
        };

        match parse_timeslots(&html, target, &self.portal_base) {
            Some(slots) => {
                log::debug!("{}: {} slot(s) listed", target, slots.len());
                PollOutcome::Slots(slots)
            }
            None => {
                log::error!("No timeslot container at {}; the site may be down", url);
                PollOutcome::Outage
            }
        }
    }

    /// Lazily poll every target in order, one request at a time.
    pub fn poll<'a>(
        &'a self,
        targets: &'a [PollTarget],
    ) -> impl Stream<Item = (&'a PollTarget, PollOutcome)> + 'a {
        stream::iter(targets).then(move |target| async move {
            let outcome = self.poll_target(target).await;
            (target, outcome)
        })
    }
}

/// Extract slots from a booking page.
///
/// Returns `None` when the results container is missing. Every anchor that is
/// a direct child of the container counts; the last two path segments of its
/// `href` are taken as date and time, whatever their shape.
pub fn parse_timeslots(html: &str, target: &PollTarget, portal_base: &str) -> Option<Vec<Slot>> {
    let document = Html::parse_document(html);
    let container_sel = parse_selector(TIMESLOT_CONTAINER).ok()?;
    let container = document.select(&container_sel).next()?;

    let slots = container
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name().eq_ignore_ascii_case("a"))
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| {
            let url = resolve(portal_base, href);
            let Some((date, time)) = last_two_segments(&url) else {
                log::warn!("{}: ignoring slot link without date/time segments: {}", target, href);
                return None;
            };
            Some(Slot {
                url,
                appointment_type: target.appointment_type.to_string(),
                location: target.location.to_string(),
                date,
                time,
            })
        })
        .collect();

    Some(slots)
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
