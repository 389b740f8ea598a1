//! Field- and record-level extraction from a rendered results page.
//!
//! Extraction is best-effort at every level: a field that cannot be read
//! becomes the empty string, a card without a title is skipped, and a page
//! that cannot be loaded yields no records for its source.

use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::AppError;
use crate::models::{JobField, JobRecord, ScrapeQuery};
use crate::source::{FieldRule, SourceRule, ValueSource};
use crate::traits::Session;

/// Result of reading one field. `ok` is false on any miss, in which case
/// `value` is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    pub value: String,
    pub ok: bool,
}

impl FieldValue {
    fn hit(value: String) -> Self {
        if value.is_empty() {
            return Self::miss();
        }
        Self { value, ok: true }
    }

    fn miss() -> Self {
        Self {
            value: String::new(),
            ok: false,
        }
    }
}

/// A [`FieldRule`] with its selector compiled once per page.
pub struct FieldExtractor<'r> {
    rule: &'r FieldRule,
    selector: Option<Selector>,
}

impl<'r> FieldExtractor<'r> {
    pub fn new(rule: &'r FieldRule) -> Self {
        let selector = Selector::parse(&rule.selector).ok();
        if selector.is_none() {
            tracing::debug!(selector = %rule.selector, "Unparseable field selector");
        }
        Self { rule, selector }
    }

    /// Read the field from `card`. Never fails; a miss is `("", false)`.
    pub fn extract(&self, card: ElementRef<'_>, page_url: Option<&Url>) -> FieldValue {
        let Some(selector) = &self.selector else {
            return FieldValue::miss();
        };
        let Some(element) = card.select(selector).next() else {
            return FieldValue::miss();
        };

        let raw = match &self.rule.value {
            ValueSource::Text => element_text(element),
            ValueSource::Attr(name) => match element.value().attr(name) {
                Some(v) => v.trim().to_string(),
                None => return FieldValue::miss(),
            },
            ValueSource::AttrOrText(name) => element
                .value()
                .attr(name)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .unwrap_or_else(|| element_text(element)),
        };

        if self.rule.strip_query || self.rule.resolve_relative {
            FieldValue::hit(normalize_url(&raw, self.rule, page_url))
        } else {
            FieldValue::hit(raw)
        }
    }
}

/// Read one field from `card` with a freshly compiled selector.
///
/// [`parse_cards`] compiles each rule once per page instead.
pub fn extract_field(card: ElementRef<'_>, rule: &FieldRule, page_url: Option<&Url>) -> FieldValue {
    FieldExtractor::new(rule).extract(card, page_url)
}

/// Text content with whitespace runs collapsed and the ends trimmed.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize_url(raw: &str, rule: &FieldRule, page_url: Option<&Url>) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let parsed = match (rule.resolve_relative, page_url) {
        (true, Some(base)) => base.join(raw).ok(),
        _ => Url::parse(raw).ok(),
    };
    match parsed {
        Some(mut url) => {
            if rule.strip_query {
                url.set_query(None);
                url.set_fragment(None);
            }
            url.to_string()
        }
        None if rule.strip_query => raw.split(['?', '#']).next().unwrap_or_default().to_string(),
        None => raw.to_string(),
    }
}

/// Parse a results page into records.
///
/// Takes at most `max_results` cards in document order, then drops cards
/// whose title came out empty. Fails only if the card selector is invalid.
pub fn parse_cards(
    html: &str,
    rule: &SourceRule,
    page_url: &str,
    max_results: usize,
) -> Result<Vec<JobRecord>, AppError> {
    let card_selector = Selector::parse(&rule.card_selector).map_err(|e| {
        AppError::SelectorError(format!("card selector '{}': {e}", rule.card_selector))
    })?;
    let page_url = Url::parse(page_url).ok();
    let fields: Vec<(JobField, FieldExtractor<'_>)> = rule
        .fields
        .iter()
        .map(|(field, r)| (*field, FieldExtractor::new(r)))
        .collect();

    let document = Html::parse_document(html);
    let mut records = Vec::new();
    let mut dropped = 0usize;

    for card in document.select(&card_selector).take(max_results) {
        let mut builder = JobRecord::builder(&rule.id);
        for (field, extractor) in &fields {
            let value = extractor.extract(card, page_url.as_ref());
            if value.ok {
                builder.set(*field, value.value);
            }
        }
        match builder.build() {
            Some(record) => records.push(record),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::debug!(source = %rule.id, dropped, "Skipped cards without a title");
    }
    Ok(records)
}

/// Fixed page-loading heuristic: settle, then scroll a few times.
///
/// This does not detect when lazy loading has finished; slow sites may
/// return fewer cards than they hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPolicy {
    pub settle_delay: Duration,
    pub scroll_steps: u32,
    pub scroll_pause: Duration,
}

impl LoadPolicy {
    /// Same scroll count, no waiting. For stubs and static pages.
    pub fn immediate() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            scroll_pause: Duration::ZERO,
            ..Self::default()
        }
    }
}

impl Default for LoadPolicy {
    /// 3 s settle, then three scrolls one second apart.
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(3),
            scroll_steps: 3,
            scroll_pause: Duration::from_secs(1),
        }
    }
}

/// Drives a session through one source's results page.
#[derive(Debug, Clone, Default)]
pub struct RecordExtractor {
    policy: LoadPolicy,
}

impl RecordExtractor {
    pub fn new(policy: LoadPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &LoadPolicy {
        &self.policy
    }

    /// Extract the records for `query` from `rule`'s site.
    ///
    /// Never fails: a navigation or selector failure is logged and the
    /// source contributes no records.
    pub async fn extract<S: Session>(
        &self,
        session: &mut S,
        rule: &SourceRule,
        query: &ScrapeQuery,
    ) -> Vec<JobRecord> {
        match self.try_extract(session, rule, query).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(source = %rule.id, error = %e, "Source extraction failed");
                Vec::new()
            }
        }
    }

    /// Fallible form of [`extract`](Self::extract).
    pub async fn try_extract<S: Session>(
        &self,
        session: &mut S,
        rule: &SourceRule,
        query: &ScrapeQuery,
    ) -> Result<Vec<JobRecord>, AppError> {
        let url = rule.url.build(query.title(), query.location())?;
        tracing::info!(source = %rule.id, %url, "Navigating");
        session.navigate(&url).await?;

        tokio::time::sleep(self.policy.settle_delay).await;
        for _ in 0..self.policy.scroll_steps {
            session.scroll_by(rule.scroll_px).await?;
            tokio::time::sleep(self.policy.scroll_pause).await;
        }

        let html = session.content().await?;
        tracing::debug!(source = %rule.id, bytes = html.len(), "Read rendered page");

        let records = parse_cards(&html, rule, &url, query.max_results())?;
        tracing::info!(source = %rule.id, found = records.len(), "Extracted records");
        Ok(records)
    }
}
