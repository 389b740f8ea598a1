//! Static per-source extraction rules.
//!
//! A [`SourceRule`] says where a site's search page lives, which elements
//! are job cards, and how to read each [`JobField`] out of a card. Rules are
//! plain data: the built-in set covers LinkedIn, Naukri and Indeed, and more
//! can be loaded from a JSON file at start-up (see
//! [`SourceRegistry::load_file`]).

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use scraper::Selector;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AppError;
use crate::models::{JobField, Platform};

const DEFAULT_SCROLL_PX: u32 = 600;

/// How to build a search URL from a title and a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UrlTemplate {
    /// `base?{title_param}={title}&{location_param}={location}`, form-encoded.
    Query {
        base: String,
        title_param: String,
        location_param: String,
    },
    /// `pattern` with `{title}` and `{location}` replaced by lowercase,
    /// hyphen-separated slugs.
    Slug { pattern: String },
}

impl UrlTemplate {
    pub fn build(&self, title: &str, location: &str) -> Result<String, AppError> {
        match self {
            UrlTemplate::Query {
                base,
                title_param,
                location_param,
            } => {
                let url = Url::parse_with_params(
                    base,
                    [(title_param.as_str(), title), (location_param.as_str(), location)],
                )
                .map_err(|e| AppError::ConfigError(format!("Invalid base URL '{base}': {e}")))?;
                Ok(url.to_string())
            }
            UrlTemplate::Slug { pattern } => {
                let url = pattern
                    .replace("{title}", &slugify(title))
                    .replace("{location}", &slugify(location));
                Url::parse(&url)
                    .map_err(|e| AppError::ConfigError(format!("Invalid URL '{url}': {e}")))?;
                Ok(url)
            }
        }
    }
}

fn slugify(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Where a field's value comes from once its element is found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// The element's text content.
    #[default]
    Text,
    /// The named attribute.
    Attr(String),
    /// The named attribute if present and non-blank, else the text.
    AttrOrText(String),
}

/// Extraction rule for one field of a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    /// CSS selector, evaluated against the card's descendants.
    pub selector: String,
    #[serde(default)]
    pub value: ValueSource,
    /// Drop query string and fragment from the extracted URL.
    #[serde(default)]
    pub strip_query: bool,
    /// Resolve a relative URL against the page URL.
    #[serde(default)]
    pub resolve_relative: bool,
}

impl FieldRule {
    pub fn text(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            value: ValueSource::Text,
            strip_query: false,
            resolve_relative: false,
        }
    }

    pub fn attr(selector: impl Into<String>, attr: impl Into<String>) -> Self {
        Self {
            value: ValueSource::Attr(attr.into()),
            ..Self::text(selector)
        }
    }

    pub fn attr_or_text(selector: impl Into<String>, attr: impl Into<String>) -> Self {
        Self {
            value: ValueSource::AttrOrText(attr.into()),
            ..Self::text(selector)
        }
    }

    pub fn strip_query(mut self) -> Self {
        self.strip_query = true;
        self
    }

    pub fn resolve_relative(mut self) -> Self {
        self.resolve_relative = true;
        self
    }
}

fn default_scroll_px() -> u32 {
    DEFAULT_SCROLL_PX
}

/// Everything needed to scrape one job site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRule {
    /// Identifier used as `platform` in queries and `source` in records.
    pub id: String,
    pub url: UrlTemplate,
    /// Selector matching one element per job card.
    pub card_selector: String,
    pub fields: BTreeMap<JobField, FieldRule>,
    /// Pixels per scroll step while waiting for lazy-loaded cards.
    #[serde(default = "default_scroll_px")]
    pub scroll_px: u32,
}

impl SourceRule {
    pub fn new(id: impl Into<String>, url: UrlTemplate, card_selector: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url,
            card_selector: card_selector.into(),
            fields: BTreeMap::new(),
            scroll_px: DEFAULT_SCROLL_PX,
        }
    }

    pub fn field(mut self, field: JobField, rule: FieldRule) -> Self {
        self.fields.insert(field, rule);
        self
    }

    pub fn scroll_px(mut self, px: u32) -> Self {
        self.scroll_px = px;
        self
    }

    /// Check the rule is usable: lowercase id, parseable selectors,
    /// a title rule, and a URL template that builds.
    pub fn validate(&self) -> Result<(), AppError> {
        let invalid = |msg: String| AppError::ConfigError(format!("source '{}': {msg}", self.id));

        if self.id.is_empty() || self.id == "all" || self.id != self.id.to_lowercase() {
            return Err(invalid(
                "id must be a non-empty lowercase name other than 'all'".into(),
            ));
        }
        Selector::parse(&self.card_selector)
            .map_err(|e| invalid(format!("bad card selector '{}': {e}", self.card_selector)))?;
        if !self.fields.contains_key(&JobField::Title) {
            return Err(invalid("a title rule is required".into()));
        }
        for (field, rule) in &self.fields {
            Selector::parse(&rule.selector)
                .map_err(|e| invalid(format!("bad {field} selector '{}': {e}", rule.selector)))?;
        }
        self.url
            .build("software engineer", "new york")
            .map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }
}

/// Built-in LinkedIn public job search rules.
pub fn linkedin() -> SourceRule {
    SourceRule::new(
        "linkedin",
        UrlTemplate::Query {
            base: "https://www.linkedin.com/jobs/search/".into(),
            title_param: "keywords".into(),
            location_param: "location".into(),
        },
        ".base-card",
    )
    .field(JobField::Title, FieldRule::text(".base-search-card__title"))
    .field(JobField::Company, FieldRule::text(".base-search-card__subtitle"))
    .field(JobField::Location, FieldRule::text(".job-search-card__location"))
    .field(
        JobField::Url,
        FieldRule::attr("a.base-card__full-link", "href").strip_query(),
    )
    .field(JobField::Posted, FieldRule::attr_or_text("time", "datetime"))
    .scroll_px(800)
}

/// Built-in Naukri search rules.
pub fn naukri() -> SourceRule {
    SourceRule::new(
        "naukri",
        UrlTemplate::Slug {
            pattern: "https://www.naukri.com/{title}-jobs-in-{location}".into(),
        },
        ".srp-jobtuple-wrapper, .jobTuple",
    )
    .field(JobField::Title, FieldRule::text(".title, a.title"))
    .field(
        JobField::Url,
        FieldRule::attr(".title, a.title", "href").resolve_relative(),
    )
    .field(JobField::Company, FieldRule::text(".comp-name, .subTitle a"))
    .field(JobField::Location, FieldRule::text(".locWdth, .loc-wrap .loc"))
    .field(
        JobField::Experience,
        FieldRule::text(".exp-wrap .expwdth, .experience"),
    )
    .field(JobField::Salary, FieldRule::text(".sal-wrap .salwdth, .salary"))
}

/// Built-in Indeed search rules.
pub fn indeed() -> SourceRule {
    SourceRule::new(
        "indeed",
        UrlTemplate::Query {
            base: "https://www.indeed.com/jobs".into(),
            title_param: "q".into(),
            location_param: "l".into(),
        },
        ".job_seen_beacon, .resultContent",
    )
    .field(JobField::Title, FieldRule::text("h2.jobTitle a, .jobTitle span"))
    .field(
        JobField::Company,
        FieldRule::text("[data-testid='company-name'], .companyName"),
    )
    .field(
        JobField::Location,
        FieldRule::text("[data-testid='text-location'], .companyLocation"),
    )
    .field(
        JobField::Url,
        FieldRule::attr("h2.jobTitle a, a.jcs-JobTitle", "href").resolve_relative(),
    )
}

/// The set of configured sources, in a stable order.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    rules: Vec<Arc<SourceRule>>,
}

impl SourceRegistry {
    /// LinkedIn, Naukri and Indeed.
    pub fn builtin() -> Self {
        Self {
            rules: vec![Arc::new(linkedin()), Arc::new(naukri()), Arc::new(indeed())],
        }
    }

    /// Build a registry from explicit rules. Ids must be unique.
    pub fn from_rules(rules: Vec<SourceRule>) -> Result<Self, AppError> {
        let mut registry = Self { rules: Vec::new() };
        for rule in rules {
            rule.validate()?;
            if registry.get(&rule.id).is_some() {
                return Err(AppError::ConfigError(format!(
                    "duplicate source id '{}'",
                    rule.id
                )));
            }
            registry.rules.push(Arc::new(rule));
        }
        Ok(registry)
    }

    /// Built-in sources merged with rules from a JSON file.
    ///
    /// The file holds an array of rules; a rule whose id matches a built-in
    /// source replaces it, any other rule is appended.
    pub fn load_file(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!(
                "Failed to read sources file {}: {e}",
                path.display()
            ))
        })?;
        let extra: Vec<SourceRule> = serde_json::from_str(&raw).map_err(|e| {
            AppError::ConfigError(format!(
                "Invalid JSON in sources file {}: {e}",
                path.display()
            ))
        })?;

        let mut registry = Self::builtin();
        for rule in extra {
            rule.validate()?;
            let rule = Arc::new(rule);
            match registry.rules.iter_mut().find(|r| r.id == rule.id) {
                Some(slot) => {
                    tracing::info!(source = %rule.id, "Overriding built-in source rules");
                    *slot = rule;
                }
                None => registry.rules.push(rule),
            }
        }
        Ok(registry)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<SourceRule>> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The rules a platform selects. Unknown ids select nothing.
    pub fn resolve(&self, platform: &Platform) -> Vec<Arc<SourceRule>> {
        match platform {
            Platform::All => self.rules.clone(),
            Platform::Source(id) => self.get(id).cloned().into_iter().collect(),
        }
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn builtin_rules_are_valid() {
        let registry = SourceRegistry::builtin();
        assert_eq!(registry.ids(), vec!["linkedin", "naukri", "indeed"]);
        for id in registry.ids() {
            registry.get(id).unwrap().validate().unwrap();
        }
    }

    #[test]
    fn query_template_form_encodes() {
        let url = linkedin().url.build("AI Developer", "Bangalore").unwrap();
        assert_eq!(
            url,
            "https://www.linkedin.com/jobs/search/?keywords=AI+Developer&location=Bangalore"
        );

        let url = indeed().url.build("C++ Dev", "São Paulo").unwrap();
        assert!(url.starts_with("https://www.indeed.com/jobs?q=C%2B%2B+Dev&l="));
    }

    #[test]
    fn slug_template_hyphenates() {
        let url = naukri().url.build("React  Engineer", "New Delhi").unwrap();
        assert_eq!(url, "https://www.naukri.com/react-engineer-jobs-in-new-delhi");
    }

    #[test]
    fn resolve_platform() {
        let registry = SourceRegistry::builtin();
        assert_eq!(registry.resolve(&Platform::All).len(), 3);

        let one = registry.resolve(&Platform::Source("naukri".into()));
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].id, "naukri");

        assert!(registry.resolve(&Platform::Source("monster".into())).is_empty());
    }

    #[test]
    fn validate_rejects_bad_selector_and_missing_title() {
        let rule = SourceRule::new(
            "broken",
            UrlTemplate::Slug {
                pattern: "https://example.com/{title}/{location}".into(),
            },
            "div[[",
        )
        .field(JobField::Title, FieldRule::text("h2"));
        assert!(matches!(rule.validate(), Err(AppError::ConfigError(_))));

        let rule = SourceRule::new(
            "notitle",
            UrlTemplate::Slug {
                pattern: "https://example.com/{title}/{location}".into(),
            },
            ".card",
        );
        let err = rule.validate().unwrap_err();
        assert!(err.to_string().contains("title rule is required"));
    }

    #[test]
    fn from_rules_rejects_duplicates() {
        let err = SourceRegistry::from_rules(vec![linkedin(), linkedin()]).unwrap_err();
        assert!(err.to_string().contains("duplicate source id"));
    }

    #[test]
    fn load_file_overrides_and_appends() {
        let json = serde_json::json!([
            {
                "id": "linkedin",
                "url": {
                    "kind": "query",
                    "base": "https://www.linkedin.com/jobs/search/",
                    "title_param": "keywords",
                    "location_param": "location"
                },
                "card_selector": "li.job",
                "fields": { "title": { "selector": "h3" } }
            },
            {
                "id": "remoteboard",
                "url": { "kind": "slug", "pattern": "https://remote.example/{title}?where={location}" },
                "card_selector": ".posting",
                "fields": {
                    "title": { "selector": ".role" },
                    "url": { "selector": "a", "value": { "attr": "href" }, "resolve_relative": true }
                },
                "scroll_px": 400
            }
        ]);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{json}").unwrap();

        let registry = SourceRegistry::load_file(file.path()).unwrap();
        assert_eq!(registry.ids(), vec!["linkedin", "naukri", "indeed", "remoteboard"]);
        assert_eq!(registry.get("linkedin").unwrap().card_selector, "li.job");

        let extra = registry.get("remoteboard").unwrap();
        assert_eq!(extra.scroll_px, 400);
        assert_eq!(
            extra.fields[&JobField::Url].value,
            ValueSource::Attr("href".into())
        );
        assert_eq!(extra.fields[&JobField::Title].value, ValueSource::Text);
    }

    #[test]
    fn load_file_reports_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = SourceRegistry::load_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON in sources file"));
    }
}
