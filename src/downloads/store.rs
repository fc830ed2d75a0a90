//! Store-estimate strategy: scrape the download label off a package's public
//! detail page.
//!
//! The page has no API contract, so the text extraction sits behind the
//! [`CountExtractor`] trait. Markup changes only require a new pattern (see
//! `store.pattern` in the config) or a different extractor, never changes to
//! the orchestration.

use super::{CountError, LOG_TARGET};
use crate::config::DEFAULT_STORE_PATTERN;
use crate::http;
use crate::numbers::parse_abbreviated;
use regex::Regex;

/// Pulls the abbreviated download label (e.g. `10K+`) out of a page.
pub trait CountExtractor: Send + Sync {
    fn extract(&self, html: &str) -> Option<String>;
}

/// Extractor driven by a regex whose first capture group is the label.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    pattern: Regex,
}

impl PatternExtractor {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_PATTERN).expect("default store pattern must compile")
    }
}

impl CountExtractor for PatternExtractor {
    fn extract(&self, html: &str) -> Option<String> {
        self.pattern
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// Download estimate from the package store.
pub struct StoreEstimate {
    client: reqwest::Client,
    base_url: String,
    extractor: Box<dyn CountExtractor>,
}

impl StoreEstimate {
    /// `base_url` is the detail page prefix the package identifier is appended to.
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        extractor: Box<dyn CountExtractor>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            extractor,
        }
    }

    /// Detail page URL for a package.
    pub fn page_url(&self, package: &str) -> String {
        format!("{}{}", self.base_url, package)
    }

    /// Fetch the detail page and parse its download label.
    pub async fn downloads(&self, package: &str) -> Result<u64, CountError> {
        let html = http::get_text(&self.client, &self.page_url(package)).await?;
        self.count_from_html(&html)
    }

    /// Parse an already-fetched page.
    pub fn count_from_html(&self, html: &str) -> Result<u64, CountError> {
        let label = self
            .extractor
            .extract(html)
            .ok_or_else(|| CountError::Parse("download label not found".into()))?;
        parse_abbreviated(&label)
            .ok_or_else(|| CountError::Parse(format!("unreadable download label {label:?}")))
    }

    /// [`downloads`](Self::downloads) with failures collapsed to `None`.
    ///
    /// `None` means "no data", not zero downloads.
    pub async fn downloads_or_none(&self, package: &str) -> Option<u64> {
        match self.downloads(package).await {
            Ok(count) => Some(count),
            Err(e) => {
                log::debug!(target: LOG_TARGET, "store estimate for {package} unavailable: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate() -> StoreEstimate {
        StoreEstimate::new(
            reqwest::Client::new(),
            "https://store.example/details?id=",
            Box::new(PatternExtractor::default()),
        )
    }

    struct FixedExtractor(Option<&'static str>);

    impl CountExtractor for FixedExtractor {
        fn extract(&self, _html: &str) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    #[test]
    fn page_url_appends_package() {
        assert_eq!(
            estimate().page_url("de.example.app"),
            "https://store.example/details?id=de.example.app"
        );
    }

    #[test]
    fn pattern_extracts_label_before_downloads() {
        let html = r#"<div class="a"><div class="b">>1.2K</div><div class="x">Downloads</div></div>"#;
        assert_eq!(
            PatternExtractor::default().extract(html),
            Some("1.2K".to_string())
        );
    }

    #[test]
    fn count_from_html_decimal_thousands() {
        let html = r#"<span>>1.2K</div><div class="x">Downloads</div></span>"#;
        assert_eq!(estimate().count_from_html(html), Ok(1200));
    }

    #[test]
    fn count_from_html_plus_label() {
        let html = r#"<div class="ClM7O">10K+</div><div class="g1rdde">Downloads</div>"#;
        assert_eq!(estimate().count_from_html(html), Ok(10_000));
    }

    #[test]
    fn count_from_html_no_match_is_parse_error() {
        let html = "<html><body>Reviews</body></html>";
        assert!(matches!(
            estimate().count_from_html(html),
            Err(CountError::Parse(_))
        ));
    }

    #[test]
    fn count_from_html_oversized_label_is_parse_error() {
        let html = r#">18446744073709551.9K</div><div class="x">Downloads</div>"#;
        assert!(matches!(
            estimate().count_from_html(html),
            Err(CountError::Parse(_))
        ));
    }

    #[test]
    fn class_longer_than_ten_chars_does_not_match() {
        let html = r#">5K</div><div class="abcdefghijk">Downloads</div>"#;
        assert!(estimate().count_from_html(html).is_err());
    }

    #[test]
    fn custom_extractor_is_used() {
        let est = StoreEstimate::new(
            reqwest::Client::new(),
            "https://store.example/",
            Box::new(FixedExtractor(Some("50+"))),
        );
        assert_eq!(est.count_from_html("anything"), Ok(51));

        let est = StoreEstimate::new(
            reqwest::Client::new(),
            "https://store.example/",
            Box::new(FixedExtractor(Some("n/a"))),
        );
        assert!(matches!(
            est.count_from_html("anything"),
            Err(CountError::Parse(_))
        ));
    }
}
