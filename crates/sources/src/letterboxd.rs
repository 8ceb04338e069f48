//! Letterboxd rating source.
//!
//! Search results come from the film search page and ratings from the
//! `twitter:data2` meta tag of a film page ("3.85 out of 5"). HTML parsing
//! lives in free functions so it can be tested against fixtures without a
//! network.

use crate::error::{Result, SourceError};
use crate::traits::RatingSource;
use crate::types::{FilmCandidate, FilmRef};
use async_trait::async_trait;
use reqwest::Url;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_BASE_URL: &str = "https://letterboxd.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; cinema-recover/0.1)";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct LetterboxdConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for LetterboxdConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub struct LetterboxdSource {
    client: reqwest::Client,
    base_url: Url,
}

impl LetterboxdSource {
    pub fn new(config: LetterboxdConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| SourceError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, base_url })
    }

    fn page_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments)
            // trailing slash
            .push("");
        Ok(url)
    }

    async fn get_html(&self, url: Url) -> Result<String> {
        debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl RatingSource for LetterboxdSource {
    fn name(&self) -> &str {
        "letterboxd"
    }

    #[instrument(skip(self))]
    async fn search(&self, title: &str) -> Result<Vec<FilmCandidate>> {
        let url = self.page_url(&["s", "search", "films", title])?;
        let html = self.get_html(url).await?;
        let candidates = parse_search_results(&html)?;
        debug!("{} candidates for '{}'", candidates.len(), title);
        Ok(candidates)
    }

    #[instrument(skip(self))]
    async fn fetch_rating(&self, film: &FilmRef) -> Result<Option<f64>> {
        let url = self.page_url(&["film", film.as_str()])?;
        let html = self.get_html(url).await?;
        parse_rating(&html)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| SourceError::Parse(format!("selector '{}': {}", css, e)))
}

/// Slug of a film link such as `/film/parasite-2019/`.
fn slug_from_href(href: &str) -> Option<&str> {
    let mut parts = href.trim_end_matches('/').rsplit('/');
    let slug = parts.next()?;
    (parts.next() == Some("film") && !slug.is_empty()).then_some(slug)
}

/// Extract candidates from a search results page, in page order.
///
/// Entries without a film link are skipped; a missing year is kept as `None`.
pub fn parse_search_results(html: &str) -> Result<Vec<FilmCandidate>> {
    let document = Html::parse_document(html);
    let item_selector = selector("ul.results > li")?;
    let link_selector = selector("span.film-title-wrapper > a")?;
    let year_selector = selector("small.metadata a")?;

    let mut candidates = Vec::new();
    for item in document.select(&item_selector) {
        let Some(link) = item.select(&link_selector).next() else {
            continue;
        };
        let Some(slug) = link.value().attr("href").and_then(slug_from_href) else {
            continue;
        };
        let title = link.text().collect::<String>().trim().to_string();
        let year = item
            .select(&year_selector)
            .next()
            .map(|y| y.text().collect::<String>().trim().to_string())
            .filter(|y| !y.is_empty());

        candidates.push(FilmCandidate::new(title, year.as_deref(), FilmRef::new(slug)));
    }
    Ok(candidates)
}

/// Read the average rating from a film page.
///
/// `Ok(None)` when the page carries no rating (too few ratings yet).
pub fn parse_rating(html: &str) -> Result<Option<f64>> {
    let document = Html::parse_document(html);
    let meta_selector = selector(r#"meta[name="twitter:data2"]"#)?;

    let Some(content) = document
        .select(&meta_selector)
        .next()
        .and_then(|m| m.value().attr("content"))
    else {
        return Ok(None);
    };

    let Some(first) = content.split_whitespace().next() else {
        return Ok(None);
    };
    first
        .parse::<f64>()
        .map(Some)
        .map_err(|e| SourceError::Parse(format!("rating '{}': {}", content, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_PAGE: &str = r#"
        <html><body>
        <ul class="results">
          <li>
            <span class="film-title-wrapper"><a href="/film/oldboy/">Oldboy</a></span>
            <small class="metadata"><a href="/films/year/2003/">2003</a></small>
          </li>
          <li>
            <span class="film-title-wrapper"><a href="/film/oldboy-2013/">Oldboy</a></span>
            <small class="metadata"><a href="/films/year/2013/">2013</a></small>
          </li>
          <li>
            <span class="film-title-wrapper"><a href="/film/oldboy-short/">Oldboy</a></span>
          </li>
          <li><p>advertisement</p></li>
        </ul>
        </body></html>
    "#;

    const FILM_PAGE: &str = r#"
        <html><head>
        <meta name="twitter:data1" content="Park Chan-wook" />
        <meta name="twitter:data2" content="4.11 out of 5" />
        </head><body></body></html>
    "#;

    #[test]
    fn test_parse_search_results_keeps_order() {
        let candidates = parse_search_results(SEARCH_PAGE).unwrap();
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].film, FilmRef::new("oldboy"));
        assert_eq!(candidates[0].release_year(), Some(2003));
        assert_eq!(candidates[1].film.as_str(), "oldboy-2013");
        assert_eq!(candidates[2].year, None);
        assert_eq!(candidates[2].release_year(), None);
    }

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating(FILM_PAGE).unwrap(), Some(4.11));
        assert_eq!(parse_rating("<html><head></head></html>").unwrap(), None);
        assert!(parse_rating(r#"<meta name="twitter:data2" content="soon out of 5">"#).is_err());
    }

    #[test]
    fn test_slug_from_href() {
        assert_eq!(slug_from_href("/film/parasite-2019/"), Some("parasite-2019"));
        assert_eq!(slug_from_href("/film/parasite-2019"), Some("parasite-2019"));
        assert_eq!(slug_from_href("/films/year/2019/"), None);
    }

    #[test]
    fn test_page_url_encodes_title() {
        let source = LetterboxdSource::new(LetterboxdConfig::default()).unwrap();
        let url = source.page_url(&["s", "search", "films", "Tokyo Story"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://letterboxd.com/s/search/films/Tokyo%20Story/"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let config = LetterboxdConfig {
            base_url: "not a url".to_string(),
            ..LetterboxdConfig::default()
        };
        assert!(matches!(
            LetterboxdSource::new(config),
            Err(SourceError::InvalidUrl(_))
        ));
    }
}
