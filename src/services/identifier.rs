//! IMDb Identifier Extraction
//!
//! Pulls IMDb title ids out of page and link URLs, and recognizes provider
//! embed URLs so a popup opened on the provider can offer episode changes.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::models::{EmbedTarget, ImdbId};

lazy_static! {
    static ref TITLE_PATH: Regex = Regex::new(r"/title/(tt\d+)").unwrap();
    static ref IMDB_TITLE_URL: Regex = Regex::new(r"imdb\.com/title/(tt\d+)").unwrap();
    static ref EMBED_MOVIE: Regex = Regex::new(r"/embed/movie/(tt\d+)").unwrap();
    static ref EMBED_TV: Regex = Regex::new(r"/embed/tv/(tt\d+)/(\d+)/(\d+)").unwrap();
}

/// Extract the IMDb id from any URL carrying a `/title/tt…` path.
///
/// Only the first match counts and the prefix must be lowercase `tt`.
pub fn extract_imdb_id(url: &str) -> Option<ImdbId> {
    let captures = TITLE_PATH.captures(url)?;
    ImdbId::parse(captures.get(1)?.as_str())
}

/// Stricter variant used on the active tab: the host must be imdb.com.
pub fn extract_imdb_id_from_imdb_url(url: &str) -> Option<ImdbId> {
    let captures = IMDB_TITLE_URL.captures(url)?;
    ImdbId::parse(captures.get(1)?.as_str())
}

/// Recognize a provider embed URL
///
/// Supported URL patterns:
/// - `https://{domain}/embed/movie/{id}`
/// - `https://{domain}/embed/tv/{id}/{season}/{episode}`
pub fn parse_embed_url(url: &str) -> Option<EmbedTarget> {
    if url.contains("/embed/movie/") {
        let captures = EMBED_MOVIE.captures(url)?;
        let imdb_id = ImdbId::parse(captures.get(1)?.as_str())?;
        return Some(EmbedTarget::Movie { imdb_id });
    }

    if url.contains("/embed/tv/") {
        let captures = EMBED_TV.captures(url)?;
        let imdb_id = ImdbId::parse(captures.get(1)?.as_str())?;
        let season = captures.get(2)?.as_str().parse().ok()?;
        let episode = captures.get(3)?.as_str().parse().ok()?;
        return Some(EmbedTarget::Tv {
            imdb_id,
            season,
            episode,
        });
    }

    debug!("URL is not a provider embed URL: {}", url);
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_title_page() {
        let id = extract_imdb_id("https://www.imdb.com/title/tt0111161/").unwrap();
        assert_eq!(id.as_str(), "tt0111161");

        let id = extract_imdb_id("https://m.imdb.com/title/tt0903747/episodes?season=2").unwrap();
        assert_eq!(id.as_str(), "tt0903747");

        // Relative hrefs work too
        let id = extract_imdb_id("/title/tt1375666/?ref_=nv_sr_1").unwrap();
        assert_eq!(id.as_str(), "tt1375666");
    }

    #[test]
    fn test_extract_first_match_wins() {
        let url = "https://www.imdb.com/title/tt0000001/?next=/title/tt0000002/";
        assert_eq!(extract_imdb_id(url).unwrap().as_str(), "tt0000001");
    }

    #[test]
    fn test_extract_not_title() {
        assert!(extract_imdb_id("https://www.imdb.com/name/nm0000151/").is_none());
        assert!(extract_imdb_id("https://www.imdb.com/chart/top/").is_none());
        assert!(extract_imdb_id("https://www.imdb.com/title/").is_none());
        assert!(extract_imdb_id("").is_none());
    }

    #[test]
    fn test_extract_case_sensitive_prefix() {
        assert!(extract_imdb_id("https://www.imdb.com/title/TT0111161/").is_none());
    }

    #[test]
    fn test_extract_from_imdb_url_requires_host() {
        assert!(extract_imdb_id_from_imdb_url("https://www.imdb.com/title/tt0111161/").is_some());
        assert!(extract_imdb_id_from_imdb_url("https://example.com/title/tt0111161/").is_none());
        // The lenient extractor still accepts it
        assert!(extract_imdb_id("https://example.com/title/tt0111161/").is_some());
    }

    #[test]
    fn test_parse_embed_movie() {
        let target = parse_embed_url("https://vidsrc.icu/embed/movie/tt0111161").unwrap();
        assert_eq!(
            target,
            EmbedTarget::Movie {
                imdb_id: ImdbId::parse("tt0111161").unwrap()
            }
        );
    }

    #[test]
    fn test_parse_embed_tv() {
        let target = parse_embed_url("https://vidsrc.icu/embed/tv/tt0903747/5/14").unwrap();
        assert_eq!(
            target,
            EmbedTarget::Tv {
                imdb_id: ImdbId::parse("tt0903747").unwrap(),
                season: 5,
                episode: 14,
            }
        );
    }

    #[test]
    fn test_parse_embed_incomplete() {
        // Missing episode
        assert!(parse_embed_url("https://vidsrc.icu/embed/tv/tt0903747/5").is_none());
        assert!(parse_embed_url("https://vidsrc.icu/").is_none());
        assert!(parse_embed_url("https://www.imdb.com/title/tt0111161/").is_none());
    }
}
