//! Provider embed URL construction

use crate::models::{ImdbId, WatchKind};

/// Lowest season/episode number the prompt accepts
pub const MIN_EPISODE_NUMBER: u32 = 1;
/// Highest season/episode number the prompt accepts
pub const MAX_EPISODE_NUMBER: u32 = 100;

/// Clamp a season or episode number into the accepted range
pub fn clamp_episode_number(value: i64) -> u32 {
    value.clamp(MIN_EPISODE_NUMBER as i64, MAX_EPISODE_NUMBER as i64) as u32
}

/// Build the provider embed URL.
///
/// `season`/`episode` are only used for [`WatchKind::Tv`]; missing values
/// fall back to 1 and out of range values are clamped.
pub fn build_watch_url(
    kind: WatchKind,
    imdb_id: &ImdbId,
    base_domain: &str,
    season: Option<i64>,
    episode: Option<i64>,
) -> String {
    let base_domain = normalize_base_domain(base_domain);
    match kind {
        WatchKind::Movie => format!("https://{}/embed/movie/{}", base_domain, imdb_id),
        WatchKind::Tv => {
            let season = clamp_episode_number(season.unwrap_or(MIN_EPISODE_NUMBER as i64));
            let episode = clamp_episode_number(episode.unwrap_or(MIN_EPISODE_NUMBER as i64));
            format!(
                "https://{}/embed/tv/{}/{}/{}",
                base_domain, imdb_id, season, episode
            )
        }
    }
}

/// IMDb title page for an id
pub fn imdb_title_url(imdb_id: &ImdbId) -> String {
    format!("https://www.imdb.com/title/{}/", imdb_id)
}

/// Strip protocol, trailing slashes and whitespace from a user supplied domain
pub fn normalize_base_domain(input: &str) -> String {
    let trimmed = input.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> ImdbId {
        ImdbId::parse(raw).unwrap()
    }

    #[test]
    fn test_movie_url() {
        assert_eq!(
            build_watch_url(WatchKind::Movie, &id("tt0111161"), "vidsrc.icu", None, None),
            "https://vidsrc.icu/embed/movie/tt0111161"
        );
    }

    #[test]
    fn test_tv_url() {
        assert_eq!(
            build_watch_url(WatchKind::Tv, &id("tt0903747"), "vidsrc.icu", Some(5), Some(14)),
            "https://vidsrc.icu/embed/tv/tt0903747/5/14"
        );
    }

    #[test]
    fn test_tv_url_clamps() {
        assert_eq!(
            build_watch_url(WatchKind::Tv, &id("tt0903747"), "vidsrc.icu", Some(0), Some(250)),
            "https://vidsrc.icu/embed/tv/tt0903747/1/100"
        );
        assert_eq!(
            build_watch_url(WatchKind::Tv, &id("tt0903747"), "vidsrc.icu", Some(-3), None),
            "https://vidsrc.icu/embed/tv/tt0903747/1/1"
        );
    }

    #[test]
    fn test_movie_ignores_episode() {
        assert_eq!(
            build_watch_url(WatchKind::Movie, &id("tt1"), "vidsrc.icu", Some(3), Some(4)),
            "https://vidsrc.icu/embed/movie/tt1"
        );
    }

    #[test]
    fn test_clamp_bounds() {
        assert_eq!(clamp_episode_number(i64::MIN), 1);
        assert_eq!(clamp_episode_number(1), 1);
        assert_eq!(clamp_episode_number(42), 42);
        assert_eq!(clamp_episode_number(100), 100);
        assert_eq!(clamp_episode_number(101), 100);
    }

    #[test]
    fn test_normalize_base_domain() {
        assert_eq!(normalize_base_domain("vidsrc.icu"), "vidsrc.icu");
        assert_eq!(normalize_base_domain(" https://vidsrc.to/ "), "vidsrc.to");
        assert_eq!(normalize_base_domain("http://vidsrc.xyz"), "vidsrc.xyz");
        assert_eq!(normalize_base_domain("   "), "");
    }

    #[test]
    fn test_base_with_scheme_does_not_double() {
        assert_eq!(
            build_watch_url(WatchKind::Movie, &id("tt1"), "https://vidsrc.to/", None, None),
            "https://vidsrc.to/embed/movie/tt1"
        );
    }

    #[test]
    fn test_imdb_title_url() {
        assert_eq!(imdb_title_url(&id("tt0111161")), "https://www.imdb.com/title/tt0111161/");
    }
}
