//! Discover feeds: trending movie, trending song and the daily quote.

use serde::{Deserialize, Serialize};

use super::{endpoint, parse, pick, upstream_message, ProxyClient};
use crate::{Error, Result};

const POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub overview: Option<String>,
    /// Full poster URL
    pub poster: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub name: String,
    pub artist: String,
    pub artwork: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    pub from: Option<String>,
    pub from_who: Option<String>,
}

impl Quote {
    pub fn author(&self) -> &str {
        self.from_who.as_deref().filter(|s| !s.is_empty()).unwrap_or("佚名")
    }

    pub fn source(&self) -> &str {
        self.from.as_deref().filter(|s| !s.is_empty()).unwrap_or("未知来源")
    }
}

#[derive(Debug, Deserialize)]
struct TrendingResponse {
    #[serde(default)]
    results: Vec<TmdbMovie>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    id: i64,
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
}

impl From<TmdbMovie> for Movie {
    fn from(m: TmdbMovie) -> Self {
        Movie {
            id: m.id,
            title: m.title.or(m.name).unwrap_or_default(),
            overview: m.overview.filter(|o| !o.is_empty()),
            poster: m.poster_path.map(|p| format!("{}{}", POSTER_BASE, p)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    feed: Feed,
}

#[derive(Debug, Default, Deserialize)]
struct Feed {
    #[serde(default)]
    results: Vec<FeedSong>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedSong {
    name: String,
    artist_name: String,
    url: String,
    artwork_url100: Option<String>,
    artwork_url: Option<String>,
}

impl From<FeedSong> for Song {
    fn from(s: FeedSong) -> Self {
        Song {
            name: s.name,
            artist: s.artist_name,
            artwork: s.artwork_url100.or(s.artwork_url),
            url: s.url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Hitokoto {
    hitokoto: String,
    from: Option<String>,
    from_who: Option<String>,
}

impl ProxyClient {
    /// One random movie from today's TMDB trending list.
    pub async fn trending_movie(&self) -> Result<Movie> {
        let key = self
            .config
            .tmdb_api_key
            .as_deref()
            .ok_or_else(|| Error::MissingKey("TMDB_API_KEY".into()))?;
        let mut url = endpoint(&self.config.tmdb_base, "3/trending/movie/day")?;
        url.query_pairs_mut().append_pair("api_key", key);

        let (status, body) = self.get(&self.movie, url).await?;
        if !status.is_success() {
            return Err(Error::UpstreamError(
                upstream_message(&body, "status_message").unwrap_or_else(|| "upstream_error".into()),
            ));
        }
        let resp: TrendingResponse = parse(&body)?;
        pick(resp.results)
            .map(Movie::from)
            .ok_or_else(|| Error::NoData("暂无热门电影".into()))
    }

    /// One random song from the Apple Music most-played chart.
    pub async fn trending_song(&self) -> Result<Song> {
        let path = format!("api/v2/{}/music/most-played/50/songs.json", self.config.music_region);
        let url = endpoint(&self.config.music_base, &path)?;

        let (status, body) = self.get(&self.music, url).await?;
        if !status.is_success() {
            return Err(Error::UpstreamError(
                upstream_message(&body, "message").unwrap_or_else(|| "upstream_error".into()),
            ));
        }
        let resp: FeedResponse = parse(&body)?;
        pick(resp.feed.results)
            .map(Song::from)
            .ok_or_else(|| Error::NoData("暂无热门歌曲".into()))
    }

    pub async fn daily_quote(&self) -> Result<Quote> {
        let url = url::Url::parse(&self.config.quote_url)
            .map_err(|e| Error::ConfigError(format!("bad quote URL: {}", e)))?;
        let (status, body) = self.get(&self.direct, url).await?;
        if !status.is_success() {
            return Err(Error::UpstreamError(format!("quote service answered {}", status)));
        }
        let h: Hitokoto = parse(&body)?;
        Ok(Quote { text: h.hitokoto, from: h.from, from_who: h.from_who })
    }
}
