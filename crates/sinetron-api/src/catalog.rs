//! Catalog and stream endpoints
//!
//! Typed wrappers over the aggregation API: series listings, search,
//! series detail, and the per-episode stream payload handed to the core
//! source resolver. The API is stringly typed in places ("1" flags,
//! numeric fields that arrive as strings), so the models deserialize
//! leniently rather than reject a whole listing.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use sinetron_core::source;
use sinetron_core::types::{Episode, SourceSet};

use crate::client::VideoApi;
use crate::error::{ApiError, Result};

/// One series as returned by the catalog endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesSummary {
    pub book_id: Option<String>,
    pub book_name: Option<String>,
    pub thumb_url: Option<String>,
    #[serde(default)]
    pub is_hot: Option<String>,
    #[serde(default)]
    pub is_new_book: Option<String>,
    #[serde(default)]
    pub is_exclusive: Option<String>,
    #[serde(default)]
    pub is_dubbed: Option<String>,
    #[serde(default)]
    pub search_high_light: Option<SearchHighlight>,
}

impl SeriesSummary {
    /// Title for cards: the search-highlighted variant when present,
    /// otherwise the plain series name
    pub fn display_title(&self) -> &str {
        self.search_high_light
            .as_ref()
            .and_then(|h| h.title.as_ref())
            .and_then(|t| t.rich_text.as_deref())
            .or(self.book_name.as_deref())
            .unwrap_or("")
    }

    /// Badge labels in the catalog's display order
    pub fn badges(&self) -> Vec<&'static str> {
        let mut badges = Vec::new();
        if flag_set(&self.is_hot) {
            badges.push("HOT");
        }
        if flag_set(&self.is_new_book) {
            badges.push("NEW");
        }
        if flag_set(&self.is_exclusive) {
            badges.push("EXCLUSIVE");
        }
        if flag_set(&self.is_dubbed) {
            badges.push("DUB");
        }
        badges
    }
}

/// Search-result highlighting wrapper
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHighlight {
    pub title: Option<RichText>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RichText {
    pub rich_text: Option<String>,
}

/// One page of search results
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub results: Vec<SeriesSummary>,
    pub has_more: bool,
}

/// One episode row of a series detail payload
#[derive(Debug, Clone, Deserialize)]
pub struct EpisodeEntry {
    pub vid: Option<String>,
    pub video_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub vid_index: Option<u32>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub duration: Option<f64>,
    #[serde(default)]
    pub is_new: Option<String>,
}

impl EpisodeEntry {
    /// Convert to the core episode model. `position` is the zero-based
    /// slot in the episode list, used when the payload carries no
    /// index. Entries without a stream id are unplayable and yield
    /// `None`.
    pub fn to_episode(&self, position: usize) -> Option<Episode> {
        let id = self.vid.clone()?;
        Some(Episode {
            id,
            title: self.video_title.clone(),
            index: self.vid_index.unwrap_or(position as u32 + 1),
            duration_seconds: self.duration,
            is_new: flag_set(&self.is_new),
        })
    }
}

/// Series detail as shown on the detail page
#[derive(Debug, Clone)]
pub struct SeriesDetail {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub episodes: Vec<EpisodeEntry>,
}

/// Typed endpoint wrappers over a [`VideoApi`] transport
pub struct Catalog<A: VideoApi> {
    api: A,
}

impl<A: VideoApi> Catalog<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Latest series
    pub async fn latest(&self) -> Result<Vec<SeriesSummary>> {
        let body = self.api.fetch_json("latest", &[]).await?;
        parse_listing(body, "latest")
    }

    /// Trending series
    pub async fn trending(&self) -> Result<Vec<SeriesSummary>> {
        let body = self.api.fetch_json("trending", &[]).await?;
        parse_listing(body, "trending")
    }

    /// Search the catalog
    pub async fn search(&self, query: &str, limit: u32, offset: u32) -> Result<SearchPage> {
        let body = self
            .api
            .fetch_json(
                "search",
                &[
                    ("query", query.to_string()),
                    ("limit", limit.to_string()),
                    ("offset", offset.to_string()),
                ],
            )
            .await?;

        let envelope: SearchEnvelope = deserialize(body, "search")?;
        let data = envelope.data.unwrap_or_default();
        let results = data
            .search_data
            .into_iter()
            .flat_map(|group| group.books)
            .collect();
        Ok(SearchPage {
            results,
            has_more: data.has_more,
        })
    }

    /// Series detail with its episode list
    pub async fn detail(&self, series_id: &str) -> Result<SeriesDetail> {
        let endpoint = format!("detail/{series_id}");
        let body = self.api.fetch_json(&endpoint, &[]).await?;

        let envelope: DetailEnvelope = deserialize(body, &endpoint)?;
        let video_data = envelope
            .data
            .and_then(|d| d.video_data)
            .ok_or_else(|| ApiError::MissingData {
                endpoint: endpoint.clone(),
            })?;

        Ok(SeriesDetail {
            id: series_id.to_string(),
            title: video_data
                .series_title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            description: video_data.series_intro.unwrap_or_default(),
            thumbnail: video_data.series_cover.or(video_data.thumb_url),
            episodes: video_data.video_list,
        })
    }

    /// Fetch the stream payload for an episode and resolve its
    /// playable sources. The result may still be unplayable; the
    /// caller decides how to surface that.
    pub async fn video_sources(&self, video_id: &str) -> Result<SourceSet> {
        let endpoint = format!("stream/{video_id}");
        let body = self.api.fetch_json(&endpoint, &[]).await?;

        let Some(payload) = body.get("data") else {
            return Err(ApiError::MissingData { endpoint });
        };
        let set = source::resolve(payload);
        if !set.is_playable() {
            debug!(video_id, "stream payload resolved to no playable source");
        }
        Ok(set)
    }
}

#[derive(Debug, Deserialize)]
struct ListingEnvelope {
    #[serde(default)]
    books: Vec<SeriesSummary>,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    data: Option<SearchData>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchData {
    #[serde(default)]
    search_data: Vec<SearchGroup>,
    #[serde(default)]
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct SearchGroup {
    #[serde(default)]
    books: Vec<SeriesSummary>,
}

#[derive(Debug, Deserialize)]
struct DetailEnvelope {
    data: Option<DetailData>,
}

#[derive(Debug, Deserialize)]
struct DetailData {
    video_data: Option<VideoData>,
}

#[derive(Debug, Deserialize)]
struct VideoData {
    series_title: Option<String>,
    series_intro: Option<String>,
    series_cover: Option<String>,
    thumb_url: Option<String>,
    #[serde(default)]
    video_list: Vec<EpisodeEntry>,
}

fn parse_listing(body: Value, endpoint: &str) -> Result<Vec<SeriesSummary>> {
    let envelope: ListingEnvelope = deserialize(body, endpoint)?;
    Ok(envelope.books)
}

fn deserialize<T: serde::de::DeserializeOwned>(body: Value, endpoint: &str) -> Result<T> {
    serde_json::from_value(body).map_err(|source| ApiError::Malformed {
        endpoint: endpoint.to_string(),
        source,
    })
}

fn flag_set(value: &Option<String>) -> bool {
    value.as_deref() == Some("1")
}

/// Accept a number or a numeric string
fn lenient_u32<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_u64().map(|n| n as u32),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }))
}

/// Accept a number or a numeric string
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;

    /// Canned-response transport keyed by endpoint
    struct FakeApi {
        responses: HashMap<String, Value>,
    }

    impl FakeApi {
        fn with(entries: &[(&str, Value)]) -> Catalog<FakeApi> {
            Catalog::new(FakeApi {
                responses: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            })
        }
    }

    #[async_trait]
    impl VideoApi for FakeApi {
        async fn fetch_json(&self, endpoint: &str, _params: &[(&str, String)]) -> Result<Value> {
            self.responses
                .get(endpoint)
                .cloned()
                .ok_or_else(|| ApiError::MissingData {
                    endpoint: endpoint.to_string(),
                })
        }
    }

    #[tokio::test]
    async fn test_latest_parses_books() {
        let catalog = FakeApi::with(&[(
            "latest",
            json!({ "books": [
                { "book_id": "b1", "book_name": "Cinta Terlarang", "is_hot": "1" },
                { "book_id": "b2", "book_name": "Istri Kedua", "is_new_book": "1" }
            ]}),
        )]);

        let series = catalog.latest().await.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].display_title(), "Cinta Terlarang");
        assert_eq!(series[0].badges(), vec!["HOT"]);
        assert_eq!(series[1].badges(), vec!["NEW"]);
    }

    #[tokio::test]
    async fn test_latest_tolerates_missing_books() {
        let catalog = FakeApi::with(&[("latest", json!({}))]);
        assert!(catalog.latest().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_flattens_groups_and_prefers_highlight() {
        let catalog = FakeApi::with(&[(
            "search",
            json!({ "data": {
                "search_data": [
                    { "books": [{
                        "book_id": "b1",
                        "book_name": "Plain Name",
                        "search_high_light": { "title": { "rich_text": "Rich Name" } }
                    }]},
                    { "books": [{ "book_id": "b2", "book_name": "Second" }] }
                ],
                "has_more": true
            }}),
        )]);

        let page = catalog.search("name", 20, 0).await.unwrap();
        assert_eq!(page.results.len(), 2);
        assert!(page.has_more);
        assert_eq!(page.results[0].display_title(), "Rich Name");
        assert_eq!(page.results[1].display_title(), "Second");
    }

    #[tokio::test]
    async fn test_detail_maps_video_data() {
        let catalog = FakeApi::with(&[(
            "detail/7311",
            json!({ "data": { "video_data": {
                "series_title": "Janji Suci",
                "series_intro": "Sebuah kisah.",
                "series_cover": "https://img.example/cover.jpg",
                "video_list": [
                    { "vid": "v1", "video_title": "Pembukaan", "vid_index": "1",
                      "duration": 182, "is_new": "1" },
                    { "video_title": "No stream id" },
                    { "vid": "v3", "vid_index": 3 }
                ]
            }}}),
        )]);

        let detail = catalog.detail("7311").await.unwrap();
        assert_eq!(detail.title, "Janji Suci");
        assert_eq!(detail.thumbnail.as_deref(), Some("https://img.example/cover.jpg"));
        assert_eq!(detail.episodes.len(), 3);

        let first = detail.episodes[0].to_episode(0).unwrap();
        assert_eq!(first.id, "v1");
        assert_eq!(first.index, 1);
        assert_eq!(first.duration_seconds, Some(182.0));
        assert!(first.is_new);

        // No stream id means no playable episode.
        assert!(detail.episodes[1].to_episode(1).is_none());

        // Position fallback only applies when the payload has no index.
        let third = detail.episodes[2].to_episode(2).unwrap();
        assert_eq!(third.index, 3);
    }

    #[tokio::test]
    async fn test_detail_without_video_data_is_missing() {
        let catalog = FakeApi::with(&[("detail/1", json!({ "data": {} }))]);
        assert!(matches!(
            catalog.detail("1").await,
            Err(ApiError::MissingData { .. })
        ));
    }

    #[tokio::test]
    async fn test_video_sources_resolves_stream_payload() {
        let catalog = FakeApi::with(&[(
            "stream/v1",
            json!({ "data": {
                "main_url": "aHR0cHM6Ly94L2EubXA0",
                "video_model":
                    "{\"video_list\":{\"video_720\":{\"main_url\":\"https://x/720.mp4\",\"definition\":\"720p\"}}}"
            }}),
        )]);

        let set = catalog.video_sources("v1").await.unwrap();
        assert_eq!(set.main_url.as_deref(), Some("https://x/a.mp4"));
        assert_eq!(set.sources.len(), 1);
        assert_eq!(set.sources[0].resolution, "720p");
    }

    #[tokio::test]
    async fn test_video_sources_without_data_is_missing() {
        let catalog = FakeApi::with(&[("stream/v1", json!({ "ok": true }))]);
        assert!(matches!(
            catalog.video_sources("v1").await,
            Err(ApiError::MissingData { .. })
        ));
    }

    #[tokio::test]
    async fn test_video_sources_may_resolve_unplayable() {
        let catalog = FakeApi::with(&[("stream/v1", json!({ "data": {} }))]);
        let set = catalog.video_sources("v1").await.unwrap();
        assert!(!set.is_playable());
    }

    #[test]
    fn test_episode_fallback_index_from_position() {
        let entry = EpisodeEntry {
            vid: Some("v9".into()),
            video_title: None,
            vid_index: None,
            duration: None,
            is_new: None,
        };
        let episode = entry.to_episode(8).unwrap();
        assert_eq!(episode.index, 9);
        assert_eq!(episode.display_title(), "Episode 9");
    }
}
