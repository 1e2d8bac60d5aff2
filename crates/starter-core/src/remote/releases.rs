//! Release metadata lookup
//!
//! The feed is a list of release records, either bare or wrapped in an object
//! under `releases` (or `list`, as the drupal.org API returns it). Wrapped
//! feeds may be paged through a `next` link. Bodies are parsed with
//! serde_yaml, which also accepts JSON.

use crate::error::{Result, StarterError};
use crate::product::GeneratorProfile;
use semver::Version;
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use url::Url;

/// Upper bound on feed pages fetched in one run
const MAX_PAGES: usize = 100;

/// One published release
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseRecord {
    #[serde(alias = "field_release_version")]
    pub version: String,

    #[serde(
        default,
        alias = "field_release_version_major",
        deserialize_with = "lenient_number"
    )]
    pub version_major: Option<u64>,

    #[serde(
        default,
        alias = "field_release_version_minor",
        deserialize_with = "lenient_number"
    )]
    pub version_minor: Option<u64>,
}

impl ReleaseRecord {
    /// Parsed version; `None` for tags that are not semver (e.g. `8.x-dev`)
    fn semver(&self) -> Option<Version> {
        let cleaned = self.version.strip_prefix('v').unwrap_or(&self.version);
        Version::parse(cleaned).ok()
    }

    /// Major version, preferring the feed's own field
    fn major(&self, parsed: &Version) -> u64 {
        self.version_major.unwrap_or(parsed.major)
    }

    fn minor(&self, parsed: &Version) -> u64 {
        self.version_minor.unwrap_or(parsed.minor)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReleaseFeed {
    Bare(Vec<ReleaseRecord>),
    Wrapped {
        #[serde(alias = "list")]
        releases: Vec<ReleaseRecord>,
        #[serde(default)]
        next: Option<String>,
    },
}

/// One page of the release feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPage {
    pub records: Vec<ReleaseRecord>,
    /// Link to the following page, as given by the feed
    pub next: Option<String>,
}

impl From<ReleaseFeed> for FeedPage {
    fn from(feed: ReleaseFeed) -> Self {
        match feed {
            ReleaseFeed::Bare(records) => Self {
                records,
                next: None,
            },
            ReleaseFeed::Wrapped { releases, next } => Self {
                records: releases,
                next: next.filter(|n| !n.trim().is_empty()),
            },
        }
    }
}

/// Accept numbers given either as integers or numeric strings
fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Number(u64),
        Text(String),
    }

    Ok(match Option::<Lenient>::deserialize(deserializer)? {
        Some(Lenient::Number(n)) => Some(n),
        Some(Lenient::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// Parse one page of the release feed
pub fn parse_feed(body: &str) -> std::result::Result<FeedPage, serde_yaml::Error> {
    serde_yaml::from_str::<ReleaseFeed>(body).map(FeedPage::from)
}

/// Newest stable release of each minor line of `major`, newest first
pub fn supported_tags(records: &[ReleaseRecord], major: u64) -> Vec<String> {
    let mut latest: BTreeMap<u64, (Version, &str)> = BTreeMap::new();

    for record in records {
        let Some(parsed) = record.semver() else {
            continue;
        };
        if !parsed.pre.is_empty() || record.major(&parsed) != major {
            continue;
        }

        let minor = record.minor(&parsed);
        let newer = latest
            .get(&minor)
            .map_or(true, |(current, _)| parsed > *current);
        if newer {
            latest.insert(minor, (parsed, record.version.as_str()));
        }
    }

    latest
        .into_values()
        .rev()
        .map(|(_, tag)| tag.to_string())
        .collect()
}

/// Keep a previously saved version selectable even when the feed dropped it
pub fn offer_saved_version(mut tags: Vec<String>, saved: Option<&str>) -> Vec<String> {
    if let Some(saved) = saved.filter(|v| !v.is_empty()) {
        if !tags.iter().any(|t| t == saved) {
            tags.push(saved.to_string());
        }
    }
    tags
}

/// Client for the release metadata feed
pub struct ReleaseSource {
    url: Url,
    client: reqwest::Client,
}

impl ReleaseSource {
    /// Create a source with a custom user agent
    pub fn new(url: Url, user_agent: &str) -> Self {
        Self {
            url,
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Create a source from a generator profile, honoring its env override
    pub fn from_profile<P: GeneratorProfile>(profile: &P) -> Result<Self> {
        let url_str = std::env::var(profile.releases_url_env())
            .unwrap_or_else(|_| profile.default_releases_url().to_string());
        let url = Url::parse(&url_str).map_err(|_| {
            StarterError::Validation(format!("Invalid release metadata URL: {}", url_str))
        })?;
        Ok(Self::new(url, profile.user_agent()))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch every release record in the feed, following `next` links
    pub async fn fetch(&self) -> Result<Vec<ReleaseRecord>> {
        let mut records = Vec::new();
        let mut visited = HashSet::new();
        let mut page_url = Some(self.url.clone());

        while let Some(url) = page_url.take() {
            if !visited.insert(url.clone()) {
                tracing::warn!(url = %url, "release feed links back to a visited page");
                break;
            }
            if visited.len() > MAX_PAGES {
                tracing::warn!(pages = MAX_PAGES, "release feed page limit reached");
                break;
            }

            let page = self.fetch_page(&url).await?;
            tracing::debug!(url = %url, count = page.records.len(), "fetched release page");
            records.extend(page.records);

            page_url = match page.next {
                Some(next) => Some(next_page_url(&url, &next)?),
                None => None,
            };
        }

        tracing::info!(count = records.len(), pages = visited.len(), "fetched release metadata");
        Ok(records)
    }

    async fn fetch_page(&self, page_url: &Url) -> Result<FeedPage> {
        let url = page_url.to_string();
        let response = self
            .client
            .get(page_url.clone())
            .send()
            .await
            .map_err(|source| StarterError::MetadataFetch {
                url: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(StarterError::MetadataStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| StarterError::MetadataFetch {
                url: url.clone(),
                source,
            })?;

        parse_feed(&body).map_err(|source| StarterError::MetadataParse { url, source })
    }
}

/// Resolve a `next` link against the page it came from
///
/// drupal.org links to `/api-d7/node?...` from `/api-d7/node.json?...`; the
/// extension of the requested path is kept so every page comes back as JSON.
fn next_page_url(current: &Url, next: &str) -> Result<Url> {
    let mut url = current
        .join(next)
        .map_err(|_| StarterError::Validation(format!("Invalid release metadata URL: {}", next)))?;

    if let Some(extension) = Path::new(current.path()).extension() {
        let path = url.path().to_string();
        if Path::new(&path).extension().is_none()
            && current.path() == format!("{}.{}", path, extension.to_string_lossy())
        {
            url.set_path(current.path());
        }
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record(version: &str) -> ReleaseRecord {
        ReleaseRecord {
            version: version.to_string(),
            version_major: None,
            version_minor: None,
        }
    }

    #[test]
    fn test_latest_patch_per_minor_newest_first() {
        let records: Vec<_> = [
            "8.8.0", "8.8.12", "8.9.19", "8.9.20", "8.9.2", "8.7.14", "9.0.1", "7.98.0",
        ]
        .into_iter()
        .map(record)
        .collect();

        assert_eq!(
            supported_tags(&records, 8),
            vec!["8.9.20", "8.8.12", "8.7.14"]
        );
    }

    #[test]
    fn test_prereleases_and_dev_tags_skipped() {
        let records: Vec<_> = ["8.9.0-rc1", "8.x-dev", "8.8.1"]
            .into_iter()
            .map(record)
            .collect();

        assert_eq!(supported_tags(&records, 8), vec!["8.8.1"]);
    }

    #[test]
    fn test_feed_fields_take_precedence() {
        let mut odd = record("1.2.3");
        odd.version_major = Some(8);
        odd.version_minor = Some(4);

        assert_eq!(supported_tags(&[odd], 8), vec!["1.2.3"]);
    }

    #[test]
    fn test_saved_version_appended_when_missing() {
        let tags = vec!["8.9.20".to_string(), "8.8.12".to_string()];

        let offered = offer_saved_version(tags.clone(), Some("8.6.18"));
        assert_eq!(offered, vec!["8.9.20", "8.8.12", "8.6.18"]);

        // Already present anywhere in the list: not duplicated
        let offered = offer_saved_version(tags.clone(), Some("8.8.12"));
        assert_eq!(offered, tags);

        assert_eq!(offer_saved_version(tags.clone(), Some("")), tags);
        assert_eq!(offer_saved_version(tags.clone(), None), tags);
    }

    #[test]
    fn test_parse_bare_and_wrapped_feeds() {
        let bare = "- version: 8.9.20\n  version_major: 8\n- version: 8.8.12\n";
        let page = parse_feed(bare).unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.next, None);

        let drupal_org = r#"{"list": [
            {"field_release_version": "8.9.20", "field_release_version_major": "8", "field_release_version_minor": "9"}
        ]}"#;
        let records = parse_feed(drupal_org).unwrap().records;
        assert_eq!(records[0].version, "8.9.20");
        assert_eq!(records[0].version_major, Some(8));
        assert_eq!(records[0].version_minor, Some(9));
    }

    #[tokio::test]
    async fn test_fetch_tags_from_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/releases.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"releases": [{"version": "8.9.20"}, {"version": "8.9.1"}, {"version": "9.1.0"}]}"#,
            ))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/releases.json", server.uri())).unwrap();
        let source = ReleaseSource::new(url, "test-agent");

        let records = source.fetch().await.unwrap();
        let tags = offer_saved_version(supported_tags(&records, 8), Some("8.4.8"));
        assert_eq!(tags, vec!["8.9.20", "8.4.8"]);
    }

    #[tokio::test]
    async fn test_fetch_follows_next_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/releases.json"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"list": [{"field_release_version": "8.9.20"}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/releases.json"))
            .and(query_param_is_missing("page"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"{{"list": [{{"field_release_version": "8.0.0"}}, {{"field_release_version": "8.1.0"}}],
                    "self": "{uri}/releases?page=0", "next": "{uri}/releases?page=1"}}"#,
                uri = server.uri()
            )))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/releases.json", server.uri())).unwrap();
        let records = ReleaseSource::new(url, "test-agent").fetch().await.unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(supported_tags(&records, 8), vec!["8.9.20", "8.1.0", "8.0.0"]);
    }

    #[tokio::test]
    async fn test_fetch_stops_on_looping_next_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/releases.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"releases": [{"version": "8.9.20"}], "next": "releases.json"}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/releases.json", server.uri())).unwrap();
        let records = ReleaseSource::new(url, "test-agent").fetch().await.unwrap();

        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_next_page_url_keeps_json_extension() {
        let current =
            Url::parse("https://www.drupal.org/api-d7/node.json?type=project_release").unwrap();

        let next = next_page_url(
            &current,
            "https://www.drupal.org/api-d7/node?type=project_release&page=1",
        )
        .unwrap();
        assert_eq!(
            next.as_str(),
            "https://www.drupal.org/api-d7/node.json?type=project_release&page=1"
        );

        let relative = next_page_url(&current, "other.json?page=2").unwrap();
        assert_eq!(relative.as_str(), "https://www.drupal.org/api-d7/other.json?page=2");
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/releases.json", server.uri())).unwrap();
        let source = ReleaseSource::new(url, "test-agent");

        assert!(matches!(
            source.fetch().await,
            Err(StarterError::MetadataStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_unparsable_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("releases: 12"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/releases.json", server.uri())).unwrap();
        let source = ReleaseSource::new(url, "test-agent");

        assert!(matches!(
            source.fetch().await,
            Err(StarterError::MetadataParse { .. })
        ));
    }
}
