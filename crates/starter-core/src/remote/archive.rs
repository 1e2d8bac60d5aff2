//! Base distribution download and cache
//!
//! Archives are zip files fetched once per package version and unpacked into
//! `<cache root>/<package>/<version>`, with the download URL recorded next to
//! it in `<version>.source`. A later run for the same version and URL reuses
//! the unpacked directory without touching the network.

use crate::error::{Result, StarterError};
use crate::product::GeneratorProfile;
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use url::Url;
use zip::ZipArchive;

/// Environment variable overriding the cache root
pub const CACHE_DIR_ENV: &str = "WEB_STARTER_CACHE_DIR";

/// Downloads and caches base distribution archives
pub struct ArchiveFetcher {
    url_template: String,
    cache_root: PathBuf,
    client: reqwest::Client,
}

impl ArchiveFetcher {
    /// Create a fetcher; `url_template` contains a `{version}` placeholder
    pub fn new(url_template: impl Into<String>, cache_root: PathBuf, user_agent: &str) -> Self {
        Self {
            url_template: url_template.into(),
            cache_root,
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Create a fetcher from a generator profile, honoring env overrides
    pub fn from_profile<P: GeneratorProfile>(profile: &P) -> Self {
        let url_template = std::env::var(profile.archive_url_env())
            .unwrap_or_else(|_| profile.default_archive_url().to_string());
        let cache_root = std::env::var_os(CACHE_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("web-starter"));
        Self::new(url_template, cache_root, profile.user_agent())
    }

    /// Download URL for `version`
    pub fn archive_url(&self, version: &str) -> Result<Url> {
        validate_version(version)?;
        let url_str = self.url_template.replace("{version}", version);
        Url::parse(&url_str).map_err(|_| StarterError::ArchiveUrl(url_str))
    }

    /// Cache directory for a package version
    pub fn cache_path(&self, package: &str, version: &str) -> PathBuf {
        self.cache_root.join(package).join(version)
    }

    /// Make `package` at `version` available locally and return its directory
    pub async fn fetch(&self, package: &str, version: &str) -> Result<PathBuf> {
        let url = self.archive_url(version)?;
        let target = self.cache_path(package, version);
        let source_file = target.with_file_name(format!("{}.source", version));

        if fs::try_exists(&target)
            .await
            .map_err(|e| StarterError::io(&target, e))?
        {
            let cached_from = fs::read_to_string(&source_file).await.unwrap_or_default();
            if cached_from.trim() == url.as_str() {
                tracing::info!(path = %target.display(), "using cached archive");
                return Ok(target);
            }

            tracing::warn!(
                path = %target.display(),
                url = %url,
                "cached archive was downloaded from another URL, replacing it"
            );
            fs::remove_dir_all(&target)
                .await
                .map_err(|e| StarterError::io(&target, e))?;
        }

        let bytes = self.download(&url).await?;

        // Unpack next to the final location, then move it into place
        let partial = target.with_file_name(format!("{}.partial", version));
        if fs::try_exists(&partial).await.unwrap_or(false) {
            fs::remove_dir_all(&partial)
                .await
                .map_err(|e| StarterError::io(&partial, e))?;
        }

        let unpack_dir = partial.clone();
        let url_str = url.to_string();
        let count = tokio::task::spawn_blocking(move || extract_zip(&bytes, &unpack_dir))
            .await
            .map_err(|e| StarterError::io(&partial, std::io::Error::other(e)))?
            .map_err(|err| match err {
                ExtractError::Zip(source) => StarterError::Archive {
                    url: url_str,
                    source,
                },
                ExtractError::Io(path, source) => StarterError::io(path, source),
            })?;

        fs::rename(&partial, &target)
            .await
            .map_err(|e| StarterError::io(&target, e))?;
        fs::write(&source_file, url.as_str())
            .await
            .map_err(|e| StarterError::io(&source_file, e))?;

        tracing::info!(files = count, path = %target.display(), "unpacked archive");
        Ok(target)
    }

    async fn download(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| StarterError::Download {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(StarterError::DownloadStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| StarterError::Download {
                url: url.to_string(),
                source,
            })?;
        Ok(bytes.to_vec())
    }
}

/// Versions become a cache directory name, so they must be a single plain
/// path component
fn validate_version(version: &str) -> Result<()> {
    let mut components = Path::new(version).components();
    let single_normal = matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none();

    if !single_normal || version.contains(['/', '\\']) || version.starts_with('.') {
        return Err(StarterError::Validation(format!(
            "Invalid Drupal version: {:?}",
            version
        )));
    }
    Ok(())
}

#[derive(Debug)]
enum ExtractError {
    Zip(zip::result::ZipError),
    Io(PathBuf, std::io::Error),
}

impl From<zip::result::ZipError> for ExtractError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Zip(err)
    }
}

/// Unpack a zip archive into `dest`, returning the number of files written
///
/// When every entry lives under one top-level directory (`drupal-8.9.20/...`)
/// that directory is stripped. Entries that would escape `dest` are skipped.
fn extract_zip(zip_bytes: &[u8], dest: &Path) -> std::result::Result<usize, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(zip_bytes))?;
    std::fs::create_dir_all(dest).map_err(|e| ExtractError::Io(dest.to_path_buf(), e))?;

    let mut entries: Vec<(usize, PathBuf)> = Vec::new();
    for i in 0..archive.len() {
        let file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        match file.enclosed_name() {
            Some(path) => entries.push((i, path)),
            None => tracing::warn!(name = file.name(), "skipping unsafe archive entry"),
        }
    }

    let prefix = common_root(entries.iter().map(|(_, p)| p.as_path()));

    let mut written = 0;
    for (i, path) in entries {
        let relative = match &prefix {
            Some(prefix) => path.strip_prefix(prefix).unwrap_or(&path).to_path_buf(),
            None => path,
        };
        let target = dest.join(&relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ExtractError::Io(parent.to_path_buf(), e))?;
        }

        let mut file = archive.by_index(i)?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| ExtractError::Io(target.clone(), e))?;
        std::fs::write(&target, &contents).map_err(|e| ExtractError::Io(target.clone(), e))?;
        written += 1;
    }

    Ok(written)
}

/// The single top-level directory shared by all paths, if there is one
fn common_root<'a>(paths: impl Iterator<Item = &'a Path>) -> Option<PathBuf> {
    let mut root: Option<&std::ffi::OsStr> = None;

    for path in paths {
        let mut components = path.components();
        let first = match components.next() {
            Some(Component::Normal(first)) => first,
            _ => return None,
        };
        // A file directly at the top level means there is no wrapper directory
        components.next()?;

        match root {
            Some(existing) if existing != first => return None,
            _ => root = Some(first),
        }
    }

    root.map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn build_zip(files: &[(&str, &str)]) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            let options = SimpleFileOptions::default();
            for (name, content) in files {
                zip.start_file(*name, options).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer
    }

    #[test]
    fn test_extract_strips_single_root() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = build_zip(&[
            ("drupal-8.9.20/index.php", "<?php"),
            ("drupal-8.9.20/core/lib/Drupal.php", "<?php"),
            ("drupal-8.9.20/.htaccess", "Options -Indexes"),
        ]);

        let count = extract_zip(&bytes, dir.path()).unwrap();

        assert_eq!(count, 3);
        assert!(dir.path().join("index.php").is_file());
        assert!(dir.path().join("core/lib/Drupal.php").is_file());
        assert!(dir.path().join(".htaccess").is_file());
    }

    #[test]
    fn test_extract_keeps_layout_without_single_root() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = build_zip(&[("index.php", "<?php"), ("core/install.php", "<?php")]);

        extract_zip(&bytes, dir.path()).unwrap();

        assert!(dir.path().join("index.php").is_file());
        assert!(dir.path().join("core/install.php").is_file());
    }

    #[test]
    fn test_common_root() {
        let paths = [Path::new("a/x"), Path::new("a/y/z")];
        assert_eq!(common_root(paths.into_iter()), Some(PathBuf::from("a")));

        let paths = [Path::new("a/x"), Path::new("b/y")];
        assert_eq!(common_root(paths.into_iter()), None);

        let paths = [Path::new("a/x"), Path::new("top.txt")];
        assert_eq!(common_root(paths.into_iter()), None);
    }

    #[test]
    fn test_archive_url_template() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = ArchiveFetcher::new(
            "https://ftp.drupal.org/files/projects/drupal-{version}.zip",
            dir.path().to_path_buf(),
            "test-agent",
        );

        assert_eq!(
            fetcher.archive_url("8.9.20").unwrap().as_str(),
            "https://ftp.drupal.org/files/projects/drupal-8.9.20.zip"
        );
        assert_eq!(
            fetcher.cache_path("drupal", "8.9.20"),
            dir.path().join("drupal").join("8.9.20")
        );
    }

    #[tokio::test]
    async fn test_fetch_downloads_then_reuses_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drupal-8.9.20.zip"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(build_zip(&[("drupal-8.9.20/index.php", "<?php")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let cache = tempfile::tempdir().unwrap();
        let fetcher = ArchiveFetcher::new(
            format!("{}/drupal-{{version}}.zip", server.uri()),
            cache.path().to_path_buf(),
            "test-agent",
        );

        let first = fetcher.fetch("drupal", "8.9.20").await.unwrap();
        assert!(first.join("index.php").is_file());

        let second = fetcher.fetch("drupal", "8.9.20").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_fetch_rejects_path_like_versions() {
        let cache = tempfile::tempdir().unwrap();
        // A directory the version would resolve to if it were joined as-is
        std::fs::create_dir_all(cache.path().join("secrets")).unwrap();
        let fetcher = ArchiveFetcher::new(
            "http://127.0.0.1:9/drupal-{version}.zip",
            cache.path().join("cache"),
            "test-agent",
        );

        for version in ["../../secrets", "../secrets", "8.9/../..", "..", ".", "", "8.9\\x"] {
            assert!(
                matches!(
                    fetcher.fetch("drupal", version).await,
                    Err(StarterError::Validation(_))
                ),
                "{:?} accepted",
                version
            );
        }
        assert!(validate_version("8.9.20").is_ok());
        assert!(validate_version("8.9.0-rc1").is_ok());
    }

    #[tokio::test]
    async fn test_changed_archive_url_replaces_cache() {
        let first_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(build_zip(&[("drupal-8.9.20/origin.txt", "first")])),
            )
            .expect(1)
            .mount(&first_server)
            .await;
        let second_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(build_zip(&[("drupal-8.9.20/origin.txt", "second")])),
            )
            .expect(1)
            .mount(&second_server)
            .await;

        let cache = tempfile::tempdir().unwrap();
        let fetcher_for = |server: &MockServer| {
            ArchiveFetcher::new(
                format!("{}/drupal-{{version}}.zip", server.uri()),
                cache.path().to_path_buf(),
                "test-agent",
            )
        };

        let first = fetcher_for(&first_server).fetch("drupal", "8.9.20").await.unwrap();
        assert_eq!(std::fs::read_to_string(first.join("origin.txt")).unwrap(), "first");

        let second = fetcher_for(&second_server).fetch("drupal", "8.9.20").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(std::fs::read_to_string(second.join("origin.txt")).unwrap(), "second");
        assert!(!cache.path().join("drupal/8.9.20.partial").exists());
        assert_eq!(
            std::fs::read_to_string(cache.path().join("drupal/8.9.20.source")).unwrap(),
            format!("{}/drupal-8.9.20.zip", second_server.uri())
        );
    }

    #[tokio::test]
    async fn test_fetch_missing_archive() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let cache = tempfile::tempdir().unwrap();
        let fetcher = ArchiveFetcher::new(
            format!("{}/drupal-{{version}}.zip", server.uri()),
            cache.path().to_path_buf(),
            "test-agent",
        );

        let result = fetcher.fetch("drupal", "8.0.0").await;
        assert!(matches!(
            result,
            Err(StarterError::DownloadStatus { status: 404, .. })
        ));
        assert!(!fetcher.cache_path("drupal", "8.0.0").exists());
    }
}
