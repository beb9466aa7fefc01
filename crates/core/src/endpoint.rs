//! API URL construction
//!
//! Resource URLs look like `{endpoint}/api/{version}/{prefix}/{segments...}/`,
//! always with a trailing slash. Paths are percent-encoded here and decoded
//! again by [`canonical_path`], which yields the exact string that gets
//! signed. Both directions live in this module so they cannot drift apart.

use url::Url;

use crate::config::{ApiPrefixes, ClientConfig};
use crate::error::{Error, Result};
use crate::path::{build_path, check_segments};

/// API family a URL belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Object,
    Directory,
    Metadata,
    Move,
    Bucket,
    Stats,
}

impl ResourceKind {
    fn prefix(self, prefixes: &ApiPrefixes) -> &str {
        match self {
            ResourceKind::Object => &prefixes.object,
            ResourceKind::Directory => &prefixes.directory,
            ResourceKind::Metadata => &prefixes.metadata,
            ResourceKind::Move => &prefixes.move_,
            ResourceKind::Bucket => &prefixes.bucket,
            ResourceKind::Stats => &prefixes.stats,
        }
    }
}

/// Builds percent-encoded resource URLs from configuration
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    base: Url,
    api_version: String,
    prefixes: ApiPrefixes,
}

impl UrlBuilder {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base = Url::parse(&config.endpoint)
            .map_err(|e| Error::Config(format!("invalid endpoint '{}': {e}", config.endpoint)))?;
        Ok(Self {
            base,
            api_version: config.api_version.clone(),
            prefixes: config.prefixes.clone(),
        })
    }

    /// Build a URL for `kind` from path segments and optional query parameters.
    ///
    /// Empty segments are dropped and each segment is trimmed of slashes.
    /// When `params` is empty no `?` is emitted. A `.` or `..` segment is an
    /// [`Error::InvalidPath`].
    pub fn build(&self, kind: ResourceKind, segments: &[&str], params: &[(&str, &str)]) -> Result<Url> {
        let mut all = vec!["api", self.api_version.as_str(), kind.prefix(&self.prefixes)];
        all.extend_from_slice(segments);
        let joined = build_path(&all);
        check_segments(&joined)?;

        // The url crate's path parser keeps '%' as is and reads '\' as '/'
        let path = format!("/{joined}/").replace('%', "%25").replace('\\', "%5C");

        let mut url = self.base.clone();
        url.set_path(&path);
        url.set_fragment(None);
        url.set_query(None);
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    pub fn object_url(&self, bucket: &str, dir_path: &str, name: &str, params: &[(&str, &str)]) -> Result<Url> {
        self.build(ResourceKind::Object, &[bucket, dir_path, name], params)
    }

    pub fn dir_url(&self, bucket: &str, dir_path: &str, name: &str, params: &[(&str, &str)]) -> Result<Url> {
        self.build(ResourceKind::Directory, &[bucket, dir_path, name], params)
    }

    pub fn metadata_url(&self, bucket: &str, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        self.build(ResourceKind::Metadata, &[bucket, path], params)
    }

    pub fn move_url(&self, bucket: &str, dir_path: &str, name: &str, params: &[(&str, &str)]) -> Result<Url> {
        self.build(ResourceKind::Move, &[bucket, dir_path, name], params)
    }

    pub fn bucket_url(&self, bucket: &str, params: &[(&str, &str)]) -> Result<Url> {
        self.build(ResourceKind::Bucket, &[bucket], params)
    }

    pub fn stats_url(&self, bucket: &str, params: &[(&str, &str)]) -> Result<Url> {
        self.build(ResourceKind::Stats, &[bucket], params)
    }
}

/// Merge parameters into a URL's query.
///
/// A parameter replaces every existing one with the same name; other
/// parameters keep all their values. The result is sorted by name, keeping
/// the order of repeated names. An empty result removes the `?` entirely.
pub fn merge_query<K, V>(url: &mut Url, params: &[(K, V)])
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if params.is_empty() {
        return;
    }

    let mut overrides: Vec<(String, String)> = Vec::with_capacity(params.len());
    for (key, value) in params {
        let (key, value) = (key.as_ref(), value.as_ref().to_string());
        match overrides.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => overrides.push((key.to_string(), value)),
        }
    }

    let mut merged: Vec<(String, String)> = url
        .query_pairs()
        .into_owned()
        .filter(|(key, _)| !overrides.iter().any(|(k, _)| k == key))
        .collect();
    merged.extend(overrides);
    merged.sort_by(|a, b| a.0.cmp(&b.0));

    url.set_query(None);
    if !merged.is_empty() {
        url.query_pairs_mut().extend_pairs(merged.iter());
    }
}

/// The unescaped `path?query` of a URL, as signed.
///
/// An empty query omits the `?`.
pub fn canonical_path(url: &Url) -> Result<String> {
    let path = urlencoding::decode(url.path())
        .map_err(|e| Error::InvalidUrl(format!("path is not UTF-8: {e}")))?;

    let query = match url.query() {
        Some(q) if !q.is_empty() => urlencoding::decode(&q.replace('+', " "))
            .map_err(|e| Error::InvalidUrl(format!("query is not UTF-8: {e}")))?
            .into_owned(),
        _ => String::new(),
    };

    if query.is_empty() {
        Ok(path.into_owned())
    } else {
        Ok(format!("{path}?{query}"))
    }
}
