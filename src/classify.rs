//! Request Classifier
//!
//! Maps a request path to the category that drives strategy selection.
//! Rules are evaluated in a fixed order and the first match wins:
//! static asset, image, api, then page as the catch-all.

use serde::Serialize;

// == Category ==
/// Classification bucket for a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    StaticAsset,
    Image,
    Api,
    Page,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::StaticAsset => "static-asset",
            Category::Image => "image",
            Category::Api => "api",
            Category::Page => "page",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Route Patterns ==
/// Extension and prefix lists the classifier matches against.
#[derive(Debug, Clone)]
pub struct RoutePatterns {
    pub static_extensions: Vec<String>,
    pub static_prefixes: Vec<String>,
    pub image_extensions: Vec<String>,
    pub media_prefixes: Vec<String>,
    pub api_prefixes: Vec<String>,
}

impl Default for RoutePatterns {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            static_extensions: owned(&["css", "js", "woff", "woff2", "ttf", "otf", "eot", "ico"]),
            static_prefixes: owned(&["/static/"]),
            image_extensions: owned(&["png", "jpg", "jpeg", "gif", "svg", "webp", "avif"]),
            media_prefixes: owned(&["/media/"]),
            api_prefixes: owned(&["/api/", "/admin/"]),
        }
    }
}

impl RoutePatterns {
    /// Classifies a request path. Total: unmatched paths are pages.
    pub fn classify(&self, path: &str) -> Category {
        let ext = extension(path);

        if matches_extension(ext, &self.static_extensions)
            || matches_prefix(path, &self.static_prefixes)
        {
            Category::StaticAsset
        } else if matches_extension(ext, &self.image_extensions)
            || matches_prefix(path, &self.media_prefixes)
        {
            Category::Image
        } else if matches_prefix(path, &self.api_prefixes) {
            Category::Api
        } else {
            Category::Page
        }
    }
}

/// Classifies a path against the default route patterns.
pub fn classify(path: &str) -> Category {
    RoutePatterns::default().classify(path)
}

/// Extension of the final path segment, if it has one.
fn extension(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next().unwrap_or(path);
    match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

fn matches_extension(ext: Option<&str>, candidates: &[String]) -> bool {
    ext.map(|ext| candidates.iter().any(|c| c.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

fn matches_prefix(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|p| path.starts_with(p.as_str()))
}
