//! WordPress REST API models, trimmed to the fields the site reads.

use serde::{Deserialize, Serialize};

/// `{ "rendered": "..." }` wrapper used by WordPress for HTML fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub slug: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub title: Rendered,
    #[serde(default)]
    pub excerpt: Rendered,
    #[serde(default)]
    pub content: Rendered,
    #[serde(default)]
    pub categories: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub count: u64,
}

/// Listing filters. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PostQuery {
    pub search: Option<String>,
    pub categories: Option<String>,
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

impl PostQuery {
    pub const MAX_PER_PAGE: u32 = 100;

    /// Query pairs for the provider, with `per_page` clamped to 1..=100.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(categories) = self
            .categories
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            pairs.push(("categories", categories.to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page", per_page.clamp(1, Self::MAX_PER_PAGE).to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.max(1).to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total_pages: u32,
}

/// An empty listing still has one (empty) page.
impl Default for PostPage {
    fn default() -> Self {
        Self {
            posts: Vec::new(),
            total_pages: 1,
        }
    }
}

/// Payload for creating a post. Fields are expected to be sanitized already.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<u64>,
}

impl NewPost {
    pub fn published(title: String, content: String, excerpt: Option<String>, categories: Vec<u64>) -> Self {
        Self {
            title,
            content,
            excerpt,
            status: "publish",
            categories,
        }
    }
}

/// Minimal view of a created post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPost {
    pub id: u64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub link: String,
}
