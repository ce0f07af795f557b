//! Listing API wire types.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::storage::record::Record;

/// Top-level listing response.
#[derive(Debug, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Vec<Child>,
    #[serde(default)]
    pub after: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Child {
    pub data: Post,
}

/// One post as returned by the listing API.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "link_flair_text")]
    pub flair: Option<String>,
    #[serde(default)]
    pub num_comments: u32,
    #[serde(default)]
    pub author: String,
    /// Seconds since the epoch; the API sends a float.
    #[serde(default)]
    pub created_utc: f64,
}

impl Post {
    /// Creation time, or now if `created_utc` is out of range.
    pub fn created_at(&self) -> DateTime<Utc> {
        // Whole seconds only; the API has no finer precision
        DateTime::from_timestamp(self.created_utc as i64, 0).unwrap_or_else(Utc::now)
    }

    pub fn into_record(self) -> Record {
        let observed_at = self.created_at();
        Record::new(
            self.id,
            observed_at,
            self.flair,
            self.url,
            self.author,
            self.num_comments,
        )
    }
}

/// One page of posts plus the cursor for the next page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub posts: Vec<Post>,
    /// `None` when this was the last page.
    pub after: Option<String>,
}

impl From<Listing> for Page {
    fn from(listing: Listing) -> Self {
        Self {
            posts: listing
                .data
                .children
                .into_iter()
                .map(|child| child.data)
                .collect(),
            after: listing.data.after.filter(|after| !after.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"{
        "kind": "Listing",
        "data": {
            "after": "t3_def",
            "children": [
                {"kind": "t3", "data": {
                    "id": "abc", "title": "Lights", "url": "https://i.example/abc.jpg",
                    "link_flair_text": "Sighting", "num_comments": 12,
                    "author": "observer", "created_utc": 1690394645.0
                }},
                {"kind": "t3", "data": {
                    "id": "def", "title": "Disc", "url": "https://i.example/def.jpg",
                    "link_flair_text": null, "num_comments": 0,
                    "author": "skywatch", "created_utc": 1690394000.5
                }}
            ]
        }
    }"#;

    #[test]
    fn test_parse_listing_page() {
        let listing: Listing = serde_json::from_str(LISTING).unwrap();
        let page = Page::from(listing);

        assert_eq!(page.after.as_deref(), Some("t3_def"));
        assert_eq!(page.posts.len(), 2);
        assert_eq!(page.posts[0].flair.as_deref(), Some("Sighting"));
        assert_eq!(page.posts[1].flair, None);
    }

    #[test]
    fn test_empty_after_is_last_page() {
        let listing: Listing =
            serde_json::from_str(r#"{"data": {"after": "", "children": []}}"#).unwrap();
        assert_eq!(Page::from(listing), Page::default());
    }

    #[test]
    fn test_post_into_record() {
        let listing: Listing = serde_json::from_str(LISTING).unwrap();
        let post = Page::from(listing).posts.remove(0);
        let record = post.into_record();

        assert_eq!(record.id, "abc");
        assert_eq!(record.post_time(), "2023-07-26 18:04:05");
        assert_eq!(record.category.as_deref(), Some("Sighting"));
        assert_eq!(record.author, "observer");
        assert_eq!(record.comment_count, 12);
    }
}
