use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::filename::filename_from_title;

/// WordPress `wp:status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublishStatus {
    Attachment,
    Draft,
    Future,
    Inherit,
    Pending,
    Private,
    Publish,
    Static,
    Trash,
}

impl PublishStatus {
    /// Anything that is not publicly live on the source site.
    pub fn is_draft(self) -> bool {
        matches!(
            self,
            PublishStatus::Draft | PublishStatus::Future | PublishStatus::Pending | PublishStatus::Private
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown publish status {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for PublishStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "attachment" => Ok(PublishStatus::Attachment),
            "draft" => Ok(PublishStatus::Draft),
            "future" => Ok(PublishStatus::Future),
            "inherit" => Ok(PublishStatus::Inherit),
            "pending" => Ok(PublishStatus::Pending),
            "private" => Ok(PublishStatus::Private),
            "publish" => Ok(PublishStatus::Publish),
            "static" => Ok(PublishStatus::Static),
            "trash" => Ok(PublishStatus::Trash),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PublishStatus::Attachment => "attachment",
            PublishStatus::Draft => "draft",
            PublishStatus::Future => "future",
            PublishStatus::Inherit => "inherit",
            PublishStatus::Pending => "pending",
            PublishStatus::Private => "private",
            PublishStatus::Publish => "publish",
            PublishStatus::Static => "static",
            PublishStatus::Trash => "trash",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInfo {
    pub id: String,
    /// Normalized display name, see [`crate::normalize_term`].
    pub name: String,
    pub nice_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub id: String,
    /// Normalized display name, see [`crate::normalize_term`].
    pub name: String,
    pub slug: String,
}

/// Gutenberg footnote as stored in the `footnotes` post meta.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Footnote {
    pub id: String,
    pub content: String,
}

/// Fields shared by posts, pages, attachments and custom post types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonFields {
    pub post_id: String,
    pub post_type: String,
    pub author: String,
    pub title: String,
    pub link: String,
    /// Absent for items that were never published.
    pub publish_date: Option<DateTime<FixedOffset>>,
    pub last_modified: Option<DateTime<FixedOffset>>,
    pub status: PublishStatus,
    pub guid: String,
    pub post_format: Option<String>,
    pub description: String,
    pub content: String,
    pub excerpt: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub footnotes: Vec<Footnote>,
    pub featured_image_id: Option<String>,
}

impl CommonFields {
    /// Output file stem for this item, derived from the title alone.
    pub fn filename(&self) -> String {
        filename_from_title(&self.title)
    }

    pub fn is_draft(&self) -> bool {
        self.status.is_draft()
    }
}

/// Attachment record. `url` is the uploaded file, `fields.link` its
/// attachment page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentInfo {
    pub fields: CommonFields,
    pub url: String,
}

/// One entry of a `wp_navigation` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationLink {
    pub label: String,
    pub title: String,
    pub kind: String,
    pub url: String,
}
