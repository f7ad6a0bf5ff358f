use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use url::Url;
use wxr_logging::{wxr_debug, wxr_info, wxr_warn};

use crate::decode::{decode_feed, FeedError};
use crate::feed::{ExtensionNode, RawFeed, RawItem};
use crate::fields::{
    AttachmentInfo, CategoryInfo, CommonFields, Footnote, NavigationLink, PublishStatus, TagInfo,
};
use crate::filename::normalize_term;
use crate::navigation::parse_navigation;
use crate::provider::{ImageInfo, ImageNotFound, ImageUrlProvider};

/// Post types that carry no content worth converting.
const IGNORED_POST_TYPES: &[&str] = &[
    "amp_validated_url",
    "nav_menu_item",
    "custom_css",
    "wp_global_styles",
];

const POST_FORMAT_PREFIX: &str = "post-format-";
/// WordPress writes these for items that were never published.
const WORDPRESS_ZERO_DATES: &[&str] = &["0000-00-00", "-0001"];

#[derive(Debug, Clone, Default)]
pub struct ImportSettings {
    /// Only posts by these authors are kept. Empty keeps everyone.
    pub author_allow_list: Vec<String>,
    /// Post types collected into [`WebsiteInfo::custom_posts`].
    pub custom_post_types: Vec<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ModelError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error("item {title:?} ({link}) has unknown publish status {status:?}")]
    UnknownStatus {
        title: String,
        link: String,
        status: String,
    },
}

/// Why an item was left out of the model. None of these are failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Trash,
    AuthorFiltered { author: String },
    IgnoredType { post_type: String },
    UnknownType { post_type: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome<T> {
    Accepted(T),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentItem {
    Post(CommonFields),
    Page(CommonFields),
    Attachment(AttachmentInfo),
    CustomPost(CommonFields),
    Navigation(Vec<NavigationLink>),
}

/// Channel-level view of an export plus every item that survived ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebsiteInfo {
    pub title: String,
    /// Authoritative base link; its host drives relative-link rewriting.
    pub link: String,
    pub description: String,
    pub language: String,
    pub pub_date: Option<DateTime<FixedOffset>>,
    pub categories: Vec<CategoryInfo>,
    pub tags: Vec<TagInfo>,
    pub navigation: Vec<NavigationLink>,
    pub posts: Vec<CommonFields>,
    pub pages: Vec<CommonFields>,
    pub attachments: Vec<AttachmentInfo>,
    pub custom_posts: Vec<CommonFields>,
    attachment_index: HashMap<String, usize>,
}

/// Decode an export and build the website model in one go.
pub fn load_website(bytes: &[u8], settings: &ImportSettings) -> Result<WebsiteInfo, ModelError> {
    let feed = decode_feed(bytes)?;
    WebsiteInfo::from_feed(&feed, settings)
}

impl WebsiteInfo {
    pub fn from_feed(feed: &RawFeed, settings: &ImportSettings) -> Result<Self, ModelError> {
        let mut site = WebsiteInfo {
            title: feed.title.clone(),
            link: feed.link.clone(),
            description: feed.description.clone(),
            language: feed.language.clone(),
            pub_date: feed
                .pub_date
                .as_deref()
                .and_then(|d| DateTime::parse_from_rfc2822(d).ok()),
            categories: feed
                .extensions_named("wp:category")
                .iter()
                .map(category_from_extension)
                .collect(),
            tags: feed
                .extensions_named("wp:tag")
                .iter()
                .map(tag_from_extension)
                .collect(),
            ..WebsiteInfo::default()
        };

        for item in &feed.items {
            match classify_item(item, settings)? {
                ItemOutcome::Accepted(content) => site.push(content),
                ItemOutcome::Skipped(reason) => log_skip(item, &reason),
            }
        }

        wxr_info!(
            "Loaded {:?}: {} posts, {} pages, {} attachments, {} custom posts",
            site.title,
            site.posts.len(),
            site.pages.len(),
            site.attachments.len(),
            site.custom_posts.len()
        );
        Ok(site)
    }

    /// Host of the base link, e.g. `example.com` for `https://example.com/blog`.
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.link)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
    }

    pub fn attachment(&self, id: &str) -> Option<&AttachmentInfo> {
        self.attachment_index
            .get(id.trim())
            .and_then(|index| self.attachments.get(*index))
    }

    fn push(&mut self, content: ContentItem) {
        match content {
            ContentItem::Post(fields) => self.posts.push(fields),
            ContentItem::Page(fields) => self.pages.push(fields),
            ContentItem::CustomPost(fields) => self.custom_posts.push(fields),
            ContentItem::Attachment(attachment) => {
                self.attachment_index
                    .insert(attachment.fields.post_id.clone(), self.attachments.len());
                self.attachments.push(attachment);
            }
            ContentItem::Navigation(links) => self.navigation.extend(links),
        }
    }
}

impl ImageUrlProvider for WebsiteInfo {
    fn image_info(&self, id: &str) -> Result<ImageInfo, ImageNotFound> {
        self.attachment(id)
            .map(|attachment| ImageInfo {
                url: attachment.url.clone(),
                title: attachment.fields.title.clone(),
            })
            .ok_or_else(|| ImageNotFound { id: id.to_string() })
    }
}

/// Sort one feed item into the model. Unknown publish statuses are the only
/// error; everything else that cannot be used comes back as a skip.
pub fn classify_item(
    item: &RawItem,
    settings: &ImportSettings,
) -> Result<ItemOutcome<ContentItem>, ModelError> {
    let post_type = item.extension("wp:post_type").unwrap_or_default();
    if IGNORED_POST_TYPES.contains(&post_type) {
        return Ok(ItemOutcome::Skipped(SkipReason::IgnoredType {
            post_type: post_type.to_string(),
        }));
    }
    let is_custom = settings.custom_post_types.iter().any(|t| t == post_type);
    if !is_custom && !matches!(post_type, "attachment" | "page" | "post" | "wp_navigation") {
        return Ok(ItemOutcome::Skipped(SkipReason::UnknownType {
            post_type: post_type.to_string(),
        }));
    }

    let raw_status = item.extension("wp:status").unwrap_or_default();
    let status: PublishStatus = raw_status.parse().map_err(|_| ModelError::UnknownStatus {
        title: item.title.clone(),
        link: item.link.clone(),
        status: raw_status.to_string(),
    })?;
    if status == PublishStatus::Trash {
        return Ok(ItemOutcome::Skipped(SkipReason::Trash));
    }

    let content = match post_type {
        "wp_navigation" => ContentItem::Navigation(parse_navigation(&item.content)),
        "attachment" => ContentItem::Attachment(AttachmentInfo {
            url: item
                .extension("wp:attachment_url")
                .unwrap_or_default()
                .to_string(),
            fields: common_fields(item, status),
        }),
        "page" => ContentItem::Page(common_fields(item, status)),
        "post" => {
            if !settings.author_allow_list.is_empty()
                && !settings.author_allow_list.iter().any(|a| *a == item.author)
            {
                return Ok(ItemOutcome::Skipped(SkipReason::AuthorFiltered {
                    author: item.author.clone(),
                }));
            }
            ContentItem::Post(common_fields(item, status))
        }
        _ => ContentItem::CustomPost(common_fields(item, status)),
    };
    Ok(ItemOutcome::Accepted(content))
}

fn log_skip(item: &RawItem, reason: &SkipReason) {
    match reason {
        SkipReason::Trash => wxr_info!("Skipping trashed item {:?} ({})", item.title, item.link),
        SkipReason::AuthorFiltered { author } => wxr_warn!(
            "Skipping {:?} ({}): author {:?} is not in the allow list",
            item.title,
            item.link,
            author
        ),
        SkipReason::IgnoredType { post_type } => {
            wxr_debug!("Ignoring {} item {:?}", post_type, item.title)
        }
        SkipReason::UnknownType { post_type } => wxr_warn!(
            "Ignoring {:?} ({}): unknown post type {:?}",
            item.title,
            item.link,
            post_type
        ),
    }
}

fn common_fields(item: &RawItem, status: PublishStatus) -> CommonFields {
    let mut categories = Vec::new();
    let mut tags = Vec::new();
    let mut post_format = None;
    for category in &item.categories {
        match category.domain.as_deref() {
            Some("category") => categories.push(normalize_term(&category.name)),
            Some("post_tag") => tags.push(normalize_term(&category.name)),
            Some("post_format") => {
                let slug = category.nicename.as_deref().unwrap_or(&category.name);
                post_format = Some(slug.trim_start_matches(POST_FORMAT_PREFIX).to_string());
            }
            other => wxr_warn!(
                "Dropping category {:?} of {:?}: unknown domain {:?}",
                category.name,
                item.title,
                other
            ),
        }
    }

    let meta = item.extensions_named("wp:postmeta");
    CommonFields {
        post_id: item.extension("wp:post_id").unwrap_or_default().to_string(),
        post_type: item.extension("wp:post_type").unwrap_or_default().to_string(),
        author: item.author.clone(),
        title: item.title.clone(),
        link: item.link.clone(),
        publish_date: publish_date(item),
        last_modified: item.extension("wp:post_modified_gmt").and_then(parse_wp_date),
        status,
        guid: item.guid.clone(),
        post_format,
        description: item.description.clone(),
        content: item.content.clone(),
        excerpt: item.excerpt.clone(),
        categories,
        tags,
        footnotes: footnotes(item, meta),
        featured_image_id: meta_value(meta, "_thumbnail_id")
            .filter(|id| !id.is_empty())
            .map(str::to_string),
    }
}

fn meta_value<'a>(meta: &'a [ExtensionNode], key: &str) -> Option<&'a str> {
    meta.iter()
        .find(|entry| entry.child_value("wp:meta_key") == Some(key))
        .and_then(|entry| entry.child_value("wp:meta_value"))
}

fn footnotes(item: &RawItem, meta: &[ExtensionNode]) -> Vec<Footnote> {
    let Some(raw) = meta_value(meta, "footnotes").filter(|v| !v.is_empty()) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<Footnote>>(raw) {
        Ok(footnotes) => footnotes,
        Err(err) => {
            wxr_warn!("Ignoring unreadable footnotes of {:?}: {}", item.title, err);
            Vec::new()
        }
    }
}

fn publish_date(item: &RawItem) -> Option<DateTime<FixedOffset>> {
    item.pub_date
        .as_deref()
        .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
        .or_else(|| item.extension("wp:post_date_gmt").and_then(parse_wp_date))
}

fn parse_wp_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() || WORDPRESS_ZERO_DATES.iter().any(|zero| value.starts_with(zero)) {
        return None;
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc().into())
}

fn category_from_extension(node: &ExtensionNode) -> CategoryInfo {
    CategoryInfo {
        id: node.child_value("wp:term_id").unwrap_or_default().to_string(),
        name: normalize_term(node.child_value("wp:cat_name").unwrap_or_default()),
        nice_name: node
            .child_value("wp:category_nicename")
            .unwrap_or_default()
            .to_string(),
    }
}

fn tag_from_extension(node: &ExtensionNode) -> TagInfo {
    TagInfo {
        id: node.child_value("wp:term_id").unwrap_or_default().to_string(),
        name: normalize_term(node.child_value("wp:tag_name").unwrap_or_default()),
        slug: node.child_value("wp:tag_slug").unwrap_or_default().to_string(),
    }
}
