//! WXR model: decodes a WordPress export and builds the typed website model.
mod decode;
mod feed;
mod fields;
mod filename;
mod navigation;
mod provider;
mod website;

pub use decode::{decode_feed, strip_invalid_chars, FeedError};
pub use feed::{first_value, ExtensionNode, Extensions, RawCategory, RawFeed, RawItem};
pub use fields::{
    AttachmentInfo, CategoryInfo, CommonFields, Footnote, NavigationLink, PublishStatus, TagInfo,
    UnknownStatus,
};
pub use filename::{filename_from_title, normalize_term};
pub use navigation::parse_navigation;
pub use provider::{ImageInfo, ImageNotFound, ImageUrlProvider, StaticImageProvider};
pub use website::{
    classify_item, load_website, ContentItem, ImportSettings, ItemOutcome, ModelError, SkipReason,
    WebsiteInfo,
};
