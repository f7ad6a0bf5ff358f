//! WXR engine: turns WordPress HTML bodies into Markdown pages and writes
//! them out.
mod convert;
mod frontmatter;
mod markup;
mod normalize;
mod page;
mod persist;
mod pipeline;
mod postprocess;
mod settings;

pub use convert::{
    CodeBlockRule, ConversionRule, ConvertError, Converter, DirectiveRule, GistLinkRule,
    GoogleMapsIframeRule, Html2MdConverter, MoreMarkerRule, YouTubeIframeRule, MORE_MARKER,
};
pub use frontmatter::render_document;
pub use normalize::{HtmlNormalizer, NormalizeContext};
pub use page::{Page, PageError, PageInput};
pub use persist::{ensure_output_dir, PageWriter, PersistError};
pub use pipeline::{ItemBody, MarkdownPipeline};
pub use postprocess::{MarkdownPostProcessor, PostContext, Processed};
pub use settings::ConvertSettings;
