use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use wxr_engine::{ConvertSettings, MarkdownPipeline, Page, PageInput, PageWriter};
use wxr_logging::{wxr_error, wxr_info, LogDestination};
use wxr_model::{load_website, CommonFields, ImportSettings, WebsiteInfo};

#[derive(Parser, Debug)]
#[command(name = "wxr2md")]
#[command(about = "Convert a WordPress export into Markdown pages with front matter")]
#[command(version)]
struct Cli {
    /// WordPress export (WXR) file
    #[arg(short, long)]
    source: PathBuf,

    /// Site directory; pages go below <output>/content
    #[arg(short, long)]
    output: PathBuf,

    /// Only keep posts by this author (repeatable)
    #[arg(long = "author")]
    authors: Vec<String>,

    /// Also convert items of this post type (repeatable)
    #[arg(long = "custom-post-type")]
    custom_post_types: Vec<String>,

    /// Also write the log to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    posts: usize,
    pages: usize,
    custom_posts: usize,
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let destination = match cli.log_file.as_deref() {
        Some(path) => LogDestination::Both(path),
        None => LogDestination::Terminal,
    };
    wxr_logging::initialize(destination, level);

    if let Err(err) = run(&cli) {
        wxr_error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<Summary> {
    let bytes = fs::read(&cli.source)
        .with_context(|| format!("reading export {}", cli.source.display()))?;
    let settings = ImportSettings {
        author_allow_list: cli.authors.clone(),
        custom_post_types: cli.custom_post_types.clone(),
    };
    let site = load_website(&bytes, &settings)
        .with_context(|| format!("loading export {}", cli.source.display()))?;
    wxr_info!(
        "{}: {} posts, {} pages, {} attachments, {} custom posts",
        site.title,
        site.posts.len(),
        site.pages.len(),
        site.attachments.len(),
        site.custom_posts.len()
    );

    let content = cli.output.join("content");
    let pipeline = MarkdownPipeline::new(ConvertSettings::default());
    let converter = SiteConverter {
        site: &site,
        host: site.host(),
        pipeline: &pipeline,
    };

    let mut posts = PageWriter::new(content.join("posts"))?;
    let mut pages = PageWriter::new(content.join("pages"))?;
    let mut custom: HashMap<String, PageWriter> = HashMap::new();
    for fields in &site.custom_posts {
        let writer = match custom.entry(fields.post_type.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(PageWriter::new(content.join(&fields.post_type))?),
        };
        converter.write_one(fields, writer)?;
    }

    let summary = Summary {
        posts: converter.write_all(&site.posts, &mut posts)?,
        pages: converter.write_all(&site.pages, &mut pages)?,
        custom_posts: site.custom_posts.len(),
    };
    wxr_info!(
        "done: {} posts, {} pages, {} custom posts written below {}",
        summary.posts,
        summary.pages,
        summary.custom_posts,
        content.display()
    );
    Ok(summary)
}

struct SiteConverter<'a> {
    site: &'a WebsiteInfo,
    host: Option<String>,
    pipeline: &'a MarkdownPipeline,
}

impl SiteConverter<'_> {
    fn write_all(&self, items: &[CommonFields], writer: &mut PageWriter) -> Result<usize> {
        for fields in items {
            self.write_one(fields, writer)?;
        }
        Ok(items.len())
    }

    fn write_one(&self, fields: &CommonFields, writer: &mut PageWriter) -> Result<PathBuf> {
        let page = Page::new(
            self.pipeline,
            self.site,
            self.host.as_deref(),
            &PageInput::from_fields(fields),
        )
        .with_context(|| format!("converting {:?}", fields.title))?;
        let path = writer
            .write_page(&fields.filename(), &page)
            .with_context(|| format!("writing {:?} into {}", fields.title, writer.dir().display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use pretty_assertions::assert_eq;

    const EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"
    xmlns:excerpt="http://wordpress.org/export/1.2/excerpt/"
    xmlns:content="http://purl.org/rss/1.0/modules/content/"
    xmlns:dc="http://purl.org/dc/elements/1.1/"
    xmlns:wp="http://wordpress.org/export/1.2/">
<channel>
    <title>Demo</title>
    <link>https://example.com</link>
    <item>
        <title>Same Title</title>
        <link>https://example.com/first/</link>
        <dc:creator><![CDATA[admin]]></dc:creator>
        <content:encoded><![CDATA[<p>First <a href="https://example.com/second/">link</a></p>]]></content:encoded>
        <wp:post_id>1</wp:post_id>
        <wp:status>publish</wp:status>
        <wp:post_type>post</wp:post_type>
    </item>
    <item>
        <title>Same Title</title>
        <link>https://example.com/second/</link>
        <dc:creator><![CDATA[admin]]></dc:creator>
        <content:encoded><![CDATA[<p>Second</p>]]></content:encoded>
        <wp:post_id>2</wp:post_id>
        <wp:status>publish</wp:status>
        <wp:post_type>post</wp:post_type>
    </item>
    <item>
        <title>About</title>
        <link>https://example.com/about/</link>
        <dc:creator><![CDATA[admin]]></dc:creator>
        <content:encoded><![CDATA[<p>Us</p>]]></content:encoded>
        <wp:post_id>3</wp:post_id>
        <wp:status>publish</wp:status>
        <wp:post_type>page</wp:post_type>
    </item>
    <item>
        <title>Tour Dates</title>
        <link>https://example.com/event/tour/</link>
        <dc:creator><![CDATA[admin]]></dc:creator>
        <content:encoded><![CDATA[<p>Soon</p>]]></content:encoded>
        <wp:post_id>4</wp:post_id>
        <wp:status>publish</wp:status>
        <wp:post_type>event</wp:post_type>
    </item>
</channel>
</rss>"#;

    fn cli(dir: &Path, custom: &[&str]) -> Cli {
        let source = dir.join("export.xml");
        fs::write(&source, EXPORT).unwrap();
        Cli {
            source,
            output: dir.join("site"),
            authors: Vec::new(),
            custom_post_types: custom.iter().map(|s| s.to_string()).collect(),
            log_file: None,
            verbose: false,
        }
    }

    #[test]
    fn converts_every_collection_into_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let summary = run(&cli(dir.path(), &["event"])).unwrap();
        assert_eq!(
            summary,
            Summary {
                posts: 2,
                pages: 1,
                custom_posts: 1
            }
        );

        let content = dir.path().join("site").join("content");
        let first = fs::read_to_string(content.join("posts").join("same-title.md")).unwrap();
        assert!(first.contains("[link](/second/)"), "{first}");
        assert!(content.join("posts").join("same-title-1.md").is_file());
        assert!(content.join("pages").join("about.md").is_file());
        assert!(content.join("event").join("tour-dates.md").is_file());
    }

    #[test]
    fn unknown_post_types_are_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let summary = run(&cli(dir.path(), &[])).unwrap();
        assert_eq!(summary.custom_posts, 0);
        assert!(!dir.path().join("site").join("content").join("event").exists());
    }

    #[test]
    fn missing_export_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = cli(dir.path(), &[]);
        args.source = dir.path().join("nope.xml");
        let err = run(&args).unwrap_err();
        assert!(format!("{err:#}").contains("reading export"), "{err:#}");
    }

    #[test]
    fn cli_accepts_repeated_filters() {
        let cli = Cli::try_parse_from([
            "wxr2md", "--source", "a.xml", "--output", "out", "--author", "ann", "--author", "bob",
            "--custom-post-type", "event",
        ])
        .unwrap();
        assert_eq!(cli.authors, vec!["ann", "bob"]);
        assert_eq!(cli.custom_post_types, vec!["event"]);
        assert_eq!(cli.log_file, None);
    }
}
