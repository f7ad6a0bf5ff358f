use pretty_assertions::assert_eq;
use wxr_engine::{ConvertSettings, MarkdownPostProcessor, PostContext, Processed};
use wxr_model::Footnote;

fn process_with(markdown: &str, host: Option<&str>, footnotes: &[Footnote]) -> Processed {
    let settings = ConvertSettings::default();
    let ctx = PostContext {
        item: "test item",
        site_host: host,
        footnotes,
        settings: &settings,
    };
    MarkdownPostProcessor::new().process(markdown, &ctx)
}

fn process(markdown: &str) -> String {
    process_with(markdown, Some("example.com"), &[]).markdown
}

fn footnote(id: &str, content: &str) -> Footnote {
    Footnote {
        id: id.to_string(),
        content: content.to_string(),
    }
}

#[test]
fn own_host_links_become_relative() {
    let md = "[a](https://example.com/2020/01/post/) and http://example.com/about/";
    assert_eq!(process(md), "[a](/2020/01/post/) and /about/");
}

#[test]
fn foreign_and_www_hosts_are_untouched() {
    let md = "[a](https://other.com/x) [b](https://www.example.com/y) https://example.community/z";
    assert_eq!(process(md), md);
}

#[test]
fn ordered_list_markers_all_become_one() {
    assert_eq!(process("1. a\n2. b\n3. c"), "1. a\n1. b\n1. c");
    assert_eq!(process("Steps:\n\n  7. nested\n  12. deeper"), "Steps:\n\n  1. nested\n  1. deeper");
}

#[test]
fn list_markers_inside_fences_keep_their_numbers() {
    let md = "```\n2. not a list\n```\n\n5. item";
    assert_eq!(process(md), "```\n2. not a list\n```\n\n1. item");
}

#[test]
fn blank_runs_collapse_to_one_blank_line() {
    assert_eq!(process("a\n\n\n\nb\n  \n\t\n\nc"), "a\n\nb\n\nc");
}

#[test]
fn hard_breaks_are_preserved() {
    assert_eq!(process("line one  \nline two"), "line one  \nline two");
}

#[test]
fn bare_youtube_url_becomes_embed() {
    let md = "Watch:\n\nhttps://www.youtube.com/watch?v=dQw4w9WgXcQ\n\nand https://youtu.be/abc\\_DEF-1 too";
    assert_eq!(
        process(md),
        "Watch:\n\n{{< youtube dQw4w9WgXcQ >}}\n\nand {{< youtube abc_DEF-1 >}} too"
    );
}

#[test]
fn youtube_url_in_anchor_or_iframe_is_untouched() {
    let anchor = r#"<a href="https://www.youtube.com/watch?v=dQw4w9WgXcQ">clip</a>"#;
    assert_eq!(process(anchor), anchor);
    let iframe = r#"<iframe src="https://www.youtube.com/watch?v=dQw4w9WgXcQ"></iframe>"#;
    assert_eq!(process(iframe), iframe);
    let link = "[clip](https://www.youtube.com/watch?v=dQw4w9WgXcQ)";
    assert_eq!(process(link), link);
}

#[test]
fn catlist_shortcode_becomes_directive() {
    assert_eq!(
        process(r#"[catlist name="My Travels" catlink=yes numberposts=5]"#),
        r#"{{< catlist category="my-travels" catlink=true count=5 >}}"#
    );
    assert_eq!(
        process(r#"[catlist name="news\_room"]"#),
        r#"{{< catlist category="news_room" catlink=false count=10 >}}"#
    );
}

#[test]
fn footnotes_are_numbered_in_declaration_order() {
    let md = "First[1](#zz-id) then second[2](#aa-id).";
    let notes = [footnote("zz-id", "Zed note."), footnote("aa-id", "Aye\nnote.")];
    let out = process_with(md, None, &notes).markdown;
    assert_eq!(out, "First[^1] then second[^2].\n\n[^1]: Zed note.\n[^2]: Aye note.");
}

#[test]
fn footnote_reference_wrapped_in_sup_is_unwrapped() {
    let md = "Claim<sup data-fn=\"f1\" class=\"fn\">[1](#f1)</sup>.";
    let out = process_with(md, None, &[footnote("f1", "Source.")]).markdown;
    assert_eq!(out, "Claim[^1].\n\n[^1]: Source.");

    let raw = "Claim<sup data-fn=\"f1\" class=\"fn\"><a href=\"#f1\" id=\"f1-link\">1</a></sup>.";
    let out = process_with(raw, None, &[footnote("f1", "Source.")]).markdown;
    assert_eq!(out, "Claim[^1].\n\n[^1]: Source.");
}

#[test]
fn more_marker_splits_summary_from_body() {
    let md = "Intro with {{< youtube abc >}} embed.\n\n<!--more-->\n\nRest of the post.";
    let out = process_with(md, None, &[]);
    assert_eq!(out.summary.as_deref(), Some("Intro with  embed."));
    assert_eq!(out.markdown, "Intro with {{< youtube abc >}} embed.\n\nRest of the post.");
}

#[test]
fn only_first_more_marker_splits() {
    let out = process_with("a<!--more-->b<!--more-->c", None, &[]);
    assert_eq!(out.summary.as_deref(), Some("a"));
    assert_eq!(out.markdown, "a\n\nb<!--more-->c");
}

#[test]
fn missing_more_marker_means_no_summary() {
    assert_eq!(process_with("just text", None, &[]).summary, None);
}

#[test]
fn pass_is_idempotent() {
    let md = "Intro https://example.com/x\n\n\n\n  \n3. one\n9. two\n\n\
              See[1](#n1) and https://youtu.be/abc\n\n[catlist name=\"A B\"]\n\n\n";
    let notes = [footnote("n1", "Note.")];
    let once = process_with(md, Some("example.com"), &notes).markdown;
    let twice = process_with(&once, Some("example.com"), &notes).markdown;
    assert_eq!(once, twice);
}
