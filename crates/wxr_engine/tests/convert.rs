use pretty_assertions::assert_eq;
use regex::{Captures, Regex};
use wxr_engine::{ConversionRule, ConvertSettings, Converter, Html2MdConverter};

fn wordpress() -> Html2MdConverter {
    Html2MdConverter::wordpress(&ConvertSettings::default())
}

#[test]
fn empty_html_is_not_an_error() {
    assert_eq!(wordpress().to_markdown("  \n "), Ok(String::new()));
}

#[test]
fn rules_are_registered_in_precedence_order() {
    assert_eq!(
        wordpress().rule_names(),
        vec![
            "code block",
            "directive",
            "more marker",
            "youtube iframe",
            "google maps iframe",
            "gist link"
        ]
    );
}

#[test]
fn youtube_iframe_becomes_embed() {
    let html = r#"<iframe width="560" height="315" src="https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0" frameborder="0"></iframe>"#;
    assert_eq!(wordpress().to_markdown(html).unwrap().trim(), "{{< youtube dQw4w9WgXcQ >}}");
}

#[test]
fn google_maps_iframe_defaults_missing_size() {
    let html = r#"<iframe src="https://www.google.com/maps/d/embed?mid=1AbC-xyz&amp;hl=en" width="600"></iframe>"#;
    assert_eq!(
        wordpress().to_markdown(html).unwrap().trim(),
        r#"{{< googlemaps id="1AbC-xyz" width="600" height="480" >}}"#
    );
}

#[test]
fn gist_link_becomes_embed() {
    let html = r#"<p><a href="https://gist.github.com/octocat/6cad326836d38bd3a7ae">see gist</a></p>"#;
    assert_eq!(
        wordpress().to_markdown(html).unwrap().trim(),
        "{{< gist octocat 6cad326836d38bd3a7ae >}}"
    );
}

#[test]
fn ordinary_links_stay_links() {
    let md = wordpress()
        .to_markdown(r#"<p><a href="https://github.com/octocat">profile</a></p>"#)
        .unwrap();
    assert!(md.contains("[profile](https://github.com/octocat)"), "{md}");
}

#[test]
fn directives_survive_untouched() {
    let html = r#"<p>{{< figure src="/a%5Fb.png" alt="x_y" caption="*bold*" >}}</p>"#;
    assert_eq!(
        wordpress().to_markdown(html).unwrap().trim(),
        r#"{{< figure src="/a%5Fb.png" alt="x_y" caption="*bold*" >}}"#
    );
}

#[test]
fn multi_line_gallery_keeps_its_lines() {
    let html = "{{< gallery cols=\"1\" >}}\n{{< figure src=\"/a.png\" >}}\n{{< /gallery >}}";
    assert_eq!(wordpress().to_markdown(html).unwrap().trim(), html);
}

#[test]
fn canonical_code_block_becomes_fenced() {
    let html = r#"<pre><code class="go">if a &lt; b &amp;&amp; c {
	fmt.Println(&quot;hi&quot;)
}</code></pre>"#;
    assert_eq!(
        wordpress().to_markdown(html).unwrap().trim(),
        "```go\nif a < b && c {\n\tfmt.Println(\"hi\")\n}\n```"
    );
}

#[test]
fn line_break_markers_in_code_become_newlines() {
    let html = r#"<pre><code class="bash">echo aWXRLINEBREAKecho bWXRPARAGRAPHBREAKecho c</code></pre>"#;
    assert_eq!(
        wordpress().to_markdown(html).unwrap().trim(),
        "```bash\necho a\necho b\n\necho c\n```"
    );
}

#[test]
fn more_marker_survives_conversion() {
    let md = wordpress()
        .to_markdown("<p>Intro</p>\n<!-- more -->\n<p>Rest</p>")
        .unwrap();
    assert!(md.contains("<!--more-->"), "{md}");
}

#[test]
fn line_break_markers_are_restored() {
    let md = wordpress()
        .to_markdown("This isWXRPARAGRAPHBREAKsomeWXRLINEBREAKtext")
        .unwrap();
    assert_eq!(md.trim(), "This is\n\nsome  \ntext");
}

struct ShoutRule(Regex);

impl ConversionRule for ShoutRule {
    fn name(&self) -> &'static str {
        "shout"
    }

    fn pattern(&self) -> &Regex {
        &self.0
    }

    fn render(&self, caps: &Captures<'_>) -> Option<String> {
        Some(caps[1].to_uppercase())
    }
}

#[test]
fn custom_rules_plug_in() {
    let converter = Html2MdConverter::new().with_rule(ShoutRule(Regex::new(r"<shout>(.*?)</shout>").unwrap()));
    assert_eq!(converter.to_markdown("<p><shout>hey_there</shout></p>").unwrap().trim(), "HEY_THERE");
}
