use pretty_assertions::assert_eq;
use wxr_engine::{ConvertSettings, HtmlNormalizer, NormalizeContext};
use wxr_model::StaticImageProvider;

fn provider() -> StaticImageProvider {
    StaticImageProvider::new()
        .with_image("1", "/uploads/one.png", "One")
        .with_image("2", "/uploads/two_b.png", "Two \"B\"")
        .with_image("7", "/uploads/bg.jpg", "Background")
}

fn normalize(html: &str) -> String {
    let provider = provider();
    let settings = ConvertSettings::default();
    let ctx = NormalizeContext {
        item: "test item",
        provider: &provider,
        settings: &settings,
    };
    HtmlNormalizer::new().normalize(html, &ctx)
}

#[test]
fn audio_shortcode_becomes_directive() {
    assert_eq!(normalize(r#"[audio mp3="/a/b.mp3"]"#), r#"{{< audio src="/a/b.mp3" >}}"#);
}

#[test]
fn non_ascii_sources_are_kept_verbatim() {
    assert_eq!(
        normalize(r#"[audio mp3="/musik/lied-ü.mp3"]"#),
        r#"{{< audio src="/musik/lied-ü.mp3" >}}"#
    );
}

#[test]
fn audio_source_precedence_prefers_m4a() {
    assert_eq!(
        normalize(r#"[audio wav="/a.wav" mp3="/a.mp3" m4a="/a.m4a"][/audio]"#),
        r#"{{< audio src="/a.m4a" >}}"#
    );
}

#[test]
fn audio_block_uses_embedded_source() {
    let html = "<!-- wp:audio {\"id\":3} -->\n<figure class=\"wp-block-audio\"><audio controls src=\"/media/my song.mp3\"></audio></figure>\n<!-- /wp:audio -->";
    assert_eq!(normalize(html), r#"{{< audio src="/media/my%20song.mp3" >}}"#);
}

#[test]
fn caption_shortcode_becomes_figure() {
    let html = r#"[caption id="attachment_5" align="alignnone" width="300"]<img src="/uploads/my file_1.jpg" alt="A &quot;cat&quot;" width="300" /> Sleepy cat[/caption]"#;
    assert_eq!(
        normalize(html),
        r#"{{< figure src="/uploads/my%20file%5F1.jpg" alt="A 'cat'" caption="Sleepy cat" >}}"#
    );
}

#[test]
fn caption_without_alt_omits_it() {
    let html = r#"[caption width="300"]<img src="/a.png" /> “Quoted” caption[/caption]"#;
    assert_eq!(normalize(html), r#"{{< figure src="/a.png" caption="'Quoted' caption" >}}"#);
}

#[test]
fn image_block_with_and_without_figcaption() {
    let with = "<!-- wp:image {\"id\":5} -->\n<figure class=\"wp-block-image\"><img src=\"/a.png\" alt=\"\"/><figcaption>Hi <em>there</em></figcaption></figure>\n<!-- /wp:image -->";
    assert_eq!(normalize(with), r#"{{< figure src="/a.png" caption="Hi there" >}}"#);

    let without = "<!-- wp:image -->\n<figure><img src=\"/b.png\" alt=\"B\"/></figure>\n<!-- /wp:image -->";
    assert_eq!(normalize(without), r#"{{< figure src="/b.png" alt="B" >}}"#);
}

#[test]
fn gallery_shortcode_skips_unknown_ids() {
    let expected = [
        r#"{{< gallery cols="2" >}}"#,
        r#"{{< figure src="/uploads/one.png" alt="One" >}}"#,
        r#"{{< figure src="/uploads/two%5Fb.png" alt="Two 'B'" >}}"#,
        "{{< /gallery >}}",
    ]
    .join("\n");
    assert_eq!(normalize(r#"[gallery columns="2" ids="1,99,2"]"#), expected);
}

#[test]
fn gallery_columns_default_to_one() {
    let expected = [
        r#"{{< gallery cols="1" >}}"#,
        r#"{{< figure src="/uploads/one.png" alt="One" >}}"#,
        "{{< /gallery >}}",
    ]
    .join("\n");
    assert_eq!(normalize(r#"[gallery ids="1"]"#), expected);
}

#[test]
fn gallery_without_resolvable_images_is_dropped() {
    assert_eq!(normalize(r#"<p>Before</p>[gallery ids="98,99"]"#), "<p>Before</p>");
}

#[test]
fn gallery_block_reads_ids_from_inner_images() {
    let html = "<!-- wp:gallery {\"columns\":3,\"linkTo\":\"none\"} -->\n<figure class=\"wp-block-gallery\"><figure class=\"wp-block-image\"><img src=\"/x.png\" data-id=\"2\" class=\"wp-image-2\"/></figure><figure class=\"wp-block-image\"><img src=\"/y.png\" data-id=\"1\" class=\"wp-image-1\"/></figure></figure>\n<!-- /wp:gallery -->";
    let expected = [
        r#"{{< gallery cols="3" >}}"#,
        r#"{{< figure src="/uploads/two%5Fb.png" alt="Two 'B'" >}}"#,
        r#"{{< figure src="/uploads/one.png" alt="One" >}}"#,
        "{{< /gallery >}}",
    ]
    .join("\n");
    assert_eq!(normalize(html), expected);
}

#[test]
fn parallax_wraps_inner_content() {
    let html = r#"[nk_awb awb_type="image" awb_image="7"]<p>Inside</p>[/nk_awb]"#;
    assert_eq!(
        normalize(html),
        r#"{{< parallaxblur src="/uploads/bg.jpg" >}}<p>Inside</p>{{< /parallaxblur >}}"#
    );
}

#[test]
fn parallax_with_unknown_image_keeps_content() {
    let html = r#"[nk_awb awb_type="image" awb_image="404"]<p>Inside</p>[/nk_awb]"#;
    assert_eq!(normalize(html), "<p>Inside</p>");
}

#[test]
fn legacy_code_languages_are_canonicalized() {
    assert_eq!(
        normalize(r#"<pre class="lang:golang decode:true">x := 1</pre>"#),
        r#"<pre><code class="go">x := 1</code></pre>"#
    );
    assert_eq!(
        normalize(r#"<pre data-enlighter-language="shell">ls</pre>"#),
        r#"<pre><code class="bash">ls</code></pre>"#
    );
    assert_eq!(
        normalize(r#"<pre class="wp-block-code"><code class="language-raw">plain</code></pre>"#),
        "<pre><code>plain</code></pre>"
    );
}

#[test]
fn br_runs_and_single_breaks_get_distinct_markers() {
    let out = normalize("a<br><br />b<BR/>c");
    assert_eq!(out, "aWXRPARAGRAPHBREAKbWXRLINEBREAKc");
}

#[test]
fn input_without_targets_is_untouched() {
    let html = "<p>Nothing <strong>special</strong> here.</p>";
    assert_eq!(normalize(html), html);
}
