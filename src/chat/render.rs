//! Markdown rendering for transcript entries.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

/// URL schemes allowed in rendered links and images.
const SAFE_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Render message text as HTML.
///
/// Supports the GFM extensions the model tends to use (tables,
/// strikethrough, task lists). Raw HTML in the input is escaped rather than
/// passed through, and link or image targets with any scheme other than
/// `http`, `https` or `mailto` are replaced with `#`.
#[must_use]
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(text, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::with_capacity(text.len() + text.len() / 2);
    html::push_html(&mut out, parser);
    out
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    if is_safe_url(&url) {
        url
    } else {
        CowStr::Borrowed("#")
    }
}

/// Relative URLs and the schemes in [`SAFE_SCHEMES`] pass.
fn is_safe_url(url: &str) -> bool {
    let url = url.trim();
    let Some(colon) = url.find(':') else {
        return true;
    };
    let scheme = &url[..colon];
    // A colon after the path, query or fragment starts is not a scheme.
    if scheme.contains(['/', '?', '#']) {
        return true;
    }
    SAFE_SCHEMES.iter().any(|s| scheme.eq_ignore_ascii_case(s))
}
