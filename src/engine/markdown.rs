//! In-process markdown handling (pulldown-cmark): rendering to HTML and
//! stripping to plain text.

use once_cell::sync::Lazy;
use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;

/// Three or more consecutive newlines.
static EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options
}

/// Render markdown to an HTML fragment (no `<html>` wrapper).
pub fn render_fragment(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, options());
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Render markdown to a complete, styled HTML document.
pub fn render_document(markdown: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Converted Document</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 40px; }}
        pre {{ background-color: #f4f4f4; padding: 10px; border-radius: 5px; }}
        code {{ background-color: #f4f4f4; padding: 2px 4px; border-radius: 3px; }}
    </style>
</head>
<body>
{}
</body>
</html>
"#,
        render_fragment(markdown)
    )
}

/// Strip markdown syntax, keeping the readable text.
///
/// Block elements are separated by one blank line, list items are
/// prefixed with `- `, and table cells are tab-separated.
pub fn to_plain_text(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    for event in Parser::new_ext(markdown, options()) {
        match event {
            Event::Text(t) | Event::Code(t) => out.push_str(&t),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::Start(Tag::Item) => out.push_str("- "),
            Event::End(TagEnd::Item) | Event::End(TagEnd::List(_)) => out.push('\n'),
            Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::Heading(_))
            | Event::End(TagEnd::CodeBlock)
            | Event::End(TagEnd::Table) => out.push_str("\n\n"),
            Event::End(TagEnd::TableCell) => out.push('\t'),
            Event::End(TagEnd::TableRow) | Event::End(TagEnd::TableHead) => out.push('\n'),
            _ => {}
        }
    }

    let collapsed = EXCESS_NEWLINES.replace_all(&out, "\n\n");
    let trimmed = collapsed.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

/// Render a tiny document to confirm the renderer works.
pub fn probe() -> bool {
    render_fragment("# ok").contains("<h1>ok</h1>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_wraps_fragment() {
        let html = render_document("# Title\n\nBody text.\n");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Converted Document</title>"));
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<p>Body text.</p>"));
    }

    #[test]
    fn tables_are_enabled() {
        let html = render_fragment("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn plain_text_drops_markup() {
        let text = to_plain_text("# Title\n\nBody *text* with `code`.\n");
        assert_eq!(text, "Title\n\nBody text with code.\n");
    }

    #[test]
    fn plain_text_keeps_list_items() {
        let text = to_plain_text("Intro\n\n- one\n- two\n");
        assert_eq!(text, "Intro\n\n- one\n- two\n");
    }

    #[test]
    fn plain_text_of_empty_input_is_empty() {
        assert_eq!(to_plain_text(""), "");
        assert_eq!(to_plain_text("\n\n"), "");
    }

    #[test]
    fn renderer_probe_passes() {
        assert!(probe());
    }
}
