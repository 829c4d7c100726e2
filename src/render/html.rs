use std::fmt::Write;

use crate::render::layout::{Block, ContactIcon, Entry, LayoutDocument, PhotoSlot, Section, Text};

pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes and turns line breaks into `<br/>`.
fn multiline(input: &str) -> String {
    escape(input).replace('\n', "<br/>")
}

fn icon(icon: ContactIcon) -> &'static str {
    match icon {
        ContactIcon::Phone => "&#9742;",
        ContactIcon::Email => "&#9993;",
        ContactIcon::Location => "&#9873;",
        ContactIcon::Link => "&#128279;",
    }
}

fn text_class(text: &Text) -> &'static str {
    if text.placeholder {
        " class=\"placeholder\""
    } else {
        ""
    }
}

/// Renders the layout tree into a standalone HTML page.
pub fn to_html(doc: &LayoutDocument) -> String {
    let p = &doc.palette;
    let mut html = String::new();

    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
  @page {{ size: A4; margin: 0; }}
  body {{ font-family: Arial, Helvetica, sans-serif; margin: 0; color: {body}; font-size: 11px; line-height: 1.5; }}
  table.cv {{ width: 100%; border-collapse: collapse; }}
  td.sidebar {{ width: {sw}%; background: {sbg}; color: {stext}; vertical-align: top; padding: 0; }}
  td.main {{ vertical-align: top; padding: 24px 28px; }}
  .header {{ background: {hbg}; color: {htext}; padding: 24px 28px; }}
  .header h1 {{ margin: 0; font-size: 24px; letter-spacing: 2px; }}
  .header .title {{ margin-top: 4px; font-size: 13px; letter-spacing: 3px; }}
  .photo {{ background: {hbg}; padding: 24px 0; text-align: center; }}
  .photo img, .photo .empty {{ width: 120px; height: 120px; border-radius: 60px; border: 4px solid {accent}; }}
  .photo .empty {{ display: inline-block; background: #F0F0F0; }}
  .side-content {{ padding: 18px 20px; }}
  h2 {{ color: {heading}; font-size: 13px; letter-spacing: 2px; border-bottom: 2px solid {accent}; padding-bottom: 4px; margin: 16px 0 8px; }}
  .contact {{ margin: 4px 0; }}
  .bullet {{ margin: 2px 0; }}
  .entry {{ margin-bottom: 10px; }}
  .entry .row {{ font-weight: bold; }}
  .entry .period {{ float: right; color: {muted}; font-weight: normal; }}
  .entry .subtitle {{ color: {muted}; }}
  .placeholder {{ color: {muted}; font-style: italic; }}
</style>
</head>
<body>
"#,
        body = p.body_text,
        sw = doc.sidebar_width,
        sbg = p.sidebar_bg,
        stext = p.sidebar_text,
        hbg = p.header_bg,
        htext = p.header_text,
        accent = p.accent,
        heading = p.heading,
        muted = p.muted_text,
    );

    let header = format!(
        "<div class=\"header\"><h1{}>{}</h1><div class=\"title{}\">{}</div></div>\n",
        text_class(&doc.header.name),
        escape(&doc.header.name.value),
        if doc.header.title.placeholder { " placeholder" } else { "" },
        escape(&doc.header.title.value),
    );

    // With a photo the header sits above the main column; without one it spans the page.
    let photo_layout = doc.header.photo.is_some();
    if !photo_layout {
        html.push_str(&header);
    }

    html.push_str("<table class=\"cv\"><tr>\n<td class=\"sidebar\">\n");
    if let Some(photo) = &doc.header.photo {
        html.push_str("<div class=\"photo\">");
        match photo {
            PhotoSlot::Image { src } => {
                let _ = write!(html, "<img src=\"{}\" alt=\"photo\"/>", escape(src));
            }
            PhotoSlot::Placeholder => html.push_str("<span class=\"empty\"></span>"),
        }
        html.push_str("</div>\n");
    }
    html.push_str("<div class=\"side-content\">\n");
    for section in &doc.sidebar {
        render_section(&mut html, section);
    }
    html.push_str("</div>\n</td>\n");

    if photo_layout {
        html.push_str("<td class=\"main\" style=\"padding:0\">\n");
        html.push_str(&header);
        html.push_str("<div style=\"padding: 8px 28px 24px\">\n");
    } else {
        html.push_str("<td class=\"main\">\n");
    }
    for section in &doc.main {
        render_section(&mut html, section);
    }
    if photo_layout {
        html.push_str("</div>\n");
    }
    html.push_str("</td>\n</tr></table>\n</body>\n</html>\n");

    html
}

fn render_section(html: &mut String, section: &Section) {
    let _ = writeln!(html, "<h2>{}</h2>", escape(section.heading));
    for block in &section.blocks {
        match block {
            Block::Contact { icon: kind, text } => {
                let _ = writeln!(
                    html,
                    "<div class=\"contact\">{} <span{}>{}</span></div>",
                    icon(*kind),
                    text_class(text),
                    escape(&text.value)
                );
            }
            Block::Bullet { text } => {
                let _ = writeln!(
                    html,
                    "<div class=\"bullet\">&bull; <span{}>{}</span></div>",
                    text_class(text),
                    escape(&text.value)
                );
            }
            Block::Paragraph { text } => {
                let _ = writeln!(html, "<p{}>{}</p>", text_class(text), multiline(&text.value));
            }
            Block::Entry(entry) => render_entry(html, entry),
        }
    }
}

fn render_entry(html: &mut String, entry: &Entry) {
    let class = if entry.placeholder { "entry placeholder" } else { "entry" };
    let _ = write!(
        html,
        "<div class=\"{}\"><div class=\"row\">{}<span class=\"period\">{}</span></div>\
         <div class=\"subtitle\">{}</div>",
        class,
        escape(&entry.title),
        escape(&entry.period),
        escape(&entry.subtitle)
    );
    if let Some(detail) = &entry.detail {
        let _ = write!(html, "<div class=\"detail\">&bull; {}</div>", multiline(detail));
    }
    html.push_str("</div>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TemplateChoice;
    use crate::models::cv::CvContent;
    use crate::render::layout::build_layout;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }

    #[test]
    fn user_text_cannot_inject_tags() {
        let mut content = CvContent::default();
        content.summary = "<script>alert(1)</script>\nsecond line".into();
        let html = to_html(&build_layout(&content, TemplateChoice::WithoutPhoto, None));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<br/>second line"));
    }

    #[test]
    fn both_templates_render_every_heading() {
        for choice in [TemplateChoice::WithPhoto, TemplateChoice::WithoutPhoto] {
            let doc = build_layout(&CvContent::default(), choice, None);
            let html = to_html(&doc);
            for section in doc.sidebar.iter().chain(doc.main.iter()) {
                assert!(html.contains(&format!("<h2>{}</h2>", section.heading)));
            }
            assert!(html.contains(doc.palette.header_bg));
            assert!(html.contains("placeholder"));
        }
    }

    #[test]
    fn photo_template_draws_photo_slot() {
        let html = to_html(&build_layout(&CvContent::default(), TemplateChoice::WithPhoto, None));
        assert!(html.contains("class=\"photo\""));
        let html = to_html(&build_layout(&CvContent::default(), TemplateChoice::WithoutPhoto, None));
        assert!(!html.contains("class=\"photo\""));
    }
}
