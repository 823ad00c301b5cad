//! HTML rendering of a pipeline [`Page`].
//!
//! The page is self-contained: gallery images are embedded as PNG data URIs,
//! so the same markup serves both the web UI and the `detect` command's
//! output file.

use std::fmt::Write;

use anyhow::{Context, Result};
use face_detect_core::{Notice, Page};

/// Page title and heading.
pub const PAGE_TITLE: &str = "Face Detection - BlazeFace Classifier";

const STYLE: &str = "\
body { font-family: sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; }
.notice { padding: 0.75rem 1rem; border-radius: 4px; margin: 0.5rem 0; }
.notice.info { background: #e7f1fb; color: #0b4a7a; }
.notice.warning { background: #fff6dd; color: #7a5a00; }
.notice.error { background: #fde8e8; color: #8a1c1c; }
.gallery { display: flex; flex-wrap: wrap; gap: 1rem; }
.gallery figure { margin: 0; }
.gallery img { max-width: 100%; display: block; }
figcaption { text-align: center; color: #555; margin-top: 0.25rem; }";

/// What to include besides notices and gallery.
#[derive(Debug, Clone, Copy)]
pub struct PageOptions {
    /// Render the multi-file upload form (web UI only).
    pub show_upload_form: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            show_upload_form: true,
        }
    }
}

/// Renders a full HTML document for `page`.
///
/// # Errors
///
/// Returns an error if a gallery image cannot be encoded.
pub fn render_page(page: &Page, options: PageOptions) -> Result<String> {
    let mut html = String::new();
    write_head(&mut html)?;

    writeln!(html, "<h1>{PAGE_TITLE}</h1>")?;
    write_instructions(&mut html)?;

    if options.show_upload_form {
        write_upload_form(&mut html)?;
    }

    write_notices(&mut html, page.notices())?;

    let gallery = page.gallery();
    if !gallery.is_empty() {
        writeln!(html, r#"<section class="gallery">"#)?;
        for displayed in gallery {
            let uri = displayed.image.to_data_uri().with_context(|| {
                format!("Failed to embed {}", displayed.image.caption())
            })?;
            let caption = escape(displayed.image.caption());
            writeln!(
                html,
                r#"<figure><img src="{uri}" alt="{caption}"><figcaption>{caption}</figcaption></figure>"#
            )?;
        }
        writeln!(html, "</section>")?;
    }

    write_tail(&mut html)?;
    Ok(html)
}

/// Renders the page shown when the pipeline itself failed.
#[must_use]
pub fn render_error_page(error: &anyhow::Error) -> String {
    let mut html = String::new();
    write_error_page(&mut html, error)
        .map(|()| html)
        .unwrap_or_default()
}

fn write_error_page(html: &mut String, error: &anyhow::Error) -> std::fmt::Result {
    write_head(html)?;
    writeln!(html, "<h1>{PAGE_TITLE}</h1>")?;
    writeln!(
        html,
        r#"<div class="notice error">Face detection failed: {}</div>"#,
        escape(&format!("{error:#}"))
    )?;
    writeln!(html, r#"<p><a href="/">Try again</a></p>"#)?;
    write_tail(html)
}

fn write_head(html: &mut String) -> std::fmt::Result {
    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, r#"<html lang="en">"#)?;
    writeln!(html, "<head>")?;
    writeln!(html, r#"<meta charset="utf-8">"#)?;
    writeln!(html, "<title>{PAGE_TITLE}</title>")?;
    writeln!(html, "<style>\n{STYLE}\n</style>")?;
    writeln!(html, "</head>")?;
    writeln!(html, "<body>")
}

fn write_tail(html: &mut String) -> std::fmt::Result {
    writeln!(html, "</body>")?;
    writeln!(html, "</html>")
}

fn write_instructions(html: &mut String) -> std::fmt::Result {
    writeln!(html, "<ol class=\"instructions\">")?;
    writeln!(html, "<li>Click on \"Browse files\" to upload images.</li>")?;
    writeln!(
        html,
        "<li>Choose one or more images in .jpg, .jpeg or .png format.</li>"
    )?;
    writeln!(
        html,
        "<li>Detected faces are outlined with a green rectangle.</li>"
    )?;
    writeln!(html, "</ol>")?;
    writeln!(
        html,
        "<p>You can upload multiple images at once by selecting them in the file dialog.</p>"
    )
}

fn write_upload_form(html: &mut String) -> std::fmt::Result {
    writeln!(
        html,
        r#"<form method="post" action="/" enctype="multipart/form-data">"#
    )?;
    writeln!(
        html,
        r#"<label>Browse files <input type="file" name="files" accept=".jpg,.jpeg,.png" multiple></label>"#
    )?;
    writeln!(html, r#"<button type="submit">Detect faces</button>"#)?;
    writeln!(html, "</form>")
}

fn write_notices(html: &mut String, notices: &[Notice]) -> std::fmt::Result {
    for notice in notices {
        writeln!(
            html,
            r#"<div class="notice {}">{}</div>"#,
            notice.severity.as_str(),
            escape(&notice.message)
        )?;
    }
    Ok(())
}

/// Escapes text for element content and quoted attribute values.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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
