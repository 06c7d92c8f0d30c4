//! Markdown body conversion.
//!
//! Listing queries only touch metadata; the body is converted on demand,
//! when a single post is actually displayed. `render_body` re-reads the
//! backing file, strips the front-matter block again and runs the body
//! through pulldown-cmark with:
//!
//! - tables and strikethrough enabled
//! - fenced code blocks wrapped in a `highlight` CSS class
//! - heading ids (slugified from the heading text, or taken from an
//!   explicit `{#id}` attribute) collected into a table of contents

use super::error::LoadError;
use super::frontmatter::split_front_matter;
use super::post::Post;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};
use std::collections::HashMap;
use std::fs;

/// CSS class wrapped around fenced code blocks.
const HIGHLIGHT_CLASS: &str = "highlight";

/// A converted post body.
#[derive(Debug, Clone)]
pub struct RenderedBody {
    pub html: String,
    pub toc: Vec<TocEntry>,
}

/// One table-of-contents entry, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// Heading level, 1–6.
    pub level: u8,
    /// Anchor id assigned to the heading.
    pub id: String,
    /// Plain text of the heading.
    pub title: String,
}

/// Re-read a post's backing file and convert its body to HTML.
pub fn render_body(post: &Post) -> Result<RenderedBody, LoadError> {
    let content = fs::read_to_string(&post.source)
        .map_err(|err| LoadError::Io(post.source.clone(), err))?;
    let (_, body) = split_front_matter(&content);
    Ok(render_markdown(body))
}

/// Convert markdown to HTML. Pure: same input, same output.
pub fn render_markdown(body: &str) -> RenderedBody {
    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_HEADING_ATTRIBUTES;
    let events: Vec<Event> = Parser::new_ext(body, options).collect();

    let mut toc = Vec::new();
    let mut used_ids: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<Event> = Vec::with_capacity(events.len());

    for (i, event) in events.iter().enumerate() {
        match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let title = heading_text(&events[i + 1..]);
                let id = match id {
                    Some(explicit) => explicit.to_string(),
                    None => unique_id(&heading_slug(&title), &mut used_ids),
                };
                toc.push(TocEntry {
                    level: *level as u8,
                    id: id.clone(),
                    title,
                });
                out.push(Event::Start(Tag::Heading {
                    level: *level,
                    id: Some(CowStr::from(id)),
                    classes: classes.clone(),
                    attrs: attrs.clone(),
                }));
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let open = match code_language(kind) {
                    Some(lang) => format!(
                        "<pre class=\"{HIGHLIGHT_CLASS}\"><code class=\"language-{lang}\">"
                    ),
                    None => format!("<pre class=\"{HIGHLIGHT_CLASS}\"><code>"),
                };
                out.push(Event::Html(CowStr::from(open)));
            }
            Event::End(TagEnd::CodeBlock) => {
                out.push(Event::Html(CowStr::from("</code></pre>\n")));
            }
            other => out.push(other.clone()),
        }
    }

    let mut html = String::with_capacity(body.len() * 2);
    html::push_html(&mut html, out.into_iter());

    RenderedBody { html, toc }
}

/// Plain text of a heading: concatenated text/code events up to its end.
fn heading_text(events: &[Event]) -> String {
    let mut title = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(text) | Event::Code(text) => title.push_str(text),
            _ => {}
        }
    }
    title
}

/// Language token of a fenced code block, filtered to safe characters.
fn code_language(kind: &CodeBlockKind) -> Option<String> {
    let CodeBlockKind::Fenced(info) = kind else {
        return None;
    };
    let lang: String = info
        .split_whitespace()
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#'))
        .collect();
    (!lang.is_empty()).then_some(lang)
}

/// Slugify heading text into an anchor id.
///
/// Lowercases, keeps alphanumerics, maps separator runs to single dashes.
fn heading_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut prev_dash = true;
    for c in text.trim().to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Deduplicate anchor ids: repeats get a `-1`, `-2`, … suffix.
fn unique_id(base: &str, used: &mut HashMap<String, usize>) -> String {
    let base = if base.is_empty() { "section" } else { base };
    match used.get_mut(base) {
        None => {
            used.insert(base.to_owned(), 0);
            base.to_owned()
        }
        Some(count) => {
            *count += 1;
            format!("{base}-{count}")
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
