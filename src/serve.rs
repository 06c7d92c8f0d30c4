//! HTTP server for the blog.
//!
//! A lightweight routing layer on `tiny_http`. All content questions are
//! answered by the `ContentIndex` built once at startup; handlers only
//! decode the request, call the index and fill a template.
//!
//! # Routes
//!
//! | Route                          | Page                                |
//! |--------------------------------|-------------------------------------|
//! | `GET /`                        | landing page, latest posts          |
//! | `GET /blog?search=&tag=`       | listing with filters                |
//! | `GET /blog/p/{slug}`           | one post                            |
//! | `GET /blog/s/{slug}`           | one series                          |
//! | `GET /blog/s/{slug}/p/{slug}`  | post within a series, with nav      |
//! | `GET /health`, `/health/ready` | JSON status                         |
//! | `GET /static/*`                | asset files                         |
//! | `POST /contact`                | contact form (when mail is enabled) |

use crate::{
    config::SiteConfig,
    content::{
        ContentIndex, Post, Series, SeriesNavigation, filter_posts, render::TocEntry, render_body,
    },
    log,
    mail::{self, ContactMessage},
};
use anyhow::{Context, Result};
use chrono::Utc;
use std::{
    borrow::Cow,
    fs,
    io::Read,
    net::SocketAddr,
    path::Path,
    sync::Arc,
};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

// ============================================================================
// Constants - HTML Templates
// ============================================================================

/// Page templates (embedded at compile time)
const INDEX_TEMPLATE: &str = include_str!("embed/serve/index.html");
const BLOG_TEMPLATE: &str = include_str!("embed/serve/blog.html");
const POST_TEMPLATE: &str = include_str!("embed/serve/post.html");
const SERIES_TEMPLATE: &str = include_str!("embed/serve/series.html");
const NOT_FOUND_TEMPLATE: &str = include_str!("embed/serve/not_found.html");
const CONTACT_TEMPLATE: &str = include_str!("embed/serve/contact.html");

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

/// Posts shown on the landing page
const LANDING_LIMIT: usize = 3;
/// Posts considered by the blog listing
const LISTING_LIMIT: usize = 100;
/// Featured posts shown on the blog listing
const FEATURED_LIMIT: usize = 6;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Build the content index and serve the blog.
///
/// The index is constructed before the first request is accepted and is
/// immutable afterwards: every handler reads the same fully-populated
/// collections. The server blocks until Ctrl+C is received.
pub fn serve_site(config: &'static SiteConfig) -> Result<()> {
    let index = ContentIndex::load(config).context("Failed to index content")?;
    log!(
        "content";
        "indexed {} posts, {} series",
        index.posts().len(),
        index.all_series().len()
    );

    let interface: std::net::IpAddr = config.serve.interface.parse()?;
    let base_port = config.serve.port;

    let (server, addr) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    // Set up Ctrl+C handler for graceful shutdown
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log_routes(config);
    log!("serve"; "http://{}", addr);

    // Handle requests in main thread (blocks until Ctrl+C)
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, config, &index) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Log the served route table at startup.
fn log_routes(config: &SiteConfig) {
    const ROUTES: &[&str] = &[
        "GET /",
        "GET /blog",
        "GET /blog/p/{slug}",
        "GET /blog/s/{slug}",
        "GET /blog/s/{slug}/p/{slug}",
        "GET /health",
        "GET /health/ready",
        "GET /static/*",
    ];
    for route in ROUTES {
        log!("serve"; "route: {route}");
    }
    if config.mail.enable {
        log!("serve"; "route: POST /contact");
    }
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: std::net::IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < max_retries => {
                // Will retry silently
                continue;
            }
            Err(e) => {
                // Last attempt failed
                return Err(anyhow::anyhow!(
                    "Failed to bind after {} attempts (ports {}-{}): {}",
                    max_retries,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

// ============================================================================
// Request Routing
// ============================================================================

/// Route a single HTTP request to its handler.
fn handle_request(
    request: Request,
    config: &SiteConfig,
    index: &ContentIndex,
) -> Result<()> {
    let url = request.url().to_string();
    let (raw_path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));

    // Decode URL-encoded characters (e.g., %20 → space)
    let path = urlencoding::decode(raw_path)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw_path.to_string());
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (request.method(), segments.as_slice()) {
        (Method::Get, []) => serve_index_page(request, config, index),
        (Method::Get, ["blog"]) => serve_blog_page(request, query, config, index),
        (Method::Get, ["blog", "p", slug]) => serve_post_page(request, config, index, slug, None),
        (Method::Get, ["blog", "s", slug]) => serve_series_page(request, config, index, slug),
        (Method::Get, ["blog", "s", series, "p", slug]) => {
            serve_post_page(request, config, index, slug, Some(series))
        }
        (Method::Get, ["health"]) => serve_health(request),
        (Method::Get, ["health", "ready"]) => serve_ready(request),
        (Method::Get, ["static", rest @ ..]) => serve_static(request, config, rest),
        (Method::Post, ["contact"]) => serve_contact(request, config),
        _ => serve_not_found_page(request, config, "Page not found"),
    }
}

// ============================================================================
// Page Handlers
// ============================================================================

/// Landing page: site header plus the latest posts.
fn serve_index_page(
    request: Request,
    config: &SiteConfig,
    index: &ContentIndex,
) -> Result<()> {
    let latest = index.latest_posts(LANDING_LIMIT, false);
    let page = fill_site_fields(INDEX_TEMPLATE, config)
        .replace("{latest_posts}", &post_items(&latest));
    serve_html(request, page)
}

/// Blog listing: featured posts, series, and the filtered post list.
fn serve_blog_page(
    request: Request,
    query: &str,
    config: &SiteConfig,
    index: &ContentIndex,
) -> Result<()> {
    let search = query_param(query, "search");
    let tag = query_param(query, "tag");

    let all_posts = index.latest_posts(LISTING_LIMIT, false);
    let filtered = filter_posts(&all_posts, search.as_deref(), tag.as_deref());
    let featured = index.featured_posts(FEATURED_LIMIT, false);

    let tag_links: String = index
        .tags()
        .iter()
        .map(|t| {
            format!(
                r#"<a class="tag" href="/blog?tag={}">{}</a>"#,
                urlencoding::encode(t),
                html_escape(t)
            )
        })
        .collect::<Vec<_>>()
        .join("\n        ");

    let series_items: String = index
        .all_series()
        .iter()
        .map(series_item)
        .collect::<Vec<_>>()
        .join("\n        ");

    // the search value is user input; substitute it last so it cannot
    // inject placeholder names into the template
    let page = fill_site_fields(BLOG_TEMPLATE, config)
        .replace("{tags}", &tag_links)
        .replace("{featured_posts}", &post_items(&featured))
        .replace("{series}", &series_items)
        .replace("{posts}", &post_items(&filtered))
        .replace("{search}", &html_escape(search.as_deref().unwrap_or("")));
    serve_html(request, page)
}

/// One post, optionally viewed inside a series (adds navigation).
fn serve_post_page(
    request: Request,
    config: &SiteConfig,
    index: &ContentIndex,
    slug: &str,
    series_slug: Option<&str>,
) -> Result<()> {
    let Some(post) = index.post(slug) else {
        return serve_not_found_page(request, config, "Post not found");
    };

    let navigation = match series_slug {
        Some(series_slug) => {
            let Some(series) = index.series(series_slug, false) else {
                return serve_not_found_page(request, config, "Series not found");
            };
            if !series.posts.iter().any(|p| p.slug == post.slug) {
                return serve_not_found_page(request, config, "Post not found in this series");
            }
            index
                .navigation(series_slug, slug)
                .map(|nav| navigation_html(&series, &nav))
        }
        None => None,
    };

    let rendered = render_body(post)
        .with_context(|| format!("Failed to render `{}`", post.source.display()))?;

    let series_links: String = index
        .series_containing(slug)
        .iter()
        .map(|s| {
            format!(
                r#"<a href="/blog/s/{}">{}</a>"#,
                urlencoding::encode(&s.slug),
                html_escape(&s.title)
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    // the body may legitimately contain brace-wrapped text (code samples);
    // substitute it last so no placeholder name inside it gets replaced
    let page = fill_site_fields(POST_TEMPLATE, config)
        .replace("{post_title}", &html_escape(&post.title))
        .replace("{meta}", &post_meta_line(post))
        .replace("{cover}", &cover_html(&post.cover_image))
        .replace("{toc}", &toc_html(&rendered.toc))
        .replace("{series_list}", &series_links)
        .replace("{navigation}", navigation.as_deref().unwrap_or(""))
        .replace("{attachments}", &attachments_html(&post.attachments))
        .replace("{body}", &rendered.html);
    serve_html(request, page)
}

/// One series: description and its ordered member list (drafts excluded).
fn serve_series_page(
    request: Request,
    config: &SiteConfig,
    index: &ContentIndex,
    slug: &str,
) -> Result<()> {
    let Some(series) = index.series(slug, false) else {
        return serve_not_found_page(request, config, "Series not found");
    };

    let members: String = series
        .posts
        .iter()
        .enumerate()
        .map(|(i, post)| {
            format!(
                r#"<li><span class="part">Part {}</span> <a href="/blog/s/{}/p/{}">{}</a></li>"#,
                i + 1,
                urlencoding::encode(&series.slug),
                urlencoding::encode(&post.slug),
                html_escape(&post.title)
            )
        })
        .collect::<Vec<_>>()
        .join("\n        ");

    let page = fill_site_fields(SERIES_TEMPLATE, config)
        .replace("{series_title}", &html_escape(&series.title))
        .replace("{series_description}", &html_escape(&series.description))
        .replace("{status}", &html_escape(&series.status))
        .replace("{cover}", &cover_html(&series.cover_image))
        .replace("{posts}", &members);
    serve_html(request, page)
}

/// `GET /health` JSON document.
fn serve_health(request: Request) -> Result<()> {
    serve_json(
        request,
        serde_json::json!({
            "status": "healthy",
            "timestamp": Utc::now().to_rfc3339(),
            "service": "folio",
        }),
    )
}

/// `GET /health/ready` JSON document.
fn serve_ready(request: Request) -> Result<()> {
    serve_json(request, serde_json::json!({ "status": "ready" }))
}

/// Static asset serving from the configured assets directory.
fn serve_static(request: Request, config: &SiteConfig, segments: &[&str]) -> Result<()> {
    if segments.is_empty() || segments.iter().any(|s| *s == "..") {
        return serve_not_found(request);
    }

    let mut path = config.content.assets.clone();
    for segment in segments {
        path.push(segment);
    }

    if path.is_file() {
        serve_file(request, &path)
    } else {
        serve_not_found(request)
    }
}

/// Contact form: hand the submission to the mailer.
///
/// Delivery failure is a recoverable user-facing message, never a crash.
fn serve_contact(mut request: Request, config: &SiteConfig) -> Result<()> {
    if !config.mail.enable {
        return serve_not_found_page(request, config, "Page not found");
    }

    let mut body = String::new();
    request
        .as_reader()
        .read_to_string(&mut body)
        .context("Failed to read contact form body")?;

    let message = ContactMessage {
        name: query_param(&body, "name").unwrap_or_default(),
        email: query_param(&body, "email").unwrap_or_default(),
        message: query_param(&body, "message").unwrap_or_default(),
    };

    match mail::send_contact_mail(config, &message) {
        Ok(()) => {
            log!("mail"; "contact form delivered to {}", config.mail.to);
            let page = fill_site_fields(CONTACT_TEMPLATE, config)
                .replace("{message}", "Thanks! Your message has been sent.");
            serve_html(request, page)
        }
        Err(err) => {
            log!("mail"; "delivery failed: {err}");
            let page = fill_site_fields(CONTACT_TEMPLATE, config).replace(
                "{message}",
                "Sorry, your message could not be sent right now. Please try again later.",
            );
            serve_html_with_status(request, page, 500)
        }
    }
}

/// Render the not-found page with a 404 status.
fn serve_not_found_page(request: Request, config: &SiteConfig, message: &str) -> Result<()> {
    let page = fill_site_fields(NOT_FOUND_TEMPLATE, config).replace("{message}", message);
    serve_html_with_status(request, page, 404)
}

// ============================================================================
// HTML Fragments
// ============================================================================

/// Fill the fields every template shares.
fn fill_site_fields(template: &str, config: &SiteConfig) -> String {
    template
        .replace("{language}", &config.base.language)
        .replace("{title}", &html_escape(&config.base.title))
        .replace("{description}", &html_escape(&config.base.description))
        .replace("{copyright}", &html_escape(&config.base.copyright))
}

/// `<li>` items for a post listing.
fn post_items(posts: &[Arc<Post>]) -> String {
    posts
        .iter()
        .map(|post| {
            let tags: String = post
                .tags
                .iter()
                .map(|t| format!(r#"<span class="tag">{}</span>"#, html_escape(t)))
                .collect::<Vec<_>>()
                .join(" ");
            format!(
                r#"<li><a href="/blog/p/{slug}">{title}</a> <time datetime="{date}">{date}</time> {tags}<p>{description}</p></li>"#,
                slug = urlencoding::encode(&post.slug),
                title = html_escape(&post.title),
                date = post.created,
                description = html_escape(&post.description),
            )
        })
        .collect::<Vec<_>>()
        .join("\n        ")
}

/// `<li>` item for a series listing.
fn series_item(series: &Series) -> String {
    format!(
        r#"<li><a href="/blog/s/{slug}">{title}</a> <span class="status">{status}</span><p>{description}</p></li>"#,
        slug = urlencoding::encode(&series.slug),
        title = html_escape(&series.title),
        status = html_escape(&series.status),
        description = html_escape(&series.description),
    )
}

/// Byline: authors, dates, tags.
fn post_meta_line(post: &Post) -> String {
    let authors: String = post
        .authors
        .iter()
        .map(|a| html_escape(&a.name).into_owned())
        .collect::<Vec<_>>()
        .join(", ");

    let updated = if post.updated != post.created {
        format!(" (updated {})", post.updated)
    } else {
        String::new()
    };

    let tags: String = post
        .tags
        .iter()
        .map(|t| {
            format!(
                r#"<a class="tag" href="/blog?tag={}">{}</a>"#,
                urlencoding::encode(t),
                html_escape(t)
            )
        })
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        r#"<span class="authors">{authors}</span> · <time datetime="{date}">{date}</time>{updated} {tags}"#,
        date = post.created,
    )
}

/// Cover image tag, empty string when none is set.
fn cover_html(cover_image: &str) -> String {
    if cover_image.is_empty() {
        return String::new();
    }
    format!(
        r#"<img class="cover" src="{}" alt="">"#,
        html_escape(cover_image)
    )
}

/// Attachment download list, empty string when there are none.
fn attachments_html(attachments: &[String]) -> String {
    if attachments.is_empty() {
        return String::new();
    }

    let items: String = attachments
        .iter()
        .map(|a| format!(r#"<li><a href="{0}">{0}</a></li>"#, html_escape(a)))
        .collect::<Vec<_>>()
        .join("\n        ");

    format!(
        "<section class=\"attachments\"><h2>Attachments</h2><ul>\n        {items}\n    </ul></section>"
    )
}

/// Table of contents list, empty string when the body has no headings.
fn toc_html(toc: &[TocEntry]) -> String {
    if toc.is_empty() {
        return String::new();
    }

    let items: String = toc
        .iter()
        .map(|entry| {
            format!(
                r##"<li class="toc-l{}"><a href="#{}">{}</a></li>"##,
                entry.level,
                entry.id,
                html_escape(&entry.title)
            )
        })
        .collect::<Vec<_>>()
        .join("\n        ");

    format!("<nav class=\"toc\"><h2>Contents</h2><ul>\n        {items}\n    </ul></nav>")
}

/// Prev/next links and position within a series.
fn navigation_html(series: &Series, nav: &SeriesNavigation) -> String {
    let link = |post: &Post, class: &str, label: &str| {
        format!(
            r#"<a class="{class}" href="/blog/s/{}/p/{}">{label} {}</a>"#,
            urlencoding::encode(&series.slug),
            urlencoding::encode(&post.slug),
            html_escape(&post.title)
        )
    };

    let previous = nav
        .previous
        .as_deref()
        .map(|p| link(p, "prev", "&larr;"))
        .unwrap_or_default();
    let next = nav
        .next
        .as_deref()
        .map(|p| link(p, "next", "&rarr;"))
        .unwrap_or_default();

    format!(
        r#"<nav class="series-nav">{previous} <span class="position">Part {} of {}</span> {next}</nav>"#,
        nav.position, nav.total,
    )
}

// ============================================================================
// Response Helpers
// ============================================================================

/// Serve a file with appropriate content type.
fn serve_file(request: Request, path: &Path) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let content_type = guess_content_type(path);

    let response = Response::from_data(content)
        .with_header(Header::from_bytes("Content-Type", content_type).unwrap());

    request.respond(response)?;
    Ok(())
}

/// Serve HTML content.
fn serve_html(request: Request, content: String) -> Result<()> {
    let response = Response::from_string(content)
        .with_header(Header::from_bytes("Content-Type", "text/html; charset=utf-8").unwrap());
    request.respond(response)?;
    Ok(())
}

/// Serve HTML content with an explicit status code.
fn serve_html_with_status(request: Request, content: String, status: u16) -> Result<()> {
    let response = Response::from_string(content)
        .with_header(Header::from_bytes("Content-Type", "text/html; charset=utf-8").unwrap())
        .with_status_code(StatusCode(status));
    request.respond(response)?;
    Ok(())
}

/// Serve a JSON document.
fn serve_json(request: Request, value: serde_json::Value) -> Result<()> {
    let response = Response::from_string(value.to_string())
        .with_header(Header::from_bytes("Content-Type", "application/json; charset=utf-8").unwrap());
    request.respond(response)?;
    Ok(())
}

/// Serve a plain 404 (for assets and unroutable requests).
fn serve_not_found(request: Request) -> Result<()> {
    let response = Response::from_string("404 Not Found")
        .with_header(Header::from_bytes("Content-Type", "text/plain").unwrap())
        .with_status_code(StatusCode(404));
    request.respond(response)?;
    Ok(())
}

// ============================================================================
// Request Helpers
// ============================================================================

/// Extract one url-encoded parameter from a query string or form body.
///
/// Empty values count as absent, so `/blog?search=` lists everything.
fn query_param(query: &str, key: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .and_then(|(_, value)| {
            let value = value.replace('+', " ");
            urlencoding::decode(&value).ok().map(Cow::into_owned)
        })
        .filter(|value| !value.is_empty())
}

/// Escape HTML special characters.
///
/// Uses `Cow` to avoid allocation when no escaping is needed.
#[inline]
fn html_escape(s: &str) -> Cow<'_, str> {
    // Fast path: check if escaping is needed
    if !s.contains(['<', '>', '&', '"']) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        // Web content
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        // Documents
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",

        // Default binary
        _ => "application/octet-stream",
    }
}

// ============================================================================
// Tests
// ============================================================================
