// src/services/transcript.rs

//! `content.txt` generation.
//!
//! A transcript has up to four sections separated by blank lines:
//!
//! ```text
//! [POST URL]
//! https://kemono.party/patreon/user/1/post/42
//!
//! [CONTENT]
//! Hello
//!
//! [EMBED]
//! Type: video
//!
//! [COMMENTS]
//! alice - nice - 2023-01-01
//! ```
//!
//! `[EMBED]` and `[COMMENTS]` are omitted when empty. Comments are scraped
//! from the post's HTML page with a single unretried GET; any failure there
//! just drops the comments section.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::storage::local::write_atomic;
use crate::utils::capitalize;

pub const TRANSCRIPT_FILE: &str = "content.txt";

const COMMENT_SELECTOR: &str = "article.comment";
const AUTHOR_SELECTOR: &str = "a.comment__name";
const MESSAGE_SELECTOR: &str = "p.comment__message";
const TIMESTAMP_SELECTOR: &str = "time.timestamp";

/// One scraped post comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub author: String,
    pub message: String,
    pub timestamp: String,
}

impl Comment {
    /// `author - message - timestamp`
    pub fn line(&self) -> String {
        format!("{} - {} - {}", self.author, self.message, self.timestamp)
    }
}

/// Writes post transcripts.
#[derive(Debug, Clone)]
pub struct TranscriptWriter {
    client: Client,
    timeout: Duration,
}

impl TranscriptWriter {
    /// `timeout` bounds the comment page request, body included.
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Write `content.txt` into `dest_dir`, replacing any previous one.
    pub async fn write(
        &self,
        dest_dir: &Path,
        content_html: &str,
        embed: &Map<String, Value>,
        post_url: &str,
    ) -> Result<PathBuf> {
        let comments = self.fetch_comments(post_url).await;
        let text = render_transcript(post_url, &html_to_text(content_html), embed, &comments);

        let path = dest_dir.join(TRANSCRIPT_FILE);
        write_atomic(&path, text.as_bytes()).await?;
        log::debug!("Wrote transcript {}", path.display());
        Ok(path)
    }

    /// Comments on the post page; empty on any failure.
    pub async fn fetch_comments(&self, post_url: &str) -> Vec<Comment> {
        let html = match self.fetch_page(post_url).await {
            Ok(html) => html,
            Err(e) => {
                log::warn!("Error fetching comments from {}: {}", post_url, e);
                return Vec::new();
            }
        };

        parse_comments(&html).unwrap_or_else(|e| {
            log::warn!("Error parsing comments from {}: {}", post_url, e);
            Vec::new()
        })
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        Ok(self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?)
    }
}

/// Extract comments from a post page.
///
/// Comments missing the author, message or timestamp element are skipped.
pub fn parse_comments(html: &str) -> Result<Vec<Comment>> {
    let comment_sel = parse_selector(COMMENT_SELECTOR)?;
    let author_sel = parse_selector(AUTHOR_SELECTOR)?;
    let message_sel = parse_selector(MESSAGE_SELECTOR)?;
    let timestamp_sel = parse_selector(TIMESTAMP_SELECTOR)?;

    let document = Html::parse_document(html);
    let comments = document
        .select(&comment_sel)
        .filter_map(|el| {
            let fields = (
                first_text(el, &author_sel),
                first_text(el, &message_sel),
                first_text(el, &timestamp_sel),
            );
            match fields {
                (Some(author), Some(message), Some(timestamp)) => Some(Comment {
                    author,
                    message,
                    timestamp,
                }),
                _ => {
                    log::debug!("Skipping malformed comment");
                    None
                }
            }
        })
        .collect();

    Ok(comments)
}

/// Plain-text rendering of post HTML.
pub fn html_to_text(html: &str) -> String {
    htmd::convert(html).unwrap_or_else(|_| {
        Html::parse_fragment(html)
            .root_element()
            .text()
            .collect::<Vec<_>>()
            .join(" ")
    })
}

/// Assemble the transcript text.
pub fn render_transcript(
    post_url: &str,
    content_text: &str,
    embed: &Map<String, Value>,
    comments: &[Comment],
) -> String {
    let mut out = format!("[POST URL]\n{post_url}\n\n");
    out.push_str(&format!("[CONTENT]\n{}\n\n", content_text.trim_end()));

    if !embed.is_empty() {
        out.push_str("[EMBED]\n");
        for (key, value) in embed {
            out.push_str(&format!("{}: {}\n", capitalize(key), embed_value(value)));
        }
        out.push('\n');
    }

    if !comments.is_empty() {
        let lines: Vec<String> = comments.iter().map(Comment::line).collect();
        out.push_str(&format!("[COMMENTS]\n{}\n", lines.join("\n")));
    }

    out
}

// Strings are written bare, everything else as JSON.
fn embed_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn first_text(el: ElementRef<'_>, selector: &Selector) -> Option<String> {
    el.select(selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
