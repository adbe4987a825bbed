use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use serde::Serialize;

use crate::error::{FetchError, Upstream};
use crate::http_client::get_text;

pub const CONTENT_NOT_FOUND: &str = "Content not found for this website or article format.";

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("valid p selector"));
static THAIRATH_BODY: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".article-content").expect("valid article selector"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleText {
    pub url: String,
    pub content: String,
}

pub fn fetch_article_text(client: &Client, url: &str) -> Result<ArticleText, FetchError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(FetchError::MissingInput("url".to_string()));
    }
    let html = get_text(client, Upstream::Article, url, &[])?;
    Ok(ArticleText {
        url: url.to_string(),
        content: extract_article_text(&html, url),
    })
}

/// Joins every non-empty `<p>` with blank lines. Thairath pages without
/// paragraphs fall back to the text of their `.article-content` block.
pub fn extract_article_text(html: &str, url: &str) -> String {
    let doc = Html::parse_document(html);
    let paragraphs = doc
        .select(&PARAGRAPH)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>();
    if !paragraphs.is_empty() {
        return paragraphs.join("\n\n");
    }

    if url.contains("thairath.co.th")
        && let Some(body) = doc.select(&THAIRATH_BODY).next()
    {
        let text = body.text().collect::<String>();
        let text = text.trim();
        if !text.is_empty() {
            return text.to_string();
        }
    }

    CONTENT_NOT_FOUND.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_are_joined() {
        let html = "<html><body><p> First </p><p></p><p>Second</p></body></html>";
        assert_eq!(extract_article_text(html, "https://example.com/a"), "First\n\nSecond");
    }

    #[test]
    fn thairath_fallback_uses_container_text() {
        let html = r#"<div class="article-content"> Body text </div>"#;
        assert_eq!(
            extract_article_text(html, "https://www.thairath.co.th/sport/1"),
            "Body text"
        );
        assert_eq!(extract_article_text(html, "https://example.com"), CONTENT_NOT_FOUND);
    }

    #[test]
    fn blank_url_is_missing_input() {
        let err = fetch_article_text(&Client::new(), "  ").unwrap_err();
        assert_eq!(err, FetchError::MissingInput("url".to_string()));
    }
}
