use chrono::{DateTime, Utc};
use reqwest::Url;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::{FetchError, Upstream};
use crate::http_client::get_text;

const NEWS_EVERYTHING_URL: &str = "https://newsapi.org/v2/everything";
const NEWS_HEADLINES_URL: &str = "https://newsapi.org/v2/top-headlines";
const NEWS_QUERY: &str =
    "ฟุตบอล OR พรีเมียร์ลีก OR ยูฟ่า OR ลาลีกา OR บุนเดสลีกา OR ลีกเอิง OR ไทยลีก";
const PAGE_SIZE: &str = "30";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub source_name: Option<String>,
    pub author: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub url_to_image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    /// Always empty; full text goes through the article extractor.
    pub content: String,
}

/// Thai football news, or the Thai top headlines for `category` when given.
pub fn fetch_news(
    client: &Client,
    api_key: Option<&str>,
    category: Option<&str>,
) -> Result<Vec<NewsArticle>, FetchError> {
    let Some(api_key) = api_key else {
        return Err(FetchError::MissingInput("NEWS_API_KEY".to_string()));
    };
    let url = news_url(api_key, category)?;
    let body = get_text(client, Upstream::NewsApi, url.as_str(), &[])?;
    parse_news_json(&body)
}

fn news_url(api_key: &str, category: Option<&str>) -> Result<Url, FetchError> {
    let category = category.map(str::trim).filter(|c| !c.is_empty());
    let parsed = match category {
        Some(category) => Url::parse_with_params(
            NEWS_HEADLINES_URL,
            &[
                ("country", "th"),
                ("category", category),
                ("pageSize", PAGE_SIZE),
                ("apiKey", api_key),
            ],
        ),
        None => Url::parse_with_params(
            NEWS_EVERYTHING_URL,
            &[
                ("q", NEWS_QUERY),
                ("language", "th"),
                ("pageSize", PAGE_SIZE),
                ("apiKey", api_key),
            ],
        ),
    };
    parsed.map_err(|err| FetchError::unavailable(Upstream::NewsApi, format!("bad url: {err}")))
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    #[serde(default)]
    source: Option<RawSource>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    url_to_image: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(default)]
    name: Option<String>,
}

/// Newest first. Articles without a title or url are dropped.
pub fn parse_news_json(raw: &str) -> Result<Vec<NewsArticle>, FetchError> {
    let resp: NewsResponse = serde_json::from_str(raw.trim())
        .map_err(|err| FetchError::unavailable(Upstream::NewsApi, format!("invalid json: {err}")))?;
    if resp.status.as_deref() == Some("error") {
        return Err(FetchError::unavailable(
            Upstream::NewsApi,
            resp.message.unwrap_or_else(|| "error status".to_string()),
        ));
    }

    let mut out = resp
        .articles
        .into_iter()
        .filter_map(|a| {
            let title = a.title.filter(|t| !t.trim().is_empty())?;
            let url = a.url.filter(|u| !u.trim().is_empty())?;
            Some(NewsArticle {
                source_name: a.source.and_then(|s| s.name),
                author: a.author,
                title,
                description: a.description,
                url,
                url_to_image: a.url_to_image,
                published_at: a
                    .published_at
                    .as_deref()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|d| d.with_timezone(&Utc)),
                content: String::new(),
            })
        })
        .collect::<Vec<_>>();
    out.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    Ok(out)
}
