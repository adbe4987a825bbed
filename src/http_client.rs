use std::time::Duration;

use anyhow::Context;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use tracing::debug;

use crate::error::{FetchError, Upstream};

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub fn build_client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build http client")
}

/// Issues one GET and returns the body of a 2xx response.
///
/// 429 maps to `RateLimited`; every other failure (transport, timeout,
/// non-2xx) maps to `UpstreamUnavailable` tagged with `upstream`.
pub fn get_text(
    client: &Client,
    upstream: Upstream,
    url: &str,
    extra_headers: &[(&str, &str)],
) -> Result<String, FetchError> {
    get_text_with_timeout(client, upstream, url, extra_headers, None)
}

/// Same as [`get_text`], with a hard per-request timeout overriding the client's.
pub fn get_text_with_timeout(
    client: &Client,
    upstream: Upstream,
    url: &str,
    extra_headers: &[(&str, &str)],
    timeout: Option<Duration>,
) -> Result<String, FetchError> {
    let mut req = client.get(url).header(USER_AGENT, BROWSER_UA);
    for (name, value) in extra_headers {
        req = req.header(*name, *value);
    }
    if let Some(timeout) = timeout {
        req = req.timeout(timeout);
    }

    debug!(%upstream, url, "GET");
    let resp = req.send().map_err(|err| transport_error(upstream, &err))?;
    let status = resp.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(FetchError::RateLimited { upstream });
    }

    let body = resp.text().map_err(|err| transport_error(upstream, &err))?;
    if !status.is_success() {
        return Err(FetchError::unavailable(
            upstream,
            format!("http {}: {}", status, truncate(&body, 200)),
        ));
    }
    Ok(body)
}

fn transport_error(upstream: Upstream, err: &reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::unavailable(upstream, "request timed out")
    } else {
        FetchError::unavailable(upstream, format!("request failed: {err}"))
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    /// Serves one canned response on a local port, after `delay`.
    fn serve_once(status_line: &'static str, body: &'static str, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            thread::sleep(delay);
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        });
        format!("http://{addr}/")
    }

    fn client() -> Client {
        build_client(Duration::from_secs(5)).expect("client")
    }

    #[test]
    fn success_returns_body() {
        let url = serve_once("200 OK", "Rank,Club", Duration::ZERO);
        let body = get_text(&client(), Upstream::ClubElo, &url, &[]).expect("body");
        assert_eq!(body, "Rank,Club");
    }

    #[test]
    fn too_many_requests_is_rate_limited() {
        let url = serve_once("429 Too Many Requests", "slow down", Duration::ZERO);
        let err = get_text(&client(), Upstream::FootballData, &url, &[("X-Auth-Token", "k")])
            .unwrap_err();
        assert_eq!(
            err,
            FetchError::RateLimited {
                upstream: Upstream::FootballData
            }
        );
    }

    #[test]
    fn other_statuses_are_unavailable() {
        let url = serve_once("503 Service Unavailable", "no", Duration::ZERO);
        let err = get_text(&client(), Upstream::FootballData, &url, &[]).unwrap_err();
        assert_eq!(
            err,
            FetchError::unavailable(Upstream::FootballData, "http 503 Service Unavailable: no")
        );
    }

    #[test]
    fn timeout_is_a_network_failure() {
        let url = serve_once("200 OK", "late", Duration::from_secs(3));
        let err = get_text_with_timeout(
            &client(),
            Upstream::ClubElo,
            &url,
            &[],
            Some(Duration::from_millis(300)),
        )
        .unwrap_err();
        assert_eq!(err, FetchError::unavailable(Upstream::ClubElo, "request timed out"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("ฟุตบอล", 2), "ฟุ");
        assert_eq!(truncate("short", 200), "short");
    }
}
