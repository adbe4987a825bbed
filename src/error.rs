use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Upstream providers the engine talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Upstream {
    FootballData,
    ClubElo,
    Fbref,
    NewsApi,
    Article,
}

impl Upstream {
    pub fn as_str(self) -> &'static str {
        match self {
            Upstream::FootballData => "football-data",
            Upstream::ClubElo => "clubelo",
            Upstream::Fbref => "fbref",
            Upstream::NewsApi => "newsapi",
            Upstream::Article => "article",
        }
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// Network failure, non-2xx status (other than 429) or a payload that failed validation.
    #[error("{upstream} unavailable: {message}")]
    UpstreamUnavailable { upstream: Upstream, message: String },

    /// HTTP 429, surfaced once the retry budget is spent.
    #[error("{upstream} rate limited")]
    RateLimited { upstream: Upstream },

    /// A required query parameter was absent; raised before any upstream call.
    #[error("missing input: {0}")]
    MissingInput(String),
}

impl FetchError {
    pub fn unavailable(upstream: Upstream, message: impl Into<String>) -> Self {
        FetchError::UpstreamUnavailable {
            upstream,
            message: message.into(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. })
    }
}

/// Error object handed across the presentation boundary.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
}

impl From<&FetchError> for ErrorBody {
    fn from(err: &FetchError) -> Self {
        let kind = match err {
            FetchError::UpstreamUnavailable { .. } => "upstream_unavailable",
            FetchError::RateLimited { .. } => "rate_limited",
            FetchError::MissingInput(_) => "missing_input",
        };
        ErrorBody {
            error: err.to_string(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_carries_message_and_kind() {
        let err = FetchError::RateLimited {
            upstream: Upstream::FootballData,
        };
        let body = ErrorBody::from(&err);
        assert_eq!(body.error, "football-data rate limited");
        assert_eq!(body.kind, "rate_limited");

        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["error"], "football-data rate limited");
    }

    #[test]
    fn unavailable_message_names_upstream() {
        let err = FetchError::unavailable(Upstream::ClubElo, "http 503");
        assert_eq!(err.to_string(), "clubelo unavailable: http 503");
        assert!(!err.is_rate_limited());
    }
}
