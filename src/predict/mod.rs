pub mod engine;
pub mod scoring;

use serde::Serialize;

use crate::error::{ErrorBody, FetchError};

pub use engine::{MatchupInputs, PredictionResult, PredictionTrace, TeamInputs, predict};

/// What crosses the presentation boundary: a result or an error object,
/// never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictionResponse {
    Ok(PredictionResult),
    Err(ErrorBody),
}

impl From<Result<PredictionResult, FetchError>> for PredictionResponse {
    fn from(result: Result<PredictionResult, FetchError>) -> Self {
        match result {
            Ok(r) => PredictionResponse::Ok(r),
            Err(err) => PredictionResponse::Err(ErrorBody::from(&err)),
        }
    }
}
