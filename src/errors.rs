use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Engine error taxonomy. External-service failures are swallowed inside the
/// engine with fallback behavior; the variant only reaches a caller when a
/// collaborator is invoked directly without a fallback.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Constraints exclude all candidates: {0}")]
    ConstraintInfeasible(String),

    #[error("External service failure: {0}")]
    ExternalService(String),

    #[error("Missing input: {0}")]
    MissingInput(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn error_code(&self) -> &'static str {
        match self {
            EngineError::InsufficientData(_) => "INSUFFICIENT_DATA",
            EngineError::ConstraintInfeasible(_) => "CONSTRAINT_INFEASIBLE",
            EngineError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            EngineError::MissingInput(_) => "MISSING_INPUT",
        }
    }
}

impl ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::InsufficientData(_) | EngineError::MissingInput(_) => {
                StatusCode::BAD_REQUEST
            }
            EngineError::ConstraintInfeasible(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::ExternalService(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        }))
    }
}
