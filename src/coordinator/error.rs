use actix_web::HttpResponse;
use actix_web::ResponseError;
use serde::Serialize;
use std::fmt;

/// A request was rejected before touching coordinator state.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            field: None,
        }
    }

    pub fn on(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            field: Some(field.into()),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ResponseError for ValidationError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::BadRequest().json(self)
    }
}

/// An invariant the coordinator itself is responsible for was broken --
/// never a caller's fault, always a 500.
#[derive(Debug)]
pub struct CoordinatorError(pub anyhow::Error);

impl fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CoordinatorError {}

impl From<anyhow::Error> for CoordinatorError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl ResponseError for CoordinatorError {
    fn error_response(&self) -> HttpResponse {
        log::error!("coordinator invariant violated: {:#}", self.0);
        HttpResponse::InternalServerError().json(serde_json::json!({ "error": self.0.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_responds_with_400() {
        let err = ValidationError::on("batch_size", "must be in [1, 1024]");
        assert_eq!(err.error_response().status().as_u16(), 400);
        assert_eq!(err.to_string(), "batch_size: must be in [1, 1024]");
    }

    #[test]
    fn coordinator_error_responds_with_500() {
        let err: CoordinatorError = anyhow::anyhow!("registry index out of range").into();
        assert_eq!(err.error_response().status().as_u16(), 500);
    }
}
