//! HTTP surface: maps pipeline errors onto status codes and hosts the routes

use crate::error::PipelineError;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;

pub mod routes;

impl actix_web::error::ResponseError for PipelineError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(serde_json::json!({ "error": self.to_string() }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::Decode(_)
            | PipelineError::ShapeMismatch { .. }
            | PipelineError::InvalidOutputShape(_) => StatusCode::BAD_REQUEST,
            PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
            PipelineError::ModelLoad(_) | PipelineError::Inference(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::error::ResponseError;

    #[test]
    fn errors_map_to_client_facing_status_codes() {
        assert_eq!(
            PipelineError::Decode("bad png".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PipelineError::NotFound("result_9".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            PipelineError::InvalidOutputShape(3).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PipelineError::ShapeMismatch {
                expected: vec![1, 3, 224, 224],
                actual: vec![1, 3, 299, 299],
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PipelineError::Inference("runtime".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
