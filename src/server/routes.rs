//! The user-facing JSON routes: submit an image for classification and
//! fetch stored results by id

use crate::error::PipelineError;
use crate::pipeline::Pipeline;
use actix_multipart::form::bytes::Bytes;
use actix_multipart::form::MultipartForm;
use actix_web::{get, post, web, HttpResponse, Responder};
use tracing::info;

type Result<T> = std::result::Result<T, PipelineError>;

/// Multipart payload for `POST /predict`: a single `file` field
#[derive(Debug, MultipartForm)]
pub struct PredictForm {
    #[multipart(rename = "file", limit = "25MiB")]
    pub file: Bytes,
}

#[post("/predict")]
pub async fn predict(
    MultipartForm(form): MultipartForm<PredictForm>,
    state: web::Data<Pipeline>,
) -> Result<impl Responder> {
    let filename = form
        .file
        .file_name
        .clone()
        .unwrap_or_else(|| "upload".to_string());

    let envelope = state.classify(&form.file.data, &filename)?;

    info!(
        id = %envelope.id,
        label = ?envelope.prediction.label,
        confidence = envelope.prediction.confidence,
        "finished serving inference request"
    );
    Ok(HttpResponse::Ok().json(envelope.as_ref()))
}

#[get("/results/{id}")]
pub async fn get_result(
    path: web::Path<String>,
    state: web::Data<Pipeline>,
) -> Result<impl Responder> {
    let envelope = state.store().get(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(envelope.as_ref()))
}

#[get("/health")]
pub async fn health(state: web::Data<Pipeline>) -> impl Responder {
    web::Json(serde_json::json!({
        "status": "ok",
        "results_stored": state.store().len(),
    }))
}
