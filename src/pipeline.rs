//! The end-to-end classification pipeline: decode, infer, interpret, store

use crate::config::Settings;
use crate::error::Result;
use crate::interpret;
use crate::model::ClassifierModel;
use crate::preprocess::Normalizer;
use crate::store::{EnvelopeFields, ResultEnvelope, ResultStore};
use chrono::Local;
use std::sync::Arc;
use std::time::Instant;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Owns the per-request flow. The model and store are injected at startup
/// and shared across every request the HTTP layer hands us.
pub struct Pipeline {
    normalizer: Normalizer,
    model: Arc<ClassifierModel>,
    store: Arc<ResultStore>,
}

impl Pipeline {
    pub fn new(settings: &Settings, model: Arc<ClassifierModel>, store: Arc<ResultStore>) -> Self {
        Pipeline {
            normalizer: Normalizer::new(&settings.model),
            model,
            store,
        }
    }

    /// Classify one uploaded image and store the outcome. The store is only
    /// written after the whole pipeline succeeded, so an abandoned request
    /// leaves no partial state behind.
    pub fn classify(&self, raw: &[u8], filename: &str) -> Result<Arc<ResultEnvelope>> {
        let started = Instant::now();

        let (tensor, metadata) = self.normalizer.normalize(raw, filename)?;
        let output = self.model.infer(&tensor)?;
        let activation = self.model.activation(output.scores.len())?;
        let prediction = interpret::interpret(activation, &output.scores)?;

        Ok(self.store.create(EnvelopeFields {
            prediction,
            processing_time_seconds: started.elapsed().as_secs_f64(),
            metadata,
            filename: filename.to_string(),
            created_at: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }))
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }
}
