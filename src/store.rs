//! In-memory registry of classification results

use crate::error::{PipelineError, Result};
use crate::interpret::PredictionResult;
use crate::preprocess::ImageMetadata;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// The complete, immutable record of one classification request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub id: String,
    pub prediction: PredictionResult,
    pub processing_time_seconds: f64,
    pub metadata: ImageMetadata,
    pub filename: String,
    pub created_at: String,
}

/// Envelope fields supplied by the pipeline; the store assigns the id
#[derive(Debug, Clone)]
pub struct EnvelopeFields {
    pub prediction: PredictionResult,
    pub processing_time_seconds: f64,
    pub metadata: ImageMetadata,
    pub filename: String,
    pub created_at: String,
}

/// Keyed registry of result envelopes for the process lifetime. Write-once,
/// no eviction; mutation is serialized by a single mutex so ids never collide,
/// while reads hand out shared immutable envelopes.
#[derive(Debug, Default)]
pub struct ResultStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    results: HashMap<String, Arc<ResultEnvelope>>,
}

impl ResultStore {
    pub fn new() -> Self {
        ResultStore::default()
    }

    /// Store an envelope under a fresh sequence-based id and return it
    pub fn create(&self, fields: EnvelopeFields) -> Arc<ResultEnvelope> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = format!("result_{}", inner.next_id);
        let envelope = Arc::new(ResultEnvelope {
            id: id.clone(),
            prediction: fields.prediction,
            processing_time_seconds: fields.processing_time_seconds,
            metadata: fields.metadata,
            filename: fields.filename,
            created_at: fields.created_at,
        });
        inner.results.insert(id, envelope.clone());
        envelope
    }

    pub fn get(&self, id: &str) -> Result<Arc<ResultEnvelope>> {
        self.inner
            .lock()
            .unwrap()
            .results
            .get(id)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpret::Label;

    fn fields(filename: &str) -> EnvelopeFields {
        EnvelopeFields {
            prediction: PredictionResult {
                label: Label::Benign,
                confidence: 0.93,
            },
            processing_time_seconds: 0.12,
            metadata: ImageMetadata {
                width: 640,
                height: 480,
                resolution: "640×480".to_string(),
                format: "PNG".to_string(),
                size_bytes: 12_345,
                color_mode: "RGB".to_string(),
            },
            filename: filename.to_string(),
            created_at: "2026-08-24 12:00:00".to_string(),
        }
    }

    #[test]
    fn create_then_get_round_trips() {
        let store = ResultStore::new();
        let created = store.create(fields("slide.png"));
        let fetched = store.get(&created.id).unwrap();
        assert_eq!(*created, *fetched);
        assert_eq!(fetched.filename, "slide.png");
    }

    #[test]
    fn unknown_id_is_not_found() {
        let store = ResultStore::new();
        assert!(matches!(
            store.get("result_999"),
            Err(PipelineError::NotFound(_))
        ));
    }

    #[test]
    fn ids_are_sequential_and_unique() {
        let store = ResultStore::new();
        let first = store.create(fields("a.png"));
        let second = store.create(fields("b.png"));
        assert_eq!(first.id, "result_1");
        assert_eq!(second.id, "result_2");
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn concurrent_creates_never_collide() {
        let store = Arc::new(ResultStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    (0..16)
                        .map(|_| store.create(fields("c.png")).id.clone())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let ids: std::collections::HashSet<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(ids.len(), 8 * 16);
        assert_eq!(store.len(), 8 * 16);
    }

    #[test]
    fn envelopes_serialize_with_their_wire_fields() {
        let store = ResultStore::new();
        let envelope = store.create(fields("slide.png"));
        let json = serde_json::to_value(envelope.as_ref()).unwrap();
        assert_eq!(json["id"], "result_1");
        assert_eq!(json["prediction"]["label"], "Benign");
        assert_eq!(json["metadata"]["resolution"], "640×480");
        assert_eq!(json["filename"], "slide.png");
    }
}
