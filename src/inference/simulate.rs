//! Local stand-in for the CNN service.
//!
//! Used when `INFERENCE_MODE=simulate`: picks a random sport with 70-95%
//! confidence and splits the remainder across four other distinct sports.
//! The uploaded bytes are echoed back base64-encoded, the same shape the
//! real service returns.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;

use super::{Classifier, ExternalPrediction, ExternalTopPrediction, InferenceError, UploadedImage};
use crate::labels::SPORTS_LABELS;

const TOP_K: usize = 5;

#[derive(Debug, Default)]
pub struct SimulatedClassifier;

impl SimulatedClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Classifier for SimulatedClassifier {
    async fn classify(&self, image: UploadedImage) -> Result<ExternalPrediction, InferenceError> {
        Ok(simulate(&mut rand::rng(), &image.bytes))
    }

    fn name(&self) -> &'static str {
        "simulate"
    }
}

pub(crate) fn simulate<R: Rng + ?Sized>(rng: &mut R, image_bytes: &[u8]) -> ExternalPrediction {
    let picks = rand::seq::index::sample(rng, SPORTS_LABELS.len(), TOP_K);

    let main_confidence = 0.7 + rng.random::<f64>() * 0.25;
    let mut remaining = 1.0 - main_confidence;
    let mut top_preds = Vec::with_capacity(TOP_K);

    for (rank, idx) in picks.iter().enumerate() {
        let prob = match rank {
            0 => main_confidence,
            r if r < TOP_K - 1 => remaining * (0.3 + rng.random::<f64>() * 0.4),
            _ => remaining,
        };
        if rank > 0 {
            remaining -= prob;
        }
        top_preds.push(ExternalTopPrediction { label: SPORTS_LABELS[idx].to_owned(), prob });
    }

    ExternalPrediction {
        predicted: top_preds[0].label.clone(),
        confidence: main_confidence,
        top_preds,
        image: STANDARD.encode(image_bytes),
    }
}
