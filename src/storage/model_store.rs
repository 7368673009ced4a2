//! Trained model files.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::analysis::normalizer::NormalizerSettings;
use crate::error::Result;
use crate::ml::pipeline::EmotionPipeline;
use crate::ml::trainer::TrainedModel;
use crate::storage::artifact::{ArtifactReader, ArtifactWriter, Tag};

pub const META: Tag = *b"META";
pub const NORM: Tag = *b"NORM";
pub const VECT: Tag = *b"VECT";
pub const CLSF: Tag = *b"CLSF";
pub const LENC: Tag = *b"LENC";

/// Contents of the `NORM` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct NormalizerRecord {
    settings: NormalizerSettings,
    dictionary_checksum: Option<u32>,
}

/// Save a trained model atomically.
pub fn save_model(model: &TrainedModel, path: &Path) -> Result<()> {
    let normalizer = NormalizerRecord {
        settings: model.normalizer.clone(),
        dictionary_checksum: model.dictionary_checksum,
    };
    let mut writer = ArtifactWriter::new();
    writer
        .add_section(META, &model.metadata)?
        .add_section(NORM, &normalizer)?
        .add_section(VECT, model.pipeline.vectorizer())?
        .add_section(CLSF, model.pipeline.classifier())?
        .add_section(LENC, &model.labels)?;
    writer.write_to_path(path)?;
    info!("Saved model to {}", path.display());
    Ok(())
}

/// Load a trained model.
pub fn load_model(path: &Path) -> Result<TrainedModel> {
    let reader = ArtifactReader::open(path)?;
    let metadata: crate::ml::trainer::ModelMetadata = reader.section(META)?;
    let pipeline = EmotionPipeline::from_parts(
        metadata.best_params.clone(),
        reader.section(VECT)?,
        reader.section(CLSF)?,
    );
    let normalizer: NormalizerRecord = reader.section(NORM)?;
    let model = TrainedModel {
        normalizer: normalizer.settings,
        dictionary_checksum: normalizer.dictionary_checksum,
        labels: reader.section(LENC)?,
        pipeline,
        metadata,
    };
    info!(
        "Loaded model from {} (created {}, test score {:?})",
        path.display(),
        model.metadata.created_at,
        model.metadata.test_score
    );
    Ok(model)
}
