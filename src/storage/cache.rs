//! Cache of the normalized training and testing splits.
//!
//! Normalizing a large dataset dominates the time of a training run before
//! the search starts. The split is written after every preprocessing pass
//! and can be reused on the next run instead of re-ingesting the sources.

use std::path::Path;

use log::info;

use crate::dataset::NormalizedSample;
use crate::error::Result;
use crate::ml::label_encoder::LabelEncoder;
use crate::storage::artifact::{ArtifactReader, ArtifactWriter, Tag};
use crate::storage::model_store::LENC;

pub const TRAN: Tag = *b"TRAN";
pub const TEST: Tag = *b"TEST";

/// The normalized split plus the encoder fitted on its training half.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessedData {
    pub training: Vec<NormalizedSample>,
    pub testing: Vec<NormalizedSample>,
    pub labels: LabelEncoder,
}

impl PreprocessedData {
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = ArtifactWriter::new();
        writer
            .add_section(TRAN, &self.training)?
            .add_section(TEST, &self.testing)?
            .add_section(LENC, &self.labels)?;
        writer.write_to_path(path)?;
        info!(
            "Cached {} training and {} testing rows at {}",
            self.training.len(),
            self.testing.len(),
            path.display()
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let reader = ArtifactReader::open(path)?;
        Ok(PreprocessedData {
            training: reader.section(TRAN)?,
            testing: reader.section(TEST)?,
            labels: reader.section(LENC)?,
        })
    }
}
