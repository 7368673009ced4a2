//! Integration tests for ingesting, splitting and normalizing datasets.

use std::fs;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::TempDir;

use emogif::analysis::normalizer::{NormalizerSettings, TextNormalizer};
use emogif::dataset::{ColumnSpec, DatasetIngestor, DatasetSource, split_with_rng};
use emogif::emotion::Emotion;
use emogif::error::{EmogifError, Result};
use emogif::ml::label_encoder::LabelEncoder;

#[test]
fn test_two_sources_with_different_delimiters() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("emotions.csv");
    let second = dir.path().join("tweet_emotions.csv");
    fs::write(
        &first,
        "content;emotion\nskipped;joy\nwhat a great day;joy\nso alone;sadness\n;anger\nok;boredom\n",
    )
    .unwrap();
    fs::write(
        &second,
        "tweet_id,sentiment,content,emotion\n1,x,skipped,hate\n2,x,\"yuck, gross\",hate\n3,x,wow really,SURPRISE\n",
    )
    .unwrap();

    let ingestor = DatasetIngestor::new(
        vec![DatasetSource::new(&first, ';'), DatasetSource::new(&second, ',')],
        ColumnSpec::default(),
    );

    let (_, report) = ingestor.ingest_source(&DatasetSource::new(&first, ';'))?;
    assert_eq!(report.read, 5);
    assert_eq!(report.skipped_first, 1);
    assert_eq!(report.dropped_missing, 1);
    assert_eq!(report.dropped_invalid_label, 1);
    assert_eq!(report.kept, 2);

    let rows = ingestor.ingest()?;
    let labels: Vec<Emotion> = rows.iter().map(|r| r.emotion).collect();
    assert_eq!(
        labels,
        vec![Emotion::Happy, Emotion::Sad, Emotion::Disgust, Emotion::Surprise]
    );
    assert_eq!(rows[2].text, "yuck, gross");
    Ok(())
}

#[test]
fn test_missing_column_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.csv");
    fs::write(&path, "text,label\na,joy\n").unwrap();

    let ingestor = DatasetIngestor::new(vec![DatasetSource::new(&path, ',')], ColumnSpec::default());
    assert!(matches!(ingestor.ingest(), Err(EmogifError::Dataset(_))));
}

#[test]
fn test_split_and_normalize() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("emotions.csv");
    let mut body = String::from("content;emotion\nfirst;joy\n");
    for i in 0..20 {
        body.push_str(&format!("I am so happy today {i};joy\n"));
        body.push_str(&format!("running scared {i};fear\n"));
    }
    fs::write(&path, body).unwrap();

    let rows = DatasetIngestor::new(vec![DatasetSource::new(&path, ';')], ColumnSpec::default())
        .ingest()?;
    assert_eq!(rows.len(), 40);

    let mut rng = StdRng::seed_from_u64(3);
    let (training, testing) = split_with_rng(rows, 0.75, &mut rng)?;
    assert_eq!(training.len(), 30);
    assert_eq!(testing.len(), 9);

    let mut settings = NormalizerSettings::default();
    settings.spelling.enabled = false;
    let normalizer = TextNormalizer::with_settings(settings)?;
    let training = normalizer.normalize_column(training)?;
    for sample in &training {
        match sample.emotion {
            Emotion::Happy => assert_eq!(&sample.tokens[..2], &["happi", "todai"]),
            Emotion::Fear => assert_eq!(&sample.tokens[..2], &["run", "scare"]),
            other => panic!("unexpected label {other}"),
        }
    }

    let encoder = LabelEncoder::fit(training.iter().map(|s| s.emotion))?;
    assert!(encoder.n_classes() <= 2);
    Ok(())
}
