mod common;

use std::fs;

use common::{write_collection, Workspace, SAMPLE_INPUTS};
use labelwise::{IngestionError, LoadFailure, ModelStore, TrainingError};

#[test]
fn test_restore_reproduces_classification() -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::spam_ham();
    let trained = ws.ready_service();
    assert!(ws.model_path.is_file());

    let mut restored = ws.service();
    restored.restore_or_fail()?;

    assert_eq!(trained.model(), restored.model());
    for input in SAMPLE_INPUTS {
        assert_eq!(trained.classify(input)?, restored.classify(input)?);
    }
    Ok(())
}

#[test]
fn test_store_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::spam_ham();
    let service = ws.ready_service();
    let model = service.model().ok_or("service not ready")?;

    let store = ModelStore::new(ws.root.path().join("copy").join("model.bin"));
    store.persist(model)?;
    assert!(store.is_model_persisted());
    assert_eq!(&store.restore()?, model);

    store.remove_model()?;
    assert!(!store.is_model_persisted());
    assert!(matches!(store.restore(), Err(LoadFailure::Missing(_))));
    Ok(())
}

#[test]
fn test_corrupt_model_falls_back_to_training() -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::spam_ham();
    fs::create_dir_all(ws.model_path.parent().ok_or("no parent")?)?;
    fs::write(&ws.model_path, b"LWPV\x01\x00\x00\x00garbage")?;

    let mut service = ws.service();
    assert!(service.restore_or_fail().is_err());
    assert!(!service.is_ready());

    service.start(false)?;
    assert!(service.is_ready());

    // The retrained model replaced the corrupt file
    let mut again = ws.service();
    again.restore_or_fail()?;
    assert_eq!(again.model(), service.model());
    Ok(())
}

#[test]
fn test_malformed_training_file_persists_nothing() {
    let ws = Workspace::spam_ham();
    fs::write(ws.data.join("broken.json"), "[{\"Answer\": \"unterminated").unwrap();

    let mut service = ws.service();
    let err = service.train_fresh().unwrap_err();
    assert!(matches!(
        err,
        TrainingError::Ingestion(IngestionError::Parse { .. })
    ));
    assert!(!service.is_ready());
    assert!(!ws.model_path.exists());
    assert!(service.start(false).is_err());
}

#[test]
fn test_missing_answer_field_fails_training() {
    let ws = Workspace::spam_ham();
    fs::write(ws.data.join("odd.json"), r#"[{"Answer": "ok"}, {"Question": "no answer"}]"#).unwrap();

    let mut service = ws.service();
    assert!(matches!(
        service.train_fresh(),
        Err(TrainingError::Ingestion(IngestionError::Format { .. }))
    ));
    assert!(!ws.model_path.exists());
}

#[test]
fn test_stale_labels_trigger_retrain() -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::spam_ham();
    ws.ready_service();
    write_collection(&ws.data, "billing.json", &["invoice attached", "payment overdue"]);

    let mut service = ws.service();
    match service.restore_or_fail() {
        Err(LoadFailure::LabelMismatch { persisted, corpus }) => {
            assert_eq!(persisted, vec!["ham", "spam"]);
            assert_eq!(corpus, vec!["billing", "ham", "spam"]);
        }
        other => panic!("expected label mismatch, got {:?}", other),
    }

    service.start(false)?;
    assert_eq!(service.classify("invoice")?.len(), 3);
    Ok(())
}

#[test]
fn test_restore_without_corpus_uses_model_labels() -> Result<(), Box<dyn std::error::Error>> {
    let ws = Workspace::spam_ham();
    ws.ready_service();
    for entry in fs::read_dir(&ws.data)? {
        fs::remove_file(entry?.path())?;
    }

    let mut service = ws.service();
    service.restore_or_fail()?;
    assert_eq!(service.classify("cheap")?.len(), 2);
    Ok(())
}
