mod common;

use serde_json::json;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

use common::{reasoning, upload, vision, RecordingStore, ScriptedReasoning, ScriptedVision};
use homework_pipeline::clients::{ReasoningBackend, VisionBackend};
use homework_pipeline::error::{AppError, ValidationError};
use homework_pipeline::infrastructure::Store;
use homework_pipeline::models::artifact::{ArtifactBody, ContentKind, GameType};
use homework_pipeline::models::document::ProcessingStatus;
use homework_pipeline::models::extraction::ExtractionMethod;
use homework_pipeline::workflow::{ProcessingPipeline, Upload};
use homework_pipeline::Config;

use ProcessingStatus::{Completed, Error, Pending, Processing};

fn pipeline(
    store: Arc<RecordingStore>,
    llm: Option<Arc<dyn ReasoningBackend>>,
    ocr: Option<Arc<dyn VisionBackend>>,
) -> ProcessingPipeline {
    ProcessingPipeline::new(&Config::default(), store, llm, ocr)
}

fn profile_json() -> String {
    json!({
        "learning_objectives": [
            {"objective": "Solve linear equations", "alignment": "8.EE.7", "importance": "critical"}
        ],
        "key_concepts": ["variables", "inverse operations"],
        "estimated_difficulty": 0.4,
        "knowledge_gaps": [],
        "recommended_interventions": [{"type": "quiz", "focus": "equations", "rationale": "practice"}],
        "topics": ["linear equations"],
        "content_type": "practice_problems"
    })
    .to_string()
}

#[tokio::test]
async fn successful_run_moves_pending_processing_completed() {
    let store = Arc::new(RecordingStore::default());
    let llm = Arc::new(ScriptedReasoning::new(vec![Ok(profile_json())]));
    let pipeline = pipeline(
        store.clone(),
        reasoning(llm.clone()),
        vision(ScriptedVision::text("Solve: 2x + 3 = 11", 0.92)),
    );

    let document = assert_ok!(pipeline.submit(&upload(Uuid::new_v4(), "mathematics")).await);

    assert_eq!(store.statuses(), vec![Pending, Processing, Completed]);
    assert_eq!(document.processing_status, Completed);
    assert_eq!(document.raw_text(), "Solve: 2x + 3 = 11");

    let ocr = document.ocr_data.as_ref().unwrap();
    assert_eq!(ocr.method, ExtractionMethod::GoogleVision);
    assert_eq!(ocr.detected_languages, vec!["english", "mathematics"]);
    assert!(document.processing_quality.as_ref().unwrap().validated);
    assert_eq!(document.structured_content.as_ref().unwrap().subject, "mathematics");

    let profile = document.analysis_results.as_ref().unwrap();
    assert_eq!(profile.topics, vec!["linear equations"]);
    assert_eq!(llm.calls(), 1);

    let status = assert_ok!(pipeline.status(document.id).await);
    assert_eq!(status.progress_percentage, 100);
    assert_eq!(status.estimated_time_seconds, 0);
    assert_eq!(status.error_message, None);
}

#[tokio::test]
async fn vision_failure_still_completes_with_fallback_ocr() {
    let store = Arc::new(RecordingStore::default());
    let pipeline = pipeline(store.clone(), None, vision(ScriptedVision::rate_limited()));

    let document = assert_ok!(pipeline.submit(&upload(Uuid::new_v4(), "english")).await);

    assert_eq!(store.statuses(), vec![Pending, Processing, Completed]);
    let ocr = document.ocr_data.as_ref().unwrap();
    assert_eq!(ocr.method, ExtractionMethod::Fallback);
    assert_eq!(ocr.confidence, 0.5);
    assert!(!document.processing_quality.as_ref().unwrap().warnings.is_empty());

    let stored = assert_ok!(store.get_document(document.id).await);
    let wire = serde_json::to_value(&stored).unwrap();
    assert_eq!(wire["ocr_data"]["extraction_method"], "fallback");
    assert_eq!(wire["ocr_data"]["confidence_score"], 0.5);
    assert!(wire["ocr_data"]["raw_text"].is_string());
    assert!(wire["ocr_data"]["language_hints"].is_array());
    assert!(wire["ocr_data"].get("processing_quality").is_none());

    let profile = document.analysis_results.as_ref().unwrap();
    assert!(!profile.learning_objectives.is_empty());
    assert!((0.0..=1.0).contains(&profile.estimated_difficulty));
}

#[tokio::test]
async fn unexpected_failure_moves_to_error_with_message() {
    let store = Arc::new(RecordingStore::default());
    let pipeline = pipeline(
        store.clone(),
        None,
        vision(ScriptedVision::internal("decoder state corrupted")),
    );

    let document = assert_ok!(pipeline.submit(&upload(Uuid::new_v4(), "hebrew")).await);

    assert_eq!(store.statuses(), vec![Pending, Processing, Error]);
    assert_eq!(document.processing_status, Error);
    assert!(document.ocr_data.is_none());
    assert!(document
        .error_message
        .as_deref()
        .unwrap()
        .contains("decoder state corrupted"));

    let status = assert_ok!(pipeline.status(document.id).await);
    assert_eq!(status.progress_percentage, 0);
    assert!(status.error_message.is_some());
}

#[tokio::test]
async fn malformed_analysis_falls_back_without_error_state() {
    let store = Arc::new(RecordingStore::default());
    let llm = Arc::new(ScriptedReasoning::new(vec![Ok("not json at all".to_string())]));
    let pipeline = pipeline(store.clone(), reasoning(llm), None);

    let document = assert_ok!(pipeline.submit(&upload(Uuid::new_v4(), "math")).await);

    assert_eq!(store.statuses(), vec![Pending, Processing, Completed]);
    let profile = document.analysis_results.unwrap();
    assert_eq!(profile.estimated_difficulty, 0.6);
    assert_eq!(profile.topics, vec!["mathematics", "general practice"]);
}

#[tokio::test]
async fn invalid_uploads_create_no_records() {
    let store = Arc::new(RecordingStore::default());
    let pipeline = pipeline(store.clone(), None, None);
    let user_id = Uuid::new_v4();

    let empty = Upload {
        bytes: Vec::new(),
        ..upload(user_id, "english")
    };
    let pdf = Upload {
        content_type: "application/pdf".to_string(),
        ..upload(user_id, "english")
    };
    let huge = Upload {
        bytes: vec![0u8; Config::default().max_upload_size + 1],
        ..upload(user_id, "english")
    };
    let history = upload(user_id, "history");

    assert!(matches!(
        assert_err!(pipeline.upload(&empty).await),
        AppError::Validation(ValidationError::EmptyUpload)
    ));
    assert!(matches!(
        assert_err!(pipeline.upload(&pdf).await),
        AppError::Validation(ValidationError::NotAnImage { .. })
    ));
    assert!(matches!(
        assert_err!(pipeline.upload(&huge).await),
        AppError::Validation(ValidationError::UploadTooLarge { .. })
    ));
    assert!(matches!(
        assert_err!(pipeline.upload(&history).await),
        AppError::Validation(ValidationError::UnsupportedSubject { .. })
    ));

    assert!(store.list_documents(user_id).await.is_empty());
    assert!(store.statuses().is_empty());
}

#[tokio::test]
async fn generation_requires_completed_document() {
    let store = Arc::new(RecordingStore::default());
    let pipeline = pipeline(store.clone(), None, None);

    let document = assert_ok!(pipeline.upload(&upload(Uuid::new_v4(), "english")).await);
    let status = assert_ok!(pipeline.status(document.id).await);
    assert_eq!(status.status, Pending);
    assert_eq!(status.estimated_time_seconds, 10);

    let err = assert_err!(pipeline.generate_quiz(document.id, "medium").await);
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::DocumentNotReady { .. })
    ));

    let err = assert_err!(pipeline.generate_game(document.id, "chess").await);
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::UnsupportedGameType { .. })
    ));
}

#[tokio::test]
async fn fallback_generation_attaches_artifacts_to_document() {
    let store = Arc::new(RecordingStore::default());
    let pipeline = pipeline(store.clone(), None, None);
    let document = assert_ok!(pipeline.submit(&upload(Uuid::new_v4(), "mathematics")).await);

    let quiz = assert_ok!(pipeline.generate_quiz(document.id, "easy").await);
    let game = assert_ok!(pipeline.generate_game(document.id, "fill_blank").await);
    let review = assert_ok!(pipeline.generate_review(document.id, &[]).await);

    match &quiz.body {
        ArtifactBody::Quiz(spec) => assert!((5..=8).contains(&spec.questions.len())),
        other => panic!("expected quiz, got {:?}", other.kind()),
    }
    match &game.body {
        ArtifactBody::Game(spec) => assert_eq!(spec.game_type, GameType::FillBlank),
        other => panic!("expected game, got {:?}", other.kind()),
    }
    assert_eq!(review.kind(), ContentKind::Review);
    assert_eq!(
        review.metadata.topics,
        vec!["mathematics", "general practice"]
    );
    assert_eq!(review.description, "Comprehensive study guide for review");

    let refs = assert_ok!(store.get_document(document.id).await).generated_content;
    assert_eq!(refs.quizzes, vec![quiz.id]);
    assert_eq!(refs.games, vec![game.id]);
    assert_eq!(refs.review_materials, vec![review.id]);

    let artifacts = assert_ok!(pipeline.list_artifacts(document.id).await);
    assert_eq!(artifacts.len(), 3);

    let wire = serde_json::to_value(&quiz).unwrap();
    assert_eq!(wire["content_type"], "quiz");
    assert!(wire["content_json"]["questions"].is_array());
    assert_eq!(wire["views"], 0);
}

#[tokio::test]
async fn requested_review_topics_override_profile() {
    let store = Arc::new(RecordingStore::default());
    let pipeline = pipeline(store, None, None);
    let document = assert_ok!(pipeline.submit(&upload(Uuid::new_v4(), "english")).await);

    let topics = vec!["past tense".to_string()];
    let review = assert_ok!(pipeline.generate_review(document.id, &topics).await);

    assert_eq!(review.metadata.topics, topics);
    match review.body {
        ArtifactBody::Review(spec) => assert_eq!(spec.sections[0].topic, "past tense"),
        other => panic!("expected review, got {:?}", other.kind()),
    }
}

#[tokio::test]
async fn opening_an_artifact_counts_a_view() {
    let store = Arc::new(RecordingStore::default());
    let pipeline = pipeline(store, None, None);
    let document = assert_ok!(pipeline.submit(&upload(Uuid::new_v4(), "english")).await);
    let game = assert_ok!(pipeline.generate_game(document.id, "auto").await);

    assert_ok!(pipeline.open_artifact(game.id).await);
    let opened = assert_ok!(pipeline.open_artifact(game.id).await);
    assert_eq!(opened.engagement.views, 2);
    assert!(pipeline.open_artifact(Uuid::new_v4()).await.is_err());
}

#[tokio::test]
async fn undecodable_image_is_sent_as_is() {
    let store = Arc::new(RecordingStore::default());
    let ocr = Arc::new(ScriptedVision::text("קרא את הטקסט", 0.8));
    let pipeline = pipeline(store.clone(), None, Some(ocr.clone() as Arc<dyn VisionBackend>));
    let broken = Upload {
        bytes: b"\x89PNG truncated".to_vec(),
        ..upload(Uuid::new_v4(), "hebrew")
    };

    let document = assert_ok!(pipeline.submit(&broken).await);
    assert_eq!(document.processing_status, Completed);
    assert_eq!(
        document.ocr_data.unwrap().detected_languages,
        vec!["hebrew"]
    );
    assert_eq!(ocr.payloads(), vec![broken.bytes.clone()]);
}

#[tokio::test]
async fn decodable_image_is_reencoded_before_detection() {
    let store = Arc::new(RecordingStore::default());
    let ocr = Arc::new(ScriptedVision::text("Read the passage", 0.9));
    let pipeline = pipeline(store, None, Some(ocr.clone() as Arc<dyn VisionBackend>));
    let png = upload(Uuid::new_v4(), "english");

    assert_ok!(pipeline.submit(&png).await);

    let payloads = ocr.payloads();
    assert_eq!(payloads.len(), 1);
    assert_ne!(payloads[0], png.bytes);
    assert_eq!(
        image::guess_format(&payloads[0]).unwrap(),
        image::ImageFormat::Jpeg
    );
}
