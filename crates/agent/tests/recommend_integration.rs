//! End-to-end recommendation turns over an in-memory scheme index

use async_trait::async_trait;
use std::io::Write;
use std::sync::Arc;

use scheme_saathi_agent::{ContextAccumulator, Recommender, RecommenderConfig};
use scheme_saathi_config::{RuntimeEnvironment, Settings};
use scheme_saathi_core::{
    Benefits, ChatMessage, EligibilityCriteria, IndexHit, SchemeRecord, SlotKey, TextEmbedder, VectorIndex,
};
use scheme_saathi_rag::{HashEmbedder, MemoryIndex, RetrieverConfig, SchemeCorpus, SchemeIndex};

fn scheme(id: &str, name: &str, state: &str, occupation: &str, benefit_type: &str) -> SchemeRecord {
    SchemeRecord {
        scheme_id: id.to_string(),
        scheme_name: name.to_string(),
        brief_description: format!("{} for eligible {} applicants", name, occupation.to_lowercase()),
        eligibility_criteria: Some(EligibilityCriteria {
            state: state.to_string(),
            occupation: occupation.to_string(),
            ..Default::default()
        }),
        benefits: Some(Benefits {
            benefit_type: benefit_type.to_string(),
            ..Default::default()
        }),
        data_quality_score: 80.0,
        ..Default::default()
    }
}

fn retriever_config() -> RetrieverConfig {
    // Hash embeddings give low absolute similarities
    RetrieverConfig {
        similarity_threshold: 0.0,
        ..Default::default()
    }
}

async fn recommender_for(records: Vec<SchemeRecord>) -> Recommender {
    let corpus = SchemeCorpus::from_records(records);
    let embedder = HashEmbedder::new(256);
    let index = MemoryIndex::build(&corpus, &embedder).await.unwrap();
    let scheme_index = SchemeIndex::from_parts(Arc::new(corpus), Arc::new(index), Arc::new(embedder));

    Recommender::new(
        ContextAccumulator::default(),
        Arc::new(scheme_index),
        retriever_config(),
        RecommenderConfig::default(),
    )
}

fn sample_schemes() -> Vec<SchemeRecord> {
    vec![
        scheme("bihar-krishi-loan", "Bihar Krishi Loan Yojana", "Bihar", "Farmer", "Subsidized Loan"),
        scheme(
            "national-scholarship",
            "National Merit Scholarship for Students",
            "All India",
            "Student",
            "Scholarship",
        ),
    ]
}

#[tokio::test]
async fn test_bihar_farmer_gets_only_farm_loan() {
    let recommender = recommender_for(sample_schemes()).await;
    let history = vec![
        ChatMessage::user("I am a farmer from Bihar"),
        ChatMessage::assistant("What kind of help are you looking for?"),
        ChatMessage::user("I need a loan"),
        ChatMessage::assistant("May I know your gender, age or caste category?"),
    ];

    let rec = recommender.recommend(&history, "I am male", None).await;

    assert!(rec.ready);
    assert_eq!(rec.context.get(SlotKey::Occupation), Some("farmer"));
    assert_eq!(rec.context.get(SlotKey::State), Some("Bihar"));
    assert_eq!(rec.context.help_type(), Some("loan"));
    assert_eq!(rec.context.get(SlotKey::Gender), Some("male"));

    let ids: Vec<&str> = rec.candidates.iter().map(|c| c.scheme_id()).collect();
    assert_eq!(ids, vec!["bihar-krishi-loan"]);
}

#[tokio::test]
async fn test_single_message_profile_is_ready() {
    let recommender = recommender_for(sample_schemes()).await;
    let mut state = recommender.new_conversation();

    let rec = recommender
        .recommend_turn(
            &mut state,
            "I'm a female SC student from Karnataka looking for scholarships",
            None,
        )
        .await;

    assert!(rec.ready);
    assert_eq!(rec.missing_field, None);
    assert_eq!(rec.context.get(SlotKey::Occupation), Some("student"));
    assert_eq!(rec.context.get(SlotKey::State), Some("Karnataka"));
    assert_eq!(rec.context.get(SlotKey::Gender), Some("female"));
    assert_eq!(rec.context.get(SlotKey::CasteCategory), Some("SC"));
    assert_eq!(rec.context.help_type(), Some("scholarship"));

    let ids: Vec<&str> = rec.candidates.iter().map(|c| c.scheme_id()).collect();
    assert_eq!(ids, vec!["national-scholarship"]);
}

#[tokio::test]
async fn test_incremental_turns_ask_in_order() {
    let recommender = recommender_for(sample_schemes()).await;
    let mut state = recommender.new_conversation();

    let rec = recommender.recommend_turn(&mut state, "I am a student", None).await;
    assert!(!rec.ready);
    assert_eq!(rec.missing_field, Some(SlotKey::State));
    assert!(rec.candidates.is_empty());

    let rec = recommender.recommend_turn(&mut state, "I live in Karnataka", None).await;
    assert_eq!(rec.missing_field, Some(SlotKey::HelpType));

    let rec = recommender.recommend_turn(&mut state, "I want a scholarship", None).await;
    assert_eq!(rec.missing_field, Some(SlotKey::Gender));

    let rec = recommender.recommend_turn(&mut state, "I am a girl", None).await;
    assert!(rec.ready);
    assert_eq!(rec.completeness, 3);
    assert_eq!(state.len(), 4);
}

#[tokio::test]
async fn test_empty_corpus_is_ready_without_candidates() {
    let recommender = recommender_for(Vec::new()).await;
    let rec = recommender
        .recommend(
            &[],
            "I'm a female SC student from Karnataka looking for scholarships",
            None,
        )
        .await;

    assert!(rec.ready);
    assert!(rec.candidates.is_empty());
    assert!(recommender.health().await.degraded);
}

#[tokio::test]
async fn test_top_k_limits_results() {
    let records: Vec<SchemeRecord> = (0..10)
        .map(|i| {
            scheme(
                &format!("scholarship-{}", i),
                &format!("Scholarship Scheme {}", i),
                "All India",
                "Student",
                "Scholarship",
            )
        })
        .collect();
    let recommender = recommender_for(records).await;

    let rec = recommender
        .recommend(
            &[],
            "I'm a female SC student from Karnataka looking for scholarships",
            Some(3),
        )
        .await;

    assert_eq!(rec.candidates.len(), 3);
    assert!(rec
        .candidates
        .windows(2)
        .all(|w| w[0].match_score >= w[1].match_score));
    assert_eq!(rec.top(2).candidates.len(), 2);
}

/// Index that always fails
struct BrokenIndex;

#[async_trait]
impl VectorIndex for BrokenIndex {
    async fn query(&self, _embedding: &[f32], _n: usize) -> scheme_saathi_core::Result<Vec<IndexHit>> {
        Err(scheme_saathi_core::Error::Index("connection refused".to_string()))
    }

    async fn len(&self) -> scheme_saathi_core::Result<usize> {
        Ok(2)
    }

    fn name(&self) -> &str {
        "broken"
    }
}

#[tokio::test]
async fn test_backend_failure_returns_no_candidates() {
    let corpus = SchemeCorpus::from_records(sample_schemes());
    let embedder: Arc<dyn TextEmbedder> = Arc::new(HashEmbedder::new(64));
    let scheme_index = SchemeIndex::from_parts(Arc::new(corpus), Arc::new(BrokenIndex), embedder);
    let recommender = Recommender::new(
        ContextAccumulator::default(),
        Arc::new(scheme_index),
        retriever_config(),
        RecommenderConfig::default(),
    );

    let rec = recommender
        .recommend(&[], "I'm a female SC student from Karnataka looking for scholarships", None)
        .await;
    assert!(rec.ready);
    assert!(rec.candidates.is_empty());
}

#[tokio::test]
async fn test_from_settings_loads_corpus_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let records = serde_json::to_string(&sample_schemes()).unwrap();
    file.write_all(records.as_bytes()).unwrap();

    let mut settings = Settings {
        environment: RuntimeEnvironment::Production,
        ..Default::default()
    };
    settings.corpus.schemes_path = file.path().to_path_buf();
    settings.embedding.dim = 128;
    settings.rag.similarity_threshold = 0.0;

    let recommender = Recommender::from_settings(&settings).await.unwrap();
    let health = recommender.health().await;
    assert_eq!(health.corpus_size, 2);
    assert!(!health.degraded);

    let rec = recommender
        .recommend(&[], "I'm a female SC student from Karnataka looking for scholarships", None)
        .await;
    let ids: Vec<&str> = rec.candidates.iter().map(|c| c.scheme_id()).collect();
    assert_eq!(ids, vec!["national-scholarship"]);
}
