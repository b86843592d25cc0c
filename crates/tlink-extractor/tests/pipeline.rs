//! Pipeline Integration Tests
//!
//! Runs the three annotators over a JSON-serialized clinical note, first in
//! training mode against the gold annotations and then in prediction mode
//! with stand-in classifiers, scoring the predictions against the gold copy.

use serde_json::{json, Value};
use tlink_core::{
    AnnotationType, Document, Feature, Instance, ProcessingMode, Result, SpanIndex, TlinkError,
};
use tlink_extractor::writer::TRAINING_DATA_FILE;
use tlink_extractor::{
    annotate_document, AggregateMetrics, Annotator, ContextWindowExtractor, DocTimeRelAnnotator,
    Evaluator, EventTimeAnnotator, JsonlDataWriter, TimexAnnotator, TimexNormalizer, TimexTable,
};

const TEXT: &str = "She was admitted on 3/4 . Surgery followed yesterday .";

const TOKENS: [(usize, usize); 10] = [
    (0, 3),
    (4, 7),
    (8, 16),
    (17, 19),
    (20, 23),
    (24, 25),
    (26, 33),
    (34, 42),
    (43, 52),
    (53, 54),
];

/// Sentences, tokens and events; ids 0..=13
fn base_annotations(with_doc_time: bool) -> Vec<Value> {
    let mut annotations = vec![
        json!({"kind": "sentence", "begin": 0, "end": 25}),
        json!({"kind": "sentence", "begin": 26, "end": 54}),
    ];
    for (begin, end) in TOKENS {
        annotations.push(json!({"kind": "token", "begin": begin, "end": end}));
    }

    let mut admitted = json!({"kind": {"event": "generic"}, "begin": 8, "end": 16});
    let mut surgery = json!({"kind": {"event": "generic"}, "begin": 26, "end": 33});
    if with_doc_time {
        admitted["doc_time_rel"] = json!("BEFORE");
        surgery["doc_time_rel"] = json!("BEFORE");
    }
    annotations.push(admitted);
    annotations.push(surgery);
    annotations
}

fn gold_document() -> Document {
    let mut annotations = base_annotations(true);
    annotations.push(json!({"kind": "time", "begin": 20, "end": 23}));
    annotations.push(json!({"kind": "time", "begin": 43, "end": 52}));

    serde_json::from_value(json!({
        "id": "note-001",
        "text": TEXT,
        "annotations": annotations,
        "relations": [
            {"arg1": 14, "arg2": 12, "category": "CONTAINS"},
            {"arg1": 13, "arg2": 15, "category": "OVERLAP"}
        ]
    }))
    .unwrap()
}

fn system_document() -> Document {
    serde_json::from_value(json!({
        "id": "note-001",
        "text": TEXT,
        "annotations": base_annotations(false)
    }))
    .unwrap()
}

fn extractor() -> ContextWindowExtractor {
    ContextWindowExtractor::new(TimexNormalizer::new(TimexTable::parse(
        "3/4|<timex_5>\nyesterday|<timex_1>",
    )))
}

fn train(annotator: &dyn Annotator, document: &Document) -> Vec<Instance> {
    let mut instances = Vec::new();
    let updates = annotator
        .process(document, &mut ProcessingMode::Training(&mut instances))
        .unwrap();
    assert!(updates.is_empty());
    instances
}

// =============================================================================
// Training
// =============================================================================

#[test]
fn test_doc_time_training_instances() {
    let instances = train(&DocTimeRelAnnotator::new(extractor()), &gold_document());

    assert_eq!(instances.len(), 2);
    assert!(instances.iter().all(|i| i.outcome == "BEFORE"));
    // time anchors inside the window are literal text, only the anchor is normalized
    assert!(instances[0].features.contains(&Feature::from("3/4")));
}

#[test]
fn test_event_time_training_labels() {
    let instances = train(&EventTimeAnnotator::new(extractor()), &gold_document());

    let outcomes: Vec<&str> = instances.iter().map(|i| i.outcome.as_str()).collect();
    assert_eq!(outcomes, vec!["contains", "overlap-1"]);

    let first: Vec<&str> = instances[0].features.iter().map(|f| f.as_str()).collect();
    assert_eq!(
        first,
        vec!["she", "was", "<e>", "admitted", "</e>", "on", "<t>", "<timex_5>", "</t>", "."]
    );
}

#[test]
fn test_timex_training_labels() {
    let instances = train(&TimexAnnotator::new(), &gold_document());

    let outcomes: Vec<&str> = instances.iter().map(|i| i.outcome.as_str()).collect();
    assert_eq!(outcomes, vec!["O O O O O B-TIME O O", "O O O B-TIME O O"]);
}

#[test]
fn test_training_data_file() {
    let dir = tempfile::tempdir().unwrap();
    let gold = gold_document();

    let mut writer = JsonlDataWriter::create(dir.path()).unwrap();
    EventTimeAnnotator::new(extractor())
        .process(&gold, &mut ProcessingMode::Training(&mut writer))
        .unwrap();
    assert_eq!(writer.written(), 2);
    writer.finish().unwrap();

    let content = std::fs::read_to_string(dir.path().join(TRAINING_DATA_FILE)).unwrap();
    let instances: Vec<Instance> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(instances.len(), 2);
    assert_eq!(instances[1].outcome, "overlap-1");
}

// =============================================================================
// Prediction
// =============================================================================

fn timex_oracle(features: &[Feature]) -> Result<String> {
    let labels: Vec<&str> = features
        .iter()
        .map(|f| match f.as_str() {
            "3/4" | "yesterday" => "B-TIME",
            _ => "O",
        })
        .collect();
    Ok(labels.join(" "))
}

fn event_time_oracle(features: &[Feature]) -> Result<String> {
    if features.contains(&Feature::from("admitted")) {
        Ok("contains".to_string())
    } else {
        Ok("overlap-1".to_string())
    }
}

#[test]
fn test_prediction_pipeline_matches_gold() {
    let gold = gold_document();
    let mut system = system_document();
    let extractor = extractor();

    let added = annotate_document(
        &TimexAnnotator::new(),
        &mut system,
        &mut ProcessingMode::Prediction(&timex_oracle),
    )
    .unwrap();
    assert_eq!(added, 2);

    annotate_document(
        &EventTimeAnnotator::new(extractor.clone()),
        &mut system,
        &mut ProcessingMode::Prediction(&event_time_oracle),
    )
    .unwrap();

    let before = |_: &[Feature]| -> Result<String> { Ok("BEFORE".to_string()) };
    annotate_document(
        &DocTimeRelAnnotator::new(extractor),
        &mut system,
        &mut ProcessingMode::Prediction(&before),
    )
    .unwrap();

    let categories: Vec<&str> = system
        .relations()
        .iter()
        .map(|r| r.category.as_str())
        .collect();
    assert_eq!(categories, vec!["CONTAINS", "OVERLAP"]);
    assert!(system.relations().iter().all(|r| r.confidence == 0.0));
    assert!(system
        .select(AnnotationType::Event)
        .iter()
        .all(|e| e.doc_time_rel.as_deref() == Some("BEFORE")));

    let mut aggregate = AggregateMetrics::default();
    aggregate.add_document(&Evaluator::new(), &gold, &system);

    assert_eq!(aggregate.time_metrics.true_positives, 2);
    assert_eq!(aggregate.relation_metrics.true_positives, 2);
    assert_eq!(aggregate.relation_metrics.false_positives, 0);
}

#[test]
fn test_label_count_mismatch_leaves_document_untouched() {
    let mut system = system_document();
    let short = |_: &[Feature]| -> Result<String> { Ok("O B-TIME O".to_string()) };

    let result = annotate_document(
        &TimexAnnotator::new(),
        &mut system,
        &mut ProcessingMode::Prediction(&short),
    );

    assert!(matches!(
        result,
        Err(TlinkError::LabelCountMismatch {
            expected: 8,
            actual: 3
        })
    ));
    assert!(system.select(AnnotationType::Time).is_empty());
}

#[test]
fn test_missing_timex_resource_degrades_to_oov() {
    let (normalizer, degraded) = TimexNormalizer::from_config(&tlink_core::ExtractorConfig {
        timex_resource: "/nonexistent/timex_idx.txt".into(),
        ..Default::default()
    });
    assert!(degraded);

    let instances = train(
        &EventTimeAnnotator::new(ContextWindowExtractor::new(normalizer)),
        &gold_document(),
    );
    assert!(instances
        .iter()
        .all(|i| i.features.contains(&Feature::from("<timex_797>"))));
}
