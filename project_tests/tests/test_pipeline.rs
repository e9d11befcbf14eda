//! End-to-end runs of `run_pipeline` against scripted collaborators.

use lib_common::core::{run_pipeline, Lookup, PipelineError, PipelineSettings, ResolverConfig, ResolverError, SinkError};
use project_tests::{entity_document, expected_message, write_input, MockResolver, MockSink};

fn resolver_config() -> ResolverConfig {
    ResolverConfig::new("http://resolver.test/")
}

#[tokio::test]
async fn test_blank_lines_are_skipped_and_order_is_kept() {
    let (_dir, input) = write_input(&["CUSTOMERS,1001", "", "42"]);
    let (resolver, resolver_probe) = MockResolver::new();
    let resolver = resolver
        .with_record("CUSTOMERS", "1001", Ok(Lookup::Found(entity_document(1, "CUSTOMERS", "1001"))))
        .with_entity(42, Ok(Lookup::Found(entity_document(42, "WATCHLIST", "W-9"))));
    let (sink, sink_probe) = MockSink::new();

    let summary = run_pipeline(&input, resolver, &resolver_config(), sink, &PipelineSettings::default())
        .await
        .unwrap();

    assert_eq!(summary.lines_read, 3);
    assert_eq!(summary.published, 2);
    assert_eq!(summary.not_found, 0);
    assert_eq!(
        sink_probe.published(),
        vec![expected_message(1, "CUSTOMERS", "1001"), expected_message(42, "WATCHLIST", "W-9")]
    );
    assert_eq!(resolver_probe.calls(), vec!["record:CUSTOMERS/1001", "entity:42"]);
    assert_eq!(resolver_probe.inits(), 1);
    assert_eq!(resolver_probe.cleanups(), 1);
    assert_eq!(sink_probe.closes(), 1);
}

#[tokio::test]
async fn test_quoted_record_fields_are_unquoted() {
    let (_dir, input) = write_input(&["\"CUSTOMERS\", \"1001\",extra"]);
    let (resolver, resolver_probe) = MockResolver::new();
    let resolver =
        resolver.with_record("CUSTOMERS", "1001", Ok(Lookup::Found(entity_document(5, "CUSTOMERS", "1001"))));
    let (sink, sink_probe) = MockSink::new();

    run_pipeline(&input, resolver, &resolver_config(), sink, &PipelineSettings::default())
        .await
        .unwrap();

    assert_eq!(resolver_probe.calls(), vec!["record:CUSTOMERS/1001"]);
    assert_eq!(sink_probe.published(), vec![expected_message(5, "CUSTOMERS", "1001")]);
}

#[tokio::test]
async fn test_malformed_line_aborts_the_run() {
    let (_dir, input) = write_input(&["7", "abc", "8"]);
    let (resolver, resolver_probe) = MockResolver::new();
    let resolver = resolver.with_entity(7, Ok(Lookup::Found(entity_document(7, "CUSTOMERS", "7"))));
    let (sink, sink_probe) = MockSink::new();

    let err = run_pipeline(&input, resolver, &resolver_config(), sink, &PipelineSettings::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Parse { line_number: 2, .. }), "{:?}", err);
    // Line 3 is never looked at.
    assert_eq!(resolver_probe.calls(), vec!["entity:7"]);
    // The message queued before the bad line still went out.
    assert_eq!(sink_probe.published(), vec![expected_message(7, "CUSTOMERS", "7")]);
    assert_eq!(resolver_probe.cleanups(), 1);
    assert_eq!(sink_probe.closes(), 1);
}

#[tokio::test]
async fn test_not_found_record_publishes_nothing() {
    let (_dir, input) = write_input(&["CUSTOMERS,404"]);
    let (resolver, _) = MockResolver::new();
    let resolver = resolver.with_record(
        "CUSTOMERS",
        "404",
        Ok(Lookup::NotFound("Unknown record: dsrc[CUSTOMERS], record[404]".into())),
    );
    let (sink, sink_probe) = MockSink::new();

    let summary = run_pipeline(&input, resolver, &resolver_config(), sink, &PipelineSettings::default())
        .await
        .unwrap();

    assert_eq!(summary.published, 0);
    assert_eq!(summary.not_found, 1);
    assert!(sink_probe.published().is_empty());
}

#[tokio::test]
async fn test_not_found_entity_publishes_degraded_message() {
    let (_dir, input) = write_input(&["1234"]);
    let (resolver, _) = MockResolver::new();
    let (sink, sink_probe) = MockSink::new();

    let summary = run_pipeline(&input, resolver, &resolver_config(), sink, &PipelineSettings::default())
        .await
        .unwrap();

    assert_eq!(summary.not_found, 1);
    assert_eq!(
        sink_probe.published(),
        vec![r#"{"DATA_SOURCE":"","RECORD_ID":"","AFFECTED_ENTITIES":[{"ENTITY_ID":1234,"LENS_CODE":""}]}"#]
    );
}

#[tokio::test]
async fn test_resolver_failure_is_fatal() {
    let (_dir, input) = write_input(&["CUSTOMERS,1", "CUSTOMERS,2"]);
    let (resolver, resolver_probe) = MockResolver::new();
    let resolver = resolver.with_record(
        "CUSTOMERS",
        "1",
        Err(ResolverError::Rejected { status: 500, body: "engine down".into() }),
    );
    let (sink, sink_probe) = MockSink::new();

    let err = run_pipeline(&input, resolver, &resolver_config(), sink, &PipelineSettings::default())
        .await
        .unwrap_err();

    match err {
        PipelineError::Resolution { line_number, reference, reason } => {
            assert_eq!(line_number, 1);
            assert!(reference.contains("CUSTOMERS"));
            assert!(reason.contains("engine down"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(resolver_probe.calls().len(), 1);
    assert_eq!(resolver_probe.cleanups(), 1);
    assert_eq!(sink_probe.closes(), 1);
}

#[tokio::test]
async fn test_malformed_document_is_fatal() {
    let (_dir, input) = write_input(&["9"]);
    let (resolver, _) = MockResolver::new();
    let resolver = resolver.with_entity(9, Ok(Lookup::Found("<html>gateway timeout</html>".into())));
    let (sink, sink_probe) = MockSink::new();

    let err = run_pipeline(&input, resolver, &resolver_config(), sink, &PipelineSettings::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Resolution { line_number: 1, .. }));
    assert!(sink_probe.published().is_empty());
}

#[tokio::test]
async fn test_publish_failure_stops_the_producer() {
    let lines: Vec<String> = (1..=20).map(|id| id.to_string()).collect();
    let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let (_dir, input) = write_input(&line_refs);
    let (resolver, resolver_probe) = MockResolver::new();
    let (sink, sink_probe) = MockSink::new();
    let settings = PipelineSettings { channel_capacity: 2, ..PipelineSettings::default() };

    let err = run_pipeline(&input, resolver, &resolver_config(), sink.failing_on(1), &settings)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Publish(SinkError::Publish(_))), "{:?}", err);
    assert_eq!(sink_probe.published_count(), 1);
    // The producer noticed the relay was gone well before the end of the file.
    assert!(resolver_probe.calls().len() < 20);
    assert_eq!(resolver_probe.cleanups(), 1);
    assert_eq!(sink_probe.closes(), 1);
}

#[tokio::test]
async fn test_publish_failure_stops_lines_that_enqueue_nothing() {
    let mut lines = vec!["1".to_string(), "2".to_string()];
    lines.extend((0..500).map(|n| format!("CUSTOMERS,{}", n)));
    let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let (_dir, input) = write_input(&line_refs);
    let (resolver, resolver_probe) = MockResolver::new();
    let (sink, sink_probe) = MockSink::new();
    let settings = PipelineSettings { channel_capacity: 1, ..PipelineSettings::default() };

    let err = run_pipeline(&input, resolver, &resolver_config(), sink.failing_on(0), &settings)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Publish(SinkError::Publish(_))), "{:?}", err);
    assert!(sink_probe.published().is_empty());
    // Unknown records publish nothing, so only the closed channel can stop them.
    let calls = resolver_probe.calls();
    assert!(calls.len() <= 3, "resolver kept running: {} calls", calls.len());
    assert_eq!(&calls[..2], ["entity:1", "entity:2"]);
    assert_eq!(resolver_probe.cleanups(), 1);
    assert_eq!(sink_probe.closes(), 1);
}

#[tokio::test]
async fn test_missing_input_file_is_a_setup_error() {
    let dir = tempfile::tempdir().unwrap();
    let (resolver, resolver_probe) = MockResolver::new();
    let (sink, sink_probe) = MockSink::new();

    let err = run_pipeline(
        &dir.path().join("absent.csv"),
        resolver,
        &resolver_config(),
        sink,
        &PipelineSettings::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PipelineError::Setup(ref reason) if reason.starts_with("File not found")));
    assert_eq!(resolver_probe.inits(), 0);
    assert_eq!(sink_probe.closes(), 1);
}

#[tokio::test]
async fn test_directory_input_is_a_setup_error() {
    let dir = tempfile::tempdir().unwrap();
    let (resolver, _) = MockResolver::new();
    let (sink, _) = MockSink::new();

    let err = run_pipeline(dir.path(), resolver, &resolver_config(), sink, &PipelineSettings::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Setup(ref reason) if reason.starts_with("Not a regular file")));
}

#[tokio::test]
async fn test_resolver_init_failure_cleans_up() {
    let (_dir, input) = write_input(&["1"]);
    let (resolver, resolver_probe) = MockResolver::new();
    let (sink, sink_probe) = MockSink::new();

    let err = run_pipeline(&input, resolver.failing_init(), &resolver_config(), sink, &PipelineSettings::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Setup(_)));
    assert!(resolver_probe.calls().is_empty());
    assert_eq!(resolver_probe.cleanups(), 1);
    assert_eq!(sink_probe.closes(), 1);
    assert!(sink_probe.published().is_empty());
}

#[tokio::test]
async fn test_empty_file_publishes_nothing() {
    let (_dir, input) = write_input(&[]);
    let (resolver, resolver_probe) = MockResolver::new();
    let (sink, sink_probe) = MockSink::new();

    let summary = run_pipeline(&input, resolver, &resolver_config(), sink, &PipelineSettings::default())
        .await
        .unwrap();

    assert_eq!(summary.lines_read, 0);
    assert_eq!(summary.published, 0);
    assert_eq!(resolver_probe.cleanups(), 1);
    assert_eq!(sink_probe.closes(), 1);
}
