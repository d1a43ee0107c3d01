//! Building an orchestrator from config.

use pretty_assertions::assert_eq;
use ragloop::config::RagloopConfig;
use ragloop::protocol::WebSearch;
use ragloop::{QueryOutcome, QueryOverrides, build_agent_from_config, init_logging};
use ragloop_test_utils::{StubIndex, StubSynthesizer, StubWebSearch, chunk, web_result};
use std::sync::Arc;
use tempfile::tempdir;

fn index() -> Arc<StubIndex> {
    Arc::new(StubIndex::new(vec![
        chunk("Ragloop bounds history.", "readme#1", 0.82),
        chunk("Noise.", "readme#7", 0.4),
    ]))
}

#[tokio::test]
async fn builds_agent_with_config_settings() {
    init_logging();
    let config = RagloopConfig::load_from_str(
        r#"{ agent: { similarity_threshold: 0.8, max_turns: 4, web_search_enabled: true } }"#,
    )
    .expect("config");
    let web = Arc::new(StubWebSearch::new(vec![web_result(
        "Docs",
        "https://docs",
        "More detail.",
    )]));
    let provider: Arc<dyn WebSearch> = web.clone();

    let agent = build_agent_from_config(
        &config,
        index(),
        Arc::new(StubSynthesizer::new("It keeps a window.")),
        Some(provider),
    )
    .await
    .expect("agent");

    assert_eq!(agent.config().max_turns, 4);
    let result = agent
        .query("What does ragloop do?", QueryOverrides::default())
        .await
        .expect("query");
    assert_eq!(result.metadata.outcome, QueryOutcome::Answered);
    assert_eq!(result.metadata.source_count, 2);
    assert_eq!(result.metadata.web_source_count, 1);
    assert_eq!(web.calls(), 1);
}

#[tokio::test]
async fn web_enabled_without_provider_fails_queries() {
    let config =
        RagloopConfig::load_from_str("{ agent: { web_search_enabled: true } }").expect("config");
    let agent = build_agent_from_config(
        &config,
        index(),
        Arc::new(StubSynthesizer::new("unused")),
        None,
    )
    .await
    .expect("agent");
    let err = agent
        .query("q", QueryOverrides::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ragloop::QueryError::Configuration(_)));
}

#[tokio::test]
async fn persistent_history_survives_rebuild() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("history");
    let contents = format!(
        r#"{{ history: {{ persist: true, path: "{}", name: "demo" }} }}"#,
        path.display().to_string().replace('\\', "\\\\")
    );
    let config = RagloopConfig::load_from_str(&contents).expect("config");

    let first = build_agent_from_config(
        &config,
        index(),
        Arc::new(StubSynthesizer::new("A1")),
        None,
    )
    .await
    .expect("agent");
    first
        .query("Q1", QueryOverrides::default())
        .await
        .expect("query");
    assert!(path.join("demo.jsonl").exists());

    let second = build_agent_from_config(
        &config,
        index(),
        Arc::new(StubSynthesizer::new("A2")),
        None,
    )
    .await
    .expect("agent");
    let history: Vec<String> = second
        .get_history(None)
        .iter()
        .map(|turn| turn.content().to_string())
        .collect();
    assert_eq!(history, vec!["Q1", "A1"]);
}

#[tokio::test]
async fn default_capture_policy_redacts_secrets() {
    let config = RagloopConfig::default();
    let agent = build_agent_from_config(
        &config,
        index(),
        Arc::new(StubSynthesizer::new("Stored.")),
        None,
    )
    .await
    .expect("agent");
    let secret = "Zx9Qw3Er7Ty1Ui5Op2As8Df4Gh6Jk0L";
    agent
        .query(&format!("remember {secret}"), QueryOverrides::default())
        .await
        .expect("query");
    let stored = agent.get_history(None)[0].content().to_string();
    assert_eq!(stored, "remember [REDACTED]");
}
