//! Tests for layered configuration loading.

use super::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Project layout with a `.git` marker and a nested working directory.
fn project_layout(temp: &TempDir) -> (PathBuf, PathBuf) {
    let project_root = temp.path().join("project");
    fs::create_dir_all(project_root.join(".git")).expect("git");
    let cwd = project_root.join("subdir");
    fs::create_dir_all(&cwd).expect("cwd");
    (project_root, cwd)
}

fn isolated_options(cwd: &Path) -> LayeredConfigOptions {
    let mut options = LayeredConfigOptions::new(cwd);
    options.system_config_path = None;
    options.user_config_path = None;
    options
}

#[test]
fn parse_minimal_config() {
    let config = RagloopConfig::load_from_str("{}").expect("config");
    assert_eq!(config.agent.top_k, 5);
    assert_eq!(config.context.budget_chars, 12_000);
    assert_eq!(config.history.capture.detect_secrets, true);
}

#[test]
fn parse_json5_with_comments() {
    let json5 = r#"{
        // retrieval knobs
        agent: { top_k: 3, similarity_threshold: 0.5, web_search_enabled: true },
        context: { instructions: "Answer briefly.", },
    }"#;
    let config = RagloopConfig::load_from_str(json5).expect("config");
    assert_eq!(config.agent.top_k, 3);
    assert_eq!(config.agent.similarity_threshold, 0.5);
    assert_eq!(config.agent.web_search_enabled, true);
    assert_eq!(
        config.context.instructions.as_deref(),
        Some("Answer briefly.")
    );
}

#[test]
fn rejects_unknown_top_level_key() {
    let err = RagloopConfig::load_from_str("{ unexpected: true }").unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("unknown key"));
}

#[test]
fn rejects_wrong_field_type() {
    let err = RagloopConfig::load_from_str(r#"{ agent: { top_k: "five" } }"#).unwrap_err();
    assert!(format!("{err}").contains("agent.top_k"));

    let err = RagloopConfig::load_from_str("{ agent: { max_turns: -1 } }").unwrap_err();
    assert!(format!("{err}").contains("agent.max_turns"));
}

#[test]
fn rejects_out_of_range_values() {
    let err = RagloopConfig::load_from_str("{ agent: { similarity_threshold: 2.0 } }").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidField { ref path, .. } if path == "agent.similarity_threshold"));

    let err = RagloopConfig::load_from_str("{ agent: { top_k: 0 } }").unwrap_err();
    assert!(format!("{err}").contains("agent.top_k"));
}

#[test]
fn load_from_path_reads_file() {
    let temp = TempDir::new().expect("tmp");
    let path = temp.path().join("config.json5");
    write_json5(&path, "{ history: { persist: true, name: \"support\" } }");
    let config = RagloopConfig::load_from_path(&path).expect("config");
    assert_eq!(config.history.persist, true);
    assert_eq!(config.history.name, "support");
}

#[test]
fn layered_config_prefers_repo_over_cwd() {
    let temp = TempDir::new().expect("tmp");
    let (project_root, cwd) = project_layout(&temp);

    let system_config = temp.path().join("system.json5");
    write_json5(&system_config, "{ agent: { top_k: 1, max_turns: 4 } }");
    let user_config = temp.path().join("user.json5");
    write_json5(&user_config, "{ agent: { top_k: 2 } }");
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        "{ agent: { top_k: 3 } }",
    );
    write_json5(&cwd.join(DEFAULT_CONFIG_FILE), "{ agent: { top_k: 4 } }");
    write_json5(
        &project_root
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILE),
        "{ agent: { top_k: 7 } }",
    );

    let mut options = LayeredConfigOptions::new(&cwd);
    options.system_config_path = Some(system_config);
    options.user_config_path = Some(user_config);

    let layered = RagloopConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.agent.top_k, 7);
    assert_eq!(layered.config.agent.max_turns, 4);
    let sources: Vec<ConfigLayerSource> =
        layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::System,
            ConfigLayerSource::User,
            ConfigLayerSource::Project,
            ConfigLayerSource::Cwd,
            ConfigLayerSource::Repo,
        ]
    );
}

#[test]
fn runtime_override_wins() {
    let temp = TempDir::new().expect("tmp");
    let (_project_root, cwd) = project_layout(&temp);

    let system_config = temp.path().join("system.json5");
    write_json5(&system_config, "{ context: { budget_chars: 500 } }");
    let runtime_config = temp.path().join("runtime.json5");
    write_json5(&runtime_config, "{ context: { budget_chars: 900 } }");

    let mut options = isolated_options(&cwd).with_runtime_path(&runtime_config);
    options.system_config_path = Some(system_config);

    let layered = RagloopConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.context.budget_chars, 900);
    assert_eq!(
        layered.layers.last().map(|layer| layer.source),
        Some(ConfigLayerSource::Runtime)
    );
}

#[test]
fn missing_runtime_layer_is_an_error() {
    let temp = TempDir::new().expect("tmp");
    let (_project_root, cwd) = project_layout(&temp);
    let options = isolated_options(&cwd).with_runtime_path(temp.path().join("absent.json5"));
    let err = RagloopConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::Io { ref path, .. } if path.ends_with("absent.json5")));
}

#[test]
fn malformed_layer_is_a_syntax_error_naming_the_layer() {
    let temp = TempDir::new().expect("tmp");
    let (project_root, cwd) = project_layout(&temp);
    write_json5(&project_root.join(DEFAULT_CONFIG_FILE), "{ agent: ");

    let err = RagloopConfig::load_layered_with_options(isolated_options(&cwd)).unwrap_err();
    assert!(matches!(err, ConfigError::Syntax { ref origin, .. } if origin.starts_with("project(")));
}

#[test]
fn layer_sources_display_their_names() {
    assert_eq!(ConfigLayerSource::Repo.to_string(), "repo");
    assert_eq!(
        ConfigLayerSource::Cwd.label(Path::new("/work/ragloop.json5")),
        "cwd(/work/ragloop.json5)"
    );
}

#[test]
fn project_root_equal_to_cwd_loads_file_once() {
    let temp = TempDir::new().expect("tmp");
    let (project_root, _cwd) = project_layout(&temp);
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        "{ agent: { web_max_results: 6 } }",
    );

    let layered =
        RagloopConfig::load_layered_with_options(isolated_options(&project_root)).expect("layered");
    assert_eq!(layered.layers.len(), 1);
    assert_eq!(layered.config.agent.web_max_results, 6);
}

#[test]
fn invalid_layer_names_its_source() {
    let temp = TempDir::new().expect("tmp");
    let (_project_root, cwd) = project_layout(&temp);
    write_json5(&cwd.join(DEFAULT_CONFIG_FILE), "{ history: { bogus: 1 } }");

    let err = RagloopConfig::load_layered_with_options(isolated_options(&cwd)).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("cwd("));
    assert!(msg.contains("history.bogus"));
}

#[test]
fn no_layers_yields_defaults() {
    let temp = TempDir::new().expect("tmp");
    let layered =
        RagloopConfig::load_layered_with_options(isolated_options(temp.path())).expect("layered");
    assert_eq!(layered.layers.len(), 0);
    assert_eq!(layered.config.agent.similarity_threshold, 0.7);
}
