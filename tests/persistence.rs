//! Persistence and recovery tests for cerebro.
//!
//! These tests verify that the graphs, the policy table and the feedback log
//! survive a restart, and that damaged files degrade to empty stores.

use cerebro::config::CerebroConfig;
use cerebro::consciousness::ConsciousnessGraph;
use cerebro::coordinator::{ANSWER_ACTION, FeedbackCoordinator, IDENTITY_ATTRIBUTE};
use cerebro::feedback::{Feedback, FeedbackLog};
use cerebro::graph::concept::{ConceptGraph, ConceptStore};
use cerebro::graph::{GraphSnapshot, NodeKind};
use cerebro::language::LexicalLanguageService;
use cerebro::policy::ReinforcementPolicy;

fn persistent_cerebro(dir: &std::path::Path) -> FeedbackCoordinator {
    let mut config = CerebroConfig::with_data_dir(dir);
    config.policy.exploration_rate = 0.0;
    FeedbackCoordinator::open(config, Box::new(LexicalLanguageService::new())).unwrap()
}

#[test]
fn concept_graph_round_trips() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("memory_graph.json");

    // First session: every mutation is written through, no explicit save.
    {
        let mut graph = ConceptGraph::open(&path);
        graph.add_or_reinforce_edge("tigre", "felino", 1.0);
        graph.add_or_reinforce_edge("felino", "carnivoro", 0.75);
        graph.reinforce("tigre", "felino", 0.3).unwrap();
        graph.upsert_node("solitario");
    }

    // Second session: same keys, same weights.
    {
        let graph = ConceptGraph::open(&path);
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 2);
        assert!((graph.weight("tigre", "felino").unwrap() - 1.3).abs() < 1e-9);
        assert!((graph.weight("carnivoro", "felino").unwrap() - 0.75).abs() < 1e-9);
        assert!(graph.contains("solitario"));
    }
}

#[test]
fn snapshot_file_has_node_and_edge_lists() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("memory_graph.json");
    let mut graph = ConceptGraph::open(&path);
    graph.add_or_reinforce_edge("agua", "mar", 2.0);

    let raw = std::fs::read_to_string(&path).unwrap();
    let snapshot: GraphSnapshot = serde_json::from_str(&raw).unwrap();
    assert_eq!(snapshot.nodes.len(), 2);
    assert!(snapshot.nodes.iter().all(|n| n.kind == NodeKind::Concept));
    assert_eq!(snapshot.edges.len(), 1);
    assert_eq!(snapshot.edges[0].weight, 2.0);
}

#[test]
fn corrupt_files_load_empty() {
    let dir = tempfile::TempDir::new().unwrap();
    for name in [
        "memory_graph.json",
        "consciousness_graph.json",
        "rl_memory.json",
        "feedback_log.json",
    ] {
        std::fs::write(dir.path().join(name), "{ not json").unwrap();
    }

    assert_eq!(ConceptGraph::open(dir.path().join("memory_graph.json")).node_count(), 0);
    assert_eq!(
        ConsciousnessGraph::open(dir.path().join("consciousness_graph.json")).node_count(),
        0
    );
    let policy = ReinforcementPolicy::open(Default::default(), dir.path().join("rl_memory.json"));
    assert!(policy.table().is_empty());
    assert!(FeedbackLog::open(dir.path().join("feedback_log.json")).is_empty());

    // The coordinator starts over and overwrites the damaged files.
    let cerebro = persistent_cerebro(dir.path());
    assert_eq!(cerebro.concepts().node_count(), 0);
    assert!(cerebro.consciousness().contains(IDENTITY_ATTRIBUTE));
}

#[test]
fn hand_written_graph_without_kinds_loads() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("memory_graph.json");
    std::fs::write(
        &path,
        r#"{"nodes": [{"id": "perro"}, {"id": "animal"}],
            "links": [{"source": "perro", "target": "animal", "weight": 1.5}]}"#,
    )
    .unwrap();
    let graph = ConceptGraph::open(&path);
    assert_eq!(graph.weight("perro", "animal"), Some(1.5));
    assert_eq!(
        graph.graph().node("perro").map(|n| n.kind),
        Some(NodeKind::Concept)
    );
}

#[test]
fn session_state_survives_restart() {
    let dir = tempfile::TempDir::new().unwrap();

    // First session: teach, ask, give feedback, restrict, exit with a flush.
    {
        let mut cerebro = persistent_cerebro(dir.path());
        cerebro.remember("tigre", "felino", 1.0);
        cerebro.remember("felino", "carnivoro", 1.0);
        cerebro.restrict("armas");
        cerebro.record_identity("proposito", "razonar");
        let interaction = cerebro.handle_query("tigre es carnivoro");
        cerebro.submit_feedback(interaction, Feedback::NotUseful);
        cerebro.flush().unwrap();
    }

    // Second session: everything is back.
    {
        let mut cerebro = persistent_cerebro(dir.path());
        assert_eq!(cerebro.concepts().edge_count(), 2);
        assert!(cerebro.consciousness().should_restrict("hablemos de armas"));
        assert_eq!(
            cerebro
                .consciousness()
                .describe("proposito")
                .and_then(|info| info.value),
            Some("razonar".to_string())
        );
        assert_eq!(cerebro.consciousness().impact_of("tigre es carnivoro"), Some(-1.0));
        assert!(cerebro.policy().value_of("tigre es carnivoro", ANSWER_ACTION) < 0.0);
        assert_eq!(cerebro.feedback_log().len(), 1);
        assert_eq!(cerebro.feedback_log().entries()[0].outcome, Feedback::NotUseful);

        // The learned penalty is visible before answering again.
        assert!(cerebro.handle_query("Tigre es carnívoro").caution);
    }
}

fn storage_paths(cerebro: &FeedbackCoordinator) -> Vec<Option<&std::path::Path>> {
    vec![
        cerebro.concepts().storage_path(),
        cerebro.consciousness().storage_path(),
        cerebro.policy().storage_path(),
        cerebro.feedback_log().storage_path(),
    ]
}

#[test]
fn memory_only_session_has_no_backing_files() {
    let mut cerebro =
        FeedbackCoordinator::open(CerebroConfig::default(), Box::new(LexicalLanguageService::new()))
            .unwrap();
    assert!(cerebro.config().data_dir.is_none());
    cerebro.remember("a", "b", 1.0);
    cerebro.restrict("armas");
    let interaction = cerebro.handle_query("a es b");
    cerebro.submit_feedback(interaction, Feedback::Useful);
    cerebro.flush().unwrap();
    assert!(storage_paths(&cerebro).iter().all(Option::is_none));
}

#[test]
fn persistent_session_writes_every_store_inside_data_dir() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut cerebro = persistent_cerebro(dir.path());
    cerebro.remember("a", "b", 1.0);
    let interaction = cerebro.handle_query("a es b");
    cerebro.submit_feedback(interaction, Feedback::Useful);

    for path in storage_paths(&cerebro) {
        let path = path.expect("persistent store has a path");
        assert!(path.starts_with(dir.path()));
        assert!(path.exists(), "{} was not written", path.display());
    }
}
