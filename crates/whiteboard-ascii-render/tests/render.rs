use whiteboard_ascii_render::{AsciiRenderOptions, render_ascii};
use whiteboard_canvas::{Canvas, CanvasConfig, ViewportState};
use whiteboard_graph::{AnalysisResult, GraphSnapshot, NodeKind, NodeSpec, Point, Size};

#[test]
fn renders_analysis_tree() {
    let input = r#"{ "rootProblem": "Costs", "hypothesis": "Automate",
        "pillars": [{ "category": "Ops", "goal": "Faster", "evidence": ["e1"],
            "solutions": [{ "title": "RPA", "description": "Bots", "impact": "-20%" }] }] }"#;
    let analysis = AnalysisResult::from_json(input).unwrap();
    let mut canvas = Canvas::from_analysis(&analysis, CanvasConfig::default()).unwrap();
    let options = AsciiRenderOptions::default();
    canvas.fit_to(options.screen_size(), 16.0);

    let output = render_ascii(&canvas.snapshot(), &canvas.viewport_state(), &options);
    assert!(output.contains("! Core Problem"));
    assert!(output.contains("* Hypothesis"));
    assert!(output.contains("# Ops"));
    assert!(output.contains('#'));
    assert!(output.contains(':'), "solution edge should be dashed:\n{output}");
    assert!(output.lines().count() <= options.rows);
    assert!(output.lines().all(|line| line.chars().count() <= options.columns));
}

#[test]
fn empty_snapshot_renders_nothing() {
    let output = render_ascii(
        &GraphSnapshot::default(),
        &ViewportState::default(),
        &AsciiRenderOptions::default(),
    );
    assert!(output.is_empty());
}

#[test]
fn off_screen_nodes_are_clipped() {
    let mut canvas = Canvas::new(CanvasConfig::default());
    canvas.add_node(
        NodeSpec::new(NodeKind::Action, "far")
            .with_position(Point::new(-5000.0, -5000.0))
            .with_size(Size::new(80.0, 48.0)),
    );
    let options = AsciiRenderOptions::default();
    let output = render_ascii(&canvas.snapshot(), &canvas.viewport_state(), &options);
    assert!(!output.contains("far"));
}
