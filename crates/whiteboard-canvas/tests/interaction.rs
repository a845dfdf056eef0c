use whiteboard_canvas::{
    Canvas, CanvasConfig, EditMode, HitTarget, InteractionState, Outcome, PointerEvent,
};
use whiteboard_graph::{Direction, InvalidEdge, NodeId, NodeKind, NodeSpec, Point, Ports};

fn down(x: f32, y: f32, target: HitTarget) -> PointerEvent {
    PointerEvent::Down {
        position: Point::new(x, y),
        target,
    }
}

fn up(x: f32, y: f32, target: HitTarget) -> PointerEvent {
    PointerEvent::Up {
        position: Point::new(x, y),
        target,
    }
}

fn moved(x: f32, y: f32) -> PointerEvent {
    PointerEvent::Move {
        position: Point::new(x, y),
    }
}

#[test]
fn drag_keeps_grab_offset() {
    let mut canvas = Canvas::new(CanvasConfig::default());
    let node = canvas
        .add_node(NodeSpec::new(NodeKind::Action, "a").with_position(Point::new(100.0, 100.0)));

    assert_eq!(
        canvas.handle(down(110.0, 105.0, HitTarget::NodeBody(node))),
        Outcome::GestureStarted
    );
    assert_eq!(
        canvas.controller().state(),
        InteractionState::DraggingNode {
            node,
            grab_offset: Point::new(10.0, 5.0)
        }
    );
    assert_eq!(canvas.handle(moved(300.0, 150.0)), Outcome::NodeMoved(node));
    assert_eq!(canvas.handle(up(300.0, 150.0, HitTarget::NodeBody(node))), Outcome::GestureEnded);

    let placed = canvas.store().node(node).unwrap();
    assert_eq!(placed.position, Point::new(290.0, 145.0));
    assert!(placed.manually_placed);
    assert!(canvas.controller().is_idle());

    assert_eq!(canvas.handle(moved(500.0, 500.0)), Outcome::Ignored);
    assert_eq!(canvas.store().node(node).unwrap().position, Point::new(290.0, 145.0));
}

#[test]
fn drag_goes_through_the_viewport() {
    let mut canvas = Canvas::new(CanvasConfig::default());
    let node = canvas
        .add_node(NodeSpec::new(NodeKind::Action, "a").with_position(Point::new(100.0, 100.0)));
    canvas.viewport_mut().zoom_to(2.0, Point::ORIGIN);
    canvas.viewport_mut().pan_by(Point::new(40.0, 20.0));

    // graph (110, 105) on screen under zoom 2 and pan (40, 20)
    canvas.handle(down(260.0, 230.0, HitTarget::NodeBody(node)));
    // graph (300, 150)
    canvas.handle(moved(640.0, 320.0));
    canvas.handle(up(640.0, 320.0, HitTarget::Canvas));

    assert_eq!(canvas.store().node(node).unwrap().position, Point::new(290.0, 145.0));
}

#[test]
fn connecting_creates_edge() {
    let mut canvas = Canvas::new(CanvasConfig::default());
    let a = canvas.add_node(NodeSpec::new(NodeKind::Trigger, "start"));
    let b = canvas.add_node(NodeSpec::new(NodeKind::Action, "send"));

    assert_eq!(canvas.handle(down(0.0, 0.0, HitTarget::OutputPort(a))), Outcome::GestureStarted);
    assert_eq!(canvas.handle(moved(40.0, 60.0)), Outcome::Ignored);
    assert!(matches!(
        canvas.controller().state(),
        InteractionState::ConnectingEdge { source, pointer }
            if source == a && pointer == Point::new(40.0, 60.0)
    ));
    assert_eq!(canvas.store().edge_count(), 0);

    let outcome = canvas.handle(up(50.0, 70.0, HitTarget::InputPort(b)));
    assert!(matches!(outcome, Outcome::EdgeCreated(_)));
    let edge = canvas.store().edges().next().unwrap();
    assert_eq!((edge.source, edge.target), (a, b));
    assert!(canvas.controller().is_idle());
}

#[test]
fn click_then_click_connects() {
    let mut canvas = Canvas::new(CanvasConfig::default());
    let a = canvas.add_node(NodeSpec::new(NodeKind::Action, "a"));
    let b = canvas.add_node(NodeSpec::new(NodeKind::Action, "b"));

    canvas.handle(down(0.0, 0.0, HitTarget::OutputPort(a)));
    assert_eq!(canvas.handle(up(0.0, 0.0, HitTarget::OutputPort(a))), Outcome::Ignored);
    let outcome = canvas.handle(down(10.0, 10.0, HitTarget::InputPort(b)));
    assert!(matches!(outcome, Outcome::EdgeCreated(_)));
    assert_eq!(canvas.store().edge_count(), 1);
}

#[test]
fn self_connection_is_rejected() {
    let mut canvas = Canvas::new(CanvasConfig::default());
    let a = canvas.add_node(NodeSpec::new(NodeKind::Action, "a"));

    canvas.handle(down(0.0, 0.0, HitTarget::OutputPort(a)));
    let outcome = canvas.handle(down(0.0, 0.0, HitTarget::InputPort(a)));
    assert_eq!(outcome, Outcome::EdgeRejected(InvalidEdge::SelfLoop(a)));
    assert_eq!(canvas.store().edge_count(), 0);
    assert_eq!(canvas.controller().state(), InteractionState::Idle);
}

#[test]
fn releasing_elsewhere_cancels_connection() {
    let mut canvas = Canvas::new(CanvasConfig::default());
    let a = canvas.add_node(NodeSpec::new(NodeKind::Action, "a"));
    let b = canvas.add_node(NodeSpec::new(NodeKind::Action, "b"));
    let revision = canvas.store().revision();

    canvas.handle(down(0.0, 0.0, HitTarget::OutputPort(a)));
    assert_eq!(canvas.handle(up(5.0, 5.0, HitTarget::NodeBody(b))), Outcome::Cancelled);
    assert_eq!(canvas.store().edge_count(), 0);
    assert_eq!(canvas.store().revision(), revision);

    canvas.handle(down(0.0, 0.0, HitTarget::OutputPort(a)));
    assert_eq!(canvas.handle(PointerEvent::Leave), Outcome::Cancelled);
    assert!(canvas.controller().is_idle());
    assert!(canvas.changed_since(revision).is_none());
}

#[test]
fn ports_gate_connections() {
    let mut canvas = Canvas::new(CanvasConfig::default());
    let sink = canvas
        .add_node(NodeSpec::new(NodeKind::Action, "sink").with_ports(Ports::new(1, 0)));
    let trigger = canvas.add_node(NodeSpec::new(NodeKind::Trigger, "t"));
    let action = canvas.add_node(NodeSpec::new(NodeKind::Action, "a"));

    assert_eq!(canvas.handle(down(0.0, 0.0, HitTarget::OutputPort(sink))), Outcome::Ignored);
    assert!(canvas.controller().is_idle());

    canvas.handle(down(0.0, 0.0, HitTarget::OutputPort(action)));
    let outcome = canvas.handle(up(0.0, 0.0, HitTarget::InputPort(trigger)));
    assert_eq!(outcome, Outcome::EdgeRejected(InvalidEdge::NoInputs(trigger)));
    assert_eq!(canvas.store().edge_count(), 0);
}

#[test]
fn double_click_deletes_with_edges() {
    let mut canvas = Canvas::new(CanvasConfig::default());
    let a = canvas.add_node(NodeSpec::new(NodeKind::Action, "a"));
    let b = canvas.add_node(NodeSpec::new(NodeKind::Action, "b"));
    canvas.store_mut().add_edge(a, b).unwrap();

    let outcome = canvas.handle(PointerEvent::DoubleClick {
        position: Point::ORIGIN,
        target: HitTarget::NodeBody(a),
    });
    assert_eq!(outcome, Outcome::NodeRemoved(a));
    assert!(!canvas.store().contains_node(a));
    assert_eq!(canvas.store().edge_count(), 0);
}

#[test]
fn new_gestures_are_ignored_while_busy() {
    let mut canvas = Canvas::new(CanvasConfig::default());
    let a = canvas.add_node(NodeSpec::new(NodeKind::Action, "a"));
    let b = canvas.add_node(NodeSpec::new(NodeKind::Action, "b"));

    canvas.handle(down(0.0, 0.0, HitTarget::NodeBody(a)));
    assert_eq!(canvas.handle(down(0.0, 0.0, HitTarget::NodeBody(b))), Outcome::Ignored);
    assert_eq!(canvas.handle(down(0.0, 0.0, HitTarget::OutputPort(b))), Outcome::Ignored);
    let outcome = canvas.handle(PointerEvent::DoubleClick {
        position: Point::ORIGIN,
        target: HitTarget::NodeBody(b),
    });
    assert_eq!(outcome, Outcome::Ignored);
    assert!(canvas.store().contains_node(b));
    assert!(matches!(
        canvas.controller().state(),
        InteractionState::DraggingNode { node, .. } if node == a
    ));
}

#[test]
fn layout_only_mode_allows_pan_and_zoom() {
    let config = CanvasConfig {
        edit_mode: EditMode::LayoutOnly,
        ..CanvasConfig::default()
    };
    let mut canvas = Canvas::new(config);
    let a = canvas.add_node(NodeSpec::new(NodeKind::Problem, "a"));
    let b = canvas.add_node(NodeSpec::new(NodeKind::Hypothesis, "b"));

    assert_eq!(canvas.handle(down(0.0, 0.0, HitTarget::NodeBody(a))), Outcome::Ignored);
    assert_eq!(canvas.handle(down(0.0, 0.0, HitTarget::OutputPort(a))), Outcome::Ignored);
    let outcome = canvas.handle(PointerEvent::DoubleClick {
        position: Point::ORIGIN,
        target: HitTarget::NodeBody(b),
    });
    assert_eq!(outcome, Outcome::Ignored);

    assert_eq!(canvas.handle(down(10.0, 10.0, HitTarget::Canvas)), Outcome::GestureStarted);
    assert_eq!(canvas.handle(moved(30.0, 5.0)), Outcome::ViewportChanged);
    assert_eq!(canvas.handle(up(30.0, 5.0, HitTarget::Canvas)), Outcome::GestureEnded);
    assert_eq!(canvas.viewport().pan(), Point::new(20.0, -5.0));

    let outcome = canvas.handle(PointerEvent::Wheel {
        position: Point::new(100.0, 100.0),
        delta: -1.0,
    });
    assert_eq!(outcome, Outcome::ViewportChanged);
    assert!(canvas.viewport().zoom() > 1.0);
}

#[test]
fn switching_mode_cancels_active_gesture() {
    let mut canvas = Canvas::new(CanvasConfig::default());
    let a = canvas.add_node(NodeSpec::new(NodeKind::Action, "a"));
    canvas.handle(down(0.0, 0.0, HitTarget::OutputPort(a)));
    canvas.set_edit_mode(EditMode::LayoutOnly);
    assert!(canvas.controller().is_idle());
    assert_eq!(canvas.controller().mode(), EditMode::LayoutOnly);
}

#[test]
fn hit_test_resolves_ports_and_bodies() {
    let mut canvas = Canvas::new(CanvasConfig::default());
    let a = canvas
        .add_node(NodeSpec::new(NodeKind::Action, "a").with_position(Point::new(0.0, 0.0)));
    let trigger = canvas
        .add_node(NodeSpec::new(NodeKind::Trigger, "t").with_position(Point::new(400.0, 0.0)));

    // Default box is 280 x 150, ports at top and bottom centre.
    assert_eq!(canvas.hit_test(Point::new(140.0, 0.0)), HitTarget::InputPort(a));
    assert_eq!(canvas.hit_test(Point::new(140.0, 150.0)), HitTarget::OutputPort(a));
    assert_eq!(canvas.hit_test(Point::new(50.0, 70.0)), HitTarget::NodeBody(a));
    assert_eq!(canvas.hit_test(Point::new(540.0, 0.0)), HitTarget::NodeBody(trigger));
    assert_eq!(canvas.hit_test(Point::new(350.0, 70.0)), HitTarget::Canvas);
    assert_eq!(canvas.input_port(a), Some(Point::new(140.0, 0.0)));
    assert_eq!(canvas.output_port(trigger), Some(Point::new(540.0, 150.0)));
}

#[test]
fn ports_sit_on_the_sides_left_to_right() {
    let mut config = CanvasConfig::default();
    config.layout.direction = Direction::LR;
    let mut canvas = Canvas::new(config);
    let a = canvas.add_node(NodeSpec::new(NodeKind::Action, "a"));

    assert_eq!(canvas.input_port(a), Some(Point::new(0.0, 75.0)));
    assert_eq!(canvas.output_port(a), Some(Point::new(280.0, 75.0)));
    assert_eq!(canvas.hit_test(Point::new(2.0, 75.0)), HitTarget::InputPort(a));
    assert_eq!(canvas.input_port(NodeId::new(99)), None);
}
