use crate::actor::broadcast::BroadcastEvent;
use crate::common::config::{Config, LayoutMode};
use crate::layout_engine::{
    EventResponse, FloatingReason, LayoutCommand, LayoutEngine, LayoutError, LayoutEvent,
    LayoutSystem, Orientation, Placement, Removal,
};
use crate::model::WindowId;
use crate::sys::geometry::{Point, Rect};
use crate::sys::headless::{HeadlessHost, RenderCommand};
use crate::sys::host::RenderLayer;

fn w(idx: u32) -> WindowId { WindowId::new(idx) }

fn screen() -> Rect { Rect::new(0, 0, 1920, 1080) }

fn host() -> HeadlessHost {
    let mut host = HeadlessHost::with_output(screen());
    for idx in 1..=16 {
        host.map_window(w(idx));
    }
    host
}

fn engine() -> LayoutEngine { LayoutEngine::new(&Config::default(), None) }

fn create(engine: &mut LayoutEngine, host: &mut HeadlessHost, idx: u32) -> EventResponse {
    engine.handle_event(LayoutEvent::WindowCreated(w(idx)), host)
}

fn geometry(engine: &LayoutEngine, idx: u32) -> Option<Rect> {
    let workspace = engine.workspace_of(w(idx))?;
    engine.layout(workspace)?.geometry_of(w(idx))
}

fn live_count(engine: &LayoutEngine) -> usize {
    engine.layout(engine.current_workspace()).unwrap().live_count()
}

/// A on the right, B on the left, as produced by inserting B with the
/// pointer on the left half of A.
fn a_and_b() -> (LayoutEngine, HeadlessHost) {
    let mut engine = engine();
    let mut host = host();
    _ = create(&mut engine, &mut host, 1);
    assert!(engine.insert_at(w(2), w(1), Orientation::Horizontal, 0.5, Point::new(10.0, 540.0)));
    engine.recalculate(0, &mut host).unwrap();
    (engine, host)
}

mod dynamic_scenarios {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn first_window_fills_the_output() {
        let mut engine = engine();
        let mut host = host();
        let response = create(&mut engine, &mut host, 1);

        assert_eq!(response.focus_window, Some(w(1)));
        assert_eq!(geometry(&engine, 1), Some(screen()));
        assert_eq!(host.frame(w(1)), Some(Rect::new(5, 5, 1910, 1070)));
        assert_eq!(live_count(&engine), 1);
    }

    #[test]
    fn second_window_left_of_midpoint_goes_first() {
        let (engine, _) = a_and_b();
        assert_eq!(geometry(&engine, 2), Some(Rect::new(0, 0, 960, 1080)));
        assert_eq!(geometry(&engine, 1), Some(Rect::new(960, 0, 960, 1080)));
        assert_eq!(live_count(&engine), 3);
    }

    #[test]
    fn removing_b_restores_a() {
        let (mut engine, mut host) = a_and_b();
        let response = engine.handle_event(LayoutEvent::WindowDestroyed(w(2)), &mut host);

        assert_eq!(response.focus_window, Some(w(1)));
        assert_eq!(geometry(&engine, 1), Some(screen()));
        assert_eq!(live_count(&engine), 1);
        assert_eq!(engine.workspace_of(w(2)), None);
    }

    #[test]
    fn toggling_a_to_stacking_gives_b_the_output() {
        let (mut engine, mut host) = a_and_b();
        _ = engine.handle_event(LayoutEvent::WindowFocused(w(1)), &mut host);
        host.take_commands();

        let response = engine.handle_event(LayoutEvent::Command(LayoutCommand::ToggleFloating), &mut host);

        assert_eq!(response.raise_windows, vec![w(1)]);
        assert_eq!(engine.placement(w(1)), Some(Placement::Floating(FloatingReason::Stacking)));
        assert_eq!(live_count(&engine), 1);
        assert_eq!(geometry(&engine, 2), Some(screen()));
        assert_eq!(host.layer(w(1)), Some(RenderLayer::Floating));
        assert_eq!(
            host.take_commands(),
            vec![RenderCommand::Reparent(w(1), RenderLayer::Floating), RenderCommand::Raise(w(1))]
        );
        assert_eq!(engine.stacking_order(0), &[w(1)]);
    }

    #[test]
    fn toggling_twice_tiles_again() {
        let (mut engine, mut host) = a_and_b();
        assert!(engine.toggle_stacking(w(1), &mut host));
        host.move_pointer(Point::new(1800.0, 540.0));
        assert!(engine.toggle_stacking(w(1), &mut host));

        assert_eq!(engine.placement(w(1)), Some(Placement::Tiled));
        assert_eq!(host.layer(w(1)), Some(RenderLayer::Tiled));
        assert_eq!(live_count(&engine), 3);
        assert_eq!(geometry(&engine, 2), Some(Rect::new(0, 0, 960, 1080)));
        assert_eq!(geometry(&engine, 1), Some(Rect::new(960, 0, 960, 1080)));
        assert!(engine.stacking_order(0).is_empty());
    }

    #[test]
    fn stacking_window_is_tiled_again_through_attach_only() {
        let (mut engine, mut host) = a_and_b();
        assert!(engine.toggle_stacking(w(1), &mut host));

        assert!(!engine.insert_at(w(1), w(2), Orientation::Horizontal, 0.5, Point::new(1800.0, 540.0)));
        assert_eq!(engine.placement(w(1)), Some(Placement::Floating(FloatingReason::Stacking)));
        assert_eq!(host.layer(w(1)), Some(RenderLayer::Floating));
        assert_eq!(engine.stacking_order(0), &[w(1)]);

        host.move_pointer(Point::new(1800.0, 540.0));
        assert!(engine.attach(w(1), Some(w(2)), &mut host));
        assert_eq!(engine.placement(w(1)), Some(Placement::Tiled));
        assert_eq!(host.layer(w(1)), Some(RenderLayer::Tiled));
        assert_eq!(geometry(&engine, 2), Some(Rect::new(0, 0, 960, 1080)));
        assert_eq!(geometry(&engine, 1), Some(Rect::new(960, 0, 960, 1080)));
        assert!(engine.stacking_order(0).is_empty());
    }

    #[test]
    fn many_windows_keep_the_invariant() {
        let mut engine = engine();
        let mut host = host();
        host.move_pointer(Point::new(1200.0, 300.0));
        for idx in 1..=8 {
            _ = create(&mut engine, &mut host, idx);
            assert_eq!(live_count(&engine), 2 * idx as usize - 1);
            assert!(engine.recalculate(0, &mut host).is_ok());
        }
        for idx in (1..=8).rev() {
            _ = engine.handle_event(LayoutEvent::WindowDestroyed(w(idx)), &mut host);
            assert!(engine.recalculate(0, &mut host).is_ok());
        }
        assert_eq!(live_count(&engine), 0);
    }

    #[test]
    fn recalculate_is_idempotent() {
        let (mut engine, mut host) = a_and_b();
        _ = create(&mut engine, &mut host, 3);
        let before: Vec<_> = (1..=3).map(|i| geometry(&engine, i)).collect();
        engine.recalculate(0, &mut host).unwrap();
        let after: Vec<_> = (1..=3).map(|i| geometry(&engine, i)).collect();
        assert_eq!(before, after);
    }
}

mod move_sessions {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn begin_and_end_move() {
        let (mut engine, mut host) = a_and_b();
        let response = engine.handle_event(LayoutEvent::Command(LayoutCommand::BeginMove(w(2))), &mut host);

        assert_eq!(response.raise_windows, vec![w(2)]);
        assert_eq!(engine.moving_window(), Some(w(2)));
        assert_eq!(engine.placement(w(2)), Some(Placement::Floating(FloatingReason::Moving)));
        assert_eq!(geometry(&engine, 1), Some(screen()));

        host.move_pointer(Point::new(1800.0, 100.0));
        let response = engine.handle_event(LayoutEvent::PointerButton { pressed: false }, &mut host);

        assert_eq!(response.focus_window, Some(w(2)));
        assert_eq!(engine.moving_window(), None);
        assert_eq!(engine.placement(w(2)), Some(Placement::Tiled));
        assert_eq!(geometry(&engine, 1), Some(Rect::new(0, 0, 960, 1080)));
        assert_eq!(geometry(&engine, 2), Some(Rect::new(960, 0, 960, 1080)));
    }

    #[test]
    fn toggle_while_moving_stops_the_session_and_stacks() {
        let (mut engine, mut host) = a_and_b();
        assert!(engine.begin_move(w(2), &mut host));
        host.take_commands();

        assert!(engine.toggle_stacking(w(2), &mut host));

        assert_eq!(engine.moving_window(), None);
        assert_eq!(engine.placement(w(2)), Some(Placement::Floating(FloatingReason::Stacking)));
        let commands = host.take_commands();
        assert_eq!(commands.first(), Some(&RenderCommand::StopMove(w(2))));
        assert!(commands.contains(&RenderCommand::Raise(w(2))));
        assert_eq!(live_count(&engine), 1);

        assert!(!engine.end_move(&mut host));
    }

    #[test]
    fn insert_at_leaves_a_moving_window_alone() {
        let (mut engine, mut host) = a_and_b();
        assert!(engine.begin_move(w(2), &mut host));
        host.take_commands();

        assert!(!engine.insert_at(w(2), w(1), Orientation::Horizontal, 0.5, Point::new(10.0, 540.0)));
        assert_eq!(engine.moving_window(), Some(w(2)));
        assert_eq!(engine.placement(w(2)), Some(Placement::Floating(FloatingReason::Moving)));
        assert!(host.commands().is_empty());
    }

    #[test]
    fn only_tiled_windows_start_moving() {
        let (mut engine, mut host) = a_and_b();
        assert!(engine.toggle_stacking(w(1), &mut host));
        assert!(!engine.begin_move(w(1), &mut host));
        assert!(!engine.begin_move(w(9), &mut host));
    }

    #[test]
    fn destroying_the_moving_window_ends_the_session() {
        let (mut engine, mut host) = a_and_b();
        assert!(engine.begin_move(w(2), &mut host));
        _ = engine.handle_event(LayoutEvent::WindowDestroyed(w(2)), &mut host);

        assert_eq!(engine.moving_window(), None);
        assert_eq!(engine.placement(w(2)), None);
        assert_eq!(live_count(&engine), 1);
    }
}

mod workspaces {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn switching_hides_and_shows_windows() {
        let (tx, mut rx) = crate::actor::channel();
        let mut engine = LayoutEngine::new(&Config::default(), Some(tx));
        let mut host = host();
        _ = create(&mut engine, &mut host, 1);
        _ = crate::actor::drain(&mut rx);

        let response = engine.handle_event(
            LayoutEvent::Command(LayoutCommand::SwitchToWorkspace(3)),
            &mut host,
        );
        assert_eq!(response.workspace_changed_to, Some(3));
        assert_eq!(engine.current_workspace(), 3);
        assert!(!host.window(w(1)).unwrap().visible);

        assert_eq!(crate::actor::drain(&mut rx), vec![BroadcastEvent::WorkspaceChanged {
            workspace: 3,
            workspace_name: "4".to_string()
        }]);

        _ = create(&mut engine, &mut host, 2);
        assert_eq!(engine.workspace_of(w(2)), Some(3));
        assert_eq!(geometry(&engine, 2), Some(screen()));

        assert_eq!(engine.switch_workspace(0, &mut host), Ok(true));
        assert!(host.window(w(1)).unwrap().visible);
        assert!(!host.window(w(2)).unwrap().visible);
        assert_eq!(engine.focused_window(), Some(w(1)));
    }

    #[test]
    fn hidden_workspace_keeps_its_frames() {
        let (mut engine, mut host) = a_and_b();
        let before = host.frame(w(1));
        assert_eq!(before, Some(Rect::new(965, 5, 950, 1070)));
        assert_eq!(engine.switch_workspace(1, &mut host), Ok(true));

        _ = engine.handle_event(LayoutEvent::WindowDestroyed(w(2)), &mut host);
        assert_eq!(geometry(&engine, 1), Some(screen()));
        assert_eq!(host.frame(w(1)), before);

        assert_eq!(engine.switch_workspace(0, &mut host), Ok(true));
        assert_eq!(host.frame(w(1)), Some(Rect::new(5, 5, 1910, 1070)));
    }

    #[test]
    fn switching_to_current_workspace_is_a_no_op() {
        let mut engine = engine();
        let mut host = host();
        assert_eq!(engine.switch_workspace(0, &mut host), Ok(false));
        assert!(host.commands().is_empty());
    }

    #[test]
    fn invalid_workspace_is_rejected() {
        let mut engine = engine();
        let mut host = host();
        assert_eq!(engine.switch_workspace(10, &mut host), Err(LayoutError::InvalidWorkspace(10)));
        assert_eq!(engine.workspace_count(), 10);
        assert_eq!(engine.current_workspace(), 0);
    }

    #[test]
    fn missing_output_fails_recalculate() {
        let mut engine = engine();
        let mut host = host();
        host.set_output(None);
        _ = create(&mut engine, &mut host, 1);

        assert_eq!(engine.recalculate(0, &mut host), Err(LayoutError::NoOutput(0)));
        assert_eq!(geometry(&engine, 1), None);

        host.set_output(Some(screen()));
        assert_eq!(engine.recalculate(0, &mut host), Ok(()));
        assert_eq!(geometry(&engine, 1), Some(screen()));
    }

    #[test]
    fn workspace_outputs_are_independent() {
        let mut engine = engine();
        let mut host = host();
        host.bind_output(1, Rect::new(1920, 0, 1280, 1024));
        assert_eq!(engine.switch_workspace(1, &mut host), Ok(true));
        _ = create(&mut engine, &mut host, 1);
        assert_eq!(geometry(&engine, 1), Some(Rect::new(1920, 0, 1280, 1024)));
    }
}

mod grid_workspaces {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    fn grid_engine(rows: u32, columns: u32) -> LayoutEngine {
        let mut config = Config::default();
        config.layout.mode = LayoutMode::Grid;
        config.layout.grid.rows = rows;
        config.layout.grid.columns = columns;
        LayoutEngine::new(&config, None)
    }

    #[test]
    fn overflow_windows_are_stacked() {
        let mut engine = grid_engine(1, 2);
        let mut host = host();
        for idx in 1..=3 {
            _ = create(&mut engine, &mut host, idx);
        }

        assert_eq!(engine.placement(w(1)), Some(Placement::Tiled));
        assert_eq!(engine.placement(w(2)), Some(Placement::Tiled));
        assert_eq!(engine.placement(w(3)), Some(Placement::Floating(FloatingReason::Stacking)));
        assert_eq!(host.layer(w(3)), Some(RenderLayer::Floating));
        assert_eq!(engine.stacking_order(0), &[w(3)]);

        _ = engine.handle_event(LayoutEvent::WindowDestroyed(w(1)), &mut host);
        assert!(engine.toggle_stacking(w(3), &mut host));
        assert_eq!(engine.placement(w(3)), Some(Placement::Tiled));
        assert_eq!(geometry(&engine, 2), Some(Rect::new(0, 0, 960, 1080)));
        assert_eq!(geometry(&engine, 3), Some(Rect::new(960, 0, 960, 1080)));
    }

    #[test]
    fn grid_does_not_resize() {
        let mut engine = grid_engine(2, 2);
        let mut host = host();
        _ = create(&mut engine, &mut host, 1);
        _ = create(&mut engine, &mut host, 2);
        assert!(!engine.resize(Point::new(100.0, 100.0), &mut host));
    }

    #[test]
    fn per_workspace_mode_override() {
        let mut config = Config::default();
        config.workspaces.modes.insert(2, LayoutMode::Grid);
        let engine = LayoutEngine::new(&config, None);
        assert_eq!(engine.layout(0).unwrap().mode(), LayoutMode::Dynamic);
        assert_eq!(engine.layout(2).unwrap().mode(), LayoutMode::Grid);
    }
}

mod events {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn pointer_motion_updates_active_window() {
        let (mut engine, mut host) = a_and_b();
        _ = engine.handle_event(LayoutEvent::PointerMoved(Point::new(1500.0, 500.0)), &mut host);
        assert_eq!(engine.layout(0).unwrap().active_window(), Some(w(1)));

        _ = engine.handle_event(LayoutEvent::PointerMoved(Point::new(100.0, 500.0)), &mut host);
        assert_eq!(engine.layout(0).unwrap().active_window(), Some(w(2)));
    }

    #[test]
    fn resize_command_moves_the_active_boundary() {
        let (mut engine, mut host) = a_and_b();
        _ = engine.handle_event(LayoutEvent::WindowFocused(w(2)), &mut host);
        _ = engine.handle_event(
            LayoutEvent::Command(LayoutCommand::ResizeTo(Point::new(1440.0, 0.0))),
            &mut host,
        );
        assert_eq!(geometry(&engine, 2), Some(Rect::new(0, 0, 1440, 1080)));
        assert_eq!(geometry(&engine, 1), Some(Rect::new(1440, 0, 480, 1080)));
    }

    #[test]
    fn duplicate_creation_is_ignored() {
        let (mut engine, mut host) = a_and_b();
        let response = create(&mut engine, &mut host, 1);
        assert_eq!(response, EventResponse::default());
        assert_eq!(live_count(&engine), 3);
    }

    #[test]
    fn destroying_unknown_window_changes_nothing() {
        let (mut engine, mut host) = a_and_b();
        assert_eq!(engine.remove(w(12)), Removal::NotFound);
        let response = engine.handle_event(LayoutEvent::WindowDestroyed(w(12)), &mut host);
        assert_eq!(response.focus_window, None);
        assert_eq!(live_count(&engine), 3);
    }

    #[test]
    fn events_round_trip_through_ron() {
        let events = vec![
            LayoutEvent::WindowCreated(w(1)),
            LayoutEvent::PointerMoved(Point::new(10.0, 20.0)),
            LayoutEvent::PointerButton { pressed: false },
            LayoutEvent::Command(LayoutCommand::SwitchToWorkspace(2)),
        ];
        let text = ron::to_string(&events).unwrap();
        let parsed: Vec<LayoutEvent> = ron::from_str(&text).unwrap();
        assert_eq!(parsed, events);
    }
}
