use graph_notes::graph_utils::error::GraphError;
use graph_notes::graph_utils::geometry::{self, Bounds, Point, MIN_RADIUS};
use graph_notes::graph_utils::graph::GraphStore;
use graph_notes::gui::controller::{InteractionController, Mode, PointerButton, ZoomDirection};
use graph_notes::persistence::persist::{self, decode, encode};
use graph_notes::persistence::settings::ZoomAnchor;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn new_store() -> GraphStore {
    GraphStore::new()
}

#[test]
fn store_add_connect_and_cascade_delete() {
    let mut g = new_store();
    let a = g.add_vertex("A", None).expect("vertex a");
    let b = g.add_vertex("B", None).expect("vertex b");
    let c = g.add_vertex("C", None).expect("vertex c");
    g.connect(a, b).expect("a -> b");
    g.connect(c, a).expect("c -> a");
    g.connect(b, c).expect("b -> c");

    g.delete_vertex(a).expect("delete a");
    assert_eq!(g.vertex_count(), 2);
    assert_eq!(g.connection_count(), 1);
    for conn in g.connections() {
        assert_ne!(conn.source, a);
        assert_ne!(conn.target, a);
    }
}

#[test]
fn duplicate_connect_in_both_directions_fails() {
    let mut g = new_store();
    let a = g.add_vertex("A", Some(Point::new(50.0, 50.0))).unwrap();
    let b = g.add_vertex("B", Some(Point::new(250.0, 50.0))).unwrap();
    g.connect(a, b).unwrap();
    assert!(matches!(g.connect(a, b), Err(GraphError::DuplicateConnection(..))));
    assert!(matches!(g.connect(b, a), Err(GraphError::DuplicateConnection(..))));
    assert_eq!(g.connection_count(), 1);
}

#[test]
fn save_then_load_in_a_fresh_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph_data.json");

    {
        let mut g = new_store();
        let a = g.add_vertex("A", None).unwrap();
        let b = g.add_vertex("B", None).unwrap();
        g.connect(a, b).unwrap();
        persist::save_to_path(&g, &path).unwrap();
    }

    // New "process": nothing shared but the file
    let loaded = persist::load_from_path(&path).unwrap().expect("graph file written");
    let notes: Vec<&str> = loaded.vertices().iter().map(|v| v.note.as_str()).collect();
    assert_eq!(notes, ["A", "B"]);
    assert_eq!(loaded.connection_count(), 1);
    let conn = &loaded.connections()[0];
    assert_eq!(loaded.index_of(conn.source), Some(0));
    assert_eq!(loaded.index_of(conn.target), Some(1));
}

#[test]
fn controller_session_round_trip_resets_view() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph_data.json");

    let mut store = new_store();
    store.add_vertex("A", Some(Point::new(100.0, 100.0))).unwrap();
    store.add_vertex("B", Some(Point::new(300.0, 100.0))).unwrap();
    let mut ctl = InteractionController::new(store, ZoomAnchor::Origin);
    ctl.begin_connect();
    ctl.pointer_pressed(Point::new(100.0, 100.0), PointerButton::Primary);
    ctl.pointer_pressed(Point::new(300.0, 100.0), PointerButton::Primary);
    ctl.scroll(ZoomDirection::In, Point::ORIGIN);
    ctl.save(&path).unwrap();

    let mut next = InteractionController::new(new_store(), ZoomAnchor::Origin);
    next.load(&path);
    assert_eq!(next.view().zoom, 1.0);
    assert_eq!(next.mode(), Mode::Idle);
    assert_eq!(next.store().connection_count(), 1);
    // Canvas coordinates were saved already scaled
    let a = &next.store().vertices()[0];
    assert!((a.position.x - 110.0).abs() < 1e-3);
    assert!((a.radius - 33.0).abs() < 1e-3);
    assert!(next.take_notices().is_empty());
}

#[test]
fn controller_load_of_corrupt_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph_data.json");
    std::fs::write(&path, r#"{"vertices":[{"note":"a","x":0,"y":0,"radius":30}],"connections":[{"vertex1":0,"vertex2":9}]}"#).unwrap();

    let mut ctl = InteractionController::new(new_store(), ZoomAnchor::Cursor);
    ctl.load(&path);
    assert!(ctl.store().is_empty());
    let notices = ctl.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Load failed");
}

#[test]
fn save_to_unwritable_location_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the file should go
    let path = dir.path().join("occupied");
    std::fs::create_dir_all(path.join("graph_data.json.tmp")).unwrap();
    let mut ctl = InteractionController::new(new_store(), ZoomAnchor::Cursor);
    assert!(ctl.save(&path.join("graph_data.json")).is_err());
    assert_eq!(ctl.take_notices()[0].title, "Save failed");
}

#[test]
fn placement_scenario_keeps_distance() {
    let mut rng = StdRng::seed_from_u64(2024);
    let existing = [(Point::new(100.0, 100.0), 30.0)];
    for _ in 0..500 {
        let p = geometry::find_non_overlapping_position(
            30.0,
            Bounds::from_size(600.0, 400.0),
            &existing,
            100,
            &mut rng,
        );
        assert!(p.distance(Point::new(100.0, 100.0)) >= 70.0);
    }
}

#[test]
fn line_hit_scenario() {
    let a = Point::new(0.0, 0.0);
    let b = Point::new(100.0, 0.0);
    assert!(geometry::point_near_line(Point::new(40.0, 3.0), a, b, 5.0));
    assert!(!geometry::point_near_line(Point::new(40.0, 10.0), a, b, 5.0));
}

fn note_strategy() -> impl Strategy<Value = String> {
    "[a-z ]{0,128}"
}

fn graph_strategy() -> impl Strategy<Value = (Vec<(String, f32, f32)>, Vec<(usize, usize)>)> {
    prop::collection::vec((note_strategy(), -500.0f32..500.0, -500.0f32..500.0), 0..12).prop_flat_map(|vs| {
        let n = vs.len().max(1);
        let edges = prop::collection::vec((0..n, 0..n), 0..20);
        (Just(vs), edges)
    })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn valid_notes_get_at_least_min_radius(note in note_strategy()) {
        let mut g = new_store();
        let id = g.add_vertex(note, Some(Point::ORIGIN)).unwrap();
        prop_assert!(g.vertex(id).unwrap().radius >= MIN_RADIUS);
    }

    #[test]
    fn overlong_notes_leave_graph_unchanged(extra in 1usize..64) {
        let mut g = new_store();
        let id = g.add_vertex("keep", Some(Point::ORIGIN)).unwrap();
        let long = "n".repeat(128 + extra);
        prop_assert!(g.add_vertex(long.clone(), None).unwrap_err().is_validation());
        prop_assert!(g.edit_vertex_text(id, long).unwrap_err().is_validation());
        prop_assert_eq!(g.vertex_count(), 1);
        prop_assert_eq!(g.vertex(id).unwrap().note.as_str(), "keep");
    }

    #[test]
    fn rescale_then_inverse_restores(k in 0.05f32..20.0) {
        let mut g = new_store();
        g.add_vertex("a", Some(Point::new(120.0, -40.0))).unwrap();
        g.add_vertex("b", Some(Point::new(-75.5, 310.25))).unwrap();
        let before: Vec<_> = g.vertices().to_vec();
        g.rescale(k, Point::ORIGIN);
        g.rescale(1.0 / k, Point::ORIGIN);
        for (old, new) in before.iter().zip(g.vertices()) {
            prop_assert!((old.position.x - new.position.x).abs() <= 1e-3 * old.position.x.abs().max(1.0));
            prop_assert!((old.position.y - new.position.y).abs() <= 1e-3 * old.position.y.abs().max(1.0));
            prop_assert!((old.radius - new.radius).abs() <= 1e-3 * old.radius);
        }
    }

    #[test]
    fn translate_then_inverse_restores(dx in -1000i32..1000, dy in -1000i32..1000) {
        let mut g = new_store();
        g.add_vertex("a", Some(Point::new(12.0, 40.0))).unwrap();
        g.add_vertex("b", Some(Point::new(-300.0, 7.0))).unwrap();
        let before: Vec<Point> = g.vertices().iter().map(|v| v.position).collect();
        g.translate(dx as f32, dy as f32);
        g.translate(-dx as f32, -dy as f32);
        let after: Vec<Point> = g.vertices().iter().map(|v| v.position).collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn encode_decode_is_isomorphic((vertices, edges) in graph_strategy()) {
        let mut g = new_store();
        let ids: Vec<_> = vertices
            .iter()
            .map(|(note, x, y)| g.add_vertex(note.clone(), Some(Point::new(*x, *y))).unwrap())
            .collect();
        for (i, j) in edges {
            if i < ids.len() && j < ids.len() {
                // Self and duplicate pairs are rejected; the rest form the topology
                let _ = g.connect(ids[i], ids[j]);
            }
        }

        let restored = decode(&encode(&g).unwrap()).unwrap();
        prop_assert_eq!(restored.vertex_count(), g.vertex_count());
        for (a, b) in g.vertices().iter().zip(restored.vertices()) {
            prop_assert_eq!(&a.note, &b.note);
            prop_assert_eq!(a.position, b.position);
            prop_assert_eq!(a.radius, b.radius);
        }
        let pairs = |s: &GraphStore| -> Vec<(usize, usize)> {
            s.connections()
                .iter()
                .map(|c| (s.index_of(c.source).unwrap(), s.index_of(c.target).unwrap()))
                .collect()
        };
        prop_assert_eq!(pairs(&g), pairs(&restored));
    }
}
