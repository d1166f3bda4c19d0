use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use float_cmp::approx_eq;

use trellis::{
    Algorithm, BusyPolicy, Document, LayoutError, LayoutOptions, config::SpringConfig,
    geometry::Position, identifier::Id, import_text,
};

fn endless_spring() -> LayoutOptions {
    let mut options = LayoutOptions::default();
    options.spring = SpringConfig {
        iterations: usize::MAX,
        convergence_threshold: 0.0,
        ..SpringConfig::default()
    };
    options
}

fn document(source: &str) -> Document {
    Document::import_text(source).unwrap()
}

#[test]
fn test_cancelled_spring_keeps_progress() {
    let mut doc = document("graph { a; b; c; d; a -- b; b -- c; c -- a; }");
    doc.set_options(endless_spring());
    assert!(doc.read().nodes().all(|n| n.position() == Position::ORIGIN));

    let job = doc.start_layout(Algorithm::Spring).unwrap();
    assert!(doc.is_busy());
    job.cancel();
    let assignment = job.wait().unwrap();

    assert!(assignment.is_cancelled());
    assert_eq!(assignment.positions().len(), 4);
    assert!(
        assignment
            .positions()
            .values()
            .any(|p| *p != Position::ORIGIN)
    );

    doc.commit(&assignment).unwrap();
    assert_eq!(doc.read().advisory().last_layout.as_deref(), Some("spring"));
}

#[test]
fn test_busy_document_rejects_second_layout() {
    let mut doc = document("graph { a; b; a -- b; }");
    doc.set_options(endless_spring());

    let job = doc.start_layout(Algorithm::Spring).unwrap();
    assert_eq!(
        doc.start_layout(Algorithm::Grid).err(),
        Some(LayoutError::Busy)
    );

    job.cancel();
    job.wait().unwrap();
    while doc.is_busy() {
        thread::yield_now();
    }
    assert!(doc.start_layout(Algorithm::Grid).unwrap().wait().is_ok());
}

#[test]
fn test_cancel_in_flight_policy_replaces_running_layout() {
    let mut doc = document("graph { a; b; a -- b; }");
    doc.set_options(endless_spring());
    doc.set_busy_policy(BusyPolicy::CancelInFlight);

    let first = doc.start_layout(Algorithm::Spring).unwrap();
    let second = doc.start_layout(Algorithm::Grid).unwrap();

    assert!(first.wait().unwrap().is_cancelled());
    let grid = second.wait().unwrap();
    assert_eq!(grid.algorithm(), Algorithm::Grid);
    assert!(!grid.is_cancelled());
}

#[test]
fn test_concurrent_export_never_sees_partial_commit() {
    let nodes: Vec<String> = (0..40).map(|i| format!("n{i:02};")).collect();
    let doc = Arc::new(document(&format!("graph {{ {} }}", nodes.join(" "))));

    let assignment = doc.start_layout(Algorithm::Grid).unwrap().wait().unwrap();
    let expected: Vec<(Id, Position)> = assignment
        .positions()
        .iter()
        .map(|(id, p)| (*id, *p))
        .collect();

    let done = Arc::new(AtomicBool::new(false));
    let reader = {
        let doc = Arc::clone(&doc);
        let done = Arc::clone(&done);
        let expected = expected.clone();
        thread::spawn(move || {
            let mut snapshots = 0;
            while !done.load(Ordering::Acquire) || snapshots == 0 {
                let graph = import_text(&doc.export_text()).unwrap();
                let matches: Vec<bool> = expected
                    .iter()
                    .map(|(id, p)| {
                        let q = graph.node(*id).unwrap().position();
                        approx_eq!(f64, p.x(), q.x(), epsilon = 1e-6)
                            && approx_eq!(f64, p.y(), q.y(), epsilon = 1e-6)
                    })
                    .collect();
                let at_origin = graph.nodes().all(|n| n.position() == Position::ORIGIN);
                assert!(matches.iter().all(|m| *m) || at_origin);
                snapshots += 1;
            }
        })
    };

    for _ in 0..20 {
        let undo = doc.commit(&assignment).unwrap();
        doc.edit(|graph| undo.apply(graph)).unwrap();
    }
    done.store(true, Ordering::Release);
    reader.join().unwrap();
}

#[test]
fn test_apply_layout_and_refresh_advisory() {
    let doc = document("digraph { a; b; c; d; a -> b; b -> c; c -> d; }");
    let assignment = doc.apply_layout(Algorithm::Layered).unwrap();
    assert_eq!(assignment.positions().len(), 4);

    let suggestions = doc.refresh_advisory();
    assert_eq!(suggestions.first(), Some(&Algorithm::Circle));

    let reloaded = document(&doc.export_text());
    let graph = reloaded.into_graph();
    assert_eq!(graph.advisory().last_layout.as_deref(), Some("layered"));
    assert_eq!(graph.advisory().density, Some(0.5));
    assert_eq!(graph.advisory().suggested_layouts[0], "circle");
}

#[test]
fn test_commit_fails_after_node_removed() {
    let doc = document("graph { a; b; }");
    let assignment = doc.start_layout(Algorithm::Grid).unwrap().wait().unwrap();
    doc.edit(|graph| graph.remove_node(Id::new("b"))).unwrap();

    assert!(doc.commit(&assignment).is_err());
    assert_eq!(doc.read().node(Id::new("a")).unwrap().position(), Position::ORIGIN);
}
