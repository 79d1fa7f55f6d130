//! Parallel fitting of several laser shots

use std::sync::mpsc;
use std::time::Duration;

use pulse_rs::input::ExperimentalData;
use pulse_rs::physics::{Dimension, NumericPropertyKeyword as K, Problem, ProblemKind};
use pulse_rs::search::SearchConfiguration;
use pulse_rs::solver::{SchemeConfiguration, SchemeKind};
use pulse_rs::tasks::{SearchTask, TaskEvent, TaskManager, TaskStatus};

mod common;
use common::{measurement, problem, relative_error, solve};

const DIFFUSIVITIES: [f64; 3] = [0.8e-6, 1.0e-6, 1.3e-6];

fn shot(diffusivity: f64) -> ExperimentalData {
    let mut truth = problem(ProblemKind::Linearised, Dimension::One, 200);
    truth.set_value(K::Diffusivity, diffusivity).unwrap();
    let curve = solve(&truth, SchemeConfiguration::new(SchemeKind::Implicit).with_time_limit(1.0));
    measurement(&curve, 0.0, 2e-3, 0.02)
}

fn task(diffusivity: f64) -> SearchTask {
    SearchTask::from_data(
        Problem::default(),
        SchemeConfiguration::new(SchemeKind::Implicit),
        shot(diffusivity),
        SearchConfiguration::default().with_flags(vec![K::Diffusivity, K::MaxTemp]),
    )
    .unwrap()
}

#[test]
fn test_shots_are_fitted_in_parallel() {
    let manager = TaskManager::with_threads(2).unwrap();
    let ids: Vec<_> = DIFFUSIVITIES.iter().map(|&a| manager.add_task(task(a))).collect();

    assert_eq!(manager.execute_all(), 3);

    for (&id, &a) in ids.iter().zip(&DIFFUSIVITIES) {
        assert_eq!(manager.status(id), Some(TaskStatus::Done));
        let result = manager.result(id).unwrap();
        let fitted = result.get(K::Diffusivity).unwrap().value();
        assert!(relative_error(fitted, a) < 2e-2, "{}: {} vs {}", id, fitted, a);
    }
    assert_eq!(manager.results().len(), 3);

    // finished tasks run again on request
    assert_eq!(manager.execute_all(), 3);
}

#[test]
fn test_background_execution_reports_completion() {
    let manager = TaskManager::with_threads(1).unwrap();
    let (tx, rx) = mpsc::channel();
    let tx = std::sync::Mutex::new(tx);
    manager.add_listener(move |event| {
        if let TaskEvent::StatusChanged { id, status } = event
            && status.is_finished()
        {
            let _ = tx.lock().unwrap().send((*id, status.clone()));
        }
    });

    let id = manager.add_task(task(1.0e-6));
    manager.execute(id).unwrap();

    let (finished, status) = rx.recv_timeout(Duration::from_secs(300)).unwrap();
    assert_eq!(finished, id);
    assert_eq!(status, TaskStatus::Done);
    assert!(manager.result(id).is_some());
}
