//! Parallel execution of search tasks
//!
//! The manager owns a rayon pool and the shared state the workers report into:
//! the task registry, per-task status and cancellation token, the result map,
//! the listeners and the material tables. Every map sits behind its own
//! `RwLock`; the listener list is replaced wholesale on registration, so that
//! notifications iterate a snapshot without holding a lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;

use log::{debug, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::solver::CancellationToken;
use crate::tasks::result::{FitResult, MaterialData};
use crate::tasks::status::TaskStatus;
use crate::tasks::task::{SearchTask, TaskError, TaskId};

/// Callback receiving every [`TaskEvent`]
///
/// Listeners run on the thread that caused the event, usually a worker.
pub type Listener = Arc<dyn Fn(&TaskEvent) + Send + Sync>;

/// Change reported to listeners
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    StatusChanged { id: TaskId, status: TaskStatus },
    /// A result was stored; the `Done` status follows
    ResultStored { id: TaskId },
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone)]
struct Entry {
    task: Arc<Mutex<SearchTask>>,
    token: CancellationToken,
}

#[derive(Default)]
struct Shared {
    tasks: RwLock<HashMap<TaskId, Entry>>,
    statuses: RwLock<HashMap<TaskId, TaskStatus>>,
    results: RwLock<HashMap<TaskId, FitResult>>,
    listeners: RwLock<Arc<Vec<Listener>>>,
    material: RwLock<Option<Arc<MaterialData>>>,
    next_id: AtomicU64,
}

impl Shared {
    fn notify(&self, event: &TaskEvent) {
        let listeners = Arc::clone(&read(&self.listeners));
        for listener in listeners.iter() {
            listener(event);
        }
    }

    fn set_status(&self, id: TaskId, status: TaskStatus) {
        write(&self.statuses).insert(id, status.clone());
        self.notify(&TaskEvent::StatusChanged { id, status });
    }

    /// Mark the task queued, unless it is unknown or already active
    ///
    /// The token is cleared before `Queued` becomes visible, so a cancel that
    /// sees the task queued always reaches its run.
    fn queue(&self, id: TaskId) -> Result<(), TaskError> {
        {
            let mut statuses = write(&self.statuses);
            let status = statuses.get_mut(&id).ok_or(TaskError::UnknownTask(id))?;
            if status.is_active() {
                return Err(TaskError::Busy(id));
            }
            if let Some(entry) = read(&self.tasks).get(&id) {
                entry.token.reset();
            }
            *status = TaskStatus::Queued;
        }
        write(&self.results).remove(&id);
        self.notify(&TaskEvent::StatusChanged { id, status: TaskStatus::Queued });
        Ok(())
    }

    /// Body of one unit of work on the pool
    fn run(&self, id: TaskId) {
        let Some(entry) = read(&self.tasks).get(&id).cloned() else {
            return;
        };
        self.set_status(id, TaskStatus::InProgress);
        let material = read(&self.material).clone();

        let outcome = lock(&entry.task).run(&entry.token, material.as_deref());
        match outcome {
            Ok(result) => {
                write(&self.results).insert(id, result);
                self.notify(&TaskEvent::ResultStored { id });
                self.set_status(id, TaskStatus::Done);
            }
            Err(err) if err.is_cancelled() => {
                debug!("task {} terminated", id);
                self.set_status(id, TaskStatus::Terminated);
            }
            Err(err) => {
                warn!("task {} failed: {}", id, err);
                self.set_status(id, TaskStatus::ExecutionError(err.to_string()));
            }
        }
    }
}

/// Registry and worker pool of search tasks
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::mpsc;
/// use pulse_rs::tasks::{SearchTask, TaskEvent, TaskManager, TaskStatus};
/// # fn task() -> SearchTask { unimplemented!() }
///
/// let manager = TaskManager::new().unwrap();
/// let (tx, rx) = mpsc::channel();
/// let tx = std::sync::Mutex::new(tx);
/// manager.add_listener(move |event| {
///     if let TaskEvent::StatusChanged { id, status } = event
///         && status.is_finished()
///     {
///         let _ = tx.lock().unwrap().send(*id);
///     }
/// });
///
/// let id = manager.add_task(task());
/// manager.execute(id).unwrap();
/// let finished = rx.recv().unwrap();
/// assert_eq!(manager.status(finished), Some(TaskStatus::Done));
/// ```
pub struct TaskManager {
    pool: ThreadPool,
    shared: Arc<Shared>,
}

impl TaskManager {
    /// Manager with one worker per available core but one, and at least one
    pub fn new() -> Result<Self, TaskError> {
        let cores = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self::with_threads(cores.saturating_sub(1).max(1))
    }

    pub fn with_threads(threads: usize) -> Result<Self, TaskError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("pulse-worker-{}", i))
            .build()
            .map_err(|err| TaskError::Pool(err.to_string()))?;
        Ok(Self { pool, shared: Arc::new(Shared::default()) })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    // ====== Registry ======

    pub fn add_task(&self, task: SearchTask) -> TaskId {
        let id = TaskId(self.shared.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let entry = Entry {
            task: Arc::new(Mutex::new(task)),
            token: CancellationToken::new(),
        };
        write(&self.shared.tasks).insert(id, entry);
        self.shared.set_status(id, TaskStatus::Ready);
        id
    }

    /// Unregister an idle task and hand it back
    pub fn remove_task(&self, id: TaskId) -> Result<SearchTask, TaskError> {
        {
            let mut statuses = write(&self.shared.statuses);
            match statuses.get(&id) {
                None => return Err(TaskError::UnknownTask(id)),
                Some(status) if status.is_active() => return Err(TaskError::Busy(id)),
                Some(_) => statuses.remove(&id),
            };
        }
        write(&self.shared.results).remove(&id);
        let entry = write(&self.shared.tasks)
            .remove(&id)
            .ok_or(TaskError::UnknownTask(id))?;
        let task = lock(&entry.task).clone();
        Ok(task)
    }

    /// Registered ids in ascending order
    pub fn task_ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = read(&self.shared.tasks).keys().copied().collect();
        ids.sort();
        ids
    }

    /// Inspect or reconfigure an idle task
    pub fn with_task<R>(&self, id: TaskId, f: impl FnOnce(&mut SearchTask) -> R) -> Result<R, TaskError> {
        match self.status(id) {
            None => return Err(TaskError::UnknownTask(id)),
            Some(status) if status.is_active() => return Err(TaskError::Busy(id)),
            Some(_) => {}
        }
        let entry = read(&self.shared.tasks)
            .get(&id)
            .cloned()
            .ok_or(TaskError::UnknownTask(id))?;
        let mut task = lock(&entry.task);
        Ok(f(&mut task))
    }

    // ====== Execution ======

    /// Queue one task on the pool and return immediately
    pub fn execute(&self, id: TaskId) -> Result<(), TaskError> {
        self.shared.queue(id)?;
        let shared = Arc::clone(&self.shared);
        self.pool.spawn(move || shared.run(id));
        Ok(())
    }

    /// Run every idle task and block until all have finished
    ///
    /// Returns the number of tasks run.
    pub fn execute_all(&self) -> usize {
        let ids: Vec<TaskId> = self
            .task_ids()
            .into_iter()
            .filter(|&id| self.shared.queue(id).is_ok())
            .collect();
        let shared = &self.shared;
        self.pool.install(|| ids.par_iter().for_each(|&id| shared.run(id)));
        ids.len()
    }

    /// Ask a queued or running task to stop
    ///
    /// The task ends `Terminated` without a result. Idle tasks are unaffected.
    pub fn cancel(&self, id: TaskId) -> Result<(), TaskError> {
        // statuses before tasks, as in `queue`
        let statuses = read(&self.shared.statuses);
        let status = statuses.get(&id).ok_or(TaskError::UnknownTask(id))?;
        if status.is_active() {
            let tasks = read(&self.shared.tasks);
            let entry = tasks.get(&id).ok_or(TaskError::UnknownTask(id))?;
            entry.token.cancel();
        }
        Ok(())
    }

    pub fn cancel_all(&self) {
        for id in self.task_ids() {
            match self.cancel(id) {
                Ok(()) => {}
                // removed since the ids were listed
                Err(err) => debug!("cancel skipped task {}: {}", id, err),
            }
        }
    }

    /// Token polled by the task's run
    pub fn cancellation(&self, id: TaskId) -> Option<CancellationToken> {
        read(&self.shared.tasks).get(&id).map(|entry| entry.token.clone())
    }

    // ====== State ======

    pub fn status(&self, id: TaskId) -> Option<TaskStatus> {
        read(&self.shared.statuses).get(&id).cloned()
    }

    /// Result of the last run, present only once the task is `Done`
    pub fn result(&self, id: TaskId) -> Option<FitResult> {
        read(&self.shared.results).get(&id).cloned()
    }

    /// Every stored result, by ascending id
    pub fn results(&self) -> Vec<(TaskId, FitResult)> {
        let mut results: Vec<(TaskId, FitResult)> = read(&self.shared.results)
            .iter()
            .map(|(id, result)| (*id, result.clone()))
            .collect();
        results.sort_by_key(|(id, _)| *id);
        results
    }

    pub fn add_listener(&self, listener: impl Fn(&TaskEvent) + Send + Sync + 'static) {
        let mut listeners = write(&self.shared.listeners);
        let mut next: Vec<Listener> = listeners.as_ref().clone();
        next.push(Arc::new(listener));
        *listeners = Arc::new(next);
    }

    /// Specific heat and density tables used to derive the conductivity
    pub fn set_material(&self, material: MaterialData) {
        *write(&self.shared.material) = Some(Arc::new(material));
    }

    pub fn material(&self) -> Option<Arc<MaterialData>> {
        read(&self.shared.material).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::NumericPropertyKeyword as K;
    use crate::tasks::fixtures::task;
    use crate::tasks::status::Details;
    use std::sync::mpsc;

    fn manager() -> TaskManager {
        TaskManager::with_threads(2).unwrap()
    }

    #[test]
    fn test_execute_all_stores_results() {
        let manager = manager();
        let first = manager.add_task(task(vec![K::MaxTemp]));
        let second = manager.add_task(task(vec![K::Diffusivity, K::MaxTemp]));
        assert_eq!(manager.status(first), Some(TaskStatus::Ready));

        assert_eq!(manager.execute_all(), 2);
        assert_eq!(manager.status(first), Some(TaskStatus::Done));
        assert_eq!(manager.status(second), Some(TaskStatus::Done));

        let results = manager.results();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, first);
        assert!(results[1].1.get(K::Diffusivity).is_some());
    }

    #[test]
    fn test_execute_reports_through_listeners() {
        let manager = manager();
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        manager.add_listener(move |event| {
            let _ = lock(&tx).send(event.clone());
        });

        let id = manager.add_task(task(vec![K::MaxTemp]));
        manager.execute(id).unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.recv() {
            let done = event == TaskEvent::StatusChanged { id, status: TaskStatus::Done };
            events.push(event);
            if done {
                break;
            }
        }
        assert_eq!(events[0], TaskEvent::StatusChanged { id, status: TaskStatus::Ready });
        assert!(events.contains(&TaskEvent::StatusChanged { id, status: TaskStatus::InProgress }));
        assert!(events.contains(&TaskEvent::ResultStored { id }));
        assert!(manager.result(id).is_some());
    }

    #[test]
    fn test_cancelled_task_is_terminated_without_result() {
        let manager = manager();
        let id = manager.add_task(task(vec![K::Diffusivity]));
        let token = manager.cancellation(id).unwrap();
        manager.add_listener(move |event| {
            if matches!(event, TaskEvent::StatusChanged { status: TaskStatus::InProgress, .. }) {
                token.cancel();
            }
        });

        manager.execute_all();
        assert_eq!(manager.status(id), Some(TaskStatus::Terminated));
        assert!(manager.result(id).is_none());
    }

    /// Single worker reporting finished statuses on a channel
    fn reporting_manager() -> (TaskManager, mpsc::Receiver<(TaskId, TaskStatus)>) {
        let manager = TaskManager::with_threads(1).unwrap();
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        manager.add_listener(move |event| {
            if let TaskEvent::StatusChanged { id, status } = event
                && status.is_finished()
            {
                let _ = lock(&tx).send((*id, status.clone()));
            }
        });
        (manager, rx)
    }

    fn wait_for(rx: &mpsc::Receiver<(TaskId, TaskStatus)>, id: TaskId) -> TaskStatus {
        loop {
            let (finished, status) = rx.recv().unwrap();
            if finished == id {
                return status;
            }
        }
    }

    #[test]
    fn test_cancel_right_after_execute_terminates() {
        let (manager, rx) = reporting_manager();
        let busy = manager.add_task(task(vec![K::Diffusivity, K::MaxTemp]));
        let id = manager.add_task(task(vec![K::Diffusivity]));

        // the only worker is taken, so `id` is still queued when cancelled
        manager.execute(busy).unwrap();
        manager.execute(id).unwrap();
        manager.cancel(id).unwrap();

        assert_eq!(wait_for(&rx, id), TaskStatus::Terminated);
        assert!(manager.result(id).is_none());

        // a new run starts from a cleared token
        manager.execute(id).unwrap();
        assert_eq!(wait_for(&rx, id), TaskStatus::Done);
        assert!(manager.result(id).is_some());
    }

    #[test]
    fn test_cancel_all_stops_active_tasks_and_skips_idle_ones() {
        let (manager, rx) = reporting_manager();
        let first = manager.add_task(task(vec![K::Diffusivity, K::MaxTemp]));
        let second = manager.add_task(task(vec![K::Diffusivity]));
        let idle = manager.add_task(task(vec![K::MaxTemp]));

        manager.execute(first).unwrap();
        manager.execute(second).unwrap();
        manager.cancel_all();

        assert_eq!(wait_for(&rx, first), TaskStatus::Terminated);
        assert_eq!(wait_for(&rx, second), TaskStatus::Terminated);
        assert_eq!(manager.status(idle), Some(TaskStatus::Ready));
        assert!(!manager.cancellation(idle).unwrap().is_cancelled());
        assert_eq!(manager.cancel(TaskId(99)), Err(TaskError::UnknownTask(TaskId(99))));
    }

    #[test]
    fn test_material_reaches_the_fit() {
        let manager = manager();
        let cp = [(250.0, 700.0), (350.0, 700.0)].into_iter().collect();
        let rho = [(250.0, 2000.0), (350.0, 2000.0)].into_iter().collect();
        manager.set_material(MaterialData::new(cp, rho));

        let id = manager.add_task(task(vec![K::MaxTemp]));
        manager.execute_all();
        let result = manager.result(id).unwrap();
        assert!(result.get(K::Conductivity).is_some());
        assert!(!result.has(Details::InsufficientDataInProblemStatement));
    }

    #[test]
    fn test_failed_task_reports_execution_error() {
        let manager = manager();
        let id = manager.add_task(task(vec![K::MaxTemp]));
        manager
            .with_task(id, |task| {
                let time = task.data().time().to_vec();
                task.data_mut()
                    .set_range(crate::input::Range::new(time[0], time[1]))
                    .unwrap();
            })
            .unwrap();

        manager.execute_all();
        assert!(matches!(manager.status(id), Some(TaskStatus::ExecutionError(_))));
        assert!(manager.result(id).is_none());
    }

    #[test]
    fn test_registry_errors() {
        let manager = manager();
        assert_eq!(manager.execute(TaskId(7)), Err(TaskError::UnknownTask(TaskId(7))));
        assert!(matches!(manager.remove_task(TaskId(7)), Err(TaskError::UnknownTask(_))));

        let id = manager.add_task(task(vec![K::MaxTemp]));
        let removed = manager.remove_task(id).unwrap();
        assert_eq!(removed.search().flags, vec![K::MaxTemp]);
        assert!(manager.status(id).is_none());
        assert!(manager.task_ids().is_empty());
    }

    #[test]
    fn test_pool_is_never_empty() {
        assert_eq!(TaskManager::with_threads(0).unwrap().threads(), 1);
        assert!(TaskManager::new().unwrap().threads() >= 1);
    }
}
