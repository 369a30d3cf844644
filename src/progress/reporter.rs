use super::channel::{ProgressEvent, Registration, ReporterInbox};
use super::display::ProgressDisplay;
use crossbeam::select;
use std::collections::HashSet;
use std::time::Duration;

/// Why the reporting routine stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterExit {
    /// Nothing arrived on the progress queue within the idle timeout
    Idle,
    /// The coordinator asked it to stop; events already queued are still applied
    Shutdown,
    /// Every worker dropped its sender and the queue is drained
    Disconnected,
}

enum Wake {
    Event(ProgressEvent),
    Exit(ReporterExit),
}

/// Single consumer of the progress channel
///
/// Registrations are always drained before a progress event is applied, so a
/// task's row exists before its first step is drawn. Steps and finishes for a
/// task that never registered are ignored.
pub struct Reporter<D> {
    inbox: ReporterInbox,
    task_sizes: Vec<usize>,
    display: D,
    idle_timeout: Duration,
    active: HashSet<usize>,
}

impl<D: ProgressDisplay> Reporter<D> {
    /// `task_sizes[task_id]` is the item count of that task; ids are dense from 0.
    pub fn new(
        inbox: ReporterInbox,
        task_sizes: Vec<usize>,
        display: D,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            inbox,
            task_sizes,
            display,
            idle_timeout,
            active: HashSet::new(),
        }
    }

    pub fn run(&mut self) -> ReporterExit {
        let exit = loop {
            self.drain_registrations();

            let wake = select! {
                recv(self.inbox.events) -> event => match event {
                    Ok(event) => Wake::Event(event),
                    Err(_) => Wake::Exit(ReporterExit::Disconnected),
                },
                recv(self.inbox.shutdown) -> _ => Wake::Exit(ReporterExit::Shutdown),
                default(self.idle_timeout) => Wake::Exit(ReporterExit::Idle),
            };

            match wake {
                Wake::Event(event) => {
                    self.drain_registrations();
                    self.apply(event);
                }
                Wake::Exit(ReporterExit::Shutdown) => {
                    self.drain_pending();
                    break ReporterExit::Shutdown;
                }
                Wake::Exit(exit) => break exit,
            }
        };

        self.display.finish();
        tracing::debug!(
            "Progress reporter stopped ({:?}, {} rows still open)",
            exit,
            self.active.len()
        );
        exit
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    fn drain_registrations(&mut self) {
        while let Ok(registration) = self.inbox.registrations.try_recv() {
            self.register(registration);
        }
    }

    /// Apply whatever the workers sent before the coordinator asked us to stop
    fn drain_pending(&mut self) {
        self.drain_registrations();
        while let Ok(event) = self.inbox.events.try_recv() {
            self.apply(event);
        }
    }

    fn register(&mut self, registration: Registration) {
        let total = self
            .task_sizes
            .get(registration.task_id)
            .copied()
            .unwrap_or(registration.total);

        if self.active.insert(registration.task_id) {
            self.display
                .add_row(registration.task_id, total, self.task_sizes.len());
        }
    }

    fn apply(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::Step { task_id, index } => {
                if self.active.contains(&task_id) {
                    self.display.set_completed(task_id, index + 1);
                }
            }
            ProgressEvent::Finished { task_id } => {
                if self.active.remove(&task_id) {
                    self.display.remove_row(task_id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::channel;
    use std::time::Instant;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Add { task_id: usize, total: usize, of: usize },
        Set { task_id: usize, completed: usize },
        Remove { task_id: usize },
        Finish,
    }

    #[derive(Default)]
    struct RecordingDisplay {
        ops: Vec<Op>,
    }

    impl ProgressDisplay for RecordingDisplay {
        fn add_row(&mut self, task_id: usize, total: usize, total_batches: usize) {
            self.ops.push(Op::Add {
                task_id,
                total,
                of: total_batches,
            });
        }

        fn set_completed(&mut self, task_id: usize, completed: usize) {
            self.ops.push(Op::Set { task_id, completed });
        }

        fn remove_row(&mut self, task_id: usize) {
            self.ops.push(Op::Remove { task_id });
        }

        fn finish(&mut self) {
            self.ops.push(Op::Finish);
        }
    }

    #[test]
    fn test_protocol_for_one_task() {
        let (progress, inbox, _shutdown) = channel::open();
        progress.started(0, 25);
        progress.step(0, 0);
        progress.step(0, 10);
        progress.finished(0);
        drop(progress);

        let mut reporter = Reporter::new(
            inbox,
            vec![25, 5],
            RecordingDisplay::default(),
            Duration::from_secs(5),
        );
        assert_eq!(reporter.run(), ReporterExit::Disconnected);
        assert_eq!(
            reporter.display().ops,
            vec![
                Op::Add { task_id: 0, total: 25, of: 2 },
                Op::Set { task_id: 0, completed: 1 },
                Op::Set { task_id: 0, completed: 11 },
                Op::Remove { task_id: 0 },
                Op::Finish,
            ]
        );
    }

    #[test]
    fn test_events_for_unregistered_tasks_are_ignored() {
        let (progress, inbox, _shutdown) = channel::open();
        progress.step(4, 3);
        progress.finished(4);
        drop(progress);

        let mut reporter = Reporter::new(
            inbox,
            vec![1],
            RecordingDisplay::default(),
            Duration::from_secs(5),
        );
        reporter.run();
        assert_eq!(reporter.display().ops, vec![Op::Finish]);
    }

    #[test]
    fn test_registration_total_used_outside_known_sizes() {
        let (progress, inbox, _shutdown) = channel::open();
        progress.started(2, 7);
        drop(progress);

        let mut reporter = Reporter::new(
            inbox,
            Vec::new(),
            RecordingDisplay::default(),
            Duration::from_secs(5),
        );
        reporter.run();
        assert_eq!(
            reporter.display().ops[0],
            Op::Add { task_id: 2, total: 7, of: 0 }
        );
    }

    #[test]
    fn test_idle_timeout_stops_reporter() {
        let (progress, inbox, _shutdown) = channel::open();
        let mut reporter = Reporter::new(
            inbox,
            vec![10],
            RecordingDisplay::default(),
            Duration::from_millis(50),
        );

        let start = Instant::now();
        assert_eq!(reporter.run(), ReporterExit::Idle);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(250), "idled for {elapsed:?}");
        drop(progress);
    }

    #[test]
    fn test_idle_exit_follows_last_finished_event() {
        let idle = Duration::from_millis(100);
        let (progress, inbox, _shutdown) = channel::open();
        let mut reporter = Reporter::new(inbox, vec![2, 2], RecordingDisplay::default(), idle);
        let handle = std::thread::spawn(move || {
            let exit = reporter.run();
            (exit, Instant::now(), reporter)
        });

        // keep each gap well inside the idle window
        progress.started(0, 2);
        progress.step(0, 0);
        std::thread::sleep(Duration::from_millis(40));
        progress.finished(0);
        std::thread::sleep(Duration::from_millis(40));
        progress.started(1, 2);
        progress.finished(1);
        let last_event = Instant::now();

        let (exit, stopped_at, reporter) = handle.join().unwrap();
        assert_eq!(exit, ReporterExit::Idle);
        let quiet_for = stopped_at.duration_since(last_event);
        assert!(quiet_for < idle * 3, "stopped {quiet_for:?} after the last event");
        assert_eq!(
            reporter.display().ops,
            vec![
                Op::Add { task_id: 0, total: 2, of: 2 },
                Op::Set { task_id: 0, completed: 1 },
                Op::Remove { task_id: 0 },
                Op::Add { task_id: 1, total: 2, of: 2 },
                Op::Remove { task_id: 1 },
                Op::Finish,
            ]
        );
        drop(progress);
    }

    #[test]
    fn test_shutdown_applies_queued_events() {
        let (progress, inbox, shutdown) = channel::open();
        progress.started(0, 3);
        progress.step(0, 2);
        progress.finished(0);
        shutdown.signal();

        let mut reporter = Reporter::new(
            inbox,
            vec![3],
            RecordingDisplay::default(),
            Duration::from_secs(30),
        );
        reporter.run();
        assert_eq!(
            reporter.display().ops,
            vec![
                Op::Add { task_id: 0, total: 3, of: 1 },
                Op::Set { task_id: 0, completed: 3 },
                Op::Remove { task_id: 0 },
                Op::Finish,
            ]
        );
        drop(progress);
    }

    #[test]
    fn test_shutdown_signal_stops_reporter() {
        let (progress, inbox, shutdown) = channel::open();
        let mut reporter = Reporter::new(
            inbox,
            vec![10],
            RecordingDisplay::default(),
            Duration::from_secs(30),
        );

        let handle = std::thread::spawn(move || reporter.run());
        shutdown.signal();
        assert_eq!(handle.join().unwrap(), ReporterExit::Shutdown);
        drop(progress);
    }
}
