use crossbeam::channel::{Receiver, Sender, bounded, unbounded};

/// Announces that a task has started, with the number of items it will process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub task_id: usize,
    pub total: usize,
}

/// Per-task progress carried on the progress queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// `index` is the local offset, within the batch, of the item that triggered the step
    Step { task_id: usize, index: usize },
    Finished { task_id: usize },
}

/// Sending half handed to every worker
///
/// Sends never block and never fail loudly: once the reporter has gone away the
/// events are simply discarded.
#[derive(Debug, Clone)]
pub struct WorkerProgress {
    registrations: Sender<Registration>,
    events: Sender<ProgressEvent>,
}

impl WorkerProgress {
    pub fn started(&self, task_id: usize, total: usize) {
        let _ = self.registrations.send(Registration { task_id, total });
    }

    pub fn step(&self, task_id: usize, index: usize) {
        let _ = self.events.send(ProgressEvent::Step { task_id, index });
    }

    pub fn finished(&self, task_id: usize) {
        let _ = self.events.send(ProgressEvent::Finished { task_id });
    }
}

/// Receiving half owned by the reporting routine
#[derive(Debug)]
pub struct ReporterInbox {
    pub(crate) registrations: Receiver<Registration>,
    pub(crate) events: Receiver<ProgressEvent>,
    pub(crate) shutdown: Receiver<()>,
}

/// Held by the coordinator to stop the reporter once the pool has joined
#[derive(Debug)]
pub struct ReporterShutdown {
    tx: Sender<()>,
}

impl ReporterShutdown {
    pub fn signal(self) {
        let _ = self.tx.send(());
    }
}

/// Opens the registration queue, the progress queue, and the shutdown signal
pub fn open() -> (WorkerProgress, ReporterInbox, ReporterShutdown) {
    let (reg_tx, reg_rx) = unbounded();
    let (event_tx, event_rx) = unbounded();
    let (shutdown_tx, shutdown_rx) = bounded(1);

    (
        WorkerProgress {
            registrations: reg_tx,
            events: event_tx,
        },
        ReporterInbox {
            registrations: reg_rx,
            events: event_rx,
            shutdown: shutdown_rx,
        },
        ReporterShutdown { tx: shutdown_tx },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_arrive_on_their_own_queues() {
        let (progress, inbox, _shutdown) = open();

        progress.started(3, 100);
        progress.step(3, 10);
        progress.finished(3);

        assert_eq!(
            inbox.registrations.try_recv().unwrap(),
            Registration { task_id: 3, total: 100 }
        );
        assert!(inbox.registrations.try_recv().is_err());
        assert_eq!(
            inbox.events.try_recv().unwrap(),
            ProgressEvent::Step { task_id: 3, index: 10 }
        );
        assert_eq!(
            inbox.events.try_recv().unwrap(),
            ProgressEvent::Finished { task_id: 3 }
        );
    }

    #[test]
    fn test_sending_after_reporter_dropped_is_silent() {
        let (progress, inbox, _shutdown) = open();
        drop(inbox);

        progress.started(0, 1);
        progress.step(0, 0);
        progress.finished(0);
    }

    #[test]
    fn test_shutdown_signal_is_received() {
        let (_progress, inbox, shutdown) = open();
        shutdown.signal();
        assert!(inbox.shutdown.try_recv().is_ok());
    }
}
