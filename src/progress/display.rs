//! Rendering side of the reporting routine
//!
//! The reporter only speaks the row protocol below; how rows look is up to the
//! display. `IndicatifDisplay` draws one bar per running task.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;
use std::sync::LazyLock;

static ROW_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::with_template(
        "Process {prefix} {bar:40.cyan/blue} {percent:>3}% ({pos}/{len}) • {eta}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏  ")
});

/// A surface that shows one row per running task
pub trait ProgressDisplay {
    fn add_row(&mut self, task_id: usize, total: usize, total_batches: usize);

    fn set_completed(&mut self, task_id: usize, completed: usize);

    fn remove_row(&mut self, task_id: usize);

    /// Tear down whatever is still on screen
    fn finish(&mut self);
}

/// Multi-row terminal display backed by indicatif
pub struct IndicatifDisplay {
    multi_progress: MultiProgress,
    rows: HashMap<usize, ProgressBar>,
}

impl IndicatifDisplay {
    /// Draw to stderr at most `refresh_rate_hz` times per second.
    /// indicatif hides the output on its own when stderr is not a terminal.
    pub fn new(refresh_rate_hz: u8) -> Self {
        Self::with_target(ProgressDrawTarget::stderr_with_hz(refresh_rate_hz))
    }

    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        Self {
            multi_progress: MultiProgress::with_draw_target(target),
            rows: HashMap::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl ProgressDisplay for IndicatifDisplay {
    fn add_row(&mut self, task_id: usize, total: usize, total_batches: usize) {
        let bar = self.multi_progress.add(ProgressBar::new(total as u64));
        bar.set_style(ROW_STYLE.clone());
        bar.set_prefix(format!("{task_id}/{total_batches}"));
        self.rows.insert(task_id, bar);
    }

    fn set_completed(&mut self, task_id: usize, completed: usize) {
        if let Some(bar) = self.rows.get(&task_id) {
            bar.set_position(completed as u64);
        }
    }

    fn remove_row(&mut self, task_id: usize) {
        if let Some(bar) = self.rows.remove(&task_id) {
            bar.finish_and_clear();
            self.multi_progress.remove(&bar);
        }
    }

    fn finish(&mut self) {
        for (_, bar) in self.rows.drain() {
            bar.finish_and_clear();
        }
        let _ = self.multi_progress.clear();
    }
}
