//! Progress channel and reporting routine
//!
//! Workers never draw anything themselves. They push small events onto two
//! queues and a single reporter thread turns those into rows on screen:
//!
//! ```text
//! worker ──started(task_id, total)──▶ registration queue ─┐
//!                                                          ├──▶ Reporter ──▶ ProgressDisplay
//! worker ──step / finished─────────▶ progress queue ──────┘
//! ```
//!
//! The reporter waits on the progress queue for at most the idle timeout. Silence
//! for that long means no more work is coming and the display is closed. The
//! coordinator also signals shutdown once every worker has joined, so a long
//! idle timeout never delays the caller.

pub mod channel;
pub mod display;
pub mod reporter;

pub use channel::{ProgressEvent, Registration, ReporterInbox, ReporterShutdown, WorkerProgress};
pub use display::{IndicatifDisplay, ProgressDisplay};
pub use reporter::{Reporter, ReporterExit};
