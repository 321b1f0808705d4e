//! Inactivity reset timers
//!
//! Each dataset owns at most one [`ResetTimer`]. Arming a new timer replaces
//! the previous one, and dropping a timer aborts its task, so a dataset can
//! never have two pending resets.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

use super::{CursorStore, StoreInner};

/// Handle to one scheduled cursor reset.
#[derive(Debug)]
pub(crate) struct ResetTimer {
    handle: JoinHandle<()>,
}

impl ResetTimer {
    /// Schedule `expire` for `name` after `idle`.
    ///
    /// The task only holds a weak reference to the store and resets the cursor
    /// only while `generation` is still the dataset's current one.
    pub(crate) fn arm(
        store: Weak<StoreInner>,
        name: String,
        generation: u64,
        idle: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(idle).await;
            let Some(inner) = store.upgrade() else {
                return;
            };
            CursorStore { inner }.expire_armed(&name, generation).await;
        });
        trace!(generation, "reset timer armed");
        Self { handle }
    }

    /// Cancel the pending reset. No-op if it already fired.
    pub(crate) fn cancel(self) {
        drop(self);
    }
}

impl Drop for ResetTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
