//! Progress bar for the batch being scanned.

use kdam::{Animation, Bar, BarExt};
use std::sync::Mutex;

use crate::Batch;
use crate::utils::logger::Reporter;

/// Create a bar sized to `total` candidates.
pub fn create_progress_bar(total: usize, desc: String) -> Bar {
    kdam::tqdm!(
        total = total,
        desc = desc,
        animation = Animation::Classic,
        unit = " codes"
    )
}

/// Wraps another [`Reporter`] and drives one kdam bar per checked-out batch.
/// Meant for a single worker; concurrent workers would fight over the bar.
pub struct BarReporter<R> {
    inner: R,
    bar: Mutex<Option<Bar>>,
}

impl<R: Reporter> BarReporter<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            bar: Mutex::new(None),
        }
    }
}

impl<R: Reporter> Reporter for BarReporter<R> {
    fn info(&self, msg: &str) {
        self.inner.info(msg);
    }

    fn success(&self, msg: &str) {
        self.inner.success(msg);
    }

    fn skip(&self, msg: &str) {
        self.inner.skip(msg);
    }

    fn error(&self, msg: &str) {
        self.inner.error(msg);
    }

    fn batch_started(&self, batch: &Batch) {
        let bar = create_progress_bar(
            batch.range.len() as usize,
            format!("Batch {:>3}", batch.index),
        );
        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn progress(&self, _batch: &Batch, _current: &str, tested: u64) {
        // try_lock: never stall the scan for a redraw
        if let Ok(mut slot) = self.bar.try_lock()
            && let Some(bar) = slot.as_mut()
        {
            let _ = bar.update_to(tested as usize);
        }
    }

    fn batch_finished(&self, _batch: &Batch) {
        if let Ok(mut slot) = self.bar.lock()
            && let Some(mut bar) = slot.take()
        {
            let _ = bar.clear();
        }
    }
}
