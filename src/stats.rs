use std::time::Duration;

/// Diagnostics hook for the read coordinator: one sample per combined
/// poll for the wait duration and for the total request count drained.
pub trait ReadStats {
    fn record_poll_wait(&self, wait: Duration);
    fn record_batch_size(&self, num_reqs: usize);
}

/// Default hook: emits structured tracing events.
pub struct TracingStats;

impl ReadStats for TracingStats {
    fn record_poll_wait(&self, wait: Duration) {
        tracing::debug!(poll_wait_micros = wait.as_micros() as u64, "Combined read poll");
    }

    fn record_batch_size(&self, num_reqs: usize) {
        tracing::debug!(io_batch_size = num_reqs, "Read batch drained");
    }
}

/// Disables diagnostics collection.
pub struct NoopStats;

impl ReadStats for NoopStats {
    fn record_poll_wait(&self, _wait: Duration) {}

    fn record_batch_size(&self, _num_reqs: usize) {}
}
