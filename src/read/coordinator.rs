use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::read::{CleanupFn, CompletionFn, IoStatus, ReadBackend, SharedReadRequest};
use crate::stats::{ReadStats, TracingStats};

// One suspended lookup flow: the reads it issued and the continuation
// that resumes it once they are all populated. A submission that failed
// leaves its handle and cleanup slots None, in lockstep.
struct Waiter<'env, H> {
    requests: Vec<SharedReadRequest>,
    handles: Vec<Option<H>>,
    cleanups: Vec<Option<CleanupFn>>,
    resume: Box<dyn FnOnce() + 'env>,
}

/// Aggregates read requests from many logically concurrent, individually
/// suspended lookup flows, then drains them with one combined wait.
///
/// `enqueue` submits a flow's requests immediately and stores its
/// continuation; `wait` polls the union of every outstanding handle in a
/// single backend call and resumes the flows strictly in enqueue order,
/// each with its results already populated.
///
/// Single-threaded cooperative: exactly one logical thread drives
/// enqueue and wait. The state machine is `Idle → Accumulating` (first
/// enqueue) `→ Draining` (wait) `→ Idle`; enqueueing during a drain is
/// rejected. The `'env` lifetime bounds the continuations, so a waiter
/// cannot outlive state it borrows (a batch context, for instance).
pub struct ReadCoordinator<'env, B: ReadBackend> {
    backend: RefCell<B>,
    waiters: RefCell<VecDeque<Waiter<'env, B::Handle>>>,
    // Outstanding request count across all pending waiters.
    num_reqs: Cell<u64>,
    draining: Cell<bool>,
    stats: Box<dyn ReadStats>,
}

impl<'env, B: ReadBackend> ReadCoordinator<'env, B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: RefCell::new(backend),
            waiters: RefCell::new(VecDeque::new()),
            num_reqs: Cell::new(0),
            draining: Cell::new(false),
            stats: Box::new(TracingStats),
        }
    }

    /// Replaces the diagnostics hook.
    pub fn with_stats(mut self, stats: Box<dyn ReadStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Outstanding requests across all pending waiters.
    pub fn pending_requests(&self) -> u64 {
        self.num_reqs.get()
    }

    pub fn pending_waiters(&self) -> usize {
        self.waiters.borrow().len()
    }

    /// Suspends a flow: appends its waiter and submits every request to
    /// the backend right away, each with a completion that copies the
    /// outcome into that request's slots.
    ///
    /// A submission failure is not dropped: it lands in that request's
    /// status slot and the rest of the set proceeds. The flow must not
    /// touch its requests again until `wait` has resumed it.
    pub fn enqueue(
        &self,
        requests: Vec<SharedReadRequest>,
        resume: Box<dyn FnOnce() + 'env>,
    ) -> Result<()> {
        if self.draining.get() {
            return Err(Error::EnqueueDuringDrain);
        }

        self.num_reqs.set(self.num_reqs.get() + requests.len() as u64);

        let mut handles = Vec::with_capacity(requests.len());
        let mut cleanups = Vec::with_capacity(requests.len());
        {
            let mut backend = self.backend.borrow_mut();
            for req in &requests {
                let slot = Rc::clone(req);
                let done: CompletionFn = Box::new(move |outcome| {
                    let mut req = slot.borrow_mut();
                    match outcome {
                        Ok(data) => {
                            req.result = Some(data);
                            req.status = IoStatus::Done;
                        }
                        Err(err) => {
                            req.status = IoStatus::Failed(err);
                        }
                    }
                });

                let submitted = {
                    let req_ref = req.borrow();
                    backend.submit(&req_ref, done)
                };
                match submitted {
                    Ok((handle, cleanup)) => {
                        handles.push(Some(handle));
                        cleanups.push(Some(cleanup));
                    }
                    Err(err) => {
                        req.borrow_mut().status = IoStatus::Failed(err);
                        handles.push(None);
                        cleanups.push(None);
                    }
                }
            }
        }

        self.waiters.borrow_mut().push_back(Waiter {
            requests,
            handles,
            cleanups,
            resume,
        });
        Ok(())
    }

    /// Drains every pending waiter. No-op with none pending (or during
    /// the drain already in progress, where completion is guaranteed).
    ///
    /// Issues exactly one combined poll for all outstanding handles,
    /// records the wait and the request count to diagnostics, then runs
    /// each waiter's cleanups and continuation in FIFO enqueue order.
    /// A poll failure is copied into every still-pending request's
    /// status slot; the drain itself never aborts.
    pub fn wait(&self) {
        if self.draining.get() || self.waiters.borrow().is_empty() {
            return;
        }
        self.draining.set(true);

        let poll_outcome = {
            let waiters = self.waiters.borrow();
            let handles: Vec<&B::Handle> = waiters
                .iter()
                .flat_map(|w| w.handles.iter().filter_map(Option::as_ref))
                .collect();
            if handles.is_empty() {
                Ok(())
            } else {
                let started = Instant::now();
                let outcome = self.backend.borrow_mut().poll_all(&handles);
                self.stats.record_poll_wait(started.elapsed());
                outcome
            }
        };

        if let Err(err) = poll_outcome {
            let msg = err.to_string();
            let waiters = self.waiters.borrow();
            for waiter in waiters.iter() {
                for req in &waiter.requests {
                    let mut req = req.borrow_mut();
                    if req.status.is_pending() {
                        req.status = IoStatus::Failed(Error::ReadFailed(msg.clone()));
                    }
                }
            }
        }

        loop {
            let waiter = {
                let mut waiters = self.waiters.borrow_mut();
                match waiters.pop_front() {
                    Some(waiter) => waiter,
                    None => break,
                }
            };

            debug_assert_eq!(waiter.handles.len(), waiter.cleanups.len());
            for (handle, cleanup) in waiter.handles.into_iter().zip(waiter.cleanups) {
                debug_assert_eq!(
                    handle.is_some(),
                    cleanup.is_some(),
                    "io handle and its cleanup must be paired"
                );
                if let (Some(_), Some(cleanup)) = (handle, cleanup) {
                    cleanup();
                }
            }
            (waiter.resume)();
        }

        self.stats.record_batch_size(self.num_reqs.get() as usize);
        self.num_reqs.set(0);
        self.draining.set(false);
    }
}
