//! Stack-safe driver for continuation-passing work
//!
//! [`trampoline`] runs a unit of work and hands it a [`Bouncer`]. Bouncing
//! while the loop is still running queues the next unit, which the loop then
//! runs iteratively, without a new stack frame. The bouncer may also be
//! stashed and bounced after the loop has exited (from a timer, another
//! thread, an I/O callback); in that case it starts a fresh loop right where
//! it is bounced.
//!
//! A bouncer is consumed by [`Bouncer::bounce`], so each unit of work can
//! request at most one follow-up. This keeps every step in tail position.
//!
//! ```compile_fail
//! use ricochet_core::trampoline::{trampoline, Thunk};
//!
//! trampoline(Thunk::new(|bouncer| {
//!     bouncer.bounce(Thunk::new(|_| {}));
//!     bouncer.bounce(Thunk::new(|_| {}));
//! }));
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

/// A unit of work runnable on the trampoline
pub trait Bounce: Sized + Send + 'static {
    /// Run this step; request the next one through `bouncer`
    fn run(self, bouncer: Bouncer<Self>);
}

/// What the loop knows about the step it is running
enum Slot<W> {
    /// The step is still on the loop's stack
    Running,
    /// The step requested more work synchronously
    More(W),
    /// The loop exited without more work; a bounce starts a new loop
    Done,
    /// The request was taken
    Spent,
}

/// One-shot handle for requesting the next unit of work
pub struct Bouncer<W: Bounce> {
    slot: Arc<Mutex<Slot<W>>>,
}

impl<W: Bounce> Bouncer<W> {
    /// Request `work` as the follow-up to the current step
    ///
    /// If the loop that issued this bouncer is still running, the work is
    /// queued and run iteratively by that loop. Otherwise a new trampoline
    /// is started on the caller's stack.
    ///
    /// # Panics
    ///
    /// Panics if the slot already holds a request. Bouncers are move-only,
    /// so this only fires if work is requested twice for one step.
    pub fn bounce(self, work: W) {
        let mut slot = self.slot.lock();
        match std::mem::replace(&mut *slot, Slot::Spent) {
            Slot::Running => *slot = Slot::More(work),
            Slot::Done => {
                drop(slot);
                trace!("bounced after loop exit, resuming on a new trampoline");
                trampoline(work);
            }
            Slot::More(_) | Slot::Spent => {
                panic!("bouncer already bounced, refusing a second unit of work")
            }
        }
    }
}

impl<W: Bounce> fmt::Debug for Bouncer<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.slot.lock() {
            Slot::Running => "running",
            Slot::More(_) => "bounced",
            Slot::Done => "detached",
            Slot::Spent => "spent",
        };
        f.debug_struct("Bouncer").field("state", &state).finish()
    }
}

/// Run `work` and every follow-up it requests while the loop is live
pub fn trampoline<W: Bounce>(work: W) {
    let mut work = work;
    let mut steps = 0_usize;
    loop {
        let slot = Arc::new(Mutex::new(Slot::Running));
        work.run(Bouncer {
            slot: Arc::clone(&slot),
        });
        steps += 1;

        let mut state = slot.lock();
        match std::mem::replace(&mut *state, Slot::Spent) {
            Slot::More(next) => work = next,
            Slot::Running => {
                *state = Slot::Done;
                trace!(steps, "trampoline finished");
                return;
            }
            Slot::Done | Slot::Spent => return,
        }
    }
}

type ThunkFn = dyn FnOnce(Bouncer<Thunk>) + Send;

/// Closure-shaped work for ad-hoc trampolining
pub struct Thunk(Box<ThunkFn>);

impl Thunk {
    /// Wrap a closure as a trampoline step
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Bouncer<Thunk>) + Send + 'static,
    {
        Self(Box::new(f))
    }
}

impl Bounce for Thunk {
    fn run(self, bouncer: Bouncer<Self>) {
        (self.0)(bouncer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn countdown(remaining: usize, hits: Arc<AtomicUsize>) -> Thunk {
        Thunk::new(move |bouncer| {
            hits.fetch_add(1, Ordering::SeqCst);
            if remaining > 0 {
                bouncer.bounce(countdown(remaining - 1, hits));
            }
        })
    }

    #[test]
    fn test_synchronous_bounces_are_iterative() {
        let hits = Arc::new(AtomicUsize::new(0));
        trampoline(countdown(200_000, Arc::clone(&hits)));
        assert_eq!(hits.load(Ordering::SeqCst), 200_001);
    }

    #[test]
    fn test_bounce_after_exit_starts_new_loop() {
        let parked: Arc<Mutex<Option<Bouncer<Thunk>>>> = Arc::new(Mutex::new(None));
        let log = Arc::new(Mutex::new(Vec::new()));

        let stash = Arc::clone(&parked);
        let first = Arc::clone(&log);
        trampoline(Thunk::new(move |bouncer| {
            first.lock().push("first");
            *stash.lock() = Some(bouncer);
        }));
        assert_eq!(*log.lock(), vec!["first"]);

        let bouncer = parked.lock().take().unwrap();
        let second = Arc::clone(&log);
        bouncer.bounce(Thunk::new(move |next| {
            second.lock().push("second");
            let third = Arc::clone(&second);
            next.bounce(Thunk::new(move |_| third.lock().push("third")));
        }));

        // The resumed loop ran to completion before bounce returned
        assert_eq!(*log.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_work_bounced_mid_step_runs_after_step_returns() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let outer = Arc::clone(&log);
        trampoline(Thunk::new(move |bouncer| {
            let inner = Arc::clone(&outer);
            bouncer.bounce(Thunk::new(move |_| inner.lock().push("bounced")));
            outer.lock().push("after bounce");
        }));
        assert_eq!(*log.lock(), vec!["after bounce", "bounced"]);
    }

    #[test]
    fn test_dropped_bouncer_ends_loop() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        trampoline(Thunk::new(move |bouncer| {
            counter.fetch_add(1, Ordering::SeqCst);
            drop(bouncer);
        }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[should_panic(expected = "already bounced")]
    fn test_second_request_on_one_slot_is_fatal() {
        let slot = Arc::new(Mutex::new(Slot::Running));
        let first = Bouncer::<Thunk> {
            slot: Arc::clone(&slot),
        };
        let second = Bouncer::<Thunk> { slot };
        first.bounce(Thunk::new(|_| {}));
        second.bounce(Thunk::new(|_| {}));
    }
}
