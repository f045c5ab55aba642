// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Per-thread listener sets and their process-wide aggregation.
//!
//! Every execution thread gets its own listener set, created lazily on first
//! use. Creating one also appends it to the shared [`Registry`], which is the
//! only mutable state shared between threads and is read once, when the final
//! reports are generated.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{config::Config, error::ReportResult, sink::EventSink};

/// Listener set of a single execution thread.
pub trait Listeners: EventSink {
    /// Outcome of a single finished test.
    type Outcome: Clone;

    /// Outcomes of every test finished so far.
    #[must_use]
    fn outcomes(&self) -> Vec<Self::Outcome>;
}

/// Producer of the final report artifacts.
pub trait ReportService<Outcome> {
    /// Generates reports for the given `outcomes` of the whole run.
    ///
    /// # Errors
    ///
    /// If the reports cannot be produced.
    fn generate(&self, outcomes: &[Outcome]) -> ReportResult<()>;
}

/// Reporting engine creating per-thread [`Listeners`] and [`ReportService`]s.
pub trait Engine: Send + Sync {
    /// [`Listeners`] of a single execution thread.
    type Listeners: Listeners + Send;

    /// [`ReportService`] of a single execution thread.
    type Reports: ReportService<Outcome<Self>>;

    /// Creates a new listener set.
    fn setup_listeners(&self, config: &Config) -> Self::Listeners;

    /// Creates a new report service.
    fn report_service(&self, config: &Config) -> Self::Reports;
}

/// Shorthand for the [`Listeners::Outcome`] of an [`Engine`].
pub type Outcome<E> = <<E as Engine>::Listeners as Listeners>::Outcome;

/// Shared handle to a listener set.
pub type Shared<L> = Arc<Mutex<L>>;

/// Locks the given `mutex`, ignoring poisoning.
///
/// A panic on one thread must not prevent others from reporting.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-wide collection of every listener set ever created.
pub struct Registry<L> {
    listeners: Mutex<Vec<Shared<L>>>,
}

impl<L> Default for Registry<L> {
    fn default() -> Self {
        Self { listeners: Mutex::new(Vec::new()) }
    }
}

impl<L> fmt::Debug for Registry<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("listeners", &self.len())
            .finish()
    }
}

impl<L> Registry<L> {
    /// Creates an empty [`Registry`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the given `listeners`, returning a handle shared with this
    /// [`Registry`].
    pub fn register(&self, listeners: L) -> Shared<L> {
        let shared = Arc::new(Mutex::new(listeners));
        lock(&self.listeners).push(Arc::clone(&shared));
        shared
    }

    /// Handles to every listener set registered so far, in registration
    /// order.
    #[must_use]
    pub fn listeners(&self) -> Vec<Shared<L>> {
        lock(&self.listeners).clone()
    }

    /// Number of listener sets registered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.listeners).len()
    }

    /// Indicates whether no listener set has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<L: Listeners> Registry<L> {
    /// Outcomes of every registered listener set, in registration order.
    #[must_use]
    pub fn outcomes(&self) -> Vec<L::Outcome> {
        self.listeners()
            .iter()
            .flat_map(|l| lock(&**l).outcomes())
            .collect()
    }
}

/// Lazily initialized, explicitly released per-thread value.
#[derive(Debug)]
pub struct Slot<T> {
    value: Option<T>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T> Slot<T> {
    /// Creates an empty [`Slot`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the held value, creating it with `init` if absent.
    pub fn get_or_init(&mut self, init: impl FnOnce() -> T) -> &mut T {
        self.value.get_or_insert_with(init)
    }

    /// Returns the held value, if any.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Drops the held value, so the next access creates a fresh one.
    pub fn release(&mut self) {
        self.value = None;
    }

    /// Indicates whether a value is held.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.value.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use crate::recorder::Recorder;

    use super::*;

    #[test]
    fn registers_concurrently() {
        let registry = Registry::<Recorder>::new();

        thread::scope(|s| {
            for _ in 0..8 {
                _ = s.spawn(|| registry.register(Recorder::new()));
            }
        });

        assert_eq!(registry.len(), 8);
    }

    #[test]
    fn outcomes_survive_release() {
        let registry = Registry::<Recorder>::new();
        let mut slot = Slot::new();

        {
            let shared = slot.get_or_init(|| registry.register(Recorder::new()));
            let mut recorder = lock(&**shared);
            recorder.test_started("first");
            recorder.test_finished();
        }
        slot.release();
        assert!(!slot.is_initialized());

        let outcomes = registry.outcomes();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].title, "first");
    }

    #[test]
    fn slot_initializes_once() {
        let mut slot = Slot::new();
        let mut calls = 0;

        for _ in 0..3 {
            _ = slot.get_or_init(|| {
                calls += 1;
                calls
            });
        }

        assert_eq!(calls, 1);
        assert_eq!(slot.get(), Some(&1));
    }
}
