// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Lifecycle translation of story-engine callbacks into reporting events.
//!
//! A [`Reporter`] is shared by every thread of a run. Each thread executing
//! stories opens its own [`Session`], which owns the thread's execution
//! [`Context`] and listener set, and implements the [`StoryReporter`]
//! callback surface.

mod normalize;
mod session;

use std::{
    error::Error as StdError,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::{
    config::Config,
    driver::{Driver, NoDriver, StepContext},
    error::ReportError,
    listener::{self, Engine, Outcome, Registry, ReportService as _},
    model::{ExamplesTable, GivenStory, Lifecycle, Meta, Narrative, Row, Scenario, Story},
};

pub use self::{
    normalize::{Normalize, CLOSE_PARAM, OPEN_PARAM},
    session::{Context, Session},
};

/// Inbound callback surface of the story engine.
///
/// Callbacks of a single story execution arrive synchronously, in order and
/// from a single thread.
pub trait StoryReporter {
    /// A story starts; `given` is set when it runs as a given-story.
    fn before_story(&mut self, story: &Story, given: bool);

    /// The most recently started story finishes.
    fn after_story(&mut self, given: bool);

    /// A scenario starts.
    fn before_scenario(&mut self, title: &str);

    /// Meta of the scenario just started.
    fn scenario_meta(&mut self, meta: &Meta);

    /// The current scenario finishes.
    fn after_scenario(&mut self);

    /// Narrative of the current story.
    fn narrative(&mut self, narrative: &Narrative) {
        _ = narrative;
    }

    /// A block of given-stories is about to run.
    fn given_stories(&mut self, stories: &[GivenStory]);

    /// The current scenario is about to run once per row of `table`.
    fn before_examples(&mut self, steps: &[String], table: &ExamplesTable);

    /// The current scenario runs with the given `row`.
    fn example(&mut self, row: &Row);

    /// Every example row has run.
    fn after_examples(&mut self);

    /// A step starts.
    fn before_step(&mut self, title: &str);

    /// The current step passed.
    fn successful(&mut self, title: &str);

    /// The current step is ignorable.
    fn ignorable(&mut self, title: &str);

    /// A step has no implementation.
    fn pending(&mut self, title: &str);

    /// A step was not performed because of a preceding failure.
    fn not_performed(&mut self, title: &str);

    /// The current step failed with the given `cause`.
    fn failed(&mut self, title: &str, cause: &(dyn StdError + 'static));

    /// A story was filtered out.
    fn story_not_allowed(&mut self, story: &Story, filter: &str) {
        _ = (story, filter);
    }

    /// A story was cancelled after running for `duration`.
    fn story_cancelled(&mut self, story: &Story, duration: Duration) {
        _ = (story, duration);
    }

    /// Lifecycle steps of the current story.
    fn lifecycle(&mut self, lifecycle: &Lifecycle) {
        _ = lifecycle;
    }

    /// A scenario was filtered out.
    fn scenario_not_allowed(&mut self, scenario: &Scenario, filter: &str) {
        _ = (scenario, filter);
    }

    /// Outcomes verified by a step failed.
    fn failed_outcomes(&mut self, step: &str, cause: &(dyn StdError + 'static)) {
        _ = (step, cause);
    }

    /// A step was restarted after the given `cause`.
    fn restarted(&mut self, step: &str, cause: &(dyn StdError + 'static)) {
        _ = (step, cause);
    }

    /// The run is a dry run.
    fn dry_run(&mut self) {}

    /// Step methods the story engine found no implementation for.
    fn pending_methods(&mut self, methods: &[String]) {
        _ = methods;
    }
}

/// Translator of story-engine callbacks shared by every execution thread.
pub struct Reporter<E: Engine> {
    config: Config,
    engine: E,
    driver: Arc<dyn Driver>,
    steps: Arc<dyn StepContext>,
    registry: Registry<E::Listeners>,
    reporting: Mutex<()>,
}

impl<E: Engine> fmt::Debug for Reporter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl<E: Engine> Reporter<E> {
    /// Creates a new [`Reporter`] without any browser driver.
    #[must_use]
    pub fn new(config: Config, engine: E) -> Self {
        Self {
            config,
            engine,
            driver: Arc::new(NoDriver),
            steps: Arc::new(NoDriver),
            registry: Registry::new(),
            reporting: Mutex::new(()),
        }
    }

    /// Sets the [`Driver`] whose sessions are managed along the lifecycle.
    #[must_use]
    pub fn with_driver(mut self, driver: impl Driver + 'static) -> Self {
        self.driver = Arc::new(driver);
        self
    }

    /// Sets the [`StepContext`] reset between stories and scenarios.
    #[must_use]
    pub fn with_step_context(mut self, steps: impl StepContext + 'static) -> Self {
        self.steps = Arc::new(steps);
        self
    }

    /// Opens a new [`Session`] for the calling thread.
    #[must_use]
    pub fn session(&self) -> Session<'_, E> {
        Session::new(self)
    }

    /// [`Config`] of this [`Reporter`].
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// [`Engine`] of this [`Reporter`].
    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Every listener set created so far, across all threads.
    #[must_use]
    pub const fn registry(&self) -> &Registry<E::Listeners> {
        &self.registry
    }

    /// Outcomes of every test finished so far, across all threads.
    #[must_use]
    pub fn all_test_outcomes(&self) -> Vec<Outcome<E>> {
        self.registry.outcomes()
    }

    /// Generates the final reports with the given `reports` service,
    /// serialized against concurrent generations.
    ///
    /// Failures and panics of the service are returned rather than
    /// propagated.
    fn generate_reports(&self, reports: &E::Reports) -> Result<usize, ReportError> {
        let _serialized = listener::lock(&self.reporting);
        let outcomes = self.all_test_outcomes();
        panic::catch_unwind(AssertUnwindSafe(|| reports.generate(&outcomes)))
            .map_err(|payload| ReportError::panicked(&*payload))?
            .map(|()| outcomes.len())
    }
}
