// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Per-thread translation state machine.

use std::{collections::BTreeMap, error::Error as StdError};

use inflector::Inflector as _;

use crate::{
    error::{self, TranslationError},
    examples::ExampleIterator,
    forced::{Directive, ForcedResults},
    given::GivenStoryMonitor,
    listener::{self, Engine, Shared, Slot},
    model::{ExamplesTable, GivenStory, Meta, Row, Scenario, Story},
    result::{ForcedResult, TestResult},
    sink::{EventSink as _, SuiteInfo},
    tag,
};

use super::{Normalize as _, Reporter, StoryReporter};

/// Title of the synthetic step holding the given-stories of a story.
const PRECONDITIONS: &str = "Preconditions";

/// Meta property requesting a specific driver for a story.
const DRIVER_PROPERTY: &str = "driver";

/// Story on the stack of a [`Context`], along with its story-scoped state.
///
/// A given-story pushes its own [`Frame`], so the enclosing story's state is
/// back in effect once the given-story is popped.
#[derive(Clone, Debug, Eq, PartialEq)]
struct Frame {
    name: String,
    fixture: bool,
    after_stories: bool,
    forced: ForcedResult,
    metadata: BTreeMap<String, String>,
}

impl Frame {
    fn of(story: &Story) -> Self {
        Self {
            name: story.name.clone(),
            fixture: story.is_fixture(),
            after_stories: story.is_after_stories(),
            forced: ForcedResult::None,
            metadata: tag::metadata(&story.meta),
        }
    }
}

/// Execution state of a single thread, destroyed along with its [`Session`].
#[derive(Clone, Debug, Default)]
pub struct Context {
    stories: Vec<Frame>,
    active_scenarios: Vec<String>,
    pending_givens: Vec<String>,
    nest_scenarios: bool,
    given: GivenStoryMonitor,
    scenario_forced: ForcedResult,
    examples: ExampleIterator,
}

impl Context {
    /// Number of stories currently running, given-stories included.
    #[must_use]
    pub fn story_depth(&self) -> usize {
        self.stories.len()
    }

    /// Titles of the running top-level tests, innermost last.
    #[must_use]
    pub fn active_scenarios(&self) -> &[String] {
        &self.active_scenarios
    }

    /// Outcome overrides of the current story and scenario.
    #[must_use]
    pub fn forced(&self) -> ForcedResults {
        let story = self.current_story().map_or(ForcedResult::None, |s| s.forced);
        ForcedResults::new(story, self.scenario_forced)
    }

    /// Indicates whether scenarios are currently reported as nested steps.
    #[must_use]
    pub const fn is_nesting(&self) -> bool {
        self.nest_scenarios
    }

    /// Given-story nesting tracker.
    #[must_use]
    pub const fn given(&self) -> &GivenStoryMonitor {
        &self.given
    }

    fn current_story(&self) -> Option<&Frame> {
        self.stories.last()
    }

    fn current_story_mut(&mut self) -> Option<&mut Frame> {
        self.stories.last_mut()
    }

    fn is_current_scenario(&self, title: &str) -> bool {
        self.active_scenarios.last().is_some_and(|s| s == title)
    }

    fn note_given_stories(&mut self, story: &Story) {
        self.pending_givens
            .extend(story.given_stories.iter().map(|g| g.name().to_owned()));
    }

    fn is_story_level_given(&self, name: &str) -> bool {
        self.pending_givens.iter().any(|g| g.eq_ignore_ascii_case(name))
    }

    fn given_story_done(&mut self, name: &str) {
        if let Some(pos) = self
            .pending_givens
            .iter()
            .position(|g| g.eq_ignore_ascii_case(name))
        {
            _ = self.pending_givens.remove(pos);
        }
    }
}

/// [`StoryReporter`] of a single execution thread.
///
/// Owns the thread's [`Context`], its lazily created listener set and its
/// report service.
pub struct Session<'r, E: Engine> {
    reporter: &'r Reporter<E>,
    ctx: Context,
    listeners: Slot<Shared<E::Listeners>>,
    reports: Slot<E::Reports>,
}

impl<'r, E: Engine> Session<'r, E> {
    pub(super) fn new(reporter: &'r Reporter<E>) -> Self {
        Self {
            reporter,
            ctx: Context::default(),
            listeners: Slot::new(),
            reports: Slot::new(),
        }
    }

    /// Execution [`Context`] of this [`Session`].
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.ctx
    }

    /// Runs `f` against this thread's listener set, creating and registering
    /// it on first use.
    pub fn with_listeners<R>(&mut self, f: impl FnOnce(&mut E::Listeners) -> R) -> R {
        let reporter = self.reporter;
        let shared = self.listeners.get_or_init(|| {
            tracing::debug!("setting up listeners for this thread");
            reporter
                .registry
                .register(reporter.engine.setup_listeners(&reporter.config))
        });
        f(&mut listener::lock(&**shared))
    }

    /// Drops this thread's listener set and report service. The listener set
    /// stays in the registry for the final report.
    fn clear_listeners(&mut self) {
        self.listeners.release();
        self.reports.release();
        self.ctx.given.clear();
    }

    fn configure_driver(&mut self, story: &Story) {
        let reporter = self.reporter;
        let config = &reporter.config;
        let unique = config.unique_browser;
        self.with_listeners(|l| l.set_unique_session(unique));

        let requested = story
            .meta
            .property(DRIVER_PROPERTY)
            .filter(|d| !d.is_empty())
            .or(config.driver.as_deref());
        tracing::debug!(story = %story.name, driver = ?requested, "initializing driver");
        reporter.driver.initialize(requested);
    }

    fn start_test_suite(&mut self, story: &Story) {
        let id = story.name.split('.').next().unwrap_or_default().to_owned();
        let suite = SuiteInfo {
            title: id.to_sentence_case(),
            id,
            path: story.path.clone(),
            narrative: story.narrative_text(),
        };
        tracing::info!(story = %story.name, title = %suite.title, "test suite started");
        self.with_listeners(|l| l.test_suite_started(&suite));
        self.register_story_tags(&story.meta);
    }

    fn register_story_tags(&mut self, meta: &Meta) {
        let issues = tag::issues(meta);
        let features_and_epics = tag::features_and_epics(meta);
        let tags = tag::tags(meta);
        self.with_listeners(|l| {
            if !issues.is_empty() {
                l.add_issues_to_current_story(&issues);
            }
            if !features_and_epics.is_empty() {
                l.add_tags_to_current_story(&features_and_epics);
            }
            if !tags.is_empty() {
                l.add_tags_to_current_story(&tags);
            }
        });

        let forced = self
            .ctx
            .current_story_mut()
            .map_or(ForcedResult::None, |s| Directive::apply(meta, &mut s.forced));
        if forced != ForcedResult::None {
            tracing::debug!(%forced, "story outcome forced");
            self.with_listeners(|l| l.suspend_test());
        }
    }

    fn start_test_for_first_scenario(&mut self, story: &Story) {
        let Some(first) = story.scenarios.first() else {
            tracing::warn!(
                "{}",
                TranslationError::NoScenarioForPreconditions { story: story.name.clone() },
            );
            return;
        };
        self.start_scenario(&first.title);
        self.with_listeners(|l| l.step_started(PRECONDITIONS));
        self.ctx.nest_scenarios = true;
    }

    fn start_scenario(&mut self, title: &str) {
        let normalized = title.normalized();
        tracing::debug!(scenario = %normalized, "test started");
        self.with_listeners(|l| l.test_started(&normalized));
        self.ctx.active_scenarios.push(title.to_owned());
    }

    fn start_new_step(&mut self, title: &str) {
        let title = title.normalized();
        let in_given = self.ctx.given.is_in_given_story();
        self.with_listeners(|l| {
            if in_given && l.are_steps_running() {
                l.update_current_step_title(&title);
            } else {
                l.step_started(&title);
            }
        });
    }

    fn reset_driver(&self) {
        tracing::debug!("resetting driver session");
        self.reporter.driver.reset();
    }

    fn generate_reports(&mut self) {
        let reporter = self.reporter;
        let reports = self
            .reports
            .get_or_init(|| reporter.engine.report_service(&reporter.config));
        match reporter.generate_reports(reports) {
            Ok(tests) => tracing::info!(tests, "reports generated"),
            Err(e) => tracing::error!(error = %e, "failed to generate reports"),
        }
    }
}

impl<E: Engine> StoryReporter for Session<'_, E> {
    fn before_story(&mut self, story: &Story, given: bool) {
        tracing::debug!(story = %story.name, given, "before story");

        self.ctx.stories.push(Frame::of(story));
        self.ctx.note_given_stories(story);

        if !story.is_fixture() && !given {
            self.ctx.active_scenarios.clear();
            self.configure_driver(story);
            self.reporter.steps.reset();

            if !self.ctx.is_story_level_given(&story.name) {
                self.start_test_suite(story);
                if story.has_given_stories() {
                    self.start_test_for_first_scenario(story);
                }
            }
        } else if given {
            self.ctx.nest_scenarios = true;
        }
    }

    fn after_story(&mut self, given: bool) {
        tracing::debug!(given, "after story");

        self.ctx.nest_scenarios = false;
        let Some(story) = self.ctx.current_story().cloned() else {
            tracing::warn!("{}", TranslationError::UnbalancedStory);
            return;
        };

        if given {
            self.ctx.given.exiting();
            self.ctx.given_story_done(&story.name);
        } else if story.after_stories {
            if !self.reporter.config.unique_browser {
                self.reporter.driver.close_all();
            }
            self.generate_reports();
        } else if story.fixture {
            // Nothing was opened for `BeforeStories`.
        } else if self.ctx.is_story_level_given(&story.name) {
            self.ctx.given_story_done(&story.name);
        } else {
            tracing::info!(story = %story.name, "test suite finished");
            self.with_listeners(|l| l.test_suite_finished());
            self.clear_listeners();
        }

        _ = self.ctx.stories.pop();
    }

    fn before_scenario(&mut self, title: &str) {
        tracing::debug!(scenario = %title, "before scenario");

        self.ctx.scenario_forced = ForcedResult::None;

        let reporter = self.reporter;
        let config = &reporter.config;
        if config.restart_browser_each_scenario && !self.ctx.nest_scenarios {
            self.reset_driver();
        }
        if config.reset_steps_each_scenario {
            reporter.steps.reset();
        }

        if self.ctx.is_current_scenario(title) {
            // Already started along with the preconditions.
        } else if self.ctx.nest_scenarios {
            self.start_new_step(title);
        } else {
            self.start_scenario(title);
        }

        match self.ctx.scenario_forced {
            ForcedResult::Pending => self.with_listeners(|l| l.test_pending()),
            ForcedResult::Skipped => self.with_listeners(|l| l.test_ignored()),
            ForcedResult::None => {}
        }
    }

    fn scenario_meta(&mut self, meta: &Meta) {
        let issues = tag::issues(meta);
        let features_and_epics = tag::features_and_epics(meta);
        let tags = tag::tags(meta);

        let mut metadata = self
            .ctx
            .current_story()
            .map(|s| s.metadata.clone())
            .unwrap_or_default();
        metadata.extend(tag::metadata(meta));

        self.with_listeners(|l| {
            if !issues.is_empty() {
                l.add_issues_to_current_test(&issues);
            }
            if !features_and_epics.is_empty() {
                l.add_tags_to_current_test(&features_and_epics);
            }
            if !tags.is_empty() {
                l.add_tags_to_current_test(&tags);
            }
            l.set_test_metadata(&metadata);
        });

        let forced = Directive::apply(meta, &mut self.ctx.scenario_forced);
        if forced != ForcedResult::None {
            tracing::debug!(%forced, "scenario outcome forced");
        }
    }

    fn after_scenario(&mut self) {
        tracing::debug!("after scenario");

        if self.ctx.given.is_in_given_story() || self.ctx.nest_scenarios {
            self.with_listeners(|l| l.step_finished());
            return;
        }

        let forced = self.ctx.forced();
        self.with_listeners(|l| {
            l.test_finished();
            if forced.is_pending() {
                l.set_all_steps_to(TestResult::Pending);
            }
            if forced.is_skipped() {
                l.set_all_steps_to(TestResult::Skipped);
            }
        });
        if self.ctx.active_scenarios.pop().is_none() {
            tracing::warn!("{}", TranslationError::NoActiveScenario);
        }
    }

    fn given_stories(&mut self, stories: &[GivenStory]) {
        tracing::debug!(count = stories.len(), "entering given stories");
        self.ctx.given.entering();
    }

    fn before_examples(&mut self, steps: &[String], table: &ExamplesTable) {
        tracing::debug!(steps = steps.len(), rows = table.len(), "before examples");
        self.ctx.examples.begin(table);
        self.with_listeners(|l| l.use_examples_from(table));
    }

    fn example(&mut self, row: &Row) {
        let reporter = self.reporter;
        let config = &reporter.config;
        if config.restart_browser_each_scenario {
            self.reset_driver();
        }
        self.with_listeners(|l| l.clear_step_failures());

        let len = self.ctx.examples.len();
        let advance = self.ctx.examples.advance(config.restart_frequency);
        let (finish_previous, periodic_reset, number) =
            (advance.finish_previous, advance.periodic_reset, advance.number);
        let data = advance.row.cloned().unwrap_or_else(|| {
            tracing::warn!("{}", TranslationError::ExampleOutOfBounds { number, len });
            row.clone()
        });

        if finish_previous {
            self.with_listeners(|l| l.example_finished());
        }
        if periodic_reset {
            self.reset_driver();
        }
        tracing::debug!(number, "example started");
        self.with_listeners(|l| l.example_started(&data));
    }

    fn after_examples(&mut self) {
        if self.ctx.examples.finish() {
            self.with_listeners(|l| l.example_finished());
        }
    }

    fn before_step(&mut self, title: &str) {
        let title = title.normalized();
        tracing::debug!(step = %title, "step started");
        self.with_listeners(|l| l.step_started(&title));
    }

    fn successful(&mut self, title: &str) {
        let title = title.normalized();
        self.with_listeners(|l| match l.forced_result() {
            Some(TestResult::Pending) => l.step_pending(),
            Some(_) => l.step_ignored(),
            None => {
                l.update_current_step_title(&title);
                l.step_finished();
            }
        });
    }

    fn ignorable(&mut self, title: &str) {
        let title = title.normalized();
        self.with_listeners(|l| {
            l.update_current_step_title(&title);
            l.step_ignored();
        });
    }

    fn pending(&mut self, title: &str) {
        let title = title.normalized();
        self.with_listeners(|l| {
            l.step_started(&title);
            l.step_pending();
        });
    }

    fn not_performed(&mut self, title: &str) {
        let title = title.normalized();
        self.with_listeners(|l| {
            l.step_started(&title);
            l.step_ignored();
        });
    }

    fn failed(&mut self, title: &str, cause: &(dyn StdError + 'static)) {
        let title = title.normalized();
        let root = error::root_cause(cause);
        tracing::debug!(step = %title, cause = %root, "step failed");
        self.with_listeners(|l| {
            l.update_current_step_title(&title);
            match error::as_assumption(root) {
                Some(assumption) => l.assumption_violated(&assumption.message),
                None => l.step_failed(&title, root),
            }
        });
    }

    fn scenario_not_allowed(&mut self, scenario: &Scenario, filter: &str) {
        tracing::debug!(scenario = %scenario.title, filter, "scenario not allowed");
        self.with_listeners(|l| l.test_ignored());
    }
}
