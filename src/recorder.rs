// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! In-memory reporting engine recording every event it receives.
//!
//! [`Recorder`] keeps the raw event stream for inspection and folds it into
//! [`TestOutcome`]s the way the reporting engine's base step listener does.

use std::{
    collections::BTreeMap,
    error::Error as StdError,
    mem,
    sync::{Arc, Mutex},
};

use itertools::Itertools as _;

use crate::{
    config::Config,
    error::{Chain, ReportResult},
    listener::{self, Engine, Listeners, ReportService},
    model::{ExamplesTable, Row},
    result::TestResult,
    sink::{EventSink, SuiteInfo},
    tag::TestTag,
};

/// Single event received by a [`Recorder`].
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Emitted {
    /// [`EventSink::test_suite_started()`].
    TestSuiteStarted(SuiteInfo),
    /// [`EventSink::test_suite_finished()`].
    TestSuiteFinished,
    /// [`EventSink::test_started()`].
    TestStarted(String),
    /// [`EventSink::test_finished()`].
    TestFinished,
    /// [`EventSink::test_ignored()`].
    TestIgnored,
    /// [`EventSink::test_pending()`].
    TestPending,
    /// [`EventSink::step_started()`].
    StepStarted(String),
    /// [`EventSink::step_finished()`].
    StepFinished,
    /// [`EventSink::step_failed()`] with the rendered cause.
    StepFailed(String, String),
    /// [`EventSink::step_ignored()`].
    StepIgnored,
    /// [`EventSink::step_pending()`].
    StepPending,
    /// [`EventSink::assumption_violated()`].
    AssumptionViolated(String),
    /// [`EventSink::set_all_steps_to()`].
    SetAllStepsTo(TestResult),
    /// [`EventSink::add_tags_to_current_test()`].
    TestTags(Vec<TestTag>),
    /// [`EventSink::add_tags_to_current_story()`].
    StoryTags(Vec<TestTag>),
    /// [`EventSink::add_issues_to_current_test()`].
    TestIssues(Vec<String>),
    /// [`EventSink::add_issues_to_current_story()`].
    StoryIssues(Vec<String>),
    /// [`EventSink::set_test_metadata()`].
    TestMetadata(BTreeMap<String, String>),
    /// [`EventSink::use_examples_from()`].
    UseExamplesFrom(ExamplesTable),
    /// [`EventSink::example_started()`].
    ExampleStarted(Row),
    /// [`EventSink::example_finished()`].
    ExampleFinished,
    /// [`EventSink::update_current_step_title()`].
    UpdateCurrentStepTitle(String),
    /// [`EventSink::clear_step_failures()`].
    ClearStepFailures,
    /// [`EventSink::suspend_test()`].
    SuspendTest,
    /// [`EventSink::set_unique_session()`].
    UniqueSession(bool),
}

/// Outcome of a single step, with its nested steps.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepOutcome {
    /// Title of the step.
    pub title: String,

    /// Result of the step.
    pub result: TestResult,

    /// Rendered failure, if the step failed.
    pub failure: Option<String>,

    /// Nested steps, in execution order.
    pub children: Vec<StepOutcome>,
}

impl StepOutcome {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            result: TestResult::Undefined,
            failure: None,
            children: Vec::new(),
        }
    }

    fn force(&mut self, result: TestResult) {
        self.result = result;
        for child in &mut self.children {
            child.force(result);
        }
    }

    /// Number of steps in this subtree, this one included.
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }

    /// Results of this step and all nested ones, depth-first.
    #[must_use]
    pub fn results(&self) -> Vec<TestResult> {
        let mut all = vec![self.result];
        all.extend(self.children.iter().flat_map(Self::results));
        all
    }
}

/// Outcome of a single top-level test.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TestOutcome {
    /// Suite the test belongs to.
    pub suite: Option<SuiteInfo>,

    /// Title of the test.
    pub title: String,

    /// Top-level steps, in execution order.
    pub steps: Vec<StepOutcome>,

    /// Tags of the test, story tags included.
    pub tags: Vec<TestTag>,

    /// Issues of the test, story issues included.
    pub issues: Vec<String>,

    /// Free metadata of the test.
    pub metadata: BTreeMap<String, String>,

    /// Examples table driving the test, if any.
    pub examples: Option<ExamplesTable>,

    /// Result annotated onto the whole test, overriding its steps.
    pub annotated: Option<TestResult>,
}

impl TestOutcome {
    /// Overall result: the annotated one, or the worst step result.
    #[must_use]
    pub fn result(&self) -> TestResult {
        if let Some(annotated) = self.annotated {
            return annotated;
        }
        let results = self
            .steps
            .iter()
            .flat_map(StepOutcome::results)
            .collect::<Vec<_>>();
        [
            TestResult::Error,
            TestResult::Failure,
            TestResult::Compromised,
            TestResult::Pending,
            TestResult::Ignored,
            TestResult::Skipped,
        ]
        .into_iter()
        .find(|r| results.contains(r))
        .unwrap_or(if results.is_empty() {
            TestResult::Undefined
        } else {
            TestResult::Success
        })
    }

    /// Results of every step, depth-first.
    #[must_use]
    pub fn step_results(&self) -> Vec<TestResult> {
        self.steps.iter().flat_map(StepOutcome::results).collect()
    }

    /// Titles of the top-level steps.
    #[must_use]
    pub fn step_titles(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.title.as_str()).collect()
    }
}

/// [`Listeners`] recording events and folding them into [`TestOutcome`]s.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    events: Vec<Emitted>,
    suite: Option<SuiteInfo>,
    story_tags: Vec<TestTag>,
    story_issues: Vec<String>,
    current: Option<TestOutcome>,
    open_steps: Vec<StepOutcome>,
    finished: Vec<TestOutcome>,
    forced: Option<TestResult>,
    suspended: bool,
}

impl Recorder {
    /// Creates an empty [`Recorder`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates an annotation forcing the result of the running test, as
    /// recognized by a step engine.
    pub fn force_result(&mut self, result: Option<TestResult>) {
        self.forced = result;
    }

    /// Every event received so far.
    #[must_use]
    pub fn events(&self) -> &[Emitted] {
        &self.events
    }

    /// Indicates whether a story suspended default test execution.
    #[must_use]
    pub const fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Finished tests so far.
    #[must_use]
    pub fn finished(&self) -> &[TestOutcome] {
        &self.finished
    }

    fn record(&mut self, event: Emitted) {
        self.events.push(event);
    }

    fn close_step(&mut self, result: TestResult, failure: Option<String>) {
        let Some(mut step) = self.open_steps.pop() else {
            tracing::warn!(?result, "step closed while none is open");
            return;
        };
        step.result = result;
        step.failure = failure;
        if let Some(parent) = self.open_steps.last_mut() {
            parent.children.push(step);
        } else if let Some(test) = self.current.as_mut() {
            test.steps.push(step);
        }
    }
}

impl EventSink for Recorder {
    fn test_suite_started(&mut self, suite: &SuiteInfo) {
        self.record(Emitted::TestSuiteStarted(suite.clone()));
        self.suite = Some(suite.clone());
        self.story_tags.clear();
        self.story_issues.clear();
        self.suspended = false;
    }

    fn test_suite_finished(&mut self) {
        self.record(Emitted::TestSuiteFinished);
        self.suite = None;
    }

    fn test_started(&mut self, title: &str) {
        self.record(Emitted::TestStarted(title.to_owned()));
        self.open_steps.clear();
        self.current = Some(TestOutcome {
            suite: self.suite.clone(),
            title: title.to_owned(),
            tags: self.story_tags.clone(),
            issues: self.story_issues.clone(),
            ..TestOutcome::default()
        });
    }

    fn test_finished(&mut self) {
        self.record(Emitted::TestFinished);
        while !self.open_steps.is_empty() {
            self.close_step(TestResult::Success, None);
        }
        if let Some(test) = self.current.take() {
            self.finished.push(test);
        }
        self.forced = None;
    }

    fn test_ignored(&mut self) {
        self.record(Emitted::TestIgnored);
        if let Some(test) = self.current.as_mut() {
            test.annotated = Some(TestResult::Ignored);
        }
    }

    fn test_pending(&mut self) {
        self.record(Emitted::TestPending);
        if let Some(test) = self.current.as_mut() {
            test.annotated = Some(TestResult::Pending);
        }
    }

    fn step_started(&mut self, title: &str) {
        self.record(Emitted::StepStarted(title.to_owned()));
        self.open_steps.push(StepOutcome::new(title));
    }

    fn step_finished(&mut self) {
        self.record(Emitted::StepFinished);
        self.close_step(TestResult::Success, None);
    }

    fn step_failed(&mut self, title: &str, cause: &(dyn StdError + 'static)) {
        let rendered = Chain(cause).to_string();
        self.record(Emitted::StepFailed(title.to_owned(), rendered.clone()));
        if let Some(step) = self.open_steps.last_mut() {
            title.clone_into(&mut step.title);
        }
        self.close_step(TestResult::Failure, Some(rendered));
    }

    fn step_ignored(&mut self) {
        self.record(Emitted::StepIgnored);
        self.close_step(TestResult::Ignored, None);
    }

    fn step_pending(&mut self) {
        self.record(Emitted::StepPending);
        self.close_step(TestResult::Pending, None);
    }

    fn assumption_violated(&mut self, message: &str) {
        self.record(Emitted::AssumptionViolated(message.to_owned()));
        self.close_step(TestResult::Ignored, Some(message.to_owned()));
    }

    fn set_all_steps_to(&mut self, result: TestResult) {
        self.record(Emitted::SetAllStepsTo(result));
        if let Some(test) = self.finished.last_mut() {
            for step in &mut test.steps {
                step.force(result);
            }
            test.annotated = Some(result);
        }
    }

    fn add_tags_to_current_test(&mut self, tags: &[TestTag]) {
        self.record(Emitted::TestTags(tags.to_vec()));
        if let Some(test) = self.current.as_mut() {
            test.tags.extend(tags.iter().cloned());
            test.tags = mem::take(&mut test.tags).into_iter().unique().collect();
        }
    }

    fn add_tags_to_current_story(&mut self, tags: &[TestTag]) {
        self.record(Emitted::StoryTags(tags.to_vec()));
        self.story_tags.extend(tags.iter().cloned());
    }

    fn add_issues_to_current_test(&mut self, issues: &[String]) {
        self.record(Emitted::TestIssues(issues.to_vec()));
        if let Some(test) = self.current.as_mut() {
            test.issues.extend(issues.iter().cloned());
            test.issues = mem::take(&mut test.issues).into_iter().unique().collect();
        }
    }

    fn add_issues_to_current_story(&mut self, issues: &[String]) {
        self.record(Emitted::StoryIssues(issues.to_vec()));
        self.story_issues.extend(issues.iter().cloned());
    }

    fn set_test_metadata(&mut self, metadata: &BTreeMap<String, String>) {
        self.record(Emitted::TestMetadata(metadata.clone()));
        if let Some(test) = self.current.as_mut() {
            test.metadata.clone_from(metadata);
        }
    }

    fn use_examples_from(&mut self, table: &ExamplesTable) {
        self.record(Emitted::UseExamplesFrom(table.clone()));
        if let Some(test) = self.current.as_mut() {
            test.examples = Some(table.clone());
        }
    }

    fn example_started(&mut self, row: &Row) {
        self.record(Emitted::ExampleStarted(row.clone()));
        let title = format!(
            "[{}]",
            row.iter().map(|(k, v)| format!("{k}: {v}")).join(", "),
        );
        self.open_steps.push(StepOutcome::new(title));
    }

    fn example_finished(&mut self) {
        self.record(Emitted::ExampleFinished);
        self.close_step(TestResult::Success, None);
    }

    fn update_current_step_title(&mut self, title: &str) {
        self.record(Emitted::UpdateCurrentStepTitle(title.to_owned()));
        if let Some(step) = self.open_steps.last_mut() {
            title.clone_into(&mut step.title);
        }
    }

    fn clear_step_failures(&mut self) {
        self.record(Emitted::ClearStepFailures);
    }

    fn suspend_test(&mut self) {
        self.record(Emitted::SuspendTest);
        self.suspended = true;
    }

    fn set_unique_session(&mut self, unique: bool) {
        self.record(Emitted::UniqueSession(unique));
    }

    fn forced_result(&self) -> Option<TestResult> {
        self.forced
    }

    fn are_steps_running(&self) -> bool {
        !self.open_steps.is_empty()
    }
}

impl Listeners for Recorder {
    type Outcome = TestOutcome;

    fn outcomes(&self) -> Vec<TestOutcome> {
        self.finished.clone()
    }
}

/// [`Engine`] producing [`Recorder`]s and collecting generated reports in
/// memory.
#[derive(Clone, Debug, Default)]
pub struct Recording {
    reports: Arc<Mutex<Vec<Vec<TestOutcome>>>>,
}

impl Recording {
    /// Creates a new [`Recording`] engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome batches every [`ReportService::generate()`] call received.
    #[must_use]
    pub fn reports(&self) -> Vec<Vec<TestOutcome>> {
        listener::lock(&*self.reports).clone()
    }
}

impl Engine for Recording {
    type Listeners = Recorder;
    type Reports = Self;

    fn setup_listeners(&self, _: &Config) -> Recorder {
        Recorder::new()
    }

    fn report_service(&self, _: &Config) -> Self {
        self.clone()
    }
}

impl ReportService<TestOutcome> for Recording {
    fn generate(&self, outcomes: &[TestOutcome]) -> ReportResult<()> {
        tracing::info!(tests = outcomes.len(), "recording reports");
        listener::lock(&*self.reports).push(outcomes.to_vec());
        Ok(())
    }
}
