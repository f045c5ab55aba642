// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Outbound event surface of the reporting engine.

use std::{collections::BTreeMap, error::Error as StdError};

use crate::{
    model::{ExamplesTable, Row},
    result::TestResult,
    tag::TestTag,
};

/// Description of a test suite being started for a story.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SuiteInfo {
    /// Story name without its extension.
    pub id: String,

    /// Human-readable title derived from the [`SuiteInfo::id`].
    pub title: String,

    /// Path the story was loaded from.
    pub path: String,

    /// Rendered narrative, empty if the story has none.
    pub narrative: String,
}

/// Event intake of the reporting engine.
///
/// The [`Reporter`] drives a single [`EventSink`] per execution thread,
/// strictly sequentially.
///
/// [`Reporter`]: crate::Reporter
pub trait EventSink {
    /// A story's test suite starts.
    fn test_suite_started(&mut self, suite: &SuiteInfo);

    /// The current test suite finishes.
    fn test_suite_finished(&mut self);

    /// A top-level test starts.
    fn test_started(&mut self, title: &str);

    /// The current test finishes.
    fn test_finished(&mut self);

    /// The current test is to be reported as ignored.
    fn test_ignored(&mut self);

    /// The current test is to be reported as pending.
    fn test_pending(&mut self);

    /// A step, possibly nested into another one, starts.
    fn step_started(&mut self, title: &str);

    /// The current step finishes successfully.
    fn step_finished(&mut self);

    /// The current step fails with the given `cause`.
    fn step_failed(&mut self, title: &str, cause: &(dyn StdError + 'static));

    /// The current step finishes as ignored.
    fn step_ignored(&mut self);

    /// The current step finishes as pending.
    fn step_pending(&mut self);

    /// The current step broke an assumption rather than an expectation.
    fn assumption_violated(&mut self, message: &str);

    /// Forces every step of the last finished test to the given `result`.
    fn set_all_steps_to(&mut self, result: TestResult);

    /// Attaches `tags` to the current test.
    fn add_tags_to_current_test(&mut self, tags: &[TestTag]);

    /// Attaches `tags` to the current story.
    fn add_tags_to_current_story(&mut self, tags: &[TestTag]);

    /// Attaches `issues` to the current test.
    fn add_issues_to_current_test(&mut self, issues: &[String]);

    /// Attaches `issues` to the current story.
    fn add_issues_to_current_story(&mut self, issues: &[String]);

    /// Replaces the free metadata of the current test.
    fn set_test_metadata(&mut self, metadata: &BTreeMap<String, String>) {
        _ = metadata;
    }

    /// The current test is data-driven by the given `table`.
    fn use_examples_from(&mut self, table: &ExamplesTable);

    /// An example row starts.
    fn example_started(&mut self, row: &Row);

    /// The current example row finishes.
    fn example_finished(&mut self);

    /// Retitles the currently open step.
    fn update_current_step_title(&mut self, title: &str);

    /// Forgets failures recorded for the steps of the current example.
    fn clear_step_failures(&mut self);

    /// Stops default test execution for the rest of the story.
    fn suspend_test(&mut self);

    /// Whether a single browser session is shared by the whole run.
    fn set_unique_session(&mut self, unique: bool) {
        _ = unique;
    }

    /// Result forced onto the running test by an annotation the step engine
    /// recognized, if any.
    #[must_use]
    fn forced_result(&self) -> Option<TestResult>;

    /// Indicates whether any step is currently open.
    #[must_use]
    fn are_steps_running(&self) -> bool;
}
