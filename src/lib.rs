// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Lifecycle bridge between a story-execution engine and a test-reporting
//! engine.
//!
//! The story engine reports execution through [`StoryReporter`] callbacks
//! (stories, scenarios, given-stories, examples, steps). A [`Session`] of a
//! shared [`Reporter`] translates them into the correctly nested event
//! stream an [`EventSink`] of the reporting engine expects: given-stories are
//! flattened into steps of the running test, example rows are paired with
//! their data, and `pending`/`skip`/`wip` meta overrides the natural outcome
//! once a scenario completes.
//!
//! # Example
//!
//! ```rust
//! use story_reporter::{
//!     recorder::Recording,
//!     Config, Reporter, Scenario, Story, StoryReporter as _,
//! };
//!
//! let reporter = Reporter::new(Config::default(), Recording::new());
//! let story = Story::new("stories/checkout.story")
//!     .with_scenario(Scenario::new("Paying by card"));
//!
//! let mut session = reporter.session();
//! session.before_story(&story, false);
//! session.before_scenario("Paying by card");
//! session.before_step("Given a cart");
//! session.successful("Given a cart");
//! session.after_scenario();
//! session.after_story(false);
//!
//! let outcomes = reporter.all_test_outcomes();
//! assert_eq!(outcomes.len(), 1);
//! assert_eq!(outcomes[0].title, "Paying by card");
//! assert_eq!(outcomes[0].suite.as_ref().map(|s| s.title.as_str()), Some("Checkout"));
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod driver;
pub mod error;
pub mod examples;
pub mod forced;
pub mod given;
pub mod listener;
pub mod model;
pub mod recorder;
pub mod reporter;
pub mod result;
pub mod sink;
pub mod tag;

#[doc(inline)]
pub use self::{
    config::Config,
    driver::{Driver, NoDriver, StepContext},
    error::{AssumptionViolated, ReportError, TranslationError, WrappedFailure},
    listener::{Engine, Listeners, Registry, ReportService},
    model::{
        ExamplesTable, GivenStory, Lifecycle, Meta, Narrative, Row, Scenario,
        Story, AFTER_STORIES, BEFORE_STORIES,
    },
    reporter::{Context, Normalize, Reporter, Session, StoryReporter},
    result::{ForcedResult, TestResult},
    sink::{EventSink, SuiteInfo},
    tag::TestTag,
};
