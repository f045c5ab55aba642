// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types of the [`Reporter`].
//!
//! None of these ever escape a single callback: step failures are forwarded
//! to the reporting engine, everything else is logged and degraded to the
//! safest translation.
//!
//! [`Reporter`]: crate::Reporter

use std::{error::Error as StdError, fmt};

use derive_more::with_trait::{Display, Error};

/// Step failure signalling a violated assumption rather than a broken
/// expectation.
///
/// Reported as [`EventSink::assumption_violated()`] instead of a failed step,
/// so that conditional skips surface distinctly from genuine failures.
///
/// [`EventSink::assumption_violated()`]: crate::EventSink::assumption_violated
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("{message}")]
pub struct AssumptionViolated {
    /// Description of the violated assumption.
    #[error(not(source))]
    pub message: String,
}

impl AssumptionViolated {
    /// Creates a new [`AssumptionViolated`] failure.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Failure wrapper the story engine puts around the actual cause of a failed
/// step.
///
/// Exactly one level of such wrapping is removed before forwarding a failure.
#[derive(Debug, Display)]
#[display("{context}: {cause}")]
pub struct WrappedFailure {
    /// What was being done when the failure happened.
    pub context: String,

    /// Actual cause of the failure.
    pub cause: Box<dyn StdError + Send + Sync + 'static>,
}

impl WrappedFailure {
    /// Wraps the given `cause`.
    #[must_use]
    pub fn new(
        context: impl Into<String>,
        cause: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
    ) -> Self {
        Self { context: context.into(), cause: cause.into() }
    }
}

impl StdError for WrappedFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.cause)
    }
}

/// Errors of generating the final reports.
#[derive(Debug, Display, Error)]
pub enum ReportError {
    /// Report service failed to produce its artifacts.
    #[display("Report generation failed: {message}")]
    Generation {
        /// Description of the failure.
        #[error(not(source))]
        message: String,
    },

    /// Report service panicked.
    #[display("Report generation panicked: {message}")]
    Panicked {
        /// Panic payload, if it was a string.
        #[error(not(source))]
        message: String,
    },
}

impl ReportError {
    /// Creates a new [`ReportError::Generation`].
    #[must_use]
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation { message: message.into() }
    }

    /// Creates a new [`ReportError::Panicked`] out of a panic payload.
    #[must_use]
    pub fn panicked(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| payload.downcast_ref::<&str>().map(|s| (*s).to_owned()))
            .unwrap_or_else(|| "opaque panic payload".to_owned());
        Self::Panicked { message }
    }
}

/// Inconsistencies in the callback stream the [`Reporter`] tolerates.
///
/// [`Reporter`]: crate::Reporter
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
pub enum TranslationError {
    /// `after_story()` arrived without a matching `before_story()`.
    #[display("`after_story()` called with no story running")]
    UnbalancedStory,

    /// A scenario finished while none was active.
    #[display("`after_scenario()` called with no active scenario")]
    NoActiveScenario,

    /// The story engine iterated past the captured examples table.
    #[display("example #{number} requested, but the table has {len} rows")]
    ExampleOutOfBounds {
        /// 1-based number of the requested row.
        number: usize,

        /// Number of captured rows.
        len: usize,
    },

    /// A story declaring given-stories has no scenario to hold them.
    #[display("story `{story}` declares given-stories but has no scenarios")]
    NoScenarioForPreconditions {
        /// Name of the story.
        #[error(not(source))]
        story: String,
    },
}

/// Result of generating reports.
pub type ReportResult<T> = Result<T, ReportError>;

/// Removes exactly one level of failure wrapping.
#[must_use]
pub fn root_cause<'e>(
    failure: &'e (dyn StdError + 'static),
) -> &'e (dyn StdError + 'static) {
    failure.source().unwrap_or(failure)
}

/// Returns the [`AssumptionViolated`] the given `cause` is, if any.
#[must_use]
pub fn as_assumption<'e>(
    cause: &'e (dyn StdError + 'static),
) -> Option<&'e AssumptionViolated> {
    cause.downcast_ref::<AssumptionViolated>()
}

/// Wrapper displaying a failure together with its whole cause chain.
#[derive(Clone, Copy)]
pub struct Chain<'e>(pub &'e (dyn StdError + 'static));

impl fmt::Display for Chain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(cause) = source {
            write!(f, "\ncaused by: {cause}")?;
            source = cause.source();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn root_cause_unwraps_exactly_one_level() {
        let inner = WrappedFailure::new("inner", io::Error::other("disk"));
        let outer = WrappedFailure::new("outer", inner);

        let root = root_cause(&outer);
        assert_eq!(root.to_string(), "inner: disk");
    }

    #[test]
    fn root_cause_of_unwrapped_failure_is_itself() {
        let failure = io::Error::other("boom");

        assert_eq!(root_cause(&failure).to_string(), "boom");
    }

    #[test]
    fn detects_wrapped_assumption() {
        let failure =
            WrappedFailure::new("step", AssumptionViolated::new("no network"));

        let assumption = as_assumption(root_cause(&failure));
        assert_eq!(assumption.map(|a| a.message.as_str()), Some("no network"));
        assert!(as_assumption(&failure).is_none());
    }

    #[test]
    fn panic_payloads() {
        let string: Box<dyn std::any::Any + Send> = Box::new("oops".to_owned());
        let static_str: Box<dyn std::any::Any + Send> = Box::new("oops");
        let other: Box<dyn std::any::Any + Send> = Box::new(42);

        assert_eq!(ReportError::panicked(&*string).to_string(), "Report generation panicked: oops");
        assert_eq!(ReportError::panicked(&*static_str).to_string(), "Report generation panicked: oops");
        assert!(ReportError::panicked(&*other).to_string().ends_with("opaque panic payload"));
    }

    #[test]
    fn chain_displays_every_cause() {
        let failure = WrappedFailure::new("step", io::Error::other("disk"));

        assert_eq!(Chain(&failure).to_string(), "step: disk\ncaused by: disk");
    }
}
