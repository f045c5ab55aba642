// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Outcomes understood by the reporting engine.

use derive_more::with_trait::Display;

/// Outcome of a test or a step, as the reporting engine models it.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TestResult {
    /// Executed and passed.
    #[display("success")]
    Success,

    /// An assertion failed.
    #[display("failure")]
    Failure,

    /// An unexpected error occurred.
    #[display("error")]
    Error,

    /// Not implemented yet.
    #[display("pending")]
    Pending,

    /// Not executed because of a preceding outcome or a directive.
    #[display("skipped")]
    Skipped,

    /// Deliberately ignored.
    #[display("ignored")]
    Ignored,

    /// No outcome recorded.
    #[display("undefined")]
    Undefined,

    /// Executed, but an external precondition was broken.
    #[display("compromised")]
    Compromised,
}

/// Metadata-driven override of a story's or scenario's natural outcome.
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
pub enum ForcedResult {
    /// No override.
    #[default]
    #[display("none")]
    None,

    /// Every step is reported as [`TestResult::Pending`].
    #[display("pending")]
    Pending,

    /// Every step is reported as [`TestResult::Skipped`].
    #[display("skipped")]
    Skipped,
}

impl ForcedResult {
    /// [`TestResult`] every step is forced to, if any.
    #[must_use]
    pub const fn as_test_result(self) -> Option<TestResult> {
        match self {
            Self::None => None,
            Self::Pending => Some(TestResult::Pending),
            Self::Skipped => Some(TestResult::Skipped),
        }
    }

    /// Indicates whether this is [`ForcedResult::Pending`].
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Indicates whether this is [`ForcedResult::Skipped`].
    #[must_use]
    pub const fn is_skipped(self) -> bool {
        matches!(self, Self::Skipped)
    }
}
