// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Browser driver and step-definition collaborators.

use std::sync::Arc;

/// Browser driver lifecycle, managed outside of the [`Reporter`].
///
/// [`Reporter`]: crate::Reporter
pub trait Driver: Send + Sync {
    /// Initializes a driver for the story about to run: the `requested` one,
    /// or the default when [`None`].
    fn initialize(&self, requested: Option<&str>);

    /// Resets the current driver session.
    fn reset(&self);

    /// Closes every open driver session.
    fn close_all(&self);
}

/// Step-definition instances state.
pub trait StepContext: Send + Sync {
    /// Discards the state held by step-definition instances.
    fn reset(&self);
}

impl<D: Driver + ?Sized> Driver for Arc<D> {
    fn initialize(&self, requested: Option<&str>) {
        (**self).initialize(requested);
    }

    fn reset(&self) {
        (**self).reset();
    }

    fn close_all(&self) {
        (**self).close_all();
    }
}

impl<S: StepContext + ?Sized> StepContext for Arc<S> {
    fn reset(&self) {
        (**self).reset();
    }
}

/// [`Driver`] and [`StepContext`] doing nothing, for runs without a browser.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDriver;

impl Driver for NoDriver {
    fn initialize(&self, _: Option<&str>) {}

    fn reset(&self) {}

    fn close_all(&self) {}
}

impl StepContext for NoDriver {
    fn reset(&self) {}
}
