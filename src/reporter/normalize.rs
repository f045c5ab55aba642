// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Extension of a [`str`] restoring parameter placeholders in titles.

use std::borrow::Cow;

use sealed::sealed;

/// Private-use character the story engine opens parameter placeholders with.
pub const OPEN_PARAM: char = '\u{ff5f}';

/// Private-use character the story engine closes parameter placeholders with.
pub const CLOSE_PARAM: char = '\u{ff60}';

/// Extension of a [`str`] normalizing step and scenario titles.
#[sealed]
pub trait Normalize {
    /// Replaces [`OPEN_PARAM`] and [`CLOSE_PARAM`] markers with curly braces.
    #[must_use]
    fn normalized(&self) -> Cow<'_, str>;
}

#[sealed]
impl Normalize for str {
    fn normalized(&self) -> Cow<'_, str> {
        if self.contains([OPEN_PARAM, CLOSE_PARAM]) {
            Cow::Owned(
                self.chars()
                    .map(|c| match c {
                        OPEN_PARAM => '{',
                        CLOSE_PARAM => '}',
                        c => c,
                    })
                    .collect(),
            )
        } else {
            Cow::Borrowed(self)
        }
    }
}
