/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use crate::context::WebGLContextId;

/// Tracks which context the native driver currently has bound, so that
/// switching to the context that is already current costs nothing.
#[derive(Debug, Default)]
pub struct ActiveContext {
    bound_context_id: Option<WebGLContextId>,
}

impl ActiveContext {
    pub fn new() -> ActiveContext {
        ActiveContext::default()
    }

    pub fn get(&self) -> Option<WebGLContextId> {
        self.bound_context_id
    }

    /// Binds `context_id`, calling `make_current` only if another context (or
    /// none) is bound. A failed switch leaves nothing bound, so the next switch
    /// always reaches the driver.
    pub fn switch_to<F>(&mut self, context_id: WebGLContextId, make_current: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        if self.bound_context_id == Some(context_id) {
            return true;
        }
        if make_current() {
            self.bound_context_id = Some(context_id);
            true
        } else {
            self.bound_context_id = None;
            false
        }
    }

    /// Forgets the bound context. Used whenever something other than
    /// [`ActiveContext::switch_to`] may have changed the native current context.
    pub fn invalidate(&mut self) {
        self.bound_context_id = None;
    }
}
