/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use serde::{Deserialize, Serialize};

use crate::error::{WebGLError, WebGLResult};
use crate::gl::{self, GLenum, GLint};

/// Consumer-side attributes of an `EGL_KHR_stream`, in microseconds.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct StreamAttributes {
    pub consumer_latency_usec: GLint,
    pub consumer_acquire_timeout_usec: GLint,
}

impl StreamAttributes {
    fn slot(&mut self, attribute: GLenum) -> WebGLResult<&mut GLint> {
        match attribute {
            gl::CONSUMER_LATENCY_USEC_KHR => Ok(&mut self.consumer_latency_usec),
            gl::CONSUMER_ACQUIRE_TIMEOUT_USEC_KHR => Ok(&mut self.consumer_acquire_timeout_usec),
            _ => Err(WebGLError::InvalidEnum),
        }
    }

    /// Stores `value`. Negative values are rejected, never clamped.
    pub fn set(&mut self, attribute: GLenum, value: GLint) -> WebGLResult<()> {
        let slot = self.slot(attribute)?;
        if value < 0 {
            return Err(WebGLError::InvalidValue);
        }
        *slot = value;
        Ok(())
    }

    pub fn get(&self, attribute: GLenum) -> WebGLResult<GLint> {
        match attribute {
            gl::CONSUMER_LATENCY_USEC_KHR => Ok(self.consumer_latency_usec),
            gl::CONSUMER_ACQUIRE_TIMEOUT_USEC_KHR => Ok(self.consumer_acquire_timeout_usec),
            _ => Err(WebGLError::InvalidEnum),
        }
    }
}
