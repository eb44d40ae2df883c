/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Mirrors framebuffer attachments and bindings so that render targets a
//! driver may have cached can be re-resolved after they change.
//!
//! Some drivers, and translation layers such as ANGLE, resolve the render
//! targets of a framebuffer when it is bound and keep using them until the
//! next bind. Any change to what a framebuffer renders into marks it stale,
//! and a stale framebuffer that is still bound is re-bound before the next
//! operation that reads or writes its attachments.

use bitflags::bitflags;
use fnv::{FnvHashMap, FnvHashSet};
use log::trace;

use crate::device::Gl;
use crate::gl::{self, GLenum, GLint, GLuint};

/// The image attached at one attachment point.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttachedObject {
    Texture { id: GLuint, level: GLint },
    Renderbuffer(GLuint),
}

bitflags! {
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    struct FramebufferRebindingFlags: u8 {
        const REBIND_READ_FRAMEBUFFER = 0x1;
        const REBIND_DRAW_FRAMEBUFFER = 0x2;
    }
}

/// The bindings that must be re-issued before the next framebuffer access.
#[derive(Debug)]
pub struct FramebufferRebinding {
    flags: FramebufferRebindingFlags,
    read_framebuffer: GLuint,
    draw_framebuffer: GLuint,
}

impl FramebufferRebinding {
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn apply(self, gl: &dyn Gl) {
        let both = FramebufferRebindingFlags::REBIND_READ_FRAMEBUFFER |
            FramebufferRebindingFlags::REBIND_DRAW_FRAMEBUFFER;
        if self.flags == both && self.read_framebuffer == self.draw_framebuffer {
            trace!("Rebinding stale framebuffer {}", self.draw_framebuffer);
            gl.bind_framebuffer(gl::FRAMEBUFFER, self.draw_framebuffer);
            return;
        }
        if self
            .flags
            .contains(FramebufferRebindingFlags::REBIND_READ_FRAMEBUFFER)
        {
            trace!("Rebinding stale read framebuffer {}", self.read_framebuffer);
            gl.bind_framebuffer(gl::READ_FRAMEBUFFER, self.read_framebuffer);
        }
        if self
            .flags
            .contains(FramebufferRebindingFlags::REBIND_DRAW_FRAMEBUFFER)
        {
            trace!("Rebinding stale draw framebuffer {}", self.draw_framebuffer);
            gl.bind_framebuffer(gl::DRAW_FRAMEBUFFER, self.draw_framebuffer);
        }
    }
}

/// Per-context mirror of framebuffer attachments and of the bindings that
/// decide which objects a call operates on.
#[derive(Debug)]
pub struct RenderTargetTracker {
    attachments: FnvHashMap<GLuint, FnvHashMap<GLenum, AttachedObject>>,
    stale: FnvHashSet<GLuint>,
    read_framebuffer: GLuint,
    draw_framebuffer: GLuint,
    renderbuffer: GLuint,
    active_unit: GLenum,
    textures: FnvHashMap<(GLenum, GLenum), GLuint>,
}

impl Default for RenderTargetTracker {
    fn default() -> Self {
        RenderTargetTracker {
            attachments: FnvHashMap::default(),
            stale: FnvHashSet::default(),
            read_framebuffer: 0,
            draw_framebuffer: 0,
            renderbuffer: 0,
            active_unit: gl::TEXTURE0,
            textures: FnvHashMap::default(),
        }
    }
}

/// Maps a texture image target to the binding point it is resolved through.
pub fn texture_binding_target(target: GLenum) -> GLenum {
    match target {
        gl::TEXTURE_CUBE_MAP_POSITIVE_X |
        gl::TEXTURE_CUBE_MAP_NEGATIVE_X |
        gl::TEXTURE_CUBE_MAP_POSITIVE_Y |
        gl::TEXTURE_CUBE_MAP_NEGATIVE_Y |
        gl::TEXTURE_CUBE_MAP_POSITIVE_Z |
        gl::TEXTURE_CUBE_MAP_NEGATIVE_Z => gl::TEXTURE_CUBE_MAP,
        other => other,
    }
}

impl RenderTargetTracker {
    pub fn new() -> RenderTargetTracker {
        RenderTargetTracker::default()
    }

    pub fn bind_framebuffer(&mut self, target: GLenum, framebuffer: GLuint) {
        // Binding re-resolves render targets, unless the other binding point
        // still holds the framebuffer with its old targets.
        let resolved = match target {
            gl::FRAMEBUFFER => {
                self.read_framebuffer = framebuffer;
                self.draw_framebuffer = framebuffer;
                true
            },
            gl::READ_FRAMEBUFFER => {
                self.read_framebuffer = framebuffer;
                self.draw_framebuffer != framebuffer
            },
            gl::DRAW_FRAMEBUFFER => {
                self.draw_framebuffer = framebuffer;
                self.read_framebuffer != framebuffer
            },
            _ => return,
        };
        if resolved {
            self.stale.remove(&framebuffer);
        }
    }

    pub fn bind_renderbuffer(&mut self, target: GLenum, renderbuffer: GLuint) {
        if target == gl::RENDERBUFFER {
            self.renderbuffer = renderbuffer;
        }
    }

    pub fn active_texture(&mut self, unit: GLenum) {
        self.active_unit = unit;
    }

    pub fn bind_texture(&mut self, target: GLenum, texture: GLuint) {
        if texture == 0 {
            self.textures.remove(&(self.active_unit, target));
        } else {
            self.textures.insert((self.active_unit, target), texture);
        }
    }

    /// The texture an image call on `target` affects.
    pub fn bound_texture(&self, target: GLenum) -> GLuint {
        self.textures
            .get(&(self.active_unit, texture_binding_target(target)))
            .copied()
            .unwrap_or(0)
    }

    pub fn bound_renderbuffer(&self) -> GLuint {
        self.renderbuffer
    }

    pub fn bound_framebuffer(&self, target: GLenum) -> GLuint {
        match target {
            gl::READ_FRAMEBUFFER => self.read_framebuffer,
            _ => self.draw_framebuffer,
        }
    }

    pub fn attachment(&self, framebuffer: GLuint, attachment: GLenum) -> Option<AttachedObject> {
        self.attachments
            .get(&framebuffer)
            .and_then(|points| points.get(&attachment))
            .copied()
    }

    pub fn is_stale(&self, framebuffer: GLuint) -> bool {
        self.stale.contains(&framebuffer)
    }

    /// Records an attachment change on the framebuffer bound to `target`.
    /// `DEPTH_STENCIL_ATTACHMENT` is recorded at both of its points.
    pub fn attach(&mut self, target: GLenum, attachment: GLenum, object: Option<AttachedObject>) {
        let framebuffer = self.bound_framebuffer(target);
        if framebuffer == 0 {
            return;
        }
        let points: &[GLenum] = if attachment == gl::DEPTH_STENCIL_ATTACHMENT {
            &[gl::DEPTH_ATTACHMENT, gl::STENCIL_ATTACHMENT]
        } else {
            &[attachment]
        };
        let attachments = self.attachments.entry(framebuffer).or_default();
        for &point in points {
            match object {
                Some(object) => attachments.insert(point, object),
                None => attachments.remove(&point),
            };
        }
        self.mark_stale(framebuffer);
    }

    pub fn mark_stale(&mut self, framebuffer: GLuint) {
        if framebuffer != 0 {
            self.stale.insert(framebuffer);
        }
    }

    /// Draw buffer changes only affect the bound draw framebuffer.
    pub fn draw_buffers_changed(&mut self) {
        self.mark_stale(self.draw_framebuffer);
    }

    /// The storage of `texture` was reallocated.
    pub fn texture_respecified(&mut self, texture: GLuint) {
        self.mark_holders_stale(|object| matches!(object, AttachedObject::Texture { id, .. } if id == texture));
    }

    /// The storage of `renderbuffer` was reallocated.
    pub fn renderbuffer_respecified(&mut self, renderbuffer: GLuint) {
        self.mark_holders_stale(|object| object == AttachedObject::Renderbuffer(renderbuffer));
    }

    pub fn texture_deleted(&mut self, texture: GLuint) {
        self.textures.retain(|_, bound| *bound != texture);
        self.detach_everywhere(|object| matches!(object, AttachedObject::Texture { id, .. } if id == texture));
    }

    pub fn renderbuffer_deleted(&mut self, renderbuffer: GLuint) {
        if self.renderbuffer == renderbuffer {
            self.renderbuffer = 0;
        }
        self.detach_everywhere(|object| object == AttachedObject::Renderbuffer(renderbuffer));
    }

    pub fn framebuffer_deleted(&mut self, framebuffer: GLuint) {
        self.attachments.remove(&framebuffer);
        self.stale.remove(&framebuffer);
        if self.read_framebuffer == framebuffer {
            self.read_framebuffer = 0;
        }
        if self.draw_framebuffer == framebuffer {
            self.draw_framebuffer = 0;
        }
    }

    /// Returns the stale bindings to re-issue and considers them fresh.
    pub fn take_stale_bindings(&mut self) -> FramebufferRebinding {
        let mut flags = FramebufferRebindingFlags::empty();
        if self.is_stale(self.read_framebuffer) {
            flags.insert(FramebufferRebindingFlags::REBIND_READ_FRAMEBUFFER);
        }
        if self.is_stale(self.draw_framebuffer) {
            flags.insert(FramebufferRebindingFlags::REBIND_DRAW_FRAMEBUFFER);
        }
        self.stale.remove(&self.read_framebuffer);
        self.stale.remove(&self.draw_framebuffer);
        FramebufferRebinding {
            flags,
            read_framebuffer: self.read_framebuffer,
            draw_framebuffer: self.draw_framebuffer,
        }
    }

    fn mark_holders_stale<F>(&mut self, holds: F)
    where
        F: Fn(AttachedObject) -> bool,
    {
        for (&framebuffer, points) in &self.attachments {
            if points.values().any(|&object| holds(object)) {
                self.stale.insert(framebuffer);
            }
        }
    }

    fn detach_everywhere<F>(&mut self, holds: F)
    where
        F: Fn(AttachedObject) -> bool,
    {
        for (&framebuffer, points) in self.attachments.iter_mut() {
            let before = points.len();
            points.retain(|_, object| !holds(*object));
            if points.len() != before {
                self.stale.insert(framebuffer);
            }
        }
    }
}
