/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use fnv::FnvHashMap;
use log::{debug, error, warn};

use crate::active::ActiveContext;
use crate::context::{
    ContextState, GLContextAttributes, GLContextData, NativeHandles, WebGLContextId,
    has_extension, preferred_depth_format,
};
use crate::device::{ConfigRequest, Device, Gl};
use crate::error::{ContextFailure, InvalidContext, WebGLCreateContextError};
use crate::gl::{self, GLuint};
use crate::options::SessionOptions;
use crate::registry::ObjectKind;
use crate::rendering_context::WebGLRenderingContext;

/// Owns the display, every context created on it and the record of which
/// context the driver has current.
///
/// Contexts are only reachable through [`WebGLSession::context`], which makes
/// the context current before handing out an entry point, so no driver call
/// can be issued on behalf of a context that is not current.
pub struct WebGLSession<D: Device> {
    device: D,
    options: SessionOptions,
    /// The initialized display, if any context was ever requested.
    display: Option<D::Display>,
    /// Every context ever created, including failed and disposed ones.
    contexts: FnvHashMap<WebGLContextId, GLContextData<D>>,
    /// Contexts that still own native resources, oldest first.
    live: Vec<WebGLContextId>,
    active: ActiveContext,
    next_context_id: usize,
    /// Surfaces of disposed contexts, destroyed along with the display.
    orphaned_surfaces: Vec<D::Surface>,
}

impl<D: Device> WebGLSession<D> {
    pub fn new(device: D, options: SessionOptions) -> WebGLSession<D> {
        WebGLSession {
            device,
            options,
            display: None,
            contexts: FnvHashMap::default(),
            live: vec![],
            active: ActiveContext::new(),
            next_context_id: 0,
            orphaned_surfaces: vec![],
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn has_display(&self) -> bool {
        self.display.is_some()
    }

    /// Returns the session display, initializing it on first use.
    pub fn acquire_display(&mut self) -> Result<D::Display, ContextFailure> {
        if let Some(display) = self.display {
            return Ok(display);
        }
        let display = self.device.get_display().ok_or(ContextFailure::NoDisplay)?;
        if !self.device.initialize(display) {
            return Err(ContextFailure::DisplayInitialization);
        }
        debug!("Initialized display {:?}", display);
        self.display = Some(display);
        Ok(display)
    }

    /// Creates a context and makes it the active one. Ids are handed out in
    /// creation order starting at zero, failed attempts included.
    pub fn create_context(
        &mut self,
        attributes: GLContextAttributes,
    ) -> Result<WebGLContextId, WebGLCreateContextError> {
        let id = WebGLContextId(self.next_context_id);
        self.next_context_id += 1;
        debug!("WebGLSession::create_context({:?}, {:?})", id, attributes.size());

        // Construction changes the native current context.
        self.active.invalidate();

        let mut data = GLContextData::new(attributes);
        let result = self.create_native(&mut data);
        match result {
            Ok(()) => {
                data.set_state(ContextState::Ready);
                self.active.switch_to(id, || true);
                self.contexts.insert(id, data);
                self.live.push(id);
                debug!("Created WebGL context {:?}", id);
                Ok(id)
            },
            Err(failure) => {
                error!("Error creating WebGL context {:?}: {}", id, failure);
                data.fail(failure);
                self.contexts.insert(id, data);
                Err(WebGLCreateContextError)
            },
        }
    }

    fn create_native(&mut self, data: &mut GLContextData<D>) -> Result<(), ContextFailure> {
        let display = self.acquire_display()?;

        let request = ConfigRequest::new(&self.options, &data.attributes);
        let configs = self.device.choose_config(display, &request, 1);
        if configs.len() != 1 {
            return Err(ContextFailure::ChooseConfig(configs.len()));
        }
        let config = configs[0];

        let context = self
            .device
            .create_context(display, config, self.options.context_client_version)
            .ok_or(ContextFailure::CreateContext)?;
        let Some(surface) =
            self.device
                .create_pbuffer_surface(display, config, data.attributes.size())
        else {
            self.device.destroy_context(display, context);
            return Err(ContextFailure::CreateSurface);
        };
        debug!("Native context {:?} with config {:?}", context, config);
        data.native = Some(NativeHandles {
            config,
            context,
            surface,
        });

        if let Err(failure) = self.load_native(display, data) {
            self.release_native(display, data);
            return Err(failure);
        }
        Ok(())
    }

    fn load_native(
        &self,
        display: D::Display,
        data: &mut GLContextData<D>,
    ) -> Result<(), ContextFailure> {
        let Some((surface, context)) = data.native.as_ref().map(|n| (n.surface, n.context)) else {
            return Err(ContextFailure::CreateContext);
        };
        if !self.device.make_current(display, Some((surface, context))) {
            return Err(ContextFailure::MakeCurrent);
        }
        let gl = self
            .device
            .load_gl(display, context)
            .ok_or(ContextFailure::LoadFunctions)?;

        let extensions = gl.get_string(gl::EXTENSIONS);
        if let Some(missing) = self
            .options
            .required_extensions
            .iter()
            .find(|name| !has_extension(&extensions, name))
        {
            return Err(ContextFailure::MissingExtension(missing.clone()));
        }
        data.preferred_depth_format = preferred_depth_format(&extensions);
        data.gl = Some(gl);
        Ok(())
    }

    /// Releases the handles a failed construction got hold of.
    fn release_native(&mut self, display: D::Display, data: &mut GLContextData<D>) {
        data.gl = None;
        if let Some(native) = data.native.take() {
            self.device.make_current(display, None);
            self.device.destroy_context(display, native.context);
            self.device.destroy_surface(display, native.surface);
        }
    }

    /// Makes `context_id` current unless it already is.
    fn make_current_if_needed_mut<'a>(
        device: &D,
        display: Option<D::Display>,
        context_id: WebGLContextId,
        contexts: &'a mut FnvHashMap<WebGLContextId, GLContextData<D>>,
        active: &mut ActiveContext,
    ) -> Result<&'a mut GLContextData<D>, InvalidContext> {
        let data = contexts.get_mut(&context_id).ok_or(InvalidContext)?;
        if !data.is_ready() {
            return Err(InvalidContext);
        }
        let (Some(display), Some(native)) = (display, data.native.as_ref()) else {
            return Err(InvalidContext);
        };
        let target = (native.surface, native.context);

        if !active.switch_to(context_id, || device.make_current(display, Some(target))) {
            warn!("Failed to make WebGL context {:?} current", context_id);
            data.fail(ContextFailure::MakeCurrent);
            return Err(InvalidContext);
        }
        Ok(data)
    }

    pub fn make_current_if_needed(&mut self, context_id: WebGLContextId) -> Result<(), InvalidContext> {
        Self::make_current_if_needed_mut(
            &self.device,
            self.display,
            context_id,
            &mut self.contexts,
            &mut self.active,
        )
        .map(|_| ())
    }

    /// Makes `context_id` current and returns its entry points.
    pub fn context(
        &mut self,
        context_id: WebGLContextId,
    ) -> Result<WebGLRenderingContext<'_, D>, InvalidContext> {
        let data = Self::make_current_if_needed_mut(
            &self.device,
            self.display,
            context_id,
            &mut self.contexts,
            &mut self.active,
        )?;
        WebGLRenderingContext::new(context_id, data)
    }

    pub fn context_state(&self, context_id: WebGLContextId) -> Option<&ContextState> {
        self.contexts.get(&context_id).map(GLContextData::state)
    }

    pub fn context_data(&self, context_id: WebGLContextId) -> Option<&GLContextData<D>> {
        self.contexts.get(&context_id)
    }

    pub fn native_context(&self, context_id: WebGLContextId) -> Option<D::Context> {
        let data = self.contexts.get(&context_id)?;
        data.native.as_ref().map(|native| native.context)
    }

    pub fn native_config(&self, context_id: WebGLContextId) -> Option<D::Config> {
        let data = self.contexts.get(&context_id)?;
        data.native.as_ref().map(|native| native.config)
    }

    pub fn native_surface(&self, context_id: WebGLContextId) -> Option<D::Surface> {
        let data = self.contexts.get(&context_id)?;
        data.native.as_ref().map(|native| native.surface)
    }

    pub fn active_context(&self) -> Option<WebGLContextId> {
        self.active.get()
    }

    pub fn live_contexts(&self) -> &[WebGLContextId] {
        &self.live
    }

    /// Deletes every object the context created and destroys the context.
    /// Does nothing for contexts that were already disposed.
    pub fn dispose_context(&mut self, context_id: WebGLContextId) {
        let Some(position) = self.live.iter().position(|id| *id == context_id) else {
            return;
        };
        self.live.remove(position);
        debug!("WebGLSession::dispose_context({:?})", context_id);

        // We need to make the context current so its resources can be disposed of.
        let data = match Self::make_current_if_needed_mut(
            &self.device,
            self.display,
            context_id,
            &mut self.contexts,
            &mut self.active,
        ) {
            Ok(data) => data,
            Err(_) => {
                warn!(
                    "Leaking native resources of WebGL context {:?}",
                    context_id
                );
                return;
            },
        };

        data.set_state(ContextState::Destroyed);
        let objects = data.registry.drain();
        if let Some(gl) = data.gl.take() {
            for (kind, ids) in objects {
                delete_objects(&*gl, kind, &ids);
            }
        }
        let native = data.native.take();

        let Some(display) = self.display else {
            return;
        };
        self.device.make_current(display, None);
        self.active.invalidate();

        if let Some(native) = native {
            debug!(
                "Destroying native context {:?} created from {:?}",
                native.context, native.config
            );
            self.device.destroy_context(display, native.context);
            if self.options.destroy_surface_on_dispose {
                self.device.destroy_surface(display, native.surface);
            } else {
                self.orphaned_surfaces.push(native.surface);
            }
        }
    }

    /// Disposes every live context, oldest first, then terminates the
    /// display. A later `create_context` initializes a fresh one.
    pub fn dispose_all(&mut self) {
        while let Some(&context_id) = self.live.first() {
            self.dispose_context(context_id);
        }
        if let Some(display) = self.display.take() {
            for surface in self.orphaned_surfaces.drain(..) {
                self.device.destroy_surface(display, surface);
            }
            debug!("Terminating display {:?}", display);
            self.device.terminate(display);
        }
        self.active.invalidate();
    }
}

fn delete_objects(gl: &dyn Gl, kind: ObjectKind, ids: &[GLuint]) {
    match kind {
        ObjectKind::Buffer => gl.delete_buffers(ids),
        ObjectKind::Framebuffer => gl.delete_framebuffers(ids),
        ObjectKind::Renderbuffer => gl.delete_renderbuffers(ids),
        ObjectKind::Texture => gl.delete_textures(ids),
        ObjectKind::VertexArray => gl.delete_vertex_arrays(ids),
        ObjectKind::Program => ids.iter().for_each(|&id| gl.delete_program(id)),
        ObjectKind::Shader => ids.iter().for_each(|&id| gl.delete_shader(id)),
    }
}
