/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use webgl::device::{ConfigRequest, Device};
use webgl::error::ContextFailure;
use webgl::software::SoftwareDevice;
use webgl::{ContextState, InvalidContext, SessionOptions, WebGLContextId};

use crate::{attributes, init, init_context, init_with};

#[test]
fn display_is_initialized_once() {
    let (device, mut session) = init();
    assert!(!session.has_display());

    let first = session.create_context(attributes(8, 8)).unwrap();
    let second = session.create_context(attributes(8, 8)).unwrap();
    assert_eq!(first, WebGLContextId(0));
    assert_eq!(second, WebGLContextId(1));
    assert!(session.has_display());
    assert!(device.display_initialized());
    assert_eq!(device.initialize_calls(), 1);
    assert_eq!(session.live_contexts(), &[first, second]);
}

#[test]
fn created_context_is_ready_and_current() {
    let (device, session, id) = init_context(8, 8);
    assert_eq!(session.context_state(id), Some(&ContextState::Ready));
    assert_eq!(session.active_context(), Some(id));
    assert_eq!(device.current_context(), session.native_context(id));
    assert_eq!(device.live_contexts(), 1);
    assert_eq!(device.live_surfaces(), 1);
}

#[test]
fn native_handles_are_released_on_dispose() {
    let (device, mut session, id) = init_context(8, 8);
    let display = device.get_display().unwrap();
    let request = ConfigRequest::new(session.options(), &attributes(8, 8));
    let chosen = device.choose_config(display, &request, 1);
    assert_eq!(session.native_config(id), chosen.first().copied());
    assert!(session.native_surface(id).is_some());

    session.dispose_context(id);
    assert_eq!(session.native_config(id), None);
    assert_eq!(session.native_context(id), None);
    assert_eq!(session.native_surface(id), None);
}

#[test]
fn config_selection_must_yield_a_config() {
    let device = SoftwareDevice::new();
    device.set_config_count(0);
    let (device, mut session) = init_with(device, SessionOptions::default());

    assert!(session.create_context(attributes(8, 8)).is_err());
    assert_eq!(
        session.context_state(WebGLContextId(0)),
        Some(&ContextState::Error(ContextFailure::ChooseConfig(0)))
    );
    assert!(session.live_contexts().is_empty());
    assert_eq!(device.live_contexts(), 0);

    // Several matching configs are fine, only the first is asked for.
    device.set_config_count(3);
    let id = session.create_context(attributes(8, 8)).unwrap();
    assert_eq!(id, WebGLContextId(1));
    assert_eq!(session.context_state(id), Some(&ContextState::Ready));
}

#[test]
fn unsatisfiable_config_request_fails() {
    let options = SessionOptions {
        depth_bits: 32,
        ..SessionOptions::default()
    };
    let (_device, mut session) = init_with(SoftwareDevice::new(), options);
    assert!(session.create_context(attributes(8, 8)).is_err());
    assert_eq!(
        session.context_state(WebGLContextId(0)),
        Some(&ContextState::Error(ContextFailure::ChooseConfig(0)))
    );
}

#[test]
fn display_initialization_failure() {
    let device = SoftwareDevice::new();
    device.set_fail_initialize(true);
    let (device, mut session) = init_with(device, SessionOptions::default());

    assert!(session.create_context(attributes(8, 8)).is_err());
    assert_eq!(
        session.context_state(WebGLContextId(0)),
        Some(&ContextState::Error(ContextFailure::DisplayInitialization))
    );
    assert!(!session.has_display());

    // The display is retried by the next creation.
    device.set_fail_initialize(false);
    let id = session.create_context(attributes(8, 8)).unwrap();
    assert_eq!(id, WebGLContextId(1));
    assert_eq!(device.initialize_calls(), 2);
}

#[test]
fn missing_extension_releases_native_handles() {
    let device = SoftwareDevice::with_extensions("GL_OES_packed_depth_stencil GL_OES_depth24");
    let (device, mut session) = init_with(device, SessionOptions::default());

    assert!(session.create_context(attributes(8, 8)).is_err());
    assert_eq!(
        session.context_state(WebGLContextId(0)),
        Some(&ContextState::Error(ContextFailure::MissingExtension(
            "GL_ANGLE_instanced_arrays".to_owned()
        )))
    );
    assert_eq!(device.live_contexts(), 0);
    assert_eq!(device.live_surfaces(), 0);
    assert_eq!(device.destroyed_contexts().len(), 1);
    assert_eq!(device.destroyed_surfaces().len(), 1);
    assert_eq!(device.current_context(), None);
    assert_eq!(session.native_context(WebGLContextId(0)), None);
}

#[test]
fn extension_names_match_whole_tokens() {
    let device = SoftwareDevice::with_extensions(
        "GL_OES_packed_depth_stencil_extra GL_ANGLE_instanced_arrays",
    );
    let (_device, mut session) = init_with(device, SessionOptions::default());
    assert!(session.create_context(attributes(8, 8)).is_err());
}

#[test]
fn surface_creation_failure_destroys_context() {
    let device = SoftwareDevice::new();
    device.set_fail_create_surface(true);
    let (device, mut session) = init_with(device, SessionOptions::default());

    assert!(session.create_context(attributes(8, 8)).is_err());
    assert_eq!(
        session.context_state(WebGLContextId(0)),
        Some(&ContextState::Error(ContextFailure::CreateSurface))
    );
    assert_eq!(device.live_contexts(), 0);
    assert_eq!(device.destroyed_contexts().len(), 1);
}

#[test]
fn make_current_failure_during_creation() {
    let device = SoftwareDevice::new();
    device.fail_next_make_current();
    let (device, mut session) = init_with(device, SessionOptions::default());

    assert!(session.create_context(attributes(8, 8)).is_err());
    assert_eq!(
        session.context_state(WebGLContextId(0)),
        Some(&ContextState::Error(ContextFailure::MakeCurrent))
    );
    assert_eq!(device.live_contexts(), 0);
    assert_eq!(device.live_surfaces(), 0);
    assert_eq!(session.active_context(), None);
}

#[test]
fn failed_contexts_are_unusable() {
    let device = SoftwareDevice::new();
    device.set_config_count(0);
    let (_device, mut session) = init_with(device, SessionOptions::default());
    assert!(session.create_context(attributes(8, 8)).is_err());
    assert_eq!(session.context(WebGLContextId(0)).err(), Some(InvalidContext));
    assert_eq!(session.context(WebGLContextId(5)).err(), Some(InvalidContext));
}

#[test]
fn switching_to_current_context_skips_driver() {
    let (device, mut session, first) = init_context(8, 8);
    let second = session.create_context(attributes(8, 8)).unwrap();
    assert_eq!(session.active_context(), Some(second));

    let calls = device.make_current_calls();
    assert!(session.context(second).is_ok());
    assert_eq!(device.make_current_calls(), calls);

    assert!(session.context(first).is_ok());
    assert_eq!(device.make_current_calls(), calls + 1);
    assert_eq!(device.current_context(), session.native_context(first));

    assert!(session.make_current_if_needed(first).is_ok());
    assert!(session.context(first).is_ok());
    assert_eq!(device.make_current_calls(), calls + 1);
    assert_eq!(session.active_context(), Some(first));
}

#[test]
fn failed_switch_loses_context() {
    let (device, mut session, first) = init_context(8, 8);
    let second = session.create_context(attributes(8, 8)).unwrap();

    device.fail_next_make_current();
    assert_eq!(session.context(first).err(), Some(InvalidContext));
    assert_eq!(
        session.context_state(first),
        Some(&ContextState::Error(ContextFailure::MakeCurrent))
    );
    assert_eq!(session.active_context(), None);

    // A lost context never reaches the driver again.
    let calls = device.make_current_calls();
    assert_eq!(session.context(first).err(), Some(InvalidContext));
    assert_eq!(device.make_current_calls(), calls);

    // Nothing is assumed current after the failure.
    assert!(session.context(second).is_ok());
    assert_eq!(device.make_current_calls(), calls + 1);
    assert_eq!(session.active_context(), Some(second));
}

#[test]
fn contexts_keep_separate_state() {
    let (_device, mut session, first) = init_context(8, 8);
    let second = session.create_context(attributes(8, 8)).unwrap();

    let texture = {
        let mut context = session.context(first).unwrap();
        context.create_texture().unwrap()
    };
    {
        let mut context = session.context(second).unwrap();
        assert!(context.data().registry().is_empty());
        context.clear_color(0., 0., 1., 1.);
    }
    let context = session.context(first).unwrap();
    assert_eq!(context.data().registry().len(), 1);
    assert!(context.data().registry().contains(webgl::registry::ObjectKind::Texture, texture));
}
