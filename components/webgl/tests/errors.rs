/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use webgl::WebGLError;
use webgl::gl;

use crate::{attributes, init_context};

#[test]
fn synthesized_error_is_reported_once() {
    let (_device, mut session, id) = init_context(8, 8);
    let mut context = session.context(id).unwrap();
    context.pixel_storei(gl::UNPACK_ALIGNMENT, 3);
    assert_eq!(context.get_error(), gl::INVALID_VALUE);
    assert_eq!(context.get_error(), gl::NO_ERROR);
}

#[test]
fn first_error_wins() {
    let (_device, mut session, id) = init_context(8, 8);
    let mut context = session.context(id).unwrap();
    context.set_error(gl::INVALID_ENUM);
    context.set_error(gl::INVALID_VALUE);
    assert_eq!(context.get_error(), gl::INVALID_ENUM);
    assert_eq!(context.get_error(), gl::NO_ERROR);
}

#[test]
fn pending_driver_error_is_kept_over_synthesized_one() {
    let (device, mut session, id) = init_context(8, 8);
    let native = session.native_context(id).unwrap();
    let mut context = session.context(id).unwrap();

    device.inject_error(native, gl::INVALID_OPERATION);
    context.set_error(gl::INVALID_VALUE);
    assert_eq!(device.pending_error(native), gl::NO_ERROR);
    assert_eq!(context.get_error(), gl::INVALID_OPERATION);
    assert_eq!(context.get_error(), gl::NO_ERROR);
}

#[test]
fn shadowed_error_is_returned_before_querying_driver() {
    let (device, mut session, id) = init_context(8, 8);
    let native = session.native_context(id).unwrap();
    let mut context = session.context(id).unwrap();

    context.set_error(gl::INVALID_ENUM);
    device.inject_error(native, gl::OUT_OF_MEMORY);
    assert_eq!(context.get_error(), gl::INVALID_ENUM);
    assert_eq!(device.pending_error(native), gl::OUT_OF_MEMORY);
    assert_eq!(context.get_error(), gl::OUT_OF_MEMORY);
    assert_eq!(context.get_error(), gl::NO_ERROR);
}

#[test]
fn driver_errors_reach_get_error() {
    let (_device, mut session, id) = init_context(8, 8);
    let mut context = session.context(id).unwrap();
    context.enable(0x1234);
    assert_eq!(context.get_error(), gl::INVALID_ENUM);
    assert_eq!(context.get_error(), gl::NO_ERROR);
}

#[test]
fn errors_are_per_context() {
    let (_device, mut session, first) = init_context(8, 8);
    let second = session.create_context(attributes(8, 8)).unwrap();

    session.context(first).unwrap().set_error(gl::INVALID_ENUM);
    assert_eq!(session.context(second).unwrap().get_error(), gl::NO_ERROR);
    assert_eq!(session.context(first).unwrap().get_error(), gl::INVALID_ENUM);
}

#[test]
fn stream_attributes_reject_negative_values() {
    let (_device, mut session, id) = init_context(8, 8);
    let mut context = session.context(id).unwrap();

    assert_eq!(context.stream_attrib(gl::CONSUMER_LATENCY_USEC_KHR, 5), Ok(()));
    assert_eq!(
        context.stream_attrib(gl::CONSUMER_LATENCY_USEC_KHR, -1),
        Err(WebGLError::InvalidValue)
    );
    assert_eq!(context.get_stream_attrib(gl::CONSUMER_LATENCY_USEC_KHR), Ok(5));
    assert_eq!(context.get_error(), gl::INVALID_VALUE);

    assert_eq!(
        context.stream_attrib(gl::CONSUMER_ACQUIRE_TIMEOUT_USEC_KHR, 1000),
        Ok(())
    );
    assert_eq!(
        context.data().stream_attributes().consumer_acquire_timeout_usec,
        1000
    );
}

#[test]
fn unknown_stream_attribute() {
    let (_device, mut session, id) = init_context(8, 8);
    let mut context = session.context(id).unwrap();
    assert_eq!(context.get_stream_attrib(0x1234), Err(WebGLError::InvalidEnum));
    assert_eq!(context.get_error(), gl::INVALID_ENUM);
}
