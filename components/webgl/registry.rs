/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use fnv::{FnvHashMap, FnvHashSet};
use serde::{Deserialize, Serialize};

use crate::gl::GLuint;

/// The GL object namespaces a context can create names in.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum ObjectKind {
    Buffer,
    Framebuffer,
    Program,
    Renderbuffer,
    Shader,
    Texture,
    VertexArray,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 7] = [
        ObjectKind::Buffer,
        ObjectKind::Framebuffer,
        ObjectKind::Program,
        ObjectKind::Renderbuffer,
        ObjectKind::Shader,
        ObjectKind::Texture,
        ObjectKind::VertexArray,
    ];
}

/// The set of object names a context created and has not deleted yet.
/// Driver reference counts are not tracked.
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    objects: FnvHashMap<ObjectKind, FnvHashSet<GLuint>>,
}

impl ObjectRegistry {
    pub fn new() -> ObjectRegistry {
        ObjectRegistry::default()
    }

    /// Returns false if the object was already registered.
    pub fn register(&mut self, kind: ObjectKind, id: GLuint) -> bool {
        self.objects.entry(kind).or_default().insert(id)
    }

    /// Returns false if the object was not registered.
    pub fn unregister(&mut self, kind: ObjectKind, id: GLuint) -> bool {
        self.objects
            .get_mut(&kind)
            .is_some_and(|ids| ids.remove(&id))
    }

    pub fn contains(&self, kind: ObjectKind, id: GLuint) -> bool {
        self.objects.get(&kind).is_some_and(|ids| ids.contains(&id))
    }

    pub fn len(&self) -> usize {
        self.objects.values().map(FnvHashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self, kind: ObjectKind) -> Vec<GLuint> {
        let mut ids: Vec<GLuint> = self
            .objects
            .get(&kind)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    /// Empties the registry, grouping the removed names by kind.
    pub fn drain(&mut self) -> Vec<(ObjectKind, Vec<GLuint>)> {
        let drained = ObjectKind::ALL
            .iter()
            .map(|&kind| (kind, self.ids(kind)))
            .filter(|(_, ids)| !ids.is_empty())
            .collect();
        self.objects.clear();
        drained
    }
}
