//! GPU texture resource.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::types::{ResourceStates, TextureDescriptor, TextureFormat};

/// Stable identity of a [`Texture`], unique per [`GraphicsDevice`](crate::GraphicsDevice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub(crate) u64);

impl TextureId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// A GPU texture resource.
///
/// Created by [`GraphicsDevice::create_texture`](crate::GraphicsDevice::create_texture)
/// and shared as `Arc<Texture>`.
pub struct Texture {
    id: TextureId,
    descriptor: TextureDescriptor,
    permanent_state: RwLock<Option<ResourceStates>>,
    /// Set once a keep-initial-state texture has been submitted; until then it
    /// is assumed to be in `COMMON`.
    state_initialized: AtomicBool,
}

impl Texture {
    pub(crate) fn new(id: TextureId, descriptor: TextureDescriptor) -> Self {
        Self {
            id,
            descriptor,
            permanent_state: RwLock::new(None),
            state_initialized: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Get the texture descriptor.
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    pub fn format(&self) -> TextureFormat {
        self.descriptor.format
    }

    pub fn mip_level_count(&self) -> u32 {
        self.descriptor.mip_level_count
    }

    pub fn array_layer_count(&self) -> u32 {
        self.descriptor.array_layer_count
    }

    /// Get the texture label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }

    /// Label for diagnostics, falling back to the id.
    pub fn debug_name(&self) -> String {
        match self.label() {
            Some(label) => label.to_string(),
            None => format!("texture#{}", self.id.0),
        }
    }

    /// The locked state, if the texture has been made permanent.
    pub fn permanent_state(&self) -> Option<ResourceStates> {
        *self.permanent_state.read()
    }

    pub(crate) fn permanent_state_lock(&self) -> &RwLock<Option<ResourceStates>> {
        &self.permanent_state
    }

    /// Whether the texture has already been left in its initial state by a
    /// submitted command stream.
    pub fn state_initialized(&self) -> bool {
        self.state_initialized.load(Ordering::Acquire)
    }

    pub(crate) fn mark_state_initialized(&self) {
        self.state_initialized.store(true, Ordering::Release);
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id.0)
            .field("size", &self.descriptor.size)
            .field("format", &self.descriptor.format)
            .field("mips", &self.descriptor.mip_level_count)
            .field("layers", &self.descriptor.array_layer_count)
            .field("label", &self.descriptor.label)
            .finish()
    }
}

static_assertions::assert_impl_all!(Texture: Send, Sync);
