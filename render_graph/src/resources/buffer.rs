//! GPU buffer resource.

use parking_lot::RwLock;

use crate::types::{BufferDescriptor, ResourceStates};

/// Stable identity of a [`Buffer`], unique per [`GraphicsDevice`](crate::GraphicsDevice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub(crate) u64);

impl BufferId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// A GPU buffer resource.
///
/// Buffers are created by [`GraphicsDevice::create_buffer`](crate::GraphicsDevice::create_buffer)
/// and shared as `Arc<Buffer>`. Besides the descriptor, a buffer carries its
/// permanent state once a command stream has promoted it; from then on no
/// stream transitions it again.
pub struct Buffer {
    id: BufferId,
    descriptor: BufferDescriptor,
    permanent_state: RwLock<Option<ResourceStates>>,
}

impl Buffer {
    pub(crate) fn new(id: BufferId, descriptor: BufferDescriptor) -> Self {
        Self {
            id,
            descriptor,
            permanent_state: RwLock::new(None),
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Get the buffer descriptor.
    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.descriptor
    }

    /// Get the buffer size in bytes.
    pub fn size(&self) -> u64 {
        self.descriptor.size
    }

    /// Get the buffer label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }

    /// Label for diagnostics, falling back to the id.
    pub fn debug_name(&self) -> String {
        match self.label() {
            Some(label) => label.to_string(),
            None => format!("buffer#{}", self.id.0),
        }
    }

    /// The locked state, if the buffer has been made permanent.
    pub fn permanent_state(&self) -> Option<ResourceStates> {
        *self.permanent_state.read()
    }

    pub(crate) fn permanent_state_lock(&self) -> &RwLock<Option<ResourceStates>> {
        &self.permanent_state
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id.0)
            .field("size", &self.descriptor.size)
            .field("usage", &self.descriptor.usage)
            .field("label", &self.descriptor.label)
            .finish()
    }
}

static_assertions::assert_impl_all!(Buffer: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BufferUsage;

    #[test]
    fn test_buffer_debug() {
        let buffer = Buffer::new(BufferId(3), BufferDescriptor::new(1024, BufferUsage::VERTEX));
        let debug = format!("{:?}", buffer);
        assert!(debug.contains("Buffer"));
        assert!(debug.contains("1024"));
    }

    #[test]
    fn test_debug_name_falls_back_to_id() {
        let unnamed = Buffer::new(BufferId(7), BufferDescriptor::new(16, BufferUsage::UNIFORM));
        assert_eq!(unnamed.debug_name(), "buffer#7");

        let named = Buffer::new(
            BufferId(8),
            BufferDescriptor::new(16, BufferUsage::UNIFORM).with_label("lights"),
        );
        assert_eq!(named.debug_name(), "lights");
    }

    #[test]
    fn test_starts_without_permanent_state() {
        let buffer = Buffer::new(BufferId(1), BufferDescriptor::new(16, BufferUsage::STORAGE));
        assert_eq!(buffer.permanent_state(), None);
    }
}
