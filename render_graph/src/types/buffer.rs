//! Buffer types and descriptors.

use bitflags::bitflags;

use super::ResourceStates;

bitflags! {
    /// Usage flags for buffers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BufferUsage: u32 {
        /// Buffer can be used as a vertex buffer.
        const VERTEX = 1 << 0;
        /// Buffer can be used as an index buffer.
        const INDEX = 1 << 1;
        /// Buffer can be used as a uniform buffer.
        const UNIFORM = 1 << 2;
        /// Buffer can be used as a storage buffer.
        const STORAGE = 1 << 3;
        /// Buffer can be used as an indirect buffer.
        const INDIRECT = 1 << 4;
        /// Buffer can be copied from.
        const COPY_SRC = 1 << 5;
        /// Buffer can be copied to.
        const COPY_DST = 1 << 6;
        /// Buffer is mappable for CPU access.
        const MAP_READ = 1 << 7;
        /// Buffer is mappable for CPU write. Not state tracked.
        const MAP_WRITE = 1 << 8;
        /// Buffer is ring-buffered with one version per use. Not state tracked.
        const DYNAMIC = 1 << 9;
    }
}

/// Descriptor for creating a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BufferDescriptor {
    /// Debug label for the buffer.
    pub label: Option<String>,
    /// Size in bytes.
    pub size: u64,
    /// Usage flags.
    pub usage: BufferUsage,
    /// Restore `initial_state` whenever a command stream using the buffer is
    /// closed.
    pub keep_initial_state: bool,
    /// State the buffer is in when first used.
    pub initial_state: ResourceStates,
}

impl BufferDescriptor {
    /// Create a new buffer descriptor.
    pub fn new(size: u64, usage: BufferUsage) -> Self {
        Self {
            label: None,
            size,
            usage,
            keep_initial_state: false,
            initial_state: ResourceStates::UNKNOWN,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Start every command stream in `state` and return to it on close.
    pub fn with_initial_state(mut self, state: ResourceStates) -> Self {
        self.keep_initial_state = true;
        self.initial_state = state;
        self
    }

    /// Whether the buffer is ring-buffered.
    pub fn is_dynamic(&self) -> bool {
        self.usage.contains(BufferUsage::DYNAMIC)
    }

    /// Whether the CPU writes the buffer directly.
    pub fn is_cpu_writable(&self) -> bool {
        self.usage.contains(BufferUsage::MAP_WRITE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_enables_keep() {
        let desc = BufferDescriptor::new(256, BufferUsage::UNIFORM)
            .with_label("camera")
            .with_initial_state(ResourceStates::CONSTANT_BUFFER);

        assert!(desc.keep_initial_state);
        assert_eq!(desc.initial_state, ResourceStates::CONSTANT_BUFFER);
        assert_eq!(desc.label.as_deref(), Some("camera"));
    }

    #[test]
    fn test_untracked_usages() {
        assert!(BufferDescriptor::new(64, BufferUsage::DYNAMIC).is_dynamic());
        assert!(BufferDescriptor::new(64, BufferUsage::MAP_WRITE).is_cpu_writable());
        let storage = BufferDescriptor::new(64, BufferUsage::STORAGE);
        assert!(!storage.is_dynamic());
        assert!(!storage.is_cpu_writable());
    }
}
