//! GPU resources.
//!
//! - [`Buffer`] - GPU memory buffer
//! - [`Texture`] - GPU texture with mip levels and array layers
//!
//! Resources are reference-counted with [`Arc`] and shared across command
//! streams and threads. Hazard tracking never owns them; it keys its per-stream
//! state by [`TextureId`] / [`BufferId`].
//!
//! [`Arc`]: std::sync::Arc

mod buffer;
mod texture;

pub use buffer::{Buffer, BufferId};
pub use texture::{Texture, TextureId};

/// Handle to a frame-local buffer registered with
/// [`RenderGraph::create_buffer`](crate::RenderGraph::create_buffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransientBufferHandle(pub(crate) u32);

/// Handle to a frame-local texture registered with
/// [`RenderGraph::create_texture`](crate::RenderGraph::create_texture).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransientTextureHandle(pub(crate) u32);

/// Any resource a pass can read or write, as seen by the dependency analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceId {
    Texture(TextureId),
    Buffer(BufferId),
    TransientTexture(TransientTextureHandle),
    TransientBuffer(TransientBufferHandle),
}

impl From<TextureId> for ResourceId {
    fn from(id: TextureId) -> Self {
        Self::Texture(id)
    }
}

impl From<BufferId> for ResourceId {
    fn from(id: BufferId) -> Self {
        Self::Buffer(id)
    }
}

impl From<&Texture> for ResourceId {
    fn from(texture: &Texture) -> Self {
        Self::Texture(texture.id())
    }
}

impl From<&Buffer> for ResourceId {
    fn from(buffer: &Buffer) -> Self {
        Self::Buffer(buffer.id())
    }
}

impl From<&std::sync::Arc<Texture>> for ResourceId {
    fn from(texture: &std::sync::Arc<Texture>) -> Self {
        Self::Texture(texture.id())
    }
}

impl From<&std::sync::Arc<Buffer>> for ResourceId {
    fn from(buffer: &std::sync::Arc<Buffer>) -> Self {
        Self::Buffer(buffer.id())
    }
}

impl From<TransientTextureHandle> for ResourceId {
    fn from(handle: TransientTextureHandle) -> Self {
        Self::TransientTexture(handle)
    }
}

impl From<TransientBufferHandle> for ResourceId {
    fn from(handle: TransientBufferHandle) -> Self {
        Self::TransientBuffer(handle)
    }
}
