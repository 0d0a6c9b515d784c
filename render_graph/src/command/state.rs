//! Pipeline state descriptions consumed by [`CommandStream`](super::CommandStream).

use std::sync::Arc;

use crate::graph::BindingSet;
use crate::resources::{Buffer, Texture, TextureId};
use crate::types::TextureSubresourceSet;

/// What happens to an attachment's contents when a render pass begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadOp {
    #[default]
    Load,
    Clear,
    DontCare,
}

/// What happens to an attachment's contents when a render pass ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StoreOp {
    #[default]
    Store,
    DontCare,
}

/// A texture view used as a render pass attachment.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub texture: Arc<Texture>,
    pub subresources: TextureSubresourceSet,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
}

impl Attachment {
    pub fn new(texture: &Arc<Texture>) -> Self {
        Self {
            texture: Arc::clone(texture),
            subresources: TextureSubresourceSet::single(0, 0),
            load_op: LoadOp::Load,
            store_op: StoreOp::Store,
        }
    }

    pub fn with_subresources(mut self, subresources: TextureSubresourceSet) -> Self {
        self.subresources = subresources;
        self
    }

    pub fn with_load_op(mut self, load_op: LoadOp) -> Self {
        self.load_op = load_op;
        self
    }

    pub fn with_store_op(mut self, store_op: StoreOp) -> Self {
        self.store_op = store_op;
        self
    }

    /// Whether the render pass writes this attachment as depth.
    ///
    /// Clearing or storing writes; otherwise the depth buffer is only tested.
    pub fn writes_depth(&self) -> bool {
        self.load_op == LoadOp::Clear || self.store_op == StoreOp::Store
    }
}

/// Render targets of a render pass.
#[derive(Debug, Clone, Default)]
pub struct FramebufferDesc {
    pub color_attachments: Vec<Attachment>,
    pub depth_attachment: Option<Attachment>,
}

impl FramebufferDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color(mut self, attachment: Attachment) -> Self {
        self.color_attachments.push(attachment);
        self
    }

    pub fn with_depth(mut self, attachment: Attachment) -> Self {
        self.depth_attachment = Some(attachment);
        self
    }

    /// Identity of the attachments, used to detect render pass changes.
    pub(crate) fn attachment_ids(&self) -> Vec<(TextureId, TextureSubresourceSet)> {
        self.color_attachments
            .iter()
            .chain(self.depth_attachment.iter())
            .map(|attachment| (attachment.texture.id(), attachment.subresources))
            .collect()
    }
}

/// A vertex buffer bound to an input slot.
#[derive(Debug, Clone)]
pub struct VertexBufferBinding {
    pub buffer: Arc<Buffer>,
    pub slot: u32,
    pub offset: u64,
}

/// State for subsequent draw calls.
#[derive(Debug, Clone, Default)]
pub struct GraphicsState {
    pub framebuffer: Option<FramebufferDesc>,
    pub bindings: Vec<Arc<BindingSet>>,
    pub vertex_buffers: Vec<VertexBufferBinding>,
    pub index_buffer: Option<Arc<Buffer>>,
    pub indirect_buffer: Option<Arc<Buffer>>,
}

/// State for subsequent dispatches.
#[derive(Debug, Clone, Default)]
pub struct ComputeState {
    pub bindings: Vec<Arc<BindingSet>>,
    pub indirect_buffer: Option<Arc<Buffer>>,
}

/// Arguments of a direct draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DrawArguments {
    /// Vertices per instance, or indices for an indexed draw.
    pub vertex_count: u32,
    pub instance_count: u32,
    pub start_index_location: u32,
    pub start_vertex_location: u32,
    pub start_instance_location: u32,
}

impl DrawArguments {
    pub fn new(vertex_count: u32) -> Self {
        Self {
            vertex_count,
            instance_count: 1,
            ..Default::default()
        }
    }

    pub fn with_instances(mut self, instance_count: u32) -> Self {
        self.instance_count = instance_count;
        self
    }
}

/// One subresource addressed by a texture copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureSlice {
    pub mip_level: u32,
    pub array_slice: u32,
}

impl TextureSlice {
    pub fn new(mip_level: u32, array_slice: u32) -> Self {
        Self {
            mip_level,
            array_slice,
        }
    }

    pub(crate) fn subresources(self) -> TextureSubresourceSet {
        TextureSubresourceSet::single(self.mip_level, self.array_slice)
    }
}
