//! Grouping of tracker barriers into backend pipeline barriers.

use std::sync::Arc;

use super::mapping::{
    AccessFlags, ImageAspect, PipelineStages, TextureLayout, dst_stages, src_stages,
    state_mapping,
};
use crate::resources::{Buffer, Texture};
use crate::tracking::{BufferBarrier, TextureBarrier};
use crate::types::TextureSubresourceSet;

/// One image memory barrier.
#[derive(Debug, Clone)]
pub struct TextureTransition {
    pub texture: Arc<Texture>,
    /// Resolved range: the whole texture, or exactly one subresource.
    pub subresources: TextureSubresourceSet,
    pub old_layout: TextureLayout,
    pub new_layout: TextureLayout,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
    pub aspect: ImageAspect,
}

/// One buffer memory barrier over the whole buffer.
#[derive(Debug, Clone)]
pub struct BufferTransition {
    pub buffer: Arc<Buffer>,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
}

/// Barriers sharing one source/destination stage pair, submitted as a single
/// pipeline barrier command.
#[derive(Debug, Clone, Default)]
pub struct BarrierBatch {
    pub src_stages: PipelineStages,
    pub dst_stages: PipelineStages,
    pub textures: Vec<TextureTransition>,
    pub buffers: Vec<BufferTransition>,
}

impl BarrierBatch {
    fn new(src_stages: PipelineStages, dst_stages: PipelineStages) -> Self {
        Self {
            src_stages,
            dst_stages,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty() && self.buffers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.textures.len() + self.buffers.len()
    }
}

fn batch_for(
    batches: &mut Vec<BarrierBatch>,
    src: PipelineStages,
    dst: PipelineStages,
) -> &mut BarrierBatch {
    let reuse = batches
        .last()
        .is_some_and(|last| last.src_stages == src && last.dst_stages == dst);
    if !reuse {
        batches.push(BarrierBatch::new(src, dst));
    }
    let last = batches.len() - 1;
    &mut batches[last]
}

/// Convert queued barriers into pipeline barrier batches.
///
/// Texture barriers come first, then buffer barriers, each in queue order.
/// Consecutive barriers with the same stage pair share a batch.
pub fn build_barrier_batches(
    texture_barriers: &[TextureBarrier],
    buffer_barriers: &[BufferBarrier],
) -> Vec<BarrierBatch> {
    let mut batches = Vec::new();

    for barrier in texture_barriers {
        let desc = barrier.texture.descriptor();
        let before = state_mapping(barrier.state_before);
        let after = state_mapping(barrier.state_after);

        let subresources = if barrier.entire_texture {
            TextureSubresourceSet::ALL.resolve(desc)
        } else {
            TextureSubresourceSet::single(barrier.mip_level, barrier.array_slice)
        };

        batch_for(
            &mut batches,
            src_stages(barrier.state_before),
            dst_stages(barrier.state_after),
        )
        .textures
        .push(TextureTransition {
            texture: Arc::clone(&barrier.texture),
            subresources,
            old_layout: before.layout,
            new_layout: after.layout,
            src_access: before.access,
            dst_access: after.access,
            aspect: ImageAspect::from_format(desc.format),
        });
    }

    for barrier in buffer_barriers {
        batch_for(
            &mut batches,
            src_stages(barrier.state_before),
            dst_stages(barrier.state_after),
        )
        .buffers
        .push(BufferTransition {
            buffer: Arc::clone(&barrier.buffer),
            src_access: state_mapping(barrier.state_before).access,
            dst_access: state_mapping(barrier.state_after).access,
        });
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{BufferId, TextureId};
    use crate::types::{
        BufferDescriptor, BufferUsage, ResourceStates, TextureDescriptor, TextureFormat,
        TextureUsage,
    };

    fn texture(id: u64, format: TextureFormat) -> Arc<Texture> {
        Arc::new(Texture::new(
            TextureId(id),
            TextureDescriptor::new_2d(16, 16, format, TextureUsage::all())
                .with_mip_levels(3)
                .with_array_layers(2),
        ))
    }

    fn texture_barrier(
        texture: &Arc<Texture>,
        before: ResourceStates,
        after: ResourceStates,
    ) -> TextureBarrier {
        TextureBarrier {
            texture: Arc::clone(texture),
            mip_level: 0,
            array_slice: 0,
            entire_texture: true,
            state_before: before,
            state_after: after,
        }
    }

    #[test]
    fn test_empty_input_produces_no_batches() {
        assert!(build_barrier_batches(&[], &[]).is_empty());
    }

    #[test]
    fn test_consecutive_equal_stage_pairs_share_batch() {
        let a = texture(1, TextureFormat::Rgba8Unorm);
        let b = texture(2, TextureFormat::Rgba8Unorm);
        let c = texture(3, TextureFormat::Rgba8Unorm);

        let barriers = [
            texture_barrier(&a, ResourceStates::RENDER_TARGET, ResourceStates::SHADER_RESOURCE),
            texture_barrier(&b, ResourceStates::RENDER_TARGET, ResourceStates::SHADER_RESOURCE),
            texture_barrier(&c, ResourceStates::COMMON, ResourceStates::COPY_DEST),
            texture_barrier(&a, ResourceStates::RENDER_TARGET, ResourceStates::SHADER_RESOURCE),
        ];

        let batches = build_barrier_batches(&barriers, &[]);
        let sizes: Vec<usize> = batches.iter().map(BarrierBatch::len).collect();
        assert_eq!(sizes, vec![2, 1, 1]);
        assert_eq!(batches[0].src_stages, PipelineStages::COLOR_ATTACHMENT_OUTPUT);
        assert_eq!(batches[0].dst_stages, PipelineStages::ALL_COMMANDS);
        assert_eq!(batches[1].src_stages, PipelineStages::TOP_OF_PIPE);
        assert_eq!(batches[1].dst_stages, PipelineStages::TRANSFER);
    }

    #[test]
    fn test_texture_transition_fields() {
        let depth = texture(1, TextureFormat::Depth32Float);
        let mut barrier =
            texture_barrier(&depth, ResourceStates::DEPTH_WRITE, ResourceStates::DEPTH_READ);
        barrier.entire_texture = false;
        barrier.mip_level = 2;
        barrier.array_slice = 1;

        let batches = build_barrier_batches(&[barrier], &[]);
        let transition = &batches[0].textures[0];
        assert_eq!(transition.subresources, TextureSubresourceSet::single(2, 1));
        assert_eq!(transition.old_layout, TextureLayout::DepthStencilAttachment);
        assert_eq!(transition.new_layout, TextureLayout::DepthStencilReadOnly);
        assert_eq!(transition.aspect, ImageAspect::DEPTH);
    }

    #[test]
    fn test_entire_texture_resolves_full_range() {
        let color = texture(1, TextureFormat::Rgba8Unorm);
        let barrier = texture_barrier(&color, ResourceStates::UNKNOWN, ResourceStates::COPY_DEST);

        let batches = build_barrier_batches(&[barrier], &[]);
        let range = batches[0].textures[0].subresources;
        assert_eq!(range.mip_levels(), 0..3);
        assert_eq!(range.array_slices(), 0..2);
        assert_eq!(batches[0].textures[0].old_layout, TextureLayout::Undefined);
    }

    #[test]
    fn test_buffers_follow_textures() {
        let color = texture(1, TextureFormat::Rgba8Unorm);
        let buffer = Arc::new(Buffer::new(
            BufferId(7),
            BufferDescriptor::new(64, BufferUsage::STORAGE),
        ));

        let textures = [texture_barrier(
            &color,
            ResourceStates::UNORDERED_ACCESS,
            ResourceStates::SHADER_RESOURCE,
        )];
        let buffers = [
            BufferBarrier {
                buffer: Arc::clone(&buffer),
                state_before: ResourceStates::UNORDERED_ACCESS,
                state_after: ResourceStates::SHADER_RESOURCE,
            },
            BufferBarrier {
                buffer,
                state_before: ResourceStates::COPY_DEST,
                state_after: ResourceStates::VERTEX_BUFFER,
            },
        ];

        let batches = build_barrier_batches(&textures, &buffers);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].textures.len(), 1);
        assert_eq!(batches[0].buffers.len(), 1);
        assert_eq!(batches[1].buffers[0].dst_access, AccessFlags::VERTEX_ATTRIBUTE_READ);
    }
}
