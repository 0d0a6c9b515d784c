//! Vulkan conversions for barrier batches.
//!
//! A Vulkan encoder calls [`record_barrier_batch`] from
//! [`CommandEncoder::pipeline_barrier`](crate::backend::CommandEncoder::pipeline_barrier),
//! resolving texture and buffer handles through its own resource tables.

use ash::vk;

use super::{AccessFlags, BarrierBatch, ImageAspect, PipelineStages, TextureLayout};
use crate::resources::{Buffer, Texture};

impl PipelineStages {
    pub fn to_vk(self) -> vk::PipelineStageFlags {
        const TABLE: [(PipelineStages, vk::PipelineStageFlags); 16] = [
            (PipelineStages::TOP_OF_PIPE, vk::PipelineStageFlags::TOP_OF_PIPE),
            (PipelineStages::DRAW_INDIRECT, vk::PipelineStageFlags::DRAW_INDIRECT),
            (PipelineStages::VERTEX_INPUT, vk::PipelineStageFlags::VERTEX_INPUT),
            (PipelineStages::VERTEX_SHADER, vk::PipelineStageFlags::VERTEX_SHADER),
            (PipelineStages::FRAGMENT_SHADER, vk::PipelineStageFlags::FRAGMENT_SHADER),
            (
                PipelineStages::EARLY_FRAGMENT_TESTS,
                vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            ),
            (
                PipelineStages::LATE_FRAGMENT_TESTS,
                vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
            ),
            (
                PipelineStages::COLOR_ATTACHMENT_OUTPUT,
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            ),
            (PipelineStages::COMPUTE_SHADER, vk::PipelineStageFlags::COMPUTE_SHADER),
            (PipelineStages::TRANSFER, vk::PipelineStageFlags::TRANSFER),
            (PipelineStages::BOTTOM_OF_PIPE, vk::PipelineStageFlags::BOTTOM_OF_PIPE),
            (PipelineStages::ALL_COMMANDS, vk::PipelineStageFlags::ALL_COMMANDS),
            (
                PipelineStages::TRANSFORM_FEEDBACK,
                vk::PipelineStageFlags::TRANSFORM_FEEDBACK_EXT,
            ),
            (
                PipelineStages::ACCEL_STRUCT_BUILD,
                vk::PipelineStageFlags::ACCELERATION_STRUCTURE_BUILD_KHR,
            ),
            (
                PipelineStages::RAY_TRACING_SHADER,
                vk::PipelineStageFlags::RAY_TRACING_SHADER_KHR,
            ),
            (
                PipelineStages::SHADING_RATE_ATTACHMENT,
                vk::PipelineStageFlags::FRAGMENT_SHADING_RATE_ATTACHMENT_KHR,
            ),
        ];

        TABLE
            .iter()
            .filter(|(ours, _)| self.contains(*ours))
            .fold(vk::PipelineStageFlags::empty(), |acc, (_, vk)| acc | *vk)
    }
}

impl AccessFlags {
    pub fn to_vk(self) -> vk::AccessFlags {
        const TABLE: [(AccessFlags, vk::AccessFlags); 18] = [
            (AccessFlags::INDIRECT_COMMAND_READ, vk::AccessFlags::INDIRECT_COMMAND_READ),
            (AccessFlags::INDEX_READ, vk::AccessFlags::INDEX_READ),
            (AccessFlags::VERTEX_ATTRIBUTE_READ, vk::AccessFlags::VERTEX_ATTRIBUTE_READ),
            (AccessFlags::UNIFORM_READ, vk::AccessFlags::UNIFORM_READ),
            (AccessFlags::SHADER_READ, vk::AccessFlags::SHADER_READ),
            (AccessFlags::SHADER_WRITE, vk::AccessFlags::SHADER_WRITE),
            (AccessFlags::COLOR_ATTACHMENT_READ, vk::AccessFlags::COLOR_ATTACHMENT_READ),
            (AccessFlags::COLOR_ATTACHMENT_WRITE, vk::AccessFlags::COLOR_ATTACHMENT_WRITE),
            (
                AccessFlags::DEPTH_STENCIL_READ,
                vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ,
            ),
            (
                AccessFlags::DEPTH_STENCIL_WRITE,
                vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            ),
            (AccessFlags::TRANSFER_READ, vk::AccessFlags::TRANSFER_READ),
            (AccessFlags::TRANSFER_WRITE, vk::AccessFlags::TRANSFER_WRITE),
            (AccessFlags::MEMORY_READ, vk::AccessFlags::MEMORY_READ),
            (AccessFlags::MEMORY_WRITE, vk::AccessFlags::MEMORY_WRITE),
            (
                AccessFlags::TRANSFORM_FEEDBACK_WRITE,
                vk::AccessFlags::TRANSFORM_FEEDBACK_WRITE_EXT,
            ),
            (
                AccessFlags::ACCEL_STRUCT_READ,
                vk::AccessFlags::ACCELERATION_STRUCTURE_READ_KHR,
            ),
            (
                AccessFlags::ACCEL_STRUCT_WRITE,
                vk::AccessFlags::ACCELERATION_STRUCTURE_WRITE_KHR,
            ),
            (
                AccessFlags::SHADING_RATE_READ,
                vk::AccessFlags::FRAGMENT_SHADING_RATE_ATTACHMENT_READ_KHR,
            ),
        ];

        TABLE
            .iter()
            .filter(|(ours, _)| self.contains(*ours))
            .fold(vk::AccessFlags::empty(), |acc, (_, vk)| acc | *vk)
    }
}

impl TextureLayout {
    pub fn to_vk(self) -> vk::ImageLayout {
        match self {
            Self::Undefined => vk::ImageLayout::UNDEFINED,
            Self::General => vk::ImageLayout::GENERAL,
            Self::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            Self::DepthStencilAttachment => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            Self::DepthStencilReadOnly => vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
            Self::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            Self::TransferSrc => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            Self::TransferDst => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            Self::PresentSrc => vk::ImageLayout::PRESENT_SRC_KHR,
            Self::ShadingRateAttachment => {
                vk::ImageLayout::FRAGMENT_SHADING_RATE_ATTACHMENT_OPTIMAL_KHR
            }
        }
    }
}

impl ImageAspect {
    pub fn to_vk(self) -> vk::ImageAspectFlags {
        let mut flags = vk::ImageAspectFlags::empty();
        if self.contains(Self::COLOR) {
            flags |= vk::ImageAspectFlags::COLOR;
        }
        if self.contains(Self::DEPTH) {
            flags |= vk::ImageAspectFlags::DEPTH;
        }
        if self.contains(Self::STENCIL) {
            flags |= vk::ImageAspectFlags::STENCIL;
        }
        flags
    }
}

/// Record one batch as a single `vkCmdPipelineBarrier`.
///
/// Transitions whose resource has no Vulkan handle (`image_of` / `buffer_of`
/// return `None`) are skipped. Nothing is recorded for an empty batch.
///
/// # Safety
///
/// `cmd` must be a command buffer in the recording state allocated from
/// `device`, and every returned handle must be a live object of `device`.
pub unsafe fn record_barrier_batch(
    device: &ash::Device,
    cmd: vk::CommandBuffer,
    batch: &BarrierBatch,
    image_of: impl Fn(&Texture) -> Option<vk::Image>,
    buffer_of: impl Fn(&Buffer) -> Option<vk::Buffer>,
) {
    let image_barriers: Vec<vk::ImageMemoryBarrier> = batch
        .textures
        .iter()
        .filter_map(|transition| {
            let image = image_of(&transition.texture)?;
            let range = transition.subresources;
            Some(
                vk::ImageMemoryBarrier::default()
                    .old_layout(transition.old_layout.to_vk())
                    .new_layout(transition.new_layout.to_vk())
                    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .image(image)
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: transition.aspect.to_vk(),
                        base_mip_level: range.base_mip_level,
                        level_count: range.num_mip_levels,
                        base_array_layer: range.base_array_slice,
                        layer_count: range.num_array_slices,
                    })
                    .src_access_mask(transition.src_access.to_vk())
                    .dst_access_mask(transition.dst_access.to_vk()),
            )
        })
        .collect();

    let buffer_barriers: Vec<vk::BufferMemoryBarrier> = batch
        .buffers
        .iter()
        .filter_map(|transition| {
            let buffer = buffer_of(&transition.buffer)?;
            Some(
                vk::BufferMemoryBarrier::default()
                    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .buffer(buffer)
                    .offset(0)
                    .size(vk::WHOLE_SIZE)
                    .src_access_mask(transition.src_access.to_vk())
                    .dst_access_mask(transition.dst_access.to_vk()),
            )
        })
        .collect();

    if image_barriers.is_empty() && buffer_barriers.is_empty() {
        return;
    }

    unsafe {
        device.cmd_pipeline_barrier(
            cmd,
            batch.src_stages.to_vk(),
            batch.dst_stages.to_vk(),
            vk::DependencyFlags::empty(),
            &[],
            &buffer_barriers,
            &image_barriers,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_layout_to_vk() {
        assert_eq!(TextureLayout::Undefined.to_vk(), vk::ImageLayout::UNDEFINED);
        assert_eq!(
            TextureLayout::ColorAttachment.to_vk(),
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL
        );
        assert_eq!(TextureLayout::General.to_vk(), vk::ImageLayout::GENERAL);
    }

    #[test]
    fn test_flag_conversions() {
        assert_eq!(
            (PipelineStages::EARLY_FRAGMENT_TESTS | PipelineStages::LATE_FRAGMENT_TESTS).to_vk(),
            vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
                | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS
        );
        assert_eq!(
            (AccessFlags::SHADER_READ | AccessFlags::SHADER_WRITE).to_vk(),
            vk::AccessFlags::SHADER_READ | vk::AccessFlags::SHADER_WRITE
        );
        assert_eq!(
            (ImageAspect::DEPTH | ImageAspect::STENCIL).to_vk(),
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        );
        assert_eq!(PipelineStages::empty().to_vk(), vk::PipelineStageFlags::empty());
    }
}
