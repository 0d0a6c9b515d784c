//! Resource state to pipeline stage / access / layout mapping.

use bitflags::bitflags;

use crate::types::{ResourceStates, TextureFormat};

bitflags! {
    /// Pipeline stages a barrier waits on or blocks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PipelineStages: u32 {
        const TOP_OF_PIPE = 1 << 0;
        const DRAW_INDIRECT = 1 << 1;
        const VERTEX_INPUT = 1 << 2;
        const VERTEX_SHADER = 1 << 3;
        const FRAGMENT_SHADER = 1 << 4;
        const EARLY_FRAGMENT_TESTS = 1 << 5;
        const LATE_FRAGMENT_TESTS = 1 << 6;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 7;
        const COMPUTE_SHADER = 1 << 8;
        const TRANSFER = 1 << 9;
        const BOTTOM_OF_PIPE = 1 << 10;
        const ALL_COMMANDS = 1 << 11;
        const TRANSFORM_FEEDBACK = 1 << 12;
        const ACCEL_STRUCT_BUILD = 1 << 13;
        const RAY_TRACING_SHADER = 1 << 14;
        const SHADING_RATE_ATTACHMENT = 1 << 15;
    }
}

bitflags! {
    /// Memory access kinds made available or visible by a barrier.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AccessFlags: u32 {
        const INDIRECT_COMMAND_READ = 1 << 0;
        const INDEX_READ = 1 << 1;
        const VERTEX_ATTRIBUTE_READ = 1 << 2;
        const UNIFORM_READ = 1 << 3;
        const SHADER_READ = 1 << 4;
        const SHADER_WRITE = 1 << 5;
        const COLOR_ATTACHMENT_READ = 1 << 6;
        const COLOR_ATTACHMENT_WRITE = 1 << 7;
        const DEPTH_STENCIL_READ = 1 << 8;
        const DEPTH_STENCIL_WRITE = 1 << 9;
        const TRANSFER_READ = 1 << 10;
        const TRANSFER_WRITE = 1 << 11;
        const MEMORY_READ = 1 << 12;
        const MEMORY_WRITE = 1 << 13;
        const TRANSFORM_FEEDBACK_WRITE = 1 << 14;
        const ACCEL_STRUCT_READ = 1 << 15;
        const ACCEL_STRUCT_WRITE = 1 << 16;
        const SHADING_RATE_READ = 1 << 17;
    }
}

bitflags! {
    /// Image aspects covered by a texture barrier.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ImageAspect: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

impl ImageAspect {
    /// Aspects a barrier on a texture of this format must name.
    pub fn from_format(format: TextureFormat) -> Self {
        if format.has_stencil() {
            Self::DEPTH | Self::STENCIL
        } else if format.is_depth_stencil() {
            Self::DEPTH
        } else {
            Self::COLOR
        }
    }
}

/// Image layouts a texture can be transitioned between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureLayout {
    /// Contents undefined, or layout irrelevant for the state.
    #[default]
    Undefined,
    /// Usable by every kind of access, least optimal.
    General,
    ColorAttachment,
    DepthStencilAttachment,
    DepthStencilReadOnly,
    ShaderReadOnly,
    TransferSrc,
    TransferDst,
    PresentSrc,
    ShadingRateAttachment,
}

impl TextureLayout {
    pub fn is_depth_stencil(self) -> bool {
        matches!(
            self,
            Self::DepthStencilAttachment | Self::DepthStencilReadOnly
        )
    }
}

/// Stages, access and layout implied by a set of resource states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateMapping {
    pub stages: PipelineStages,
    pub access: AccessFlags,
    pub layout: TextureLayout,
}

const fn entry(
    state: ResourceStates,
    stages: PipelineStages,
    access: AccessFlags,
    layout: TextureLayout,
) -> (ResourceStates, StateMapping) {
    (
        state,
        StateMapping {
            stages,
            access,
            layout,
        },
    )
}

type S = PipelineStages;
type A = AccessFlags;
type L = TextureLayout;

const STATE_TABLE: [(ResourceStates, StateMapping); 21] = [
    entry(ResourceStates::COMMON, S::TOP_OF_PIPE, A::empty(), L::Undefined),
    entry(
        ResourceStates::CONSTANT_BUFFER,
        S::ALL_COMMANDS,
        A::UNIFORM_READ,
        L::Undefined,
    ),
    entry(
        ResourceStates::VERTEX_BUFFER,
        S::VERTEX_INPUT,
        A::VERTEX_ATTRIBUTE_READ,
        L::Undefined,
    ),
    entry(
        ResourceStates::INDEX_BUFFER,
        S::VERTEX_INPUT,
        A::INDEX_READ,
        L::Undefined,
    ),
    entry(
        ResourceStates::INDIRECT_ARGUMENT,
        S::DRAW_INDIRECT,
        A::INDIRECT_COMMAND_READ,
        L::Undefined,
    ),
    entry(
        ResourceStates::SHADER_RESOURCE,
        S::ALL_COMMANDS,
        A::SHADER_READ,
        L::ShaderReadOnly,
    ),
    entry(
        ResourceStates::UNORDERED_ACCESS,
        S::ALL_COMMANDS,
        A::SHADER_READ.union(A::SHADER_WRITE),
        L::General,
    ),
    entry(
        ResourceStates::RENDER_TARGET,
        S::COLOR_ATTACHMENT_OUTPUT,
        A::COLOR_ATTACHMENT_READ.union(A::COLOR_ATTACHMENT_WRITE),
        L::ColorAttachment,
    ),
    entry(
        ResourceStates::DEPTH_WRITE,
        S::EARLY_FRAGMENT_TESTS.union(S::LATE_FRAGMENT_TESTS),
        A::DEPTH_STENCIL_READ.union(A::DEPTH_STENCIL_WRITE),
        L::DepthStencilAttachment,
    ),
    entry(
        ResourceStates::DEPTH_READ,
        S::EARLY_FRAGMENT_TESTS.union(S::LATE_FRAGMENT_TESTS),
        A::DEPTH_STENCIL_READ,
        L::DepthStencilReadOnly,
    ),
    entry(
        ResourceStates::STREAM_OUT,
        S::TRANSFORM_FEEDBACK,
        A::TRANSFORM_FEEDBACK_WRITE,
        L::Undefined,
    ),
    entry(
        ResourceStates::COPY_DEST,
        S::TRANSFER,
        A::TRANSFER_WRITE,
        L::TransferDst,
    ),
    entry(
        ResourceStates::COPY_SOURCE,
        S::TRANSFER,
        A::TRANSFER_READ,
        L::TransferSrc,
    ),
    entry(
        ResourceStates::RESOLVE_DEST,
        S::TRANSFER,
        A::TRANSFER_WRITE,
        L::TransferDst,
    ),
    entry(
        ResourceStates::RESOLVE_SOURCE,
        S::TRANSFER,
        A::TRANSFER_READ,
        L::TransferSrc,
    ),
    entry(
        ResourceStates::PRESENT,
        S::ALL_COMMANDS,
        A::MEMORY_READ,
        L::PresentSrc,
    ),
    entry(
        ResourceStates::ACCEL_STRUCT_READ,
        S::RAY_TRACING_SHADER.union(S::COMPUTE_SHADER),
        A::ACCEL_STRUCT_READ,
        L::Undefined,
    ),
    entry(
        ResourceStates::ACCEL_STRUCT_WRITE,
        S::ACCEL_STRUCT_BUILD,
        A::ACCEL_STRUCT_WRITE,
        L::Undefined,
    ),
    entry(
        ResourceStates::ACCEL_STRUCT_BUILD_INPUT,
        S::ACCEL_STRUCT_BUILD,
        A::ACCEL_STRUCT_READ,
        L::Undefined,
    ),
    entry(
        ResourceStates::ACCEL_STRUCT_BUILD_BLAS,
        S::ACCEL_STRUCT_BUILD,
        A::ACCEL_STRUCT_READ,
        L::Undefined,
    ),
    entry(
        ResourceStates::SHADING_RATE_SURFACE,
        S::SHADING_RATE_ATTACHMENT,
        A::SHADING_RATE_READ,
        L::ShadingRateAttachment,
    ),
];

/// Combine the stages, access and layout of every bit in `states`.
///
/// Bits asking for different image layouts resolve to
/// [`TextureLayout::General`].
pub fn state_mapping(states: ResourceStates) -> StateMapping {
    let mut result = StateMapping::default();

    for (state, mapping) in &STATE_TABLE {
        if !states.contains(*state) {
            continue;
        }
        result.stages |= mapping.stages;
        result.access |= mapping.access;

        if mapping.layout == TextureLayout::Undefined {
            continue;
        }
        result.layout = match result.layout {
            TextureLayout::Undefined => mapping.layout,
            current if current == mapping.layout => current,
            _ => TextureLayout::General,
        };
    }

    result
}

/// Source stages for a barrier leaving `states`.
pub(crate) fn src_stages(states: ResourceStates) -> PipelineStages {
    let stages = state_mapping(states).stages;
    if stages.is_empty() {
        PipelineStages::TOP_OF_PIPE
    } else {
        stages
    }
}

/// Destination stages for a barrier entering `states`.
pub(crate) fn dst_stages(states: ResourceStates) -> PipelineStages {
    let stages = state_mapping(states).stages;
    if stages.is_empty() {
        PipelineStages::BOTTOM_OF_PIPE
    } else {
        stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_state_mapping() {
        let mapping = state_mapping(ResourceStates::RENDER_TARGET);
        assert_eq!(mapping.stages, PipelineStages::COLOR_ATTACHMENT_OUTPUT);
        assert_eq!(mapping.layout, TextureLayout::ColorAttachment);
        assert!(mapping.access.contains(AccessFlags::COLOR_ATTACHMENT_WRITE));
    }

    #[test]
    fn test_combined_read_states_union() {
        let mapping =
            state_mapping(ResourceStates::INDEX_BUFFER | ResourceStates::INDIRECT_ARGUMENT);
        assert_eq!(
            mapping.stages,
            PipelineStages::VERTEX_INPUT | PipelineStages::DRAW_INDIRECT
        );
        assert_eq!(
            mapping.access,
            AccessFlags::INDEX_READ | AccessFlags::INDIRECT_COMMAND_READ
        );
        assert_eq!(mapping.layout, TextureLayout::Undefined);
    }

    #[test]
    fn test_conflicting_layouts_fall_back_to_general() {
        let mapping = state_mapping(ResourceStates::SHADER_RESOURCE | ResourceStates::COPY_SOURCE);
        assert_eq!(mapping.layout, TextureLayout::General);

        let mapping = state_mapping(ResourceStates::COPY_SOURCE | ResourceStates::RESOLVE_SOURCE);
        assert_eq!(mapping.layout, TextureLayout::TransferSrc);
    }

    #[test]
    fn test_unknown_falls_back_to_pipe_ends() {
        assert_eq!(state_mapping(ResourceStates::UNKNOWN), StateMapping::default());
        assert_eq!(src_stages(ResourceStates::UNKNOWN), PipelineStages::TOP_OF_PIPE);
        assert_eq!(dst_stages(ResourceStates::UNKNOWN), PipelineStages::BOTTOM_OF_PIPE);
        assert_eq!(src_stages(ResourceStates::COMMON), PipelineStages::TOP_OF_PIPE);
    }

    #[test]
    fn test_aspect_from_format() {
        assert_eq!(
            ImageAspect::from_format(TextureFormat::Rgba8Unorm),
            ImageAspect::COLOR
        );
        assert_eq!(
            ImageAspect::from_format(TextureFormat::Depth32Float),
            ImageAspect::DEPTH
        );
        assert_eq!(
            ImageAspect::from_format(TextureFormat::Depth24PlusStencil8),
            ImageAspect::DEPTH | ImageAspect::STENCIL
        );
    }
}
