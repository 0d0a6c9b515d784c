//! Translation of resource-state barriers into pipeline barriers.
//!
//! The tracker speaks [`ResourceStates`](crate::ResourceStates). Backends
//! speak stages, access masks and image layouts. [`state_mapping`] bridges
//! the two and [`build_barrier_batches`] groups a stream's queued barriers into
//! the fewest pipeline barrier commands that keep their order.

mod batch;
mod mapping;
#[cfg(feature = "vulkan-backend")]
pub mod vulkan;

pub use batch::{BarrierBatch, BufferTransition, TextureTransition, build_barrier_batches};
pub use mapping::{
    AccessFlags, ImageAspect, PipelineStages, StateMapping, TextureLayout, state_mapping,
};
