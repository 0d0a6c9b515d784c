//! GPU backend abstraction layer.
//!
//! The render graph records through two traits:
//!
//! - [`GpuBackend`] opens [`CommandEncoder`]s for a queue and submits closed
//!   encoders in order.
//! - [`CommandEncoder`] receives already-resolved commands: pipeline barrier
//!   batches, render pass boundaries, draws, dispatches and copies.
//!
//! Hazard tracking happens above this layer, so an encoder never needs to
//! know resource states.
//!
//! # Available Backends
//!
//! - [`dummy`]: records commands in memory, for tests and headless runs
//! - `vulkan-backend`: barrier conversion helpers in
//!   [`sync::vulkan`](crate::sync::vulkan)

pub mod dummy;
mod error;

pub use error::BackendError;

use std::any::Any;

use crate::command::{DrawArguments, FramebufferDesc, TextureSlice};
use crate::resources::{Buffer, Texture};
use crate::sync::BarrierBatch;

/// Hardware queue a command stream is submitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueueType {
    #[default]
    Graphics,
    Compute,
    Copy,
}

/// Backend command buffer being recorded.
pub trait CommandEncoder: Send {
    fn label(&self) -> &str;

    fn begin_debug_marker(&mut self, name: &str);
    fn end_debug_marker(&mut self);

    /// Record one pipeline barrier command covering the whole batch.
    fn pipeline_barrier(&mut self, batch: &BarrierBatch);

    fn begin_render_pass(&mut self, framebuffer: &FramebufferDesc);
    fn end_render_pass(&mut self);

    fn draw(&mut self, args: &DrawArguments);
    fn draw_indexed(&mut self, args: &DrawArguments);
    fn draw_indirect(&mut self, buffer: &Buffer, offset: u64);
    fn dispatch(&mut self, groups_x: u32, groups_y: u32, groups_z: u32);

    fn copy_buffer(
        &mut self,
        dst: &Buffer,
        dst_offset: u64,
        src: &Buffer,
        src_offset: u64,
        size: u64,
    );
    fn copy_texture(
        &mut self,
        dst: &Texture,
        dst_slice: TextureSlice,
        src: &Texture,
        src_slice: TextureSlice,
    );

    /// Finish recording. The encoder can only be submitted afterwards.
    fn close(&mut self) -> Result<(), BackendError>;

    /// Recover the concrete encoder on submission.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

/// A GPU device driver the graph submits to.
pub trait GpuBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Open a new encoder for `queue`.
    fn open_encoder(
        &self,
        queue: QueueType,
        label: &str,
    ) -> Result<Box<dyn CommandEncoder>, BackendError>;

    /// Submit closed encoders to `queue`, executing them in the given order.
    fn submit(
        &self,
        queue: QueueType,
        encoders: Vec<Box<dyn CommandEncoder>>,
    ) -> Result<(), BackendError>;
}
