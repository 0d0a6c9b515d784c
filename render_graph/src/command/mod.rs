//! Command recording with automatic barrier placement.
//!
//! A [`CommandStream`] pairs a backend [`CommandEncoder`] with its own
//! [`ResourceStateTracker`]. Every state-setting call declares the states its
//! resources need; barriers are flushed right before the command that depends
//! on them, so pass code never writes a barrier by hand.
//!
//! ```ignore
//! stream.set_graphics_state(&GraphicsState {
//!     framebuffer: Some(FramebufferDesc::new().with_color(Attachment::new(&hdr))),
//!     bindings: vec![material_bindings],
//!     ..Default::default()
//! });
//! stream.draw(&DrawArguments::new(3));
//! ```

mod state;

pub use state::{
    Attachment, ComputeState, DrawArguments, FramebufferDesc, GraphicsState, LoadOp, StoreOp,
    TextureSlice, VertexBufferBinding,
};

use std::sync::Arc;

use redlilium_core::profiling::profile_function;

use crate::backend::{BackendError, CommandEncoder, QueueType};
use crate::graph::{BindingItem, BindingSet};
use crate::resources::{Buffer, Texture, TextureId};
use crate::sync::build_barrier_batches;
use crate::tracking::{HazardError, ResourceStateTracker};
use crate::types::{ResourceStates, TextureSubresourceSet};

/// One recording context: encoder, hazard tracker and render pass state.
pub struct CommandStream {
    encoder: Box<dyn CommandEncoder>,
    tracker: ResourceStateTracker,
    queue: QueueType,
    active_framebuffer: Option<Vec<(TextureId, TextureSubresourceSet)>>,
    indirect_buffer: Option<Arc<Buffer>>,
    closed: bool,
}

static_assertions::assert_impl_all!(CommandStream: Send);

impl std::fmt::Debug for CommandStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandStream")
            .field("label", &self.encoder.label())
            .field("queue", &self.queue)
            .field("render_pass_active", &self.active_framebuffer.is_some())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl CommandStream {
    pub(crate) fn new(
        encoder: Box<dyn CommandEncoder>,
        queue: QueueType,
        uav_barriers_by_default: bool,
    ) -> Self {
        Self {
            encoder,
            tracker: ResourceStateTracker::with_uav_barriers(uav_barriers_by_default),
            queue,
            active_framebuffer: None,
            indirect_buffer: None,
            closed: false,
        }
    }

    pub fn label(&self) -> &str {
        self.encoder.label()
    }

    pub fn queue(&self) -> QueueType {
        self.queue
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_render_pass_active(&self) -> bool {
        self.active_framebuffer.is_some()
    }

    pub fn tracker(&self) -> &ResourceStateTracker {
        &self.tracker
    }

    // ------------------------------------------------------------------
    // Markers
    // ------------------------------------------------------------------

    pub fn begin_marker(&mut self, name: &str) {
        self.encoder.begin_debug_marker(name);
    }

    pub fn end_marker(&mut self) {
        self.encoder.end_debug_marker();
    }

    // ------------------------------------------------------------------
    // State tracking
    // ------------------------------------------------------------------

    pub fn begin_tracking_texture_state(
        &mut self,
        texture: &Arc<Texture>,
        subresources: TextureSubresourceSet,
        state: ResourceStates,
    ) {
        self.tracker
            .begin_tracking_texture_state(texture, subresources, state);
    }

    pub fn begin_tracking_buffer_state(&mut self, buffer: &Arc<Buffer>, state: ResourceStates) {
        self.tracker.begin_tracking_buffer_state(buffer, state);
    }

    pub fn set_permanent_texture_state(
        &mut self,
        texture: &Arc<Texture>,
        subresources: TextureSubresourceSet,
        state: ResourceStates,
    ) {
        self.tracker
            .set_permanent_texture_state(texture, subresources, state);
    }

    pub fn set_permanent_buffer_state(&mut self, buffer: &Arc<Buffer>, state: ResourceStates) {
        self.tracker.set_permanent_buffer_state(buffer, state);
    }

    /// Queue a transition without flushing it.
    pub fn set_texture_state(
        &mut self,
        texture: &Arc<Texture>,
        subresources: TextureSubresourceSet,
        state: ResourceStates,
    ) {
        self.tracker
            .require_texture_state(texture, subresources, state);
    }

    /// Queue a transition without flushing it.
    pub fn set_buffer_state(&mut self, buffer: &Arc<Buffer>, state: ResourceStates) {
        self.tracker.require_buffer_state(buffer, state);
    }

    pub fn texture_subresource_state(
        &self,
        texture: &Texture,
        array_slice: u32,
        mip_level: u32,
    ) -> Result<ResourceStates, HazardError> {
        self.tracker
            .texture_subresource_state(texture, array_slice, mip_level)
    }

    pub fn buffer_state(&self, buffer: &Buffer) -> ResourceStates {
        self.tracker.buffer_state(buffer)
    }

    pub fn set_enable_uav_barriers_for_texture(&mut self, texture: &Arc<Texture>, enable: bool) {
        self.tracker
            .set_enable_uav_barriers_for_texture(texture, enable);
    }

    pub fn set_enable_uav_barriers_for_buffer(&mut self, buffer: &Arc<Buffer>, enable: bool) {
        self.tracker.set_enable_uav_barriers_for_buffer(buffer, enable);
    }

    /// Flush queued barriers to the encoder.
    ///
    /// Barriers cannot be recorded inside a render pass, so an active one is
    /// ended first. Does nothing when no barrier is queued.
    pub fn commit_barriers(&mut self) {
        if !self.tracker.has_pending_barriers() {
            return;
        }
        profile_function!();

        self.end_render_pass();

        let batches =
            build_barrier_batches(self.tracker.texture_barriers(), self.tracker.buffer_barriers());
        for batch in &batches {
            self.encoder.pipeline_barrier(batch);
        }
        self.tracker.clear_barriers();
    }

    fn end_render_pass(&mut self) {
        if self.active_framebuffer.take().is_some() {
            self.encoder.end_render_pass();
        }
    }

    fn require_binding_states(&mut self, bindings: &[Arc<BindingSet>]) {
        for set in bindings {
            for item in set.items() {
                let state = item.required_state();
                match item {
                    BindingItem::TextureSrv {
                        texture,
                        subresources,
                    }
                    | BindingItem::TextureUav {
                        texture,
                        subresources,
                    } => self
                        .tracker
                        .require_texture_state(texture, *subresources, state),
                    BindingItem::BufferSrv(buffer)
                    | BindingItem::BufferUav(buffer)
                    | BindingItem::ConstantBuffer(buffer) => {
                        self.tracker.require_buffer_state(buffer, state)
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Pipeline state
    // ------------------------------------------------------------------

    /// Declare the resources used by subsequent draws, flush barriers and
    /// begin the render pass of `state.framebuffer` if it is not active.
    pub fn set_graphics_state(&mut self, state: &GraphicsState) {
        profile_function!();

        self.require_binding_states(&state.bindings);

        for binding in &state.vertex_buffers {
            self.tracker
                .require_buffer_state(&binding.buffer, ResourceStates::VERTEX_BUFFER);
        }
        if let Some(index_buffer) = &state.index_buffer {
            self.tracker
                .require_buffer_state(index_buffer, ResourceStates::INDEX_BUFFER);
        }
        if let Some(indirect_buffer) = &state.indirect_buffer {
            self.tracker
                .require_buffer_state(indirect_buffer, ResourceStates::INDIRECT_ARGUMENT);
        }
        self.indirect_buffer = state.indirect_buffer.clone();

        if let Some(framebuffer) = &state.framebuffer {
            for attachment in &framebuffer.color_attachments {
                self.tracker.require_texture_state(
                    &attachment.texture,
                    attachment.subresources,
                    ResourceStates::RENDER_TARGET,
                );
            }
            if let Some(depth) = &framebuffer.depth_attachment {
                let depth_state = if depth.writes_depth() {
                    ResourceStates::DEPTH_WRITE
                } else {
                    ResourceStates::DEPTH_READ
                };
                self.tracker
                    .require_texture_state(&depth.texture, depth.subresources, depth_state);
            }
        }

        self.commit_barriers();

        if let Some(framebuffer) = &state.framebuffer {
            let ids = framebuffer.attachment_ids();
            if self.active_framebuffer.as_ref() != Some(&ids) {
                self.end_render_pass();
                self.encoder.begin_render_pass(framebuffer);
                self.active_framebuffer = Some(ids);
            }
        }
    }

    /// Declare the resources used by subsequent dispatches and flush
    /// barriers.
    pub fn set_compute_state(&mut self, state: &ComputeState) {
        profile_function!();

        self.end_render_pass();
        self.require_binding_states(&state.bindings);
        if let Some(indirect_buffer) = &state.indirect_buffer {
            self.tracker
                .require_buffer_state(indirect_buffer, ResourceStates::INDIRECT_ARGUMENT);
        }
        self.indirect_buffer = state.indirect_buffer.clone();
        self.commit_barriers();
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    pub fn draw(&mut self, args: &DrawArguments) {
        self.encoder.draw(args);
    }

    pub fn draw_indexed(&mut self, args: &DrawArguments) {
        self.encoder.draw_indexed(args);
    }

    /// Draw with arguments read from the indirect buffer of the current
    /// graphics state.
    pub fn draw_indirect(&mut self, offset: u64) {
        match &self.indirect_buffer {
            Some(buffer) => self.encoder.draw_indirect(buffer, offset),
            None => log::error!(
                "{}: draw_indirect without an indirect buffer in the graphics state",
                self.encoder.label()
            ),
        }
    }

    pub fn dispatch(&mut self, groups_x: u32, groups_y: u32, groups_z: u32) {
        self.encoder.dispatch(groups_x, groups_y, groups_z);
    }

    pub fn copy_buffer(
        &mut self,
        dst: &Arc<Buffer>,
        dst_offset: u64,
        src: &Arc<Buffer>,
        src_offset: u64,
        size: u64,
    ) {
        self.tracker
            .require_buffer_state(src, ResourceStates::COPY_SOURCE);
        self.tracker.require_buffer_state(dst, ResourceStates::COPY_DEST);
        self.commit_barriers();
        self.end_render_pass();

        self.encoder
            .copy_buffer(dst, dst_offset, src, src_offset, size);
    }

    /// Copy one subresource to another.
    pub fn copy_texture(
        &mut self,
        dst: &Arc<Texture>,
        dst_slice: TextureSlice,
        src: &Arc<Texture>,
        src_slice: TextureSlice,
    ) {
        self.tracker.require_texture_state(
            src,
            src_slice.subresources(),
            ResourceStates::COPY_SOURCE,
        );
        self.tracker
            .require_texture_state(dst, dst_slice.subresources(), ResourceStates::COPY_DEST);
        self.commit_barriers();
        self.end_render_pass();

        self.encoder.copy_texture(dst, dst_slice, src, src_slice);
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Finish recording: end the render pass, restore initial states, flush
    /// the last barriers and close the encoder.
    ///
    /// Closing an already closed stream does nothing.
    pub fn close(&mut self) -> Result<(), BackendError> {
        if self.closed {
            return Ok(());
        }
        profile_function!();

        self.end_render_pass();
        self.tracker.keep_buffer_initial_states();
        self.tracker.keep_texture_initial_states();
        self.commit_barriers();

        self.encoder.close()?;
        self.closed = true;
        Ok(())
    }

    pub(crate) fn into_parts(self) -> (Box<dyn CommandEncoder>, ResourceStateTracker) {
        (self.encoder, self.tracker)
    }
}
