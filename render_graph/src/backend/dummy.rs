//! Dummy GPU backend for testing and development.
//!
//! Commands are recorded into memory instead of a GPU command buffer, and
//! submissions are kept so tests can inspect exactly what would have reached
//! the queue.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::{BackendError, CommandEncoder, GpuBackend, QueueType};
use crate::command::{DrawArguments, FramebufferDesc, TextureSlice};
use crate::resources::{Buffer, BufferId, Texture, TextureId};
use crate::sync::{BarrierBatch, PipelineStages, TextureLayout};
use crate::types::TextureSubresourceSet;

/// One texture transition inside a recorded pipeline barrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTextureTransition {
    pub texture: TextureId,
    pub subresources: TextureSubresourceSet,
    pub old_layout: TextureLayout,
    pub new_layout: TextureLayout,
}

/// A command captured by a [`DummyEncoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCommand {
    BeginMarker(String),
    EndMarker,
    PipelineBarrier {
        src_stages: PipelineStages,
        dst_stages: PipelineStages,
        textures: Vec<RecordedTextureTransition>,
        buffers: Vec<BufferId>,
    },
    BeginRenderPass {
        color_attachments: Vec<TextureId>,
        depth_attachment: Option<TextureId>,
    },
    EndRenderPass,
    Draw(DrawArguments),
    DrawIndexed(DrawArguments),
    DrawIndirect {
        buffer: BufferId,
        offset: u64,
    },
    Dispatch(u32, u32, u32),
    CopyBuffer {
        dst: BufferId,
        src: BufferId,
        size: u64,
    },
    CopyTexture {
        dst: TextureId,
        dst_slice: TextureSlice,
        src: TextureId,
        src_slice: TextureSlice,
    },
}

/// In-memory command encoder.
#[derive(Debug)]
pub struct DummyEncoder {
    label: String,
    queue: QueueType,
    commands: Vec<RecordedCommand>,
    closed: bool,
}

impl DummyEncoder {
    fn new(queue: QueueType, label: &str) -> Self {
        Self {
            label: label.to_owned(),
            queue,
            commands: Vec::new(),
            closed: false,
        }
    }

    pub fn queue(&self) -> QueueType {
        self.queue
    }

    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn record(&mut self, command: RecordedCommand) {
        if self.closed {
            log::warn!("DummyEncoder {}: dropping {:?} after close", self.label, command);
            return;
        }
        self.commands.push(command);
    }
}

impl CommandEncoder for DummyEncoder {
    fn label(&self) -> &str {
        &self.label
    }

    fn begin_debug_marker(&mut self, name: &str) {
        self.record(RecordedCommand::BeginMarker(name.to_owned()));
    }

    fn end_debug_marker(&mut self) {
        self.record(RecordedCommand::EndMarker);
    }

    fn pipeline_barrier(&mut self, batch: &BarrierBatch) {
        self.record(RecordedCommand::PipelineBarrier {
            src_stages: batch.src_stages,
            dst_stages: batch.dst_stages,
            textures: batch
                .textures
                .iter()
                .map(|transition| RecordedTextureTransition {
                    texture: transition.texture.id(),
                    subresources: transition.subresources,
                    old_layout: transition.old_layout,
                    new_layout: transition.new_layout,
                })
                .collect(),
            buffers: batch
                .buffers
                .iter()
                .map(|transition| transition.buffer.id())
                .collect(),
        });
    }

    fn begin_render_pass(&mut self, framebuffer: &FramebufferDesc) {
        self.record(RecordedCommand::BeginRenderPass {
            color_attachments: framebuffer
                .color_attachments
                .iter()
                .map(|attachment| attachment.texture.id())
                .collect(),
            depth_attachment: framebuffer
                .depth_attachment
                .as_ref()
                .map(|attachment| attachment.texture.id()),
        });
    }

    fn end_render_pass(&mut self) {
        self.record(RecordedCommand::EndRenderPass);
    }

    fn draw(&mut self, args: &DrawArguments) {
        self.record(RecordedCommand::Draw(*args));
    }

    fn draw_indexed(&mut self, args: &DrawArguments) {
        self.record(RecordedCommand::DrawIndexed(*args));
    }

    fn draw_indirect(&mut self, buffer: &Buffer, offset: u64) {
        self.record(RecordedCommand::DrawIndirect {
            buffer: buffer.id(),
            offset,
        });
    }

    fn dispatch(&mut self, groups_x: u32, groups_y: u32, groups_z: u32) {
        self.record(RecordedCommand::Dispatch(groups_x, groups_y, groups_z));
    }

    fn copy_buffer(
        &mut self,
        dst: &Buffer,
        _dst_offset: u64,
        src: &Buffer,
        _src_offset: u64,
        size: u64,
    ) {
        self.record(RecordedCommand::CopyBuffer {
            dst: dst.id(),
            src: src.id(),
            size,
        });
    }

    fn copy_texture(
        &mut self,
        dst: &Texture,
        dst_slice: TextureSlice,
        src: &Texture,
        src_slice: TextureSlice,
    ) {
        self.record(RecordedCommand::CopyTexture {
            dst: dst.id(),
            dst_slice,
            src: src.id(),
            src_slice,
        });
    }

    fn close(&mut self) -> Result<(), BackendError> {
        if self.closed {
            return Err(BackendError::EncoderAlreadyClosed(self.label.clone()));
        }
        self.closed = true;
        log::trace!(
            "DummyEncoder {}: closed with {} commands",
            self.label,
            self.commands.len()
        );
        Ok(())
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// Commands of one submitted encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedStream {
    pub label: String,
    pub queue: QueueType,
    pub commands: Vec<RecordedCommand>,
}

/// One call to [`GpuBackend::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub queue: QueueType,
    pub streams: Vec<RecordedStream>,
}

/// Dummy GPU backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    submissions: Mutex<Vec<Submission>>,
    encoders_opened: AtomicUsize,
    fail_submissions: AtomicBool,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything submitted so far, in submission order.
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().clone()
    }

    pub fn take_submissions(&self) -> Vec<Submission> {
        std::mem::take(&mut *self.submissions.lock())
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().len()
    }

    pub fn encoders_opened(&self) -> usize {
        self.encoders_opened.load(Ordering::Relaxed)
    }

    /// Make every following submission fail (for testing error paths).
    pub fn set_fail_submissions(&self, fail: bool) {
        self.fail_submissions.store(fail, Ordering::Release);
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    fn open_encoder(
        &self,
        queue: QueueType,
        label: &str,
    ) -> Result<Box<dyn CommandEncoder>, BackendError> {
        self.encoders_opened.fetch_add(1, Ordering::Relaxed);
        log::trace!("DummyBackend: opening {queue:?} encoder {label}");
        Ok(Box::new(DummyEncoder::new(queue, label)))
    }

    fn submit(
        &self,
        queue: QueueType,
        encoders: Vec<Box<dyn CommandEncoder>>,
    ) -> Result<(), BackendError> {
        if self.fail_submissions.load(Ordering::Acquire) {
            return Err(BackendError::SubmissionFailed(
                "submissions disabled on dummy backend".to_string(),
            ));
        }

        let mut streams = Vec::with_capacity(encoders.len());
        for encoder in encoders {
            let encoder = encoder
                .into_any()
                .downcast::<DummyEncoder>()
                .map_err(|_| BackendError::ForeignEncoder)?;
            if !encoder.closed {
                return Err(BackendError::EncoderNotClosed(encoder.label));
            }
            if encoder.queue != queue {
                return Err(BackendError::QueueMismatch {
                    label: encoder.label,
                    opened: encoder.queue,
                    submitted: queue,
                });
            }
            streams.push(RecordedStream {
                label: encoder.label,
                queue: encoder.queue,
                commands: encoder.commands,
            });
        }

        log::trace!(
            "DummyBackend: submitting {} encoders to {queue:?}",
            streams.len()
        );
        self.submissions.lock().push(Submission { queue, streams });
        Ok(())
    }
}
