//! Pass registration types.

use bitflags::bitflags;

use super::DescriptorHandle;
use crate::backend::QueueType;
use crate::command::CommandStream;

/// Largest closure capture, in bytes, a pass executor may have.
///
/// Larger state belongs behind an `Arc` captured by the closure.
pub const MAX_EXECUTOR_SIZE: usize = 1024;

bitflags! {
    /// Kind of work a pass records.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PassFlags: u8 {
        const RASTER = 1 << 0;
        const COMPUTE = 1 << 1;
        const COPY = 1 << 2;
    }
}

impl PassFlags {
    /// Queue the pass could run on: compute-only passes could go to the
    /// compute queue, everything else to graphics.
    ///
    /// Only a hint. A frame is recorded and submitted on a single queue.
    pub fn queue(self) -> QueueType {
        if self == Self::COMPUTE {
            QueueType::Compute
        } else {
            QueueType::Graphics
        }
    }
}

/// Handle to a pass in the render graph.
///
/// `PassHandle` is `Copy` and cheap to pass around. It is only valid within
/// the `RenderGraph` that created it, until the graph is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassHandle(pub(crate) u32);

impl PassHandle {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Registration index of the pass.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

type PassExecutor = Box<dyn Fn(&mut CommandStream) + Send + Sync>;

/// A registered pass: name, flags, declared resources and the closure that
/// records it.
pub struct RenderGraphPass {
    name: String,
    flags: PassFlags,
    descriptor: DescriptorHandle,
    executor: PassExecutor,
}

impl RenderGraphPass {
    pub(crate) fn new<F>(
        name: impl Into<String>,
        flags: PassFlags,
        descriptor: DescriptorHandle,
        executor: F,
    ) -> Self
    where
        F: Fn(&mut CommandStream) + Send + Sync + 'static,
    {
        const {
            assert!(
                std::mem::size_of::<F>() <= MAX_EXECUTOR_SIZE,
                "pass executor captures too much state; move it behind an Arc"
            )
        };

        Self {
            name: name.into(),
            flags,
            descriptor,
            executor: Box::new(executor),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> PassFlags {
        self.flags
    }

    pub fn queue(&self) -> QueueType {
        self.flags.queue()
    }

    pub fn descriptor(&self) -> DescriptorHandle {
        self.descriptor
    }

    /// Record the pass into `stream`, wrapped in a debug marker.
    pub(crate) fn execute(&self, stream: &mut CommandStream) {
        redlilium_core::profile_scope_dynamic!(self.name.as_str());
        stream.begin_marker(&self.name);
        (self.executor)(stream);
        stream.end_marker();
    }
}

impl std::fmt::Debug for RenderGraphPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderGraphPass")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(RenderGraphPass: Send, Sync);
