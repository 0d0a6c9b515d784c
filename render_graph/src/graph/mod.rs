//! Render graph.
//!
//! A [`RenderGraph`] collects the passes of one frame, groups them by hazard
//! analysis and records each group in parallel, one [`CommandStream`] per
//! pass. Streams are submitted once, in registration order, after every pass
//! has been recorded and closed.
//!
//! # Example
//!
//! ```ignore
//! let mut graph = RenderGraph::new(device.clone());
//!
//! let shadow = graph.alloc_descriptor();
//! graph.descriptor_mut(shadow)?.add_raw_write(&shadow_map);
//! graph.add_graphics_pass("shadow", shadow, move |stream| {
//!     // record draws...
//! })?;
//!
//! let summary = graph.execute()?;
//! graph.reset();
//! ```
//!
//! # Lifecycle
//!
//! `Registering -> Compiled -> Submitted`. Registering more work after
//! [`compile`](RenderGraph::compile) goes back to `Registering`. A submitted
//! graph must be [`reset`](RenderGraph::reset) before it can be executed again.

mod analyzer;
mod binding;
mod descriptor;
mod pass;

pub use analyzer::{
    ParallelAnalysis, PassAnalyzer, PassGroup, PassResourceAccess, ResourceUsage,
    analyze_last_resource_usages, build_dependency_graph, group_passes, has_dependency,
    highest_parallel_group_count,
};
pub use binding::{BindingItem, BindingSet};
pub use descriptor::{DescriptorHandle, PassDescriptor};
pub use pass::{MAX_EXECUTOR_SIZE, PassFlags, PassHandle, RenderGraphPass};

use std::sync::Arc;

use parking_lot::Mutex;
use redlilium_core::arena::FrameArena;
use redlilium_core::pool::Pooled;
use redlilium_core::profiling::{profile_function, profile_scope};

use crate::backend::QueueType;
use crate::command::CommandStream;
use crate::device::{GraphicsDevice, validate_buffer_descriptor, validate_texture_descriptor};
use crate::error::{GraphDiagnostic, GraphError};
use crate::resources::{ResourceId, TransientBufferHandle, TransientTextureHandle};
use crate::types::{BufferDescriptor, TextureDescriptor};

/// Every stream of a frame is opened for, and submitted to, this queue.
const FRAME_QUEUE: QueueType = QueueType::Graphics;

/// Where a graph is in its frame lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GraphPhase {
    #[default]
    Registering,
    Compiled,
    Submitted,
}

/// Outcome of [`RenderGraph::execute`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub pass_count: usize,
    pub group_count: usize,
    pub highest_parallel_group_count: usize,
    /// Non-fatal problems found while compiling, recording and submitting.
    pub diagnostics: Vec<GraphDiagnostic>,
}

/// A frame's passes and the machinery to record and submit them.
pub struct RenderGraph {
    device: Arc<GraphicsDevice>,
    passes: FrameArena<RenderGraphPass>,
    descriptors: FrameArena<PassDescriptor>,
    transient_buffers: Vec<BufferDescriptor>,
    transient_textures: Vec<TextureDescriptor>,
    analyzer: PassAnalyzer,
    compiled: Pooled<ParallelAnalysis>,
    phase: GraphPhase,
    diagnostics: Vec<GraphDiagnostic>,
}

static_assertions::assert_impl_all!(RenderGraph: Send);

impl RenderGraph {
    pub fn new(device: Arc<GraphicsDevice>) -> Self {
        let capacity = device.config().pass_capacity;
        Self {
            device,
            passes: FrameArena::with_capacity(capacity),
            descriptors: FrameArena::with_capacity(capacity),
            transient_buffers: Vec::new(),
            transient_textures: Vec::new(),
            analyzer: PassAnalyzer::new(),
            compiled: Pooled::default(),
            phase: GraphPhase::Registering,
            diagnostics: Vec::new(),
        }
    }

    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    pub fn phase(&self) -> GraphPhase {
        self.phase
    }

    fn begin_registration(&mut self) -> Result<(), GraphError> {
        match self.phase {
            GraphPhase::Submitted => Err(GraphError::AlreadySubmitted),
            GraphPhase::Compiled => {
                self.phase = GraphPhase::Registering;
                self.compiled.release();
                Ok(())
            }
            GraphPhase::Registering => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Allocate an empty descriptor to be filled with
    /// [`descriptor_mut`](Self::descriptor_mut) and passed to
    /// [`add_pass`](Self::add_pass).
    pub fn alloc_descriptor(&mut self) -> DescriptorHandle {
        DescriptorHandle(self.descriptors.alloc(PassDescriptor::new()))
    }

    pub fn descriptor(&self, handle: DescriptorHandle) -> Option<&PassDescriptor> {
        self.descriptors.get(handle.0)
    }

    pub fn descriptor_mut(
        &mut self,
        handle: DescriptorHandle,
    ) -> Result<&mut PassDescriptor, GraphError> {
        if self.descriptors.get(handle.0).is_none() {
            return Err(GraphError::InvalidDescriptorHandle);
        }
        self.begin_registration()?;
        self.descriptors
            .get_mut(handle.0)
            .ok_or(GraphError::InvalidDescriptorHandle)
    }

    /// Register a pass. `executor` records it into its own command stream,
    /// possibly on a worker thread.
    ///
    /// The executor's captured state is limited to [`MAX_EXECUTOR_SIZE`]
    /// bytes, checked at compile time.
    pub fn add_pass<F>(
        &mut self,
        name: impl Into<String>,
        flags: PassFlags,
        descriptor: DescriptorHandle,
        executor: F,
    ) -> Result<PassHandle, GraphError>
    where
        F: Fn(&mut CommandStream) + Send + Sync + 'static,
    {
        if self.descriptors.get(descriptor.0).is_none() {
            return Err(GraphError::InvalidDescriptorHandle);
        }
        self.begin_registration()?;

        let pass = RenderGraphPass::new(name, flags, descriptor, executor);
        log::trace!("RenderGraph: added pass '{}' ({:?})", pass.name(), flags);
        let index = self.passes.alloc(pass);
        Ok(PassHandle::new(index.index()))
    }

    pub fn add_graphics_pass<F>(
        &mut self,
        name: impl Into<String>,
        descriptor: DescriptorHandle,
        executor: F,
    ) -> Result<PassHandle, GraphError>
    where
        F: Fn(&mut CommandStream) + Send + Sync + 'static,
    {
        self.add_pass(name, PassFlags::RASTER, descriptor, executor)
    }

    pub fn add_compute_pass<F>(
        &mut self,
        name: impl Into<String>,
        descriptor: DescriptorHandle,
        executor: F,
    ) -> Result<PassHandle, GraphError>
    where
        F: Fn(&mut CommandStream) + Send + Sync + 'static,
    {
        self.add_pass(name, PassFlags::COMPUTE, descriptor, executor)
    }

    pub fn add_copy_pass<F>(
        &mut self,
        name: impl Into<String>,
        descriptor: DescriptorHandle,
        executor: F,
    ) -> Result<PassHandle, GraphError>
    where
        F: Fn(&mut CommandStream) + Send + Sync + 'static,
    {
        self.add_pass(name, PassFlags::COPY, descriptor, executor)
    }

    /// Register a frame-local buffer.
    pub fn create_buffer(
        &mut self,
        descriptor: BufferDescriptor,
    ) -> Result<TransientBufferHandle, GraphError> {
        validate_buffer_descriptor(&descriptor)?;
        self.begin_registration()?;
        let handle = TransientBufferHandle(self.transient_buffers.len() as u32);
        self.transient_buffers.push(descriptor);
        Ok(handle)
    }

    /// Register a frame-local texture.
    pub fn create_texture(
        &mut self,
        descriptor: TextureDescriptor,
    ) -> Result<TransientTextureHandle, GraphError> {
        validate_texture_descriptor(&descriptor)?;
        self.begin_registration()?;
        let handle = TransientTextureHandle(self.transient_textures.len() as u32);
        self.transient_textures.push(descriptor);
        Ok(handle)
    }

    pub fn transient_buffer(&self, handle: TransientBufferHandle) -> Option<&BufferDescriptor> {
        self.transient_buffers.get(handle.0 as usize)
    }

    pub fn transient_texture(&self, handle: TransientTextureHandle) -> Option<&TextureDescriptor> {
        self.transient_textures.get(handle.0 as usize)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn passes(&self) -> &[RenderGraphPass] {
        self.passes.as_slice()
    }

    pub fn pass(&self, handle: PassHandle) -> Option<&RenderGraphPass> {
        self.passes.as_slice().get(handle.index())
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Parallel groups from the last compilation. Empty before compiling.
    pub fn groups(&self) -> &[PassGroup] {
        self.compiled.get().map_or(&[], |analysis| &analysis.groups)
    }

    pub fn highest_parallel_group_count(&self) -> usize {
        self.compiled
            .get()
            .map_or(0, |analysis| analysis.highest_parallel_group_count)
    }

    /// Last reader and first writer of `resource` from the last compilation.
    pub fn resource_usage(&self, resource: impl Into<ResourceId>) -> Option<ResourceUsage> {
        let resource = resource.into();
        self.compiled
            .get()
            .and_then(|analysis| analysis.resource_usages.get(&resource).copied())
    }

    pub fn diagnostics(&self) -> &[GraphDiagnostic] {
        &self.diagnostics
    }

    // ------------------------------------------------------------------
    // Compilation and execution
    // ------------------------------------------------------------------

    /// Analyze pass dependencies and group the passes.
    pub fn compile(&mut self) -> Result<&ParallelAnalysis, GraphError> {
        profile_function!();

        if self.phase == GraphPhase::Submitted {
            return Err(GraphError::AlreadySubmitted);
        }

        self.diagnostics.clear();
        self.check_transient_references();

        let descriptors = &self.descriptors;
        let analysis = self.compiled.activate();
        self.analyzer.analyze_parallel_passes(
            self.passes
                .as_slice()
                .iter()
                .map(|pass| &descriptors[pass.descriptor().0]),
            analysis,
        );

        self.phase = GraphPhase::Compiled;
        Ok(self.compiled.inner())
    }

    fn check_transient_references(&mut self) {
        for (index, pass) in self.passes.as_slice().iter().enumerate() {
            let Some(descriptor) = self.descriptors.get(pass.descriptor().0) else {
                continue;
            };
            for resource in descriptor.resources() {
                let known = match resource {
                    ResourceId::TransientBuffer(handle) => {
                        (handle.0 as usize) < self.transient_buffers.len()
                    }
                    ResourceId::TransientTexture(handle) => {
                        (handle.0 as usize) < self.transient_textures.len()
                    }
                    ResourceId::Texture(_) | ResourceId::Buffer(_) => true,
                };
                if !known {
                    let diagnostic = GraphDiagnostic::UnknownTransientResource {
                        pass: PassHandle::new(index),
                        resource,
                    };
                    log::error!("RenderGraph: pass '{}': {diagnostic}", pass.name());
                    self.diagnostics.push(diagnostic);
                }
            }
        }
    }

    /// Walk the transient registries. Backing memory is owned by the caller.
    pub fn allocate_transient_resources(&self) {
        profile_function!();

        for (index, descriptor) in self.transient_buffers.iter().enumerate() {
            log::debug!(
                "RenderGraph: transient buffer #{index} {:?}, {} bytes",
                descriptor.label,
                descriptor.size
            );
        }
        for (index, descriptor) in self.transient_textures.iter().enumerate() {
            log::debug!(
                "RenderGraph: transient texture #{index} {:?}, {}x{} {:?}",
                descriptor.label,
                descriptor.size.width,
                descriptor.size.height,
                descriptor.format
            );
        }
    }

    /// Compile, record every pass and submit the frame.
    ///
    /// # Errors
    ///
    /// [`GraphError::AlreadySubmitted`] without a [`reset`](Self::reset) in
    /// between; backend failures opening, closing or submitting streams.
    pub fn execute(&mut self) -> Result<ExecutionSummary, GraphError> {
        profile_function!();

        self.compile()?;
        self.allocate_transient_resources();

        let pass_count = self.passes.len();
        let mut summary = ExecutionSummary {
            pass_count,
            group_count: self.groups().len(),
            highest_parallel_group_count: self.highest_parallel_group_count(),
            diagnostics: Vec::new(),
        };

        if pass_count == 0 {
            log::debug!("RenderGraph: nothing to execute");
            self.phase = GraphPhase::Submitted;
            summary.diagnostics = self.diagnostics.clone();
            return Ok(summary);
        }

        let streams = self.record_streams()?;
        let hazards = self.device.submit(FRAME_QUEUE, streams)?;

        self.diagnostics
            .extend(hazards.into_iter().map(GraphDiagnostic::Hazard));
        self.phase = GraphPhase::Submitted;
        summary.diagnostics = self.diagnostics.clone();
        redlilium_core::frame_mark!();

        log::debug!(
            "RenderGraph: submitted {} passes in {} groups ({} diagnostics)",
            summary.pass_count,
            summary.group_count,
            summary.diagnostics.len()
        );
        Ok(summary)
    }

    /// Open, record and close one stream per pass. Streams come back in
    /// group order.
    fn record_streams(&self) -> Result<Vec<CommandStream>, GraphError> {
        let device = &self.device;
        let scheduler = device.scheduler();
        let min_range = device.config().min_parallel_range;
        let passes = self.passes.as_slice();
        let groups = self.groups();

        let slots: Vec<Mutex<Option<CommandStream>>> =
            passes.iter().map(|_| Mutex::new(None)).collect();
        let errors: Mutex<Vec<GraphError>> = Mutex::new(Vec::new());

        {
            profile_scope!("open_streams");
            scheduler.parallel_for(passes.len(), min_range, &|range| {
                for index in range {
                    let pass = &passes[index];
                    match device.create_command_stream(FRAME_QUEUE, pass.name()) {
                        Ok(stream) => *slots[index].lock() = Some(stream),
                        Err(err) => errors.lock().push(err),
                    }
                }
            });
        }
        if let Some(err) = errors.lock().drain(..).next() {
            return Err(err);
        }

        let record = |handle: PassHandle| {
            if let Some(stream) = slots[handle.index()].lock().as_mut() {
                passes[handle.index()].execute(stream);
            }
        };

        for group in groups {
            profile_scope!("record_group");
            match group.passes.as_slice() {
                [single] => record(*single),
                members => scheduler.parallel_for(members.len(), min_range, &|range| {
                    for index in range {
                        record(members[index]);
                    }
                }),
            }
        }

        {
            profile_scope!("close_streams");
            scheduler.parallel_for(slots.len(), min_range, &|range| {
                for index in range {
                    if let Some(stream) = slots[index].lock().as_mut() {
                        if let Err(err) = stream.close() {
                            errors.lock().push(err.into());
                        }
                    }
                }
            });
        }
        if let Some(err) = errors.lock().drain(..).next() {
            return Err(err);
        }

        Ok(groups
            .iter()
            .flat_map(|group| &group.passes)
            .filter_map(|handle| slots[handle.index()].lock().take())
            .collect())
    }

    /// Clear the graph for the next frame, keeping allocations.
    pub fn reset(&mut self) {
        self.passes.reset();
        self.descriptors.reset();
        self.transient_buffers.clear();
        self.transient_textures.clear();
        self.compiled.release();
        self.diagnostics.clear();
        self.phase = GraphPhase::Registering;
    }
}

impl std::fmt::Debug for RenderGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderGraph")
            .field("passes", &self.passes.len())
            .field("descriptors", &self.descriptors.len())
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::{DummyBackend, RecordedCommand};
    use crate::config::GraphicsConfig;
    use crate::types::{BufferUsage, TextureFormat, TextureUsage};
    use redlilium_core::tasks::InlineScheduler;

    fn graph() -> (Arc<DummyBackend>, RenderGraph) {
        let backend = Arc::new(DummyBackend::new());
        let device = GraphicsDevice::with_scheduler(
            backend.clone(),
            Arc::new(InlineScheduler),
            GraphicsConfig::default(),
        );
        (backend, RenderGraph::new(device))
    }

    fn color_texture(graph: &RenderGraph) -> Arc<crate::resources::Texture> {
        graph
            .device()
            .create_texture(&TextureDescriptor::new_2d(
                8,
                8,
                TextureFormat::Rgba8Unorm,
                TextureUsage::RENDER_ATTACHMENT,
            ))
            .unwrap()
    }

    #[test]
    fn test_empty_graph_is_noop() {
        let (backend, mut graph) = graph();
        let summary = graph.execute().unwrap();
        assert_eq!(summary, ExecutionSummary::default());
        assert_eq!(backend.submission_count(), 0);
        assert_eq!(backend.encoders_opened(), 0);
    }

    #[test]
    fn test_phases() {
        let (_, mut graph) = graph();
        let descriptor = graph.alloc_descriptor();
        graph.add_compute_pass("a", descriptor, |_| {}).unwrap();
        assert_eq!(graph.phase(), GraphPhase::Registering);

        graph.compile().unwrap();
        assert_eq!(graph.phase(), GraphPhase::Compiled);
        assert_eq!(graph.groups().len(), 1);

        graph.add_compute_pass("b", descriptor, |_| {}).unwrap();
        assert_eq!(graph.phase(), GraphPhase::Registering);
        assert!(graph.groups().is_empty());

        graph.execute().unwrap();
        assert_eq!(graph.phase(), GraphPhase::Submitted);
        assert_eq!(graph.execute(), Err(GraphError::AlreadySubmitted));
        assert!(matches!(
            graph.add_compute_pass("c", descriptor, |_| {}),
            Err(GraphError::AlreadySubmitted)
        ));

        graph.reset();
        assert_eq!(graph.phase(), GraphPhase::Registering);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_invalid_descriptor_handle() {
        let (_, mut graph) = graph();
        let descriptor = graph.alloc_descriptor();
        graph.reset();
        assert!(matches!(
            graph.add_graphics_pass("stale", descriptor, |_| {}),
            Err(GraphError::InvalidDescriptorHandle)
        ));
        assert!(matches!(
            graph.descriptor_mut(descriptor),
            Err(GraphError::InvalidDescriptorHandle)
        ));
    }

    #[test]
    fn test_groups_follow_dependencies() {
        let (_, mut graph) = graph();
        let target = color_texture(&graph);

        let write = graph.alloc_descriptor();
        graph.descriptor_mut(write).unwrap().add_raw_write(&target);
        let read = graph.alloc_descriptor();
        graph.descriptor_mut(read).unwrap().add_raw_read(&target);

        let producer = graph.add_graphics_pass("producer", write, |_| {}).unwrap();
        let consumer_a = graph.add_graphics_pass("consumer_a", read, |_| {}).unwrap();
        let consumer_b = graph.add_graphics_pass("consumer_b", read, |_| {}).unwrap();

        graph.compile().unwrap();
        assert_eq!(
            graph.groups(),
            &[
                PassGroup {
                    passes: vec![producer]
                },
                PassGroup {
                    passes: vec![consumer_a, consumer_b]
                },
            ]
        );
        assert_eq!(graph.highest_parallel_group_count(), 2);

        let usage = graph.resource_usage(&target).unwrap();
        assert_eq!(usage.first_writer, Some(producer));
        assert_eq!(usage.last_reader, Some(consumer_b));
    }

    #[test]
    fn test_unknown_transient_is_reported_but_pass_runs() {
        let (backend, mut graph) = graph();
        let known = graph
            .create_buffer(BufferDescriptor::new(64, BufferUsage::STORAGE))
            .unwrap();

        let descriptor = graph.alloc_descriptor();
        graph
            .descriptor_mut(descriptor)
            .unwrap()
            .add_raw_write(known)
            .add_raw_read(TransientTextureHandle(3));
        let pass = graph.add_compute_pass("blur", descriptor, |_| {}).unwrap();

        let summary = graph.execute().unwrap();
        assert_eq!(
            summary.diagnostics,
            vec![GraphDiagnostic::UnknownTransientResource {
                pass,
                resource: ResourceId::TransientTexture(TransientTextureHandle(3)),
            }]
        );

        let submissions = backend.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].streams[0].label, "blur");
    }

    #[test]
    fn test_streams_submitted_in_registration_order() {
        let (backend, mut graph) = graph();
        let target = color_texture(&graph);

        let write = graph.alloc_descriptor();
        graph.descriptor_mut(write).unwrap().add_raw_write(&target);
        let none = graph.alloc_descriptor();

        for name in ["a", "b", "c"] {
            graph.add_copy_pass(name, none, |_| {}).unwrap();
        }
        graph.add_graphics_pass("d", write, |_| {}).unwrap();
        graph.add_graphics_pass("e", write, |_| {}).unwrap();

        let summary = graph.execute().unwrap();
        assert_eq!(summary.pass_count, 5);
        assert_eq!(summary.group_count, 2);

        let submissions = backend.take_submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].queue, QueueType::Graphics);
        let labels: Vec<&str> = submissions[0]
            .streams
            .iter()
            .map(|stream| stream.label.as_str())
            .collect();
        assert_eq!(labels, ["a", "b", "c", "d", "e"]);

        // Every pass is wrapped in a debug marker.
        for stream in &submissions[0].streams {
            assert_eq!(
                stream.commands.first(),
                Some(&RecordedCommand::BeginMarker(stream.label.clone()))
            );
            assert_eq!(stream.commands.last(), Some(&RecordedCommand::EndMarker));
        }
    }

    #[test]
    fn test_compute_pass_recorded_for_frame_queue() {
        let (backend, mut graph) = graph();
        let none = graph.alloc_descriptor();
        let pass = graph
            .add_compute_pass("cull", none, |stream| stream.dispatch(1, 1, 1))
            .unwrap();
        assert_eq!(graph.pass(pass).unwrap().queue(), QueueType::Compute);

        graph.execute().unwrap();

        let submissions = backend.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].queue, QueueType::Graphics);
        assert_eq!(submissions[0].streams[0].queue, QueueType::Graphics);
    }

    #[test]
    fn test_invalid_transient_descriptor() {
        let (_, mut graph) = graph();
        assert!(matches!(
            graph.create_buffer(BufferDescriptor::new(0, BufferUsage::STORAGE)),
            Err(GraphError::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn test_backend_failure_aborts_execute() {
        let (backend, mut graph) = graph();
        backend.set_fail_submissions(true);
        let descriptor = graph.alloc_descriptor();
        graph.add_compute_pass("a", descriptor, |_| {}).unwrap();

        assert!(matches!(graph.execute(), Err(GraphError::Backend(_))));
        assert_eq!(graph.phase(), GraphPhase::Compiled);
    }
}
