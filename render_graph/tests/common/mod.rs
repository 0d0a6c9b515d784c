//! Shared helpers for render graph integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use redlilium_core::tasks::{InlineScheduler, TaskScheduler, ThreadPool};
use redlilium_render_graph::backend::dummy::{RecordedCommand, RecordedStream};
use redlilium_render_graph::{
    Buffer, BufferDescriptor, BufferUsage, DummyBackend, GraphicsConfig, GraphicsDevice,
    RenderGraph, ResourceStates, Texture, TextureDescriptor, TextureFormat, TextureUsage,
};

/// Scheduler a test context records with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduler {
    Inline,
    ThreadPool,
}

/// A dummy-backed device plus a graph.
pub struct TestContext {
    pub backend: Arc<DummyBackend>,
    pub device: Arc<GraphicsDevice>,
}

impl TestContext {
    pub fn new(scheduler: Scheduler) -> Self {
        Self::with_config(scheduler, GraphicsConfig::default())
    }

    pub fn with_config(scheduler: Scheduler, config: GraphicsConfig) -> Self {
        init_logging();

        let scheduler: Arc<dyn TaskScheduler> = match scheduler {
            Scheduler::Inline => Arc::new(InlineScheduler),
            Scheduler::ThreadPool => Arc::new(ThreadPool::new(4)),
        };
        let backend = Arc::new(DummyBackend::new());
        let device = GraphicsDevice::with_scheduler(backend.clone(), scheduler, config);
        Self { backend, device }
    }

    pub fn graph(&self) -> RenderGraph {
        RenderGraph::new(Arc::clone(&self.device))
    }

    pub fn render_target(&self, label: &str) -> Arc<Texture> {
        self.device
            .create_texture(
                &TextureDescriptor::new_2d(
                    64,
                    64,
                    TextureFormat::Rgba8Unorm,
                    TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
                )
                .with_label(label),
            )
            .expect("render target")
    }

    pub fn storage_texture(&self, label: &str, mips: u32, layers: u32) -> Arc<Texture> {
        self.device
            .create_texture(
                &TextureDescriptor::new_2d(
                    64,
                    64,
                    TextureFormat::Rgba16Float,
                    TextureUsage::STORAGE_BINDING | TextureUsage::TEXTURE_BINDING,
                )
                .with_label(label)
                .with_mip_levels(mips)
                .with_array_layers(layers),
            )
            .expect("storage texture")
    }

    pub fn storage_buffer(&self, label: &str) -> Arc<Buffer> {
        self.device
            .create_buffer(&BufferDescriptor::new(1024, BufferUsage::STORAGE).with_label(label))
            .expect("storage buffer")
    }

    /// A buffer restored to `state` whenever a stream using it closes.
    pub fn keep_initial_buffer(&self, label: &str, state: ResourceStates) -> Arc<Buffer> {
        let descriptor = BufferDescriptor::new(1024, BufferUsage::STORAGE | BufferUsage::UNIFORM)
            .with_label(label)
            .with_initial_state(state);
        self.device
            .create_buffer(&descriptor)
            .expect("keep-initial buffer")
    }

    /// Streams of the only submission so far.
    pub fn submitted_streams(&self) -> Vec<RecordedStream> {
        let submissions = self.backend.submissions();
        assert_eq!(submissions.len(), 1, "expected exactly one submission");
        submissions.into_iter().flat_map(|s| s.streams).collect()
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Number of pipeline barrier commands in a stream.
pub fn barrier_count(stream: &RecordedStream) -> usize {
    stream
        .commands
        .iter()
        .filter(|command| matches!(command, RecordedCommand::PipelineBarrier { .. }))
        .count()
}

pub fn stream<'a>(streams: &'a [RecordedStream], label: &str) -> &'a RecordedStream {
    streams
        .iter()
        .find(|stream| stream.label == label)
        .unwrap_or_else(|| panic!("no stream labelled {label}"))
}
