//! Graphics device.
//!
//! The [`GraphicsDevice`] owns the backend and the task scheduler, hands out
//! resources with stable ids and opens and submits command streams.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use redlilium_core::tasks::{TaskScheduler, ThreadPool};

use crate::backend::{GpuBackend, QueueType};
use crate::command::CommandStream;
use crate::config::GraphicsConfig;
use crate::error::GraphError;
use crate::resources::{Buffer, BufferId, Texture, TextureId};
use crate::tracking::HazardError;
use crate::types::{BufferDescriptor, TextureDescriptor};

/// Entry point for creating resources and recording work.
///
/// # Thread Safety
///
/// `GraphicsDevice` is `Send + Sync`; passes recording in parallel open and
/// close their streams through a shared `Arc<GraphicsDevice>`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use redlilium_render_graph::{
///     BufferDescriptor, BufferUsage, DummyBackend, GraphicsConfig, GraphicsDevice,
/// };
///
/// let device = GraphicsDevice::new(Arc::new(DummyBackend::new()), GraphicsConfig::default());
/// let buffer = device
///     .create_buffer(&BufferDescriptor::new(256, BufferUsage::UNIFORM))
///     .unwrap();
/// assert_eq!(buffer.size(), 256);
/// ```
pub struct GraphicsDevice {
    backend: Arc<dyn GpuBackend>,
    scheduler: Arc<dyn TaskScheduler>,
    config: GraphicsConfig,
    next_resource_id: AtomicU64,
}

static_assertions::assert_impl_all!(GraphicsDevice: Send, Sync);

impl GraphicsDevice {
    /// Create a device recording on a [`ThreadPool`] sized by `config`.
    pub fn new(backend: Arc<dyn GpuBackend>, config: GraphicsConfig) -> Arc<Self> {
        let scheduler = Arc::new(ThreadPool::new(config.effective_threads()));
        Self::with_scheduler(backend, scheduler, config)
    }

    /// Create a device with a caller-provided scheduler.
    pub fn with_scheduler(
        backend: Arc<dyn GpuBackend>,
        scheduler: Arc<dyn TaskScheduler>,
        config: GraphicsConfig,
    ) -> Arc<Self> {
        log::info!(
            "GraphicsDevice: {} backend, {} worker threads",
            backend.name(),
            scheduler.num_threads()
        );
        Arc::new(Self {
            backend,
            scheduler,
            config,
            next_resource_id: AtomicU64::new(1),
        })
    }

    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    pub fn scheduler(&self) -> &Arc<dyn TaskScheduler> {
        &self.scheduler
    }

    pub fn config(&self) -> &GraphicsConfig {
        &self.config
    }

    fn next_id(&self) -> u64 {
        self.next_resource_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Create a buffer.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidDescriptor`] for a zero-sized buffer.
    pub fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<Arc<Buffer>, GraphError> {
        validate_buffer_descriptor(descriptor)?;

        let buffer = Arc::new(Buffer::new(BufferId(self.next_id()), descriptor.clone()));
        log::trace!(
            "GraphicsDevice: created buffer {}, size={}",
            buffer.debug_name(),
            descriptor.size
        );
        Ok(buffer)
    }

    /// Create a texture.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidDescriptor`] for zero dimensions, mip
    /// levels or array layers.
    pub fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<Arc<Texture>, GraphError> {
        validate_texture_descriptor(descriptor)?;

        let texture = Arc::new(Texture::new(TextureId(self.next_id()), descriptor.clone()));
        log::trace!(
            "GraphicsDevice: created texture {}, size={}x{}, {} mips, {} layers",
            texture.debug_name(),
            descriptor.size.width,
            descriptor.size.height,
            descriptor.mip_level_count,
            descriptor.array_layer_count
        );
        Ok(texture)
    }

    /// Open a command stream recording for `queue`.
    pub fn create_command_stream(
        &self,
        queue: QueueType,
        label: &str,
    ) -> Result<CommandStream, GraphError> {
        let encoder = self.backend.open_encoder(queue, label)?;
        Ok(CommandStream::new(
            encoder,
            queue,
            self.config.uav_barriers_by_default,
        ))
    }

    /// Submit closed streams to `queue` in order.
    ///
    /// After a successful submission every stream's tracker commits its
    /// permanent promotions. Hazards found doing so are returned.
    ///
    /// # Errors
    ///
    /// [`GraphError::StreamNotClosed`] if any stream is still open; backend
    /// failures as [`GraphError::Backend`]. Nothing is submitted in either case.
    pub fn submit(
        &self,
        queue: QueueType,
        streams: Vec<CommandStream>,
    ) -> Result<Vec<HazardError>, GraphError> {
        redlilium_core::profile_function!();

        if let Some(open) = streams.iter().find(|stream| !stream.is_closed()) {
            return Err(GraphError::StreamNotClosed(open.label().to_string()));
        }

        let (encoders, mut trackers): (Vec<_>, Vec<_>) =
            streams.into_iter().map(CommandStream::into_parts).unzip();

        log::trace!(
            "GraphicsDevice: submitting {} streams to {queue:?}",
            encoders.len()
        );
        self.backend.submit(queue, encoders)?;

        let mut hazards = Vec::new();
        for tracker in &mut trackers {
            tracker.command_list_submitted();
            hazards.extend(tracker.take_diagnostics());
        }
        Ok(hazards)
    }
}

impl std::fmt::Debug for GraphicsDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("backend", &self.backend.name())
            .field("threads", &self.scheduler.num_threads())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

pub(crate) fn validate_buffer_descriptor(descriptor: &BufferDescriptor) -> Result<(), GraphError> {
    if descriptor.size == 0 {
        return Err(GraphError::InvalidDescriptor(
            "buffer size cannot be zero".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_texture_descriptor(
    descriptor: &TextureDescriptor,
) -> Result<(), GraphError> {
    if descriptor.size.width == 0 || descriptor.size.height == 0 || descriptor.size.depth == 0 {
        return Err(GraphError::InvalidDescriptor(
            "texture dimensions cannot be zero".to_string(),
        ));
    }
    if descriptor.mip_level_count == 0 {
        return Err(GraphError::InvalidDescriptor(
            "texture needs at least one mip level".to_string(),
        ));
    }
    if descriptor.array_layer_count == 0 {
        return Err(GraphError::InvalidDescriptor(
            "texture needs at least one array layer".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::DummyBackend;
    use crate::types::{BufferUsage, ResourceStates, TextureFormat, TextureUsage};
    use redlilium_core::tasks::InlineScheduler;

    fn device() -> (Arc<DummyBackend>, Arc<GraphicsDevice>) {
        let backend = Arc::new(DummyBackend::new());
        let device = GraphicsDevice::with_scheduler(
            backend.clone(),
            Arc::new(InlineScheduler),
            GraphicsConfig::default(),
        );
        (backend, device)
    }

    #[test]
    fn test_resource_ids_are_unique() {
        let (_, device) = device();
        let a = device
            .create_buffer(&BufferDescriptor::new(16, BufferUsage::STORAGE))
            .unwrap();
        let b = device
            .create_buffer(&BufferDescriptor::new(16, BufferUsage::STORAGE))
            .unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_invalid_descriptors() {
        let (_, device) = device();
        assert!(matches!(
            device.create_buffer(&BufferDescriptor::new(0, BufferUsage::VERTEX)),
            Err(GraphError::InvalidDescriptor(_))
        ));

        let descriptor = TextureDescriptor::new_2d(
            64,
            64,
            TextureFormat::Rgba8Unorm,
            TextureUsage::TEXTURE_BINDING,
        )
        .with_mip_levels(0);
        assert!(matches!(
            device.create_texture(&descriptor),
            Err(GraphError::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn test_submit_rejects_open_stream() {
        let (backend, device) = device();
        let stream = device
            .create_command_stream(QueueType::Graphics, "open")
            .unwrap();
        assert_eq!(
            device.submit(QueueType::Graphics, vec![stream]).unwrap_err(),
            GraphError::StreamNotClosed("open".to_string())
        );
        assert_eq!(backend.submission_count(), 0);
    }

    #[test]
    fn test_submit_commits_permanent_state() {
        let (backend, device) = device();
        let buffer = device
            .create_buffer(&BufferDescriptor::new(64, BufferUsage::UNIFORM))
            .unwrap();

        let mut stream = device
            .create_command_stream(QueueType::Graphics, "upload")
            .unwrap();
        stream.begin_tracking_buffer_state(&buffer, ResourceStates::COPY_DEST);
        stream.set_permanent_buffer_state(&buffer, ResourceStates::CONSTANT_BUFFER);
        stream.close().unwrap();

        let hazards = device.submit(QueueType::Graphics, vec![stream]).unwrap();
        assert!(hazards.is_empty());
        assert_eq!(backend.submission_count(), 1);
        assert_eq!(buffer.permanent_state(), Some(ResourceStates::CONSTANT_BUFFER));
    }

    #[test]
    fn test_failed_submission_skips_promotion() {
        let (backend, device) = device();
        backend.set_fail_submissions(true);
        let buffer = device
            .create_buffer(&BufferDescriptor::new(64, BufferUsage::UNIFORM))
            .unwrap();

        let mut stream = device
            .create_command_stream(QueueType::Graphics, "upload")
            .unwrap();
        stream.begin_tracking_buffer_state(&buffer, ResourceStates::COPY_DEST);
        stream.set_permanent_buffer_state(&buffer, ResourceStates::CONSTANT_BUFFER);
        stream.close().unwrap();

        assert!(matches!(
            device.submit(QueueType::Graphics, vec![stream]),
            Err(GraphError::Backend(_))
        ));
        assert_eq!(buffer.permanent_state(), None);
    }
}
