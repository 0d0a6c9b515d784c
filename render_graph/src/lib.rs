//! # RedLilium Render Graph
//!
//! Frame render graph with automatic GPU resource hazard tracking.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`RenderGraph`] - registers a frame's passes, groups independent ones and
//!   records each group in parallel
//! - [`CommandStream`] - recording context that places pipeline barriers
//!   automatically from the states pass code declares
//! - [`ResourceStateTracker`] - per-stream, per-subresource state tracking with
//!   permanent and keep-initial-state resources
//! - [`GpuBackend`] - backend abstraction, with an in-memory [`DummyBackend`]
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use redlilium_render_graph::*;
//!
//! let backend = Arc::new(DummyBackend::new());
//! let device = GraphicsDevice::new(backend.clone(), GraphicsConfig::default());
//! let hdr = device
//!     .create_texture(&TextureDescriptor::new_2d(
//!         1280,
//!         720,
//!         TextureFormat::Rgba16Float,
//!         TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
//!     ))
//!     .unwrap();
//!
//! let mut graph = RenderGraph::new(device);
//! let descriptor = graph.alloc_descriptor();
//! graph.descriptor_mut(descriptor).unwrap().add_raw_write(&hdr);
//!
//! let target = hdr.clone();
//! graph
//!     .add_graphics_pass("opaque", descriptor, move |stream| {
//!         stream.begin_tracking_texture_state(
//!             &target,
//!             TextureSubresourceSet::ALL,
//!             ResourceStates::COMMON,
//!         );
//!         stream.set_graphics_state(&GraphicsState {
//!             framebuffer: Some(FramebufferDesc::new().with_color(Attachment::new(&target))),
//!             ..Default::default()
//!         });
//!         stream.draw(&DrawArguments::new(3));
//!     })
//!     .unwrap();
//!
//! let summary = graph.execute().unwrap();
//! assert!(summary.diagnostics.is_empty());
//! assert_eq!(backend.submission_count(), 1);
//! ```

pub mod backend;
pub mod command;
pub mod config;
pub mod device;
pub mod error;
pub mod graph;
pub mod resources;
pub mod sync;
pub mod tracking;
pub mod types;

// Re-export main types for convenience
pub use backend::dummy::DummyBackend;
pub use backend::{BackendError, CommandEncoder, GpuBackend, QueueType};
pub use command::{
    Attachment, CommandStream, ComputeState, DrawArguments, FramebufferDesc, GraphicsState,
    LoadOp, StoreOp, TextureSlice, VertexBufferBinding,
};
pub use config::GraphicsConfig;
pub use device::GraphicsDevice;
pub use error::{GraphDiagnostic, GraphError};
pub use graph::{
    BindingItem, BindingSet, DescriptorHandle, ExecutionSummary, GraphPhase, PassDescriptor,
    PassFlags, PassGroup, PassHandle, RenderGraph, ResourceUsage,
};
pub use resources::{
    Buffer, BufferId, ResourceId, Texture, TextureId, TransientBufferHandle,
    TransientTextureHandle,
};
pub use tracking::{HazardError, ResourceStateTracker};
pub use types::{
    BufferDescriptor, BufferUsage, Extent3d, ResourceStates, TextureDescriptor, TextureFormat,
    TextureSubresourceSet, TextureUsage,
};

/// Render graph library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
