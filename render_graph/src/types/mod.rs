//! Descriptors, usage flags and resource states.
//!
//! These are plain data types shared by the tracker, the command stream and
//! the render graph.

mod buffer;
mod state;
mod subresource;
mod texture;

pub use buffer::{BufferDescriptor, BufferUsage};
pub use state::ResourceStates;
pub use subresource::TextureSubresourceSet;
pub use texture::{Extent3d, TextureDescriptor, TextureFormat, TextureUsage};
