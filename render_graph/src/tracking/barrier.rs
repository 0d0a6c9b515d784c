//! Transition requests accumulated by the tracker.

use std::sync::Arc;

use crate::resources::{Buffer, Texture};
use crate::types::ResourceStates;

/// A pending texture transition.
///
/// Covers the whole texture when `entire_texture` is set, otherwise the single
/// subresource at `mip_level` / `array_slice`.
#[derive(Debug, Clone)]
pub struct TextureBarrier {
    pub texture: Arc<Texture>,
    pub mip_level: u32,
    pub array_slice: u32,
    pub entire_texture: bool,
    pub state_before: ResourceStates,
    pub state_after: ResourceStates,
}

impl TextureBarrier {
    /// Whether the barrier only orders UAV accesses without changing state.
    pub fn is_uav_only(&self) -> bool {
        self.state_before == self.state_after
    }
}

/// A pending buffer transition.
#[derive(Debug, Clone)]
pub struct BufferBarrier {
    pub buffer: Arc<Buffer>,
    pub state_before: ResourceStates,
    pub state_after: ResourceStates,
}

impl BufferBarrier {
    pub fn is_uav_only(&self) -> bool {
        self.state_before == self.state_after
    }
}
