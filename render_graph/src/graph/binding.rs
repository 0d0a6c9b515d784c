//! Shader resource bindings.

use std::sync::Arc;

use crate::resources::{Buffer, ResourceId, Texture};
use crate::types::{ResourceStates, TextureSubresourceSet};

/// One resource bound to a shader.
#[derive(Debug, Clone)]
pub enum BindingItem {
    /// Sampled / read-only texture view.
    TextureSrv {
        texture: Arc<Texture>,
        subresources: TextureSubresourceSet,
    },
    /// Read-write storage texture view.
    TextureUav {
        texture: Arc<Texture>,
        subresources: TextureSubresourceSet,
    },
    /// Read-only storage buffer.
    BufferSrv(Arc<Buffer>),
    /// Read-write storage buffer.
    BufferUav(Arc<Buffer>),
    ConstantBuffer(Arc<Buffer>),
}

impl BindingItem {
    /// State the resource must be in while the binding is in use.
    pub fn required_state(&self) -> ResourceStates {
        match self {
            Self::TextureSrv { .. } | Self::BufferSrv(_) => ResourceStates::SHADER_RESOURCE,
            Self::TextureUav { .. } | Self::BufferUav(_) => ResourceStates::UNORDERED_ACCESS,
            Self::ConstantBuffer(_) => ResourceStates::CONSTANT_BUFFER,
        }
    }

    /// Whether shaders may write through the binding.
    pub fn is_write(&self) -> bool {
        matches!(self, Self::TextureUav { .. } | Self::BufferUav(_))
    }

    pub fn resource_id(&self) -> ResourceId {
        match self {
            Self::TextureSrv { texture, .. } | Self::TextureUav { texture, .. } => {
                ResourceId::from(texture)
            }
            Self::BufferSrv(buffer) | Self::BufferUav(buffer) | Self::ConstantBuffer(buffer) => {
                ResourceId::from(buffer)
            }
        }
    }
}

/// An immutable group of bindings, shared between pass descriptors and the
/// graphics/compute state set while recording.
///
/// ```ignore
/// let set = Arc::new(
///     BindingSet::new()
///         .with_texture_srv(&albedo, TextureSubresourceSet::ALL)
///         .with_constant_buffer(&camera),
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct BindingSet {
    items: Vec<BindingItem>,
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, item: BindingItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_texture_srv(
        self,
        texture: &Arc<Texture>,
        subresources: TextureSubresourceSet,
    ) -> Self {
        self.with_item(BindingItem::TextureSrv {
            texture: Arc::clone(texture),
            subresources,
        })
    }

    pub fn with_texture_uav(
        self,
        texture: &Arc<Texture>,
        subresources: TextureSubresourceSet,
    ) -> Self {
        self.with_item(BindingItem::TextureUav {
            texture: Arc::clone(texture),
            subresources,
        })
    }

    pub fn with_buffer_srv(self, buffer: &Arc<Buffer>) -> Self {
        self.with_item(BindingItem::BufferSrv(Arc::clone(buffer)))
    }

    pub fn with_buffer_uav(self, buffer: &Arc<Buffer>) -> Self {
        self.with_item(BindingItem::BufferUav(Arc::clone(buffer)))
    }

    pub fn with_constant_buffer(self, buffer: &Arc<Buffer>) -> Self {
        self.with_item(BindingItem::ConstantBuffer(Arc::clone(buffer)))
    }

    pub fn items(&self) -> &[BindingItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Resources read through this set.
    pub fn reads(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.items
            .iter()
            .filter(|item| !item.is_write())
            .map(BindingItem::resource_id)
    }

    /// Resources written through this set.
    pub fn writes(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.items
            .iter()
            .filter(|item| item.is_write())
            .map(BindingItem::resource_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{BufferId, TextureId};
    use crate::types::{
        BufferDescriptor, BufferUsage, TextureDescriptor, TextureFormat, TextureUsage,
    };

    #[test]
    fn test_binding_states_and_access() {
        let texture = Arc::new(Texture::new(
            TextureId(1),
            TextureDescriptor::new_2d(8, 8, TextureFormat::R32Float, TextureUsage::all()),
        ));
        let buffer = Arc::new(Buffer::new(
            BufferId(2),
            BufferDescriptor::new(64, BufferUsage::STORAGE | BufferUsage::UNIFORM),
        ));

        let set = BindingSet::new()
            .with_texture_srv(&texture, TextureSubresourceSet::ALL)
            .with_buffer_uav(&buffer)
            .with_constant_buffer(&buffer);

        let states: Vec<ResourceStates> = set
            .items()
            .iter()
            .map(BindingItem::required_state)
            .collect();
        assert_eq!(
            states,
            vec![
                ResourceStates::SHADER_RESOURCE,
                ResourceStates::UNORDERED_ACCESS,
                ResourceStates::CONSTANT_BUFFER,
            ]
        );
        assert_eq!(
            set.reads().collect::<Vec<_>>(),
            vec![ResourceId::from(&texture), ResourceId::from(&buffer)]
        );
        assert_eq!(set.writes().collect::<Vec<_>>(), vec![ResourceId::from(&buffer)]);
    }
}
