//! Declared resource usage of one pass.

use std::sync::Arc;

use redlilium_core::arena::ArenaIndex;

use super::{BindingItem, BindingSet};
use crate::resources::ResourceId;

/// Bindings and raw accesses of a pass: the input of hazard analysis.
///
/// Render targets, depth writes, present images and anything else touched
/// outside a [`BindingSet`] must be declared with
/// [`add_raw_write`](Self::add_raw_write) / [`add_raw_read`](Self::add_raw_read).
#[derive(Debug, Clone, Default)]
pub struct PassDescriptor {
    bindings: Vec<Arc<BindingSet>>,
    raw_reads: Vec<ResourceId>,
    raw_writes: Vec<ResourceId>,
}

impl PassDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_binding(&mut self, bindings: Arc<BindingSet>) -> &mut Self {
        self.bindings.push(bindings);
        self
    }

    pub fn add_raw_read(&mut self, resource: impl Into<ResourceId>) -> &mut Self {
        self.raw_reads.push(resource.into());
        self
    }

    pub fn add_raw_write(&mut self, resource: impl Into<ResourceId>) -> &mut Self {
        self.raw_writes.push(resource.into());
        self
    }

    pub fn bindings(&self) -> &[Arc<BindingSet>] {
        &self.bindings
    }

    pub fn raw_reads(&self) -> &[ResourceId] {
        &self.raw_reads
    }

    pub fn raw_writes(&self) -> &[ResourceId] {
        &self.raw_writes
    }

    /// Every resource referenced by the descriptor, reads first.
    pub fn resources(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.raw_reads
            .iter()
            .chain(&self.raw_writes)
            .copied()
            .chain(
                self.bindings
                    .iter()
                    .flat_map(|set| set.items().iter().map(BindingItem::resource_id)),
            )
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty() && self.raw_reads.is_empty() && self.raw_writes.is_empty()
    }
}

/// Handle to a [`PassDescriptor`] allocated with
/// [`RenderGraph::alloc_descriptor`](super::RenderGraph::alloc_descriptor).
///
/// Valid only until the graph is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorHandle(pub(crate) ArenaIndex<PassDescriptor>);
