//! Per-stream tracking records.

use crate::types::ResourceStates;

/// Tracked state of one texture within a command stream.
///
/// Either whole-tracked (`subresource_states` empty, `state` valid) or fully
/// expanded (`subresource_states` holds every mip of every slice, `state` is
/// `UNKNOWN`). Never partially expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureState {
    pub state: ResourceStates,
    pub subresource_states: Vec<ResourceStates>,
    pub enable_uav_barriers: bool,
    pub first_uav_barrier_placed: bool,
    /// Set by a permanent promotion; exempts the texture from being restored
    /// to its initial state on close.
    pub permanent_transition: bool,
}

impl TextureState {
    pub(crate) fn new(state: ResourceStates, enable_uav_barriers: bool) -> Self {
        Self {
            state,
            subresource_states: Vec::new(),
            enable_uav_barriers,
            first_uav_barrier_placed: false,
            permanent_transition: false,
        }
    }

    pub fn is_expanded(&self) -> bool {
        !self.subresource_states.is_empty()
    }

    /// Switch to per-subresource tracking, backfilling with the whole state.
    pub(crate) fn expand(&mut self, subresource_count: usize) {
        self.subresource_states.clear();
        self.subresource_states.resize(subresource_count, self.state);
        self.state = ResourceStates::UNKNOWN;
    }

    /// Whether a request for `state` needs a UAV ordering barrier.
    pub(crate) fn needs_uav_barrier(&self, state: ResourceStates) -> bool {
        state.is_unordered_access() && (self.enable_uav_barriers || !self.first_uav_barrier_placed)
    }
}

/// Tracked state of one buffer within a command stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferState {
    pub state: ResourceStates,
    pub enable_uav_barriers: bool,
    pub first_uav_barrier_placed: bool,
    pub permanent_transition: bool,
}

impl BufferState {
    pub(crate) fn new(state: ResourceStates, enable_uav_barriers: bool) -> Self {
        Self {
            state,
            enable_uav_barriers,
            first_uav_barrier_placed: false,
            permanent_transition: false,
        }
    }

    pub(crate) fn needs_uav_barrier(&self, state: ResourceStates) -> bool {
        state.is_unordered_access() && (self.enable_uav_barriers || !self.first_uav_barrier_placed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_backfills_prior_state() {
        let mut tracking = TextureState::new(ResourceStates::SHADER_RESOURCE, true);
        tracking.expand(6);

        assert!(tracking.is_expanded());
        assert_eq!(tracking.state, ResourceStates::UNKNOWN);
        assert_eq!(
            tracking.subresource_states,
            vec![ResourceStates::SHADER_RESOURCE; 6]
        );
    }

    #[test]
    fn test_uav_barrier_once_when_disabled() {
        let mut tracking = BufferState::new(ResourceStates::UNORDERED_ACCESS, false);
        assert!(tracking.needs_uav_barrier(ResourceStates::UNORDERED_ACCESS));

        tracking.first_uav_barrier_placed = true;
        assert!(!tracking.needs_uav_barrier(ResourceStates::UNORDERED_ACCESS));
        assert!(!tracking.needs_uav_barrier(ResourceStates::SHADER_RESOURCE));
    }
}
