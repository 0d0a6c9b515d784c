//! Per-command-stream resource hazard tracking.
//!
//! A [`ResourceStateTracker`] turns "resource R must be in state S" requests
//! into the minimal list of barriers, given what it knows about R within the
//! current recording epoch (the lifetime of one command stream between open
//! and submission).
//!
//! # Whole vs. subresource tracking
//!
//! A texture starts whole-tracked: one state for all subresources. The first
//! request that touches only part of it expands tracking to one state per
//! `(mip, slice)`, indexed `mip + slice * mip_level_count`, and it stays
//! expanded until the epoch ends.
//!
//! # UAV barriers
//!
//! Requesting `UNORDERED_ACCESS` on a resource already in that state still
//! emits a barrier so that consecutive UAV writes are ordered. With
//! [`set_enable_uav_barriers_for_texture`](ResourceStateTracker::set_enable_uav_barriers_for_texture)
//! set to `false`, only the first such barrier of the epoch is placed.
//!
//! # Permanent states
//!
//! A resource promoted with `set_permanent_*_state` keeps that state for the
//! rest of its life once the promoting stream is submitted. Later requests are
//! only verified against it; they never emit barriers.
//!
//! # Failure semantics
//!
//! Inconsistencies (unknown prior state, permanent-state violations,
//! conflicting promotions) are logged with `log::error!`, collected as
//! [`HazardError`]s, and recording continues with the requested transition.
//! A texture range that runs past the texture's mips or slices is reported as
//! [`HazardError::SubresourceOutOfRange`] and the request is dropped before
//! tracking changes.

mod barrier;
mod error;
mod state;

pub use barrier::{BufferBarrier, TextureBarrier};
pub use error::HazardError;
pub use state::{BufferState, TextureState};

use std::collections::HashMap;
use std::sync::Arc;

use redlilium_core::profiling::profile_function;

use crate::resources::{Buffer, BufferId, Texture, TextureId};
use crate::types::{ResourceStates, TextureSubresourceSet};

#[derive(Debug)]
struct TrackedTexture {
    texture: Arc<Texture>,
    state: TextureState,
}

#[derive(Debug)]
struct TrackedBuffer {
    buffer: Arc<Buffer>,
    state: BufferState,
}

/// Resource state tracking for one command stream.
///
/// Not thread-safe by design: every stream owns its own tracker. Tracked
/// resources are kept in first-use order so restoring initial states is
/// deterministic.
#[derive(Debug)]
pub struct ResourceStateTracker {
    textures: Vec<TrackedTexture>,
    texture_lookup: HashMap<TextureId, usize>,
    buffers: Vec<TrackedBuffer>,
    buffer_lookup: HashMap<BufferId, usize>,

    texture_barriers: Vec<TextureBarrier>,
    buffer_barriers: Vec<BufferBarrier>,

    permanent_textures: Vec<(Arc<Texture>, ResourceStates)>,
    permanent_buffers: Vec<(Arc<Buffer>, ResourceStates)>,

    diagnostics: Vec<HazardError>,
    uav_barriers_by_default: bool,
}

impl Default for ResourceStateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceStateTracker {
    /// Create a tracker with UAV barriers enabled for every resource.
    pub fn new() -> Self {
        Self::with_uav_barriers(true)
    }

    /// Create a tracker whose newly tracked resources start with UAV barriers
    /// enabled or disabled.
    pub fn with_uav_barriers(enabled: bool) -> Self {
        Self {
            textures: Vec::new(),
            texture_lookup: HashMap::new(),
            buffers: Vec::new(),
            buffer_lookup: HashMap::new(),
            texture_barriers: Vec::new(),
            buffer_barriers: Vec::new(),
            permanent_textures: Vec::new(),
            permanent_buffers: Vec::new(),
            diagnostics: Vec::new(),
            uav_barriers_by_default: enabled,
        }
    }

    // ------------------------------------------------------------------
    // Tracking records
    // ------------------------------------------------------------------

    fn texture_slot(&mut self, texture: &Arc<Texture>) -> usize {
        if let Some(&slot) = self.texture_lookup.get(&texture.id()) {
            return slot;
        }

        let desc = texture.descriptor();
        let state = if !desc.keep_initial_state {
            ResourceStates::UNKNOWN
        } else if texture.state_initialized() {
            desc.initial_state
        } else {
            ResourceStates::COMMON
        };

        let slot = self.textures.len();
        self.textures.push(TrackedTexture {
            texture: Arc::clone(texture),
            state: TextureState::new(state, self.uav_barriers_by_default),
        });
        self.texture_lookup.insert(texture.id(), slot);
        slot
    }

    fn buffer_slot(&mut self, buffer: &Arc<Buffer>) -> usize {
        if let Some(&slot) = self.buffer_lookup.get(&buffer.id()) {
            return slot;
        }

        let desc = buffer.descriptor();
        let state = if desc.keep_initial_state {
            desc.initial_state
        } else {
            ResourceStates::UNKNOWN
        };

        let slot = self.buffers.len();
        self.buffers.push(TrackedBuffer {
            buffer: Arc::clone(buffer),
            state: BufferState::new(state, self.uav_barriers_by_default),
        });
        self.buffer_lookup.insert(buffer.id(), slot);
        slot
    }

    fn report(diagnostics: &mut Vec<HazardError>, error: HazardError) {
        log::error!("{error}");
        diagnostics.push(error);
    }

    /// Report a range naming subresources the texture lacks.
    fn check_subresource_range(
        diagnostics: &mut Vec<HazardError>,
        texture: &Texture,
        subresources: &TextureSubresourceSet,
    ) -> bool {
        let desc = texture.descriptor();
        let Some((mip_level, array_slice)) = subresources.first_out_of_range(desc) else {
            return true;
        };
        Self::report(
            diagnostics,
            HazardError::SubresourceOutOfRange {
                resource: texture.debug_name(),
                mip_level,
                array_slice,
                mip_level_count: desc.mip_level_count,
                array_layer_count: desc.array_layer_count,
            },
        );
        false
    }

    fn verify_permanent(
        diagnostics: &mut Vec<HazardError>,
        permanent: ResourceStates,
        required: ResourceStates,
        resource: String,
    ) {
        if !permanent.contains(required) {
            Self::report(
                diagnostics,
                HazardError::PermanentStateViolation {
                    resource,
                    permanent,
                    required,
                },
            );
        }
    }

    /// Tracking record of a texture, if it has been used in this epoch.
    pub fn texture_tracking(&self, texture: &Texture) -> Option<&TextureState> {
        self.texture_lookup
            .get(&texture.id())
            .map(|&slot| &self.textures[slot].state)
    }

    /// Tracking record of a buffer, if it has been used in this epoch.
    pub fn buffer_tracking(&self, buffer: &Buffer) -> Option<&BufferState> {
        self.buffer_lookup
            .get(&buffer.id())
            .map(|&slot| &self.buffers[slot].state)
    }

    // ------------------------------------------------------------------
    // UAV barrier control
    // ------------------------------------------------------------------

    /// Enable or disable repeated UAV barriers for a texture.
    ///
    /// Resets the "first UAV barrier placed" flag, so one barrier is still
    /// emitted after disabling.
    pub fn set_enable_uav_barriers_for_texture(&mut self, texture: &Arc<Texture>, enable: bool) {
        let slot = self.texture_slot(texture);
        let tracking = &mut self.textures[slot].state;
        tracking.enable_uav_barriers = enable;
        tracking.first_uav_barrier_placed = false;
    }

    /// Enable or disable repeated UAV barriers for a buffer.
    pub fn set_enable_uav_barriers_for_buffer(&mut self, buffer: &Arc<Buffer>, enable: bool) {
        let slot = self.buffer_slot(buffer);
        let tracking = &mut self.buffers[slot].state;
        tracking.enable_uav_barriers = enable;
        tracking.first_uav_barrier_placed = false;
    }

    // ------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------

    /// Declare the current state of (part of) a texture without emitting a
    /// barrier.
    pub fn begin_tracking_texture_state(
        &mut self,
        texture: &Arc<Texture>,
        subresources: TextureSubresourceSet,
        state: ResourceStates,
    ) {
        profile_function!();

        if !Self::check_subresource_range(&mut self.diagnostics, texture, &subresources) {
            return;
        }

        let desc = texture.descriptor();
        let subresources = subresources.resolve(desc);
        let slot = self.texture_slot(texture);
        let tracking = &mut self.textures[slot].state;

        if subresources.is_entire_texture(desc) {
            tracking.state = state;
            tracking.subresource_states.clear();
            return;
        }

        if !tracking.is_expanded() {
            tracking.expand(desc.subresource_count());
        }
        for mip_level in subresources.mip_levels() {
            for array_slice in subresources.array_slices() {
                tracking.subresource_states[desc.subresource_index(mip_level, array_slice)] = state;
            }
        }
    }

    /// Declare the current state of a buffer without emitting a barrier.
    pub fn begin_tracking_buffer_state(&mut self, buffer: &Arc<Buffer>, state: ResourceStates) {
        let slot = self.buffer_slot(buffer);
        self.buffers[slot].state.state = state;
    }

    // ------------------------------------------------------------------
    // Permanent states
    // ------------------------------------------------------------------

    /// Transition a texture and lock it in `state` once this stream is
    /// submitted.
    ///
    /// Only whole textures can be made permanent. For a partial set the
    /// transition still happens but the promotion is rejected.
    pub fn set_permanent_texture_state(
        &mut self,
        texture: &Arc<Texture>,
        subresources: TextureSubresourceSet,
        state: ResourceStates,
    ) {
        if !Self::check_subresource_range(&mut self.diagnostics, texture, &subresources) {
            return;
        }

        let desc = texture.descriptor();
        let subresources = subresources.resolve(desc);

        let permanent = subresources.is_entire_texture(desc);
        if !permanent {
            Self::report(
                &mut self.diagnostics,
                HazardError::PartialPermanentState {
                    resource: texture.debug_name(),
                },
            );
        }

        self.require_texture_state(texture, subresources, state);

        if permanent {
            self.permanent_textures.push((Arc::clone(texture), state));
            let slot = self.texture_slot(texture);
            self.textures[slot].state.permanent_transition = true;
        }
    }

    /// Transition a buffer and lock it in `state` once this stream is
    /// submitted.
    pub fn set_permanent_buffer_state(&mut self, buffer: &Arc<Buffer>, state: ResourceStates) {
        self.require_buffer_state(buffer, state);

        self.permanent_buffers.push((Arc::clone(buffer), state));
        if let Some(&slot) = self.buffer_lookup.get(&buffer.id()) {
            self.buffers[slot].state.permanent_transition = true;
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// State of one texture subresource as known to this stream.
    ///
    /// Untracked textures report their initial state if they keep one
    /// (`COMMON` before their first submission), otherwise `UNKNOWN`.
    pub fn texture_subresource_state(
        &self,
        texture: &Texture,
        array_slice: u32,
        mip_level: u32,
    ) -> Result<ResourceStates, HazardError> {
        let desc = texture.descriptor();
        if mip_level >= desc.mip_level_count || array_slice >= desc.array_layer_count {
            return Err(HazardError::SubresourceOutOfRange {
                resource: texture.debug_name(),
                mip_level,
                array_slice,
                mip_level_count: desc.mip_level_count,
                array_layer_count: desc.array_layer_count,
            });
        }

        let Some(tracking) = self.texture_tracking(texture) else {
            return Ok(if !desc.keep_initial_state {
                ResourceStates::UNKNOWN
            } else if texture.state_initialized() {
                desc.initial_state
            } else {
                ResourceStates::COMMON
            });
        };

        if !tracking.is_expanded() {
            return Ok(tracking.state);
        }
        Ok(tracking.subresource_states[desc.subresource_index(mip_level, array_slice)])
    }

    /// State of a buffer as known to this stream.
    ///
    /// Untracked buffers report their initial state if they keep one,
    /// otherwise `UNKNOWN`.
    pub fn buffer_state(&self, buffer: &Buffer) -> ResourceStates {
        match self.buffer_tracking(buffer) {
            Some(tracking) => tracking.state,
            None if buffer.descriptor().keep_initial_state => buffer.descriptor().initial_state,
            None => ResourceStates::UNKNOWN,
        }
    }

    // ------------------------------------------------------------------
    // Requirements
    // ------------------------------------------------------------------

    /// Make sure the given subresources are in `state`, queueing barriers as
    /// needed.
    ///
    /// A range past the end of the texture is reported and ignored.
    pub fn require_texture_state(
        &mut self,
        texture: &Arc<Texture>,
        subresources: TextureSubresourceSet,
        state: ResourceStates,
    ) {
        profile_function!();

        if !Self::check_subresource_range(&mut self.diagnostics, texture, &subresources) {
            return;
        }

        if let Some(permanent) = texture.permanent_state() {
            Self::verify_permanent(
                &mut self.diagnostics,
                permanent,
                state,
                texture.debug_name(),
            );
            return;
        }

        let desc = texture.descriptor();
        let subresources = subresources.resolve(desc);
        let slot = self.texture_slot(texture);
        let tracking = &mut self.textures[slot].state;

        if subresources.is_entire_texture(desc) && !tracking.is_expanded() {
            let transition_necessary = tracking.state != state;
            let uav_necessary = tracking.needs_uav_barrier(state);

            if transition_necessary || uav_necessary {
                self.texture_barriers.push(TextureBarrier {
                    texture: Arc::clone(texture),
                    mip_level: 0,
                    array_slice: 0,
                    entire_texture: true,
                    state_before: tracking.state,
                    state_after: state,
                });
            }

            tracking.state = state;

            if uav_necessary && !transition_necessary {
                tracking.first_uav_barrier_placed = true;
            }
            return;
        }

        let mut state_expanded = false;
        if !tracking.is_expanded() {
            if tracking.state.is_unknown() {
                Self::report(
                    &mut self.diagnostics,
                    HazardError::UnknownPriorState {
                        resource: texture.debug_name(),
                    },
                );
            }
            tracking.expand(desc.subresource_count());
            state_expanded = true;
        }

        let mut any_uav_barrier = false;
        for array_slice in subresources.array_slices() {
            for mip_level in subresources.mip_levels() {
                let index = desc.subresource_index(mip_level, array_slice);
                let prior = tracking.subresource_states[index];

                if prior.is_unknown() && !state_expanded {
                    Self::report(
                        &mut self.diagnostics,
                        HazardError::UnknownSubresourceState {
                            resource: texture.debug_name(),
                            mip_level,
                            array_slice,
                        },
                    );
                }

                let transition_necessary = prior != state;
                let uav_necessary = !any_uav_barrier && tracking.needs_uav_barrier(state);

                if transition_necessary || uav_necessary {
                    self.texture_barriers.push(TextureBarrier {
                        texture: Arc::clone(texture),
                        mip_level,
                        array_slice,
                        entire_texture: false,
                        state_before: prior,
                        state_after: state,
                    });
                }

                tracking.subresource_states[index] = state;

                if uav_necessary && !transition_necessary {
                    any_uav_barrier = true;
                    tracking.first_uav_barrier_placed = true;
                }
            }
        }
    }

    /// Make sure a buffer is in `state`, queueing or merging a barrier as
    /// needed.
    ///
    /// Dynamic and CPU-writable buffers are not tracked and are ignored.
    pub fn require_buffer_state(&mut self, buffer: &Arc<Buffer>, state: ResourceStates) {
        profile_function!();

        let desc = buffer.descriptor();
        if desc.is_dynamic() {
            return;
        }

        if let Some(permanent) = buffer.permanent_state() {
            Self::verify_permanent(&mut self.diagnostics, permanent, state, buffer.debug_name());
            return;
        }

        if desc.is_cpu_writable() {
            return;
        }

        let slot = self.buffer_slot(buffer);
        let tracking = &mut self.buffers[slot].state;

        if tracking.state.is_unknown() {
            Self::report(
                &mut self.diagnostics,
                HazardError::UnknownPriorState {
                    resource: buffer.debug_name(),
                },
            );
        }

        let transition_necessary = tracking.state != state;
        let uav_necessary = tracking.needs_uav_barrier(state);

        if transition_necessary {
            // Same buffer used for another purpose in this batch: merge.
            if let Some(barrier) = self
                .buffer_barriers
                .iter_mut()
                .find(|barrier| barrier.buffer.id() == buffer.id())
            {
                barrier.state_after |= state;
                tracking.state = barrier.state_after;
                return;
            }
        }

        if transition_necessary || uav_necessary {
            self.buffer_barriers.push(BufferBarrier {
                buffer: Arc::clone(buffer),
                state_before: tracking.state,
                state_after: state,
            });
        }

        if uav_necessary && !transition_necessary {
            tracking.first_uav_barrier_placed = true;
        }

        tracking.state = state;
    }

    // ------------------------------------------------------------------
    // Stream lifecycle
    // ------------------------------------------------------------------

    /// Return every keep-initial-state buffer to its initial state.
    pub fn keep_buffer_initial_states(&mut self) {
        profile_function!();

        let restore: Vec<(Arc<Buffer>, ResourceStates)> = self
            .buffers
            .iter()
            .filter(|tracked| {
                let desc = tracked.buffer.descriptor();
                desc.keep_initial_state
                    && tracked.buffer.permanent_state().is_none()
                    && !desc.is_dynamic()
                    && !tracked.state.permanent_transition
            })
            .map(|tracked| {
                (
                    Arc::clone(&tracked.buffer),
                    tracked.buffer.descriptor().initial_state,
                )
            })
            .collect();

        for (buffer, state) in restore {
            self.require_buffer_state(&buffer, state);
        }
    }

    /// Return every keep-initial-state texture (all subresources) to its
    /// initial state.
    pub fn keep_texture_initial_states(&mut self) {
        profile_function!();

        let restore: Vec<(Arc<Texture>, ResourceStates)> = self
            .textures
            .iter()
            .filter(|tracked| {
                tracked.texture.descriptor().keep_initial_state
                    && tracked.texture.permanent_state().is_none()
                    && !tracked.state.permanent_transition
            })
            .map(|tracked| {
                (
                    Arc::clone(&tracked.texture),
                    tracked.texture.descriptor().initial_state,
                )
            })
            .collect();

        for (texture, state) in restore {
            self.require_texture_state(&texture, TextureSubresourceSet::ALL, state);
        }
    }

    /// End the epoch after the stream has been submitted.
    ///
    /// Commits queued permanent promotions (a conflicting promotion is
    /// reported and the existing state kept), marks keep-initial textures as
    /// initialized, then forgets all tracking and pending barriers.
    pub fn command_list_submitted(&mut self) {
        profile_function!();

        for (texture, state) in self.permanent_textures.drain(..) {
            let mut permanent = texture.permanent_state_lock().write();
            let current = *permanent;
            match current {
                Some(existing) if existing != state => Self::report(
                    &mut self.diagnostics,
                    HazardError::PermanentPromotionConflict {
                        resource: texture.debug_name(),
                        existing,
                        requested: state,
                    },
                ),
                _ => *permanent = Some(state),
            }
        }

        for (buffer, state) in self.permanent_buffers.drain(..) {
            let mut permanent = buffer.permanent_state_lock().write();
            let current = *permanent;
            match current {
                Some(existing) if existing != state => Self::report(
                    &mut self.diagnostics,
                    HazardError::PermanentPromotionConflict {
                        resource: buffer.debug_name(),
                        existing,
                        requested: state,
                    },
                ),
                _ => *permanent = Some(state),
            }
        }

        for tracked in &self.textures {
            if tracked.texture.descriptor().keep_initial_state {
                tracked.texture.mark_state_initialized();
            }
        }

        self.textures.clear();
        self.texture_lookup.clear();
        self.buffers.clear();
        self.buffer_lookup.clear();
        self.texture_barriers.clear();
        self.buffer_barriers.clear();
    }

    // ------------------------------------------------------------------
    // Barrier access
    // ------------------------------------------------------------------

    /// Texture barriers queued since the last flush, in request order.
    pub fn texture_barriers(&self) -> &[TextureBarrier] {
        &self.texture_barriers
    }

    /// Buffer barriers queued since the last flush, in request order.
    pub fn buffer_barriers(&self) -> &[BufferBarrier] {
        &self.buffer_barriers
    }

    pub fn has_pending_barriers(&self) -> bool {
        !self.texture_barriers.is_empty() || !self.buffer_barriers.is_empty()
    }

    /// Drop queued barriers after they have been flushed to the encoder.
    pub fn clear_barriers(&mut self) {
        self.texture_barriers.clear();
        self.buffer_barriers.clear();
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Errors reported so far.
    pub fn diagnostics(&self) -> &[HazardError] {
        &self.diagnostics
    }

    /// Take all errors reported so far.
    pub fn take_diagnostics(&mut self) -> Vec<HazardError> {
        std::mem::take(&mut self.diagnostics)
    }
}
