//! Texture subresource ranges.

use super::TextureDescriptor;

/// A range of mip levels and array slices of one texture.
///
/// [`resolve`](Self::resolve) clamps counts to the texture and
/// [`first_out_of_range`](Self::first_out_of_range) finds ranges that overrun
/// it. [`ALL`](Self::ALL) covers every subresource of any texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureSubresourceSet {
    pub base_mip_level: u32,
    pub num_mip_levels: u32,
    pub base_array_slice: u32,
    pub num_array_slices: u32,
}

impl TextureSubresourceSet {
    pub const ALL_MIP_LEVELS: u32 = u32::MAX;
    pub const ALL_ARRAY_SLICES: u32 = u32::MAX;

    /// Every mip level of every array slice.
    pub const ALL: Self = Self {
        base_mip_level: 0,
        num_mip_levels: Self::ALL_MIP_LEVELS,
        base_array_slice: 0,
        num_array_slices: Self::ALL_ARRAY_SLICES,
    };

    pub fn new(
        base_mip_level: u32,
        num_mip_levels: u32,
        base_array_slice: u32,
        num_array_slices: u32,
    ) -> Self {
        Self {
            base_mip_level,
            num_mip_levels,
            base_array_slice,
            num_array_slices,
        }
    }

    /// A single mip level of a single array slice.
    pub fn single(mip_level: u32, array_slice: u32) -> Self {
        Self::new(mip_level, 1, array_slice, 1)
    }

    /// Clamp the range to the texture's mip and layer counts.
    ///
    /// A base beyond the end resolves to an empty range.
    pub fn resolve(self, desc: &TextureDescriptor) -> Self {
        let last_mip = self
            .base_mip_level
            .saturating_add(self.num_mip_levels)
            .min(desc.mip_level_count);
        let last_slice = self
            .base_array_slice
            .saturating_add(self.num_array_slices)
            .min(desc.array_layer_count);

        Self {
            base_mip_level: self.base_mip_level,
            num_mip_levels: last_mip.saturating_sub(self.base_mip_level),
            base_array_slice: self.base_array_slice,
            num_array_slices: last_slice.saturating_sub(self.base_array_slice),
        }
    }

    /// First `(mip, slice)` the range names that the texture lacks.
    ///
    /// The `ALL_*` counts never run past the end.
    pub fn first_out_of_range(&self, desc: &TextureDescriptor) -> Option<(u32, u32)> {
        if self.base_mip_level >= desc.mip_level_count
            || self.base_array_slice >= desc.array_layer_count
        {
            return Some((self.base_mip_level, self.base_array_slice));
        }
        if self.num_mip_levels != Self::ALL_MIP_LEVELS
            && self.base_mip_level.saturating_add(self.num_mip_levels) > desc.mip_level_count
        {
            return Some((desc.mip_level_count, self.base_array_slice));
        }
        if self.num_array_slices != Self::ALL_ARRAY_SLICES
            && self.base_array_slice.saturating_add(self.num_array_slices)
                > desc.array_layer_count
        {
            return Some((self.base_mip_level, desc.array_layer_count));
        }
        None
    }

    /// Whether the range covers every subresource of the texture.
    pub fn is_entire_texture(&self, desc: &TextureDescriptor) -> bool {
        self.base_mip_level == 0
            && self.base_array_slice == 0
            && self.base_mip_level.saturating_add(self.num_mip_levels) >= desc.mip_level_count
            && self.base_array_slice.saturating_add(self.num_array_slices)
                >= desc.array_layer_count
    }

    pub fn is_empty(&self) -> bool {
        self.num_mip_levels == 0 || self.num_array_slices == 0
    }

    /// Mip levels covered by the range.
    pub fn mip_levels(&self) -> std::ops::Range<u32> {
        self.base_mip_level..self.base_mip_level.saturating_add(self.num_mip_levels)
    }

    /// Array slices covered by the range.
    pub fn array_slices(&self) -> std::ops::Range<u32> {
        self.base_array_slice..self.base_array_slice.saturating_add(self.num_array_slices)
    }
}

impl Default for TextureSubresourceSet {
    fn default() -> Self {
        Self::ALL
    }
}
