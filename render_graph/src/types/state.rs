//! Resource states tracked per texture subresource and per buffer.

use bitflags::bitflags;

bitflags! {
    /// The way a resource is about to be used by the GPU.
    ///
    /// States combine: a buffer read as both index and indirect-argument data
    /// in one pass is in `INDEX_BUFFER | INDIRECT_ARGUMENT`. The empty set is
    /// [`UNKNOWN`](Self::UNKNOWN), meaning "never established".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ResourceStates: u32 {
        const UNKNOWN = 0;
        const COMMON = 1 << 0;
        const CONSTANT_BUFFER = 1 << 1;
        const VERTEX_BUFFER = 1 << 2;
        const INDEX_BUFFER = 1 << 3;
        const INDIRECT_ARGUMENT = 1 << 4;
        const SHADER_RESOURCE = 1 << 5;
        const UNORDERED_ACCESS = 1 << 6;
        const RENDER_TARGET = 1 << 7;
        const DEPTH_WRITE = 1 << 8;
        const DEPTH_READ = 1 << 9;
        const STREAM_OUT = 1 << 10;
        const COPY_DEST = 1 << 11;
        const COPY_SOURCE = 1 << 12;
        const RESOLVE_DEST = 1 << 13;
        const RESOLVE_SOURCE = 1 << 14;
        const PRESENT = 1 << 15;
        const ACCEL_STRUCT_READ = 1 << 16;
        const ACCEL_STRUCT_WRITE = 1 << 17;
        const ACCEL_STRUCT_BUILD_INPUT = 1 << 18;
        const ACCEL_STRUCT_BUILD_BLAS = 1 << 19;
        const SHADING_RATE_SURFACE = 1 << 20;
    }
}

impl ResourceStates {
    /// States in which the GPU may write the resource.
    pub const WRITE_STATES: Self = Self::UNORDERED_ACCESS
        .union(Self::RENDER_TARGET)
        .union(Self::DEPTH_WRITE)
        .union(Self::STREAM_OUT)
        .union(Self::COPY_DEST)
        .union(Self::RESOLVE_DEST)
        .union(Self::ACCEL_STRUCT_WRITE);

    /// Whether the state has never been established.
    pub fn is_unknown(self) -> bool {
        self.is_empty()
    }

    /// Whether any of the contained states allows GPU writes.
    pub fn is_write(self) -> bool {
        self.intersects(Self::WRITE_STATES)
    }

    /// Whether the state needs UAV ordering even without a transition.
    pub fn is_unordered_access(self) -> bool {
        self.contains(Self::UNORDERED_ACCESS)
    }
}
