//! Hazard diagnostics.

use thiserror::Error;

use crate::types::ResourceStates;

/// A resource-state inconsistency found while recording.
///
/// Except for [`SubresourceOutOfRange`](Self::SubresourceOutOfRange), these
/// are reported and recording carries on with the requested transition. An
/// out-of-range request is reported and dropped, and queries return it as an
/// `Err`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HazardError {
    #[error(
        "unknown prior state of {resource}; \
         begin tracking it explicitly or give it an initial state"
    )]
    UnknownPriorState { resource: String },

    #[error(
        "unknown prior state of {resource} subresource (mip {mip_level}, slice {array_slice})"
    )]
    UnknownSubresourceState {
        resource: String,
        mip_level: u32,
        array_slice: u32,
    },

    #[error(
        "permanent {resource} lacks required state bits: \
         requires {required:?}, present {permanent:?}"
    )]
    PermanentStateViolation {
        resource: String,
        permanent: ResourceStates,
        required: ResourceStates,
    },

    #[error("permanent state of {resource} can only be set for the entire texture")]
    PartialPermanentState { resource: String },

    #[error("attempted to switch permanent state of {resource} from {existing:?} to {requested:?}")]
    PermanentPromotionConflict {
        resource: String,
        existing: ResourceStates,
        requested: ResourceStates,
    },

    #[error(
        "subresource (mip {mip_level}, slice {array_slice}) out of range for {resource} \
         ({mip_level_count} mips, {array_layer_count} slices)"
    )]
    SubresourceOutOfRange {
        resource: String,
        mip_level: u32,
        array_slice: u32,
        mip_level_count: u32,
        array_layer_count: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HazardError::PartialPermanentState {
            resource: "shadow_map".into(),
        };
        assert_eq!(
            err.to_string(),
            "permanent state of shadow_map can only be set for the entire texture"
        );

        let err = HazardError::PermanentPromotionConflict {
            resource: "lut".into(),
            existing: ResourceStates::SHADER_RESOURCE,
            requested: ResourceStates::COPY_DEST,
        };
        assert!(err.to_string().starts_with("attempted to switch permanent state of lut"));
    }
}
