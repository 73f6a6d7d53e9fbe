//! EXIF orientation codes.

use serde::{Deserialize, Serialize};

/// Orientation of the stored pixels, mirroring the EXIF rotate/mirror codes.
///
/// Names describe the state of the stored pixels; displaying them applies
/// the opposite transform. `Undefined` (tag absent) and `Unknown` (an
/// out-of-range code) both display as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Undefined,
    Normal,
    FlippedH,
    Rotated180,
    FlippedV,
    FlippedHRotated90L,
    Rotated90L,
    FlippedHRotated90R,
    Rotated90R,
    Unknown,
}

impl Orientation {
    /// Map an EXIF orientation code
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Undefined,
            1 => Self::Normal,
            2 => Self::FlippedH,
            3 => Self::Rotated180,
            4 => Self::FlippedV,
            5 => Self::FlippedHRotated90L,
            6 => Self::Rotated90L,
            7 => Self::FlippedHRotated90R,
            8 => Self::Rotated90R,
            _ => Self::Unknown,
        }
    }

    /// EXIF orientation code
    pub fn code(self) -> u16 {
        match self {
            Self::Undefined => 0,
            Self::Normal => 1,
            Self::FlippedH => 2,
            Self::Rotated180 => 3,
            Self::FlippedV => 4,
            Self::FlippedHRotated90L => 5,
            Self::Rotated90L => 6,
            Self::FlippedHRotated90R => 7,
            Self::Rotated90R => 8,
            Self::Unknown => 9,
        }
    }

    /// True for the four states whose display swaps width and height
    pub fn is_quarter_turn(self) -> bool {
        matches!(
            self,
            Self::Rotated90L | Self::Rotated90R | Self::FlippedHRotated90L | Self::FlippedHRotated90R
        )
    }

    /// Size of the picture once displayed in this orientation
    pub fn orient_size(self, width: u32, height: u32) -> (u32, u32) {
        if self.is_quarter_turn() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Orientation after the user rotates the picture by `degrees`
    /// (+90 = right/clockwise, -90 = left, 180).
    ///
    /// Mirrored states and other angles are returned unchanged.
    pub fn rotate(self, degrees: i32) -> Self {
        match (self, degrees) {
            (Self::Undefined | Self::Normal | Self::Unknown, 90) => Self::Rotated90L,
            (Self::Undefined | Self::Normal | Self::Unknown, -90) => Self::Rotated90R,
            (Self::Undefined | Self::Normal | Self::Unknown, 180) => Self::Rotated180,
            (Self::Rotated90L, 90) => Self::Rotated180,
            (Self::Rotated90L, -90) => Self::Normal,
            (Self::Rotated90L, 180) => Self::Rotated90R,
            (Self::Rotated90R, 90) => Self::Normal,
            (Self::Rotated90R, -90) => Self::Rotated180,
            (Self::Rotated90R, 180) => Self::Rotated90L,
            (Self::Rotated180, 90) => Self::Rotated90R,
            (Self::Rotated180, -90) => Self::Rotated90L,
            (Self::Rotated180, 180) => Self::Normal,
            (other, _) => other,
        }
    }
}
