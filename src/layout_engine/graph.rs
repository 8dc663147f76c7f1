use serde::{Deserialize, Serialize};

use crate::layout_engine::error::LayoutError;

/// Direction of the line that divides a split node.
///
/// `Vertical` places the children side by side, `Horizontal` stacks them top
/// to bottom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn flipped(self) -> Orientation {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

/// Configured orientation for new splits.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::VariantNames
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SplitMode {
    /// Decided per node from its aspect ratio.
    #[default]
    Optimal,
    Vertical,
    Horizontal,
}

impl SplitMode {
    pub fn fixed(self) -> Option<Orientation> {
        match self {
            SplitMode::Optimal => None,
            SplitMode::Vertical => Some(Orientation::Vertical),
            SplitMode::Horizontal => Some(Orientation::Horizontal),
        }
    }
}

impl From<Orientation> for SplitMode {
    fn from(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Vertical => SplitMode::Vertical,
            Orientation::Horizontal => SplitMode::Horizontal,
        }
    }
}

/// How a screen arranges its windows.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::VariantNames
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LayoutMode {
    /// Recursive binary splitting.
    #[default]
    Bsp,
    /// One chain of windows sharing the whole screen.
    Monocle,
    /// No tiling; the layout core stays inert.
    Float,
}

/// Quarter turns accepted by [`crate::layout_engine::LayoutTree::rotate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Rotation {
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    pub fn inverse(self) -> Rotation {
        match self {
            Rotation::Deg90 => Rotation::Deg270,
            Rotation::Deg180 => Rotation::Deg180,
            Rotation::Deg270 => Rotation::Deg90,
        }
    }

    /// Whether a split of `orientation` has its children exchanged.
    pub fn swaps(self, orientation: Orientation) -> bool {
        match self {
            Rotation::Deg90 => orientation == Orientation::Vertical,
            Rotation::Deg180 => true,
            Rotation::Deg270 => orientation == Orientation::Horizontal,
        }
    }

    pub fn flips_orientation(self) -> bool { self != Rotation::Deg180 }
}

impl TryFrom<u32> for Rotation {
    type Error = LayoutError;

    fn try_from(degrees: u32) -> Result<Self, Self::Error> {
        match degrees {
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(LayoutError::UnsupportedRotation(other)),
        }
    }
}

impl From<Rotation> for u32 {
    fn from(rotation: Rotation) -> u32 { rotation.degrees() }
}
