//! Rectangles owned by tree nodes and the functions that derive them.

use serde::{Deserialize, Serialize};

use crate::layout_engine::graph::Orientation;
use crate::model::geometry::Rect;

/// Which half of its parent a container was cut from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKind {
    #[default]
    None,
    LeftVertical,
    RightVertical,
    UpperHorizontal,
    LowerHorizontal,
}

impl SplitKind {
    /// Numeric code used by persisted layouts.
    pub fn code(self) -> u8 {
        match self {
            SplitKind::None => 0,
            SplitKind::LeftVertical => 1,
            SplitKind::RightVertical => 2,
            SplitKind::UpperHorizontal => 3,
            SplitKind::LowerHorizontal => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<SplitKind> {
        Some(match code {
            0 => SplitKind::None,
            1 => SplitKind::LeftVertical,
            2 => SplitKind::RightVertical,
            3 => SplitKind::UpperHorizontal,
            4 => SplitKind::LowerHorizontal,
            _ => return None,
        })
    }

    /// The kinds given to the first and second child of a split.
    pub fn pair(orientation: Orientation) -> [SplitKind; 2] {
        match orientation {
            Orientation::Vertical => [SplitKind::LeftVertical, SplitKind::RightVertical],
            Orientation::Horizontal => [SplitKind::UpperHorizontal, SplitKind::LowerHorizontal],
        }
    }

    pub fn orientation(self) -> Option<Orientation> {
        match self {
            SplitKind::None => None,
            SplitKind::LeftVertical | SplitKind::RightVertical => Some(Orientation::Vertical),
            SplitKind::UpperHorizontal | SplitKind::LowerHorizontal => {
                Some(Orientation::Horizontal)
            }
        }
    }

    /// Derives this half's rectangle from the parent rectangle.
    pub fn apply(self, parent: Rect, ratio: f64, gap: f64) -> Rect {
        match self {
            SplitKind::None => parent,
            SplitKind::LeftVertical => left_vertical(parent, ratio, gap),
            SplitKind::RightVertical => right_vertical(parent, ratio, gap),
            SplitKind::UpperHorizontal => upper_horizontal(parent, ratio, gap),
            SplitKind::LowerHorizontal => lower_horizontal(parent, ratio, gap),
        }
    }
}

/// A node's rectangle together with the split that produced it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub rect: Rect,
    pub kind: SplitKind,
}

impl Container {
    pub fn root(rect: Rect) -> Container { Container { rect, kind: SplitKind::None } }

    pub fn child_of(parent: &Container, kind: SplitKind, ratio: f64, gap: f64) -> Container {
        Container {
            rect: kind.apply(parent.rect, ratio, gap),
            kind,
        }
    }

    /// Containers for both children of a split.
    pub fn split(&self, orientation: Orientation, ratio: f64, gap: f64) -> [Container; 2] {
        SplitKind::pair(orientation).map(|kind| Container::child_of(self, kind, ratio, gap))
    }
}

pub fn left_vertical(parent: Rect, ratio: f64, gap: f64) -> Rect {
    Rect::new(parent.x, parent.y, parent.width * ratio - gap / 2.0, parent.height)
}

pub fn right_vertical(parent: Rect, ratio: f64, gap: f64) -> Rect {
    Rect::new(
        parent.x + parent.width * ratio + gap / 2.0,
        parent.y,
        parent.width * (1.0 - ratio) - gap / 2.0,
        parent.height,
    )
}

pub fn upper_horizontal(parent: Rect, ratio: f64, gap: f64) -> Rect {
    Rect::new(parent.x, parent.y, parent.width, parent.height * ratio - gap / 2.0)
}

pub fn lower_horizontal(parent: Rect, ratio: f64, gap: f64) -> Rect {
    Rect::new(
        parent.x,
        parent.y + parent.height * ratio + gap / 2.0,
        parent.width,
        parent.height * (1.0 - ratio) - gap / 2.0,
    )
}

/// Wide regions split side by side, tall ones top to bottom.
pub fn optimal_orientation(rect: Rect, threshold: f64) -> Orientation {
    if rect.aspect_ratio() >= threshold {
        Orientation::Vertical
    } else {
        Orientation::Horizontal
    }
}
