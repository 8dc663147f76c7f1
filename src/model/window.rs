use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque handle of an on-screen window.
///
/// The layout core never interprets the value; it only compares handles for
/// equality. An empty slot is expressed as `Option<WindowId>::None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u32);

impl WindowId {
    pub const fn new(raw: u32) -> Self { WindowId(raw) }

    pub const fn raw(self) -> u32 { self.0 }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl FromStr for WindowId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { s.trim().parse().map(WindowId) }
}

impl From<u32> for WindowId {
    fn from(raw: u32) -> Self { WindowId(raw) }
}
