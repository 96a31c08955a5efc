//! Conductor layer bookkeeping.
//!
//! Layer names map bijectively onto small integer z indices: 0 is the top
//! conductor, 1 the bottom. The mapping is total over the board's declared
//! layers and rejects anything else.

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// z index of the top conductor layer.
pub const TOP_Z: u8 = 0;

/// z index of the bottom conductor layer.
pub const BOTTOM_Z: u8 = 1;

/// Number of conductor layers this core routes.
pub const LAYER_COUNT: usize = 2;

/// Bijective mapping between declared layer names and z indices.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LayerAssignment {
    names: Vec<String>,
}

impl LayerAssignment {
    /// The conventional two-layer stackup: `"top"` at z 0, `"bottom"` at z 1.
    pub fn two_layer() -> Self {
        Self {
            names: vec!["top".to_string(), "bottom".to_string()],
        }
    }

    /// Builds an assignment from an ordered list of distinct layer names.
    pub fn from_names(names: Vec<String>) -> Result<Self> {
        if names.len() != LAYER_COUNT {
            return Err(Error::UnsupportedLayerCount(names.len()));
        }
        if names[0] == names[1] {
            return Err(Error::InvalidBoard(format!(
                "duplicate layer name '{}'",
                names[0]
            )));
        }
        Ok(Self { names })
    }

    /// Maps a layer name to its z index.
    pub fn z_of(&self, name: &str) -> Result<u8> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| i as u8)
            .ok_or_else(|| Error::UnknownLayer(name.to_string()))
    }

    /// Maps a z index back to its layer name.
    pub fn name_of(&self, z: u8) -> Result<&str> {
        self.names
            .get(z as usize)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownLayer(format!("z{}", z)))
    }

    /// All z indices, in order.
    pub fn all_z(&self) -> Vec<u8> {
        (0..self.names.len() as u8).collect()
    }
}

/// Flips a z index to the other conductor layer.
pub fn opposite_z(z: u8) -> u8 {
    if z == TOP_Z {
        BOTTOM_Z
    } else {
        TOP_Z
    }
}
