//! Search candidates.
//!
//! A candidate is a partial overlay on the section's baseline points: a
//! map of coordinate overrides, the issues detected under that overlay,
//! and the scores derived from them. Candidates never own baseline data,
//! so they stay cheap to clone as the queue grows.

use crate::issues::UnravelIssue;
use crate::point::SegmentPointId;
use crate::section::UnravelSection;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A coordinate override for one segment point. Unset fields fall through
/// to the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointModification {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<u8>,
}

/// Modification overlay keyed by segment point id. A `BTreeMap` keeps the
/// entries sorted, so hashing is canonical without an extra sort.
pub type PointModifications = BTreeMap<SegmentPointId, PointModification>;

/// One state of the unravel search.
#[derive(Debug, Clone)]
pub struct UnravelCandidate {
    pub point_modifications: PointModifications,
    /// Issues detected with the modifications applied.
    pub issues: Vec<UnravelIssue>,
    /// Cost of this state.
    pub g: f64,
    /// Heuristic estimate; zero in this design.
    pub h: f64,
    /// Total score `g + h` used for best-candidate comparison.
    pub f: f64,
    /// Number of operations applied since the original candidate.
    pub operations_performed: u64,
    /// Hash over the modification entries.
    pub candidate_hash: u64,
    /// Hash over the fully-resolved point state.
    pub candidate_full_hash: u64,
}

/// Hashes the modification overlay itself. Cheap; catches exact duplicate
/// search paths.
pub fn candidate_hash(modifications: &PointModifications) -> u64 {
    let mut hasher = DefaultHasher::new();
    for (id, modification) in modifications {
        id.hash(&mut hasher);
        modification.x.map(f64::to_bits).hash(&mut hasher);
        modification.y.map(f64::to_bits).hash(&mut hasher);
        modification.z.hash(&mut hasher);
    }
    hasher.finish()
}

/// Hashes the fully-resolved coordinates of every point in the section,
/// catching semantically equivalent states reached through different
/// operation histories.
pub fn candidate_full_hash(section: &UnravelSection, modifications: &PointModifications) -> u64 {
    let mut hasher = DefaultHasher::new();
    for id in &section.segment_point_ids {
        let resolved = section.resolved_point(id, modifications);
        resolved.x.to_bits().hash(&mut hasher);
        resolved.y.to_bits().hash(&mut hasher);
        resolved.z.hash(&mut hasher);
    }
    hasher.finish()
}
