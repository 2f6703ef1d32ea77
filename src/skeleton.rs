//! Skeleton Topology
//!
//! A [`Skeleton`] is the validated, clip-invariant joint hierarchy: joint
//! names, a parent for every non-root joint, and a precomputed evaluation
//! order in which every parent precedes its children.
//!
//! # Validation
//!
//! All structural checks happen once, in [`Skeleton::new`]:
//! - names and parent arrays have the same, non-zero length
//! - joint names are unique
//! - every parent index is in range and no joint is its own parent
//! - there is exactly one root (parent sentinel `-1`)
//! - every joint is reachable from the root, i.e. there are no cycles
//!
//! Parents are NOT required to have a smaller index than their children. The
//! evaluation order is derived from the tree, not from the array layout.
//!
//! # Level-order batches
//!
//! Joints are grouped by depth (BFS order):
//! 1. the root
//! 2. the root's direct children
//! 3. ...and so on
//!
//! Walking the batches in order guarantees that a parent's global transform is
//! available before any of its children is resolved.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::errors::{MocapError, Result};

/// Index of a joint in its [`Skeleton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointId(u32);

impl JointId {
    #[inline]
    pub(crate) const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the joint in the skeleton's name and parent arrays.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Joints grouped by depth from the root.
#[derive(Debug, Default, Clone)]
pub struct LevelOrderBatches {
    /// `batches[0]` holds the root, `batches[1]` its children, and so on.
    pub batches: Vec<Vec<JointId>>,
}

impl LevelOrderBatches {
    /// Total number of joints across all levels.
    #[must_use]
    pub fn total_joints(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }

    /// Number of levels (the root alone is depth 1).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.batches.len()
    }
}

/// Builds the BFS level batches starting from `root`.
fn build_level_order_batches(root: JointId, children: &[Vec<JointId>]) -> LevelOrderBatches {
    let mut output = LevelOrderBatches::default();
    let mut current_level = vec![root];

    while !current_level.is_empty() {
        let next_level: Vec<JointId> = current_level
            .iter()
            .flat_map(|joint| children[joint.index()].iter().copied())
            .collect();

        output.batches.push(current_level);
        current_level = next_level;
    }

    output
}

/// Validated joint hierarchy.
#[derive(Debug, Clone)]
pub struct Skeleton {
    names: Vec<String>,
    parents: Vec<Option<JointId>>,
    lookup: FxHashMap<String, JointId>,
    root: JointId,
    batches: LevelOrderBatches,
    order: Vec<JointId>,
}

impl Skeleton {
    /// Sentinel used in raw parent arrays for "no parent".
    pub const NO_PARENT: i32 = -1;

    /// Validates the topology and precomputes the evaluation order.
    ///
    /// `parents[i]` is the index of joint `i`'s parent, or [`Self::NO_PARENT`]
    /// for the root.
    pub fn new(names: Vec<String>, parents: &[i32]) -> Result<Self> {
        let count = names.len();
        if count == 0 {
            return Err(MocapError::MalformedTopology(
                "skeleton has no joints".to_string(),
            ));
        }
        if parents.len() != count {
            return Err(MocapError::MalformedTopology(format!(
                "{} joint names but {} parent indices",
                count,
                parents.len()
            )));
        }
        if u32::try_from(count).is_err() {
            return Err(MocapError::MalformedTopology(format!(
                "{count} joints exceed the supported joint count"
            )));
        }

        let mut lookup = FxHashMap::default();
        for (i, name) in names.iter().enumerate() {
            if lookup.insert(name.clone(), JointId::new(i)).is_some() {
                return Err(MocapError::MalformedTopology(format!(
                    "duplicate joint name `{name}`"
                )));
            }
        }

        let mut resolved = Vec::with_capacity(count);
        let mut root = None;
        for (i, &parent) in parents.iter().enumerate() {
            let parent = match parent {
                Self::NO_PARENT => {
                    if let Some(existing) = root {
                        return Err(MocapError::MalformedTopology(format!(
                            "multiple roots: `{}` and `{}`",
                            names[JointId::index(existing)],
                            names[i]
                        )));
                    }
                    root = Some(JointId::new(i));
                    None
                }
                p if p < 0 || p as usize >= count => {
                    return Err(MocapError::MalformedTopology(format!(
                        "joint `{}` has out-of-range parent index {p}",
                        names[i]
                    )));
                }
                p if p as usize == i => {
                    return Err(MocapError::MalformedTopology(format!(
                        "joint `{}` is its own parent",
                        names[i]
                    )));
                }
                p => Some(JointId::new(p as usize)),
            };
            resolved.push(parent);
        }

        let Some(root) = root else {
            return Err(MocapError::MalformedTopology(
                "no root joint (every joint has a parent)".to_string(),
            ));
        };

        let mut children = vec![Vec::new(); count];
        for (i, parent) in resolved.iter().enumerate() {
            if let Some(parent) = parent {
                children[parent.index()].push(JointId::new(i));
            }
        }

        // Every non-root joint has an in-range parent, so a joint the BFS
        // cannot reach sits on a cycle.
        let batches = build_level_order_batches(root, &children);
        let order: Vec<JointId> = batches.batches.iter().flatten().copied().collect();
        if order.len() != count {
            let mut reached = vec![false; count];
            for joint in &order {
                reached[joint.index()] = true;
            }
            let orphan = reached.iter().position(|r| !r).unwrap_or_default();
            return Err(MocapError::MalformedTopology(format!(
                "joint `{}` is part of a parent cycle",
                names[orphan]
            )));
        }

        log::debug!(
            "Skeleton validated: {} joints, root `{}`, depth {}",
            count,
            names[root.index()],
            batches.depth()
        );

        Ok(Self {
            names,
            parents: resolved,
            lookup,
            root,
            batches,
            order,
        })
    }

    /// Number of joints.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always `false` for a validated skeleton.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> JointId {
        self.root
    }

    #[inline]
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[inline]
    #[must_use]
    pub fn name(&self, joint: JointId) -> &str {
        &self.names[joint.index()]
    }

    #[inline]
    #[must_use]
    pub fn parent(&self, joint: JointId) -> Option<JointId> {
        self.parents[joint.index()]
    }

    /// Looks up a joint by name.
    #[inline]
    #[must_use]
    pub fn find(&self, name: &str) -> Option<JointId> {
        self.lookup.get(name).copied()
    }

    /// Looks up a joint that `required_by` cannot work without.
    pub fn require(&self, name: &str, required_by: &'static str) -> Result<JointId> {
        self.find(name).ok_or_else(|| MocapError::MissingRequiredJoint {
            joint: name.to_string(),
            required_by,
        })
    }

    /// Joints in an order where every parent precedes its children.
    #[inline]
    #[must_use]
    pub fn evaluation_order(&self) -> &[JointId] {
        &self.order
    }

    #[inline]
    #[must_use]
    pub fn batches(&self) -> &LevelOrderBatches {
        &self.batches
    }

    /// Raw parent array with the `-1` sentinel, as accepted by [`Skeleton::new`].
    #[must_use]
    pub fn parent_indices(&self) -> Vec<i32> {
        self.parents
            .iter()
            .map(|p| p.map_or(Self::NO_PARENT, |p| p.index() as i32))
            .collect()
    }
}
