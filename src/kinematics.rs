//! Forward Kinematics
//!
//! Resolves per-frame local joint transforms into global (world) poses by
//! walking the skeleton in parent-before-child order.
//!
//! For joint `j` with parent `p`:
//!
//! ```text
//! global_rotation[j] = global_rotation[p] * local_rotation[j]
//! global_position[j] = global_position[p] + global_rotation[p] * local_position[j]
//! ```
//!
//! The root takes its local transform unchanged. The composition order is
//! fixed: the local rotation is expressed in the parent's frame, so the parent
//! orientation is applied first.
//!
//! Frames are independent. With the `parallel` feature enabled they can be
//! resolved on the rayon thread pool; the skeleton is shared read-only.

use glam::{DQuat, DVec3};

use crate::motion::{LocalFrame, MotionData};
use crate::skeleton::{JointId, Skeleton};

/// Global poses for every joint of every frame, frame-major.
#[derive(Debug, Clone, Default)]
pub struct GlobalPoses {
    joint_count: usize,
    pub(crate) positions: Vec<DVec3>,
    pub(crate) rotations: Vec<DQuat>,
}

/// Borrowed global pose of every joint for one frame.
#[derive(Debug, Clone, Copy)]
pub struct GlobalFrame<'a> {
    pub positions: &'a [DVec3],
    pub rotations: &'a [DQuat],
}

impl GlobalFrame<'_> {
    #[inline]
    #[must_use]
    pub fn position(&self, joint: JointId) -> DVec3 {
        self.positions[joint.index()]
    }

    #[inline]
    #[must_use]
    pub fn rotation(&self, joint: JointId) -> DQuat {
        self.rotations[joint.index()]
    }
}

impl GlobalPoses {
    #[inline]
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joint_count
    }

    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> usize {
        if self.joint_count == 0 {
            0
        } else {
            self.positions.len() / self.joint_count
        }
    }

    #[must_use]
    pub fn frame(&self, index: usize) -> GlobalFrame<'_> {
        let range = index * self.joint_count..(index + 1) * self.joint_count;
        GlobalFrame {
            positions: &self.positions[range.clone()],
            rotations: &self.rotations[range],
        }
    }

    /// All global rotations, frame-major.
    #[inline]
    #[must_use]
    pub fn rotations(&self) -> &[DQuat] {
        &self.rotations
    }

    /// All global positions, frame-major.
    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[DVec3] {
        &self.positions
    }
}

/// Forward-kinematics solver.
pub struct ForwardKinematics;

impl ForwardKinematics {
    /// Resolves every frame of `motion`.
    ///
    /// `parallel` only has an effect when the `parallel` feature is enabled.
    #[must_use]
    pub fn resolve(motion: &MotionData, parallel: bool) -> GlobalPoses {
        let skeleton = motion.skeleton();
        let joint_count = skeleton.len();
        let total = motion.pose_count();

        let mut poses = GlobalPoses {
            joint_count,
            positions: vec![DVec3::ZERO; total],
            rotations: vec![DQuat::IDENTITY; total],
        };

        if parallel {
            Self::resolve_parallel(motion, &mut poses);
        } else {
            Self::resolve_serial(motion, &mut poses);
        }

        poses
    }

    fn resolve_serial(motion: &MotionData, poses: &mut GlobalPoses) {
        let skeleton = motion.skeleton();
        let joint_count = skeleton.len();

        for (frame, (positions, rotations)) in poses
            .positions
            .chunks_mut(joint_count)
            .zip(poses.rotations.chunks_mut(joint_count))
            .enumerate()
        {
            Self::resolve_frame(skeleton, motion.frame(frame), positions, rotations);
        }
    }

    #[cfg(feature = "parallel")]
    fn resolve_parallel(motion: &MotionData, poses: &mut GlobalPoses) {
        use rayon::prelude::*;

        let skeleton = motion.skeleton();
        let joint_count = skeleton.len();

        poses
            .positions
            .par_chunks_mut(joint_count)
            .zip(poses.rotations.par_chunks_mut(joint_count))
            .enumerate()
            .for_each(|(frame, (positions, rotations))| {
                Self::resolve_frame(skeleton, motion.frame(frame), positions, rotations);
            });
    }

    #[cfg(not(feature = "parallel"))]
    fn resolve_parallel(motion: &MotionData, poses: &mut GlobalPoses) {
        Self::resolve_serial(motion, poses);
    }

    /// Resolves a single frame into the provided output slices.
    ///
    /// Both output slices must hold exactly `skeleton.len()` elements.
    pub fn resolve_frame(
        skeleton: &Skeleton,
        local: LocalFrame<'_>,
        positions: &mut [DVec3],
        rotations: &mut [DQuat],
    ) {
        debug_assert_eq!(positions.len(), skeleton.len());
        debug_assert_eq!(rotations.len(), skeleton.len());

        for &joint in skeleton.evaluation_order() {
            let i = joint.index();
            match skeleton.parent(joint) {
                None => {
                    rotations[i] = local.rotations[i];
                    positions[i] = local.positions[i];
                }
                Some(parent) => {
                    let parent_rotation = rotations[parent.index()];
                    let parent_position = positions[parent.index()];

                    rotations[i] = parent_rotation * local.rotations[i];
                    positions[i] = parent_position + parent_rotation * local.positions[i];
                }
            }
        }
    }
}
