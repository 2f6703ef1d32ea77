//! Motion Data (hierarchy model)
//!
//! [`MotionData`] is the boundary between capture-format parsers and the
//! conversion core: a validated [`Skeleton`] plus one local pose per joint per
//! frame, in the source's native axes and units.
//!
//! Local rotations are expected to be unit quaternions. They are stored as
//! given and never renormalized; non-unit input produces non-unit output
//! without an error.

use glam::{DQuat, DVec3};

use crate::errors::{MocapError, Result};
use crate::skeleton::{JointId, Skeleton};

/// Something that can produce a [`MotionData`], e.g. a capture file reader.
pub trait MotionSource {
    /// Short human-readable name of the source format.
    fn name(&self) -> &str;

    /// Reads and validates the motion.
    fn load(&self) -> Result<MotionData>;
}

/// Borrowed local pose of every joint for one frame.
#[derive(Debug, Clone, Copy)]
pub struct LocalFrame<'a> {
    pub positions: &'a [DVec3],
    pub rotations: &'a [DQuat],
}

impl LocalFrame<'_> {
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

/// Skeleton plus per-frame local transforms.
///
/// Pose arrays are stored frame-major: joint `j` of frame `f` lives at
/// `f * joint_count + j`.
#[derive(Debug, Clone)]
pub struct MotionData {
    skeleton: Skeleton,
    frame_count: usize,
    positions: Vec<DVec3>,
    rotations: Vec<DQuat>,
    frame_time: Option<f64>,
}

impl MotionData {
    /// Wraps already-flattened pose arrays.
    pub fn new(
        skeleton: Skeleton,
        frame_count: usize,
        positions: Vec<DVec3>,
        rotations: Vec<DQuat>,
    ) -> Result<Self> {
        let expected = frame_count.checked_mul(skeleton.len()).ok_or_else(|| {
            MocapError::MalformedTopology(format!(
                "{frame_count} frames x {} joints overflows the pose count",
                skeleton.len()
            ))
        })?;
        if positions.len() != expected || rotations.len() != expected {
            return Err(MocapError::MalformedTopology(format!(
                "expected {expected} local poses ({frame_count} frames x {} joints), \
                 got {} positions and {} rotations",
                skeleton.len(),
                positions.len(),
                rotations.len()
            )));
        }

        Ok(Self {
            skeleton,
            frame_count,
            positions,
            rotations,
            frame_time: None,
        })
    }

    /// Builds motion data from raw arrays as produced by an external parser.
    ///
    /// `positions` and `rotations_wxyz` are frame-major, joint-minor.
    /// Quaternions are scalar-first.
    pub fn from_raw(
        names: Vec<String>,
        parents: &[i32],
        frame_count: usize,
        positions: &[[f64; 3]],
        rotations_wxyz: &[[f64; 4]],
    ) -> Result<Self> {
        let skeleton = Skeleton::new(names, parents)?;
        let positions = positions.iter().map(|&p| DVec3::from_array(p)).collect();
        let rotations = rotations_wxyz
            .iter()
            .map(|&[w, x, y, z]| DQuat::from_xyzw(x, y, z, w))
            .collect();
        Self::new(skeleton, frame_count, positions, rotations)
    }

    /// Attaches the sampling interval in seconds.
    #[must_use]
    pub fn with_frame_time(mut self, frame_time: f64) -> Self {
        self.frame_time = Some(frame_time);
        self
    }

    #[inline]
    #[must_use]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    #[inline]
    #[must_use]
    pub fn frame_time(&self) -> Option<f64> {
        self.frame_time
    }

    /// Total number of local poses, `frame_count * joint count`.
    #[inline]
    #[must_use]
    pub fn pose_count(&self) -> usize {
        self.positions.len()
    }

    /// Local pose of frame `index`.
    #[must_use]
    pub fn frame(&self, index: usize) -> LocalFrame<'_> {
        let stride = self.skeleton.len();
        let range = index * stride..(index + 1) * stride;
        LocalFrame {
            positions: &self.positions[range.clone()],
            rotations: &self.rotations[range],
        }
    }

    /// Iterates frames in temporal order.
    pub fn frames(&self) -> impl ExactSizeIterator<Item = LocalFrame<'_>> + '_ {
        (0..self.frame_count).map(move |i| self.frame(i))
    }
}
