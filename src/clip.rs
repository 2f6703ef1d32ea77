//! Clip Assembly
//!
//! The [`ClipAssembler`] drives a whole conversion run:
//!
//! 1. resolve auxiliary-joint and height-strategy joints against the skeleton
//! 2. forward kinematics for every frame
//! 3. coordinate conversion into the target convention
//! 4. auxiliary joint synthesis per frame
//! 5. body height estimation
//!
//! Only step 1 can fail on a valid motion, plus height estimation on an
//! empty clip. No partial clip is ever returned.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use mocap_fk::{AssemblerSettings, ClipAssembler, HeightStrategy};
//! use mocap_fk::sources::Lafan1Source;
//!
//! let clip = ClipAssembler::new(AssemblerSettings::default())
//!     .load(&Lafan1Source::from_path("dance1_subject2.bvh"))?;
//!
//! let head = clip.frame(0).get("Head").unwrap();
//! println!("head at {:?}, height {}", head.position, clip.height());
//! ```

use glam::{DQuat, DVec3};
use rustc_hash::FxHashMap;

use crate::auxiliary::{AuxiliaryJoint, AuxiliaryJointSynthesizer, FootProxyRule};
use crate::convention::CoordinateConvention;
use crate::errors::{MocapError, Result};
use crate::height::{HeightEstimator, HeightStrategy};
use crate::kinematics::ForwardKinematics;
use crate::motion::{MotionData, MotionSource};
use crate::skeleton::{JointId, Skeleton};

// ---------------------------------------------------------------------------
// JointPose
// ---------------------------------------------------------------------------

/// World-space position and orientation of one joint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointPose {
    pub position: DVec3,
    pub orientation: DQuat,
}

impl Default for JointPose {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
        }
    }
}

// ---------------------------------------------------------------------------
// JointTable
// ---------------------------------------------------------------------------

/// Output joint names: the skeleton's joints followed by the auxiliary joints.
#[derive(Debug, Clone)]
pub struct JointTable {
    names: Vec<String>,
    lookup: FxHashMap<String, JointId>,
    skeleton_joints: usize,
}

impl JointTable {
    #[must_use]
    pub fn new(skeleton: &Skeleton, auxiliary: &[AuxiliaryJoint]) -> Self {
        let names: Vec<String> = skeleton
            .names()
            .iter()
            .cloned()
            .chain(auxiliary.iter().map(|joint| joint.name.clone()))
            .collect();
        let lookup = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), JointId::new(i)))
            .collect();

        Self {
            names,
            lookup,
            skeleton_joints: skeleton.len(),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of leading entries that come straight from the skeleton.
    #[inline]
    #[must_use]
    pub fn skeleton_joints(&self) -> usize {
        self.skeleton_joints
    }

    #[inline]
    #[must_use]
    pub fn find(&self, name: &str) -> Option<JointId> {
        self.lookup.get(name).copied()
    }

    pub fn require(&self, name: &str, required_by: &'static str) -> Result<JointId> {
        self.find(name).ok_or_else(|| MocapError::MissingRequiredJoint {
            joint: name.to_string(),
            required_by,
        })
    }
}

// ---------------------------------------------------------------------------
// Clip & FrameView
// ---------------------------------------------------------------------------

/// One frame of a [`Clip`]: named joint poses.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    table: &'a JointTable,
    poses: &'a [JointPose],
}

impl<'a> FrameView<'a> {
    /// Pose of the joint called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'a JointPose> {
        self.table.find(name).map(|id| &self.poses[id.index()])
    }

    #[inline]
    #[must_use]
    pub fn pose(&self, joint: JointId) -> JointPose {
        self.poses[joint.index()]
    }

    #[inline]
    #[must_use]
    pub fn poses(&self) -> &'a [JointPose] {
        self.poses
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// `(name, pose)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a JointPose)> + 'a {
        self.table
            .names
            .iter()
            .map(String::as_str)
            .zip(self.poses.iter())
    }
}

/// A converted animation: per-frame named joint poses plus one body height.
#[derive(Debug, Clone)]
pub struct Clip {
    table: JointTable,
    poses: Vec<JointPose>,
    frame_count: usize,
    height: f64,
    frame_time: Option<f64>,
}

impl Clip {
    /// Number of frames.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.frame_count
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }

    /// Body height in meters.
    #[inline]
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Seconds per frame, when the source provided it.
    #[inline]
    #[must_use]
    pub fn frame_time(&self) -> Option<f64> {
        self.frame_time
    }

    #[inline]
    #[must_use]
    pub fn joints(&self) -> &JointTable {
        &self.table
    }

    #[inline]
    #[must_use]
    pub fn joint_names(&self) -> &[String] {
        self.table.names()
    }

    /// Frame `index`; panics when out of range.
    #[must_use]
    pub fn frame(&self, index: usize) -> FrameView<'_> {
        let stride = self.table.len();
        FrameView {
            table: &self.table,
            poses: &self.poses[index * stride..(index + 1) * stride],
        }
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<FrameView<'_>> {
        (index < self.frame_count).then(|| self.frame(index))
    }

    /// Frames in temporal order.
    pub fn frames(&self) -> impl ExactSizeIterator<Item = FrameView<'_>> + '_ {
        (0..self.frame_count).map(move |i| self.frame(i))
    }
}

#[cfg(feature = "serde")]
mod serialize {
    use serde::ser::{Serialize, SerializeMap, SerializeSeq, SerializeStruct, Serializer};

    use super::{Clip, FrameView};

    impl Serialize for FrameView<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (name, pose) in self.iter() {
                map.serialize_entry(name, pose)?;
            }
            map.end()
        }
    }

    struct Frames<'a>(&'a Clip);

    impl Serialize for Frames<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
            for frame in self.0.frames() {
                seq.serialize_element(&frame)?;
            }
            seq.end()
        }
    }

    impl Serialize for Clip {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut state = serializer.serialize_struct("Clip", 3)?;
            state.serialize_field("height", &self.height)?;
            state.serialize_field("frame_time", &self.frame_time)?;
            state.serialize_field("frames", &Frames(self))?;
            state.end()
        }
    }
}

// ---------------------------------------------------------------------------
// AssemblerSettings
// ---------------------------------------------------------------------------

/// Configuration of a conversion run.
///
/// ```rust,ignore
/// let settings = AssemblerSettings::default()
///     .with_foot_rule(FootProxyRule::ToeOrientation)
///     .with_height(HeightStrategy::HeadToFeet);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblerSettings {
    /// Target axes and unit scale.
    pub convention: CoordinateConvention,
    /// How `LeftFootMod` / `RightFootMod` are derived.
    pub foot_rule: FootProxyRule,
    /// How the clip's body height is obtained.
    pub height: HeightStrategy,
    /// Resolve frames on the rayon pool (needs the `parallel` feature).
    pub parallel: bool,
}

impl Default for AssemblerSettings {
    fn default() -> Self {
        Self {
            convention: CoordinateConvention::default(),
            foot_rule: FootProxyRule::default(),
            height: HeightStrategy::default(),
            parallel: true,
        }
    }
}

impl AssemblerSettings {
    #[must_use]
    pub fn with_convention(mut self, convention: CoordinateConvention) -> Self {
        self.convention = convention;
        self
    }

    #[must_use]
    pub fn with_foot_rule(mut self, foot_rule: FootProxyRule) -> Self {
        self.foot_rule = foot_rule;
        self
    }

    #[must_use]
    pub fn with_height(mut self, height: HeightStrategy) -> Self {
        self.height = height;
        self
    }

    /// Disable for single-threaded contexts.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

// ---------------------------------------------------------------------------
// ClipAssembler
// ---------------------------------------------------------------------------

/// Runs the full motion-to-clip conversion.
#[derive(Debug, Clone, Default)]
pub struct ClipAssembler {
    settings: AssemblerSettings,
}

impl ClipAssembler {
    #[must_use]
    pub fn new(settings: AssemblerSettings) -> Self {
        Self { settings }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &AssemblerSettings {
        &self.settings
    }

    /// Loads `source` and converts it.
    pub fn load(&self, source: &impl MotionSource) -> Result<Clip> {
        let motion = source.load()?;
        log::debug!("Converting motion from {} source", source.name());
        self.assemble(&motion)
    }

    /// Converts already-loaded motion data.
    pub fn assemble(&self, motion: &MotionData) -> Result<Clip> {
        let skeleton = motion.skeleton();

        let synthesizer = AuxiliaryJointSynthesizer::new(self.settings.foot_rule, skeleton)?;
        let table = JointTable::new(skeleton, synthesizer.joints());
        let height_estimator = HeightEstimator::new(self.settings.height, &table)?;

        let mut globals = ForwardKinematics::resolve(motion, self.settings.parallel);
        self.settings.convention.convert(&mut globals);

        let frame_count = motion.frame_count();
        let capacity = frame_count.checked_mul(table.len()).ok_or_else(|| {
            MocapError::MalformedTopology(format!(
                "{frame_count} frames x {} output joints overflows the pose count",
                table.len()
            ))
        })?;
        let mut poses = Vec::with_capacity(capacity);
        let mut extra = Vec::with_capacity(synthesizer.joints().len());
        for frame in 0..frame_count {
            let resolved = globals.frame(frame);
            let start = poses.len();
            poses.extend(
                resolved
                    .positions
                    .iter()
                    .zip(resolved.rotations)
                    .map(|(&position, &orientation)| JointPose {
                        position,
                        orientation,
                    }),
            );

            extra.clear();
            synthesizer.synthesize(&poses[start..], &mut extra);
            poses.extend_from_slice(&extra);
        }

        if frame_count == 0 {
            log::warn!("Assembled an empty clip (0 frames)");
        }

        let mut clip = Clip {
            table,
            poses,
            frame_count,
            height: 0.0,
            frame_time: motion.frame_time(),
        };
        clip.height = height_estimator.estimate(clip.get(0))?;

        log::info!(
            "Clip assembled: {} frames, {} joints ({} auxiliary), height {:.3} m",
            clip.len(),
            clip.table.len(),
            clip.table.len() - clip.table.skeleton_joints(),
            clip.height
        );

        Ok(clip)
    }
}
