//! Auxiliary Joints
//!
//! Auxiliary joints are synthesized named joints that do not exist in the raw
//! capture. Each one takes its position from one resolved joint and its
//! orientation from another (or the same) joint.
//!
//! The foot-contact proxies `LeftFootMod` / `RightFootMod` are produced by a
//! [`FootProxyRule`]:
//!
//! | Rule              | position    | orientation |
//! |-------------------|-------------|-------------|
//! | `Copy` (default)  | `LeftFoot`  | `LeftFoot`  |
//! | `ToeOrientation`  | `LeftFoot`  | `LeftToe`   |
//!
//! (and the mirrored right-side joints). Source joints are resolved to
//! [`JointId`]s when the synthesizer is built, so a skeleton without the
//! required joints is rejected before any frame is processed.

use crate::clip::JointPose;
use crate::errors::{MocapError, Result};
use crate::skeleton::{JointId, Skeleton};

pub const LEFT_FOOT_MOD: &str = "LeftFootMod";
pub const RIGHT_FOOT_MOD: &str = "RightFootMod";

const REQUIRED_BY: &str = "auxiliary joint synthesis";

/// How the foot-contact proxies are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FootProxyRule {
    /// Foot position and foot orientation.
    #[default]
    Copy,
    /// Foot position and toe orientation.
    ToeOrientation,
}

impl FootProxyRule {
    /// `(auxiliary name, position source, orientation source)` triples.
    #[must_use]
    pub fn definitions(self) -> [(&'static str, &'static str, &'static str); 2] {
        match self {
            Self::Copy => [
                (LEFT_FOOT_MOD, "LeftFoot", "LeftFoot"),
                (RIGHT_FOOT_MOD, "RightFoot", "RightFoot"),
            ],
            Self::ToeOrientation => [
                (LEFT_FOOT_MOD, "LeftFoot", "LeftToe"),
                (RIGHT_FOOT_MOD, "RightFoot", "RightToe"),
            ],
        }
    }
}

/// One resolved auxiliary joint definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxiliaryJoint {
    pub name: String,
    pub position_from: JointId,
    pub orientation_from: JointId,
}

/// Derives auxiliary joint poses from a resolved frame.
#[derive(Debug, Clone)]
pub struct AuxiliaryJointSynthesizer {
    joints: Vec<AuxiliaryJoint>,
}

impl AuxiliaryJointSynthesizer {
    /// Resolves `rule` against `skeleton`.
    pub fn new(rule: FootProxyRule, skeleton: &Skeleton) -> Result<Self> {
        log::debug!("Foot proxy rule: {rule:?}");
        Self::from_definitions(&rule.definitions(), skeleton)
    }

    /// Resolves arbitrary `(name, position source, orientation source)` triples.
    ///
    /// Auxiliary names must not collide with skeleton joints or each other.
    pub fn from_definitions(
        definitions: &[(&str, &str, &str)],
        skeleton: &Skeleton,
    ) -> Result<Self> {
        let mut joints: Vec<AuxiliaryJoint> = Vec::with_capacity(definitions.len());

        for &(name, position_from, orientation_from) in definitions {
            if skeleton.find(name).is_some() || joints.iter().any(|j| j.name == name) {
                return Err(MocapError::MalformedTopology(format!(
                    "auxiliary joint `{name}` collides with an existing joint name"
                )));
            }

            joints.push(AuxiliaryJoint {
                name: name.to_string(),
                position_from: skeleton.require(position_from, REQUIRED_BY)?,
                orientation_from: skeleton.require(orientation_from, REQUIRED_BY)?,
            });
        }

        Ok(Self { joints })
    }

    #[inline]
    #[must_use]
    pub fn joints(&self) -> &[AuxiliaryJoint] {
        &self.joints
    }

    /// Appends one pose per auxiliary joint, in definition order.
    ///
    /// `resolved` holds the converted skeleton joints of a single frame,
    /// indexed by [`JointId`].
    pub fn synthesize(&self, resolved: &[JointPose], out: &mut Vec<JointPose>) {
        out.extend(self.joints.iter().map(|joint| JointPose {
            position: resolved[joint.position_from.index()].position,
            orientation: resolved[joint.orientation_from.index()].orientation,
        }));
    }
}

#[cfg(test)]
mod tests {
    use glam::{DQuat, DVec3};

    use super::*;

    fn feet_skeleton() -> Skeleton {
        let names = ["Hips", "LeftFoot", "LeftToe", "RightFoot", "RightToe"]
            .iter()
            .map(ToString::to_string)
            .collect();
        Skeleton::new(names, &[-1, 0, 1, 0, 3]).unwrap()
    }

    fn poses() -> Vec<JointPose> {
        (0..5_i32)
            .map(|i| JointPose {
                position: DVec3::splat(f64::from(i)),
                orientation: DQuat::from_rotation_z(0.1 * f64::from(i)),
            })
            .collect()
    }

    #[test]
    fn test_copy_rule() {
        let synthesizer =
            AuxiliaryJointSynthesizer::new(FootProxyRule::Copy, &feet_skeleton()).unwrap();
        let resolved = poses();
        let mut out = Vec::new();
        synthesizer.synthesize(&resolved, &mut out);

        assert_eq!(out, [resolved[1], resolved[3]]);
    }

    #[test]
    fn test_toe_orientation_rule() {
        let rule = FootProxyRule::ToeOrientation;
        let synthesizer = AuxiliaryJointSynthesizer::new(rule, &feet_skeleton()).unwrap();
        let resolved = poses();
        let mut out = Vec::new();
        synthesizer.synthesize(&resolved, &mut out);

        assert_eq!(out[0].position, resolved[1].position);
        assert_eq!(out[0].orientation, resolved[2].orientation);
        assert_eq!(out[1].position, resolved[3].position);
        assert_eq!(out[1].orientation, resolved[4].orientation);
    }

    #[test]
    fn test_missing_foot_is_fatal() {
        let skeleton = Skeleton::new(vec!["Hips".into(), "LeftFoot".into()], &[-1, 0]).unwrap();
        let err = AuxiliaryJointSynthesizer::new(FootProxyRule::Copy, &skeleton).unwrap_err();
        assert!(matches!(
            err,
            MocapError::MissingRequiredJoint { ref joint, .. } if joint == "RightFoot"
        ));
    }

    #[test]
    fn test_name_collision_rejected() {
        let skeleton = feet_skeleton();
        let definitions = [("LeftToe", "LeftFoot", "LeftFoot")];
        let err = AuxiliaryJointSynthesizer::from_definitions(&definitions, &skeleton).unwrap_err();
        assert!(matches!(err, MocapError::MalformedTopology(_)));
    }
}
