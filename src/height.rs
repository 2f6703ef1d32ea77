//! Body Height Estimation
//!
//! Every clip carries a single body-height scalar used downstream for
//! normalization. The default strategy returns the constant
//! [`DEFAULT_BODY_HEIGHT`] and ignores the pose entirely.
//!
//! [`HeightStrategy::HeadToFeet`] is the opt-in alternative: the vertical
//! distance from `Head` to the lower of the two foot proxies on the first
//! frame, measured in the target convention (Z up, meters).

use crate::auxiliary::{LEFT_FOOT_MOD, RIGHT_FOOT_MOD};
use crate::clip::{FrameView, JointTable};
use crate::errors::{MocapError, Result};
use crate::skeleton::JointId;

/// Height reported by [`HeightStrategy::Fixed`] by default, in meters.
pub const DEFAULT_BODY_HEIGHT: f64 = 1.75;

const REQUIRED_BY: &str = "height estimation";

/// How the clip's body height is obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeightStrategy {
    /// Always report the given value, which must be finite and positive.
    Fixed(f64),
    /// `Head.z - min(LeftFootMod.z, RightFootMod.z)` on the first frame.
    HeadToFeet,
}

impl Default for HeightStrategy {
    fn default() -> Self {
        Self::Fixed(DEFAULT_BODY_HEIGHT)
    }
}

#[derive(Debug, Clone, Copy)]
enum Resolved {
    Fixed(f64),
    HeadToFeet {
        head: JointId,
        left: JointId,
        right: JointId,
    },
}

/// A [`HeightStrategy`] bound to a joint table.
#[derive(Debug, Clone, Copy)]
pub struct HeightEstimator {
    resolved: Resolved,
}

impl HeightEstimator {
    /// Resolves the joints `strategy` needs and checks fixed heights.
    pub fn new(strategy: HeightStrategy, table: &JointTable) -> Result<Self> {
        let resolved = match strategy {
            HeightStrategy::Fixed(height) if height.is_finite() && height > 0.0 => {
                Resolved::Fixed(height)
            }
            HeightStrategy::Fixed(height) => return Err(MocapError::InvalidHeight(height)),
            HeightStrategy::HeadToFeet => Resolved::HeadToFeet {
                head: table.require("Head", REQUIRED_BY)?,
                left: table.require(LEFT_FOOT_MOD, REQUIRED_BY)?,
                right: table.require(RIGHT_FOOT_MOD, REQUIRED_BY)?,
            },
        };
        log::debug!("Height strategy: {strategy:?}");
        Ok(Self { resolved })
    }

    /// Whether [`Self::estimate`] needs a frame at all.
    #[must_use]
    pub fn needs_frame(&self) -> bool {
        matches!(self.resolved, Resolved::HeadToFeet { .. })
    }

    /// Estimates the body height from the clip's first frame.
    ///
    /// `first` is `None` for an empty clip, which is only an error for
    /// strategies that measure the pose.
    pub fn estimate(&self, first: Option<FrameView<'_>>) -> Result<f64> {
        match self.resolved {
            Resolved::Fixed(height) => Ok(height),
            Resolved::HeadToFeet { head, left, right } => {
                let frame = first.ok_or(MocapError::EmptyClip)?;
                let head_z = frame.pose(head).position.z;
                let feet_z = frame
                    .pose(left)
                    .position
                    .z
                    .min(frame.pose(right).position.z);
                Ok(head_z - feet_z)
            }
        }
    }
}
