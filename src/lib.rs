//! # mocap_fk
//!
//! Converts skeletal motion-capture clips into per-frame tables of named
//! world-space joint poses, ready for a motion-retargeting pipeline.
//!
//! ```text
//! MotionSource ─▶ MotionData ─▶ ForwardKinematics ─▶ CoordinateConvention
//!                                                          │
//!                 Clip ◀─ HeightEstimator ◀─ AuxiliaryJointSynthesizer
//! ```
//!
//! - [`skeleton`]: validated joint topology and evaluation order
//! - [`motion`]: per-frame local poses, the [`MotionSource`] trait
//! - [`kinematics`]: forward kinematics
//! - [`convention`]: change of basis and unit scale
//! - [`auxiliary`]: synthesized foot-contact joints
//! - [`height`]: clip body height
//! - [`clip`]: the assembler and the output clip
//! - [`sources`]: BVH readers for the supported capture formats
//!
//! ```rust,ignore
//! use mocap_fk::{AssemblerSettings, ClipAssembler};
//! use mocap_fk::sources::NoitomSource;
//!
//! let clip = ClipAssembler::new(AssemblerSettings::default())
//!     .load(&NoitomSource::from_path("take011_chr01.bvh"))?;
//! for frame in clip.frames() {
//!     let foot = frame.get("LeftFootMod").unwrap();
//! }
//! ```

pub mod auxiliary;
pub mod clip;
pub mod convention;
pub mod errors;
pub mod height;
pub mod kinematics;
pub mod motion;
pub mod skeleton;
pub mod sources;

pub use auxiliary::{AuxiliaryJointSynthesizer, FootProxyRule, LEFT_FOOT_MOD, RIGHT_FOOT_MOD};
pub use clip::{AssemblerSettings, Clip, ClipAssembler, FrameView, JointPose, JointTable};
pub use convention::CoordinateConvention;
pub use errors::{MocapError, Result};
pub use height::{DEFAULT_BODY_HEIGHT, HeightEstimator, HeightStrategy};
pub use kinematics::{ForwardKinematics, GlobalPoses};
pub use motion::{LocalFrame, MotionData, MotionSource};
pub use skeleton::{JointId, Skeleton};
