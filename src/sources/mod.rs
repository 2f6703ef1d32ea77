//! Motion Sources
//!
//! Readers for the two supported capture formats. Both are BVH files with
//! different channel conventions, and both produce the same [`MotionData`]
//! shape, so everything past [`MotionSource::load`] is source-agnostic.
//!
//! - [`Lafan1Source`]: research animation dataset; strict, uniform layout
//! - [`NoitomSource`]: commercial mocap-suite export; per-joint layouts

pub mod bvh;
mod lafan;
mod noitom;

use std::path::PathBuf;

use glam::{DQuat, DVec3};

use crate::errors::Result;
use crate::motion::MotionData;
use crate::skeleton::Skeleton;

pub use bvh::{BvhDocument, BvhJoint, Channel};
pub use lafan::Lafan1Source;
pub use noitom::NoitomSource;

/// Where a source reads its BVH text from.
#[derive(Debug, Clone)]
pub enum BvhInput {
    Path(PathBuf),
    Text(String),
}

impl BvhInput {
    fn parse(&self) -> Result<BvhDocument> {
        match self {
            Self::Path(path) => {
                let text = std::fs::read_to_string(path)?;
                BvhDocument::parse(&text)
            }
            Self::Text(text) => BvhDocument::parse(text),
        }
    }
}

/// Flattens a parsed document into motion data.
fn motion_from_document(document: &BvhDocument) -> Result<MotionData> {
    let joints = document.joints();
    let names = joints.iter().map(|joint| joint.name.clone()).collect();
    let parents: Vec<i32> = joints
        .iter()
        .map(|joint| joint.parent.map_or(Skeleton::NO_PARENT, |p| p as i32))
        .collect();
    let skeleton = Skeleton::new(names, &parents)?;

    let total = document.frame_count() * joints.len();
    let mut positions: Vec<DVec3> = Vec::with_capacity(total);
    let mut rotations: Vec<DQuat> = Vec::with_capacity(total);
    for frame in 0..document.frame_count() {
        for joint in 0..joints.len() {
            let (position, rotation) = document.local_pose(frame, joint);
            positions.push(position);
            rotations.push(rotation);
        }
    }

    Ok(MotionData::new(skeleton, document.frame_count(), positions, rotations)?
        .with_frame_time(document.frame_time()))
}
