use std::path::PathBuf;

use smallvec::SmallVec;

use super::{BvhDocument, BvhInput, Channel, motion_from_document};
use crate::errors::{MocapError, Result};
use crate::motion::{MotionData, MotionSource};

/// Research-dataset BVH (LAFAN1 style).
///
/// Accepts only the dataset's uniform layout: the root carries three position
/// and three rotation channels, every other joint exactly three rotation
/// channels, and every joint uses the root's rotation order. Non-root joints
/// are placed at their offsets.
#[derive(Debug, Clone)]
pub struct Lafan1Source {
    input: BvhInput,
}

impl Lafan1Source {
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            input: BvhInput::Path(path.into()),
        }
    }

    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            input: BvhInput::Text(text.into()),
        }
    }
}

fn has_all_axes(channels: &[Channel]) -> bool {
    let mut seen = [false; 3];
    for channel in channels {
        let axis = match channel {
            Channel::Xposition | Channel::Xrotation => 0,
            Channel::Yposition | Channel::Yrotation => 1,
            Channel::Zposition | Channel::Zrotation => 2,
        };
        seen[axis] = true;
    }
    seen.iter().all(|&s| s)
}

fn check_layout(document: &BvhDocument) -> Result<()> {
    let joints = document.joints();
    let root = &joints[0];

    let positions: SmallVec<[Channel; 3]> =
        root.channels.iter().copied().filter(|c| c.is_position()).collect();
    let order: SmallVec<[Channel; 3]> = root.rotation_channels().collect();
    if root.channels.len() != 6 || !has_all_axes(&positions) || !has_all_axes(&order) {
        return Err(MocapError::UnsupportedChannels(format!(
            "root `{}` must carry 3 position and 3 rotation channels, found {:?}",
            root.name, root.channels
        )));
    }

    for joint in &joints[1..] {
        if joint.channels.as_slice() != order.as_slice() {
            return Err(MocapError::UnsupportedChannels(format!(
                "joint `{}` has channels {:?}, expected {:?}",
                joint.name, joint.channels, order
            )));
        }
    }

    Ok(())
}

impl MotionSource for Lafan1Source {
    fn name(&self) -> &str {
        "lafan1"
    }

    fn load(&self) -> Result<MotionData> {
        let document = self.input.parse()?;
        check_layout(&document)?;

        log::info!(
            "Loaded LAFAN1 motion: {} joints, {} frames",
            document.joints().len(),
            document.frame_count()
        );
        motion_from_document(&document)
    }
}
