use std::path::PathBuf;

use super::{BvhInput, motion_from_document};
use crate::errors::{MocapError, Result};
use crate::motion::{MotionData, MotionSource};

/// Mocap-suite BVH export (Noitom Axis style).
///
/// Every joint's own channel list is honored: any joint may carry position
/// channels (displacement exports), and rotation orders may differ between
/// joints. A joint without rotation channels keeps the identity rotation.
#[derive(Debug, Clone)]
pub struct NoitomSource {
    input: BvhInput,
}

impl NoitomSource {
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

impl MotionSource for NoitomSource {
    fn name(&self) -> &str {
        "noitom"
    }

    fn load(&self) -> Result<MotionData> {
        let document = self.input.parse()?;

        if let Some(joint) = document
            .joints()
            .iter()
            .find(|joint| joint.rotation_channels().count() > 3)
        {
            return Err(MocapError::UnsupportedChannels(format!(
                "joint `{}` repeats rotation channels: {:?}",
                joint.name, joint.channels
            )));
        }

        let root = &document.joints()[0];
        log::info!(
            "Root: {}, Frame count: {}, Frame time: {}",
            root.name,
            document.frame_count(),
            document.frame_time()
        );
        let displaced = document
            .joints()
            .iter()
            .filter(|joint| joint.parent.is_some() && joint.has_position_channels())
            .count();
        log::debug!("{displaced} non-root joints carry position channels");

        motion_from_document(&document)
    }
}
