//! BVH Reader
//!
//! Minimal reader for Biovision Hierarchy (`.bvh`) text files, the container
//! format used by both capture sources.
//!
//! # Format
//!
//! ```text
//! HIERARCHY
//! ROOT Hips
//! {
//!     OFFSET 0.0 0.0 0.0
//!     CHANNELS 6 Xposition Yposition Zposition Zrotation Yrotation Xrotation
//!     JOINT Spine
//!     {
//!         OFFSET 0.0 10.0 0.0
//!         CHANNELS 3 Zrotation Yrotation Xrotation
//!         End Site
//!         {
//!             OFFSET 0.0 5.0 0.0
//!         }
//!     }
//! }
//! MOTION
//! Frames: 2
//! Frame Time: 0.033333
//! 0 90 0 0 0 0 0 0 0
//! 0 90 0 0 0 0 0 0 0
//! ```
//!
//! Joints are stored in file order (depth-first pre-order). `End Site` blocks
//! carry no channels and are not joints. Rotation channels are in degrees and
//! compose in the order they are listed: `Zrotation Yrotation Xrotation`
//! yields `Rz * Ry * Rx`.

use glam::{DQuat, DVec3};
use smallvec::SmallVec;

use crate::errors::{MocapError, Result};

/// One animated degree of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Xposition,
    Yposition,
    Zposition,
    Xrotation,
    Yrotation,
    Zrotation,
}

impl Channel {
    fn parse(token: &str) -> Option<Self> {
        // Exporters disagree on capitalization.
        match token.to_ascii_lowercase().as_str() {
            "xposition" => Some(Self::Xposition),
            "yposition" => Some(Self::Yposition),
            "zposition" => Some(Self::Zposition),
            "xrotation" => Some(Self::Xrotation),
            "yrotation" => Some(Self::Yrotation),
            "zrotation" => Some(Self::Zrotation),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_position(self) -> bool {
        matches!(self, Self::Xposition | Self::Yposition | Self::Zposition)
    }

    #[inline]
    #[must_use]
    pub fn is_rotation(self) -> bool {
        !self.is_position()
    }

    /// Unit axis the channel acts along.
    #[must_use]
    pub fn axis(self) -> DVec3 {
        match self {
            Self::Xposition | Self::Xrotation => DVec3::X,
            Self::Yposition | Self::Yrotation => DVec3::Y,
            Self::Zposition | Self::Zrotation => DVec3::Z,
        }
    }
}

/// A `ROOT` or `JOINT` block.
#[derive(Debug, Clone)]
pub struct BvhJoint {
    pub name: String,
    pub parent: Option<usize>,
    pub offset: DVec3,
    pub channels: SmallVec<[Channel; 6]>,
    /// Index of this joint's first channel within a frame's value row.
    pub first_channel: usize,
}

impl BvhJoint {
    /// Rotation channels in listed order.
    pub fn rotation_channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.channels.iter().copied().filter(|c| c.is_rotation())
    }

    #[must_use]
    pub fn has_position_channels(&self) -> bool {
        self.channels.iter().any(|c| c.is_position())
    }
}

/// A parsed BVH file.
#[derive(Debug, Clone)]
pub struct BvhDocument {
    joints: Vec<BvhJoint>,
    channel_count: usize,
    frame_count: usize,
    frame_time: f64,
    values: Vec<f64>,
}

impl BvhDocument {
    /// Parses BVH text.
    pub fn parse(text: &str) -> Result<Self> {
        Parser::new(text).document()
    }

    #[inline]
    #[must_use]
    pub fn joints(&self) -> &[BvhJoint] {
        &self.joints
    }

    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    #[inline]
    #[must_use]
    pub fn frame_time(&self) -> f64 {
        self.frame_time
    }

    /// Total channels per frame.
    #[inline]
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// Raw channel values of one joint for one frame.
    #[must_use]
    pub fn channel_values(&self, frame: usize, joint: usize) -> &[f64] {
        let joint = &self.joints[joint];
        let start = frame * self.channel_count + joint.first_channel;
        &self.values[start..start + joint.channels.len()]
    }

    /// Local translation and rotation of `joint` at `frame`.
    ///
    /// Position channels replace the matching component of the joint's
    /// offset; without position channels the offset is used as is. Rotation
    /// channels compose in listed order.
    #[must_use]
    pub fn local_pose(&self, frame: usize, joint: usize) -> (DVec3, DQuat) {
        let values = self.channel_values(frame, joint);
        let mut position = self.joints[joint].offset;
        let mut rotation = DQuat::IDENTITY;

        for (&channel, &value) in self.joints[joint].channels.iter().zip(values) {
            match channel {
                Channel::Xposition => position.x = value,
                Channel::Yposition => position.y = value,
                Channel::Zposition => position.z = value,
                _ => rotation *= DQuat::from_axis_angle(channel.axis(), value.to_radians()),
            }
        }

        (position, rotation)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    tokens: Vec<(usize, &'a str)>,
    cursor: usize,
    last_line: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        let tokens: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .flat_map(|(i, line)| line.split_whitespace().map(move |t| (i + 1, t)))
            .collect();
        let last_line = text.lines().count().max(1);
        Self {
            tokens,
            cursor: 0,
            last_line,
        }
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.cursor)
            .map_or(self.last_line, |&(line, _)| line)
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.cursor).map(|&(_, t)| t)
    }

    fn token(&mut self, what: &str) -> Result<&'a str> {
        let line = self.line();
        let token = self.peek().ok_or_else(|| {
            MocapError::parse(line, format!("unexpected end of file, expected {what}"))
        })?;
        self.cursor += 1;
        Ok(token)
    }

    fn expect(&mut self, keyword: &str) -> Result<()> {
        let line = self.line();
        let token = self.token(keyword)?;
        if token.eq_ignore_ascii_case(keyword) {
            Ok(())
        } else {
            Err(MocapError::parse(line, format!("expected `{keyword}`, found `{token}`")))
        }
    }

    fn number<T: std::str::FromStr>(&mut self, what: &str) -> Result<T> {
        let line = self.line();
        let token = self.token(what)?;
        token
            .parse()
            .map_err(|_| MocapError::parse(line, format!("expected {what}, found `{token}`")))
    }

    fn vec3(&mut self) -> Result<DVec3> {
        Ok(DVec3::new(
            self.number("offset x")?,
            self.number("offset y")?,
            self.number("offset z")?,
        ))
    }

    fn document(mut self) -> Result<BvhDocument> {
        self.expect("HIERARCHY")?;
        self.expect("ROOT")?;

        let mut joints = Vec::new();
        let mut channel_count = 0;
        self.joint(None, &mut joints, &mut channel_count)?;

        if self.peek().is_some_and(|t| t.eq_ignore_ascii_case("ROOT")) {
            return Err(MocapError::parse(self.line(), "multiple ROOT blocks are not supported"));
        }

        self.expect("MOTION")?;
        self.expect("Frames:")?;
        let frames_line = self.line();
        let frame_count: usize = self.number("frame count")?;
        self.expect("Frame")?;
        self.expect("Time:")?;
        let frame_time: f64 = self.number("frame time")?;

        let expected = frame_count.checked_mul(channel_count).ok_or_else(|| {
            MocapError::parse(
                frames_line,
                format!("{frame_count} frames x {channel_count} channels overflows"),
            )
        })?;
        // The header is untrusted; never reserve more than the tokens left.
        let mut values = Vec::with_capacity(expected.min(self.tokens.len() - self.cursor));
        for _ in 0..expected {
            values.push(self.number("channel value")?);
        }
        if self.peek().is_some() {
            return Err(MocapError::parse(
                self.line(),
                format!("more values than {frame_count} frames x {channel_count} channels"),
            ));
        }

        Ok(BvhDocument {
            joints,
            channel_count,
            frame_count,
            frame_time,
            values,
        })
    }

    /// Parses a joint body, after its `ROOT`/`JOINT` keyword.
    fn joint(
        &mut self,
        parent: Option<usize>,
        joints: &mut Vec<BvhJoint>,
        channel_count: &mut usize,
    ) -> Result<()> {
        let name = self.token("joint name")?.to_string();
        self.expect("{")?;
        self.expect("OFFSET")?;
        let offset = self.vec3()?;

        let mut channels = SmallVec::new();
        if self.peek().is_some_and(|t| t.eq_ignore_ascii_case("CHANNELS")) {
            self.cursor += 1;
            let count: usize = self.number("channel count")?;
            for _ in 0..count {
                let line = self.line();
                let token = self.token("channel name")?;
                let channel = Channel::parse(token)
                    .ok_or_else(|| MocapError::parse(line, format!("unknown channel `{token}`")))?;
                channels.push(channel);
            }
        }

        let index = joints.len();
        let first_channel = *channel_count;
        *channel_count += channels.len();
        joints.push(BvhJoint {
            name,
            parent,
            offset,
            channels,
            first_channel,
        });

        loop {
            let line = self.line();
            match self.token("`}`")? {
                "}" => return Ok(()),
                t if t.eq_ignore_ascii_case("JOINT") => {
                    self.joint(Some(index), joints, channel_count)?;
                }
                t if t.eq_ignore_ascii_case("End") => {
                    self.expect("Site")?;
                    self.expect("{")?;
                    self.expect("OFFSET")?;
                    self.vec3()?;
                    self.expect("}")?;
                }
                t => {
                    return Err(MocapError::parse(
                        line,
                        format!("expected `JOINT`, `End Site` or `}}`, found `{t}`"),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_JOINTS: &str = "\
HIERARCHY
ROOT Hips
{
  OFFSET 1 2 3
  CHANNELS 6 Xposition Yposition Zposition Zrotation Yrotation Xrotation
  JOINT Spine
  {
    OFFSET 0 10 0
    CHANNELS 3 Zrotation Yrotation Xrotation
    End Site
    {
      OFFSET 0 5 0
    }
  }
}
MOTION
Frames: 2
Frame Time: 0.5
10 20 30 0 0 0 90 0 0
11 21 31 0 0 0 0 0 0
";

    #[test]
    fn test_parse_hierarchy_and_motion() {
        let doc = BvhDocument::parse(TWO_JOINTS).unwrap();
        assert_eq!(doc.joints().len(), 2);
        assert_eq!(doc.joints()[1].parent, Some(0));
        assert_eq!(doc.joints()[1].first_channel, 6);
        assert_eq!(doc.channel_count(), 9);
        assert_eq!(doc.frame_count(), 2);
        assert!((doc.frame_time() - 0.5).abs() < 1e-12);
        assert_eq!(doc.channel_values(1, 0), &[11.0, 21.0, 31.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_local_pose_channels() {
        let doc = BvhDocument::parse(TWO_JOINTS).unwrap();

        let (root_pos, _) = doc.local_pose(0, 0);
        assert_eq!(root_pos, DVec3::new(10.0, 20.0, 30.0));

        let (spine_pos, spine_rot) = doc.local_pose(0, 1);
        assert_eq!(spine_pos, DVec3::new(0.0, 10.0, 0.0));
        let expected = DQuat::from_rotation_z(90f64.to_radians());
        assert!(spine_rot.abs_diff_eq(expected, 1e-12));
    }

    #[test]
    fn test_euler_order_is_listed_order() {
        let text = TWO_JOINTS.replace("10 20 30 0 0 0 90 0 0", "10 20 30 0 0 0 30 45 60");
        let doc = BvhDocument::parse(&text).unwrap();
        let (_, rotation) = doc.local_pose(0, 1);

        let expected = DQuat::from_rotation_z(30f64.to_radians())
            * DQuat::from_rotation_y(45f64.to_radians())
            * DQuat::from_rotation_x(60f64.to_radians());
        assert!(rotation.abs_diff_eq(expected, 1e-12));
    }

    #[test]
    fn test_truncated_motion_reports_line() {
        let text = TWO_JOINTS.replace("11 21 31 0 0 0 0 0 0\n", "11 21\n");
        match BvhDocument::parse(&text) {
            Err(MocapError::Parse { line, .. }) => assert_eq!(line, 20),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_extra_motion_values_rejected() {
        let text = format!("{TWO_JOINTS}1 2 3\n");
        match BvhDocument::parse(&text) {
            Err(MocapError::Parse { line, message }) => {
                assert_eq!(line, 21);
                assert!(message.contains("more values"), "{message}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_oversized_frame_count_is_a_parse_error() {
        let text = TWO_JOINTS.replace("Frames: 2", "Frames: 9999999999999999");
        assert!(matches!(BvhDocument::parse(&text), Err(MocapError::Parse { line: 20, .. })));

        let text = TWO_JOINTS.replace("Frames: 2", &format!("Frames: {}", usize::MAX));
        assert!(matches!(BvhDocument::parse(&text), Err(MocapError::Parse { line: 17, .. })));
    }

    #[test]
    fn test_unknown_channel() {
        let text = TWO_JOINTS.replace("CHANNELS 3 Zrotation", "CHANNELS 3 Wrotation");
        assert!(matches!(BvhDocument::parse(&text), Err(MocapError::Parse { line: 9, .. })));
    }
}
