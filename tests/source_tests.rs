//! Motion Source Tests
//!
//! Tests for:
//! - LAFAN1 layout acceptance and rejection
//! - Noitom per-joint channel layouts
//! - Both sources feeding the same conversion core
//! - I/O and parse error reporting

use glam::DVec3;
use mocap_fk::sources::{Lafan1Source, NoitomSource};
use mocap_fk::{ClipAssembler, MocapError, MotionSource};

const EPSILON: f64 = 1e-9;

/// Minimal biped in the research-dataset layout. Frame 1 yaws the hips.
const LAFAN_BVH: &str = "\
HIERARCHY
ROOT Hips
{
\tOFFSET 0.0 0.0 0.0
\tCHANNELS 6 Xposition Yposition Zposition Zrotation Yrotation Xrotation
\tJOINT Spine
\t{
\t\tOFFSET 0.0 20.0 0.0
\t\tCHANNELS 3 Zrotation Yrotation Xrotation
\t\tJOINT Head
\t\t{
\t\t\tOFFSET 0.0 30.0 0.0
\t\t\tCHANNELS 3 Zrotation Yrotation Xrotation
\t\t\tEnd Site
\t\t\t{
\t\t\t\tOFFSET 0.0 10.0 0.0
\t\t\t}
\t\t}
\t}
\tJOINT LeftFoot
\t{
\t\tOFFSET 10.0 -90.0 0.0
\t\tCHANNELS 3 Zrotation Yrotation Xrotation
\t\tJOINT LeftToe
\t\t{
\t\t\tOFFSET 0.0 -5.0 10.0
\t\t\tCHANNELS 3 Zrotation Yrotation Xrotation
\t\t}
\t}
\tJOINT RightFoot
\t{
\t\tOFFSET -10.0 -90.0 0.0
\t\tCHANNELS 3 Zrotation Yrotation Xrotation
\t\tJOINT RightToe
\t\t{
\t\t\tOFFSET 0.0 -5.0 10.0
\t\t\tCHANNELS 3 Zrotation Yrotation Xrotation
\t\t}
\t}
}
MOTION
Frames: 2
Frame Time: 0.033333
0 100 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0
0 100 50 0 90 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0
";

#[test]
fn lafan_source_loads_topology() {
    let motion = Lafan1Source::from_text(LAFAN_BVH).load().unwrap();
    let skeleton = motion.skeleton();

    assert_eq!(
        skeleton.names(),
        ["Hips", "Spine", "Head", "LeftFoot", "LeftToe", "RightFoot", "RightToe"]
    );
    assert_eq!(skeleton.parent_indices(), [-1, 0, 1, 0, 3, 0, 5]);
    assert_eq!(motion.frame_count(), 2);
    assert!((motion.frame_time().unwrap() - 0.033_333).abs() < 1e-12);

    // Root position comes from the channels, other joints from their offsets.
    let frame = motion.frame(1);
    assert_eq!(frame.positions[0], DVec3::new(0.0, 100.0, 50.0));
    assert_eq!(frame.positions[1], DVec3::new(0.0, 20.0, 0.0));
}

#[test]
fn lafan_clip_in_meters_z_up() {
    let clip = ClipAssembler::default()
        .load(&Lafan1Source::from_text(LAFAN_BVH))
        .unwrap();

    assert_eq!(clip.len(), 2);
    assert_eq!(clip.frame_time(), Some(0.033_333));

    let head = clip.frame(0).get("Head").unwrap();
    assert!(head.position.abs_diff_eq(DVec3::new(0.0, 0.0, 1.5), EPSILON));

    // Hips at z = 50 cm yawed 90 degrees about source Y: the left foot offset
    // swings from +X to -Z, landing at (0, 10, 40) cm in source axes.
    let foot = clip.frame(1).get("LeftFootMod").unwrap();
    assert!(
        foot.position.abs_diff_eq(DVec3::new(0.0, -0.4, 0.1), EPSILON),
        "{:?}",
        foot.position
    );
}

#[test]
fn lafan_rejects_mixed_rotation_orders() {
    let text = LAFAN_BVH.replacen(
        "\t\tCHANNELS 3 Zrotation Yrotation Xrotation\n\t\tJOINT Head",
        "\t\tCHANNELS 3 Xrotation Yrotation Zrotation\n\t\tJOINT Head",
        1,
    );
    assert_ne!(text, LAFAN_BVH);

    assert!(matches!(
        Lafan1Source::from_text(text.clone()).load(),
        Err(MocapError::UnsupportedChannels(_))
    ));
    // The per-joint reader accepts it.
    assert!(NoitomSource::from_text(text).load().is_ok());
}

#[test]
fn lafan_rejects_joint_position_channels() {
    let text = LAFAN_BVH
        .replacen(
            "\t\tOFFSET 0.0 20.0 0.0\n\t\tCHANNELS 3 Zrotation Yrotation Xrotation",
            "\t\tOFFSET 0.0 20.0 0.0\n\t\tCHANNELS 6 \
             Xposition Yposition Zposition Zrotation Yrotation Xrotation",
            1,
        )
        .replace(
            "0 100 0 0 0 0 0 0 0 0",
            "0 100 0 0 0 0 0 20 0 0 0 0 0",
        )
        .replace(
            "0 100 50 0 90 0 0 0 0 0",
            "0 100 50 0 90 0 0 25 0 0 0 0 0",
        );

    assert!(matches!(
        Lafan1Source::from_text(text.clone()).load(),
        Err(MocapError::UnsupportedChannels(_))
    ));

    // Displacement channels replace the offset in the per-joint reader.
    let motion = NoitomSource::from_text(text).load().unwrap();
    assert_eq!(motion.frame(0).positions[1], DVec3::new(0.0, 20.0, 0.0));
    assert_eq!(motion.frame(1).positions[1], DVec3::new(0.0, 25.0, 0.0));
}

#[test]
fn sources_agree_on_shared_layout() {
    let assembler = ClipAssembler::default();
    let lafan = assembler.load(&Lafan1Source::from_text(LAFAN_BVH)).unwrap();
    let noitom = assembler.load(&NoitomSource::from_text(LAFAN_BVH)).unwrap();

    assert_eq!(lafan.joint_names(), noitom.joint_names());
    for (a, b) in lafan.frames().zip(noitom.frames()) {
        assert_eq!(a.poses(), b.poses());
    }
}

#[test]
fn source_names() {
    assert_eq!(Lafan1Source::from_text("").name(), "lafan1");
    assert_eq!(NoitomSource::from_text("").name(), "noitom");
}

#[test]
fn missing_file_is_io_error() {
    let result = NoitomSource::from_path("/nonexistent/take011_chr01.bvh").load();
    assert!(matches!(result, Err(MocapError::IoError(_))));
}

#[test]
fn malformed_text_is_parse_error() {
    let text = LAFAN_BVH.replace("OFFSET 0.0 30.0 0.0", "OFFSET 0.0 thirty 0.0");
    match Lafan1Source::from_text(text).load() {
        Err(MocapError::Parse { line, message }) => {
            assert_eq!(line, 12);
            assert!(message.contains("thirty"), "{message}");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
