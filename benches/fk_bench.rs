//! Clip conversion benchmarks: forward kinematics alone and the full
//! assembler, serial and parallel.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use glam::{DQuat, DVec3, EulerRot};
use mocap_fk::{AssemblerSettings, ClipAssembler, ForwardKinematics, MotionData, Skeleton};

const JOINTS: usize = 64;
const FRAMES: usize = 2_000;

/// Binary-ish tree with the names the assembler requires.
fn motion() -> MotionData {
    let mut names: Vec<String> = (0..JOINTS).map(|i| format!("Joint{i}")).collect();
    names[1] = "LeftFoot".into();
    names[2] = "RightFoot".into();
    names[3] = "Head".into();
    let parents: Vec<i32> = (0..JOINTS as i32)
        .map(|i| if i == 0 { -1 } else { (i - 1) / 2 })
        .collect();

    let skeleton = Skeleton::new(names, &parents).expect("valid skeleton");
    let count = JOINTS * FRAMES;
    let positions = (0..count)
        .map(|i| DVec3::new(0.0, 10.0 + (i % 7) as f64, (i % 3) as f64))
        .collect();
    let rotations = (0..count)
        .map(|i| {
            let t = i as f64 * 0.001;
            DQuat::from_euler(EulerRot::ZYX, t.sin(), t.cos() * 0.5, t * 0.1)
        })
        .collect();
    MotionData::new(skeleton, FRAMES, positions, rotations).expect("consistent arrays")
}

fn bench_fk(c: &mut Criterion) {
    let motion = motion();

    c.bench_function("fk_resolve_serial", |b| {
        b.iter(|| ForwardKinematics::resolve(black_box(&motion), false));
    });
    c.bench_function("fk_resolve_parallel", |b| {
        b.iter(|| ForwardKinematics::resolve(black_box(&motion), true));
    });
}

fn bench_assemble(c: &mut Criterion) {
    let _ = env_logger::builder().is_test(true).try_init();
    let motion = motion();
    let assembler = ClipAssembler::new(AssemblerSettings::default());

    c.bench_function("clip_assemble", |b| {
        b.iter(|| assembler.assemble(black_box(&motion)).expect("assembles"));
    });
}

criterion_group!(benches, bench_fk, bench_assemble);
criterion_main!(benches);
