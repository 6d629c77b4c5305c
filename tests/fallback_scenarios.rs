//! Sampler + animator scenarios driven the way the frame loop drives them.

use std::collections::HashSet;

use glam::Vec2;
use vibetunnel::audio::{AudioFrame, AudioSampler, CaptureError};
use vibetunnel::camera::CameraRig;
use vibetunnel::params::{AnalyserConfig, BandLayout, RenderConfig, SimulationParams, Variant};
use vibetunnel::scene::RenderContext;
use vibetunnel::tunnel::{FrameInput, FrameOutcome, InstanceRaw, Mode, TunnelAnimator};

const FRAME_DT: f32 = 1.0 / 60.0;

fn sampler() -> AudioSampler {
    AudioSampler::new(
        AnalyserConfig::default(),
        BandLayout::default(),
        SimulationParams::default(),
    )
    .expect("default analyser parameters are valid")
}

#[test]
fn test_permission_denied_keeps_every_frame_full() {
    let mut sampler = sampler();
    let status = sampler
        .start(|_| Err(CaptureError::PermissionDenied("denied by user".into())))
        .to_string();

    assert!(sampler.is_ready());
    assert!(sampler.is_simulated());
    assert!(!status.is_empty());

    let scene = Variant::Interactive.scene();
    let mut ctx = RenderContext::new(&scene);
    let mut animator = TunnelAnimator::new(Variant::Interactive.tunnel()).unwrap();
    let mut instances = animator.instance_buffer();
    let half = animator.params().length / 2.0;
    let blank: InstanceRaw = bytemuck::Zeroable::zeroed();

    for frame in 0..180 {
        let input = FrameInput {
            elapsed_s: frame as f32 * FRAME_DT,
            dt_s: FRAME_DT,
            cursor: Vec2::new(0.3, -0.2),
            bands: sampler.bands(),
        };
        let outcome = animator.update(&input, &mut ctx, Some(&mut instances));

        assert!(matches!(outcome, FrameOutcome::Updated { count: 5_000, .. }));
        assert_eq!(instances.len(), 5_000);
        assert!(instances
            .as_slice()
            .iter()
            .all(|i| *i != blank && i.color[3] > 0.0));
        assert!(animator.particles().iter().all(|p| p.z.abs() <= half));
    }
}

#[test]
fn test_simulated_stream_is_bounded_and_bass_heavy() {
    let mut sampler = sampler();
    sampler.start_simulated();
    let layout = BandLayout::default();

    let (mut bass, mut high) = (0.0, 0.0);
    for _ in 0..400 {
        let frame = sampler.audio_data();
        assert_eq!(frame.len(), 256);
        bass += frame.average_range(&layout.bass);
        high += frame.average_range(&layout.high);

        let bands = frame.bands(&layout);
        for value in [bands.bass, bands.mid, bands.high] {
            assert!((0.0..=1.0).contains(&value));
        }
    }
    assert!(bass > high * 1.5);
}

#[test]
fn test_range_average_scenario() {
    let data: Vec<u8> = (1..=10).map(|i| i * 10).collect();
    let frame = AudioFrame::new(&data);
    assert_eq!(frame.average(0, 10), 55.0);
    assert_eq!(frame.average(5, 5), 0.0);
    assert_eq!(frame.average(8, 3), 0.0);
}

#[test]
fn test_idle_sampler_still_animates_silently() {
    let mut sampler = sampler();
    let bands = sampler.bands();
    assert_eq!(bands.bass, 0.0);
    assert!(!sampler.status().is_empty());

    let scene = Variant::Classic.scene();
    let mut ctx = RenderContext::new(&scene);
    let mut animator = TunnelAnimator::new(Variant::Classic.tunnel()).unwrap();
    let mut instances = animator.instance_buffer();

    let outcome = animator.update(
        &FrameInput {
            elapsed_s: 0.5,
            dt_s: FRAME_DT,
            cursor: Vec2::ZERO,
            bands,
        },
        &mut ctx,
        Some(&mut instances),
    );
    assert!(matches!(outcome, FrameOutcome::Updated { count: 2_000, .. }));
}

#[test]
fn test_hyperdrive_cycles_through_its_modes() {
    let params = Variant::Hyperdrive.tunnel();
    let cycle = params.mode_cycle_s;
    let mut animator = TunnelAnimator::new(params.clone()).unwrap();
    let scene = Variant::Hyperdrive.scene();
    let mut ctx = RenderContext::new(&scene);
    let mut instances = animator.instance_buffer();

    let mut seen = HashSet::new();
    for step in 0..3 {
        let input = FrameInput {
            elapsed_s: cycle * step as f32 + 0.1,
            dt_s: FRAME_DT,
            ..Default::default()
        };
        if let FrameOutcome::Updated { mode, .. } =
            animator.update(&input, &mut ctx, Some(&mut instances))
        {
            seen.insert(mode);
        }
    }
    let expected: HashSet<Mode> = params.modes.into_iter().collect();
    assert_eq!(seen, expected);
}

#[test]
fn test_camera_follows_animated_context() {
    let mut sampler = sampler();
    sampler.start_simulated();

    let scene = Variant::Hyperdrive.scene();
    let rig = CameraRig::new(scene.camera.clone());
    let mut ctx = RenderContext::new(&scene);
    let mut animator = TunnelAnimator::new(Variant::Hyperdrive.tunnel()).unwrap();
    let mut instances = animator.instance_buffer();

    for frame in 0..30 {
        let t = frame as f32 * FRAME_DT;
        let bands = sampler.bands();
        animator.update(
            &FrameInput {
                elapsed_s: t,
                dt_s: FRAME_DT,
                cursor: Vec2::new(-0.5, 0.5),
                bands,
            },
            &mut ctx,
            Some(&mut instances),
        );
        rig.update(t, &mut ctx, &bands);
    }

    let (view_proj, eye) = rig.view_proj(&ctx.camera, &RenderConfig::default());
    assert!(view_proj.is_finite());
    assert!(eye.is_finite());
    assert!(ctx.cursor.x < 0.0 && ctx.cursor.y > 0.0);
}
