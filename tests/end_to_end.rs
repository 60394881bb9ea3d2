use offscreen3d::render::SoftwareRenderer;
use offscreen3d::scene::demo::{beam_and_ball, NARROW_CAMERA, WIDE_CAMERA};
use offscreen3d::{CaptureConfig, CaptureDriver, Engine, SimulationFacade, ViewConfig};
use tempfile::tempdir;

#[test]
fn test_reference_engine_writes_decodable_frames() {
    let dir = tempdir().unwrap();
    let config = CaptureConfig {
        simulation_time: 1.,
        fps: 3,
        resolution: [40, 30],
        samples: 4,
        views: vec![
            ViewConfig::new("beam_and_ball", WIDE_CAMERA, dir.path().join("beam_and_ball")),
            ViewConfig::new("only_ball", NARROW_CAMERA, dir.path().join("only_ball")),
        ],
        ..CaptureConfig::default()
    };
    let mut driver = CaptureDriver::new(Engine::new(SoftwareRenderer::default()), config).unwrap();
    let summary = driver.run(beam_and_ball().unwrap()).unwrap();
    assert_eq!(summary.total_files(), 8);

    for view in &summary.views {
        assert_eq!(view.frames_written, 4);
        for i in 0..4 {
            let img = image::open(view.output_dir.join(format!("frame_{i}.jpg"))).unwrap();
            assert_eq!((img.width(), img.height()), (40, 30));
        }
    }
    assert_eq!(driver.facade().frames_saved(), 8);
}

#[test]
fn test_automatic_capture_cadence() {
    let dir = tempdir().unwrap();
    let mut scene = beam_and_ball().unwrap();
    for path in [WIDE_CAMERA, NARROW_CAMERA] {
        let camera = scene.camera_mut(path).unwrap();
        camera.width = 80;
        camera.height = 60;
    }

    let mut engine = Engine::new(SoftwareRenderer::default()).with_capture_root(dir.path());
    let h = engine.load(scene).unwrap();
    engine.init(h).unwrap();
    engine.init_visual(h).unwrap();
    for _ in 0..10 {
        engine.step(h, 0.1).unwrap();
        engine.update_visual(h).unwrap();
    }

    let mut files: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(
        files,
        vec![
            "beam_and_ball_0.png",
            "beam_and_ball_10.png",
            "beam_and_ball_5.png",
            "only_ball_0.png",
            "only_ball_10.png",
            "only_ball_5.png",
        ]
    );
    assert_eq!(engine.frames_saved(), 6);
}

#[test]
fn test_camera_sees_only_its_subtree() {
    let dir = tempdir().unwrap();
    let mut scene = beam_and_ball().unwrap();
    for path in [WIDE_CAMERA, NARROW_CAMERA] {
        let camera = scene.camera_mut(path).unwrap();
        camera.width = 80;
        camera.height = 60;
        camera.save_frame_before_first_step = false;
        camera.save_frame_after_each_n_steps = 0;
    }
    let mut engine = Engine::new(SoftwareRenderer::default());
    let h = engine.load(scene).unwrap();
    engine.init(h).unwrap();
    engine.init_visual(h).unwrap();

    let wide = dir.path().join("wide.png");
    let narrow = dir.path().join("narrow.png");
    engine.save_frame(h, WIDE_CAMERA, &wide).unwrap();
    engine.save_frame(h, NARROW_CAMERA, &narrow).unwrap();

    let grey = image::Rgb([180u8, 180, 180]);
    let is_red = |p: &image::Rgb<u8>| p[0] > 200 && p[1] < 50 && p[2] < 50;

    let wide = image::open(&wide).unwrap().to_rgb8();
    assert!(wide.pixels().any(|p| *p == grey));
    assert!(wide.pixels().any(is_red));

    let narrow = image::open(&narrow).unwrap().to_rgb8();
    assert!(!narrow.pixels().any(|p| *p == grey));
    assert!(narrow.pixels().any(is_red));
}

#[test]
fn test_cameras_outside_the_views_stay_silent() {
    let dir = tempdir().unwrap();
    let stray = dir.path().join("stray");
    std::fs::create_dir(&stray).unwrap();
    let config = CaptureConfig {
        simulation_time: 10.,
        fps: 1,
        resolution: [40, 30],
        samples: 1,
        views: vec![ViewConfig::new(
            "beam_and_ball",
            WIDE_CAMERA,
            dir.path().join("beam_and_ball"),
        )],
        ..CaptureConfig::default()
    };
    let engine = Engine::new(SoftwareRenderer::default()).with_capture_root(&stray);
    let mut driver = CaptureDriver::new(engine, config).unwrap();
    let summary = driver.run(beam_and_ball().unwrap()).unwrap();

    assert_eq!(summary.total_files(), 11);
    assert_eq!(driver.facade().frames_saved(), 11);
    assert_eq!(std::fs::read_dir(&stray).unwrap().count(), 0);

    let scene = driver.facade().scene(offscreen3d::SceneHandle::new(0)).unwrap();
    let narrow = scene.camera(NARROW_CAMERA).unwrap();
    assert!(!narrow.save_frame_before_first_step);
    assert_eq!(narrow.save_frame_after_each_n_steps, 0);
    // Only view cameras take the run's viewport
    assert_ne!((narrow.width, narrow.height), (40, 30));
}
