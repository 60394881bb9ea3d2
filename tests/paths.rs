use offscreen3d::sim::path::CameraPathSchedule;
use offscreen3d::sim::ramp::ForceRampSchedule;
use offscreen3d::{Point, Vector};

#[test]
fn test_full_orbit_at_sixty_fps() {
    let path = CameraPathSchedule::ellipse(120, 40., 40.).unwrap();
    assert_eq!(path.len(), 121);

    let p0 = path.first().unwrap();
    assert!(p0.is_within(&Point::new(-40., 0., 0.), 1e-9));
    // A quarter of the frames turns the camera by a quarter of the orbit
    assert!(path.position(30).unwrap().is_within(&Point::new(0., 0., 40.), 1e-9));
    assert!(path.position(60).unwrap().is_within(&Point::new(40., 0., 0.), 1e-9));
    assert!(path.last().unwrap().is_within(&p0, 1e-9));

    for p in path.iter() {
        assert_eq!(p.y, 0.);
        assert!((p.x * p.x / 1600. + p.z * p.z / 1600. - 1.).abs() < 1e-9);
    }
}

#[test]
fn test_schedules_are_deterministic() {
    let a = CameraPathSchedule::ellipse(77, 12.5, 3.25).unwrap();
    let b = CameraPathSchedule::ellipse(77, 12.5, 3.25).unwrap();
    let bits = |s: &CameraPathSchedule| -> Vec<[u64; 3]> {
        s.iter()
            .map(|p| [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()])
            .collect()
    };
    assert_eq!(bits(&a), bits(&b));

    let peak = Vector::new(0., -10., 0.);
    assert_eq!(
        ForceRampSchedule::new(120, peak).unwrap(),
        ForceRampSchedule::new(120, peak).unwrap()
    );
}

#[test]
fn test_ramp_over_a_run() {
    let peak = Vector::new(0., -12., 0.);
    let ramp = ForceRampSchedule::new(120, peak).unwrap();
    assert!(ramp.value_at(0.).is_close(&Vector::new(0., -0.1, 0.)));
    assert!(ramp.value_at(60.).is_close(&peak));
    assert!(ramp.value_at(120.).is_close(&Vector::new(0., -0.1, 0.)));
    assert!(ramp.value_at(500.).is_close(&Vector::new(0., -0.1, 0.)));

    let seconds = ramp.to_simulated_time(1. / 60.);
    assert!(seconds.value_at(1.).is_close(&peak));
}
