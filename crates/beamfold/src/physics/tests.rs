use super::*;
use crate::component::ComponentPatch;

fn at(id: &str, kind: ComponentKind, x: f64, y: f64, angle: f64) -> Component {
    Component::new(id, kind, Point2::new(x, y), angle)
}

fn source(x: f64, y: f64, angle: f64) -> Component {
    at("src", ComponentKind::Source { power: 2.0 }, x, y, angle)
}

fn splitter(shallow: Option<f64>) -> ComponentKind {
    ComponentKind::BeamSplitter {
        split_ratio: 0.5,
        shallow_angle: shallow,
    }
}

fn cfg() -> EngineCfg {
    EngineCfg::default()
}

#[test]
fn source_ignores_input_angle() {
    let s = source(0.0, 0.0, 90.0);
    assert_eq!(output_direction(&s, 12.0, Port::Output), Some(90.0));
}

#[test]
fn mirror_reflects_and_detector_terminates() {
    let m = at("m", ComponentKind::Mirror, 0.0, 0.0, 45.0);
    let out = output_direction(&m, 0.0, Port::Reflected).unwrap();
    assert!(angular_difference(out, 90.0) < 1e-9);
    let d = at("d", ComponentKind::Detector, 0.0, 0.0, 0.0);
    assert_eq!(output_direction(&d, 0.0, Port::Input), None);
}

#[test]
fn splitter_ports_and_shallow_override() {
    let bs = at("bs", splitter(None), 0.0, 0.0, 135.0);
    assert_eq!(output_direction(&bs, 0.0, Port::Transmitted), Some(0.0));
    let r = output_direction(&bs, 0.0, Port::Reflected).unwrap();
    assert!(angular_difference(r, 270.0) < 1e-9);

    // Shallow surface at 10°: a beam along 0° leaves at 20°.
    let shallow = at("bs2", splitter(Some(10.0)), 0.0, 0.0, 135.0);
    let r = output_direction(&shallow, 0.0, Port::Reflected).unwrap();
    assert!(angular_difference(r, 20.0) < 1e-9);
}

#[test]
fn transmissive_components_pass_straight() {
    for kind in [ComponentKind::Lens, ComponentKind::Waveplate, ComponentKind::Filter] {
        let c = at("t", kind, 0.0, 0.0, 0.0);
        assert_eq!(output_direction(&c, 370.0, Port::Output), Some(10.0));
    }
}

#[test]
fn splitter_power_divides() {
    let bs = at("bs", ComponentKind::BeamSplitter { split_ratio: 0.3, shallow_angle: None }, 0.0, 0.0, 45.0);
    assert!((output_power(&bs, 1.0, Port::Transmitted) - 0.3).abs() < 1e-12);
    assert!((output_power(&bs, 1.0, Port::Reflected) - 0.7).abs() < 1e-12);
    assert_eq!(output_power(&source(0.0, 0.0, 0.0), 0.1, Port::Output), 2.0);
}

#[test]
fn source_to_detector_on_axis_is_valid() {
    let s = source(0.0, 0.0, 0.0);
    let d = at("det", ComponentKind::Detector, 100.0, 0.0, 0.0);
    let c = check_connection(&s, &d, Port::Output, None, &cfg()).unwrap();
    assert!(c.beam_angle.abs() < 1e-9);
    assert!((c.beam_direction.x - 1.0).abs() < 1e-12);
}

#[test]
fn strict_tolerance_is_five_degrees() {
    let s = source(0.0, 0.0, 0.0);
    let rad = |deg: f64| deg.to_radians();
    let ok = at("d", ComponentKind::Detector, 100.0 * rad(4.0).cos(), 100.0 * rad(4.0).sin(), 0.0);
    assert!(check_connection(&s, &ok, Port::Output, None, &cfg()).is_ok());
    let off = at("d", ComponentKind::Detector, 100.0 * rad(6.0).cos(), 100.0 * rad(6.0).sin(), 0.0);
    let err = check_connection(&s, &off, Port::Output, None, &cfg()).unwrap_err();
    assert!(matches!(err, EngineError::ConnectionInvalid(_)));
}

#[test]
fn relaxed_endpoint_widens_to_thirty_degrees() {
    let s = source(0.0, 0.0, 0.0);
    let rad = 25f64.to_radians();
    let target = at("d", ComponentKind::Detector, 100.0 * rad.cos(), 100.0 * rad.sin(), 0.0);
    assert!(check_connection(&s, &target, Port::Output, None, &cfg()).is_err());
    let relaxed = target.clone().relaxed();
    assert!(check_connection(&s, &relaxed, Port::Output, None, &cfg()).is_ok());
    let rad = 35f64.to_radians();
    let too_far = at("d", ComponentKind::Detector, 100.0 * rad.cos(), 100.0 * rad.sin(), 0.0).relaxed();
    assert!(check_connection(&s, &too_far, Port::Output, None, &cfg()).is_err());
}

#[test]
fn relaxed_source_skips_ray_check() {
    let m = at("m", ComponentKind::Mirror, 0.0, 0.0, 45.0).relaxed();
    let d = at("d", ComponentKind::Detector, -50.0, -70.0, 0.0);
    // No incoming angle known: the direct angle is used.
    let c = check_connection(&m, &d, Port::Reflected, None, &cfg()).unwrap();
    assert!(angular_difference(c.beam_angle, direction_to_angle(Vector2::new(-50.0, -70.0))) < 1e-9);
}

#[test]
fn non_source_needs_incoming_angle() {
    let m = at("m", ComponentKind::Mirror, 0.0, 0.0, 45.0);
    let d = at("d", ComponentKind::Detector, 0.0, 100.0, 0.0);
    assert!(check_connection(&m, &d, Port::Reflected, None, &cfg()).is_err());
    assert!(check_connection(&m, &d, Port::Reflected, Some(0.0), &cfg()).is_ok());
}

#[test]
fn lens_must_be_fed_along_axis() {
    let s = source(0.0, 0.0, 0.0);
    let aligned = at("l", ComponentKind::Lens, 100.0, 0.0, 180.0);
    assert!(check_connection(&s, &aligned, Port::Output, None, &cfg()).is_ok());
    let crossed = at("l", ComponentKind::Lens, 100.0, 0.0, 90.0);
    let err = check_connection(&s, &crossed, Port::Output, None, &cfg()).unwrap_err();
    assert!(err.to_string().contains("optical axis"));
    let relaxed = crossed.apply(&ComponentPatch {
        allow_any_angle: Some(true),
        ..ComponentPatch::default()
    });
    assert!(check_connection(&s, &relaxed, Port::Output, None, &cfg()).is_ok());
}

#[test]
fn terminal_endpoints_are_rejected() {
    let s = source(0.0, 0.0, 0.0);
    let other_source = at("s2", ComponentKind::Source { power: 1.0 }, 100.0, 0.0, 0.0);
    assert!(check_connection(&s, &other_source, Port::Output, None, &cfg()).is_err());
    let det = at("det", ComponentKind::Detector, 0.0, 0.0, 0.0);
    let m = at("m", ComponentKind::Mirror, 100.0, 0.0, 45.0);
    assert!(check_connection(&det, &m, Port::Output, Some(0.0), &cfg()).is_err());
}

#[test]
fn validate_by_id_reports_unknown_components() {
    let mut comps = Components::new();
    let s = source(0.0, 0.0, 0.0);
    comps.insert(s.id.clone(), s);
    let res = validate_connection(&comps, &"src".into(), &"nope".into(), Port::Output, None, &cfg());
    assert!(!res.valid);
    assert!(res.error.unwrap().contains("nope"));
    assert!(res.beam_angle.is_none());
}

#[test]
fn valid_angle_sets() {
    let m = at("m", ComponentKind::Mirror, 0.0, 0.0, 45.0);
    assert_eq!(valid_angles(&m), vec![45.0, 135.0]);
    let bs = at("bs", splitter(Some(20.0)), 0.0, 0.0, 20.0);
    assert_eq!(valid_angles(&bs), vec![20.0, 160.0, 200.0, 340.0]);
    let det = at("d", ComponentKind::Detector, 0.0, 0.0, 0.0);
    assert_eq!(valid_angles(&det).len(), 8);
    assert_eq!(valid_angles(&det.relaxed()).len(), 24);
}

#[test]
fn snapping_is_circular() {
    let lens = at("l", ComponentKind::Lens, 0.0, 0.0, 0.0);
    assert_eq!(snap_angle_to_valid(&lens, 350.0), 0.0);
    assert_eq!(snap_angle_to_valid(&lens, 100.0), 90.0);
    let m = at("m", ComponentKind::Mirror, 0.0, 0.0, 45.0);
    assert_eq!(snap_angle_to_valid(&m, 200.0), 135.0);
    assert_eq!(snap_angle_to_valid(&m.relaxed(), 52.0), 45.0);
}
