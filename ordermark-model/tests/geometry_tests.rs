use glam::DVec3;
use ordermark_model::{Location, Segment};

#[test]
fn point_location_is_its_own_representative() {
    let p = DVec3::new(3.0, 4.0, 0.0);
    assert_eq!(Location::Point(p).representative_point(), Some(p));
}

#[test]
fn line_representative_is_midpoint() {
    let loc = Location::line(DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0));
    assert_eq!(loc.representative_point(), Some(DVec3::new(5.0, 0.0, 0.0)));
}

#[test]
fn polyline_midpoint_is_by_arc_length() {
    // 10 along X then 30 along Y: half of 40 lies 10 up the second leg.
    let loc = Location::Curve(vec![
        DVec3::ZERO,
        DVec3::new(10.0, 0.0, 0.0),
        DVec3::new(10.0, 30.0, 0.0),
    ]);
    let mid = loc.representative_point().unwrap();
    assert!((mid - DVec3::new(10.0, 10.0, 0.0)).length() < 1e-9);
}

#[test]
fn empty_curve_has_no_representative() {
    assert_eq!(Location::Curve(Vec::new()).representative_point(), None);
}

#[test]
fn degenerate_curve_uses_its_start() {
    let loc = Location::line(DVec3::ONE, DVec3::ONE);
    assert_eq!(loc.representative_point(), Some(DVec3::ONE));
}

#[test]
fn segments_follow_polyline() {
    let loc = Location::Curve(vec![DVec3::ZERO, DVec3::X, DVec3::ONE]);
    let segs = loc.segments();
    assert_eq!(segs.len(), 2);
    assert_eq!(segs[1], Segment::new(DVec3::X, DVec3::ONE));
}
