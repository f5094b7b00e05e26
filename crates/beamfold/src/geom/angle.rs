//! Degree/radian conversion, normalization and the mirror reflection law.

use nalgebra::Vector2;

/// Normalize an angle in degrees to `[0, 360)`.
#[inline]
pub fn normalize_angle(deg: f64) -> f64 {
    let r = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

#[inline]
pub fn deg_to_rad(deg: f64) -> f64 {
    deg.to_radians()
}

#[inline]
pub fn rad_to_deg(rad: f64) -> f64 {
    rad.to_degrees()
}

/// Unit vector pointing along `deg`.
#[inline]
pub fn angle_to_direction(deg: f64) -> Vector2<f64> {
    let r = deg_to_rad(deg);
    Vector2::new(r.cos(), r.sin())
}

/// Angle of a (not necessarily unit) vector, normalized to `[0, 360)`.
#[inline]
pub fn direction_to_angle(v: Vector2<f64>) -> f64 {
    normalize_angle(rad_to_deg(v.y.atan2(v.x)))
}

/// Absolute circular difference between two angles, in `[0, 180]`.
#[inline]
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let d = normalize_angle(a - b);
    if d > 180.0 {
        360.0 - d
    } else {
        d
    }
}

/// Reflect direction `d` off a surface with unit normal `n`: `R = D − 2(D·N)N`.
#[inline]
pub fn reflect_direction(d: Vector2<f64>, n: Vector2<f64>) -> Vector2<f64> {
    d - n * (2.0 * d.dot(&n))
}

/// Reflect a beam travelling along `input_deg` off a reflective surface whose
/// orientation is `surface_deg`. The surface normal is `surface_deg + 90°`.
pub fn reflect_angle(input_deg: f64, surface_deg: f64) -> f64 {
    let d = angle_to_direction(input_deg);
    let n = angle_to_direction(surface_deg + 90.0);
    direction_to_angle(reflect_direction(d, n))
}
