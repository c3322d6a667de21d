use crate::geodesy::normalize_degrees;

/// Angle the arrow must turn, relative to where the device is facing, to point
/// at the target. A missing or non-finite heading counts as north.
pub fn relative_rotation(bearing_degrees: f64, device_heading: Option<f64>) -> f64 {
    let heading = device_heading.filter(|h| h.is_finite()).unwrap_or(0.0);
    normalize_degrees(bearing_degrees - heading + 360.0)
}
