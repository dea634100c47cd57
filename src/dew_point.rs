//! Dew point from temperature and relative humidity (Magnus approximation).

use crate::measurement::round_to;

const SATURATION_AT_ZERO_HPA: f64 = 6.1078;

/// Magnus constants `(a, b)`: over water at and above 0 °C, over ice below.
fn magnus_constants(t: f64) -> (f64, f64) {
    if t >= 0.0 { (7.5, 237.3) } else { (7.6, 240.7) }
}

/// Saturation vapor pressure in hPa.
pub fn saturation_vapor_pressure(t: f64) -> f64 {
    let (a, b) = magnus_constants(t);
    SATURATION_AT_ZERO_HPA * 10f64.powf((a * t) / (b + t))
}

/// Unrounded dew point in °C.
///
/// `r` must be above zero. Callers only pass plausible temperatures, so `t`
/// never reaches `-b`.
pub fn dew_point_exact(t: f32, r: f32) -> f64 {
    let t = t as f64;
    let r = r as f64;
    let (a, b) = magnus_constants(t);

    let vapor_pressure = saturation_vapor_pressure(t) * (r / 100.0);
    let v = (vapor_pressure / SATURATION_AT_ZERO_HPA).log10();
    (b * v) / (a - v)
}

/// Dew point in °C, rounded to one decimal like every other value in the pipeline.
pub fn calc_dew_point(t: f32, r: f32) -> f32 {
    round_to(dew_point_exact(t, r) as f32, 1)
}
