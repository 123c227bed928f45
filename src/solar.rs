//! Solar position calculation (NOAA solar calculator procedure).
//!
//! Pure math, no side effects. All time arithmetic happens in UTC: the local
//! civil timestamp is converted before the Julian-day computation. Computing
//! the Julian day from local clock fields would silently shift the hour
//! angle and invalidate every azimuth/elevation result for any non-zero
//! zone offset.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};

use crate::types::SunPosition;

/// Sun position for a location and local civil timestamp.
pub fn sun_position(lat: f64, lng: f64, time: DateTime<FixedOffset>) -> SunPosition {
    let utc = time.with_timezone(&Utc);
    let fractional_hour =
        f64::from(utc.hour()) + f64::from(utc.minute()) / 60.0 + f64::from(utc.second()) / 3600.0;

    let lat = lat.clamp(-90.0, 90.0);
    let lng = lng.clamp(-180.0, 180.0);

    let jd = julian_day(utc.year(), utc.month(), utc.day(), fractional_hour);
    let t = julian_century(jd);

    let eqtime = eq_of_time(t);
    let decl = sun_declination(t);

    // True solar time in minutes, from UTC clock time plus the equation of
    // time and the longitude offset (4 minutes per degree east).
    let time_offset = eqtime + 4.0 * lng;
    let true_solar = (fractional_hour * 60.0 + time_offset).rem_euclid(1440.0);

    let hour_angle = true_solar / 4.0 - 180.0;
    let zenith = solar_zenith(lat, decl, hour_angle);
    let elevation = 90.0 - zenith;
    let corrected = elevation + refraction_correction(elevation);
    let azimuth = solar_azimuth(lat, zenith, decl, hour_angle);

    SunPosition {
        altitude_deg: corrected,
        azimuth_deg: azimuth,
    }
}

/// Horizontal shadow length cast by a structure of `height_m`.
///
/// Effectively infinite at or below the horizon.
pub fn shadow_length_m(height_m: f64, altitude_deg: f64) -> f64 {
    if altitude_deg <= 0.0 {
        return f64::INFINITY;
    }
    height_m / altitude_deg.to_radians().tan()
}

fn julian_day(year: i32, month: u32, day: u32, fractional_hour: f64) -> f64 {
    let (y, m) = if month <= 2 {
        (year - 1, month + 12)
    } else {
        (year, month)
    };

    let a = (f64::from(y) / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();

    (365.25 * (f64::from(y) + 4716.0)).floor()
        + (30.6001 * (f64::from(m) + 1.0)).floor()
        + f64::from(day)
        + fractional_hour / 24.0
        + b
        - 1524.5
}

fn julian_century(jd: f64) -> f64 {
    (jd - 2_451_545.0) / 36_525.0
}

/// Geometric mean longitude of the sun, degrees.
fn geom_mean_long_sun(t: f64) -> f64 {
    (280.46646 + t * (36000.76983 + 0.0003032 * t)).rem_euclid(360.0)
}

/// Geometric mean anomaly of the sun, degrees.
fn geom_mean_anomaly_sun(t: f64) -> f64 {
    357.52911 + t * (35999.05029 - 0.0001537 * t)
}

/// Eccentricity of Earth's orbit.
fn eccent_earth_orbit(t: f64) -> f64 {
    0.016708634 - t * (0.000042037 + 0.0000001267 * t)
}

/// Equation of center, degrees.
fn sun_eq_of_center(t: f64) -> f64 {
    let m = geom_mean_anomaly_sun(t).to_radians();
    m.sin() * (1.914602 - t * (0.004817 + 0.000014 * t))
        + (2.0 * m).sin() * (0.019993 - 0.000101 * t)
        + (3.0 * m).sin() * 0.000289
}

fn sun_true_long(t: f64) -> f64 {
    geom_mean_long_sun(t) + sun_eq_of_center(t)
}

/// Apparent longitude with the nutation correction, degrees.
fn sun_apparent_long(t: f64) -> f64 {
    sun_true_long(t) - 0.00569 - 0.00478 * (125.04 - 1934.136 * t).to_radians().sin()
}

/// Mean obliquity of the ecliptic, degrees.
fn mean_obliq_ecliptic(t: f64) -> f64 {
    23.0 + (26.0 + (21.448 - t * (46.8150 + t * (0.00059 - t * 0.001813))) / 60.0) / 60.0
}

/// Obliquity with the periodic correction, degrees.
fn obliq_corr(t: f64) -> f64 {
    mean_obliq_ecliptic(t) + 0.00256 * (125.04 - 1934.136 * t).to_radians().cos()
}

/// Solar declination, degrees.
fn sun_declination(t: f64) -> f64 {
    let e = obliq_corr(t).to_radians();
    let lambda = sun_apparent_long(t).to_radians();
    (e.sin() * lambda.sin()).asin().to_degrees()
}

/// Equation of time, minutes.
fn eq_of_time(t: f64) -> f64 {
    let e = obliq_corr(t).to_radians();
    let l0 = geom_mean_long_sun(t).to_radians();
    let ecc = eccent_earth_orbit(t);
    let m = geom_mean_anomaly_sun(t).to_radians();

    let y = (e / 2.0).tan().powi(2);

    let etime = y * (2.0 * l0).sin() - 2.0 * ecc * m.sin()
        + 4.0 * ecc * y * m.sin() * (2.0 * l0).cos()
        - 0.5 * y * y * (4.0 * l0).sin()
        - 1.25 * ecc * ecc * (2.0 * m).sin();

    etime.to_degrees() * 4.0
}

/// Solar zenith angle, degrees.
fn solar_zenith(lat: f64, decl: f64, hour_angle: f64) -> f64 {
    let lat_rad = lat.to_radians();
    let decl_rad = decl.to_radians();
    let ha_rad = hour_angle.to_radians();

    let cos_zenith =
        lat_rad.sin() * decl_rad.sin() + lat_rad.cos() * decl_rad.cos() * ha_rad.cos();
    cos_zenith.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Solar azimuth in compass degrees, via the hour-angle-sign branch.
fn solar_azimuth(lat: f64, zenith: f64, decl: f64, hour_angle: f64) -> f64 {
    let lat_rad = lat.to_radians();
    let zenith_rad = zenith.to_radians();
    let decl_rad = decl.to_radians();

    let num = lat_rad.sin() * zenith_rad.cos() - decl_rad.sin();
    let den = lat_rad.cos() * zenith_rad.sin();

    let cos_az = if den.abs() < 1e-10 {
        if num >= 0.0 { 1.0 } else { -1.0 }
    } else {
        (num / den).clamp(-1.0, 1.0)
    };

    let az = cos_az.acos().to_degrees();
    if hour_angle > 0.0 {
        (az + 180.0).rem_euclid(360.0)
    } else {
        (540.0 - az).rem_euclid(360.0)
    }
}

/// Atmospheric refraction correction, degrees.
///
/// Branches on uncorrected elevation: none above 85 degrees, the standard
/// tangent series down to 5 degrees, a polynomial near the horizon, and a
/// small fixed-form term below -0.575 degrees.
fn refraction_correction(elevation: f64) -> f64 {
    if elevation > 85.0 {
        0.0
    } else if elevation > 5.0 {
        let te = elevation.to_radians().tan();
        (58.1 / te - 0.07 / te.powi(3) + 0.000086 / te.powi(5)) / 3600.0
    } else if elevation > -0.575 {
        (1735.0
            + elevation
                * (-518.2 + elevation * (103.4 + elevation * (-12.79 + elevation * 0.711))))
            / 3600.0
    } else {
        let te = elevation.to_radians().tan();
        (-20.774 / te) / 3600.0
    }
}
