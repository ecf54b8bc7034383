//! Shared conformal-projection helper functions.
//!
//! These are the standard ellipsoidal series used by both the Lambert
//! Conformal Conic and Polar Stereographic projections.

use super::ProjectionError;

/// Angular convergence tolerance, in radians.
pub(crate) const EPSLN: f64 = 1.0e-10;

/// Half pi, used as the pole latitude.
pub(crate) const HALF_PI: f64 = std::f64::consts::FRAC_PI_2;

/// WGS84 semi-major axis, meters.
pub(crate) const WGS84_MAJOR: f64 = 6_378_137.0;

/// WGS84 semi-minor axis, meters.
pub(crate) const WGS84_MINOR: f64 = 6_356_752.314245;

/// Normalize a longitude (radians) into (-pi, pi].
pub(crate) fn adjust_lon(mut lon: f64) -> f64 {
    let two_pi = std::f64::consts::TAU;
    while lon > std::f64::consts::PI {
        lon -= two_pi;
    }
    while lon <= -std::f64::consts::PI {
        lon += two_pi;
    }
    lon
}

/// Small-m: the radius of the parallel of latitude scaled by the ellipsoid.
pub(crate) fn msfnz(e: f64, sinphi: f64, cosphi: f64) -> f64 {
    let con = e * sinphi;
    cosphi / (1.0 - con * con).sqrt()
}

/// Small-t: the isometric co-latitude function.
pub(crate) fn tsfnz(e: f64, phi: f64, sinphi: f64) -> f64 {
    let con = e * sinphi;
    let com = e / 2.0;
    let con = ((1.0 - con) / (1.0 + con)).powf(com);
    (0.5 * (HALF_PI - phi)).tan() / con
}

/// Recover latitude from small-t by fixed-point iteration.
///
/// Runs at most 16 iterations and converges when the angular correction
/// drops below [`EPSLN`]; non-convergence is an error rather than a NaN.
pub(crate) fn phi2z(e: f64, ts: f64) -> Result<f64, ProjectionError> {
    let eccnth = e / 2.0;
    let mut phi = HALF_PI - 2.0 * ts.atan();
    for _ in 0..16 {
        let con = e * phi.sin();
        let dphi =
            HALF_PI - 2.0 * (ts * ((1.0 - con) / (1.0 + con)).powf(eccnth)).atan() - phi;
        phi += dphi;
        if dphi.abs() <= EPSLN {
            return Ok(phi);
        }
    }
    tracing::warn!(target: "carta_geo::projection", ts, "latitude recovery did not converge");
    Err(ProjectionError::NotConvergent)
}
