//! Lambert Conformal Conic projection.

use super::math::{adjust_lon, msfnz, phi2z, tsfnz, EPSLN};
use super::ProjectionError;

/// Construction parameters for a Lambert Conformal Conic projection.
///
/// All angles are degrees; axes and false offsets are meters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LccParams {
    /// Ellipsoid semi-major axis.
    pub major_axis: f64,
    /// Ellipsoid semi-minor axis.
    pub minor_axis: f64,
    /// First standard parallel.
    pub lat1: f64,
    /// Second standard parallel.
    pub lat2: f64,
    /// Central meridian.
    pub center_lon: f64,
    /// Latitude of origin.
    pub center_lat: f64,
    /// False easting.
    pub false_easting: f64,
    /// False northing.
    pub false_northing: f64,
}

/// A configured Lambert Conformal Conic transform.
///
/// Immutable after construction; the forward/inverse pair is stateless.
#[derive(Clone, Copy, Debug)]
pub struct LambertConformalConic {
    a: f64,
    e: f64,
    ns: f64,
    f0: f64,
    rh: f64,
    lon0: f64,
    x0: f64,
    y0: f64,
}

impl LambertConformalConic {
    /// Build the transform, precomputing the cone constants.
    ///
    /// Equal and opposite standard parallels describe a degenerate cone and
    /// are rejected at construction.
    pub fn new(p: LccParams) -> Result<Self, ProjectionError> {
        let lat1 = p.lat1.to_radians();
        let lat2 = p.lat2.to_radians();
        if (lat1 + lat2).abs() < EPSLN {
            return Err(ProjectionError::DegenerateParallels {
                lat1: p.lat1,
                lat2: p.lat2,
            });
        }

        let a = p.major_axis;
        let es = 1.0 - (p.minor_axis / p.major_axis).powi(2);
        let e = es.sqrt();

        let sin1 = lat1.sin();
        let cos1 = lat1.cos();
        let ms1 = msfnz(e, sin1, cos1);
        let ts1 = tsfnz(e, lat1, sin1);

        let sin2 = lat2.sin();
        let cos2 = lat2.cos();
        let ms2 = msfnz(e, sin2, cos2);
        let ts2 = tsfnz(e, lat2, sin2);

        let ns = if (lat1 - lat2).abs() > EPSLN {
            (ms1 / ms2).ln() / (ts1 / ts2).ln()
        } else {
            sin1
        };
        let f0 = ms1 / (ns * ts1.powf(ns));

        let lat0 = p.center_lat.to_radians();
        let ts0 = tsfnz(e, lat0, lat0.sin());
        let rh = a * f0 * ts0.powf(ns);

        Ok(Self {
            a,
            e,
            ns,
            f0,
            rh,
            lon0: p.center_lon.to_radians(),
            x0: p.false_easting,
            y0: p.false_northing,
        })
    }

    /// Geographic `[lon, lat]` degrees to projected `[x, y]` meters.
    pub fn forward(&self, lonlat: [f64; 2]) -> Result<[f64; 2], ProjectionError> {
        let (lon_deg, lat_deg) = (lonlat[0], lonlat[1]);
        if !(-90.0..=90.0).contains(&lat_deg) || !(-180.0..=180.0).contains(&lon_deg) {
            return Err(ProjectionError::OutOfRange {
                lon: lon_deg,
                lat: lat_deg,
            });
        }
        let lon = lon_deg.to_radians();
        let lat = lat_deg.to_radians();

        let ts = tsfnz(self.e, lat, lat.sin());
        let rh1 = self.a * self.f0 * ts.powf(self.ns);
        let theta = self.ns * adjust_lon(lon - self.lon0);
        Ok([
            rh1 * theta.sin() + self.x0,
            self.rh - rh1 * theta.cos() + self.y0,
        ])
    }

    /// Projected `[x, y]` meters to geographic `[lon, lat]` degrees.
    pub fn inverse(&self, xy: [f64; 2]) -> Result<[f64; 2], ProjectionError> {
        let x = xy[0] - self.x0;
        let y = self.rh - (xy[1] - self.y0);

        let (rh1, con) = if self.ns > 0.0 {
            ((x * x + y * y).sqrt(), 1.0)
        } else {
            (-(x * x + y * y).sqrt(), -1.0)
        };
        let theta = if rh1 != 0.0 {
            (con * x).atan2(con * y)
        } else {
            0.0
        };

        let lat = if rh1 != 0.0 || self.ns > 0.0 {
            let ts = (rh1 / (self.a * self.f0)).powf(1.0 / self.ns);
            phi2z(self.e, ts)?
        } else {
            -super::math::HALF_PI
        };
        let lon = adjust_lon(theta / self.ns + self.lon0);
        Ok([lon.to_degrees(), lat.to_degrees()])
    }
}
