//! Polar Stereographic projection.

use super::math::{adjust_lon, msfnz, phi2z, tsfnz};
use super::ProjectionError;

/// A configured polar stereographic transform (north or south aspect).
///
/// Shares the conformal-latitude helpers with the Lambert Conformal Conic.
#[derive(Clone, Copy, Debug)]
pub struct PolarStereographic {
    a: f64,
    e: f64,
    /// +1 for the north aspect, -1 for the south.
    con: f64,
    lon0: f64,
    x0: f64,
    y0: f64,
    /// msfnz at the standard parallel.
    mf: f64,
    /// tsfnz at the standard parallel.
    tsf: f64,
}

impl PolarStereographic {
    /// Build the transform.
    ///
    /// `lat_ts` is the standard parallel in degrees; its sign selects the
    /// aspect. Parallels at the pole itself are not supported by this
    /// parameterization.
    pub fn new(
        major_axis: f64,
        minor_axis: f64,
        lat_ts: f64,
        center_lon: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Result<Self, ProjectionError> {
        if lat_ts.abs() >= 90.0 {
            return Err(ProjectionError::Unsupported(
                "polar stereographic standard parallel at the pole",
            ));
        }
        let es = 1.0 - (minor_axis / major_axis).powi(2);
        let e = es.sqrt();
        let ts_abs = lat_ts.abs().to_radians();
        Ok(Self {
            a: major_axis,
            e,
            con: if lat_ts >= 0.0 { 1.0 } else { -1.0 },
            lon0: center_lon.to_radians(),
            x0: false_easting,
            y0: false_northing,
            mf: msfnz(e, ts_abs.sin(), ts_abs.cos()),
            tsf: tsfnz(e, ts_abs, ts_abs.sin()),
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
        let lat = self.con * lat_deg.to_radians();
        let delta = adjust_lon(lon_deg.to_radians() - self.lon0);

        let ts = tsfnz(self.e, lat, lat.sin());
        let rho = self.a * self.mf * ts / self.tsf;
        Ok([
            self.x0 + rho * delta.sin(),
            self.y0 - self.con * rho * delta.cos(),
        ])
    }

    /// Projected `[x, y]` meters to geographic `[lon, lat]` degrees.
    pub fn inverse(&self, xy: [f64; 2]) -> Result<[f64; 2], ProjectionError> {
        let dx = xy[0] - self.x0;
        let dy = xy[1] - self.y0;
        let rho = (dx * dx + dy * dy).sqrt();

        let ts = rho * self.tsf / (self.a * self.mf);
        let lat = self.con * phi2z(self.e, ts)?;
        let lon = if rho == 0.0 {
            self.lon0
        } else {
            adjust_lon(self.lon0 + dx.atan2(-self.con * dy))
        };
        Ok([lon.to_degrees(), lat.to_degrees()])
    }
}
