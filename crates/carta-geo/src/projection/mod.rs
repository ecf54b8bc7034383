//! Map projections for Carta.
//!
//! A [`Projection`] is an immutable transform pair selected once per model
//! and cached on its extent: `forward` maps geographic `[lon, lat]` degrees
//! into the projected plane, `inverse` maps back. The supported families:
//!
//! - **Geographic**: lon/lat spatial references; forward and inverse are
//!   pass-throughs.
//! - **Lambert Conformal Conic**: `EPSG:42101` and `EPSG:42304`.
//! - **Polar Stereographic**: `EPSG:3995` (Arctic) and `EPSG:3031`
//!   (Antarctic).
//! - **Scene**: bilinear interpolation between four supplied corner
//!   coordinates; built with [`Projection::scene`] rather than from a code.
//! - **Pixel**: raw image space; the transforms are explicitly
//!   unsupported.
//!
//! All angle parameters are degrees at the API surface and radians
//! internally; longitudes normalize into `(-180°, 180°]`.

mod lcc;
mod math;
mod scene;
mod stereo;

pub use lcc::{LambertConformalConic, LccParams};
pub use scene::SceneCorners;
pub use stereo::PolarStereographic;

use math::{WGS84_MAJOR, WGS84_MINOR};

/// Errors produced by projection construction and transforms.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    /// The spatial reference identifier names no known projection.
    #[error("unknown spatial reference system '{0}'")]
    UnknownSrs(String),

    /// Equal and opposite standard parallels describe a degenerate cone.
    #[error("degenerate standard parallels {lat1}, {lat2}")]
    DegenerateParallels { lat1: f64, lat2: f64 },

    /// Input outside [-90, 90] x [-180, 180].
    #[error("coordinate ({lon}, {lat}) outside the valid geographic range")]
    OutOfRange { lon: f64, lat: f64 },

    /// An iterative inversion failed to converge.
    #[error("iterative latitude recovery did not converge")]
    NotConvergent,

    /// The projection does not define this transform.
    #[error("unsupported projection operation: {0}")]
    Unsupported(&'static str),
}

/// Measurement units of a projected plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Units {
    /// Geographic degrees.
    Degrees,
    /// Linear meters.
    Meters,
    /// Non-geodetic image/scene units.
    Pixels,
}

/// A named coordinate-transform strategy.
#[derive(Clone, Debug)]
pub enum Projection {
    /// Pass-through for geographic lon/lat references.
    Geographic,
    /// Lambert Conformal Conic.
    LambertConformalConic(LambertConformalConic),
    /// Polar Stereographic, north or south aspect.
    PolarStereographic(PolarStereographic),
    /// Corner-interpolated scene space.
    Scene(SceneCorners),
    /// Raw pixel space; transforms are unsupported.
    Pixel,
}

impl Projection {
    /// Resolve a spatial-reference identifier to a projection.
    ///
    /// Scene projections carry per-instance corner data and are built with
    /// [`Projection::scene`] instead.
    pub fn for_srs(srs: &str) -> Result<Self, ProjectionError> {
        match srs.to_ascii_uppercase().as_str() {
            "EPSG:4326" | "CRS:84" | "WGS84" => Ok(Self::Geographic),
            "EPSG:42101" => Ok(Self::LambertConformalConic(LambertConformalConic::new(
                LccParams {
                    major_axis: WGS84_MAJOR,
                    minor_axis: WGS84_MINOR,
                    lat1: 49.0,
                    lat2: 77.0,
                    center_lon: -95.0,
                    center_lat: 0.0,
                    false_easting: 0.0,
                    false_northing: -8_000_000.0,
                },
            )?)),
            "EPSG:42304" => Ok(Self::LambertConformalConic(LambertConformalConic::new(
                LccParams {
                    major_axis: WGS84_MAJOR,
                    minor_axis: WGS84_MINOR,
                    lat1: 49.0,
                    lat2: 77.0,
                    center_lon: -95.0,
                    center_lat: 49.0,
                    false_easting: 0.0,
                    false_northing: 0.0,
                },
            )?)),
            "EPSG:3995" => Ok(Self::PolarStereographic(PolarStereographic::new(
                WGS84_MAJOR,
                WGS84_MINOR,
                71.0,
                0.0,
                0.0,
                0.0,
            )?)),
            "EPSG:3031" => Ok(Self::PolarStereographic(PolarStereographic::new(
                WGS84_MAJOR,
                WGS84_MINOR,
                -71.0,
                0.0,
                0.0,
                0.0,
            )?)),
            "PIXEL" => Ok(Self::Pixel),
            other => Err(ProjectionError::UnknownSrs(other.to_string())),
        }
    }

    /// Build a scene projection from its four corner coordinates.
    pub fn scene(corners: SceneCorners) -> Self {
        Self::Scene(corners)
    }

    /// Geographic `[lon, lat]` to projected coordinates.
    pub fn forward(&self, lonlat: [f64; 2]) -> Result<[f64; 2], ProjectionError> {
        match self {
            Self::Geographic => Ok(lonlat),
            Self::LambertConformalConic(p) => p.forward(lonlat),
            Self::PolarStereographic(p) => p.forward(lonlat),
            Self::Scene(s) => s.forward(lonlat),
            Self::Pixel => Err(ProjectionError::Unsupported("pixel-space forward")),
        }
    }

    /// Projected coordinates to geographic `[lon, lat]`.
    pub fn inverse(&self, xy: [f64; 2]) -> Result<[f64; 2], ProjectionError> {
        match self {
            Self::Geographic => Ok(xy),
            Self::LambertConformalConic(p) => p.inverse(xy),
            Self::PolarStereographic(p) => p.inverse(xy),
            Self::Scene(s) => s.inverse(xy),
            Self::Pixel => Err(ProjectionError::Unsupported("pixel-space inverse")),
        }
    }

    /// Units of the projected plane.
    pub fn units(&self) -> Units {
        match self {
            Self::Geographic => Units::Degrees,
            Self::LambertConformalConic(_) | Self::PolarStereographic(_) => Units::Meters,
            Self::Scene(_) | Self::Pixel => Units::Pixels,
        }
    }

    /// Human-readable projection title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Geographic => "Geographic coordinates (no projection)",
            Self::LambertConformalConic(_) => "Lambert Conformal Conic",
            Self::PolarStereographic(_) => "Polar Stereographic",
            Self::Scene(_) => "Scene interpolation",
            Self::Pixel => "Raw pixel space",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geographic_is_identity() {
        let p = Projection::for_srs("EPSG:4326").unwrap();
        assert_eq!(p.forward([-95.0, 49.0]).unwrap(), [-95.0, 49.0]);
        assert_eq!(p.inverse([12.5, -7.25]).unwrap(), [12.5, -7.25]);
        assert_eq!(p.units(), Units::Degrees);
    }

    #[test]
    fn test_srs_lookup_is_case_insensitive() {
        assert!(Projection::for_srs("epsg:42101").is_ok());
        assert!(Projection::for_srs("crs:84").is_ok());
    }

    #[test]
    fn test_unknown_srs() {
        assert!(matches!(
            Projection::for_srs("EPSG:999999"),
            Err(ProjectionError::UnknownSrs(_))
        ));
    }

    #[test]
    fn test_pixel_transforms_are_unsupported() {
        let p = Projection::for_srs("PIXEL").unwrap();
        assert!(matches!(
            p.forward([1.0, 1.0]),
            Err(ProjectionError::Unsupported(_))
        ));
        assert!(matches!(
            p.inverse([1.0, 1.0]),
            Err(ProjectionError::Unsupported(_))
        ));
    }

    #[test]
    fn test_projected_units_are_meters() {
        assert_eq!(
            Projection::for_srs("EPSG:42101").unwrap().units(),
            Units::Meters
        );
        assert_eq!(
            Projection::for_srs("EPSG:3031").unwrap().units(),
            Units::Meters
        );
    }
}
