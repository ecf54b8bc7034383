//! Corner-interpolated scene space.
//!
//! A scene is a non-geodetic image footprint described only by the
//! geographic coordinates of its four corners. Scene coordinates are
//! normalized: `[0, 0]` at the upper-left corner, `[1, 1]` at the
//! lower-right.

use super::math::EPSLN;
use super::ProjectionError;

/// The four geographic corner coordinates of a scene, each `[lon, lat]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneCorners {
    /// Upper-left corner.
    pub ul: [f64; 2],
    /// Upper-right corner.
    pub ur: [f64; 2],
    /// Lower-left corner.
    pub ll: [f64; 2],
    /// Lower-right corner.
    pub lr: [f64; 2],
}

impl SceneCorners {
    /// Bilinear interpolation at normalized scene position `[u, v]`.
    fn at(&self, u: f64, v: f64) -> [f64; 2] {
        let top = [
            (1.0 - u) * self.ul[0] + u * self.ur[0],
            (1.0 - u) * self.ul[1] + u * self.ur[1],
        ];
        let bottom = [
            (1.0 - u) * self.ll[0] + u * self.lr[0],
            (1.0 - u) * self.ll[1] + u * self.lr[1],
        ];
        [
            (1.0 - v) * top[0] + v * bottom[0],
            (1.0 - v) * top[1] + v * bottom[1],
        ]
    }

    /// Partial derivatives of the bilinear surface at `[u, v]`.
    fn jacobian(&self, u: f64, v: f64) -> [[f64; 2]; 2] {
        let d_du = [
            (1.0 - v) * (self.ur[0] - self.ul[0]) + v * (self.lr[0] - self.ll[0]),
            (1.0 - v) * (self.ur[1] - self.ul[1]) + v * (self.lr[1] - self.ll[1]),
        ];
        let d_dv = [
            (1.0 - u) * (self.ll[0] - self.ul[0]) + u * (self.lr[0] - self.ur[0]),
            (1.0 - u) * (self.ll[1] - self.ul[1]) + u * (self.lr[1] - self.ur[1]),
        ];
        [d_du, d_dv]
    }

    /// Scene `[u, v]` to geographic `[lon, lat]`: direct bilinear blend.
    pub fn inverse(&self, uv: [f64; 2]) -> Result<[f64; 2], ProjectionError> {
        Ok(self.at(uv[0], uv[1]))
    }

    /// Geographic `[lon, lat]` to scene `[u, v]`.
    ///
    /// The bilinear surface has no closed-form inverse in general, so this
    /// runs a bounded Newton iteration starting from the scene center.
    pub fn forward(&self, lonlat: [f64; 2]) -> Result<[f64; 2], ProjectionError> {
        let mut u = 0.5;
        let mut v = 0.5;
        for _ in 0..16 {
            let p = self.at(u, v);
            let rx = p[0] - lonlat[0];
            let ry = p[1] - lonlat[1];
            if rx.abs() <= EPSLN && ry.abs() <= EPSLN {
                return Ok([u, v]);
            }
            let [du, dv] = self.jacobian(u, v);
            let det = du[0] * dv[1] - dv[0] * du[1];
            if det.abs() < EPSLN {
                return Err(ProjectionError::NotConvergent);
            }
            u -= (rx * dv[1] - ry * dv[0]) / det;
            v -= (ry * du[0] - rx * du[1]) / det;
        }
        Err(ProjectionError::NotConvergent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tilted() -> SceneCorners {
        // A slightly sheared footprint, the common satellite-scene shape.
        SceneCorners {
            ul: [-100.0, 51.0],
            ur: [-95.0, 50.5],
            ll: [-99.5, 48.0],
            lr: [-94.5, 47.5],
        }
    }

    #[test]
    fn test_corners_map_to_unit_square() {
        let s = tilted();
        for (corner, uv) in [
            (s.ul, [0.0, 0.0]),
            (s.ur, [1.0, 0.0]),
            (s.ll, [0.0, 1.0]),
            (s.lr, [1.0, 1.0]),
        ] {
            let got = s.forward(corner).unwrap();
            assert!((got[0] - uv[0]).abs() < 1e-8, "{corner:?} -> {got:?}");
            assert!((got[1] - uv[1]).abs() < 1e-8, "{corner:?} -> {got:?}");
        }
    }

    #[test]
    fn test_forward_inverse_round_trip() {
        let s = tilted();
        for uv in [[0.25, 0.75], [0.5, 0.5], [0.9, 0.1]] {
            let geo = s.inverse(uv).unwrap();
            let back = s.forward(geo).unwrap();
            assert!((back[0] - uv[0]).abs() < 1e-8);
            assert!((back[1] - uv[1]).abs() < 1e-8);
        }
    }

    #[test]
    fn test_degenerate_footprint_fails() {
        // All corners collapsed: the Jacobian is singular everywhere.
        let s = SceneCorners {
            ul: [0.0, 0.0],
            ur: [0.0, 0.0],
            ll: [0.0, 0.0],
            lr: [0.0, 0.0],
        };
        assert!(matches!(
            s.forward([1.0, 1.0]),
            Err(ProjectionError::NotConvergent)
        ));
    }
}
