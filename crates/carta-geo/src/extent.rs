//! The geographic viewport bound to a map model.
//!
//! An [`Extent`] maintains the mapping between on-screen pixel/line
//! coordinates (origin at the viewport's top-left, y increasing downward)
//! and projection coordinates (y increasing upward), and tracks the
//! resolution and map scale of the view.
//!
//! Exactly one of {resolution, pixel size} is the independent variable in
//! any operation; the other is always re-derived so the two stay
//! consistent with the geographic window.

use crate::bounds::Bounds;
use crate::projection::{Projection, Units};

/// Fixed display density used for map-scale conversion.
const PIXELS_PER_INCH: f64 = 72.0;

/// Meters per inch.
const METERS_PER_INCH: f64 = 0.0254;

/// Approximate ground meters per degree on a 6,378,137-radius sphere.
const DEGREES_TO_METERS: f64 = std::f64::consts::TAU * 6_378_137.0 / 360.0;

/// The rectangular viewport of one model, with pixel ↔ projection state.
#[derive(Clone, Debug)]
pub struct Extent {
    ul: [f64; 2],
    lr: [f64; 2],
    res: [f64; 2],
    size: [f64; 2],
    projection: Projection,
}

impl Extent {
    /// Create an extent for the given projection with empty geometry.
    ///
    /// Call [`init`](Self::init) before using the conversions.
    pub fn new(projection: Projection) -> Self {
        Self {
            ul: [0.0, 0.0],
            lr: [0.0, 0.0],
            res: [1.0, 1.0],
            size: [0.0, 0.0],
            projection,
        }
    }

    /// Initialize from a model's bounding box.
    ///
    /// With an explicit `resolution` the geographic window is authoritative
    /// and the pixel size is derived ([`set_size`](Self::set_size));
    /// otherwise the supplied `window` pixel dimensions are authoritative
    /// and the resolution is derived ([`set_resolution`](Self::set_resolution)).
    pub fn init(&mut self, bounds: Bounds, window: [f64; 2], resolution: Option<f64>) {
        self.ul = bounds.upper_left();
        self.lr = bounds.lower_right();
        match resolution {
            Some(res) => self.set_size(res),
            None => self.set_resolution(window),
        }
    }

    /// The projection this extent was created with.
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Current geographic window.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.ul[0], self.lr[1], self.lr[0], self.ul[1])
    }

    /// Per-axis resolution, projection units per pixel.
    pub fn resolution(&self) -> [f64; 2] {
        self.res
    }

    /// Viewport pixel dimensions.
    pub fn size(&self) -> [f64; 2] {
        self.size
    }

    /// Center of the geographic window.
    pub fn get_center(&self) -> [f64; 2] {
        [
            (self.ul[0] + self.lr[0]) / 2.0,
            (self.ul[1] + self.lr[1]) / 2.0,
        ]
    }

    /// Convert a pixel/line position to projection coordinates.
    pub fn to_projection(&self, pl: [f64; 2]) -> [f64; 2] {
        [
            self.ul[0] + pl[0] * self.res[0],
            self.ul[1] - pl[1] * self.res[1],
        ]
    }

    /// Convert projection coordinates to a pixel/line position.
    ///
    /// The exact inverse of [`to_projection`](Self::to_projection) up to
    /// floor quantization.
    pub fn to_pixel(&self, xy: [f64; 2]) -> [i64; 2] {
        [
            ((xy[0] - self.ul[0]) / self.res[0]).floor() as i64,
            ((self.ul[1] - xy[1]) / self.res[1]).floor() as i64,
        ]
    }

    /// Re-center the window at `center` with the given resolution, holding
    /// the pixel dimensions fixed.
    ///
    /// When `limit` is supplied, the window is translated (never resized)
    /// so it lies within the limit where possible. Returns the new window.
    pub fn center_at(&mut self, center: [f64; 2], resolution: f64, limit: Option<Bounds>) -> Bounds {
        let half_w = self.size[0] * resolution / 2.0;
        let half_h = self.size[1] * resolution / 2.0;
        let mut window = Bounds::new(
            center[0] - half_w,
            center[1] - half_h,
            center[0] + half_w,
            center[1] + half_h,
        );

        if let Some(limit) = limit {
            let mut dx = 0.0;
            if window.max_x > limit.max_x {
                dx = limit.max_x - window.max_x;
            }
            if window.min_x + dx < limit.min_x {
                dx = limit.min_x - window.min_x;
            }
            let mut dy = 0.0;
            if window.max_y > limit.max_y {
                dy = limit.max_y - window.max_y;
            }
            if window.min_y + dy < limit.min_y {
                dy = limit.min_y - window.min_y;
            }
            window = window.translated(dx, dy);
        }

        self.ul = window.upper_left();
        self.lr = window.lower_right();
        self.res = [resolution, resolution];
        window
    }

    /// Zoom so the given box is fully visible.
    ///
    /// Uses the larger of the two axis-wise resolutions needed to fit the
    /// box, so the viewport aspect ratio is preserved and one axis may show
    /// more than requested.
    pub fn zoom_to_box(&mut self, ul: [f64; 2], lr: [f64; 2]) -> Bounds {
        let res_x = (lr[0] - ul[0]) / self.size[0];
        let res_y = (ul[1] - lr[1]) / self.size[1];
        let resolution = res_x.max(res_y);
        let center = [(ul[0] + lr[0]) / 2.0, (ul[1] + lr[1]) / 2.0];
        self.center_at(center, resolution, None)
    }

    /// Make `resolution` primary and derive the pixel dimensions from the
    /// fixed geographic window.
    pub fn set_size(&mut self, resolution: f64) {
        self.res = [resolution, resolution];
        self.size = [
            (self.lr[0] - self.ul[0]) / resolution,
            (self.ul[1] - self.lr[1]) / resolution,
        ];
    }

    /// Make the pixel dimensions primary and derive the per-axis resolution
    /// from the fixed geographic window.
    pub fn set_resolution(&mut self, size: [f64; 2]) {
        self.size = size;
        self.res = [
            (self.lr[0] - self.ul[0]) / size[0],
            (self.ul[1] - self.lr[1]) / size[1],
        ];
    }

    /// Current map-scale denominator.
    ///
    /// Degree-based references are converted to approximate linear ground
    /// distance on a 6,378,137-radius sphere; all other references are
    /// treated as already linear in meters.
    pub fn get_scale(&self) -> f64 {
        let res_m = match self.projection.units() {
            Units::Degrees => self.res[0] * DEGREES_TO_METERS,
            Units::Meters | Units::Pixels => self.res[0],
        };
        res_m * PIXELS_PER_INCH / METERS_PER_INCH
    }

    /// Re-center at the current center with the resolution derived from a
    /// map-scale denominator. The inverse of [`get_scale`](Self::get_scale).
    pub fn set_scale(&mut self, scale: f64) -> Bounds {
        let mut resolution = scale * METERS_PER_INCH / PIXELS_PER_INCH;
        if self.projection.units() == Units::Degrees {
            resolution /= DEGREES_TO_METERS;
        }
        self.center_at(self.get_center(), resolution, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::Projection;

    fn world_extent() -> Extent {
        let mut e = Extent::new(Projection::for_srs("EPSG:4326").unwrap());
        e.init(Bounds::new(-180.0, -90.0, 180.0, 90.0), [720.0, 360.0], None);
        e
    }

    #[test]
    fn test_pixel_projection_round_trip() {
        let e = world_extent();
        for p in [[0.0, 0.0], [1.0, 1.0], [359.0, 120.0], [719.0, 359.0]] {
            let xy = e.to_projection(p);
            let back = e.to_pixel(xy);
            assert!((back[0] - p[0] as i64).abs() <= 1, "{p:?} -> {back:?}");
            assert!((back[1] - p[1] as i64).abs() <= 1, "{p:?} -> {back:?}");
        }
    }

    #[test]
    fn test_center_at_idempotence() {
        let mut e = world_extent();
        e.center_at([10.0, 20.0], 0.25, None);
        let c = e.get_center();
        assert!((c[0] - 10.0).abs() < 1e-9);
        assert!((c[1] - 20.0).abs() < 1e-9);
        assert_eq!(e.resolution(), [0.25, 0.25]);
        // Pixel dimensions were held fixed.
        assert_eq!(e.size(), [720.0, 360.0]);
    }

    #[test]
    fn test_center_at_clamps_by_translation() {
        let mut e = world_extent();
        e.center_at([0.0, 0.0], 0.1, None);
        let limit = Bounds::new(-180.0, -90.0, 180.0, 90.0);
        // Window is 72 x 36 units; pushing the center to the corner must
        // slide the window back inside without resizing it.
        let w = e.center_at([179.0, 89.0], 0.1, Some(limit));
        assert!((w.max_x - 180.0).abs() < 1e-9);
        assert!((w.max_y - 90.0).abs() < 1e-9);
        assert!((w.width() - 72.0).abs() < 1e-9);
        assert!((w.height() - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_to_box_preserves_aspect() {
        let mut e = world_extent();
        // A box much wider than tall: x resolution dominates.
        let w = e.zoom_to_box([-100.0, 10.0], [100.0, 0.0]);
        let res = e.resolution();
        assert!((res[0] - 200.0 / 720.0).abs() < 1e-12);
        assert_eq!(res[0], res[1]);
        // The requested box is contained in the result.
        assert!(w.min_x <= -100.0 && w.max_x >= 100.0);
        assert!(w.min_y <= 0.0 && w.max_y >= 10.0);
    }

    #[test]
    fn test_scale_inverse_law_degrees() {
        let mut e = world_extent();
        e.center_at([0.0, 0.0], 0.5, None);
        let scale = e.get_scale();
        e.center_at([0.0, 0.0], 123.0, None);
        e.set_scale(scale);
        assert!((e.resolution()[0] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_scale_inverse_law_meters() {
        let mut e = Extent::new(Projection::for_srs("EPSG:42101").unwrap());
        e.init(
            Bounds::new(-2_000_000.0, -1_000_000.0, 2_000_000.0, 1_000_000.0),
            [800.0, 400.0],
            None,
        );
        let r0 = e.resolution()[0];
        let scale = e.get_scale();
        e.set_scale(scale * 2.0);
        e.set_scale(scale);
        assert!((e.resolution()[0] - r0).abs() < 1e-6);
    }

    #[test]
    fn test_init_with_explicit_resolution() {
        let mut e = Extent::new(Projection::for_srs("EPSG:4326").unwrap());
        e.init(
            Bounds::new(-180.0, -90.0, 180.0, 90.0),
            [100.0, 100.0],
            Some(1.0),
        );
        // Geographic window is authoritative: pixel size is derived.
        assert_eq!(e.size(), [360.0, 180.0]);
        assert_eq!(e.resolution(), [1.0, 1.0]);
    }

    #[test]
    fn test_resolution_size_consistency() {
        let mut e = world_extent();
        assert_eq!(e.resolution(), [0.5, 0.5]);
        e.set_size(0.25);
        assert_eq!(e.size(), [1440.0, 720.0]);
        e.set_resolution([720.0, 360.0]);
        assert_eq!(e.resolution(), [0.5, 0.5]);
    }
}
