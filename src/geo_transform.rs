use geo_types::{coord, Coord};

use crate::errors::{Result, SkopeError};

/// Pixel-to-world coefficients in GDAL order: `[x0, dx, rx, y0, ry, dy]`.
///
/// Column `c`, row `r` maps to `(x0 + c*dx + r*rx, y0 + c*ry + r*dy)`, so `(x0, y0)`
/// is the outer corner of the first pixel. skope grids store longitude in x and
/// latitude in y, and require `dy < 0`.
///
/// ```
/// use skope::{GeoTransform, GeoTransformEx};
///
/// let gt: GeoTransform = [-123.0, 1.0, 0.0, 45.0, 0.0, -2.0];
/// assert_eq!(gt.apply(2.0, 3.0), (-121.0, 39.0));
/// assert!(gt.is_north_up());
/// ```
pub type GeoTransform = [f64; 6];

/// Extension methods on [`GeoTransform`]
pub trait GeoTransformEx {
    /// Apply GeoTransform to x/y coordinate.
    fn apply(&self, pixel: f64, line: f64) -> (f64, f64);

    /// Invert a [`GeoTransform`].
    ///
    /// Fails with [`SkopeError::BadArgument`] when the transform is degenerate.
    fn invert(&self) -> Result<GeoTransform>;

    /// `true` when the row axis points south, i.e. the pixel height is negative.
    fn is_north_up(&self) -> bool;
}

impl GeoTransformEx for GeoTransform {
    fn apply(&self, pixel: f64, line: f64) -> (f64, f64) {
        (
            self[0] + pixel * self[1] + line * self[2],
            self[3] + pixel * self[4] + line * self[5],
        )
    }

    fn invert(&self) -> Result<GeoTransform> {
        // Without rotation the inverse is exact, so keep it free of the determinant.
        if self[2] == 0.0 && self[4] == 0.0 && self[1] != 0.0 && self[5] != 0.0 {
            return Ok([
                -self[0] / self[1],
                1.0 / self[1],
                0.0,
                -self[3] / self[5],
                0.0,
                1.0 / self[5],
            ]);
        }

        let det = self[1] * self[5] - self[2] * self[4];
        let magnitude = self[1]
            .abs()
            .max(self[2].abs())
            .max(self[4].abs().max(self[5].abs()));
        if det.abs() <= 1e-10 * magnitude * magnitude {
            return Err(SkopeError::BadArgument(
                "Geo transform is uninvertible".to_string(),
            ));
        }

        let inv_det = 1.0 / det;
        Ok([
            (self[2] * self[3] - self[0] * self[5]) * inv_det,
            self[5] * inv_det,
            -self[2] * inv_det,
            (-self[1] * self[3] + self[0] * self[4]) * inv_det,
            -self[4] * inv_det,
            self[1] * inv_det,
        ])
    }

    fn is_north_up(&self) -> bool {
        self[5] < 0.0
    }
}

/// The 3x3 matrix form of a [`GeoTransform`], with the bottom row `| 0 0 1 |` implied.
///
/// Coefficients are named after the matrix layout described on [`GeoTransform`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Affine { a, b, c, d, e, f }
    }

    pub fn from_gdal(gt: &GeoTransform) -> Self {
        Affine::new(gt[1], gt[2], gt[0], gt[4], gt[5], gt[3])
    }

    pub fn to_gdal(&self) -> GeoTransform {
        [self.c, self.a, self.b, self.f, self.d, self.e]
    }

    /// Maps `(x, y)` through the matrix.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        self.to_gdal().apply(x, y)
    }

    pub fn apply_coord(&self, coord: Coord<f64>) -> Coord<f64> {
        let (x, y) = self.apply(coord.x, coord.y);
        coord! { x: x, y: y }
    }

    pub fn inverse(&self) -> Result<Affine> {
        Ok(Affine::from_gdal(&self.to_gdal().invert()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NORTH_UP: GeoTransform = [-123.0, 1.0, 0.0, 45.0, 0.0, -2.0];

    #[test]
    fn apply_origin_is_northwest_corner() {
        assert_eq!(NORTH_UP.apply(0.0, 0.0), (-123.0, 45.0));
        assert_eq!(NORTH_UP.apply(5.0, 4.0), (-118.0, 37.0));
    }

    #[test]
    fn invert_north_up_is_exact() {
        let inverse = NORTH_UP.invert().unwrap();
        assert_eq!(inverse.apply(-123.0, 45.0), (0.0, 0.0));
        assert_eq!(inverse.apply(-118.0, 37.0), (5.0, 4.0));
    }

    #[test]
    fn invert_round_trips_rotated_transform() {
        let gt: GeoTransform = [10.0, 2.0, 0.5, 20.0, 0.25, -3.0];
        let inverse = gt.invert().unwrap();
        for &(p, l) in &[(0.0, 0.0), (1.5, 2.5), (7.0, -3.0)] {
            let (x, y) = gt.apply(p, l);
            let (p2, l2) = inverse.apply(x, y);
            assert!((p - p2).abs() < 1e-9, "{p} != {p2}");
            assert!((l - l2).abs() < 1e-9, "{l} != {l2}");
        }
    }

    #[test]
    fn invert_rejects_degenerate_transform() {
        let gt: GeoTransform = [0.0, 1.0, 2.0, 0.0, 2.0, 4.0];
        assert!(matches!(gt.invert(), Err(SkopeError::BadArgument(_))));
    }

    #[test]
    fn north_up_requires_negative_pixel_height() {
        assert!(NORTH_UP.is_north_up());
        assert!(![0.0, 1.0, 0.0, 0.0, 0.0, 1.0].is_north_up());
        assert!(![0.0, 1.0, 0.0, 0.0, 0.0, 0.0].is_north_up());
    }

    #[test]
    fn affine_matches_gdal_ordering() {
        let affine = Affine::from_gdal(&NORTH_UP);
        assert_eq!(affine, Affine::new(1.0, 0.0, -123.0, 0.0, -2.0, 45.0));
        assert_eq!(affine.to_gdal(), NORTH_UP);
        assert_eq!(
            affine.apply_coord(coord! { x: 2.0, y: 3.0 }),
            coord! { x: -121.0, y: 39.0 }
        );
        let inverse = affine.inverse().unwrap();
        assert_eq!(inverse.apply(-121.0, 39.0), (2.0, 3.0));
    }
}
