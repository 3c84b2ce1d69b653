//! Affine georeferencing for raster grids.
//!
//! Maps (row, col) cell indices to planar (easting, northing) coordinates in
//! the grid's projected CRS. The transform is the single source of truth for
//! cell-to-coordinate conversion; every consumer derives coordinates from it
//! rather than carrying its own notion of cell size or origin.

use serde::{Deserialize, Serialize};

/// Affine transform in GDAL coefficient order.
///
/// For a cell at (row, col), the planar coordinate is
///
/// ```text
/// easting  = origin_x + col * pixel_width  + row * row_rotation
/// northing = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// For north-up rasters `pixel_height` is negative and both rotation terms
/// are zero. Coordinates produced by [`GeoTransform::cell_center`] refer to
/// the center of the cell, not its corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// Easting of the top-left corner of the top-left cell
    pub origin_x: f64,
    /// Cell width in planar units
    pub pixel_width: f64,
    /// Row rotation term (zero for north-up rasters)
    pub row_rotation: f64,
    /// Northing of the top-left corner of the top-left cell
    pub origin_y: f64,
    /// Column rotation term (zero for north-up rasters)
    pub col_rotation: f64,
    /// Cell height in planar units (negative for north-up rasters)
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Create a transform from the six GDAL coefficients.
    pub fn new(
        origin_x: f64,
        pixel_width: f64,
        row_rotation: f64,
        origin_y: f64,
        col_rotation: f64,
        pixel_height: f64,
    ) -> Self {
        Self {
            origin_x,
            pixel_width,
            row_rotation,
            origin_y,
            col_rotation,
            pixel_height,
        }
    }

    /// Axis-aligned transform for a north-up raster.
    ///
    /// `origin_x`/`origin_y` locate the top-left corner; `pixel_height`
    /// should be negative so rows advance southward.
    pub fn from_origin(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self::new(origin_x, pixel_width, 0.0, origin_y, 0.0, pixel_height)
    }

    /// Planar coordinate of the center of cell (row, col).
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        let cf = col as f64 + 0.5;
        let rf = row as f64 + 0.5;
        let easting = self.origin_x + cf * self.pixel_width + rf * self.row_rotation;
        let northing = self.origin_y + cf * self.col_rotation + rf * self.pixel_height;
        (easting, northing)
    }

    /// Determinant of the 2x2 linear part.
    pub fn determinant(&self) -> f64 {
        self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation
    }

    /// Fractional (row, col) containing the planar coordinate, or `None`
    /// when the transform is degenerate.
    ///
    /// The integer parts of the returned pair identify the containing cell;
    /// callers are responsible for bounds checks against grid dimensions.
    pub fn fractional_cell(&self, easting: f64, northing: f64) -> Option<(f64, f64)> {
        let det = self.determinant();
        if det == 0.0 {
            return None;
        }
        let dx = easting - self.origin_x;
        let dy = northing - self.origin_y;
        let col = (dx * self.pixel_height - dy * self.row_rotation) / det;
        let row = (dy * self.pixel_width - dx * self.col_rotation) / det;
        Some((row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cell_center_north_up() {
        // 10 m cells, origin at (1000, 2000), north-up
        let gt = GeoTransform::from_origin(1000.0, 2000.0, 10.0, -10.0);

        let (x, y) = gt.cell_center(0, 0);
        assert_relative_eq!(x, 1005.0);
        assert_relative_eq!(y, 1995.0);

        let (x, y) = gt.cell_center(3, 7);
        assert_relative_eq!(x, 1075.0);
        assert_relative_eq!(y, 1965.0);
    }

    #[test]
    fn test_fractional_cell_round_trip() {
        let gt = GeoTransform::from_origin(500.0, 800.0, 5.0, -5.0);

        let (x, y) = gt.cell_center(4, 9);
        let (row, col) = gt.fractional_cell(x, y).unwrap();
        assert_relative_eq!(row, 4.5);
        assert_relative_eq!(col, 9.5);
    }

    #[test]
    fn test_fractional_cell_with_rotation() {
        let gt = GeoTransform::new(0.0, 2.0, 0.5, 0.0, 0.25, -2.0);

        let (x, y) = gt.cell_center(2, 3);
        let (row, col) = gt.fractional_cell(x, y).unwrap();
        assert_relative_eq!(row, 2.5, epsilon = 1e-12);
        assert_relative_eq!(col, 3.5, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_transform() {
        let gt = GeoTransform::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert!(gt.fractional_cell(10.0, 10.0).is_none());
    }
}
