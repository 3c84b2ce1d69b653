//! Terrain elevation grid and its coordinate geometry.
//!
//! A [`TerrainGrid`] holds one elevation sample per cell plus the affine
//! transform that places each cell in a projected CRS. Elevation lookups use
//! nearest-cell semantics (no interpolation), matching how trigger elevations
//! are sampled from a DEM.

use serde::{Deserialize, Serialize};

use super::geotransform::GeoTransform;
use crate::error::{Result, RunoutError};

/// Abstract raster input: anything that can supply dimensions, an affine
/// transform, a no-data sentinel and a row-major elevation buffer.
///
/// Concrete raster formats live outside the core; the CLI's ASCII grid
/// reader is one implementor. Readers are expected to have materialized
/// their data before handing it over, so the accessors are infallible.
pub trait RasterSource {
    /// Number of columns.
    fn width(&self) -> usize;
    /// Number of rows.
    fn height(&self) -> usize;
    /// No-data sentinel, if the source defines one.
    fn nodata(&self) -> Option<f64>;
    /// Affine cell-to-coordinate transform.
    fn geotransform(&self) -> GeoTransform;
    /// CRS identifier of the planar coordinates, e.g. `"EPSG:3857"`.
    fn crs(&self) -> &str;
    /// Row-major elevation values, top row first.
    fn read_elevations(&self) -> Vec<f64>;
}

/// Rectangular elevation grid, immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainGrid {
    width: usize,
    height: usize,
    /// Row-major order: `[row * width + col]`
    elevations: Vec<f64>,
    nodata: Option<f64>,
    transform: GeoTransform,
    crs: String,
}

impl TerrainGrid {
    /// Create a grid from a row-major elevation buffer.
    ///
    /// # Errors
    /// Returns an error when either dimension is zero, the buffer length
    /// does not equal `width * height`, or the transform is degenerate.
    pub fn new(
        width: usize,
        height: usize,
        elevations: Vec<f64>,
        nodata: Option<f64>,
        transform: GeoTransform,
        crs: impl Into<String>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RunoutError::EmptyGrid);
        }
        if elevations.len() != width * height {
            return Err(RunoutError::BufferSizeMismatch {
                expected: width * height,
                actual: elevations.len(),
            });
        }
        if transform.determinant() == 0.0 {
            return Err(RunoutError::NonInvertibleTransform);
        }
        Ok(Self {
            width,
            height,
            elevations,
            nodata,
            transform,
            crs: crs.into(),
        })
    }

    /// Build a grid by draining a raster source.
    ///
    /// # Errors
    /// Same conditions as [`TerrainGrid::new`].
    pub fn from_source<S: RasterSource>(source: &S) -> Result<Self> {
        Self::new(
            source.width(),
            source.height(),
            source.read_elevations(),
            source.nodata(),
            source.geotransform(),
            source.crs(),
        )
    }

    /// Flat synthetic terrain at a constant elevation, for tests and demos.
    /// Origin at (0, 0), north-up.
    pub fn flat(width: usize, height: usize, cell_size: f64, elevation: f64) -> Self {
        Self {
            width,
            height,
            elevations: vec![elevation; width * height],
            nodata: None,
            transform: GeoTransform::from_origin(
                0.0,
                height as f64 * cell_size,
                cell_size,
                -cell_size,
            ),
            crs: "local".to_string(),
        }
    }

    /// Synthetic terrain with a single Gaussian peak at the grid center.
    pub fn single_peak(
        width: usize,
        height: usize,
        cell_size: f64,
        base_elevation: f64,
        peak_height: f64,
        peak_radius: f64,
    ) -> Self {
        let transform =
            GeoTransform::from_origin(0.0, height as f64 * cell_size, cell_size, -cell_size);
        let (cx, cy) = (
            width as f64 * cell_size / 2.0,
            height as f64 * cell_size / 2.0,
        );

        let mut elevations = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                let (x, y) = transform.cell_center(row, col);
                let dx = x - cx;
                let dy = y - cy;
                let falloff = (-(dx * dx + dy * dy) / (peak_radius * peak_radius)).exp();
                elevations.push(base_elevation + peak_height * falloff);
            }
        }

        Self {
            width,
            height,
            elevations,
            nodata: None,
            transform,
            crs: "local".to_string(),
        }
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// The affine cell-to-coordinate transform.
    #[inline]
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// CRS identifier of the grid's planar coordinates.
    #[inline]
    pub fn crs(&self) -> &str {
        &self.crs
    }

    /// No-data sentinel, if any.
    #[inline]
    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// Whether a raw buffer value represents missing data (NaN or the
    /// no-data sentinel).
    #[inline]
    pub fn is_missing(&self, value: f64) -> bool {
        value.is_nan() || self.nodata.is_some_and(|sentinel| value == sentinel)
    }

    /// Elevation at (row, col), or `None` for out-of-bounds, no-data or NaN
    /// cells.
    pub fn elevation_at(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.height || col >= self.width {
            return None;
        }
        let value = self.elevations[row * self.width + col];
        if self.is_missing(value) {
            None
        } else {
            Some(value)
        }
    }

    /// Cell containing the planar coordinate, or `None` outside the extent.
    pub fn cell_containing(&self, easting: f64, northing: f64) -> Option<(usize, usize)> {
        let (row_f, col_f) = self.transform.fractional_cell(easting, northing)?;
        let (row_f, col_f) = (row_f.floor(), col_f.floor());
        if row_f < 0.0 || col_f < 0.0 {
            return None;
        }
        let (row, col) = (row_f as usize, col_f as usize);
        if row >= self.height || col >= self.width {
            return None;
        }
        Some((row, col))
    }

    /// Nearest-cell elevation at a planar coordinate, without interpolation.
    ///
    /// `None` when the coordinate falls outside the extent or on a no-data
    /// cell.
    pub fn sample(&self, easting: f64, northing: f64) -> Option<f64> {
        let (row, col) = self.cell_containing(easting, northing)?;
        self.elevation_at(row, col)
    }

    /// Precompute the planar coordinate of every cell center.
    ///
    /// Runs once per evaluation and is reused for every trigger; the
    /// evaluator never converts cells to coordinates on its own.
    pub fn coordinate_mesh(&self) -> CoordinateMesh {
        let cells = self.width * self.height;
        let mut eastings = Vec::with_capacity(cells);
        let mut northings = Vec::with_capacity(cells);
        for row in 0..self.height {
            for col in 0..self.width {
                let (x, y) = self.transform.cell_center(row, col);
                eastings.push(x);
                northings.push(y);
            }
        }
        CoordinateMesh {
            width: self.width,
            height: self.height,
            eastings,
            northings,
        }
    }

    /// Raw row-major elevation buffer.
    pub fn elevations(&self) -> &[f64] {
        &self.elevations
    }
}

/// Per-cell center coordinates, congruent with the grid that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinateMesh {
    width: usize,
    height: usize,
    /// Row-major eastings of cell centers
    eastings: Vec<f64>,
    /// Row-major northings of cell centers
    northings: Vec<f64>,
}

impl CoordinateMesh {
    /// Number of columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major cell-center eastings.
    #[inline]
    pub fn eastings(&self) -> &[f64] {
        &self.eastings
    }

    /// Row-major cell-center northings.
    #[inline]
    pub fn northings(&self) -> &[f64] {
        &self.northings
    }
}
