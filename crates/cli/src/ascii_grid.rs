//! ESRI ASCII grid reader and writer.
//!
//! The ASCII grid is the interchange raster of the pipeline: the DEM comes
//! in as one, and the runout mask goes out as one for downstream
//! vectorization (`gdal_polygonize` and friends read it directly). The
//! format is a short header (`ncols`, `nrows`, lower-left corner, cell size,
//! optional no-data sentinel) followed by row-major values, top row first.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use runout_core::{GeoTransform, RasterSource, RunoutOutcome};

use crate::error::CliError;

/// A parsed ASCII grid DEM, tagged with the CRS supplied on the command
/// line (the format itself carries no CRS).
#[derive(Debug, Clone)]
pub struct AsciiGrid {
    width: usize,
    height: usize,
    /// Easting of the lower-left corner of the lower-left cell
    xll: f64,
    /// Northing of the lower-left corner of the lower-left cell
    yll: f64,
    cell_size: f64,
    nodata: Option<f64>,
    values: Vec<f64>,
    crs: String,
}

impl AsciiGrid {
    /// Read an ASCII grid from disk.
    ///
    /// # Errors
    /// I/O failures and malformed headers or value sections are reported as
    /// [`CliError::DemRead`] / [`CliError::DemParse`].
    pub fn read(path: &Path, crs: &str) -> Result<Self, CliError> {
        let text = fs::read_to_string(path)
            .map_err(|e| CliError::DemRead(format!("{}: {e}", path.display())))?;
        Self::parse(&text, crs)
    }

    /// Parse ASCII grid text.
    ///
    /// # Errors
    /// Returns [`CliError::DemParse`] for missing header fields, malformed
    /// numbers or a value count that does not match the header dimensions.
    pub fn parse(text: &str, crs: &str) -> Result<Self, CliError> {
        let mut tokens = text.split_whitespace().peekable();

        let mut ncols: Option<usize> = None;
        let mut nrows: Option<usize> = None;
        let mut xll: Option<f64> = None;
        let mut yll: Option<f64> = None;
        let mut x_is_center = false;
        let mut y_is_center = false;
        let mut cell_size: Option<f64> = None;
        let mut nodata: Option<f64> = None;

        // Header: keyword/value pairs until the first bare number
        while let Some(token) = tokens.peek() {
            if token.parse::<f64>().is_ok() {
                break;
            }
            let keyword = tokens
                .next()
                .ok_or_else(|| CliError::DemParse("truncated header".to_string()))?
                .to_ascii_lowercase();
            let value = tokens
                .next()
                .ok_or_else(|| CliError::DemParse(format!("header field {keyword} has no value")))?;

            match keyword.as_str() {
                "ncols" => ncols = Some(parse_dimension(&keyword, value)?),
                "nrows" => nrows = Some(parse_dimension(&keyword, value)?),
                "xllcorner" => xll = Some(parse_number(&keyword, value)?),
                "yllcorner" => yll = Some(parse_number(&keyword, value)?),
                "xllcenter" => {
                    xll = Some(parse_number(&keyword, value)?);
                    x_is_center = true;
                }
                "yllcenter" => {
                    yll = Some(parse_number(&keyword, value)?);
                    y_is_center = true;
                }
                "cellsize" => cell_size = Some(parse_number(&keyword, value)?),
                "nodata_value" => nodata = Some(parse_number(&keyword, value)?),
                other => {
                    return Err(CliError::DemParse(format!("unknown header field {other}")));
                }
            }
        }

        let width = ncols.ok_or_else(|| missing("ncols"))?;
        let height = nrows.ok_or_else(|| missing("nrows"))?;
        let cell_size = cell_size.ok_or_else(|| missing("cellsize"))?;
        let mut xll = xll.ok_or_else(|| missing("xllcorner"))?;
        let mut yll = yll.ok_or_else(|| missing("yllcorner"))?;
        if cell_size <= 0.0 {
            return Err(CliError::DemParse(format!(
                "cellsize must be positive, got {cell_size}"
            )));
        }
        // Center-referenced corners shift by half a cell
        if x_is_center {
            xll -= cell_size / 2.0;
        }
        if y_is_center {
            yll -= cell_size / 2.0;
        }

        let mut values = Vec::with_capacity(width * height);
        for token in tokens {
            let value = token
                .parse::<f64>()
                .map_err(|_| CliError::DemParse(format!("bad elevation value {token}")))?;
            values.push(value);
        }
        if values.len() != width * height {
            return Err(CliError::DemParse(format!(
                "expected {} values for {width}x{height}, found {}",
                width * height,
                values.len()
            )));
        }

        Ok(Self {
            width,
            height,
            xll,
            yll,
            cell_size,
            nodata,
            values,
            crs: crs.to_string(),
        })
    }
}

impl RasterSource for AsciiGrid {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    fn geotransform(&self) -> GeoTransform {
        // ASCII grids reference the lower-left corner; the transform wants
        // the top-left
        GeoTransform::from_origin(
            self.xll,
            self.yll + self.height as f64 * self.cell_size,
            self.cell_size,
            -self.cell_size,
        )
    }

    fn crs(&self) -> &str {
        &self.crs
    }

    fn read_elevations(&self) -> Vec<f64> {
        self.values.clone()
    }
}

/// Serialize a runout mask as an ASCII grid: 1 for runout cells, 0
/// elsewhere, with 0 declared as the no-data sentinel so vectorizers treat
/// unmarked terrain as background.
///
/// # Errors
/// The format cannot express rotated or non-square cells; such outcomes are
/// rejected as [`CliError::MaskWrite`], as are I/O failures.
pub fn write_mask(path: &Path, outcome: &RunoutOutcome) -> Result<(), CliError> {
    let text = mask_to_ascii(outcome)?;
    fs::write(path, text).map_err(|e| CliError::MaskWrite(format!("{}: {e}", path.display())))
}

fn mask_to_ascii(outcome: &RunoutOutcome) -> Result<String, CliError> {
    let transform = &outcome.transform;
    if transform.row_rotation != 0.0 || transform.col_rotation != 0.0 {
        return Err(CliError::MaskWrite(
            "ASCII grid cannot represent a rotated geotransform".to_string(),
        ));
    }
    if transform.pixel_height != -transform.pixel_width {
        return Err(CliError::MaskWrite(
            "ASCII grid requires square north-up cells".to_string(),
        ));
    }

    let mask = &outcome.mask;
    let (width, height) = (mask.width(), mask.height());
    let cell_size = transform.pixel_width;
    let yll = transform.origin_y + height as f64 * transform.pixel_height;

    let mut text = String::new();
    let _ = writeln!(text, "ncols {width}");
    let _ = writeln!(text, "nrows {height}");
    let _ = writeln!(text, "xllcorner {}", transform.origin_x);
    let _ = writeln!(text, "yllcorner {yll}");
    let _ = writeln!(text, "cellsize {cell_size}");
    let _ = writeln!(text, "NODATA_value 0");

    let cells = mask.as_slice();
    for row in 0..height {
        for col in 0..width {
            if col > 0 {
                text.push(' ');
            }
            text.push(if cells[row * width + col] { '1' } else { '0' });
        }
        text.push('\n');
    }

    Ok(text)
}

fn parse_dimension(keyword: &str, value: &str) -> Result<usize, CliError> {
    value
        .parse::<usize>()
        .map_err(|_| CliError::DemParse(format!("bad value for {keyword}: {value}")))
}

fn parse_number(keyword: &str, value: &str) -> Result<f64, CliError> {
    value
        .parse::<f64>()
        .map_err(|_| CliError::DemParse(format!("bad value for {keyword}: {value}")))
}

fn missing(field: &str) -> CliError {
    CliError::DemParse(format!("missing header field {field}"))
}
