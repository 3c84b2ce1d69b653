//! Grid model: terrain elevations, georeferencing and the runout mask.

pub mod geotransform;
pub mod mask;
pub mod terrain;

pub use geotransform::GeoTransform;
pub use mask::RunoutMask;
pub use terrain::{CoordinateMesh, RasterSource, TerrainGrid};
