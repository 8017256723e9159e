//! I/O for gridded output and scattered point input

mod native;
mod xyz;

pub use native::{
    read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer, GeoTiffOptions,
};
pub use xyz::{read_xyz, read_xyz_from, write_xyz, write_xyz_to, PartSeparator, XyzFields, XyzOptions};
