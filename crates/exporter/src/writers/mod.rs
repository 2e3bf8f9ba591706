pub mod csv_writer;
pub mod gpx_writer;
pub mod json_writer;

pub use csv_writer::write_csv;
pub use gpx_writer::write_gpx;
pub use json_writer::write_json;
