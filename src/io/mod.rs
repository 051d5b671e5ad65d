//! Adapters feeding the engine and persisting its output

pub mod csv_sink;
pub mod csv_source;
pub mod fca_xml;
pub mod xlsx_sink;

pub use csv_sink::*;
pub use csv_source::*;
pub use fca_xml::*;
pub use xlsx_sink::*;
