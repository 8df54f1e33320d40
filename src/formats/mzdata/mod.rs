//! mzData 1.05 support
//!
//! - [`MzDataDecoder`]: parse a document into [`RawData`](crate::model::RawData)
//! - [`MzDataEncoder`]: write a run back out as mzData
//! - [`cv_params`]: `<cvParam>` model and name lookup

pub mod cv_params;
mod reader;
mod writer;

pub use cv_params::{find_param, CvParam};
pub use reader::MzDataDecoder;
pub use writer::MzDataEncoder;
