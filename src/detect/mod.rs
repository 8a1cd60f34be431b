//! Object detection backends.
//!
//! The detector is consumed as a black box through `DetectorBackend`. This module also
//! carries the pieces every YOLO-style backend shares: the COCO label table and
//! class-aware non-maximum suppression.

mod backend;
mod backends;
pub mod labels;
pub mod nms;
mod registry;
mod result;

pub use backend::DetectorBackend;
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use registry::{BackendRegistry, SharedBackend};
pub use result::{matching, Detection};
