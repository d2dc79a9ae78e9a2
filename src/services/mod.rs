//! Service layer separating I/O and pixel operations from pipeline logic

pub mod failures;
pub mod io;
pub mod resize;

pub use failures::{FailureList, FAILURE_LIST_HEADER};
pub use io::ImageIoService;
pub use resize::resize_exact;
