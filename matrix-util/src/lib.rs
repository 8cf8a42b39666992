pub mod common_io;
pub mod dmatrix_rsvd;
pub mod dmatrix_svd;
pub mod dmatrix_util;
pub mod numeric;
pub mod traits;
