//! Sparse matrix structures (CSR format)
//!
//! Compressed Sparse Row storage with efficient matrix-vector products,
//! including the transpose product needed by the normal-equations solver.

mod csr;

pub use csr::CsrMatrix;
