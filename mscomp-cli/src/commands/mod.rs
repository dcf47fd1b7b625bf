//! Command implementations for the mscomp CLI.

pub mod compress;
pub mod decompress;

pub use compress::cmd_compress;
pub use decompress::cmd_decompress;
pub use test::cmd_test;
