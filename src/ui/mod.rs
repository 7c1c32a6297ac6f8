//! Terminal presentation helpers.

pub mod qr;

pub use qr::terminal_qr;
