//! Solver process management.

pub mod subprocess;

pub use subprocess::SubprocessLauncher;
