//! Test tools shared by the unit tests of this crate.

mod logger;

pub use logger::TestLogger;
