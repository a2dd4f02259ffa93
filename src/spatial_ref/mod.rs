//! Geographic coordinate systems assignable to new datasets.

mod srs;

pub use srs::WellKnownGeogCs;
