//! Synthetic fairness datasets used when the backend has no data to offer.
//!
//! Each generator splits into a deterministic base shape and an explicit
//! [`Noise`] layer. Pass `Noise::none()` for exactly reproducible output.

pub mod intersectional;
pub mod noise;
pub mod temporal;

pub use intersectional::{IntersectionalData, generate_intersectional_data};
pub use noise::{MAX_NOISE_AMPLITUDE, Noise};
pub use temporal::{Archetype, SERIES_MONTHS, generate_series, generate_temporal_data};
