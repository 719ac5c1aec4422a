//! Base-1e18 fixed-point arithmetic used by every aggregate and price record.

mod fixed_point;

pub use fixed_point::{
    abs, div_1e18, mul_1e18, normalize_to_1e18, pow10, to_f64, ONE_E18,
};
