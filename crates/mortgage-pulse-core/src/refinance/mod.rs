//! Refinancing engine: rate blending, regulatory checks, term windows and
//! scenario search.

pub mod policy;
pub mod rate_blend;
pub mod regulatory;
pub mod scenarios;
pub mod term_range;
