//! The compiler's linear sequence of IR transforms: name table → coloring →
//! call lifting → variable rewrite → CIR build → helper extraction → WIR
//! build → pass elimination.

pub mod cir_build;
pub mod coloring;
pub mod helper_extract;
pub mod lifting;
pub mod pass_elim;
pub mod variables;
pub mod wir_build;
