//! Conversion pass modules.
//!
//! Each pass is a self-contained transformation that mutates the document
//! in place. Passes run in order (0-3) and each assumes the output of the
//! previous one.

pub mod p0_normalize;
pub mod p1_structure;
pub mod p2_strict;
pub mod p3_deref;
