//! Binary encodings for point records and their storage keys.

pub mod key;
pub mod point;
