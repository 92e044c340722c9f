pub mod encoding;
pub mod error;
pub mod nucleotide;
pub mod profile;
pub mod util;
