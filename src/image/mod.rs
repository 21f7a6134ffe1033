pub mod io;
pub mod signature;

pub use self::signature::{sniff, sniff_file, ImageKind};
