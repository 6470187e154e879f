pub mod csv_file;
pub mod memory;

#[cfg(feature = "gsheets")]
pub mod google_sheets;

pub use csv_file::*;
pub use memory::*;

#[cfg(feature = "gsheets")]
pub use google_sheets::*;
