pub mod data_uri;
pub mod format;
pub mod palette;
