pub mod raw_file;

pub use raw_file::RawFileSource;
