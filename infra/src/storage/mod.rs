//! Entity storage backends.

mod fs_writer;

pub use fs_writer::FsEntityWriter;
