pub use blob_writer::BlobWriter;

pub mod blob_writer;
