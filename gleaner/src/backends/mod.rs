pub use blob_writer::LocalBlobWriter;

mod blob_writer;
