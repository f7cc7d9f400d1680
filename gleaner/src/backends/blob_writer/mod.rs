pub use local::LocalBlobWriter;

mod local;
