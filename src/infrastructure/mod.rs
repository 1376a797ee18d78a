pub mod blobs;
pub mod index;
pub mod transport;
