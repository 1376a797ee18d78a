pub mod fs_blob_source;
