pub mod asset_index;
pub mod blob_source;
pub mod object_transport;
pub mod relay_uploader;
