pub mod publish_document;
pub mod remove_document_assets;
pub mod remove_share_assets;
pub mod sync_assets;
