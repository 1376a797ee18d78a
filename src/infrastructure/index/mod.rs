pub mod json_asset_index;
