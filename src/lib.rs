pub mod export;
pub mod feed;
pub mod predict;
pub mod state;
