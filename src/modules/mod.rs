pub mod transcode;
pub mod video;
