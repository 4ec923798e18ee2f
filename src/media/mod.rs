pub mod ffprobe;
pub mod probe;
pub mod transcode;
