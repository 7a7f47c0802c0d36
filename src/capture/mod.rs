pub mod decoder;
pub mod device;
pub mod layout;

pub use decoder::{DecodeRequest, FfmpegDecoder, VideoDecoder};
pub use device::{DeviceDriver, PrerecordedDriver};
pub use layout::SessionLayout;
