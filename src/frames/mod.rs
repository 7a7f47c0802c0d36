pub mod frame;
pub mod sequence;

pub use frame::{Frame, FrameIndex};
pub use sequence::FrameSequence;
