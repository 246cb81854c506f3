// # Capture Module
//
// Raw frame handles, the frame source interface, and a synthetic source used
// by the CLI demo and the tests.

pub mod frame;
pub mod synthetic;

pub use frame::{FrameLease, FrameSource, RawFrame, YuvPlanes};
pub use synthetic::{ChromaLayout, ReleaseTracker, SyntheticFrame, SyntheticFrameSource};
