pub mod render;

pub use render::{CueRenderer, CueScene, FrameStats};
