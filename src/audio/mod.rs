//! Audio handling: decoding source media and slicing it into upload-sized
//! windows.
//!
//! * [`decode::decode_file`] — decode any supported container/codec into a
//!   mono [`AudioSource`].
//! * [`window::WindowPlanner`] — slice an [`AudioSource`] into successive
//!   WAV windows sized to a transcription backend's payload limit.

pub mod decode;
pub mod window;

pub use decode::{decode_file, AudioError, AudioSource};
pub use window::{AudioWindow, WindowPlanner};
