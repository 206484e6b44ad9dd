// Audio module - microphone capture into a lock-free buffer pool

pub mod buffer_pool;
#[cfg(not(target_os = "android"))]
pub mod input;

pub use buffer_pool::{
    AnalysisChannels, AudioBuffer, BufferPool, BufferPoolChannels, CaptureChannels,
    DEFAULT_BUFFER_COUNT, DEFAULT_BUFFER_SIZE,
};
#[cfg(not(target_os = "android"))]
pub use input::LiveInput;
