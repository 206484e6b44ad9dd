// BufferPool - lock-free buffer pool with dual SPSC queues
//
// Microphone samples travel from the capture callback to the analysis side
// without allocating on the audio thread.
//
// Buffer flow:
// 1. Capture pops an empty buffer from POOL_QUEUE
// 2. Capture down-mixes the device frames into it
// 3. Capture pushes the filled buffer to DATA_QUEUE
// 4. Analysis pops the filled buffer, feeds the detection pipeline
// 5. Analysis pushes the emptied buffer back to POOL_QUEUE

use rtrb::{Consumer, Producer};

pub const DEFAULT_BUFFER_COUNT: usize = 16;
pub const DEFAULT_BUFFER_SIZE: usize = 2048;

/// Pre-allocated vector of mono f32 samples
pub type AudioBuffer = Vec<f32>;

/// All four queue ends, before they are split between threads
pub struct BufferPoolChannels {
    pub data_producer: Producer<AudioBuffer>,
    pub data_consumer: Consumer<AudioBuffer>,
    pub pool_producer: Producer<AudioBuffer>,
    pub pool_consumer: Consumer<AudioBuffer>,
    capacity: usize,
}

/// Queue ends owned by the capture callback
pub struct CaptureChannels {
    data_producer: Producer<AudioBuffer>,
    pool_consumer: Consumer<AudioBuffer>,
}

/// Queue ends owned by the analysis side
pub struct AnalysisChannels {
    data_consumer: Consumer<AudioBuffer>,
    pool_producer: Producer<AudioBuffer>,
    capacity: usize,
}

/// Lock-free buffer pool using dual SPSC ring buffers
///
/// # Example
/// ```ignore
/// let (mut capture, mut analysis) = BufferPool::new(16, 2048).split();
///
/// // In the capture callback:
/// capture.push_interleaved(data, 2, |s| s);
///
/// // On the analysis side:
/// analysis.drain(|samples| pipeline.push_samples(samples));
/// ```
pub struct BufferPool;

impl BufferPool {
    /// Pre-allocate `buffer_count` buffers of `buffer_size` samples.
    ///
    /// Zero counts or sizes are raised to one so the pool is always usable.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(buffer_count: usize, buffer_size: usize) -> BufferPoolChannels {
        let buffer_count = buffer_count.max(1);
        let buffer_size = buffer_size.max(1);

        let (mut pool_producer, pool_consumer) = rtrb::RingBuffer::new(buffer_count);
        let (data_producer, data_consumer) = rtrb::RingBuffer::new(buffer_count);

        // The pool queue holds exactly buffer_count slots, so every push lands
        for _ in 0..buffer_count {
            if pool_producer.push(Vec::with_capacity(buffer_size)).is_err() {
                break;
            }
        }

        BufferPoolChannels {
            data_producer,
            data_consumer,
            pool_producer,
            pool_consumer,
            capacity: buffer_count,
        }
    }
}

impl BufferPoolChannels {
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Hand the capture ends to the audio thread and keep the analysis ends
    pub fn split(self) -> (CaptureChannels, AnalysisChannels) {
        (
            CaptureChannels {
                data_producer: self.data_producer,
                pool_consumer: self.pool_consumer,
            },
            AnalysisChannels {
                data_consumer: self.data_consumer,
                pool_producer: self.pool_producer,
                capacity: self.capacity,
            },
        )
    }
}

impl CaptureChannels {
    /// Down-mix interleaved device frames into one pooled buffer.
    ///
    /// Returns false when no empty buffer was available and the block was
    /// dropped. Frames beyond the buffer's capacity are dropped as well.
    pub fn push_interleaved<T, F>(&mut self, data: &[T], channels: usize, to_f32: F) -> bool
    where
        T: Copy,
        F: Fn(T) -> f32,
    {
        let channels = channels.max(1);
        let mut buffer = match self.pool_consumer.pop() {
            Ok(buffer) => buffer,
            Err(_) => return false,
        };

        buffer.clear();
        let room = buffer.capacity();
        let scale = 1.0 / channels as f32;
        for frame in data.chunks_exact(channels).take(room) {
            let sum: f32 = frame.iter().map(|&s| to_f32(s)).sum();
            buffer.push(sum * scale);
        }

        self.data_producer.push(buffer).is_ok()
    }
}

impl AnalysisChannels {
    /// Feed every filled buffer to `handle` and recycle it. Returns the
    /// number of buffers drained.
    pub fn drain<F>(&mut self, mut handle: F) -> usize
    where
        F: FnMut(&[f32]),
    {
        let mut drained = 0;
        while let Ok(buffer) = self.data_consumer.pop() {
            handle(&buffer);
            drained += 1;
            if self.pool_producer.push(buffer).is_err() {
                break;
            }
        }
        drained
    }

    /// Share of the pool currently waiting in the data queue
    pub fn occupancy_percent(&self) -> f32 {
        self.data_consumer.slots() as f32 / self.capacity as f32 * 100.0
    }
}
