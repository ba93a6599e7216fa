//! The boundary between the engine and an audio device.
//!
//! The engine never talks to `cpal` directly; it only knows about
//! [`AudioSink`]. That keeps the tick state machine testable without a
//! sound card, and keeps `CpalSink`'s realtime constraints (no allocation,
//! no blocking) isolated to one file.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tracing::warn;

use crate::error::SinkError;

/// Number of in-flight tick buffers the sink is willing to hold.
const CAPACITY_BUFFERS: usize = 8;

/// Contract the engine uses to hand finished PCM buffers to a device.
///
/// `open` configures the device for mono unsigned 8-bit PCM at `sfreq` and
/// registers a callback invoked once per buffer that finishes playing.
/// `submit` enqueues a buffer, copying or retaining its bytes before
/// returning. `close` drains and silences the output.
pub trait AudioSink {
    fn open(
        &mut self,
        sfreq: u32,
        on_done: Box<dyn FnMut() + Send>,
    ) -> Result<(), SinkError>;
    fn submit(&mut self, buffer: &[u8]) -> Result<(), SinkError>;
    fn close(&mut self);
}

/// Production sink: a `cpal` output stream fed through a byte ring buffer.
pub struct CpalSink {
    device: Device,
    config: Option<StreamConfig>,
    stream: Option<Stream>,
    producer: Option<HeapProd<u8>>,
    running: Arc<AtomicBool>,
}

impl CpalSink {
    /// Opens the default output device without starting a stream yet.
    pub fn new() -> Result<Self, SinkError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(SinkError::Unavailable)?;
        Ok(CpalSink {
            device,
            config: None,
            stream: None,
            producer: None,
            running: Arc::new(AtomicBool::new(false)),
        })
    }
}

impl AudioSink for CpalSink {
    fn open(
        &mut self,
        sfreq: u32,
        mut on_done: Box<dyn FnMut() + Send>,
    ) -> Result<(), SinkError> {
        let config = StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(sfreq),
            buffer_size: cpal::BufferSize::Default,
        };

        // Unsigned 8-bit samples are centered at 128; buffer a handful of
        // ticks worth of bytes so the callback never starves mid-tick.
        let rb = HeapRb::<u8>::new(CAPACITY_BUFFERS * (sfreq as usize / 20).max(64));
        let (producer, mut consumer) = rb.split();

        let running = self.running.clone();
        let stream = self
            .device
            .build_output_stream(
                &config,
                move |data: &mut [u8], _: &cpal::OutputCallbackInfo| {
                    if !running.load(Ordering::Relaxed) {
                        data.fill(128);
                        return;
                    }
                    let consumed_any = !data.is_empty();
                    for sample in data.iter_mut() {
                        *sample = consumer.try_pop().unwrap_or(128);
                    }
                    if consumed_any {
                        on_done();
                    }
                },
                |err| warn!(%err, "cpal output stream error"),
                None,
            )
            .map_err(|e| SinkError::Incompatible(e.to_string()))?;

        stream
            .play()
            .map_err(|e| SinkError::Incompatible(e.to_string()))?;

        self.running.store(true, Ordering::Relaxed);
        self.config = Some(config);
        self.stream = Some(stream);
        self.producer = Some(producer);
        Ok(())
    }

    fn submit(&mut self, buffer: &[u8]) -> Result<(), SinkError> {
        let producer = self
            .producer
            .as_mut()
            .ok_or(SinkError::Unavailable)?;
        for &byte in buffer {
            let _ = producer.try_push(byte);
        }
        Ok(())
    }

    fn close(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(stream) = self.stream.take() {
            let _ = stream.pause();
        }
        self.producer = None;
    }
}

/// Test double: records submitted buffers and calls `on_done` synchronously
/// from `submit`, so tests can drive the engine tick-by-tick without a
/// sound card or a background thread.
#[derive(Default)]
pub struct RecordingSink {
    pub buffers: Vec<Vec<u8>>,
    pub sfreq: u32,
    on_done: Option<Box<dyn FnMut() + Send>>,
    closed: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        RecordingSink::default()
    }
}

impl AudioSink for RecordingSink {
    fn open(
        &mut self,
        sfreq: u32,
        on_done: Box<dyn FnMut() + Send>,
    ) -> Result<(), SinkError> {
        self.sfreq = sfreq;
        self.on_done = Some(on_done);
        self.closed = false;
        Ok(())
    }

    fn submit(&mut self, buffer: &[u8]) -> Result<(), SinkError> {
        if self.closed {
            return Ok(());
        }
        self.buffers.push(buffer.to_vec());
        if let Some(cb) = self.on_done.as_mut() {
            cb();
        }
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Shared handle a completion callback can use to re-enter the engine
/// safely from a foreign thread (e.g. `CpalSink`'s audio callback).
pub type SharedSink<S> = Arc<Mutex<S>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_invokes_on_done_per_submit() {
        let mut sink = RecordingSink::new();
        let count = Arc::new(AtomicBool::new(false));
        let flag = count.clone();
        sink.open(
            44100,
            Box::new(move || flag.store(true, Ordering::Relaxed)),
        )
        .unwrap();
        sink.submit(&[1, 2, 3]).unwrap();
        assert!(count.load(Ordering::Relaxed));
        assert_eq!(sink.buffers, vec![vec![1, 2, 3]]);
    }

    #[test]
    fn recording_sink_ignores_submits_after_close() {
        let mut sink = RecordingSink::new();
        sink.open(44100, Box::new(|| {})).unwrap();
        sink.close();
        sink.submit(&[9, 9, 9]).unwrap();
        assert!(sink.buffers.is_empty());
    }
}
