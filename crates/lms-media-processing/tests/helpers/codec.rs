use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use lms_media_core::ResolutionSpec;
use lms_media_processing::{CodecError, CodecRuntime};

/// Deterministic codec double with an in-flight guard.
///
/// Output length is the input length scaled by `height / 1080`, taken from
/// the resolution's scale expression.
#[derive(Default)]
pub struct FakeCodec {
    loaded: AtomicBool,
    load_fails: AtomicBool,
    load_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<String>>,
    fail_on: Mutex<Option<String>>,
    delay: Mutex<Duration>,
}

impl FakeCodec {
    pub fn with_delay(delay: Duration) -> Self {
        let codec = Self::default();
        *codec.delay.lock().unwrap() = delay;
        codec
    }

    pub fn failing_load() -> Self {
        let codec = Self::default();
        codec.load_fails.store(true, Ordering::SeqCst);
        codec
    }

    pub fn fail_on(&self, label: Option<&str>) {
        *self.fail_on.lock().unwrap() = label.map(str::to_string);
    }

    pub fn set_load_fails(&self, fails: bool) {
        self.load_fails.store(fails, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn output_len(input_len: usize, spec: &ResolutionSpec) -> usize {
        let height = spec
            .scale_expression
            .split_once(':')
            .and_then(|(_, h)| h.parse::<usize>().ok())
            .unwrap_or(540);
        input_len * height.min(1080) / 1080
    }
}

#[async_trait]
impl CodecRuntime for FakeCodec {
    async fn ensure_loaded(&self) -> Result<(), CodecError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        if self.loaded.load(Ordering::SeqCst) {
            return Ok(());
        }
        if self.load_fails.load(Ordering::SeqCst) {
            return Err(CodecError::LoadFailed("engine assets unavailable".to_string()));
        }
        self.loaded.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    async fn transcode(&self, input: Bytes, spec: &ResolutionSpec) -> Result<Bytes, CodecError> {
        if !self.is_loaded() {
            return Err(CodecError::NotLoaded);
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(spec.label.clone());

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let fail = self.fail_on.lock().unwrap().as_deref() == Some(spec.label.as_str());
        if fail {
            return Err(CodecError::InvocationFailed {
                label: spec.label.clone(),
                message: "unsupported codec".to_string(),
            });
        }

        Ok(input.slice(0..Self::output_len(input.len(), spec)))
    }
}
