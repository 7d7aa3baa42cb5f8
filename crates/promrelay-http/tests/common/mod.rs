//! Shared test doubles.

#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use promrelay_core::error::{RelayError, Result};
use promrelay_http::push::{PushBatch, PushTransport};

/// Records every batch; fails while `failing` is set.
#[derive(Default)]
pub struct FakeTransport {
    pub batches: Mutex<Vec<PushBatch>>,
    pub failing: AtomicBool,
}

impl FakeTransport {
    pub fn failing() -> Self {
        let t = Self::default();
        t.failing.store(true, Ordering::SeqCst);
        t
    }

    pub fn count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

#[async_trait]
impl PushTransport for FakeTransport {
    async fn push(&self, batch: &PushBatch) -> Result<()> {
        self.batches.lock().unwrap().push(batch.clone());
        if self.failing.load(Ordering::SeqCst) {
            return Err(RelayError::Export("gateway unreachable".into()));
        }
        Ok(())
    }
}

/// In-memory log sink destination.
#[derive(Clone, Default)]
pub struct SharedBuf(pub Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, b: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(b);
        Ok(b.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}
