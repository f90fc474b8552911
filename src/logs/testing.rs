//! In-memory [`LogSender`] for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use super::sender::{LogSender, SendError};

/// Records every payload. Payloads listed in `reject` fail with a 500.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<Bytes>>,
    reject: Vec<Bytes>,
}

impl RecordingSender {
    pub fn rejecting(reject: &[&'static [u8]]) -> Self {
        Self {
            sent: Mutex::default(),
            reject: reject.iter().copied().map(Bytes::from_static).collect(),
        }
    }

    /// Every attempted payload, including rejected ones.
    pub fn sent(&self) -> Vec<Bytes> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogSender for RecordingSender {
    async fn send(&self, payload: Bytes) -> Result<(), SendError> {
        let rejected = self.reject.contains(&payload);
        self.sent.lock().unwrap().push(payload);
        if rejected {
            return Err(SendError::Status {
                status: 500,
                body: "overloaded".to_string(),
            });
        }
        Ok(())
    }
}
