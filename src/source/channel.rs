//! Channel-fed reading source.
//!
//! A sensor thread pushes readings through a [`ReadingSender`]; the session
//! pulls them from the paired [`ChannelSource`].

use crate::error::SourceError;
use crate::session::CancellationToken;
use crate::source::types::Reading;
use crate::source::ReadingSource;
use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};

/// Default number of readings buffered between the sensor and the session.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1_000;

/// Sending half handed to the sensor thread.
#[derive(Debug, Clone)]
pub struct ReadingSender {
    sender: Sender<Reading>,
}

impl ReadingSender {
    /// Push a heart-rate value stamped with the current time.
    ///
    /// Returns `false` if the session has gone away or the buffer is full.
    pub fn push(&self, value: f64) -> bool {
        self.send(Reading::now(value))
    }

    /// Push a pre-stamped reading (clamped on the way in).
    pub fn send(&self, reading: Reading) -> bool {
        let reading = Reading::new(reading.value, reading.timestamp);
        match self.sender.try_send(reading) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Reading channel full, dropping reading");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Receiving half consumed by a streaming session.
#[derive(Debug)]
pub struct ChannelSource {
    receiver: Receiver<Reading>,
}

impl ChannelSource {
    /// Create a connected sender/source pair with the default capacity.
    pub fn pair() -> (ReadingSender, ChannelSource) {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (ReadingSender, ChannelSource) {
        let (sender, receiver) = bounded(capacity);
        (ReadingSender { sender }, ChannelSource { receiver })
    }
}

impl ReadingSource for ChannelSource {
    fn next_reading(&mut self, token: &CancellationToken) -> Result<Reading, SourceError> {
        if token.is_cancelled() {
            return Err(SourceError::Cancelled);
        }
        select! {
            recv(self.receiver) -> reading => reading.map_err(|_| SourceError::Disconnected),
            recv(token.signal()) -> _ => Err(SourceError::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MIN_HEART_RATE;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_channel_delivers_in_order() {
        let (sender, mut source) = ChannelSource::pair();
        let handle = thread::spawn(move || {
            for v in [70.0, 72.0, 10.0] {
                assert!(sender.push(v));
            }
        });
        handle.join().unwrap();

        let token = CancellationToken::new();
        assert_eq!(source.next_reading(&token).unwrap().value, 70.0);
        assert_eq!(source.next_reading(&token).unwrap().value, 72.0);
        assert_eq!(source.next_reading(&token).unwrap().value, MIN_HEART_RATE);
        // Sender dropped after the thread finished
        assert!(matches!(
            source.next_reading(&token),
            Err(SourceError::Disconnected)
        ));
    }

    #[test]
    fn test_full_channel_drops() {
        let (sender, mut source) = ChannelSource::with_capacity(1);
        assert!(sender.push(80.0));
        assert!(!sender.push(81.0));

        let token = CancellationToken::new();
        assert_eq!(source.next_reading(&token).unwrap().value, 80.0);
    }

    #[test]
    fn test_cancel_wakes_empty_channel() {
        let (_sender, mut source) = ChannelSource::pair();
        let token = CancellationToken::new();
        let canceller = token.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            canceller.cancel();
        });

        assert!(matches!(
            source.next_reading(&token),
            Err(SourceError::Cancelled)
        ));
        handle.join().unwrap();
    }
}
