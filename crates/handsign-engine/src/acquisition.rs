//! Hand frame acquisition interfaces.
//!
//! The engine never talks to tracking hardware. A producer on the other side
//! of this boundary fills in [`HandFrame`]s and hands them over through one of
//! these sources:
//!
//! - [`ChannelFrameSource`] for live producers pushing through a [`FrameSender`]
//! - [`ReplayFrameSource`] for recorded sessions (newline-delimited JSON)

use std::collections::VecDeque;
use std::io::BufRead;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use handsign_core::{Error, HandFrame, Result};

/// Trait for hand frame sources
#[async_trait]
pub trait HandFrameSource: Send {
    /// Start delivering frames
    async fn start(&mut self) -> Result<()>;

    /// Stop delivering frames
    async fn stop(&mut self) -> Result<()>;

    /// Check if the source is delivering
    fn is_running(&self) -> bool;

    /// Receive the next frame, waiting if none is ready
    async fn recv(&mut self) -> Result<HandFrame>;

    /// Try to receive a frame without waiting
    fn try_recv(&mut self) -> Option<HandFrame>;
}

/// Producer handle for a [`ChannelFrameSource`]
#[derive(Debug, Clone)]
pub struct FrameSender {
    tx: mpsc::Sender<HandFrame>,
}

impl FrameSender {
    pub async fn send(&self, frame: HandFrame) -> Result<()> {
        self.tx.send(frame).await.map_err(|_| Error::SourceClosed)
    }

    /// Fails if the source is closed or its buffer is full.
    pub fn try_send(&self, frame: HandFrame) -> Result<()> {
        self.tx.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                Error::InvalidInput("frame buffer full".into())
            }
            mpsc::error::TrySendError::Closed(_) => Error::SourceClosed,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Frames pushed in by a live producer.
///
/// Frames sent before [`start`](HandFrameSource::start) are buffered. The
/// source reports [`Error::SourceClosed`] once every sender is dropped.
pub struct ChannelFrameSource {
    rx: mpsc::Receiver<HandFrame>,
    is_running: bool,
}

impl ChannelFrameSource {
    pub fn new(capacity: usize) -> (Self, FrameSender) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                rx,
                is_running: false,
            },
            FrameSender { tx },
        )
    }
}

#[async_trait]
impl HandFrameSource for ChannelFrameSource {
    async fn start(&mut self) -> Result<()> {
        self.is_running = true;
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if self.is_running {
            debug!("channel frame source stopped");
        }
        self.is_running = false;
        self.rx.close();
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.is_running
    }

    async fn recv(&mut self) -> Result<HandFrame> {
        if !self.is_running {
            return Err(Error::SourceNotStarted);
        }
        self.rx.recv().await.ok_or(Error::SourceClosed)
    }

    fn try_recv(&mut self) -> Option<HandFrame> {
        if !self.is_running {
            return None;
        }
        self.rx.try_recv().ok()
    }
}

/// Recorded frames played back in order.
#[derive(Debug, Clone, Default)]
pub struct ReplayFrameSource {
    frames: VecDeque<HandFrame>,
    is_running: bool,
}

impl ReplayFrameSource {
    pub fn new(frames: Vec<HandFrame>) -> Self {
        Self {
            frames: frames.into(),
            is_running: false,
        }
    }

    /// One JSON-encoded [`HandFrame`] per line. Blank lines are skipped.
    pub fn from_ndjson<R: BufRead>(reader: R) -> Result<Self> {
        let mut frames = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| Error::InvalidInput(e.to_string()))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let frame: HandFrame = serde_json::from_str(line).map_err(|e| {
                warn!(line = line_no + 1, "unparseable frame: {}", e);
                Error::Serialization(format!("line {}: {}", line_no + 1, e))
            })?;
            frames.push(frame);
        }
        Ok(Self::new(frames))
    }

    /// Frames not yet delivered
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

#[async_trait]
impl HandFrameSource for ReplayFrameSource {
    async fn start(&mut self) -> Result<()> {
        self.is_running = true;
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.is_running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.is_running
    }

    async fn recv(&mut self) -> Result<HandFrame> {
        if !self.is_running {
            return Err(Error::SourceNotStarted);
        }
        self.frames.pop_front().ok_or(Error::SourceClosed)
    }

    fn try_recv(&mut self) -> Option<HandFrame> {
        if !self.is_running {
            return None;
        }
        self.frames.pop_front()
    }
}
