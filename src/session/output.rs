use crate::errors::CameraError;
use crate::photo::CapturedImage;
use crate::types::PhotoRequest;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use uuid::Uuid;

/// Still-photo output, prepared for JPEG.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoOutput {
    jpeg_quality: u8,
}

impl PhotoOutput {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }
}

type CaptureResult = Result<CapturedImage, CameraError>;

/// Sending half of a capture. Consumed on completion, so it fires once.
pub(crate) struct PhotoCompletion {
    request_id: Uuid,
    tx: oneshot::Sender<CaptureResult>,
}

impl PhotoCompletion {
    pub(crate) fn complete(self, result: CaptureResult) {
        if let Err(e) = &result {
            log::warn!("Photo request {} failed: {}", self.request_id, e);
        }
        if self.tx.send(result).is_err() {
            log::debug!(
                "Photo request {} finished after its ticket was dropped",
                self.request_id
            );
        }
    }
}

/// Pending result of one photo request.
///
/// Await it from async code, or call [`PhotoTicket::wait`] from a plain
/// thread.
#[derive(Debug)]
pub struct PhotoTicket {
    request: PhotoRequest,
    rx: oneshot::Receiver<CaptureResult>,
}

impl PhotoTicket {
    pub(crate) fn channel(request: PhotoRequest) -> (PhotoCompletion, PhotoTicket) {
        let (tx, rx) = oneshot::channel();
        (
            PhotoCompletion {
                request_id: request.id,
                tx,
            },
            PhotoTicket { request, rx },
        )
    }

    pub fn request(&self) -> &PhotoRequest {
        &self.request
    }

    /// Block the current thread until the capture completes.
    ///
    /// Panics when called from inside an async runtime; await the ticket there.
    pub fn wait(self) -> CaptureResult {
        self.rx.blocking_recv().unwrap_or_else(|_| Err(abandoned()))
    }
}

impl Future for PhotoTicket {
    type Output = CaptureResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(abandoned())))
    }
}

fn abandoned() -> CameraError {
    CameraError::Capture("capture was abandoned before completing".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FlashMode;

    #[test]
    fn test_quality_is_clamped() {
        assert_eq!(PhotoOutput::new(0).jpeg_quality(), 1);
        assert_eq!(PhotoOutput::new(200).jpeg_quality(), 100);
    }

    #[tokio::test]
    async fn test_dropped_completion_resolves_with_error() {
        let (completion, ticket) = PhotoTicket::channel(PhotoRequest::new(FlashMode::Off));
        drop(completion);
        assert!(matches!(ticket.await, Err(CameraError::Capture(_))));
    }

    #[test]
    fn test_ticket_pending_until_completed() {
        let (completion, ticket) = PhotoTicket::channel(PhotoRequest::new(FlashMode::Off));
        let mut pending = tokio_test::task::spawn(ticket);
        tokio_test::assert_pending!(pending.poll());

        completion.complete(Err(CameraError::Capture("late".to_string())));
        assert!(pending.is_woken());
        let result = tokio_test::assert_ready!(pending.poll());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_completion_delivers_error() {
        let (completion, ticket) = PhotoTicket::channel(PhotoRequest::new(FlashMode::On));
        assert_eq!(ticket.request().flash_mode, FlashMode::On);
        completion.complete(Err(CameraError::Capture("no buffer".to_string())));
        match ticket.await {
            Err(CameraError::Capture(msg)) => assert_eq!(msg, "no buffer"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
