//! Frame assembly as a stream combinator

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::assembly::FrameStage;
use crate::{CaptureEvent, Result};

/// Extension trait to add frame assembly to a stream of capture events
pub trait AssembleExt: Stream<Item = Result<CaptureEvent>> {
    /// Feed every decoded buffer through `stage`
    ///
    /// Buffers and diagnostics pass through in order, with completed frames
    /// and assembly diagnostics inserted after the buffer that caused them.
    /// The stream ends early once the stage's frame limit is reached.
    fn assemble_frames(self, stage: FrameStage) -> AssembleFrames<Self>
    where
        Self: Sized,
    {
        AssembleFrames::new(self, stage)
    }
}

impl<T: Stream<Item = Result<CaptureEvent>>> AssembleExt for T {}

pin_project! {
    /// A stream combinator that assembles frames from decoded buffers
    pub struct AssembleFrames<S> {
        #[pin]
        stream: S,
        stage: FrameStage,
        out: VecDeque<CaptureEvent>,
        finished: bool,
    }
}

impl<S> AssembleFrames<S> {
    pub fn new(stream: S, stage: FrameStage) -> Self {
        Self { stream, stage, out: VecDeque::new(), finished: false }
    }

    pub fn stage(&self) -> &FrameStage {
        &self.stage
    }
}

impl<S: Stream<Item = Result<CaptureEvent>>> Stream for AssembleFrames<S> {
    type Item = Result<CaptureEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(event) = this.out.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if *this.finished || this.stage.is_done() {
                return Poll::Ready(None);
            }

            match ready!(this.stream.as_mut().poll_next(cx)) {
                Some(Ok(CaptureEvent::Buffer(buffer))) => this.stage.on_buffer(buffer, this.out),
                Some(Ok(other)) => this.out.push_back(other),
                Some(Err(e)) => {
                    *this.finished = true;
                    return Poll::Ready(Some(Err(e)));
                }
                None => {
                    this.stage.on_end(this.out);
                    *this.finished = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        BufferFlags, DecodeError, DecodedBuffer, DiagnosticEvent, FrameShape, HeaderFields,
        TransformMode,
    };
    use futures::StreamExt;

    fn buffer(index: u64, frame_num: u32, samples: Vec<u32>) -> Result<CaptureEvent> {
        Ok(CaptureEvent::Buffer(DecodedBuffer {
            index,
            stream_offset: 0,
            bit_offset: 0,
            mode: TransformMode::BitsThenBytes,
            bit_len: 0,
            header: Some(HeaderFields { frame_num, ..Default::default() }),
            samples,
            payload_padding: 0,
            flags: BufferFlags::new(),
        }))
    }

    #[tokio::test]
    async fn frames_follow_their_buffers() {
        let input =
            futures::stream::iter(vec![buffer(0, 1, vec![1, 2, 3]), buffer(1, 1, vec![4, 5, 6])]);
        let stage = FrameStage::new(FrameShape { width: 2, height: 2 }, None).unwrap();
        let events: Vec<CaptureEvent> =
            input.assemble_frames(stage).map(|e| e.unwrap()).collect().await;

        assert!(matches!(events[0], CaptureEvent::Buffer(_)));
        assert!(matches!(events[1], CaptureEvent::Buffer(_)));
        match &events[2] {
            CaptureEvent::Frame(frame) => assert_eq!(frame.samples, vec![1, 2, 3, 4]),
            other => panic!("expected frame, got {:?}", other),
        }
        assert_eq!(
            events[3],
            CaptureEvent::Diagnostic(DiagnosticEvent::PartialFrame { frame_index: 1, padded: 2 })
        );
        assert_eq!(events.len(), 5);
    }

    #[tokio::test]
    async fn errors_end_the_stream() {
        let input = futures::stream::iter(vec![
            buffer(0, 1, vec![1]),
            Err(DecodeError::io_error("test", std::io::Error::other("gone"))),
            buffer(1, 1, vec![2]),
        ]);
        let stage = FrameStage::new(FrameShape { width: 4, height: 4 }, None).unwrap();
        let events: Vec<_> = input.assemble_frames(stage).collect().await;
        assert_eq!(events.len(), 2);
        assert!(events[1].is_err());
    }

    #[tokio::test]
    async fn frame_limit_ends_the_stream() {
        let input = futures::stream::iter((0..10).map(|i| buffer(i, i as u32, vec![0; 4])));
        let stage = FrameStage::new(FrameShape { width: 2, height: 2 }, Some(3)).unwrap();
        let frames = input
            .assemble_frames(stage)
            .filter(|e| futures::future::ready(matches!(e, Ok(CaptureEvent::Frame(_)))))
            .count()
            .await;
        assert_eq!(frames, 3);
    }
}
