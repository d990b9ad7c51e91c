//! Pipeline pump
//!
//! The packet/drain decision at the heart of the playback loop, split
//! from the GL side so the protocol can be exercised with fakes.

use ffmpeg_next::Packet;
use tracing::{debug, warn};

use crate::media::{Drain, MediaError, MediaSource, VideoDecoder};

/// Source half of the pump: demuxed packets tagged with their stream.
pub trait PacketFeed {
    type Packet;

    /// Next packet and its stream index; `None` at end of stream.
    fn read_packet(&mut self) -> Option<(usize, Self::Packet)>;

    /// Index of the selected video stream.
    fn stream_index(&self) -> usize;
}

/// Decoder half of the pump: the two-phase submit/drain protocol.
pub trait DecodeSink {
    type Packet;

    fn submit(&mut self, packet: &Self::Packet) -> Result<(), MediaError>;
    fn receive(&mut self) -> Result<Drain, MediaError>;
    fn flush(&mut self);
}

/// Drive the protocol until the sink holds the next decoded picture.
/// Returns `false` once the stream is exhausted and the sink fully
/// drained.
///
/// The sink is polled until `Pending` before any new packet goes in;
/// every packet read here is released when its branch ends, whether it
/// was submitted, rejected or belonged to another stream. Decode
/// errors never leave the loop.
pub fn next_picture<F, D>(feed: &mut F, sink: &mut D) -> bool
where
    F: PacketFeed,
    D: DecodeSink<Packet = F::Packet>,
{
    loop {
        match sink.receive() {
            Ok(Drain::Frame) => return true,
            Ok(Drain::Pending) => match feed.read_packet() {
                Some((index, packet)) if index == feed.stream_index() => {
                    if let Err(e) = sink.submit(&packet) {
                        warn!("packet skipped: {e}");
                    }
                }
                Some(_) => {
                    // Packet from another stream; dropped unread.
                }
                None => {
                    debug!("end of stream, draining decoder");
                    sink.flush();
                }
            },
            Ok(Drain::Flushed) => return false,
            Err(e) => {
                debug_assert!(!e.is_fatal());
                warn!("decode error, continuing: {e}");
            }
        }
    }
}

impl PacketFeed for MediaSource {
    type Packet = Packet;

    fn read_packet(&mut self) -> Option<(usize, Packet)> {
        MediaSource::read_packet(self)
    }

    fn stream_index(&self) -> usize {
        MediaSource::stream_index(self)
    }
}

impl DecodeSink for VideoDecoder {
    type Packet = Packet;

    fn submit(&mut self, packet: &Packet) -> Result<(), MediaError> {
        VideoDecoder::submit(self, packet)
    }

    fn receive(&mut self) -> Result<Drain, MediaError> {
        VideoDecoder::receive(self)
    }

    fn flush(&mut self) {
        VideoDecoder::flush(self)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use ffmpeg_next as ffmpeg;

    use super::*;

    /// Packet stand-in that counts its own release.
    struct CountedPacket {
        drops: Rc<Cell<usize>>,
    }

    impl Drop for CountedPacket {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    struct ScriptedFeed {
        packets: VecDeque<(usize, CountedPacket)>,
        video_index: usize,
    }

    impl ScriptedFeed {
        /// One packet per entry in `streams`, tagged with that stream
        /// index. Also returns the shared release counter.
        fn new(streams: &[usize], video_index: usize) -> (Self, Rc<Cell<usize>>) {
            let drops = Rc::new(Cell::new(0));
            let packets = streams
                .iter()
                .map(|&s| {
                    (
                        s,
                        CountedPacket {
                            drops: drops.clone(),
                        },
                    )
                })
                .collect();
            (
                Self {
                    packets,
                    video_index,
                },
                drops,
            )
        }
    }

    impl PacketFeed for ScriptedFeed {
        type Packet = CountedPacket;

        fn read_packet(&mut self) -> Option<(usize, CountedPacket)> {
            self.packets.pop_front()
        }

        fn stream_index(&self) -> usize {
            self.video_index
        }
    }

    /// Decoder fake: each submitted packet enqueues its scripted yield
    /// run; `receive` falls back to `Pending` (or `Flushed` once
    /// flushing) when the queue is empty.
    struct ScriptedSink {
        per_packet: VecDeque<Vec<Result<Drain, MediaError>>>,
        /// Yields released by `flush`, like reordering-delayed pictures.
        tail: Vec<Result<Drain, MediaError>>,
        out: VecDeque<Result<Drain, MediaError>>,
        submits: usize,
        receives: usize,
        flushes: usize,
    }

    impl ScriptedSink {
        fn new(per_packet: Vec<Vec<Result<Drain, MediaError>>>) -> Self {
            Self {
                per_packet: per_packet.into(),
                tail: Vec::new(),
                out: VecDeque::new(),
                submits: 0,
                receives: 0,
                flushes: 0,
            }
        }
    }

    impl DecodeSink for ScriptedSink {
        type Packet = CountedPacket;

        fn submit(&mut self, _packet: &CountedPacket) -> Result<(), MediaError> {
            assert!(
                self.out.is_empty(),
                "submitted before the previous drain finished"
            );
            self.submits += 1;
            if let Some(run) = self.per_packet.pop_front() {
                self.out.extend(run);
            }
            Ok(())
        }

        fn receive(&mut self) -> Result<Drain, MediaError> {
            self.receives += 1;
            if let Some(next) = self.out.pop_front() {
                next
            } else if self.flushes > 0 {
                Ok(Drain::Flushed)
            } else {
                Ok(Drain::Pending)
            }
        }

        fn flush(&mut self) {
            self.flushes += 1;
            let tail = std::mem::take(&mut self.tail);
            self.out.extend(tail);
        }
    }

    #[test]
    fn drains_every_frame_before_the_next_submit() {
        let (mut feed, _drops) = ScriptedFeed::new(&[0, 0], 0);
        let mut sink = ScriptedSink::new(vec![
            vec![Ok(Drain::Frame), Ok(Drain::Frame)],
            vec![Ok(Drain::Frame)],
        ]);

        assert!(next_picture(&mut feed, &mut sink));
        assert!(next_picture(&mut feed, &mut sink));
        assert!(next_picture(&mut feed, &mut sink));
        assert!(!next_picture(&mut feed, &mut sink));

        // The sink itself asserts nothing was queued at submit time.
        assert_eq!(sink.submits, 2);
        // 3 frames, one Pending before each packet and at end of
        // stream, one Flushed.
        assert_eq!(sink.receives, 7);
    }

    #[test]
    fn decode_error_does_not_end_playback() {
        let (mut feed, _drops) = ScriptedFeed::new(&[0, 0], 0);
        let mut sink = ScriptedSink::new(vec![
            vec![Err(MediaError::Decode(ffmpeg::Error::InvalidData))],
            vec![Ok(Drain::Frame)],
        ]);

        // The corrupt packet is skipped; the next one still presents.
        assert!(next_picture(&mut feed, &mut sink));
        assert_eq!(sink.submits, 2);
        assert!(!next_picture(&mut feed, &mut sink));
    }

    #[test]
    fn non_video_packets_never_reach_the_decoder() {
        let (mut feed, drops) = ScriptedFeed::new(&[1, 2, 0], 0);
        let mut sink = ScriptedSink::new(vec![vec![Ok(Drain::Frame)]]);

        assert!(next_picture(&mut feed, &mut sink));
        assert_eq!(sink.submits, 1);
        // All three packets released, the video one right after submit.
        assert_eq!(drops.get(), 3);
    }

    #[test]
    fn every_packet_is_released_exactly_once() {
        let (mut feed, drops) = ScriptedFeed::new(&[0, 1, 0], 0);
        let mut sink = ScriptedSink::new(vec![
            vec![Err(MediaError::Decode(ffmpeg::Error::InvalidData))],
            vec![Ok(Drain::Frame)],
        ]);

        assert!(next_picture(&mut feed, &mut sink));
        assert!(!next_picture(&mut feed, &mut sink));
        // One release per packet read: erroring, non-video and good alike.
        assert_eq!(drops.get(), 3);
    }

    #[test]
    fn flush_drains_buffered_tail_frames() {
        let (mut feed, _drops) = ScriptedFeed::new(&[], 0);
        let mut sink = ScriptedSink::new(vec![]);
        sink.tail = vec![Ok(Drain::Frame)];

        // Reordering delay: one last picture surfaces after EOF.
        assert!(next_picture(&mut feed, &mut sink));
        assert!(!next_picture(&mut feed, &mut sink));
        assert_eq!(sink.flushes, 1);
    }
}
