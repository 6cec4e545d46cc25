//! Single-writer, multi-reader stream buffers.
//!
//! A [`StreamBuffer`] holds a sliding window of a logically unbounded stream.
//! One producer appends at the write cursor; any number of readers hold
//! independent cursors behind it. Elements are reclaimed once every reader has
//! consumed them, so memory stays bounded by the configured maximum window.
//!
//! Cursors are absolute stream offsets (element 0 is the first element ever
//! produced), which keeps reader arithmetic independent of reclamation: the
//! front of the physical storage corresponds to `base`, and slicing subtracts
//! it.

use std::rc::Rc;

use crate::error::CoreError;

/// Capacity presets for stream buffers, as (initial, maximum) element counts.
///
/// The initial size is allocated up front; the buffer refuses to hold more
/// than the maximum unconsumed elements at once, exerting backpressure on the
/// producer.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BufferUsage {
    /// One frame at a time plus a little slack (frame-rate features).
    SingleFrame,
    /// A handful of frames in flight (windowed analyses with overlap).
    #[default]
    MultipleFrames,
    /// Sample-rate audio with generous lookahead.
    AudioStream,
    /// Very large windows (resampling, long autocorrelations).
    LargeAudioStream,
}

impl BufferUsage {
    /// Returns the (initial, maximum) capacity pair for this preset.
    pub const fn sizes(self) -> (usize, usize) {
        match self {
            BufferUsage::SingleFrame => (1, 16),
            BufferUsage::MultipleFrames => (16, 256),
            BufferUsage::AudioStream => (4096, 16384),
            BufferUsage::LargeAudioStream => (16384, 131072),
        }
    }
}

enum Storage<T> {
    /// Growable producer-owned storage; the front is reclaimed as readers
    /// advance.
    Owned(Vec<T>),
    /// Caller-owned storage aliased without copying. Never written, never
    /// reclaimed.
    Shared(Rc<[T]>),
}

/// A sliding window over a stream, with one writer and independent readers.
pub struct StreamBuffer<T: Clone> {
    storage: Storage<T>,
    /// Absolute stream offset of the first physical element.
    base: usize,
    /// Absolute stream offset one past the last produced element.
    written: usize,
    /// Absolute cursor per reader; `None` marks a detached reader slot.
    readers: Vec<Option<usize>>,
    max_len: usize,
}

impl<T: Clone> StreamBuffer<T> {
    /// Creates an empty owned buffer sized for `usage`.
    pub fn new(usage: BufferUsage) -> Self {
        let (initial, max_len) = usage.sizes();
        Self {
            storage: Storage::Owned(Vec::with_capacity(initial)),
            base: 0,
            written: 0,
            readers: Vec::new(),
            max_len,
        }
    }

    /// Creates a read-only buffer aliasing caller-owned storage.
    ///
    /// The full contents count as already produced; pushes are rejected.
    pub fn shared(data: Rc<[T]>) -> Self {
        let written = data.len();
        Self {
            storage: Storage::Shared(data),
            base: 0,
            written,
            readers: Vec::new(),
            max_len: written.max(1),
        }
    }

    /// Returns the maximum number of unconsumed elements the buffer holds.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Returns the total number of elements ever produced.
    pub fn total_written(&self) -> usize {
        self.written
    }

    /// Registers a new reader starting at the oldest retained element.
    pub fn add_reader(&mut self) -> usize {
        let cursor = self.base;
        for (id, slot) in self.readers.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(cursor);
                return id;
            }
        }
        self.readers.push(Some(cursor));
        self.readers.len() - 1
    }

    /// Detaches a reader; its slot may be reused by a later [`add_reader`].
    ///
    /// [`add_reader`]: StreamBuffer::add_reader
    pub fn remove_reader(&mut self, id: usize) {
        if let Some(slot) = self.readers.get_mut(id) {
            *slot = None;
        }
        self.reclaim();
    }

    /// Returns how many produced elements reader `id` has not yet consumed.
    pub fn available(&self, id: usize) -> usize {
        match self.readers.get(id).copied().flatten() {
            Some(cursor) => self.written - cursor,
            None => 0,
        }
    }

    /// Returns a slice of the next `n` unconsumed elements for reader `id`,
    /// or `None` if fewer than `n` are available.
    pub fn read_slice(&self, id: usize, n: usize) -> Option<&[T]> {
        let cursor = self.readers.get(id).copied().flatten()?;
        if self.written - cursor < n {
            return None;
        }
        let start = cursor - self.base;
        let data: &[T] = match &self.storage {
            Storage::Owned(v) => v,
            Storage::Shared(v) => v,
        };
        Some(&data[start..start + n])
    }

    /// Advances reader `id` by up to `n` elements and reclaims any prefix no
    /// reader still needs.
    ///
    /// The cursor never passes the write cursor; the return value is how far
    /// the reader actually moved, so callers skipping past unproduced data
    /// can carry the shortfall forward.
    pub fn consume(&mut self, id: usize, n: usize) -> usize {
        let mut moved = 0;
        if let Some(slot) = self.readers.get_mut(id)
            && let Some(cursor) = slot
        {
            moved = n.min(self.written - *cursor);
            *cursor += moved;
        }
        self.reclaim();
        moved
    }

    /// Appends one element if the window has room.
    ///
    /// Returns `Ok(false)` when every active reader must first consume more
    /// before the window can grow (backpressure), `Ok(true)` on success.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SharedBufferWrite`] when the buffer aliases
    /// caller-owned storage; `port` names the offending source in the message.
    pub fn try_push(&mut self, value: T, port: &str) -> Result<bool, CoreError> {
        if matches!(self.storage, Storage::Shared(_)) {
            return Err(CoreError::SharedBufferWrite {
                port: port.to_string(),
            });
        }
        let floor = self.reader_floor();
        if self.written - floor + 1 > self.max_len {
            return Ok(false);
        }
        if let Storage::Owned(v) = &mut self.storage {
            v.push(value);
            self.written += 1;
        }
        Ok(true)
    }

    /// Returns how many elements can currently be pushed before backpressure.
    pub fn space(&self) -> usize {
        let floor = self.reader_floor();
        self.max_len - (self.written - floor)
    }

    /// Oldest cursor across active readers, or the write cursor if none.
    fn reader_floor(&self) -> usize {
        self.readers
            .iter()
            .filter_map(|slot| *slot)
            .min()
            .unwrap_or(self.written)
    }

    /// Drops the storage prefix every active reader has consumed.
    fn reclaim(&mut self) {
        let floor = self.reader_floor();
        if floor <= self.base {
            return;
        }
        if let Storage::Owned(v) = &mut self.storage {
            v.drain(..floor - self.base);
            self.base = floor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_all(buf: &mut StreamBuffer<i32>, values: &[i32]) {
        for &v in values {
            assert!(buf.try_push(v, "out").unwrap());
        }
    }

    #[test]
    fn usage_presets_are_ordered() {
        for usage in [
            BufferUsage::SingleFrame,
            BufferUsage::MultipleFrames,
            BufferUsage::AudioStream,
            BufferUsage::LargeAudioStream,
        ] {
            let (initial, max) = usage.sizes();
            assert!(initial >= 1);
            assert!(max >= initial);
        }
    }

    #[test]
    fn single_reader_sees_everything_in_order() {
        let mut buf = StreamBuffer::new(BufferUsage::MultipleFrames);
        let r = buf.add_reader();
        push_all(&mut buf, &[1, 2, 3]);
        assert_eq!(buf.available(r), 3);
        assert_eq!(buf.read_slice(r, 3).unwrap(), &[1, 2, 3]);
        buf.consume(r, 3);
        assert_eq!(buf.available(r), 0);
        assert!(buf.read_slice(r, 1).is_none());
    }

    #[test]
    fn overlap_rereads_unconsumed_tail() {
        // acquire 4, release 2: after consuming 2, the next window must start
        // at the third element.
        let mut buf = StreamBuffer::new(BufferUsage::MultipleFrames);
        let r = buf.add_reader();
        push_all(&mut buf, &[0, 1, 2, 3, 4, 5]);
        assert_eq!(buf.read_slice(r, 4).unwrap(), &[0, 1, 2, 3]);
        buf.consume(r, 2);
        assert_eq!(buf.read_slice(r, 4).unwrap(), &[2, 3, 4, 5]);
    }

    #[test]
    fn consume_reports_short_advance_at_stream_end() {
        let mut buf = StreamBuffer::new(BufferUsage::MultipleFrames);
        let r = buf.add_reader();
        push_all(&mut buf, &[1, 2, 3]);
        // only 3 produced: the cursor stops there and reports it
        assert_eq!(buf.consume(r, 5), 3);
        push_all(&mut buf, &[4, 5]);
        assert_eq!(buf.available(r), 2);
        assert_eq!(buf.consume(r, 2), 2);
    }

    #[test]
    fn independent_readers_do_not_interfere() {
        let mut buf = StreamBuffer::new(BufferUsage::MultipleFrames);
        let a = buf.add_reader();
        let b = buf.add_reader();
        push_all(&mut buf, &[1, 2, 3, 4]);
        buf.consume(a, 4);
        assert_eq!(buf.available(a), 0);
        assert_eq!(buf.available(b), 4);
        assert_eq!(buf.read_slice(b, 4).unwrap(), &[1, 2, 3, 4]);
    }

    #[test]
    fn backpressure_when_slowest_reader_lags() {
        let mut buf = StreamBuffer::new(BufferUsage::SingleFrame); // max 16
        let r = buf.add_reader();
        for i in 0..16 {
            assert!(buf.try_push(i, "out").unwrap());
        }
        assert!(!buf.try_push(99, "out").unwrap());
        buf.consume(r, 1);
        assert!(buf.try_push(99, "out").unwrap());
    }

    #[test]
    fn reclaim_tracks_slowest_reader() {
        let mut buf = StreamBuffer::new(BufferUsage::SingleFrame);
        let fast = buf.add_reader();
        let slow = buf.add_reader();
        for i in 0..16 {
            assert!(buf.try_push(i, "out").unwrap());
        }
        buf.consume(fast, 16);
        // slow pins the window: still full
        assert!(!buf.try_push(16, "out").unwrap());
        buf.consume(slow, 8);
        assert_eq!(buf.space(), 8);
        assert_eq!(buf.read_slice(slow, 8).unwrap(), &[8, 9, 10, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn removing_a_reader_releases_its_pin() {
        let mut buf = StreamBuffer::new(BufferUsage::SingleFrame);
        let active = buf.add_reader();
        let stale = buf.add_reader();
        for i in 0..16 {
            assert!(buf.try_push(i, "out").unwrap());
        }
        buf.consume(active, 16);
        assert!(!buf.try_push(16, "out").unwrap());
        buf.remove_reader(stale);
        assert!(buf.try_push(16, "out").unwrap());
    }

    #[test]
    fn reader_slots_are_reused() {
        let mut buf: StreamBuffer<i32> = StreamBuffer::new(BufferUsage::MultipleFrames);
        let a = buf.add_reader();
        let _b = buf.add_reader();
        buf.remove_reader(a);
        let c = buf.add_reader();
        assert_eq!(c, a);
    }

    #[test]
    fn new_reader_starts_at_oldest_retained() {
        let mut buf = StreamBuffer::new(BufferUsage::MultipleFrames);
        let a = buf.add_reader();
        push_all(&mut buf, &[1, 2, 3, 4]);
        buf.consume(a, 2); // reclaims [1, 2]
        let b = buf.add_reader();
        assert_eq!(buf.read_slice(b, 2).unwrap(), &[3, 4]);
    }

    #[test]
    fn shared_buffer_rejects_writes() {
        let data: Rc<[i32]> = Rc::from(vec![1, 2, 3]);
        let mut buf = StreamBuffer::shared(data);
        let r = buf.add_reader();
        assert_eq!(buf.available(r), 3);
        let err = buf.try_push(4, "data").unwrap_err();
        assert!(matches!(err, CoreError::SharedBufferWrite { .. }));
    }

    #[test]
    fn shared_buffer_reads_without_reclaim() {
        let data: Rc<[i32]> = Rc::from(vec![10, 20, 30, 40]);
        let mut buf = StreamBuffer::shared(data);
        let r = buf.add_reader();
        assert_eq!(buf.read_slice(r, 2).unwrap(), &[10, 20]);
        buf.consume(r, 2);
        assert_eq!(buf.read_slice(r, 2).unwrap(), &[30, 40]);
        buf.consume(r, 2);
        assert_eq!(buf.available(r), 0);
    }
}
