use std::{
    iter::FusedIterator,
    ops::Bound,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    vec,
};

use log::debug;

use crate::llrb::Llrb;

/// Shared cancellation flag for a [`Stream`]. Clones refer to the same
/// flag, so that a party other than the consumer can stop the stream.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        Default::default()
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Lazy, single pass cursor over keys within a range, returned by
/// [`Llrb::stream`](crate::Llrb::stream) and
/// [`Llrb::stream_all`](crate::Llrb::stream_all).
///
/// A stream does not hold on to the tree. It remembers the last key it
/// fetched, and every time its batch runs dry it scans the tree afresh,
/// from just after that key. The tree is passed in on each pull, so that
/// the consumer can mutate it in between:
///
/// ```
/// use llrb_map::{Empty, Llrb};
///
/// let mut llrb: Llrb<i64, Empty> = Llrb::new("doc");
/// (0..10).for_each(|key| { llrb.set(key * 2, Empty); });
///
/// let mut stream = llrb.stream(&0, &10);
/// while let Some(key) = stream.next(&llrb) {
///     llrb.set(key + 1, Empty);
/// }
/// assert!(llrb.validate().is_ok());
/// ```
///
/// Keys inserted or deleted ahead of the cursor may or may not show up,
/// and the pending batch is not refreshed. Keys produced are always in
/// ascending order and within the range.
///
/// Once cancelled, either through [`Stream::cancel`] or the stream's
/// [`CancelToken`], the stream drops whatever it has already fetched,
/// visits no more nodes and yields `None` forever.
pub struct Stream<K> {
    low: Option<Bound<K>>, // resume point, None once finished
    high: Bound<K>,
    batch: vec::IntoIter<K>,
    token: CancelToken,
}

impl<K> Stream<K>
where
    K: Clone + Ord,
{
    pub(crate) fn new(low: Bound<K>, high: Bound<K>, token: CancelToken) -> Stream<K> {
        Stream {
            low: Some(low),
            high,
            batch: vec![].into_iter(),
            token,
        }
    }

    pub(crate) fn closed(token: CancelToken) -> Stream<K> {
        Stream {
            low: None,
            high: Bound::Unbounded,
            batch: vec![].into_iter(),
            token,
        }
    }

    /// Pull the next key from `llrb`. Return `None` when the range is
    /// exhausted or the stream is cancelled, and on every call after that.
    ///
    /// Pass the same instance the stream was created from.
    pub fn next<V>(&mut self, llrb: &Llrb<K, V>) -> Option<K>
    where
        V: Clone,
    {
        if self.token.is_cancelled() {
            self.finish();
            return None;
        }
        if let Some(key) = self.batch.next() {
            return Some(key);
        }

        let batch = llrb.scan_keys(self.low.as_ref()?, &self.high);
        match batch.last() {
            Some(last) => self.low = Some(Bound::Excluded(last.clone())),
            None => {
                self.finish();
                return None;
            }
        }
        self.batch = batch.into_iter();
        self.batch.next()
    }

    /// Borrow `llrb` and consume this stream as an [`Iterator`]. The
    /// stream stays usable once the iterator is dropped.
    pub fn iter<'a, V>(&'a mut self, llrb: &'a Llrb<K, V>) -> Keys<'a, K, V>
    where
        V: Clone,
    {
        Keys { stream: self, llrb }
    }

    /// Return a handle that can cancel this stream from elsewhere.
    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Cancel this stream, no further keys shall be produced.
    pub fn cancel(&mut self) {
        self.token.cancel();
        self.finish();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Return true once the stream can produce no more keys.
    pub fn is_done(&self) -> bool {
        self.low.is_none() && self.batch.len() == 0
    }

    fn finish(&mut self) {
        if !self.is_done() && self.token.is_cancelled() {
            debug!("stream cancelled");
        }
        self.low = None;
        self.batch = vec![].into_iter();
    }
}

/// Iterator over the keys of a [`Stream`], returned by [`Stream::iter`].
pub struct Keys<'a, K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    stream: &'a mut Stream<K>,
    llrb: &'a Llrb<K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.stream.next(self.llrb)
    }
}

impl<'a, K, V> FusedIterator for Keys<'a, K, V>
where
    K: Clone + Ord,
    V: Clone,
{
}
