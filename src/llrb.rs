use std::{
    borrow::Borrow,
    cmp::{Ord, Ordering},
    mem,
    ops::{Bound, DerefMut, RangeBounds},
};

use log::{debug, warn};

use crate::depth::Depth;
use crate::error::LlrbError;
use crate::stream::{CancelToken, Stream};

/// Default number of entries fetched from the tree, in one scan, by
/// range iterators and streams.
pub const ITER_LIMIT: usize = 100;

/// Llrb manage a single instance of in-memory ordered map using
/// [left-leaning-red-black][llrb] tree.
///
/// Every node caches the size of its sub-tree, so that [`Llrb::rank`]
/// and [`Llrb::select`] complete in O(log n).
///
/// [llrb]: https://en.wikipedia.org/wiki/Left-leaning_red-black_tree
#[derive(Clone)]
pub struct Llrb<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    name: String,
    root: Option<Box<Node<K, V>>>,
    iter_limit: usize,
}

/// Different ways to construct a new Llrb instance.
impl<K, V> Llrb<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Create an empty instance of Llrb, identified by `name`.
    /// Applications can choose unique names.
    pub fn new<S>(name: S) -> Llrb<K, V>
    where
        S: AsRef<str>,
    {
        Llrb {
            name: name.as_ref().to_string(),
            root: Default::default(),
            iter_limit: ITER_LIMIT,
        }
    }

    /// Create a new instance of Llrb tree and load it with entries
    /// from `iter`. Note that iterator should return (key, value) tuples,
    /// where key must be ``unique``.
    pub fn load_from<S, I>(name: S, iter: I) -> Result<Llrb<K, V>, LlrbError<K>>
    where
        S: AsRef<str>,
        I: Iterator<Item = (K, V)>,
    {
        let mut llrb = Llrb::new(name);
        for (key, value) in iter {
            llrb.create(key, value)?;
        }
        debug!("llrb {:?} loaded with {} entries", llrb.name, llrb.len());
        Ok(llrb)
    }
}

/// Maintenance API.
impl<K, V> Llrb<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Identify this instance. Applications can choose unique names while
    /// creating Llrb instances.
    #[inline]
    pub fn id(&self) -> String {
        self.name.clone()
    }

    /// Number of entries scanned per batch by [`Range`], [`Reverse`]
    /// and [`Stream`]. A limit of zero is treated as one.
    pub fn set_iter_limit(&mut self, limit: usize) -> &mut Self {
        self.iter_limit = limit.max(1);
        self
    }

    /// Return number of entries in this instance.
    #[inline]
    pub fn len(&self) -> usize {
        size(self.root.as_deref())
    }

    /// Check whether this index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Return the length of the longest path from root to a leaf,
    /// `0` for a single entry and `-1` for an empty tree. Computed by
    /// a full traversal.
    pub fn height(&self) -> isize {
        Llrb::node_height(self.root.as_deref())
    }

    /// Return quickly with basic statisics, only entries() method is valid
    /// with this statisics.
    pub fn stats(&self) -> Stats {
        Stats::new(self.len(), mem::size_of::<Node<K, V>>())
    }

    /// Validate LLRB tree with following rules:
    ///
    /// * Keys are in sort order.
    /// * From root to any leaf, no consecutive reds allowed in its path.
    /// * Red links always lean left.
    /// * Number of blacks should be same under left child and right child.
    /// * Cached sub-tree sizes match the actual count of nodes.
    /// * Root is black.
    ///
    /// Additionally return full statistics on the tree. Refer to [`Stats`]
    /// for more information.
    pub fn validate(&self) -> Result<Stats, LlrbError<K>> {
        let root = self.root.as_deref();
        if is_red(root) {
            warn!("llrb {:?} validate: red root", self.name);
            return Err(LlrbError::RedRoot);
        }
        let mut stats = Stats::new(self.len(), mem::size_of::<Node<K, V>>());
        stats.set_depths(Depth::new());
        match Llrb::validate_tree(root, false, 0, 0, &mut stats) {
            Ok((blacks, _)) => {
                stats.set_blacks(blacks);
                Ok(stats)
            }
            Err(err) => {
                warn!("llrb {:?} validate: {}", self.name, err.kind());
                Err(err)
            }
        }
    }
}

type Upsert<K, V> = (Box<Node<K, V>>, Option<V>);

type Delete<K, V> = (Option<Box<Node<K, V>>>, Option<V>);

type Delmin<K, V> = (Option<Box<Node<K, V>>>, Option<Box<Node<K, V>>>);

/// Write operations on Llrb instance.
impl<K, V> Llrb<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Create a new {key, value} entry in the index. If key is already
    /// present return error and leave the index untouched.
    pub fn create(&mut self, key: K, value: V) -> Result<(), LlrbError<K>> {
        if self.contains(&key) {
            return Err(LlrbError::OverwriteKey);
        }
        self.set(key, value);
        Ok(())
    }

    /// Set value for key. If there is an existing entry for key,
    /// overwrite the old key and value with new ones and return the
    /// old value.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        let (mut root, old_value) = Llrb::upsert(self.root.take(), key, value);
        root.set_black();
        self.root = Some(root);
        old_value
    }

    /// Delete key from this instance and return its value. If key is
    /// not present, then delete is effectively a no-op.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if !self.contains(key) {
            return None;
        }
        let root = Llrb::redden_root(self.root.take());
        let (root, old_value) = Llrb::do_delete(root, key);
        self.root = Llrb::blacken_root(root);
        old_value
    }

    /// Delete the entry with smallest key and return it. No-op on an
    /// empty index.
    pub fn delete_min(&mut self) -> Option<(K, V)> {
        let root = Llrb::redden_root(self.root.take());
        let (root, old_node) = Llrb::do_delete_min(root);
        self.root = Llrb::blacken_root(root);
        old_node.map(|node| node.into_entry())
    }

    /// Delete the entry with largest key and return it. No-op on an
    /// empty index.
    pub fn delete_max(&mut self) -> Option<(K, V)> {
        let root = Llrb::redden_root(self.root.take());
        let (root, old_node) = Llrb::do_delete_max(root);
        self.root = Llrb::blacken_root(root);
        old_node.map(|node| node.into_entry())
    }

    // if both children of root are black, set root to red.
    fn redden_root(root: Option<Box<Node<K, V>>>) -> Option<Box<Node<K, V>>> {
        root.map(|mut root| {
            if !is_red(root.left_deref()) && !is_red(root.right_deref()) {
                root.set_red();
            }
            root
        })
    }

    fn blacken_root(root: Option<Box<Node<K, V>>>) -> Option<Box<Node<K, V>>> {
        root.map(|mut root| {
            root.set_black();
            root
        })
    }
}

/// Read operations on Llrb instance.
impl<K, V> Llrb<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Get the value for key.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_node(key).map(|node| node.value.clone())
    }

    /// Check whether key is present in this index.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_node(key).is_some()
    }

    /// Return the smallest key.
    pub fn min(&self) -> Option<K> {
        let mut node = self.root.as_deref()?;
        while let Some(left) = node.left_deref() {
            node = left;
        }
        Some(node.key.clone())
    }

    /// Return the largest key.
    pub fn max(&self) -> Option<K> {
        let mut node = self.root.as_deref()?;
        while let Some(right) = node.right_deref() {
            node = right;
        }
        Some(node.key.clone())
    }

    /// Return the largest key less than or equal to `key`.
    pub fn floor<Q>(&self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (mut node, mut floor) = (self.root.as_deref(), None);
        while let Some(nref) = node {
            node = match key.cmp(nref.key.borrow()) {
                Ordering::Less => nref.left_deref(),
                Ordering::Greater => {
                    floor = Some(nref);
                    nref.right_deref()
                }
                Ordering::Equal => return Some(nref.key.clone()),
            };
        }
        floor.map(|node| node.key.clone())
    }

    /// Return the smallest key greater than or equal to `key`.
    pub fn ceiling<Q>(&self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (mut node, mut ceiling) = (self.root.as_deref(), None);
        while let Some(nref) = node {
            node = match key.cmp(nref.key.borrow()) {
                Ordering::Less => {
                    ceiling = Some(nref);
                    nref.left_deref()
                }
                Ordering::Greater => nref.right_deref(),
                Ordering::Equal => return Some(nref.key.clone()),
            };
        }
        ceiling.map(|node| node.key.clone())
    }

    /// Return the number of keys strictly less than `key`.
    pub fn rank<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (mut node, mut rank) = (self.root.as_deref(), 0);
        while let Some(nref) = node {
            let left = nref.left_deref();
            node = match key.cmp(nref.key.borrow()) {
                Ordering::Less => left,
                Ordering::Greater => {
                    rank += 1 + size(left);
                    nref.right_deref()
                }
                Ordering::Equal => return rank + size(left),
            };
        }
        rank
    }

    /// Return the key that has exactly `k` smaller keys in this index.
    /// Inverse of [`Llrb::rank`].
    pub fn select(&self, mut k: usize) -> Option<K> {
        if k >= self.len() {
            return None;
        }
        let mut node = self.root.as_deref();
        while let Some(nref) = node {
            let n = size(nref.left_deref());
            node = match k.cmp(&n) {
                Ordering::Less => nref.left_deref(),
                Ordering::Greater => {
                    k -= n + 1;
                    nref.right_deref()
                }
                Ordering::Equal => return Some(nref.key.clone()),
            };
        }
        None
    }

    /// Return all keys in sort order.
    pub fn keys(&self) -> Vec<K> {
        let mut acc = Vec::with_capacity(self.len());
        Llrb::collect_keys::<K>(self.root.as_deref(), &mut acc, None, None);
        acc
    }

    /// Return keys between `low` and `high`, both inclusive, in sort
    /// order. Empty when `low` is greater than `high`.
    pub fn keys_in_range<Q>(&self, low: &Q, high: &Q) -> Vec<K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut acc = vec![];
        if low.gt(high) {
            return acc;
        }
        Llrb::collect_keys(self.root.as_deref(), &mut acc, Some(low), Some(high));
        acc
    }

    /// Return an iterator over all entries in this instance.
    pub fn iter(&self) -> Range<K, V> {
        Range {
            root: self.root.as_deref(),
            batch: vec![].into_iter(),
            low: Some(Bound::Unbounded),
            high: Bound::Unbounded,
            limit: self.iter_limit,
        }
    }

    /// Range over all entries from low to high.
    pub fn range<Q, R>(&self, range: R) -> Range<K, V>
    where
        K: Borrow<Q>,
        R: RangeBounds<Q>,
        Q: Ord + ToOwned<Owned = K> + ?Sized,
    {
        Range {
            root: self.root.as_deref(),
            batch: vec![].into_iter(),
            low: Some(to_owned_bound(range.start_bound())),
            high: to_owned_bound(range.end_bound()),
            limit: self.iter_limit,
        }
    }

    /// Stream keys between `low` and `high`, both inclusive, in sort
    /// order. The stream is lazy and can be cancelled by the consumer,
    /// or by anyone holding its [`CancelToken`].
    ///
    /// The returned [`Stream`] does not borrow this instance, keys are
    /// pulled with [`Stream::next`], hence the consumer is free to
    /// mutate the tree between two pulls.
    pub fn stream<Q>(&self, low: &Q, high: &Q) -> Stream<K>
    where
        K: Borrow<Q>,
        Q: Ord + ToOwned<Owned = K> + ?Sized,
    {
        self.stream_with(low, high, CancelToken::new())
    }

    /// Same as [`Llrb::stream`], cancelled through a token supplied by
    /// the caller.
    pub fn stream_with<Q>(&self, low: &Q, high: &Q, token: CancelToken) -> Stream<K>
    where
        K: Borrow<Q>,
        Q: Ord + ToOwned<Owned = K> + ?Sized,
    {
        if low.gt(high) {
            return Stream::closed(token);
        }
        let (low, high) = (low.to_owned(), high.to_owned());
        Stream::new(Bound::Included(low), Bound::Included(high), token)
    }

    /// Stream all keys in this instance, in sort order. Refer to
    /// [`Llrb::stream`].
    pub fn stream_all(&self) -> Stream<K> {
        self.stream_all_with(CancelToken::new())
    }

    /// Same as [`Llrb::stream_all`], cancelled through a token supplied
    /// by the caller.
    pub fn stream_all_with(&self, token: CancelToken) -> Stream<K> {
        Stream::new(Bound::Unbounded, Bound::Unbounded, token)
    }

    // next batch of keys for a stream, scanned afresh from the root.
    pub(crate) fn scan_keys(&self, low: &Bound<K>, high: &Bound<K>) -> Vec<K> {
        let mut acc = Vec::with_capacity(self.iter_limit);
        let root = self.root.as_deref();
        scan_asc(root, low, high, self.iter_limit, &mut acc, &|node: &Node<K, V>| {
            node.key.clone()
        });
        acc
    }

    fn get_node<Q>(&self, key: &Q) -> Option<&Node<K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = self.root.as_deref();
        while let Some(nref) = node {
            node = match key.cmp(nref.key.borrow()) {
                Ordering::Less => nref.left_deref(),
                Ordering::Greater => nref.right_deref(),
                Ordering::Equal => return Some(nref),
            };
        }
        None
    }

    // in-order walk, pruning sub-trees outside [low, high].
    fn collect_keys<Q>(node: Option<&Node<K, V>>, acc: &mut Vec<K>, low: Option<&Q>, high: Option<&Q>)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = match node {
            None => return,
            Some(node) => node,
        };
        let key: &Q = node.key.borrow();
        let cmplo = low.map_or(Ordering::Less, |low| low.cmp(key));
        let cmphi = high.map_or(Ordering::Greater, |high| high.cmp(key));
        if cmplo == Ordering::Less {
            Llrb::collect_keys(node.left_deref(), acc, low, high);
        }
        if cmplo != Ordering::Greater && cmphi != Ordering::Less {
            acc.push(node.key.clone());
        }
        if cmphi == Ordering::Greater {
            Llrb::collect_keys(node.right_deref(), acc, low, high);
        }
    }

    fn node_height(node: Option<&Node<K, V>>) -> isize {
        match node {
            None => -1,
            Some(node) => {
                let lh = Llrb::node_height(node.left_deref());
                let rh = Llrb::node_height(node.right_deref());
                1 + lh.max(rh)
            }
        }
    }
}

impl<K, V> Llrb<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    fn upsert(node: Option<Box<Node<K, V>>>, key: K, value: V) -> Upsert<K, V> {
        let mut node = match node {
            None => return (Node::new(key, value), None),
            Some(node) => node,
        };

        let old_value = match key.cmp(&node.key) {
            Ordering::Less => {
                let (left, o) = Llrb::upsert(node.left.take(), key, value);
                node.left = Some(left);
                o
            }
            Ordering::Greater => {
                let (right, o) = Llrb::upsert(node.right.take(), key, value);
                node.right = Some(right);
                o
            }
            Ordering::Equal => {
                node.key = key;
                Some(mem::replace(&mut node.value, value))
            }
        };
        (Llrb::walkuprot_23(node), old_value)
    }

    // key must be present in the sub-tree, otherwise the move-red
    // transformations would run into missing children.
    fn do_delete<Q>(node: Option<Box<Node<K, V>>>, key: &Q) -> Delete<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = match node {
            None => return (None, None),
            Some(node) => node,
        };

        if key.lt(node.key.borrow()) {
            let left = node.left_deref();
            if !is_red(left) && !is_red(left.and_then(Node::left_deref)) {
                node = Llrb::move_red_left(node);
            }
            let (left, old_value) = Llrb::do_delete(node.left.take(), key);
            node.left = left;
            return (Some(Llrb::fixup(node)), old_value);
        }

        if is_red(node.left_deref()) {
            node = Llrb::rotate_right(node);
        }

        if key.eq(node.key.borrow()) && node.right.is_none() {
            return (None, Some(node.into_entry().1));
        }

        let right = node.right_deref();
        if !is_red(right) && !is_red(right.and_then(Node::left_deref)) {
            node = Llrb::move_red_right(node);
        }

        if key.eq(node.key.borrow()) {
            // replace with the successor, the minimum of right sub-tree.
            let (right, succ) = Llrb::do_delete_min(node.right.take());
            node.right = right;
            let (skey, svalue) = match succ {
                Some(succ) => succ.into_entry(),
                None => panic!("do_delete(): missing successor, call the programmer"),
            };
            node.key = skey;
            let old_value = mem::replace(&mut node.value, svalue);
            (Some(Llrb::fixup(node)), Some(old_value))
        } else {
            let (right, old_value) = Llrb::do_delete(node.right.take(), key);
            node.right = right;
            (Some(Llrb::fixup(node)), old_value)
        }
    }

    fn do_delete_min(node: Option<Box<Node<K, V>>>) -> Delmin<K, V> {
        let mut node = match node {
            None => return (None, None),
            Some(node) => node,
        };
        if node.left.is_none() {
            return (None, Some(node));
        }
        let left = node.left_deref();
        if !is_red(left) && !is_red(left.and_then(Node::left_deref)) {
            node = Llrb::move_red_left(node);
        }
        let (left, old_node) = Llrb::do_delete_min(node.left.take());
        node.left = left;
        (Some(Llrb::fixup(node)), old_node)
    }

    fn do_delete_max(node: Option<Box<Node<K, V>>>) -> Delmin<K, V> {
        let mut node = match node {
            None => return (None, None),
            Some(node) => node,
        };
        if is_red(node.left_deref()) {
            node = Llrb::rotate_right(node);
        }
        if node.right.is_none() {
            return (None, Some(node));
        }
        let right = node.right_deref();
        if !is_red(right) && !is_red(right.and_then(Node::left_deref)) {
            node = Llrb::move_red_right(node);
        }
        let (right, old_node) = Llrb::do_delete_max(node.right.take());
        node.right = right;
        (Some(Llrb::fixup(node)), old_node)
    }

    // return (black-height, sub-tree size)
    fn validate_tree(
        node: Option<&Node<K, V>>,
        fromred: bool,
        mut nb: usize,
        depth: usize,
        stats: &mut Stats,
    ) -> Result<(usize, usize), LlrbError<K>> {
        let node = match node {
            None => {
                if let Some(depths) = stats.depths.as_mut() {
                    depths.sample(depth);
                }
                return Ok((nb, 0));
            }
            Some(node) => node,
        };

        let red = node.is_red();
        if fromred && red {
            return Err(LlrbError::ConsecutiveReds);
        }
        if !red {
            nb += 1;
        }
        let (left, right) = (node.left_deref(), node.right_deref());
        if is_red(right) {
            return Err(LlrbError::RightLeaningRed);
        }
        let (lblacks, lsize) = Llrb::validate_tree(left, red, nb, depth + 1, stats)?;
        let (rblacks, rsize) = Llrb::validate_tree(right, red, nb, depth + 1, stats)?;
        if lblacks != rblacks {
            let err = format!("left: {} right: {}", lblacks, rblacks);
            return Err(LlrbError::UnbalancedBlacks(err));
        }
        if let Some(left) = left {
            if left.key.ge(&node.key) {
                let (lkey, parent) = (left.key.clone(), node.key.clone());
                return Err(LlrbError::SortError(lkey, parent));
            }
        }
        if let Some(right) = right {
            if right.key.le(&node.key) {
                let (rkey, parent) = (right.key.clone(), node.key.clone());
                return Err(LlrbError::SortError(rkey, parent));
            }
        }
        let n = 1 + lsize + rsize;
        if node.size != n {
            return Err(LlrbError::SizeMismatch(n, node.size));
        }
        Ok((lblacks, n))
    }

    //--------- rotation routines for 2-3 algorithm ----------------

    fn walkuprot_23(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        if is_red(node.right_deref()) && !is_red(node.left_deref()) {
            node = Llrb::rotate_left(node);
        }
        let left = node.left_deref();
        if is_red(left) && is_red(left.and_then(Node::left_deref)) {
            node = Llrb::rotate_right(node);
        }
        if is_red(node.left_deref()) && is_red(node.right_deref()) {
            Llrb::flip(node.deref_mut())
        }
        node.update_size();
        node
    }

    //              (i)                       (i)
    //               |                         |
    //              node                       x
    //              /  \                      / \
    //             /    (r)                 (r)  \
    //            /       \                 /     \
    //          left       x             node      xr
    //                    / \            /  \
    //                  xl   xr       left   xl
    //
    fn rotate_left(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        let mut x = match node.right.take() {
            Some(x) if x.is_red() => x,
            _ => panic!("rotate_left(): rotating a black link ? call the programmer"),
        };
        node.right = x.left.take();
        x.color = node.color;
        x.size = node.size;
        node.set_red();
        node.update_size();
        x.left = Some(node);
        x
    }

    //              (i)                       (i)
    //               |                         |
    //              node                       x
    //              /  \                      / \
    //            (r)   \                   (r)  \
    //           /       \                 /      \
    //          x       right             xl      node
    //         / \                                / \
    //       xl   xr                             xr  right
    //
    fn rotate_right(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        let mut x = match node.left.take() {
            Some(x) if x.is_red() => x,
            _ => panic!("rotate_right(): rotating a black link ? call the programmer"),
        };
        node.left = x.right.take();
        x.color = node.color;
        x.size = node.size;
        node.set_red();
        node.update_size();
        x.right = Some(node);
        x
    }

    //        (x)                   (!x)
    //         |                     |
    //        node                  node
    //        / \                   / \
    //      (y) (z)              (!y) (!z)
    //     /      \              /      \
    //   left    right         left    right
    //
    fn flip(node: &mut Node<K, V>) {
        node.left_mut().toggle_link();
        node.right_mut().toggle_link();
        node.toggle_link();
    }

    fn fixup(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        if is_red(node.right_deref()) {
            node = Llrb::rotate_left(node);
        }
        let left = node.left_deref();
        if is_red(left) && is_red(left.and_then(Node::left_deref)) {
            node = Llrb::rotate_right(node);
        }
        if is_red(node.left_deref()) && is_red(node.right_deref()) {
            Llrb::flip(node.deref_mut());
        }
        node.update_size();
        node
    }

    // node is red and both node.left and node.left.left are black,
    // make node.left or one of its children red.
    fn move_red_left(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        Llrb::flip(node.deref_mut());
        if is_red(node.right_mut().left_deref()) {
            let right = node.right.take().map(Self::rotate_right);
            node.right = right;
            node = Llrb::rotate_left(node);
            Llrb::flip(node.deref_mut());
        }
        node
    }

    // node is red and both node.right and node.right.left are black,
    // make node.right or one of its children red.
    fn move_red_right(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        Llrb::flip(node.deref_mut());
        if is_red(node.left_mut().left_deref()) {
            node = Llrb::rotate_right(node);
            Llrb::flip(node.deref_mut());
        }
        node
    }
}

fn is_red<K, V>(node: Option<&Node<K, V>>) -> bool {
    node.map_or(false, Node::is_red)
}

fn size<K, V>(node: Option<&Node<K, V>>) -> usize {
    node.map_or(0, |node| node.size)
}

fn to_owned_bound<Q>(bound: Bound<&Q>) -> Bound<Q::Owned>
where
    Q: ToOwned + ?Sized,
{
    match bound {
        Bound::Included(key) => Bound::Included(key.to_owned()),
        Bound::Excluded(key) => Bound::Excluded(key.to_owned()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

// true when `key` lies on or after the lower bound.
fn after_low<K: Ord>(key: &K, low: &Bound<K>) -> bool {
    match low {
        Bound::Included(low) => key >= low,
        Bound::Excluded(low) => key > low,
        Bound::Unbounded => true,
    }
}

// true when `key` lies on or before the upper bound.
fn before_high<K: Ord>(key: &K, high: &Bound<K>) -> bool {
    match high {
        Bound::Included(high) => key <= high,
        Bound::Excluded(high) => key < high,
        Bound::Unbounded => true,
    }
}

/// One batch of an ascending scan. Walk `node` in order, collecting
/// `pick(node)` for every entry within `low` and `high`, until `acc`
/// holds `limit` items. Return false if the walk stopped early, either
/// on `limit` or on crossing `high`.
fn scan_asc<K, V, T, F>(
    node: Option<&Node<K, V>>,
    low: &Bound<K>,
    high: &Bound<K>,
    limit: usize,
    acc: &mut Vec<T>,
    pick: &F,
) -> bool
where
    K: Ord,
    F: Fn(&Node<K, V>) -> T,
{
    let node = match node {
        None => return true,
        Some(node) => node,
    };
    if !after_low(&node.key, low) {
        return scan_asc(node.right_deref(), low, high, limit, acc, pick);
    }
    if !scan_asc(node.left_deref(), low, high, limit, acc, pick) {
        return false;
    }
    if !before_high(&node.key, high) {
        return false;
    }
    acc.push(pick(node));
    if acc.len() >= limit {
        return false;
    }
    scan_asc(node.right_deref(), low, high, limit, acc, pick)
}

/// Mirror of [`scan_asc`], walking from `high` down to `low`.
fn scan_desc<K, V, T, F>(
    node: Option<&Node<K, V>>,
    low: &Bound<K>,
    high: &Bound<K>,
    limit: usize,
    acc: &mut Vec<T>,
    pick: &F,
) -> bool
where
    K: Ord,
    F: Fn(&Node<K, V>) -> T,
{
    let node = match node {
        None => return true,
        Some(node) => node,
    };
    if !before_high(&node.key, high) {
        return scan_desc(node.left_deref(), low, high, limit, acc, pick);
    }
    if !scan_desc(node.right_deref(), low, high, limit, acc, pick) {
        return false;
    }
    if !after_low(&node.key, low) {
        return false;
    }
    acc.push(pick(node));
    if acc.len() >= limit {
        return false;
    }
    scan_desc(node.left_deref(), low, high, limit, acc, pick)
}

fn entry<K: Clone, V: Clone>(node: &Node<K, V>) -> (K, V) {
    (node.key.clone(), node.value.clone())
}

/// Ascending iterator over a range of entries, returned by
/// [`Llrb::iter`] and [`Llrb::range`].
pub struct Range<'a, K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    root: Option<&'a Node<K, V>>,
    batch: std::vec::IntoIter<(K, V)>,
    low: Option<Bound<K>>, // None once the range is exhausted
    high: Bound<K>,
    limit: usize,
}

impl<'a, K, V> Range<'a, K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Iterate over the same range in descending order.
    pub fn rev(self) -> Reverse<'a, K, V> {
        let (high, low) = match self.low {
            Some(low) => (Some(self.high), low),
            None => (None, Bound::Unbounded),
        };
        Reverse {
            root: self.root,
            batch: vec![].into_iter(),
            high,
            low,
            limit: self.limit,
        }
    }
}

impl<'a, K, V> Iterator for Range<'a, K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(item) = self.batch.next() {
            return Some(item);
        }
        let low = self.low.as_ref()?;
        let mut acc = Vec::with_capacity(self.limit);
        scan_asc(self.root, low, &self.high, self.limit, &mut acc, &entry);
        self.low = acc.last().map(|(key, _)| Bound::Excluded(key.clone()));
        self.batch = acc.into_iter();
        self.batch.next()
    }
}

/// Descending iterator over a range of entries, returned by
/// [`Range::rev`].
pub struct Reverse<'a, K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    root: Option<&'a Node<K, V>>,
    batch: std::vec::IntoIter<(K, V)>,
    high: Option<Bound<K>>, // None once the range is exhausted
    low: Bound<K>,
    limit: usize,
}

impl<'a, K, V> Iterator for Reverse<'a, K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(item) = self.batch.next() {
            return Some(item);
        }
        let high = self.high.as_ref()?;
        let mut acc = Vec::with_capacity(self.limit);
        scan_desc(self.root, &self.low, high, self.limit, &mut acc, &entry);
        self.high = acc.last().map(|(key, _)| Bound::Excluded(key.clone()));
        self.batch = acc.into_iter();
        self.batch.next()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Color {
    Red,
    Black,
}

/// Node corresponds to a single entry in Llrb instance.
#[derive(Clone)]
pub(crate) struct Node<K, V> {
    key: K,
    value: V,
    color: Color,
    size: usize,                    // number of nodes in this sub-tree
    left: Option<Box<Node<K, V>>>,  // store: left child
    right: Option<Box<Node<K, V>>>, // store: right child
}

// Primary operations on a single node.
impl<K, V> Node<K, V> {
    // new nodes are always red, joining their parent's 2-3 node.
    fn new(key: K, value: V) -> Box<Node<K, V>> {
        Box::new(Node {
            key,
            value,
            color: Color::Red,
            size: 1,
            left: None,
            right: None,
        })
    }

    fn into_entry(self: Box<Self>) -> (K, V) {
        let node = *self;
        (node.key, node.value)
    }

    #[inline]
    fn left_deref(&self) -> Option<&Node<K, V>> {
        self.left.as_deref()
    }

    #[inline]
    fn right_deref(&self) -> Option<&Node<K, V>> {
        self.right.as_deref()
    }

    #[inline]
    fn left_mut(&mut self) -> &mut Node<K, V> {
        match self.left.as_deref_mut() {
            Some(left) => left,
            None => panic!("left_mut(): missing left child, call the programmer"),
        }
    }

    #[inline]
    fn right_mut(&mut self) -> &mut Node<K, V> {
        match self.right.as_deref_mut() {
            Some(right) => right,
            None => panic!("right_mut(): missing right child, call the programmer"),
        }
    }

    #[inline]
    fn update_size(&mut self) {
        self.size = 1 + size(self.left_deref()) + size(self.right_deref());
    }

    #[inline]
    fn set_red(&mut self) {
        self.color = Color::Red
    }

    #[inline]
    fn set_black(&mut self) {
        self.color = Color::Black
    }

    #[inline]
    fn toggle_link(&mut self) {
        self.color = match self.color {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    #[inline]
    fn is_red(&self) -> bool {
        self.color == Color::Red
    }
}

/// Statistics on [`Llrb`] tree. Serves two purpose:
///
/// * To get partial but quick statistics via [`Llrb::stats`] method.
/// * To get full statisics via [`Llrb::validate`] method.
#[derive(Default, Debug)]
pub struct Stats {
    entries: usize, // number of entries in the tree.
    node_size: usize,
    blacks: Option<usize>,
    depths: Option<Depth>,
}

impl Stats {
    fn new(entries: usize, node_size: usize) -> Stats {
        Stats {
            entries,
            node_size,
            blacks: Default::default(),
            depths: Default::default(),
        }
    }

    #[inline]
    fn set_blacks(&mut self, blacks: usize) {
        self.blacks = Some(blacks)
    }

    #[inline]
    fn set_depths(&mut self, depths: Depth) {
        self.depths = Some(depths)
    }

    /// Return number entries in [`Llrb`] instance.
    #[inline]
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Return node-size, including over-head for `Llrb<k,V>`. Although
    /// the node overhead is constant, the node size varies based on
    /// key and value types. EG:
    ///
    /// ```
    /// use llrb_map::Llrb;
    /// let llrb: Llrb<u64, u64> = Llrb::new("myinstance");
    ///
    /// // size of key: 8 bytes
    /// // size of value: 8 bytes
    /// // overhead is 32 bytes
    /// assert_eq!(llrb.stats().node_size(), 48);
    /// ```
    #[inline]
    pub fn node_size(&self) -> usize {
        self.node_size
    }

    /// Return number of black nodes from root to leaf, on both left
    /// and right child.
    #[inline]
    pub fn blacks(&self) -> Option<usize> {
        self.blacks
    }

    /// Return [`Depth`] statistics.
    pub fn depths(&self) -> Option<Depth> {
        self.depths.as_ref().filter(|d| d.samples() > 0).cloned()
    }
}
