/*
\file  pqueue.rs
\brief Priority queues keyed by integer gains

\date   Started 4/09/07
\author George
*/

use crate::{idx_t, real_t};

/// Marks a vertex that is not in the queue
const NIL: usize = usize::MAX;

/// Largest gain range served by buckets; wider ranges fall back to a heap
const MAX_BUCKET_RANGE: idx_t = 1 << 16;

/// Max-priority queue of vertices keyed by their gain.
///
/// After inserting a (vertex, gain) pair the vertex can be updated or removed in
/// O(1) through its index. When the gains are known to lie in `-maxgain..=maxgain`
/// and that range is small, the queue is an array of buckets (doubly linked lists)
/// and extracting the maximum is amortized O(1). Larger ranges are served by an
/// indexed binary heap.
pub struct PQueue {
    imp: Imp,
}

enum Imp {
    Buckets(BucketQueue),
    Heap(HeapQueue<idx_t>),
}

impl PQueue {
    /// A queue for vertices `0..maxnodes` with gains bounded by `maxgain` in absolute value
    pub fn new(maxnodes: usize, maxgain: idx_t) -> Self {
        let maxgain = maxgain.max(0);
        let imp = if maxgain <= MAX_BUCKET_RANGE {
            Imp::Buckets(BucketQueue::new(maxnodes, maxgain))
        } else {
            Imp::Heap(HeapQueue::new(maxnodes))
        };
        PQueue { imp }
    }

    #[inline]
    pub fn len(&self) -> usize {
        match &self.imp {
            Imp::Buckets(q) => q.nnodes,
            Imp::Heap(q) => q.heap.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// clear the queue
    pub fn reset(&mut self) {
        match &mut self.imp {
            Imp::Buckets(q) => q.reset(),
            Imp::Heap(q) => q.reset(),
        }
    }

    #[inline]
    pub fn contains(&self, node: usize) -> bool {
        match &self.imp {
            Imp::Buckets(q) => q.key[node].is_some(),
            Imp::Heap(q) => q.locator[node] != NIL,
        }
    }

    /// insert an item, `node` must not be queued
    #[inline]
    pub fn insert(&mut self, node: usize, key: idx_t) {
        debug_assert!(!self.contains(node));
        match &mut self.imp {
            Imp::Buckets(q) => q.insert(node, key),
            Imp::Heap(q) => q.insert(node, key),
        }
    }

    /// delete an item, `node` must be queued
    #[inline]
    pub fn delete(&mut self, node: usize) {
        debug_assert!(self.contains(node));
        match &mut self.imp {
            Imp::Buckets(q) => q.delete(node),
            Imp::Heap(q) => q.delete(node),
        }
    }

    /// changes the key of a queued item
    #[inline]
    pub fn update(&mut self, node: usize, newkey: idx_t) {
        debug_assert!(self.contains(node));
        match &mut self.imp {
            Imp::Buckets(q) => q.update(node, newkey),
            Imp::Heap(q) => q.update(node, newkey),
        }
    }

    /// removes and returns the item with the largest key
    #[inline]
    pub fn pop(&mut self) -> Option<usize> {
        match &mut self.imp {
            Imp::Buckets(q) => q.pop(),
            Imp::Heap(q) => q.pop(),
        }
    }

    /// the item with the largest key, without removing it
    #[inline]
    pub fn peek(&mut self) -> Option<usize> {
        match &mut self.imp {
            Imp::Buckets(q) => q.top_node(),
            Imp::Heap(q) => q.heap.first().map(|&(_, v)| v),
        }
    }

    /// the key of a queued item
    #[inline]
    pub fn key_of(&self, node: usize) -> idx_t {
        match &self.imp {
            Imp::Buckets(q) => q.key[node].unwrap_or(0),
            Imp::Heap(q) => q.heap[q.locator[node]].0,
        }
    }
}

/// Gain buckets, each a doubly linked list threaded through `next`/`prev`
struct BucketQueue {
    maxgain: idx_t,
    nnodes: usize,
    key: Vec<Option<idx_t>>,
    next: Vec<usize>,
    prev: Vec<usize>,
    head: Vec<usize>,
    /// no bucket above this one is occupied
    top: usize,
}

impl BucketQueue {
    fn new(maxnodes: usize, maxgain: idx_t) -> Self {
        BucketQueue {
            maxgain,
            nnodes: 0,
            key: vec![None; maxnodes],
            next: vec![NIL; maxnodes],
            prev: vec![NIL; maxnodes],
            head: vec![NIL; 2 * maxgain as usize + 1],
            top: 0,
        }
    }

    /// keys beyond the declared range share the extreme buckets
    #[inline]
    fn bucket(&self, key: idx_t) -> usize {
        (key.clamp(-self.maxgain, self.maxgain) + self.maxgain) as usize
    }

    fn reset(&mut self) {
        for b in 0..self.head.len() {
            let mut node = self.head[b];
            while node != NIL {
                let next = self.next[node];
                self.key[node] = None;
                self.next[node] = NIL;
                self.prev[node] = NIL;
                node = next;
            }
            self.head[b] = NIL;
        }
        self.nnodes = 0;
        self.top = 0;
    }

    fn insert(&mut self, node: usize, key: idx_t) {
        let b = self.bucket(key);
        let first = self.head[b];
        self.next[node] = first;
        self.prev[node] = NIL;
        if first != NIL {
            self.prev[first] = node;
        }
        self.head[b] = node;
        self.key[node] = Some(key);
        if self.nnodes == 0 || b > self.top {
            self.top = b;
        }
        self.nnodes += 1;
    }

    fn delete(&mut self, node: usize) {
        let Some(key) = self.key[node] else {
            return;
        };
        let b = self.bucket(key);
        let (prev, next) = (self.prev[node], self.next[node]);
        if prev != NIL {
            self.next[prev] = next;
        } else {
            self.head[b] = next;
        }
        if next != NIL {
            self.prev[next] = prev;
        }
        self.next[node] = NIL;
        self.prev[node] = NIL;
        self.key[node] = None;
        self.nnodes -= 1;
    }

    fn update(&mut self, node: usize, newkey: idx_t) {
        let Some(oldkey) = self.key[node] else {
            return;
        };
        if self.bucket(oldkey) == self.bucket(newkey) {
            self.key[node] = Some(newkey);
        } else {
            self.delete(node);
            self.insert(node, newkey);
        }
    }

    fn top_node(&mut self) -> Option<usize> {
        if self.nnodes == 0 {
            return None;
        }
        while self.head[self.top] == NIL {
            self.top -= 1;
        }
        Some(self.head[self.top])
    }

    fn pop(&mut self) -> Option<usize> {
        let node = self.top_node()?;
        self.delete(node);
        Some(node)
    }
}

/// Max-priority queue of vertices keyed by real-valued gains (rpq_t), an
/// indexed binary heap. Used by the k-way refinement, whose gains are scaled.
pub struct RPQueue {
    heap: HeapQueue<real_t>,
}

impl RPQueue {
    pub fn new(maxnodes: usize) -> Self {
        RPQueue {
            heap: HeapQueue::new(maxnodes),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.heap.is_empty()
    }

    pub fn reset(&mut self) {
        self.heap.reset();
    }

    #[inline]
    pub fn contains(&self, node: usize) -> bool {
        self.heap.locator[node] != NIL
    }

    #[inline]
    pub fn insert(&mut self, node: usize, key: real_t) {
        debug_assert!(!self.contains(node));
        self.heap.insert(node, key);
    }

    #[inline]
    pub fn delete(&mut self, node: usize) {
        debug_assert!(self.contains(node));
        self.heap.delete(node);
    }

    #[inline]
    pub fn update(&mut self, node: usize, newkey: real_t) {
        debug_assert!(self.contains(node));
        self.heap.update(node, newkey);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<usize> {
        self.heap.pop()
    }
}

/// Indexed binary max-heap, used when the gain range is too wide for buckets
struct HeapQueue<K> {
    locator: Vec<usize>,
    heap: Vec<(K, usize)>,
}

impl<K: PartialOrd + Copy> HeapQueue<K> {
    fn new(maxnodes: usize) -> Self {
        HeapQueue {
            locator: vec![NIL; maxnodes],
            heap: Vec::with_capacity(maxnodes),
        }
    }

    fn reset(&mut self) {
        for &(_, v) in &self.heap {
            self.locator[v] = NIL;
        }
        self.heap.clear();
    }

    fn insert(&mut self, node: usize, key: K) {
        self.heap.push((key, node));
        let i = self.heap.len() - 1;
        self.locator[node] = i;
        self.filter_up(i);
    }

    fn delete(&mut self, node: usize) {
        let i = self.locator[node];
        self.locator[node] = NIL;
        let Some(last) = self.heap.pop() else {
            return;
        };
        if i < self.heap.len() {
            self.heap[i] = last;
            self.locator[last.1] = i;
            let i = self.filter_up(i);
            self.filter_down(i);
        }
    }

    fn update(&mut self, node: usize, newkey: K) {
        let i = self.locator[node];
        let oldkey = self.heap[i].0;
        self.heap[i].0 = newkey;
        if newkey > oldkey {
            self.filter_up(i);
        } else {
            self.filter_down(i);
        }
    }

    fn pop(&mut self) -> Option<usize> {
        let &(_, top) = self.heap.first()?;
        self.delete(top);
        Some(top)
    }

    fn filter_up(&mut self, mut i: usize) -> usize {
        while i > 0 {
            let j = (i - 1) >> 1;
            if self.heap[i].0 > self.heap[j].0 {
                self.heap.swap(i, j);
                self.locator[self.heap[i].1] = i;
                self.locator[self.heap[j].1] = j;
                i = j;
            } else {
                break;
            }
        }
        i
    }

    fn filter_down(&mut self, mut i: usize) {
        let n = self.heap.len();
        loop {
            let mut j = 2 * i + 1;
            if j >= n {
                break;
            }
            if j + 1 < n && self.heap[j + 1].0 > self.heap[j].0 {
                j += 1;
            }
            if self.heap[j].0 > self.heap[i].0 {
                self.heap.swap(i, j);
                self.locator[self.heap[i].1] = i;
                self.locator[self.heap[j].1] = j;
                i = j;
            } else {
                break;
            }
        }
    }
}
