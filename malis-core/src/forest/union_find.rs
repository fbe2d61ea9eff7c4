//! Union-find (disjoint set union) whose roots own a mutable payload.
//!
//! Every site starts as a singleton component carrying its own payload. When
//! two components merge, the payload of the absorbed root is moved into the
//! surviving root with [`Payload::absorb`] and the absorbed slot is left at
//! its default value. Which root survives is decided by rank and must not be
//! relied upon by callers.

/// Per-component data carried by a [`DisjointSet`] root.
pub trait Payload: Default {
    /// Folds `other` into `self` without losing any information.
    fn absorb(&mut self, other: Self);
}

impl Payload for () {
    fn absorb(&mut self, _other: Self) {}
}

#[derive(Clone, Debug)]
pub(crate) struct DisjointSet<P> {
    parent: Vec<usize>,
    rank: Vec<u8>,
    payload: Vec<P>,
    components: usize,
}

impl<P: Payload> DisjointSet<P> {
    /// Creates one singleton component per payload, in site order.
    pub(crate) fn new(payload: Vec<P>) -> Self {
        let n = payload.len();
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
            payload,
            components: n,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.parent.len()
    }

    pub(crate) fn component_count(&self) -> usize {
        self.components
    }

    pub(crate) fn find(&mut self, mut node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        while self.parent[node] != node {
            let parent = self.parent[node];
            self.parent[node] = root;
            node = parent;
        }

        root
    }

    /// Returns the payload owned by `root`. Non-root sites hold the default.
    pub(crate) fn payload(&self, root: usize) -> &P {
        &self.payload[root]
    }

    /// Links two distinct roots and fuses their payloads into the survivor,
    /// which is returned.
    pub(crate) fn union_roots(&mut self, left: usize, right: usize) -> usize {
        debug_assert!(self.parent[left] == left && self.parent[right] == right);
        if left == right {
            return left;
        }
        let (survivor, absorbed) = if self.rank[left] < self.rank[right] {
            (right, left)
        } else {
            (left, right)
        };
        self.parent[absorbed] = survivor;
        if self.rank[left] == self.rank[right] {
            self.rank[survivor] = self.rank[survivor].saturating_add(1);
        }
        let moved = std::mem::take(&mut self.payload[absorbed]);
        self.payload[survivor].absorb(moved);
        self.components = self.components.saturating_sub(1);
        survivor
    }

    /// Unites the components containing `left` and `right`, returning `false`
    /// when they were already the same component.
    pub(crate) fn union(&mut self, left: usize, right: usize) -> bool {
        let left = self.find(left);
        let right = self.find(right);
        if left == right {
            return false;
        }
        self.union_roots(left, right);
        true
    }
}
