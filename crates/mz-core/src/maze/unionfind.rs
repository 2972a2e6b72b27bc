//! Connectivity analysis
//!
//! A small union-find over hashable points. Every connectivity check in the
//! engine (grid partitions, monogrid validation, layout traversal) goes
//! through this module.
//!
//! Results are deterministic: components and their members are reported
//! in the order points were first seen, never in hash order.

use core::hash::Hash;

use hashbrown::HashMap;

#[cfg(not(feature = "std"))]
use crate::compat::*;

/// Disjoint-set forest with path compression
#[derive(Debug, Clone)]
pub struct UnionFind<T> {
    parent: HashMap<T, T>,
    order: Vec<T>,
}

impl<T: Copy + Eq + Hash> Default for UnionFind<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Eq + Hash> UnionFind<T> {
    pub fn new() -> Self {
        Self {
            parent: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Number of points seen so far.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Representative of `x`, inserting it as a singleton on first sight.
    pub fn find(&mut self, x: T) -> T {
        if !self.parent.contains_key(&x) {
            self.parent.insert(x, x);
            self.order.push(x);
            return x;
        }
        let mut root = x;
        while let Some(&p) = self.parent.get(&root) {
            if p == root {
                break;
            }
            root = p;
        }
        // compress
        let mut cur = x;
        while cur != root {
            let next = self.parent[&cur];
            self.parent.insert(cur, root);
            cur = next;
        }
        root
    }

    pub fn union(&mut self, a: T, b: T) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent.insert(rb, ra);
        }
    }

    /// Distinct representatives, in first-seen order.
    pub fn roots(&mut self) -> Vec<T> {
        let order = self.order.clone();
        let mut seen = hashbrown::HashSet::new();
        let mut out = Vec::new();
        for x in order {
            let r = self.find(x);
            if seen.insert(r) {
                out.push(r);
            }
        }
        out
    }

    pub fn into_partition(mut self) -> Partition<T> {
        let order = core::mem::take(&mut self.order);
        let mut index_of_root: HashMap<T, usize> = HashMap::new();
        let mut components: Vec<Vec<T>> = Vec::new();
        let mut owner = HashMap::with_capacity(order.len());
        for x in order {
            let r = self.find(x);
            let i = *index_of_root.entry(r).or_insert_with(|| {
                components.push(Vec::new());
                components.len() - 1
            });
            components[i].push(x);
            owner.insert(x, i);
        }
        Partition { components, owner }
    }
}

/// Connected components of a point set.
#[derive(Debug, Clone)]
pub struct Partition<T> {
    components: Vec<Vec<T>>,
    owner: HashMap<T, usize>,
}

impl<T: Copy + Eq + Hash> Partition<T> {
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn point_count(&self) -> usize {
        self.owner.len()
    }

    /// True when at most one component exists.
    pub fn is_connected(&self) -> bool {
        self.components.len() <= 1
    }

    pub fn contains(&self, p: &T) -> bool {
        self.owner.contains_key(p)
    }

    pub fn component_of(&self, p: &T) -> Option<usize> {
        self.owner.get(p).copied()
    }

    pub fn component(&self, i: usize) -> &[T] {
        &self.components[i]
    }

    pub fn components(&self) -> &[Vec<T>] {
        &self.components
    }

    /// Index of the first component of maximal size.
    pub fn largest(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, c) in self.components.iter().enumerate() {
            if best.is_none_or(|b| c.len() > self.components[b].len()) {
                best = Some(i);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_find_basic() {
        let mut uf = UnionFind::new();
        uf.union(1, 2);
        uf.union(3, 4);
        assert_eq!(uf.roots().len(), 2);
        uf.union(2, 3);
        assert_eq!(uf.roots().len(), 1);
        assert_eq!(uf.find(4), uf.find(1));
    }

    #[test]
    fn test_singletons() {
        let mut uf = UnionFind::new();
        uf.find('a');
        uf.find('b');
        uf.find('a');
        assert_eq!(uf.len(), 2);
        assert_eq!(uf.roots(), vec!['a', 'b']);
    }

    #[test]
    fn test_partition_order_and_largest() {
        let mut uf = UnionFind::new();
        uf.find(10);
        uf.union(20, 21);
        uf.union(21, 22);
        uf.union(30, 31);
        let p = uf.into_partition();
        assert_eq!(p.component_count(), 3);
        assert_eq!(p.point_count(), 6);
        assert_eq!(p.component(0), &[10]);
        assert_eq!(p.component(1), &[20, 21, 22]);
        assert_eq!(p.largest(), Some(1));
        assert_eq!(p.component_of(&31), Some(2));
        assert_eq!(p.component_of(&99), None);
        assert!(!p.is_connected());
    }

    #[test]
    fn test_empty_partition_is_connected() {
        let p = UnionFind::<u8>::new().into_partition();
        assert!(p.is_connected());
        assert_eq!(p.largest(), None);
    }
}
