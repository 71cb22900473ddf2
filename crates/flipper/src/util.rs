//! Small shared helpers.

/// Disjoint sets over `0..n` with path halving.
#[derive(Clone, Debug)]
pub(crate) struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    pub(crate) fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub(crate) fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }

    /// Class index of every element, numbered by first appearance.
    pub(crate) fn labels(&mut self) -> (Vec<usize>, usize) {
        let n = self.parent.len();
        let mut index = vec![usize::MAX; n];
        let mut out = Vec::with_capacity(n);
        let mut count = 0;
        for x in 0..n {
            let r = self.find(x);
            if index[r] == usize::MAX {
                index[r] = count;
                count += 1;
            }
            out.push(index[r]);
        }
        (out, count)
    }
}
