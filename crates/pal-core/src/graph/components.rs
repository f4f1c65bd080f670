//! Connected components of an induced subgraph.

use std::collections::HashMap;

use super::sparse::CsrMatrix;

/// Connected components of the subgraph of `graph` induced by `nodes`,
/// ignoring edge direction.
///
/// Components are ordered by their first member in `nodes`, and members keep
/// their `nodes` order.
pub fn connected_components(graph: &CsrMatrix, nodes: &[usize]) -> Vec<Vec<usize>> {
    let position: HashMap<usize, usize> = nodes.iter().enumerate().map(|(p, &n)| (n, p)).collect();
    let mut uf = UnionFind::new(nodes.len());
    for (p, &u) in nodes.iter().enumerate() {
        for (v, _) in graph.row_iter(u) {
            if let Some(&q) = position.get(&v) {
                uf.union(p, q);
            }
        }
    }

    let mut order: Vec<usize> = Vec::new();
    let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
    for (p, &u) in nodes.iter().enumerate() {
        let root = uf.find(p);
        groups
            .entry(root)
            .or_insert_with(|| {
                order.push(root);
                Vec::new()
            })
            .push(u);
    }
    order
        .into_iter()
        .filter_map(|root| groups.remove(&root))
        .collect()
}

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}
