//! Generic statement dependency graph: build, cycle-break, topological
//! sort, and the "is this order valid?" predicate (spec.md §4.3).

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::refs::Reference;
use crate::statement::Statement;

/// A reference that didn't resolve to any sibling binding: a candidate
/// for the `on_unresolved` policy (spec.md §7).
#[derive(Debug, Clone)]
pub struct Unresolved {
    pub name: String,
    pub offset: usize,
}

/// Resolves every reference `references` finds in each of `statements`
/// against the bindings of all `statements`, producing the dependency
/// graph plus the references that matched no sibling binding. When
/// `underscore_only` is set, references to public (non-`_`-prefixed)
/// names are skipped entirely rather than counted as unresolved — the
/// private-name convention is what this analysis targets, not arbitrary
/// calls into framework or builtin APIs (spec.md §4.2, §4.4).
pub fn resolve(
    statements: &[Statement],
    references: impl Fn(&ruff_python_ast::Stmt) -> Vec<Reference>,
    underscore_only: bool,
) -> (Graph, Vec<Unresolved>) {
    let mut bindings_index: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, statement) in statements.iter().enumerate() {
        for binding in statement.bindings() {
            bindings_index.entry(binding).or_default().push(index);
        }
    }

    let mut graph = Graph::empty(statements.len());
    let mut unresolved = Vec::new();

    for (index, statement) in statements.iter().enumerate() {
        for reference in references(&statement.node) {
            if underscore_only && !reference.name.starts_with('_') {
                continue;
            }
            match bindings_index.get(&reference.name) {
                Some(targets) => {
                    for &target in targets {
                        graph.add_edge(index, target);
                    }
                }
                None => unresolved.push(Unresolved {
                    name: reference.name,
                    offset: reference.offset,
                }),
            }
        }
    }

    (graph, unresolved)
}

/// Directed graph over `0..n` statement indices. An edge `a -> b` means
/// "`a` depends on `b`": `b` must precede `a` in a legal ordering.
#[derive(Debug, Clone)]
pub struct Graph {
    len: usize,
    edges: Vec<HashSet<usize>>,
}

impl Graph {
    pub fn empty(len: usize) -> Self {
        Self {
            len,
            edges: vec![HashSet::new(); len],
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Adds the edge `dependent -> dependency`. Self-edges are dropped
    /// (spec.md §4.3: "multiple references to the same target collapse to
    /// one edge; self-edges are dropped").
    pub fn add_edge(&mut self, dependent: usize, dependency: usize) {
        if dependent != dependency {
            self.edges[dependent].insert(dependency);
        }
    }

    pub fn depends_on(&self, dependent: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges[dependent].iter().copied()
    }

    /// Merges `other`'s edges into `self` (used to fold the hard graph
    /// into the runtime graph before the class-level repair pass).
    pub fn merge(&mut self, other: &Graph) {
        for (dependent, deps) in other.edges.iter().enumerate() {
            self.edges[dependent].extend(deps);
        }
    }

    /// Re-keys a graph built over `from`'s order so its edges instead
    /// index into `to`, a permutation of the same statements. Needed
    /// because the class-level initialisation graph is snapshotted
    /// before bucket sorting, then must be applied to each reordering
    /// that follows (spec.md §4.4).
    pub fn remap(&self, from: &[Statement], to: &[Statement]) -> Graph {
        let position_in_to: Vec<usize> = from
            .iter()
            .map(|statement| {
                to.iter()
                    .position(|candidate| candidate == statement)
                    .expect("remap target must contain the same statements")
            })
            .collect();

        let mut out = Graph::empty(to.len());
        for (dependent, deps) in self.edges.iter().enumerate() {
            for &dependency in deps {
                out.add_edge(position_in_to[dependent], position_in_to[dependency]);
            }
        }
        out
    }

    /// Kahn's algorithm with a stable tie-break: among statements whose
    /// dependencies are all already placed, always emit the one with the
    /// smallest original index first.
    pub fn topological_sort(&self) -> Vec<usize> {
        let mut in_degree = vec![0usize; self.len];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.len];
        for (dependent, deps) in self.edges.iter().enumerate() {
            in_degree[dependent] = deps.len();
            for &dependency in deps {
                dependents[dependency].push(dependent);
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = (0..self.len)
            .filter(|&i| in_degree[i] == 0)
            .map(Reverse)
            .collect();

        let mut order = Vec::with_capacity(self.len);
        while let Some(Reverse(index)) = ready.pop() {
            order.push(index);
            for &dependent in &dependents[index] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }

        debug_assert_eq!(order.len(), self.len, "graph must be acyclic before topological_sort");
        order
    }

    /// True iff `order` (a permutation of `0..len`) respects every edge:
    /// for every `a -> b`, `b` appears before `a`.
    pub fn is_topologically_sorted(&self, order: &[usize]) -> bool {
        let mut position = vec![0usize; self.len];
        for (pos, &index) in order.iter().enumerate() {
            position[index] = pos;
        }
        (0..self.len).all(|dependent| {
            self.edges[dependent]
                .iter()
                .all(|&dependency| position[dependency] < position[dependent])
        })
    }

    /// Finds strongly connected components of size >= 2 (Tarjan's
    /// algorithm, iterative to avoid stack overflow on pathological
    /// inputs) and replaces all intra-SCC edges with the chain induced by
    /// sorting each SCC's members on `key`. After this the graph is
    /// acyclic and each former cycle's members appear in a deterministic
    /// order (spec.md §4.3, §9: "never break hard cycles... break soft
    /// cycles by sorting SCC members on a stable key").
    pub fn replace_cycles<K: Ord>(&mut self, key: impl Fn(usize) -> K) {
        for scc in self.strongly_connected_components() {
            if scc.len() < 2 {
                continue;
            }
            let mut members = scc.clone();
            members.sort_by_key(|&i| key(i));

            let member_set: HashSet<usize> = scc.iter().copied().collect();
            for &node in &scc {
                self.edges[node].retain(|dependency| !member_set.contains(dependency));
            }

            // v0 <- v1 <- ... <- vk: member i depends on member i+1... wait,
            // the chain runs the other way: each later member depends on
            // the one before it so the earliest-keyed member sorts first.
            for window in members.windows(2) {
                let (earlier, later) = (window[0], window[1]);
                self.edges[later].insert(earlier);
            }
        }
    }

    /// Iterative Tarjan's algorithm (recursive Tarjan would blow the stack
    /// on a pathological single-file input with thousands of statements).
    fn strongly_connected_components(&self) -> Vec<Vec<usize>> {
        struct Frame {
            node: usize,
            neighbors: Vec<usize>,
            next: usize,
        }

        let mut index_counter = 0usize;
        let mut indices: Vec<Option<usize>> = vec![None; self.len];
        let mut lowlink = vec![0usize; self.len];
        let mut on_stack = vec![false; self.len];
        let mut stack: Vec<usize> = Vec::new();
        let mut sccs: Vec<Vec<usize>> = Vec::new();

        for start in 0..self.len {
            if indices[start].is_some() {
                continue;
            }

            let mut work: Vec<Frame> = vec![Frame {
                node: start,
                neighbors: self.edges[start].iter().copied().collect(),
                next: 0,
            }];
            indices[start] = Some(index_counter);
            lowlink[start] = index_counter;
            index_counter += 1;
            stack.push(start);
            on_stack[start] = true;

            while let Some(frame) = work.last_mut() {
                if frame.next < frame.neighbors.len() {
                    let neighbor = frame.neighbors[frame.next];
                    frame.next += 1;

                    if indices[neighbor].is_none() {
                        indices[neighbor] = Some(index_counter);
                        lowlink[neighbor] = index_counter;
                        index_counter += 1;
                        stack.push(neighbor);
                        on_stack[neighbor] = true;
                        work.push(Frame {
                            node: neighbor,
                            neighbors: self.edges[neighbor].iter().copied().collect(),
                            next: 0,
                        });
                    } else if on_stack[neighbor] {
                        let node = frame.node;
                        lowlink[node] = lowlink[node].min(indices[neighbor].expect("checked Some above"));
                    }
                } else {
                    let node = frame.node;
                    let node_index = indices[node].expect("node visited before its frame was pushed");
                    work.pop();

                    if let Some(parent) = work.last() {
                        let parent_node = parent.node;
                        lowlink[parent_node] = lowlink[parent_node].min(lowlink[node]);
                    }

                    if lowlink[node] == node_index {
                        let mut component = Vec::new();
                        loop {
                            let member = stack.pop().expect("stack non-empty while closing SCC");
                            on_stack[member] = false;
                            component.push(member);
                            if member == node {
                                break;
                            }
                        }
                        sccs.push(component);
                    }
                }
            }
        }

        sccs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topological_sort_respects_edges_and_original_order() {
        // 0 depends on nothing, 1 depends on 2, 2 depends on nothing.
        let mut graph = Graph::empty(3);
        graph.add_edge(1, 2);
        let order = graph.topological_sort();
        assert!(graph.is_topologically_sorted(&order));
        // Ready set initially {0, 2}; 0 has the smaller index.
        assert_eq!(order, vec![0, 2, 1]);
    }

    #[test]
    fn self_edges_are_dropped() {
        let mut graph = Graph::empty(1);
        graph.add_edge(0, 0);
        assert!(graph.depends_on(0).next().is_none());
    }

    #[test]
    fn replace_cycles_breaks_scc_by_key() {
        // 0 <-> 1 is a cycle; key favors 1 before 0.
        let mut graph = Graph::empty(2);
        graph.add_edge(0, 1);
        graph.add_edge(1, 0);
        graph.replace_cycles(|i| if i == 1 { 0 } else { 1 });
        let order = graph.topological_sort();
        assert!(graph.is_topologically_sorted(&order));
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn replace_cycles_handles_larger_scc() {
        let mut graph = Graph::empty(4);
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        graph.add_edge(2, 0);
        graph.add_edge(3, 2);
        graph.replace_cycles(|i| i);
        let order = graph.topological_sort();
        assert!(graph.is_topologically_sorted(&order));
        assert_eq!(order, vec![0, 1, 2, 3]);
    }
}
