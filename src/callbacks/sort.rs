// Ordering resolver: turns an ordered list of declarations into the
// executable handler list, honouring before/after constraints by name.

use std::collections::{BTreeSet, HashMap};

use crate::callbacks::error::{CallbackError, Relation};
use crate::callbacks::processor::{Callback, CompiledCallback};

/// `from` must run before `to`. `declared_by` and `relation` name the
/// constraint as it was written, for conflict reports.
struct Edge {
    from: usize,
    to: usize,
    declared_by: usize,
    relation: Relation,
}

/// Constraint graph over the distinct callback names. Node indices follow the
/// first declaration of each name; tombstoned names are nodes too.
struct Graph<'a> {
    names: Vec<&'a str>,
    /// Index of the last declaration of each name
    last: Vec<usize>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

impl<'a> Graph<'a> {
    fn new(callbacks: &[&'a Callback]) -> Self {
        let mut index: HashMap<&'a str, usize> = HashMap::new();
        let mut names = Vec::new();
        let mut last = Vec::new();

        for (i, &c) in callbacks.iter().enumerate() {
            let known = index.get(c.name.as_str()).copied();
            match known {
                Some(node) => last[node] = i,
                None => {
                    index.insert(c.name.as_str(), names.len());
                    names.push(c.name.as_str());
                    last.push(i);
                }
            }
        }

        // Every declaration of a name contributes its constraints; unknown targets are ignored
        let mut edges = Vec::new();
        for &c in callbacks {
            let node = index[c.name.as_str()];
            if let Some(&target) = c.before.as_deref().and_then(|t| index.get(t)) {
                edges.push(Edge { from: node, to: target, declared_by: node, relation: Relation::Before });
            }
            if let Some(&target) = c.after.as_deref().and_then(|t| index.get(t)) {
                edges.push(Edge { from: target, to: node, declared_by: node, relation: Relation::After });
            }
        }

        let mut outgoing = vec![Vec::new(); names.len()];
        let mut incoming = vec![Vec::new(); names.len()];
        for (e, edge) in edges.iter().enumerate() {
            outgoing[edge.from].push(e);
            incoming[edge.to].push(e);
        }

        Self { names, last, edges, outgoing, incoming }
    }

    /// Kahn's algorithm; among ready nodes the earliest declared runs first
    fn order(&self) -> Result<Vec<usize>, CallbackError> {
        let mut pending: Vec<usize> = self.incoming.iter().map(Vec::len).collect();
        let mut ready: BTreeSet<usize> = (0..self.names.len()).filter(|&n| pending[n] == 0).collect();
        let mut order = Vec::with_capacity(self.names.len());

        while let Some(node) = ready.pop_first() {
            order.push(node);
            for &e in &self.outgoing[node] {
                let to = self.edges[e].to;
                pending[to] -= 1;
                if pending[to] == 0 {
                    ready.insert(to);
                }
            }
        }

        if order.len() < self.names.len() {
            let mut placed = vec![false; self.names.len()];
            for &node in &order {
                placed[node] = true;
            }
            return Err(self.cycle_conflict(&placed));
        }
        Ok(order)
    }

    /// Walk unplaced predecessors from the earliest unplaced node until a node
    /// repeats; the edge closing the loop is reported.
    fn cycle_conflict(&self, placed: &[bool]) -> CallbackError {
        let mut visited = vec![false; self.names.len()];
        let mut current = placed.iter().position(|p| !p).unwrap_or_default();

        loop {
            visited[current] = true;
            // an unplaced node always keeps at least one unplaced predecessor
            let Some(&e) = self.incoming[current].iter().find(|&&e| !placed[self.edges[e].from]) else {
                return self.conflict(self.incoming[current].first().copied().unwrap_or_default());
            };
            let from = self.edges[e].from;
            if visited[from] {
                return self.conflict(e);
            }
            current = from;
        }
    }

    fn conflict(&self, e: usize) -> CallbackError {
        let edge = &self.edges[e];
        let target = if edge.declared_by == edge.from { edge.to } else { edge.from };
        CallbackError::conflict(self.names[edge.declared_by], edge.relation, self.names[target])
    }
}

/// Sort declarations into the compiled handler list.
///
/// Names resolve to their last declaration, so a later replace wins and a
/// later remove leaves a tombstone that still anchors constraints but
/// contributes no handler. Constraints naming an unknown callback are ignored.
/// Any cycle, a self-reference included, is a conflict.
pub(crate) fn sort_callbacks(callbacks: &[&Callback]) -> Result<Vec<CompiledCallback>, CallbackError> {
    let graph = Graph::new(callbacks);
    let order = graph.order()?;

    let mut compiled = Vec::with_capacity(order.len());
    for node in order {
        if let Some(handler) = callbacks[graph.last[node]].action.handler() {
            compiled.push(CompiledCallback {
                name: graph.names[node].to_string(),
                handler: handler.clone(),
            });
        }
    }

    Ok(compiled)
}
