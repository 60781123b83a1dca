//! Graph walks over the processor network.
//!
//! Every walk is iterative with an explicit stack and visited set; long
//! processor chains must not exhaust the call stack.

use super::ids::ProcessorId;
use super::ProcessorNetwork;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Which way to follow connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward sources (against the data flow).
    Up,
    /// Toward sinks (with the data flow).
    Down,
}

/// When a processor is handed to the visitor relative to its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitPattern {
    /// Before the processors reachable from it.
    Pre,
    /// After every processor reachable from it.
    Post,
}

impl ProcessorNetwork {
    /// Distinct processors feeding `id` directly, in connection order.
    pub fn direct_predecessors(&self, id: ProcessorId) -> Vec<ProcessorId> {
        let mut seen = HashSet::new();
        self.slot(id)
            .map(|slot| {
                slot.inports
                    .iter()
                    .flat_map(|inport| inport.connections.iter())
                    .map(|outport| outport.processor)
                    .filter(|processor| seen.insert(*processor))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Distinct processors fed by `id` directly, in connection order.
    pub fn direct_successors(&self, id: ProcessorId) -> Vec<ProcessorId> {
        let mut seen = HashSet::new();
        self.slot(id)
            .map(|slot| {
                slot.outports
                    .iter()
                    .flat_map(|outport| outport.connections.iter())
                    .map(|inport| inport.processor)
                    .filter(|processor| seen.insert(*processor))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn neighbours(&self, id: ProcessorId, direction: Direction) -> Vec<ProcessorId> {
        match direction {
            Direction::Up => self.direct_predecessors(id),
            Direction::Down => self.direct_successors(id),
        }
    }

    /// Visit `start` and every processor reachable from it in `direction`,
    /// each exactly once.
    ///
    /// With [`VisitPattern::Post`] and [`Direction::Up`] the visit order is a
    /// valid evaluation order for the upstream closure of `start`.
    pub fn traverse<F>(&self, direction: Direction, pattern: VisitPattern, start: ProcessorId, mut visitor: F)
    where
        F: FnMut(ProcessorId),
    {
        if !self.contains(start) {
            return;
        }

        let mut visited = HashSet::new();
        match pattern {
            VisitPattern::Pre => {
                let mut stack = vec![start];
                while let Some(id) = stack.pop() {
                    if !visited.insert(id) {
                        continue;
                    }
                    visitor(id);
                    let mut next = self.neighbours(id, direction);
                    next.retain(|n| !visited.contains(n));
                    stack.extend(next.into_iter().rev());
                }
            }
            VisitPattern::Post => {
                // (processor, neighbours already expanded)
                let mut stack = vec![(start, false)];
                while let Some((id, expanded)) = stack.pop() {
                    if expanded {
                        visitor(id);
                        continue;
                    }
                    if !visited.insert(id) {
                        continue;
                    }
                    stack.push((id, true));
                    let mut next = self.neighbours(id, direction);
                    next.retain(|n| !visited.contains(n));
                    stack.extend(next.into_iter().rev().map(|n| (n, false)));
                }
            }
        }
    }

    /// Every processor upstream of `id`, excluding `id` itself.
    pub fn predecessors(&self, id: ProcessorId) -> Vec<ProcessorId> {
        let mut found = Vec::new();
        self.traverse(Direction::Up, VisitPattern::Pre, id, |p| {
            if p != id {
                found.push(p)
            }
        });
        found
    }

    /// Every processor downstream of `id`, excluding `id` itself.
    pub fn successors(&self, id: ProcessorId) -> Vec<ProcessorId> {
        let mut found = Vec::new();
        self.traverse(Direction::Down, VisitPattern::Pre, id, |p| {
            if p != id {
                found.push(p)
            }
        });
        found
    }

    /// Whether `to` can be reached from `from` following the data flow.
    pub fn is_reachable(&self, from: ProcessorId, to: ProcessorId) -> bool {
        let mut stack = vec![from];
        let mut visited = HashSet::new();
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if visited.insert(id) {
                stack.extend(self.direct_successors(id));
            }
        }
        false
    }

    /// The processors needed to compute `targets`: the union of their
    /// upstream closures, in evaluation order.
    pub fn minimal_subnetwork(&self, targets: &[ProcessorId]) -> Vec<ProcessorId> {
        let mut included = HashSet::new();
        for target in targets {
            self.traverse(Direction::Up, VisitPattern::Pre, *target, |p| {
                included.insert(p);
            });
        }
        self.compute_topological_order()
            .into_iter()
            .filter(|id| included.contains(id))
            .collect()
    }

    /// Kahn's algorithm. Among processors whose predecessors have all been
    /// placed, the one registered first goes next.
    pub(crate) fn compute_topological_order(&self) -> Vec<ProcessorId> {
        let ids = self.processor_ids();
        let mut in_degree: HashMap<ProcessorId, usize> = ids
            .iter()
            .map(|id| (*id, self.direct_predecessors(*id).len()))
            .collect();

        let mut ready: BinaryHeap<Reverse<ProcessorId>> = ids
            .iter()
            .filter(|id| in_degree.get(id).copied() == Some(0))
            .map(|id| Reverse(*id))
            .collect();

        let mut order = Vec::with_capacity(ids.len());
        while let Some(Reverse(id)) = ready.pop() {
            order.push(id);
            for successor in self.direct_successors(id) {
                if let Some(degree) = in_degree.get_mut(&successor) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(successor));
                    }
                }
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::PassThrough;

    /// a -> b -> d, a -> c -> d, e (independent, registered between)
    fn diamond() -> (ProcessorNetwork, Vec<ProcessorId>) {
        let mut network = ProcessorNetwork::new();
        let ids = ["a", "b", "e", "c", "d"]
            .iter()
            .map(|name| network.add_processor(*name, Box::new(PassThrough::new())).unwrap())
            .collect();
        network.add_connection("a.out", "b.in").unwrap();
        network.add_connection("a.out", "c.in").unwrap();
        network.add_connection("b.out", "d.in").unwrap();
        network.add_connection("c.out", "d.extra").unwrap();
        (network, ids)
    }

    fn names(network: &ProcessorNetwork, ids: &[ProcessorId]) -> Vec<String> {
        ids.iter()
            .map(|id| network.identifier(*id).unwrap().to_string())
            .collect()
    }

    #[test]
    fn topological_order_breaks_ties_by_registration() {
        let (mut network, _) = diamond();
        let order = network.topological_order().to_vec();
        assert_eq!(names(&network, &order), vec!["a", "b", "e", "c", "d"]);
    }

    #[test]
    fn topological_order_respects_every_connection() {
        let (mut network, _) = diamond();
        let order = network.topological_order().to_vec();
        let position = |id: ProcessorId| order.iter().position(|p| *p == id).unwrap();
        for connection in network.connections() {
            assert!(position(connection.source.processor) < position(connection.destination.processor));
        }
    }

    #[test]
    fn upstream_post_order_visits_dependencies_first() {
        let (network, ids) = diamond();
        let d = ids[4];
        let mut visited = Vec::new();
        network.traverse(Direction::Up, VisitPattern::Post, d, |p| visited.push(p));
        assert_eq!(names(&network, &visited), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn downstream_pre_order_visits_each_processor_once() {
        let (network, ids) = diamond();
        let mut visited = Vec::new();
        network.traverse(Direction::Down, VisitPattern::Pre, ids[0], |p| visited.push(p));
        assert_eq!(names(&network, &visited), vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn deep_chains_do_not_recurse() {
        let mut network = ProcessorNetwork::new();
        let depth = 10_000;
        for i in 0..depth {
            network
                .add_processor(format!("p{i}"), Box::new(PassThrough::new()))
                .unwrap();
            if i > 0 {
                network
                    .add_connection(&format!("p{}.out", i - 1), &format!("p{i}.in"))
                    .unwrap();
            }
        }
        let last = network.processor_id(&format!("p{}", depth - 1)).unwrap();
        assert_eq!(network.predecessors(last).len(), depth - 1);
        assert_eq!(network.topological_order().len(), depth);
    }

    #[test]
    fn minimal_subnetwork_is_the_upstream_closure() {
        let (network, ids) = diamond();
        let b = ids[1];
        assert_eq!(names(&network, &network.minimal_subnetwork(&[b])), vec!["a", "b"]);
    }

    #[test]
    fn reachability_follows_data_flow_only() {
        let (network, ids) = diamond();
        assert!(network.is_reachable(ids[0], ids[4]));
        assert!(!network.is_reachable(ids[4], ids[0]));
        assert!(!network.is_reachable(ids[2], ids[4]));
    }
}
