//! Which formula reads which cell, and the order to evaluate them in

use ahash::{AHashMap, AHashSet};
use std::collections::BTreeSet;
use underwrite_core::CellAddress;

/// Edges from each cell to the formulas that read it
#[derive(Debug, Default)]
pub struct DependencyGraph {
    dependents: AHashMap<CellAddress, AHashSet<CellAddress>>,
    precedents: AHashMap<CellAddress, AHashSet<CellAddress>>,
}

/// Result of [`DependencyGraph::plan`]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct EvaluationPlan {
    /// Every formula after the formulas it reads
    pub order: Vec<CellAddress>,
    /// Formulas on a cycle or reading (directly or not) from one, sorted
    pub circular: Vec<CellAddress>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent` reads `precedent`
    pub fn add_dependency(&mut self, precedent: CellAddress, dependent: CellAddress) {
        self.dependents.entry(precedent).or_default().insert(dependent);
        self.precedents.entry(dependent).or_default().insert(precedent);
    }

    pub fn dependents(&self, cell: CellAddress) -> impl Iterator<Item = CellAddress> + '_ {
        self.dependents.get(&cell).into_iter().flatten().copied()
    }

    pub fn precedents(&self, cell: CellAddress) -> impl Iterator<Item = CellAddress> + '_ {
        self.precedents.get(&cell).into_iter().flatten().copied()
    }

    /// Topologically order `formulas` (Kahn's algorithm)
    ///
    /// Only edges between formula cells count; literals are ready from the
    /// start. Whatever never becomes ready sits on or behind a cycle. Ties are
    /// broken by address so the plan is the same on every run.
    pub fn plan(&self, formulas: &[CellAddress]) -> EvaluationPlan {
        let formula_set: AHashSet<CellAddress> = formulas.iter().copied().collect();

        let mut waiting: AHashMap<CellAddress, usize> = formula_set
            .iter()
            .map(|&cell| {
                let count = self
                    .precedents(cell)
                    .filter(|p| formula_set.contains(p))
                    .count();
                (cell, count)
            })
            .collect();

        let mut ready: BTreeSet<CellAddress> = waiting
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(&cell, _)| cell)
            .collect();

        let mut order = Vec::with_capacity(formula_set.len());
        while let Some(cell) = ready.pop_first() {
            waiting.remove(&cell);
            order.push(cell);
            for dependent in self.dependents(cell) {
                if let Some(count) = waiting.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        let mut circular: Vec<CellAddress> = waiting.into_keys().collect();
        circular.sort();
        EvaluationPlan { order, circular }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    fn cells(list: &[&str]) -> Vec<CellAddress> {
        list.iter().map(|s| addr(s)).collect()
    }

    #[test]
    fn test_edges_both_ways() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(addr("B11"), addr("B14"));

        assert_eq!(graph.dependents(addr("B11")).collect::<Vec<_>>(), cells(&["B14"]));
        assert_eq!(graph.precedents(addr("B14")).collect::<Vec<_>>(), cells(&["B11"]));
        assert_eq!(graph.dependents(addr("B14")).count(), 0);
    }

    #[test]
    fn test_plan_orders_chain() {
        let mut graph = DependencyGraph::new();
        // F23 = F10-F19 and B14 = F23/B11, with F10 itself a formula
        graph.add_dependency(addr("F10"), addr("F23"));
        graph.add_dependency(addr("F19"), addr("F23"));
        graph.add_dependency(addr("F23"), addr("B14"));
        graph.add_dependency(addr("B11"), addr("B14"));

        let plan = graph.plan(&cells(&["B14", "F23", "F10"]));
        assert_eq!(plan.order, cells(&["F10", "F23", "B14"]));
        assert!(plan.circular.is_empty());
    }

    #[test]
    fn test_plan_isolates_cycles_and_their_dependents() {
        let mut graph = DependencyGraph::new();
        // A1 -> B1 -> C1 -> A1, D1 reads C1, E1 reads a literal
        graph.add_dependency(addr("A1"), addr("B1"));
        graph.add_dependency(addr("B1"), addr("C1"));
        graph.add_dependency(addr("C1"), addr("A1"));
        graph.add_dependency(addr("C1"), addr("D1"));
        graph.add_dependency(addr("Z9"), addr("E1"));

        let plan = graph.plan(&cells(&["A1", "B1", "C1", "D1", "E1"]));
        assert_eq!(plan.order, cells(&["E1"]));
        assert_eq!(plan.circular, cells(&["A1", "B1", "C1", "D1"]));
    }

    #[test]
    fn test_self_reference_is_circular() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(addr("B20"), addr("B20"));
        let plan = graph.plan(&cells(&["B20"]));
        assert_eq!(plan.circular, cells(&["B20"]));
    }
}
