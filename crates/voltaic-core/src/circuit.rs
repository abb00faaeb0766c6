//! Circuit: element storage and MNA index allocation.
//!
//! The circuit owns the element vector and is the single authority on index
//! assignment. After every mutation the node set and the row maps are
//! recomputed from scratch, so they are never stale relative to the element
//! list.

use std::collections::{BTreeMap, BTreeSet};

use crate::element::Element;
use crate::error::{Error, Result};
use crate::node::{NodeName, GROUND};

/// Row assignment for the MNA system.
///
/// Non-ground nodes receive rows `0..K` in sorted name order; elements with a
/// branch-current variable (voltage sources, inductors) receive the absolute
/// rows `K..K+M` in element-vector order. Ground has no row.
#[derive(Debug, Clone, Default)]
pub struct MnaIndex {
    node_rows: BTreeMap<String, usize>,
    branch_rows: BTreeMap<String, usize>,
    num_branches: usize,
}

impl MnaIndex {
    /// Matrix row of a node, or `None` for ground.
    pub fn node_row(&self, node: &NodeName) -> Option<usize> {
        if node.is_ground() {
            None
        } else {
            self.node_rows.get(node.as_str()).copied()
        }
    }

    /// Absolute matrix row of an element's branch-current variable.
    pub fn branch_row(&self, element: &str) -> Option<usize> {
        self.branch_rows.get(element).copied()
    }

    /// Number of non-ground nodes (K).
    pub fn num_nodes(&self) -> usize {
        self.node_rows.len()
    }

    /// Number of branch-current variables (M).
    pub fn num_branches(&self) -> usize {
        self.num_branches
    }

    /// Total MNA size (K + M).
    pub fn size(&self) -> usize {
        self.num_nodes() + self.num_branches
    }

    /// Node rows in row order (sorted by name).
    pub fn node_rows(&self) -> impl Iterator<Item = (&str, usize)> {
        self.node_rows.iter().map(|(name, &row)| (name.as_str(), row))
    }

    /// Branch rows, sorted by element name.
    pub fn branch_rows(&self) -> impl Iterator<Item = (&str, usize)> {
        self.branch_rows.iter().map(|(name, &row)| (name.as_str(), row))
    }
}

/// A circuit: element vector plus derived node set and index maps.
#[derive(Debug, Default)]
pub struct Circuit {
    elements: Vec<Element>,
    nodes: BTreeSet<String>,
    index: MnaIndex,
}

impl Circuit {
    /// Create an empty circuit. The ground node always exists.
    pub fn new() -> Self {
        let mut circuit = Self::default();
        circuit.rebuild();
        circuit
    }

    /// Add an element, validating it first.
    pub fn add(&mut self, element: Element) -> Result<()> {
        if self.has_element(element.name()) {
            return Err(Error::duplicate(element.name(), element.kind()));
        }
        element.validate()?;
        self.elements.push(element);
        self.rebuild();
        Ok(())
    }

    /// Delete an element by name (case-insensitive).
    pub fn delete(&mut self, name: &str) -> Result<()> {
        let upper = name.to_uppercase();
        let position = self
            .elements
            .iter()
            .position(|el| el.name() == upper)
            .ok_or_else(|| Error::ElementNotFound(name.to_string()))?;
        self.elements.remove(position);
        self.rebuild();
        Ok(())
    }

    /// Rename a node, replacing every occurrence on element terminals.
    ///
    /// Fails with `NodeNotFound` if the old name is unknown and with
    /// `DuplicateName` if the new name already names a different node.
    pub fn rename_node(&mut self, old: &str, new: &str) -> Result<()> {
        let old = NodeName::new(old);
        let new = NodeName::new(new);
        if !self.nodes.contains(old.as_str()) {
            return Err(Error::NodeNotFound(old.to_string()));
        }
        if self.nodes.contains(new.as_str()) && old != new {
            return Err(Error::duplicate(new.as_str(), "Node name"));
        }
        for element in &mut self.elements {
            element.rename_node(&old, &new);
        }
        self.rebuild();
        Ok(())
    }

    /// Whether an element with this name exists (case-insensitive).
    pub fn has_element(&self, name: &str) -> bool {
        let upper = name.to_uppercase();
        self.elements.iter().any(|el| el.name() == upper)
    }

    /// Look up an element by name (case-insensitive).
    pub fn find(&self, name: &str) -> Option<&Element> {
        let upper = name.to_uppercase();
        self.elements.iter().find(|el| el.name() == upper)
    }

    /// The DC value of a named independent source.
    pub fn source_dc(&self, name: &str) -> Result<f64> {
        match self.find(name) {
            Some(Element::VoltageSource(v)) => Ok(v.dc),
            Some(Element::CurrentSource(i)) => Ok(i.dc),
            Some(other) => Err(Error::Unsupported(format!(
                "'{}' is a {}, not an independent source",
                other.name(),
                other.kind()
            ))),
            None => Err(Error::ElementNotFound(name.to_string())),
        }
    }

    /// Set the DC value of a named independent source (used by the DC sweep).
    pub fn set_source_dc(&mut self, name: &str, value: f64) -> Result<()> {
        let upper = name.to_uppercase();
        match self.elements.iter_mut().find(|el| el.name() == upper) {
            Some(Element::VoltageSource(v)) => {
                v.dc = value;
                Ok(())
            }
            Some(Element::CurrentSource(i)) => {
                i.dc = value;
                Ok(())
            }
            Some(other) => Err(Error::Unsupported(format!(
                "'{}' is a {}, not an independent source",
                other.name(),
                other.kind()
            ))),
            None => Err(Error::ElementNotFound(name.to_string())),
        }
    }

    /// All elements, in insertion order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Split borrow for the transient engine: mutable elements alongside the
    /// (immutable) index maps.
    pub fn parts_mut(&mut self) -> (&mut [Element], &MnaIndex) {
        (&mut self.elements, &self.index)
    }

    /// The current row assignment.
    pub fn index(&self) -> &MnaIndex {
        &self.index
    }

    /// Node names in sorted order, ground included.
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|s| s.as_str())
    }

    /// Number of elements.
    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Whether the circuit has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Recompute the node set and both row maps from the element vector.
    fn rebuild(&mut self) {
        self.nodes.clear();
        self.nodes.insert(GROUND.to_string());
        for element in &self.elements {
            self.nodes.insert(element.node_pos().to_string());
            self.nodes.insert(element.node_neg().to_string());
        }

        self.index.node_rows.clear();
        let mut row = 0;
        for node in &self.nodes {
            if node != GROUND {
                self.index.node_rows.insert(node.clone(), row);
                row += 1;
            }
        }

        // Branch rows follow the node rows, allocated in element order.
        self.index.branch_rows.clear();
        let mut branch = row;
        for element in &self.elements {
            if element.needs_branch_current() {
                self.index.branch_rows.insert(element.name().to_string(), branch);
                branch += 1;
            }
        }
        self.index.num_branches = branch - row;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Capacitor, CurrentSource, Inductor, Resistor, VoltageSource};

    fn rlc() -> Circuit {
        let mut circuit = Circuit::new();
        circuit
            .add(Element::VoltageSource(VoltageSource::dc("V1", "IN", "GND", 5.0)))
            .unwrap();
        circuit
            .add(Element::Resistor(Resistor::new("R1", "IN", "MID", 100.0)))
            .unwrap();
        circuit
            .add(Element::Inductor(Inductor::new("L1", "MID", "OUT", 1e-3)))
            .unwrap();
        circuit
            .add(Element::Capacitor(Capacitor::new("C1", "OUT", "GND", 1e-6)))
            .unwrap();
        circuit
    }

    #[test]
    fn test_empty_circuit_has_ground() {
        let circuit = Circuit::new();
        let nodes: Vec<_> = circuit.node_names().collect();
        assert_eq!(nodes, ["GND"]);
        assert_eq!(circuit.index().size(), 0);
    }

    #[test]
    fn test_index_allocation() {
        let circuit = rlc();
        let index = circuit.index();

        // Nodes sorted: IN, MID, OUT -> rows 0, 1, 2
        assert_eq!(index.num_nodes(), 3);
        assert_eq!(index.node_row(&NodeName::new("IN")), Some(0));
        assert_eq!(index.node_row(&NodeName::new("MID")), Some(1));
        assert_eq!(index.node_row(&NodeName::new("OUT")), Some(2));
        assert_eq!(index.node_row(&NodeName::ground()), None);

        // Branch rows in element order after the node rows: V1 then L1
        assert_eq!(index.num_branches(), 2);
        assert_eq!(index.branch_row("V1"), Some(3));
        assert_eq!(index.branch_row("L1"), Some(4));
        assert_eq!(index.size(), 5);
    }

    #[test]
    fn test_index_invariant_across_mutations() {
        let mut circuit = rlc();

        circuit.delete("L1").unwrap();
        assert_eq!(circuit.index().num_branches(), 1);
        assert_eq!(circuit.index().branch_row("V1"), Some(3));
        assert_eq!(circuit.index().branch_row("L1"), None);
        // MID and OUT survive through R1 and C1
        assert_eq!(circuit.index().num_nodes(), 3);

        circuit.delete("C1").unwrap();
        // OUT had no other element attached
        assert_eq!(circuit.index().num_nodes(), 2);
        assert_eq!(circuit.index().size(), 3);

        // Branch rows stay contiguous after node rows
        let rows: Vec<_> = circuit.index().branch_rows().map(|(_, r)| r).collect();
        assert_eq!(rows, [2]);
    }

    #[test]
    fn test_duplicate_element_name() {
        let mut circuit = Circuit::new();
        circuit
            .add(Element::Resistor(Resistor::new("R1", "A", "B", 10.0)))
            .unwrap();
        let err = circuit
            .add(Element::Resistor(Resistor::new("r1", "C", "D", 20.0)))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName { .. }));
        assert_eq!(circuit.num_elements(), 1);
    }

    #[test]
    fn test_delete_missing_element() {
        let mut circuit = Circuit::new();
        assert!(matches!(
            circuit.delete("R9"),
            Err(Error::ElementNotFound(_))
        ));
    }

    #[test]
    fn test_rename_node() {
        let mut circuit = Circuit::new();
        circuit
            .add(Element::Resistor(Resistor::new("R1", "A", "B", 10.0)))
            .unwrap();

        circuit.rename_node("b", "OUT").unwrap();
        let nodes: Vec<_> = circuit.node_names().collect();
        assert_eq!(nodes, ["A", "GND", "OUT"]);
        assert_eq!(circuit.find("R1").unwrap().node_neg().as_str(), "OUT");
    }

    #[test]
    fn test_rename_collision_leaves_circuit_unchanged() {
        let mut circuit = Circuit::new();
        circuit
            .add(Element::Resistor(Resistor::new("R1", "A", "B", 1.0)))
            .unwrap();

        let err = circuit.rename_node("B", "A").unwrap_err();
        match err {
            Error::DuplicateName { name, kind } => {
                assert_eq!(name, "A");
                assert_eq!(kind, "Node name");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let nodes: Vec<_> = circuit.node_names().collect();
        assert_eq!(nodes, ["A", "B", "GND"]);
        assert_eq!(circuit.find("R1").unwrap().node_pos().as_str(), "A");
    }

    #[test]
    fn test_rename_missing_node() {
        let mut circuit = Circuit::new();
        assert!(matches!(
            circuit.rename_node("X", "Y"),
            Err(Error::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_rename_same_name_is_noop() {
        let mut circuit = Circuit::new();
        circuit
            .add(Element::Resistor(Resistor::new("R1", "A", "GND", 1.0)))
            .unwrap();
        circuit.rename_node("A", "a").unwrap();
        assert_eq!(circuit.index().num_nodes(), 1);
    }

    #[test]
    fn test_source_dc_access() {
        let mut circuit = Circuit::new();
        circuit
            .add(Element::CurrentSource(CurrentSource::dc("I1", "A", "GND", 0.01)))
            .unwrap();
        circuit
            .add(Element::Resistor(Resistor::new("R1", "A", "GND", 100.0)))
            .unwrap();

        assert_eq!(circuit.source_dc("i1").unwrap(), 0.01);
        circuit.set_source_dc("I1", 0.02).unwrap();
        assert_eq!(circuit.source_dc("I1").unwrap(), 0.02);

        assert!(matches!(
            circuit.source_dc("R1"),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            circuit.set_source_dc("X1", 1.0),
            Err(Error::ElementNotFound(_))
        ));
    }
}
