//! Core circuit representation and MNA assembly for Voltaic.
//!
//! This crate provides the data model of the simulator: named nodes, the
//! closed set of element kinds with their per-analysis stamps, the circuit
//! with its index allocator, and the scalar-generic MNA matrix system.
//!
//! # Modified Nodal Analysis (MNA)
//!
//! The system `Ax = b` contains one KCL row per non-ground node and one
//! constraint row per branch-current variable (voltage sources and
//! inductors). For a circuit with K non-ground nodes and M branch variables
//! the vector has length K + M; node rows are `0..K` in sorted name order
//! and branch rows are the absolute indices `K..K+M` in element order.
//!
//! # Example: assembling by hand
//!
//! ```rust
//! use voltaic_core::mna::MnaSystem;
//!
//! // Voltage divider: V1 = 10 V at row 0, two 1 kOhm resistors.
//! let mut mna: MnaSystem<f64> = MnaSystem::new(2, 1);
//! mna.stamp_voltage_source(Some(0), None, 2, 10.0);
//! mna.stamp_admittance(Some(0), Some(1), 1e-3);
//! mna.stamp_admittance(Some(1), None, 1e-3);
//! assert_eq!(mna.size(), 3);
//! ```
//!
//! # Example: building a circuit
//!
//! ```rust
//! use voltaic_core::{Circuit, Element};
//! use voltaic_core::element::{Resistor, VoltageSource};
//!
//! let mut circuit = Circuit::new();
//! circuit.add(Element::VoltageSource(VoltageSource::dc("V1", "IN", "GND", 10.0))).unwrap();
//! circuit.add(Element::Resistor(Resistor::new("R1", "IN", "OUT", 1000.0))).unwrap();
//! circuit.add(Element::Resistor(Resistor::new("R2", "OUT", "GND", 1000.0))).unwrap();
//!
//! // Two non-ground nodes plus one branch current.
//! assert_eq!(circuit.index().size(), 3);
//! ```

pub mod circuit;
pub mod element;
pub mod error;
pub mod mna;
pub mod node;
pub mod scalar;
pub mod units;

pub use circuit::{Circuit, MnaIndex};
pub use element::Element;
pub use error::{Error, Result};
pub use node::{NodeName, GROUND};
pub use scalar::{Scalar, PIVOT_TOLERANCE};
