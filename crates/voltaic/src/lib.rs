//! # Voltaic
//!
//! An interactive SPICE-style simulator for lumped linear circuits.
//!
//! Voltaic provides:
//! - An incrementally mutable circuit model (add, delete, rename)
//! - DC operating point and DC source sweeps
//! - AC small-signal frequency sweeps (linear, decade, octave)
//! - Transient simulation with trapezoidal companion models
//!
//! ## Quick start
//!
//! ```rust
//! use voltaic::prelude::*;
//!
//! let mut circuit = Circuit::new();
//! circuit.add(Element::VoltageSource(VoltageSource::dc("V1", "IN", "GND", 10.0))).unwrap();
//! circuit.add(Element::Resistor(Resistor::new("R1", "IN", "OUT", 1000.0))).unwrap();
//! circuit.add(Element::Resistor(Resistor::new("R2", "OUT", "GND", 1000.0))).unwrap();
//!
//! let dc = solve_dc(&circuit).unwrap();
//! let out = circuit.index().node_row(&NodeName::new("OUT"));
//! assert!((dc.voltage(out) - 5.0).abs() < 1e-9);
//! ```

// Re-export the member crates
pub use voltaic_core as core;
pub use voltaic_solver as solver;

// Convenient re-exports from voltaic_core
pub use voltaic_core::{
    Circuit, Element, Error as CoreError, MnaIndex, NodeName, Scalar, GROUND,
};

pub use voltaic_core::element::{Capacitor, CurrentSource, Inductor, Resistor, VoltageSource};
pub use voltaic_core::mna::MnaSystem;
pub use voltaic_core::units::{format_value, parse_value};

// Convenient re-exports from voltaic_solver
pub use voltaic_solver::{
    assemble_ac, assemble_dc, solve_ac, solve_dc, solve_dc_sweep, solve_dense, solve_transient,
    AcParams, AcResult, AcSweepType, DcSolution, DcSweepParams, DcSweepResult,
    Error as SolverError, TransientParams, TransientResult,
};

/// Re-export of nalgebra's dynamic vector and matrix types.
pub use nalgebra::{DMatrix, DVector};

/// Re-export of num_complex's Complex type.
pub use num_complex::Complex;

/// Commonly used types and functions.
pub mod prelude {
    pub use crate::{Circuit, Element, MnaIndex, MnaSystem, NodeName};

    pub use crate::{Capacitor, CurrentSource, Inductor, Resistor, VoltageSource};

    pub use crate::{solve_ac, AcParams, AcResult, AcSweepType};
    pub use crate::{solve_dc, solve_dc_sweep, DcSolution, DcSweepParams, DcSweepResult};
    pub use crate::{solve_transient, TransientParams, TransientResult};

    pub use crate::{Complex, DMatrix, DVector};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_covers_a_full_session() {
        let mut circuit = Circuit::new();
        circuit
            .add(Element::VoltageSource(VoltageSource::dc("V1", "IN", "GND", 1.0)))
            .unwrap();
        circuit
            .add(Element::Resistor(Resistor::new("R1", "IN", "GND", 100.0)))
            .unwrap();

        let dc = solve_dc(&circuit).unwrap();
        let row = circuit.index().node_row(&NodeName::new("IN"));
        assert!((dc.voltage(row) - 1.0).abs() < 1e-12);
    }
}
