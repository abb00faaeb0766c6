//! Analysis engines for Voltaic.
//!
//! This crate provides the numerical side of the simulator:
//!
//! - **DC analysis** - operating point and source sweeps
//! - **AC analysis** - small-signal frequency response
//! - **Transient analysis** - time-domain simulation with trapezoidal
//!   companion models
//!
//! All three run on the same dense Gaussian solver, generic over the scalar
//! type from `voltaic_core::scalar`, so pivoting and singularity detection
//! behave identically for real and complex systems.
//!
//! # DC operating point
//!
//! ```rust
//! use voltaic_core::element::{Resistor, VoltageSource};
//! use voltaic_core::{Circuit, Element, NodeName};
//! use voltaic_solver::solve_dc;
//!
//! let mut circuit = Circuit::new();
//! circuit.add(Element::VoltageSource(VoltageSource::dc("V1", "IN", "GND", 10.0))).unwrap();
//! circuit.add(Element::Resistor(Resistor::new("R1", "IN", "OUT", 1000.0))).unwrap();
//! circuit.add(Element::Resistor(Resistor::new("R2", "OUT", "GND", 1000.0))).unwrap();
//!
//! let solution = solve_dc(&circuit).unwrap();
//! let v_out = solution.voltage(circuit.index().node_row(&NodeName::new("OUT")));
//! assert!((v_out - 5.0).abs() < 1e-9);
//! ```
//!
//! # AC sweep
//!
//! ```rust
//! use voltaic_core::element::{Capacitor, Resistor, VoltageSource};
//! use voltaic_core::{Circuit, Element};
//! use voltaic_solver::{solve_ac, AcParams, AcSweepType};
//!
//! let mut circuit = Circuit::new();
//! circuit.add(Element::VoltageSource(VoltageSource::ac("V1", "IN", "GND", 1.0, 0.0, 0.0))).unwrap();
//! circuit.add(Element::Resistor(Resistor::new("R1", "IN", "OUT", 1000.0))).unwrap();
//! circuit.add(Element::Capacitor(Capacitor::new("C1", "OUT", "GND", 159e-9))).unwrap();
//!
//! let params = AcParams {
//!     fstart: 10.0,
//!     fstop: 100e3,
//!     points: 41,
//!     sweep_type: AcSweepType::Decade,
//! };
//! let result = solve_ac(&circuit, &params).unwrap();
//! assert_eq!(result.points.len(), 41);
//! ```

pub mod ac;
pub mod dc;
pub mod error;
pub mod linear;
pub mod transient;

pub use ac::{
    assemble_ac, generate_frequencies, solve_ac, AcParams, AcPoint, AcResult, AcSweepType,
};
pub use dc::{assemble_dc, solve_dc, solve_dc_sweep, DcSolution, DcSweepParams, DcSweepResult};
pub use error::{Error, Result};
pub use linear::solve_dense;
pub use transient::{solve_transient, TransientParams, TransientResult};
