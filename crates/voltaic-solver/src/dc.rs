//! DC operating point and DC sweep analysis.

use nalgebra::DVector;
use voltaic_core::mna::MnaSystem;
use voltaic_core::{Circuit, Error as CoreError};

use crate::error::Result;
use crate::linear::solve_dense;

/// Result of a DC operating point analysis: the full MNA vector
/// (node voltages followed by branch currents).
#[derive(Debug, Clone)]
pub struct DcSolution {
    /// Solution vector of length K + M.
    pub values: DVector<f64>,
    /// Number of non-ground nodes (K).
    pub num_nodes: usize,
}

impl DcSolution {
    /// Voltage at a node row; `None` is ground (0 V).
    pub fn voltage(&self, node_row: Option<usize>) -> f64 {
        node_row.map(|row| self.values[row]).unwrap_or(0.0)
    }

    /// Voltage difference between two node rows.
    pub fn voltage_diff(&self, pos: Option<usize>, neg: Option<usize>) -> f64 {
        self.voltage(pos) - self.voltage(neg)
    }

    /// Branch current by absolute MNA row.
    pub fn branch_current(&self, branch_row: usize) -> f64 {
        self.values[branch_row]
    }
}

/// DC sweep parameters: `points` linearly spaced values of a source's DC
/// level between `start` and `stop`.
#[derive(Debug, Clone)]
pub struct DcSweepParams {
    /// Name of the voltage or current source to sweep.
    pub source: String,
    pub start: f64,
    pub stop: f64,
    pub points: usize,
}

/// Result of a DC sweep.
#[derive(Debug, Clone)]
pub struct DcSweepResult {
    pub source: String,
    /// Source value at each sweep point.
    pub sweep_values: Vec<f64>,
    /// DC solution at each sweep point.
    pub solutions: Vec<DcSolution>,
}

impl DcSweepResult {
    /// The final sweep point's solution.
    pub fn last(&self) -> Option<&DcSolution> {
        self.solutions.last()
    }
}

/// Assemble the DC MNA system for a circuit.
pub fn assemble_dc(circuit: &Circuit) -> MnaSystem<f64> {
    let index = circuit.index();
    let mut mna = MnaSystem::new(index.num_nodes(), index.num_branches());
    for element in circuit.elements() {
        element.stamp_dc(&mut mna, index);
    }
    mna
}

/// Solve the DC operating point.
pub fn solve_dc(circuit: &Circuit) -> Result<DcSolution> {
    let mna = assemble_dc(circuit);
    let values = solve_dense(mna.matrix(), mna.rhs())?;
    Ok(DcSolution {
        values,
        num_nodes: mna.num_nodes(),
    })
}

/// Run a DC sweep over a named source.
///
/// The source's DC value is set to each sample in turn and the operating
/// point re-solved. The original value is restored before returning, on
/// failure as well as on success.
pub fn solve_dc_sweep(circuit: &mut Circuit, params: &DcSweepParams) -> Result<DcSweepResult> {
    if params.points == 0 {
        return Err(CoreError::InvalidValue(
            "sweep needs at least one point".to_string(),
        )
        .into());
    }
    if params.points == 1 && params.start != params.stop {
        return Err(CoreError::InvalidValue(
            "a single-point sweep requires identical endpoints".to_string(),
        )
        .into());
    }

    let original = circuit.source_dc(&params.source)?;

    let mut sweep_values = Vec::with_capacity(params.points);
    let mut solutions = Vec::with_capacity(params.points);
    let mut failure = None;

    for i in 0..params.points {
        let value = if params.points == 1 {
            params.start
        } else {
            params.start + (params.stop - params.start) * i as f64 / (params.points - 1) as f64
        };
        // The source exists: the lookup above proved it.
        circuit.set_source_dc(&params.source, value)?;
        match solve_dc(circuit) {
            Ok(solution) => {
                sweep_values.push(value);
                solutions.push(solution);
            }
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }

    circuit.set_source_dc(&params.source, original)?;

    match failure {
        Some(e) => Err(e),
        None => Ok(DcSweepResult {
            source: params.source.to_uppercase(),
            sweep_values,
            solutions,
        }),
    }
}
