//! Transient time-domain analysis.
//!
//! Fixed-step integration with trapezoidal companion models. Each step
//! assembles a fresh MNA system: resistors and independent sources stamp
//! time-instantaneous values, capacitors and inductors stamp their companion
//! conductance plus a history source read from element state. After the
//! solve, every element commits the step through `update_state`, so stamps
//! always see the previous step's state and never a mid-step write.

use nalgebra::DVector;
use voltaic_core::mna::MnaSystem;
use voltaic_core::{Circuit, Error as CoreError};

use crate::error::{Error, Result};
use crate::linear::solve_dense;

/// Inclusion tolerance for the final time point.
const TIME_EPSILON: f64 = 1e-9;

/// Transient analysis parameters.
#[derive(Debug, Clone)]
pub struct TransientParams {
    /// Integration step (s), > 0.
    pub tstep: f64,
    /// Stop time (s), > 0.
    pub tstop: f64,
    /// First time to record (s); earlier steps are integrated but not kept.
    pub tstart: f64,
    /// Requested step ceiling (s). Values <= 0 default to `tstep`; values
    /// below `tstep` are raised to it. The engine runs at fixed `tstep`
    /// either way.
    pub tmaxstep: f64,
}

impl TransientParams {
    /// Parameters recording from t = 0 with the default step ceiling.
    pub fn new(tstep: f64, tstop: f64) -> Self {
        Self {
            tstep,
            tstop,
            tstart: 0.0,
            tmaxstep: 0.0,
        }
    }
}

/// Result of a transient run: one solution vector per recorded time point.
#[derive(Debug, Clone)]
pub struct TransientResult {
    pub times: Vec<f64>,
    /// Full MNA vector at each recorded time.
    pub solutions: Vec<DVector<f64>>,
    /// Number of non-ground nodes (K).
    pub num_nodes: usize,
}

impl TransientResult {
    /// The last recorded point.
    pub fn last(&self) -> Option<(f64, &DVector<f64>)> {
        self.times
            .last()
            .copied()
            .zip(self.solutions.last())
    }

    /// Waveform of one MNA row as (time, value) pairs.
    pub fn waveform(&self, row: usize) -> Vec<(f64, f64)> {
        self.times
            .iter()
            .zip(self.solutions.iter())
            .map(|(&t, s)| (t, s[row]))
            .collect()
    }
}

/// Run a transient analysis.
///
/// Element transient state is reset at the start of the run and advanced
/// once per accepted step. On a solver failure the run stops immediately and
/// the error carries the failing time.
pub fn solve_transient(circuit: &mut Circuit, params: &TransientParams) -> Result<TransientResult> {
    if params.tstep <= 0.0 || params.tstop <= 0.0 {
        return Err(CoreError::InvalidValue(
            "tstep and tstop must be positive".to_string(),
        )
        .into());
    }
    if params.tstart < 0.0 || params.tstart > params.tstop {
        return Err(CoreError::InvalidValue(
            "tstart must lie between 0 and tstop".to_string(),
        )
        .into());
    }
    let mut tmaxstep = params.tmaxstep;
    if tmaxstep <= 0.0 {
        tmaxstep = params.tstep;
    }
    if tmaxstep < params.tstep {
        log::warn!(
            "tmaxstep {:.3e} is below tstep {:.3e}, raising it to tstep",
            tmaxstep,
            params.tstep
        );
    }
    // Fixed-step integration; tmaxstep is a floor-checked ceiling reserved
    // for adaptive stepping.
    let dt = params.tstep;

    let (elements, _) = circuit.parts_mut();
    for element in elements.iter_mut() {
        element.initialize_state();
    }

    let size = circuit.index().size();
    let num_nodes = circuit.index().num_nodes();
    let mut result = TransientResult {
        times: Vec::new(),
        solutions: Vec::new(),
        num_nodes,
    };

    let mut step = 0u64;
    loop {
        let time = step as f64 * dt;
        if time > params.tstop + TIME_EPSILON {
            break;
        }

        let (elements, index) = circuit.parts_mut();
        let mut mna = MnaSystem::new(index.num_nodes(), index.num_branches());
        for element in elements.iter() {
            element
                .stamp_transient(&mut mna, index, dt, time)
                .map_err(Error::from)
                .map_err(|e| Error::StepFailed {
                    time,
                    source: Box::new(e),
                })?;
        }

        let solution = solve_dense(mna.matrix(), mna.rhs()).map_err(|e| Error::StepFailed {
            time,
            source: Box::new(e),
        })?;
        debug_assert_eq!(solution.len(), size);

        for element in elements.iter_mut() {
            element.update_state(&solution, index, dt);
        }

        if time >= params.tstart - TIME_EPSILON {
            result.times.push(time);
            result.solutions.push(solution);
        }

        step += 1;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use voltaic_core::element::{Capacitor, Inductor, Resistor, VoltageSource};
    use voltaic_core::{Element, NodeName};

    #[test]
    fn test_rejects_bad_params() {
        let mut circuit = Circuit::new();
        circuit
            .add(Element::Resistor(Resistor::new("R1", "A", "GND", 1.0)))
            .unwrap();

        assert!(solve_transient(&mut circuit, &TransientParams::new(0.0, 1.0)).is_err());
        assert!(solve_transient(&mut circuit, &TransientParams::new(1e-6, -1.0)).is_err());

        let bad_start = TransientParams {
            tstep: 1e-6,
            tstop: 1e-3,
            tstart: 2e-3,
            tmaxstep: 0.0,
        };
        assert!(solve_transient(&mut circuit, &bad_start).is_err());
    }

    #[test]
    fn test_resistive_network_is_flat() {
        let mut circuit = Circuit::new();
        circuit
            .add(Element::VoltageSource(VoltageSource::dc("V1", "IN", "GND", 5.0)))
            .unwrap();
        circuit
            .add(Element::Resistor(Resistor::new("R1", "IN", "OUT", 1000.0)))
            .unwrap();
        circuit
            .add(Element::Resistor(Resistor::new("R2", "OUT", "GND", 1000.0)))
            .unwrap();

        let result = solve_transient(&mut circuit, &TransientParams::new(1e-6, 1e-5)).unwrap();
        let out_row = circuit.index().node_row(&NodeName::new("OUT")).unwrap();

        assert_eq!(result.times.len(), 11); // t = 0, 1u, ..., 10u
        for (_, v) in result.waveform(out_row) {
            assert!((v - 2.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rl_step_response() {
        // V1 = 1 V step, R = 10 Ohm, L = 1 mH: tau = 100 us.
        // I(t) = 0.1 * (1 - exp(-t / tau)), so I(100 us) ~ 0.06321 A.
        let mut circuit = Circuit::new();
        circuit
            .add(Element::Resistor(Resistor::new("R1", "IN", "OUT", 10.0)))
            .unwrap();
        circuit
            .add(Element::Inductor(Inductor::new("L1", "OUT", "GND", 1e-3)))
            .unwrap();
        circuit
            .add(Element::VoltageSource(VoltageSource::dc("V1", "IN", "GND", 1.0)))
            .unwrap();

        let result = solve_transient(&mut circuit, &TransientParams::new(1e-6, 1e-3)).unwrap();
        let l_row = circuit.index().branch_row("L1").unwrap();
        let waveform = result.waveform(l_row);

        let tau = 1e-3 / 10.0;
        let at = |t: f64| {
            waveform
                .iter()
                .min_by(|a, b| {
                    (a.0 - t).abs().partial_cmp(&(b.0 - t).abs()).unwrap()
                })
                .unwrap()
                .1
        };

        let i_tau = at(tau);
        let expected = 0.1 * (1.0 - (-1.0f64).exp());
        assert!(
            (i_tau - expected).abs() / expected < 0.01,
            "I(L1) at tau = {i_tau} (expected ~{expected})"
        );

        // Far past 5 tau the current settles at V/R
        let i_final = waveform.last().unwrap().1;
        assert!((i_final - 0.1).abs() / 0.1 < 0.01, "final I = {i_final}");
    }

    #[test]
    fn test_rc_step_settles_to_dc() {
        // R = 1 k, C = 1 uF: tau = 1 ms. By 15 tau the capacitor voltage
        // matches the DC steady state to a part per million.
        let mut circuit = Circuit::new();
        circuit
            .add(Element::VoltageSource(VoltageSource::dc("V1", "IN", "GND", 5.0)))
            .unwrap();
        circuit
            .add(Element::Resistor(Resistor::new("R1", "IN", "OUT", 1000.0)))
            .unwrap();
        circuit
            .add(Element::Capacitor(Capacitor::new("C1", "OUT", "GND", 1e-6)))
            .unwrap();

        let result = solve_transient(&mut circuit, &TransientParams::new(1e-5, 1.5e-2)).unwrap();
        let out_row = circuit.index().node_row(&NodeName::new("OUT")).unwrap();

        let v_final = result.waveform(out_row).last().unwrap().1;
        assert!(
            (v_final - 5.0).abs() / 5.0 < 1e-6,
            "V(OUT) settled at {v_final} (expected 5.0)"
        );
    }

    #[test]
    fn test_sinusoidal_source_waveform() {
        // Pure AC source across a resistor: node voltage tracks the source.
        let mut circuit = Circuit::new();
        circuit
            .add(Element::VoltageSource(VoltageSource::ac(
                "V1", "IN", "GND", 2.0, 0.0, 1000.0,
            )))
            .unwrap();
        circuit
            .add(Element::Resistor(Resistor::new("R1", "IN", "GND", 50.0)))
            .unwrap();

        let result = solve_transient(&mut circuit, &TransientParams::new(25e-6, 1e-3)).unwrap();
        let in_row = circuit.index().node_row(&NodeName::new("IN")).unwrap();

        for (t, v) in result.waveform(in_row) {
            let expected = 2.0 * (2.0 * std::f64::consts::PI * 1000.0 * t).sin();
            assert!(
                (v - expected).abs() < 1e-9,
                "V(IN) at {t}: {v} vs {expected}"
            );
        }
    }

    #[test]
    fn test_tstart_gates_recording() {
        let mut circuit = Circuit::new();
        circuit
            .add(Element::VoltageSource(VoltageSource::dc("V1", "A", "GND", 1.0)))
            .unwrap();
        circuit
            .add(Element::Resistor(Resistor::new("R1", "A", "GND", 1.0)))
            .unwrap();

        let params = TransientParams {
            tstep: 1e-6,
            tstop: 1e-5,
            tstart: 5e-6,
            tmaxstep: 0.0,
        };
        let result = solve_transient(&mut circuit, &params).unwrap();
        assert_eq!(result.times.len(), 6); // 5u..=10u
        assert!((result.times[0] - 5e-6).abs() < 1e-12);
    }

    #[test]
    fn test_failure_carries_time() {
        // A capacitor alone floats in every DC-like step matrix.
        let mut circuit = Circuit::new();
        circuit
            .add(Element::Capacitor(Capacitor::new("C1", "A", "B", 1e-6)))
            .unwrap();
        circuit
            .add(Element::Resistor(Resistor::new("R1", "C", "D", 1.0)))
            .unwrap();

        let err = solve_transient(&mut circuit, &TransientParams::new(1e-6, 1e-3)).unwrap_err();
        match err {
            Error::StepFailed { time, source } => {
                assert_eq!(time, 0.0);
                assert!(matches!(*source, Error::Singular));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_state_reset_between_runs() {
        // Two identical runs must produce identical trajectories.
        let mut circuit = Circuit::new();
        circuit
            .add(Element::VoltageSource(VoltageSource::dc("V1", "IN", "GND", 1.0)))
            .unwrap();
        circuit
            .add(Element::Resistor(Resistor::new("R1", "IN", "OUT", 100.0)))
            .unwrap();
        circuit
            .add(Element::Capacitor(Capacitor::new("C1", "OUT", "GND", 1e-6)))
            .unwrap();

        let params = TransientParams::new(1e-5, 1e-3);
        let first = solve_transient(&mut circuit, &params).unwrap();
        let second = solve_transient(&mut circuit, &params).unwrap();

        let out_row = circuit.index().node_row(&NodeName::new("OUT")).unwrap();
        for (a, b) in first.waveform(out_row).iter().zip(second.waveform(out_row)) {
            assert_eq!(a.1, b.1);
        }
    }
}
