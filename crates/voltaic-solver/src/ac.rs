//! AC small-signal frequency-domain analysis.

use std::f64::consts::PI;
use std::str::FromStr;

use nalgebra::DVector;
use num_complex::Complex;
use voltaic_core::mna::MnaSystem;
use voltaic_core::{Circuit, Error as CoreError};

use crate::error::Result;
use crate::linear::solve_dense;

/// AC sweep spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcSweepType {
    /// Linear frequency spacing.
    Linear,
    /// Logarithmic spacing between the endpoint decades.
    Decade,
    /// Logarithmic spacing between the endpoint octaves; same ratios as
    /// [`AcSweepType::Decade`] for a fixed point count.
    Octave,
}

impl FromStr for AcSweepType {
    type Err = CoreError;

    fn from_str(s: &str) -> std::result::Result<Self, CoreError> {
        match s.to_uppercase().as_str() {
            "LIN" => Ok(AcSweepType::Linear),
            "DEC" => Ok(AcSweepType::Decade),
            "OCT" => Ok(AcSweepType::Octave),
            other => Err(CoreError::Unsupported(format!(
                "unknown sweep type '{other}', use LIN, DEC, or OCT"
            ))),
        }
    }
}

/// AC analysis parameters.
#[derive(Debug, Clone)]
pub struct AcParams {
    /// Start frequency (Hz), > 0.
    pub fstart: f64,
    /// Stop frequency (Hz), >= fstart.
    pub fstop: f64,
    /// Total number of sweep points.
    pub points: usize,
    pub sweep_type: AcSweepType,
}

/// A single solved frequency point.
#[derive(Debug, Clone)]
pub struct AcPoint {
    /// Frequency (Hz).
    pub frequency: f64,
    /// Complex solution vector (node voltages + branch currents).
    pub solution: DVector<Complex<f64>>,
}

/// Result of an AC sweep.
#[derive(Debug, Clone)]
pub struct AcResult {
    pub points: Vec<AcPoint>,
    /// Number of non-ground nodes (K).
    pub num_nodes: usize,
}

impl AcResult {
    /// The final frequency point.
    pub fn last(&self) -> Option<&AcPoint> {
        self.points.last()
    }

    /// Magnitude at a given MNA row across the sweep.
    pub fn magnitude(&self, row: usize) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.frequency, p.solution[row].norm()))
            .collect()
    }

    /// Phase in degrees at a given MNA row across the sweep.
    pub fn phase_deg(&self, row: usize) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.frequency, p.solution[row].arg() * 180.0 / PI))
            .collect()
    }
}

/// Generate the sweep frequencies.
///
/// Linear: `f_i = f0 + (f1 - f0) * i / (N - 1)`. Decade and octave sweeps
/// space the same N points between `log10(f0)` and `log10(f1)` (the log base
/// cancels out of the ratio). A single-point sweep evaluates at `f0`.
pub fn generate_frequencies(params: &AcParams) -> Vec<f64> {
    if params.points <= 1 {
        return vec![params.fstart];
    }
    let n = (params.points - 1) as f64;
    match params.sweep_type {
        AcSweepType::Linear => (0..params.points)
            .map(|i| params.fstart + (params.fstop - params.fstart) * i as f64 / n)
            .collect(),
        AcSweepType::Decade | AcSweepType::Octave => {
            let log_start = params.fstart.log10();
            let log_stop = params.fstop.log10();
            (0..params.points)
                .map(|i| 10f64.powf(log_start + (log_stop - log_start) * i as f64 / n))
                .collect()
        }
    }
}

/// Assemble the complex MNA system at `omega` = 2*pi*f.
pub fn assemble_ac(circuit: &Circuit, omega: f64) -> MnaSystem<Complex<f64>> {
    let index = circuit.index();
    let mut mna = MnaSystem::new(index.num_nodes(), index.num_branches());
    for element in circuit.elements() {
        element.stamp_ac(&mut mna, index, omega);
    }
    mna
}

/// Run an AC sweep, solving the complex MNA system at each frequency.
pub fn solve_ac(circuit: &Circuit, params: &AcParams) -> Result<AcResult> {
    if params.points == 0 {
        return Err(CoreError::InvalidValue(
            "sweep needs at least one point".to_string(),
        )
        .into());
    }
    if params.fstart <= 0.0 || params.fstop <= 0.0 {
        return Err(CoreError::InvalidValue(
            "start and end frequencies must be positive".to_string(),
        )
        .into());
    }
    if params.fstart > params.fstop {
        return Err(CoreError::InvalidValue(
            "start frequency cannot be greater than end frequency".to_string(),
        )
        .into());
    }

    let frequencies = generate_frequencies(params);
    let mut result = AcResult {
        points: Vec::with_capacity(frequencies.len()),
        num_nodes: circuit.index().num_nodes(),
    };

    for &frequency in &frequencies {
        let omega = 2.0 * PI * frequency;
        let mna = assemble_ac(circuit, omega);
        let solution = solve_dense(mna.matrix(), mna.rhs())?;
        result.points.push(AcPoint {
            frequency,
            solution,
        });
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use voltaic_core::element::{Capacitor, Inductor, Resistor, VoltageSource};
    use voltaic_core::{Element, NodeName};

    use crate::dc::solve_dc;

    #[test]
    fn test_sweep_type_parsing() {
        assert_eq!("lin".parse::<AcSweepType>().unwrap(), AcSweepType::Linear);
        assert_eq!("DEC".parse::<AcSweepType>().unwrap(), AcSweepType::Decade);
        assert_eq!("Oct".parse::<AcSweepType>().unwrap(), AcSweepType::Octave);
        assert!(matches!(
            "LOG".parse::<AcSweepType>(),
            Err(CoreError::Unsupported(_))
        ));
    }

    #[test]
    fn test_linear_frequencies() {
        let params = AcParams {
            fstart: 1.0,
            fstop: 100.0,
            points: 100,
            sweep_type: AcSweepType::Linear,
        };
        let freqs = generate_frequencies(&params);
        assert_eq!(freqs.len(), 100);
        assert!((freqs[0] - 1.0).abs() < 1e-10);
        assert!((freqs[99] - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_log_frequencies() {
        let params = AcParams {
            fstart: 1.0,
            fstop: 1000.0,
            points: 4,
            sweep_type: AcSweepType::Decade,
        };
        let freqs = generate_frequencies(&params);
        assert_eq!(freqs.len(), 4);
        for (got, want) in freqs.iter().zip([1.0, 10.0, 100.0, 1000.0]) {
            assert!((got - want).abs() < want * 1e-9, "{got} != {want}");
        }

        // Octave spacing uses the same ratios for the same point count
        let oct = AcParams {
            sweep_type: AcSweepType::Octave,
            ..params
        };
        assert_eq!(generate_frequencies(&oct), freqs);
    }

    #[test]
    fn test_single_point_sweep() {
        let params = AcParams {
            fstart: 1000.0,
            fstop: 1000.0,
            points: 1,
            sweep_type: AcSweepType::Linear,
        };
        assert_eq!(generate_frequencies(&params), vec![1000.0]);
    }

    fn rc_lowpass() -> Circuit {
        // V1 (AC 1 V) -- R1 1k -- OUT -- C1 -- GND, corner at 1 kHz
        let mut circuit = Circuit::new();
        circuit
            .add(Element::VoltageSource(VoltageSource::ac("V1", "IN", "GND", 1.0, 0.0, 0.0)))
            .unwrap();
        circuit
            .add(Element::Resistor(Resistor::new("R1", "IN", "OUT", 1000.0)))
            .unwrap();
        circuit
            .add(Element::Capacitor(Capacitor::new("C1", "OUT", "GND", 159.1549e-9)))
            .unwrap();
        circuit
    }

    #[test]
    fn test_rc_lowpass_corner() {
        let circuit = rc_lowpass();
        let params = AcParams {
            fstart: 1000.0,
            fstop: 1000.0,
            points: 1,
            sweep_type: AcSweepType::Linear,
        };
        let result = solve_ac(&circuit, &params).unwrap();
        let out_row = circuit.index().node_row(&NodeName::new("OUT")).unwrap();

        let (freq, mag) = result.magnitude(out_row)[0];
        assert_eq!(freq, 1000.0);
        assert!(
            (mag - 0.7071).abs() < 1e-3,
            "|V(OUT)| = {mag} (expected ~0.7071)"
        );
        let (_, phase) = result.phase_deg(out_row)[0];
        assert!(
            (phase + 45.0).abs() < 0.1,
            "phase = {phase} deg (expected ~-45)"
        );
    }

    #[test]
    fn test_rl_divider_with_branch_current() {
        // V1 -- L1 -- OUT -- R1 -- GND: low-pass with corner R/(2 pi L)
        let mut circuit = Circuit::new();
        circuit
            .add(Element::VoltageSource(VoltageSource::ac("V1", "IN", "GND", 1.0, 0.0, 0.0)))
            .unwrap();
        circuit
            .add(Element::Inductor(Inductor::new("L1", "IN", "OUT", 0.1)))
            .unwrap();
        circuit
            .add(Element::Resistor(Resistor::new("R1", "OUT", "GND", 1000.0)))
            .unwrap();

        let f3db = 1000.0 / (2.0 * PI * 0.1);
        let params = AcParams {
            fstart: f3db,
            fstop: f3db,
            points: 1,
            sweep_type: AcSweepType::Linear,
        };
        let result = solve_ac(&circuit, &params).unwrap();
        let out_row = circuit.index().node_row(&NodeName::new("OUT")).unwrap();
        let mag = result.points[0].solution[out_row].norm();
        assert!((mag - 0.7071).abs() < 1e-3, "|V(OUT)| = {mag}");

        // Branch current of the inductor equals V(OUT) / R
        let l_row = circuit.index().branch_row("L1").unwrap();
        let i_l = result.points[0].solution[l_row].norm();
        assert!((i_l - mag / 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_ac_matches_dc_at_low_frequency() {
        // Resistive divider driven by a source with both representations:
        // the AC solve at f -> 0+ must reproduce the DC node voltages.
        let mut circuit = Circuit::new();
        circuit
            .add(Element::VoltageSource(VoltageSource::ac("V1", "IN", "GND", 10.0, 0.0, 0.0)))
            .unwrap();
        circuit
            .add(Element::Resistor(Resistor::new("R1", "IN", "OUT", 1000.0)))
            .unwrap();
        circuit
            .add(Element::Resistor(Resistor::new("R2", "OUT", "GND", 1000.0)))
            .unwrap();

        circuit.set_source_dc("V1", 10.0).unwrap();
        let dc = solve_dc(&circuit).unwrap();

        let params = AcParams {
            fstart: 1e-6,
            fstop: 1e-6,
            points: 1,
            sweep_type: AcSweepType::Linear,
        };
        let ac = solve_ac(&circuit, &params).unwrap();

        for row in 0..circuit.index().size() {
            let re = ac.points[0].solution[row].re;
            assert!(
                (re - dc.values[row]).abs() < 1e-9,
                "row {row}: AC {re} vs DC {}",
                dc.values[row]
            );
        }
    }

    #[test]
    fn test_ac_rejects_bad_ranges() {
        let circuit = rc_lowpass();
        let bad_start = AcParams {
            fstart: 0.0,
            fstop: 100.0,
            points: 5,
            sweep_type: AcSweepType::Linear,
        };
        assert!(solve_ac(&circuit, &bad_start).is_err());

        let inverted = AcParams {
            fstart: 100.0,
            fstop: 10.0,
            points: 5,
            sweep_type: AcSweepType::Linear,
        };
        assert!(solve_ac(&circuit, &inverted).is_err());
    }
}
