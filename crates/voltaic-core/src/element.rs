//! Circuit element models and their MNA stamps.
//!
//! Elements are a closed sum over five kinds: resistor, capacitor, inductor,
//! voltage source, current source. Each analysis pass is a match that picks
//! the stamping rule for that kind, so the matrix-update contract stays in
//! one place per element instead of being spread across trait impls.
//!
//! Stamp entry points take the circuit's [`MnaIndex`] to resolve node and
//! branch rows; ground terminals resolve to `None` and are skipped by the
//! [`MnaSystem`] stamp helpers. Only the transient path touches element
//! state: `initialize_state` at the start of a run, `update_state` once per
//! accepted step.

use std::f64::consts::PI;
use std::fmt;

use nalgebra::DVector;
use num_complex::Complex;

use crate::circuit::MnaIndex;
use crate::error::{Error, Result};
use crate::mna::MnaSystem;
use crate::node::NodeName;
use crate::units::format_value;

/// Voltage difference V(pos) - V(neg) read from a solution vector.
fn voltage_between(solution: &DVector<f64>, pos: Option<usize>, neg: Option<usize>) -> f64 {
    let vp = pos.map(|i| solution[i]).unwrap_or(0.0);
    let vn = neg.map(|i| solution[i]).unwrap_or(0.0);
    vp - vn
}

/// Phasor `mag * e^(j*phase)` with the phase given in degrees.
fn phasor(magnitude: f64, phase_deg: f64) -> Complex<f64> {
    Complex::from_polar(magnitude, phase_deg.to_radians())
}

/// Instantaneous source value at time `t`.
///
/// An AC specification (`mag > 0` and `freq > 0`) yields
/// `mag * sin(2*pi*freq*t + phase)`; anything else is the DC value.
fn instantaneous(dc: f64, magnitude: f64, phase_deg: f64, frequency: f64, time: f64) -> f64 {
    if magnitude > 0.0 && frequency > 0.0 {
        magnitude * (2.0 * PI * frequency * time + phase_deg.to_radians()).sin()
    } else {
        dc
    }
}

/// A resistor.
#[derive(Debug, Clone)]
pub struct Resistor {
    pub name: String,
    pub node_pos: NodeName,
    pub node_neg: NodeName,
    /// Resistance in ohms.
    pub resistance: f64,
}

impl Resistor {
    pub fn new(
        name: impl AsRef<str>,
        node_pos: impl Into<NodeName>,
        node_neg: impl Into<NodeName>,
        resistance: f64,
    ) -> Self {
        Self {
            name: name.as_ref().to_uppercase(),
            node_pos: node_pos.into(),
            node_neg: node_neg.into(),
            resistance,
        }
    }

    /// Conductance G = 1/R.
    pub fn conductance(&self) -> f64 {
        1.0 / self.resistance
    }
}

/// A capacitor. `v_prev`/`i_prev` hold the trapezoidal companion history and
/// are only meaningful during a transient run.
#[derive(Debug, Clone)]
pub struct Capacitor {
    pub name: String,
    pub node_pos: NodeName,
    pub node_neg: NodeName,
    /// Capacitance in farads.
    pub capacitance: f64,
    /// Voltage across the element at the previous accepted step.
    pub v_prev: f64,
    /// Current through the element at the previous accepted step.
    pub i_prev: f64,
}

impl Capacitor {
    pub fn new(
        name: impl AsRef<str>,
        node_pos: impl Into<NodeName>,
        node_neg: impl Into<NodeName>,
        capacitance: f64,
    ) -> Self {
        Self {
            name: name.as_ref().to_uppercase(),
            node_pos: node_pos.into(),
            node_neg: node_neg.into(),
            capacitance,
            v_prev: 0.0,
            i_prev: 0.0,
        }
    }
}

/// An inductor. Adds a branch-current variable in every analysis mode;
/// `i_prev`/`v_prev` hold the trapezoidal companion history.
#[derive(Debug, Clone)]
pub struct Inductor {
    pub name: String,
    pub node_pos: NodeName,
    pub node_neg: NodeName,
    /// Inductance in henries.
    pub inductance: f64,
    /// Branch current at the previous accepted step.
    pub i_prev: f64,
    /// Voltage across the element at the previous accepted step.
    pub v_prev: f64,
}

impl Inductor {
    pub fn new(
        name: impl AsRef<str>,
        node_pos: impl Into<NodeName>,
        node_neg: impl Into<NodeName>,
        inductance: f64,
    ) -> Self {
        Self {
            name: name.as_ref().to_uppercase(),
            node_pos: node_pos.into(),
            node_neg: node_neg.into(),
            inductance,
            i_prev: 0.0,
            v_prev: 0.0,
        }
    }
}

/// An independent voltage source. Always adds a branch-current variable.
#[derive(Debug, Clone)]
pub struct VoltageSource {
    pub name: String,
    pub node_pos: NodeName,
    pub node_neg: NodeName,
    /// DC value in volts.
    pub dc: f64,
    /// AC magnitude in volts (0 for a pure DC source).
    pub ac_magnitude: f64,
    /// AC phase in degrees.
    pub ac_phase_deg: f64,
    /// AC frequency in hertz. Used by the transient waveform only; the AC
    /// sweep drives every source at the sweep frequency.
    pub ac_frequency: f64,
}

impl VoltageSource {
    /// A DC source.
    pub fn dc(
        name: impl AsRef<str>,
        node_pos: impl Into<NodeName>,
        node_neg: impl Into<NodeName>,
        dc: f64,
    ) -> Self {
        Self {
            name: name.as_ref().to_uppercase(),
            node_pos: node_pos.into(),
            node_neg: node_neg.into(),
            dc,
            ac_magnitude: 0.0,
            ac_phase_deg: 0.0,
            ac_frequency: 0.0,
        }
    }

    /// An AC source with magnitude, phase (degrees) and frequency.
    pub fn ac(
        name: impl AsRef<str>,
        node_pos: impl Into<NodeName>,
        node_neg: impl Into<NodeName>,
        ac_magnitude: f64,
        ac_phase_deg: f64,
        ac_frequency: f64,
    ) -> Self {
        Self {
            name: name.as_ref().to_uppercase(),
            node_pos: node_pos.into(),
            node_neg: node_neg.into(),
            dc: 0.0,
            ac_magnitude,
            ac_phase_deg,
            ac_frequency,
        }
    }

    /// Whether the source carries an AC specification.
    pub fn is_ac(&self) -> bool {
        self.ac_magnitude > 0.0 && self.ac_frequency > 0.0
    }

    /// Small-signal phasor, evaluated the same at every sweep frequency.
    pub fn phasor(&self) -> Complex<f64> {
        phasor(self.ac_magnitude, self.ac_phase_deg)
    }

    /// Instantaneous value for transient stamping.
    pub fn value_at(&self, time: f64) -> f64 {
        instantaneous(
            self.dc,
            self.ac_magnitude,
            self.ac_phase_deg,
            self.ac_frequency,
            time,
        )
    }
}

/// An independent current source. Drives current from `node_pos` to
/// `node_neg`; contributes only to the RHS.
#[derive(Debug, Clone)]
pub struct CurrentSource {
    pub name: String,
    pub node_pos: NodeName,
    pub node_neg: NodeName,
    /// DC value in amperes.
    pub dc: f64,
    /// AC magnitude in amperes (0 for a pure DC source).
    pub ac_magnitude: f64,
    /// AC phase in degrees.
    pub ac_phase_deg: f64,
    /// AC frequency in hertz.
    pub ac_frequency: f64,
}

impl CurrentSource {
    /// A DC source.
    pub fn dc(
        name: impl AsRef<str>,
        node_pos: impl Into<NodeName>,
        node_neg: impl Into<NodeName>,
        dc: f64,
    ) -> Self {
        Self {
            name: name.as_ref().to_uppercase(),
            node_pos: node_pos.into(),
            node_neg: node_neg.into(),
            dc,
            ac_magnitude: 0.0,
            ac_phase_deg: 0.0,
            ac_frequency: 0.0,
        }
    }

    /// An AC source with magnitude, phase (degrees) and frequency.
    pub fn ac(
        name: impl AsRef<str>,
        node_pos: impl Into<NodeName>,
        node_neg: impl Into<NodeName>,
        ac_magnitude: f64,
        ac_phase_deg: f64,
        ac_frequency: f64,
    ) -> Self {
        Self {
            name: name.as_ref().to_uppercase(),
            node_pos: node_pos.into(),
            node_neg: node_neg.into(),
            dc: 0.0,
            ac_magnitude,
            ac_phase_deg,
            ac_frequency,
        }
    }

    pub fn is_ac(&self) -> bool {
        self.ac_magnitude > 0.0 && self.ac_frequency > 0.0
    }

    pub fn phasor(&self) -> Complex<f64> {
        phasor(self.ac_magnitude, self.ac_phase_deg)
    }

    pub fn value_at(&self, time: f64) -> f64 {
        instantaneous(
            self.dc,
            self.ac_magnitude,
            self.ac_phase_deg,
            self.ac_frequency,
            time,
        )
    }
}

/// Any circuit element.
#[derive(Debug, Clone)]
pub enum Element {
    Resistor(Resistor),
    Capacitor(Capacitor),
    Inductor(Inductor),
    VoltageSource(VoltageSource),
    CurrentSource(CurrentSource),
}

impl Element {
    /// Element name (uppercase).
    pub fn name(&self) -> &str {
        match self {
            Element::Resistor(r) => &r.name,
            Element::Capacitor(c) => &c.name,
            Element::Inductor(l) => &l.name,
            Element::VoltageSource(v) => &v.name,
            Element::CurrentSource(i) => &i.name,
        }
    }

    /// Kind name, as shown in listings and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Resistor(_) => "Resistor",
            Element::Capacitor(_) => "Capacitor",
            Element::Inductor(_) => "Inductor",
            Element::VoltageSource(_) => "VoltageSource",
            Element::CurrentSource(_) => "CurrentSource",
        }
    }

    /// First (positive) terminal.
    pub fn node_pos(&self) -> &NodeName {
        match self {
            Element::Resistor(r) => &r.node_pos,
            Element::Capacitor(c) => &c.node_pos,
            Element::Inductor(l) => &l.node_pos,
            Element::VoltageSource(v) => &v.node_pos,
            Element::CurrentSource(i) => &i.node_pos,
        }
    }

    /// Second (negative) terminal.
    pub fn node_neg(&self) -> &NodeName {
        match self {
            Element::Resistor(r) => &r.node_neg,
            Element::Capacitor(c) => &c.node_neg,
            Element::Inductor(l) => &l.node_neg,
            Element::VoltageSource(v) => &v.node_neg,
            Element::CurrentSource(i) => &i.node_neg,
        }
    }

    /// Whether this element introduces a branch-current variable.
    pub fn needs_branch_current(&self) -> bool {
        matches!(self, Element::VoltageSource(_) | Element::Inductor(_))
    }

    /// Replace every occurrence of a node name on this element's terminals.
    pub fn rename_node(&mut self, old: &NodeName, new: &NodeName) {
        let (pos, neg) = match self {
            Element::Resistor(r) => (&mut r.node_pos, &mut r.node_neg),
            Element::Capacitor(c) => (&mut c.node_pos, &mut c.node_neg),
            Element::Inductor(l) => (&mut l.node_pos, &mut l.node_neg),
            Element::VoltageSource(v) => (&mut v.node_pos, &mut v.node_neg),
            Element::CurrentSource(i) => (&mut i.node_pos, &mut i.node_neg),
        };
        if pos == old {
            *pos = new.clone();
        }
        if neg == old {
            *neg = new.clone();
        }
    }

    /// Check the element's own invariants: both terminals named and
    /// distinct, physical values strictly positive, AC magnitude and
    /// frequency non-negative.
    pub fn validate(&self) -> Result<()> {
        if self.node_pos().is_empty() || self.node_neg().is_empty() {
            return Err(Error::InvalidValue("node names must be non-empty".to_string()));
        }
        if self.node_pos() == self.node_neg() {
            return Err(Error::InvalidValue(format!(
                "element '{}' connects node '{}' to itself",
                self.name(),
                self.node_pos()
            )));
        }
        match self {
            Element::Resistor(r) if r.resistance <= 0.0 => Err(Error::InvalidValue(
                "resistance cannot be zero or negative".to_string(),
            )),
            Element::Capacitor(c) if c.capacitance <= 0.0 => Err(Error::InvalidValue(
                "capacitance cannot be zero or negative".to_string(),
            )),
            Element::Inductor(l) if l.inductance <= 0.0 => Err(Error::InvalidValue(
                "inductance cannot be zero or negative".to_string(),
            )),
            Element::VoltageSource(v) if v.ac_magnitude < 0.0 || v.ac_frequency < 0.0 => {
                Err(Error::InvalidValue(
                    "AC magnitude and frequency cannot be negative".to_string(),
                ))
            }
            Element::CurrentSource(i) if i.ac_magnitude < 0.0 || i.ac_frequency < 0.0 => {
                Err(Error::InvalidValue(
                    "AC magnitude and frequency cannot be negative".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Stamp this element's DC contribution.
    ///
    /// Capacitors are open circuits; inductors are zero-voltage sources.
    pub fn stamp_dc(&self, mna: &mut MnaSystem<f64>, index: &MnaIndex) {
        let pos = index.node_row(self.node_pos());
        let neg = index.node_row(self.node_neg());
        match self {
            Element::Resistor(r) => {
                mna.stamp_admittance(pos, neg, r.conductance());
            }
            Element::Capacitor(_) => {}
            Element::Inductor(_) => {
                let branch = self.branch_row(index);
                mna.stamp_voltage_source(pos, neg, branch, 0.0);
            }
            Element::VoltageSource(v) => {
                let branch = self.branch_row(index);
                mna.stamp_voltage_source(pos, neg, branch, v.dc);
            }
            Element::CurrentSource(i) => {
                mna.stamp_current_source(pos, neg, i.dc);
            }
        }
    }

    /// Stamp this element's small-signal contribution at `omega` = 2*pi*f.
    pub fn stamp_ac(&self, mna: &mut MnaSystem<Complex<f64>>, index: &MnaIndex, omega: f64) {
        let pos = index.node_row(self.node_pos());
        let neg = index.node_row(self.node_neg());
        match self {
            Element::Resistor(r) => {
                mna.stamp_admittance(pos, neg, Complex::new(r.conductance(), 0.0));
            }
            Element::Capacitor(c) => {
                // Y = jwC
                mna.stamp_admittance(pos, neg, Complex::new(0.0, omega * c.capacitance));
            }
            Element::Inductor(l) => {
                // Branch equation: V(pos) - V(neg) - jwL * I = 0
                let branch = self.branch_row(index);
                mna.stamp_voltage_source(pos, neg, branch, Complex::new(0.0, 0.0));
                mna.add(branch, branch, -Complex::new(0.0, omega * l.inductance));
            }
            Element::VoltageSource(v) => {
                let branch = self.branch_row(index);
                mna.stamp_voltage_source(pos, neg, branch, v.phasor());
            }
            Element::CurrentSource(i) => {
                mna.stamp_current_source(pos, neg, i.phasor());
            }
        }
    }

    /// Stamp this element's transient contribution at time `time` with a
    /// fixed step `dt`.
    ///
    /// Reactive elements use their trapezoidal companion models; sources use
    /// their instantaneous values with no history term.
    pub fn stamp_transient(
        &self,
        mna: &mut MnaSystem<f64>,
        index: &MnaIndex,
        dt: f64,
        time: f64,
    ) -> Result<()> {
        let pos = index.node_row(self.node_pos());
        let neg = index.node_row(self.node_neg());
        match self {
            Element::Resistor(r) => {
                mna.stamp_admittance(pos, neg, r.conductance());
            }
            Element::Capacitor(c) => {
                if dt <= 0.0 {
                    return Err(Error::BadTimeStep);
                }
                // Norton companion: G_eq in parallel with a history current
                // flowing neg -> pos.
                let g_eq = 2.0 * c.capacitance / dt;
                let i_eq = g_eq * c.v_prev + c.i_prev;
                mna.stamp_admittance(pos, neg, g_eq);
                mna.stamp_current_source(neg, pos, i_eq);
            }
            Element::Inductor(l) => {
                if dt <= 0.0 {
                    return Err(Error::BadTimeStep);
                }
                // Thevenin companion on the branch row:
                // V(pos) - V(neg) - R_eq * I = -V_eq
                let branch = self.branch_row(index);
                let r_eq = 2.0 * l.inductance / dt;
                let v_eq = l.v_prev + r_eq * l.i_prev;
                mna.stamp_voltage_source(pos, neg, branch, -v_eq);
                mna.add(branch, branch, -r_eq);
            }
            Element::VoltageSource(v) => {
                let branch = self.branch_row(index);
                mna.stamp_voltage_source(pos, neg, branch, v.value_at(time));
            }
            Element::CurrentSource(i) => {
                mna.stamp_current_source(pos, neg, i.value_at(time));
            }
        }
        Ok(())
    }

    /// Reset transient state ahead of a run.
    pub fn initialize_state(&mut self) {
        match self {
            Element::Capacitor(c) => {
                c.v_prev = 0.0;
                c.i_prev = 0.0;
            }
            Element::Inductor(l) => {
                l.i_prev = 0.0;
                l.v_prev = 0.0;
            }
            _ => {}
        }
    }

    /// Commit the solved step into the element's companion history.
    ///
    /// `solution` is the full MNA vector for the step; branch currents are
    /// read back by absolute row.
    pub fn update_state(&mut self, solution: &DVector<f64>, index: &MnaIndex, dt: f64) {
        match self {
            Element::Capacitor(c) => {
                let pos = index.node_row(&c.node_pos);
                let neg = index.node_row(&c.node_neg);
                let v_new = voltage_between(solution, pos, neg);
                // I(n) = (2C/dt) * (V(n) - V(n-1)) - I(n-1); capture the old
                // state before overwriting it.
                let i_new = (2.0 * c.capacitance / dt) * (v_new - c.v_prev) - c.i_prev;
                c.v_prev = v_new;
                c.i_prev = i_new;
            }
            Element::Inductor(l) => {
                let branch = index
                    .branch_row(&l.name)
                    .expect("branch row allocated for every inductor");
                let pos = index.node_row(&l.node_pos);
                let neg = index.node_row(&l.node_neg);
                l.i_prev = solution[branch];
                l.v_prev = voltage_between(solution, pos, neg);
            }
            _ => {}
        }
    }

    fn branch_row(&self, index: &MnaIndex) -> usize {
        index
            .branch_row(self.name())
            .expect("branch row allocated for every source and inductor")
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Resistor(r) => write!(
                f,
                "Resistor {} {} {} {}Ohm",
                r.name,
                r.node_pos,
                r.node_neg,
                format_value(r.resistance)
            ),
            Element::Capacitor(c) => write!(
                f,
                "Capacitor {} {} {} {}F",
                c.name,
                c.node_pos,
                c.node_neg,
                format_value(c.capacitance)
            ),
            Element::Inductor(l) => write!(
                f,
                "Inductor {} {} {} {}H",
                l.name,
                l.node_pos,
                l.node_neg,
                format_value(l.inductance)
            ),
            Element::VoltageSource(v) if v.is_ac() => write!(
                f,
                "VoltageSource {} {} {} AC Mag={}V Phase={}deg Freq={}Hz",
                v.name,
                v.node_pos,
                v.node_neg,
                format_value(v.ac_magnitude),
                v.ac_phase_deg,
                format_value(v.ac_frequency)
            ),
            Element::VoltageSource(v) => write!(
                f,
                "VoltageSource {} {} {} DC={}V",
                v.name,
                v.node_pos,
                v.node_neg,
                format_value(v.dc)
            ),
            Element::CurrentSource(i) if i.is_ac() => write!(
                f,
                "CurrentSource {} {} {} AC Mag={}A Phase={}deg Freq={}Hz",
                i.name,
                i.node_pos,
                i.node_neg,
                format_value(i.ac_magnitude),
                i.ac_phase_deg,
                format_value(i.ac_frequency)
            ),
            Element::CurrentSource(i) => write!(
                f,
                "CurrentSource {} {} {} DC={}A",
                i.name,
                i.node_pos,
                i.node_neg,
                format_value(i.dc)
            ),
        }
    }
}
