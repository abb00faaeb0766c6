//! Interactive session: circuit ownership, command dispatch, result store.

use std::path::Path;

use indexmap::IndexMap;
use voltaic::{
    assemble_dc, solve_ac, solve_dc, solve_dc_sweep, solve_transient, AcParams, Circuit, Complex,
    DVector, DcSolution, DcSweepParams, Element, NodeName, TransientParams,
};
use voltaic::{Capacitor, CurrentSource, Inductor, Resistor, VoltageSource};

use crate::command::{Command, PrintItem};
use crate::error::{Error, Result};
use crate::output;
use crate::persist;

/// Whether the main loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Result of the most recent analysis, for `.print` projection.
///
/// At most one holding is live at a time; any solver failure clears it.
#[derive(Debug, Default)]
pub enum AnalysisRecord {
    #[default]
    None,
    /// Operating point (or final DC sweep sample): full real MNA vector.
    Dc(DcSolution),
    /// Phasors of the final AC sweep point, keyed `V(node)` / `I(element)`.
    Ac {
        phasors: IndexMap<String, Complex<f64>>,
        frequency: f64,
    },
    /// Last integrated transient step.
    Transient {
        time: f64,
        solution: DVector<f64>,
    },
}

/// An interactive simulator session.
pub struct Session {
    circuit: Circuit,
    record: AnalysisRecord,
    history: Vec<String>,
    echo: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            circuit: Circuit::new(),
            record: AnalysisRecord::None,
            history: Vec::new(),
            echo: true,
        }
    }

    /// The owned circuit (used by tests).
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// The replayable history of successful mutating commands.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    fn say(&self, message: impl AsRef<str>) {
        if self.echo {
            println!("{}", message.as_ref());
        }
    }

    /// Parse and execute one command line.
    ///
    /// Mutating commands are appended to the history only when they succeed,
    /// so replaying the history always reproduces the same circuit.
    pub fn execute_line(&mut self, line: &str) -> Result<Flow> {
        let command = Command::parse(line)?;
        let mutation = command.is_mutation();
        let flow = self.execute(command)?;
        if mutation {
            self.history.push(line.trim().to_string());
        }
        Ok(flow)
    }

    fn execute(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Add {
                kind,
                name,
                node_pos,
                node_neg,
                value,
            } => {
                let element = match kind.to_uppercase().as_str() {
                    "R" | "RESISTOR" => {
                        Element::Resistor(Resistor::new(&name, &*node_pos, &*node_neg, value))
                    }
                    "C" | "CAPACITOR" => {
                        Element::Capacitor(Capacitor::new(&name, &*node_pos, &*node_neg, value))
                    }
                    "L" | "INDUCTOR" => {
                        Element::Inductor(Inductor::new(&name, &*node_pos, &*node_neg, value))
                    }
                    other => {
                        return Err(voltaic::CoreError::Unsupported(format!(
                            "element type '{other}': use 'addsource' for V/I sources"
                        ))
                        .into());
                    }
                };
                self.circuit.add(element)?;
                self.added();
                Ok(Flow::Continue)
            }
            Command::AddSource {
                kind,
                name,
                node_pos,
                node_neg,
                ac,
                dc,
            } => {
                let element = match (kind.to_uppercase().as_str(), ac) {
                    ("V" | "VOLTAGESOURCE", None) => {
                        Element::VoltageSource(VoltageSource::dc(&name, &*node_pos, &*node_neg, dc))
                    }
                    ("V" | "VOLTAGESOURCE", Some((mag, phase, freq))) => Element::VoltageSource(
                        VoltageSource::ac(&name, &*node_pos, &*node_neg, mag, phase, freq),
                    ),
                    ("I" | "CURRENTSOURCE", None) => {
                        Element::CurrentSource(CurrentSource::dc(&name, &*node_pos, &*node_neg, dc))
                    }
                    ("I" | "CURRENTSOURCE", Some((mag, phase, freq))) => Element::CurrentSource(
                        CurrentSource::ac(&name, &*node_pos, &*node_neg, mag, phase, freq),
                    ),
                    (other, _) => {
                        return Err(voltaic::CoreError::Unsupported(format!(
                            "source type '{other}': use 'add' for R, C, L"
                        ))
                        .into());
                    }
                };
                self.circuit.add(element)?;
                self.added();
                Ok(Flow::Continue)
            }
            Command::Delete { name } => {
                self.circuit.delete(&name)?;
                self.say(format!("SUCCESS: Deleted element {}", name.to_uppercase()));
                Ok(Flow::Continue)
            }
            Command::RenameNode { old, new } => {
                self.circuit.rename_node(&old, &new)?;
                self.say(format!(
                    "SUCCESS: Node renamed from {} to {}",
                    old.to_uppercase(),
                    new.to_uppercase()
                ));
                Ok(Flow::Continue)
            }
            Command::Nodes => {
                let nodes: Vec<&str> = self.circuit.node_names().collect();
                self.say(format!("Available nodes: {}", nodes.join(", ")));
                Ok(Flow::Continue)
            }
            Command::List { kind } => {
                self.list(kind.as_deref());
                Ok(Flow::Continue)
            }
            Command::Mna => {
                if self.guard_empty() {
                    return Ok(Flow::Continue);
                }
                let mna = assemble_dc(&self.circuit);
                output::print_mna(&self.circuit, &mna);
                Ok(Flow::Continue)
            }
            Command::DcOperatingPoint => {
                if self.guard_empty() {
                    return Ok(Flow::Continue);
                }
                let solution = self.checked(solve_dc(&self.circuit))?;
                if self.echo {
                    output::print_dc(&self.circuit, &solution);
                }
                self.record = AnalysisRecord::Dc(solution);
                Ok(Flow::Continue)
            }
            Command::DcSweep {
                source,
                start,
                stop,
                points,
            } => {
                if self.guard_empty() {
                    return Ok(Flow::Continue);
                }
                let params = DcSweepParams {
                    source,
                    start,
                    stop,
                    points,
                };
                let result = {
                    let outcome = solve_dc_sweep(&mut self.circuit, &params);
                    self.checked(outcome)?
                };
                if self.echo {
                    output::print_dc_sweep(&self.circuit, &result);
                }
                // The final sample becomes the current DC solution.
                if let Some(last) = result.last() {
                    self.record = AnalysisRecord::Dc(last.clone());
                }
                Ok(Flow::Continue)
            }
            Command::Ac {
                sweep_type,
                fstart,
                fstop,
                points,
            } => {
                if self.guard_empty() {
                    return Ok(Flow::Continue);
                }
                let params = AcParams {
                    fstart,
                    fstop,
                    points,
                    sweep_type,
                };
                let result = self.checked(solve_ac(&self.circuit, &params))?;
                if self.echo {
                    output::print_ac(&self.circuit, &result);
                }
                if let Some(last) = result.last() {
                    self.record = AnalysisRecord::Ac {
                        phasors: self.collect_phasors(&last.solution),
                        frequency: last.frequency,
                    };
                }
                Ok(Flow::Continue)
            }
            Command::Tran {
                tstep,
                tstop,
                tstart,
                tmaxstep,
            } => {
                if self.guard_empty() {
                    return Ok(Flow::Continue);
                }
                let params = TransientParams {
                    tstep,
                    tstop,
                    tstart,
                    tmaxstep,
                };
                let result = {
                    let outcome = solve_transient(&mut self.circuit, &params);
                    self.checked(outcome)?
                };
                if self.echo {
                    output::print_transient(&self.circuit, &result);
                }
                if let Some((time, solution)) = result.last() {
                    self.record = AnalysisRecord::Transient {
                        time,
                        solution: solution.clone(),
                    };
                }
                Ok(Flow::Continue)
            }
            Command::Print { items } => {
                self.print_items(&items);
                Ok(Flow::Continue)
            }
            Command::Save { path } => {
                persist::save(Path::new(&path), &self.history)?;
                self.say(format!("SUCCESS: Saved {} commands to {path}", self.history.len()));
                Ok(Flow::Continue)
            }
            Command::Open { path } => {
                let lines = persist::load(Path::new(&path))?;
                self.replay(&lines)?;
                self.say(format!("SUCCESS: Loaded circuit from {path}"));
                Ok(Flow::Continue)
            }
            Command::Help => {
                self.say(USAGE);
                Ok(Flow::Continue)
            }
            Command::Exit => Ok(Flow::Exit),
        }
    }

    /// Reset the session and replay saved command lines with echo off.
    pub fn replay(&mut self, lines: &[String]) -> Result<()> {
        self.circuit = Circuit::new();
        self.history.clear();
        self.record = AnalysisRecord::None;

        let echo = self.echo;
        self.echo = false;
        let outcome = lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .try_for_each(|line| self.execute_line(line).map(|_| ()));
        self.echo = echo;
        outcome
    }

    fn added(&self) {
        if let Some(element) = self.circuit.elements().last() {
            self.say(format!("SUCCESS: Added {element}"));
        }
    }

    /// Clear the result store when an analysis fails, so `.print` against a
    /// failed run reports no results.
    fn checked<T>(&mut self, outcome: voltaic::solver::Result<T>) -> Result<T> {
        match outcome {
            Ok(value) => Ok(value),
            Err(e) => {
                self.record = AnalysisRecord::None;
                Err(e.into())
            }
        }
    }

    fn guard_empty(&self) -> bool {
        if self.circuit.is_empty() {
            self.say("Circuit is empty. Nothing to analyze.");
            true
        } else {
            false
        }
    }

    fn list(&self, kind: Option<&str>) {
        if self.circuit.is_empty() {
            self.say("No elements added yet.");
            return;
        }
        match kind {
            None => {
                self.say("All Circuit Elements:");
                for element in self.circuit.elements() {
                    self.say(format!("- {element}"));
                }
            }
            Some(kind) => {
                let upper = kind.to_uppercase();
                let matching: Vec<_> = self
                    .circuit
                    .elements()
                    .iter()
                    .filter(|el| el.kind().to_uppercase().contains(&upper))
                    .collect();
                if matching.is_empty() {
                    self.say(format!("No {upper} elements found."));
                } else {
                    self.say(format!("{upper} Elements:"));
                    for element in matching {
                        self.say(format!("- {element}"));
                    }
                }
            }
        }
    }

    /// Phasor map for the AC record: every node voltage, then the branch
    /// current of every extra-variable element, in assembly order.
    fn collect_phasors(&self, solution: &DVector<Complex<f64>>) -> IndexMap<String, Complex<f64>> {
        let index = self.circuit.index();
        let mut phasors = IndexMap::new();
        for (node, row) in index.node_rows() {
            phasors.insert(format!("V({node})"), solution[row]);
        }
        for element in self.circuit.elements() {
            if let Some(row) = index.branch_row(element.name()) {
                phasors.insert(format!("I({})", element.name()), solution[row]);
            }
        }
        phasors
    }

    fn print_items(&self, items: &[PrintItem]) {
        if matches!(self.record, AnalysisRecord::None) {
            self.say("No analysis results available. Run .dc, .ac, or .tran first.");
            return;
        }
        for item in items {
            match item {
                PrintItem::Voltage(node) => self.print_voltage(node),
                PrintItem::Current(element) => self.print_current(element),
            }
        }
    }

    fn print_voltage(&self, node: &str) {
        let name = NodeName::new(node);
        match &self.record {
            AnalysisRecord::Dc(solution) => {
                if name.is_ground() || self.circuit.index().node_row(&name).is_some() {
                    let v = solution.voltage(self.circuit.index().node_row(&name));
                    self.say(format!("V({name}) = {v:.6} V"));
                } else {
                    self.say(format!("V({name}): node not found"));
                }
            }
            AnalysisRecord::Ac { phasors, frequency } => {
                match phasors.get(&format!("V({name})")) {
                    Some(phasor) => self.say(format!(
                        "V({name}) @ {frequency:.4e} Hz: mag {:.6e}, phase {:.4} deg",
                        phasor.norm(),
                        phasor.arg().to_degrees()
                    )),
                    None if name.is_ground() => self.say(format!("V({name}) = 0 V")),
                    None => self.say(format!("V({name}): no AC result")),
                }
            }
            AnalysisRecord::Transient { time, solution } => {
                if name.is_ground() {
                    self.say(format!("V({name}) @ {time:.6e} s = 0.000000 V"));
                } else if let Some(row) = self.circuit.index().node_row(&name) {
                    self.say(format!("V({name}) @ {time:.6e} s = {:.6} V", solution[row]));
                } else {
                    self.say(format!("V({name}): node not found"));
                }
            }
            AnalysisRecord::None => {}
        }
    }

    fn print_current(&self, element: &str) {
        let upper = element.to_uppercase();
        match &self.record {
            AnalysisRecord::Dc(solution) => match self.derived_current(&upper, &solution.values) {
                Some(i) => self.say(format!("I({upper}) = {i:.6} A")),
                None => self.say(format!("I({upper}): element not found")),
            },
            AnalysisRecord::Ac { phasors, frequency } => {
                match phasors.get(&format!("I({upper})")) {
                    Some(phasor) => self.say(format!(
                        "I({upper}) @ {frequency:.4e} Hz: mag {:.6e}, phase {:.4} deg",
                        phasor.norm(),
                        phasor.arg().to_degrees()
                    )),
                    None => self.say(format!("I({upper}): no AC result")),
                }
            }
            AnalysisRecord::Transient { time, solution } => {
                match self.derived_current(&upper, solution) {
                    Some(i) => self.say(format!("I({upper}) @ {time:.6e} s = {i:.6} A")),
                    None => self.say(format!("I({upper}): element not found")),
                }
            }
            AnalysisRecord::None => {}
        }
    }

    /// Current through an element given a real solution vector: the branch
    /// row for voltage sources and inductors, derived values otherwise.
    fn derived_current(&self, name: &str, solution: &DVector<f64>) -> Option<f64> {
        let index = self.circuit.index();
        if let Some(row) = index.branch_row(name) {
            return Some(solution[row]);
        }
        let voltage = |node: &NodeName| {
            index
                .node_row(node)
                .map(|row| solution[row])
                .unwrap_or(0.0)
        };
        match self.circuit.find(name)? {
            Element::Resistor(r) => {
                Some((voltage(&r.node_pos) - voltage(&r.node_neg)) * r.conductance())
            }
            Element::Capacitor(c) => match &self.record {
                // The companion state carries the current at the last step.
                AnalysisRecord::Transient { .. } => Some(c.i_prev),
                _ => Some(0.0),
            },
            Element::CurrentSource(i) => match &self.record {
                AnalysisRecord::Transient { time, .. } => Some(i.value_at(*time)),
                _ => Some(i.dc),
            },
            // Branch elements were handled above.
            _ => None,
        }
    }
}

const USAGE: &str = "\
--- Usage ---
add <type> <name> <node1> <node2> <value>
  Types: R (Resistor), C (Capacitor), L (Inductor)
  e.g., add R R1 N1 N2 1k
addsource <type> <name> <node1> <node2> <DC_value>
  e.g., addsource V V1 IN GND 5
addsource <type> <name> <node1> <node2> AC <magnitude> <phase_deg> <freq>
  e.g., addsource V V1 N1 GND AC 1 0 60
delete <name>
.rename node <old_name> <new_name>
.nodes
.list [component_type]
.mna                                   print the DC MNA matrix and RHS
.dc                                    DC operating point
.dc <source> <start> <end> <points>    DC sweep
.ac <LIN|DEC|OCT> <fstart> <fstop> <points>
.tran <tstep> <tstop> [<tstart>] [<tmaxstep>]
.print <V(node)|I(element)> ...        project the last analysis result
save <path> / open <path>
exit";
