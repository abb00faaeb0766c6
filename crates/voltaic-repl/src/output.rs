//! Tabular result formatting.

use voltaic::{AcResult, Circuit, DcSolution, DcSweepResult, MnaSystem, TransientResult};

/// Column width shared by all tables.
const COL: usize = 15;

/// Elements that own a branch current, in element order (the order their
/// current columns appear in sweep tables).
fn branch_elements(circuit: &Circuit) -> Vec<&str> {
    circuit
        .elements()
        .iter()
        .filter(|el| el.needs_branch_current())
        .map(|el| el.name())
        .collect()
}

/// Print the DC operating point: node voltages then branch currents.
pub fn print_dc(circuit: &Circuit, solution: &DcSolution) {
    println!("--- DC Analysis Results ---");
    println!("Node GND: {:.6} V", 0.0);
    for (node, row) in circuit.index().node_rows() {
        println!("Node {}: {:.6} V", node, solution.values[row]);
    }
    for (name, row) in circuit.index().branch_rows() {
        println!("Current through {}: {:.6} A", name, solution.values[row]);
    }
}

/// Print a DC sweep as one row per source value.
pub fn print_dc_sweep(circuit: &Circuit, result: &DcSweepResult) {
    let index = circuit.index();

    print!("{:>COL$}", result.source);
    for (node, _) in index.node_rows() {
        print!("{:>COL$}", format!("V({node})"));
    }
    for name in branch_elements(circuit) {
        print!("{:>COL$}", format!("I({name})"));
    }
    println!();

    for (value, solution) in result.sweep_values.iter().zip(&result.solutions) {
        print!("{value:>COL$.6}");
        for (_, row) in index.node_rows() {
            print!("{:>COL$.6}", solution.values[row]);
        }
        for name in branch_elements(circuit) {
            let row = index.branch_row(name).expect("branch element has a row");
            print!("{:>COL$.6}", solution.values[row]);
        }
        println!();
    }
}

/// Print an AC sweep: magnitude and phase per node and branch element.
pub fn print_ac(circuit: &Circuit, result: &AcResult) {
    let index = circuit.index();

    print!("{:>COL$}", "Frequency (Hz)");
    for (node, _) in index.node_rows() {
        print!("{:>COL$}{:>COL$}", format!("|V({node})|"), format!("ph V({node})"));
    }
    for name in branch_elements(circuit) {
        print!("{:>COL$}{:>COL$}", format!("|I({name})|"), format!("ph I({name})"));
    }
    println!();

    for point in &result.points {
        print!("{:>COL$.6e}", point.frequency);
        for (_, row) in index.node_rows() {
            let v = point.solution[row];
            print!("{:>COL$.6e}{:>COL$.4}", v.norm(), v.arg().to_degrees());
        }
        for name in branch_elements(circuit) {
            let row = index.branch_row(name).expect("branch element has a row");
            let i = point.solution[row];
            print!("{:>COL$.6e}{:>COL$.4}", i.norm(), i.arg().to_degrees());
        }
        println!();
    }
}

/// Print a transient run as one row per recorded time point.
pub fn print_transient(circuit: &Circuit, result: &TransientResult) {
    let index = circuit.index();

    print!("{:>COL$}", "Time (s)");
    for (node, _) in index.node_rows() {
        print!("{:>COL$}", format!("V({node})"));
    }
    for name in branch_elements(circuit) {
        print!("{:>COL$}", format!("I({name})"));
    }
    println!();

    for (time, solution) in result.times.iter().zip(&result.solutions) {
        print!("{time:>COL$.6e}");
        for (_, row) in index.node_rows() {
            print!("{:>COL$.6e}", solution[row]);
        }
        for name in branch_elements(circuit) {
            let row = index.branch_row(name).expect("branch element has a row");
            print!("{:>COL$.6e}", solution[row]);
        }
        println!();
    }
}

/// Print the DC MNA matrix and RHS vector.
pub fn print_mna(circuit: &Circuit, mna: &MnaSystem<f64>) {
    let index = circuit.index();
    let size = mna.size();
    println!(
        "DC MNA matrix ({}x{}): {} node rows + {} branch rows",
        size,
        size,
        index.num_nodes(),
        index.num_branches()
    );
    for row in 0..size {
        for col in 0..size {
            print!("{:>12.4} ", mna.matrix()[(row, col)]);
        }
        println!();
    }
    print!("Vector b: ");
    for row in 0..size {
        print!("{:.4} ", mna.rhs()[row]);
    }
    println!();
}
