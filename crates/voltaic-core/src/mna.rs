//! Modified Nodal Analysis (MNA) matrix structures.

use nalgebra::{DMatrix, DVector};

use crate::scalar::Scalar;

/// MNA system `Ax = b`, generic over the scalar type.
///
/// Rows `0..num_nodes` are KCL equations for the non-ground nodes; rows
/// `num_nodes..num_nodes + num_branches` are the constraint equations of
/// branch-current variables (voltage sources and inductors). Branch rows are
/// addressed by their absolute index in that range.
///
/// Node arguments are `Option<usize>`: `None` is the ground node, and stamps
/// against it are silently skipped.
#[derive(Debug, Clone)]
pub struct MnaSystem<T: Scalar> {
    matrix: DMatrix<T>,
    rhs: DVector<T>,
    num_nodes: usize,
    num_branches: usize,
}

impl<T: Scalar> MnaSystem<T> {
    /// Create a zeroed system for `num_nodes` non-ground nodes and
    /// `num_branches` branch-current variables.
    pub fn new(num_nodes: usize, num_branches: usize) -> Self {
        let size = num_nodes + num_branches;
        Self {
            matrix: DMatrix::from_element(size, size, T::zero()),
            rhs: DVector::from_element(size, T::zero()),
            num_nodes,
            num_branches,
        }
    }

    /// Total system size (nodes + branch currents).
    pub fn size(&self) -> usize {
        self.num_nodes + self.num_branches
    }

    /// Number of non-ground nodes.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Number of branch-current variables.
    pub fn num_branches(&self) -> usize {
        self.num_branches
    }

    /// Reset the matrix and RHS to zeros.
    pub fn clear(&mut self) {
        self.matrix.fill(T::zero());
        self.rhs.fill(T::zero());
    }

    /// Reshape to new dimensions, discarding all stamps.
    pub fn resize(&mut self, num_nodes: usize, num_branches: usize) {
        *self = Self::new(num_nodes, num_branches);
    }

    /// Add a value into the coefficient matrix at (row, col).
    pub fn add(&mut self, row: usize, col: usize, value: T) {
        self.matrix[(row, col)] += value;
    }

    /// Overwrite the coefficient matrix at (row, col).
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.matrix[(row, col)] = value;
    }

    /// Add a value into the RHS vector.
    pub fn add_rhs(&mut self, row: usize, value: T) {
        self.rhs[row] += value;
    }

    /// The coefficient matrix.
    pub fn matrix(&self) -> &DMatrix<T> {
        &self.matrix
    }

    /// The right-hand side vector.
    pub fn rhs(&self) -> &DVector<T> {
        &self.rhs
    }

    /// Stamp a two-terminal admittance between two nodes.
    ///
    /// For an admittance Y between nodes i and j:
    /// - `A[i,i] += Y`, `A[j,j] += Y`
    /// - `A[i,j] -= Y`, `A[j,i] -= Y`
    pub fn stamp_admittance(&mut self, node_i: Option<usize>, node_j: Option<usize>, y: T) {
        if let Some(i) = node_i {
            self.matrix[(i, i)] += y;
        }
        if let Some(j) = node_j {
            self.matrix[(j, j)] += y;
        }
        if let (Some(i), Some(j)) = (node_i, node_j) {
            self.matrix[(i, j)] -= y;
            self.matrix[(j, i)] -= y;
        }
    }

    /// Stamp a current source driving `current` from `node_i` to `node_j`.
    ///
    /// The current leaves `node_i` and enters `node_j`, so the RHS of the
    /// KCL rows picks up `-current` at i and `+current` at j.
    pub fn stamp_current_source(
        &mut self,
        node_i: Option<usize>,
        node_j: Option<usize>,
        current: T,
    ) {
        if let Some(i) = node_i {
            self.rhs[i] -= current;
        }
        if let Some(j) = node_j {
            self.rhs[j] += current;
        }
    }

    /// Stamp a voltage constraint `V(pos) - V(neg) = value` on a branch row.
    ///
    /// Adds the ±1 couplings between the node KCL rows and the branch
    /// column, the ±1 couplings in the branch row, and `value` into the
    /// branch row of the RHS. `branch_row` is the absolute MNA row of the
    /// branch-current variable.
    pub fn stamp_voltage_source(
        &mut self,
        node_pos: Option<usize>,
        node_neg: Option<usize>,
        branch_row: usize,
        value: T,
    ) {
        debug_assert!(branch_row >= self.num_nodes && branch_row < self.size());
        let one = T::one();

        if let Some(p) = node_pos {
            self.matrix[(p, branch_row)] += one;
            self.matrix[(branch_row, p)] += one;
        }
        if let Some(n) = node_neg {
            self.matrix[(n, branch_row)] -= one;
            self.matrix[(branch_row, n)] -= one;
        }
        self.rhs[branch_row] += value;
    }
}
