//! Interpolation in N-dimensional sample grids.
//!
//! A grid is described by [`InterpParams`]: the number of samples along each input dimension,
//! the number of output channels stored per node, and a flattened table of node values. The last
//! input dimension varies fastest in the table.
//!
//! The interpolation routine is picked once, when the parameters are created:
//!
//! | inputs | routine |
//! |:------ |:------- |
//! | 1      | linear |
//! | 2      | bilinear |
//! | 3      | tetrahedral, or trilinear if requested |
//! | 4..=15 | split along the first input, recurse into both neighboring planes, then blend |
//!
//! There are two representations: 16-bit tables (`u16`, input and output in `0..=0xffff`) and
//! floating-point tables (`f32`, input and output in `0..=1`).
//!
//! # Examples
//! ```
//! # use rcms_transform::interp::InterpParams;
//! // a 2x2 grid with one output: f(x, y) = x
//! let params = InterpParams::<f32>::new(&[2, 2], 1, vec![0., 0., 1., 1.], false).unwrap();
//!
//! let mut out = [0.];
//! params.eval(&[0.25, 0.9], &mut out);
//! assert!((out[0] - 0.25).abs() < 1e-6);
//! ```

use std::sync::Arc;
use std::fmt;

mod lerp16;
mod lerp_float;

pub(crate) use lerp16::tetrahedral_cell;

/// Maximum number of input dimensions of a grid.
pub const MAX_INPUT_DIMENSIONS: usize = 15;

/// Maximum number of channels a stage may produce. Also bounds the number of outputs of grids
/// with 4 or more inputs.
pub const MAX_STAGE_CHANNELS: usize = 128;

/// Interpolation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum InterpError {
    /// The grid has no input dimensions or no output channels.
    #[error("a grid needs at least one input and one output channel")]
    Empty,
    /// More than [`MAX_INPUT_DIMENSIONS`] inputs.
    #[error("too many input dimensions: {0} (at most {max} are supported)", max = MAX_INPUT_DIMENSIONS)]
    TooManyInputs(usize),
    /// There is no routine for this combination of inputs (0) and outputs (1).
    #[error("unsupported interpolation ({0} -> {1} channels)")]
    Unsupported(usize, usize),
    /// Input dimension (0) has an unusable number of samples (1).
    #[error("input dimension {0} has {1} grid points")]
    InvalidGrid(usize, usize),
    /// The table would not fit into memory.
    #[error("grid size overflow")]
    GridTooLarge,
    /// The table does not have the expected (1) number of entries (0).
    #[error("table has {0} entries, but the grid needs {1}")]
    TableSize(usize, usize),
}

/// An interpolation routine.
pub type InterpFn<T> = fn(&InterpParams<T>, &[T], &mut [T]);

/// Sample types that can be interpolated.
pub trait Interpolate: Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Largest representable channel value.
    const MAX: Self;

    /// Picks the interpolation routine for a grid shape. Returns None if unsupported.
    fn select(inputs: usize, outputs: usize, trilinear: bool) -> Option<InterpFn<Self>>;
}

impl Interpolate for u16 {
    const MAX: u16 = 0xffff;

    fn select(inputs: usize, outputs: usize, trilinear: bool) -> Option<InterpFn<u16>> {
        if outputs >= MAX_STAGE_CHANNELS {
            return None;
        }

        match inputs {
            1 if outputs == 1 => Some(lerp16::lerp_1d),
            1 => Some(lerp16::eval_1_input),
            2 => Some(lerp16::bilinear),
            3 if trilinear => Some(lerp16::trilinear),
            3 => Some(lerp16::tetrahedral),
            4..=MAX_INPUT_DIMENSIONS => Some(lerp16::eval_n_inputs),
            _ => None,
        }
    }
}

impl Interpolate for f32 {
    const MAX: f32 = 1.;

    fn select(inputs: usize, outputs: usize, trilinear: bool) -> Option<InterpFn<f32>> {
        if outputs >= MAX_STAGE_CHANNELS {
            return None;
        }

        match inputs {
            1 if outputs == 1 => Some(lerp_float::lerp_1d),
            1 => Some(lerp_float::eval_1_input),
            2 => Some(lerp_float::bilinear),
            3 if trilinear => Some(lerp_float::trilinear),
            3 => Some(lerp_float::tetrahedral),
            4..=MAX_INPUT_DIMENSIONS => Some(lerp_float::eval_n_inputs),
            _ => None,
        }
    }
}

/// Number of nodes in a grid, or None on overflow.
pub(crate) fn cube_size(n_samples: &[usize]) -> Option<usize> {
    let mut size: usize = 1;
    for &dim in n_samples {
        size = size.checked_mul(dim)?;
    }
    // leave headroom for the output channels
    if size > u32::MAX as usize / 15 {
        return None;
    }
    Some(size)
}

/// Interpolation parameters for one sample grid.
///
/// Cloning shares the table; it is copied on the first write through [`Self::table_mut`].
#[derive(Clone)]
pub struct InterpParams<T: Interpolate> {
    n_inputs: usize,
    n_outputs: usize,
    trilinear: bool,
    n_samples: [usize; MAX_INPUT_DIMENSIONS],
    /// Number of samples minus one; the largest cell index per dimension.
    domain: [usize; MAX_INPUT_DIMENSIONS],
    /// Table elements to skip for one step along a dimension, counted from the last input.
    stride: [usize; MAX_INPUT_DIMENSIONS],
    table: Arc<Vec<T>>,
    interp: InterpFn<T>,
}

impl<T: Interpolate> InterpParams<T> {
    /// Creates interpolation parameters for a grid with `n_samples[i]` nodes along input `i`.
    ///
    /// The table must have `n_outputs * n_samples.product()` entries.
    pub fn new(
        n_samples: &[usize],
        n_outputs: usize,
        table: Vec<T>,
        trilinear: bool,
    ) -> Result<Self, InterpError> {
        let n_inputs = n_samples.len();

        if n_inputs == 0 || n_outputs == 0 {
            return Err(InterpError::Empty);
        }
        if n_inputs > MAX_INPUT_DIMENSIONS {
            return Err(InterpError::TooManyInputs(n_inputs));
        }
        for (i, &samples) in n_samples.iter().enumerate() {
            // a single node is only meaningful for 1D lookups
            if samples == 0 || (samples == 1 && n_inputs > 1) {
                return Err(InterpError::InvalidGrid(i, samples));
            }
        }

        let needed = cube_size(n_samples)
            .and_then(|size| size.checked_mul(n_outputs))
            .ok_or(InterpError::GridTooLarge)?;
        if table.len() != needed {
            return Err(InterpError::TableSize(table.len(), needed));
        }

        let interp =
            T::select(n_inputs, n_outputs, trilinear).ok_or(InterpError::Unsupported(n_inputs, n_outputs))?;

        let mut samples = [0; MAX_INPUT_DIMENSIONS];
        let mut domain = [0; MAX_INPUT_DIMENSIONS];
        for i in 0..n_inputs {
            samples[i] = n_samples[i];
            domain[i] = n_samples[i] - 1;
        }

        let mut stride = [0; MAX_INPUT_DIMENSIONS];
        stride[0] = n_outputs;
        for i in 1..n_inputs {
            stride[i] = stride[i - 1] * n_samples[n_inputs - i];
        }

        Ok(InterpParams {
            n_inputs,
            n_outputs,
            trilinear,
            n_samples: samples,
            domain,
            stride,
            table: Arc::new(table),
            interp,
        })
    }

    /// Creates interpolation parameters for a grid with the same number of nodes along every
    /// input.
    pub fn new_uniform(
        grid_points: usize,
        n_inputs: usize,
        n_outputs: usize,
        table: Vec<T>,
        trilinear: bool,
    ) -> Result<Self, InterpError> {
        if n_inputs > MAX_INPUT_DIMENSIONS {
            return Err(InterpError::TooManyInputs(n_inputs));
        }
        let n_samples = [grid_points; MAX_INPUT_DIMENSIONS];
        Self::new(&n_samples[..n_inputs], n_outputs, table, trilinear)
    }

    /// Interpolates the table at the given input position.
    ///
    /// `input` must have at least `n_inputs` and `output` at least `n_outputs` elements.
    #[inline]
    pub fn eval(&self, input: &[T], output: &mut [T]) {
        (self.interp)(self, input, output)
    }

    /// Number of input dimensions.
    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    /// Number of output channels.
    pub fn n_outputs(&self) -> usize {
        self.n_outputs
    }

    /// Whether trilinear interpolation was requested for 3D grids.
    pub fn is_trilinear(&self) -> bool {
        self.trilinear
    }

    /// Grid points per input dimension.
    pub fn n_samples(&self) -> &[usize] {
        &self.n_samples[..self.n_inputs]
    }

    /// Largest cell index per input dimension.
    pub fn domain(&self) -> &[usize] {
        &self.domain[..self.n_inputs]
    }

    /// Table strides. `stride()[0]` is the number of outputs; `stride()[k]` is the step for
    /// input `n_inputs - 1 - k`.
    pub fn stride(&self) -> &[usize] {
        &self.stride[..self.n_inputs]
    }

    /// The flattened node table.
    pub fn table(&self) -> &[T] {
        &self.table
    }

    /// Mutable access to the node table. Copies the table first if it is shared.
    pub fn table_mut(&mut self) -> &mut [T] {
        Arc::make_mut(&mut self.table).as_mut_slice()
    }

    /// Returns true if both parameter sets point at the same table allocation.
    pub fn shares_table_with(&self, other: &InterpParams<T>) -> bool {
        Arc::ptr_eq(&self.table, &other.table)
    }

    /// Duplicates the parameters.
    ///
    /// With `share_table`, the copy refers to the same table; otherwise the table is copied
    /// right away.
    pub fn duplicate(&self, share_table: bool) -> Self {
        let mut dup = self.clone();
        if !share_table {
            dup.table = Arc::new(self.table.as_ref().clone());
        }
        dup
    }

    /// Table offset of the first output channel of a grid node.
    ///
    /// Returns None if the node is outside the grid.
    pub fn node_offset(&self, node: &[usize]) -> Option<usize> {
        if node.len() != self.n_inputs {
            return None;
        }
        let mut offset = 0;
        for (i, &x) in node.iter().enumerate() {
            if x > self.domain[i] {
                return None;
            }
            offset += x * self.stride[self.n_inputs - 1 - i];
        }
        Some(offset)
    }
}

impl<T: Interpolate> PartialEq for InterpParams<T> {
    fn eq(&self, other: &Self) -> bool {
        self.n_inputs == other.n_inputs
            && self.n_outputs == other.n_outputs
            && self.trilinear == other.trilinear
            && self.n_samples == other.n_samples
            && self.stride == other.stride
            && (Arc::ptr_eq(&self.table, &other.table) || self.table == other.table)
    }
}

impl<T: Interpolate> fmt::Debug for InterpParams<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "InterpParams {{ grid: {:?}, outputs: {}, trilinear: {}, table: {} entries }}",
            self.n_samples(),
            self.n_outputs,
            self.trilinear,
            self.table.len()
        )
    }
}

#[cfg(test)]
mod tests;
