//! Color lookup table stages.

use super::stage::{Stage, StageKernel};
use super::PipelineError;
use crate::fixed::{quantize_val, quick_saturate_word};
use crate::interp::{cube_size, InterpParams, MAX_INPUT_DIMENSIONS, MAX_STAGE_CHANNELS};
use tracing::warn;

/// The grid of a CLUT stage.
#[derive(Debug, Clone, PartialEq)]
pub enum ClutTable {
    /// Nodes are 16-bit values. Evaluation converts from and to 0..1.
    U16(InterpParams<u16>),
    /// Nodes are floats.
    Float(InterpParams<f32>),
}

impl ClutTable {
    pub fn n_inputs(&self) -> usize {
        match self {
            ClutTable::U16(params) => params.n_inputs(),
            ClutTable::Float(params) => params.n_inputs(),
        }
    }

    pub fn n_outputs(&self) -> usize {
        match self {
            ClutTable::U16(params) => params.n_outputs(),
            ClutTable::Float(params) => params.n_outputs(),
        }
    }

    /// Grid points along each input.
    pub fn n_samples(&self) -> &[usize] {
        match self {
            ClutTable::U16(params) => params.n_samples(),
            ClutTable::Float(params) => params.n_samples(),
        }
    }

    pub(crate) fn eval_float(&self, input: &[f32], output: &mut [f32]) {
        match self {
            ClutTable::U16(params) => {
                let mut in16 = [0; MAX_INPUT_DIMENSIONS];
                let mut out16 = [0; MAX_STAGE_CHANNELS];
                let n_in = params.n_inputs();
                let n_out = params.n_outputs();

                for (v16, v) in in16.iter_mut().zip(&input[..n_in]) {
                    *v16 = quick_saturate_word(*v as f64 * 65535.);
                }
                params.eval(&in16[..n_in], &mut out16[..n_out]);
                for (v, v16) in output.iter_mut().zip(&out16[..n_out]) {
                    *v = *v16 as f32 / 65535.;
                }
            }
            ClutTable::Float(params) => params.eval(input, output),
        }
    }
}

/// Checks the grid of a new CLUT and returns the number of table entries.
fn clut_entries(grid_points: &[usize], outputs: usize) -> Result<usize, PipelineError> {
    let inputs = grid_points.len();
    if inputs == 0 || outputs == 0 {
        return Err(PipelineError::InvalidClut(inputs, outputs));
    }
    if inputs > MAX_INPUT_DIMENSIONS || outputs >= MAX_STAGE_CHANNELS {
        warn!("CLUT with {} inputs and {} outputs is not supported", inputs, outputs);
        return Err(PipelineError::InvalidClut(inputs, outputs));
    }

    // a single grid point has no cells to interpolate in
    if let Some(dim) = grid_points.iter().position(|&points| points < 2) {
        warn!("CLUT dimension {} has {} grid points", dim, grid_points[dim]);
        return Err(PipelineError::InvalidClut(inputs, outputs));
    }

    cube_size(grid_points)
        .and_then(|size| size.checked_mul(outputs))
        .ok_or_else(|| {
            warn!("CLUT of {:?} grid points is too large", grid_points);
            PipelineError::ClutTooLarge
        })
}

/// The grid coordinates of every node in table order, expressed in 0..=0xffff.
fn for_each_node(
    grid_points: &[usize],
    mut f: impl FnMut(usize, &[u16]) -> bool,
) -> Result<(), PipelineError> {
    let n_in = grid_points.len();
    let total = cube_size(grid_points).ok_or(PipelineError::ClutTooLarge)?;
    let mut node = [0; MAX_INPUT_DIMENSIONS];

    for i in 0..total {
        let mut rest = i;
        for t in (0..n_in).rev() {
            let colorant = rest % grid_points[t];
            rest /= grid_points[t];
            node[t] = quantize_val(colorant as f64, grid_points[t]);
        }

        if !f(i, &node[..n_in]) {
            return Err(PipelineError::SamplingAborted);
        }
    }
    Ok(())
}

impl Stage {
    /// Creates a 16-bit CLUT stage with `grid_points[i]` nodes along input `i`.
    ///
    /// Without a table, all nodes are zero.
    ///
    /// # Examples
    /// ```
    /// # use rcms_transform::pipeline::Stage;
    /// // two inputs, one output
    /// let stage = Stage::new_clut_16_granular(&[2, 3], 1, None).unwrap();
    /// assert_eq!(stage.input_channels(), 2);
    ///
    /// // every dimension needs at least two grid points
    /// assert!(Stage::new_clut_16_granular(&[2, 1], 1, None).is_err());
    /// ```
    pub fn new_clut_16_granular(
        grid_points: &[usize],
        outputs: usize,
        table: Option<Vec<u16>>,
    ) -> Result<Stage, PipelineError> {
        let entries = clut_entries(grid_points, outputs)?;
        let table = table.unwrap_or_else(|| vec![0; entries]);
        let params = InterpParams::new(grid_points, outputs, table, false)?;
        Ok(Stage::new(StageKernel::CLut(ClutTable::U16(params))))
    }

    /// Creates a 16-bit CLUT stage with the same number of grid points along every input.
    pub fn new_clut_16(
        grid_points: usize,
        inputs: usize,
        outputs: usize,
        table: Option<Vec<u16>>,
    ) -> Result<Stage, PipelineError> {
        if inputs > MAX_INPUT_DIMENSIONS {
            return Err(PipelineError::InvalidClut(inputs, outputs));
        }
        let dims = [grid_points; MAX_INPUT_DIMENSIONS];
        Self::new_clut_16_granular(&dims[..inputs], outputs, table)
    }

    /// Creates a float CLUT stage with `grid_points[i]` nodes along input `i`.
    pub fn new_clut_float_granular(
        grid_points: &[usize],
        outputs: usize,
        table: Option<Vec<f32>>,
    ) -> Result<Stage, PipelineError> {
        let entries = clut_entries(grid_points, outputs)?;
        let table = table.unwrap_or_else(|| vec![0.; entries]);
        let params = InterpParams::new(grid_points, outputs, table, false)?;
        Ok(Stage::new(StageKernel::CLut(ClutTable::Float(params))))
    }

    /// Creates a float CLUT stage with the same number of grid points along every input.
    pub fn new_clut_float(
        grid_points: usize,
        inputs: usize,
        outputs: usize,
        table: Option<Vec<f32>>,
    ) -> Result<Stage, PipelineError> {
        if inputs > MAX_INPUT_DIMENSIONS {
            return Err(PipelineError::InvalidClut(inputs, outputs));
        }
        let dims = [grid_points; MAX_INPUT_DIMENSIONS];
        Self::new_clut_float_granular(&dims[..inputs], outputs, table)
    }

    /// Calls the sampler for every node of a 16-bit CLUT, in table order.
    ///
    /// The sampler receives the node position and the current node value, and may change the
    /// value. With `inspect`, changes are discarded. Sampling stops with an error if the
    /// sampler returns false.
    ///
    /// # Examples
    /// ```
    /// # use rcms_transform::pipeline::Stage;
    /// let mut stage = Stage::new_clut_16(3, 2, 1, None).unwrap();
    /// stage
    ///     .sample_clut_16(|input, output| {
    ///         output[0] = input[0] / 2 + input[1] / 2;
    ///         true
    ///     }, false)
    ///     .unwrap();
    ///
    /// let mut out = [0.];
    /// stage.eval(&[1., 1.], &mut out);
    /// assert!((out[0] - 1.).abs() < 1e-4);
    /// ```
    pub fn sample_clut_16(
        &mut self,
        mut sampler: impl FnMut(&[u16], &mut [u16]) -> bool,
        inspect: bool,
    ) -> Result<(), PipelineError> {
        let params = match self.kernel_mut() {
            StageKernel::CLut(ClutTable::U16(params)) => params,
            _ => return Err(PipelineError::NotAClut),
        };

        let grid_points = params.n_samples().to_vec();
        let n_out = params.n_outputs();
        let mut value = vec![0; n_out];

        if inspect {
            let table = params.table();
            for_each_node(&grid_points, |i, node| {
                value.copy_from_slice(&table[i * n_out..(i + 1) * n_out]);
                sampler(node, &mut value)
            })
        } else {
            let table = params.table_mut();
            for_each_node(&grid_points, |i, node| {
                let entry = &mut table[i * n_out..(i + 1) * n_out];
                value.copy_from_slice(entry);
                let go_on = sampler(node, &mut value);
                entry.copy_from_slice(&value);
                go_on
            })
        }
    }

    /// Like [`sample_clut_16`](Self::sample_clut_16), for float CLUTs. Node positions are in
    /// 0..=1.
    pub fn sample_clut_float(
        &mut self,
        mut sampler: impl FnMut(&[f32], &mut [f32]) -> bool,
        inspect: bool,
    ) -> Result<(), PipelineError> {
        let params = match self.kernel_mut() {
            StageKernel::CLut(ClutTable::Float(params)) => params,
            _ => return Err(PipelineError::NotAClut),
        };

        let grid_points = params.n_samples().to_vec();
        let n_out = params.n_outputs();
        let mut value = vec![0.; n_out];
        let mut position = [0.; MAX_INPUT_DIMENSIONS];

        if inspect {
            let table = params.table();
            for_each_node(&grid_points, |i, node| {
                node_to_float(node, &mut position);
                value.copy_from_slice(&table[i * n_out..(i + 1) * n_out]);
                sampler(&position[..node.len()], &mut value)
            })
        } else {
            let table = params.table_mut();
            for_each_node(&grid_points, |i, node| {
                node_to_float(node, &mut position);
                let entry = &mut table[i * n_out..(i + 1) * n_out];
                value.copy_from_slice(entry);
                let go_on = sampler(&position[..node.len()], &mut value);
                entry.copy_from_slice(&value);
                go_on
            })
        }
    }
}

fn node_to_float(node: &[u16], position: &mut [f32]) {
    for (p, v) in position.iter_mut().zip(node) {
        *p = *v as f32 / 65535.;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_grids() {
        assert_eq!(
            Stage::new_clut_16(1, 3, 3, None),
            Err(PipelineError::InvalidClut(3, 3))
        );
        assert!(Stage::new_clut_16(2, 16, 3, None).is_err());
        assert!(Stage::new_clut_float(2, 3, 0, None).is_err());
        assert_eq!(
            Stage::new_clut_16_granular(&[0x10000, 0x10000, 0x10000], 3, None),
            Err(PipelineError::ClutTooLarge)
        );
        // wrong table size
        assert!(Stage::new_clut_16(2, 2, 1, Some(vec![0; 3])).is_err());
    }

    #[test]
    fn identity_float_clut() {
        let table = vec![
            0., 0., 0., 0., 0., 1., 0., 1., 0., 0., 1., 1., //
            1., 0., 0., 1., 0., 1., 1., 1., 0., 1., 1., 1.,
        ];
        let stage = Stage::new_clut_float(2, 3, 3, Some(table)).unwrap();
        let mut out = [0.; 3];
        stage.eval(&[0.25, 0.5, 0.75], &mut out);
        for (a, b) in out.iter().zip(&[0.25, 0.5, 0.75]) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn sampling_visits_nodes_in_table_order() {
        let mut stage = Stage::new_clut_16_granular(&[2, 3], 2, None).unwrap();
        let mut seen = Vec::new();
        stage
            .sample_clut_16(
                |input, output| {
                    seen.push(input.to_vec());
                    output[0] = input[0];
                    output[1] = input[1];
                    true
                },
                false,
            )
            .unwrap();

        assert_eq!(
            seen,
            vec![
                vec![0, 0],
                vec![0, 0x8000],
                vec![0, 0xffff],
                vec![0xffff, 0],
                vec![0xffff, 0x8000],
                vec![0xffff, 0xffff],
            ]
        );

        let table = match stage.clut() {
            Some(ClutTable::U16(params)) => params.table().to_vec(),
            _ => panic!("not a 16-bit CLUT"),
        };
        assert_eq!(&table[6..8], &[0xffff, 0]);

        // inspecting leaves the table alone
        stage
            .sample_clut_16(
                |_, output| {
                    output[0] = 1;
                    true
                },
                true,
            )
            .unwrap();
        match stage.clut() {
            Some(ClutTable::U16(params)) => assert_eq!(params.table(), &table[..]),
            _ => unreachable!(),
        }
    }

    #[test]
    fn sampling_can_abort() {
        let mut stage = Stage::new_clut_float(3, 1, 1, None).unwrap();
        let mut calls = 0;
        let result = stage.sample_clut_float(
            |input, output| {
                calls += 1;
                output[0] = input[0];
                input[0] < 0.5
            },
            false,
        );
        assert_eq!(result, Err(PipelineError::SamplingAborted));
        assert_eq!(calls, 2);

        let mut other = Stage::new_identity(3);
        assert_eq!(
            other.sample_clut_float(|_, _| true, false),
            Err(PipelineError::NotAClut)
        );
    }
}
