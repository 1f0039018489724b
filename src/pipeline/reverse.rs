use super::{Pipeline, PipelineError};
use crate::util::solve_mat3;
use cgmath::{Matrix3, SquareMatrix, Vector3};
use tracing::{trace, warn};

const JACOBIAN_EPSILON: f32 = 0.001;
const INVERSION_MAX_ITERATIONS: usize = 30;

/// Steps away from a value to estimate a partial derivative, backwards near 1.
fn inc_delta(v: f32) -> f32 {
    if v < 1. - JACOBIAN_EPSILON {
        v + JACOBIAN_EPSILON
    } else {
        v - JACOBIAN_EPSILON
    }
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(a, b)| {
            let d = (*a - *b) as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

impl Pipeline {
    /// Finds the input that the pipeline maps to `target`, using Newton-Raphson iteration.
    ///
    /// Only pipelines with 3 outputs and 3 or 4 inputs can be reversed. With 4 inputs, the fourth
    /// one is not searched for but fixed to `target[3]`. The search starts at `hint` or at 0.3 on
    /// each channel and stays in 0..1.
    ///
    /// If no exact solution is found, this returns the closest input visited.
    ///
    /// # Examples
    /// ```
    /// # use rcms_transform::pipeline::*;
    /// let mut pipeline = Pipeline::new(3, 3);
    /// pipeline.insert_stage(StageLoc::End, Stage::new_matrix(
    ///     3,
    ///     vec![0.5, 0., 0., 0., 1., 0., 0., 0.25, 0.75],
    ///     None,
    /// ).unwrap()).unwrap();
    ///
    /// let input = pipeline.eval_reverse_float(&[0.1, 0.2, 0.3], None).unwrap();
    /// let mut out = [0.; 3];
    /// pipeline.eval_float(&input, &mut out);
    ///
    /// for (a, b) in out.iter().zip(&[0.1, 0.2, 0.3]) {
    ///     assert!((a - b).abs() < 1e-3);
    /// }
    /// ```
    pub fn eval_reverse_float(
        &self,
        target: &[f32],
        hint: Option<&[f32]>,
    ) -> Result<[f32; 4], PipelineError> {
        let inputs = self.input_channels();
        if (inputs != 3 && inputs != 4) || self.output_channels() != 3 {
            warn!("cannot reverse a {} -> {} pipeline", inputs, self.output_channels());
            return Err(PipelineError::NotReversible(inputs, self.output_channels()));
        }

        let mut x = [0.3; 4];
        if let Some(hint) = hint {
            x[..3].copy_from_slice(&hint[..3]);
        }
        x[3] = if inputs == 4 { target[3] } else { 0. };

        let mut result = x;
        let mut last_error = f64::INFINITY;
        let mut fx = [0.; 3];
        let mut fxd = [0.; 3];

        for i in 0..INVERSION_MAX_ITERATIONS {
            self.eval_float(&x, &mut fx);
            let error = euclidean_distance(&fx, &target[..3]);

            // not converging; the last guess was better
            if error >= last_error {
                trace!("reverse evaluation stopped after {} iterations", i);
                break;
            }

            last_error = error;
            result = x;

            if error <= 0. {
                break;
            }

            // column j holds the derivatives along input j
            let mut jacobian = Matrix3::<f64>::from_value(0.);
            for j in 0..3 {
                let mut xd = x;
                xd[j] = inc_delta(x[j]);
                let delta = (xd[j] - x[j]) as f64;
                self.eval_float(&xd, &mut fxd);

                for k in 0..3 {
                    jacobian[j][k] = (fxd[k] - fx[k]) as f64 / delta;
                }
            }

            let residual = Vector3::new(
                (fx[0] - target[0]) as f64,
                (fx[1] - target[1]) as f64,
                (fx[2] - target[2]) as f64,
            );
            let step = match solve_mat3(jacobian, residual) {
                Some(step) => step,
                None => {
                    trace!("singular jacobian after {} iterations", i);
                    break;
                }
            };

            x[0] -= step.x as f32;
            x[1] -= step.y as f32;
            x[2] -= step.z as f32;

            for v in &mut x[..3] {
                *v = v.max(0.).min(1.);
            }
        }

        Ok(result)
    }
}
