//! Matrix-shaper evaluation in fixed point.

use super::curves::optimize_by_joining_curves;
use super::is_float;
use crate::fixed::{double_to_1fixed14, from_16_to_8, from_8_to_16, quick_saturate_word};
use crate::flags::TransformFlags;
use crate::format::PixelFormat;
use crate::pipeline::{OptimizedEval, Pipeline, Stage, StageLoc, StageType};
use crate::tone_curve::ToneCurve;
use crate::types::Intent;
use crate::util::{mat3_from_rows, mat3_is_identity, mat3_to_rows};

/// Curves, a 3×3 matrix and curves again, in 1.14 fixed point.
#[derive(Debug, Clone)]
struct MatShaper {
    /// Input curves for 8-bit values, in 1.14.
    shaper1: [Vec<i32>; 3],
    /// Output curves indexed by a 1.14 value in 0..=1.
    shaper2: [Vec<u16>; 3],
    /// Row-major, in 1.14.
    matrix: [[i64; 3]; 3],
    /// In 2.28, like the matrix products.
    offset: [i64; 3],
}

fn fill_first_shaper(curve: &ToneCurve) -> Vec<i32> {
    (0..256)
        .map(|i| {
            let y = curve.eval_float((i as f64 / 255.) as f32);
            if y < 131072. {
                double_to_1fixed14(y as f64)
            } else {
                0x7fffffff
            }
        })
        .collect()
}

fn fill_second_shaper(curve: &ToneCurve, eight_bit_output: bool) -> Vec<u16> {
    (0..16385)
        .map(|i| {
            let val = curve.eval_float((i as f64 / 16384.) as f32).max(0.).min(1.);
            let w = quick_saturate_word(val as f64 * 65535.);
            if eight_bit_output {
                // store the 8-bit result times 257, so the formatter can take either byte
                from_8_to_16(from_16_to_8(w))
            } else {
                w
            }
        })
        .collect()
}

impl MatShaper {
    fn new(
        curves1: &[ToneCurve],
        matrix: &[f64],
        offset: Option<&[f64]>,
        curves2: &[ToneCurve],
        eight_bit_output: bool,
    ) -> Self {
        let mut fixed_matrix = [[0; 3]; 3];
        for (i, row) in fixed_matrix.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = double_to_1fixed14(matrix[i * 3 + j]) as i64;
            }
        }

        let mut fixed_offset = [0; 3];
        if let Some(offset) = offset {
            for (v, o) in fixed_offset.iter_mut().zip(offset) {
                *v = (double_to_1fixed14(*o) as i64) << 14;
            }
        }

        MatShaper {
            shaper1: [
                fill_first_shaper(&curves1[0]),
                fill_first_shaper(&curves1[1]),
                fill_first_shaper(&curves1[2]),
            ],
            shaper2: [
                fill_second_shaper(&curves2[0], eight_bit_output),
                fill_second_shaper(&curves2[1], eight_bit_output),
                fill_second_shaper(&curves2[2], eight_bit_output),
            ],
            matrix: fixed_matrix,
            offset: fixed_offset,
        }
    }
}

impl OptimizedEval for MatShaper {
    fn eval_16(&self, input: &[u16], output: &mut [u16]) {
        // input comes from 8 bits
        let rgb = [
            self.shaper1[0][(input[0] >> 8) as usize] as i64,
            self.shaper1[1][(input[1] >> 8) as usize] as i64,
            self.shaper1[2][(input[2] >> 8) as usize] as i64,
        ];

        for i in 0..3 {
            let row = &self.matrix[i];
            let l = (row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2] + self.offset[i] + 0x2000)
                >> 14;
            let index = l.max(0).min(0x4000) as usize;
            output[i] = self.shaper2[i][index];
        }
    }

    fn duplicate(&self) -> Box<dyn OptimizedEval> {
        Box::new(self.clone())
    }
}

/// Evaluates `curve, matrix, curve` or `curve, matrix, matrix, curve` pipelines with 8-bit RGB
/// input in fixed point.
pub(super) fn optimize_matrix_shaper(
    pipeline: &mut Pipeline,
    intent: Intent,
    input_format: PixelFormat,
    output_format: PixelFormat,
    flags: &mut TransformFlags,
) -> bool {
    if is_float(input_format, output_format) {
        return false;
    }
    if input_format.channels() != 3 || output_format.channels() != 3 {
        return false;
    }
    if !input_format.is_8bit() {
        return false;
    }

    let four = [
        StageType::CurveSet,
        StageType::Matrix,
        StageType::Matrix,
        StageType::CurveSet,
    ];
    let three = [StageType::CurveSet, StageType::Matrix, StageType::CurveSet];

    let (curve1, matrix, offset, curve2) = if let Some(stages) = pipeline.match_stages(&four) {
        let (m1, offset1) = match stages[1].matrix() {
            Some(m) => m,
            None => return false,
        };
        let (m2, offset2) = match stages[2].matrix() {
            Some(m) => m,
            None => return false,
        };
        let offset1 = offset1.map_or(false, |o| o.iter().any(|v| *v != 0.));
        if m1.len() != 9 || m2.len() != 9 || offset1 {
            return false;
        }
        let product = mat3_from_rows(m2) * mat3_from_rows(m1);
        (stages[0], mat3_to_rows(product), offset2, stages[3])
    } else if let Some(stages) = pipeline.match_stages(&three) {
        let (m, offset) = match stages[1].matrix() {
            Some(m) => m,
            None => return false,
        };
        if m.len() != 9 {
            return false;
        }
        (stages[0], m.to_vec(), offset, stages[2])
    } else {
        return false;
    };

    let (curves1, curves2) = match (curve1.curves(), curve2.curves()) {
        (Some(c1), Some(c2)) if c1.len() == 3 && c2.len() == 3 => (c1, c2),
        _ => return false,
    };

    let no_offset = offset.map_or(true, |o| o.iter().all(|v| *v == 0.));
    let identity = no_offset && mat3_is_identity(mat3_from_rows(&matrix), 1. / 65535.);

    let mut shaper = Pipeline::new(3, 3);
    let mut stages = vec![curve1.clone()];
    if !identity {
        let stage = match Stage::new_matrix(3, matrix.clone(), offset.map(<[f64]>::to_vec)) {
            Ok(stage) => stage,
            Err(_) => return false,
        };
        stages.push(stage);
    }
    stages.push(curve2.clone());
    for stage in stages {
        if shaper.insert_stage(StageLoc::End, stage).is_err() {
            return false;
        }
    }

    if identity {
        // only curves are left
        if !optimize_by_joining_curves(&mut shaper, intent, input_format, output_format, flags) {
            return false;
        }
    } else {
        let eval = MatShaper::new(curves1, &matrix, offset, curves2, output_format.is_8bit());
        shaper.set_optimization(Box::new(eval));
    }

    *pipeline = shaper;
    true
}
