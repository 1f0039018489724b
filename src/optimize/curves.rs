//! Joining curve sets into a single lookup per channel.

use super::{is_float, PassThrough, PRELINEARIZATION_POINTS};
use crate::fixed::{from_8_to_16, quick_saturate_word};
use crate::flags::TransformFlags;
use crate::format::PixelFormat;
use crate::pipeline::{OptimizedEval, Pipeline, Stage, StageLoc, StageType, MAX_STAGE_CHANNELS};
use crate::tone_curve::ToneCurve;
use crate::types::Intent;
use tracing::trace;

/// Direct lookup of every channel in a table.
///
/// 8-bit tables have 256 entries and are indexed with the high byte of the input.
#[derive(Debug, Clone)]
struct CurvesEval {
    eight_bit: bool,
    curves: Vec<Vec<u16>>,
}

impl CurvesEval {
    fn new(curves: &[ToneCurve], eight_bit: bool) -> Self {
        let curves = curves
            .iter()
            .map(|curve| {
                if eight_bit {
                    (0..=255).map(|i| curve.eval_16(from_8_to_16(i))).collect()
                } else {
                    (0..=0xffff).map(|i| curve.eval_16(i)).collect()
                }
            })
            .collect();

        CurvesEval { eight_bit, curves }
    }
}

impl OptimizedEval for CurvesEval {
    fn eval_16(&self, input: &[u16], output: &mut [u16]) {
        for (i, curve) in self.curves.iter().enumerate() {
            let index = if self.eight_bit {
                (input[i] >> 8) as usize
            } else {
                input[i] as usize
            };
            output[i] = curve[index];
        }
    }

    fn duplicate(&self) -> Box<dyn OptimizedEval> {
        Box::new(self.clone())
    }
}

/// Replaces a pipeline made only of curve sets by one tabulated curve per channel.
pub(super) fn optimize_by_joining_curves(
    pipeline: &mut Pipeline,
    _intent: Intent,
    input_format: PixelFormat,
    output_format: PixelFormat,
    _flags: &mut TransformFlags,
) -> bool {
    if is_float(input_format, output_format) {
        return false;
    }

    if pipeline
        .stages()
        .iter()
        .any(|stage| stage.stage_type() != StageType::CurveSet)
    {
        return false;
    }

    let channels = pipeline.input_channels();
    let mut tables = vec![vec![0; PRELINEARIZATION_POINTS]; channels];
    let mut float_in = [0.; MAX_STAGE_CHANNELS];
    let mut float_out = [0.; MAX_STAGE_CHANNELS];

    for i in 0..PRELINEARIZATION_POINTS {
        let v = (i as f64 / (PRELINEARIZATION_POINTS - 1) as f64) as f32;
        float_in[..channels].iter_mut().for_each(|x| *x = v);

        pipeline.eval_float(&float_in, &mut float_out);

        for (table, out) in tables.iter_mut().zip(&float_out[..channels]) {
            table[i] = quick_saturate_word(*out as f64 * 65535.);
        }
    }

    let curves = match tables
        .into_iter()
        .map(ToneCurve::new_table_16)
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(curves) => curves,
        Err(err) => {
            trace!("could not tabulate joined curves: {}", err);
            return false;
        }
    };

    let mut joined = Pipeline::new(channels, channels);

    if curves.iter().all(ToneCurve::is_linear) {
        let identity = match Stage::new_ident_curve_set(channels) {
            Ok(stage) => stage,
            Err(_) => return false,
        };
        if joined.insert_stage(StageLoc::Begin, identity).is_err() {
            return false;
        }
        joined.set_optimization(Box::new(PassThrough { channels }));
    } else {
        let eval = CurvesEval::new(&curves, input_format.is_8bit());
        if joined
            .insert_stage(StageLoc::Begin, Stage::new_curve_set(curves))
            .is_err()
        {
            return false;
        }
        joined.set_optimization(Box::new(eval));
    }

    *pipeline = joined;
    true
}
