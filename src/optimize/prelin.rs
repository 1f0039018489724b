//! Prelinearization: curves that straighten the pipeline before it is resampled.
//!
//! Sampling a CLUT on a regular grid works best when the function is close to linear along each
//! axis. For RGB to RGB transforms, the response to a gray ramp is measured per channel and its
//! inverse is applied before resampling, then the measured curves are put back in front of the
//! CLUT.

use super::white_fixup::fix_white_misalignment;
use super::{is_float, resample_into, PRELINEARIZATION_POINTS};
use crate::fixed::{
    fixed_rest_to_int, fixed_to_int, from_8_to_16, quick_saturate_word, to_fixed_domain,
};
use crate::flags::TransformFlags;
use crate::format::{PixelFormat, PixelType};
use crate::interp::{tetrahedral_cell, InterpParams, MAX_INPUT_DIMENSIONS};
use crate::pcs::reasonable_grid_points;
use crate::pipeline::{
    ClutTable, OptimizedEval, Pipeline, Stage, StageLoc, MAX_STAGE_CHANNELS,
};
use crate::tone_curve::ToneCurve;
use crate::types::Intent;
use tracing::trace;

/// 8-bit RGB input through prelinearization curves into a 3D CLUT, with grid cells and
/// positions precomputed for each input byte.
#[derive(Debug, Clone)]
pub(super) struct Prelin8 {
    clut: InterpParams<u16>,
    /// Table offset of the lower grid node, per channel and input byte.
    node: [[usize; 256]; 3],
    /// Position inside the grid cell, per channel and input byte.
    rest: [[u16; 256]; 3],
}

impl Prelin8 {
    pub(super) fn new(clut: InterpParams<u16>, curves: &[ToneCurve]) -> Self {
        let mut node = [[0; 256]; 3];
        let mut rest = [[0; 256]; 3];
        let domain = clut.domain();
        let stride = clut.stride();

        for i in 0..256 {
            let v16 = from_8_to_16(i as u8);
            for c in 0..3 {
                let v = curves.get(c).map_or(v16, |curve| curve.eval_16(v16));
                let fixed = to_fixed_domain(v as i64 * domain[c] as i64);
                node[c][i] = fixed_to_int(fixed) as usize * stride[2 - c];
                rest[c][i] = fixed_rest_to_int(fixed) as u16;
            }
        }

        Prelin8 { clut, node, rest }
    }
}

impl OptimizedEval for Prelin8 {
    fn eval_16(&self, input: &[u16], output: &mut [u16]) {
        let stride = self.clut.stride();
        let mut lo = [0; 3];
        let mut hi = [0; 3];
        let mut rest = [0; 3];

        for c in 0..3 {
            let byte = (input[c] >> 8) as usize;
            lo[c] = self.node[c][byte];
            rest[c] = self.rest[c][byte] as i64;
            hi[c] = lo[c] + if rest[c] == 0 { 0 } else { stride[2 - c] };
        }

        tetrahedral_cell(
            self.clut.table(),
            lo,
            hi,
            rest,
            self.clut.n_outputs(),
            output,
        );
    }

    fn duplicate(&self) -> Box<dyn OptimizedEval> {
        Box::new(self.clone())
    }
}

/// Optional curves on either side of a 16-bit CLUT. Missing curves are identities.
#[derive(Debug, Clone)]
pub(super) struct Prelin16 {
    curves_in: Vec<ToneCurve>,
    clut: InterpParams<u16>,
    curves_out: Vec<ToneCurve>,
}

impl Prelin16 {
    pub(super) fn new(
        curves_in: Vec<ToneCurve>,
        clut: InterpParams<u16>,
        curves_out: Vec<ToneCurve>,
    ) -> Self {
        Prelin16 {
            curves_in,
            clut,
            curves_out,
        }
    }
}

fn apply_curves(curves: &[ToneCurve], values: &mut [u16]) {
    for (v, curve) in values.iter_mut().zip(curves) {
        *v = curve.eval_16(*v);
    }
}

impl OptimizedEval for Prelin16 {
    fn eval_16(&self, input: &[u16], output: &mut [u16]) {
        let n_in = self.clut.n_inputs();
        let n_out = self.clut.n_outputs();
        let mut stage_abc = [0; MAX_INPUT_DIMENSIONS];

        stage_abc[..n_in].copy_from_slice(&input[..n_in]);
        apply_curves(&self.curves_in, &mut stage_abc[..n_in]);

        self.clut.eval(&stage_abc[..n_in], &mut output[..n_out]);
        apply_curves(&self.curves_out, &mut output[..n_out]);
    }

    fn duplicate(&self) -> Box<dyn OptimizedEval> {
        Box::new(self.clone())
    }
}

/// A curve that maps many inputs to the extremes.
pub(super) fn is_degenerated(curve: &ToneCurve) -> bool {
    let table = curve.table_16();
    let zeros = table.iter().filter(|v| **v == 0).count();
    let poles = table.iter().filter(|v| **v == 0xffff).count();

    // linear tables
    if zeros == 1 && poles == 1 {
        return false;
    }
    zeros > table.len() / 20 || poles > table.len() / 20
}

/// Replaces the first and last 2 % of a tabulated curve by straight lines towards the ends, which
/// are usually the noisiest part of a measured curve.
fn slope_limiting(curve: &mut ToneCurve) {
    let (begin_val, end_val) = if curve.is_descending() {
        (0xffff as f64, 0.)
    } else {
        (0., 0xffff as f64)
    };

    let table = curve.table_16_mut();
    let n = table.len();
    let at_begin = (n as f64 * 0.02 + 0.5).floor() as usize;
    if at_begin == 0 || at_begin >= n {
        return;
    }
    let at_end = n - at_begin - 1;

    let val = table[at_begin] as f64;
    let slope = (val - begin_val) / at_begin as f64;
    let beta = val - slope * at_begin as f64;
    for (i, v) in table[..at_begin].iter_mut().enumerate() {
        *v = quick_saturate_word(i as f64 * slope + beta);
    }

    // at_begin is also the length of the interval at the end
    let val = table[at_end] as f64;
    let slope = (end_val - val) / at_begin as f64;
    let beta = val - slope * at_end as f64;
    for (i, v) in table.iter_mut().enumerate().skip(at_end) {
        *v = quick_saturate_word(i as f64 * slope + beta);
    }
}

/// Resamples chunky RGB to RGB pipelines into prelinearization curves and a CLUT.
pub(super) fn optimize_by_computing_linearization(
    pipeline: &mut Pipeline,
    intent: Intent,
    input_format: PixelFormat,
    output_format: PixelFormat,
    flags: &mut TransformFlags,
) -> bool {
    if is_float(input_format, output_format) {
        return false;
    }

    // only on chunky RGB
    if input_format.pixel_type() != Some(PixelType::RGB) || input_format.is_planar() {
        return false;
    }
    if output_format.pixel_type() != Some(PixelType::RGB) || output_format.is_planar() {
        return false;
    }

    // on 16 bits, this has to be asked for
    if !input_format.is_8bit() && !flags.contains(TransformFlags::CLUT_PRE_LINEARIZATION) {
        return false;
    }

    let (color_space, output_color_space) =
        match (input_format.color_space(), output_format.color_space()) {
            (Some(input), Some(output)) => (input, output),
            _ => return false,
        };

    if pipeline.input_channels() != 3 || pipeline.output_channels() != 3 {
        return false;
    }

    // degenerated curves at the end are likely squeezing and clipping the output of a CLUT,
    // which cannot be linearized
    if let Some(curves) = pipeline.stages().last().and_then(Stage::curves) {
        if curves.iter().any(is_degenerated) {
            trace!("pipeline ends in degenerated curves");
            return false;
        }
    }

    let channels = pipeline.input_channels();
    let mut tables = vec![vec![0; PRELINEARIZATION_POINTS]; channels];
    let mut float_in = [0.; MAX_STAGE_CHANNELS];
    let mut float_out = [0.; MAX_STAGE_CHANNELS];

    // feed a gray ramp
    for i in 0..PRELINEARIZATION_POINTS {
        let v = (i as f64 / (PRELINEARIZATION_POINTS - 1) as f64) as f32;
        float_in[..channels].iter_mut().for_each(|x| *x = v);
        pipeline.eval_float(&float_in, &mut float_out);
        for (table, out) in tables.iter_mut().zip(&float_out[..channels]) {
            table[i] = quick_saturate_word(*out as f64 * 65535.);
        }
    }

    let mut trans = Vec::with_capacity(channels);
    for table in tables {
        match ToneCurve::new_table_16(table) {
            Ok(curve) => trans.push(curve),
            Err(_) => return false,
        }
    }

    for curve in &mut trans {
        slope_limiting(curve);
    }

    if trans
        .iter()
        .any(|curve| !curve.is_monotonic() || is_degenerated(curve))
    {
        trace!("prelinearization curves are unsuitable");
        return false;
    }

    let mut reversed = Vec::with_capacity(channels);
    for curve in &trans {
        match curve.reversed_with_samples(PRELINEARIZATION_POINTS) {
            Ok(curve) => reversed.push(curve),
            Err(_) => return false,
        }
    }

    // the original pipeline behind the inverse curves is close to linear
    let mut lut_plus_curves = pipeline.clone();
    if lut_plus_curves
        .insert_stage(StageLoc::Begin, Stage::new_curve_set(reversed))
        .is_err()
    {
        return false;
    }

    let grid_points = reasonable_grid_points(color_space, *flags);
    let mut clut = match Stage::new_clut_16(grid_points, channels, pipeline.output_channels(), None)
    {
        Ok(clut) => clut,
        Err(err) => {
            trace!("cannot allocate CLUT: {}", err);
            return false;
        }
    };
    if resample_into(&mut clut, &lut_plus_curves).is_err() {
        return false;
    }

    let mut optimized = Pipeline::new(channels, pipeline.output_channels());
    if optimized
        .insert_stage(StageLoc::End, Stage::new_curve_set(trans))
        .is_err()
        || optimized.insert_stage(StageLoc::End, clut).is_err()
    {
        return false;
    }

    // don't fix white on absolute colorimetric
    if intent == Intent::AbsoluteColorimetric {
        flags.insert(TransformFlags::NOWHITEONWHITEFIXUP);
    }
    if !flags.contains(TransformFlags::NOWHITEONWHITEFIXUP)
        && !fix_white_misalignment(&mut optimized, color_space, output_color_space)
    {
        return false;
    }

    let eval: Box<dyn OptimizedEval> = {
        let stages = optimized.stages();
        let curves = stages[0].curves().unwrap_or(&[]).to_vec();
        let params = match stages[1].clut() {
            Some(ClutTable::U16(params)) => params.clone(),
            _ => return false,
        };

        if input_format.is_8bit() {
            Box::new(Prelin8::new(params, &curves))
        } else {
            Box::new(Prelin16::new(curves, params, Vec::new()))
        }
    };
    optimized.set_optimization(eval);

    *pipeline = optimized;
    true
}
