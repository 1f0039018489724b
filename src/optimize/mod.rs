//! Pipeline optimization.
//!
//! [`optimize_pipeline`] first removes stages that cancel out, then tries a list of lossy
//! optimizations in order until one applies. Each of them replaces the pipeline with an
//! equivalent one (within 16-bit precision) and installs a specialized 16-bit evaluator.
//!
//! | optimization         | applies to |
//! |:-------------------- |:---------- |
//! | joining curves       | pipelines made only of curve sets |
//! | matrix-shaper        | curve, matrix(, matrix), curve with 8-bit RGB input |
//! | prelinearization     | chunky RGB to RGB with 8-bit input (16-bit on request) |
//! | resampling           | anything else, into a CLUT |
//!
//! Lossy optimizations are never applied to floating-point formats.

use crate::fixed::quick_saturate_word;
use crate::flags::TransformFlags;
use crate::format::PixelFormat;
use crate::pipeline::{
    OptimizedEval, Pipeline, PipelineError, Stage, StageType, MAX_STAGE_CHANNELS,
};
use crate::types::Intent;
use tracing::{debug, trace};

mod curves;
mod matrix_shaper;
mod pre;
mod prelin;
mod resample;
mod white_fixup;

#[cfg(test)]
mod tests;

pub use pre::pre_optimize;

/// Number of samples used when tabulating curves through a pipeline.
const PRELINEARIZATION_POINTS: usize = 4096;

/// An optimization pass. Returns true and replaces the pipeline if it applies; otherwise the
/// pipeline is left unchanged.
type OptimizeFn = fn(&mut Pipeline, Intent, PixelFormat, PixelFormat, &mut TransformFlags) -> bool;

const OPTIMIZATIONS: [(&str, OptimizeFn); 4] = [
    ("joining curves", curves::optimize_by_joining_curves),
    ("matrix-shaper", matrix_shaper::optimize_matrix_shaper),
    ("prelinearization", prelin::optimize_by_computing_linearization),
    ("resampling", resample::optimize_by_resampling),
];

/// Optimizes a pipeline for evaluation with the given pixel formats.
///
/// Returns true if the pipeline was changed or a specialized evaluator was installed. The
/// float evaluation path always reflects the stages, so it stays usable either way.
///
/// # Examples
/// ```
/// # use rcms_transform::*;
/// # use rcms_transform::pipeline::*;
/// # use rcms_transform::optimize::optimize_pipeline;
/// let mut pipeline = Pipeline::from_stages(vec![
///     Stage::new_xyz_to_lab(),
///     Stage::new_lab_to_xyz(),
/// ]).unwrap();
///
/// let mut flags = TransformFlags::empty();
/// let optimized = optimize_pipeline(
///     &mut pipeline,
///     Intent::Perceptual,
///     TYPE_XYZ_16,
///     TYPE_XYZ_16,
///     &mut flags,
/// );
///
/// // the conversions cancel out
/// assert!(optimized);
/// assert!(pipeline.is_empty());
///
/// let mut out = [0; 3];
/// pipeline.eval_16(&[0x1234, 0x5678, 0x9abc], &mut out);
/// assert_eq!(out, [0x1234, 0x5678, 0x9abc]);
/// ```
pub fn optimize_pipeline(
    pipeline: &mut Pipeline,
    intent: Intent,
    input_format: PixelFormat,
    output_format: PixelFormat,
    flags: &mut TransformFlags,
) -> bool {
    // a CLUT was asked for
    if flags.contains(TransformFlags::FORCE_CLUT) {
        pre_optimize(pipeline);
        return resample::optimize_by_resampling(
            pipeline,
            intent,
            input_format,
            output_format,
            flags,
        );
    }

    if pipeline.is_empty() {
        set_pass_through(pipeline);
        return true;
    }

    if pipeline
        .stages()
        .iter()
        .any(|stage| stage.stage_type() == StageType::NamedColor)
    {
        trace!("named color pipelines cannot be optimized");
        return false;
    }

    let any_success = pre_optimize(pipeline);

    if pipeline.is_empty() {
        debug!("pipeline reduced to an identity");
        set_pass_through(pipeline);
        return true;
    }

    // keep all precision
    if flags.contains(TransformFlags::NOOPTIMIZE) {
        return any_success;
    }

    for (name, optimize) in &OPTIMIZATIONS {
        if optimize(pipeline, intent, input_format, output_format, flags) {
            debug!("applied {} optimization", name);
            return true;
        }
        trace!("{} optimization does not apply", name);
    }

    any_success
}

/// Lossy optimizations do not apply to floating-point formats.
fn is_float(input_format: PixelFormat, output_format: PixelFormat) -> bool {
    input_format.is_float() || output_format.is_float()
}

fn all_curves_linear(stage: &Stage) -> bool {
    stage
        .curves()
        .map_or(false, |curves| curves.iter().all(|curve| curve.is_linear()))
}

/// Copies input to output.
#[derive(Debug, Clone)]
struct PassThrough {
    channels: usize,
}

impl OptimizedEval for PassThrough {
    fn eval_16(&self, input: &[u16], output: &mut [u16]) {
        output[..self.channels].copy_from_slice(&input[..self.channels]);
    }

    fn duplicate(&self) -> Box<dyn OptimizedEval> {
        Box::new(self.clone())
    }
}

fn set_pass_through(pipeline: &mut Pipeline) {
    let channels = pipeline.input_channels();
    pipeline.set_optimization(Box::new(PassThrough { channels }));
}

/// Fills a 16-bit CLUT stage by evaluating the source pipeline in float at every node.
fn resample_into(clut: &mut Stage, source: &Pipeline) -> Result<(), PipelineError> {
    let n_out = source.output_channels();
    let mut float_in = [0.; MAX_STAGE_CHANNELS];
    let mut float_out = [0.; MAX_STAGE_CHANNELS];

    clut.sample_clut_16(
        |input, output| {
            for (f, v) in float_in.iter_mut().zip(input) {
                *f = *v as f32 / 65535.;
            }
            source.eval_float(&float_in, &mut float_out);
            for (v, f) in output.iter_mut().zip(&float_out[..n_out]) {
                *v = quick_saturate_word(*f as f64 * 65535.);
            }
            true
        },
        false,
    )
}
