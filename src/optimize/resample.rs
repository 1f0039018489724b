//! Resampling a whole pipeline into a CLUT.

use super::prelin::Prelin16;
use super::white_fixup::fix_white_misalignment;
use super::{all_curves_linear, is_float, resample_into};
use crate::flags::TransformFlags;
use crate::format::PixelFormat;
use crate::interp::InterpParams;
use crate::pcs::reasonable_grid_points;
use crate::pipeline::{ClutTable, OptimizedEval, Pipeline, Stage, StageLoc};
use crate::types::Intent;
use tracing::{debug, trace};

/// A bare 16-bit CLUT.
#[derive(Debug, Clone)]
struct ClutEval(InterpParams<u16>);

impl OptimizedEval for ClutEval {
    fn eval_16(&self, input: &[u16], output: &mut [u16]) {
        let n_in = self.0.n_inputs();
        let n_out = self.0.n_outputs();
        self.0.eval(&input[..n_in], &mut output[..n_out]);
    }

    fn duplicate(&self) -> Box<dyn OptimizedEval> {
        Box::new(self.clone())
    }
}

/// Replaces the pipeline with a 16-bit CLUT, keeping non-linear curves at either end when
/// asked to with [`TransformFlags::CLUT_PRE_LINEARIZATION`] and
/// [`TransformFlags::CLUT_POST_LINEARIZATION`].
pub(super) fn optimize_by_resampling(
    pipeline: &mut Pipeline,
    intent: Intent,
    input_format: PixelFormat,
    output_format: PixelFormat,
    flags: &mut TransformFlags,
) -> bool {
    if is_float(input_format, output_format) {
        return false;
    }

    let (color_space, output_color_space) =
        match (input_format.color_space(), output_format.color_space()) {
            (Some(input), Some(output)) => (input, output),
            _ => return false,
        };

    // an empty pipeline only needs its corners
    let grid_points = if pipeline.is_empty() {
        2
    } else {
        reasonable_grid_points(color_space, *flags)
    };

    let mut source = pipeline.clone();

    let non_linear = |stage: &Stage| stage.curves().is_some() && !all_curves_linear(stage);

    let pre_curves = if flags.contains(TransformFlags::CLUT_PRE_LINEARIZATION)
        && source.stages().first().map_or(false, non_linear)
    {
        source.unlink_stage(StageLoc::Begin)
    } else {
        None
    };

    let post_curves = if flags.contains(TransformFlags::CLUT_POST_LINEARIZATION)
        && source.stages().last().map_or(false, non_linear)
    {
        source.unlink_stage(StageLoc::End)
    } else {
        None
    };

    let n_in = pipeline.input_channels();
    let n_out = pipeline.output_channels();

    let mut clut = match Stage::new_clut_16(grid_points, n_in, n_out, None) {
        Ok(clut) => clut,
        Err(err) => {
            trace!("cannot allocate CLUT: {}", err);
            return false;
        }
    };

    // the curves were unlinked, so what remains is sampled in between them
    if let Err(err) = resample_into(&mut clut, &source) {
        trace!("resampling failed: {}", err);
        return false;
    }

    let mut resampled = Pipeline::new(n_in, n_out);
    let stages = pre_curves
        .iter()
        .cloned()
        .chain(Some(clut))
        .chain(post_curves.iter().cloned());
    for stage in stages {
        if resampled.insert_stage(StageLoc::End, stage).is_err() {
            return false;
        }
    }

    // don't fix white on absolute colorimetric
    if intent == Intent::AbsoluteColorimetric {
        flags.insert(TransformFlags::NOWHITEONWHITEFIXUP);
    }
    if !flags.contains(TransformFlags::NOWHITEONWHITEFIXUP)
        && !fix_white_misalignment(&mut resampled, color_space, output_color_space)
    {
        debug!("white point could not be fixed");
    }

    let params = match resampled.stages().iter().find_map(Stage::clut) {
        Some(ClutTable::U16(params)) => params.clone(),
        _ => return false,
    };

    let curves_of = |stage: Option<Stage>| {
        stage
            .as_ref()
            .and_then(Stage::curves)
            .map_or_else(Vec::new, <[_]>::to_vec)
    };

    let eval: Box<dyn OptimizedEval> = if pre_curves.is_none() && post_curves.is_none() {
        Box::new(ClutEval(params))
    } else {
        Box::new(Prelin16::new(
            curves_of(pre_curves),
            params,
            curves_of(post_curves),
        ))
    };
    resampled.set_optimization(eval);

    *pipeline = resampled;
    true
}
