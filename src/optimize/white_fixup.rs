//! Making white map exactly onto white after resampling.

use crate::pcs::end_points_by_space;
use crate::pipeline::{ClutTable, Pipeline, StageKernel, StageType, MAX_STAGE_CHANNELS};
use crate::types::ColorSpace;
use tracing::trace;

/// Channels this far apart are considered wildly different and not patched.
const WHITE_TOLERANCE: i32 = 0xf000;

/// Returns true if there is nothing to fix: either the whites are identical or too different to
/// be a rounding problem.
fn whites_are_equal(white1: &[u16], white2: &[u16]) -> bool {
    for (a, b) in white1.iter().zip(white2) {
        // too distant, probably intentional
        if (*a as i32 - *b as i32).abs() > WHITE_TOLERANCE {
            return true;
        }
        if a != b {
            return false;
        }
    }
    true
}

/// Overwrites the CLUT node at the given 16-bit input with the given output.
///
/// Returns false if the input does not fall exactly on a node.
fn patch_clut(kernel: &mut StageKernel, at: &[u16], value: &[u16]) -> bool {
    let params = match kernel {
        StageKernel::CLut(ClutTable::U16(params)) => params,
        _ => return false,
    };

    let n_in = params.n_inputs();
    let n_out = params.n_outputs();
    if at.len() < n_in || value.len() < n_out {
        return false;
    }

    let mut node = [0; MAX_STAGE_CHANNELS];
    for (i, v) in at[..n_in].iter().enumerate() {
        let px = *v as f64 * params.domain()[i] as f64 / 65535.;
        if px.fract() != 0. {
            trace!("white is not on a grid node");
            return false;
        }
        node[i] = px as usize;
    }

    let offset = match params.node_offset(&node[..n_in]) {
        Some(offset) => offset,
        None => return false,
    };

    params.table_mut()[offset..offset + n_out].copy_from_slice(&value[..n_out]);
    true
}

/// Patches the CLUT of a resampled pipeline so the white of the entry space maps exactly onto
/// the white of the exit space.
///
/// Returns false if the pipeline does not have a layout that can be patched.
pub(super) fn fix_white_misalignment(
    pipeline: &mut Pipeline,
    entry: ColorSpace,
    exit: ColorSpace,
) -> bool {
    let (white_in, white_out) = match (end_points_by_space(entry), end_points_by_space(exit)) {
        (Some((white_in, _)), Some((white_out, _))) => (white_in, white_out),
        _ => return false,
    };

    // only when they match the pipeline
    if pipeline.input_channels() != white_in.len() || pipeline.output_channels() != white_out.len()
    {
        return false;
    }

    let mut obtained = [0; MAX_STAGE_CHANNELS];
    pipeline.eval_16(white_in, &mut obtained);
    if whites_are_equal(white_out, &obtained[..white_out.len()]) {
        return true;
    }

    let types: Vec<_> = pipeline.stages().iter().map(|s| s.stage_type()).collect();
    let (pre, clut, post) = match types.as_slice() {
        [StageType::CurveSet, StageType::CLut, StageType::CurveSet] => (Some(0), 1, Some(2)),
        [StageType::CurveSet, StageType::CLut] => (Some(0), 1, None),
        [StageType::CLut, StageType::CurveSet] => (None, 0, Some(1)),
        [StageType::CLut] => (None, 0, None),
        _ => return false,
    };

    // where white lands after the pre-curves
    let mut at = [0; MAX_STAGE_CHANNELS];
    at[..white_in.len()].copy_from_slice(white_in);
    if let Some(curves) = pre.and_then(|i| pipeline.stages()[i].curves()) {
        for (v, curve) in at.iter_mut().zip(curves) {
            *v = curve.eval_16(*v);
        }
    }

    // what the CLUT must output so the post-curves produce white
    let mut value = [0; MAX_STAGE_CHANNELS];
    value[..white_out.len()].copy_from_slice(white_out);
    if let Some(curves) = post.and_then(|i| pipeline.stages()[i].curves()) {
        for (v, curve) in value.iter_mut().zip(curves) {
            if let Ok(inverse) = curve.reversed() {
                *v = inverse.eval_16(*v);
            }
        }
    }

    let patched = patch_clut(
        pipeline.stages_mut()[clut].kernel_mut(),
        &at[..white_in.len()],
        &value[..white_out.len()],
    );
    if !patched {
        trace!("white could not be patched into the CLUT");
    }
    true
}
