//! Lossless simplifications.

use crate::pipeline::{Pipeline, Stage, StageLoc, StageType};
use crate::util::{mat3_from_rows, mat3_is_identity};
use cgmath::Matrix3;
use std::iter;
use tracing::trace;

/// Stage pairs that undo each other, by the type they implement.
const RECIPROCAL_PAIRS: [(StageType, StageType); 6] = [
    (StageType::Xyz2Lab, StageType::Lab2Xyz),
    (StageType::Lab2Xyz, StageType::Xyz2Lab),
    (StageType::LabV4toV2, StageType::LabV2toV4),
    (StageType::LabV2toV4, StageType::LabV4toV2),
    (StageType::Lab2FloatPCS, StageType::FloatPCS2Lab),
    (StageType::XYZ2FloatPCS, StageType::FloatPCS2XYZ),
];

fn remove_identities(stages: &mut Vec<Stage>) -> bool {
    let count = stages.len();
    stages.retain(|stage| {
        stage.stage_type() != StageType::Identity && stage.implements() != StageType::Identity
    });
    stages.len() != count
}

fn remove_pairs(stages: &mut Vec<Stage>, first: StageType, second: StageType) -> bool {
    let mut any = false;
    let mut i = 0;
    while i + 1 < stages.len() {
        if stages[i].implements() == first && stages[i + 1].implements() == second {
            stages.drain(i..i + 2);
            any = true;
        } else {
            i += 1;
        }
    }
    any
}

fn is_nonzero(offset: Option<&[f64]>) -> bool {
    offset.map_or(false, |offset| offset.iter().any(|v| *v != 0.))
}

/// Multiplies two adjacent 3×3 matrix stages. The first one must not have an offset; the
/// offset of the second one is kept.
fn fuse_matrices(first: &Stage, second: &Stage) -> Option<(Matrix3<f64>, Option<Vec<f64>>)> {
    for stage in [first, second] {
        if stage.implements() != StageType::Matrix
            || stage.input_channels() != 3
            || stage.output_channels() != 3
        {
            return None;
        }
    }

    let (m1, offset1) = first.matrix()?;
    let (m2, offset2) = second.matrix()?;
    if is_nonzero(offset1) {
        return None;
    }

    let product = mat3_from_rows(m2) * mat3_from_rows(m1);
    Some((product, offset2.map(<[f64]>::to_vec)))
}

fn multiply_matrices(stages: &mut Vec<Stage>) -> bool {
    let mut any = false;
    let mut i = 0;
    while i + 1 < stages.len() {
        let (product, offset) = match fuse_matrices(&stages[i], &stages[i + 1]) {
            Some(fused) => fused,
            None => {
                i += 1;
                continue;
            }
        };
        any = true;

        if mat3_is_identity(product, 1e-5) && !is_nonzero(offset.as_deref()) {
            stages.drain(i..i + 2);
        } else {
            let offset = offset.map(|o| cgmath::Vector3::new(o[0], o[1], o[2]));
            let fused = Stage::new_matrix3(product, offset);
            stages.splice(i..i + 2, iter::once(fused));
        }
    }
    any
}

/// Removes identities and stages that cancel out, and multiplies adjacent matrices, until
/// nothing changes. Returns true if anything was removed.
///
/// This does not change the function of the pipeline beyond floating-point rounding.
pub fn pre_optimize(pipeline: &mut Pipeline) -> bool {
    let mut stages = pipeline.stages().to_vec();
    let mut any = false;

    loop {
        let mut changed = remove_identities(&mut stages);
        for (first, second) in RECIPROCAL_PAIRS {
            changed |= remove_pairs(&mut stages, first, second);
        }
        changed |= multiply_matrices(&mut stages);

        if !changed {
            break;
        }
        any = true;
    }

    if !any {
        return false;
    }

    let mut simplified = Pipeline::new(pipeline.input_channels(), pipeline.output_channels());
    for stage in stages {
        if let Err(err) = simplified.insert_stage(StageLoc::End, stage) {
            trace!("simplified pipeline is inconsistent: {}", err);
            return false;
        }
    }
    *pipeline = simplified;
    true
}
