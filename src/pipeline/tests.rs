use super::*;
use crate::interp::InterpParams;

fn scale(factor: f64) -> Stage {
    Stage::new_matrix(
        3,
        vec![factor, 0., 0., 0., factor, 0., 0., 0., factor],
        None,
    )
    .unwrap()
}

#[derive(Debug)]
struct Constant(u16);

impl OptimizedEval for Constant {
    fn eval_16(&self, _: &[u16], output: &mut [u16]) {
        output.iter_mut().for_each(|v| *v = self.0);
    }

    fn duplicate(&self) -> Box<dyn OptimizedEval> {
        Box::new(Constant(self.0))
    }
}

#[test]
fn empty_pipeline_copies() {
    let pipeline = Pipeline::new(3, 3);
    let mut out = [0.; 3];
    pipeline.eval_float(&[0.1, 0.2, 0.3], &mut out);
    assert_eq!(out, [0.1, 0.2, 0.3]);

    let mut out16 = [0; 3];
    pipeline.eval_16(&[1, 0x8000, 0xffff], &mut out16);
    assert_eq!(out16, [1, 0x8000, 0xffff]);
}

#[test]
fn insert_keeps_channels_consistent() {
    let mut pipeline = Pipeline::new(4, 4);
    pipeline
        .insert_stage(StageLoc::End, Stage::new_xyz_to_lab())
        .unwrap();
    assert_eq!((pipeline.input_channels(), pipeline.output_channels()), (3, 3));

    // 4 -> 3 in front
    let to_three = Stage::new_matrix(3, vec![1.; 12], None).unwrap();
    pipeline.insert_stage(StageLoc::Begin, to_three).unwrap();
    assert_eq!((pipeline.input_channels(), pipeline.output_channels()), (4, 3));

    let before = pipeline.clone();
    assert_eq!(
        pipeline.insert_stage(StageLoc::Begin, Stage::new_identity(3)),
        Err(PipelineError::ChannelMismatch(3, 4))
    );
    assert_eq!(
        pipeline.insert_stage(StageLoc::End, Stage::new_identity(4)),
        Err(PipelineError::ChannelMismatch(3, 4))
    );
    assert_eq!(pipeline, before);

    assert_eq!(
        pipeline.insert_stage(StageLoc::End, Stage::new_identity(200)),
        Err(PipelineError::TooManyChannels(200))
    );
}

#[test]
fn unlink_updates_channels() {
    let mut pipeline = Pipeline::from_stages(vec![
        Stage::new_matrix(3, vec![1.; 6], None).unwrap(),
        Stage::new_clip_negatives(3),
    ])
    .unwrap();
    assert_eq!(pipeline.input_channels(), 2);

    let first = pipeline.unlink_stage(StageLoc::Begin).unwrap();
    assert_eq!(first.stage_type(), StageType::Matrix);
    assert_eq!(pipeline.input_channels(), 3);

    let last = pipeline.unlink_stage(StageLoc::End).unwrap();
    assert_eq!(last.stage_type(), StageType::ClipNegatives);
    assert!(pipeline.is_empty());
    assert!(pipeline.unlink_stage(StageLoc::End).is_none());
}

#[test]
fn concat_pipelines() {
    let mut a = Pipeline::from_stages(vec![scale(0.5)]).unwrap();
    let b = Pipeline::from_stages(vec![scale(0.5), Stage::new_clip_negatives(3)]).unwrap();
    a.concat(&b).unwrap();
    assert_eq!(a.stages().len(), 3);
    // b is still intact
    assert_eq!(b.stages().len(), 2);

    let mut out = [0.; 3];
    a.eval_float(&[1., -1., 0.5], &mut out);
    assert_eq!(out, [0.25, 0., 0.125]);

    let one = Pipeline::from_stages(vec![Stage::new_identity(1)]).unwrap();
    let before = a.clone();
    assert_eq!(a.concat(&one), Err(PipelineError::ChannelMismatch(3, 1)));
    assert_eq!(a, before);

    // two empty pipelines: the channel counts are inherited
    let mut empty = Pipeline::new(3, 3);
    empty.concat(&Pipeline::new(4, 4)).unwrap();
    assert_eq!(empty.input_channels(), 4);

    // an empty pipeline takes any stages
    let mut empty = Pipeline::new(3, 3);
    empty.concat(&one).unwrap();
    assert_eq!(empty.output_channels(), 1);
}

#[test]
fn evaluator_is_reset_by_mutation() {
    let mut pipeline = Pipeline::from_stages(vec![scale(1.)]).unwrap();
    pipeline.set_optimization(Box::new(Constant(7)));

    let mut out = [0; 3];
    pipeline.eval_16(&[1, 2, 3], &mut out);
    assert_eq!(out, [7; 3]);

    // the float path ignores specializations
    let mut out_float = [0.; 3];
    pipeline.eval_float(&[0.5; 3], &mut out_float);
    assert_eq!(out_float, [0.5; 3]);

    // clones carry a copy of the evaluator
    let copy = pipeline.clone();
    assert!(copy.optimization().is_some());

    pipeline.insert_stage(StageLoc::End, scale(1.)).unwrap();
    assert!(pipeline.optimization().is_none());
    pipeline.eval_16(&[1, 2, 3], &mut out);
    assert_eq!(out, [1, 2, 3]);
}

#[test]
fn match_exact_sequence() {
    let pipeline = Pipeline::from_stages(vec![
        Stage::new_ident_curve_set(3).unwrap(),
        scale(2.),
        Stage::new_ident_curve_set(3).unwrap(),
    ])
    .unwrap();

    let types = [StageType::CurveSet, StageType::Matrix, StageType::CurveSet];
    let stages = pipeline.match_stages(&types).unwrap();
    assert_eq!(stages.len(), 3);
    assert!(stages[1].matrix().is_some());

    assert!(pipeline
        .match_stages(&[StageType::CurveSet, StageType::Matrix])
        .is_none());
    assert!(pipeline
        .match_stages(&[StageType::CurveSet, StageType::CLut, StageType::CurveSet])
        .is_none());
}

#[test]
fn clut_pipeline_eval() {
    let mut stage = Stage::new_clut_16(2, 3, 3, None).unwrap();
    stage
        .sample_clut_16(
            |input, output| {
                output.copy_from_slice(input);
                true
            },
            false,
        )
        .unwrap();
    let pipeline = Pipeline::from_stages(vec![stage]).unwrap();

    let mut out = [0.; 3];
    pipeline.eval_float(&[0.25, 0.5, 0.75], &mut out);
    for (a, b) in out.iter().zip(&[0.25, 0.5, 0.75]) {
        assert!((a - b).abs() < 1e-4);
    }
}

#[test]
fn wide_clut_is_rejected() {
    assert_eq!(
        Stage::new_clut_16(2, 3, 200, None).unwrap_err(),
        PipelineError::InvalidClut(3, 200)
    );
    assert!(Stage::new_clut_float_granular(&[2, 2], 130, None).is_err());

    // the same shape cannot be smuggled in through a kernel either
    assert!(InterpParams::<u16>::new(&[2; 3], 200, vec![0; 8 * 200], false).is_err());
}

#[test]
fn reverse_identity() {
    let pipeline = Pipeline::new(3, 3);
    let target = [0.2, 0.5, 0.8];
    let result = pipeline
        .eval_reverse_float(&target, Some(&[0.4; 3]))
        .unwrap();
    for (a, b) in result.iter().zip(&target) {
        assert!((a - b).abs() < 1e-3);
    }
}

#[test]
fn reverse_identity_without_hint() {
    let pipeline = Pipeline::from_stages(vec![Stage::new_identity(3)]).unwrap();
    let result = pipeline.eval_reverse_float(&[0.4; 3], None).unwrap();
    for v in &result[..3] {
        assert!((v - 0.4).abs() < 1e-3, "{:?}", result);
    }
    assert_eq!(result[3], 0.);
}

#[test]
fn reverse_with_fixed_black() {
    // c, m, y and a bit of k
    let mut matrix = vec![0.; 12];
    for i in 0..3 {
        matrix[i * 4 + i] = 1.;
        matrix[i * 4 + 3] = 0.1;
    }
    let pipeline = Pipeline::from_stages(vec![Stage::new_matrix(3, matrix, None).unwrap()]).unwrap();

    let result = pipeline
        .eval_reverse_float(&[0.3, 0.4, 0.5, 0.5], None)
        .unwrap();
    assert_eq!(result[3], 0.5);
    for (a, b) in result.iter().zip(&[0.25, 0.35, 0.45]) {
        assert!((a - b).abs() < 1e-3);
    }
}

#[test]
fn reverse_stays_in_range() {
    // nothing maps to 2, the closest input is 1
    let pipeline = Pipeline::new(3, 3);
    let result = pipeline.eval_reverse_float(&[2., 0.5, 0.5], None).unwrap();
    assert!((result[0] - 1.).abs() < 1e-6);
    assert!((result[1] - 0.5).abs() < 1e-3);

    let gray = Pipeline::from_stages(vec![Stage::new_identity(1)]).unwrap();
    assert_eq!(
        gray.eval_reverse_float(&[0.5], None),
        Err(PipelineError::NotReversible(1, 1))
    );
}
