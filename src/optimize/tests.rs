use super::*;
use crate::fixed::{from_16_to_8, from_8_to_16};
use crate::format::{TYPE_RGB_16, TYPE_RGB_8, TYPE_RGB_FLT};
use crate::named::NamedColorList;
use crate::pipeline::StageType;
use crate::tone_curve::ToneCurve;

fn gamma_curves(gamma: f64) -> Stage {
    Stage::new_curve_set(vec![ToneCurve::new_gamma(gamma).unwrap(); 3])
}

fn matrix(m: [f64; 9]) -> Stage {
    Stage::new_matrix(3, m.to_vec(), None).unwrap()
}

const MIXING: [f64; 9] = [0.6, 0.3, 0.1, 0.2, 0.7, 0.1, 0.1, 0.1, 0.8];

fn optimize(pipeline: &mut Pipeline, format_in: PixelFormat, format_out: PixelFormat) -> bool {
    let mut flags = TransformFlags::empty();
    optimize_pipeline(
        pipeline,
        Intent::Perceptual,
        format_in,
        format_out,
        &mut flags,
    )
}

/// Largest channel difference between the optimized and the float evaluation.
fn max_error_16(optimized: &Pipeline, reference: &Pipeline, inputs: &[[u16; 3]]) -> i32 {
    let mut max = 0;
    for input in inputs {
        let mut a = [0; 3];
        let mut b = [0; 3];
        optimized.eval_16(input, &mut a);
        reference.eval_16(input, &mut b);
        for (a, b) in a.iter().zip(&b) {
            max = max.max((*a as i32 - *b as i32).abs());
        }
    }
    max
}

fn rgb8_inputs(from: u8) -> Vec<[u16; 3]> {
    let mut inputs = Vec::new();
    for r in (from..=255).step_by(17) {
        for g in (from..=255).step_by(23) {
            for b in (from..=255).step_by(31) {
                inputs.push([from_8_to_16(r), from_8_to_16(g), from_8_to_16(b)]);
            }
        }
    }
    inputs
}

#[test]
fn linear_curves_pass_through() {
    let mut pipeline =
        Pipeline::from_stages(vec![gamma_curves(1.), gamma_curves(1.)]).unwrap();
    assert!(optimize(&mut pipeline, TYPE_RGB_16, TYPE_RGB_16));

    assert_eq!(pipeline.stages().len(), 1);
    assert_eq!(pipeline.stages()[0].implements(), StageType::Identity);
    assert!(pipeline.optimization().is_some());

    let mut out = [0; 3];
    pipeline.eval_16(&[0x0102, 0x7fff, 0xfffe], &mut out);
    assert_eq!(out, [0x0102, 0x7fff, 0xfffe]);
}

#[test]
fn joined_curves() {
    let mut pipeline = Pipeline::from_stages(vec![gamma_curves(2.2), gamma_curves(1.2)]).unwrap();
    let reference = pipeline.clone();

    assert!(optimize(&mut pipeline, TYPE_RGB_16, TYPE_RGB_16));
    assert_eq!(pipeline.stages().len(), 1);
    assert_eq!(pipeline.stages()[0].stage_type(), StageType::CurveSet);

    let inputs: Vec<_> = (0..=0xffff)
        .step_by(0x111)
        .map(|v| [v as u16, (0xffff - v) as u16, v as u16 / 2])
        .collect();
    assert!(max_error_16(&pipeline, &reference, &inputs) <= 4);
}

#[test]
fn identity_matrix_shaper_becomes_curves() {
    let mut pipeline = Pipeline::from_stages(vec![
        gamma_curves(2.2),
        matrix([1., 0., 0., 0., 1., 0., 0., 0., 1.]),
        gamma_curves(1. / 2.2),
    ])
    .unwrap();

    assert!(optimize(&mut pipeline, TYPE_RGB_8, TYPE_RGB_8));
    assert!(pipeline
        .stages()
        .iter()
        .all(|stage| stage.stage_type() == StageType::CurveSet));

    let mut joined =
        Pipeline::from_stages(vec![gamma_curves(2.2), gamma_curves(1. / 2.2)]).unwrap();
    assert!(optimize(&mut joined, TYPE_RGB_8, TYPE_RGB_8));

    for v in (0..=255).step_by(5) {
        let input = [from_8_to_16(v); 3];
        let mut out = [0; 3];
        let mut expected = [0; 3];
        pipeline.eval_16(&input, &mut out);
        joined.eval_16(&input, &mut expected);
        assert_eq!(out, expected);
        for channel in &out {
            assert_eq!(from_16_to_8(*channel), v);
        }
    }
}

#[test]
fn matrix_shaper() {
    let mut pipeline = Pipeline::from_stages(vec![
        gamma_curves(2.2),
        matrix(MIXING),
        gamma_curves(1. / 2.2),
    ])
    .unwrap();
    let reference = pipeline.clone();

    assert!(optimize(&mut pipeline, TYPE_RGB_8, TYPE_RGB_8));
    assert_eq!(pipeline.stages().len(), 3);
    assert!(pipeline.optimization().is_some());

    // 1.14 resolution is too coarse for the darkest values
    for input in rgb8_inputs(32) {
        let mut a = [0; 3];
        let mut b = [0; 3];
        pipeline.eval_16(&input, &mut a);
        reference.eval_16(&input, &mut b);
        for (a, b) in a.iter().zip(&b) {
            let a = from_16_to_8(*a) as i32;
            let b = from_16_to_8(*b) as i32;
            assert!((a - b).abs() <= 1, "{:?}: {} != {}", input, a, b);
        }
    }
}

#[test]
fn matrix_shaper_needs_8_bit_input() {
    let mut pipeline = Pipeline::from_stages(vec![
        gamma_curves(2.2),
        matrix(MIXING),
        gamma_curves(1. / 2.2),
    ])
    .unwrap();

    // falls through to resampling
    assert!(optimize(&mut pipeline, TYPE_RGB_16, TYPE_RGB_16));
    assert_eq!(pipeline.stages().len(), 1);
    assert_eq!(pipeline.stages()[0].stage_type(), StageType::CLut);
}

#[test]
fn prelinearization() {
    let mut pipeline = Pipeline::from_stages(vec![gamma_curves(2.2), matrix(MIXING)]).unwrap();
    let reference = pipeline.clone();

    assert!(optimize(&mut pipeline, TYPE_RGB_8, TYPE_RGB_8));
    let types: Vec<_> = pipeline.stages().iter().map(Stage::stage_type).collect();
    assert_eq!(types, [StageType::CurveSet, StageType::CLut]);
    assert!(pipeline.optimization().is_some());

    assert!(max_error_16(&pipeline, &reference, &rgb8_inputs(0)) <= 0x100);

    let mut out = [0; 3];
    pipeline.eval_16(&[0xffff; 3], &mut out);
    assert_eq!(out, [0xffff; 3]);
}

#[test]
fn prelinearization_16_bit_on_request() {
    let mut pipeline = Pipeline::from_stages(vec![gamma_curves(2.2), matrix(MIXING)]).unwrap();
    let reference = pipeline.clone();

    let mut flags = TransformFlags::CLUT_PRE_LINEARIZATION;
    assert!(optimize_pipeline(
        &mut pipeline,
        Intent::Perceptual,
        TYPE_RGB_16,
        TYPE_RGB_16,
        &mut flags,
    ));
    let types: Vec<_> = pipeline.stages().iter().map(Stage::stage_type).collect();
    assert_eq!(types, [StageType::CurveSet, StageType::CLut]);

    let inputs: Vec<_> = (0..=0xffff)
        .step_by(0x0fff)
        .map(|v| [v as u16, 0x4000, (0xffff - v) as u16])
        .collect();
    assert!(max_error_16(&pipeline, &reference, &inputs) <= 0x100);
}

#[test]
fn resampling() {
    let mut pipeline = Pipeline::from_stages(vec![matrix(MIXING)]).unwrap();
    let reference = pipeline.clone();

    assert!(optimize(&mut pipeline, TYPE_RGB_16, TYPE_RGB_16));
    assert_eq!(pipeline.stages().len(), 1);
    let clut = pipeline.stages()[0].clut().unwrap();
    assert_eq!(clut.n_samples(), &[33, 33, 33]);

    let inputs: Vec<_> = (0..=0xffff)
        .step_by(0x0777)
        .map(|v| [v as u16, (v / 3) as u16, (0xffff - v) as u16])
        .collect();
    assert!(max_error_16(&pipeline, &reference, &inputs) <= 2);
}

#[test]
fn resampling_keeps_curves_on_request() {
    let mut pipeline = Pipeline::from_stages(vec![
        gamma_curves(2.2),
        matrix(MIXING),
        gamma_curves(1. / 2.2),
    ])
    .unwrap();
    let reference = pipeline.clone();

    let mut flags = TransformFlags::FORCE_CLUT
        | TransformFlags::CLUT_PRE_LINEARIZATION
        | TransformFlags::CLUT_POST_LINEARIZATION;
    assert!(optimize_pipeline(
        &mut pipeline,
        Intent::Perceptual,
        TYPE_RGB_16,
        TYPE_RGB_16,
        &mut flags,
    ));
    let types: Vec<_> = pipeline.stages().iter().map(Stage::stage_type).collect();
    assert_eq!(
        types,
        [StageType::CurveSet, StageType::CLut, StageType::CurveSet]
    );

    let inputs: Vec<_> = (0x1000..=0xffff)
        .step_by(0x0fff)
        .map(|v| [v as u16, 0x8000, (0x10fff - v) as u16])
        .collect();
    assert!(max_error_16(&pipeline, &reference, &inputs) <= 0x100);
}

#[test]
fn forced_clut_on_empty_pipeline() {
    let mut pipeline = Pipeline::new(3, 3);
    let mut flags = TransformFlags::FORCE_CLUT;
    assert!(optimize_pipeline(
        &mut pipeline,
        Intent::Perceptual,
        TYPE_RGB_16,
        TYPE_RGB_16,
        &mut flags,
    ));

    let clut = pipeline.stages()[0].clut().unwrap();
    assert_eq!(clut.n_samples(), &[2, 2, 2]);

    let mut out = [0; 3];
    pipeline.eval_16(&[0x1234, 0x8000, 0xfedc], &mut out);
    for (a, b) in out.iter().zip(&[0x1234, 0x8000, 0xfedc]) {
        assert!((*a as i32 - *b as i32).abs() <= 1);
    }
}

#[test]
fn white_is_fixed_unless_absolute() {
    let slightly_dark = matrix([0.999, 0., 0., 0., 0.999, 0., 0., 0., 0.999]);

    let mut pipeline = Pipeline::from_stages(vec![slightly_dark.clone()]).unwrap();
    assert!(optimize(&mut pipeline, TYPE_RGB_16, TYPE_RGB_16));
    let mut out = [0; 3];
    pipeline.eval_16(&[0xffff; 3], &mut out);
    assert_eq!(out, [0xffff; 3]);

    let mut pipeline = Pipeline::from_stages(vec![slightly_dark]).unwrap();
    let mut flags = TransformFlags::empty();
    assert!(optimize_pipeline(
        &mut pipeline,
        Intent::AbsoluteColorimetric,
        TYPE_RGB_16,
        TYPE_RGB_16,
        &mut flags,
    ));
    assert!(flags.contains(TransformFlags::NOWHITEONWHITEFIXUP));
    pipeline.eval_16(&[0xffff; 3], &mut out);
    assert_eq!(out, [0xffbd; 3]);
}

#[test]
fn named_colors_are_not_optimized() {
    let mut list = NamedColorList::new(3, "", "").unwrap();
    list.push("red", [0xffff, 0, 0], &[0xffff, 0, 0]);
    let mut pipeline = Pipeline::from_stages(vec![
        Stage::new_identity(1),
        Stage::new_named(list, false),
    ])
    .unwrap();
    let before = pipeline.clone();

    assert!(!optimize(&mut pipeline, TYPE_RGB_16, TYPE_RGB_16));
    assert_eq!(pipeline, before);
    assert!(pipeline.optimization().is_none());
}

#[test]
fn float_formats_are_only_simplified() {
    let mut pipeline = Pipeline::from_stages(vec![gamma_curves(2.2), matrix(MIXING)]).unwrap();
    let before = pipeline.clone();
    assert!(!optimize(&mut pipeline, TYPE_RGB_FLT, TYPE_RGB_FLT));
    assert_eq!(pipeline, before);

    let mut pipeline = Pipeline::from_stages(vec![
        Stage::new_identity(3),
        gamma_curves(2.2),
        matrix(MIXING),
    ])
    .unwrap();
    assert!(optimize(&mut pipeline, TYPE_RGB_16, TYPE_RGB_FLT));
    assert_eq!(pipeline, before);
    assert!(pipeline.optimization().is_none());
}

#[test]
fn no_optimize_keeps_stages() {
    let mut pipeline = Pipeline::from_stages(vec![
        gamma_curves(2.2),
        Stage::new_identity(3),
        matrix(MIXING),
    ])
    .unwrap();

    let mut flags = TransformFlags::NOOPTIMIZE;
    // the identity is still removed
    assert!(optimize_pipeline(
        &mut pipeline,
        Intent::Perceptual,
        TYPE_RGB_8,
        TYPE_RGB_8,
        &mut flags,
    ));
    assert_eq!(pipeline.stages().len(), 2);
    assert!(pipeline.optimization().is_none());

    assert!(!optimize_pipeline(
        &mut pipeline,
        Intent::Perceptual,
        TYPE_RGB_8,
        TYPE_RGB_8,
        &mut flags,
    ));
}

#[test]
fn optimized_pipelines_clone_their_evaluator() {
    let mut pipeline = Pipeline::from_stages(vec![matrix(MIXING)]).unwrap();
    assert!(optimize(&mut pipeline, TYPE_RGB_16, TYPE_RGB_16));

    let copy = pipeline.clone();
    assert!(copy.optimization().is_some());

    let mut a = [0; 3];
    let mut b = [0; 3];
    pipeline.eval_16(&[0x1000, 0x2000, 0x3000], &mut a);
    copy.eval_16(&[0x1000, 0x2000, 0x3000], &mut b);
    assert_eq!(a, b);
}
