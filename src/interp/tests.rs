use super::*;

/// Builds a uniform grid table; the last coordinate varies fastest.
fn grid_table<T>(points: usize, inputs: usize, f: impl Fn(&[usize]) -> Vec<T>) -> Vec<T> {
    let nodes = points.pow(inputs as u32);
    let mut table = Vec::new();
    let mut coords = vec![0; inputs];
    for index in 0..nodes {
        let mut rest = index;
        for c in coords.iter_mut().rev() {
            *c = rest % points;
            rest /= points;
        }
        table.extend(f(&coords));
    }
    table
}

fn identity_cube_16(points: usize) -> Vec<u16> {
    grid_table(points, 3, |c| {
        c.iter()
            .map(|&x| crate::fixed::quantize_val(x as f64, points))
            .collect()
    })
}

#[test]
fn strides_count_from_last_input() {
    let params = InterpParams::<u16>::new(&[3, 4, 5], 2, vec![0; 120], false).unwrap();
    assert_eq!(params.stride(), &[2, 10, 40]);
    assert_eq!(params.domain(), &[2, 3, 4]);
    assert_eq!(params.node_offset(&[1, 2, 3]), Some(40 + 20 + 6));
    assert_eq!(params.node_offset(&[3, 0, 0]), None);
}

#[test]
fn rejects_bad_shapes() {
    assert_eq!(
        InterpParams::<u16>::new(&[2; 16], 1, vec![0; 1 << 16], false).unwrap_err(),
        InterpError::TooManyInputs(16)
    );
    assert_eq!(
        InterpParams::<f32>::new(&[2; 4], 128, vec![0.; 16 * 128], false).unwrap_err(),
        InterpError::Unsupported(4, 128)
    );
    assert_eq!(
        InterpParams::<u16>::new(&[2, 2], 1, vec![0; 3], false).unwrap_err(),
        InterpError::TableSize(3, 4)
    );
    assert_eq!(
        InterpParams::<u16>::new(&[2, 1], 1, vec![0; 2], false).unwrap_err(),
        InterpError::InvalidGrid(1, 1)
    );
    assert_eq!(
        InterpParams::<u16>::new(&[], 1, vec![], false).unwrap_err(),
        InterpError::Empty
    );

    // no more outputs than a stage can carry, whatever the number of inputs
    assert_eq!(
        InterpParams::<u16>::new(&[2; 3], 200, vec![0; 8 * 200], false).unwrap_err(),
        InterpError::Unsupported(3, 200)
    );
    assert_eq!(
        InterpParams::<f32>::new(&[2], 128, vec![0.; 2 * 128], false).unwrap_err(),
        InterpError::Unsupported(1, 128)
    );
    assert!(InterpParams::<u16>::new(&[2; 3], 127, vec![0; 8 * 127], false).is_ok());
}

#[test]
fn lerp_1d_16() {
    let params = InterpParams::<u16>::new(&[3], 1, vec![0, 0x1000, 0xffff], false).unwrap();
    let mut out = [0];

    params.eval(&[0], &mut out);
    assert_eq!(out[0], 0);
    params.eval(&[0xffff], &mut out);
    assert_eq!(out[0], 0xffff);

    // the middle node
    params.eval(&[0x8000], &mut out);
    assert!((out[0] as i32 - 0x1000).abs() <= 1);

    // halfway into the first segment
    params.eval(&[0x4000], &mut out);
    assert!((out[0] as i32 - 0x800).abs() <= 1);
}

#[test]
fn single_node_lookup() {
    let params = InterpParams::<u16>::new(&[1], 2, vec![1234, 4321], false).unwrap();
    let mut out = [0; 2];
    params.eval(&[0x5555], &mut out);
    assert_eq!(out, [1234, 4321]);

    let params = InterpParams::<f32>::new(&[1], 1, vec![0.25], false).unwrap();
    let mut out = [0.];
    params.eval(&[0.7], &mut out);
    assert_eq!(out[0], 0.25);
}

#[test]
fn float_inputs_are_clamped() {
    let params = InterpParams::<f32>::new(&[2], 1, vec![0.2, 0.6], false).unwrap();
    let mut out = [0.];

    params.eval(&[-0.5], &mut out);
    assert_eq!(out[0], 0.2);
    params.eval(&[f32::NAN], &mut out);
    assert_eq!(out[0], 0.2);
    params.eval(&[2.], &mut out);
    assert_eq!(out[0], 0.6);
    params.eval(&[0.5], &mut out);
    assert!((out[0] - 0.4).abs() < 1e-6);
}

#[test]
fn one_input_many_outputs() {
    let params = InterpParams::<u16>::new(&[2], 3, vec![0, 0xffff, 100, 0xffff, 0, 100], false)
        .unwrap();
    let mut out = [0; 3];
    params.eval(&[0x8000], &mut out);
    assert!((out[0] as i32 - 0x8000).abs() <= 1);
    assert!((out[1] as i32 - 0x7fff).abs() <= 1);
    assert_eq!(out[2], 100);

    params.eval(&[0xffff], &mut out);
    assert_eq!(out, [0xffff, 0, 100]);
}

#[test]
fn bilinear_16() {
    // f(x, y) = (x, y) on a 3x3 grid
    let table = grid_table(3, 2, |c| {
        c.iter()
            .map(|&x| crate::fixed::quantize_val(x as f64, 3))
            .collect::<Vec<u16>>()
    });
    let params = InterpParams::<u16>::new(&[3, 3], 2, table, false).unwrap();

    let mut out = [0; 2];
    for &(x, y) in &[(0, 0), (0xffff, 0xffff), (0x1234, 0xfedc), (0x8000, 0x4000)] {
        params.eval(&[x, y], &mut out);
        assert!((out[0] as i32 - x as i32).abs() <= 1, "{:?}", out);
        assert!((out[1] as i32 - y as i32).abs() <= 1, "{:?}", out);
    }
}

#[test]
fn tetrahedral_and_trilinear_16_reproduce_identity() {
    for &trilinear in &[false, true] {
        let params =
            InterpParams::<u16>::new(&[17, 17, 17], 3, identity_cube_16(17), trilinear).unwrap();

        let mut out = [0; 3];
        for &input in &[
            [0, 0, 0],
            [0xffff, 0xffff, 0xffff],
            [0x1000, 0x8000, 0xf000],
            [0xf000, 0x0100, 0x8000],
            [0x7777, 0x7777, 0x1234],
        ] {
            params.eval(&input, &mut out);
            for c in 0..3 {
                assert!(
                    (out[c] as i32 - input[c] as i32).abs() <= 2,
                    "trilinear={} {:?} -> {:?}",
                    trilinear,
                    input,
                    out
                );
            }
        }
    }
}

#[test]
fn tetrahedral_float_is_continuous_across_orderings() {
    // something nonlinear so that the tetrahedra differ
    let table = grid_table(3, 3, |c| {
        let (x, y, z) = (c[0] as f32 / 2., c[1] as f32 / 2., c[2] as f32 / 2.);
        vec![x * y + z * z, (x - z).abs()]
    });
    let params = InterpParams::<f32>::new(&[3, 3, 3], 2, table, false).unwrap();

    let eval = |x: f32, y: f32, z: f32| {
        let mut out = [0.; 2];
        params.eval(&[x, y, z], &mut out);
        out
    };

    let eps = 1e-4;
    for &(a, b) in &[(0.2, 0.1), (0.3, 0.45), (0.7, 0.6), (0.1, 0.9)] {
        // on the x == y boundary, perturbing either coordinate selects a different tetrahedron
        let on = eval(a, a, b);
        let px = eval(a + eps, a, b);
        let py = eval(a, a + eps, b);
        for c in 0..2 {
            assert!((on[c] - px[c]).abs() < 1e-3, "{:?} {:?}", on, px);
            assert!((on[c] - py[c]).abs() < 1e-3, "{:?} {:?}", on, py);
        }
    }
}

#[test]
fn tetrahedral_float_hits_nodes() {
    let table = grid_table(3, 3, |c| vec![(c[0] * 9 + c[1] * 3 + c[2]) as f32 / 26.]);
    let params = InterpParams::<f32>::new(&[3, 3, 3], 1, table, false).unwrap();

    let mut out = [0.];
    params.eval(&[0.5, 1., 0.], &mut out);
    assert!((out[0] - 15. / 26.).abs() < 1e-6);
    params.eval(&[1., 1., 1.], &mut out);
    assert!((out[0] - 1.).abs() < 1e-6);
}

#[test]
fn four_inputs() {
    let table = grid_table(3, 4, |c| vec![c[0] as f32 / 2., c[3] as f32 / 2.]);
    let params = InterpParams::<f32>::new(&[3; 4], 2, table, false).unwrap();

    let mut out = [0.; 2];
    params.eval(&[0.3, 0.6, 0.2, 0.9], &mut out);
    assert!((out[0] - 0.3).abs() < 1e-5);
    assert!((out[1] - 0.9).abs() < 1e-5);

    let table = grid_table(3, 4, |c| {
        vec![
            crate::fixed::quantize_val(c[0] as f64, 3),
            crate::fixed::quantize_val(c[3] as f64, 3),
        ]
    });
    let params = InterpParams::<u16>::new(&[3; 4], 2, table, false).unwrap();

    let mut out = [0; 2];
    params.eval(&[0x4ccc, 0x9999, 0x3333, 0xe666], &mut out);
    assert!((out[0] as i32 - 0x4ccc).abs() <= 2, "{:?}", out);
    assert!((out[1] as i32 - 0xe666).abs() <= 2, "{:?}", out);

    params.eval(&[0xffff; 4], &mut out);
    assert_eq!(out, [0xffff, 0xffff]);
}

#[test]
fn four_inputs_blend_between_planes() {
    // rising and falling along the first input
    let node = |c: &[usize]| {
        [
            (c[0] * c[0]) as f64 / 8. + (c[1] + c[2] * c[3]) as f64 / 12.,
            1. - c[0] as f64 * 0.3 - (c[1] * c[3]) as f64 / 10.,
        ]
    };
    let plane = 27 * 2;

    let table = grid_table(3, 4, |c| {
        node(c)
            .iter()
            .map(|v| crate::fixed::quick_saturate_word(v * 65535.))
            .collect::<Vec<u16>>()
    });
    let first = InterpParams::<u16>::new(&[3; 3], 2, table[..plane].to_vec(), false).unwrap();
    let last = InterpParams::<u16>::new(&[3; 3], 2, table[2 * plane..].to_vec(), false).unwrap();
    let params = InterpParams::<u16>::new(&[3; 4], 2, table, false).unwrap();

    for rest in &[[0x1234, 0x8000, 0xfedc], [0, 0xffff, 0x4000], [0x9999, 0x3333, 0x7777]] {
        let (mut lo, mut hi, mut out) = ([0; 2], [0; 2], [0; 2]);
        first.eval(rest, &mut lo);
        last.eval(rest, &mut hi);

        params.eval(&[0, rest[0], rest[1], rest[2]], &mut out);
        assert_eq!(out, lo);
        params.eval(&[0xffff, rest[0], rest[1], rest[2]], &mut out);
        assert_eq!(out, hi);

        for &x in &[0x2000, 0x8000, 0xc000] {
            params.eval(&[x, rest[0], rest[1], rest[2]], &mut out);
            for c in 0..2 {
                assert!(out[c] >= lo[c].min(hi[c]) && out[c] <= lo[c].max(hi[c]), "{:?}", out);
            }
        }
    }

    let table = grid_table(3, 4, |c| node(c).iter().map(|v| *v as f32).collect::<Vec<f32>>());
    let first = InterpParams::<f32>::new(&[3; 3], 2, table[..plane].to_vec(), false).unwrap();
    let last = InterpParams::<f32>::new(&[3; 3], 2, table[2 * plane..].to_vec(), false).unwrap();
    let params = InterpParams::<f32>::new(&[3; 4], 2, table, false).unwrap();

    for rest in &[[0.1, 0.5, 0.95], [0., 1., 0.25], [0.6, 0.2, 0.45]] {
        let (mut lo, mut hi, mut out) = ([0.; 2], [0.; 2], [0.; 2]);
        first.eval(rest, &mut lo);
        last.eval(rest, &mut hi);

        params.eval(&[0., rest[0], rest[1], rest[2]], &mut out);
        assert_eq!(out, lo);
        params.eval(&[1., rest[0], rest[1], rest[2]], &mut out);
        assert_eq!(out, hi);

        for &x in &[0.125, 0.5, 0.75] {
            params.eval(&[x, rest[0], rest[1], rest[2]], &mut out);
            for c in 0..2 {
                assert!(out[c] >= lo[c].min(hi[c]) && out[c] <= lo[c].max(hi[c]), "{:?}", out);
            }
        }
    }
}

#[test]
fn float_and_16_bit_agree() {
    let table = grid_table(17, 3, |c| {
        let (x, y, z) = (c[0] as f64 / 16., c[1] as f64 / 16., c[2] as f64 / 16.);
        [0.5 * x + 0.3 * y * y + 0.2 * z, x * y * z, 1. - z * z]
            .iter()
            .map(|v| crate::fixed::quick_saturate_word(v * 65535.))
            .collect::<Vec<u16>>()
    });
    // same nodes in both representations
    let float_table = table.iter().map(|v| *v as f32 / 65535.).collect();
    let params = InterpParams::<u16>::new(&[17; 3], 3, table, false).unwrap();
    let float_params = InterpParams::<f32>::new(&[17; 3], 3, float_table, false).unwrap();

    let mut worst = 0f32;
    let (mut out, mut float_out) = ([0; 3], [0.; 3]);
    for r in (0..=0xffffu32).step_by(0x1111) {
        for g in (0..=0xffffu32).step_by(0x1111) {
            for b in (0..=0xffffu32).step_by(0x1111) {
                params.eval(&[r as u16, g as u16, b as u16], &mut out);
                float_params.eval(
                    &[r as f32 / 65535., g as f32 / 65535., b as f32 / 65535.],
                    &mut float_out,
                );
                for c in 0..3 {
                    worst = worst.max((float_out[c] * 65535. - out[c] as f32).abs());
                }
            }
        }
    }
    assert!(worst <= 1., "off by {}", worst);
}

/// Every grid node must come back unchanged from both representations.
fn check_nodes(points: usize, inputs: usize, outputs: usize) {
    let nodes = points.pow(inputs as u32);
    // small steps between neighbors, so that rounding near a node cannot move off it
    let table: Vec<u16> = (0..nodes * outputs)
        .map(|i| ((i * 7919 + 17) % 8192) as u16)
        .collect();
    let float_table: Vec<f32> = table.iter().map(|v| *v as f32 / 8192.).collect();
    let grid = vec![points; inputs];
    let params = InterpParams::<u16>::new(&grid, outputs, table.clone(), false).unwrap();
    let float_params =
        InterpParams::<f32>::new(&grid, outputs, float_table.clone(), false).unwrap();

    let mut coords = vec![0; inputs];
    let mut out = vec![0; outputs];
    let mut float_out = vec![0.; outputs];
    for index in 0..nodes {
        let mut rest = index;
        for c in coords.iter_mut().rev() {
            *c = rest % points;
            rest /= points;
        }
        let input: Vec<u16> = coords
            .iter()
            .map(|&k| crate::fixed::quantize_val(k as f64, points))
            .collect();
        let float_input: Vec<f32> = coords
            .iter()
            .map(|&k| k as f32 / (points - 1) as f32)
            .collect();

        params.eval(&input, &mut out);
        float_params.eval(&float_input, &mut float_out);

        let at = index * outputs;
        assert_eq!(out, &table[at..at + outputs], "node {:?}", coords);
        assert_eq!(float_out, &float_table[at..at + outputs], "node {:?}", coords);
    }
}

#[test]
fn grid_nodes_are_exact() {
    check_nodes(5, 1, 1);
    check_nodes(5, 1, 2);
    check_nodes(5, 2, 2);
    check_nodes(3, 4, 2);
}

#[test]
fn fifteen_inputs() {
    let table = grid_table(2, 15, |c| vec![c.iter().sum::<usize>() as f32 / 15.]);
    let params = InterpParams::<f32>::new(&[2; 15], 1, table, false).unwrap();

    let mut out = [0.];
    params.eval(&[0.5; 15], &mut out);
    assert!((out[0] - 0.5).abs() < 1e-4);

    let mut input = [0.; 15];
    input[14] = 1.;
    params.eval(&input, &mut out);
    assert!((out[0] - 1. / 15.).abs() < 1e-5);
}

#[test]
fn tables_are_copied_on_write() {
    let params = InterpParams::<u16>::new(&[2], 1, vec![0, 0xffff], false).unwrap();

    let mut shared = params.duplicate(true);
    assert!(shared.shares_table_with(&params));
    shared.table_mut()[0] = 7;
    assert!(!shared.shares_table_with(&params));
    assert_eq!(params.table()[0], 0);

    let copied = params.duplicate(false);
    assert!(!copied.shares_table_with(&params));
    assert_eq!(copied, params);
}
