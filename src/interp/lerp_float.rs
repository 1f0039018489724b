//! Floating-point interpolation routines.

use super::{InterpParams, MAX_STAGE_CHANNELS};

/// Clamps to 0..=1. Tiny values and NaN go to 0.
#[inline]
pub(crate) fn fclamp(v: f32) -> f32 {
    if v < 1e-9 || v.is_nan() {
        0.
    } else if v > 1. {
        1.
    } else {
        v
    }
}

/// Splits a clamped input into (cell index, position inside the cell).
///
/// An input of 1 selects the last node. Below that the cell index stays under `domain`, even if
/// the product rounds up, so that `index + 1` is always a node.
#[inline]
fn cell(v: f32, domain: usize) -> (usize, f32) {
    if v >= 1. {
        return (domain, 0.);
    }
    let pk = v * domain as f32;
    let k0 = (pk.floor() as usize).min(domain.saturating_sub(1));
    (k0, pk - k0 as f32)
}

#[inline]
fn lerp(a: f32, l: f32, h: f32) -> f32 {
    l + (h - l) * a
}

/// One input, one output.
pub(super) fn lerp_1d(p: &InterpParams<f32>, input: &[f32], output: &mut [f32]) {
    let table = p.table();
    let domain = p.domain[0];
    let v = fclamp(input[0]);

    if v == 1. || domain == 0 {
        output[0] = table[domain];
        return;
    }

    let (cell0, rest) = cell(v, domain);
    output[0] = lerp(rest, table[cell0], table[cell0 + 1]);
}

/// One input, several outputs.
pub(super) fn eval_1_input(p: &InterpParams<f32>, input: &[f32], output: &mut [f32]) {
    let table = p.table();
    let n_out = p.n_outputs;
    let domain = p.domain[0];
    let v = fclamp(input[0]);

    if v == 1. || domain == 0 {
        let start = domain * p.stride[0];
        output[..n_out].copy_from_slice(&table[start..start + n_out]);
        return;
    }

    let (cell0, rest) = cell(v, domain);
    let k0 = cell0 * p.stride[0];
    let k1 = k0 + p.stride[0];

    for i in 0..n_out {
        output[i] = lerp(rest, table[k0 + i], table[k1 + i]);
    }
}

pub(super) fn bilinear(p: &InterpParams<f32>, input: &[f32], output: &mut [f32]) {
    let table = p.table();
    let n_out = p.n_outputs;

    let px = fclamp(input[0]);
    let py = fclamp(input[1]);
    let (x0, rx) = cell(px, p.domain[0]);
    let (y0, ry) = cell(py, p.domain[1]);

    let x0 = x0 * p.stride[1];
    let x1 = x0 + if px >= 1. { 0 } else { p.stride[1] };
    let y0 = y0 * p.stride[0];
    let y1 = y0 + if py >= 1. { 0 } else { p.stride[0] };

    for c in 0..n_out {
        let dens = |i: usize, j: usize| table[i + j + c];

        let dx0 = lerp(rx, dens(x0, y0), dens(x1, y0));
        let dx1 = lerp(rx, dens(x0, y1), dens(x1, y1));

        output[c] = lerp(ry, dx0, dx1);
    }
}

pub(super) fn trilinear(p: &InterpParams<f32>, input: &[f32], output: &mut [f32]) {
    let table = p.table();
    let n_out = p.n_outputs;

    let px = fclamp(input[0]);
    let py = fclamp(input[1]);
    let pz = fclamp(input[2]);
    let (x0, rx) = cell(px, p.domain[0]);
    let (y0, ry) = cell(py, p.domain[1]);
    let (z0, rz) = cell(pz, p.domain[2]);

    let x0 = x0 * p.stride[2];
    let x1 = x0 + if px >= 1. { 0 } else { p.stride[2] };
    let y0 = y0 * p.stride[1];
    let y1 = y0 + if py >= 1. { 0 } else { p.stride[1] };
    let z0 = z0 * p.stride[0];
    let z1 = z0 + if pz >= 1. { 0 } else { p.stride[0] };

    for c in 0..n_out {
        let dens = |i: usize, j: usize, k: usize| table[i + j + k + c];

        let dx00 = lerp(rx, dens(x0, y0, z0), dens(x1, y0, z0));
        let dx01 = lerp(rx, dens(x0, y0, z1), dens(x1, y0, z1));
        let dx10 = lerp(rx, dens(x0, y1, z0), dens(x1, y1, z0));
        let dx11 = lerp(rx, dens(x0, y1, z1), dens(x1, y1, z1));

        let dxy0 = lerp(ry, dx00, dx10);
        let dxy1 = lerp(ry, dx01, dx11);

        output[c] = lerp(rz, dxy0, dxy1);
    }
}

pub(super) fn tetrahedral(p: &InterpParams<f32>, input: &[f32], output: &mut [f32]) {
    tetrahedral_in(p.table(), p.domain(), p.stride(), p.n_outputs, input, output);
}

fn tetrahedral_in(
    table: &[f32],
    domain: &[usize],
    stride: &[usize],
    n_out: usize,
    input: &[f32],
    output: &mut [f32],
) {
    let px = fclamp(input[0]);
    let py = fclamp(input[1]);
    let pz = fclamp(input[2]);
    let (x0, rx) = cell(px, domain[0]);
    let (y0, ry) = cell(py, domain[1]);
    let (z0, rz) = cell(pz, domain[2]);

    let x0 = x0 * stride[2];
    let x1 = x0 + if px >= 1. { 0 } else { stride[2] };
    let y0 = y0 * stride[1];
    let y1 = y0 + if py >= 1. { 0 } else { stride[1] };
    let z0 = z0 * stride[0];
    let z1 = z0 + if pz >= 1. { 0 } else { stride[0] };

    for c in 0..n_out {
        let dens = |i: usize, j: usize, k: usize| table[i + j + k + c];

        let c0 = dens(x0, y0, z0);
        let (c1, c2, c3);

        if rx >= ry && ry >= rz {
            c1 = dens(x1, y0, z0) - c0;
            c2 = dens(x1, y1, z0) - dens(x1, y0, z0);
            c3 = dens(x1, y1, z1) - dens(x1, y1, z0);
        } else if rx >= rz && rz >= ry {
            c1 = dens(x1, y0, z0) - c0;
            c2 = dens(x1, y1, z1) - dens(x1, y0, z1);
            c3 = dens(x1, y0, z1) - dens(x1, y0, z0);
        } else if rz >= rx && rx >= ry {
            c1 = dens(x1, y0, z1) - dens(x0, y0, z1);
            c2 = dens(x1, y1, z1) - dens(x1, y0, z1);
            c3 = dens(x0, y0, z1) - c0;
        } else if ry >= rx && rx >= rz {
            c1 = dens(x1, y1, z0) - dens(x0, y1, z0);
            c2 = dens(x0, y1, z0) - c0;
            c3 = dens(x1, y1, z1) - dens(x1, y1, z0);
        } else if ry >= rz && rz >= rx {
            c1 = dens(x1, y1, z1) - dens(x0, y1, z1);
            c2 = dens(x0, y1, z0) - c0;
            c3 = dens(x0, y1, z1) - dens(x0, y1, z0);
        } else if rz >= ry && ry >= rx {
            c1 = dens(x1, y1, z1) - dens(x0, y1, z1);
            c2 = dens(x0, y1, z1) - dens(x0, y0, z1);
            c3 = dens(x0, y0, z1) - c0;
        } else {
            c1 = 0.;
            c2 = 0.;
            c3 = 0.;
        }

        output[c] = c0 + c1 * rx + c2 * ry + c3 * rz;
    }
}

/// 4 to 15 inputs.
pub(super) fn eval_n_inputs(p: &InterpParams<f32>, input: &[f32], output: &mut [f32]) {
    eval_recursive(
        p.table(),
        p.domain(),
        p.stride(),
        p.n_outputs,
        &input[..p.n_inputs],
        output,
    );
}

fn eval_recursive(
    table: &[f32],
    domain: &[usize],
    stride: &[usize],
    n_out: usize,
    input: &[f32],
    output: &mut [f32],
) {
    let n = domain.len();
    if n == 3 {
        return tetrahedral_in(table, domain, stride, n_out, input, output);
    }

    let pk = fclamp(input[0]);
    let (k0, rest) = cell(pk, domain[0]);
    let k0 = stride[n - 1] * k0;
    let k1 = k0 + if pk >= 1. { 0 } else { stride[n - 1] };

    let mut tmp1 = [0f32; MAX_STAGE_CHANNELS];
    let mut tmp2 = [0f32; MAX_STAGE_CHANNELS];

    eval_recursive(&table[k0..], &domain[1..], stride, n_out, &input[1..], &mut tmp1);
    eval_recursive(&table[k1..], &domain[1..], stride, n_out, &input[1..], &mut tmp2);

    for i in 0..n_out {
        output[i] = lerp(rest, tmp1[i], tmp2[i]);
    }
}
