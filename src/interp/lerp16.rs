//! 16-bit interpolation routines.

use super::{InterpParams, MAX_STAGE_CHANNELS};
use crate::fixed::{fixed_rest_to_int, fixed_to_int, round_fixed_to_int, to_fixed_domain};

/// `l + (h - l) * a` with `a` in 0..=0xffff, rounded.
#[inline]
fn linear_interp(a: i64, l: u16, h: u16) -> u16 {
    let dif = (h as i64 - l as i64) * a + 0x8000;
    ((dif >> 16) + l as i64) as u16
}

/// Same as [`linear_interp`] but rounding through the 15.16 helpers.
#[inline]
fn lerp(a: i64, l: i64, h: i64) -> i64 {
    l + round_fixed_to_int((h - l) * a)
}

/// Splits an input into (cell index, position inside the cell).
#[inline]
fn cell(input: u16, domain: usize) -> (usize, i64) {
    let fk = to_fixed_domain(input as i64 * domain as i64);
    (fixed_to_int(fk) as usize, fixed_rest_to_int(fk))
}

/// One input, one output.
pub(super) fn lerp_1d(p: &InterpParams<u16>, input: &[u16], output: &mut [u16]) {
    let table = p.table();
    let domain = p.domain[0];

    // at the last node (or with a single node) there is nothing to blend
    if input[0] == 0xffff || domain == 0 {
        output[0] = table[domain];
        return;
    }

    let (cell0, rest) = cell(input[0], domain);
    output[0] = linear_interp(rest, table[cell0], table[cell0 + 1]);
}

/// One input, several outputs.
pub(super) fn eval_1_input(p: &InterpParams<u16>, input: &[u16], output: &mut [u16]) {
    let table = p.table();
    let n_out = p.n_outputs;
    let domain = p.domain[0];

    if input[0] == 0xffff || domain == 0 {
        let start = domain * p.stride[0];
        output[..n_out].copy_from_slice(&table[start..start + n_out]);
        return;
    }

    let (k0, rk) = cell(input[0], domain);
    let k0 = p.stride[0] * k0;
    let k1 = k0 + p.stride[0];

    for i in 0..n_out {
        output[i] = linear_interp(rk, table[k0 + i], table[k1 + i]);
    }
}

pub(super) fn bilinear(p: &InterpParams<u16>, input: &[u16], output: &mut [u16]) {
    let table = p.table();
    let n_out = p.n_outputs;

    let (x0, rx) = cell(input[0], p.domain[0]);
    let (y0, ry) = cell(input[1], p.domain[1]);

    let x0 = x0 * p.stride[1];
    let x1 = x0 + if input[0] == 0xffff { 0 } else { p.stride[1] };
    let y0 = y0 * p.stride[0];
    let y1 = y0 + if input[1] == 0xffff { 0 } else { p.stride[0] };

    for c in 0..n_out {
        let dens = |i: usize, j: usize| table[i + j + c] as i64;

        let d00 = dens(x0, y0);
        let d01 = dens(x0, y1);
        let d10 = dens(x1, y0);
        let d11 = dens(x1, y1);

        let dx0 = lerp(rx, d00, d10);
        let dx1 = lerp(rx, d01, d11);

        output[c] = lerp(ry, dx0, dx1) as u16;
    }
}

pub(super) fn trilinear(p: &InterpParams<u16>, input: &[u16], output: &mut [u16]) {
    let table = p.table();
    let n_out = p.n_outputs;

    let (x0, rx) = cell(input[0], p.domain[0]);
    let (y0, ry) = cell(input[1], p.domain[1]);
    let (z0, rz) = cell(input[2], p.domain[2]);

    let x0 = x0 * p.stride[2];
    let x1 = x0 + if input[0] == 0xffff { 0 } else { p.stride[2] };
    let y0 = y0 * p.stride[1];
    let y1 = y0 + if input[1] == 0xffff { 0 } else { p.stride[1] };
    let z0 = z0 * p.stride[0];
    let z1 = z0 + if input[2] == 0xffff { 0 } else { p.stride[0] };

    for c in 0..n_out {
        let dens = |i: usize, j: usize, k: usize| table[i + j + k + c] as i64;

        let dx00 = lerp(rx, dens(x0, y0, z0), dens(x1, y0, z0));
        let dx01 = lerp(rx, dens(x0, y0, z1), dens(x1, y0, z1));
        let dx10 = lerp(rx, dens(x0, y1, z0), dens(x1, y1, z0));
        let dx11 = lerp(rx, dens(x0, y1, z1), dens(x1, y1, z1));

        let dxy0 = lerp(ry, dx00, dx10);
        let dxy1 = lerp(ry, dx01, dx11);

        output[c] = lerp(rz, dxy0, dxy1) as u16;
    }
}

pub(super) fn tetrahedral(p: &InterpParams<u16>, input: &[u16], output: &mut [u16]) {
    tetrahedral_in(p.table(), p.domain(), p.stride(), p.n_outputs, input, output);
}

/// Tetrahedral interpolation in a 3D (sub)table.
///
/// `domain` holds the three domains of the innermost inputs, `stride` at least three strides.
pub(super) fn tetrahedral_in(
    table: &[u16],
    domain: &[usize],
    stride: &[usize],
    n_out: usize,
    input: &[u16],
    output: &mut [u16],
) {
    let (x0, rx) = cell(input[0], domain[0]);
    let (y0, ry) = cell(input[1], domain[1]);
    let (z0, rz) = cell(input[2], domain[2]);

    let x0 = x0 * stride[2];
    let x1 = x0 + if input[0] == 0xffff { 0 } else { stride[2] };
    let y0 = y0 * stride[1];
    let y1 = y0 + if input[1] == 0xffff { 0 } else { stride[1] };
    let z0 = z0 * stride[0];
    let z1 = z0 + if input[2] == 0xffff { 0 } else { stride[0] };

    tetrahedral_cell(table, [x0, y0, z0], [x1, y1, z1], [rx, ry, rz], n_out, output);
}

/// Tetrahedral interpolation inside one cell, given the table offsets of its lower (`lo`) and
/// upper (`hi`) corner along each input and the 16-bit position inside the cell.
pub(crate) fn tetrahedral_cell(
    table: &[u16],
    lo: [usize; 3],
    hi: [usize; 3],
    rest: [i64; 3],
    n_out: usize,
    output: &mut [u16],
) {
    let [x0, y0, z0] = lo;
    let [x1, y1, z1] = hi;
    let [rx, ry, rz] = rest;

    for c in 0..n_out {
        let dens = |i: usize, j: usize, k: usize| table[i + j + k + c] as i64;

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
            c1 = 0;
            c2 = 0;
            c3 = 0;
        }

        let rest = c1 * rx + c2 * ry + c3 * rz;
        output[c] = (c0 + round_fixed_to_int(to_fixed_domain(rest))) as u16;
    }
}

/// 4 to 15 inputs.
pub(super) fn eval_n_inputs(p: &InterpParams<u16>, input: &[u16], output: &mut [u16]) {
    eval_recursive(
        p.table(),
        p.domain(),
        p.stride(),
        p.n_outputs,
        &input[..p.n_inputs],
        output,
    );
}

/// Splits along the first remaining input and blends the two neighboring sub-grids.
///
/// `domain` and `input` shrink by one per level, `stride` keeps its full length since strides
/// are counted from the innermost input.
fn eval_recursive(
    table: &[u16],
    domain: &[usize],
    stride: &[usize],
    n_out: usize,
    input: &[u16],
    output: &mut [u16],
) {
    let n = domain.len();
    if n == 3 {
        return tetrahedral_in(table, domain, stride, n_out, input, output);
    }

    let (k0, rk) = cell(input[0], domain[0]);
    let k0 = stride[n - 1] * k0;
    let k1 = k0 + if input[0] == 0xffff { 0 } else { stride[n - 1] };

    let mut tmp1 = [0u16; MAX_STAGE_CHANNELS];
    let mut tmp2 = [0u16; MAX_STAGE_CHANNELS];

    eval_recursive(&table[k0..], &domain[1..], stride, n_out, &input[1..], &mut tmp1);
    eval_recursive(&table[k1..], &domain[1..], stride, n_out, &input[1..], &mut tmp2);

    for i in 0..n_out {
        output[i] = linear_interp(rk, tmp1[i], tmp2[i]);
    }
}
