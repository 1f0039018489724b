//! Gamma tone curves.
//!
//! A tone curve has a floating-point definition made of segments, and a 16-bit table that is
//! used for all 16-bit evaluations. Curves built directly from a 16-bit table have no segments;
//! those are limited-precision curves, and floating-point evaluation goes through the table too.

use crate::fixed::{quantize_val, quick_saturate_word};
use crate::interp::{InterpError, InterpParams};
use std::f64;
use std::ops::Range;

const EPSILON: f64 = 0.0001;

/// Number of table entries sampled from a segmented curve.
const SEGMENTED_TABLE_ENTRIES: usize = 4096;

/// An ICC parametric curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IccParametricCurve {
    /// `y = x ^ g` (type 0)
    Gamma(f64),
    GammaInv(f64),

    /// (ax + b) ^ g` (type 1)
    ///
    /// Parameters are g, a, b.
    LinGamma(f64, f64, f64),
    LinGammaInv(f64, f64, f64),

    /// (type 2)
    ///
    /// Parameters are g, a, b, c.
    LinBGamma(f64, f64, f64, f64),
    LinBGammaInv(f64, f64, f64, f64),

    /// (type 3)
    ///
    /// Parameters are g, a, b, c, d.
    LinLinGamma(f64, f64, f64, f64, f64),
    LinLinGammaInv(f64, f64, f64, f64, f64),

    /// (type 4)
    ///
    /// Parameters are g, a, b, c, d, e, f.
    LinLinOffGamma(f64, f64, f64, f64, f64, f64, f64),
    LinLinOffGammaInv(f64, f64, f64, f64, f64, f64, f64),
}

impl IccParametricCurve {
    /// Creates a new parametric curve from the ICC type id and whether or not it should be
    /// inverted.
    ///
    /// Will return None if the type is unknown or there are not enough parameters.
    pub fn from_type(p_type: u16, invert: bool, params: &[f64]) -> Option<Self> {
        use IccParametricCurve::*;
        let p = |n: usize| params.get(..n);

        let curve = match p_type {
            0 => p(1).map(|p| Gamma(p[0]))?,
            1 => p(3).map(|p| LinGamma(p[0], p[1], p[2]))?,
            2 => p(4).map(|p| LinBGamma(p[0], p[1], p[2], p[3]))?,
            3 => p(5).map(|p| LinLinGamma(p[0], p[1], p[2], p[3], p[4]))?,
            4 => p(7).map(|p| LinLinOffGamma(p[0], p[1], p[2], p[3], p[4], p[5], p[6]))?,
            _ => return None,
        };

        Some(if invert { curve.inverted() } else { curve })
    }

    /// Returns the icc type.
    pub fn icc_type(&self) -> u16 {
        use IccParametricCurve::*;
        match *self {
            Gamma(_) | GammaInv(_) => 0,
            LinGamma(..) | LinGammaInv(..) => 1,
            LinBGamma(..) | LinBGammaInv(..) => 2,
            LinLinGamma(..) | LinLinGammaInv(..) => 3,
            LinLinOffGamma(..) | LinLinOffGammaInv(..) => 4,
        }
    }

    /// Returns true if this is the inverse of one of the ICC curve types.
    pub fn is_inverted(&self) -> bool {
        use IccParametricCurve::*;
        matches!(
            self,
            GammaInv(_)
                | LinGammaInv(..)
                | LinBGammaInv(..)
                | LinLinGammaInv(..)
                | LinLinOffGammaInv(..)
        )
    }

    /// Returns the inverted version of this curve.
    pub fn inverted(&self) -> Self {
        use IccParametricCurve::*;
        match *self {
            Gamma(g) => GammaInv(g),
            GammaInv(g) => Gamma(g),

            LinGamma(g, a, b) => LinGammaInv(g, a, b),
            LinGammaInv(g, a, b) => LinGamma(g, a, b),

            LinBGamma(g, a, b, c) => LinBGammaInv(g, a, b, c),
            LinBGammaInv(g, a, b, c) => LinBGamma(g, a, b, c),

            LinLinGamma(g, a, b, c, d) => LinLinGammaInv(g, a, b, c, d),
            LinLinGammaInv(g, a, b, c, d) => LinLinGamma(g, a, b, c, d),

            LinLinOffGamma(g, a, b, c, d, e, f) => LinLinOffGammaInv(g, a, b, c, d, e, f),
            LinLinOffGammaInv(g, a, b, c, d, e, f) => LinLinOffGamma(g, a, b, c, d, e, f),
        }
    }

    /// Evaluates the parametric curve at the given position.
    pub fn eval(&self, x: f64) -> f64 {
        match *self {
            // y = x ^ g
            IccParametricCurve::Gamma(g) => {
                if x < 0. {
                    if (g - 1.).abs() < EPSILON {
                        x
                    } else {
                        0.
                    }
                } else {
                    x.powf(g)
                }
            }
            // x = y ^ (1 / g)
            IccParametricCurve::GammaInv(g) => {
                if x < 0. {
                    if (g - 1.).abs() < EPSILON {
                        x
                    } else {
                        0.
                    }
                } else if g.abs() < EPSILON {
                    f64::INFINITY
                } else {
                    x.powf(1. / g)
                }
            }
            // CIE 122-1966
            // y = (ax + b) ^ g | x >= -b / a
            // y = 0            | else
            IccParametricCurve::LinGamma(g, a, b) => {
                if a.abs() < EPSILON {
                    0.
                } else if x < -b / a {
                    0.
                } else {
                    (a * x + b).max(0.).powf(g)
                }
            }
            // x = (y ^ (1 / g) - b) / a
            IccParametricCurve::LinGammaInv(g, a, b) => {
                if g.abs() < EPSILON || a.abs() < EPSILON || x < 0. {
                    0.
                } else {
                    ((x.powf(1. / g) - b) / a).max(0.)
                }
            }
            // IEC 61966-3
            // y = (ax + b) ^ g + c | x >= -b / a
            // y = c                | else
            IccParametricCurve::LinBGamma(g, a, b, c) => {
                if a.abs() < EPSILON {
                    0.
                } else if x < (-b / a).max(0.) {
                    c
                } else {
                    let e = a * x + b;
                    if e < 0. {
                        0.
                    } else {
                        e.powf(g) + c
                    }
                }
            }
            // x = ((y - c) ^ (1 / g) - b) / a | y >= c
            // x = -b / a                      | else
            IccParametricCurve::LinBGammaInv(g, a, b, c) => {
                if a.abs() < EPSILON || g.abs() < EPSILON {
                    0.
                } else if x < c {
                    -b / a
                } else {
                    ((x - c).powf(1. / g) - b) / a
                }
            }
            // IEC 61966-2.1 (sRGB)
            // y = (ax + b) ^ g | x >= d
            // y = cx           | else
            IccParametricCurve::LinLinGamma(g, a, b, c, d) => {
                if x < d {
                    c * x
                } else {
                    let e = a * x + b;
                    if e > 0. {
                        e.powf(g)
                    } else {
                        0.
                    }
                }
            }
            // x = (y ^ (1 / g) - b) / a | y >= (ad + b) ^ g
            // x = y / c                 | else
            IccParametricCurve::LinLinGammaInv(g, a, b, c, d) => {
                let disc = (a * d + b).max(0.).powf(g);
                if x >= disc {
                    if g.abs() < EPSILON || a.abs() < EPSILON {
                        0.
                    } else {
                        (x.max(0.).powf(1. / g) - b) / a
                    }
                } else if c.abs() < EPSILON {
                    0.
                } else {
                    x / c
                }
            }
            // y = (ax + b) ^ g + e | x >= d
            // y = cx + f           | else
            IccParametricCurve::LinLinOffGamma(g, a, b, c, d, e, f) => {
                if x >= d {
                    let v = a * x + b;
                    if v > 0. {
                        v.powf(g) + e
                    } else {
                        e
                    }
                } else {
                    c * x + f
                }
            }
            // x = ((y - e) ^ (1 / g) - b) / a | y >= cd + f
            // x = (y - f) / c                 | else
            IccParametricCurve::LinLinOffGammaInv(g, a, b, c, d, e, f) => {
                if x >= c * d + f {
                    let v = x - e;
                    if v < 0. || g.abs() < EPSILON || a.abs() < EPSILON {
                        0.
                    } else {
                        (v.powf(1. / g) - b) / a
                    }
                } else if c.abs() < EPSILON {
                    0.
                } else {
                    (x - f) / c
                }
            }
        }
    }
}

/// Tone curve segment types.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum CurveType {
    Const(f64),
    IccParam(IccParametricCurve),
    /// Samples spread evenly over the segment domain, linearly interpolated.
    Sampled(InterpParams<f32>),
}

/// A tone curve segment.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSegment {
    /// The domain of this segment, excluding the start and including the end.
    ///
    /// Bounds may be infinite.
    pub domain: Range<f64>,
    /// The curve in this segments.
    pub curve: CurveType,
}

impl CurveSegment {
    /// Creates a sampled segment.
    pub fn sampled(domain: Range<f64>, samples: Vec<f32>) -> Result<Self, InterpError> {
        let n = samples.len();
        Ok(CurveSegment {
            domain,
            curve: CurveType::Sampled(InterpParams::new(&[n], 1, samples, false)?),
        })
    }

    /// Evaluates this curve segment at the given position.
    pub fn eval(&self, x: f64) -> f64 {
        match self.curve {
            CurveType::Const(a) => a,
            CurveType::IccParam(curve) => curve.eval(x),
            CurveType::Sampled(ref samples) => {
                let r = (x - self.domain.start) / (self.domain.end - self.domain.start);
                let mut out = [0.];
                samples.eval(&[r as f32], &mut out);
                out[0] as f64
            }
        }
    }

    fn contains(&self, x: f64) -> bool {
        x > self.domain.start && x <= self.domain.end
    }
}

/// A gamma tone curve.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneCurve {
    /// Floating-point definition; empty for curves built from a 16-bit table.
    segments: Vec<CurveSegment>,
    /// 16-bit table, interpolated linearly.
    table: InterpParams<u16>,
}

impl ToneCurve {
    /// Creates a new tone curve from segments and samples its 16-bit table.
    ///
    /// Segments must be sorted by domain in ascending order; where they overlap, the later one
    /// wins.
    pub fn new_segmented(segments: Vec<CurveSegment>) -> Result<Self, InterpError> {
        if segments.is_empty() {
            return Err(InterpError::Empty);
        }

        // identity gamma needs no more than its end points
        let entries = match segments.as_slice() {
            [CurveSegment {
                curve: CurveType::IccParam(IccParametricCurve::Gamma(g)),
                ..
            }] if (g - 1.).abs() < 0.001 => 2,
            _ => SEGMENTED_TABLE_ENTRIES,
        };

        let mut curve = ToneCurve {
            segments,
            table: InterpParams::new(&[entries], 1, vec![0; entries], false)?,
        };

        let table = curve.eval_segments_table(entries);
        curve.table.table_mut().copy_from_slice(&table);
        Ok(curve)
    }

    fn eval_segments_table(&self, entries: usize) -> Vec<u16> {
        (0..entries)
            .map(|i| {
                let x = i as f64 / (entries - 1) as f64;
                quick_saturate_word(self.eval(x).unwrap_or(0.) * 65535.)
            })
            .collect()
    }

    /// Creates a new parametric tone curve.
    pub fn new_parametric(curve: IccParametricCurve) -> Result<Self, InterpError> {
        Self::new_segmented(vec![CurveSegment {
            domain: f64::NEG_INFINITY..f64::INFINITY,
            curve: CurveType::IccParam(curve),
        }])
    }

    /// Creates a new parametric tone curve from ICC type and parameters.
    ///
    /// Will return None if the given parametric curve type is unknown.
    pub fn new_icc_parametric(p_type: u16, params: &[f64]) -> Option<Self> {
        IccParametricCurve::from_type(p_type, false, params)
            .and_then(|curve| Self::new_parametric(curve).ok())
    }

    /// Creates a new gamma curve.
    pub fn new_gamma(gamma: f64) -> Result<Self, InterpError> {
        Self::new_parametric(IccParametricCurve::Gamma(gamma))
    }

    /// Creates a limited-precision tone curve from a 16-bit table.
    pub fn new_table_16(values: Vec<u16>) -> Result<Self, InterpError> {
        let n = values.len();
        Ok(ToneCurve {
            segments: Vec::new(),
            table: InterpParams::new(&[n], 1, values, false)?,
        })
    }

    /// Creates a new tone curve from a table of values between 0..1.
    ///
    /// Evaluating this curve outside 0..1 will return either the first or the last value in the
    /// table.
    pub fn new_tabulated(values: Vec<f32>) -> Result<Self, InterpError> {
        let first_value = *values.first().ok_or(InterpError::Empty)? as f64;
        let last_value = *values.last().ok_or(InterpError::Empty)? as f64;

        Self::new_segmented(vec![
            CurveSegment {
                domain: f64::NEG_INFINITY..0.,
                curve: CurveType::Const(first_value),
            },
            CurveSegment::sampled(0.0..1.0, values)?,
            CurveSegment {
                domain: 1.0..f64::INFINITY,
                curve: CurveType::Const(last_value),
            },
        ])
    }

    /// The floating-point segments. Empty for curves built from 16-bit tables.
    pub fn segments(&self) -> &[CurveSegment] {
        &self.segments
    }

    /// The 16-bit table.
    pub fn table_16(&self) -> &[u16] {
        self.table.table()
    }

    /// Mutable access to the 16-bit table.
    ///
    /// Only meaningful for curves without segments, since segments are not updated.
    pub(crate) fn table_16_mut(&mut self) -> &mut [u16] {
        self.table.table_mut()
    }

    /// Number of entries in the 16-bit table.
    pub fn n_entries(&self) -> usize {
        self.table.table().len()
    }

    /// Tries to evaluate the segments at the given value. Returns None if undefined.
    pub fn eval(&self, x: f64) -> Option<f64> {
        self.segments
            .iter()
            .rev()
            .find(|segment| segment.contains(x))
            .map(|segment| segment.eval(x))
    }

    /// Evaluates the curve in floating point.
    pub fn eval_float(&self, v: f32) -> f32 {
        if self.segments.is_empty() {
            let input = quick_saturate_word(v as f64 * 65535.);
            return self.eval_16(input) as f32 / 65535.;
        }
        self.eval(v as f64).unwrap_or(0.) as f32
    }

    /// Evaluates the 16-bit table.
    pub fn eval_16(&self, v: u16) -> u16 {
        let mut out = [0];
        self.table.eval(&[v], &mut out);
        out[0]
    }

    /// Returns true if the 16-bit table is the identity, give or take a few units.
    pub fn is_linear(&self) -> bool {
        let table = self.table_16();
        let n = table.len();
        table.iter().enumerate().all(|(i, &y)| {
            let expected = quantize_val(i as f64, n) as i32;
            (y as i32 - expected).abs() <= 0x0f
        })
    }

    /// Returns true if the table goes from high to low values.
    pub fn is_descending(&self) -> bool {
        let table = self.table_16();
        table[0] > table[table.len() - 1]
    }

    /// Returns true if the table never changes direction, allowing some ripple.
    pub fn is_monotonic(&self) -> bool {
        let table = self.table_16();
        let n = table.len();

        // degenerated curves pass
        if n < 2 {
            return true;
        }

        if self.is_descending() {
            let mut last = table[0] as i32;
            for &y in &table[1..] {
                if y as i32 - last > 2 {
                    return false;
                }
                last = y as i32;
            }
        } else {
            let mut last = table[n - 1] as i32;
            for &y in table[..n - 1].iter().rev() {
                if y as i32 - last > 2 {
                    return false;
                }
                last = y as i32;
            }
        }
        true
    }

    /// Creates an inverted version of this tone curve with 4096 samples.
    pub fn reversed(&self) -> Result<Self, InterpError> {
        self.reversed_with_samples(SEGMENTED_TABLE_ENTRIES)
    }

    /// Creates an inverted version of this tone curve.
    ///
    /// Single parametric curves are inverted analytically. Anything else is inverted by
    /// searching the 16-bit table, producing a table with the given number of samples.
    pub fn reversed_with_samples(&self, samples: usize) -> Result<Self, InterpError> {
        if let [CurveSegment {
            curve: CurveType::IccParam(p),
            ..
        }] = self.segments.as_slice()
        {
            return Self::new_parametric(p.inverted());
        }

        if samples < 2 {
            return Err(InterpError::InvalidGrid(0, samples));
        }

        let table = self.table_16();
        let n = table.len();
        let ascending = !self.is_descending();

        let mut out = Vec::with_capacity(samples);
        let (mut a, mut b) = (0., 0.);

        for i in 0..samples {
            let y = i as f64 * 65535. / (samples - 1) as f64;

            // when no interval contains y, reuse the last one
            if let Some(j) = find_interval(y, table) {
                let x1 = table[j] as f64;
                let x2 = table[j + 1] as f64;
                let y1 = (j as f64 * 65535.) / (n - 1) as f64;
                let y2 = ((j + 1) as f64 * 65535.) / (n - 1) as f64;

                if x1 == x2 {
                    // collapsed, pick either end
                    out.push(quick_saturate_word(if ascending { y2 } else { y1 }));
                    continue;
                }

                a = (y2 - y1) / (x2 - x1);
                b = y2 - a * x2;
            }

            out.push(quick_saturate_word(a * y + b));
        }

        Self::new_table_16(out)
    }
}

/// Finds the table interval `[j, j + 1]` containing `v`.
fn find_interval(v: f64, table: &[u16]) -> Option<usize> {
    let domain = table.len().checked_sub(1)?;
    if domain < 1 {
        return None;
    }

    let contains = |i: usize| {
        let y0 = table[i] as f64;
        let y1 = table[i + 1] as f64;
        if y0 <= y1 {
            v >= y0 && v <= y1
        } else {
            v >= y1 && v <= y0
        }
    };

    if table[0] < table[domain] {
        // overall ascending: search from the top
        (0..domain).rev().find(|&i| contains(i))
    } else {
        (0..domain).find(|&i| contains(i))
    }
}
