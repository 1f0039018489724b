//! PCS encodings and per-colorspace constants.
//!
//! Stages exchange values in 0..1. The PCS encodings used inside pipelines are:
//!
//! | Interchange Space  | Component | Actual Range       | Encoded Range              |
//! |:------------------ |:--------- |:------------------ |:-------------------------- |
//! | CIE XYZ            | X         | 0 -> 1.99997       | 0x0000 -> 0xffff           |
//! | CIE XYZ            | Y         | 0 -> 1.99997       | 0x0000 -> 0xffff           |
//! | CIE XYZ            | Z         | 0 -> 1.99997       | 0x0000 -> 0xffff           |
//! |                                                                                  |
//! | *Version 2.3*                                                                    |
//! | CIELAB (16 bit)    | L*        | 0 -> 100.0         | 0x0000 -> 0xff00           |
//! | CIELAB (16 bit)    | a*        | -128.0 -> +127.996 | 0x0000 -> 0x8000 -> 0xffff |
//! | CIELAB (16 bit)    | b*        | -128.0 -> +127.996 | 0x0000 -> 0x8000 -> 0xffff |
//! |                                                                                  |
//! | *Version 4*                                                                      |
//! | CIELAB (16 bit)    | L*         | 0 -> 100.0        | 0x0000 -> 0xffff           |
//! | CIELAB (16 bit)    | a*         | -128.0 -> +127    | 0x0000 -> 0x8080 -> 0xffff |
//! | CIELAB (16 bit)    | b*         | -128.0 -> +127    | 0x0000 -> 0x8080 -> 0xffff |

use crate::color::{CLab, Cxyz};
use crate::flags::TransformFlags;
use crate::types::ColorSpace;

/// Decodes V4 Lab from 0..1.
pub fn lab_from_unit(v: &[f32]) -> CLab {
    CLab {
        l: v[0] as f64 * 100.,
        a: v[1] as f64 * 255. - 128.,
        b: v[2] as f64 * 255. - 128.,
    }
}

/// Encodes V4 Lab into 0..1.
pub fn lab_to_unit(lab: CLab, out: &mut [f32]) {
    out[0] = (lab.l / 100.) as f32;
    out[1] = ((lab.a + 128.) / 255.) as f32;
    out[2] = ((lab.b + 128.) / 255.) as f32;
}

/// Decodes XYZ from 0..1.
pub fn xyz_from_unit(v: &[f32]) -> Cxyz {
    Cxyz {
        x: v[0] as f64 * Cxyz::MAX_ENCODABLE,
        y: v[1] as f64 * Cxyz::MAX_ENCODABLE,
        z: v[2] as f64 * Cxyz::MAX_ENCODABLE,
    }
}

/// Encodes XYZ into 0..1.
pub fn xyz_to_unit(xyz: Cxyz, out: &mut [f32]) {
    out[0] = (xyz.x / Cxyz::MAX_ENCODABLE) as f32;
    out[1] = (xyz.y / Cxyz::MAX_ENCODABLE) as f32;
    out[2] = (xyz.z / Cxyz::MAX_ENCODABLE) as f32;
}

/// Returns a number of grid points to be used as a LUT table. It assumes the same number of grid
/// points in all dimensions. Flags may override the choice.
pub fn reasonable_grid_points(color_space: ColorSpace, flags: TransformFlags) -> usize {
    // Already specified?
    if let Some(points) = flags.grid_points() {
        return points;
    }

    let channels = color_space.channels();

    // HighResPrecalc is maximum resolution
    if flags.contains(TransformFlags::HIGHRESPRECALC) {
        return match channels {
            // 7 for Hifi
            c if c > 4 => 7,
            // 23 for CMYK
            4 => 23,
            // 49 for RGB and others
            _ => 49,
        };
    }

    // LowResPrecal is lower resolution
    if flags.contains(TransformFlags::LOWRESPRECALC) {
        return match channels {
            c if c > 4 => 6,
            // monochrome
            1 => 33,
            _ => 17,
        };
    }

    match channels {
        c if c > 4 => 7,
        4 => 17,
        _ => 33,
    }
}

/// White and black in the 16-bit encoding of a color space.
///
/// Only the most common spaces are known.
pub fn end_points_by_space(space: ColorSpace) -> Option<(&'static [u16], &'static [u16])> {
    static RGB_BLACK: [u16; 3] = [0, 0, 0];
    static RGB_WHITE: [u16; 3] = [0xffff, 0xffff, 0xffff];
    // 400% of ink
    static CMYK_BLACK: [u16; 4] = [0xffff, 0xffff, 0xffff, 0xffff];
    static CMYK_WHITE: [u16; 4] = [0, 0, 0, 0];
    // V4 Lab encoding
    static LAB_BLACK: [u16; 3] = [0, 0x8080, 0x8080];
    static LAB_WHITE: [u16; 3] = [0xffff, 0x8080, 0x8080];
    static CMY_BLACK: [u16; 3] = [0xffff, 0xffff, 0xffff];
    static CMY_WHITE: [u16; 3] = [0, 0, 0];
    static GRAY_BLACK: [u16; 1] = [0];
    static GRAY_WHITE: [u16; 1] = [0xffff];

    match space {
        ColorSpace::Gray => Some((&GRAY_WHITE[..], &GRAY_BLACK[..])),
        ColorSpace::RGB => Some((&RGB_WHITE[..], &RGB_BLACK[..])),
        ColorSpace::Lab => Some((&LAB_WHITE[..], &LAB_BLACK[..])),
        ColorSpace::CMYK => Some((&CMYK_WHITE[..], &CMYK_BLACK[..])),
        ColorSpace::CMY => Some((&CMY_WHITE[..], &CMY_BLACK[..])),
        _ => None,
    }
}

#[test]
fn grid_point_policy() {
    let none = TransformFlags::empty();
    assert_eq!(reasonable_grid_points(ColorSpace::RGB, none), 33);
    assert_eq!(reasonable_grid_points(ColorSpace::CMYK, none), 17);
    assert_eq!(reasonable_grid_points(ColorSpace::MCH6, none), 7);

    let high = TransformFlags::HIGHRESPRECALC;
    assert_eq!(reasonable_grid_points(ColorSpace::RGB, high), 49);
    assert_eq!(reasonable_grid_points(ColorSpace::CMYK, high), 23);

    let low = TransformFlags::LOWRESPRECALC;
    assert_eq!(reasonable_grid_points(ColorSpace::Gray, low), 33);
    assert_eq!(reasonable_grid_points(ColorSpace::RGB, low), 17);
    assert_eq!(reasonable_grid_points(ColorSpace::MCH5, low), 6);

    // an explicit count wins over everything
    let explicit = TransformFlags::HIGHRESPRECALC.with_grid_points(9);
    assert_eq!(reasonable_grid_points(ColorSpace::RGB, explicit), 9);
}

#[test]
fn lab_unit_encoding() {
    let mut out = [0.; 3];
    lab_to_unit(
        CLab {
            l: 50.,
            a: 0.,
            b: -128.,
        },
        &mut out,
    );
    assert!((out[0] - 0.5).abs() < 1e-6);
    assert!((out[1] - 128. / 255.).abs() < 1e-6);
    assert_eq!(out[2], 0.);

    let lab = lab_from_unit(&out);
    assert!((lab.l - 50.).abs() < 1e-4 && lab.a.abs() < 1e-4);
}
