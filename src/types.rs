//! Color spaces and rendering intents.

use std::fmt;

enum_primitive! {
    /// Rendering intents.
    ///
    /// When in doubt, use perceptual. Refer to the ICC specification for details.
    pub Intent (u32) {
        Perceptual = 0,
        RelativeColorimetric = 1,
        Saturation = 2,
        AbsoluteColorimetric = 3,
    }
}

enum_primitive! {
    /// ICC color spaces.
    pub ColorSpace (u32) {
        /// `XYZ `
        XYZ = 0x58595a20,
        /// `Lab `
        Lab = 0x4C616220,
        /// `Luv `
        Luv = 0x4C757620,
        /// `YCbr`
        YCbCr = 0x59436272,
        /// `Yxy `
        Yxy = 0x59787920,
        /// `RGB `
        RGB = 0x52474220,
        /// `GRAY`
        Gray = 0x47524159,
        /// `HSV `
        HSV = 0x48535620,
        /// `HLS `
        HLS = 0x484C5320,
        /// `CMYK`
        CMYK = 0x434D594B,
        /// `CMY `
        CMY = 0x434D5920,
        /// `LuvK`
        LuvK = 0x4C75764B,
        /// `MCH1`
        MCH1 = 0x4D434831,
        /// `MCH2`
        MCH2 = 0x4D434832,
        /// `MCH3`
        MCH3 = 0x4D434833,
        /// `MCH4`
        MCH4 = 0x4D434834,
        /// `MCH5`
        MCH5 = 0x4D434835,
        /// `MCH6`
        MCH6 = 0x4D434836,
        /// `MCH7`
        MCH7 = 0x4D434837,
        /// `MCH8`
        MCH8 = 0x4D434838,
        /// `MCH9`
        MCH9 = 0x4D434839,
        /// `MCHA`
        MCHA = 0x4D434841,
        /// `MCHB`
        MCHB = 0x4D434842,
        /// `MCHC`
        MCHC = 0x4D434843,
        /// `MCHD`
        MCHD = 0x4D434844,
        /// `MCHE`
        MCHE = 0x4D434845,
        /// `MCHF`
        MCHF = 0x4D434846,
        /// `nmcl`
        Named = 0x6E6D636C,
    }
}

impl ColorSpace {
    /// Returns the number of channels in the color space.
    pub fn channels(self) -> usize {
        use ColorSpace::*;
        match self {
            MCH1 | Gray => 1,
            MCH2 => 2,
            XYZ | Lab | Luv | YCbCr | Yxy | RGB | HSV | HLS | CMY | MCH3 => 3,
            LuvK | CMYK | MCH4 => 4,
            MCH5 => 5,
            MCH6 => 6,
            MCH7 => 7,
            MCH8 => 8,
            MCH9 => 9,
            MCHA => 10,
            MCHB => 11,
            MCHC => 12,
            MCHD => 13,
            MCHE => 14,
            MCHF => 15,
            // named colors are indices
            Named => 1,
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ColorSpace::*;
        match self {
            XYZ => write!(f, "XYZ"),
            Lab => write!(f, "L*a*b*"),
            Luv => write!(f, "L*u*v*"),
            YCbCr => write!(f, "YCbCr"),
            Yxy => write!(f, "xyY"),
            RGB => write!(f, "RGB"),
            Gray => write!(f, "Gray"),
            HSV => write!(f, "HSV"),
            HLS => write!(f, "HLS"),
            CMYK => write!(f, "CMYK"),
            CMY => write!(f, "CMY"),
            LuvK => write!(f, "L*u*v*K"),
            Named => write!(f, "named color"),
            other => write!(f, "multi-channel ({})", other.channels()),
        }
    }
}

#[test]
fn color_space_codes() {
    assert_eq!(ColorSpace::try_from(0x52474220), Ok(ColorSpace::RGB));
    assert_eq!(u32::from(ColorSpace::CMYK), 0x434D594B);
    assert_eq!(ColorSpace::try_from(0x1234), Err(0x1234));
    assert_eq!(ColorSpace::MCHC.to_string(), "multi-channel (12)");
    assert_eq!(Intent::try_from(3), Ok(Intent::AbsoluteColorimetric));
}
