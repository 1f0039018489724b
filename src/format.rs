//! Pixel format descriptors.
//!
//! A [`PixelFormat`] uses the Little CMS bit layout. The optimizer only reads a few fields of
//! it (pixel type, channel count, bytes per sample, float and planar flags) to decide which
//! specializations apply.

use crate::types::ColorSpace;

enum_primitive! {
    /// Pixel types, as stored in the colorspace field of a [`PixelFormat`].
    pub PixelType (u32) {
        Any = 0,
        Gray = 3,
        RGB = 4,
        CMY = 5,
        CMYK = 6,
        YCbCr = 7,
        /// Lu'v'
        YUV = 8,
        XYZ = 9,
        Lab = 10,
        /// Lu'v'K
        YUVK = 11,
        HSV = 12,
        HLS = 13,
        Yxy = 14,
        MCH1 = 15,
        MCH2 = 16,
        MCH3 = 17,
        MCH4 = 18,
        MCH5 = 19,
        MCH6 = 20,
        MCH7 = 21,
        MCH8 = 22,
        MCH9 = 23,
        MCH10 = 24,
        MCH11 = 25,
        MCH12 = 26,
        MCH13 = 27,
        MCH14 = 28,
        MCH15 = 29,
        /// Identical to Lab, but using the V2 encoding.
        LabV2 = 30,
    }
}

impl PixelType {
    /// The ICC color space of this pixel type.
    pub fn color_space(self) -> Option<ColorSpace> {
        use ColorSpace::*;
        Some(match self {
            PixelType::Gray => Gray,
            PixelType::RGB => RGB,
            PixelType::CMY => CMY,
            PixelType::CMYK => CMYK,
            PixelType::YCbCr => YCbCr,
            PixelType::YUV => Luv,
            PixelType::XYZ => XYZ,
            PixelType::Lab | PixelType::LabV2 => Lab,
            PixelType::YUVK => LuvK,
            PixelType::HSV => HSV,
            PixelType::HLS => HLS,
            PixelType::Yxy => Yxy,
            PixelType::MCH1 => MCH1,
            PixelType::MCH2 => MCH2,
            PixelType::MCH3 => MCH3,
            PixelType::MCH4 => MCH4,
            PixelType::MCH5 => MCH5,
            PixelType::MCH6 => MCH6,
            PixelType::MCH7 => MCH7,
            PixelType::MCH8 => MCH8,
            PixelType::MCH9 => MCH9,
            PixelType::MCH10 => MCHA,
            PixelType::MCH11 => MCHB,
            PixelType::MCH12 => MCHC,
            PixelType::MCH13 => MCHD,
            PixelType::MCH14 => MCHE,
            PixelType::MCH15 => MCHF,
            PixelType::Any => return None,
        })
    }
}

/// A packed pixel format descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormat(pub u32);

impl PixelFormat {
    /// Creates a chunky integer format.
    pub const fn new(pixel_type: PixelType, channels: u32, bytes: u32) -> Self {
        PixelFormat(colorspace_sh!(pixel_type as u32) | channels_sh!(channels) | bytes_sh!(bytes))
    }

    /// Returns this format with the float flag set.
    pub const fn float(self) -> Self {
        PixelFormat(self.0 | float_sh!(1))
    }

    /// Returns this format with the planar flag set.
    pub const fn planar(self) -> Self {
        PixelFormat(self.0 | planar_sh!(1))
    }

    /// True for floating-point formats.
    pub fn is_float(self) -> bool {
        t_float!(self.0) != 0
    }

    /// Bytes per sample. 0 means 8 (double).
    pub fn bytes(self) -> u32 {
        t_bytes!(self.0)
    }

    /// True for 8-bit integer formats.
    pub fn is_8bit(self) -> bool {
        self.bytes() == 1 && !self.is_float()
    }

    /// Number of color channels.
    pub fn channels(self) -> usize {
        t_channels!(self.0) as usize
    }

    /// True if channels are stored in separate planes.
    pub fn is_planar(self) -> bool {
        t_planar!(self.0) != 0
    }

    /// The pixel type, if known.
    pub fn pixel_type(self) -> Option<PixelType> {
        PixelType::try_from(t_colorspace!(self.0)).ok()
    }

    /// The ICC color space, if known.
    pub fn color_space(self) -> Option<ColorSpace> {
        self.pixel_type().and_then(PixelType::color_space)
    }
}

pub const TYPE_GRAY_8: PixelFormat = PixelFormat::new(PixelType::Gray, 1, 1);
pub const TYPE_GRAY_16: PixelFormat = PixelFormat::new(PixelType::Gray, 1, 2);
pub const TYPE_GRAY_FLT: PixelFormat = PixelFormat::new(PixelType::Gray, 1, 4).float();

pub const TYPE_RGB_8: PixelFormat = PixelFormat::new(PixelType::RGB, 3, 1);
pub const TYPE_RGB_8_PLANAR: PixelFormat = PixelFormat::new(PixelType::RGB, 3, 1).planar();
pub const TYPE_RGB_16: PixelFormat = PixelFormat::new(PixelType::RGB, 3, 2);
pub const TYPE_RGB_16_PLANAR: PixelFormat = PixelFormat::new(PixelType::RGB, 3, 2).planar();
pub const TYPE_RGB_FLT: PixelFormat = PixelFormat::new(PixelType::RGB, 3, 4).float();

pub const TYPE_CMY_8: PixelFormat = PixelFormat::new(PixelType::CMY, 3, 1);
pub const TYPE_CMY_16: PixelFormat = PixelFormat::new(PixelType::CMY, 3, 2);

pub const TYPE_CMYK_8: PixelFormat = PixelFormat::new(PixelType::CMYK, 4, 1);
pub const TYPE_CMYK_16: PixelFormat = PixelFormat::new(PixelType::CMYK, 4, 2);
pub const TYPE_CMYK_FLT: PixelFormat = PixelFormat::new(PixelType::CMYK, 4, 4).float();

pub const TYPE_LAB_8: PixelFormat = PixelFormat::new(PixelType::Lab, 3, 1);
pub const TYPE_LAB_16: PixelFormat = PixelFormat::new(PixelType::Lab, 3, 2);
pub const TYPE_LAB_FLT: PixelFormat = PixelFormat::new(PixelType::Lab, 3, 4).float();
pub const TYPE_XYZ_16: PixelFormat = PixelFormat::new(PixelType::XYZ, 3, 2);

#[test]
fn format_fields() {
    assert!(TYPE_RGB_8.is_8bit());
    assert_eq!(TYPE_RGB_8.channels(), 3);
    assert_eq!(TYPE_RGB_8.pixel_type(), Some(PixelType::RGB));
    assert!(!TYPE_RGB_8.is_planar());
    assert!(TYPE_RGB_16_PLANAR.is_planar());

    assert!(TYPE_RGB_FLT.is_float());
    assert!(!TYPE_RGB_FLT.is_8bit());
    assert_eq!(TYPE_RGB_FLT.bytes(), 4);

    assert_eq!(TYPE_CMYK_16.channels(), 4);
    assert_eq!(TYPE_CMYK_16.color_space(), Some(ColorSpace::CMYK));
    assert_eq!(TYPE_LAB_16.color_space(), Some(ColorSpace::Lab));

    // same values as Little CMS
    assert_eq!(TYPE_RGB_8.0, 0x40019);
    assert_eq!(TYPE_CMYK_16.0, 0x60022);
}
