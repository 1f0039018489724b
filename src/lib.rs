//! Color transform pipelines.
//!
//! Heavily based on Little CMS.
//!
//! A [`Pipeline`](pipeline/struct.Pipeline.html) is a chain of stages (tone curves, matrices,
//! lookup tables, PCS conversions) that maps colors in one encoding to colors in another. It can
//! be evaluated in floating point, in 16-bit, or backwards by Newton iteration. Before bulk use,
//! [`optimize_pipeline`](optimize/fn.optimize_pipeline.html) rewrites it into something faster
//! to evaluate for given pixel formats.
//!
//! # Examples
//! ## Converting Linear RGB to Gamma-Encoded RGB
//!
//! ```
//! # use rcms_transform::{*, pipeline::*, optimize::optimize_pipeline};
//! // a pipeline from linear RGB to a slightly different, gamma-encoded RGB
//! let mut pipeline = Pipeline::from_stages(vec![
//!     Stage::new_matrix(3, vec![
//!         0.9, 0.1, 0.,
//!         0.05, 0.9, 0.05,
//!         0., 0.1, 0.9,
//!     ], None).unwrap(),
//!     Stage::new_curve_set(vec![ToneCurve::new_gamma(1. / 2.2).unwrap(); 3]),
//! ]).unwrap();
//!
//! // colors are represented as arrays of floating-point numbers in the range from 0 to 1
//! let mut out_color = [0.; 3];
//! pipeline.eval_float(&[0.2, 0.5, 0.8], &mut out_color);
//!
//! // resample into a lookup table for 16-bit pixels
//! let reference = pipeline.clone();
//! let mut flags = TransformFlags::empty();
//! assert!(optimize_pipeline(
//!     &mut pipeline,
//!     Intent::Perceptual,
//!     TYPE_RGB_16,
//!     TYPE_RGB_16,
//!     &mut flags,
//! ));
//!
//! let mut out16 = [0; 3];
//! let mut expected = [0; 3];
//! pipeline.eval_16(&[0x3333, 0x8000, 0xcccc], &mut out16);
//! reference.eval_16(&[0x3333, 0x8000, 0xcccc], &mut expected);
//! for (a, b) in out16.iter().zip(&expected) {
//!     assert!((*a as i32 - *b as i32).abs() < 0x100);
//! }
//! ```

#[macro_use]
mod util;
#[macro_use]
mod macros;

pub mod color;
pub mod fixed;
pub mod flags;
pub mod format;
pub mod interp;
pub mod named;
pub mod optimize;
pub mod pcs;
pub mod pipeline;
pub mod tone_curve;
mod types;

pub use flags::TransformFlags;
pub use format::*;
pub use tone_curve::ToneCurve;
pub use types::*;
