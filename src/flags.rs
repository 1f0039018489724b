//! Transform flags.

use bitflags::bitflags;

bitflags! {
    /// Flags controlling how a pipeline is optimized.
    ///
    /// Bits 16..24 may hold an explicit number of CLUT grid points; see
    /// [`TransformFlags::with_grid_points`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TransformFlags: u32 {
        /// Keep trailing curves out of the resampled CLUT.
        const CLUT_POST_LINEARIZATION = 0x0001;
        /// Always resample into a CLUT.
        const FORCE_CLUT = 0x0002;
        /// Do not patch the CLUT so that white maps exactly onto white.
        const NOWHITEONWHITEFIXUP = 0x0004;
        /// Keep leading curves out of the resampled CLUT, and allow prelinearization of 16-bit
        /// input.
        const CLUT_PRE_LINEARIZATION = 0x0010;
        /// Only perform lossless optimizations.
        const NOOPTIMIZE = 0x0100;
        /// Use more grid points when resampling.
        const HIGHRESPRECALC = 0x0400;
        /// Use fewer grid points when resampling.
        const LOWRESPRECALC = 0x0800;

        /// Explicit grid point count.
        const GRID_POINTS = 0x00ff_0000;
    }
}

impl TransformFlags {
    /// Sets an explicit grid point count for resampled CLUTs (0 clears it).
    pub fn with_grid_points(self, points: u8) -> Self {
        let rest = self.difference(TransformFlags::GRID_POINTS);
        rest | TransformFlags::from_bits_retain((points as u32) << 16)
    }

    /// Returns the explicit grid point count, if any.
    pub fn grid_points(self) -> Option<usize> {
        match (self.bits() >> 16) & 0xff {
            0 => None,
            n => Some(n as usize),
        }
    }
}

#[test]
fn grid_points_field() {
    let flags = TransformFlags::HIGHRESPRECALC.with_grid_points(17);
    assert_eq!(flags.grid_points(), Some(17));
    assert!(flags.contains(TransformFlags::HIGHRESPRECALC));

    let flags = flags.with_grid_points(0);
    assert_eq!(flags.grid_points(), None);
    assert_eq!(flags, TransformFlags::HIGHRESPRECALC);
}
