use super::clut::ClutTable;
use super::PipelineError;
use crate::color::D50;
use crate::fixed::quick_saturate_word;
use crate::named::NamedColorList;
use crate::pcs::{lab_from_unit, lab_to_unit, xyz_from_unit, xyz_to_unit};
use crate::tone_curve::ToneCurve;
use crate::util::mat3_to_rows;
use cgmath::{Matrix3, Vector3};
use tracing::warn;

/// Stage types.
///
/// A stage has two of these: the structural type, which is determined by its kernel, and the
/// type it implements, which may be more specific. For instance, a Lab V2 to V4 conversion is
/// structurally a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageType {
    /// `cvst`
    CurveSet = 0x63767374,
    /// `matf`
    Matrix = 0x6D617466,
    /// `clut`
    CLut = 0x636C7574,

    /// (non-ICC) `l2x `
    ///
    /// Converts between PCS; 3 inputs & 3 outputs.
    Xyz2Lab = 0x6C327820,
    /// (non-ICC) `x2l `
    ///
    /// Converts between PCS; 3 inputs & 3 outputs.
    Lab2Xyz = 0x78326C20,
    /// (non-ICC) `ncl `
    NamedColor = 0x6E636C20,
    /// (non-ICC) `2 4 `
    LabV2toV4 = 0x32203420,
    /// (non-ICC) `4 2 `
    LabV4toV2 = 0x34203220,

    /// (non-ICC) `idn `
    ///
    /// Copies input to output.
    Identity = 0x69646E20,

    // Float to floatPCS
    /// (non-ICC) `d2l `
    Lab2FloatPCS = 0x64326C20,
    /// (non-ICC) `l2d `
    FloatPCS2Lab = 0x6C326420,
    /// (non-ICC) `d2x `
    XYZ2FloatPCS = 0x64327820,
    /// (non-ICC) `x2d `
    FloatPCS2XYZ = 0x78326420,

    /// (non-ICC) `clp `
    ///
    /// Copies input to output and clamps all values below zero to zero.
    ClipNegatives = 0x636c7020,
}

/// The inner function of a pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageKernel {
    /// Copies input to output.
    ///
    /// The parameter indicates the number of channels.
    Identity(usize),
    /// Applies a set of tone curves.
    ///
    /// The number of tone curves is the number of input and output channels.
    CurveSet(Vec<ToneCurve>),
    /// Applies a matrix and an optional offset.
    ///
    /// The matrix is row-major: the number of rows is the number of outputs, and the number of
    /// columns the number of inputs.
    Matrix {
        rows: usize,
        matrix: Vec<f64>,
        offset: Option<Vec<f64>>,
    },
    /// Interpolates in a color lookup table.
    CLut(ClutTable),
    /// Converts XYZ to L\*a\*b\*.
    ///
    /// This kernel always has 3 input and 3 output channels.
    Xyz2Lab,
    /// Converts L\*a\*b\* to XYZ.
    ///
    /// This kernel always has 3 input and 3 output channels.
    Lab2Xyz,
    /// Clamps negative values to 0.
    ///
    /// The parameter indicates the number of channels.
    ClipNegatives(usize),
    /// Looks up a color by index.
    ///
    /// Outputs either the device colorants or the PCS value of the color.
    NamedColor { list: NamedColorList, use_pcs: bool },
}

impl StageKernel {
    /// Returns the number of input channels.
    pub fn input_channels(&self) -> usize {
        match self {
            Self::Identity(n) => *n,
            Self::CurveSet(c) => c.len(),
            Self::Matrix { rows, matrix, .. } => matrix.len() / rows,
            Self::CLut(table) => table.n_inputs(),
            Self::Xyz2Lab | Self::Lab2Xyz => 3,
            Self::ClipNegatives(n) => *n,
            Self::NamedColor { .. } => 1,
        }
    }

    /// Returns the number of output channels.
    pub fn output_channels(&self) -> usize {
        match self {
            Self::Identity(n) => *n,
            Self::CurveSet(c) => c.len(),
            Self::Matrix { rows, .. } => *rows,
            Self::CLut(table) => table.n_outputs(),
            Self::Xyz2Lab | Self::Lab2Xyz => 3,
            Self::ClipNegatives(n) => *n,
            Self::NamedColor { list, use_pcs } => {
                if *use_pcs {
                    3
                } else {
                    list.colorants()
                }
            }
        }
    }

    /// The structural type of this kernel.
    pub fn stage_type(&self) -> StageType {
        match self {
            Self::Identity(_) => StageType::Identity,
            Self::CurveSet(_) => StageType::CurveSet,
            Self::Matrix { .. } => StageType::Matrix,
            Self::CLut(_) => StageType::CLut,
            Self::Xyz2Lab => StageType::Xyz2Lab,
            Self::Lab2Xyz => StageType::Lab2Xyz,
            Self::ClipNegatives(_) => StageType::ClipNegatives,
            Self::NamedColor { .. } => StageType::NamedColor,
        }
    }

    /// Transforms a color.
    pub fn eval(&self, input: &[f32], output: &mut [f32]) {
        match self {
            Self::Identity(n) => output[..*n].copy_from_slice(&input[..*n]),
            Self::CurveSet(c) => {
                for (i, curve) in c.iter().enumerate() {
                    output[i] = curve.eval_float(input[i]);
                }
            }
            Self::Matrix {
                rows,
                matrix,
                offset,
            } => {
                let cols = matrix.len() / rows;
                for i in 0..*rows {
                    let mut value = 0.;
                    for j in 0..cols {
                        value += input[j] as f64 * matrix[i * cols + j];
                    }
                    if let Some(offset) = offset {
                        value += offset[i];
                    }
                    output[i] = value as f32;
                }
            }
            Self::CLut(table) => table.eval_float(input, output),
            Self::Xyz2Lab => {
                let lab = xyz_from_unit(input).into_lab(D50);
                lab_to_unit(lab, output);
            }
            Self::Lab2Xyz => {
                let xyz = lab_from_unit(input).into_xyz(D50);
                xyz_to_unit(xyz, output);
            }
            Self::ClipNegatives(n) => {
                for i in 0..*n {
                    output[i] = input[i].max(0.);
                }
            }
            Self::NamedColor { list, use_pcs } => {
                let index = quick_saturate_word(input[0] as f64 * 65535.) as usize;
                let color = match list.get(index) {
                    Some(color) => color,
                    None => {
                        warn!("color {} out of range (list has {} colors)", index, list.len());
                        let n = self.output_channels();
                        output[..n].iter_mut().for_each(|v| *v = 0.);
                        return;
                    }
                };
                let values = if *use_pcs {
                    &color.pcs[..]
                } else {
                    &color.device_colorant[..]
                };
                for (out, value) in output.iter_mut().zip(values) {
                    *out = *value as f32 / 65535.;
                }
            }
        }
    }
}

/// A pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    /// The function this stage implements. The kernel should implement it, but may be more
    /// general; see [`StageType`].
    implements: StageType,
    kernel: StageKernel,
}

impl Stage {
    /// Creates a stage from a kernel that implements exactly its structural type.
    pub fn new(kernel: StageKernel) -> Self {
        Stage {
            implements: kernel.stage_type(),
            kernel,
        }
    }

    /// Creates a stage that claims to implement something more specific than its kernel.
    pub fn with_implements(kernel: StageKernel, implements: StageType) -> Self {
        Stage { implements, kernel }
    }

    pub fn new_identity(channels: usize) -> Self {
        Self::new(StageKernel::Identity(channels))
    }

    /// Creates a new CurveSet pipeline stage.
    pub fn new_curve_set(curves: Vec<ToneCurve>) -> Self {
        Self::new(StageKernel::CurveSet(curves))
    }

    /// Creates a new CurveSet pipeline stage with `y = x` tone curves.
    ///
    /// The stage implements [`StageType::Identity`] and is removed when the pipeline is
    /// optimized.
    pub fn new_ident_curve_set(channels: usize) -> Result<Self, PipelineError> {
        let mut curves = Vec::with_capacity(channels);
        for _ in 0..channels {
            curves.push(ToneCurve::new_gamma(1.)?);
        }
        Ok(Self::with_implements(
            StageKernel::CurveSet(curves),
            StageType::Identity,
        ))
    }

    /// Creates a new matrix stage.
    ///
    /// The matrix is row-major, like in the following 3×3 example:
    ///
    /// ```text
    ///  ⎡0 1 2⎤   ⎡in[0]⎤   ⎡out[0]⎤
    ///  ⎢3 4 5⎥ * ⎢in[1]⎥ = ⎢out[1]⎥
    ///  ⎣6 7 8⎦   ⎣in[2]⎦   ⎣out[2]⎦
    /// ```
    ///
    /// The number of columns corresponds to the number of input channels, and the number of
    /// rows to the number of output channels. The offset, if any, needs one entry per row.
    pub fn new_matrix(
        rows: usize,
        matrix: Vec<f64>,
        offset: Option<Vec<f64>>,
    ) -> Result<Self, PipelineError> {
        let bad_offset = offset.as_ref().map_or(false, |offset| offset.len() != rows);
        if rows == 0 || matrix.is_empty() || matrix.len() % rows != 0 || bad_offset {
            warn!("rejecting matrix with {} entries and {} rows", matrix.len(), rows);
            return Err(PipelineError::InvalidMatrix(matrix.len(), rows));
        }

        Ok(Self::new(StageKernel::Matrix {
            rows,
            matrix,
            offset,
        }))
    }

    /// Convenience function for new_matrix.
    pub fn new_matrix3(matrix: Matrix3<f64>, offset: Option<Vector3<f64>>) -> Self {
        Self::new(StageKernel::Matrix {
            rows: 3,
            matrix: mat3_to_rows(matrix),
            offset: offset.map(|off| vec![off.x, off.y, off.z]),
        })
    }

    fn diagonal(implements: StageType, diagonal: [f64; 3], offset: Option<[f64; 3]>) -> Self {
        let [a, b, c] = diagonal;
        Self::with_implements(
            StageKernel::Matrix {
                rows: 3,
                matrix: vec![a, 0., 0., 0., b, 0., 0., 0., c],
                offset: offset.map(|offset| offset.to_vec()),
            },
            implements,
        )
    }

    /// Creates a new stage that converts Lab V2 to Lab V4.
    pub fn new_labv2_to_v4() -> Self {
        let n = 65535. / 65280.;
        Self::diagonal(StageType::LabV2toV4, [n, n, n], None)
    }

    /// Creates a new stage that converts Lab V4 to Lab V2.
    pub fn new_labv4_to_v2() -> Self {
        let n = 65280. / 65535.;
        Self::diagonal(StageType::LabV4toV2, [n, n, n], None)
    }

    /// Creates a new stage that converts floating-point Lab to 0..1.
    pub fn new_normalize_from_lab_float() -> Self {
        Self::diagonal(
            StageType::Lab2FloatPCS,
            [1. / 100., 1. / 255., 1. / 255.],
            Some([0., 128. / 255., 128. / 255.]),
        )
    }

    /// Creates a new stage that converts floating-point XYZ to 0..1.
    pub fn new_normalize_from_xyz_float() -> Self {
        let n = 32768. / 65535.;
        Self::diagonal(StageType::XYZ2FloatPCS, [n, n, n], None)
    }

    /// Creates a new stage that converts 0..1 to floating-point Lab.
    pub fn new_normalize_to_lab_float() -> Self {
        Self::diagonal(
            StageType::FloatPCS2Lab,
            [100., 255., 255.],
            Some([0., -128., -128.]),
        )
    }

    /// Creates a new stage that converts 0..1 to floating-point XYZ.
    pub fn new_normalize_to_xyz_float() -> Self {
        let n = 65535. / 32768.;
        Self::diagonal(StageType::FloatPCS2XYZ, [n, n, n], None)
    }

    /// Creates a new stage that converts XYZ to Lab.
    pub fn new_xyz_to_lab() -> Self {
        Self::new(StageKernel::Xyz2Lab)
    }

    /// Creates a new stage that converts Lab to XYZ.
    pub fn new_lab_to_xyz() -> Self {
        Self::new(StageKernel::Lab2Xyz)
    }

    /// Creates a new stage that clamps all negative values to zero.
    pub fn new_clip_negatives(channels: usize) -> Self {
        Self::new(StageKernel::ClipNegatives(channels))
    }

    /// The structural type of this stage.
    pub fn stage_type(&self) -> StageType {
        self.kernel.stage_type()
    }

    /// The function this stage implements.
    pub fn implements(&self) -> StageType {
        self.implements
    }

    pub fn kernel(&self) -> &StageKernel {
        &self.kernel
    }

    pub(crate) fn kernel_mut(&mut self) -> &mut StageKernel {
        &mut self.kernel
    }

    /// Returns the number of input channels of this stage.
    pub fn input_channels(&self) -> usize {
        self.kernel.input_channels()
    }

    /// Returns the number of output channels of this stage.
    pub fn output_channels(&self) -> usize {
        self.kernel.output_channels()
    }

    /// Transforms a color using the kernel.
    pub fn eval(&self, input: &[f32], output: &mut [f32]) {
        self.kernel.eval(input, output)
    }

    /// The tone curves of a CurveSet stage.
    pub fn curves(&self) -> Option<&[ToneCurve]> {
        match &self.kernel {
            StageKernel::CurveSet(curves) => Some(curves),
            _ => None,
        }
    }

    /// The row-major matrix and offset of a matrix stage.
    pub fn matrix(&self) -> Option<(&[f64], Option<&[f64]>)> {
        match &self.kernel {
            StageKernel::Matrix { matrix, offset, .. } => Some((matrix, offset.as_deref())),
            _ => None,
        }
    }

    /// The table of a CLUT stage.
    pub fn clut(&self) -> Option<&ClutTable> {
        match &self.kernel {
            StageKernel::CLut(table) => Some(table),
            _ => None,
        }
    }
}
