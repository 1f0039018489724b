//! Color transform pipelines.
//!
//! A [`Pipeline`] is a chain of [`Stage`]s. Every stage reads and writes floats, usually in
//! 0..1. Adjacent stages must agree on the number of channels, which is checked whenever a
//! stage is inserted.
//!
//! Pipelines can be evaluated with 16-bit or float values. The 16-bit path may be replaced by
//! a specialized evaluator (see [`crate::optimize`]); the float path always walks the stages.

use crate::fixed::quick_saturate_word;
use std::fmt;
use tracing::warn;

mod clut;
mod reverse;
mod stage;

pub use crate::interp::MAX_STAGE_CHANNELS;
pub use clut::ClutTable;
pub use stage::{Stage, StageKernel, StageType};

/// Pipeline errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// Output (0) and input (1) channels do not match.
    #[error("pipeline channel mismatch: {0} output channels feeding into {1} input channels")]
    ChannelMismatch(usize, usize),
    /// A stage has more than [`MAX_STAGE_CHANNELS`] channels.
    #[error("stage has {0} channels (at most {max} are supported)", max = MAX_STAGE_CHANNELS)]
    TooManyChannels(usize),
    /// A matrix with (0) entries cannot have (1) rows.
    #[error("matrix with {0} entries cannot have {1} rows")]
    InvalidMatrix(usize, usize),
    /// A CLUT with (0) inputs and (1) outputs has an unusable grid.
    #[error("invalid CLUT grid ({0} -> {1} channels)")]
    InvalidClut(usize, usize),
    #[error("CLUT size overflow")]
    ClutTooLarge,
    #[error("stage is not a CLUT of the requested type")]
    NotAClut,
    /// A CLUT sampler returned false.
    #[error("CLUT sampling aborted")]
    SamplingAborted,
    /// Reverse evaluation of a pipeline with (0) inputs and (1) outputs.
    #[error("cannot reverse a pipeline with {0} inputs and {1} outputs")]
    NotReversible(usize, usize),
    #[error(transparent)]
    Interp(#[from] crate::interp::InterpError),
}

/// A specialized 16-bit evaluator installed by the optimizer.
///
/// It must compute the same function as the stages of the pipeline it was built for.
pub trait OptimizedEval: Send + Sync + fmt::Debug {
    /// Transforms a color.
    fn eval_16(&self, input: &[u16], output: &mut [u16]);

    /// Returns an independent copy.
    fn duplicate(&self) -> Box<dyn OptimizedEval>;
}

/// How a pipeline evaluates 16-bit values.
#[derive(Debug)]
enum Evaluator {
    /// Walks the stages in float.
    Default,
    Specialized(Box<dyn OptimizedEval>),
}

impl Clone for Evaluator {
    fn clone(&self) -> Self {
        match self {
            Evaluator::Default => Evaluator::Default,
            Evaluator::Specialized(eval) => Evaluator::Specialized(eval.duplicate()),
        }
    }
}

/// Where to insert or unlink a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageLoc {
    Begin,
    End,
}

/// A color transform pipeline.
///
/// A pipeline can be built using `insert_stage` and can transform a color using `eval_float`
/// or `eval_16`.
///
/// # Examples
/// ```
/// # use rcms_transform::pipeline::*;
/// let mut pipeline = Pipeline::new(3, 3);
/// pipeline
///     .insert_stage(StageLoc::End, Stage::new_matrix(
///         3,
///         vec![0.5, 0., 0., 0., 0.5, 0., 0., 0., 0.5],
///         None,
///     ).unwrap())
///     .unwrap();
///
/// let mut out = [0.; 3];
/// pipeline.eval_float(&[1., 0.5, 0.], &mut out);
/// assert_eq!(out, [0.5, 0.25, 0.]);
///
/// let mut out16 = [0; 3];
/// pipeline.eval_16(&[0xffff, 0x8000, 0], &mut out16);
/// assert_eq!(out16, [0x8000, 0x4000, 0]);
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
    input_channels: usize,
    output_channels: usize,
    evaluator: Evaluator,
}

impl PartialEq for Pipeline {
    fn eq(&self, other: &Self) -> bool {
        self.input_channels == other.input_channels
            && self.output_channels == other.output_channels
            && self.stages == other.stages
    }
}

impl Pipeline {
    /// Creates a new empty pipeline.
    ///
    /// An empty pipeline copies its input to its output. Once it has stages, the channel counts
    /// are taken from the first and last stage.
    pub fn new(input_channels: usize, output_channels: usize) -> Self {
        Pipeline {
            stages: Vec::new(),
            input_channels,
            output_channels,
            evaluator: Evaluator::Default,
        }
    }

    /// Creates a pipeline from a list of stages.
    pub fn from_stages(stages: Vec<Stage>) -> Result<Self, PipelineError> {
        let mut pipeline = Pipeline::new(0, 0);
        for stage in stages {
            pipeline.insert_stage(StageLoc::End, stage)?;
        }
        Ok(pipeline)
    }

    /// Returns the number of input channels.
    pub fn input_channels(&self) -> usize {
        self.input_channels
    }

    /// Returns the number of output channels.
    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    /// Updates the number of channels from the first and last stage of this pipeline.
    fn update_channels(&mut self) {
        if let (Some(first), Some(last)) = (self.stages.first(), self.stages.last()) {
            self.input_channels = first.input_channels();
            self.output_channels = last.output_channels();
        }
    }

    /// Returns the inner pipeline stages.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Mutable access to the stages. Drops any specialized evaluator.
    pub(crate) fn stages_mut(&mut self) -> &mut [Stage] {
        self.evaluator = Evaluator::Default;
        &mut self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Inserts a stage at the beginning or the end.
    ///
    /// The stage must fit: a stage at the beginning must have as many outputs as the first stage
    /// has inputs, and a stage at the end as many inputs as the last stage has outputs. Any stage
    /// fits into an empty pipeline. On error, the pipeline is left unchanged.
    ///
    /// # Examples
    /// ```
    /// # use rcms_transform::pipeline::*;
    /// let mut pipeline = Pipeline::new(3, 3);
    ///
    /// // this stage has 3 inputs and 1 output.
    /// // an empty pipeline accepts any number of channels
    /// pipeline.insert_stage(StageLoc::End, Stage::new_matrix(
    ///     1,
    ///     vec![1., 2., 3.],
    ///     None,
    /// ).unwrap()).unwrap();
    ///
    /// // the pipeline now has 1 output
    /// assert_eq!(pipeline.output_channels(), 1);
    ///
    /// // this stage as 2 inputs and 2 outputs and cannot be added to this pipeline
    /// pipeline.insert_stage(StageLoc::End, Stage::new_identity(2)).unwrap_err();
    /// assert_eq!(pipeline.stages().len(), 1);
    /// ```
    pub fn insert_stage(&mut self, loc: StageLoc, stage: Stage) -> Result<(), PipelineError> {
        let channels = stage.input_channels().max(stage.output_channels());
        if channels > MAX_STAGE_CHANNELS {
            warn!("rejecting stage with {} channels", channels);
            return Err(PipelineError::TooManyChannels(channels));
        }

        if !self.stages.is_empty() {
            let (prev_output, next_input) = match loc {
                StageLoc::Begin => (stage.output_channels(), self.input_channels),
                StageLoc::End => (self.output_channels, stage.input_channels()),
            };
            if prev_output != next_input {
                warn!(
                    "cannot insert {:?} stage: {} outputs feeding into {} inputs",
                    stage.stage_type(),
                    prev_output,
                    next_input
                );
                return Err(PipelineError::ChannelMismatch(prev_output, next_input));
            }
        }

        match loc {
            StageLoc::Begin => self.stages.insert(0, stage),
            StageLoc::End => self.stages.push(stage),
        }
        self.update_channels();
        self.evaluator = Evaluator::Default;
        Ok(())
    }

    /// Removes the first or last stage and returns it.
    ///
    /// Removing the last remaining stage leaves the channel counts as they were.
    pub fn unlink_stage(&mut self, loc: StageLoc) -> Option<Stage> {
        if self.stages.is_empty() {
            return None;
        }
        let stage = match loc {
            StageLoc::Begin => self.stages.remove(0),
            StageLoc::End => self.stages.pop()?,
        };
        self.update_channels();
        self.evaluator = Evaluator::Default;
        Some(stage)
    }

    /// Appends copies of the stages of another pipeline.
    ///
    /// The number of output channels of this pipeline and the number of input channels of the
    /// other must match, unless one of them is empty. On error, the pipeline is left unchanged.
    pub fn concat(&mut self, other: &Pipeline) -> Result<(), PipelineError> {
        if self.stages.is_empty() && other.stages.is_empty() {
            self.input_channels = other.input_channels;
            self.output_channels = other.output_channels;
            self.evaluator = Evaluator::Default;
            return Ok(());
        }

        let prev_output = self.output_channels;
        let next_input = other.input_channels;
        if !self.stages.is_empty() && !other.stages.is_empty() && prev_output != next_input {
            warn!(
                "cannot concatenate pipelines: {} outputs feeding into {} inputs",
                prev_output, next_input
            );
            return Err(PipelineError::ChannelMismatch(prev_output, next_input));
        }

        self.stages.extend(other.stages.iter().cloned());
        self.update_channels();
        self.evaluator = Evaluator::Default;
        Ok(())
    }

    /// Returns the stages if the pipeline consists of exactly the given sequence of structural
    /// stage types.
    ///
    /// # Examples
    /// ```
    /// # use rcms_transform::pipeline::*;
    /// let pipeline = Pipeline::from_stages(vec![
    ///     Stage::new_xyz_to_lab(),
    ///     Stage::new_labv4_to_v2(),
    /// ]).unwrap();
    ///
    /// // the Lab V4 to V2 conversion is a matrix
    /// let stages = pipeline.match_stages(&[StageType::Xyz2Lab, StageType::Matrix]).unwrap();
    /// assert_eq!(stages[1].implements(), StageType::LabV4toV2);
    ///
    /// assert!(pipeline.match_stages(&[StageType::Xyz2Lab]).is_none());
    /// ```
    pub fn match_stages(&self, types: &[StageType]) -> Option<Vec<&Stage>> {
        if self.stages.len() != types.len() {
            return None;
        }
        if self
            .stages
            .iter()
            .zip(types)
            .any(|(stage, ty)| stage.stage_type() != *ty)
        {
            return None;
        }
        Some(self.stages.iter().collect())
    }

    /// Installs a specialized 16-bit evaluator.
    pub fn set_optimization(&mut self, eval: Box<dyn OptimizedEval>) {
        self.evaluator = Evaluator::Specialized(eval);
    }

    /// The specialized 16-bit evaluator, if any.
    pub fn optimization(&self) -> Option<&dyn OptimizedEval> {
        match &self.evaluator {
            Evaluator::Default => None,
            Evaluator::Specialized(eval) => Some(eval.as_ref()),
        }
    }

    /// Evaluates the pipeline for a single 16-bit color.
    ///
    /// The input and output arrays should be appropriately sized:
    ///
    /// - input should be at least input_channels in size
    /// - output should be at least output_channels in size
    pub fn eval_16(&self, input: &[u16], output: &mut [u16]) {
        match &self.evaluator {
            Evaluator::Specialized(eval) => eval.eval_16(input, output),
            Evaluator::Default => {
                let mut float_in = [0.; MAX_STAGE_CHANNELS];
                let mut float_out = [0.; MAX_STAGE_CHANNELS];

                for (f, v) in float_in.iter_mut().zip(&input[..self.input_channels]) {
                    *f = *v as f32 / 65535.;
                }
                self.eval_float(&float_in, &mut float_out);
                for (v, f) in output.iter_mut().zip(&float_out[..self.output_channels]) {
                    *v = quick_saturate_word(*f as f64 * 65535.);
                }
            }
        }
    }

    /// Evaluates the pipeline for a single float color by walking all stages.
    pub fn eval_float(&self, input: &[f32], output: &mut [f32]) {
        let mut phase = 0;
        let mut storage = [[0.; MAX_STAGE_CHANNELS], [0.; MAX_STAGE_CHANNELS]];

        storage[phase][..self.input_channels].copy_from_slice(&input[..self.input_channels]);

        for stage in &self.stages {
            let next_phase = phase ^ 1;

            let (a, b) = storage.split_at_mut(1);
            let (src_value, dest_value) = if next_phase == 0 { (b, a) } else { (a, b) };
            stage.eval(&src_value[0], &mut dest_value[0]);

            phase = next_phase;
        }

        output[..self.output_channels].copy_from_slice(&storage[phase][..self.output_channels]);
    }
}

#[cfg(test)]
mod tests;
