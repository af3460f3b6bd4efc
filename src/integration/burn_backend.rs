//! Burn inference backend for the ball detection model.
//!
//! This module provides a `BurnInference` that implements `InferenceSource`
//! for detection models built with the Burn framework.
//!
//! # Example
//!
//! ```ignore
//! use dribbletrack_rs::integration::{BurnInference, BurnModel};
//! use burn::backend::NdArray;
//!
//! struct BallNet { /* ... */ }
//!
//! impl BurnModel<NdArray> for BallNet {
//!     fn forward(&self, input: burn::tensor::Tensor<NdArray, 4>) -> burn::tensor::Tensor<NdArray, 3> {
//!         // [1, 3, 960, 960] -> [1, 5, N]
//!     }
//! }
//!
//! let source = BurnInference::new(BallNet::load("ball.bin"), Default::default());
//! ```

use burn::prelude::*;
use burn::tensor::Tensor;
use ndarray::{ArrayD, IxDyn};

use super::InferenceSource;
use crate::error::InferenceError;

/// Trait for Burn-based ball detection models.
pub trait BurnModel<B: Backend>: Send + Sync {
    /// Run forward pass on a `[batch, channels, height, width]` input.
    ///
    /// Returns the raw `[1, 5, N]` output, one column per anchor.
    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 3>;

    /// Expected input size (channels, height, width).
    fn input_size(&self) -> (u32, u32, u32) {
        (3, 960, 960)
    }
}

/// Burn-based model runner implementing [`InferenceSource`].
pub struct BurnInference<B: Backend, M: BurnModel<B>> {
    model: M,
    device: B::Device,
}

impl<B: Backend, M: BurnModel<B>> BurnInference<B, M> {
    pub fn new(model: M, device: B::Device) -> Self {
        Self { model, device }
    }

    /// Convert interleaved RGB bytes to a normalized `[1, C, H, W]` tensor.
    ///
    /// Frames must already be resized to the model's input size.
    pub fn preprocess(
        &self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Tensor<B, 4>, InferenceError> {
        let (channels, target_h, target_w) = self.model.input_size();
        if height != target_h || width != target_w {
            return Err(InferenceError::Preprocessing(format!(
                "frame is {width}x{height}, model expects {target_w}x{target_h}"
            )));
        }

        let expected_len = (width as usize) * (height as usize) * (channels as usize);
        if input.len() != expected_len {
            let got_width = input.len() / ((height as usize * channels as usize).max(1));
            return Err(InferenceError::InvalidInputDimensions {
                expected: (channels, height, width),
                got: (channels, height, got_width as u32),
            });
        }

        let data: Vec<f32> = input.iter().map(|&x| x as f32 / 255.0).collect();

        // HWC -> CHW
        let tensor = Tensor::<B, 1>::from_floats(data.as_slice(), &self.device)
            .reshape([height as usize, width as usize, channels as usize])
            .permute([2, 0, 1])
            .unsqueeze::<4>();

        Ok(tensor)
    }

    fn postprocess(&self, output: Tensor<B, 3>) -> Result<ArrayD<f32>, InferenceError> {
        let dims = output.dims();
        let values = output
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| InferenceError::Postprocessing(format!("{e:?}")))?;
        ArrayD::from_shape_vec(IxDyn(&dims), values)
            .map_err(|e| InferenceError::Postprocessing(e.to_string()))
    }
}

impl<B: Backend, M: BurnModel<B>> InferenceSource for BurnInference<B, M> {
    type Error = InferenceError;

    fn infer(&mut self, input: &[u8], width: u32, height: u32) -> Result<ArrayD<f32>, Self::Error> {
        let tensor = self.preprocess(input, width, height)?;
        let output = self.model.forward(tensor);
        self.postprocess(output)
    }
}
