//! Trait for the model execution collaborator.

use ndarray::ArrayD;

/// Runs the ball detection model on one frame.
///
/// Implement this trait to connect any inference runtime to the pipeline.
/// The returned tensor must be laid out as `[1, 5, N]`; anything else is
/// reported as malformed output for that frame.
///
/// # Example
///
/// ```ignore
/// use dribbletrack_rs::InferenceSource;
/// use ndarray::{ArrayD, IxDyn};
///
/// struct MyModel {
///     // Your runtime session here
/// }
///
/// impl InferenceSource for MyModel {
///     type Error = std::io::Error;
///
///     fn infer(&mut self, input: &[u8], width: u32, height: u32) -> Result<ArrayD<f32>, Self::Error> {
///         Ok(ArrayD::zeros(IxDyn(&[1, 5, 0])))
///     }
/// }
/// ```
pub trait InferenceSource {
    /// Error type for inference failures.
    type Error: std::error::Error;

    /// Run the model on raw image data.
    ///
    /// # Arguments
    /// * `input` - Raw image bytes (format depends on implementation)
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    fn infer(&mut self, input: &[u8], width: u32, height: u32) -> Result<ArrayD<f32>, Self::Error>;
}

impl<S: InferenceSource + ?Sized> InferenceSource for Box<S> {
    type Error = S::Error;

    fn infer(&mut self, input: &[u8], width: u32, height: u32) -> Result<ArrayD<f32>, Self::Error> {
        (**self).infer(input, width, height)
    }
}
