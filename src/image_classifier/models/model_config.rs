#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub onnx_model_path: String,
    /// One label per line, in model output order.
    pub labels_path: String,
    /// (height, width) of the model input.
    pub input_shape: (u32, u32),
}
