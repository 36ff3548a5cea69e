use std::env;

const DEFAULT_MODEL_URL: &str =
    "https://github.com/onnx/models/raw/main/validated/vision/classification/mobilenet/model/mobilenetv2-7.onnx";
const DEFAULT_LABELS_URL: &str =
    "https://raw.githubusercontent.com/onnx/models/main/validated/vision/classification/synset.txt";

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub model_url: String,
    pub labels_url: String,
    pub top_k: usize,
}

impl ClassifierConfig {
    pub fn from_env() -> Self {
        let top_k = env::var("CLASSIFIER_TOP_K")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        Self {
            model_url: env::var("MODEL_URL").unwrap_or_else(|_| DEFAULT_MODEL_URL.to_string()),
            labels_url: env::var("LABELS_URL").unwrap_or_else(|_| DEFAULT_LABELS_URL.to_string()),
            top_k,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
