use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::imageops::FilterType;
use log::info;
use thiserror::Error;
use tokio::sync::Mutex;
use tract_onnx::prelude::*;

use super::config::ClassifierConfig;
use super::labels::{alias_terms, LabelTable};

const MODEL_FILE: &str = "mobilenetv2-7.onnx";
const LABELS_FILE: &str = "synset.txt";
const INPUT_SIZE: u32 = 224;

type MobilenetModel = TypedSimplePlan<TypedModel>;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("A classification is already in progress")]
    Busy,
    #[error("Failed to fetch model files: {0}")]
    Download(String),
    #[error("Failed to load model: {0}")]
    Model(String),
    #[error("Failed to read image: {0}")]
    Image(#[from] image::ImageError),
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One ranked classifier output.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

impl Prediction {
    /// Lowercase terms this prediction contributes to recipe matching.
    pub fn terms(&self) -> Vec<String> {
        alias_terms(&self.label)
    }
}

#[derive(Clone)]
struct LoadedModel {
    model: Arc<MobilenetModel>,
    labels: Arc<LabelTable>,
}

/// Pretrained MobileNet v2 wrapper. The ONNX graph and its label table are
/// fetched into the data directory on first use and loaded once; inference
/// runs on a blocking task. At most one classification may be in flight.
pub struct IngredientClassifier {
    config: ClassifierConfig,
    model_dir: PathBuf,
    loaded: Mutex<Option<LoadedModel>>,
    busy: AtomicBool,
}

impl IngredientClassifier {
    pub fn new<P: Into<PathBuf>>(config: ClassifierConfig, model_dir: P) -> Self {
        Self {
            config,
            model_dir: model_dir.into(),
            loaded: Mutex::new(None),
            busy: AtomicBool::new(false),
        }
    }

    /// Classifies the image at `image_path` into ranked (label, confidence)
    /// predictions. Rejects with [`ClassifierError::Busy`] while another
    /// classification is still running.
    pub async fn classify(&self, image_path: &Path) -> Result<Vec<Prediction>, ClassifierError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ClassifierError::Busy);
        }

        let result = self.classify_inner(image_path).await;
        self.busy.store(false, Ordering::SeqCst);
        result
    }

    async fn classify_inner(&self, image_path: &Path) -> Result<Vec<Prediction>, ClassifierError> {
        let LoadedModel { model, labels } = self.ensure_loaded().await?;

        let path = image_path.to_path_buf();
        let top_k = self.config.top_k;

        tokio::task::spawn_blocking(move || run_inference(&model, &labels, &path, top_k))
            .await
            .map_err(|e| ClassifierError::Inference(e.to_string()))?
    }

    async fn ensure_loaded(&self) -> Result<LoadedModel, ClassifierError> {
        let mut loaded = self.loaded.lock().await;
        if let Some(model) = loaded.as_ref() {
            return Ok(model.clone());
        }

        let (model_path, labels_path) = self.ensure_files().await?;

        let labels = LabelTable::parse(&std::fs::read_to_string(&labels_path)?);
        if labels.is_empty() {
            return Err(ClassifierError::Model(format!(
                "Label table {} is empty",
                labels_path.display()
            )));
        }

        let model = tract_onnx::onnx()
            .model_for_path(&model_path)
            .map_err(|e| ClassifierError::Model(e.to_string()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, 224, 224)),
            )
            .map_err(|e| ClassifierError::Model(e.to_string()))?
            .into_optimized()
            .map_err(|e| ClassifierError::Model(e.to_string()))?
            .into_runnable()
            .map_err(|e| ClassifierError::Model(e.to_string()))?;

        info!("Loaded classification model from {}", model_path.display());

        let model = LoadedModel {
            model: Arc::new(model),
            labels: Arc::new(labels),
        };
        *loaded = Some(model.clone());
        Ok(model)
    }

    async fn ensure_files(&self) -> Result<(PathBuf, PathBuf), ClassifierError> {
        std::fs::create_dir_all(&self.model_dir)?;

        let model_path = self.model_dir.join(MODEL_FILE);
        let labels_path = self.model_dir.join(LABELS_FILE);

        if !model_path.exists() {
            download(&self.config.model_url, &model_path).await?;
        }
        if !labels_path.exists() {
            download(&self.config.labels_url, &labels_path).await?;
        }

        Ok((model_path, labels_path))
    }
}

async fn download(url: &str, dest: &Path) -> Result<(), ClassifierError> {
    info!("Fetching {} into {}", url, dest.display());

    let response = reqwest::get(url)
        .await
        .map_err(|e| ClassifierError::Download(e.to_string()))?;

    if !response.status().is_success() {
        return Err(ClassifierError::Download(format!(
            "{} answered with status {}",
            url,
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ClassifierError::Download(e.to_string()))?;

    std::fs::write(dest, &bytes)?;
    Ok(())
}

fn run_inference(
    model: &MobilenetModel,
    labels: &LabelTable,
    path: &Path,
    top_k: usize,
) -> Result<Vec<Prediction>, ClassifierError> {
    let img = image::open(path)?.to_rgb8();
    let resized = image::imageops::resize(&img, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

    let size = INPUT_SIZE as usize;
    let input: Tensor =
        tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, c, y, x)| {
            let mean = [0.485, 0.456, 0.406][c];
            let std = [0.229, 0.224, 0.225][c];
            (resized[(x as u32, y as u32)][c] as f32 / 255.0 - mean) / std
        })
        .into();

    let result = model
        .run(tvec!(input.into()))
        .map_err(|e| ClassifierError::Inference(e.to_string()))?;

    let scores: Vec<f32> = result[0]
        .to_array_view::<f32>()
        .map_err(|e| ClassifierError::Inference(e.to_string()))?
        .iter()
        .copied()
        .collect();

    Ok(rank_predictions(&scores, labels, top_k))
}

fn rank_predictions(scores: &[f32], labels: &LabelTable, top_k: usize) -> Vec<Prediction> {
    let probabilities = softmax(scores);

    let mut indexed: Vec<(usize, f32)> = probabilities.into_iter().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    indexed
        .into_iter()
        .take(top_k)
        .filter_map(|(class, confidence)| {
            labels.get(class).map(|label| Prediction {
                label: label.to_string(),
                confidence,
            })
        })
        .collect()
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();

    if sum == 0.0 {
        return vec![0.0; scores.len()];
    }
    exps.iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_predictions_orders_by_confidence() {
        let labels = LabelTable::parse("tench\ngoldfish\nhotdog, hot dog\n");
        let predictions = rank_predictions(&[0.1, 2.0, 1.0], &labels, 2);

        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].label, "goldfish");
        assert_eq!(predictions[1].label, "hotdog, hot dog");
        assert!(predictions[0].confidence > predictions[1].confidence);
    }

    #[test]
    fn test_prediction_terms_are_lowercase_aliases() {
        let prediction = Prediction {
            label: "Granny Smith, apple".to_string(),
            confidence: 0.8,
        };
        assert_eq!(prediction.terms(), vec!["granny smith", "apple"]);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probabilities = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probabilities[2] > probabilities[1]);
    }

    #[tokio::test]
    async fn test_second_classification_is_rejected_while_busy() {
        let classifier =
            IngredientClassifier::new(ClassifierConfig::from_env(), "target/test-models");
        classifier.busy.store(true, Ordering::SeqCst);

        match classifier.classify(Path::new("photo.jpg")).await {
            Err(ClassifierError::Busy) => {}
            other => panic!("expected busy rejection, got {:?}", other.map(|p| p.len())),
        }
    }
}
