/// Serialized model artifacts: loading, schema validation, and the
/// `ModelSet` handed to the prediction pipeline.
///
/// The three artifacts (rain regressor, discharge regressor, flood
/// classifier) are JSON files whose paths come from basin.toml. Each
/// declares its `feature_names` in trained column order; loading fails
/// unless that order matches the pipeline's canonical schema exactly
/// (`predict::REGRESSION_FEATURES` / `predict::FLOOD_FEATURES`). The
/// column order is part of the contract with the trained coefficients, so
/// a mismatch means the artifact and the pipeline disagree about what the
/// numbers mean.
///
/// Artifacts are loaded once at startup and are read-only afterwards; a
/// `ModelSet` is safe to share across concurrent refreshes.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::fs;

use crate::config::ModelPaths;
use crate::predict::{FLOOD_FEATURES, REGRESSION_FEATURES};

// ---------------------------------------------------------------------------
// Prediction capabilities
// ---------------------------------------------------------------------------

/// A pre-trained regression model: ordered feature vector in, scalar out.
pub trait Regressor: Send + Sync {
    fn predict(&self, features: &[f64]) -> f64;
}

/// A pre-trained binary classifier. `predict_probability` is the
/// positive-class probability in [0, 1].
pub trait Classifier: Send + Sync {
    fn predict_class(&self, features: &[f64]) -> bool;
    fn predict_probability(&self, features: &[f64]) -> f64;
}

// ---------------------------------------------------------------------------
// Artifact formats
// ---------------------------------------------------------------------------

/// Linear regression artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearRegressorArtifact {
    pub name: String,
    /// Input columns in trained order; validated against the canonical
    /// schema at load time.
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegressorArtifact {
    fn score(&self, features: &[f64]) -> f64 {
        self.intercept
            + features
                .iter()
                .zip(&self.coefficients)
                .map(|(x, w)| x * w)
                .sum::<f64>()
    }
}

impl Regressor for LinearRegressorArtifact {
    fn predict(&self, features: &[f64]) -> f64 {
        self.score(features)
    }
}

/// Logistic regression artifact for the flood classifier.
///
/// `unknown_feature_fill` is the value the artifact declares for its
/// `unknown_discharge` input, a series the trained schema names but the
/// pipeline never observes. The placeholder is the artifact's data, not a
/// constant invented here.
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticClassifierArtifact {
    pub name: String,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_decision_threshold")]
    pub decision_threshold: f64,
    #[serde(default)]
    pub unknown_feature_fill: f64,
}

fn default_decision_threshold() -> f64 {
    0.5
}

impl LogisticClassifierArtifact {
    fn score(&self, features: &[f64]) -> f64 {
        self.intercept
            + features
                .iter()
                .zip(&self.coefficients)
                .map(|(x, w)| x * w)
                .sum::<f64>()
    }
}

impl Classifier for LogisticClassifierArtifact {
    fn predict_class(&self, features: &[f64]) -> bool {
        self.predict_probability(features) >= self.decision_threshold
    }

    fn predict_probability(&self, features: &[f64]) -> f64 {
        let z = self.score(features);
        1.0 / (1.0 + (-z).exp())
    }
}

// ---------------------------------------------------------------------------
// Loading and validation
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ArtifactError {
    Io { path: String, message: String },
    Decode { path: String, message: String },
    /// The artifact's declared input schema disagrees with the pipeline's.
    Schema { model: String, message: String },
}

impl fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactError::Io { path, message } => {
                write!(f, "failed to read model artifact {}: {}", path, message)
            }
            ArtifactError::Decode { path, message } => {
                write!(f, "failed to decode model artifact {}: {}", path, message)
            }
            ArtifactError::Schema { model, message } => {
                write!(f, "model {} schema mismatch: {}", model, message)
            }
        }
    }
}

impl std::error::Error for ArtifactError {}

fn load_json<T: DeserializeOwned>(path: &str) -> Result<T, ArtifactError> {
    let contents = fs::read_to_string(path).map_err(|e| ArtifactError::Io {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&contents).map_err(|e| ArtifactError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}

/// Validates an artifact's declared column order against the canonical
/// schema, position by position.
fn check_schema(model: &str, declared: &[String], expected: &[&str]) -> Result<(), ArtifactError> {
    if declared.len() != expected.len() {
        return Err(ArtifactError::Schema {
            model: model.to_string(),
            message: format!(
                "expected {} input columns, artifact declares {}",
                expected.len(),
                declared.len()
            ),
        });
    }
    for (position, (declared_name, expected_name)) in declared.iter().zip(expected).enumerate() {
        if declared_name != expected_name {
            return Err(ArtifactError::Schema {
                model: model.to_string(),
                message: format!(
                    "column {} is `{}`, pipeline expects `{}`",
                    position, declared_name, expected_name
                ),
            });
        }
    }
    Ok(())
}

fn check_coefficients(model: &str, coefficients: usize, columns: usize) -> Result<(), ArtifactError> {
    if coefficients != columns {
        return Err(ArtifactError::Schema {
            model: model.to_string(),
            message: format!("{} coefficients for {} input columns", coefficients, columns),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ModelSet
// ---------------------------------------------------------------------------

/// The three model handles, loaded once at startup and passed explicitly
/// into the prediction stage. Tests substitute mock implementations of the
/// traits; production loads the serialized artifacts.
pub struct ModelSet {
    pub rain: Box<dyn Regressor>,
    pub discharge: Box<dyn Regressor>,
    pub flood: Box<dyn Classifier>,
    /// Fill value for the classifier's never-observed `unknown_discharge`
    /// column, as declared by the flood artifact.
    pub unknown_discharge_fill: f64,
}

impl ModelSet {
    /// Loads and validates all three artifacts.
    pub fn load(paths: &ModelPaths) -> Result<Self, ArtifactError> {
        let rain: LinearRegressorArtifact = load_json(&paths.rain)?;
        check_schema(&rain.name, &rain.feature_names, &REGRESSION_FEATURES)?;
        check_coefficients(&rain.name, rain.coefficients.len(), REGRESSION_FEATURES.len())?;

        let discharge: LinearRegressorArtifact = load_json(&paths.discharge)?;
        check_schema(&discharge.name, &discharge.feature_names, &REGRESSION_FEATURES)?;
        check_coefficients(
            &discharge.name,
            discharge.coefficients.len(),
            REGRESSION_FEATURES.len(),
        )?;

        let flood: LogisticClassifierArtifact = load_json(&paths.flood)?;
        check_schema(&flood.name, &flood.feature_names, &FLOOD_FEATURES)?;
        check_coefficients(&flood.name, flood.coefficients.len(), FLOOD_FEATURES.len())?;

        Ok(ModelSet {
            unknown_discharge_fill: flood.unknown_feature_fill,
            rain: Box::new(rain),
            discharge: Box::new(discharge),
            flood: Box::new(flood),
        })
    }
}
