// ============================================================
// Layer 6 — Artifact Store
// ============================================================
// Saves and restores a trained classifier using Burn's
// CompactRecorder.
//
// Directory layout:
//   <dir>/
//     manifest.json     ← format version, task, labels, max
//                         length and full model config
//     encoder.mpk       ← transformer body weights
//     head.mpk          ← classification head weights
//     tokenizer.json    ← written by TokenizerStore
//     tune_config.json  ← settings of the run that produced it
//
// Encoder and head are recorded separately so a saved model can
// serve as the pretrained starting point of a new run with a
// different number of classes: only encoder.mpk is read back.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::{fs, path::{Path, PathBuf}};

use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::domain::error::{ClfError, Result};
use crate::domain::example::Task;
use crate::ml::model::{ClassifierConfig, TextEncoder, TextEncoderConfig, TransformerClassifier};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const FORMAT_VERSION: u32 = 1;

// Recorder appends the .mpk extension
const ENCODER_RECORD: &str = "encoder";
const HEAD_RECORD: &str    = "head";

/// Everything needed to rebuild the model before loading weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub format_version: u32,
    pub task:           Task,
    pub labels:         Vec<String>,
    pub max_length:     usize,
    pub model:          ClassifierConfig,
}

impl ArtifactManifest {
    pub fn new(task: Task, max_length: usize, model: ClassifierConfig) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            task,
            labels: task.labels().iter().map(|l| l.to_string()).collect(),
            max_length,
            model,
        }
    }
}

pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_manifest(&self, manifest: &ArtifactManifest) -> Result<()> {
        self.save_config(MANIFEST_FILE, manifest)
    }

    /// Read the manifest and reject unknown format versions.
    pub fn load_manifest(&self) -> Result<ArtifactManifest> {
        let path = self.dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Err(ClfError::ResourceUnavailable(format!(
                "no model artifact at '{}'",
                self.dir.display()
            )));
        }
        let manifest: ArtifactManifest = self.load_config(MANIFEST_FILE)?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(ClfError::Artifact(format!(
                "'{}' has format version {}, expected {FORMAT_VERSION}",
                path.display(),
                manifest.format_version
            )));
        }
        Ok(manifest)
    }

    pub fn save_model<B: Backend>(&self, model: &TransformerClassifier<B>) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let recorder = CompactRecorder::new();

        recorder
            .record(model.encoder.clone().into_record(), self.dir.join(ENCODER_RECORD))
            .map_err(|e| ClfError::Artifact(format!("cannot save encoder weights: {e}")))?;
        recorder
            .record(model.head.clone().into_record(), self.dir.join(HEAD_RECORD))
            .map_err(|e| ClfError::Artifact(format!("cannot save head weights: {e}")))?;

        tracing::debug!("Saved model weights to '{}'", self.dir.display());
        Ok(())
    }

    /// Encoder weights only; used to start fine-tuning from a saved model.
    pub fn load_encoder<B: Backend>(
        &self,
        config: &TextEncoderConfig,
        device: &B::Device,
    ) -> Result<TextEncoder<B>> {
        let path   = self.dir.join(ENCODER_RECORD);
        let record = CompactRecorder::new().load(path.clone(), device).map_err(|e| {
            ClfError::ResourceUnavailable(format!(
                "cannot load encoder weights from '{}': {e}",
                path.display()
            ))
        })?;
        Ok(config.init::<B>(device).load_record(record))
    }

    pub fn load_model<B: Backend>(
        &self,
        config: &ClassifierConfig,
        device: &B::Device,
    ) -> Result<TransformerClassifier<B>> {
        let encoder = self.load_encoder::<B>(&config.encoder, device)?;
        let model   = config.init_with_encoder(encoder, device);

        let path   = self.dir.join(HEAD_RECORD);
        let record = CompactRecorder::new().load(path.clone(), device).map_err(|e| {
            ClfError::Artifact(format!("cannot load head weights from '{}': {e}", path.display()))
        })?;

        Ok(TransformerClassifier { head: model.head.load_record(record), ..model })
    }

    /// Write any serialisable value as pretty JSON under `name`.
    pub fn save_config<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(value)?)?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }

    pub fn load_config<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let json = fs::read_to_string(self.dir.join(name))?;
        Ok(serde_json::from_str(&json)?)
    }
}
