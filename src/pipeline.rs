//! Spoken-question pipeline
//!
//! transcribe -> translate -> extract reference -> fetch verse -> translate
//! back -> synthesize. Each stage is a collaborator behind a trait; the first
//! failing stage stops the run and is named in the error.

use anyhow::{anyhow, Context};
use serde::Serialize;

use crate::core::reference::VerseRef;
use crate::search::engine::SearchEngine;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Transcribe,
    Translate,
    Extract,
    Fetch,
    TranslateBack,
    Synthesize,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Transcribe => "transcribe",
            Self::Translate => "translate",
            Self::Extract => "extract",
            Self::Fetch => "fetch",
            Self::TranslateBack => "translate back",
            Self::Synthesize => "synthesize",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {source:#}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: anyhow::Error,
}

pub trait Transcriber {
    fn transcribe(&self, audio: &[u8]) -> anyhow::Result<String>;
}

pub trait Translator {
    fn translate(&self, text: &str, from: &str, to: &str) -> anyhow::Result<String>;
}

pub trait VerseSource {
    fn fetch(&self, reference: &VerseRef) -> anyhow::Result<String>;
}

pub trait Synthesizer {
    fn synthesize(&self, text: &str, language: &str) -> anyhow::Result<Vec<u8>>;
}

/// Input that is already UTF-8 text
pub struct Utf8Transcriber;

impl Transcriber for Utf8Transcriber {
    fn transcribe(&self, audio: &[u8]) -> anyhow::Result<String> {
        let text = std::str::from_utf8(audio).context("input is not valid UTF-8")?;
        let text = text.trim();
        if text.is_empty() {
            return Err(anyhow!("input is empty"));
        }
        Ok(text.to_string())
    }
}

/// Returns text unchanged
pub struct PassthroughTranslator;

impl Translator for PassthroughTranslator {
    fn translate(&self, text: &str, _from: &str, _to: &str) -> anyhow::Result<String> {
        Ok(text.to_string())
    }
}

impl VerseSource for SearchEngine {
    fn fetch(&self, reference: &VerseRef) -> anyhow::Result<String> {
        self.verse(reference)
            .map(|ayah| ayah.translation)
            .ok_or_else(|| anyhow!("verse {} not found in the Quran corpus", reference))
    }
}

/// Everything the pipeline produced on success
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub transcript: String,
    pub translated: String,
    pub reference: VerseRef,
    pub verse: String,
    pub answer: String,
    #[serde(skip)]
    pub audio: Option<Vec<u8>>,
}

pub struct VoicePipeline<'a> {
    pub transcriber: &'a dyn Transcriber,
    pub translator: &'a dyn Translator,
    pub source: &'a dyn VerseSource,
    pub synthesizer: Option<&'a dyn Synthesizer>,
    /// Language of the user's question and of the answer
    pub user_language: String,
    /// Language the verse source works in
    pub corpus_language: String,
}

impl<'a> VoicePipeline<'a> {
    /// Text-only pipeline over a local verse source
    pub fn text(source: &'a dyn VerseSource) -> Self {
        Self {
            transcriber: &Utf8Transcriber,
            translator: &PassthroughTranslator,
            source,
            synthesizer: None,
            user_language: "en".to_string(),
            corpus_language: "en".to_string(),
        }
    }

    pub fn run(&self, input: &[u8]) -> Result<PipelineOutput, PipelineError> {
        let transcript = stage(Stage::Transcribe, self.transcriber.transcribe(input))?;

        let translated = stage(
            Stage::Translate,
            self.translator
                .translate(&transcript, &self.user_language, &self.corpus_language),
        )?;

        let reference = stage(
            Stage::Extract,
            VerseRef::parse(&translated)
                .ok_or_else(|| anyhow!("no verse reference in \"{}\"", translated)),
        )?;

        let verse = stage(Stage::Fetch, self.source.fetch(&reference))?;

        let answer = stage(
            Stage::TranslateBack,
            self.translator
                .translate(&verse, &self.corpus_language, &self.user_language),
        )?;

        let audio = match self.synthesizer {
            Some(synth) => Some(stage(
                Stage::Synthesize,
                synth.synthesize(&answer, &self.user_language),
            )?),
            None => None,
        };

        tracing::debug!(%reference, "pipeline finished");
        Ok(PipelineOutput {
            transcript,
            translated,
            reference,
            verse,
            answer,
            audio,
        })
    }
}

fn stage<T>(stage: Stage, result: anyhow::Result<T>) -> Result<T, PipelineError> {
    result.map_err(|source| {
        tracing::warn!(%stage, error = %source, "pipeline stage failed");
        PipelineError { stage, source }
    })
}
