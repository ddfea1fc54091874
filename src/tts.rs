//! Resolves text into a playable file through a filename-keyed cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;

use crate::lock;
use crate::utils::tts::{compute_filename, DEFAULT_FORMAT};

/// A text-to-speech engine that renders `text` into a WAV file at `dest`.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, options: &Value, dest: &Path) -> anyhow::Result<()>;
}

/// Turns text into the path of a file the media server can play.
#[async_trait]
pub trait SpeechResolver: Send + Sync {
    async fn resolve(&self, text: &str, options: &Value) -> anyhow::Result<PathBuf>;
}

/// Filename-keyed cache of synthesized speech in one directory.
///
/// Files only appear under their final name once fully written, so a cache
/// hit never sees a partial file. Concurrent resolves of the same key share
/// one synthesis.
pub struct SpeechCache<S> {
    synthesizer: S,
    cache_dir: PathBuf,
    in_flight: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: Synthesizer> SpeechCache<S> {
    pub fn new(synthesizer: S, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            synthesizer,
            cache_dir: cache_dir.into(),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn cache_path(&self, text: &str, options: &Value) -> PathBuf {
        self.cache_dir.join(compute_filename(text, options, DEFAULT_FORMAT))
    }

    async fn synthesize_into(
        &self,
        text: &str,
        options: &Value,
        target: &Path,
    ) -> anyhow::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .with_context(|| format!("Failed to create cache dir {}", self.cache_dir.display()))?;

        let scratch = scratch_file(&self.cache_dir, ".synth-")?;
        self.synthesizer
            .synthesize(text, options, scratch.path())
            .await
            .context("Speech synthesis failed")?;

        let staged = scratch_file(&self.cache_dir, ".transcode-")?;
        let target = target.to_path_buf();
        tokio::task::spawn_blocking(move || -> anyhow::Result<PathBuf> {
            crate::utils::transcode(scratch.path(), staged.path())?;
            staged
                .persist(&target)
                .map_err(|e| e.error)
                .with_context(|| format!("Failed to store {}", target.display()))?;
            Ok(target)
        })
        .await
        .context("Transcode task failed")?
    }
}

fn scratch_file(dir: &Path, prefix: &str) -> anyhow::Result<tempfile::NamedTempFile> {
    tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".wav")
        .tempfile_in(dir)
        .with_context(|| format!("Failed to create scratch file in {}", dir.display()))
}

#[async_trait]
impl<S: Synthesizer> SpeechResolver for SpeechCache<S> {
    async fn resolve(&self, text: &str, options: &Value) -> anyhow::Result<PathBuf> {
        let target = self.cache_path(text, options);
        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            tracing::debug!("speech cache hit: {}", target.display());
            return Ok(target);
        }

        let key_lock = lock(&self.in_flight).entry(target.clone()).or_default().clone();
        let guard = key_lock.lock().await;
        let result = if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            tracing::debug!("speech cache hit after wait: {}", target.display());
            Ok(target.clone())
        } else {
            self.synthesize_into(text, options, &target).await
        };
        drop(guard);

        let mut in_flight = lock(&self.in_flight);
        // the map and this task hold the only references
        if Arc::strong_count(&key_lock) == 2 {
            in_flight.remove(&target);
        }
        drop(in_flight);

        let path = result?;
        tracing::debug!("speech cached: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    /// Writes a short 16 kHz tone and counts how often it was asked to.
    #[derive(Clone, Default)]
    pub(crate) struct ToneSynthesizer {
        pub(crate) calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Synthesizer for ToneSynthesizer {
        async fn synthesize(
            &self,
            _text: &str,
            _options: &Value,
            dest: &Path,
        ) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let spec = hound::WavSpec {
                channels: 1,
                sample_rate: 16000,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            };
            let mut writer = hound::WavWriter::create(dest, spec)?;
            for i in 0..1600 {
                writer.write_sample(((i % 32) as i16 - 16) * 512)?;
            }
            writer.finalize()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::testing::ToneSynthesizer;
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_resolve_synthesizes_once_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let synthesizer = ToneSynthesizer::default();
        let calls = synthesizer.calls.clone();
        let cache = SpeechCache::new(synthesizer, dir.path().join("tts"));
        let options = json!({
            "voice": "Anna",
            "speed": 0.1,
            "language": "en",
            "cachingFields": ["voice", "speed"]
        });

        let first = cache.resolve("Hello World", &options).await.unwrap();
        let second = cache.resolve("Hello World", &options).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            first.file_name().unwrap().to_str().unwrap(),
            "940c2687367636c07be34668c6d8299f.wav"
        );

        let reader = hound::WavReader::open(&first).unwrap();
        assert_eq!(reader.spec().sample_rate, crate::utils::audio::PLAYBACK_SAMPLE_RATE);
        assert_eq!(reader.duration(), 800);
        assert_eq!(cache_entries(first.parent().unwrap()), vec![first.clone()]);
    }

    fn cache_entries(dir: &Path) -> Vec<PathBuf> {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        entries.sort();
        entries
    }

    struct GarbageSynthesizer;

    #[async_trait]
    impl Synthesizer for GarbageSynthesizer {
        async fn synthesize(
            &self,
            _text: &str,
            _options: &Value,
            dest: &Path,
        ) -> anyhow::Result<()> {
            tokio::fs::write(dest, b"RIFF not really a wav").await?;
            Ok(())
        }
    }

    struct FailingSynthesizer;

    #[async_trait]
    impl Synthesizer for FailingSynthesizer {
        async fn synthesize(
            &self,
            _text: &str,
            _options: &Value,
            _dest: &Path,
        ) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("engine unavailable"))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_resolves_share_one_synthesis() {
        let dir = tempfile::tempdir().unwrap();
        let synthesizer = ToneSynthesizer::default();
        let calls = synthesizer.calls.clone();
        let cache = Arc::new(SpeechCache::new(synthesizer, dir.path()));
        let expected = cache.cache_path("Welcome", &json!({}));

        for _ in 0..10 {
            let tasks: Vec<_> = (0..8)
                .map(|_| {
                    let cache = cache.clone();
                    tokio::spawn(async move { cache.resolve("Welcome", &json!({})).await })
                })
                .collect();
            for task in tasks {
                assert_eq!(task.await.unwrap().unwrap(), expected);
            }
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache_entries(dir.path()), vec![expected.clone()]);
        assert_eq!(hound::WavReader::open(&expected).unwrap().duration(), 800);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resolves_of_different_texts() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(SpeechCache::new(ToneSynthesizer::default(), dir.path()));

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let cache = cache.clone();
                let text = format!("prompt {}", i % 4);
                tokio::spawn(async move { cache.resolve(&text, &json!({})).await })
            })
            .collect();
        for task in tasks {
            let path = task.await.unwrap().unwrap();
            assert_eq!(hound::WavReader::open(&path).unwrap().duration(), 800);
        }
        assert_eq!(cache_entries(dir.path()).len(), 4);
    }

    #[tokio::test]
    async fn test_failed_transcode_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SpeechCache::new(GarbageSynthesizer, dir.path());

        let err = cache.resolve("Hello", &json!({})).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Cannot process audio"));
        assert!(!cache.cache_path("Hello", &json!({})).exists());
        assert!(cache_entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_failed_synthesis_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SpeechCache::new(FailingSynthesizer, dir.path());

        let err = cache.resolve("Hello", &json!({})).await.unwrap_err();
        assert!(format!("{:#}", err).contains("engine unavailable"));
        assert!(cache_entries(dir.path()).is_empty());

        // a later resolve with a working engine is not fooled by leftovers
        let cache = SpeechCache::new(ToneSynthesizer::default(), dir.path());
        let path = cache.resolve("Hello", &json!({})).await.unwrap();
        assert_eq!(hound::WavReader::open(&path).unwrap().duration(), 800);
    }

    #[tokio::test]
    async fn test_different_text_gets_its_own_file() {
        let dir = tempfile::tempdir().unwrap();
        let synthesizer = ToneSynthesizer::default();
        let calls = synthesizer.calls.clone();
        let cache = SpeechCache::new(synthesizer, dir.path());

        let a = cache.resolve("Hello", &json!({})).await.unwrap();
        let b = cache.resolve("Goodbye", &json!({})).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
