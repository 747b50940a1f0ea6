//! Chunk-and-translate engine.
//!
//! # Data Flow
//! ```text
//! ExtractedText[]
//!     → chunk.rs (wrap + pack into size-bounded chunks)
//!     → one concurrent translator call per chunk, each under a deadline
//!     → barrier: every call finished
//!     → any failure? return the lowest-index chunk's error, apply nothing
//!     → concatenate in chunk order → marker::parse → index → translation
//! ```

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;

use crate::comments::ExtractedText;
use crate::observability::metrics;
use crate::translation::chunk::{chunk, Chunk};
use crate::translation::{marker, Translate, TranslateError};

/// Runs extracted text through a translator and maps results back to origins.
pub struct TranslationEngine<T> {
    translator: Arc<T>,
    max_chunk_bytes: usize,
    call_timeout: Duration,
}

impl<T> Clone for TranslationEngine<T> {
    fn clone(&self) -> Self {
        Self {
            translator: Arc::clone(&self.translator),
            max_chunk_bytes: self.max_chunk_bytes,
            call_timeout: self.call_timeout,
        }
    }
}

impl<T: Translate> TranslationEngine<T> {
    pub fn new(translator: T, max_chunk_bytes: usize, call_timeout: Duration) -> Self {
        Self {
            translator: Arc::new(translator),
            max_chunk_bytes,
            call_timeout,
        }
    }

    /// Translate every entry.
    ///
    /// The returned map only holds origin indices present in `entries`. An
    /// entry whose marker the translator mangled is missing from it.
    pub async fn translate(
        &self,
        entries: &[ExtractedText],
    ) -> Result<BTreeMap<usize, String>, TranslateError> {
        if entries.is_empty() {
            return Ok(BTreeMap::new());
        }

        let chunks = chunk(entries, self.max_chunk_bytes);
        metrics::record_chunks(chunks.len());
        tracing::debug!(entries = entries.len(), chunks = chunks.len(), "Dispatching chunks");

        // join_all yields results in chunk order regardless of completion order.
        let results = join_all(chunks.iter().map(|c| self.translate_chunk(c))).await;

        let mut translated = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(text) => translated.push(text),
                Err(e) => {
                    metrics::record_translation_failure();
                    return Err(e);
                }
            }
        }

        Ok(self.recover(entries, &translated))
    }

    async fn translate_chunk(&self, chunk: &Chunk) -> Result<String, TranslateError> {
        let outcome = tokio::time::timeout(self.call_timeout, self.translator.translate(&chunk.body)).await;
        let result = match outcome {
            Ok(result) => result,
            Err(_) => Err(TranslateError::Timeout(self.call_timeout)),
        };
        if let Err(e) = &result {
            tracing::warn!(chunk = chunk.index, entries = chunk.origins.len(), error = %e, "Chunk translation failed");
        }
        result
    }

    fn recover(&self, entries: &[ExtractedText], translated: &[String]) -> BTreeMap<usize, String> {
        let mut stream = String::new();
        for text in translated {
            stream.push_str(text);
            // A translator that eats the final newline must not glue the next header onto this body.
            if !stream.ends_with('\n') {
                stream.push('\n');
            }
        }

        let known: HashSet<usize> = entries.iter().map(|e| e.index).collect();
        let mut mapping = BTreeMap::new();
        for (index, text) in marker::parse(&stream) {
            if !known.contains(&index) {
                tracing::warn!(index, "Translator returned an unknown marker, dropping it");
                continue;
            }
            mapping.entry(index).or_insert(text);
        }

        if mapping.len() < known.len() {
            tracing::warn!(
                expected = known.len(),
                recovered = mapping.len(),
                "Some entries lost their markers in translation"
            );
        }
        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::Records;
    use crate::translation::Passthrough;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn entry(index: usize, text: &str) -> ExtractedText {
        ExtractedText {
            index,
            text: text.to_string(),
        }
    }

    /// Uppercases bodies, leaving marker lines alone, after a random delay.
    struct JitteryUppercase {
        seed: Mutex<fastrand::Rng>,
        jitter: bool,
    }

    impl JitteryUppercase {
        fn new(jitter: bool) -> Self {
            Self {
                seed: Mutex::new(fastrand::Rng::with_seed(7)),
                jitter,
            }
        }
    }

    impl Translate for JitteryUppercase {
        async fn translate(&self, text: &str) -> Result<String, TranslateError> {
            let delay = if self.jitter {
                let mut rng = self.seed.lock().unwrap();
                rng.u64(0..30)
            } else {
                5
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(text
                .split_inclusive('\n')
                .map(|line| if line.starts_with(marker::DELIMITER) { line.to_string() } else { line.to_uppercase() })
                .collect())
        }
    }

    /// Fails any chunk containing `needle`.
    struct FailOn {
        needle: &'static str,
        calls: AtomicUsize,
    }

    impl Translate for FailOn {
        async fn translate(&self, text: &str) -> Result<String, TranslateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.contains(self.needle) {
                return Err(TranslateError::Status(500));
            }
            Ok(text.to_string())
        }
    }

    /// Answers from a fixed table.
    struct Dictionary(&'static [(&'static str, &'static str)]);

    impl Translate for Dictionary {
        async fn translate(&self, text: &str) -> Result<String, TranslateError> {
            Ok(self.0.iter().fold(text.to_string(), |acc, (from, to)| acc.replace(from, to)))
        }
    }

    #[tokio::test]
    async fn result_is_independent_of_completion_order() {
        let entries: Vec<ExtractedText> = (0..40).map(|i| entry(i * 2, &format!("comment {}\nline two", i))).collect();

        let uniform = TranslationEngine::new(JitteryUppercase::new(false), 40, Duration::from_secs(5));
        let jittery = TranslationEngine::new(JitteryUppercase::new(true), 40, Duration::from_secs(5));

        let expected = uniform.translate(&entries).await.unwrap();
        for _ in 0..5 {
            assert_eq!(jittery.translate(&entries).await.unwrap(), expected);
        }
        assert_eq!(expected.len(), 40);
        assert_eq!(expected[&6], "COMMENT 3\nLINE TWO");
    }

    #[tokio::test]
    async fn one_failed_chunk_fails_everything() {
        let entries = vec![entry(1, "hello"), entry(2, "world")];
        let translator = FailOn {
            needle: "world",
            calls: AtomicUsize::new(0),
        };
        // Each wrapped entry is 10 bytes, so the bound forces two chunks.
        let engine = TranslationEngine::new(translator, 10, Duration::from_secs(5));

        let err = engine.translate(&entries).await.unwrap_err();
        assert!(matches!(err, TranslateError::Status(500)));
        assert_eq!(engine.translator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_translator_times_out() {
        struct Hang;
        impl Translate for Hang {
            async fn translate(&self, _text: &str) -> Result<String, TranslateError> {
                std::future::pending().await
            }
        }

        let engine = TranslationEngine::new(Hang, 5000, Duration::from_secs(20));
        let err = engine.translate(&[entry(0, "x")]).await.unwrap_err();
        assert!(matches!(err, TranslateError::Timeout(d) if d == Duration::from_secs(20)));
    }

    #[tokio::test]
    async fn unknown_markers_are_dropped() {
        let engine = TranslationEngine::new(Dictionary(&[("§1\n", "§9\n")]), 5000, Duration::from_secs(5));
        let mapping = engine.translate(&[entry(1, "a"), entry(2, "b")]).await.unwrap();
        assert_eq!(mapping, BTreeMap::from([(2, "b".to_string())]));
    }

    #[tokio::test]
    async fn missing_trailing_newline_is_tolerated() {
        struct Trim;
        impl Translate for Trim {
            async fn translate(&self, text: &str) -> Result<String, TranslateError> {
                Ok(text.trim_end().to_string())
            }
        }

        let engine = TranslationEngine::new(Trim, 6, Duration::from_secs(5));
        let mapping = engine.translate(&[entry(1, "a"), entry(2, "b")]).await.unwrap();
        assert_eq!(mapping, BTreeMap::from([(1, "a".to_string()), (2, "b".to_string())]));
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let translator = FailOn {
            needle: "",
            calls: AtomicUsize::new(0),
        };
        let engine = TranslationEngine::new(translator, 5000, Duration::from_secs(5));
        assert!(engine.translate(&[]).await.unwrap().is_empty());
        assert_eq!(engine.translator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn three_record_scenario() {
        let body = r#"[{"chat":{"no":1,"content":"こんにちは"}},{"thread":{"resultcode":0}},{"chat":{"no":2,"content":"さようなら"}}]"#;
        let mut records = Records::from_slice(body.as_bytes()).unwrap();
        let untouched = Records::from_slice(body.as_bytes()).unwrap();

        let entries = records.extract();
        assert_eq!(entries, vec![entry(0, "こんにちは"), entry(2, "さようなら")]);

        let translator = Dictionary(&[("こんにちは", "안녕하세요"), ("さようなら", "안녕히 가세요")]);
        let engine = TranslationEngine::new(translator, 5000, Duration::from_secs(5));
        let mapping = engine.translate(&entries).await.unwrap();
        records.reassemble(&mapping);

        let out: serde_json::Value = serde_json::from_slice(&records.to_vec().unwrap()).unwrap();
        let before: serde_json::Value = serde_json::from_slice(&untouched.to_vec().unwrap()).unwrap();
        assert_eq!(out[1], before[1]);
        assert_eq!(out[0]["chat"]["content"], "안녕하세요");
        assert_eq!(out[2]["chat"]["content"], "안녕히 가세요");
        assert_eq!(out[0]["chat"]["no"], 1);
    }

    #[tokio::test]
    async fn identity_translation_round_trips() {
        let body = r#"[{"chat":{"content":"a\nb"}},{"ping":{}},{"chat":{"content":"<tag> & more"}}]"#;
        let mut records = Records::from_slice(body.as_bytes()).unwrap();
        let original = records.to_vec().unwrap();

        let engine = TranslationEngine::new(Passthrough, 8, Duration::from_secs(5));
        let mapping = engine.translate(&records.extract()).await.unwrap();
        records.reassemble(&mapping);
        assert_eq!(records.to_vec().unwrap(), original);
    }
}
