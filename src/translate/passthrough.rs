//! No-op translator: copies the source text through unchanged.
//!
//! Useful for timing-only runs (checking segmentation and window placement
//! without paying for translation) and as a harmless default in tests.

use async_trait::async_trait;

use crate::subtitle::Phrase;

use super::{TranslateError, Translator};

#[derive(Debug, Default)]
pub struct PassthroughTranslator;

impl PassthroughTranslator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Translator for PassthroughTranslator {
    async fn translate(&self, phrases: &mut [Phrase]) -> Result<(), TranslateError> {
        for phrase in phrases.iter_mut() {
            phrase.translated_text = phrase.text.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn copies_source_text() {
        let translator = PassthroughTranslator::new();
        let mut list = vec![Phrase::new(0.0, 1.0, "そのまま")];
        translator.translate(&mut list).await.unwrap();
        assert_eq!(list[0].translated_text, "そのまま");
    }
}
