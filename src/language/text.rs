// SPDX-License-Identifier: MIT
//! Built-in plain-text language service.
//!
//! Gives the daemon a working pipeline out of the box: completions are the
//! identifier words already present in the buffer, diagnostics flag
//! unbalanced brackets, and the info tip shows the word under the cursor.
//! Real language backends register through the same factory interface.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cancel::CancelSignal;

use super::registry::LanguageFactory;
use super::service::{
    CompletionItem, Diagnostic, InfoTip, LanguageConfig, LanguageService, Severity, Span,
};

const DEFAULT_MIN_WORD_LENGTH: usize = 3;
const DEFAULT_MAX_COMPLETIONS: usize = 32;
/// Chars scanned between cancellation polls during diagnostics.
const CANCEL_POLL_STRIDE: usize = 4096;

#[derive(Debug, Clone)]
pub struct TextLanguageService {
    min_word_length: usize,
    max_completions: usize,
}

impl Default for TextLanguageService {
    fn default() -> Self {
        Self {
            min_word_length: DEFAULT_MIN_WORD_LENGTH,
            max_completions: DEFAULT_MAX_COMPLETIONS,
        }
    }
}

impl TextLanguageService {
    /// Build from opaque per-language settings (`minWordLength`,
    /// `maxCompletions`); anything absent falls back to defaults, anything
    /// malformed is a configuration error.
    pub fn from_config(config: &LanguageConfig) -> anyhow::Result<Self> {
        let mut service = Self::default();
        if let Some(settings) = config.settings.as_object() {
            if let Some(value) = settings.get("minWordLength") {
                service.min_word_length = value
                    .as_u64()
                    .ok_or_else(|| anyhow::anyhow!("minWordLength must be an integer"))?
                    as usize;
            }
            if let Some(value) = settings.get("maxCompletions") {
                service.max_completions = value
                    .as_u64()
                    .ok_or_else(|| anyhow::anyhow!("maxCompletions must be an integer"))?
                    as usize;
            }
        }
        Ok(service)
    }

    pub fn factory() -> LanguageFactory {
        Arc::new(|config: &LanguageConfig| {
            Ok(Arc::new(Self::from_config(config)?) as Arc<dyn LanguageService>)
        })
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// The word whose char range contains `position`, if any.
fn word_at(chars: &[char], position: usize) -> Option<(String, Span)> {
    if position >= chars.len() || !is_word_char(chars[position]) {
        return None;
    }
    let mut start = position;
    while start > 0 && is_word_char(chars[start - 1]) {
        start -= 1;
    }
    let mut end = position + 1;
    while end < chars.len() && is_word_char(chars[end]) {
        end += 1;
    }
    let word: String = chars[start..end].iter().collect();
    Some((word, Span::new(start, end - start)))
}

/// The partial word ending exactly at `cursor` (what the user is typing).
fn prefix_before(chars: &[char], cursor: usize) -> String {
    let cursor = cursor.min(chars.len());
    let mut start = cursor;
    while start > 0 && is_word_char(chars[start - 1]) {
        start -= 1;
    }
    chars[start..cursor].iter().collect()
}

#[async_trait]
impl LanguageService for TextLanguageService {
    fn name(&self) -> &str {
        "text"
    }

    async fn completions(
        &self,
        text: &str,
        cursor: usize,
        cancel: &CancelSignal,
    ) -> anyhow::Result<Vec<CompletionItem>> {
        cancel.bail_if_cancelled()?;
        let chars: Vec<char> = text.chars().collect();
        let prefix = prefix_before(&chars, cursor);
        if prefix.is_empty() {
            return Ok(Vec::new());
        }

        let mut candidates = BTreeSet::new();
        for word in text.split(|ch| !is_word_char(ch)) {
            if word.chars().count() >= self.min_word_length
                && word != prefix
                && word.starts_with(&prefix)
            {
                candidates.insert(word.to_string());
            }
        }

        Ok(candidates
            .into_iter()
            .take(self.max_completions)
            .map(|word| CompletionItem::new(word).with_kind("word"))
            .collect())
    }

    async fn diagnostics(
        &self,
        text: &str,
        cancel: &CancelSignal,
    ) -> anyhow::Result<Vec<Diagnostic>> {
        let mut diagnostics = Vec::new();
        let mut open_stack: Vec<(char, usize)> = Vec::new();

        for (position, ch) in text.chars().enumerate() {
            if position % CANCEL_POLL_STRIDE == 0 {
                cancel.bail_if_cancelled()?;
            }
            match ch {
                '(' | '[' | '{' => open_stack.push((ch, position)),
                ')' | ']' | '}' => {
                    let expected = match ch {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match open_stack.pop() {
                        Some((open, _)) if open == expected => {}
                        Some((open, open_position)) => {
                            diagnostics.push(Diagnostic {
                                message: format!("'{ch}' does not match '{open}'"),
                                severity: Severity::Error,
                                span: Span::new(position, 1),
                            });
                            // Re-push: the open bracket is still unclosed.
                            open_stack.push((open, open_position));
                        }
                        None => diagnostics.push(Diagnostic {
                            message: format!("unmatched '{ch}'"),
                            severity: Severity::Error,
                            span: Span::new(position, 1),
                        }),
                    }
                }
                _ => {}
            }
        }

        for (open, position) in open_stack {
            diagnostics.push(Diagnostic {
                message: format!("unclosed '{open}'"),
                severity: Severity::Error,
                span: Span::new(position, 1),
            });
        }

        diagnostics.sort_by_key(|diagnostic| diagnostic.span.start);
        Ok(diagnostics)
    }

    async fn info_tip(
        &self,
        text: &str,
        position: usize,
        cancel: &CancelSignal,
    ) -> anyhow::Result<Option<InfoTip>> {
        cancel.bail_if_cancelled()?;
        let chars: Vec<char> = text.chars().collect();
        let Some((word, span)) = word_at(&chars, position) else {
            return Ok(None);
        };

        let occurrences = text
            .split(|ch| !is_word_char(ch))
            .filter(|candidate| *candidate == word)
            .count();
        Ok(Some(InfoTip {
            text: format!("{word} — {occurrences} occurrence(s)"),
            span,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TextLanguageService {
        TextLanguageService::default()
    }

    #[tokio::test]
    async fn completions_match_typed_prefix() {
        let text = "letter lettuce lead le";
        let items = service()
            .completions(text, text.chars().count(), &CancelSignal::new())
            .await
            .unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.display_text.as_str()).collect();
        assert_eq!(names, vec!["lead", "letter", "lettuce"]);
    }

    #[tokio::test]
    async fn no_prefix_no_completions() {
        let items = service()
            .completions("alpha beta ", 11, &CancelSignal::new())
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn unbalanced_brackets_reported() {
        let diagnostics = service()
            .diagnostics("fn main( { }", &CancelSignal::new())
            .await
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].span, Span::new(7, 1));
        assert!(diagnostics[0].message.contains("unclosed"));
    }

    #[tokio::test]
    async fn balanced_text_is_clean() {
        let diagnostics = service()
            .diagnostics("fn main() { [1, 2] }", &CancelSignal::new())
            .await
            .unwrap();
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn info_tip_counts_occurrences() {
        let tip = service()
            .info_tip("count the count", 1, &CancelSignal::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tip.span, Span::new(0, 5));
        assert!(tip.text.contains("2 occurrence"));
    }

    #[tokio::test]
    async fn info_tip_absent_on_whitespace() {
        let tip = service()
            .info_tip("a b", 1, &CancelSignal::new())
            .await
            .unwrap();
        assert!(tip.is_none());
    }

    #[tokio::test]
    async fn cancelled_analysis_bails() {
        let cancel = CancelSignal::new();
        cancel.cancel();
        assert!(service().diagnostics("()", &cancel).await.is_err());
    }

    #[test]
    fn settings_override_defaults() {
        let config = LanguageConfig::new("text")
            .with_settings(serde_json::json!({ "minWordLength": 1, "maxCompletions": 2 }));
        let service = TextLanguageService::from_config(&config).unwrap();
        assert_eq!(service.min_word_length, 1);
        assert_eq!(service.max_completions, 2);
    }

    #[test]
    fn malformed_settings_fail_construction() {
        let config =
            LanguageConfig::new("text").with_settings(serde_json::json!({ "minWordLength": "x" }));
        assert!(TextLanguageService::from_config(&config).is_err());
    }
}
