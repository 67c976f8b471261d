//! Tokens and their morphological analysis

use crate::ids::{AnnotatorId, TokenId, UnitId};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Placeholder text meaning "see analysis"
pub(crate) const PLACEHOLDER: &str = "_";

/// A lexical unit inside a corpus unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Token id
    pub id: TokenId,
    /// Position marker within the line; `"a-b"` composite, `group_*` merge, `split_*` split
    #[serde(default, deserialize_with = "null_as_default")]
    pub inner_id: String,
    /// Owning unit
    #[serde(default)]
    pub verse_id: Option<UnitId>,
    /// Owning line
    #[serde(default)]
    pub line_id: Option<u64>,
    /// Order within the line
    #[serde(default)]
    pub order: Option<i64>,
    /// Surface form
    #[serde(default)]
    pub text: Option<String>,
    /// Lemma
    #[serde(default)]
    pub lemma: Option<String>,
    /// Morphological analysis
    #[serde(default, deserialize_with = "null_as_default")]
    pub analysis: Analysis,
    /// Annotator who added the token; `None` for corpus-original tokens
    #[serde(default)]
    pub annotator_id: Option<AnnotatorId>,
}

/// Morphological record of a token
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    /// Lemma
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
    /// Universal part of speech
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upos: Option<String>,
    /// Language-specific part of speech
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpos: Option<String>,
    /// Morphological features
    #[serde(default, deserialize_with = "null_as_default")]
    pub feats: BTreeMap<String, String>,
    /// Miscellaneous attributes
    #[serde(default, deserialize_with = "null_as_default")]
    pub misc: Misc,
}

/// Miscellaneous analysis attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Misc {
    /// Unsandhied (padapāṭha) form
    #[serde(
        rename = "Unsandhied",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub unsandhied: Option<String>,
    /// Constituent token ids of a merged token
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<TokenId>,
    /// Everything else, kept verbatim
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl Token {
    /// Create a corpus-original token
    #[must_use]
    pub fn new(id: impl Into<TokenId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            inner_id: String::new(),
            verse_id: None,
            line_id: None,
            order: None,
            text: Some(text.into()),
            lemma: None,
            analysis: Analysis::default(),
            annotator_id: None,
        }
    }

    /// Set the inner id
    #[must_use]
    pub fn with_inner_id(mut self, inner_id: impl Into<String>) -> Self {
        self.inner_id = inner_id.into();
        self
    }

    /// Set the lemma
    #[must_use]
    pub fn with_lemma(mut self, lemma: impl Into<String>) -> Self {
        self.lemma = Some(lemma.into());
        self
    }

    /// Set the analysis
    #[must_use]
    pub fn with_analysis(mut self, analysis: Analysis) -> Self {
        self.analysis = analysis;
        self
    }

    /// Mark as added by an annotator
    #[must_use]
    pub fn with_annotator(mut self, annotator: impl Into<AnnotatorId>) -> Self {
        self.annotator_id = Some(annotator.into());
        self
    }

    /// Whether the token was added by an annotator
    #[inline]
    #[must_use]
    pub fn is_manual(&self) -> bool {
        self.annotator_id.is_some()
    }

    /// Whether the token spans several subtokens (`inner_id` of the form `a-b`)
    #[inline]
    #[must_use]
    pub fn is_composite(&self) -> bool {
        self.inner_id.contains('-')
    }

    /// Whether the token is the result of a merge
    #[inline]
    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.inner_id.contains("group_")
    }

    /// Whether the token is the result of a split
    #[inline]
    #[must_use]
    pub fn is_split(&self) -> bool {
        self.inner_id.contains("split_")
    }

    /// Surface text unless empty or the placeholder
    #[must_use]
    pub fn surface(&self) -> Option<&str> {
        meaningful(self.text.as_deref())
    }

    /// Unsandhied form from the analysis, unless empty or the placeholder
    #[must_use]
    pub fn unsandhied(&self) -> Option<&str> {
        meaningful(self.analysis.misc.unsandhied.as_deref())
    }

    /// Number of subtokens covered by a composite token
    ///
    /// `inner_id` `"3-4"` covers two subtokens. Returns `None` for simple tokens
    /// or when the range cannot be parsed.
    #[must_use]
    pub fn composite_span(&self) -> Option<u64> {
        let (start, end) = self.inner_id.split_once('-')?;
        let start: u64 = start.trim().parse().ok()?;
        let end: u64 = end.trim().parse().ok()?;
        end.checked_sub(start).map(|d| d + 1)
    }

    /// Id of the last component covered by this token
    ///
    /// Sentence boundaries after a composite token are placed on its last subtoken.
    #[must_use]
    pub fn last_component_id(&self) -> TokenId {
        match self.composite_span() {
            Some(span) => TokenId(self.id.0 + span),
            None => self.id,
        }
    }

    /// Ids this token was merged from, or the token itself
    #[must_use]
    pub fn merge_parts(&self) -> Vec<TokenId> {
        if self.analysis.misc.parts.is_empty() {
            vec![self.id]
        } else {
            self.analysis.misc.parts.clone()
        }
    }
}

pub(crate) fn meaningful(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.is_empty() && *t != PLACEHOLDER)
}

/// Treat an explicit JSON `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn composite_span_counts_subtokens() {
        let token = Token::new(100, "rāmo'sti").with_inner_id("3-4");
        assert!(token.is_composite());
        assert_eq!(token.composite_span(), Some(2));
        assert_eq!(token.last_component_id(), TokenId(102));

        let plain = Token::new(7, "vanam").with_inner_id("5");
        assert_eq!(plain.composite_span(), None);
        assert_eq!(plain.last_component_id(), TokenId(7));
    }

    #[test]
    fn deserializes_server_token_with_null_analysis() {
        let token: Token = serde_json::from_value(json!({
            "id": 12,
            "inner_id": null,
            "verse_id": 3,
            "line_id": 1,
            "order": 2,
            "text": "_",
            "lemma": "gam",
            "analysis": null,
            "annotator_id": null
        }))
        .unwrap();
        assert_eq!(token.inner_id, "");
        assert_eq!(token.surface(), None);
        assert_eq!(token.analysis, Analysis::default());
        assert!(!token.is_manual());
    }

    #[test]
    fn misc_keeps_unknown_fields_and_reads_unsandhied() {
        let analysis: Analysis = serde_json::from_value(json!({
            "form": "gacchati",
            "feats": {"Tense": "Pres"},
            "misc": {"Unsandhied": "gacchati", "SpaceAfter": "No", "parts": [4, 5]}
        }))
        .unwrap();
        assert_eq!(analysis.misc.unsandhied.as_deref(), Some("gacchati"));
        assert_eq!(analysis.misc.parts, vec![TokenId(4), TokenId(5)]);
        assert_eq!(analysis.misc.other["SpaceAfter"], json!("No"));
    }
}
