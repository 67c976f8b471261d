//! Token rendering
//!
//! Computes what a token button shows: its label text, its style class and its
//! hover title. Graph builders key nodes by the label text and classify nodes as
//! user-added by looking for [`MANUAL_MARKER`] in the markup.

use crate::ids::TokenId;
use crate::token::{meaningful, Token};
use serde::{Deserialize, Serialize};

/// Marker class carried by tokens added by an annotator
pub const MANUAL_MARKER: &str = "token-manual";

const COMMON_CLASS: &str = "btn";

/// Visual kind of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Corpus-original surface token
    Normal,
    /// Subtoken of a sandhi/compound split, or the result of a split action
    Subtoken,
    /// Composite token, or the result of a merge action
    Multitoken,
    /// Token added by an annotator
    Manual,
}

impl TokenKind {
    /// Style class of this kind
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Normal => "btn-light",
            Self::Subtoken => "btn-warning token-subtoken",
            Self::Multitoken => "btn-info token-multitoken",
            Self::Manual => "btn-secondary token-manual",
        }
    }
}

/// Rendered form of a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenButton {
    token_id: TokenId,
    text: String,
    kind: TokenKind,
    title: String,
}

impl TokenButton {
    /// Render a token
    ///
    /// Later rules win:
    /// 1. placeholder text renders the unsandhied form as a subtoken
    /// 2. composite inner ids render as multitokens
    /// 3. a still-empty label falls back to the lemma
    /// 4. annotator tokens render as manual
    /// 5. merge results render as multitokens, split results as subtokens
    #[must_use]
    pub fn render(token: &Token) -> Self {
        let mut kind = TokenKind::Normal;
        let mut text = token.text.clone();

        if token.surface().is_none() {
            kind = TokenKind::Subtoken;
            text.clone_from(&token.analysis.misc.unsandhied);
        }
        if token.is_composite() {
            kind = TokenKind::Multitoken;
        }
        if meaningful(text.as_deref()).is_none() {
            if let Some(lemma) = meaningful(token.lemma.as_deref()) {
                text = Some(lemma.to_string());
            }
        }
        if token.is_manual() {
            kind = TokenKind::Manual;
        }
        if token.is_merged() {
            kind = TokenKind::Multitoken;
        }
        if token.is_split() {
            kind = TokenKind::Subtoken;
        }

        let mut title = vec![
            format!("ID: {}", token.id),
            format!("Text: {}", token.text.as_deref().unwrap_or_default()),
            format!("Lemma: {}", token.lemma.as_deref().unwrap_or_default()),
        ];
        if let Some(padapatha) = token.unsandhied() {
            title.push(format!("Padapāṭha: {padapatha}"));
        }

        Self {
            token_id: token.id,
            text: text.unwrap_or_default(),
            kind,
            title: title.join("\n"),
        }
    }

    /// Token id
    #[inline]
    #[must_use]
    pub fn token_id(&self) -> TokenId {
        self.token_id
    }

    /// Label text
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Visual kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Hover title
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Full class attribute
    #[must_use]
    pub fn markup(&self) -> String {
        format!("{COMMON_CLASS} {}", self.kind.css_class())
    }

    /// Whether the markup carries the manual marker
    #[must_use]
    pub fn is_manual(&self) -> bool {
        self.markup().contains(MANUAL_MARKER)
    }
}
