//! Window contents

use anno_model::{
    BoundaryId, SentenceRelation, TaskId, TaskScoped, Token, TokenConnection,
    TokenId, UnitId, UnitRecord,
};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// A slice of the page around a focus unit
#[derive(Debug, Clone, Copy)]
pub struct ContextWindow<'a> {
    units: &'a [UnitRecord],
    focus: usize,
}

/// One live boundary seen through a window
#[derive(Debug, Clone, Copy)]
pub struct WindowBoundary<'a> {
    unit: &'a UnitRecord,
    boundary_id: BoundaryId,
    marker_token: Option<TokenId>,
    is_local: bool,
}

impl<'a> ContextWindow<'a> {
    pub(crate) fn new(units: &'a [UnitRecord], focus: usize) -> Self {
        Self { units, focus }
    }

    /// Units in grid order
    #[inline]
    #[must_use]
    pub fn units(&self) -> &'a [UnitRecord] {
        self.units
    }

    /// The focus unit
    #[inline]
    #[must_use]
    pub fn focus(&self) -> &'a UnitRecord {
        &self.units[self.focus]
    }

    /// Units before the focus
    #[inline]
    #[must_use]
    pub fn before(&self) -> &'a [UnitRecord] {
        &self.units[..self.focus]
    }

    /// Units after the focus
    #[inline]
    #[must_use]
    pub fn after(&self) -> &'a [UnitRecord] {
        &self.units[self.focus + 1..]
    }

    /// Whether `unit` is the focus unit
    #[inline]
    #[must_use]
    pub fn is_local(&self, unit: UnitId) -> bool {
        self.focus().id() == unit
    }

    /// Every live boundary of the window, in unit order then boundary order
    ///
    /// Boundaries without a word order are included; they are visible as raw
    /// token bags.
    pub fn boundaries(&self) -> impl Iterator<Item = WindowBoundary<'a>> + 'a {
        let focus = self.focus().id();
        let units = self.units;
        units.iter().flat_map(move |unit| {
            unit.sentence_ids().map(move |boundary_id| WindowBoundary {
                unit,
                boundary_id,
                marker_token: unit.marker_token(boundary_id),
                is_local: unit.id() == focus,
            })
        })
    }

    /// Live boundaries that have a word order
    ///
    /// Context boundaries without an order are skipped; a focus boundary
    /// without one is skipped too and logged.
    pub fn ordered_boundaries(&self) -> impl Iterator<Item = WindowBoundary<'a>> + 'a {
        self.boundaries().filter(|boundary| {
            let ordered = boundary.word_order().is_some();
            if !ordered {
                debug!(
                    unit = %boundary.unit_id(),
                    boundary = %boundary.boundary_id(),
                    local = boundary.is_local(),
                    "skipping boundary without word order"
                );
            }
            ordered
        })
    }

    /// Ordered boundary ids, for the `context_data` field
    #[must_use]
    pub fn context_ids(&self) -> Vec<BoundaryId> {
        self.ordered_boundaries().map(|b| b.boundary_id()).collect()
    }

    /// Owning ordered boundary of every token in the window
    #[must_use]
    pub fn token_owners(&self) -> HashMap<TokenId, BoundaryId> {
        self.ordered_boundaries()
            .flat_map(|b| {
                b.word_order()
                    .unwrap_or_default()
                    .iter()
                    .map(move |token| (*token, b.boundary_id()))
            })
            .collect()
    }

    /// Marker token of every ordered boundary in the window
    #[must_use]
    pub fn sentence_markers(&self) -> HashMap<BoundaryId, TokenId> {
        self.ordered_boundaries()
            .filter_map(|b| b.marker_token().map(|marker| (b.boundary_id(), marker)))
            .collect()
    }

    /// Look a token up in any window unit
    #[must_use]
    pub fn token(&self, id: TokenId) -> Option<&'a Token> {
        self.units.iter().find_map(|unit| unit.token(id))
    }

    /// Live connections of `task` whose endpoints are both ordered window tokens
    #[must_use]
    pub fn visible_connections(
        &self,
        records: &'a [TokenConnection],
        task: TaskId,
    ) -> Vec<&'a TokenConnection> {
        let owners = self.token_owners();
        records
            .iter()
            .filter(|record| record.is_live_for(task))
            .filter(|record| {
                let visible = owners.contains_key(&record.src_id) && owners.contains_key(&record.dst_id);
                if !visible {
                    debug!(src = %record.src_id, dst = %record.dst_id, "connection leaves the window");
                }
                visible
            })
            .collect()
    }

    /// Live sentence relations of `task` whose endpoints are both visible
    ///
    /// A token endpoint must be an ordered window token of the named
    /// boundary; a sentence endpoint must name a window boundary by its
    /// marker token.
    #[must_use]
    pub fn visible_sentence_relations(
        &self,
        records: &'a [SentenceRelation],
        task: TaskId,
    ) -> Vec<&'a SentenceRelation> {
        let owners = self.token_owners();
        let markers = self.sentence_markers();
        let visible = |boundary: BoundaryId, token: TokenId, is_sentence: bool| {
            if is_sentence {
                markers.get(&boundary) == Some(&token)
            } else {
                owners.get(&token) == Some(&boundary)
            }
        };

        records
            .iter()
            .filter(|record| record.is_live_for(task))
            .filter(|record| {
                let kind = record.relation_type;
                let shown = visible(record.src_boundary_id, record.src_token_id, kind.source_is_sentence())
                    && visible(record.dst_boundary_id, record.dst_token_id, kind.target_is_sentence());
                if !shown {
                    debug!(
                        src = %record.src_token_id,
                        dst = %record.dst_token_id,
                        "sentence relation leaves the window"
                    );
                }
                shown
            })
            .collect()
    }
}

impl<'a> WindowBoundary<'a> {
    /// Owning unit
    #[inline]
    #[must_use]
    pub fn unit(&self) -> &'a UnitRecord {
        self.unit
    }

    /// Owning unit id
    #[inline]
    #[must_use]
    pub fn unit_id(&self) -> UnitId {
        self.unit.id()
    }

    /// Boundary id
    #[inline]
    #[must_use]
    pub fn boundary_id(&self) -> BoundaryId {
        self.boundary_id
    }

    /// Token that ends the sentence
    #[inline]
    #[must_use]
    pub fn marker_token(&self) -> Option<TokenId> {
        self.marker_token
    }

    /// Whether the boundary belongs to the focus unit
    #[inline]
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.is_local
    }

    /// Whether the boundary belongs to a neighbouring unit
    #[inline]
    #[must_use]
    pub fn is_context(&self) -> bool {
        !self.is_local
    }

    /// Stored word order
    #[must_use]
    pub fn word_order(&self) -> Option<&'a [TokenId]> {
        self.unit.word_order(self.boundary_id)
    }

    /// Raw token bag of the sentence
    #[must_use]
    pub fn tokens(&self) -> Option<&'a BTreeMap<TokenId, Token>> {
        self.unit.sentence(self.boundary_id)
    }

    /// Tokens in word order; ids the unit does not know are skipped
    #[must_use]
    pub fn ordered_tokens(&self) -> Vec<&'a Token> {
        self.word_order()
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.unit.token(*id))
            .collect()
    }
}
