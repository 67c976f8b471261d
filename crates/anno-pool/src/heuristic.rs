//! Default word-order heuristic
//!
//! Used when a sentence has neither an annotated nor a server-suggested order.
//! Case-marked tokens come first in a fixed case sequence, then unmarked tokens
//! in id order, then compounds and verbs by part of speech.

use anno_model::{Token, TokenId};
use std::collections::{BTreeMap, BTreeSet};

const CASE_ORDER: [&str; 6] = ["Loc", "Nom", "Dat", "Abl", "Ins", "Acc"];
const XPOS_ORDER: [&str; 4] = ["CAD", "CX", "CNG", "V"];

/// Suggest an order for the tokens of one sentence
#[must_use]
pub fn suggest_word_order(tokens: &BTreeMap<TokenId, Token>) -> Vec<TokenId> {
    let mut used = BTreeSet::new();

    let mut leading = Vec::new();
    for case in CASE_ORDER {
        for (id, token) in tokens {
            if token.analysis.feats.get("Case").map(String::as_str) == Some(case)
                && used.insert(*id)
            {
                leading.push(*id);
            }
        }
    }

    let mut trailing = Vec::new();
    for xpos in XPOS_ORDER {
        for (id, token) in tokens {
            if token.analysis.xpos.as_deref() == Some(xpos) && used.insert(*id) {
                trailing.push(*id);
            }
        }
    }

    let middle = tokens.keys().filter(|id| !used.contains(*id)).copied();

    leading.into_iter().chain(middle).chain(trailing).collect()
}
