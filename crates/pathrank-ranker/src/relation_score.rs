//! Relation type strengths.
//!
//! KGML subtype labels map onto a closed set of kinds; anything outside the
//! table, including a missing label, is [`RelationKind::Other`] and scores 0.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    Activation,
    Inhibition,
    Phosphorylation,
    BindingAssociation,
    Expression,
    IndirectEffect,
    Other,
}

impl RelationKind {
    pub const ALL: [RelationKind; 7] = [
        RelationKind::Activation,
        RelationKind::Inhibition,
        RelationKind::Phosphorylation,
        RelationKind::BindingAssociation,
        RelationKind::Expression,
        RelationKind::IndirectEffect,
        RelationKind::Other,
    ];

    /// Exact, case-sensitive match against the KGML subtype names.
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some("activation") => RelationKind::Activation,
            Some("inhibition") => RelationKind::Inhibition,
            Some("phosphorylation") => RelationKind::Phosphorylation,
            Some("binding/association") => RelationKind::BindingAssociation,
            Some("expression") => RelationKind::Expression,
            Some("indirect effect") => RelationKind::IndirectEffect,
            Some(other) => {
                tracing::debug!(label = other, "Unknown relation label scored as 0");
                RelationKind::Other
            }
            None => RelationKind::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RelationKind::Activation => "activation",
            RelationKind::Inhibition => "inhibition",
            RelationKind::Phosphorylation => "phosphorylation",
            RelationKind::BindingAssociation => "binding/association",
            RelationKind::Expression => "expression",
            RelationKind::IndirectEffect => "indirect effect",
            RelationKind::Other => "other",
        }
    }

    pub fn strength(self) -> f64 {
        match self {
            RelationKind::Activation => 1.0,
            RelationKind::Inhibition => -1.0,
            RelationKind::Phosphorylation => 0.75,
            RelationKind::BindingAssociation => 0.5,
            RelationKind::Expression => 0.8,
            RelationKind::IndirectEffect => 0.3,
            RelationKind::Other => 0.0,
        }
    }
}

/// Strength of a subtype label.
pub fn score(label: Option<&str>) -> f64 {
    RelationKind::from_label(label).strength()
}
