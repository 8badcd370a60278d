//! # History Log
//!
//! The session-scoped audit trail shown on the activity screen.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every mutating store operation appends one entry:                      │
//! │                                                                         │
//! │  create_product ──► Product/Created                                     │
//! │  create_sale    ──► Sale/Created      (stock 10 → 7)                    │
//! │  delete_sale    ──► Sale/Deleted      (stock 7 → 10)                    │
//! │  approve request ─► Request/Approved  (stock 10 → 15)                   │
//! │                                                                         │
//! │  The log lives only in memory: a refresh keeps it, logout clears it.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entries are immutable once appended. Ids and timestamps are minted by the
//! data store (the I/O layer), never here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::User;

// =============================================================================
// Entity Kind
// =============================================================================

/// What kind of record a history entry is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Product,
    Sale,
    Request,
}

// =============================================================================
// History Action
// =============================================================================

/// What happened to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Created,
    Updated,
    Deleted,
    /// A replenishment request was validated by an admin.
    Approved,
    /// A replenishment request was refused by an admin.
    Rejected,
}

// =============================================================================
// History Entry
// =============================================================================

/// One line of the activity log.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Client-minted UUID (entries never exist server-side).
    pub id: String,

    pub entity: EntityKind,
    pub action: HistoryAction,

    /// Who performed the action.
    pub actor_id: String,
    pub actor_name: String,

    /// The record acted upon.
    pub target_id: String,
    pub target_nom: String,

    /// Quantity involved, when the action moved stock or recorded boxes.
    pub quantite: Option<i64>,

    /// Box quantity before the action, for stock-moving actions.
    pub stock_avant: Option<i64>,

    /// Box quantity after the action, for stock-moving actions.
    pub stock_apres: Option<i64>,

    /// When the action happened.
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// Builds a bare entry; quantity and stock movement are attached with
    /// the `with_*` builders.
    pub fn new(
        id: String,
        timestamp: DateTime<Utc>,
        entity: EntityKind,
        action: HistoryAction,
        actor: &User,
        target_id: impl Into<String>,
        target_nom: impl Into<String>,
    ) -> Self {
        HistoryEntry {
            id,
            entity,
            action,
            actor_id: actor.id.clone(),
            actor_name: actor.full_name(),
            target_id: target_id.into(),
            target_nom: target_nom.into(),
            quantite: None,
            stock_avant: None,
            stock_apres: None,
            timestamp,
        }
    }

    /// Attaches the quantity the action dealt in.
    pub fn with_quantite(mut self, quantite: i64) -> Self {
        self.quantite = Some(quantite);
        self
    }

    /// Attaches a before/after stock movement.
    pub fn with_stock_change(mut self, avant: i64, apres: i64) -> Self {
        self.stock_avant = Some(avant);
        self.stock_apres = Some(apres);
        self
    }

    /// One-line French label for the activity screen.
    pub fn describe(&self) -> String {
        let verbe = match (self.entity, self.action) {
            (EntityKind::Product, HistoryAction::Created) => "Produit créé",
            (EntityKind::Product, HistoryAction::Updated) => "Produit modifié",
            (EntityKind::Product, HistoryAction::Deleted) => "Produit supprimé",
            (EntityKind::Sale, HistoryAction::Created) => "Vente enregistrée",
            (EntityKind::Sale, HistoryAction::Updated) => "Vente modifiée",
            (EntityKind::Sale, HistoryAction::Deleted) => "Vente annulée",
            (EntityKind::Request, HistoryAction::Created) => "Demande créée",
            (EntityKind::Request, HistoryAction::Approved) => "Demande validée",
            (EntityKind::Request, HistoryAction::Rejected) => "Demande refusée",
            // Remaining combinations never occur but must render something
            (_, HistoryAction::Updated) => "Modification",
            (_, HistoryAction::Deleted) => "Suppression",
            (_, HistoryAction::Created) => "Création",
            (_, HistoryAction::Approved) => "Validation",
            (_, HistoryAction::Rejected) => "Refus",
        };

        match (self.stock_avant, self.stock_apres) {
            (Some(avant), Some(apres)) => {
                format!("{verbe} : {} (stock {avant} -> {apres})", self.target_nom)
            }
            _ => format!("{verbe} : {}", self.target_nom),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
