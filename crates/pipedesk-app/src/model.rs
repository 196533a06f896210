// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }

    /// Header-click cycle: none, asc, desc, back to none.
    pub const fn cycle(current: Option<Self>) -> Option<Self> {
        match current {
            None => Some(Self::Asc),
            Some(Self::Asc) => Some(Self::Desc),
            Some(Self::Desc) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealStage {
    Lead,
    Qualified,
    Proposal,
    Negotiation,
    ClosedWon,
    ClosedLost,
}

impl DealStage {
    pub const ALL: [Self; 6] = [
        Self::Lead,
        Self::Qualified,
        Self::Proposal,
        Self::Negotiation,
        Self::ClosedWon,
        Self::ClosedLost,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Qualified => "qualified",
            Self::Proposal => "proposal",
            Self::Negotiation => "negotiation",
            Self::ClosedWon => "closed-won",
            Self::ClosedLost => "closed-lost",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "lead" => Some(Self::Lead),
            "qualified" => Some(Self::Qualified),
            "proposal" => Some(Self::Proposal),
            "negotiation" => Some(Self::Negotiation),
            "closed-won" => Some(Self::ClosedWon),
            "closed-lost" => Some(Self::ClosedLost),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Contacts,
    Deals,
}

impl ViewKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Contacts => "contacts",
            Self::Deals => "deals",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "contacts" => Some(Self::Contacts),
            "deals" => Some(Self::Deals),
            _ => None,
        }
    }

    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Contacts => "contact-list-columns",
            Self::Deals => "deal-list-columns",
        }
    }
}

/// Persisted state of one table column. Serialized with camelCase keys so the
/// stored blob reads `{"id", "label", "visible", "order", "sortDirection"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConfig {
    pub id: String,
    pub label: String,
    pub visible: bool,
    pub order: i64,
    #[serde(default)]
    pub sort_direction: Option<SortDirection>,
}

/// Default declaration of a column; seeds and resets carry no sort state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSeed {
    pub id: String,
    pub label: String,
    pub visible: bool,
    pub order: i64,
}

impl ColumnSeed {
    pub fn new(id: impl Into<String>, label: impl Into<String>, order: i64) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            visible: true,
            order,
        }
    }

    pub fn to_config(&self) -> ColumnConfig {
        ColumnConfig {
            id: self.id.clone(),
            label: self.label.clone(),
            visible: self.visible,
            order: self.order,
            sort_direction: None,
        }
    }
}

/// Partial update merged into a column. `None` leaves a field alone; the
/// nested option on `sort_direction` distinguishes "clear" from "keep".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnUpdate {
    pub label: Option<String>,
    pub visible: Option<bool>,
    pub order: Option<i64>,
    pub sort_direction: Option<Option<SortDirection>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderEntry {
    pub id: String,
    pub order: i64,
}

impl ReorderEntry {
    pub fn new(id: impl Into<String>, order: i64) -> Self {
        Self {
            id: id.into(),
            order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: ContactId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub tags: Vec<String>,
    pub created_at: OffsetDateTime,
}

impl Contact {
    /// First and last name joined, empty when neither is set.
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deal {
    pub id: DealId,
    pub name: String,
    pub stage: DealStage,
    pub value_cents: Option<i64>,
    pub currency: Option<String>,
    pub expected_close_date: Option<Date>,
    pub contact_names: Vec<String>,
    pub created_at: OffsetDateTime,
}
