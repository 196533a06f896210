// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::cmp::Ordering;
use time::Date;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::{ColumnEngine, ColumnSeed, ColumnStore, Contact, Deal, SortDirection, ViewKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Text(Option<String>),
    List(Vec<String>),
    Money(Option<i64>),
    Date(Option<Date>),
}

impl CellValue {
    pub fn display(&self) -> String {
        match self {
            Self::Text(Some(value)) => value.clone(),
            Self::Text(None) => String::new(),
            Self::List(values) => values.join(", "),
            Self::Money(Some(cents)) => format_cents(*cents),
            Self::Money(None) => String::new(),
            Self::Date(Some(value)) => value.to_string(),
            Self::Date(None) => String::new(),
        }
    }

    /// Absent money and dates sort first, matching how absent text sorts as "".
    pub fn cmp_value(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Money(left), Self::Money(right)) => left.cmp(right),
            (Self::Date(left), Self::Date(right)) => left.cmp(right),
            _ => compare_text(&self.display(), &other.display()),
        }
    }
}

/// Collation order for display text. Accents and case are ignored first, so
/// "Émile" sorts with the e's. Ties put unaccented before accented, then
/// lowercase before uppercase.
pub fn compare_text(left: &str, right: &str) -> Ordering {
    collation_key(left)
        .cmp(&collation_key(right))
        .then_with(|| left.to_lowercase().cmp(&right.to_lowercase()))
        .then_with(|| right.cmp(left))
}

fn collation_key(value: &str) -> String {
    value
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .collect()
}

pub struct ColumnSpec<R> {
    pub id: &'static str,
    pub label: &'static str,
    pub accessor: fn(&R) -> CellValue,
    /// Sort by this instead of the displayed value.
    pub sort_key: Option<fn(&R) -> CellValue>,
    /// Shown in place of an empty cell.
    pub placeholder: &'static str,
}

impl<R> ColumnSpec<R> {
    pub fn new(id: &'static str, label: &'static str, accessor: fn(&R) -> CellValue) -> Self {
        Self {
            id,
            label,
            accessor,
            sort_key: None,
            placeholder: "",
        }
    }

    pub fn sorted_by(mut self, sort_key: fn(&R) -> CellValue) -> Self {
        self.sort_key = Some(sort_key);
        self
    }

    pub fn with_placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn value(&self, row: &R) -> CellValue {
        (self.accessor)(row)
    }

    pub fn sort_value(&self, row: &R) -> CellValue {
        self.sort_key.map_or_else(|| self.value(row), |sort_key| sort_key(row))
    }

    pub fn render(&self, row: &R) -> String {
        let text = self.value(row).display();
        if text.is_empty() {
            self.placeholder.to_owned()
        } else {
            text
        }
    }
}

/// Cell text for a persisted column the view has no accessor for.
pub const UNKNOWN_COLUMN_CELL: &str = "—";
const CONTACT_PLACEHOLDER: &str = "—";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableProjection {
    pub title: &'static str,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableProjection {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// A list screen: its storage key plus one typed spec per column id.
pub struct TableView<R> {
    kind: ViewKind,
    specs: Vec<ColumnSpec<R>>,
}

impl<R> TableView<R> {
    pub fn new(kind: ViewKind, specs: Vec<ColumnSpec<R>>) -> Self {
        Self { kind, specs }
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn storage_key(&self) -> &'static str {
        self.kind.storage_key()
    }

    pub fn spec(&self, id: &str) -> Option<&ColumnSpec<R>> {
        self.specs.iter().find(|spec| spec.id == id)
    }

    pub fn seeds(&self) -> Vec<ColumnSeed> {
        self.specs
            .iter()
            .enumerate()
            .map(|(index, spec)| ColumnSeed::new(spec.id, spec.label, index as i64))
            .collect()
    }

    pub fn load_engine<S: ColumnStore>(&self, store: S) -> Result<ColumnEngine<S>> {
        ColumnEngine::load(store, self.storage_key(), self.seeds())
    }

    pub fn header<S: ColumnStore>(&self, engine: &ColumnEngine<S>) -> Vec<String> {
        engine
            .visible_columns()
            .into_iter()
            .map(|column| column.label.clone())
            .collect()
    }

    /// Orders rows by the first sorted column. The sort is stable, so equal
    /// keys keep fetch order; with no usable sort column rows are untouched.
    pub fn sort_rows<'r, S: ColumnStore>(
        &self,
        engine: &ColumnEngine<S>,
        rows: &'r [R],
    ) -> Vec<&'r R> {
        let Some((column, direction)) = engine.active_sort() else {
            return rows.iter().collect();
        };
        let Some(spec) = self.spec(&column.id) else {
            return rows.iter().collect();
        };

        let mut keyed: Vec<(CellValue, &R)> =
            rows.iter().map(|row| (spec.sort_value(row), row)).collect();
        keyed.sort_by(|(left, _), (right, _)| match direction {
            SortDirection::Asc => left.cmp_value(right),
            SortDirection::Desc => left.cmp_value(right).reverse(),
        });
        keyed.into_iter().map(|(_, row)| row).collect()
    }

    pub fn project<S: ColumnStore>(&self, engine: &ColumnEngine<S>, rows: &[R]) -> TableProjection {
        let visible = engine.visible_columns();
        let specs: Vec<Option<&ColumnSpec<R>>> =
            visible.iter().map(|column| self.spec(&column.id)).collect();

        let rows = self
            .sort_rows(engine, rows)
            .into_iter()
            .map(|row| {
                specs
                    .iter()
                    .map(|spec| {
                        spec.map_or_else(|| UNKNOWN_COLUMN_CELL.to_owned(), |spec| spec.render(row))
                    })
                    .collect()
            })
            .collect();

        TableProjection {
            title: self.kind.label(),
            columns: visible.iter().map(|column| column.label.clone()).collect(),
            rows,
        }
    }
}

pub fn contact_view() -> TableView<Contact> {
    TableView::new(
        ViewKind::Contacts,
        vec![
            ColumnSpec::new("name", "Name", |contact: &Contact| {
                let name = contact.full_name();
                CellValue::Text((!name.is_empty()).then_some(name))
            })
            .sorted_by(|contact: &Contact| CellValue::Text(contact_sort_name(contact)))
            .with_placeholder("(No name)"),
            ColumnSpec::new("email", "Email", |contact: &Contact| {
                CellValue::Text(contact.email.clone())
            })
            .with_placeholder(CONTACT_PLACEHOLDER),
            ColumnSpec::new("phone", "Phone", |contact: &Contact| {
                CellValue::Text(contact.phone.clone())
            })
            .with_placeholder(CONTACT_PLACEHOLDER),
            ColumnSpec::new("company", "Company", |contact: &Contact| {
                CellValue::Text(contact.company.clone())
            })
            .with_placeholder(CONTACT_PLACEHOLDER),
            ColumnSpec::new("jobTitle", "Job Title", |contact: &Contact| {
                CellValue::Text(contact.job_title.clone())
            })
            .with_placeholder(CONTACT_PLACEHOLDER),
            ColumnSpec::new("tags", "Tags", |contact: &Contact| {
                CellValue::List(contact.tags.clone())
            })
            .with_placeholder(CONTACT_PLACEHOLDER),
        ],
    )
}

pub fn deal_view() -> TableView<Deal> {
    TableView::new(
        ViewKind::Deals,
        vec![
            ColumnSpec::new("name", "Name", |deal: &Deal| {
                CellValue::Text(Some(deal.name.clone()))
            }),
            ColumnSpec::new("stage", "Stage", |deal: &Deal| {
                CellValue::Text(Some(deal.stage.as_str().to_owned()))
            }),
            ColumnSpec::new("value", "Value", |deal: &Deal| CellValue::Money(deal.value_cents)),
            ColumnSpec::new("currency", "Currency", |deal: &Deal| {
                CellValue::Text(deal.currency.clone())
            }),
            ColumnSpec::new("expectedCloseDate", "Expected Close", |deal: &Deal| {
                CellValue::Date(deal.expected_close_date)
            }),
            ColumnSpec::new("contacts", "Contacts", |deal: &Deal| {
                CellValue::List(deal.contact_names.clone())
            }),
        ],
    )
}

// Unnamed contacts sort by their email; the cell itself shows a placeholder.
fn contact_sort_name(contact: &Contact) -> Option<String> {
    let name = contact.full_name();
    if name.is_empty() {
        contact.email.clone()
    } else {
        Some(name)
    }
}

pub fn format_cents(cents: i64) -> String {
    let (sign, cents) = if cents >= 0 {
        ("", cents)
    } else if cents == i64::MIN {
        ("-", i64::MAX)
    } else {
        ("-", -cents)
    };
    format!("{sign}{}.{:02}", comma_format(cents / 100), cents % 100)
}

fn comma_format(value: i64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
