// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::{ColumnConfig, ColumnSeed, ColumnUpdate, ReorderEntry, SortDirection};

/// Durable key-value mirror for column settings. Values are JSON text.
pub trait ColumnStore {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

impl<T: ColumnStore + ?Sized> ColumnStore for &T {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnCommand {
    Update { id: String, update: ColumnUpdate },
    ToggleVisibility(String),
    Rename { id: String, label: String },
    Reorder(Vec<ReorderEntry>),
    Move { id: String, to_index: usize },
    SetSort {
        id: String,
        direction: Option<SortDirection>,
    },
    CycleSort(String),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnEvent {
    ColumnUpdated(String),
    VisibilityChanged {
        id: String,
        visible: bool,
    },
    Renamed {
        id: String,
        label: String,
    },
    Reordered,
    SortChanged {
        id: String,
        direction: Option<SortDirection>,
    },
    Reset,
    PersistFailed(String),
}

/// Where the in-memory set came from when the engine was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    Seeded,
    Restored,
    Reconciled,
    /// The store could not be read. Defaults are held in memory only, so
    /// whatever the store still holds survives until the next mutation.
    Fallback,
}

/// Column settings for one table view, mirrored to a [`ColumnStore`] after
/// every mutation. The in-memory set is authoritative; a failed write only
/// produces a [`ColumnEvent::PersistFailed`].
pub struct ColumnEngine<S> {
    store: S,
    storage_key: String,
    defaults: Vec<ColumnSeed>,
    columns: Vec<ColumnConfig>,
    origin: LoadOrigin,
    load_write_error: Option<String>,
}

impl<S: ColumnStore> ColumnEngine<S> {
    pub fn load(store: S, storage_key: impl Into<String>, defaults: Vec<ColumnSeed>) -> Result<Self> {
        let storage_key = storage_key.into();
        validate_seeds(&storage_key, &defaults)?;

        let (columns, origin) = match store.read(&storage_key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<ColumnConfig>>(&raw) {
                Ok(persisted) => {
                    let (columns, changed) = reconcile(persisted, &defaults);
                    if changed {
                        debug!(%storage_key, "reconciled persisted columns with view defaults");
                        (columns, LoadOrigin::Reconciled)
                    } else {
                        (columns, LoadOrigin::Restored)
                    }
                }
                Err(error) => {
                    warn!(%storage_key, %error, "persisted columns unreadable; using defaults");
                    (seed_columns(&defaults), LoadOrigin::Seeded)
                }
            },
            Ok(None) => {
                debug!(%storage_key, "no persisted columns; seeding defaults");
                (seed_columns(&defaults), LoadOrigin::Seeded)
            }
            Err(error) => {
                warn!(%storage_key, error = %format!("{error:#}"), "column store read failed; using defaults without saving");
                (seed_columns(&defaults), LoadOrigin::Fallback)
            }
        };

        let mut engine = Self {
            store,
            storage_key,
            defaults,
            columns,
            origin,
            load_write_error: None,
        };
        if matches!(origin, LoadOrigin::Seeded | LoadOrigin::Reconciled) {
            if let Some(ColumnEvent::PersistFailed(message)) = engine.persist() {
                engine.load_write_error = Some(message);
            }
        }
        Ok(engine)
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn defaults(&self) -> &[ColumnSeed] {
        &self.defaults
    }

    pub fn origin(&self) -> LoadOrigin {
        self.origin
    }

    /// Set when writing back seeded or reconciled columns during load failed.
    pub fn load_write_error(&self) -> Option<&str> {
        self.load_write_error.as_deref()
    }

    /// Full set in stored order, hidden columns included.
    pub fn columns(&self) -> &[ColumnConfig] {
        &self.columns
    }

    pub fn column(&self, id: &str) -> Option<&ColumnConfig> {
        self.columns.iter().find(|column| column.id == id)
    }

    /// Every column ascending by `order`; equal orders keep stored position.
    pub fn ordered_columns(&self) -> Vec<&ColumnConfig> {
        let mut ordered: Vec<&ColumnConfig> = self.columns.iter().collect();
        ordered.sort_by_key(|column| column.order);
        ordered
    }

    pub fn visible_columns(&self) -> Vec<&ColumnConfig> {
        self.ordered_columns()
            .into_iter()
            .filter(|column| column.visible)
            .collect()
    }

    /// Columns carrying a sort direction, in stored order. Only the first is
    /// honored by renderers; the rest stay inert until it is cleared.
    pub fn sorted_columns(&self) -> Vec<&ColumnConfig> {
        self.columns
            .iter()
            .filter(|column| column.sort_direction.is_some())
            .collect()
    }

    pub fn active_sort(&self) -> Option<(&ColumnConfig, SortDirection)> {
        self.columns.iter().find_map(|column| {
            column
                .sort_direction
                .map(|direction| (column, direction))
        })
    }

    pub fn update_column(&mut self, id: &str, update: ColumnUpdate) -> Vec<ColumnEvent> {
        self.dispatch(ColumnCommand::Update {
            id: id.to_owned(),
            update,
        })
    }

    pub fn toggle_column_visibility(&mut self, id: &str) -> Vec<ColumnEvent> {
        self.dispatch(ColumnCommand::ToggleVisibility(id.to_owned()))
    }

    pub fn rename_column(&mut self, id: &str, label: &str) -> Vec<ColumnEvent> {
        self.dispatch(ColumnCommand::Rename {
            id: id.to_owned(),
            label: label.to_owned(),
        })
    }

    pub fn reorder_columns(&mut self, entries: &[ReorderEntry]) -> Vec<ColumnEvent> {
        self.dispatch(ColumnCommand::Reorder(entries.to_vec()))
    }

    pub fn move_column(&mut self, id: &str, to_index: usize) -> Vec<ColumnEvent> {
        self.dispatch(ColumnCommand::Move {
            id: id.to_owned(),
            to_index,
        })
    }

    pub fn set_sort_direction(
        &mut self,
        id: &str,
        direction: Option<SortDirection>,
    ) -> Vec<ColumnEvent> {
        self.dispatch(ColumnCommand::SetSort {
            id: id.to_owned(),
            direction,
        })
    }

    pub fn cycle_sort(&mut self, id: &str) -> Vec<ColumnEvent> {
        self.dispatch(ColumnCommand::CycleSort(id.to_owned()))
    }

    pub fn reset_to_defaults(&mut self) -> Vec<ColumnEvent> {
        self.dispatch(ColumnCommand::Reset)
    }

    /// Applies a command and persists the result. Commands naming an unknown
    /// column return no events and leave both memory and storage untouched.
    pub fn dispatch(&mut self, command: ColumnCommand) -> Vec<ColumnEvent> {
        let mut events = match command {
            ColumnCommand::Update { id, update } => self.apply_update(&id, update),
            ColumnCommand::ToggleVisibility(id) => match self.column_mut(&id) {
                Some(column) => {
                    column.visible = !column.visible;
                    vec![ColumnEvent::VisibilityChanged {
                        visible: column.visible,
                        id,
                    }]
                }
                None => Vec::new(),
            },
            ColumnCommand::Rename { id, label } => match self.column_mut(&id) {
                Some(column) => {
                    column.label.clone_from(&label);
                    vec![ColumnEvent::Renamed { id, label }]
                }
                None => Vec::new(),
            },
            ColumnCommand::Reorder(entries) => self.apply_reorder(&entries),
            ColumnCommand::Move { id, to_index } => self.apply_move(&id, to_index),
            ColumnCommand::SetSort { id, direction } => self.apply_sort(id, direction),
            ColumnCommand::CycleSort(id) => match self.column(&id) {
                Some(column) => {
                    let next = SortDirection::cycle(column.sort_direction);
                    self.apply_sort(id, next)
                }
                None => Vec::new(),
            },
            ColumnCommand::Reset => {
                self.columns = seed_columns(&self.defaults);
                vec![ColumnEvent::Reset]
            }
        };

        if !events.is_empty()
            && let Some(failure) = self.persist()
        {
            events.push(failure);
        }
        events
    }

    fn column_mut(&mut self, id: &str) -> Option<&mut ColumnConfig> {
        self.columns.iter_mut().find(|column| column.id == id)
    }

    fn apply_update(&mut self, id: &str, update: ColumnUpdate) -> Vec<ColumnEvent> {
        let Some(column) = self.column_mut(id) else {
            return Vec::new();
        };
        if let Some(label) = update.label {
            column.label = label;
        }
        if let Some(visible) = update.visible {
            column.visible = visible;
        }
        if let Some(order) = update.order {
            column.order = order;
        }
        if let Some(direction) = update.sort_direction {
            column.sort_direction = direction;
        }
        vec![ColumnEvent::ColumnUpdated(id.to_owned())]
    }

    fn apply_sort(&mut self, id: String, direction: Option<SortDirection>) -> Vec<ColumnEvent> {
        match self.column_mut(&id) {
            Some(column) => {
                column.sort_direction = direction;
                vec![ColumnEvent::SortChanged { id, direction }]
            }
            None => Vec::new(),
        }
    }

    // Requested orders rank first, then the previous order, then stored
    // position; the result is always the contiguous permutation 0..n.
    fn apply_reorder(&mut self, entries: &[ReorderEntry]) -> Vec<ColumnEvent> {
        let mut requested: Vec<i64> = self.columns.iter().map(|column| column.order).collect();
        let mut matched = false;
        for entry in entries {
            if let Some(index) = self.columns.iter().position(|column| column.id == entry.id) {
                requested[index] = entry.order;
                matched = true;
            }
        }
        if !matched {
            return Vec::new();
        }

        let mut ranking: Vec<usize> = (0..self.columns.len()).collect();
        ranking.sort_by_key(|&index| (requested[index], self.columns[index].order, index));
        for (rank, index) in ranking.into_iter().enumerate() {
            self.columns[index].order = rank as i64;
        }
        vec![ColumnEvent::Reordered]
    }

    fn apply_move(&mut self, id: &str, to_index: usize) -> Vec<ColumnEvent> {
        let mut ids: Vec<String> = self
            .ordered_columns()
            .into_iter()
            .map(|column| column.id.clone())
            .collect();
        let Some(from) = ids.iter().position(|candidate| candidate == id) else {
            return Vec::new();
        };
        let moved = ids.remove(from);
        ids.insert(to_index.min(ids.len()), moved);

        let entries: Vec<ReorderEntry> = ids
            .into_iter()
            .enumerate()
            .map(|(index, id)| ReorderEntry::new(id, index as i64))
            .collect();
        self.apply_reorder(&entries)
    }

    fn persist(&self) -> Option<ColumnEvent> {
        let result = serde_json::to_string(&self.columns)
            .map_err(anyhow::Error::from)
            .and_then(|raw| self.store.write(&self.storage_key, &raw));
        match result {
            Ok(()) => None,
            Err(error) => {
                let message = format!("{error:#}");
                warn!(
                    storage_key = %self.storage_key,
                    error = %message,
                    "column settings not persisted; keeping in-memory state"
                );
                Some(ColumnEvent::PersistFailed(message))
            }
        }
    }
}

fn validate_seeds(storage_key: &str, defaults: &[ColumnSeed]) -> Result<()> {
    let mut seen = HashSet::with_capacity(defaults.len());
    for seed in defaults {
        if seed.id.trim().is_empty() {
            bail!("view `{storage_key}` declares a column with an empty id; give every column a stable id");
        }
        if !seen.insert(seed.id.as_str()) {
            bail!(
                "view `{storage_key}` declares column `{}` twice; column ids must be unique",
                seed.id
            );
        }
    }
    Ok(())
}

fn seed_columns(defaults: &[ColumnSeed]) -> Vec<ColumnConfig> {
    defaults.iter().map(ColumnSeed::to_config).collect()
}

/// Drops repeated ids, then appends declared columns the persisted set is
/// missing. Ids the view no longer declares are kept as they were stored.
/// Returns whether anything changed.
fn reconcile(persisted: Vec<ColumnConfig>, defaults: &[ColumnSeed]) -> (Vec<ColumnConfig>, bool) {
    let declared: HashSet<&str> = defaults.iter().map(|seed| seed.id.as_str()).collect();
    let mut seen: HashSet<String> = HashSet::with_capacity(persisted.len());
    let mut changed = false;
    let mut columns = Vec::with_capacity(persisted.len().max(defaults.len()));

    for column in persisted {
        if !seen.insert(column.id.clone()) {
            changed = true;
            continue;
        }
        if !declared.contains(column.id.as_str()) {
            debug!(id = %column.id, "keeping persisted column the view no longer declares");
        }
        columns.push(column);
    }

    let mut next_order = columns
        .iter()
        .map(|column| column.order)
        .max()
        .map_or(0, |order| order + 1);
    for seed in defaults {
        if seen.contains(&seed.id) {
            continue;
        }
        let mut column = seed.to_config();
        column.order = next_order;
        next_order += 1;
        columns.push(column);
        changed = true;
    }

    (columns, changed)
}
