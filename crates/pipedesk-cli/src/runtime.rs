// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use pipedesk_app::{
    ColumnEngine, ColumnEvent, ColumnStore, SortDirection, TableView, ViewKind, contact_view,
    deal_view,
};
use pipedesk_db::Store;
use pipedesk_testkit::CrmFaker;
use std::fmt::Write as _;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Columns,
    ShowTable(Option<usize>),
    Toggle(String),
    Rename { id: String, label: String },
    Move { id: String, to_index: usize },
    Sort {
        id: String,
        direction: Option<SortDirection>,
    },
    CycleSort(String),
    Reset,
    Stored,
    Forget,
}

impl Command {
    /// Parses the positional words after the global flags. No words means `columns`.
    pub fn parse<S: AsRef<str>>(words: &[S]) -> Result<Self> {
        let words: Vec<&str> = words.iter().map(|word| word.as_ref()).collect();
        let Some((&name, rest)) = words.split_first() else {
            return Ok(Self::Columns);
        };

        let command = match (name, rest) {
            ("columns", []) => Self::Columns,
            ("show-table", []) => Self::ShowTable(None),
            ("show-table", [count]) => Self::ShowTable(Some(count.parse().with_context(
                || format!("show-table row count {count:?} is not a non-negative number"),
            )?)),
            ("toggle", [id]) => Self::Toggle((*id).to_owned()),
            ("rename", [id, label @ ..]) if !label.is_empty() => Self::Rename {
                id: (*id).to_owned(),
                label: label.join(" "),
            },
            ("move", [id, index]) => Self::Move {
                id: (*id).to_owned(),
                to_index: index.parse().with_context(|| {
                    format!("move target {index:?} is not a position; use 0 for the first column")
                })?,
            },
            ("sort", [id, direction]) => Self::Sort {
                id: (*id).to_owned(),
                direction: parse_direction(direction)?,
            },
            ("cycle-sort", [id]) => Self::CycleSort((*id).to_owned()),
            ("reset", []) => Self::Reset,
            ("stored", []) => Self::Stored,
            ("forget", []) => Self::Forget,
            (
                "columns" | "show-table" | "toggle" | "rename" | "move" | "sort" | "cycle-sort"
                | "reset" | "stored" | "forget",
                _,
            ) => bail!("wrong arguments for `{name}`; run with --help to see its usage"),
            (unknown, _) => {
                bail!("unknown command {unknown:?}; run with --help to see supported commands")
            }
        };
        Ok(command)
    }
}

fn parse_direction(raw: &str) -> Result<Option<SortDirection>> {
    if matches!(raw, "none" | "off") {
        return Ok(None);
    }
    SortDirection::parse(raw)
        .map(Some)
        .ok_or_else(|| anyhow!("sort direction {raw:?} is not one of asc, desc, none"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoRows {
    pub count: usize,
    pub seed: u64,
}

pub struct ViewRuntime<'a> {
    store: &'a Store,
    demo: DemoRows,
}

impl<'a> ViewRuntime<'a> {
    pub fn new(store: &'a Store, demo: DemoRows) -> Self {
        Self { store, demo }
    }

    /// Runs one command against a view and returns the text to print.
    pub fn execute(&self, kind: ViewKind, command: &Command) -> Result<String> {
        debug!(view = kind.label(), ?command, "executing command");
        match command {
            Command::Stored => self.stored(),
            Command::Forget => self.forget(kind),
            _ => match kind {
                ViewKind::Contacts => self.execute_view(&contact_view(), command, |seed, count| {
                    CrmFaker::new(seed).contacts(count)
                }),
                ViewKind::Deals => self.execute_view(&deal_view(), command, |seed, count| {
                    CrmFaker::new(seed).deals(count)
                }),
            },
        }
    }

    fn execute_view<R>(
        &self,
        view: &TableView<R>,
        command: &Command,
        rows: impl FnOnce(u64, usize) -> Vec<R>,
    ) -> Result<String> {
        let mut engine = view.load_engine(self.store)?;
        if let Some(message) = engine.load_write_error() {
            bail!("column settings for {} were not saved: {message}", view.kind().label());
        }

        let events = match command {
            Command::Columns => return Ok(render_columns(&engine)),
            Command::ShowTable(count) => {
                let rows = rows(self.demo.seed, count.unwrap_or(self.demo.count));
                return Ok(render_table(view, &engine, &rows));
            }
            Command::Toggle(id) => {
                require_column(&engine, view, id)?;
                engine.toggle_column_visibility(id)
            }
            Command::Rename { id, label } => {
                require_column(&engine, view, id)?;
                let label = label.trim();
                if label.is_empty() {
                    bail!("column label must not be empty; pass the new label after the column id");
                }
                engine.rename_column(id, label)
            }
            Command::Move { id, to_index } => {
                require_column(&engine, view, id)?;
                engine.move_column(id, *to_index)
            }
            Command::Sort { id, direction } => {
                require_column(&engine, view, id)?;
                engine.set_sort_direction(id, *direction)
            }
            Command::CycleSort(id) => {
                require_column(&engine, view, id)?;
                engine.cycle_sort(id)
            }
            Command::Reset => engine.reset_to_defaults(),
            Command::Stored | Command::Forget => Vec::new(),
        };

        let mut output = String::new();
        for event in &events {
            match event {
                ColumnEvent::PersistFailed(message) => {
                    bail!("column settings for {} were not saved: {message}", view.kind().label())
                }
                other => {
                    let _ = writeln!(output, "{}", describe_event(other));
                }
            }
        }
        output.push_str(&render_columns(&engine));
        Ok(output)
    }

    fn stored(&self) -> Result<String> {
        let records = self.store.list_view_states()?;
        if records.is_empty() {
            return Ok("no saved column settings\n".to_owned());
        }
        let rows: Vec<Vec<String>> = records
            .into_iter()
            .map(|record| vec![record.key, record.updated_at.to_string()])
            .collect();
        Ok(render_grid(&["KEY".to_owned(), "UPDATED".to_owned()], &rows))
    }

    fn forget(&self, kind: ViewKind) -> Result<String> {
        if self.store.delete_view_state(kind.storage_key())? {
            Ok(format!("forgot saved {} columns\n", kind.label()))
        } else {
            Ok(format!("no saved {} columns to forget\n", kind.label()))
        }
    }
}

fn require_column<S: ColumnStore, R>(
    engine: &ColumnEngine<S>,
    view: &TableView<R>,
    id: &str,
) -> Result<()> {
    if engine.column(id).is_some() {
        return Ok(());
    }
    let known: Vec<&str> = engine.columns().iter().map(|column| column.id.as_str()).collect();
    bail!(
        "unknown column `{id}` in the {} view; known columns: {}",
        view.kind().label(),
        known.join(", ")
    )
}

fn describe_event(event: &ColumnEvent) -> String {
    match event {
        ColumnEvent::ColumnUpdated(id) => format!("updated {id}"),
        ColumnEvent::VisibilityChanged { id, visible: true } => format!("{id} is now shown"),
        ColumnEvent::VisibilityChanged { id, visible: false } => format!("{id} is now hidden"),
        ColumnEvent::Renamed { id, label } => format!("renamed {id} to {label:?}"),
        ColumnEvent::Reordered => "reordered columns".to_owned(),
        ColumnEvent::SortChanged { id, direction } => {
            format!("sort on {id}: {}", direction_label(*direction))
        }
        ColumnEvent::Reset => "restored default columns".to_owned(),
        ColumnEvent::PersistFailed(message) => format!("not saved: {message}"),
    }
}

fn direction_label(direction: Option<SortDirection>) -> &'static str {
    direction.map_or("none", SortDirection::as_str)
}

fn render_columns<S: ColumnStore>(engine: &ColumnEngine<S>) -> String {
    let header = ["POS", "ID", "LABEL", "VISIBLE", "SORT"].map(str::to_owned);
    let rows: Vec<Vec<String>> = engine
        .ordered_columns()
        .into_iter()
        .map(|column| {
            vec![
                column.order.to_string(),
                column.id.clone(),
                column.label.clone(),
                if column.visible { "yes" } else { "no" }.to_owned(),
                direction_label(column.sort_direction).to_owned(),
            ]
        })
        .collect();
    render_grid(&header, &rows)
}

fn render_table<S: ColumnStore, R>(
    view: &TableView<R>,
    engine: &ColumnEngine<S>,
    rows: &[R],
) -> String {
    let table = view.project(engine, rows);
    let mut output = format!("{} ({} rows", table.title, table.row_count());
    if let Some((column, direction)) = engine.active_sort() {
        let _ = write!(output, ", sorted by {} {}", column.label, direction.as_str());
    }
    output.push_str(")\n");

    if table.column_count() == 0 {
        output.push_str("(no visible columns)\n");
        return output;
    }
    output.push_str(&render_grid(&table.columns, &table.rows));
    output
}

fn render_grid(header: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|cell| cell.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    for row in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)) {
        let mut line = String::new();
        for (index, cell) in row.iter().enumerate() {
            if index > 0 {
                line.push_str("  ");
            }
            let width = widths.get(index).copied().unwrap_or_default();
            let _ = write!(line, "{cell:<width$}");
        }
        output.push_str(line.trim_end());
        output.push('\n');
    }
    output
}
