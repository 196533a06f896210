// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use pipedesk_app::{
    ColumnCommand, ColumnConfig, ColumnEngine, ColumnEvent, ColumnSeed, ColumnUpdate, Contact,
    ContactId, LoadOrigin, ReorderEntry, SortDirection, ViewKind, contact_view, deal_view,
};
use pipedesk_testkit::{CrmFaker, MemoryStore};
use time::OffsetDateTime;

const KEY: &str = "contact-list-columns";

fn two_columns() -> Vec<ColumnSeed> {
    vec![
        ColumnSeed::new("name", "Name", 0),
        ColumnSeed::new("email", "Email", 1),
    ]
}

fn contact(id: i64, first_name: &str) -> Contact {
    Contact {
        id: ContactId::new(id),
        first_name: Some(first_name.to_owned()),
        last_name: None,
        email: None,
        phone: None,
        company: None,
        job_title: None,
        tags: Vec::new(),
        created_at: OffsetDateTime::UNIX_EPOCH,
    }
}

fn stored(store: &MemoryStore, key: &str) -> Result<Vec<ColumnConfig>> {
    let raw = store.get(key).unwrap_or_default();
    Ok(serde_json::from_str(&raw)?)
}

fn ids(columns: &[&ColumnConfig]) -> Vec<String> {
    columns.iter().map(|column| column.id.clone()).collect()
}

#[test]
fn first_load_seeds_defaults_and_persists_them() -> Result<()> {
    let store = MemoryStore::new();
    let engine = ColumnEngine::load(&store, KEY, two_columns())?;

    assert_eq!(engine.origin(), LoadOrigin::Seeded);
    assert_eq!(engine.storage_key(), KEY);
    assert_eq!(engine.defaults(), two_columns().as_slice());
    assert_eq!(stored(&store, KEY)?, engine.columns());
    assert!(engine.sorted_columns().is_empty());
    Ok(())
}

#[test]
fn well_formed_blob_is_used_verbatim() -> Result<()> {
    let raw = r#"[
        {"id":"email","label":"Mail","visible":false,"order":0,"sortDirection":"desc"},
        {"id":"name","label":"Who","visible":true,"order":1,"sortDirection":null}
    ]"#;
    let store = MemoryStore::with_value(KEY, raw);
    let engine = ColumnEngine::load(&store, KEY, two_columns())?;

    assert_eq!(engine.origin(), LoadOrigin::Restored);
    assert_eq!(store.write_count(), 0);
    assert_eq!(store.get(KEY).as_deref(), Some(raw));
    assert_eq!(engine.columns()[0].label, "Mail");
    assert_eq!(ids(&engine.visible_columns()), vec!["name"]);
    Ok(())
}

#[test]
fn malformed_blob_falls_back_to_defaults() -> Result<()> {
    for raw in ["not json", "{}", r#"[{"id":"name"}]"#, ""] {
        let store = MemoryStore::with_value(KEY, raw);
        let engine = ColumnEngine::load(&store, KEY, two_columns())?;
        assert_eq!(engine.origin(), LoadOrigin::Seeded, "blob {raw:?}");
        assert_eq!(stored(&store, KEY)?, engine.columns());
    }
    Ok(())
}

#[test]
fn unreadable_store_falls_back_to_defaults() -> Result<()> {
    let store = MemoryStore::new();
    store.set_fail_reads(true);
    let engine = ColumnEngine::load(&store, KEY, two_columns())?;

    assert_eq!(engine.origin(), LoadOrigin::Fallback);
    assert_eq!(engine.columns().len(), 2);
    assert_eq!(store.write_count(), 0);
    assert!(store.get(KEY).is_none());
    Ok(())
}

#[test]
fn transient_read_failure_keeps_saved_customizations() -> Result<()> {
    let store = MemoryStore::new();
    {
        let mut engine = ColumnEngine::load(&store, KEY, two_columns())?;
        engine.rename_column("name", "Full Name");
    }
    let saved = store.get(KEY);

    store.set_fail_reads(true);
    let fallback = ColumnEngine::load(&store, KEY, two_columns())?;
    assert_eq!(fallback.column("name").map(|column| column.label.as_str()), Some("Name"));
    assert_eq!(store.get(KEY), saved);

    store.set_fail_reads(false);
    let recovered = ColumnEngine::load(&store, KEY, two_columns())?;
    assert_eq!(recovered.origin(), LoadOrigin::Restored);
    assert_eq!(
        recovered.column("name").map(|column| column.label.as_str()),
        Some("Full Name")
    );
    Ok(())
}

#[test]
fn seed_write_failure_is_reported_after_load() -> Result<()> {
    let store = MemoryStore::new();
    store.set_fail_writes(true);
    let engine = ColumnEngine::load(&store, KEY, two_columns())?;
    assert!(engine.load_write_error().is_some());

    store.set_fail_writes(false);
    let engine = ColumnEngine::load(&store, KEY, two_columns())?;
    assert_eq!(engine.load_write_error(), None);

    let restored = ColumnEngine::load(&store, KEY, two_columns())?;
    assert_eq!(restored.origin(), LoadOrigin::Restored);
    assert_eq!(restored.load_write_error(), None);
    Ok(())
}

#[test]
fn unwritable_store_still_loads() -> Result<()> {
    let store = MemoryStore::new();
    store.set_fail_writes(true);
    let mut engine = ColumnEngine::load(&store, KEY, two_columns())?;
    assert_eq!(engine.columns().len(), 2);

    let events = engine.toggle_column_visibility("name");
    assert!(matches!(events.last(), Some(ColumnEvent::PersistFailed(_))));
    assert_eq!(ids(&engine.visible_columns()), vec!["email"]);

    store.set_fail_writes(false);
    engine.toggle_column_visibility("name");
    assert_eq!(stored(&store, KEY)?, engine.columns());
    Ok(())
}

#[test]
fn reset_is_idempotent_and_clears_sort() -> Result<()> {
    let store = MemoryStore::new();
    let mut engine = contact_view().load_engine(&store)?;
    let seeded: Vec<ColumnConfig> = engine.columns().to_vec();

    engine.rename_column("tags", "Labels");
    engine.toggle_column_visibility("phone");
    engine.move_column("tags", 0);
    engine.set_sort_direction("company", Some(SortDirection::Asc));

    for _ in 0..3 {
        assert_eq!(engine.reset_to_defaults(), vec![ColumnEvent::Reset]);
        assert_eq!(engine.columns(), seeded.as_slice());
        assert!(engine.columns().iter().all(|column| column.sort_direction.is_none()));
    }
    assert_eq!(stored(&store, KEY)?, seeded);
    Ok(())
}

#[test]
fn visibility_round_trip_for_every_column() -> Result<()> {
    let store = MemoryStore::new();
    let mut engine = deal_view().load_engine(&store)?;
    let original: Vec<ColumnConfig> = engine.columns().to_vec();

    for column in &original {
        engine.toggle_column_visibility(&column.id);
        let hidden: Vec<String> = engine
            .columns()
            .iter()
            .filter(|candidate| !candidate.visible)
            .map(|candidate| candidate.id.clone())
            .collect();
        assert_eq!(hidden, vec![column.id.clone()]);
        assert!(ids(&engine.visible_columns()).iter().all(|id| *id != column.id));

        engine.toggle_column_visibility(&column.id);
    }
    assert_eq!(engine.columns(), original.as_slice());
    Ok(())
}

#[test]
fn hiding_every_column_is_allowed() -> Result<()> {
    let store = MemoryStore::new();
    let mut engine = ColumnEngine::load(&store, KEY, two_columns())?;
    engine.toggle_column_visibility("name");
    engine.toggle_column_visibility("email");

    assert!(engine.visible_columns().is_empty());
    assert_eq!(engine.columns().len(), 2);
    assert_eq!(contact_view().header(&engine), Vec::<String>::new());
    Ok(())
}

#[test]
fn visible_columns_follow_order_and_identity_reorder_is_noop() -> Result<()> {
    let store = MemoryStore::new();
    let mut engine = contact_view().load_engine(&store)?;
    engine.move_column("email", 4);
    let before = ids(&engine.visible_columns());

    let orders: Vec<i64> = engine.visible_columns().iter().map(|column| column.order).collect();
    assert!(orders.windows(2).all(|pair| pair[0] < pair[1]));

    let identity: Vec<ReorderEntry> = engine
        .columns()
        .iter()
        .map(|column| ReorderEntry::new(column.id.clone(), column.order))
        .collect();
    engine.reorder_columns(&identity);
    assert_eq!(ids(&engine.visible_columns()), before);
    Ok(())
}

#[test]
fn move_column_yields_contiguous_permutation() -> Result<()> {
    let store = MemoryStore::new();
    let mut engine = contact_view().load_engine(&store)?;

    assert_eq!(engine.move_column("tags", 1), vec![ColumnEvent::Reordered]);
    assert_eq!(
        ids(&engine.ordered_columns()),
        vec!["name", "tags", "email", "phone", "company", "jobTitle"]
    );

    engine.move_column("name", 99);
    assert_eq!(
        ids(&engine.ordered_columns()),
        vec!["tags", "email", "phone", "company", "jobTitle", "name"]
    );

    let mut orders: Vec<i64> = engine.columns().iter().map(|column| column.order).collect();
    orders.sort_unstable();
    assert_eq!(orders, (0..6).collect::<Vec<i64>>());
    Ok(())
}

#[test]
fn reorder_with_duplicate_orders_is_normalized() -> Result<()> {
    let store = MemoryStore::new();
    let mut engine = ColumnEngine::load(&store, KEY, two_columns())?;

    engine.reorder_columns(&[
        ReorderEntry::new("email", 5),
        ReorderEntry::new("name", 5),
        ReorderEntry::new("ghost", -1),
    ]);
    let orders: Vec<(String, i64)> = engine
        .columns()
        .iter()
        .map(|column| (column.id.clone(), column.order))
        .collect();
    assert_eq!(orders, vec![("name".to_owned(), 0), ("email".to_owned(), 1)]);
    Ok(())
}

#[test]
fn ascending_sort_puts_lowercase_alice_before_bob() -> Result<()> {
    let store = MemoryStore::new();
    let view = contact_view();
    let mut engine = view.load_engine(&store)?;
    let rows = vec![contact(1, "Bob"), contact(2, "alice")];

    engine.set_sort_direction("name", Some(SortDirection::Asc));
    let sorted = ids(&engine.sorted_columns());
    assert_eq!(sorted, vec!["name"]);

    let names = |engine: &ColumnEngine<&MemoryStore>| -> Vec<String> {
        view.project(engine, &rows)
            .rows
            .into_iter()
            .map(|row| row[0].clone())
            .collect()
    };
    assert_eq!(names(&engine), vec!["alice", "Bob"]);

    engine.set_sort_direction("name", Some(SortDirection::Desc));
    assert_eq!(names(&engine), vec!["Bob", "alice"]);

    engine.set_sort_direction("name", None);
    assert_eq!(names(&engine), vec!["Bob", "alice"]);
    Ok(())
}

#[test]
fn cycle_sort_walks_none_asc_desc_none() -> Result<()> {
    let store = MemoryStore::new();
    let mut engine = contact_view().load_engine(&store)?;

    let mut seen = Vec::new();
    for _ in 0..3 {
        engine.cycle_sort("company");
        seen.push(engine.column("company").and_then(|column| column.sort_direction));
    }
    assert_eq!(
        seen,
        vec![Some(SortDirection::Asc), Some(SortDirection::Desc), None]
    );
    Ok(())
}

#[test]
fn first_sorted_column_wins_and_stale_sort_stays_visible() -> Result<()> {
    let store = MemoryStore::new();
    let view = contact_view();
    let mut engine = view.load_engine(&store)?;
    let rows = vec![contact(1, "Bob"), contact(2, "alice")];

    engine.set_sort_direction("name", Some(SortDirection::Desc));
    engine.set_sort_direction("email", Some(SortDirection::Asc));

    assert_eq!(ids(&engine.sorted_columns()), vec!["name", "email"]);
    assert_eq!(
        engine.column("email").and_then(|column| column.sort_direction),
        Some(SortDirection::Asc)
    );
    let projected = view.project(&engine, &rows);
    assert_eq!(projected.rows[0][0], "Bob");

    engine.set_sort_direction("name", None);
    assert_eq!(
        engine
            .active_sort()
            .map(|(column, direction)| (column.id.clone(), direction)),
        Some(("email".to_owned(), SortDirection::Asc))
    );
    Ok(())
}

#[test]
fn rename_survives_reload() -> Result<()> {
    let store = MemoryStore::new();
    {
        let mut engine = contact_view().load_engine(&store)?;
        let events = engine.rename_column("company", "New Label");
        assert_eq!(
            events,
            vec![ColumnEvent::Renamed {
                id: "company".to_owned(),
                label: "New Label".to_owned(),
            }]
        );
    }

    let reloaded = contact_view().load_engine(&store)?;
    assert_eq!(reloaded.origin(), LoadOrigin::Restored);
    assert_eq!(
        reloaded.column("company").map(|column| column.label.as_str()),
        Some("New Label")
    );
    Ok(())
}

#[test]
fn empty_label_is_accepted_verbatim() -> Result<()> {
    let store = MemoryStore::new();
    let mut engine = ColumnEngine::load(&store, KEY, two_columns())?;
    engine.rename_column("email", "");
    assert_eq!(engine.column("email").map(|column| column.label.as_str()), Some(""));
    Ok(())
}

#[test]
fn unknown_id_leaves_memory_and_storage_untouched() -> Result<()> {
    let store = MemoryStore::new();
    let mut engine = contact_view().load_engine(&store)?;
    engine.rename_column("email", "Mail");

    let columns_before = engine.columns().to_vec();
    let storage_before = store.snapshot();
    let writes_before = store.write_count();

    let commands = vec![
        ColumnCommand::Update {
            id: "ghost".to_owned(),
            update: ColumnUpdate {
                label: Some("Boo".to_owned()),
                ..ColumnUpdate::default()
            },
        },
        ColumnCommand::ToggleVisibility("ghost".to_owned()),
        ColumnCommand::Rename {
            id: "ghost".to_owned(),
            label: "Boo".to_owned(),
        },
        ColumnCommand::Reorder(vec![ReorderEntry::new("ghost", 0)]),
        ColumnCommand::Reorder(Vec::new()),
        ColumnCommand::Move {
            id: "ghost".to_owned(),
            to_index: 0,
        },
        ColumnCommand::SetSort {
            id: "ghost".to_owned(),
            direction: Some(SortDirection::Asc),
        },
        ColumnCommand::CycleSort("ghost".to_owned()),
    ];
    for command in commands {
        assert!(engine.dispatch(command).is_empty());
    }

    assert_eq!(engine.columns(), columns_before.as_slice());
    assert_eq!(store.snapshot(), storage_before);
    assert_eq!(store.write_count(), writes_before);
    Ok(())
}

#[test]
fn partial_update_merges_fields_and_keeps_id() -> Result<()> {
    let store = MemoryStore::new();
    let mut engine = ColumnEngine::load(&store, KEY, two_columns())?;

    let events = engine.update_column(
        "email",
        ColumnUpdate {
            visible: Some(false),
            sort_direction: Some(Some(SortDirection::Desc)),
            ..ColumnUpdate::default()
        },
    );
    assert_eq!(events, vec![ColumnEvent::ColumnUpdated("email".to_owned())]);

    let email = engine.column("email").cloned();
    assert_eq!(
        email,
        Some(ColumnConfig {
            id: "email".to_owned(),
            label: "Email".to_owned(),
            visible: false,
            order: 1,
            sort_direction: Some(SortDirection::Desc),
        })
    );
    assert_eq!(stored(&store, KEY)?, engine.columns());
    Ok(())
}

#[test]
fn hide_rename_reorder_reload_scenario() -> Result<()> {
    let store = MemoryStore::new();
    {
        let mut engine = ColumnEngine::load(&store, KEY, two_columns())?;
        engine.toggle_column_visibility("email");
        engine.rename_column("name", "Full Name");
        engine.reorder_columns(&[ReorderEntry::new("email", 0), ReorderEntry::new("name", 1)]);
    }

    let engine = ColumnEngine::load(&store, KEY, two_columns())?;
    let visible = engine.visible_columns();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, "name");
    assert_eq!(visible[0].label, "Full Name");
    assert_eq!(visible[0].order, 1);

    let email = engine.column("email").map(|column| (column.visible, column.order));
    assert_eq!(email, Some((false, 0)));
    assert_eq!(engine.columns().len(), 2);
    Ok(())
}

#[test]
fn view_gaining_a_column_reconciles_old_blob() -> Result<()> {
    let store = MemoryStore::new();
    {
        let mut engine = ColumnEngine::load(&store, KEY, two_columns())?;
        engine.toggle_column_visibility("email");
    }

    let view = contact_view();
    let engine = view.load_engine(&store)?;
    assert_eq!(engine.origin(), LoadOrigin::Reconciled);
    assert_eq!(engine.column("email").map(|column| column.visible), Some(false));
    assert_eq!(
        ids(&engine.ordered_columns()),
        vec!["name", "email", "phone", "company", "jobTitle", "tags"]
    );
    assert_eq!(stored(&store, view.storage_key())?, engine.columns());
    Ok(())
}

#[test]
fn projection_matches_visible_columns_for_fake_rows() -> Result<()> {
    let store = MemoryStore::new();
    let view = deal_view();
    let mut engine = view.load_engine(&store)?;
    engine.toggle_column_visibility("contacts");
    engine.move_column("value", 0);
    engine.set_sort_direction("value", Some(SortDirection::Desc));

    let deals = CrmFaker::new(11).deals(25);
    let table = view.project(&engine, &deals);

    assert_eq!(table.title, ViewKind::Deals.label());
    assert_eq!(
        table.columns,
        vec!["Value", "Name", "Stage", "Currency", "Expected Close"]
    );
    assert_eq!(table.row_count(), 25);
    assert!(table.rows.iter().all(|row| row.len() == table.column_count()));

    let mut cents: Vec<Option<i64>> = deals.iter().map(|deal| deal.value_cents).collect();
    cents.sort_unstable_by(|left, right| right.cmp(left));
    let expected: Vec<String> = cents
        .into_iter()
        .map(|value| value.map(pipedesk_app::format_cents).unwrap_or_default())
        .collect();
    let actual: Vec<String> = table.rows.iter().map(|row| row[0].clone()).collect();
    assert_eq!(actual, expected);
    Ok(())
}

#[test]
fn contacts_without_names_sort_by_email() -> Result<()> {
    let store = MemoryStore::new();
    let view = contact_view();
    let mut engine = view.load_engine(&store)?;
    engine.set_sort_direction("name", Some(SortDirection::Asc));

    let mut anonymous = contact(3, "ignored");
    anonymous.first_name = None;
    anonymous.email = Some("aaron@example.com".to_owned());
    let rows = vec![contact(1, "Zed"), anonymous, contact(2, "Mia")];

    let names: Vec<String> = view
        .sort_rows(&engine, &rows)
        .into_iter()
        .map(|row| row.id.get().to_string())
        .collect();
    assert_eq!(names, vec!["3", "2", "1"]);
    Ok(())
}

#[test]
fn unnamed_contact_shows_placeholder_but_sorts_by_email() -> Result<()> {
    let store = MemoryStore::new();
    let view = contact_view();
    let mut engine = view.load_engine(&store)?;
    engine.set_sort_direction("name", Some(SortDirection::Asc));

    let mut anonymous = contact(3, "ignored");
    anonymous.first_name = None;
    anonymous.email = Some("aaron@example.com".to_owned());
    let rows = vec![contact(1, "Zed"), anonymous];

    let table = view.project(&engine, &rows);
    let names: Vec<&str> = table.rows.iter().map(|row| row[0].as_str()).collect();
    assert_eq!(names, vec!["(No name)", "Zed"]);
    assert_eq!(table.rows[0][1], "aaron@example.com");
    assert_eq!(table.rows[1][1], "—");
    Ok(())
}

#[test]
fn accented_names_sort_with_their_base_letter() -> Result<()> {
    let store = MemoryStore::new();
    let view = contact_view();
    let mut engine = view.load_engine(&store)?;
    let rows = vec![contact(1, "Frank"), contact(2, "Émile"), contact(3, "Zoe")];

    engine.set_sort_direction("name", Some(SortDirection::Asc));
    let ascending: Vec<i64> = view
        .sort_rows(&engine, &rows)
        .into_iter()
        .map(|row| row.id.get())
        .collect();
    assert_eq!(ascending, vec![2, 1, 3]);

    engine.set_sort_direction("name", Some(SortDirection::Desc));
    let descending: Vec<i64> = view
        .sort_rows(&engine, &rows)
        .into_iter()
        .map(|row| row.id.get())
        .collect();
    assert_eq!(descending, vec![3, 1, 2]);
    Ok(())
}

#[test]
fn equal_sort_keys_keep_fetch_order_in_both_directions() -> Result<()> {
    let store = MemoryStore::new();
    let view = contact_view();
    let mut engine = view.load_engine(&store)?;

    let mut rows: Vec<Contact> = (1..=6).map(|id| contact(id, "Same")).collect();
    rows[1].company = Some("Acme".to_owned());
    rows[4].company = Some("acme".to_owned());

    for direction in [SortDirection::Asc, SortDirection::Desc] {
        engine.set_sort_direction("name", Some(direction));
        let order: Vec<i64> = view
            .sort_rows(&engine, &rows)
            .into_iter()
            .map(|row| row.id.get())
            .collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5, 6], "{direction:?} on name");
    }

    engine.set_sort_direction("name", None);
    engine.set_sort_direction("company", Some(SortDirection::Asc));
    let ascending: Vec<i64> = view
        .sort_rows(&engine, &rows)
        .into_iter()
        .map(|row| row.id.get())
        .collect();
    assert_eq!(ascending, vec![1, 3, 4, 6, 5, 2]);

    engine.set_sort_direction("company", Some(SortDirection::Desc));
    let descending: Vec<i64> = view
        .sort_rows(&engine, &rows)
        .into_iter()
        .map(|row| row.id.get())
        .collect();
    assert_eq!(descending, vec![2, 5, 1, 3, 4, 6]);
    Ok(())
}

#[test]
fn columns_the_view_no_longer_declares_survive_reload() -> Result<()> {
    let raw = r#"[
        {"id":"name","label":"Name","visible":true,"order":0,"sortDirection":null},
        {"id":"leadScore","label":"Score","visible":true,"order":1,"sortDirection":null},
        {"id":"email","label":"Email","visible":true,"order":2,"sortDirection":null}
    ]"#;
    let store = MemoryStore::with_value(KEY, raw);
    let engine = ColumnEngine::load(&store, KEY, two_columns())?;

    assert_eq!(engine.origin(), LoadOrigin::Restored);
    assert_eq!(store.write_count(), 0);
    assert_eq!(ids(&engine.ordered_columns()), vec!["name", "leadScore", "email"]);

    let view = contact_view();
    let engine = view.load_engine(&store)?;
    assert_eq!(engine.origin(), LoadOrigin::Reconciled);
    assert!(stored(&store, KEY)?.iter().any(|column| column.id == "leadScore"));

    let table = view.project(&engine, &[contact(1, "Ada")]);
    assert_eq!(table.columns[1], "Score");
    assert_eq!(table.rows[0][1], "—");
    Ok(())
}
