// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use pipedesk_app::{ColumnStore, Contact, ContactId, Deal, DealId, DealStage};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::PathBuf;
use time::{Date, Duration, Month, OffsetDateTime};

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];

const COMPANY_PREFIXES: [&str; 12] = [
    "Premier", "Central", "Reliable", "Bright", "Quality", "Summit", "Eagle", "Heritage",
    "Greenleaf", "Sparks", "Hartley", "Apex",
];
const COMPANY_SUFFIXES: [&str; 6] = ["Labs", "Systems", "Co", "Partners", "Works", "Group"];

const JOB_TITLES: [&str; 10] = [
    "Account Executive",
    "CTO",
    "Founder",
    "Head of Sales",
    "Operations Manager",
    "Procurement Lead",
    "Product Manager",
    "VP Engineering",
    "Marketing Director",
    "Office Manager",
];

const TAGS: [&str; 8] = [
    "vip",
    "lead",
    "partner",
    "churn-risk",
    "newsletter",
    "referral",
    "enterprise",
    "trial",
];

const DEAL_PRODUCTS: [&str; 8] = [
    "Annual License",
    "Pilot",
    "Support Renewal",
    "Onboarding Package",
    "Seat Expansion",
    "Integration Project",
    "Training Workshop",
    "Hardware Bundle",
];

const CURRENCIES: [&str; 3] = ["USD", "EUR", "GBP"];

const EMAIL_DOMAINS: [&str; 5] = [
    "example.com",
    "acme.test",
    "mail.local",
    "corp.example",
    "startup.io",
];

const REFERENCE_YEAR: i32 = 2026;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn chance(&mut self, percent: usize) -> bool {
        self.int_n(100) < percent
    }
}

/// Seeded generator of contact and deal rows. Equal seeds yield equal rows.
#[derive(Debug, Clone)]
pub struct CrmFaker {
    rng: DeterministicRng,
    next_contact_id: i64,
    next_deal_id: i64,
}

impl CrmFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_contact_id: 1,
            next_deal_id: 1,
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn contact(&mut self) -> Contact {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        let domain = self.pick(&EMAIL_DOMAINS);
        let id = ContactId::new(self.next_contact_id);
        self.next_contact_id += 1;

        // Roughly one contact in ten is known only by email.
        let anonymous = self.rng.chance(10);
        let tag_count = self.int_n(3);
        let mut tags = Vec::with_capacity(tag_count);
        for _ in 0..tag_count {
            let tag = self.pick(&TAGS).to_owned();
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        Contact {
            id,
            first_name: (!anonymous).then(|| first.to_owned()),
            last_name: (!anonymous).then(|| last.to_owned()),
            email: Some(format!(
                "{}.{}@{domain}",
                first.to_ascii_lowercase(),
                last.to_ascii_lowercase()
            )),
            phone: self.rng.chance(80).then(|| self.phone()),
            company: self.rng.chance(85).then(|| self.company()),
            job_title: self
                .rng
                .chance(70)
                .then(|| self.pick(&JOB_TITLES).to_owned()),
            tags,
            created_at: self.datetime_in_year(REFERENCE_YEAR),
        }
    }

    pub fn contacts(&mut self, count: usize) -> Vec<Contact> {
        (0..count).map(|_| self.contact()).collect()
    }

    pub fn deal(&mut self) -> Deal {
        let id = DealId::new(self.next_deal_id);
        self.next_deal_id += 1;
        let stage = DealStage::ALL[self.int_n(DealStage::ALL.len())];
        let contact_count = self.int_n(3);
        let contact_names = (0..contact_count)
            .map(|_| format!("{} {}", self.pick(&FIRST_NAMES), self.pick(&LAST_NAMES)))
            .collect();

        Deal {
            id,
            name: format!("{} {}", self.company(), self.pick(&DEAL_PRODUCTS)),
            stage,
            value_cents: self
                .rng
                .chance(90)
                .then(|| self.int_range_i64(50_000, 25_000_000)),
            currency: self
                .rng
                .chance(90)
                .then(|| self.pick(&CURRENCIES).to_owned()),
            expected_close_date: self
                .rng
                .chance(75)
                .then(|| self.datetime_in_year(REFERENCE_YEAR).date()),
            contact_names,
            created_at: self.datetime_in_year(REFERENCE_YEAR),
        }
    }

    pub fn deals(&mut self, count: usize) -> Vec<Deal> {
        (0..count).map(|_| self.deal()).collect()
    }

    pub fn company(&mut self) -> String {
        format!(
            "{} {}",
            self.pick(&COMPANY_PREFIXES),
            self.pick(&COMPANY_SUFFIXES)
        )
    }

    pub fn datetime_in_year(&mut self, year: i32) -> OffsetDateTime {
        let start = midnight_utc(year, Month::January, 1);
        let offset = self.int_range_i64(0, 364);
        start + Duration::days(offset) + Duration::minutes(self.int_range_i64(0, 24 * 60 - 1))
    }

    fn phone(&mut self) -> String {
        format!(
            "({:03}) {:03}-{:04}",
            self.int_range_i64(200, 999),
            self.int_range_i64(200, 999),
            self.int_range_i64(0, 9_999),
        )
    }

    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values[self.int_n(values.len())]
    }

    fn int_range_i64(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        let span = (high - low + 1) as usize;
        low + self.int_n(span) as i64
    }
}

/// In-memory [`ColumnStore`] with switchable read and write failures.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<BTreeMap<String, String>>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::default();
        store.insert(key, value);
        store
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values.borrow().clone()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Successful writes since creation.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl ColumnStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.get() {
            bail!("memory store read of {key} refused");
        }
        Ok(self.get(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.get() {
            bail!("memory store write of {key} refused: quota exceeded");
        }
        self.insert(key, value);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("pipedesk.db");
    Ok((dir, db_path))
}

pub fn first_names() -> &'static [&'static str] {
    &FIRST_NAMES
}

pub fn tags() -> &'static [&'static str] {
    &TAGS
}

fn midnight_utc(year: i32, month: Month, day: u8) -> OffsetDateTime {
    Date::from_calendar_date(year, month, day)
        .map_or(OffsetDateTime::UNIX_EPOCH, |date| date.midnight().assume_utc())
}
