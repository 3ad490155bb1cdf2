// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Benchmarks for note selection and the cash machine engine.
//!
//! Run with: cargo bench
//!
//! Benchmarks include:
//! - Note selection on its own
//! - Single-threaded withdrawals and replenishments
//! - Parallel withdrawals, with and without committing notes
//! - Scaling with number of accounts

use atm_cash::{
    AccountId, Denomination, Engine, InMemoryInventoryStore, InMemoryLedger, Inventory,
    MachineConfig, Note, SelectionPolicy, select_notes,
};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

// =============================================================================
// Helper Functions
// =============================================================================

fn account(n: u32) -> AccountId {
    AccountId::new(format!("{:05}", n))
}

/// Engine with `accounts` accounts holding `balance` each.
fn engine_with_accounts(
    stock: Inventory,
    accounts: u32,
    balance: i64,
    config: MachineConfig,
) -> Engine {
    let ledger = InMemoryLedger::new();
    for n in 0..accounts {
        ledger.open(account(n), Decimal::from(balance));
    }
    Engine::with_config(InMemoryInventoryStore::with_inventory(stock), ledger, config)
}

fn full_cassettes() -> Inventory {
    Inventory::new(2_000, 2_000, 2_000, 2_000)
}

// =============================================================================
// Selection Benchmarks
// =============================================================================

fn bench_select_notes(c: &mut Criterion) {
    let inventory = Inventory::new(4, 4, 2, 2);
    let policy = SelectionPolicy::default();

    let mut group = c.benchmark_group("select_notes");
    for amount in [20u64, 75, 100, 250].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(amount), amount, |b, &amount| {
            b.iter(|| select_notes(black_box(amount), &inventory, &policy))
        });
    }
    group.finish();
}

// =============================================================================
// Single-Threaded Benchmarks
// =============================================================================

fn bench_single_dispense(c: &mut Criterion) {
    c.bench_function("single_dispense", |b| {
        let engine =
            engine_with_accounts(full_cassettes(), 1, i64::MAX / 4, MachineConfig::default());
        let id = account(0);
        b.iter(|| engine.dispense(&id, black_box(Decimal::from(100))).unwrap())
    });
}

fn bench_single_replenish(c: &mut Criterion) {
    let notes: Vec<Note> = Denomination::ALL.iter().copied().map(Note::new).collect();

    c.bench_function("single_replenish", |b| {
        b.iter(|| {
            let engine = Engine::default();
            engine.replenish(black_box(&notes)).unwrap();
        })
    });
}

fn bench_replenish_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("replenish_throughput");
    let notes = [Note::new(Denomination::Twenty), Note::new(Denomination::Fifty)];

    for count in [100, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let engine = Engine::default();
                for _ in 0..count {
                    engine.replenish(&notes).unwrap();
                }
                black_box(engine.inventory());
            })
        });
    }
    group.finish();
}

// =============================================================================
// Multi-Threaded Benchmarks
// =============================================================================

fn bench_parallel_dispense(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_dispense");
    let total_ops = 10_000u32;

    // Fewer accounts means more threads waiting on the same account lock.
    for num_accounts in [1u32, 10, 100, 1_000].iter() {
        group.throughput(Throughput::Elements(total_ops as u64));
        group.bench_with_input(
            BenchmarkId::new("accounts", num_accounts),
            num_accounts,
            |b, &num_accounts| {
                b.iter(|| {
                    let engine = Arc::new(engine_with_accounts(
                        full_cassettes(),
                        num_accounts,
                        1_000_000_000,
                        MachineConfig::default(),
                    ));

                    (0..total_ops).into_par_iter().for_each(|i| {
                        let _ = engine.dispense(&account(i % num_accounts), Decimal::from(70));
                    });

                    black_box(&engine);
                })
            },
        );
    }
    group.finish();
}

fn bench_parallel_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_commit");
    let total_ops = 2_000u32;
    let config = MachineConfig {
        commit_dispensed_notes: true,
        max_store_retries: u32::MAX,
        ..MachineConfig::default()
    };

    for num_threads in [1, 2, 4, 8].iter() {
        group.throughput(Throughput::Elements(total_ops as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(num_threads),
            num_threads,
            |b, &num_threads| {
                // Configure rayon thread pool for this benchmark
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build()
                    .unwrap();

                b.iter(|| {
                    let engine =
                        Arc::new(engine_with_accounts(full_cassettes(), 100, 1_000_000, config));

                    pool.install(|| {
                        (0..total_ops).into_par_iter().for_each(|i| {
                            let _ = engine.dispense(&account(i % 100), Decimal::from(100));
                        });
                    });

                    black_box(&engine);
                })
            },
        );
    }
    group.finish();
}

criterion_group!(selection, bench_select_notes,);

criterion_group!(
    single_threaded,
    bench_single_dispense,
    bench_single_replenish,
    bench_replenish_throughput,
);

criterion_group!(multi_threaded, bench_parallel_dispense, bench_parallel_commit,);

criterion_main!(selection, single_threaded, multi_threaded);
