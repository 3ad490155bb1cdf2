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

use atm_cash::{
    AccountId, BALANCE_NOT_FOUND, Denomination, Engine, InMemoryInventoryStore, InMemoryLedger,
    Inventory, MachineConfig, Note, SelectionPolicy, format_balance,
};
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;

/// ATM Cash - Run a cash machine script
///
/// Reads machine operations from a CSV file and writes one result row per
/// operation to stdout. Set `RUST_LOG=debug` for a trace of each decision.
#[derive(Parser, Debug)]
#[command(name = "atm-cash")]
#[command(about = "Replays ATM replenishments and withdrawals from CSV", long_about = None)]
struct Args {
    /// Path to CSV script
    ///
    /// Expected format: type,account,amount,notes
    /// Example: cargo run -- script.csv > results.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Smallest amount paid out
    #[arg(long, default_value_t = MachineConfig::DEFAULT_MIN_AMOUNT)]
    min_amount: u64,

    /// Largest amount paid out
    #[arg(long, default_value_t = MachineConfig::DEFAULT_MAX_AMOUNT)]
    max_amount: u64,

    /// Check the five-note stack before handing out fives
    #[arg(long)]
    strict_five_stock: bool,

    /// Remove dispensed notes from the stored inventory
    #[arg(long)]
    commit_dispensed: bool,

    /// Credit the account back when notes cannot be dispensed after the debit
    #[arg(long)]
    compensate: bool,

    /// Store retries on concurrent inventory updates
    #[arg(long, default_value_t = MachineConfig::DEFAULT_STORE_RETRIES)]
    retries: u32,
}

impl Args {
    fn config(&self) -> MachineConfig {
        MachineConfig {
            min_amount: self.min_amount,
            max_amount: self.max_amount,
            selection: SelectionPolicy {
                strict_five_stock: self.strict_five_stock,
            },
            commit_dispensed_notes: self.commit_dispensed,
            compensate_failed_dispense: self.compensate,
            max_store_retries: self.retries,
        }
    }
}

fn main() {
    env_logger::init();

    let args = Args::parse();

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let engine = Engine::with_config(
        InMemoryInventoryStore::new(),
        InMemoryLedger::new(),
        args.config(),
    );

    if let Err(e) = run_script(&engine, BufReader::new(file), std::io::stdout()) {
        eprintln!("Error running script: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the script format.
///
/// Fields: `type, account, amount, notes`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "type")]
    op: String,
    #[serde(default)]
    account: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
    #[serde(default)]
    notes: Option<String>,
}

/// One script operation.
#[derive(Debug, PartialEq)]
enum Command {
    Open { account: AccountId, balance: Decimal },
    Replenish { notes: Vec<Note> },
    Withdraw { account: AccountId, amount: Decimal },
    Balance { account: AccountId },
}

impl CsvRecord {
    /// Converts CSV record to a command.
    ///
    /// Returns `None` for unknown operations, missing required fields, or
    /// unknown note values.
    fn into_command(self) -> Option<Command> {
        let account = self
            .account
            .filter(|a| !a.is_empty())
            .map(AccountId::new);

        match self.op.to_lowercase().as_str() {
            "open" => Some(Command::Open {
                account: account?,
                balance: self.amount?,
            }),
            "replenish" => {
                let notes = self
                    .notes
                    .unwrap_or_default()
                    .split_whitespace()
                    .map(|token| token.parse::<Denomination>().ok().map(Note::new))
                    .collect::<Option<Vec<_>>>()?;
                Some(Command::Replenish { notes })
            }
            "withdraw" | "withdrawal" => Some(Command::Withdraw {
                account: account?,
                amount: self.amount?,
            }),
            "balance" => Some(Command::Balance { account: account? }),
            _ => None,
        }
    }
}

/// Result row written for every processed command.
#[derive(Debug, Serialize)]
struct ReportRow {
    #[serde(rename = "type")]
    op: &'static str,
    account: String,
    status: &'static str,
    detail: String,
}

fn describe_inventory(inventory: &Inventory) -> String {
    let stacks: Vec<String> = Denomination::descending()
        .map(|d| format!("{}={}", d.name(), inventory.stack_for(d)))
        .collect();
    format!("{} total={}", stacks.join(" "), inventory.total_value())
}

fn execute(engine: &Engine, command: Command) -> ReportRow {
    match command {
        Command::Open { account, balance } => {
            engine.ledger().open(account.clone(), balance);
            ReportRow {
                op: "open",
                account: account.to_string(),
                status: "ok",
                detail: format_balance(balance),
            }
        }
        Command::Replenish { notes } => match engine.replenish(&notes) {
            Ok(inventory) => ReportRow {
                op: "replenish",
                account: String::new(),
                status: "ok",
                detail: describe_inventory(&inventory),
            },
            Err(e) => ReportRow {
                op: "replenish",
                account: String::new(),
                status: "error",
                detail: e.to_string(),
            },
        },
        Command::Withdraw { account, amount } => match engine.dispense(&account, amount) {
            Ok(outcome) => ReportRow {
                op: "withdraw",
                account: account.to_string(),
                status: "ok",
                detail: outcome.to_string(),
            },
            Err(e) => ReportRow {
                op: "withdraw",
                account: account.to_string(),
                status: "declined",
                detail: e.to_string(),
            },
        },
        Command::Balance { account } => {
            let balance = engine.check_balance(&account);
            let status = if balance == BALANCE_NOT_FOUND {
                "not_found"
            } else {
                "ok"
            };
            ReportRow {
                op: "balance",
                account: account.to_string(),
                status,
                detail: balance,
            }
        }
    }
}

/// Runs a CSV script against the engine and writes one report row per
/// command.
///
/// Records are streamed one at a time. Malformed rows and unknown commands
/// are skipped with a warning.
///
/// # CSV Format
///
/// Input columns: `type, account, amount, notes`
/// - `type`: `open`, `replenish`, `withdraw`, or `balance`
/// - `account`: Account identifier (unused for `replenish`)
/// - `amount`: Opening balance for `open`, requested amount for `withdraw`
/// - `notes`: Space-separated face values for `replenish`
///
/// Output columns: `type, account, status, detail`
///
/// # Example
///
/// ```csv
/// type,account,amount,notes
/// open,01001,150.00,
/// replenish,,,50 50 20 20 10 10 10 10 5 5 5 5
/// withdraw,01001,100,
/// balance,01001,,
/// ```
///
/// # Errors
///
/// Returns a CSV error if writing the report fails.
fn run_script<R: Read, W: Write>(engine: &Engine, reader: R, writer: W) -> Result<(), csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);
    let mut wtr = Writer::from_writer(writer);

    for (row_idx, result) in rdr.deserialize::<CsvRecord>().enumerate() {
        // 1-indexed, accounting for header row
        let row = row_idx + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Row {}: skipping malformed row: {}", row, e);
                continue;
            }
        };
        let Some(command) = record.into_command() else {
            warn!("Row {}: skipping invalid command", row);
            continue;
        };

        wtr.serialize(execute(engine, command))?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use atm_cash::Ledger;
    use rust_decimal_macros::dec;
    use std::io::Cursor;

    const HEADER: &str = "type,account,amount,notes\n";

    fn run(engine: &Engine, body: &str) -> Vec<String> {
        let input = format!("{HEADER}{body}");
        let mut output = Vec::new();
        run_script(engine, Cursor::new(input), &mut output).unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn open_seeds_account() {
        let engine = Engine::default();
        let lines = run(&engine, "open,01001,2738.59,\n");

        assert_eq!(lines[0], "type,account,status,detail");
        assert_eq!(lines[1], "open,01001,ok,\"2,738.59\"");
        assert_eq!(engine.ledger().balance(&"01001".into()), Some(dec!(2738.59)));
    }

    #[test]
    fn replenish_parses_note_list() {
        let engine = Engine::default();
        let lines = run(&engine, "replenish,,,50 20 twenty 5\n");

        assert_eq!(
            lines[1],
            "replenish,,ok,fifty=1 twenty=2 ten=0 five=1 total=95"
        );
    }

    #[test]
    fn full_withdrawal_session() {
        let engine = Engine::default();
        let lines = run(
            &engine,
            "open,01001,150,\n\
             replenish,,,50 50 20 20 10 10 10 10 5 5 5 5\n\
             withdraw,01001,100,\n\
             balance,01001,,\n",
        );

        assert_eq!(lines[3], "withdraw,01001,ok,50x1 20x2 5x2");
        assert_eq!(lines[4], "balance,01001,ok,50.00");
    }

    #[test]
    fn declined_withdrawal_reports_reason() {
        let engine = Engine::default();
        let lines = run(
            &engine,
            "open,01001,150,\n\
             replenish,,,50 50 20 20\n\
             withdraw,01001,15,\n",
        );

        assert_eq!(lines[3], "withdraw,01001,declined,amount 15 not in 20-250 range");
    }

    #[test]
    fn unknown_account_balance_is_not_found() {
        let engine = Engine::default();
        let lines = run(&engine, "balance,123456,,\n");
        assert_eq!(lines[1], "balance,123456,not_found,NOT_FOUND");
    }

    #[test]
    fn skip_invalid_rows() {
        let engine = Engine::default();
        let lines = run(
            &engine,
            "open,01001,100,\n\
             transfer,01001,10,\n\
             replenish,,,50 15\n\
             withdraw,,100,\n\
             open,01002,abc,\n\
             balance,01001,,\n",
        );

        // header + open + balance
        assert_eq!(lines.len(), 3);
        assert!(engine.inventory().is_none());
    }

    #[test]
    fn command_parsing_handles_whitespace() {
        let engine = Engine::default();
        let lines = run(&engine, " open , 01001 , 23 , \n");
        assert_eq!(lines[1], "open,01001,ok,23.00");
    }

    #[test]
    fn args_map_onto_config() {
        let args = Args::parse_from([
            "atm-cash",
            "script.csv",
            "--max-amount",
            "500",
            "--strict-five-stock",
            "--compensate",
        ]);
        let config = args.config();

        assert_eq!(config.min_amount, 20);
        assert_eq!(config.max_amount, 500);
        assert!(config.selection.strict_five_stock);
        assert!(!config.commit_dispensed_notes);
        assert!(config.compensate_failed_dispense);
    }
}
