use crate::history::SearchHistory;
use crate::models::{
    AccountSnapshot, BlockDetail, BlockPage, BlockSummary, NetworkOverview, TransactionPage,
    TransactionSummary,
};
use alloy_primitives::U256;
use alloy_primitives::utils::format_units;
use comfy_table::{Cell, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use csv::Writer;
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Table,
        }
    }
}

pub fn format_block_page(page: &BlockPage, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            if page.blocks.is_empty() {
                return format!(
                    "No blocks on page {} ({} blocks in total).",
                    page.page, page.total_blocks
                );
            }
            let mut out = blocks_table(&page.blocks).to_string();
            out.push_str(&format!(
                "\nPage {} of {} ({} blocks in total)",
                page.page,
                page.total_pages(),
                page.total_blocks
            ));
            push_dropped_note(&mut out, page.dropped);
            out
        }
        OutputFormat::Json => to_json(page),
        OutputFormat::Csv => blocks_csv(&page.blocks),
    }
}

pub fn format_transaction_page(page: &TransactionPage, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            if page.transactions.is_empty() {
                return format!(
                    "No transactions on page {} ({} found in the last {} blocks).",
                    page.page, page.total_count, page.scanned_blocks
                );
            }
            let mut out = transactions_table(&page.transactions).to_string();
            out.push_str(&format!(
                "\nPage {} of {} ({} transactions in the last {} blocks)",
                page.page,
                page.total_pages(),
                page.total_count,
                page.scanned_blocks
            ));
            push_dropped_note(&mut out, page.dropped);
            out
        }
        OutputFormat::Json => to_json(page),
        OutputFormat::Csv => transactions_csv(&page.transactions),
    }
}

pub fn format_block_detail(detail: &BlockDetail, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            let mut out = block_fields_table(&detail.block).to_string();
            if detail.transactions.is_empty() {
                out.push_str("\nThis block contains no transactions.");
            } else {
                out.push('\n');
                out.push_str(&transactions_table(&detail.transactions).to_string());
            }
            push_dropped_note(&mut out, detail.dropped);
            out
        }
        OutputFormat::Json => to_json(detail),
        OutputFormat::Csv => transactions_csv(&detail.transactions),
    }
}

pub fn format_transaction(tx: &TransactionSummary, format: &OutputFormat) -> String {
    let rows = vec![
        ("hash", tx.hash.clone()),
        ("status", status_label(tx.status).to_string()),
        ("block", tx.block_number.to_string()),
        (
            "timestamp",
            tx.timestamp.map_or("N/A".to_string(), |t| t.to_string()),
        ),
        ("from", tx.from.clone()),
        (
            "to",
            tx.to
                .clone()
                .unwrap_or_else(|| "(contract creation)".to_string()),
        ),
        ("value_eth", tx.value.clone()),
        ("gas_used", tx.gas_used.clone().unwrap_or_else(|| "N/A".to_string())),
        ("gas_price_gwei", wei_to_gwei(&tx.gas_price)),
    ];

    match format {
        OutputFormat::Table => key_value_table(&rows),
        OutputFormat::Json => to_json(tx),
        OutputFormat::Csv => key_value_csv(&rows),
    }
}

pub fn format_account(snapshot: &AccountSnapshot, format: &OutputFormat) -> String {
    let activity = snapshot.activity();
    let rows = vec![
        ("address", snapshot.address.clone()),
        ("balance_eth", snapshot.balance.clone()),
        ("balance_wei", snapshot.balance_wei.clone()),
        ("nonce", snapshot.transaction_count.to_string()),
        ("activity", activity.label().to_string()),
    ];

    match format {
        OutputFormat::Table => key_value_table(&rows),
        OutputFormat::Json => to_json(&account_json(snapshot)),
        OutputFormat::Csv => key_value_csv(&rows),
    }
}

/// Renders the accounts looked up in one session together with the
/// resulting search history as a single document.
pub fn format_account_session(
    snapshots: &[AccountSnapshot],
    history: &SearchHistory,
    format: &OutputFormat,
) -> String {
    match format {
        OutputFormat::Table => snapshots
            .iter()
            .map(|snapshot| format_account(snapshot, format))
            .chain(std::iter::once(format_history(history, format)))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => to_json(&json!({
            "accounts": snapshots.iter().map(account_json).collect::<Vec<_>>(),
            "history": history,
        })),
        OutputFormat::Csv => {
            let mut wtr = Writer::from_writer(vec![]);
            let _ = wtr.write_record([
                "address",
                "balance_eth",
                "balance_wei",
                "nonce",
                "activity",
                "history_rank",
            ]);
            for snapshot in snapshots {
                let rank = history
                    .list()
                    .iter()
                    .position(|address| *address == snapshot.address)
                    .map(|i| (i + 1).to_string())
                    .unwrap_or_default();
                let _ = wtr.write_record([
                    snapshot.address.clone(),
                    snapshot.balance.clone(),
                    snapshot.balance_wei.clone(),
                    snapshot.transaction_count.to_string(),
                    snapshot.activity().label().to_string(),
                    rank,
                ]);
            }
            String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
        }
    }
}

fn account_json(snapshot: &AccountSnapshot) -> serde_json::Value {
    json!({
        "address": snapshot.address,
        "balance": snapshot.balance,
        "balance_wei": snapshot.balance_wei,
        "transaction_count": snapshot.transaction_count,
        "activity": snapshot.activity(),
    })
}

pub fn format_history(history: &SearchHistory, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            if history.is_empty() {
                return "No successful searches in this session.".to_string();
            }
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec!["#", "Recent Searches"]);
            for (i, address) in history.list().iter().enumerate() {
                table.add_row(vec![Cell::new(i + 1), Cell::new(address)]);
            }
            table.to_string()
        }
        OutputFormat::Json => to_json(history),
        OutputFormat::Csv => {
            let mut wtr = Writer::from_writer(vec![]);
            let _ = wtr.write_record(["rank", "address"]);
            for (i, address) in history.list().iter().enumerate() {
                let _ = wtr.write_record([&(i + 1).to_string(), address]);
            }
            String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
        }
    }
}

pub fn format_overview(overview: &NetworkOverview, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            let rows = vec![
                ("chain_id", overview.chain_id.to_string()),
                ("block_height", overview.latest_block.number.to_string()),
                ("gas_price_gwei", wei_to_gwei(&overview.gas_price)),
                (
                    "latest_block_txs",
                    overview.latest_block.transaction_count.to_string(),
                ),
                ("latest_block_hash", overview.latest_block.hash.clone()),
            ];
            format!(
                "{}\n{}",
                key_value_table(&rows),
                blocks_table(&overview.recent_blocks)
            )
        }
        OutputFormat::Json => to_json(overview),
        OutputFormat::Csv => blocks_csv(&overview.recent_blocks),
    }
}

fn blocks_table(blocks: &[BlockSummary]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            "Block", "Hash", "Timestamp", "Txs", "Gas Used", "Gas Limit", "Miner",
        ]);

    for block in blocks {
        table.add_row(vec![
            Cell::new(block.number),
            Cell::new(shorten(&block.hash, 10, 8)),
            Cell::new(block.timestamp),
            Cell::new(block.transaction_count),
            Cell::new(&block.gas_used),
            Cell::new(&block.gas_limit),
            Cell::new(shorten(&block.miner, 8, 6)),
        ]);
    }

    table
}

fn block_fields_table(block: &BlockSummary) -> String {
    key_value_table(&[
        ("number", block.number.to_string()),
        ("hash", block.hash.clone()),
        ("parent_hash", block.parent_hash.clone()),
        ("timestamp", block.timestamp.to_string()),
        ("transactions", block.transaction_count.to_string()),
        ("gas_used", block.gas_used.clone()),
        ("gas_limit", block.gas_limit.clone()),
        ("miner", block.miner.clone()),
    ])
}

fn blocks_csv(blocks: &[BlockSummary]) -> String {
    let mut wtr = Writer::from_writer(vec![]);

    let _ = wtr.write_record([
        "number",
        "hash",
        "parent_hash",
        "timestamp",
        "transaction_count",
        "gas_used",
        "gas_limit",
        "miner",
    ]);

    for block in blocks {
        let _ = wtr.write_record([
            &block.number.to_string(),
            &block.hash,
            &block.parent_hash,
            &block.timestamp.to_string(),
            &block.transaction_count.to_string(),
            &block.gas_used,
            &block.gas_limit,
            &block.miner,
        ]);
    }

    String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
}

fn transactions_table(transactions: &[TransactionSummary]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            "Tx Hash", "Block", "From", "To", "Value (ETH)", "Gas Used", "Status",
        ]);

    for tx in transactions {
        let to = match &tx.to {
            Some(to) => shorten(to, 8, 6),
            None => "contract creation".to_string(),
        };
        table.add_row(vec![
            Cell::new(shorten(&tx.hash, 10, 8)),
            Cell::new(tx.block_number),
            Cell::new(shorten(&tx.from, 8, 6)),
            Cell::new(to),
            Cell::new(&tx.value),
            Cell::new(tx.gas_used.as_deref().unwrap_or("-")),
            Cell::new(status_label(tx.status)),
        ]);
    }

    table
}

fn transactions_csv(transactions: &[TransactionSummary]) -> String {
    let mut wtr = Writer::from_writer(vec![]);

    let _ = wtr.write_record([
        "hash",
        "block_number",
        "timestamp",
        "from",
        "to",
        "value_eth",
        "gas_used",
        "gas_price_wei",
        "status",
    ]);

    for tx in transactions {
        let record = vec![
            tx.hash.clone(),
            tx.block_number.to_string(),
            tx.timestamp.map(|t| t.to_string()).unwrap_or_default(),
            tx.from.clone(),
            tx.to.clone().unwrap_or_default(),
            tx.value.clone(),
            tx.gas_used.clone().unwrap_or_default(),
            tx.gas_price.clone(),
            tx.status.map(|s| s.to_string()).unwrap_or_default(),
        ];
        let _ = wtr.write_record(&record);
    }

    String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
}

fn key_value_table(rows: &[(&str, String)]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Field", "Value"]);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    table.to_string()
}

fn key_value_csv(rows: &[(&str, String)]) -> String {
    let mut wtr = Writer::from_writer(vec![]);
    let _ = wtr.write_record(["field", "value"]);
    for (key, value) in rows {
        let _ = wtr.write_record([*key, value.as_str()]);
    }
    String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn push_dropped_note(out: &mut String, dropped: usize) {
    if dropped > 0 {
        out.push_str(&format!(
            "\n{dropped} lookup(s) failed or returned nothing and were skipped."
        ));
    }
}

fn status_label(status: Option<u8>) -> &'static str {
    match status {
        Some(1) => "success",
        Some(_) => "failed",
        None => "pending",
    }
}

fn wei_to_gwei(wei: &str) -> String {
    match wei.parse::<U256>() {
        Ok(value) => format_units(value, 9).unwrap_or_else(|_| wei.to_string()),
        Err(_) => wei.to_string(),
    }
}

fn shorten(value: &str, head: usize, tail: usize) -> String {
    if value.len() <= head + tail + 3 {
        return value.to_string();
    }
    format!("{}...{}", &value[..head], &value[value.len() - tail..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(number: u64) -> BlockSummary {
        BlockSummary {
            number,
            hash: format!("0x{:064x}", number + 1),
            parent_hash: format!("0x{:064x}", number),
            timestamp: 1_700_000_000 + number * 12,
            transaction_count: 0,
            gas_used: "0".to_string(),
            gas_limit: "30000000".to_string(),
            miner: format!("0x{:040x}", 1),
        }
    }

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("0x1234", 10, 8), "0x1234");
        assert_eq!(
            shorten(&format!("0x{:064x}", 255), 10, 8),
            "0x00000000...000000ff"
        );
    }

    #[test]
    fn test_wei_to_gwei() {
        assert_eq!(wei_to_gwei("1875000000"), "1.875000000");
        assert_eq!(wei_to_gwei("garbage"), "garbage");
    }

    #[test]
    fn test_empty_block_page_message() {
        let page = BlockPage {
            blocks: Vec::new(),
            page: 2,
            page_size: 20,
            total_blocks: 11,
            dropped: 0,
        };
        assert_eq!(
            format_block_page(&page, &OutputFormat::Table),
            "No blocks on page 2 (11 blocks in total)."
        );
    }

    #[test]
    fn test_block_page_csv() {
        let page = BlockPage {
            blocks: vec![block(1), block(0)],
            page: 1,
            page_size: 20,
            total_blocks: 2,
            dropped: 0,
        };
        let csv = format_block_page(&page, &OutputFormat::Csv);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("number,hash"));
        assert!(lines[1].starts_with("1,0x"));
    }

    #[test]
    fn test_account_json_includes_activity() {
        let snapshot = AccountSnapshot {
            address: format!("0x{:040x}", 7),
            balance: "0.0".to_string(),
            balance_wei: "0".to_string(),
            transaction_count: 0,
        };
        let value: serde_json::Value =
            serde_json::from_str(&format_account(&snapshot, &OutputFormat::Json)).unwrap();
        assert_eq!(value["activity"], "unused");
        assert_eq!(value["transaction_count"], 0);
    }

    fn snapshot(last_byte: u64, nonce: u64) -> AccountSnapshot {
        AccountSnapshot {
            address: format!("0x{:040x}", last_byte),
            balance: "1.0".to_string(),
            balance_wei: "1000000000000000000".to_string(),
            transaction_count: nonce,
        }
    }

    #[test]
    fn test_account_session_json_is_one_document() {
        let accounts = vec![snapshot(1, 3), snapshot(2, 0)];
        let mut history = SearchHistory::new();
        history.record(&accounts[0].address);
        history.record(&accounts[1].address);

        let value: serde_json::Value = serde_json::from_str(&format_account_session(
            &accounts,
            &history,
            &OutputFormat::Json,
        ))
        .unwrap();
        assert_eq!(value["accounts"].as_array().unwrap().len(), 2);
        assert_eq!(value["accounts"][0]["activity"], "active");
        assert_eq!(value["accounts"][1]["activity"], "receive_only");
        assert_eq!(value["history"][0], accounts[1].address);
        assert_eq!(value["history"][1], accounts[0].address);
    }

    #[test]
    fn test_account_session_csv_has_single_header() {
        let accounts = vec![snapshot(1, 3), snapshot(2, 0)];
        let mut history = SearchHistory::new();
        history.record(&accounts[0].address);

        let csv = format_account_session(&accounts, &history, &OutputFormat::Csv);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("address,"));
        assert!(lines[0].ends_with(",history_rank"));
        assert!(lines[1].ends_with(",active,1"));
        assert!(lines[2].ends_with(",new / receive-only,"));
    }

    #[test]
    fn test_status_label() {
        assert_eq!(status_label(Some(1)), "success");
        assert_eq!(status_label(Some(0)), "failed");
        assert_eq!(status_label(None), "pending");
    }
}
