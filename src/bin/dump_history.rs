// Dump recent snapshots from the history file as JSON.
//
// Usage: cargo run --bin dump_history -- [PATH] [LIMIT]
//   PATH   default: ./data/snapshots.bin
//   LIMIT  default: 5

use bikeshare_history::history_repo::{HistoryStore, reader};
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let path = args
        .get(1)
        .map(String::as_str)
        .unwrap_or("./data/snapshots.bin");
    let limit: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(5);

    let store = HistoryStore::new(path);
    let loaded = store.load().await;
    eprintln!("{:?}: {} records", loaded.outcome, loaded.records.len());
    let recent = reader::tail_sorted(loaded.records, limit);

    println!("{}", serde_json::to_string_pretty(&recent)?);
    Ok(())
}
