use super::ui;
use crate::MarketKit;
use crate::core::CoinPrice;
use anyhow::Result;
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Table};
use std::collections::HashMap;
use tracing::debug;

const TAG: &str = "cli";

/// Prints spot prices for `coin_uids`, then keeps polling until `updates`
/// batches have been shown.
pub async fn run(
    kit: &MarketKit,
    coin_uids: &[String],
    currency: &str,
    updates: usize,
) -> Result<()> {
    if coin_uids.is_empty() {
        anyhow::bail!("At least one coin uid is required");
    }

    let mut subscription = kit.coin_price_map_subscription(TAG, coin_uids, currency);
    let pb = ui::new_spinner("Waiting for prices");

    for shown in 0..updates.max(1) {
        let Some(prices) = subscription.recv().await else {
            break;
        };
        pb.suspend(|| {
            if shown > 0 {
                println!();
            }
            println!("{}", prices_table(coin_uids, &prices));
        });
        debug!(batch = shown + 1, count = prices.len(), "Displayed price batch");
    }
    pb.finish_and_clear();

    let missing: Vec<_> = coin_uids
        .iter()
        .filter(|uid| kit.coin_price(uid, currency).is_none())
        .cloned()
        .collect();
    if !missing.is_empty() {
        println!(
            "{}",
            ui::style_text(
                &format!("No price available for: {}", missing.join(", ")),
                ui::StyleType::Subtle
            )
        );
    }
    Ok(())
}

fn prices_table(coin_uids: &[String], prices: &HashMap<String, CoinPrice>) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Coin"),
        ui::header_cell("Price"),
        ui::header_cell("24h"),
        ui::header_cell("Updated"),
    ]);

    for uid in coin_uids {
        let Some(price) = prices.get(uid) else {
            continue;
        };
        table.add_row(vec![
            Cell::new(uid),
            Cell::new(format!(
                "{} {}",
                ui::format_amount(price.value),
                price.currency_code
            )),
            price
                .diff_24h
                .map(ui::change_cell)
                .unwrap_or_else(|| ui::format_optional_cell(None::<String>, |s| s)),
            Cell::new(
                DateTime::<Utc>::from_timestamp(price.timestamp, 0)
                    .map(|dt| dt.format("%H:%M:%S").to_string())
                    .unwrap_or_default(),
            ),
        ]);
    }
    table
}
