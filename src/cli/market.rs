use super::ui;
use crate::MarketKit;
use crate::core::{GlobalMarketPoint, MarketError, TimePeriod};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Table};

pub async fn global_market(kit: &MarketKit, currency: &str, period: TimePeriod) -> Result<()> {
    let pb = ui::new_spinner("Fetching global market data");
    let points = kit.global_market_points(currency, period).await;
    pb.finish_and_clear();

    let points = points
        .with_context(|| format!("Failed to load global market data for {currency}/{period}"))?;

    println!(
        "\nGlobal market: {}",
        ui::style_text(&format!("{currency} / {period}"), ui::StyleType::Title)
    );
    if points.is_empty() {
        println!("No data points returned.");
        return Ok(());
    }
    println!("{}", points_table(&points));
    Ok(())
}

fn points_table(points: &[GlobalMarketPoint]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Market Cap"),
        ui::header_cell("Volume 24h"),
        ui::header_cell("DeFi Cap"),
        ui::header_cell("TVL"),
        ui::header_cell("BTC Dominance"),
    ]);

    for point in points {
        table.add_row(vec![
            Cell::new(format_timestamp(point.timestamp)),
            ui::amount_cell(point.market_cap),
            ui::amount_cell(point.volume_24h),
            ui::format_optional_cell(point.defi_market_cap, ui::format_amount),
            ui::format_optional_cell(point.tvl, ui::format_amount),
            ui::format_optional_cell(point.btc_dominance, |d| format!("{}%", d.round_dp(2))),
        ]);
    }
    table
}

pub async fn historical_price(
    kit: &MarketKit,
    coin_uid: &str,
    currency: &str,
    timestamp: i64,
) -> Result<()> {
    let pb = ui::new_spinner("Fetching historical price");
    let price = kit
        .coin_historical_price_single(coin_uid, currency, timestamp)
        .await;
    pb.finish_and_clear();

    match price {
        Ok(value) => {
            println!(
                "{} {} at {}: {}",
                ui::style_text(coin_uid, ui::StyleType::Label),
                currency,
                format_timestamp(timestamp),
                ui::style_text(&ui::format_amount(value), ui::StyleType::Success)
            );
            Ok(())
        }
        Err(e @ MarketError::InaccurateTimestamp { .. }) => {
            println!(
                "{}",
                ui::style_text("No price close enough to that moment", ui::StyleType::Error)
            );
            Err(e.into())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load historical price of {coin_uid}")),
    }
}

fn format_timestamp(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}
