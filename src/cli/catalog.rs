use super::ui;
use crate::MarketKit;
use crate::core::{FullCoin, SyncInfo, TokenType};
use crate::syncers::SyncOutcome;
use anyhow::Result;
use comfy_table::{Cell, Table};

pub async fn sync(kit: &MarketKit) -> Result<()> {
    let pb = ui::new_spinner("Syncing catalog");
    let outcome = kit.sync_now().await;
    pb.finish_and_clear();

    let message = match outcome {
        SyncOutcome::Updated => ui::style_text("Catalog updated", ui::StyleType::Success),
        SyncOutcome::UpToDate => ui::style_text("Catalog up to date", ui::StyleType::Subtle),
        SyncOutcome::Failed => ui::style_text("Catalog sync failed", ui::StyleType::Error),
    };
    println!("{message}");

    if outcome == SyncOutcome::Failed {
        anyhow::bail!("Catalog sync failed");
    }
    sync_info(kit)
}

pub fn sync_info(kit: &MarketKit) -> Result<()> {
    let info = kit.sync_info()?;
    println!("{}", sync_info_table(&info));
    Ok(())
}

fn sync_info_table(info: &SyncInfo) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Entity"), ui::header_cell("Last Sync Stamp")]);

    for (label, stamp) in [
        ("Coins", &info.coins_timestamp),
        ("Blockchains", &info.blockchains_timestamp),
        ("Tokens", &info.tokens_timestamp),
    ] {
        table.add_row(vec![
            Cell::new(label),
            ui::format_optional_cell(stamp.as_deref(), str::to_string),
        ]);
    }
    table
}

pub fn coins(kit: &MarketKit, filter: &str, limit: usize) -> Result<()> {
    let coins = kit.full_coins(filter, limit)?;
    if coins.is_empty() {
        println!("No coins match '{filter}'. Run `marketkit sync` first if the catalog is empty.");
        return Ok(());
    }

    println!("{}", coins_table(&coins));
    Ok(())
}

fn coins_table(coins: &[FullCoin]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Rank"),
        ui::header_cell("Code"),
        ui::header_cell("Name"),
        ui::header_cell("Uid"),
        ui::header_cell("Tokens"),
    ]);

    for full in coins {
        let tokens = full
            .tokens
            .iter()
            .map(|token| format!("{} ({})", token.blockchain.name, describe(&token.token_type)))
            .collect::<Vec<_>>()
            .join("\n");

        table.add_row(vec![
            ui::format_optional_cell(full.coin.market_cap_rank, |rank| rank.to_string()),
            Cell::new(&full.coin.code),
            Cell::new(&full.coin.name),
            Cell::new(ui::style_text(&full.coin.uid, ui::StyleType::Subtle)),
            Cell::new(tokens),
        ]);
    }
    table
}

fn describe(token_type: &TokenType) -> String {
    match token_type {
        TokenType::Native => "native".to_string(),
        TokenType::Eip20(address) => format!("eip20 {address}"),
        TokenType::Spl(address) => format!("spl {address}"),
        TokenType::Jetton(address) => format!("jetton {address}"),
        TokenType::Derived(derivation) => derivation.name().to_string(),
        TokenType::AddressTyped(address_type) => address_type.name().to_string(),
        TokenType::Unsupported { kind, reference } if reference.is_empty() => kind.clone(),
        TokenType::Unsupported { kind, reference } => format!("{kind} {reference}"),
    }
}
