use anyhow::Result;
use dialoguer::Select;

use crate::Bot;

/// The operator-facing menu. Blocks until "Exit", which tears down the
/// browser and the HTTP session.
pub async fn main_menu(mut bot: Bot) -> Result<()> {
    loop {
        clear_screen();
        if !bot.account_name.is_empty() {
            println!("Active account: {}\n", bot.account_name);
        }

        let items = vec![
            "Run full rotation across all accounts",
            "Select account",
            "Fetch open jobs",
            "Rotate (close + clone) jobs",
            "Exit",
        ];
        let selection = Select::new()
            .with_prompt("rotate_a_job")
            .items(&items)
            .default(0)
            .interact()?;

        match selection {
            0 => {
                if let Err(err) = bot.run_all().await {
                    println!("Full rotation failed: {err:#}");
                }
            }
            1 => select_account(&mut bot).await?,
            2 => fetch_jobs(&mut bot).await,
            3 => {
                if bot.clone_candidates.is_empty() {
                    println!("No clone candidates; fetch jobs first.");
                } else if let Err(err) = bot.rotate_jobs().await {
                    println!("Rotation failed: {err:#}");
                }
            }
            4 => break,
            _ => {}
        }

        pause();
    }
    bot.quit().await
}

/// Selection is keyboard-driven, so an out-of-range pick is impossible;
/// the empty-account-list case is the one left to report.
async fn select_account(bot: &mut Bot) -> Result<()> {
    if bot.accounts.is_empty() {
        println!("There were no sub-accounts found!");
        return Ok(());
    }

    let names = bot
        .accounts
        .iter()
        .map(|account| account.name.as_str())
        .collect::<Vec<_>>();
    let index = Select::new()
        .with_prompt("Pick a sub-account (avoid closed accounts)")
        .items(&names)
        .default(0)
        .interact()?;

    if let Err(err) = bot.select_account(index).await {
        println!("Could not enter account: {err:#}");
    }
    Ok(())
}

async fn fetch_jobs(bot: &mut Bot) {
    if let Err(err) = bot.fetch_open_jobs().await {
        println!("Fetching open jobs failed: {err:#}");
        return;
    }
    bot.list_jobs();
    if let Err(err) = bot.enrich_jobs().await {
        println!("Enriching jobs failed: {err:#}");
    }
}

fn clear_screen() {
    print!("\x1b[2J\x1b[1;1H");
}

fn pause() {
    println!();
    let _ = dialoguer::Input::<String>::new()
        .with_prompt("Press Enter to continue")
        .allow_empty(true)
        .interact_text();
}
