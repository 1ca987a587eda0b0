use rotate_a_job::{init_logger, ui::main_menu, Bot, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger(log::LevelFilter::Info);

    let config = Config::load_or_default("data/config.ron")?;
    let mut bot = Bot::new(config)?;
    bot.init().await?;
    bot.authenticate().await?;

    // Blocks until the operator exits the menu.
    main_menu(bot).await
}
