use env_logger::Env;
use migration::Migrator;
use sea_orm_migration::prelude::*;

#[async_std::main]
async fn main() {
    // DATABASE_URL 由 sea-orm-migration 的 cli 读取
    env_logger::init_from_env(Env::default().default_filter_or("sea_orm_migration=info,info"));
    log::info!("cadence schema: {} migrations", Migrator::migrations().len());
    cli::run_cli(Migrator).await;
}
