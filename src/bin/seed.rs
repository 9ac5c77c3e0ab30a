use portfolio_backend::config::Config;
use portfolio_backend::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let pool = db::establish_connection(&config).await?;
    db::MIGRATOR.run(&pool).await?;

    match &config.bootstrap_admin {
        Some(admin) => {
            if db::ensure_admin(&pool, admin).await? {
                println!("Admin created: {}", admin.email);
            } else {
                println!("Admin already exists: {}", admin.email);
            }
        }
        None => println!("ADMIN_EMAIL / ADMIN_PASSWORD not set, skipping admin account."),
    }

    let inserted = db::seed_demo_requests(&pool).await?;
    println!("Inserted {} demo contact requests.", inserted);

    pool.close().await;
    Ok(())
}
