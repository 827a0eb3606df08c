use crate::commands::CommandResult;
use tiendita_core::config::{AppConfig, LoadOptions};
use tiendita_db::{connect_with_settings, fixtures, migrations};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let summary = fixtures::seed_demo(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 6u8))?;

        pool.close().await;
        Ok::<fixtures::SeedSummary, (&'static str, String, u8)>(summary)
    });

    match result {
        Ok(summary) => {
            let message = if summary.tenants_inserted == 0 {
                format!(
                    "demo tenant already linked to {} (owner {}), nothing to do",
                    fixtures::DEMO_CONTACT_ADDRESS,
                    summary.owner_id
                )
            } else {
                format!(
                    "linked {} as \"{}\" (owner {}) with {} demo products",
                    fixtures::DEMO_CONTACT_ADDRESS,
                    fixtures::DEMO_BUSINESS_NAME,
                    summary.owner_id,
                    summary.products_inserted
                )
            };
            CommandResult::success("seed", message)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
