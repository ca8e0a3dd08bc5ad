use clap::Parser;
use market_merge::utils::{logger, validation::Validate};
use market_merge::{CliConfig, EtlEngine, LocalStorage, MergePipeline, MergeSchema, TomlConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting market-merge");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 有指定 TOML 設定檔時，用它覆蓋路徑並載入自訂映射
    let mut schema = MergeSchema::default();
    if let Some(config_path) = config.config.clone() {
        let toml_config = match TomlConfig::from_file(&config_path) {
            Ok(toml_config) => toml_config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", config_path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        };

        if let Err(e) = toml_config.validate() {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }

        schema = match toml_config.merge_schema() {
            Ok(schema) => schema,
            Err(e) => {
                eprintln!("❌ {}", e.user_friendly_message());
                eprintln!("💡 {}", e.recovery_suggestion());
                std::process::exit(1);
            }
        };

        config.source_a = toml_config.source_a.path.clone();
        config.source_b = toml_config.source_b.path.clone();
        config.output = toml_config.load.output_path.clone();
        if toml_config.monitoring_enabled() {
            config.monitor = true;
        }

        tracing::info!("✅ Configuration loaded from: {}", config_path);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 創建存儲和管線
    let storage = LocalStorage::new();
    let pipeline = MergePipeline::with_schema(storage, config, schema);

    // 創建 ETL 引擎並運行
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Merge completed successfully!");
            println!("✅ Merge completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Merge failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                market_merge::utils::error::ErrorSeverity::Low => 0,
                market_merge::utils::error::ErrorSeverity::Medium => 2,
                market_merge::utils::error::ErrorSeverity::High => 1,
                market_merge::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
