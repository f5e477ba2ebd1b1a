//! 医院记录系统主程序

mod menu;

use anyhow::Result;
use clap::Parser;
use hospital_admin::{init_logging, ConfigManager};
use hospital_records::HospitalSystem;
use menu::Menu;
use tokio::io::BufReader;
use tracing::{error, info};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "hospital-records")]
#[command(about = "Console record keeper for patients, doctors, appointments and medical records")]
struct Args {
    /// 配置文件路径 (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// 数据目录，覆盖配置中的 storage.data_dir
    #[arg(short, long)]
    data_dir: Option<String>,

    /// 日志级别，覆盖配置中的 logging.level
    #[arg(short, long)]
    log_level: Option<String>,

    /// 把生效的配置写入该文件后退出
    #[arg(long)]
    write_config: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config_manager = ConfigManager::new(args.config.as_deref())?;
    config_manager.apply_overrides(args.data_dir.as_deref(), args.log_level.as_deref())?;

    // 初始化日志
    init_logging(&config_manager.config().logging)?;
    match config_manager.config_path() {
        Some(path) => info!("Configuration loaded from: {}", path),
        None => info!("Configuration loaded from defaults and environment"),
    }

    if let Some(path) = &args.write_config {
        config_manager.save_config(path).await?;
        println!("Configuration written to {}", path);
        return Ok(());
    }

    let storage_config = &config_manager.config().storage;
    info!("Using data directory {}", storage_config.data_dir);

    let mut system = HospitalSystem::open(
        storage_config.file_storage(),
        storage_config.collection_files(),
    )
    .await;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut menu = Menu::new(&mut system, stdin, tokio::io::stdout());
    if let Err(e) = menu.run().await {
        error!("Terminal I/O failed: {}", e);
        return Err(e.into());
    }

    Ok(())
}
