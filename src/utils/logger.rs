//! 日志模块：基于 env_logger 0.11，控制台彩色输出 + 文件落盘 + 启动时按大小轮转
use env_logger::fmt::Formatter;
use env_logger::{Builder, Target, WriteStyle};
use log::{Level, LevelFilter, Record};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_DIR: &str = "LOG_DIR";
const DEFAULT_LOG_DIR: &str = "logs";
const LOG_LEVEL: &str = "LOG_LEVEL";
const DEFAULT_LOG_LEVEL: &str = "INFO";
const LOG_FILE_NAME: &str = "swap-bridge.log";
const LOG_MAX_SIZE_MB: u64 = 10;
const LOG_MAX_ROTATIONS: usize = 5;

/// 依赖库里比较吵的模块统一压到 WARN
const NOISY_MODULES: [&str; 4] = ["ethers_providers", "reqwest", "hyper", "notify"];

/// tracing 只用于应用边界（启动、运行循环）的结构化事件
const TRACE_FILTER: &str = "TRACE_FILTER";
const TRACE_JSON: &str = "TRACE_JSON";

static INIT_LOGGER: Once = Once::new();
static FILE_WRITER: Mutex<Option<File>> = Mutex::new(None);

pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        let log_dir = std::env::var(LOG_DIR).unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string());
        let log_level = std::env::var(LOG_LEVEL)
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_uppercase();
        let level_filter = parse_level(&log_level);

        let log_file_path = Path::new(&log_dir).join(LOG_FILE_NAME);
        let file_enabled = match prepare_log_file(&log_dir, &log_file_path) {
            Ok(()) => true,
            Err(e) => {
                eprintln!("❌ 日志文件初始化失败: {}", e);
                false
            }
        };

        let mut builder = Builder::from_default_env();
        builder.filter(None, level_filter);
        for module in NOISY_MODULES {
            builder.filter(Some(module), LevelFilter::Warn);
        }
        builder
            .write_style(WriteStyle::Always)
            .format(move |f: &mut Formatter, record: &Record| {
                let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S.%3f");
                let module = record.module_path().unwrap_or("unknown");

                if file_enabled {
                    write_to_file(&format!(
                        "[{}] [{}] [{}] - {}\n",
                        now,
                        record.level(),
                        module,
                        record.args()
                    ));
                }

                writeln!(
                    f,
                    "[{}] [{}{:>5}\x1b[0m] [\x1b[31m{}\x1b[0m] - {}",
                    now,
                    level_color(record.level()),
                    record.level(),
                    module,
                    record.args()
                )
            })
            .target(Target::Stdout);

        match builder.try_init() {
            Ok(()) => log::info!(
                "✅ 日志系统初始化完成 | 级别: {} | 日志文件: {}",
                log_level,
                log_file_path.display()
            ),
            Err(e) => eprintln!("❌ 日志初始化失败: {}", e),
        }
    });
}

/// 不经过 `try_init`，避免 LogTracer 与 env_logger 抢占 `log` 全局 logger
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(TRACE_FILTER).unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(TRACE_JSON).is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        tracing::subscriber::set_global_default(registry.with(fmt::layer().json().with_target(true)))
    } else {
        tracing::subscriber::set_global_default(registry.with(fmt::layer().with_target(true)))
    };
    if let Err(e) = result {
        eprintln!("❌ tracing 初始化失败: {}", e);
    }
}

fn parse_level(level: &str) -> LevelFilter {
    match level {
        "TRACE" => LevelFilter::Trace,
        "DEBUG" => LevelFilter::Debug,
        "INFO" => LevelFilter::Info,
        "WARN" => LevelFilter::Warn,
        "ERROR" => LevelFilter::Error,
        _ => {
            eprintln!("⚠️ 无效日志级别「{}」，使用默认 INFO", level);
            LevelFilter::Info
        }
    }
}

fn level_color(level: Level) -> &'static str {
    match level {
        Level::Error => "\x1b[91m",
        Level::Warn => "\x1b[93m",
        Level::Info => "\x1b[92m",
        Level::Debug => "\x1b[96m",
        Level::Trace => "\x1b[95m",
    }
}

fn prepare_log_file(log_dir: &str, path: &PathBuf) -> io::Result<()> {
    fs::create_dir_all(log_dir)?;
    if let Err(e) = rotate_logs(log_dir, path) {
        eprintln!("⚠️ 日志轮转失败: {}", e);
    }
    let file = File::options().create(true).append(true).open(path)?;
    if let Ok(mut guard) = FILE_WRITER.lock() {
        *guard = Some(file);
    }
    Ok(())
}

// 文件写入失败不影响控制台输出
fn write_to_file(line: &str) {
    if let Ok(mut guard) = FILE_WRITER.lock() {
        if let Some(file) = guard.as_mut() {
            let _ = file.write_all(line.as_bytes());
        }
    }
}

fn rotate_logs(log_dir: &str, log_path: &Path) -> io::Result<()> {
    if !log_path.exists() {
        return Ok(());
    }
    let file_size_mb = fs::metadata(log_path)?.len() / (1024 * 1024);
    if file_size_mb < LOG_MAX_SIZE_MB {
        return Ok(());
    }

    for i in (1..LOG_MAX_ROTATIONS).rev() {
        let src = Path::new(log_dir).join(format!("{}.{}", LOG_FILE_NAME, i));
        let dest = Path::new(log_dir).join(format!("{}.{}", LOG_FILE_NAME, i + 1));
        if src.exists() {
            fs::rename(&src, &dest)?;
        }
    }
    fs::rename(log_path, Path::new(log_dir).join(format!("{}.1", LOG_FILE_NAME)))
}

#[macro_export]
macro_rules! log_trace { ($($arg:tt)*) => { log::trace!($($arg)*) }; }
#[macro_export]
macro_rules! log_debug { ($($arg:tt)*) => { log::debug!($($arg)*) }; }
#[macro_export]
macro_rules! log_info  { ($($arg:tt)*) => { log::info!($($arg)*) }; }
#[macro_export]
macro_rules! log_warn  { ($($arg:tt)*) => { log::warn!($($arg)*) }; }
#[macro_export]
macro_rules! log_error { ($($arg:tt)*) => { log::error!($($arg)*) }; }
