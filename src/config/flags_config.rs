use crate::errors::error::AppError;
use crate::models::BridgeFeatureFlags;
use crate::{log_error, log_info};
use arc_swap::ArcSwap;
use notify::{Config as NotifyConfig, RecursiveMode, Watcher};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct FlagsFile {
    #[serde(default)]
    extension_support: bool,
    #[serde(default)]
    src_network_allowlist: Vec<u64>,
    #[serde(default)]
    dest_network_allowlist: Vec<u64>,
}

/// 本地文件版本的桥接开关，修改文件后无锁替换
pub struct FeatureFlagContainer {
    path: PathBuf,
    current: ArcSwap<BridgeFeatureFlags>,
}

impl FeatureFlagContainer {
    pub fn new(path: impl Into<PathBuf>) -> Result<Arc<Self>, AppError> {
        let path = path.into();
        let initial = load_flags(&path)?;
        Ok(Arc::new(Self {
            path,
            current: ArcSwap::from_pointee(initial),
        }))
    }

    /// 启动后台监听线程
    pub fn spawn_watcher(self: &Arc<Self>) {
        let container = Arc::clone(self);
        std::thread::spawn(move || {
            if let Err(e) = container.watch() {
                log_error!("桥接开关文件监听失败: {}", e);
            }
        });
    }

    pub fn load(&self) -> Arc<BridgeFeatureFlags> {
        self.current.load_full()
    }

    pub fn reload(&self) -> Result<(), AppError> {
        let flags = load_flags(&self.path)?;
        self.current.store(Arc::new(flags));
        Ok(())
    }

    fn watch(&self) -> Result<(), AppError> {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut watcher = notify::RecommendedWatcher::new(tx, NotifyConfig::default())
            .map_err(|e| AppError::Config(e.to_string()))?;
        watcher
            .watch(&self.path, RecursiveMode::NonRecursive)
            .map_err(|e| AppError::Config(e.to_string()))?;

        log_info!("🚀 已启动桥接开关热重载监听: {}", self.path.display());

        for res in rx {
            match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    match self.reload() {
                        Ok(()) => log_info!("✅ 桥接白名单已动态更新"),
                        Err(e) => log_error!("桥接开关重载失败，保留旧配置: {}", e),
                    }
                }
                Ok(_) => {}
                Err(e) => log_error!("watch error: {:?}", e),
            }
        }
        Ok(())
    }
}

fn load_flags(path: &Path) -> Result<BridgeFeatureFlags, AppError> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("无法读取 '{}': {}", path.display(), e)))?;
    let file: FlagsFile =
        toml::from_str(&content).map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
    Ok(BridgeFeatureFlags {
        extension_support: file.extension_support,
        src_network_allowlist: file.src_network_allowlist,
        dest_network_allowlist: file.dest_network_allowlist,
    })
}
