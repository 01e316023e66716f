use std::path::{Path, PathBuf};

use anyhow::Context;
use parking_lot::Mutex;

/// 会话 ID 的持久化位置
pub trait SessionStore: Send + Sync {
    fn load(&self) -> anyhow::Result<Option<String>>;
    fn save(&self, session_id: &str) -> anyhow::Result<()>;
}

/// 进程内存储：生命周期与当前浏览上下文（进程）一致
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> anyhow::Result<Option<String>> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, session_id: &str) -> anyhow::Result<()> {
        *self.slot.lock() = Some(session_id.to_string());
        Ok(())
    }
}

/// 文件存储：跨进程重启保持同一会话
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> anyhow::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let id = content.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e)
                .with_context(|| format!("failed to read session file {}", self.path.display())),
        }
    }

    fn save(&self, session_id: &str) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(&self.path, session_id)
            .with_context(|| format!("failed to write session file {}", self.path.display()))
    }
}
