use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::{AcquireError, SessionError, SessionResult};
use super::lock::lock_mutex;
use super::logging::{ComponentLogger, LogContext};
use super::scheduler::CaptureScheduler;
use super::{SharedSource, SourceProvider, share_source};

/// Which of the two symmetric capture sources to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    #[default]
    User,
    Environment,
}

impl FacingMode {
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::User => FacingMode::Environment,
            FacingMode::Environment => FacingMode::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => "environment",
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owns the live source handle. At most one handle is held at a time.
pub struct SourceManager {
    provider: Arc<dyn SourceProvider>,
    mode: FacingMode,
    active: Option<SharedSource>,
}

impl SourceManager {
    pub fn new(provider: Arc<dyn SourceProvider>, mode: FacingMode) -> Self {
        Self {
            provider,
            mode,
            active: None,
        }
    }

    pub fn mode(&self) -> FacingMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<SharedSource> {
        self.active.clone()
    }

    /// Acquires a handle for `mode`, releasing any handle still held first.
    pub fn acquire(&mut self, mode: FacingMode) -> Result<SharedSource, AcquireError> {
        self.release();
        self.debug(&format!("acquiring '{}' source via {}", mode, self.provider.name()));

        match self.provider.acquire(mode) {
            Ok(source) => {
                self.info(&format!("acquired source '{}'", source.id()));
                let shared = share_source(source);
                self.mode = mode;
                self.active = Some(shared.clone());
                Ok(shared)
            }
            Err(err) => {
                self.warn(&format!("acquire '{}' failed: {}", mode, err));
                Err(err)
            }
        }
    }

    /// Stops the held handle, if any. Safe to call repeatedly.
    pub fn release(&mut self) {
        let Some(source) = self.active.take() else {
            return;
        };
        let mut source = lock_mutex(&source, "SourceManager::release");
        if source.is_live() {
            source.stop();
        }
        self.info(&format!("released source '{}'", source.id()));
    }

    /// Toggles the facing mode. While recording, the current handle is swapped
    /// for one in the new mode and the scheduler resumes on it; the buffer is
    /// never signalled. When the new handle cannot be acquired the scheduler is
    /// stopped and the failure returned.
    pub fn switch_mode(&mut self, scheduler: &mut CaptureScheduler) -> SessionResult<FacingMode> {
        let next = self.mode.toggled();
        self.mode = next;

        if !scheduler.is_recording() {
            self.info(&format!("facing mode set to '{}' (idle)", next));
            return Ok(next);
        }

        // Kein Tick gegen die freigegebene Quelle, solange acquire blockiert
        scheduler.pause();
        match self.acquire(next) {
            Ok(source) => {
                scheduler.restart(source)?;
                Ok(next)
            }
            Err(err) => {
                scheduler.stop();
                Err(SessionError::Acquire(err))
            }
        }
    }
}

impl Drop for SourceManager {
    fn drop(&mut self) {
        self.release();
    }
}

impl ComponentLogger for SourceManager {
    fn log_context(&self) -> LogContext {
        LogContext::new("SourceManager", self.mode.as_str())
    }
}
