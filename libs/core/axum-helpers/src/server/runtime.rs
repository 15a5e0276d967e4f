//! Process-level facts reported by health endpoints.

use core_config::Environment;
use serde::Serialize;
use std::time::{Duration, Instant};
use sysinfo::{ProcessesToUpdate, System};
use utoipa::ToSchema;

/// Version, environment and start time of the running service.
///
/// Cheap to clone; handlers receive it through router state.
#[derive(Clone, Debug)]
pub struct RuntimeInfo {
    pub version: String,
    pub environment: Environment,
    started_at: Instant,
}

/// Resident and virtual memory of the current process, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMemory {
    pub rss_bytes: u64,
    pub virtual_bytes: u64,
}

impl RuntimeInfo {
    pub fn new(version: impl Into<String>, environment: Environment) -> Self {
        Self {
            version: version.into(),
            environment,
            started_at: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Uptime in seconds with millisecond resolution.
    pub fn uptime_secs(&self) -> f64 {
        (self.uptime().as_millis() as f64) / 1000.0
    }

    /// Memory of the current process, `None` when the platform hides it.
    pub fn memory(&self) -> Option<ProcessMemory> {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => pid,
            Err(e) => {
                tracing::warn!("Failed to get current process ID for memory metrics: {}", e);
                return None;
            }
        };

        // Only the current process is loaded; no system-wide scan.
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        sys.process(pid).map(|proc| ProcessMemory {
            rss_bytes: proc.memory(),
            virtual_bytes: proc.virtual_memory(),
        })
    }
}
