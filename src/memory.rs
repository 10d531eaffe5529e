//! Resident memory of the current process, read from `/proc/self/status`.

use anyhow::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUsage {
    /// Peak resident set size (VmHWM), in KiB
    pub peak_rss_kb: u64,
    /// Current resident set size (VmRSS), in KiB
    pub current_rss_kb: u64,
}

impl MemoryUsage {
    pub fn peak_mb(&self) -> f64 {
        self.peak_rss_kb as f64 / 1024.0
    }

    pub fn current_mb(&self) -> f64 {
        self.current_rss_kb as f64 / 1024.0
    }
}

pub fn current_usage() -> anyhow::Result<MemoryUsage> {
    let status = std::fs::read_to_string("/proc/self/status")
        .context("reading /proc/self/status (memory profiling needs Linux procfs)")?;
    parse_status(&status).context("VmHWM/VmRSS missing from /proc/self/status")
}

fn field_kb(status: &str, name: &str) -> Option<u64> {
    status.lines().find_map(|line| {
        let rest = line.strip_prefix(name)?.strip_prefix(':')?;
        rest.split_whitespace().next()?.parse().ok()
    })
}

pub fn parse_status(status: &str) -> Option<MemoryUsage> {
    Some(MemoryUsage {
        peak_rss_kb: field_kb(status, "VmHWM")?,
        current_rss_kb: field_kb(status, "VmRSS")?,
    })
}
