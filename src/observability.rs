use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

// ── Mutation counters ───────────────────────────────────────────

/// Counter: period-type defaults saved (insert or update).
pub const DEFAULTS_SAVED_TOTAL: &str = "kiosk_defaults_saved_total";

/// Counter: schedule entries migrated to a new default.
pub const SCHEDULES_MIGRATED_TOTAL: &str = "kiosk_schedules_migrated_total";

/// Counter: best-effort follow-up steps that failed. Labels: step.
pub const SECONDARY_FAILURES_TOTAL: &str = "kiosk_secondary_failures_total";

/// Counter: booking instances deleted.
pub const INSTANCES_DELETED_TOTAL: &str = "kiosk_instances_deleted_total";

/// Counter: parent bookings deleted.
pub const BOOKINGS_DELETED_TOTAL: &str = "kiosk_bookings_deleted_total";

/// Counter: booking instances rewritten by a scoped edit.
pub const INSTANCES_EDITED_TOTAL: &str = "kiosk_instances_edited_total";

/// Counter: override mutations. Labels: op.
pub const OVERRIDE_MUTATIONS_TOTAL: &str = "kiosk_override_mutations_total";

// ── Store latency ───────────────────────────────────────────────

/// Histogram: store call latency in seconds. Labels: table, op.
pub const STORE_CALL_DURATION_SECONDS: &str = "kiosk_store_call_duration_seconds";

/// Install a fmt subscriber filtered by `filter` (EnvFilter syntax).
/// Returns false if a global subscriber was already set.
pub fn init_tracing(filter: &str) -> bool {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok()
}

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_without_port_is_noop() {
        assert!(init(None).is_ok());
    }

    #[test]
    fn tracing_installs_once() {
        init_tracing("kiosk_console=debug");
        assert!(!init_tracing("not a [valid filter"));
    }

    #[test]
    fn metric_names_share_prefix() {
        for name in [
            DEFAULTS_SAVED_TOTAL,
            SCHEDULES_MIGRATED_TOTAL,
            SECONDARY_FAILURES_TOTAL,
            INSTANCES_DELETED_TOTAL,
            BOOKINGS_DELETED_TOTAL,
            INSTANCES_EDITED_TOTAL,
            OVERRIDE_MUTATIONS_TOTAL,
            STORE_CALL_DURATION_SECONDS,
        ] {
            assert!(name.starts_with("kiosk_"), "{name}");
        }
    }
}
