//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `harmony_core` wiring.
//! - Keep output deterministic for quick local sanity checks.

use harmony_core::{ChangeEvent, ChangeService};

fn main() {
    println!("harmony_core ping={}", harmony_core::ping());
    println!("harmony_core version={}", harmony_core::core_version());

    // Rule-table analysis over an empty in-memory store exercises the
    // db -> snapshot -> engine path without any network dependency.
    match harmony_core::db::open_db_in_memory() {
        Ok(conn) => {
            let service = ChangeService::new(&conn);
            let change = ChangeEvent::new("task_status_changed", 1);
            let analysis = service.analyze_change(&change);
            println!(
                "sample analysis change_type={} score={} impact={} affected={}",
                change.change_type,
                analysis.impact_score,
                analysis.psychological_impact.as_str(),
                analysis.affected_entities.join(",")
            );
        }
        Err(err) => {
            eprintln!("failed to open in-memory store: {err}");
            std::process::exit(1);
        }
    }
}
