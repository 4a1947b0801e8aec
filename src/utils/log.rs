// src/utils/log.rs

//! Run banners and summaries on top of the `log` facade.

/// Log a header
pub fn header(title: &str) {
    let border = "═".repeat(60);
    log::info!("{}", border);
    log::info!("  {}", title);
    log::info!("{}", border);
}

/// Log a step in a process
pub fn step(step_num: usize, total: usize, message: &str) {
    log::info!("[STEP {}/{}] {}", step_num, total, message);
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    log::info!("[SUMMARY] {}", title);
    for (key, value) in items {
        log::info!("    {}: {}", key, value);
    }
}

/// Log an informational line
pub fn info(message: &str) {
    log::info!("{}", message);
}

/// Log a completed stage
pub fn success(message: &str) {
    log::info!("[OK] {}", message);
}

/// Log a failed stage
pub fn failure(message: &str) {
    log::error!("[FAILED] {}", message);
}
