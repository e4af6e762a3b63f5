use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// Suppress human-readable output; set once by the CLI, otherwise read
/// from `BULKLOADER_QUIET`
pub fn set_quiet(quiet: bool) {
    let _ = QUIET.set(quiet);
}

pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("BULKLOADER_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}
