use std::path::PathBuf;
use std::sync::OnceLock;

use color_eyre::Result;
use tracing::error;

use crate::{config, logging};

static INIT: OnceLock<()> = OnceLock::new();

/// Where panic and error reports point the user to.
pub fn log_path() -> PathBuf {
    config::get_data_dir().join(logging::LOG_FILE.as_str())
}

fn panic_section() -> String {
    format!(
        "This is a bug. The session log at {} has the details; please attach it when reporting.",
        log_path().display()
    )
}

/// Install color-eyre and a panic hook that gives the terminal back before reporting.
pub fn init() -> Result<()> {
    // idempotent: wenn schon initialisiert, tue nichts
    if INIT.get().is_some() {
        return Ok(());
    }

    // try_into_hooks vermeidet Panic bei bereits gesetztem Theme
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
        .panic_section(panic_section())
        .capture_span_trace_by_default(false)
        .display_location_section(false)
        .display_env_section(false)
        .try_into_hooks()?;
    eyre_hook.install()?;

    std::panic::set_hook(Box::new(move |panic_info| {
        // Terminal zuerst zurückgeben, sonst landet der Report im Alternate Screen
        if crate::tui::restore().is_err() {
            error!("unable to restore the terminal");
        }

        #[cfg(not(debug_assertions))]
        {
            use human_panic::{handle_dump, metadata, print_msg};
            let metadata = metadata!();
            let file_path = handle_dump(&metadata, panic_info);
            if print_msg(file_path, &metadata).is_err() {
                eprintln!("human-panic: printing error message to console failed");
            }
            eprintln!("{}", panic_hook.panic_report(panic_info));
        }
        // Ohne ANSI-Farbcodes ins Logfile
        let msg = format!("{}", panic_hook.panic_report(panic_info));
        error!("Error: {}", strip_ansi_escapes::strip_str(msg));

        #[cfg(debug_assertions)]
        {
            better_panic::Settings::auto()
                .most_recent_first(false)
                .lineno_suffix(true)
                .verbosity(better_panic::Verbosity::Full)
                .create_panic_handler()(panic_info);
        }

        std::process::exit(libc::EXIT_FAILURE);
    }));

    // Markiere als initialisiert
    let _ = INIT.set(());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_point_at_the_session_log() {
        let path = log_path();
        assert!(path.ends_with("conductor.log"));
        assert!(panic_section().contains(&path.display().to_string()));
    }
}
