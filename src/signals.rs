use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tokio_util::sync::CancellationToken;

/// Exit code of a process killed by SIGINT.
const FORCED_EXIT_CODE: i32 = 130;

/// What should we do when the user stops this program?
///
/// The first SIGINT or SIGTERM cancels `cancel` so every task can wind down.
/// A second one exits right away.
pub fn handle_shutdown(cancel: CancellationToken) -> std::io::Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;

    std::thread::spawn(move || {
        for signal in signals.forever() {
            let name = signal_hook::low_level::signal_name(signal).unwrap_or("unknown");
            if cancel.is_cancelled() {
                log::warn!("Received {name} again, exiting immediately");
                std::process::exit(FORCED_EXIT_CODE);
            }
            let _ = sd_notify::notify(false, &[sd_notify::NotifyState::Stopping]);
            log::warn!("Received {name}, initiating graceful shutdown...");
            cancel.cancel();
        }
    });
    Ok(())
}
