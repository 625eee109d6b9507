use chrono::NaiveDateTime;
use log::warn;
use notify_rust::Notification;

pub fn notify_prayer_time(instant: NaiveDateTime) {
    let result = Notification::new()
        .summary("Prayer time")
        .body(&format!("It is {}.", instant.format("%H:%M")))
        .timeout(10000)
        .show();
    if let Err(err) = result {
        warn!("Failed to show prayer notification: {}", err);
    }
}

pub fn notify_refresh_failed() {
    let result = Notification::new()
        .summary("Prayer times not updated")
        .body("Could not download prayer times. The clock keeps the cached times.")
        .timeout(5000)
        .show();
    if let Err(err) = result {
        warn!("Failed to show refresh notification: {}", err);
    }
}
