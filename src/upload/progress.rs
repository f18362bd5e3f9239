/// Value shown as soon as a submission starts.
pub const INITIAL_PERCENT: u8 = 10;
/// Upload ticks only cover the request body; stay below 100 until the server replies.
pub const UPLOAD_CEILING_PERCENT: u8 = 95;
pub const COMPLETE_PERCENT: u8 = 100;

/// `floor(100 * loaded / total)` clamped to the upload ceiling. `None` when
/// the total is unknown or zero.
pub fn upload_percent(loaded: u64, total: Option<u64>) -> Option<u8> {
    let total = total.filter(|total| *total > 0)?;
    let percent = (u128::from(loaded) * 100) / u128::from(total);
    Some(percent.min(u128::from(UPLOAD_CEILING_PERCENT)) as u8)
}

/// Next displayed value for a tick. Never lower than `current`.
pub fn advance(current: u8, loaded: u64, total: Option<u64>) -> u8 {
    match upload_percent(loaded, total) {
        Some(percent) => current.max(percent),
        None => current,
    }
}
