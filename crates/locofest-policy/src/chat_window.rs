/// Messages kept per channel.
pub const DEFAULT_WINDOW: usize = 100;

/// Everything past the newest `window` entries. Input must already be sorted
/// newest first by the channel's ordering column.
pub fn trim<T>(newest_first: &[T], window: usize) -> &[T] {
    newest_first.get(window..).unwrap_or(&[])
}
