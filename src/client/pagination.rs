pub const MAX_VISIBLE_PAGES: u64 = 5;

/// Page numbers shown by the pager plus whether an ellipsis follows them.
///
/// The window starts one page before the current one and is shifted left when
/// it would run past the last page.
pub fn window(current: u64, total: u64) -> (Vec<u64>, bool) {
    if total == 0 { return (Vec::new(), false); }
    let mut start = current.saturating_sub(1).max(1);
    let end = total.min(start + MAX_VISIBLE_PAGES - 1);
    if end - start + 1 < MAX_VISIBLE_PAGES {
        start = (end + 1).saturating_sub(MAX_VISIBLE_PAGES).max(1);
    }
    let ellipsis = total > 3 && current + 1 < total;
    ((start..=end).collect(), ellipsis)
}

pub fn has_prev(current: u64) -> bool { current > 1 }

pub fn has_next(current: u64, total: u64) -> bool { current < total }
