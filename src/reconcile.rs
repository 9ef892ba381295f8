//! Incremental-update reconciliation.
//!
//! Given a freshly fetched chronological batch and the identifier of the
//! newest message a client already knows, compute the suffix of genuinely
//! new messages.

use crate::upstream::NormalizedMessage;

/// Messages in `batch` that come after `last_known_id`.
///
/// If `last_known_id` sits at index `k`, the result is `batch[k+1..]`. If it
/// is `None` (first check) or absent from the batch (it fell outside the
/// fetch window), the result is empty: re-announcing history a client may
/// already have is worse than occasionally missing a gap.
pub fn find_new_messages<'a>(
    batch: &'a [NormalizedMessage],
    last_known_id: Option<&str>,
) -> &'a [NormalizedMessage] {
    let Some(last_known_id) = last_known_id else {
        return &[];
    };
    match batch.iter().position(|msg| msg.id == last_known_id) {
        Some(k) => &batch[k + 1..],
        None => &[],
    }
}
