//! Post-retrieval filtering of local passages.

use ragloop_protocol::RetrievedPassage;

/// Keep passages scoring at or above `threshold`, preserving input order.
///
/// Web passages pass through untouched. Local passages without a score are
/// dropped. Applying the filter twice yields the same result as applying it once.
pub fn filter_by_threshold(
    passages: Vec<RetrievedPassage>,
    threshold: f32,
) -> Vec<RetrievedPassage> {
    passages
        .into_iter()
        .filter(|passage| {
            passage.is_web()
                || passage
                    .similarity_score
                    .is_some_and(|score| score >= threshold)
        })
        .collect()
}

/// Cap local results at `top_k` in case the index returned more than asked.
pub(crate) fn cap_to_top_k(
    mut passages: Vec<RetrievedPassage>,
    top_k: usize,
) -> Vec<RetrievedPassage> {
    passages.truncate(top_k);
    passages
}
