use futures::future::try_join_all;
use regex::{Captures, Regex};
use std::future::Future;

/// Replaces every match of `pattern` in `text` with an asynchronously
/// resolved string.
///
/// `resolve` is called once per match, left to right, and all the returned
/// futures are driven concurrently. Results are spliced back by match
/// position, so two textually identical matches still get their own result.
/// The first error aborts the whole substitution.
pub async fn substitute_async<F, Fut, E>(
    text: &str,
    pattern: &Regex,
    mut resolve: F,
) -> Result<String, E>
where
    F: FnMut(&Captures<'_>) -> Fut,
    Fut: Future<Output = Result<String, E>>,
{
    let mut spans = Vec::new();
    let mut pending = Vec::new();

    for caps in pattern.captures_iter(text) {
        spans.push(caps.get_match().range());
        pending.push(resolve(&caps));
    }

    if pending.is_empty() {
        return Ok(text.to_string());
    }

    let resolved = try_join_all(pending).await?;

    let mut output = String::with_capacity(text.len());
    let mut last = 0;
    for (span, replacement) in spans.into_iter().zip(resolved) {
        output.push_str(&text[last..span.start]);
        output.push_str(&replacement);
        last = span.end;
    }
    output.push_str(&text[last..]);

    Ok(output)
}
