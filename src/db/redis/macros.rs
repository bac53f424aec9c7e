/// Read-through caching around an async computation.
///
/// Looks `$key` up in `$cache`; on a hit the cached value is returned. On a
/// miss, or when the cache itself cannot be read, `$block` is awaited and a
/// successful result is queued for a background write with `$ttl` seconds to
/// live. Errors from `$block` propagate with `?`, so the macro must be used
/// inside a function returning `AppResult`.
///
/// # Example
/// ```rust,ignore
/// let hits: Vec<CatalogMatch> = cached!(cache, key, SEARCH_CACHE_TTL, async move {
///     fetch_from_catalog(&query).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        let cached = match $cache.get_from_cache(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache read failed, bypassing cache");
                None
            }
        };

        match cached {
            Some(hit) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok(hit)
            }
            None => {
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
