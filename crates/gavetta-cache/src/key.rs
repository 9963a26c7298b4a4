use std::fmt;

/// Cache key derived from an action name and its query parameters.
///
/// Format: `action:name1=value1&name2=value2`, parameters sorted by name (then
/// value) so that the same parameter set in any order yields the same key.
/// Names and values are not escaped; a parameter containing `=` or `&` can in
/// principle alias another set. Upstream parameter names are fixed, so this is
/// accepted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn derive<I, K, V>(action: &str, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        debug_assert!(!action.is_empty(), "cache key needs an action name");

        let mut pairs: Vec<(K, V)> = params.into_iter().collect();
        pairs.sort_by(|a, b| {
            a.0.as_ref()
                .cmp(b.0.as_ref())
                .then_with(|| a.1.as_ref().cmp(b.1.as_ref()))
        });

        let mut key = String::with_capacity(action.len() + 1 + pairs.len() * 16);
        key.push_str(action);
        key.push(':');
        for (i, (name, value)) in pairs.iter().enumerate() {
            if i > 0 {
                key.push('&');
            }
            key.push_str(name.as_ref());
            key.push('=');
            key.push_str(value.as_ref());
        }

        CacheKey(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
