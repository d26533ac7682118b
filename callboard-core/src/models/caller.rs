/// Tenant on whose behalf a query runs.
///
/// Identity is established upstream; every repository call takes one of these
/// explicitly and there is no fallback identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerContext {
    pub user_id: String,
}

impl CallerContext {
    /// Returns `None` for a blank id.
    pub fn new(user_id: impl Into<String>) -> Option<Self> {
        let user_id = user_id.into();
        let trimmed = user_id.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            user_id: trimmed.to_string(),
        })
    }
}
