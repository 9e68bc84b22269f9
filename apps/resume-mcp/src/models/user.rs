/// Identity a request runs under. Every repository call takes one.
///
/// `owner_id == None` is the single-user local mode: no ownership filter is
/// applied and rows are created without an owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    owner_id: Option<String>,
    pub roles: Vec<String>,
}

impl AuthContext {
    pub fn local() -> Self {
        AuthContext::default()
    }

    pub fn user(owner_id: impl Into<String>, roles: Vec<String>) -> Self {
        AuthContext {
            owner_id: Some(owner_id.into()),
            roles,
        }
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }
}
