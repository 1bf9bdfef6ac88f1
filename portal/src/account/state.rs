use serde::Serialize;

/// Account form state shared by the login, register and profile pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    /// A request is in flight; forms are disabled.
    pub in_flight: bool,
    /// Inline error text.
    pub error: Option<String>,
    /// Informational text, e.g. after a password reset.
    pub notice: Option<String>,
}

impl AccountState {
    pub(crate) fn begin(&mut self) {
        self.in_flight = true;
        self.error = None;
        self.notice = None;
    }

    pub(crate) fn fail(&mut self, error: &impl std::fmt::Display) {
        self.in_flight = false;
        self.error = Some(error.to_string());
    }

    pub(crate) fn finish(&mut self, notice: Option<String>) {
        self.in_flight = false;
        self.notice = notice;
    }
}
