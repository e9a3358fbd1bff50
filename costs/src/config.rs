//! Cost rule configuration loaded via OrthoConfig.

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{MemberCheckPolicy, ParseMemberCheckPolicyError, ValidationPolicy};

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// `member_check` named an unknown policy.
    #[error("invalid COSTS_MEMBER_CHECK: {0}")]
    MemberCheck(#[from] ParseMemberCheckPolicyError),
}

/// Configuration values controlling the cost entry rules.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "COSTS")]
pub struct CostsSettings {
    /// Scope of the subject membership check: `always` or `on_behalf_only`.
    pub member_check: Option<String>,
    /// Grant host administrators every cost permission.
    #[ortho_config(default = true)]
    pub admin_bypass: bool,
}

impl CostsSettings {
    /// Return the configured member check, falling back to `always`.
    ///
    /// # Errors
    /// Returns [`SettingsError::MemberCheck`] for an unknown policy name.
    pub fn member_check(&self) -> Result<MemberCheckPolicy, SettingsError> {
        match self.member_check.as_deref() {
            None => Ok(MemberCheckPolicy::default()),
            Some(raw) => Ok(raw.parse()?),
        }
    }

    /// Build the policy consumed by the cost entry service.
    ///
    /// # Errors
    /// Propagates [`CostsSettings::member_check`] failures.
    pub fn policy(&self) -> Result<ValidationPolicy, SettingsError> {
        Ok(ValidationPolicy {
            member_check: self.member_check()?,
            admin_bypass: self.admin_bypass,
        })
    }
}
