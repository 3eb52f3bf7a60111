//! Role types for conversation participants.

use serde::{Deserialize, Serialize};

/// Who authored a chat message.
///
/// # Examples
///
/// ```
/// use scrivener_core::Role;
///
/// assert_ne!(Role::User, Role::Assistant);
/// assert_eq!(format!("{}", Role::System), "system");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System messages provide context and instructions
    #[display("system")]
    System,
    /// User messages carry the request
    #[default]
    #[display("user")]
    User,
    /// Assistant messages are earlier model replies
    #[display("assistant")]
    Assistant,
}
