//! On-screen chat feed.

/// Draws chat lines. Only valid on the privileged context, so every call
/// goes through [`crate::context::ContextGuard`].
pub trait Renderer: Send + Sync {
    /// Shows one chat line.
    fn show_message(&self, text: &str, sender_name: &str, team_only: bool);
}
