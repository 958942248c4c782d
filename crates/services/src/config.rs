/// Tunable business-rule limits.
///
/// The shift note edit window is fixed and deliberately absent here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleConfig {
    /// How far back an activity may be dated.
    pub activity_max_backdate_days: i64,
    /// How far back a shift note may be dated.
    pub shift_note_max_backdate_days: i64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            activity_max_backdate_days: 365,
            shift_note_max_backdate_days: 7,
        }
    }
}

impl RuleConfig {
    /// Load rule limits from environment variables with defaults.
    ///
    /// | Env Var                        | Default |
    /// |--------------------------------|---------|
    /// | `ACTIVITY_MAX_BACKDATE_DAYS`   | `365`   |
    /// | `SHIFT_NOTE_MAX_BACKDATE_DAYS` | `7`     |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let activity_max_backdate_days: i64 = std::env::var("ACTIVITY_MAX_BACKDATE_DAYS")
            .unwrap_or_else(|_| defaults.activity_max_backdate_days.to_string())
            .parse()
            .expect("ACTIVITY_MAX_BACKDATE_DAYS must be a valid i64");

        let shift_note_max_backdate_days: i64 = std::env::var("SHIFT_NOTE_MAX_BACKDATE_DAYS")
            .unwrap_or_else(|_| defaults.shift_note_max_backdate_days.to_string())
            .parse()
            .expect("SHIFT_NOTE_MAX_BACKDATE_DAYS must be a valid i64");

        Self {
            activity_max_backdate_days,
            shift_note_max_backdate_days,
        }
    }
}
