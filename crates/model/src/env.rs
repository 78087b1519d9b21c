/// Table used by the create function when the table is sourced from configuration
pub const TABLE_NAME: &'static str = "TABLE_NAME";
/// Named create profile, either `payload` or `environment`
pub const CREATE_PROFILE: &'static str = "CREATE_PROFILE";
/// Whether reads against the table are strongly consistent, defaults to `true`
pub const CONSISTENT_READ: &'static str = "CONSISTENT_READ";
