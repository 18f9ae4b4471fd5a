/// Helpers for `#[serde(default = "...")]` attributes that need a literal value.
pub struct Bool;

impl Bool {
    pub fn r#true() -> bool {
        true
    }

    pub fn r#false() -> bool {
        false
    }
}
