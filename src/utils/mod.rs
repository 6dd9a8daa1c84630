//! Small helpers shared by the renderers and commands.

pub mod html;

/// `"1 error"`, `"3 errors"`
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}
