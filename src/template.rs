/// Longest notification template a guild may configure.
pub const MAX_MESSAGE_LEN: usize = 750;

/// Substitute `{mention}`, `{name}` and `{new_age}` in a configured
/// notification template. Placeholders the template does not use are fine,
/// and anything else in curly brackets passes through untouched.
pub fn format_birthday_message(
    template: &str,
    mention: &str,
    name: &str,
    new_age: Option<i32>,
) -> String {
    let mut message = template
        .replace("{mention}", mention)
        .replace("{name}", name);

    if let Some(age) = new_age {
        message = message.replace("{new_age}", &age.to_string());
    }

    message
}
