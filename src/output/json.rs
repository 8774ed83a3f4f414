use anyhow::Result;
use serde::Serialize;

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::WomenParticipationAnswer;

    #[test]
    fn renders_pretty_json() {
        let out = render_json(&WomenParticipationAnswer { percentage: 30.0 }).expect("json");
        assert_eq!(out, "{\n  \"percentage\": 30.0\n}");
    }
}
