use serde::Serialize;
use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// Suppress decorative output (banners, hints) when `QAREVIEW_QUIET` is set
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("QAREVIEW_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn from_json_flag(json: bool) -> Self {
        if json { OutputMode::Json } else { OutputMode::Human }
    }

    pub fn is_human(&self) -> bool {
        matches!(self, OutputMode::Human)
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    ok: bool,
    command: &'a str,
    data: T,
}

/// Print a JSON success envelope for `command`
pub fn emit_success<T: Serialize>(mode: OutputMode, command: &str, data: T) -> anyhow::Result<()> {
    if mode.is_human() {
        return Ok(());
    }
    let envelope = Envelope {
        ok: true,
        command,
        data,
    };
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let envelope = Envelope {
            ok: true,
            command: "stats",
            data: serde_json::json!({ "reviewed": 1 }),
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["command"], "stats");
        assert_eq!(value["data"]["reviewed"], 1);
        assert!(OutputMode::from_json_flag(false).is_human());
    }
}
