//! Status badge metadata.
//!
//! Enumerations shown as badges (enrollment status, payment state, ...) map each variant to
//! plain metadata. Colours and glyphs are picked by the rendering side from `tone` and
//! `icon`; nothing here knows about a terminal.
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Neutral,
    Info,
    Success,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BadgeMeta {
    pub label: &'static str,
    pub tone: Tone,
    /// Icon key, resolved to a glyph by the theme.
    pub icon: &'static str,
}

impl BadgeMeta {
    pub const fn new(label: &'static str, tone: Tone, icon: &'static str) -> Self {
        Self { label, tone, icon }
    }
}

pub trait Badge {
    fn meta(&self) -> BadgeMeta;

    fn label(&self) -> &'static str {
        self.meta().label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Light {
        Green,
        Red,
    }

    impl Badge for Light {
        fn meta(&self) -> BadgeMeta {
            match self {
                Light::Green => BadgeMeta::new("Go", Tone::Success, "check"),
                Light::Red => BadgeMeta::new("Stop", Tone::Danger, "cross"),
            }
        }
    }

    #[test]
    fn label_comes_from_meta() {
        assert_eq!(Light::Green.label(), "Go");
        assert_eq!(Light::Red.meta().tone, Tone::Danger);
    }
}
