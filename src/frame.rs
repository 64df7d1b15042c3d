use std::fmt;

/// Category of master calibration frame handled by the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FrameType {
    MasterBias,
    MasterDark,
    MasterFlat,
}

impl FrameType {
    /// Processing order of a run.
    pub const ALL: [FrameType; 3] = [
        FrameType::MasterBias,
        FrameType::MasterDark,
        FrameType::MasterFlat,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FrameType::MasterBias => "MASTER BIAS",
            FrameType::MasterDark => "MASTER DARK",
            FrameType::MasterFlat => "MASTER FLAT",
        }
    }

    /// Resolves a `type` metadata value.
    ///
    /// Matching ignores case and extra whitespace, and accepts the reversed
    /// word order, so `"MASTER BIAS"`, `"master  bias"` and `"bias master"`
    /// all resolve to [`FrameType::MasterBias`].
    pub fn parse(value: &str) -> Option<FrameType> {
        let words: Vec<String> = value
            .split_whitespace()
            .map(|w| w.to_ascii_uppercase())
            .collect();
        let [first, second] = words.as_slice() else {
            return None;
        };
        let kind = match (first.as_str(), second.as_str()) {
            ("MASTER", kind) | (kind, "MASTER") => kind,
            _ => return None,
        };
        match kind {
            "BIAS" => Some(FrameType::MasterBias),
            "DARK" => Some(FrameType::MasterDark),
            "FLAT" => Some(FrameType::MasterFlat),
            _ => None,
        }
    }

    /// Filename prefix, e.g. `masterBias`.
    pub fn filename_prefix(self) -> String {
        camel_case(self.label())
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lower camel case rendering of a space, dash or underscore separated label.
pub fn camel_case(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for (i, word) in label
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        let lower = word.to_lowercase();
        if i == 0 {
            out.push_str(&lower);
            continue;
        }
        let mut chars = lower.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
