use std::fmt;
use std::str::FromStr;

/// How much informational output the console lets through.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Detailed,
}

impl Verbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Detailed => "detailed",
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => Verbosity::Quiet,
            2 => Verbosity::Detailed,
            _ => Verbosity::Normal,
        }
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Verbosity::Quiet => 0,
            Verbosity::Normal => 1,
            Verbosity::Detailed => 2,
        }
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" => Ok(Verbosity::Quiet),
            "normal" => Ok(Verbosity::Normal),
            "detailed" => Ok(Verbosity::Detailed),
            _ => Err(format!(
                "Invalid verbosity '{}'. Use: quiet, normal, or detailed.",
                value
            )),
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output layout for `sources list`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SourceListFormat {
    #[default]
    Detailed,
    Short,
}

impl FromStr for SourceListFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "detailed" => Ok(SourceListFormat::Detailed),
            "short" => Ok(SourceListFormat::Short),
            _ => Err(format!(
                "Invalid format '{}'. Use: Detailed or Short.",
                value
            )),
        }
    }
}
