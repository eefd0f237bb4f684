use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::HarnessError;

/// What the interpreter should do with the main file.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Run the program.
    Evaluate,
    /// Dump the compiled instruction sequence.
    Compile,
    /// Dump the parse tree.
    ParseSyntax,
    /// Dump the parse tree produced by the alternate parser.
    ParseSyntaxAlternate,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::Evaluate,
        Action::Compile,
        Action::ParseSyntax,
        Action::ParseSyntaxAlternate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Evaluate => "evaluate",
            Action::Compile => "compile",
            Action::ParseSyntax => "parse-syntax",
            Action::ParseSyntaxAlternate => "parse-syntax-alternate",
        }
    }

    /// Interpreter flags placed between the program name and the main file.
    pub fn flags(self) -> &'static [&'static str] {
        match self {
            Action::Evaluate => &[],
            Action::Compile => &["--dump=insns"],
            Action::ParseSyntax => &["--dump=parsetree"],
            Action::ParseSyntaxAlternate => &["--parser=prism", "--dump=parsetree"],
        }
    }
}

impl FromStr for Action {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| HarnessError::UnknownAction(s.to_string()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
