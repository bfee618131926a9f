//! Closed option sets offered by the translation form.
//!
//! Each set is fixed at compile time. Labels are the human-readable strings
//! shown in the selectors and substituted into prompts.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {set} option: {value:?}")]
pub struct OptionParseError {
    pub set: &'static str,
    pub value: String,
}

macro_rules! closed_set {
    (
        $(#[$meta:meta])*
        $name:ident as $set:literal {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = OptionParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label() == s.trim())
                    .ok_or_else(|| OptionParseError {
                        set: $set,
                        value: s.to_owned(),
                    })
            }
        }
    };
}

closed_set! {
    /// Languages offered for both the input and the output selector.
    Language as "language" {
        English => "English",
        Japanese => "Japanese",
        French => "French",
        Hindi => "Hindi",
        MandarinChinese => "Mandarin Chinese",
    }
}

closed_set! {
    /// Register the translation should be written in.
    Politeness as "politeness" {
        SuperCasual => "Super Casual",
        ModerateCasual => "Moderate Casual",
        WorkplaceCasual => "Workplace Casual",
        WorkplacePolite => "Workplace Polite",
        SuperPolite => "Super Polite",
    }
}

closed_set! {
    /// Vocabulary threshold for the glossary: words the learner at this level
    /// would not already know get a definition.
    Proficiency as "proficiency" {
        Newbie => "Newbie",
        Beginner => "Beginner",
        Intermediate => "Intermediate",
        Advanced => "Advanced",
        Native => "Native",
    }
}

/// How the prompt asks for the translated sentence to be written out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Script {
    /// Kanji line plus a romaji reading.
    Japanese,
    /// Native script plus a line spelled in the input language's characters.
    Transliterated,
    /// Latin alphabet, no reading aid needed.
    Latin,
}

impl Language {
    pub fn script(self) -> Script {
        match self {
            Language::Japanese => Script::Japanese,
            Language::Hindi | Language::MandarinChinese => Script::Transliterated,
            Language::English | Language::French => Script::Latin,
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::English
    }
}

impl Default for Politeness {
    fn default() -> Self {
        Politeness::WorkplaceCasual
    }
}

impl Default for Proficiency {
    fn default() -> Self {
        Proficiency::Beginner
    }
}

impl Proficiency {
    /// JLPT level at which glossary entries start for Japanese output.
    pub fn jlpt_level(self) -> &'static str {
        match self {
            Proficiency::Newbie => "N5",
            Proficiency::Beginner => "N4",
            Proficiency::Intermediate => "N3",
            Proficiency::Advanced => "N2",
            Proficiency::Native => "N1",
        }
    }
}
