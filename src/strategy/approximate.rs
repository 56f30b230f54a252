use super::{ApproximateStrategy, StrategyDescriptor};
use std::convert::Infallible;
use std::env;
use std::str::FromStr;

const CODE_LENGTH: usize = 4;
const PADDING: char = '0';
const LOCALE_VARIABLES: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

/// Locale mode of the phonetic coder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Default,
    French,
}

impl Locale {
    /// Read a locale tag such as `fr-FR`, `fr_FR.UTF-8` or `en_US`
    pub fn from_tag(tag: &str) -> Self {
        let normalized = tag
            .split(['.', '@'])
            .next()
            .unwrap_or_default()
            .replace('_', "-")
            .to_lowercase();
        if normalized == "fr-fr" {
            Locale::French
        } else {
            Locale::Default
        }
    }

    /// Locale of the running process, from the usual environment variables
    pub fn current() -> Self {
        LOCALE_VARIABLES
            .iter()
            .find_map(|name| env::var(name).ok().filter(|v| !v.is_empty()))
            .map(|tag| Self::from_tag(&tag))
            .unwrap_or_default()
    }
}

impl FromStr for Locale {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_tag(s))
    }
}

/// Four character phonetic code with a French variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultApproximate {
    locale: Locale,
}

impl Default for DefaultApproximate {
    fn default() -> Self {
        Self::new(Locale::current())
    }
}

impl DefaultApproximate {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    fn digit(&self, c: char) -> Option<char> {
        let french = self.locale == Locale::French;
        match c {
            'B' | 'P' => Some('1'),
            'F' | 'V' if !french => Some('1'),
            'C' | 'K' | 'Q' => Some('2'),
            'G' | 'J' | 'S' | 'X' | 'Z' if !french => Some('2'),
            'D' | 'T' => Some('3'),
            'L' => Some('4'),
            'M' | 'N' => Some('5'),
            'R' => Some('6'),
            'G' | 'J' => Some('7'),
            'S' | 'X' | 'Z' => Some('8'),
            'F' | 'V' => Some('9'),
            _ => None,
        }
    }
}

fn upper(c: char) -> char {
    c.to_uppercase().next().unwrap_or(c)
}

impl ApproximateStrategy for DefaultApproximate {
    fn descriptor(&self) -> StrategyDescriptor {
        StrategyDescriptor::new(
            format!("{}::DefaultApproximate::encode", module_path!()),
            1,
        )
    }

    fn encode(&self, value: &str) -> String {
        let mut code = String::with_capacity(CODE_LENGTH);
        let mut chars = value.chars().map(upper);

        if let Some(first) = chars.next() {
            code.push(first);
            let mut emitted = 1;
            let mut previous: (Option<char>, Option<char>) = (None, None);

            for c in chars {
                let digit = self.digit(c);
                // a repeated letter or a repeated digit is not coded twice
                if Some(c) != previous.0 && digit != previous.1 {
                    if let Some(d) = digit {
                        code.push(d);
                        emitted += 1;
                    }
                }
                if emitted == CODE_LENGTH {
                    break;
                }
                previous = (Some(c), digit);
            }
        }

        while code.chars().count() < CODE_LENGTH {
            code.push(PADDING);
        }
        code
    }
}
