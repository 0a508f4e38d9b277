//! Parsing of the preprocessor define list handed over by the build system

/// A single `NAME` or `NAME=VALUE` preprocessor define
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Define {
    pub name: String,
    pub value: Option<String>,
}

/// Ordered list of preprocessor defines
///
/// Entries are separated by whitespace and may carry a leading `-D`, so both
/// `APP_VERSION=\"1.2.3\" ESP32` and `-DAPP_VERSION=\"1.2.3\" -DESP32` parse the same.
/// Whitespace between a pair of quotes (plain or escaped) is part of the entry.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Defines(Vec<Define>);

impl Defines {
    pub fn parse(input: &str) -> Defines {
        let defines = split_entries(input)
            .into_iter()
            .map(|entry| {
                let entry = entry.strip_prefix("-D").unwrap_or(&entry);

                match entry.find('=') {
                    Some(idx) => Define {
                        name: entry[..idx].to_string(),
                        value: Some(entry[idx + 1..].to_string()),
                    },
                    None => Define {
                        name: entry.to_string(),
                        value: None,
                    },
                }
            })
            .filter(|define| !define.name.is_empty())
            .collect();

        Defines(defines)
    }

    /// Returns the define called `name`, if present
    pub fn get(&self, name: &str) -> Option<&Define> {
        self.0.iter().find(|define| define.name == name)
    }

    /// Returns the value of the define called `name`
    ///
    /// Defines that are present but carry no value yield `None`
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|define| define.value.as_deref())
    }
}

/// Splits `input` on whitespace outside of quotes
///
/// An unterminated quote extends to the end of the input.
fn split_entries(input: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in input.chars() {
        if c == '"' {
            quoted = !quoted;
        }

        if c.is_whitespace() && !quoted {
            if !current.is_empty() {
                entries.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }

    if !current.is_empty() {
        entries.push(current);
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_parse_plain_and_valued_defines() {
        let defines = Defines::parse("ESP32 APP_VERSION=\\\"2.3.1\\\"  LED_PIN=4");

        assert_eq!(defines.value("APP_VERSION"), Some("\\\"2.3.1\\\""));
        assert_eq!(defines.value("LED_PIN"), Some("4"));
        assert!(defines.get("ESP32").is_some());
        assert_eq!(defines.value("ESP32"), None);
    }

    #[test]
    fn it_should_strip_compiler_flag_prefix() {
        let defines = Defines::parse("-DAPP_VERSION=1.0 -DNDEBUG");

        assert_eq!(defines.value("APP_VERSION"), Some("1.0"));
        assert!(defines.get("NDEBUG").is_some());
        assert!(defines.get("-DNDEBUG").is_none());
    }

    #[test]
    fn it_should_keep_quoted_whitespace_in_values() {
        let defines = Defines::parse("-DAPP_VERSION=\\\"2.3 beta\\\" -DNAME=\"a b\" ESP32");

        assert_eq!(defines.value("APP_VERSION"), Some("\\\"2.3 beta\\\""));
        assert_eq!(defines.value("NAME"), Some("\"a b\""));
        assert!(defines.get("ESP32").is_some());
    }

    #[test]
    fn it_should_treat_blank_input_as_empty() {
        assert_eq!(Defines::parse("   "), Defines::default());
        assert_eq!(Defines::parse("-D"), Defines::default());
        assert!(Defines::parse("").get("APP_VERSION").is_none());
    }
}
