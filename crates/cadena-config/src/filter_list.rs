//! Filter list strings.
//!
//! A filter list is a comma separated sequence of
//! `[@label:]name[=arg[:arg...]]`, where each `arg` is either positional
//! (`value`) or named (`key=value`):
//!
//! ```text
//! format=s16,@vol:volume=-6dB:detach=yes,resample=rate=44.1kHz
//! ```
//!
//! Double quotes protect `,`, `:` and `=` inside a value
//! (`volume=gain="-6dB"`). Whitespace around values is dropped.
//! Positional arguments take the filter's declared parameter names in
//! order, which needs the registry: [`parse_filter_list`] only checks syntax,
//! [`FilterSpec::resolve`] maps the arguments.

use std::fmt;
use std::str::FromStr;

use cadena_core::FilterRegistry;

use crate::error::ConfigError;
use crate::filter_config::{FilterConfig, quote_if_needed};
use crate::validation::ValidationError;

/// One argument as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterArg {
    /// `value`
    Positional(String),
    /// `key=value`
    Named {
        /// Parameter name.
        key: String,
        /// Parameter value.
        value: String,
    },
}

/// One entry of a filter list before positional arguments are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    /// Optional `@label`.
    pub label: Option<String>,
    /// Registry name.
    pub name: String,
    /// Arguments in written order.
    pub args: Vec<FilterArg>,
}

impl FilterSpec {
    /// Maps the arguments onto parameter names using the filter's declared
    /// parameter list.
    pub fn resolve(&self, registry: &FilterRegistry) -> Result<FilterConfig, ValidationError> {
        let info = registry
            .get(&self.name)
            .ok_or_else(|| ValidationError::UnknownFilter(self.name.clone()))?;

        let mut config = FilterConfig {
            name: self.name.clone(),
            label: self.label.clone(),
            args: Default::default(),
        };
        let positional = self
            .args
            .iter()
            .filter(|a| matches!(a, FilterArg::Positional(_)))
            .count();
        if positional > info.params.len() {
            return Err(ValidationError::TooManyArguments {
                filter: self.name.clone(),
                given: positional,
                max: info.params.len(),
            });
        }

        let mut next = 0;
        for arg in &self.args {
            let (key, value) = match arg {
                FilterArg::Positional(value) => {
                    next += 1;
                    (info.params[next - 1], value)
                }
                FilterArg::Named { key, value } => (key.as_str(), value),
            };
            if config.args.insert(key.to_string(), value.clone()).is_some() {
                return Err(ValidationError::DuplicateArgument {
                    filter: self.name.clone(),
                    param: key.to_string(),
                });
            }
        }
        Ok(config)
    }
}

impl FromStr for FilterSpec {
    type Err = ConfigError;

    /// Parses a single entry; commas are not allowed outside quotes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser::new(s);
        let spec = parser.item()?;
        parser.finish()?;
        Ok(spec)
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "@{}:", quote_if_needed(label))?;
        }
        f.write_str(&self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            f.write_str(if i == 0 { "=" } else { ":" })?;
            match arg {
                FilterArg::Positional(value) => f.write_str(&quote_if_needed(value))?,
                FilterArg::Named { key, value } => {
                    write!(f, "{key}={}", quote_if_needed(value))?;
                }
            }
        }
        Ok(())
    }
}

/// Parses a filter list into its entries. Only the syntax is checked.
///
/// An empty or all-whitespace list yields no entries.
pub fn parse_filter_list(text: &str) -> Result<Vec<FilterSpec>, ConfigError> {
    let mut parser = Parser::new(text);
    parser.skip_whitespace();
    if parser.at_end() {
        return Ok(Vec::new());
    }
    let mut specs = vec![parser.item()?];
    while parser.eat(',') {
        specs.push(parser.item()?);
    }
    parser.finish()?;
    Ok(specs)
}

/// Parses a filter list and resolves every entry against `registry`.
pub fn resolve_filter_list(
    text: &str,
    registry: &FilterRegistry,
) -> Result<Vec<FilterConfig>, ConfigError> {
    let configs = parse_filter_list(text)?
        .iter()
        .map(|spec| spec.resolve(registry))
        .collect::<Result<_, _>>()?;
    Ok(configs)
}

/// Renders configs back into a filter list string.
pub fn format_filter_list(configs: &[FilterConfig]) -> String {
    configs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    fn finish(&mut self) -> Result<(), ConfigError> {
        self.skip_whitespace();
        match self.peek() {
            None => Ok(()),
            Some(c) => Err(ConfigError::filter_list(
                self.pos,
                format!("unexpected '{c}'"),
            )),
        }
    }

    /// Reads up to the first unquoted character in `stop`.
    fn word(&mut self, stop: &[char]) -> Result<String, ConfigError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if stop.contains(&c) {
                break;
            }
            if c == '"' {
                let open = self.pos;
                self.pos += 1;
                let rest = &self.text[self.pos..];
                let Some(end) = rest.find('"') else {
                    return Err(ConfigError::filter_list(open, "unterminated quote"));
                };
                out.push_str(&rest[..end]);
                self.pos += end + 1;
            } else {
                out.push(c);
                self.pos += c.len_utf8();
            }
        }
        Ok(out)
    }

    fn item(&mut self) -> Result<FilterSpec, ConfigError> {
        self.skip_whitespace();

        let mut label = None;
        if self.eat('@') {
            let start = self.pos;
            let text = self.word(&[':', ',', '='])?;
            if text.is_empty() {
                return Err(ConfigError::filter_list(start, "empty label"));
            }
            if !self.eat(':') {
                return Err(ConfigError::filter_list(
                    self.pos,
                    "expected ':' after label",
                ));
            }
            label = Some(text);
        }

        let start = self.pos;
        let name = self.word(&[',', '=', ':'])?;
        let name = name.trim_end().to_string();
        if name.is_empty() {
            return Err(ConfigError::filter_list(start, "empty filter name"));
        }
        if let Some(bad) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(ConfigError::filter_list(
                start,
                format!("invalid character '{bad}' in filter name '{name}'"),
            ));
        }
        if self.peek() == Some(':') {
            return Err(ConfigError::filter_list(
                self.pos,
                "expected '=' before filter arguments",
            ));
        }

        let mut args = Vec::new();
        if self.eat('=') {
            loop {
                args.push(self.arg()?);
                if !self.eat(':') {
                    break;
                }
            }
        }

        self.skip_whitespace();
        Ok(FilterSpec { label, name, args })
    }

    fn arg(&mut self) -> Result<FilterArg, ConfigError> {
        let start = self.pos;
        let first = self.word(&[':', ',', '='])?.trim().to_string();
        if self.eat('=') {
            if first.is_empty() {
                return Err(ConfigError::filter_list(start, "empty argument name"));
            }
            let value = self.word(&[':', ','])?.trim().to_string();
            return Ok(FilterArg::Named { key: first, value });
        }
        if first.is_empty() {
            return Err(ConfigError::filter_list(start, "empty argument"));
        }
        Ok(FilterArg::Positional(first))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadena_registry::builtin_registry;

    fn named(key: &str, value: &str) -> FilterArg {
        FilterArg::Named {
            key: key.into(),
            value: value.into(),
        }
    }

    #[test]
    fn parses_plain_names() {
        let specs = parse_filter_list("dummy,meter").unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "dummy");
        assert!(specs[0].args.is_empty());
        assert_eq!(specs[1].name, "meter");
    }

    #[test]
    fn empty_list() {
        assert!(parse_filter_list("").unwrap().is_empty());
        assert!(parse_filter_list("  ").unwrap().is_empty());
    }

    #[test]
    fn parses_label_and_args() {
        let specs = parse_filter_list("@vol:volume=-6dB:detach=yes").unwrap();
        assert_eq!(
            specs,
            [FilterSpec {
                label: Some("vol".into()),
                name: "volume".into(),
                args: vec![FilterArg::Positional("-6dB".into()), named("detach", "yes")],
            }]
        );
    }

    #[test]
    fn whitespace_between_entries() {
        let specs = parse_filter_list(" format=s16 , resample=rate=48000 ").unwrap();
        assert_eq!(specs[0].args, [FilterArg::Positional("s16".into())]);
        assert_eq!(specs[1].name, "resample");
        assert_eq!(specs[1].args, [named("rate", "48000")]);
    }

    #[test]
    fn quotes_protect_separators() {
        let specs = parse_filter_list("delay=\"1ms|2ms\",volume=gain=\"a:b,c\"").unwrap();
        assert_eq!(specs[0].args, [FilterArg::Positional("1ms|2ms".into())]);
        assert_eq!(specs[1].args, [named("gain", "a:b,c")]);
    }

    #[test]
    fn reports_positions() {
        let cases = [
            ("volume,,dummy", 7, "empty filter name"),
            ("volume,", 7, "empty filter name"),
            ("@:volume", 1, "empty label"),
            ("@vol", 4, "expected ':' after label"),
            ("volume=\"-6dB", 7, "unterminated quote"),
            ("volume=gain=1::", 14, "empty argument"),
            ("volume=:", 7, "empty argument"),
            ("volume==1", 7, "empty argument name"),
            ("vol ume", 0, "invalid character"),
            ("volume:1", 6, "expected '='"),
        ];
        for (text, position, reason) in cases {
            match parse_filter_list(text) {
                Err(ConfigError::FilterList {
                    position: p,
                    reason: r,
                }) => {
                    assert_eq!(p, position, "{text}: {r}");
                    assert!(r.contains(reason), "{text}: {r}");
                }
                other => panic!("{text}: expected a filter list error, got {other:?}"),
            }
        }
    }

    #[test]
    fn single_spec_from_str() {
        let spec: FilterSpec = "@rs:resample=48000:5.1".parse().unwrap();
        assert_eq!(spec.label.as_deref(), Some("rs"));
        assert!("a,b".parse::<FilterSpec>().is_err());
    }

    #[test]
    fn resolves_positional_in_declared_order() {
        let registry = builtin_registry();
        let spec: FilterSpec = "resample=44.1kHz:stereo".parse().unwrap();
        let config = spec.resolve(&registry).unwrap();
        assert_eq!(config.arg("rate"), Some("44.1kHz"));
        assert_eq!(config.arg("channels"), Some("stereo"));

        let spec: FilterSpec = "volume=0.5:detach=yes".parse().unwrap();
        let config = spec.resolve(&registry).unwrap();
        assert_eq!(config.arg("gain"), Some("0.5"));
        assert_eq!(config.arg("detach"), Some("yes"));
    }

    #[test]
    fn resolve_errors() {
        let registry = builtin_registry();
        let resolve = |s: &str| s.parse::<FilterSpec>().unwrap().resolve(&registry);

        assert_eq!(
            resolve("echo"),
            Err(ValidationError::UnknownFilter("echo".into()))
        );
        assert_eq!(
            resolve("volume=1:yes:extra"),
            Err(ValidationError::TooManyArguments {
                filter: "volume".into(),
                given: 3,
                max: 2
            })
        );
        assert_eq!(
            resolve("meter=1"),
            Err(ValidationError::TooManyArguments {
                filter: "meter".into(),
                given: 1,
                max: 0
            })
        );
        assert_eq!(
            resolve("volume=1:gain=2"),
            Err(ValidationError::DuplicateArgument {
                filter: "volume".into(),
                param: "gain".into()
            })
        );
    }

    #[test]
    fn display_reparses() {
        let text = "@vol:volume=-6dB:detach=yes,delay=\"1ms|2ms\",format=s16";
        let specs = parse_filter_list(text).unwrap();
        let rendered: Vec<_> = specs.iter().map(ToString::to_string).collect();
        assert_eq!(rendered.join(","), "@vol:volume=-6dB:detach=yes,delay=1ms|2ms,format=s16");
        assert_eq!(parse_filter_list(&rendered.join(",")).unwrap(), specs);
    }

    #[test]
    fn resolve_whole_list() {
        let registry = builtin_registry();
        let configs = resolve_filter_list("format=float,@v:volume=2", &registry).unwrap();
        assert_eq!(configs[0].arg("format"), Some("float"));
        assert_eq!(configs[1].label.as_deref(), Some("v"));
        assert_eq!(format_filter_list(&configs), "format=format=float,@v:volume=gain=2");
        assert!(matches!(
            resolve_filter_list("volume,", &registry),
            Err(ConfigError::FilterList { .. })
        ));
        assert!(matches!(
            resolve_filter_list("nope", &registry),
            Err(ConfigError::Validation(ValidationError::UnknownFilter(_)))
        ));
    }
}
