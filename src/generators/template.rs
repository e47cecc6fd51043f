//! Naming template engine.
//!
//! Templates use `{field}` or `{field:02d}` placeholders, e.g.
//! `{title}.S{season:02d}.E{episode:02d}{ext}`. Literal braces are written
//! as `{{` and `}}`.

use crate::models::media::ParsedMediaInfo;
use crate::Result;

/// A field that can appear in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Season,
    Episode,
    Year,
    Resolution,
    Ext,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        let field = match name {
            "title" => Field::Title,
            "season" => Field::Season,
            "episode" => Field::Episode,
            "year" => Field::Year,
            "resolution" => Field::Resolution,
            "ext" => Field::Ext,
            _ => return None,
        };
        Some(field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field {
        field: Field,
        width: usize,
        zero_pad: bool,
    },
}

/// A parsed naming template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template string.
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut spec = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        spec.push(c);
                    }
                    if !closed {
                        return Err(invalid(source, "unclosed '{'"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(parse_placeholder(source, &spec)?);
                }
                '}' => return Err(invalid(source, "unmatched '}'")),
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Original template text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Render against parsed info. Missing optional fields render empty.
    pub fn render(&self, info: &ParsedMediaInfo) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Field {
                    field,
                    width,
                    zero_pad,
                } => {
                    let number = match field {
                        Field::Season => Some(info.season),
                        Field::Episode => Some(info.episode),
                        Field::Year => info.year.map(u32::from),
                        _ => None,
                    };
                    let width = *width;
                    match (field, number) {
                        (Field::Year, None) => {}
                        (_, Some(n)) if *zero_pad => out.push_str(&format!("{:0width$}", n)),
                        (_, Some(n)) => out.push_str(&format!("{:width$}", n)),
                        (Field::Title, _) => out.push_str(&format!("{:<width$}", info.title)),
                        (Field::Resolution, _) => out.push_str(&format!(
                            "{:<width$}",
                            info.resolution.as_deref().unwrap_or("")
                        )),
                        (Field::Ext, _) => out.push_str(&info.extension),
                        _ => {}
                    }
                }
            }
        }
        out
    }
}

fn parse_placeholder(source: &str, spec: &str) -> Result<Segment> {
    let (name, format) = match spec.split_once(':') {
        Some((name, format)) => (name.trim(), Some(format.trim())),
        None => (spec.trim(), None),
    };

    let field = Field::from_name(name)
        .ok_or_else(|| invalid(source, &format!("unknown field '{}'", name)))?;

    let (width, zero_pad) = match format {
        None | Some("") => (0, false),
        Some(format) => {
            let digits = format.strip_suffix('d').unwrap_or(format);
            let zero_pad = digits.starts_with('0');
            let width = digits
                .parse::<usize>()
                .map_err(|_| invalid(source, &format!("bad format '{}'", format)))?;
            if width > 16 {
                return Err(invalid(source, "width too large"));
            }
            (width, zero_pad)
        }
    };

    Ok(Segment::Field {
        field,
        width,
        zero_pad,
    })
}

fn invalid(template: &str, reason: &str) -> crate::Error {
    crate::Error::InvalidTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::media::ParseStrategy;

    fn info() -> ParsedMediaInfo {
        ParsedMediaInfo {
            title: "Game of Thrones".to_string(),
            season: 1,
            episode: 9,
            year: None,
            resolution: Some("1080p".to_string()),
            extension: ".mkv".to_string(),
            strategy: ParseStrategy::Filename,
        }
    }

    #[test]
    fn test_default_templates() {
        let file = Template::parse("{title}.S{season:02d}.E{episode:02d}{ext}").unwrap();
        assert_eq!(file.render(&info()), "Game of Thrones.S01.E09.mkv");

        let dir = Template::parse("Season {season:02d}").unwrap();
        assert_eq!(dir.render(&info()), "Season 01");
    }

    #[test]
    fn test_optional_fields() {
        let t = Template::parse("{title} ({year}) [{resolution}]").unwrap();
        assert_eq!(t.render(&info()), "Game of Thrones () [1080p]");

        let mut with_year = info();
        with_year.year = Some(2011);
        assert_eq!(t.render(&with_year), "Game of Thrones (2011) [1080p]");
    }

    #[test]
    fn test_width_without_zero() {
        let t = Template::parse("E{episode:3d}|{episode:3}").unwrap();
        assert_eq!(t.render(&info()), "E  9|  9");
    }

    #[test]
    fn test_escaped_braces() {
        let t = Template::parse("{{{title}}}").unwrap();
        assert_eq!(t.render(&info()), "{Game of Thrones}");
    }

    #[test]
    fn test_invalid_templates() {
        assert!(Template::parse("{show}").is_err());
        assert!(Template::parse("{title").is_err());
        assert!(Template::parse("title}").is_err());
        assert!(Template::parse("{season:xd}").is_err());
    }
}
