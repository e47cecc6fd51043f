//! Chinese text utilities.

/// Check if a string contains Chinese characters.
pub fn contains_chinese(s: &str) -> bool {
    s.chars().any(is_chinese_char)
}

/// Check if a character is a Chinese character.
pub fn is_chinese_char(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}' |  // CJK Unified Ideographs
        '\u{3400}'..='\u{4DBF}' |  // CJK Unified Ideographs Extension A
        '\u{F900}'..='\u{FAFF}' |  // CJK Compatibility Ideographs
        '\u{20000}'..='\u{2A6DF}'  // CJK Unified Ideographs Extension B
    )
}

/// Split a string into its Chinese runs and the remaining non-Chinese text.
///
/// Runs are returned in original order. The remainder keeps everything that is
/// not part of a run, with each removed run replaced by a single space.
pub fn split_chinese_runs(s: &str) -> (Vec<String>, String) {
    let mut runs = Vec::new();
    let mut remainder = String::new();
    let mut current = String::new();

    for c in s.chars() {
        if is_chinese_char(c) {
            current.push(c);
        } else {
            if !current.is_empty() {
                runs.push(std::mem::take(&mut current));
                remainder.push(' ');
            }
            remainder.push(c);
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    (runs, remainder)
}

fn digit_value(c: char) -> Option<u32> {
    let v = match c {
        '一' => 1,
        '二' | '两' => 2,
        '三' => 3,
        '四' => 4,
        '五' => 5,
        '六' => 6,
        '七' => 7,
        '八' => 8,
        '九' => 9,
        _ => return None,
    };
    Some(v)
}

/// Parse a Chinese numeral such as `三`, `十一`, `二十`, `二十三` or `一百零五`.
///
/// Returns `None` for empty input, unknown characters, or values above 999.
pub fn parse_chinese_number(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }

    let mut total = 0u32;
    let mut digit: Option<u32> = None;

    for c in s.chars() {
        match c {
            '百' => {
                total += digit.take().unwrap_or(1) * 100;
            }
            '十' => {
                total += digit.take().unwrap_or(1) * 10;
            }
            // placeholder zero as in 一百零五
            '零' | '〇' => continue,
            _ => {
                let v = digit_value(c)?;
                // "一二" is not a numeral
                if digit.is_some() {
                    return None;
                }
                digit = Some(v);
            }
        }
    }
    total += digit.unwrap_or(0);

    (total <= 999).then_some(total)
}

/// Parse a numeric token that is either Arabic digits or a Chinese numeral.
///
/// A leading `S`/`s` (season marker) is stripped before parsing.
pub fn parse_number_token(token: &str) -> Option<u32> {
    let token = token.trim();
    let token = token
        .strip_prefix('S')
        .or_else(|| token.strip_prefix('s'))
        .unwrap_or(token);

    if token.is_empty() {
        return None;
    }
    if token.chars().all(|c| c.is_ascii_digit()) {
        return token.parse().ok();
    }
    parse_chinese_number(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_chinese() {
        assert!(contains_chinese("庆余年"));
        assert!(contains_chinese("Nirvana in Fire 琅琊榜"));
        assert!(!contains_chinese("Breaking Bad"));
    }

    #[test]
    fn test_split_chinese_runs() {
        let (runs, rest) = split_chinese_runs("英雄本色 1986 续集");
        assert_eq!(runs, vec!["英雄本色", "续集"]);
        assert_eq!(rest.split_whitespace().collect::<Vec<_>>(), vec!["1986"]);
    }

    #[test]
    fn test_parse_chinese_number() {
        assert_eq!(parse_chinese_number("一"), Some(1));
        assert_eq!(parse_chinese_number("十"), Some(10));
        assert_eq!(parse_chinese_number("十一"), Some(11));
        assert_eq!(parse_chinese_number("二十"), Some(20));
        assert_eq!(parse_chinese_number("二十三"), Some(23));
        assert_eq!(parse_chinese_number("两"), Some(2));
        assert_eq!(parse_chinese_number("一百零五"), Some(105));
        assert_eq!(parse_chinese_number("一二"), None);
        assert_eq!(parse_chinese_number("季"), None);
        assert_eq!(parse_chinese_number(""), None);
    }

    #[test]
    fn test_parse_number_token() {
        assert_eq!(parse_number_token("S01"), Some(1));
        assert_eq!(parse_number_token("s12"), Some(12));
        assert_eq!(parse_number_token("07"), Some(7));
        assert_eq!(parse_number_token("第"), None);
        assert_eq!(parse_number_token("三"), Some(3));
        assert_eq!(parse_number_token("S"), None);
    }
}
