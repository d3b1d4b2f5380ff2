//! `{name}` substitution for read-only content.

use crate::input::InputRecord;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// Variables available to read-only content on one page.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderVars {
    vars: BTreeMap<String, String>,
}

impl PlaceholderVars {
    /// Built-in variables plus every text value of the record. Record values
    /// win over built-ins of the same name.
    pub fn for_page(
        record: &InputRecord,
        now: NaiveDateTime,
        current_page: usize,
        total_pages: usize,
    ) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert("date".to_string(), now.format("%Y/%m/%d").to_string());
        vars.insert("dateTime".to_string(), now.format("%Y/%m/%d %H:%M").to_string());
        vars.insert("currentPage".to_string(), current_page.to_string());
        vars.insert("totalPages".to_string(), total_pages.to_string());
        for (key, value) in record {
            vars.insert(key.clone(), value.as_text().into_owned());
        }
        Self { vars }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

/// Replaces every `{key}` whose key is known. Unknown placeholders and
/// unbalanced braces are left untouched.
pub fn replace_placeholders(content: &str, vars: &PlaceholderVars) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find(['{', '}']) {
            Some(close) if after.as_bytes()[close] == b'}' => {
                let key = after[..close].trim();
                match vars.get(key) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[open..open + close + 2]),
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::FieldValue;
    use chrono::NaiveDate;

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap()
    }

    #[test]
    fn substitutes_builtins_and_record_values() {
        let mut record = InputRecord::new();
        record.insert("name".into(), FieldValue::from("Ada"));
        let vars = PlaceholderVars::for_page(&record, fixed_now(), 2, 3);

        assert_eq!(
            replace_placeholders("Hi {name}, page {currentPage}/{totalPages} on {date}", &vars),
            "Hi Ada, page 2/3 on 2024/03/09"
        );
        assert_eq!(replace_placeholders("{dateTime}", &vars), "2024/03/09 14:05");
    }

    #[test]
    fn leaves_unknown_and_unbalanced_braces() {
        let vars = PlaceholderVars::default();
        assert_eq!(replace_placeholders("{missing} {", &vars), "{missing} {");
        assert_eq!(replace_placeholders("a {{b}", &vars), "a {{b}");
        assert_eq!(replace_placeholders("no braces", &vars), "no braces");
    }
}
