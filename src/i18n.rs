use std::collections::HashMap;

const DE_YAML: &str = include_str!("../locales/de.yaml");
const EN_YAML: &str = include_str!("../locales/en.yaml");

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lang {
    De,
    #[default]
    En,
}

impl Lang {
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "de" => Lang::De,
            _ => Lang::En,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum License {
    Odbl,
    CcBySa,
}

impl License {
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "odbl" => License::Odbl,
            _ => License::CcBySa,
        }
    }
}

pub const ODBL_LICENSE_URL: &str = "https://opendatacommons.org/licenses/odbl/summary/";
pub const CC_LICENSE_URL_EN: &str = "https://creativecommons.org/licenses/by-sa/4.0/";
pub const CC_LICENSE_URL_DE: &str = "https://creativecommons.org/licenses/by-sa/4.0/deed.de";

/// Localized string lookup over embedded YAML tables. Nested mappings are
/// flattened to dotted keys, so the form asks for "entryForm.title" etc.
#[derive(Clone, Debug)]
pub struct I18n {
    pub lang: Lang,
    table: HashMap<String, String>,
}

impl I18n {
    pub fn load(lang: Lang) -> Self {
        let src = match lang {
            Lang::De => DE_YAML,
            Lang::En => EN_YAML,
        };
        let table = match serde_yaml::from_str::<serde_yaml::Value>(src) {
            Ok(v) => {
                let mut out = HashMap::new();
                flatten(&v, String::new(), &mut out);
                out
            }
            Err(_) => HashMap::new(),
        };
        Self { lang, table }
    }

    /// Missing keys fall back to the key itself so gaps stay visible.
    pub fn t(&self, key: &str) -> String {
        self.table
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    pub fn entry_form(&self, key: &str) -> String {
        self.t(&format!("entryForm.{key}"))
    }

    /// The license link depends on the configured license and, for CC,
    /// on the current language.
    pub fn license_url(&self, license: License) -> &'static str {
        match (license, self.lang) {
            (License::Odbl, _) => ODBL_LICENSE_URL,
            (License::CcBySa, Lang::De) => CC_LICENSE_URL_DE,
            (License::CcBySa, Lang::En) => CC_LICENSE_URL_EN,
        }
    }
}

fn flatten(v: &serde_yaml::Value, prefix: String, out: &mut HashMap<String, String>) {
    match v {
        serde_yaml::Value::Mapping(map) => {
            for (k, val) in map {
                if let Some(key) = k.as_str() {
                    let next = if prefix.is_empty() {
                        key.to_string()
                    } else {
                        format!("{prefix}.{key}")
                    };
                    flatten(val, next, out);
                }
            }
        }
        serde_yaml::Value::String(s) => {
            out.insert(prefix, s.clone());
        }
        serde_yaml::Value::Number(n) => {
            out.insert(prefix, n.to_string());
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_tables_carry_the_entry_form_namespace() {
        for lang in [Lang::De, Lang::En] {
            let t = I18n::load(lang);
            for key in [
                "title",
                "description",
                "chooseCategory",
                "captchaInput",
                "captchaPass",
                "savingError",
                "valueError",
                "startDate",
                "endDate",
            ] {
                let got = t.entry_form(key);
                assert_ne!(got, format!("entryForm.{key}"), "missing {key:?}");
            }
        }
    }

    #[test]
    fn missing_key_falls_back_to_key() {
        let t = I18n::load(Lang::En);
        assert_eq!(t.t("entryForm.noSuchKey"), "entryForm.noSuchKey");
    }

    #[test]
    fn license_url_follows_language_for_cc() {
        assert_eq!(
            I18n::load(Lang::De).license_url(License::CcBySa),
            CC_LICENSE_URL_DE
        );
        assert_eq!(
            I18n::load(Lang::En).license_url(License::CcBySa),
            CC_LICENSE_URL_EN
        );
        assert_eq!(
            I18n::load(Lang::En).license_url(License::Odbl),
            ODBL_LICENSE_URL
        );
    }
}
